//! Per-kind instance pools
//!
//! One pool per registered effect kind bounds allocation churn: released
//! instances are reset and queued for reuse up to a fixed capacity, beyond
//! which they are dropped. The idle queue and the membership set mutate
//! under a single lock so the pool stays correct even when reached from
//! more than one execution context.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::entity::EntityHandle;

use super::definition::{BehaviorFactory, EffectDefinition, EffectKind};
use super::error::EffectError;
use super::instance::{EffectInstance, ExtraValue, InstanceId};

/// Idle instances kept per pool before further releases are discarded.
/// A deliberate memory ceiling: exceeding it trades allocation churn for a
/// bounded footprint.
pub const POOL_CAPACITY: usize = 15;

/// Pool of recyclable instances for a single effect kind.
pub struct InstancePool<H: EntityHandle> {
    kind: EffectKind,
    definition: Arc<EffectDefinition>,
    factory: BehaviorFactory<H>,
    capacity: usize,
    inner: Mutex<PoolInner<H>>,
}

struct PoolInner<H: EntityHandle> {
    idle: VecDeque<EffectInstance<H>>,
    /// Serials of every instance this pool constructed and has not
    /// discarded. Releasing a foreign instance is a no-op.
    members: HashSet<u32>,
    next_serial: u32,
}

impl<H: EntityHandle> InstancePool<H> {
    pub(crate) fn new(
        kind: EffectKind,
        definition: Arc<EffectDefinition>,
        factory: BehaviorFactory<H>,
    ) -> Self {
        Self {
            kind,
            definition,
            factory,
            capacity: POOL_CAPACITY,
            inner: Mutex::new(PoolInner {
                idle: VecDeque::new(),
                members: HashSet::new(),
                next_serial: 0,
            }),
        }
    }

    /// Take an idle instance, or construct a fresh uninitialized one.
    pub fn get(&self) -> EffectInstance<H> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = inner.idle.pop_front() {
            return instance;
        }
        let serial = inner.next_serial;
        inner.next_serial += 1;
        inner.members.insert(serial);
        trace!(kind = %self.definition.id, serial, "constructing pooled instance");
        EffectInstance::new(
            Arc::clone(&self.definition),
            InstanceId {
                kind: self.kind,
                serial,
            },
            (self.factory)(),
        )
    }

    /// As [`InstancePool::get`], but also initializes the instance.
    ///
    /// An instance whose init fails goes straight back to the idle queue
    /// rather than leaking.
    pub fn get_with(
        &self,
        provider: H,
        owner: H,
        level: u32,
        duration: Option<f32>,
        extra: &[ExtraValue],
    ) -> Result<EffectInstance<H>, EffectError> {
        let mut instance = self.get();
        if let Err(err) = instance.init(provider, owner, level, duration, extra) {
            self.release(instance);
            return Err(err);
        }
        Ok(instance)
    }

    /// Reset an instance and queue it for reuse.
    ///
    /// Instances the pool does not recognize are dropped silently (double
    /// release and cross-pool mixups are benign, not caller defects), as
    /// are releases arriving while the idle backlog is at capacity.
    pub fn release(&self, mut instance: EffectInstance<H>) {
        instance.reset();
        let id = instance.id();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if id.kind != self.kind || !inner.members.contains(&id.serial) {
            return;
        }
        if inner.idle.len() >= self.capacity {
            inner.members.remove(&id.serial);
            trace!(
                kind = %self.definition.id,
                serial = id.serial,
                "idle backlog full, discarding instance"
            );
            return;
        }
        inner.idle.push_back(instance);
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn definition(&self) -> &Arc<EffectDefinition> {
        &self.definition
    }

    /// Number of idle instances waiting for reuse.
    pub fn idle_len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .idle
            .len()
    }

    /// Number of live instances known to the pool (idle plus checked out).
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .members
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
