//! Effect registry
//!
//! Owns the owner → instance mapping and the observer subscriptions,
//! resolves conflicts when an owner receives a kind it already carries,
//! and drives the periodic tick/decay/housekeeping passes.
//!
//! # Instance lifecycle
//!
//! ```text
//! Pool::get ──► init ──► appended to owner ──► on_acquired + notify
//!     ▲                                              │
//!     │                               ticked/decayed each pass
//!     │                                              │
//!  reset ◄── Pool::release ◄── on_lost ◄── level hits 0 / removal
//! ```
//!
//! The registry exclusively owns an instance while it is listed under an
//! owner; its pool owns it while idle. The move between the two happens at
//! add/remove time, never both at once.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::entity::EntityHandle;

use super::definition::{ConflictPolicy, DefinitionSet, EffectKind};
use super::error::EffectError;
use super::instance::{EffectInstance, ExtraValue, InstanceId};
use super::pool::InstancePool;

/// Seconds between fast scheduler passes (tick + decay).
pub const FIXED_DELTA_SECS: f32 = 0.1;

/// Callback invoked with each new instance added to an observed owner.
pub type ObserverCallback<H> = Box<dyn FnMut(&EffectInstance<H>) + Send>;

/// Subscription handle returned by [`EffectRegistry::start_observing`];
/// pass it back to [`EffectRegistry::stop_observing`] to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

/// Tracks every live effect instance, grouped by owning entity.
pub struct EffectRegistry<H: EntityHandle> {
    /// One pool per registered kind, indexed by [`EffectKind`].
    pools: Vec<InstancePool<H>>,

    /// Owner → instance sequence. Insertion order is display order.
    owners: HashMap<H, Vec<EffectInstance<H>>>,

    /// Owner → observer subscriptions. An owner's entry disappears once its
    /// last subscription is dropped.
    observers: HashMap<H, Vec<(ObserverHandle, ObserverCallback<H>)>>,

    next_observer: u64,
}

impl<H: EntityHandle> EffectRegistry<H> {
    /// Build a registry (and its pool table) from the registered kinds.
    pub fn new(definitions: DefinitionSet<H>) -> Self {
        let pools = definitions
            .into_entries()
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                InstancePool::new(EffectKind(index as u16), entry.definition, entry.factory)
            })
            .collect();
        Self {
            pools,
            owners: HashMap::new(),
            observers: HashMap::new(),
            next_observer: 0,
        }
    }

    /// The pool backing a kind, if the kind is registered.
    pub fn pool(&self, kind: EffectKind) -> Option<&InstancePool<H>> {
        self.pools.get(kind.index())
    }

    /// Number of owners currently holding an entry (for introspection).
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observers
    // ─────────────────────────────────────────────────────────────────────────

    /// Subscribe to future additions on `owner`.
    ///
    /// Returns the subscription handle and the owner's current instance
    /// sequence (empty if the owner carries nothing yet).
    pub fn start_observing(
        &mut self,
        owner: &H,
        callback: ObserverCallback<H>,
    ) -> (ObserverHandle, &[EffectInstance<H>]) {
        let handle = ObserverHandle(self.next_observer);
        self.next_observer += 1;
        self.observers
            .entry(owner.clone())
            .or_default()
            .push((handle, callback));
        trace!(owner = %owner.name(), "observer subscribed");
        let current = self.owners.get(owner).map(Vec::as_slice).unwrap_or(&[]);
        (handle, current)
    }

    /// Drop one subscription on `owner`.
    ///
    /// Fails with [`EffectError::ObserverNotFound`] when the owner has no
    /// observer entry at all; an unknown handle on an existing entry is
    /// silently ignored.
    pub fn stop_observing(&mut self, owner: &H, handle: ObserverHandle) -> Result<(), EffectError> {
        let Some(entries) = self.observers.get_mut(owner) else {
            return Err(EffectError::ObserverNotFound {
                owner: owner.name().to_string(),
            });
        };
        entries.retain(|(h, _)| *h != handle);
        if entries.is_empty() {
            self.observers.remove(owner);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Gameplay API
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply an effect of `kind` to `target`, provided by `provider`.
    ///
    /// If the target carries no instance of the kind, a fresh one is
    /// acquired from the kind's pool. Otherwise the definition's
    /// [`ConflictPolicy`] decides: Combine merges levels (clamped to the
    /// cap), Separate merges per provider or appends, Cover replaces the
    /// existing instance with this call's parameters.
    ///
    /// `level` must be at least 1: an attached instance is always live, so
    /// queries and observers never see a level-zero instance.
    pub fn add_effect(
        &mut self,
        kind: EffectKind,
        target: &H,
        provider: &H,
        level: u32,
        extra: &[ExtraValue],
    ) -> Result<(), EffectError> {
        let Some(pool) = self.pools.get(kind.index()) else {
            return Err(EffectError::UnknownKind(kind.0));
        };
        if !target.is_valid() {
            return Err(EffectError::InvalidHandle {
                name: target.name().to_string(),
            });
        }
        if !provider.is_valid() {
            return Err(EffectError::InvalidHandle {
                name: provider.name().to_string(),
            });
        }
        if level == 0 {
            return Err(EffectError::ZeroLevel);
        }
        let policy = pool.definition().policy;

        let first_of_kind = self
            .owners
            .get(target)
            .and_then(|seq| seq.iter().find(|i| i.id().kind == kind))
            .map(EffectInstance::id);

        let Some(first) = first_of_kind else {
            return self.attach_new(kind, target, provider, level, extra);
        };

        match policy {
            ConflictPolicy::Combine => self.merge_into(target, first, level),
            ConflictPolicy::Separate => {
                let same_provider = self.owners.get(target).and_then(|seq| {
                    seq.iter()
                        .find(|i| i.id().kind == kind && i.provider() == Some(provider))
                        .map(EffectInstance::id)
                });
                match same_provider {
                    Some(id) => self.merge_into(target, id, level),
                    None => self.attach_new(kind, target, provider, level, extra),
                }
            }
            ConflictPolicy::Cover => {
                self.detach_and_release(target, first);
                self.attach_new(kind, target, provider, level, extra)
            }
        }
    }

    /// All of `target`'s instances of one kind. Empty when it carries none.
    pub fn find_effects(&self, kind: EffectKind, target: &H) -> Vec<&EffectInstance<H>> {
        self.find_all_effects(target)
            .iter()
            .filter(|i| i.id().kind == kind)
            .collect()
    }

    /// Every instance on `target`, in application order. Empty when the
    /// target carries none.
    pub fn find_all_effects(&self, target: &H) -> &[EffectInstance<H>] {
        self.owners.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove one instance from `target` and recycle it.
    ///
    /// Returns `false` when the target is unknown or does not carry the
    /// instance; both are expected outcomes, not errors.
    pub fn remove_effect(&mut self, target: &H, id: InstanceId) -> bool {
        self.detach_and_release(target, id)
    }

    /// As [`EffectRegistry::remove_effect`], but refuses effects whose
    /// definition is not dispellable.
    pub fn dispel(&mut self, target: &H, id: InstanceId) -> bool {
        let dispellable = self
            .owners
            .get(target)
            .and_then(|seq| seq.iter().find(|i| i.id() == id))
            .map(|i| i.definition().dispellable);
        match dispellable {
            Some(true) => self.detach_and_release(target, id),
            Some(false) => {
                trace!(owner = %target.name(), "dispel refused, effect not dispellable");
                false
            }
            None => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Periodic passes
    // ─────────────────────────────────────────────────────────────────────────

    /// Fast pass: fire `on_tick` on every instance with level > 0 whose
    /// owner is still valid.
    pub fn tick(&mut self) {
        for (owner, seq) in self.owners.iter_mut() {
            if !owner.is_valid() {
                continue;
            }
            for instance in seq.iter_mut().filter(|i| i.level() > 0) {
                instance.fire_tick();
            }
        }
    }

    /// Decay pass at fixed cadence.
    ///
    /// Walks each owner's sequence back to front so removals do not disturb
    /// the indices still to visit. An instance whose duration ran out is
    /// demoted (removed if that zeroes it, otherwise refreshed to
    /// `max_duration`); everything else loses `fixed_delta` of residual
    /// duration, floored at zero.
    pub fn decay_pass(&mut self, fixed_delta: f32) {
        let owners: Vec<H> = self.owners.keys().cloned().collect();
        for owner in owners {
            let Some(len) = self.owners.get(&owner).map(Vec::len) else {
                continue;
            };
            for index in (0..len).rev() {
                let Some((id, duration)) = self
                    .owners
                    .get(&owner)
                    .and_then(|seq| seq.get(index))
                    .map(|i| (i.id(), i.residual_duration()))
                else {
                    continue;
                };

                if duration == 0.0 {
                    let demoted_to = {
                        let Some(instance) = self
                            .owners
                            .get_mut(&owner)
                            .and_then(|seq| seq.get_mut(index))
                        else {
                            continue;
                        };
                        instance.demote();
                        if instance.level() > 0 {
                            let max = instance.definition().max_duration;
                            instance.set_duration(max);
                        }
                        instance.level()
                    };
                    if demoted_to == 0 {
                        self.detach_and_release(&owner, id);
                    }
                } else if let Some(instance) = self
                    .owners
                    .get_mut(&owner)
                    .and_then(|seq| seq.get_mut(index))
                {
                    instance.set_duration(duration - fixed_delta);
                }
            }
        }
    }

    /// Slow pass: drop owner entries whose handle died or whose sequence
    /// emptied, recycling any instances a dead owner still held. Owners
    /// with live instances on a valid handle are never touched.
    pub fn housekeep(&mut self) {
        let stale: Vec<H> = self
            .owners
            .iter()
            .filter(|(owner, seq)| !owner.is_valid() || seq.is_empty())
            .map(|(owner, _)| owner.clone())
            .collect();
        for owner in stale {
            let Some(seq) = self.owners.remove(&owner) else {
                continue;
            };
            if !seq.is_empty() {
                debug!(
                    owner = %owner.name(),
                    count = seq.len(),
                    "recycling effects from destroyed owner"
                );
            }
            for mut instance in seq {
                instance.set_level(0);
                instance.fire_lost();
                if let Some(pool) = self.pools.get(instance.id().kind.index()) {
                    pool.release(instance);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Acquire a fresh instance from the kind's pool, append it to the
    /// target, fire `on_acquired`, and notify the target's observers.
    fn attach_new(
        &mut self,
        kind: EffectKind,
        target: &H,
        provider: &H,
        level: u32,
        extra: &[ExtraValue],
    ) -> Result<(), EffectError> {
        let pool = &self.pools[kind.index()];
        let instance = pool.get_with(provider.clone(), target.clone(), level, None, extra)?;
        debug!(
            effect = %instance.definition().id,
            owner = %target.name(),
            provider = %provider.name(),
            level = instance.level(),
            "effect added"
        );
        let seq = self.owners.entry(target.clone()).or_default();
        seq.push(instance);
        if let Some(instance) = seq.last_mut() {
            instance.fire_acquired();
            if let Some(entries) = self.observers.get_mut(target) {
                for (_, callback) in entries.iter_mut() {
                    callback(&*instance);
                }
            }
        }
        Ok(())
    }

    /// Fold a repeat application into an existing instance.
    fn merge_into(&mut self, target: &H, id: InstanceId, level: u32) -> Result<(), EffectError> {
        let Some(instance) = self
            .owners
            .get_mut(target)
            .and_then(|seq| seq.iter_mut().find(|i| i.id() == id))
        else {
            return Ok(());
        };
        if !instance.is_initialized() {
            return Err(EffectError::Uninitialized);
        }
        let before = instance.level();
        instance.raise_level(level);
        trace!(
            effect = %instance.definition().id,
            owner = %target.name(),
            from = before,
            to = instance.level(),
            "merged repeat application"
        );
        Ok(())
    }

    /// Zero the level, fire `on_lost` while the instance is still attached,
    /// then detach it and hand it back to its pool.
    fn detach_and_release(&mut self, target: &H, id: InstanceId) -> bool {
        let Some(seq) = self.owners.get_mut(target) else {
            return false;
        };
        let Some(index) = seq.iter().position(|i| i.id() == id) else {
            return false;
        };
        {
            let instance = &mut seq[index];
            instance.set_level(0);
            instance.fire_lost();
        }
        let instance = seq.remove(index);
        debug!(
            effect = %instance.definition().id,
            owner = %target.name(),
            "effect removed"
        );
        if let Some(pool) = self.pools.get(id.kind.index()) {
            pool.release(instance);
        }
        true
    }
}
