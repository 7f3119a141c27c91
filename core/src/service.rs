//! Periodic scheduler service
//!
//! Wraps a registry in the two periodic tasks the runtime needs: a fast
//! pass driving behavior ticks and decay, and a slow housekeeping sweep.
//! Both tasks and ad hoc gameplay calls mutate the same owner map, so all
//! of them serialize on the registry mutex; instance pools stay internally
//! synchronized regardless.
//!
//! The service is constructed explicitly and handed to callers; stopping it
//! aborts both tasks. No instance state needs flushing on shutdown -
//! recycled instances simply stop being ticked.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::effects::{EffectRegistry, FIXED_DELTA_SECS};
use crate::entity::EntityHandle;

/// Fast cadence: behavior ticks and decay.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Slow cadence: owner-map housekeeping.
pub const HOUSEKEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Handles for the spawned periodic tasks.
#[derive(Default)]
pub struct BackgroundTasks {
    pub ticker: Option<JoinHandle<()>>,
    pub housekeeper: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn abort_all(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Some(handle) = self.housekeeper.take() {
            handle.abort();
        }
    }
}

/// Owns a shared registry and its two periodic tasks.
pub struct EffectService<H: EntityHandle> {
    registry: Arc<Mutex<EffectRegistry<H>>>,
    tasks: BackgroundTasks,
}

impl<H: EntityHandle + Send + 'static> EffectService<H> {
    pub fn new(registry: EffectRegistry<H>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            tasks: BackgroundTasks::default(),
        }
    }

    /// Shared handle for gameplay-side calls (`add_effect`, queries,
    /// observer registration).
    pub fn registry(&self) -> Arc<Mutex<EffectRegistry<H>>> {
        Arc::clone(&self.registry)
    }

    /// Spawn the fast and slow periodic tasks. A no-op while running.
    pub fn start(&mut self) {
        if self.tasks.ticker.is_some() {
            return;
        }

        let registry = Arc::clone(&self.registry);
        self.tasks.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; skip it so the first real
            // pass lands a full interval after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                registry.tick();
                registry.decay_pass(FIXED_DELTA_SECS);
            }
        }));

        let registry = Arc::clone(&self.registry);
        self.tasks.housekeeper = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(HOUSEKEEP_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .housekeep();
            }
        }));

        debug!("effect service started");
    }

    /// Stop both periodic tasks.
    pub fn shutdown(&mut self) {
        self.tasks.abort_all();
        debug!("effect service stopped");
    }
}

impl<H: EntityHandle> Drop for EffectService<H> {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}
