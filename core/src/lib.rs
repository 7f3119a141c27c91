//! aegis-core: a status-effect ("buff/debuff") runtime.
//!
//! Tracks timed, leveled effect instances per owning entity, resolves
//! conflicts on repeat application, decays and demotes effects on a
//! dual-cadence scheduler, recycles instances through bounded per-kind
//! pools, and notifies per-owner observers.

pub mod effects;
pub mod entity;
pub mod serde_defaults;
pub mod service;

// Re-exports for convenience
pub use effects::{
    BehaviorFactory, ConflictPolicy, DefinitionError, DefinitionSet, EffectBehavior,
    EffectCategory, EffectDefinition, EffectError, EffectInstance, EffectKind, EffectRegistry,
    ExtraValue, FIXED_DELTA_SECS, InstanceId, InstancePool, InstanceState, NullBehavior,
    ObserverCallback, ObserverHandle, POOL_CAPACITY,
};
pub use entity::EntityHandle;
pub use service::{BackgroundTasks, EffectService, HOUSEKEEP_INTERVAL, TICK_INTERVAL};
