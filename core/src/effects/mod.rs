//! Status-effect tracking system
//!
//! This module provides:
//! - **Definitions**: Immutable templates describing each effect kind
//!   (conflict policy, timing limits, display metadata)
//! - **Instances**: Mutable runtime records of applied effects, polymorphic
//!   over per-kind behavior hooks
//! - **Pools**: Bounded per-kind recycling of instances
//! - **Registry**: The owner → instances mapping, conflict resolution, and
//!   the periodic tick/decay/housekeeping passes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              EffectDefinition (immutable template)            │
//! │  "Burning: debuff, Combine, max level 5, 5s, demotes by 1"   │
//! └──────────────────────────────────────────────────────────────┘
//!                │ registered into DefinitionSet
//!                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  EffectRegistry ── kind-indexed InstancePool table            │
//! │  add_effect ──► pool.get ──► init ──► owner's sequence        │
//! │  tick/decay ──► hooks, demotion ──► pool.release on level 0   │
//! └──────────────────────────────────────────────────────────────┘
//!                │
//!                ▼
//!        observers (UI, gameplay systems)
//! ```

mod definition;
pub mod error;
mod instance;
mod pool;
mod registry;


pub use definition::{
    BehaviorFactory, ConflictPolicy, DefinitionSet, EffectCategory, EffectDefinition, EffectKind,
};
pub use error::{DefinitionError, EffectError};
pub use instance::{
    EffectBehavior, EffectInstance, ExtraValue, InstanceId, InstanceState, NullBehavior,
};
pub use pool::{InstancePool, POOL_CAPACITY};
pub use registry::{EffectRegistry, FIXED_DELTA_SECS, ObserverCallback, ObserverHandle};
