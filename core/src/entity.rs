//! Entity identity interface
//!
//! The effect runtime does not own entities. Callers supply an opaque handle
//! type implementing [`EntityHandle`]; the registry only needs equality,
//! hashing, a display name, and a liveness check. Handles are expected to be
//! cheap clones (ids, generational indices, `Arc`-backed records).

use std::fmt::Debug;
use std::hash::Hash;

/// Opaque identity of a game entity as seen by the effect runtime.
pub trait EntityHandle: Clone + Eq + Hash + Debug {
    /// Human-readable name, used for display and logging.
    fn name(&self) -> &str;

    /// Whether the entity still exists.
    ///
    /// Housekeeping drops every effect belonging to a handle that reports
    /// `false`, and ticking skips instances whose owner is gone.
    fn is_valid(&self) -> bool;
}
