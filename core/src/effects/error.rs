//! Error types for effect operations

use thiserror::Error;

/// Errors during effect definition registration
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("definition '{id}': {field} must be finite")]
    NotFinite { id: String, field: &'static str },

    #[error("definition '{id}': {field} must not be negative")]
    Negative { id: String, field: &'static str },

    #[error("definition '{id}': max_level must be at least 1")]
    ZeroMaxLevel { id: String },

    #[error("definition id '{id}' is already registered")]
    DuplicateId { id: String },
}

/// Errors during instance initialization and registry calls
///
/// Expected misses (removing an effect a target does not carry, querying an
/// owner with no effects) are plain `bool`/empty results, not errors; this
/// enum covers caller contract violations only.
#[derive(Debug, Error)]
pub enum EffectError {
    /// Returned by a behavior's `configure` hook when a required extra
    /// argument is absent.
    #[error("missing required argument '{name}'")]
    MissingArgument { name: &'static str },

    #[error("extra argument {index} has the wrong type (expected {expected})")]
    ArgumentType { index: usize, expected: &'static str },

    #[error("effect level must be at least 1")]
    ZeroLevel,

    #[error("duration must be finite and non-negative, got {value}")]
    InvalidDuration { value: f32 },

    #[error("entity handle '{name}' is no longer valid")]
    InvalidHandle { name: String },

    #[error("instance is already initialized")]
    AlreadyInitialized,

    #[error("instance has not been initialized")]
    Uninitialized,

    #[error("no observers registered for owner '{owner}'")]
    ObserverNotFound { owner: String },

    #[error("effect kind index {0} is not registered")]
    UnknownKind(u16),
}
