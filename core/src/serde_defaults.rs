//! Common serde default value functions
//!
//! Used across effect definitions to avoid duplication.

/// Default for enabled/dispellable fields
pub fn default_true() -> bool {
    true
}

/// Default behavior tick cadence in seconds
pub fn default_tick_every() -> f32 {
    1.0
}

/// Default demotion step (levels lost per duration expiry)
pub fn default_demotion() -> u32 {
    1
}
