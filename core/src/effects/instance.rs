//! Effect instances (runtime state)
//!
//! An `EffectInstance` is the mutable record of one applied effect: who
//! provided it, who carries it, its current level and residual duration.
//! Instances are created uninitialized by their kind's pool, configured by
//! [`EffectInstance::init`], driven by the registry's tick/decay passes, and
//! returned to the pool by [`EffectInstance::reset`] when their level hits
//! zero.
//!
//! # Invariants
//!
//! Every level or duration mutation goes through a clamping setter, so
//! `0 <= level <= max_level` and `0 <= duration <= max_duration` hold at all
//! times for any instance visible outside the registry.

use std::fmt;
use std::sync::Arc;

use crate::entity::EntityHandle;

use super::definition::{EffectDefinition, EffectKind};
use super::error::EffectError;

// ═══════════════════════════════════════════════════════════════════════════
// Kind-specific init arguments
// ═══════════════════════════════════════════════════════════════════════════

/// A kind-specific init argument.
///
/// Anything past the required (provider, owner, level, duration) parameters
/// is carried as a list of these and handed to the behavior's
/// [`EffectBehavior::configure`] hook.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraValue {
    Int(i64),
    Float(f32),
    Text(String),
    Flag(bool),
}

impl ExtraValue {
    pub fn as_int(&self, index: usize) -> Result<i64, EffectError> {
        match self {
            Self::Int(v) => Ok(*v),
            _ => Err(EffectError::ArgumentType {
                index,
                expected: "int",
            }),
        }
    }

    pub fn as_float(&self, index: usize) -> Result<f32, EffectError> {
        match self {
            Self::Float(v) => Ok(*v),
            _ => Err(EffectError::ArgumentType {
                index,
                expected: "float",
            }),
        }
    }

    pub fn as_text(&self, index: usize) -> Result<&str, EffectError> {
        match self {
            Self::Text(v) => Ok(v),
            _ => Err(EffectError::ArgumentType {
                index,
                expected: "text",
            }),
        }
    }

    pub fn as_flag(&self, index: usize) -> Result<bool, EffectError> {
        match self {
            Self::Flag(v) => Ok(*v),
            _ => Err(EffectError::ArgumentType {
                index,
                expected: "flag",
            }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Behavior hooks
// ═══════════════════════════════════════════════════════════════════════════

/// Capability hooks for one concrete effect kind.
///
/// The registry fires these at lifecycle points. Every hook defaults to a
/// no-op so a kind only overrides the subset it needs; purely data-driven
/// kinds use [`NullBehavior`].
pub trait EffectBehavior<H: EntityHandle>: Send + fmt::Debug {
    /// Fired once after the instance is appended to an owner's sequence.
    fn on_acquired(&mut self, state: &InstanceState<H>) {
        let _ = state;
    }

    /// Fired once before the instance is detached from its owner.
    fn on_lost(&mut self, state: &InstanceState<H>) {
        let _ = state;
    }

    /// Fired once per scheduler tick while level > 0 and the owner is valid.
    fn on_tick(&mut self, state: &InstanceState<H>) {
        let _ = state;
    }

    /// Fired whenever the level changes by a nonzero amount; `delta` is the
    /// signed change, `state` already reflects the new level.
    fn on_level_change(&mut self, state: &InstanceState<H>, delta: i64) {
        let _ = (state, delta);
    }

    /// Consume kind-specific init arguments.
    fn configure(&mut self, extra: &[ExtraValue]) -> Result<(), EffectError> {
        let _ = extra;
        Ok(())
    }
}

/// Behavior for data-only kinds: every hook stays a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBehavior;

impl<H: EntityHandle> EffectBehavior<H> for NullBehavior {}

// ═══════════════════════════════════════════════════════════════════════════
// Instance state
// ═══════════════════════════════════════════════════════════════════════════

/// Identity of a pooled instance: its kind plus a per-pool serial.
///
/// Stable for the lifetime of the underlying allocation; used by
/// `remove_effect` and by the pool's membership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId {
    pub kind: EffectKind,
    pub serial: u32,
}

/// The runtime fields of an instance, readable by behavior hooks.
///
/// Kept separate from the boxed behavior so the registry can hand a hook a
/// view of the state it belongs to.
#[derive(Debug)]
pub struct InstanceState<H: EntityHandle> {
    definition: Arc<EffectDefinition>,
    id: InstanceId,
    provider: Option<H>,
    owner: Option<H>,
    level: u32,
    residual_duration: f32,
    initialized: bool,
}

impl<H: EntityHandle> InstanceState<H> {
    pub fn definition(&self) -> &Arc<EffectDefinition> {
        &self.definition
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn provider(&self) -> Option<&H> {
        self.provider.as_ref()
    }

    pub fn owner(&self) -> Option<&H> {
        self.owner.as_ref()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn residual_duration(&self) -> f32 {
        self.residual_duration
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Effect instance
// ═══════════════════════════════════════════════════════════════════════════

/// One applied effect: shared definition, runtime state, behavior hooks.
///
/// Exclusively owned by the registry while listed under an owner, and by its
/// pool while idle; ownership moves between the two at add/remove time.
#[derive(Debug)]
pub struct EffectInstance<H: EntityHandle> {
    state: InstanceState<H>,
    behavior: Box<dyn EffectBehavior<H>>,
}

impl<H: EntityHandle> EffectInstance<H> {
    /// Construct an uninitialized instance. Pools are the only caller.
    pub(crate) fn new(
        definition: Arc<EffectDefinition>,
        id: InstanceId,
        behavior: Box<dyn EffectBehavior<H>>,
    ) -> Self {
        Self {
            state: InstanceState {
                definition,
                id,
                provider: None,
                owner: None,
                level: 0,
                residual_duration: 0.0,
                initialized: false,
            },
            behavior,
        }
    }

    /// Configure a fresh or recycled instance.
    ///
    /// A missing duration defaults to the definition's `max_duration`;
    /// a supplied one must be finite and non-negative and is clamped to it.
    /// The level is clamped to `max_level`. Remaining arguments go to the
    /// behavior's `configure` hook.
    ///
    /// Fails with [`EffectError::AlreadyInitialized`] on a live instance and
    /// with [`EffectError::InvalidHandle`] when either entity is already
    /// destroyed.
    pub fn init(
        &mut self,
        provider: H,
        owner: H,
        level: u32,
        duration: Option<f32>,
        extra: &[ExtraValue],
    ) -> Result<(), EffectError> {
        if self.state.initialized {
            return Err(EffectError::AlreadyInitialized);
        }
        if !provider.is_valid() {
            return Err(EffectError::InvalidHandle {
                name: provider.name().to_string(),
            });
        }
        if !owner.is_valid() {
            return Err(EffectError::InvalidHandle {
                name: owner.name().to_string(),
            });
        }
        let residual = match duration {
            Some(d) if !d.is_finite() || d < 0.0 => {
                return Err(EffectError::InvalidDuration { value: d });
            }
            Some(d) => d.min(self.state.definition.max_duration),
            None => self.state.definition.max_duration,
        };

        self.state.provider = Some(provider);
        self.state.owner = Some(owner);
        self.state.level = level.min(self.state.definition.max_level);
        self.state.residual_duration = residual;
        self.behavior.configure(extra)?;
        self.state.initialized = true;
        Ok(())
    }

    /// Return the instance to its uninitialized state. Idempotent.
    pub fn reset(&mut self) {
        self.state.provider = None;
        self.state.owner = None;
        self.state.level = 0;
        self.state.residual_duration = 0.0;
        self.state.initialized = false;
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn definition(&self) -> &Arc<EffectDefinition> {
        &self.state.definition
    }

    pub fn id(&self) -> InstanceId {
        self.state.id
    }

    pub fn provider(&self) -> Option<&H> {
        self.state.provider.as_ref()
    }

    pub fn owner(&self) -> Option<&H> {
        self.state.owner.as_ref()
    }

    /// Name of the providing entity, for display.
    pub fn provider_name(&self) -> Option<&str> {
        self.state.provider.as_ref().map(EntityHandle::name)
    }

    /// Name of the owning entity, for display.
    pub fn owner_name(&self) -> Option<&str> {
        self.state.owner.as_ref().map(EntityHandle::name)
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn residual_duration(&self) -> f32 {
        self.state.residual_duration
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Whether the instance is still meaningful for display. Cached
    /// references should be dropped once this turns false.
    pub fn is_live(&self) -> bool {
        self.state.initialized && self.state.level > 0
    }

    pub fn state(&self) -> &InstanceState<H> {
        &self.state
    }

    // ─── Mutation (registry only) ───────────────────────────────────────────

    /// Set the level, clamped to `0..=max_level`. Fires `on_level_change`
    /// with the applied delta when it is nonzero.
    pub(crate) fn set_level(&mut self, level: u32) {
        let clamped = level.min(self.state.definition.max_level);
        let delta = i64::from(clamped) - i64::from(self.state.level);
        if delta == 0 {
            return;
        }
        self.state.level = clamped;
        self.behavior.on_level_change(&self.state, delta);
    }

    /// Raise the level by `amount`, saturating at the definition's cap.
    pub(crate) fn raise_level(&mut self, amount: u32) {
        self.set_level(self.state.level.saturating_add(amount));
    }

    /// Lose one demotion step worth of levels.
    pub(crate) fn demote(&mut self) {
        self.set_level(self.state.level.saturating_sub(self.state.definition.demotion));
    }

    /// Set the residual duration, clamped to `0..=max_duration`.
    pub(crate) fn set_duration(&mut self, duration: f32) {
        self.state.residual_duration = duration.clamp(0.0, self.state.definition.max_duration);
    }

    // ─── Hook dispatch (registry only) ──────────────────────────────────────

    pub(crate) fn fire_acquired(&mut self) {
        self.behavior.on_acquired(&self.state);
    }

    pub(crate) fn fire_lost(&mut self) {
        self.behavior.on_lost(&self.state);
    }

    pub(crate) fn fire_tick(&mut self) {
        self.behavior.on_tick(&self.state);
    }
}
