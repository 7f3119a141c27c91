//! Effect definition types
//!
//! Definitions are immutable templates that describe one effect kind: its
//! conflict policy, timing limits, level cap, and display metadata. An
//! external loader produces them before the registry is built; after
//! registration they are shared read-only by every instance of the kind and
//! by the kind's pool.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::EntityHandle;

use super::error::DefinitionError;
use super::instance::{EffectBehavior, NullBehavior};

// ═══════════════════════════════════════════════════════════════════════════
// Enums
// ═══════════════════════════════════════════════════════════════════════════

/// How an effect is categorized for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    /// Beneficial effect (blue)
    Buff,
    /// Harmful effect (red)
    Debuff,
    /// Neither - markers, quest states
    #[default]
    Neutral,
}

/// What happens when an owner receives another instance of an effect kind
/// it already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Add the incoming level to the existing instance, clamped to the
    /// definition's level cap
    Combine,
    /// One instance per distinct provider; a repeat from the same provider
    /// merges into that provider's instance
    Separate,
    /// The new application fully replaces the existing instance
    #[default]
    Cover,
}

// ═══════════════════════════════════════════════════════════════════════════
// Effect Definitions
// ═══════════════════════════════════════════════════════════════════════════

/// Definition of one effect kind (immutable template)
///
/// Multiple [`super::EffectInstance`]s may be live against a single
/// definition (one per affected owner, or several under
/// [`ConflictPolicy::Separate`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Stable identifier for this kind (e.g., "burning")
    pub id: String,

    /// Display name shown in tooltips/overlays
    pub name: String,

    /// Display description
    #[serde(default)]
    pub description: String,

    /// Icon reference for display
    #[serde(default)]
    pub icon_id: u64,

    /// Display category
    #[serde(default)]
    pub category: EffectCategory,

    // ─── Behavior ───────────────────────────────────────────────────────────
    /// Conflict resolution on repeat application
    #[serde(default)]
    pub policy: ConflictPolicy,

    /// Maximum duration in seconds; also the duration an instance is
    /// refreshed to after surviving a demotion
    pub max_duration: f32,

    /// Behavior tick cadence hint in seconds
    #[serde(default = "crate::serde_defaults::default_tick_every")]
    pub tick_every: f32,

    /// Highest level an instance may reach (at least 1)
    pub max_level: u32,

    /// Levels lost each time the residual duration runs out
    #[serde(default = "crate::serde_defaults::default_demotion")]
    pub demotion: u32,

    /// Whether a dispel can remove this effect
    #[serde(default = "crate::serde_defaults::default_true")]
    pub dispellable: bool,
}

impl EffectDefinition {
    /// Check numeric sanity. Called at registration; definitions that fail
    /// never make it into a [`DefinitionSet`].
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for (field, value) in [
            ("max_duration", self.max_duration),
            ("tick_every", self.tick_every),
        ] {
            if !value.is_finite() {
                return Err(DefinitionError::NotFinite {
                    id: self.id.clone(),
                    field,
                });
            }
            if value < 0.0 {
                return Err(DefinitionError::Negative {
                    id: self.id.clone(),
                    field,
                });
            }
        }
        if self.max_level == 0 {
            return Err(DefinitionError::ZeroMaxLevel {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Kind Registration
// ═══════════════════════════════════════════════════════════════════════════

/// Index of a registered effect kind.
///
/// Assigned in [`DefinitionSet`] registration order and used to select the
/// kind's pool. Grouping by kind index replaces grouping instances by
/// runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectKind(pub(crate) u16);

impl EffectKind {
    /// Position of this kind in the registry's pool table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Factory producing the behavior object for one kind.
pub type BehaviorFactory<H> = Box<dyn Fn() -> Box<dyn EffectBehavior<H>> + Send + Sync>;

pub(crate) struct KindEntry<H: EntityHandle> {
    pub(crate) definition: Arc<EffectDefinition>,
    pub(crate) factory: BehaviorFactory<H>,
}

/// The full set of effect kinds known to a registry.
///
/// Built once at startup from the loaded definitions, then consumed by
/// [`super::EffectRegistry::new`], which turns it into a kind-indexed pool
/// table. No kinds can be added after the registry exists.
pub struct DefinitionSet<H: EntityHandle> {
    entries: Vec<KindEntry<H>>,
}

impl<H: EntityHandle> Default for DefinitionSet<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H: EntityHandle> DefinitionSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition together with the factory for its behavior.
    ///
    /// Returns the kind index used by `add_effect`/`find_effects`. Rejects
    /// invalid numerics and duplicate string ids.
    pub fn register(
        &mut self,
        definition: EffectDefinition,
        factory: BehaviorFactory<H>,
    ) -> Result<EffectKind, DefinitionError> {
        definition.validate()?;
        if self.entries.iter().any(|e| e.definition.id == definition.id) {
            return Err(DefinitionError::DuplicateId { id: definition.id });
        }
        let kind = EffectKind(self.entries.len() as u16);
        self.entries.push(KindEntry {
            definition: Arc::new(definition),
            factory,
        });
        Ok(kind)
    }

    /// Register a data-only kind whose hooks all stay no-ops.
    pub fn register_plain(
        &mut self,
        definition: EffectDefinition,
    ) -> Result<EffectKind, DefinitionError> {
        self.register(definition, Box::new(|| Box::new(NullBehavior)))
    }

    /// Look up a kind index by definition id.
    pub fn kind_of(&self, id: &str) -> Option<EffectKind> {
        self.entries
            .iter()
            .position(|e| e.definition.id == id)
            .map(|i| EffectKind(i as u16))
    }

    /// Get a registered definition by kind index.
    pub fn get(&self, kind: EffectKind) -> Option<&Arc<EffectDefinition>> {
        self.entries.get(kind.index()).map(|e| &e.definition)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<KindEntry<H>> {
        self.entries
    }
}
