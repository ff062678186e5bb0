//! Entity capability traits.
//!
//! The engine never sees concrete actor or item types. Anything that can
//! list its own changes, its child components and its effect records can
//! be resolved.

use crate::key::AttributeKey;
use crate::modifier::{Change, ModifierRecord, PrerequisiteExpr};
use std::fmt;

/// Whether an entity is the top-level subject of a query or something it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A character, creature or vehicle.
    Primary,
    /// An owned or equipped sub-entity (equipment, trait, ability).
    Component,
}

/// A named, independently toggleable bundle of changes.
pub trait EffectRecordLike {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn is_disabled(&self) -> bool;

    /// Suppressed by another effect.
    fn is_overridden(&self) -> bool {
        false
    }

    /// Levels the owning component must have taken for this effect to apply.
    fn required_level(&self) -> Option<u32> {
        None
    }

    fn changes(&self) -> &[Change];

    /// Whether the effect contributes, given its owner's levels taken.
    fn is_active(&self, levels_taken: u32) -> bool {
        if self.is_disabled() || self.is_overridden() {
            return false;
        }
        match self.required_level() {
            Some(level) => levels_taken >= level,
            None => true,
        }
    }

    fn modifiers(&self) -> Vec<ModifierRecord> {
        self.changes()
            .iter()
            .map(|c| ModifierRecord::from_change(c, self.id(), self.name(), "effect"))
            .collect()
    }
}

/// Anything the engine can walk.
///
/// Only `id`, `name`, `kind`, `version` and `changes` are required; the rest
/// default to "nothing there", so a bare data holder is a valid entity.
pub trait EntityLike {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn kind(&self) -> EntityKind;

    /// Content type such as `"weapon"`, `"trait"` or `"character"`.
    fn content_type(&self) -> &str;

    /// Version of the entity's current state.
    ///
    /// Must change on every mutation of stored fields, and two distinct
    /// states sharing an id must not report the same value.
    fn version(&self) -> u64;

    fn changes(&self) -> &[Change];

    fn local_modifiers(&self) -> Vec<ModifierRecord> {
        self.changes()
            .iter()
            .map(|c| ModifierRecord::from_change(c, self.id(), self.name(), self.content_type()))
            .collect()
    }

    fn children(&self) -> Vec<&dyn EntityLike> {
        Vec::new()
    }

    fn effects(&self) -> Vec<&dyn EffectRecordLike> {
        Vec::new()
    }

    /// Head of the loaded-consumable queue, if any.
    fn loaded_consumable(&self) -> Option<&dyn EntityLike> {
        None
    }

    /// Keys this entity does not pass on when loaded into another.
    fn non_inheritable_keys(&self) -> &[AttributeKey] {
        &[]
    }

    fn levels_taken(&self) -> u32 {
        0
    }

    /// Activity state: equipped, not disabled.
    fn is_active(&self) -> bool {
        true
    }

    fn prerequisite(&self) -> Option<&PrerequisiteExpr> {
        None
    }

    /// Size name stored directly on the entity.
    fn stored_size(&self) -> Option<&str> {
        None
    }

    fn is_primary(&self) -> bool {
        self.kind() == EntityKind::Primary
    }
}

/// An entity together with the primary entity that owns it.
///
/// Components need their owner to know their size; a component without an
/// owner is "unattached" and falls back to its own data.
#[derive(Clone, Copy)]
pub struct Target<'a> {
    pub entity: &'a dyn EntityLike,
    pub owner: Option<&'a dyn EntityLike>,
}

impl<'a> Target<'a> {
    pub fn primary(entity: &'a dyn EntityLike) -> Self {
        Self {
            entity,
            owner: None,
        }
    }

    pub fn owned(entity: &'a dyn EntityLike, owner: &'a dyn EntityLike) -> Self {
        Self {
            entity,
            owner: Some(owner),
        }
    }

    pub fn unattached(entity: &'a dyn EntityLike) -> Self {
        Self::primary(entity)
    }

    /// Primary entities and attached components have a size.
    pub fn is_sized(&self) -> bool {
        self.entity.is_primary() || self.owner.is_some()
    }

    /// The primary entity at the top of this target's ownership chain.
    pub fn primary_entity(&self) -> Option<&'a dyn EntityLike> {
        if self.entity.is_primary() {
            Some(self.entity)
        } else {
            self.owner
        }
    }

    /// Version of the entity combined with its owner's, if any.
    pub fn version_stamp(&self) -> (u64, Option<u64>) {
        (self.entity.version(), self.owner.map(|o| o.version()))
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("entity", &self.entity.id())
            .field("owner", &self.owner.map(|o| o.id()))
            .finish()
    }
}

impl<'a, T: EntityLike> From<&'a T> for Target<'a> {
    fn from(entity: &'a T) -> Self {
        Target::primary(entity)
    }
}
