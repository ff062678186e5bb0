//! In-memory character sheet model.
//!
//! `Actor`, `Item` and `Effect` are plain data holders implementing the
//! entity traits. Fields are private so every mutation goes through a
//! method that gives the owning entity a fresh version, which is what keeps
//! the resolution cache honest.

use crate::entity::{EffectRecordLike, EntityKind, EntityLike};
use crate::key::AttributeKey;
use crate::modifier::{Change, PrerequisiteExpr};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Version stamp drawn from a process-wide counter.
///
/// No two entity states share a revision: construction, every builder
/// call, every mutation and every clone take a fresh one. Two snapshots of
/// the same id therefore never look alike to the cache. Revisions take no
/// part in equality.
#[derive(Debug)]
struct Revision(u64);

impl Revision {
    fn next() -> Self {
        Revision(NEXT_REVISION.fetch_add(1, Ordering::Relaxed))
    }
}

impl Clone for Revision {
    fn clone(&self) -> Self {
        Revision::next()
    }
}

impl PartialEq for Revision {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// An effect record attached to an actor or item.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::{Change, Effect, EffectRecordLike};
///
/// let rage = Effect::new("fx-rage", "Rage")
///     .with_change(Change::new("meleeDamageBonus", 2))
///     .disabled();
///
/// assert!(!rage.is_active(0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    id: String,
    name: String,
    disabled: bool,
    overridden: bool,
    level: Option<u32>,
    changes: Vec<Change>,
}

impl Effect {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            disabled: false,
            overridden: false,
            level: None,
            changes: Vec::new(),
        }
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    /// Gate the effect on the owner's levels taken.
    pub fn at_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn overridden(mut self) -> Self {
        self.overridden = true;
        self
    }
}

impl EffectRecordLike for Effect {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn is_overridden(&self) -> bool {
        self.overridden
    }

    fn required_level(&self) -> Option<u32> {
        self.level
    }

    fn changes(&self) -> &[Change] {
        &self.changes
    }
}

/// An owned component: equipment, trait, class, ability.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: String,
    name: String,
    content_type: String,
    revision: Revision,
    changes: Vec<Change>,
    effects: Vec<Effect>,
    ammunition: VecDeque<Item>,
    non_inheritable: Vec<AttributeKey>,
    equipped: Option<bool>,
    disabled: bool,
    levels_taken: u32,
    prerequisite: Option<PrerequisiteExpr>,
    size: Option<String>,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_type: content_type.into(),
            revision: Revision::next(),
            changes: Vec::new(),
            effects: Vec::new(),
            ammunition: VecDeque::new(),
            non_inheritable: Vec::new(),
            equipped: None,
            disabled: false,
            levels_taken: 0,
            prerequisite: None,
            size: None,
        }
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self.touch();
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self.touch();
        self
    }

    pub fn with_prerequisite(mut self, prerequisite: PrerequisiteExpr) -> Self {
        self.prerequisite = Some(prerequisite);
        self.touch();
        self
    }

    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels_taken = levels;
        self.touch();
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self.touch();
        self
    }

    /// Mark the item as equipable, in the given state.
    pub fn equipped(mut self, equipped: bool) -> Self {
        self.equipped = Some(equipped);
        self.touch();
        self
    }

    /// Keys this item keeps to itself when loaded into another item.
    pub fn not_inherited(mut self, key: impl Into<AttributeKey>) -> Self {
        self.non_inheritable.push(key.into());
        self.touch();
        self
    }

    pub fn with_loaded(mut self, consumable: Item) -> Self {
        self.ammunition.push_back(consumable);
        self.touch();
        self
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        self.touch();
    }

    pub fn set_equipped(&mut self, equipped: bool) {
        self.equipped = Some(equipped);
        self.touch();
    }

    pub fn set_levels(&mut self, levels: u32) {
        self.levels_taken = levels;
        self.touch();
    }

    pub fn add_change(&mut self, change: Change) {
        self.changes.push(change);
        self.touch();
    }

    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
        self.touch();
    }

    /// Enable or disable an effect by id. Returns `false` if no such effect.
    pub fn set_effect_disabled(&mut self, effect_id: &str, disabled: bool) -> bool {
        let Some(effect) = self.effects.iter_mut().find(|e| e.id == effect_id) else {
            return false;
        };
        effect.disabled = disabled;
        self.touch();
        true
    }

    pub fn load(&mut self, consumable: Item) {
        self.ammunition.push_back(consumable);
        self.touch();
    }

    /// Remove the head of the loaded-consumable queue.
    pub fn unload(&mut self) -> Option<Item> {
        let head = self.ammunition.pop_front();
        if head.is_some() {
            self.touch();
        }
        head
    }

    fn touch(&mut self) {
        self.revision = Revision::next();
    }
}

impl EntityLike for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Component
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn version(&self) -> u64 {
        self.revision.0
    }

    fn changes(&self) -> &[Change] {
        &self.changes
    }

    fn effects(&self) -> Vec<&dyn EffectRecordLike> {
        self.effects
            .iter()
            .map(|e| e as &dyn EffectRecordLike)
            .collect()
    }

    fn loaded_consumable(&self) -> Option<&dyn EntityLike> {
        self.ammunition.front().map(|i| i as &dyn EntityLike)
    }

    fn non_inheritable_keys(&self) -> &[AttributeKey] {
        &self.non_inheritable
    }

    fn levels_taken(&self) -> u32 {
        self.levels_taken
    }

    fn is_active(&self) -> bool {
        !self.disabled && self.equipped.unwrap_or(true)
    }

    fn prerequisite(&self) -> Option<&PrerequisiteExpr> {
        self.prerequisite.as_ref()
    }

    fn stored_size(&self) -> Option<&str> {
        self.size.as_deref()
    }
}

/// A character, creature or vehicle.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::{Actor, Change, EntityLike, Item};
///
/// let mut hero = Actor::new("a1", "Kel", "character");
/// let v0 = hero.version();
/// hero.add_item(Item::new("i1", "Blaster", "weapon"));
/// hero.update_item("i1", |item| item.add_change(Change::new("toHit", 1)));
///
/// assert!(hero.version() > v0);
/// assert_eq!(hero.item("i1").unwrap().changes().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    id: String,
    name: String,
    content_type: String,
    revision: Revision,
    changes: Vec<Change>,
    items: Vec<Item>,
    effects: Vec<Effect>,
    size: Option<String>,
}

impl Actor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_type: content_type.into(),
            revision: Revision::next(),
            changes: Vec::new(),
            items: Vec::new(),
            effects: Vec::new(),
            size: None,
        }
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self.touch();
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self.touch();
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self.touch();
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self.touch();
        self
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn add_change(&mut self, change: Change) {
        self.changes.push(change);
        self.touch();
    }

    /// Drop every change with the given key. Returns how many were removed.
    pub fn remove_changes(&mut self, key: &str) -> usize {
        let before = self.changes.len();
        self.changes
            .retain(|c| c.key.as_ref().map(AttributeKey::as_str) != Some(key));
        let removed = before - self.changes.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
        self.touch();
    }

    pub fn remove_item(&mut self, id: &str) -> Option<Item> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        self.touch();
        Some(self.items.remove(pos))
    }

    /// Mutate an owned item in place. Bumps both the item's and the actor's
    /// version. Returns `false` if the item does not exist.
    pub fn update_item<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Item),
    {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        f(item);
        item.touch();
        self.touch();
        true
    }

    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
        self.touch();
    }

    pub fn set_effect_disabled(&mut self, effect_id: &str, disabled: bool) -> bool {
        let Some(effect) = self.effects.iter_mut().find(|e| e.id == effect_id) else {
            return false;
        };
        effect.disabled = disabled;
        self.touch();
        true
    }

    pub fn set_size(&mut self, size: impl Into<String>) {
        self.size = Some(size.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.revision = Revision::next();
    }
}

impl EntityLike for Actor {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Primary
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn version(&self) -> u64 {
        self.revision.0
    }

    fn changes(&self) -> &[Change] {
        &self.changes
    }

    fn children(&self) -> Vec<&dyn EntityLike> {
        self.items.iter().map(|i| i as &dyn EntityLike).collect()
    }

    fn effects(&self) -> Vec<&dyn EffectRecordLike> {
        self.effects
            .iter()
            .map(|e| e as &dyn EffectRecordLike)
            .collect()
    }

    fn stored_size(&self) -> Option<&str> {
        self.size.as_deref()
    }
}
