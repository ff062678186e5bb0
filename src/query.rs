//! Query input for the resolution facade.
//!
//! A `Query` names what to resolve (targets and/or inline changes), which
//! keys matter, how to filter records and components, and how to reduce
//! what survives.

use crate::context::ResolutionContext;
use crate::entity::{EntityLike, Target};
use crate::key::KeySelector;
use crate::modifier::{Change, ModifierMode, ModifierRecord};
use crate::reduce::ReduceRequest;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

type RecordPredicate = Rc<dyn Fn(&ModifierRecord) -> bool>;
type EntityPredicate = Rc<dyn Fn(&dyn EntityLike) -> bool>;

/// Record-level filter applied after key matching.
#[derive(Clone, Default)]
pub enum AttributeFilter {
    #[default]
    None,
    /// Only situational modifiers.
    Situational,
    /// Only baseline (non-situational) modifiers.
    Baseline,
    Mode(ModifierMode),
    /// Arbitrary predicate; `name` is its identity for caching.
    Custom { name: String, predicate: RecordPredicate },
}

impl AttributeFilter {
    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ModifierRecord) -> bool + 'static,
    {
        AttributeFilter::Custom {
            name: name.into(),
            predicate: Rc::new(predicate),
        }
    }

    pub fn admits(&self, record: &ModifierRecord) -> bool {
        match self {
            AttributeFilter::None => true,
            AttributeFilter::Situational => record.situational,
            AttributeFilter::Baseline => !record.situational,
            AttributeFilter::Mode(mode) => record.mode == *mode,
            AttributeFilter::Custom { predicate, .. } => predicate(record),
        }
    }

    pub fn identity(&self) -> String {
        match self {
            AttributeFilter::None => String::from("none"),
            AttributeFilter::Situational => String::from("situational"),
            AttributeFilter::Baseline => String::from("baseline"),
            AttributeFilter::Mode(mode) => format!("mode:{mode:?}"),
            AttributeFilter::Custom { name, .. } => format!("custom:{name}"),
        }
    }
}

impl fmt::Debug for AttributeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeFilter({})", self.identity())
    }
}

/// Which child components a primary entity walks into.
#[derive(Clone, Default)]
pub enum ItemFilter {
    /// Every child, active or not.
    All,
    /// Children that are active (not disabled, equipped if equipable).
    #[default]
    ActiveOnly,
    /// Active children of the listed content types.
    ContentTypes(BTreeSet<String>),
    /// Arbitrary predicate; `name` is its identity for caching.
    Custom { name: String, predicate: EntityPredicate },
}

impl ItemFilter {
    pub fn content_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ItemFilter::ContentTypes(types.into_iter().map(Into::into).collect())
    }

    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&dyn EntityLike) -> bool + 'static,
    {
        ItemFilter::Custom {
            name: name.into(),
            predicate: Rc::new(predicate),
        }
    }

    pub fn admits(&self, child: &dyn EntityLike) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::ActiveOnly => child.is_active(),
            ItemFilter::ContentTypes(types) => {
                child.is_active() && types.contains(child.content_type())
            }
            ItemFilter::Custom { predicate, .. } => predicate(child),
        }
    }

    pub fn identity(&self) -> String {
        match self {
            ItemFilter::All => String::from("all"),
            ItemFilter::ActiveOnly => String::from("active"),
            ItemFilter::ContentTypes(types) => format!(
                "types:{}",
                types.iter().map(String::as_str).collect::<Vec<_>>().join("|")
            ),
            ItemFilter::Custom { name, .. } => format!("custom:{name}"),
        }
    }
}

impl fmt::Debug for ItemFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemFilter({})", self.identity())
    }
}

/// A resolution request.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::{Actor, Change, Query, Reduce};
///
/// let hero = Actor::new("a1", "Kel", "character").with_change(Change::new("skillBonus", 2));
/// let query = Query::new()
///     .entity(&hero)
///     .key("skillBonus")
///     .reduce(Reduce::Sum);
/// assert_eq!(query.targets.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Query<'a> {
    pub targets: Vec<Target<'a>>,
    pub key: KeySelector,
    pub attribute_filter: AttributeFilter,
    pub item_filter: ItemFilter,
    /// Children to walk instead of the primary entity's own.
    pub embedded_override: Option<Vec<&'a dyn EntityLike>>,
    /// Inline changes resolved alongside the targets.
    pub changes: Vec<Change>,
    pub reduce: ReduceRequest,
    pub context: ResolutionContext,
    /// Entity that `parent_prerequisite`s are checked against.
    pub parent: Option<&'a dyn EntityLike>,
}

impl<'a> Query<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, target: impl Into<Target<'a>>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn entities<I>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = Target<'a>>,
    {
        self.targets.extend(targets);
        self
    }

    pub fn key(mut self, key: impl Into<KeySelector>) -> Self {
        self.key = key.into();
        self
    }

    pub fn attribute_filter(mut self, filter: AttributeFilter) -> Self {
        self.attribute_filter = filter;
        self
    }

    pub fn item_filter(mut self, filter: ItemFilter) -> Self {
        self.item_filter = filter;
        self
    }

    pub fn embedded_override(mut self, children: Vec<&'a dyn EntityLike>) -> Self {
        self.embedded_override = Some(children);
        self
    }

    pub fn changes(mut self, changes: Vec<Change>) -> Self {
        self.changes = changes;
        self
    }

    pub fn reduce(mut self, reduce: impl Into<ReduceRequest>) -> Self {
        self.reduce = reduce.into();
        self
    }

    pub fn context(mut self, context: ResolutionContext) -> Self {
        self.context = context;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.context.recursive = recursive;
        self
    }

    pub fn skip_local(mut self, skip_local: bool) -> Self {
        self.context.skip_local = skip_local;
        self
    }

    pub fn skip_size(mut self, skip_size: bool) -> Self {
        self.context.skip_size = skip_size;
        self
    }

    pub fn parent(mut self, parent: &'a dyn EntityLike) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Nothing to resolve: no targets and no inline changes.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.changes.is_empty()
    }
}

impl fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("targets", &self.targets)
            .field("key", &self.key)
            .field("attribute_filter", &self.attribute_filter)
            .field("item_filter", &self.item_filter)
            .field(
                "embedded_override",
                &self
                    .embedded_override
                    .as_ref()
                    .map(|c| c.iter().map(|e| e.id()).collect::<Vec<_>>()),
            )
            .field("changes", &self.changes.len())
            .field("reduce", &self.reduce)
            .field("context", &self.context)
            .field("parent", &self.parent.map(|p| p.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Item;

    #[test]
    fn test_attribute_filter_shorthands() {
        let baseline = ModifierRecord::inline(&Change::new("k", 1));
        let situational = ModifierRecord::inline(&Change::new("k", 1).situational());

        assert!(AttributeFilter::Baseline.admits(&baseline));
        assert!(!AttributeFilter::Baseline.admits(&situational));
        assert!(AttributeFilter::Situational.admits(&situational));
        assert!(AttributeFilter::Mode(ModifierMode::Add).admits(&baseline));
        assert!(!AttributeFilter::Mode(ModifierMode::Override).admits(&baseline));
    }

    #[test]
    fn test_custom_filter_identity_uses_name() {
        let filter = AttributeFilter::custom("positive", |r| {
            r.value.as_number().is_some_and(|n| n > 0.0)
        });
        assert_eq!(filter.identity(), "custom:positive");
        assert!(filter.admits(&ModifierRecord::inline(&Change::new("k", 2))));
        assert!(!filter.admits(&ModifierRecord::inline(&Change::new("k", -2))));
    }

    #[test]
    fn test_item_filters() {
        let stowed = Item::new("i1", "Armor", "armor").equipped(false);
        let worn = Item::new("i2", "Helmet", "armor").equipped(true);
        let feat = Item::new("i3", "Dodge", "feat");

        assert!(!ItemFilter::ActiveOnly.admits(&stowed));
        assert!(ItemFilter::All.admits(&stowed));

        let armor_only = ItemFilter::content_types(["armor"]);
        assert!(armor_only.admits(&worn));
        assert!(!armor_only.admits(&stowed));
        assert!(!armor_only.admits(&feat));
    }

    #[test]
    fn test_empty_query() {
        assert!(Query::new().is_empty());
        assert!(!Query::new().changes(vec![Change::new("k", 1)]).is_empty());
    }
}
