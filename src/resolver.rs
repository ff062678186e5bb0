//! Attribute resolver module.
//!
//! Provides the `AttributeResolver` type, the single entry point for
//! attribute resolution. It composes the graph walker, the scaling
//! expander, prerequisite filtering, the per-entity cache and the
//! reduction strategies.

use crate::cache::{CacheKey, ResolutionCache, VersionStamp};
use crate::content::EngineConfig;
use crate::entity::{EntityLike, Target};
use crate::modifier::ModifierRecord;
use crate::prerequisite::{PrerequisiteGate, StructuralGate};
use crate::query::Query;
use crate::resolved::Reduced;
use crate::scaling::ScalingExpander;
use crate::walker::{Candidate, GraphWalker, WalkOptions};
use serde::Serialize;

/// Call counters, for instrumentation and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    /// Queries received, including inner size queries.
    pub queries: u64,
    /// Graph walks started from a query target.
    pub walks: u64,
    /// Times the scaling expander ran.
    pub scaling_passes: u64,
    /// Size resolutions computed.
    pub size_resolutions: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// The attribute resolver.
///
/// Resolution runs in fixed steps:
/// 1. Empty queries short-circuit to an empty result
/// 2. The cache is consulted for single-target queries
/// 3. Candidates are gathered from every target and from inline changes
/// 4. Scalable candidates are expanded for the target's resolved size
/// 5. Candidates are filtered by key, then by the attribute filter
/// 6. Unless recursive, prerequisites are checked against the owning entity
///    and parent prerequisites against the query's parent
/// 7. For primary-entity queries, parent prerequisites are checked against
///    the primary entity
/// 8. Survivors are copied out and reduced
///
/// Resolution never fails; missing data contributes nothing.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::*;
///
/// let hero = Actor::new("a1", "Kel", "character")
///     .with_effect(Effect::new("e1", "Inspired").with_change(Change::new("skillBonus", "2")))
///     .with_effect(Effect::new("e2", "Rage").with_change(Change::new("skillBonus", "5")).disabled());
///
/// let mut resolver = AttributeResolver::new(EngineConfig::default());
/// let query = Query::new().entity(&hero).key("skillBonus").reduce(Reduce::Sum);
/// assert_eq!(resolver.resolve(&query).as_number(), Some(2.0));
/// ```
pub struct AttributeResolver {
    pub(crate) config: EngineConfig,
    gate: Box<dyn PrerequisiteGate>,
    cache: ResolutionCache,
    pub(crate) stats: ResolverStats,
}

impl AttributeResolver {
    /// Create a resolver using the structural prerequisite gate.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            gate: Box::new(StructuralGate),
            cache: ResolutionCache::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Replace the prerequisite gate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sheetcalc::{AllowAll, AttributeResolver, EngineConfig};
    ///
    /// let resolver = AttributeResolver::new(EngineConfig::default()).with_gate(AllowAll);
    /// ```
    pub fn with_gate(mut self, gate: impl PrerequisiteGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self.cache.clear();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ResolverStats::default();
    }

    /// Resolve a query and reduce the surviving records.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sheetcalc::*;
    ///
    /// let mut resolver = AttributeResolver::new(EngineConfig::default());
    ///
    /// // Nothing to resolve: each strategy's empty answer.
    /// assert_eq!(resolver.resolve(&Query::new().reduce(Reduce::Sum)).as_number(), Some(0.0));
    /// assert_eq!(resolver.resolve(&Query::new().reduce(Reduce::Or)).as_bool(), Some(false));
    /// ```
    pub fn resolve(&mut self, query: &Query<'_>) -> Reduced {
        let records = self.records(query);
        let result = query.reduce.apply(&records);
        tracing::debug!(key = %query.key.identity(), reduce = %query.reduce.identity(), records = records.len(), "resolved");
        result
    }

    /// Resolve a query to its filtered records, without reducing.
    ///
    /// The records are owned copies; mutating them never affects the cache.
    pub fn records(&mut self, query: &Query<'_>) -> Vec<ModifierRecord> {
        self.stats.queries += 1;
        if query.is_empty() {
            return Vec::new();
        }

        let slot = self.cache_slot(query);
        if let Some((entity_id, stamp, key)) = &slot {
            if let Some(hit) = self.cache.get(entity_id, *stamp, key) {
                self.stats.cache_hits += 1;
                tracing::debug!(entity = %entity_id, "cache hit");
                return hit.to_vec();
            }
            self.stats.cache_misses += 1;
        }

        let records = self.compute(query);
        if let Some((entity_id, stamp, key)) = slot {
            self.cache.insert(&entity_id, stamp, key, records.clone());
        }
        records
    }

    /// Drop cached resolutions for one entity.
    pub fn invalidate(&mut self, entity_id: &str) {
        self.cache.invalidate(entity_id);
    }

    /// Drop every cached resolution.
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Cache slot for a query: entity id, version stamp and encoded key.
    ///
    /// Only single-target queries without inline changes are cached.
    fn cache_slot(&self, query: &Query<'_>) -> Option<(String, VersionStamp, String)> {
        let [target] = query.targets.as_slice() else {
            return None;
        };
        if !query.changes.is_empty() {
            return None;
        }
        let parent = query.parent.map(|p| format!("{}@{}", p.id(), p.version()));
        let key = CacheKey {
            key: query.key.identity(),
            attribute_filter: query.attribute_filter.identity(),
            item_filter: query.item_filter.identity(),
            embedded_override: query.embedded_override.as_ref().map(|children| {
                children
                    .iter()
                    .map(|c| format!("{}@{}", c.id(), c.version()))
                    .collect()
            }),
            owner: target.owner.map(|o| o.id()),
            parent: parent.as_deref(),
            context: query.context,
        }
        .encode();
        Some((target.entity.id().to_string(), target.version_stamp(), key))
    }

    fn compute<'a>(&mut self, query: &Query<'a>) -> Vec<ModifierRecord> {
        let options = WalkOptions {
            item_filter: &query.item_filter,
            embedded_override: query.embedded_override.as_deref(),
            context: query.context,
        };

        let mut gathered: Vec<(Candidate<'a>, Option<Target<'a>>)> = Vec::new();
        for target in &query.targets {
            self.stats.walks += 1;
            let candidates = GraphWalker::new(&self.config).collect(target.entity, &options);
            let candidates = self.expand_for(*target, candidates, query);
            gathered.extend(candidates.into_iter().map(|c| (c, Some(*target))));
        }

        if !query.changes.is_empty() {
            let inline: Vec<Candidate<'a>> = query
                .changes
                .iter()
                .map(|change| Candidate {
                    record: ModifierRecord::inline(change),
                    origin: None,
                })
                .collect();
            let first = query.targets.first().copied();
            let inline = match first {
                Some(target) => self.expand_for(target, inline, query),
                None => inline,
            };
            gathered.extend(inline.into_iter().map(|c| (c, first)));
        }

        let context = query.context;
        let gate = self.gate.as_ref();
        let survivors: Vec<ModifierRecord> = gathered
            .into_iter()
            .filter(|(c, _)| c.record.key.as_ref().is_some_and(|k| query.key.matches(k)))
            .filter(|(c, _)| query.attribute_filter.admits(&c.record))
            .filter(|(c, target)| {
                // Nested walks skip the record and parent checks, but never
                // the component check against the primary entity.
                if !context.recursive {
                    let owner = c.origin.or_else(|| target.map(|t| t.entity));
                    if !meets(gate, c.record.prerequisite.as_ref(), owner) {
                        return false;
                    }
                    if let Some(parent) = query.parent {
                        if !meets(gate, c.record.parent_prerequisite.as_ref(), Some(parent)) {
                            return false;
                        }
                    }
                }
                let primary_query = target.is_some_and(|t| context.requested_by_primary || t.entity.is_primary());
                if primary_query {
                    let primary = target.and_then(|t| t.primary_entity());
                    if !meets(gate, c.record.parent_prerequisite.as_ref(), primary) {
                        return false;
                    }
                }
                true
            })
            .map(|(c, _)| c.record)
            .collect();

        tracing::debug!(
            targets = query.targets.len(),
            inline = query.changes.len(),
            key = %query.key.identity(),
            survivors = survivors.len(),
            "collected records"
        );
        survivors
    }

    /// Run the scaling pass for one target if anything needs it.
    fn expand_for<'a>(
        &mut self,
        target: Target<'a>,
        candidates: Vec<Candidate<'a>>,
        query: &Query<'a>,
    ) -> Vec<Candidate<'a>> {
        if query.context.skip_size || !target.is_sized() {
            return candidates;
        }
        if !ScalingExpander::new(&self.config).needs_expansion(&candidates) {
            return candidates;
        }
        let index = self.resolve_size(target, None);
        let size_name = self
            .config
            .size_scale
            .name_at(index)
            .map(str::to_string)
            .unwrap_or_default();
        self.stats.scaling_passes += 1;
        ScalingExpander::new(&self.config).expand(candidates, &size_name)
    }
}

/// Whether an optional prerequisite holds. No entity to evaluate against
/// counts as failing.
fn meets(
    gate: &dyn PrerequisiteGate,
    expr: Option<&crate::modifier::PrerequisiteExpr>,
    entity: Option<&dyn EntityLike>,
) -> bool {
    match (expr, entity) {
        (None, _) => true,
        (Some(expr), Some(entity)) => gate.meets(expr, entity),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ScalableTemplates;
    use crate::modifier::{Change, PrerequisiteExpr};
    use crate::reduce::Reduce;
    use crate::sheet::{Actor, Item};

    fn templates() -> ScalableTemplates {
        ScalableTemplates::new()
            .with("unarmedDamageScalable", "1d4", "Small", vec![Change::new("unarmedDamage", "1d3")])
            .with("unarmedDamageScalable", "1d4", "Medium", vec![Change::new("unarmedDamage", "1d4")])
    }

    #[test]
    fn test_empty_query_is_empty() {
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        assert!(resolver.records(&Query::new()).is_empty());
        assert_eq!(resolver.resolve(&Query::new()).as_values(), Some(&[][..]));
        assert_eq!(resolver.resolve(&Query::new().reduce(Reduce::First)).as_optional(), None);
    }

    #[test]
    fn test_cache_hit_returns_equal_records() {
        let hero = Actor::new("a", "Kel", "character").with_change(Change::new("speed", 6));
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        let query = Query::new().entity(&hero).key("speed");

        let first = resolver.records(&query);
        let second = resolver.records(&query);
        assert_eq!(first, second);
        assert_eq!(resolver.stats().cache_misses, 1);
        assert_eq!(resolver.stats().cache_hits, 1);
        assert_eq!(resolver.stats().walks, 1);
    }

    #[test]
    fn test_version_bump_invalidates() {
        let mut hero = Actor::new("a", "Kel", "character").with_change(Change::new("speed", 6));
        let mut resolver = AttributeResolver::new(EngineConfig::default());

        let before = resolver.resolve(&Query::new().entity(&hero).key("speed").reduce(Reduce::Sum));
        assert_eq!(before.as_number(), Some(6.0));

        hero.add_change(Change::new("speed", 2));
        let after = resolver.resolve(&Query::new().entity(&hero).key("speed").reduce(Reduce::Sum));
        assert_eq!(after.as_number(), Some(8.0));
        assert_eq!(resolver.stats().cache_hits, 0);
    }

    #[test]
    fn test_inline_changes_bypass_cache() {
        let hero = Actor::new("a", "Kel", "character");
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        let query = Query::new()
            .entity(&hero)
            .key("speed")
            .changes(vec![Change::new("speed", 4)])
            .reduce(Reduce::Sum);
        assert_eq!(resolver.resolve(&query).as_number(), Some(4.0));
        assert_eq!(resolver.resolve(&query).as_number(), Some(4.0));
        assert_eq!(resolver.stats().cache_hits + resolver.stats().cache_misses, 0);
    }

    #[test]
    fn test_size_resolution_does_not_scale() {
        let config = EngineConfig::default().with_templates(templates());
        let hero = Actor::new("a", "Kel", "character")
            .with_change(Change::new("size", "Small"))
            .with_change(Change::new("unarmedDamageScalable", "1d4"));
        let mut resolver = AttributeResolver::new(config);

        let index = resolver.resolve_size(Target::primary(&hero), None);
        assert_eq!(resolver.stats().scaling_passes, 0);
        assert_eq!(resolver.config().size_scale.name_at(index), Some("Small"));

        let damage = resolver.resolve(&Query::new().entity(&hero).key("unarmedDamage"));
        assert_eq!(damage.as_values().map(|v| v.len()), Some(1));
        let stats = resolver.stats();
        assert_eq!(stats.scaling_passes, 1);
        assert_eq!(stats.size_resolutions, 2);
    }

    #[test]
    fn test_record_prerequisite_checked_against_origin() {
        let hero = Actor::new("a", "Kel", "character").with_item(
            Item::new("f", "Weapon Focus", "feat").with_change(
                Change::new("toHitBonus", 1).with_prerequisite(PrerequisiteExpr::new("TYPE", "feat")),
            ),
        ).with_change(
            Change::new("toHitBonus", 5).with_prerequisite(PrerequisiteExpr::new("TYPE", "vehicle")),
        );
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        let sum = resolver.resolve(&Query::new().entity(&hero).key("toHitBonus").reduce(Reduce::Sum));
        assert_eq!(sum.as_number(), Some(1.0));

        let recursive = resolver.resolve(
            &Query::new()
                .entity(&hero)
                .key("toHitBonus")
                .recursive(true)
                .reduce(Reduce::Sum),
        );
        assert_eq!(recursive.as_number(), Some(6.0));
    }

    #[test]
    fn test_component_prerequisite_checked_against_primary() {
        let gated = Item::new("f", "Mobility", "feat")
            .with_prerequisite(PrerequisiteExpr::new("HAS", "Dodge"))
            .with_change(Change::new("reflexDefenseBonus", 1));
        let mut hero = Actor::new("a", "Kel", "character").with_item(gated);
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        let bonus = |resolver: &mut AttributeResolver, hero: &Actor| {
            let query = Query::new().entity(hero).key("reflexDefenseBonus").reduce(Reduce::Sum);
            resolver.resolve(&query).as_number()
        };
        assert_eq!(bonus(&mut resolver, &hero), Some(0.0));

        hero.add_item(Item::new("d", "Dodge", "feat"));
        assert_eq!(bonus(&mut resolver, &hero), Some(1.0));
    }

    #[test]
    fn test_recursive_walk_still_checks_component_against_primary() {
        let hero = Actor::new("a", "Kel", "character").with_item(
            Item::new("f", "Mobility", "feat")
                .with_prerequisite(PrerequisiteExpr::new("HAS", "Dodge"))
                .with_change(Change::new("reflexDefenseBonus", 1)),
        );
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        let query = Query::new()
            .entity(&hero)
            .key("reflexDefenseBonus")
            .recursive(true)
            .reduce(Reduce::Sum);
        assert_eq!(resolver.resolve(&query).as_number(), Some(0.0));
    }

    #[test]
    fn test_mutated_override_child_invalidates() {
        let hero = Actor::new("a", "Kel", "character");
        let mut preview = Item::new("p", "Preview", "feat").with_change(Change::new("speed", 1));
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        let speed = |resolver: &mut AttributeResolver, preview: &Item| {
            let query = Query::new()
                .entity(&hero)
                .key("speed")
                .embedded_override(vec![preview as &dyn EntityLike])
                .reduce(Reduce::Sum);
            resolver.resolve(&query).as_number()
        };
        assert_eq!(speed(&mut resolver, &preview), Some(1.0));

        preview.add_change(Change::new("speed", 4));
        assert_eq!(speed(&mut resolver, &preview), Some(5.0));
    }

    #[test]
    fn test_multiple_targets_are_combined() {
        let hero = Actor::new("a", "Kel", "character").with_change(Change::new("toHitBonus", 2));
        let rifle = Item::new("w", "Rifle", "weapon").with_change(Change::new("toHitBonus", 1));
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        let query = Query::new()
            .entity(Target::owned(&rifle, &hero))
            .entity(&hero)
            .key("toHitBonus")
            .reduce(Reduce::Sum);
        assert_eq!(resolver.resolve(&query).as_number(), Some(3.0));
    }

    #[test]
    fn test_records_missing_key_are_excluded() {
        let mut resolver = AttributeResolver::new(EngineConfig::default());
        let query = Query::new().changes(vec![
            Change {
                key: None,
                ..Change::new("x", 1)
            },
            Change::new("x", 2),
        ]);
        assert_eq!(resolver.records(&query).len(), 1);
    }
}
