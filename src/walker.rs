//! Graph walker.
//!
//! Collects candidate records from an entity, the child components it
//! owns, the effect records attached to any of them, and the consumable
//! loaded into a component. Nothing here filters by key or prerequisite;
//! that happens later in the facade.

use crate::content::EngineConfig;
use crate::context::ResolutionContext;
use crate::entity::EntityLike;
use crate::modifier::ModifierRecord;
use crate::query::ItemFilter;

/// A record plus the entity whose data carried it.
#[derive(Clone)]
pub struct Candidate<'a> {
    pub record: ModifierRecord,
    /// The entity or component the record was read from. For effect
    /// records this is the entity owning the effect; inline changes have
    /// no origin.
    pub origin: Option<&'a dyn EntityLike>,
}

impl std::fmt::Debug for Candidate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("record", &self.record)
            .field("origin", &self.origin.map(|o| o.id()))
            .finish()
    }
}

/// Per-walk options.
#[derive(Clone, Copy)]
pub struct WalkOptions<'q, 'a> {
    pub item_filter: &'q ItemFilter,
    /// Children to walk instead of the root primary entity's own.
    pub embedded_override: Option<&'q [&'a dyn EntityLike]>,
    pub context: ResolutionContext,
}

/// Walks the entity graph for one root.
///
/// Missing references are skipped and absent optional data contributes
/// nothing; the walk never fails.
pub struct GraphWalker<'c> {
    config: &'c EngineConfig,
}

impl<'c> GraphWalker<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    /// Collect every candidate record reachable from `entity`.
    pub fn collect<'a>(
        &self,
        entity: &'a dyn EntityLike,
        options: &WalkOptions<'_, 'a>,
    ) -> Vec<Candidate<'a>> {
        self.collect_inner(entity, options, options.context, false)
    }

    fn collect_inner<'a>(
        &self,
        entity: &'a dyn EntityLike,
        options: &WalkOptions<'_, 'a>,
        context: ResolutionContext,
        aggregated: bool,
    ) -> Vec<Candidate<'a>> {
        let mut out = Vec::new();
        let allow_list = if aggregated {
            self.config.propagation_for(entity.content_type())
        } else {
            None
        };

        if !context.skip_local {
            for record in entity.local_modifiers() {
                if allow_list.is_some_and(|keys| !record.key.as_ref().is_some_and(|k| keys.contains(k))) {
                    tracing::trace!(
                        key = ?record.key,
                        source = %entity.id(),
                        "key not propagated to owner"
                    );
                    continue;
                }
                out.push(Candidate {
                    record,
                    origin: Some(entity),
                });
            }
        }

        if entity.is_primary() {
            let children = match options.embedded_override {
                Some(children) if !aggregated => children.to_vec(),
                _ => entity.children(),
            };
            for child in children {
                if !options.item_filter.admits(child) {
                    tracing::trace!(child = %child.id(), "component pruned by item filter");
                    continue;
                }
                let inherited = child.prerequisite();
                for mut candidate in self.collect_inner(child, options, context.for_child(), true) {
                    if candidate.record.parent_prerequisite.is_none() {
                        candidate.record.parent_prerequisite = inherited.cloned();
                    }
                    out.push(candidate);
                }
            }
        }

        let levels = entity.levels_taken();
        for effect in entity.effects() {
            if !effect.is_active(levels) {
                tracing::trace!(effect = %effect.id(), source = %entity.id(), "effect inactive");
                continue;
            }
            out.extend(effect.modifiers().into_iter().map(|record| Candidate {
                record,
                origin: Some(entity),
            }));
        }

        if let Some(consumable) = entity.loaded_consumable() {
            let held_back = consumable.non_inheritable_keys();
            for candidate in self.collect_inner(consumable, options, context.for_child(), false) {
                let Some(key) = candidate.record.key.as_ref() else {
                    out.push(candidate);
                    continue;
                };
                if held_back.contains(key) {
                    continue;
                }
                if allow_list.is_some_and(|keys| !keys.contains(key)) {
                    continue;
                }
                out.push(candidate);
            }
        }

        if !entity.is_primary() && self.config.is_size_marker(entity.content_type(), entity.name()) {
            let keys = &self.config.size_keys;
            out.retain(|c| c.record.key.as_ref().is_some_and(|k| keys.is_size_key(k)));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{Change, PrerequisiteExpr};
    use crate::sheet::{Actor, Effect, Item};

    fn keys(candidates: &[Candidate<'_>]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| c.record.key_str().unwrap_or("<none>").to_string())
            .collect()
    }

    fn walk<'a>(config: &EngineConfig, entity: &'a dyn EntityLike) -> Vec<Candidate<'a>> {
        let filter = ItemFilter::default();
        let options = WalkOptions {
            item_filter: &filter,
            embedded_override: None,
            context: ResolutionContext::new(),
        };
        GraphWalker::new(config).collect(entity, &options)
    }

    #[test]
    fn test_collects_local_children_and_effects() {
        let config = EngineConfig::default();
        let actor = Actor::new("a", "Kel", "character")
            .with_change(Change::new("skillBonus", 1))
            .with_item(Item::new("f", "Toughness", "feat").with_change(Change::new("hitPoints", 3)))
            .with_effect(Effect::new("e", "Inspired").with_change(Change::new("skillBonus", 2)));

        assert_eq!(keys(&walk(&config, &actor)), vec!["skillBonus", "hitPoints", "skillBonus"]);
    }

    #[test]
    fn test_weapon_allow_list_applies_only_when_aggregated() {
        let config = EngineConfig::default();
        let blaster = Item::new("w", "Blaster", "weapon")
            .with_change(Change::new("toHit", 1))
            .with_change(Change::new("skillBonus", 1));
        let actor = Actor::new("a", "Kel", "character").with_item(blaster.clone());

        assert_eq!(keys(&walk(&config, &actor)), vec!["skillBonus"]);
        assert_eq!(keys(&walk(&config, &blaster)), vec!["toHit", "skillBonus"]);
    }

    #[test]
    fn test_level_gated_effects() {
        let config = EngineConfig::default();
        let class = Item::new("c", "Jedi", "class")
            .with_levels(1)
            .with_effect(Effect::new("e", "Talent").at_level(2).with_change(Change::new("forcePoints", 1)));
        assert!(walk(&config, &class).is_empty());

        let class = class.with_levels(2);
        assert_eq!(keys(&walk(&config, &class)), vec!["forcePoints"]);
    }

    #[test]
    fn test_loaded_consumable_minus_non_inheritable() {
        let config = EngineConfig::default();
        let gun = Item::new("g", "Blaster", "ranged").with_loaded(
            Item::new("p", "Power Pack", "ammunition")
                .with_change(Change::new("damageBonus", 1))
                .with_change(Change::new("weight", 0.5))
                .not_inherited("weight"),
        );
        assert_eq!(keys(&walk(&config, &gun)), vec!["damageBonus"]);
    }

    #[test]
    fn test_size_marker_contributes_only_size_keys() {
        let config = EngineConfig::default();
        let actor = Actor::new("a", "Kel", "character").with_item(
            Item::new("t", "Large", "trait")
                .with_change(Change::new("size", "Large"))
                .with_change(Change::new("strength", 8)),
        );
        assert_eq!(keys(&walk(&config, &actor)), vec!["size"]);
    }

    #[test]
    fn test_child_prerequisite_becomes_parent_prerequisite() {
        let config = EngineConfig::default();
        let gate = PrerequisiteExpr::new("HAS", "Dodge");
        let actor = Actor::new("a", "Kel", "character").with_item(
            Item::new("f", "Mobility", "feat")
                .with_prerequisite(gate.clone())
                .with_change(Change::new("reflexDefenseBonus", 1)),
        );
        let candidates = walk(&config, &actor);
        assert_eq!(candidates[0].record.parent_prerequisite, Some(gate));
        assert_eq!(candidates[0].origin.map(|o| o.id()), Some("f"));
    }

    #[test]
    fn test_skip_local_keeps_children() {
        let config = EngineConfig::default();
        let actor = Actor::new("a", "Kel", "character")
            .with_change(Change::new("own", 1))
            .with_item(Item::new("f", "Feat", "feat").with_change(Change::new("child", 1)));
        let filter = ItemFilter::default();
        let options = WalkOptions {
            item_filter: &filter,
            embedded_override: None,
            context: ResolutionContext::new().with_skip_local(true),
        };
        let candidates = GraphWalker::new(&config).collect(&actor, &options);
        assert_eq!(keys(&candidates), vec!["child"]);
    }

    #[test]
    fn test_embedded_override_replaces_children() {
        let config = EngineConfig::default();
        let actor = Actor::new("a", "Kel", "character")
            .with_item(Item::new("f", "Feat", "feat").with_change(Change::new("real", 1)));
        let preview = Item::new("p", "Preview", "feat").with_change(Change::new("hypothetical", 1));
        let children: Vec<&dyn EntityLike> = vec![&preview];
        let filter = ItemFilter::default();
        let options = WalkOptions {
            item_filter: &filter,
            embedded_override: Some(children.as_slice()),
            context: ResolutionContext::new(),
        };
        let candidates = GraphWalker::new(&config).collect(&actor, &options);
        assert_eq!(keys(&candidates), vec!["hypothetical"]);
    }
}
