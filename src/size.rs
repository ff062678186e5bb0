//! Size resolver.
//!
//! An entity's size is the largest base size any contributor declares plus
//! the sum of signed size bonuses. Computing it walks the same graph as any
//! other statistic, but with the size-skip flag forced on: the scaling pass
//! needs size, so the size walk must never trigger scaling.

use crate::content::EngineConfig;
use crate::entity::Target;
use crate::key::KeySelector;
use crate::modifier::{Change, ModifierRecord};
use crate::query::Query;
use crate::resolver::AttributeResolver;

/// Which size statistic to compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SizeStatistic {
    /// The index on the size scale.
    #[default]
    Size,
    /// Size used for the damage threshold, which also takes the dedicated
    /// damage-threshold size modifiers into account.
    DamageThreshold,
}

/// Compute a size index from already-collected size records.
///
/// Returns `None` when no record declares a base size.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::{Change, EngineConfig, ModifierRecord, SizeStatistic};
/// use sheetcalc::size::size_from_records;
///
/// let config = EngineConfig::default();
/// let records: Vec<ModifierRecord> = [Change::new("size", "Large"), Change::new("sizeBonus", "1")]
///     .iter()
///     .map(ModifierRecord::inline)
///     .collect();
///
/// let large = config.size_scale.index_of("Large").unwrap() as i32;
/// assert_eq!(size_from_records(&config, &records, SizeStatistic::Size), Some(large + 1));
/// ```
pub fn size_from_records(
    config: &EngineConfig,
    records: &[ModifierRecord],
    statistic: SizeStatistic,
) -> Option<i32> {
    let base = base_size(config, records)?;
    Some(base.saturating_add(size_adjustment(config, records, statistic)))
}

/// Largest declared base size, from size keywords and size indices.
fn base_size(config: &EngineConfig, records: &[ModifierRecord]) -> Option<i32> {
    let keys = &config.size_keys;
    let mut base: Option<i32> = None;
    for record in records {
        let Some(key) = record.key.as_ref() else {
            continue;
        };
        let index = if *key == keys.size {
            let Some(name) = record.value.as_text() else {
                continue;
            };
            match config.size_scale.index_of(name) {
                Some(index) => index as i32,
                None => {
                    tracing::warn!(size = name, source = %record.source, "unknown size keyword ignored");
                    continue;
                }
            }
        } else if *key == keys.size_index {
            match record.value.as_number() {
                Some(n) => n.trunc() as i32,
                None => continue,
            }
        } else {
            continue;
        };
        base = Some(base.map_or(index, |b| b.max(index)));
    }
    base
}

/// Sum of signed adjustments for the statistic.
fn size_adjustment(config: &EngineConfig, records: &[ModifierRecord], statistic: SizeStatistic) -> i32 {
    let keys = &config.size_keys;
    records
        .iter()
        .filter_map(|r| {
            let key = r.key.as_ref()?;
            let counts = *key == keys.size_bonus
                || (statistic == SizeStatistic::DamageThreshold
                    && *key == keys.damage_threshold_size_modifier);
            if counts {
                r.value.as_number()
            } else {
                None
            }
        })
        .sum::<f64>()
        .trunc() as i32
}

impl AttributeResolver {
    /// Resolve an entity's size index.
    ///
    /// `overrides` are extra size changes considered alongside the entity's
    /// own; for an unattached component they replace the walk entirely.
    pub fn resolve_size(&mut self, target: Target<'_>, overrides: Option<&[Change]>) -> i32 {
        self.resolve_size_statistic(target, SizeStatistic::Size, overrides)
    }

    /// Resolve a size statistic.
    ///
    /// A component delegates to its owner. An unattached component uses the
    /// overrides if given, otherwise its stored size, otherwise the default.
    pub fn resolve_size_statistic(
        &mut self,
        target: Target<'_>,
        statistic: SizeStatistic,
        overrides: Option<&[Change]>,
    ) -> i32 {
        if !target.entity.is_primary() {
            if let Some(owner) = target.owner {
                return self.resolve_size_statistic(Target::primary(owner), statistic, overrides);
            }
            return self.unattached_size(target, statistic, overrides);
        }

        self.stats.size_resolutions += 1;
        let keys = &self.config.size_keys;
        let selector = KeySelector::any_of(keys.all().into_iter().cloned());
        let query = Query::new()
            .entity(target)
            .key(selector)
            .changes(overrides.map(<[Change]>::to_vec).unwrap_or_default())
            .context(size_walk_context());
        let records = self.records(&query);

        let index = size_from_records(&self.config, &records, statistic).unwrap_or_else(|| {
            let base = target
                .entity
                .stored_size()
                .and_then(|name| self.config.size_scale.index_of(name))
                .map(|i| i as i32)
                .unwrap_or_else(|| self.config.default_size_index());
            base.saturating_add(size_adjustment(&self.config, &records, statistic))
        });
        tracing::debug!(entity = %target.entity.id(), ?statistic, index, "resolved size");
        index
    }

    /// Resolve size and map it onto the scale, clamped to its ends.
    pub fn resolve_size_name(&mut self, target: Target<'_>) -> Option<String> {
        let index = self.resolve_size(target, None);
        self.config.size_scale.name_at(index).map(str::to_string)
    }

    fn unattached_size(
        &mut self,
        target: Target<'_>,
        statistic: SizeStatistic,
        overrides: Option<&[Change]>,
    ) -> i32 {
        self.stats.size_resolutions += 1;
        if let Some(changes) = overrides {
            let records: Vec<ModifierRecord> = changes.iter().map(ModifierRecord::inline).collect();
            if let Some(index) = size_from_records(&self.config, &records, statistic) {
                return index;
            }
        }
        target
            .entity
            .stored_size()
            .and_then(|name| self.config.size_scale.index_of(name))
            .map(|i| i as i32)
            .unwrap_or_else(|| self.config.default_size_index())
    }
}

/// Flags for the guarded size walk.
fn size_walk_context() -> crate::context::ResolutionContext {
    crate::context::ResolutionContext::new().for_size_resolution()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(changes: &[Change]) -> Vec<ModifierRecord> {
        changes.iter().map(ModifierRecord::inline).collect()
    }

    #[test]
    fn test_max_base_plus_bonuses() {
        let config = EngineConfig::default();
        let list = records(&[
            Change::new("size", "small"),
            Change::new("size", "LARGE"),
            Change::new("sizeBonus", "1"),
            Change::new("sizeBonus", -2),
        ]);
        assert_eq!(size_from_records(&config, &list, SizeStatistic::Size), Some(4));
    }

    #[test]
    fn test_size_index_contributes_to_base() {
        let config = EngineConfig::default();
        let list = records(&[Change::new("size", "Medium"), Change::new("sizeIndex", 6)]);
        assert_eq!(size_from_records(&config, &list, SizeStatistic::Size), Some(6));
    }

    #[test]
    fn test_damage_threshold_adds_its_own_modifier() {
        let config = EngineConfig::default();
        let list = records(&[
            Change::new("size", "Medium"),
            Change::new("damageThresholdSizeModifier", 2),
        ]);
        assert_eq!(size_from_records(&config, &list, SizeStatistic::Size), Some(4));
        assert_eq!(
            size_from_records(&config, &list, SizeStatistic::DamageThreshold),
            Some(6)
        );
    }

    #[test]
    fn test_huge_size_index_saturates() {
        let config = EngineConfig::default();
        let list = records(&[Change::new("sizeIndex", 1e12), Change::new("sizeBonus", 1)]);
        assert_eq!(size_from_records(&config, &list, SizeStatistic::Size), Some(i32::MAX));

        let list = records(&[Change::new("size", "Medium"), Change::new("sizeBonus", 1e12)]);
        assert_eq!(size_from_records(&config, &list, SizeStatistic::Size), Some(i32::MAX));
    }

    #[test]
    fn test_no_base_yields_none() {
        let config = EngineConfig::default();
        let list = records(&[Change::new("sizeBonus", 1), Change::new("size", "Titanic")]);
        assert_eq!(size_from_records(&config, &list, SizeStatistic::Size), None);
    }
}
