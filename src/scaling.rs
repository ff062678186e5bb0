//! Scaling expander.
//!
//! Replaces every scalable record with the concrete records its template
//! lists for the entity's resolved size. Non-scalable records pass through
//! in place, so relative order is kept.

use crate::content::EngineConfig;
use crate::modifier::ModifierRecord;
use crate::walker::Candidate;

/// Substitutes scalable templates for one resolved size.
pub struct ScalingExpander<'c> {
    config: &'c EngineConfig,
}

impl<'c> ScalingExpander<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    pub fn is_scalable(&self, record: &ModifierRecord) -> bool {
        record
            .key
            .as_ref()
            .is_some_and(|k| self.config.is_scalable(k))
    }

    /// Whether any candidate carries a scalable key.
    pub fn needs_expansion(&self, candidates: &[Candidate<'_>]) -> bool {
        candidates.iter().any(|c| self.is_scalable(&c.record))
    }

    /// Expand scalable candidates for `size_name`.
    ///
    /// A template cell that does not exist drops the record; a replacement
    /// that is itself scalable is dropped too, so expansion is idempotent.
    pub fn expand<'a>(&self, candidates: Vec<Candidate<'a>>, size_name: &str) -> Vec<Candidate<'a>> {
        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !self.is_scalable(&candidate.record) {
                out.push(candidate);
                continue;
            }
            let Some(key) = candidate.record.key.as_ref() else {
                continue;
            };
            let Some(replacements) =
                self.config
                    .scalable_templates
                    .lookup(key.as_str(), &candidate.record.value, size_name)
            else {
                tracing::warn!(
                    key = %key,
                    value = %candidate.record.value,
                    size = size_name,
                    source = %candidate.record.source,
                    "no scalable template for size; modifier dropped"
                );
                continue;
            };
            for change in replacements {
                let mut record = ModifierRecord::from_change(
                    change,
                    candidate.record.source.clone(),
                    candidate.record.source_string.clone(),
                    candidate.record.source_description.clone(),
                );
                if self.is_scalable(&record) {
                    tracing::warn!(
                        template = %key,
                        size = size_name,
                        "scalable template expands into a scalable modifier; replacement dropped"
                    );
                    continue;
                }
                if record.prerequisite.is_none() {
                    record.prerequisite = candidate.record.prerequisite.clone();
                }
                if record.parent_prerequisite.is_none() {
                    record.parent_prerequisite = candidate.record.parent_prerequisite.clone();
                }
                out.push(Candidate {
                    record,
                    origin: candidate.origin,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ScalableTemplates;
    use crate::modifier::{Change, PrerequisiteExpr};

    fn config() -> EngineConfig {
        EngineConfig::default().with_templates(
            ScalableTemplates::new()
                .with(
                    "unarmedDamageScalable",
                    "1d4",
                    "Small",
                    vec![Change::new("unarmedDamage", "1d3")],
                )
                .with(
                    "unarmedDamageScalable",
                    "1d4",
                    "Medium",
                    vec![
                        Change::new("unarmedDamage", "1d4"),
                        Change::new("unarmedDamageBonus", 0),
                    ],
                )
                .with(
                    "loopScalable",
                    "x",
                    "Medium",
                    vec![Change::new("loopScalable", "x"), Change::new("loop", "ok")],
                ),
        )
    }

    fn inline(change: Change) -> Candidate<'static> {
        Candidate {
            record: ModifierRecord::inline(&change),
            origin: None,
        }
    }

    fn values(candidates: &[Candidate<'_>]) -> Vec<String> {
        candidates.iter().map(|c| c.record.value.to_string()).collect()
    }

    #[test]
    fn test_expands_for_size_and_keeps_order() {
        let config = config();
        let expander = ScalingExpander::new(&config);
        let input = vec![
            inline(Change::new("before", "a")),
            inline(Change::new("unarmedDamageScalable", "1d4")),
            inline(Change::new("after", "b")),
        ];
        assert!(expander.needs_expansion(&input));

        let medium = expander.expand(input.clone(), "Medium");
        assert_eq!(values(&medium), vec!["a", "1d4", "0", "b"]);

        let small = expander.expand(input, "small");
        assert_eq!(values(&small), vec!["a", "1d3", "b"]);
    }

    #[test]
    fn test_missing_cell_drops_record() {
        let config = config();
        let expander = ScalingExpander::new(&config);
        let out = expander.expand(vec![inline(Change::new("unarmedDamageScalable", "1d4"))], "Huge");
        assert!(out.is_empty());
    }

    #[test]
    fn test_scalable_replacements_are_dropped() {
        let config = config();
        let expander = ScalingExpander::new(&config);
        let out = expander.expand(vec![inline(Change::new("loopScalable", "x"))], "Medium");
        assert_eq!(values(&out), vec!["ok"]);
        assert!(!expander.needs_expansion(&out));
    }

    #[test]
    fn test_replacements_inherit_prerequisites() {
        let config = config();
        let expander = ScalingExpander::new(&config);
        let gate = PrerequisiteExpr::new("HAS", "Martial Arts I");
        let out = expander.expand(
            vec![inline(
                Change::new("unarmedDamageScalable", "1d4").with_prerequisite(gate.clone()),
            )],
            "Small",
        );
        assert_eq!(out[0].record.prerequisite, Some(gate));
    }
}
