//! Reduction strategies.
//!
//! A strategy collapses the filtered record list into the answer a caller
//! asked for. Each strategy is a pure function over a slice; none of them
//! mutates its input.

use crate::key::AttributeKey;
use crate::modifier::ModifierRecord;
use crate::resolved::Reduced;
use crate::value::ModifierValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named reduction strategy.
///
/// | strategy | result |
/// |---|---|
/// | `Values` | raw values, order preserved |
/// | `ValuesToLowercase` | values, text lowercased |
/// | `Unique` | values with duplicates removed, first occurrence kept |
/// | `Sum` | numeric sum, non-numeric counts as 0 |
/// | `First` | first value, if any |
/// | `Max` | greatest numeric value, if any |
/// | `Or` | whether any value is truthy |
/// | `NumericValues` | numeric values, non-numeric dropped |
/// | `Summary` | the records themselves |
/// | `Mapped` | the records grouped by key |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reduce {
    Values,
    ValuesToLowercase,
    Unique,
    Sum,
    First,
    Max,
    Or,
    NumericValues,
    Summary,
    Mapped,
}

impl Reduce {
    /// Apply this strategy to a record list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sheetcalc::{Change, ModifierRecord, Reduce, Reduced};
    ///
    /// let records: Vec<ModifierRecord> = [Change::new("skillBonus", "2"), Change::new("skillBonus", 3)]
    ///     .iter()
    ///     .map(ModifierRecord::inline)
    ///     .collect();
    ///
    /// assert_eq!(Reduce::Sum.apply(&records), Reduced::Number(5.0));
    /// assert_eq!(Reduce::Sum.apply(&[]), Reduced::Number(0.0));
    /// ```
    pub fn apply(self, records: &[ModifierRecord]) -> Reduced {
        match self {
            Reduce::Values => Reduced::Values(values(records)),
            Reduce::ValuesToLowercase => Reduced::Values(values_to_lowercase(records)),
            Reduce::Unique => Reduced::Values(unique(records)),
            Reduce::Sum => Reduced::Number(sum(records)),
            Reduce::First => Reduced::Optional(first(records)),
            Reduce::Max => Reduced::Optional(max(records).map(ModifierValue::Number)),
            Reduce::Or => Reduced::Bool(or(records)),
            Reduce::NumericValues => Reduced::Numbers(numeric_values(records)),
            Reduce::Summary => Reduced::Summary {
                records: records.to_vec(),
                results: Vec::new(),
            },
            Reduce::Mapped => Reduced::Mapped(mapped(records)),
        }
    }
}

/// One strategy, or an ordered list yielding a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReduceRequest {
    One(Reduce),
    Many(Vec<Reduce>),
}

impl ReduceRequest {
    /// Apply the request. A list produces `Reduced::Summary` carrying the
    /// records and one result per strategy, in request order.
    pub fn apply(&self, records: &[ModifierRecord]) -> Reduced {
        match self {
            ReduceRequest::One(strategy) => strategy.apply(records),
            ReduceRequest::Many(strategies) => Reduced::Summary {
                records: records.to_vec(),
                results: strategies
                    .iter()
                    .map(|s| (*s, s.apply(records)))
                    .collect(),
            },
        }
    }

    pub fn identity(&self) -> String {
        match self {
            ReduceRequest::One(strategy) => format!("{strategy:?}"),
            ReduceRequest::Many(strategies) => strategies
                .iter()
                .map(|s| format!("{s:?}"))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl Default for ReduceRequest {
    fn default() -> Self {
        ReduceRequest::One(Reduce::Values)
    }
}

impl From<Reduce> for ReduceRequest {
    fn from(strategy: Reduce) -> Self {
        ReduceRequest::One(strategy)
    }
}

impl From<Vec<Reduce>> for ReduceRequest {
    fn from(strategies: Vec<Reduce>) -> Self {
        ReduceRequest::Many(strategies)
    }
}

pub fn values(records: &[ModifierRecord]) -> Vec<ModifierValue> {
    records.iter().map(|r| r.value.clone()).collect()
}

pub fn values_to_lowercase(records: &[ModifierRecord]) -> Vec<ModifierValue> {
    records.iter().map(|r| r.value.to_lowercase()).collect()
}

pub fn unique(records: &[ModifierRecord]) -> Vec<ModifierValue> {
    let mut seen: Vec<ModifierValue> = Vec::with_capacity(records.len());
    for record in records {
        if !seen.contains(&record.value) {
            seen.push(record.value.clone());
        }
    }
    seen
}

pub fn sum(records: &[ModifierRecord]) -> f64 {
    records
        .iter()
        .map(|r| r.value.as_number().unwrap_or(0.0))
        .fold(0.0, |acc, n| acc + n)
}

pub fn first(records: &[ModifierRecord]) -> Option<ModifierValue> {
    records.first().map(|r| r.value.clone())
}

pub fn max(records: &[ModifierRecord]) -> Option<f64> {
    records
        .iter()
        .filter_map(|r| r.value.as_number())
        .fold(None, |acc, n| match acc {
            Some(m) if m >= n => Some(m),
            _ => Some(n),
        })
}

pub fn or(records: &[ModifierRecord]) -> bool {
    records.iter().any(|r| r.value.is_truthy())
}

pub fn numeric_values(records: &[ModifierRecord]) -> Vec<f64> {
    records.iter().filter_map(|r| r.value.as_number()).collect()
}

pub fn mapped(records: &[ModifierRecord]) -> BTreeMap<AttributeKey, Vec<ModifierRecord>> {
    let mut groups: BTreeMap<AttributeKey, Vec<ModifierRecord>> = BTreeMap::new();
    for record in records {
        if let Some(key) = &record.key {
            groups.entry(key.clone()).or_default().push(record.clone());
        }
    }
    groups
}
