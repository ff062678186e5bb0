//! Resolution results.
//!
//! `Reduced` is what the facade hands back: a single answer for one
//! strategy, or a summary carrying the surviving records alongside one
//! answer per requested strategy.

use crate::key::AttributeKey;
use crate::modifier::ModifierRecord;
use crate::reduce::Reduce;
use crate::value::ModifierValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The answer to a resolution query.
///
/// Results are owned copies; mutating them never affects cached state.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::Reduced;
///
/// let total = Reduced::Number(3.0);
/// assert_eq!(total.as_number(), Some(3.0));
/// assert_eq!(total.as_bool(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reduced {
    Values(Vec<ModifierValue>),
    Numbers(Vec<f64>),
    Number(f64),
    Bool(bool),
    Optional(Option<ModifierValue>),
    Mapped(BTreeMap<AttributeKey, Vec<ModifierRecord>>),
    Summary {
        records: Vec<ModifierRecord>,
        results: Vec<(Reduce, Reduced)>,
    },
}

impl Reduced {
    /// The empty answer for a strategy, used when a query has no input.
    pub fn empty(strategy: Reduce) -> Self {
        strategy.apply(&[])
    }

    /// Numeric view: `Number`, or a numeric `Optional`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Reduced::Number(n) => Some(*n),
            Reduced::Optional(Some(v)) => v.as_number(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Reduced::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_values(&self) -> Option<&[ModifierValue]> {
        match self {
            Reduced::Values(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            Reduced::Numbers(n) => Some(n),
            _ => None,
        }
    }

    /// The single optional value from `First` or `Max`.
    pub fn as_optional(&self) -> Option<&ModifierValue> {
        match self {
            Reduced::Optional(v) => v.as_ref(),
            _ => None,
        }
    }

    /// Underlying records of a summary.
    pub fn records(&self) -> Option<&[ModifierRecord]> {
        match self {
            Reduced::Summary { records, .. } => Some(records),
            _ => None,
        }
    }

    /// Result for one strategy inside a summary.
    pub fn result(&self, strategy: Reduce) -> Option<&Reduced> {
        match self {
            Reduced::Summary { results, .. } => results
                .iter()
                .find(|(s, _)| *s == strategy)
                .map(|(_, r)| r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Change;

    #[test]
    fn test_empty_answers() {
        assert_eq!(Reduced::empty(Reduce::Sum), Reduced::Number(0.0));
        assert_eq!(Reduced::empty(Reduce::Or), Reduced::Bool(false));
        assert_eq!(Reduced::empty(Reduce::Values).as_values(), Some(&[][..]));
    }

    #[test]
    fn test_optional_numeric_view() {
        let first = Reduced::Optional(Some(ModifierValue::from("4")));
        assert_eq!(first.as_number(), Some(4.0));
        assert_eq!(first.as_optional(), Some(&ModifierValue::from("4")));
        assert_eq!(Reduced::Optional(None).as_number(), None);
    }

    #[test]
    fn test_summary_lookup() {
        let records = vec![ModifierRecord::inline(&Change::new("k", 2))];
        let summary = Reduced::Summary {
            records: records.clone(),
            results: vec![(Reduce::Sum, Reduced::Number(2.0))],
        };
        assert_eq!(summary.records(), Some(records.as_slice()));
        assert_eq!(summary.result(Reduce::Sum), Some(&Reduced::Number(2.0)));
        assert_eq!(summary.result(Reduce::Or), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Reduced::Values(vec!["a".into()]);
        let mut copy = original.clone();
        if let Reduced::Values(v) = &mut copy {
            v.push("b".into());
        }
        assert_eq!(original.as_values().map(<[ModifierValue]>::len), Some(1));
    }
}
