//! Modifier records.
//!
//! A `Change` is the persisted shape authored content uses. The walker turns
//! changes into `ModifierRecord`s by stamping on where they came from; the
//! record is the unit every filter and reduction works on.

use crate::key::AttributeKey;
use crate::value::ModifierValue;
use serde::{Deserialize, Serialize};

/// How a modifier is meant to combine with others.
///
/// The engine carries the mode through unchanged; only attribute filters
/// and downstream consumers look at it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierMode {
    Custom,
    Multiply,
    #[default]
    Add,
    Downgrade,
    Upgrade,
    Override,
}

/// Prerequisite expression tree.
///
/// Opaque to the engine beyond its shape; a `PrerequisiteGate` decides
/// whether it holds for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteExpr {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PrerequisiteExpr>,
}

impl PrerequisiteExpr {
    pub fn new(kind: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            requirement: Some(requirement.into()),
            children: Vec::new(),
        }
    }

    pub fn group(kind: impl Into<String>, children: Vec<PrerequisiteExpr>) -> Self {
        Self {
            kind: kind.into(),
            requirement: None,
            children,
        }
    }
}

/// Persisted modifier shape, as authored on items, actors and effects.
///
/// `key` is optional because content is not validated; a change without a
/// key is carried until the key filter drops it.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::Change;
///
/// let change: Change = serde_json::from_str(r#"{"key": "skillBonus", "value": "2"}"#).unwrap();
/// assert_eq!(change.key.unwrap().as_str(), "skillBonus");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub key: Option<AttributeKey>,
    pub value: ModifierValue,
    #[serde(default)]
    pub mode: ModifierMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisite: Option<PrerequisiteExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "parentPrerequisite")]
    pub parent_prerequisite: Option<PrerequisiteExpr>,
    /// Situational rather than baseline.
    #[serde(default, rename = "modifier")]
    pub situational: bool,
}

impl Change {
    pub fn new(key: impl Into<AttributeKey>, value: impl Into<ModifierValue>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
            mode: ModifierMode::default(),
            prerequisite: None,
            parent_prerequisite: None,
            situational: false,
        }
    }

    pub fn with_mode(mut self, mode: ModifierMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_prerequisite(mut self, prerequisite: PrerequisiteExpr) -> Self {
        self.prerequisite = Some(prerequisite);
        self
    }

    pub fn with_parent_prerequisite(mut self, prerequisite: PrerequisiteExpr) -> Self {
        self.parent_prerequisite = Some(prerequisite);
        self
    }

    pub fn situational(mut self) -> Self {
        self.situational = true;
        self
    }
}

/// A change tagged with its origin, ready to be filtered and reduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierRecord {
    pub key: Option<AttributeKey>,
    pub value: ModifierValue,
    pub mode: ModifierMode,
    /// Id of the entity or effect that contributed this record.
    pub source: String,
    /// Display name of the contributor.
    pub source_string: String,
    pub source_description: String,
    pub prerequisite: Option<PrerequisiteExpr>,
    pub parent_prerequisite: Option<PrerequisiteExpr>,
    pub situational: bool,
}

impl ModifierRecord {
    /// Build a record from a persisted change and its contributor.
    pub fn from_change(
        change: &Change,
        source: impl Into<String>,
        source_string: impl Into<String>,
        source_description: impl Into<String>,
    ) -> Self {
        Self {
            key: change.key.clone(),
            value: change.value.clone(),
            mode: change.mode,
            source: source.into(),
            source_string: source_string.into(),
            source_description: source_description.into(),
            prerequisite: change.prerequisite.clone(),
            parent_prerequisite: change.parent_prerequisite.clone(),
            situational: change.situational,
        }
    }

    /// Record with no contributor, for inline changes supplied by a caller.
    pub fn inline(change: &Change) -> Self {
        Self::from_change(change, "", "", "")
    }

    pub fn key_str(&self) -> Option<&str> {
        self.key.as_ref().map(AttributeKey::as_str)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.key_str() == Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_defaults() {
        let change: Change = serde_json::from_str(r#"{"value": 1}"#).unwrap();
        assert!(change.key.is_none());
        assert_eq!(change.mode, ModifierMode::Add);
        assert!(!change.situational);
    }

    #[test]
    fn test_change_with_prerequisites() {
        let json = r#"{
            "key": "skillBonus",
            "value": "2",
            "mode": "override",
            "modifier": true,
            "prerequisite": {"type": "HAS", "requirement": "Skill Focus"},
            "parentPrerequisite": {"type": "AND", "children": [{"type": "LEVEL", "requirement": "2"}]}
        }"#;
        let change: Change = serde_json::from_str(json).unwrap();
        assert_eq!(change.mode, ModifierMode::Override);
        assert!(change.situational);
        assert_eq!(
            change.prerequisite,
            Some(PrerequisiteExpr::new("HAS", "Skill Focus"))
        );
        assert_eq!(change.parent_prerequisite.unwrap().children.len(), 1);
    }

    #[test]
    fn test_record_from_change() {
        let change = Change::new("skillBonus", "2");
        let record = ModifierRecord::from_change(&change, "item-1", "Lucky Charm", "trinket");
        assert!(record.has_key("skillBonus"));
        assert_eq!(record.source, "item-1");
        assert_eq!(record.source_string, "Lucky Charm");
    }
}
