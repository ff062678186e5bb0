//! Static rule content consumed by the engine.
//!
//! Which sizes exist, which keys carry size, which modifiers scale with size
//! and how, and which component types only pass some keys up to their
//! owner. None of this is behavior; it is loaded from TOML or JSON so rule
//! content can change without code changes.
//!
//! # Examples
//!
//! ```
//! use sheetcalc::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     size_scale = ["Small", "Medium", "Large"]
//!     default_size = "Medium"
//!
//!     [propagation]
//!     weapon = ["skillBonus"]
//!
//!     [scalable_templates.unarmedDamageScalable."1d4"]
//!     Medium = [{ key = "unarmedDamage", value = "1d4" }]
//!     Large = [{ key = "unarmedDamage", value = "1d6" }]
//! "#).unwrap();
//!
//! assert_eq!(config.size_scale.index_of("large"), Some(2));
//! assert!(config.validate().is_ok());
//! ```

use crate::error::ContentError;
use crate::key::AttributeKey;
use crate::modifier::Change;
use crate::value::ModifierValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The ordered list of size names, smallest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeScale(Vec<String>);

impl SizeScale {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Position of a size name, compared case-insensitively.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.0.iter().position(|s| s.eq_ignore_ascii_case(name))
    }

    /// Size name at an index, clamped onto the scale.
    pub fn name_at(&self, index: i32) -> Option<&str> {
        if self.0.is_empty() {
            return None;
        }
        let clamped = index.clamp(0, self.0.len() as i32 - 1) as usize;
        Some(&self.0[clamped])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SizeScale {
    fn default() -> Self {
        Self::new([
            "Fine",
            "Diminutive",
            "Tiny",
            "Small",
            "Medium",
            "Large",
            "Huge",
            "Gargantuan",
            "Colossal",
            "Colossal (Frigate)",
            "Colossal (Cruiser)",
            "Colossal (Station)",
        ])
    }
}

/// Keys that feed the size resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeKeys {
    /// Size keyword, e.g. `"Large"`.
    pub size: AttributeKey,
    /// Numeric size index.
    pub size_index: AttributeKey,
    /// Signed steps up or down the scale.
    pub size_bonus: AttributeKey,
    /// Signed adjustment used only for the damage-threshold size modifier.
    pub damage_threshold_size_modifier: AttributeKey,
}

impl SizeKeys {
    pub fn all(&self) -> [&AttributeKey; 4] {
        [
            &self.size,
            &self.size_index,
            &self.size_bonus,
            &self.damage_threshold_size_modifier,
        ]
    }

    pub fn is_size_key(&self, key: &AttributeKey) -> bool {
        self.all().into_iter().any(|k| k == key)
    }
}

impl Default for SizeKeys {
    fn default() -> Self {
        Self {
            size: "size".into(),
            size_index: "sizeIndex".into(),
            size_bonus: "sizeBonus".into(),
            damage_threshold_size_modifier: "damageThresholdSizeModifier".into(),
        }
    }
}

/// Size-dependent replacement table:
/// `template key -> template value -> size name -> replacement changes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalableTemplates(BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<Change>>>>);

impl ScalableTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the replacements for one `(key, value, size)` cell.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        size: impl Into<String>,
        replacements: Vec<Change>,
    ) {
        self.0
            .entry(key.into())
            .or_default()
            .entry(value.into())
            .or_default()
            .insert(size.into(), replacements);
    }

    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        size: impl Into<String>,
        replacements: Vec<Change>,
    ) -> Self {
        self.insert(key, value, size, replacements);
        self
    }

    /// Look up the replacements for a scalable modifier at a size.
    ///
    /// The size name compares case-insensitively; key and value exactly.
    pub fn lookup(&self, key: &str, value: &ModifierValue, size: &str) -> Option<&[Change]> {
        let by_value = self.0.get(key)?;
        let by_size = by_value.get(&value.to_string())?;
        by_size
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(size))
            .map(|(_, changes)| changes.as_slice())
    }

    fn cells(&self) -> impl Iterator<Item = (&str, &str, &[Change])> {
        self.0.iter().flat_map(|(key, by_value)| {
            by_value.values().flat_map(move |by_size| {
                by_size
                    .iter()
                    .map(move |(size, changes)| (key.as_str(), size.as_str(), changes.as_slice()))
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything static the engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    pub size_scale: SizeScale,

    /// Size assumed when an entity has no size contribution at all.
    pub default_size: String,

    pub size_keys: SizeKeys,

    /// Key suffix marking a modifier as scalable.
    pub scalable_suffix: String,

    /// Per content type, the only local keys a component passes to its owner.
    pub propagation: BTreeMap<String, Vec<AttributeKey>>,

    /// Content types whose size-named components are size markers.
    pub size_marker_types: Vec<String>,

    pub scalable_templates: ScalableTemplates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut propagation = BTreeMap::new();
        propagation.insert(
            String::from("weapon"),
            vec![
                AttributeKey::from_str("defenseBonus"),
                AttributeKey::from_str("reflexDefenseBonus"),
                AttributeKey::from_str("skillBonus"),
            ],
        );
        Self {
            size_scale: SizeScale::default(),
            default_size: String::from("Medium"),
            size_keys: SizeKeys::default(),
            scalable_suffix: String::from("Scalable"),
            propagation,
            size_marker_types: vec![String::from("trait")],
            scalable_templates: ScalableTemplates::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads content from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ContentError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn with_templates(mut self, templates: ScalableTemplates) -> Self {
        self.scalable_templates = templates;
        self
    }

    pub fn with_propagation<I, K>(mut self, content_type: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<AttributeKey>,
    {
        self.propagation
            .insert(content_type.into(), keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_scalable(&self, key: &AttributeKey) -> bool {
        key.is_scalable(&self.scalable_suffix)
    }

    /// Allow-list for a content type aggregated onto its owner, if any.
    pub fn propagation_for(&self, content_type: &str) -> Option<&[AttributeKey]> {
        self.propagation.get(content_type).map(Vec::as_slice)
    }

    /// Whether a component is a size marker rather than a real component.
    pub fn is_size_marker(&self, content_type: &str, name: &str) -> bool {
        self.size_marker_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(content_type))
            && self.size_scale.contains(name)
    }

    /// Index of the default size, or the middle of the scale if the default
    /// is not on it.
    pub fn default_size_index(&self) -> i32 {
        self.size_scale
            .index_of(&self.default_size)
            .unwrap_or(self.size_scale.len() / 2) as i32
    }

    /// Check the content tables for authoring errors.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.size_scale.is_empty() {
            return Err(ContentError::EmptyScale);
        }
        if !self.size_scale.contains(&self.default_size) {
            return Err(ContentError::UnknownSize {
                name: self.default_size.clone(),
                scale: self.size_scale.names().to_vec(),
            });
        }
        if self.scalable_suffix.is_empty() {
            return Err(ContentError::Invalid(String::from(
                "scalable_suffix must not be empty",
            )));
        }
        for (template, size, changes) in self.scalable_templates.cells() {
            if !self.size_scale.contains(size) {
                return Err(ContentError::UnknownSize {
                    name: size.to_string(),
                    scale: self.size_scale.names().to_vec(),
                });
            }
            let nested = changes
                .iter()
                .filter_map(|c| c.key.as_ref())
                .any(|k| self.is_scalable(k));
            if nested {
                return Err(ContentError::ScalableReplacement {
                    template: template.to_string(),
                    size: size.to_string(),
                });
            }
        }
        Ok(())
    }
}
