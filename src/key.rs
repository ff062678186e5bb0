//! Attribute key module.
//!
//! Provides the `AttributeKey` type, the interned name a modifier targets
//! (`"skillBonus"`, `"sizeIndex"`, ...), and `KeySelector`, which decides
//! whether a key takes part in a query.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Interned string identifier for modifier keys.
///
/// Uses `Arc<str>` so records can be cloned freely while resolving.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::AttributeKey;
///
/// let bonus = AttributeKey::from_str("skillBonus");
/// let bonus2: AttributeKey = "skillBonus".into();
/// let bonus3: AttributeKey = String::from("skillBonus").into();
///
/// assert_eq!(bonus, bonus2);
/// assert_eq!(bonus, bonus3);
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributeKey(Arc<str>);

impl Serialize for AttributeKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttributeKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AttributeKey::from(s))
    }
}

impl AttributeKey {
    /// Create a new `AttributeKey` from a string slice.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the string representation of this key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key ends with the scalable marker suffix.
    ///
    /// ```rust
    /// use sheetcalc::AttributeKey;
    ///
    /// let key = AttributeKey::from_str("unarmedDamageScalable");
    /// assert!(key.is_scalable("Scalable"));
    /// assert!(!AttributeKey::from_str("unarmedDamage").is_scalable("Scalable"));
    /// ```
    pub fn is_scalable(&self, suffix: &str) -> bool {
        !suffix.is_empty() && self.0.ends_with(suffix)
    }
}

impl From<&str> for AttributeKey {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for AttributeKey {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which keys a query is interested in.
///
/// A single key matches exactly; a set matches by membership. `Any`
/// keeps every record that has a key at all.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::{AttributeKey, KeySelector};
///
/// let selector = KeySelector::any_of(["size", "sizeBonus"]);
/// assert!(selector.matches(&AttributeKey::from_str("sizeBonus")));
/// assert!(!selector.matches(&AttributeKey::from_str("skillBonus")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelector {
    One(AttributeKey),
    Set(BTreeSet<AttributeKey>),
    Any,
}

impl KeySelector {
    /// Build a set selector from anything yielding key-like values.
    pub fn any_of<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<AttributeKey>,
    {
        KeySelector::Set(keys.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, key: &AttributeKey) -> bool {
        match self {
            KeySelector::One(k) => k == key,
            KeySelector::Set(keys) => keys.contains(key),
            KeySelector::Any => true,
        }
    }

    /// Stable textual identity, used in cache keys.
    pub fn identity(&self) -> String {
        match self {
            KeySelector::One(k) => k.to_string(),
            KeySelector::Set(keys) => keys
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            KeySelector::Any => String::from("*"),
        }
    }
}

impl Default for KeySelector {
    fn default() -> Self {
        KeySelector::Any
    }
}

impl From<&str> for KeySelector {
    fn from(s: &str) -> Self {
        KeySelector::One(AttributeKey::from_str(s))
    }
}

impl From<AttributeKey> for KeySelector {
    fn from(k: AttributeKey) -> Self {
        KeySelector::One(k)
    }
}

impl From<Vec<&str>> for KeySelector {
    fn from(keys: Vec<&str>) -> Self {
        KeySelector::any_of(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_creation() {
        let k1 = AttributeKey::from_str("skillBonus");
        let k2 = AttributeKey::from_str("skillBonus");
        assert_eq!(k1, k2);
        assert_eq!(k1.as_str(), "skillBonus");
    }

    #[test]
    fn test_scalable_suffix() {
        let key = AttributeKey::from_str("unarmedDamageScalable");
        assert!(key.is_scalable("Scalable"));
        assert!(!key.is_scalable(""));
    }

    #[test]
    fn test_selector_matching() {
        let one = KeySelector::from("size");
        assert!(one.matches(&"size".into()));
        assert!(!one.matches(&"sizeIndex".into()));

        let any = KeySelector::Any;
        assert!(any.matches(&"anything".into()));
    }

    #[test]
    fn test_selector_identity_is_order_independent() {
        let a = KeySelector::any_of(["b", "a"]);
        let b = KeySelector::any_of(["a", "b"]);
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.identity(), "a|b");
    }
}
