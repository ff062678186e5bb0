//! Modifier values.
//!
//! Authored content stores modifier values loosely: the same key may carry
//! `"2"`, `2`, or `true` depending on who wrote the data. `ModifierValue`
//! keeps the original shape and offers the coercions reductions need.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single modifier value as authored.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::ModifierValue;
///
/// assert_eq!(ModifierValue::from("2").as_number(), Some(2.0));
/// assert_eq!(ModifierValue::from(true).as_number(), Some(1.0));
/// assert_eq!(ModifierValue::from("1d4").as_number(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModifierValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ModifierValue {
    /// Numeric coercion.
    ///
    /// Numbers pass through, booleans become 1/0, text is trimmed and parsed.
    /// Anything else is non-numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ModifierValue::Number(n) if n.is_nan() => None,
            ModifierValue::Number(n) => Some(*n),
            ModifierValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ModifierValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
            }
        }
    }

    /// Truthiness used by the OR reduction.
    ///
    /// ```rust
    /// use sheetcalc::ModifierValue;
    ///
    /// assert!(ModifierValue::from("true").is_truthy());
    /// assert!(!ModifierValue::from("FALSE").is_truthy());
    /// assert!(!ModifierValue::from("0").is_truthy());
    /// assert!(ModifierValue::from("Weapon Focus").is_truthy());
    /// assert!(!ModifierValue::from("").is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            ModifierValue::Bool(b) => *b,
            ModifierValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ModifierValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    true
                } else if trimmed.eq_ignore_ascii_case("false") {
                    false
                } else if let Some(n) = self.as_number() {
                    n != 0.0
                } else {
                    !trimmed.is_empty()
                }
            }
        }
    }

    /// Lowercased copy if this is text; other values are returned as-is.
    pub fn to_lowercase(&self) -> ModifierValue {
        match self {
            ModifierValue::Text(s) => ModifierValue::Text(s.to_lowercase()),
            other => other.clone(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ModifierValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ModifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierValue::Bool(b) => write!(f, "{b}"),
            ModifierValue::Number(n) => write!(f, "{n}"),
            ModifierValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for ModifierValue {
    fn from(s: &str) -> Self {
        ModifierValue::Text(s.to_string())
    }
}

impl From<String> for ModifierValue {
    fn from(s: String) -> Self {
        ModifierValue::Text(s)
    }
}

impl From<f64> for ModifierValue {
    fn from(n: f64) -> Self {
        ModifierValue::Number(n)
    }
}

impl From<i64> for ModifierValue {
    fn from(n: i64) -> Self {
        ModifierValue::Number(n as f64)
    }
}

impl From<i32> for ModifierValue {
    fn from(n: i32) -> Self {
        ModifierValue::Number(n as f64)
    }
}

impl From<bool> for ModifierValue {
    fn from(b: bool) -> Self {
        ModifierValue::Bool(b)
    }
}
