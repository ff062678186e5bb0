//! Error types for content loading.
//!
//! Resolution itself never fails: missing or malformed data degrades to an
//! empty contribution. The only fallible surface is loading and validating
//! the static content tables the engine consumes.

use thiserror::Error;

/// Format a size scale as a readable list.
fn format_scale(scale: &[String]) -> String {
    if scale.is_empty() {
        return String::from("(empty scale)");
    }
    scale.join(" < ")
}

/// Errors raised while loading or validating `EngineConfig`.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::ContentError;
///
/// let err = ContentError::UnknownSize {
///     name: "Titanic".into(),
///     scale: vec!["Small".into(), "Medium".into()],
/// };
/// assert_eq!(err.to_string(), "Unknown size 'Titanic' (scale: Small < Medium)");
/// ```
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The ordered size scale has no entries.
    #[error("Size scale is empty")]
    EmptyScale,

    /// A size name used by content is not on the scale.
    #[error("Unknown size '{name}' (scale: {})", format_scale(.scale))]
    UnknownSize { name: String, scale: Vec<String> },

    /// A scalable template expands into another scalable modifier.
    #[error("Scalable template '{template}' for size '{size}' produces a scalable modifier")]
    ScalableReplacement { template: String, size: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContentError::ScalableReplacement {
            template: "unarmedDamageScalable".into(),
            size: "Medium".into(),
        };
        assert!(err.to_string().contains("unarmedDamageScalable"));
        assert!(err.to_string().contains("Medium"));
    }

    #[test]
    fn test_empty_scale_display() {
        let err = ContentError::UnknownSize {
            name: "Large".into(),
            scale: vec![],
        };
        assert!(err.to_string().contains("(empty scale)"));
    }
}
