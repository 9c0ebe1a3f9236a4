//! Error taxonomy shared across the engine.
//!
//! - [`ConfigError`]: invalid index or rule definitions. Fatal at startup and
//!   must reach the operator.
//! - [`ValidationError`]: bad caller input (empty query, missing credential,
//!   mismatched vector lengths). Raised before any network call.
//!
//! Transport failures of the embedding provider live in `aria-retrieval`
//! because only that crate talks HTTP.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration-like inputs (index file, rules).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The index or rules file does not exist.
    #[error("file not found: {}", path.display())]
    MissingFile {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Reading the file failed.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON for the expected schema.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The index declares a schema version this build cannot read.
    #[error("unsupported index version {found} (supported: {supported:?})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Versions this build accepts.
        supported: &'static [u32],
    },

    /// A required chunk array is empty.
    #[error("index field `{field}` is empty")]
    EmptyChunks {
        /// Name of the empty field.
        field: &'static str,
    },

    /// A trigger rule could not be compiled.
    #[error("invalid rule `{rule_id}`: {message}")]
    InvalidRule {
        /// ID of the offending rule.
        rule_id: String,
        /// What is wrong with it.
        message: String,
    },

    /// Two rules share the same ID.
    #[error("duplicate rule id: {rule_id}")]
    DuplicateRule {
        /// The repeated ID.
        rule_id: String,
    },
}

/// Errors caused by caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Query text was empty or whitespace.
    #[error("query text is empty")]
    EmptyQuery,

    /// No credential was supplied for the embedding provider.
    #[error("embedding credential is missing")]
    MissingCredential,

    /// Two vectors that must be compared have different lengths.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the reference vector.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// A search or selection option is out of range.
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::error::Error;

    #[test]
    fn config_error_display_variants() {
        let cases = vec![
            (
                ConfigError::MissingFile {
                    path: PathBuf::from("/tmp/index.json"),
                },
                "file not found: /tmp/index.json",
            ),
            (
                ConfigError::UnsupportedVersion {
                    found: 1,
                    supported: &[2],
                },
                "unsupported index version 1 (supported: [2])",
            ),
            (
                ConfigError::EmptyChunks {
                    field: "child_chunks",
                },
                "index field `child_chunks` is empty",
            ),
            (
                ConfigError::InvalidRule {
                    rule_id: "r1".into(),
                    message: "bad flag".into(),
                },
                "invalid rule `r1`: bad flag",
            ),
            (
                ConfigError::DuplicateRule {
                    rule_id: "r1".into(),
                },
                "duplicate rule id: r1",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn config_error_from_io_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io.into();
        assert_matches!(err, ConfigError::Io(_));
        assert!(err.source().is_some());
    }

    #[test]
    fn config_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(err.to_string().starts_with("failed to parse JSON"));
    }

    #[test]
    fn validation_error_display() {
        assert_eq!(ValidationError::EmptyQuery.to_string(), "query text is empty");
        assert_eq!(
            ValidationError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
            .to_string(),
            "vector dimension mismatch: expected 3, got 2"
        );
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigError>();
        assert_send_sync::<ValidationError>();
    }
}
