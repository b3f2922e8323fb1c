//! Error types for the settings store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, changing or writing settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No setting is registered under this key.
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// The value did not parse or is out of range.
    #[error("invalid value for {key}: {reason}{}", allowed.as_ref().map(|a| format!(" (allowed: {a})")).unwrap_or_default())]
    Validation {
        key: String,
        reason: String,
        /// Allowed values or format, when there is a short list.
        allowed: Option<String>,
    },

    /// The candidate settings would produce a broken resolver configuration.
    #[error("resolver configuration check failed for {key}: {detail}")]
    DependentValidationFailed { key: String, detail: String },

    /// The config file is not valid TOML.
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The config file could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Returns true if the caller supplied something wrong (as opposed to an
    /// environment failure).
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownKey(_) | Self::Validation { .. } | Self::DependentValidationFailed { .. }
        )
    }

    /// Process exit code used by the command line for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownKey(_) => 2,
            Self::DependentValidationFailed { .. } => 3,
            _ => 1,
        }
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>, allowed: Option<String>) -> Self {
        Self::Validation {
            key: key.to_owned(),
            reason: reason.into(),
            allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ConfigError::UnknownKey("x".into()).exit_code(), 2);
        assert_eq!(ConfigError::invalid("dns.port", "bad", None).exit_code(), 1);
        let dep = ConfigError::DependentValidationFailed {
            key: "dns.port".into(),
            detail: "port 0".into(),
        };
        assert_eq!(dep.exit_code(), 3);
        assert!(dep.is_user_error());
        assert!(!ConfigError::Io(std::io::Error::other("disk")).is_user_error());
    }

    #[test]
    fn test_validation_message_lists_allowed() {
        let err = ConfigError::invalid(
            "dns.blockingMode",
            "unknown option \"bogus\"",
            Some("NULL, IP".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("dns.blockingMode"));
        assert!(msg.ends_with("(allowed: NULL, IP)"));

        let bare = ConfigError::invalid("dns.port", "not a number", None).to_string();
        assert!(!bare.contains("allowed"));
    }
}
