//! Static configuration, built once at process start.
//!
//! Nothing in the crate reads ambient global state: the supported target
//! list, identifier settings, and privileged caller all come from a
//! [`ConduitConfig`] that is passed explicitly to the schemas, the
//! identifier generator, and the list query resolver.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{UserId, CURI_MAX_LEN};

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// No service targets are configured.
    #[error("at least one service target must be configured")]
    NoTargets,
    /// The same target kind is configured twice.
    #[error("duplicate service target kind: {0}")]
    DuplicateTarget(String),
    /// A URL-prefix target has an empty prefix.
    #[error("service target {0} has an empty url prefix")]
    EmptyUrlPrefix(String),
    /// The identifier alphabet is empty.
    #[error("curi alphabet cannot be empty")]
    EmptyAlphabet,
    /// The identifier token length is zero.
    #[error("curi token length cannot be 0")]
    ZeroTokenLength,
    /// Generated addresses would exceed the column limit.
    #[error("generated curi would be {len} chars, limit is {CURI_MAX_LEN}")]
    CuriTooLong {
        /// Length of the longest address the settings can produce
        len: usize,
    },
}

/// Format rule for a target's `suriObjectKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "kebab-case")]
pub enum ObjectKeyFormat {
    /// Key must start with `prefix` and carry a non-empty remainder
    UrlPrefix {
        /// Required leading URL
        prefix: String,
    },
    /// Key must be an email address
    Email,
}

/// A supported third-party target kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTarget {
    /// Wire value of `suriType`
    pub kind: String,
    /// Format rule for `suriObjectKey`
    pub object_key: ObjectKeyFormat,
}

impl ServiceTarget {
    /// A target whose object keys are URLs under `prefix`.
    pub fn url(kind: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            object_key: ObjectKeyFormat::UrlPrefix {
                prefix: prefix.into(),
            },
        }
    }

    /// A target whose object keys are email addresses.
    pub fn email(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            object_key: ObjectKeyFormat::Email,
        }
    }
}

/// Settings for generated conduit addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuriSettings {
    /// Leading label, joined to the token with `-`
    pub prefix: String,
    /// Characters the random token is drawn from
    pub alphabet: String,
    /// Token length in characters
    pub length: usize,
    /// Domain suffix, joined with `.`
    pub domain: String,
}

impl Default for CuriSettings {
    fn default() -> Self {
        Self {
            prefix: "td".to_string(),
            alphabet: "0123456789abcdefghijklmnopqrstuvwxyz".to_string(),
            length: 8,
            domain: "conduits.link".to_string(),
        }
    }
}

impl CuriSettings {
    /// Length of every address produced with `prefix`.
    pub fn address_len(&self, prefix: &str) -> usize {
        prefix.len() + 1 + self.length + 1 + self.domain.len()
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConduitConfig {
    /// Supported target kinds, in display order
    pub targets: Vec<ServiceTarget>,
    /// Generated address settings
    pub curi: CuriSettings,
    /// The gateway server's user id; listing without a range returns every
    /// active conduit for this caller
    pub gateway_user_id: Option<UserId>,
}

impl Default for ConduitConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                ServiceTarget::url("airtable", "https://api.airtable.com/v0/"),
                ServiceTarget::url("googleSheets", "https://docs.google.com/spreadsheets/d/"),
                ServiceTarget::email("email"),
            ],
            curi: CuriSettings::default(),
            gateway_user_id: None,
        }
    }
}

impl ConduitConfig {
    /// Parses and validates a TOML document.
    ///
    /// Missing sections fall back to [`ConduitConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is malformed or fails
    /// [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ConduitConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.kind.as_str()) {
                return Err(ConfigError::DuplicateTarget(target.kind.clone()));
            }
            if let ObjectKeyFormat::UrlPrefix { prefix } = &target.object_key {
                if prefix.is_empty() {
                    return Err(ConfigError::EmptyUrlPrefix(target.kind.clone()));
                }
            }
        }

        if self.curi.alphabet.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        if self.curi.length == 0 {
            return Err(ConfigError::ZeroTokenLength);
        }

        let len = self.curi.address_len(&self.curi.prefix);
        if len > CURI_MAX_LEN {
            return Err(ConfigError::CuriTooLong { len });
        }

        Ok(())
    }

    /// Looks up a target by its `suriType` wire value.
    pub fn target(&self, kind: &str) -> Option<&ServiceTarget> {
        self.targets.iter().find(|t| t.kind == kind)
    }

    /// Supported `suriType` values, in configured order.
    pub fn target_kinds(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.kind.as_str()).collect()
    }

    /// Returns `true` if `user_id` is the configured gateway caller.
    pub fn is_gateway(&self, user_id: UserId) -> bool {
        self.gateway_user_id == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ConduitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_kinds(), ["airtable", "googleSheets", "email"]);
    }

    #[test]
    fn loads_from_toml() {
        let config = ConduitConfig::from_toml_str(
            r#"
            gateway_user_id = 1

            [curi]
            prefix = "gw"
            length = 12

            [[targets]]
            kind = "airtable"
            object_key = { format = "url-prefix", prefix = "https://api.airtable.com/v0/" }

            [[targets]]
            kind = "email"
            object_key = { format = "email" }
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway_user_id, Some(1));
        assert_eq!(config.curi.prefix, "gw");
        assert_eq!(config.curi.length, 12);
        assert_eq!(config.curi.domain, CuriSettings::default().domain);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.target("email").unwrap().object_key, ObjectKeyFormat::Email);
        assert!(config.is_gateway(1));
        assert!(!config.is_gateway(2));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = ConduitConfig::from_toml_str("").unwrap();
        assert_eq!(config, ConduitConfig::default());
    }

    #[test]
    fn rejects_duplicate_targets() {
        let mut config = ConduitConfig::default();
        config.targets.push(ServiceTarget::email("email"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateTarget(kind)) if kind == "email"
        ));
    }

    #[test]
    fn rejects_empty_target_list() {
        let config = ConduitConfig {
            targets: Vec::new(),
            ..ConduitConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoTargets)));
    }

    #[test]
    fn rejects_bad_curi_settings() {
        let mut config = ConduitConfig::default();
        config.curi.alphabet.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyAlphabet)));

        let mut config = ConduitConfig::default();
        config.curi.length = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTokenLength)));

        let mut config = ConduitConfig::default();
        config.curi.domain = "d".repeat(CURI_MAX_LEN);
        assert!(matches!(config.validate(), Err(ConfigError::CuriTooLong { .. })));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            ConduitConfig::from_toml_str("targets = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
