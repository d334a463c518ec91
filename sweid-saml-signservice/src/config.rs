//! Configuration for issuing and validating SAD tokens.

use std::time::Duration;

use serde::Deserialize;
use sweid_saml::names;

use crate::error::ConfigError;
use crate::keys::SigningAlgorithm;

/// Settings shared by the SAD factory and validator.
///
/// Loadable from JSON; durations are given in whole seconds:
///
/// ```
/// use std::time::Duration;
/// use sweid_saml_signservice::SadConfig;
///
/// let config = SadConfig::from_json_str(r#"{ "clock_skew": 30, "allowed_algorithms": ["RS256"] }"#).unwrap();
/// assert_eq!(config.clock_skew, Duration::from_secs(30));
/// assert_eq!(config.default_validity, Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SadConfig {
    /// Allowed clock difference when checking `iat` and `exp`.
    ///
    /// Default: 15 seconds
    #[serde(with = "seconds")]
    pub clock_skew: Duration,

    /// Validity of issued tokens when the caller does not give one.
    ///
    /// Default: 5 minutes
    #[serde(with = "seconds")]
    pub default_validity: Duration,

    /// Attribute that identifies the user; the SAD `attr` claim names it.
    ///
    /// Default: `personalIdentityNumber`
    pub user_id_attribute: String,

    /// Algorithms a verifier accepts.
    ///
    /// Default: all supported
    pub allowed_algorithms: Vec<SigningAlgorithm>,
}

impl Default for SadConfig {
    fn default() -> Self {
        Self {
            clock_skew: Duration::from_secs(15),
            default_validity: Duration::from_secs(300),
            user_id_attribute: names::PERSONAL_IDENTITY_NUMBER.to_string(),
            allowed_algorithms: SigningAlgorithm::ALL.to_vec(),
        }
    }
}

impl SadConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON or unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Sets the clock skew.
    #[must_use]
    pub const fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Sets the default validity.
    #[must_use]
    pub const fn with_default_validity(mut self, validity: Duration) -> Self {
        self.default_validity = validity;
        self
    }

    /// Sets the user id attribute.
    #[must_use]
    pub fn with_user_id_attribute(mut self, name: impl Into<String>) -> Self {
        self.user_id_attribute = name.into();
        self
    }

    /// Restricts the accepted algorithms.
    #[must_use]
    pub fn with_allowed_algorithms(mut self, algorithms: Vec<SigningAlgorithm>) -> Self {
        self.allowed_algorithms = algorithms;
        self
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
