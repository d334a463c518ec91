//! Configuration for response and assertion validation.

use std::time::Duration;

use serde::Deserialize;
use sweid_saml::LoaSet;

use crate::error::ConfigError;

/// Settings for the response processor and the statement validators.
///
/// Loadable from JSON; durations are given in whole seconds and LoA sets as
/// lists of URIs:
///
/// ```
/// use std::time::Duration;
/// use sweid_saml_validation::ValidationConfig;
///
/// let config = ValidationConfig::from_json_str(r#"{
///     "clock_skew": 60,
///     "allowed_loas": ["http://id.elegnamnden.se/loa/1.0/loa3"],
///     "strict": false
/// }"#).unwrap();
/// assert_eq!(config.clock_skew, Duration::from_secs(60));
/// assert_eq!(config.allowed_loas.len(), 1);
/// assert_eq!(config.max_authn_age, Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Allowed clock difference for every time comparison.
    ///
    /// Default: 30 seconds
    #[serde(with = "seconds")]
    pub clock_skew: Duration,

    /// Maximum age of the authentication instant.
    ///
    /// Default: 1 hour
    #[serde(with = "seconds")]
    pub max_authn_age: Duration,

    /// Maximum age of the response issue instant.
    ///
    /// Default: 3 minutes
    #[serde(with = "seconds")]
    pub max_response_age: Duration,

    /// Levels of assurance the service provider accepts at all.
    ///
    /// Default: every level of the profile
    pub allowed_loas: LoaSet,

    /// Levels that may only be asserted after holder-of-key authentication.
    ///
    /// Default: `loa4` and `loa4-nonresident`
    pub holder_of_key_loas: LoaSet,

    /// Strict mode turns profile recommendations (`NameID` format, a single
    /// encrypted assertion, attribute value formats) into failures.
    ///
    /// Default: `true`
    pub strict: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            clock_skew: Duration::from_secs(30),
            max_authn_age: Duration::from_secs(3600),
            max_response_age: Duration::from_secs(180),
            allowed_loas: LoaSet::all(),
            holder_of_key_loas: LoaSet::holder_of_key_defaults(),
            strict: true,
        }
    }
}

impl ValidationConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON, unknown fields or
    /// unknown LoA URIs.
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

    /// Sets the maximum authentication age.
    #[must_use]
    pub const fn with_max_authn_age(mut self, age: Duration) -> Self {
        self.max_authn_age = age;
        self
    }

    /// Sets the maximum response age.
    #[must_use]
    pub const fn with_max_response_age(mut self, age: Duration) -> Self {
        self.max_response_age = age;
        self
    }

    /// Sets the accepted levels of assurance.
    #[must_use]
    pub fn with_allowed_loas(mut self, loas: LoaSet) -> Self {
        self.allowed_loas = loas;
        self
    }

    /// Sets the levels that require holder-of-key.
    #[must_use]
    pub fn with_holder_of_key_loas(mut self, loas: LoaSet) -> Self {
        self.holder_of_key_loas = loas;
        self
    }

    /// Enables or disables strict mode.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
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
