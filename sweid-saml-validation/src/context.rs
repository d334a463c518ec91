//! Validation parameters, the per-run context and validation results.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sweid_saml::{AttributeSet, PrincipalSelection, RequestedAttribute};
use sweid_saml_signservice::{SadRequest, TrustedKeys};
use tracing::info;

use crate::config::ValidationConfig;
use crate::error::ValidationFailure;
use crate::trust::TrustAnchor;

/// What the service provider expects of one response: who should have sent
/// it, for which request, and what was asked for.
///
/// ```
/// use sweid_saml::{LevelOfAssurance, NATURAL_PERSON_WITH_PERSONAL_ID};
/// use sweid_saml_validation::ValidationParameters;
///
/// let params = ValidationParameters::new("https://sp.example.org", "https://sp.example.org/acs")
///     .with_idp_entity_id("https://idp.example.se")
///     .with_authn_request_id("_req1")
///     .with_requested_loa(LevelOfAssurance::Loa3.uri())
///     .with_required_attribute_set(&NATURAL_PERSON_WITH_PERSONAL_ID);
///
/// assert_eq!(params.requested_loas.len(), 1);
/// assert!(!params.holder_of_key);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationParameters {
    /// Expected issuer of the response and assertion
    pub idp_entity_id: Option<String>,
    /// Entity ID of the service provider, the expected audience
    pub sp_entity_id: String,
    /// URL the response was posted to
    pub assertion_consumer_url: String,
    /// ID of the authentication request being answered
    pub authn_request_id: Option<String>,
    /// LoA URIs requested; empty means any allowed level
    pub requested_loas: Vec<String>,
    /// Attribute set the identity provider must release in full
    pub required_attribute_set: Option<&'static AttributeSet>,
    /// Attributes requested by name
    pub requested_attributes: Vec<RequestedAttribute>,
    /// Principal selection sent with the request
    pub principal_selection: Option<PrincipalSelection>,
    /// Whether holder-of-key authentication was used
    pub holder_of_key: bool,
    /// Client addresses the confirmation data may carry; empty skips the check
    pub valid_addresses: Vec<String>,
    /// Keys trusted to sign responses and assertions
    pub trust_anchors: Vec<TrustAnchor>,
    /// SAD request of a signature service authentication
    pub sad_request: Option<SadRequest>,
    /// Keys trusted to sign SADs
    pub sad_keys: TrustedKeys,
}

impl ValidationParameters {
    /// Creates parameters for a service provider and its assertion consumer
    /// URL.
    pub fn new(sp_entity_id: impl Into<String>, assertion_consumer_url: impl Into<String>) -> Self {
        Self {
            sp_entity_id: sp_entity_id.into(),
            assertion_consumer_url: assertion_consumer_url.into(),
            ..Self::default()
        }
    }

    /// Sets the expected identity provider.
    #[must_use]
    pub fn with_idp_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.idp_entity_id = Some(entity_id.into());
        self
    }

    /// Sets the authentication request ID.
    #[must_use]
    pub fn with_authn_request_id(mut self, id: impl Into<String>) -> Self {
        self.authn_request_id = Some(id.into());
        self
    }

    /// Adds a requested LoA URI.
    #[must_use]
    pub fn with_requested_loa(mut self, uri: impl Into<String>) -> Self {
        self.requested_loas.push(uri.into());
        self
    }

    /// Sets the attribute set that must be released.
    #[must_use]
    pub fn with_required_attribute_set(mut self, set: &'static AttributeSet) -> Self {
        self.required_attribute_set = Some(set);
        self
    }

    /// Adds an attribute requested by name.
    #[must_use]
    pub fn with_requested_attribute(mut self, attribute: RequestedAttribute) -> Self {
        self.requested_attributes.push(attribute);
        self
    }

    /// Sets the principal selection.
    #[must_use]
    pub fn with_principal_selection(mut self, selection: PrincipalSelection) -> Self {
        self.principal_selection = Some(selection);
        self
    }

    /// Marks the authentication as holder-of-key.
    #[must_use]
    pub const fn with_holder_of_key(mut self, holder_of_key: bool) -> Self {
        self.holder_of_key = holder_of_key;
        self
    }

    /// Adds a valid client address.
    #[must_use]
    pub fn with_valid_address(mut self, address: impl Into<String>) -> Self {
        self.valid_addresses.push(address.into());
        self
    }

    /// Adds a trust anchor for response and assertion signatures.
    #[must_use]
    pub fn with_trust_anchor(mut self, anchor: TrustAnchor) -> Self {
        self.trust_anchors.push(anchor);
        self
    }

    /// Expects a SAD answering `request`, signed by one of `keys`.
    #[must_use]
    pub fn with_sad_request(mut self, request: SadRequest, keys: TrustedKeys) -> Self {
        self.sad_request = Some(request);
        self.sad_keys = keys;
        self
    }
}

/// Outcome of a public validator entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    /// Every rule passed.
    Valid,
    /// A rule failed; the failure is recorded in the context.
    Invalid,
}

impl ValidationResult {
    /// Returns true for [`ValidationResult::Valid`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// State of one validation run.
///
/// Borrows the configuration and the parameters, fixes the current time,
/// and collects failures and warnings as the validators run.
#[derive(Debug)]
pub struct ValidationContext<'a> {
    config: &'a ValidationConfig,
    params: &'a ValidationParameters,
    now: DateTime<Utc>,
    failures: Vec<ValidationFailure>,
    warnings: Vec<String>,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context for a run at `now`.
    #[must_use]
    pub const fn new(
        config: &'a ValidationConfig,
        params: &'a ValidationParameters,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            params,
            now,
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &'a ValidationConfig {
        self.config
    }

    /// Returns the parameters.
    #[must_use]
    pub const fn params(&self) -> &'a ValidationParameters {
        self.params
    }

    /// Returns the time the run validates against.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns true in strict mode.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.config.strict
    }

    /// Returns the failures recorded so far.
    #[must_use]
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// Returns the warnings recorded so far.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Consumes the context, returning its warnings.
    #[must_use]
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    /// Records a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(warning = %message, "validation warning");
        self.warnings.push(message);
    }

    /// Records the outcome of a check.
    pub fn record(&mut self, outcome: Result<(), ValidationFailure>) -> ValidationResult {
        match outcome {
            Ok(()) => ValidationResult::Valid,
            Err(failure) => {
                self.failures.push(failure);
                ValidationResult::Invalid
            }
        }
    }

    /// Fails in strict mode, warns otherwise.
    pub(crate) fn recommend(&mut self, failure: ValidationFailure) -> Result<(), ValidationFailure> {
        if self.is_strict() {
            return Err(failure);
        }
        self.warn(failure.to_string());
        Ok(())
    }

    /// Latest instant still accepted as "not in the future": `now + skew`.
    pub(crate) fn latest_accepted(&self) -> DateTime<Utc> {
        self.now
            .checked_add_signed(delta(self.config.clock_skew))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Earliest instant still accepted as "not passed": `now - skew`.
    pub(crate) fn earliest_accepted(&self) -> DateTime<Utc> {
        self.now
            .checked_sub_signed(delta(self.config.clock_skew))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// True if a `NotOnOrAfter` bound has passed, allowing for skew.
    pub(crate) fn has_passed(&self, not_on_or_after: DateTime<Utc>) -> bool {
        not_on_or_after <= self.earliest_accepted()
    }

    /// True if `instant` lies beyond `now + skew`.
    pub(crate) fn is_in_future(&self, instant: DateTime<Utc>) -> bool {
        instant > self.latest_accepted()
    }

    /// True if `instant` is older than `max_age`, allowing for skew.
    pub(crate) fn is_older_than(&self, instant: DateTime<Utc>, max_age: Duration) -> bool {
        self.earliest_accepted()
            .checked_sub_signed(delta(max_age))
            .is_some_and(|oldest| instant < oldest)
    }
}

fn delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
