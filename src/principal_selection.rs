//! Principal selection: the attribute values a service provider demands the
//! authenticated user to have.

use crate::attribute::{AttributeStatement, AttributeTemplate};
use crate::constants::ATTRNAME_FORMAT_URI;
use crate::error::PrincipalSelectionError;

/// One `(attribute name, expected value)` pair of a principal selection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchValue {
    /// Attribute name
    pub name: String,
    /// Attribute name format
    pub name_format: String,
    /// Expected value
    pub value: String,
}

impl MatchValue {
    /// Creates a match value with the URI name format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is empty.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, PrincipalSelectionError> {
        let name = name.into();
        let value = value.into();
        if name.trim().is_empty() {
            return Err(PrincipalSelectionError::EmptyName);
        }
        if value.trim().is_empty() {
            return Err(PrincipalSelectionError::EmptyValue { name });
        }
        Ok(Self {
            name,
            name_format: ATTRNAME_FORMAT_URI.to_string(),
            value,
        })
    }

    /// Returns true if the statement carries this attribute with exactly
    /// the expected value.
    #[must_use]
    pub fn is_matched_by(&self, statement: &AttributeStatement) -> bool {
        statement
            .find(&self.name)
            .is_some_and(|attr| attr.values.iter().any(|v| *v == self.value))
    }
}

/// An ordered set of match values, unique by attribute name.
///
/// # Example
///
/// ```
/// use sweid_saml::{Attribute, AttributeStatement, PrincipalSelection, names};
///
/// let selection = PrincipalSelection::builder()
///     .match_value(names::PERSONAL_IDENTITY_NUMBER, "199001011234")
///     .build()
///     .unwrap();
///
/// let statement = AttributeStatement::new(vec![Attribute::new(
///     names::PERSONAL_IDENTITY_NUMBER,
///     ["199001011234"],
/// )]);
/// assert!(selection.matches(&statement).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrincipalSelection {
    match_values: Vec<MatchValue>,
}

impl PrincipalSelection {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> PrincipalSelectionBuilder {
        PrincipalSelectionBuilder::default()
    }

    /// Returns the match values in request order.
    #[must_use]
    pub fn match_values(&self) -> &[MatchValue] {
        &self.match_values
    }

    /// Returns true if there are no match values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.match_values.is_empty()
    }

    /// Checks every match value against the statement.
    ///
    /// A constraint on an attribute that was not released counts as
    /// unmatched.
    ///
    /// # Errors
    ///
    /// Returns the first match value that the statement does not satisfy.
    pub fn matches<'a>(&'a self, statement: &AttributeStatement) -> Result<(), &'a MatchValue> {
        match self.match_values.iter().find(|mv| !mv.is_matched_by(statement)) {
            Some(unmatched) => Err(unmatched),
            None => Ok(()),
        }
    }
}

/// Builder for [`PrincipalSelection`].
#[derive(Debug, Clone, Default)]
pub struct PrincipalSelectionBuilder {
    pending: Vec<(String, String)>,
}

impl PrincipalSelectionBuilder {
    /// Adds a match value.
    #[must_use]
    pub fn match_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pending.push((name.into(), value.into()));
        self
    }

    /// Builds the selection.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty name or value, or a repeated name.
    pub fn build(self) -> Result<PrincipalSelection, PrincipalSelectionError> {
        let mut match_values: Vec<MatchValue> = Vec::with_capacity(self.pending.len());
        for (name, value) in self.pending {
            let mv = MatchValue::new(name, value)?;
            if match_values.iter().any(|m| m.name == mv.name) {
                return Err(PrincipalSelectionError::DuplicateName { name: mv.name });
            }
            match_values.push(mv);
        }
        Ok(PrincipalSelection { match_values })
    }
}

/// The attributes an identity provider accepts in a principal selection, as
/// declared in its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestedPrincipalSelection {
    attribute_names: Vec<String>,
}

impl RequestedPrincipalSelection {
    /// Creates the declaration from attribute names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut attribute_names: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !attribute_names.contains(&name) {
                attribute_names.push(name);
            }
        }
        Self { attribute_names }
    }

    /// Returns the declared attribute names.
    #[must_use]
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    /// Returns the match values of `selection` the identity provider does
    /// not declare support for.
    #[must_use]
    pub fn unsupported<'a>(&self, selection: &'a PrincipalSelection) -> Vec<&'a MatchValue> {
        selection
            .match_values()
            .iter()
            .filter(|mv| !self.attribute_names.contains(&mv.name))
            .collect()
    }

    /// Returns the friendly names of the declared attributes that the
    /// profile knows.
    #[must_use]
    pub fn friendly_names(&self) -> Vec<&'static str> {
        self.attribute_names
            .iter()
            .filter_map(|n| AttributeTemplate::lookup(n).map(|t| t.friendly_name))
            .collect()
    }
}
