//! Level of Assurance authentication context URIs.

use std::fmt;
use std::str::FromStr;

use crate::error::LoaError;

/// A Level of Assurance defined by the Swedish eID Framework.
///
/// The profile fixes the set of authentication context class URIs an
/// identity provider may assert, so the set is a closed enum rather than a
/// free-form string.
///
/// # Example
///
/// ```
/// use sweid_saml::LevelOfAssurance;
///
/// let loa = LevelOfAssurance::from_uri("http://id.elegnamnden.se/loa/1.0/loa3").unwrap();
/// assert_eq!(loa, LevelOfAssurance::Loa3);
/// assert_eq!(loa.uri(), "http://id.elegnamnden.se/loa/1.0/loa3");
/// assert!(!loa.is_eidas());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LevelOfAssurance {
    /// Assurance level 1.
    Loa1,
    /// Assurance level 2.
    Loa2,
    /// Uncertified assurance level 2.
    UncertifiedLoa2,
    /// Assurance level 2 for non-residents.
    Loa2NonResident,
    /// Assurance level 3.
    Loa3,
    /// Uncertified assurance level 3.
    UncertifiedLoa3,
    /// Assurance level 3 for non-residents.
    Loa3NonResident,
    /// Assurance level 4.
    Loa4,
    /// Assurance level 4 for non-residents.
    Loa4NonResident,
    /// eIDAS low, non-notified.
    EidasLow,
    /// eIDAS low, notified.
    EidasLowNotified,
    /// Uncertified eIDAS low.
    UncertifiedEidasLow,
    /// eIDAS substantial, non-notified.
    EidasSubstantial,
    /// eIDAS substantial, notified.
    EidasSubstantialNotified,
    /// Uncertified eIDAS substantial.
    UncertifiedEidasSubstantial,
    /// eIDAS high, non-notified.
    EidasHigh,
    /// eIDAS high, notified.
    EidasHighNotified,
    /// Uncertified eIDAS high.
    UncertifiedEidasHigh,
}

const ALL: [LevelOfAssurance; 18] = [
    LevelOfAssurance::Loa1,
    LevelOfAssurance::Loa2,
    LevelOfAssurance::UncertifiedLoa2,
    LevelOfAssurance::Loa2NonResident,
    LevelOfAssurance::Loa3,
    LevelOfAssurance::UncertifiedLoa3,
    LevelOfAssurance::Loa3NonResident,
    LevelOfAssurance::Loa4,
    LevelOfAssurance::Loa4NonResident,
    LevelOfAssurance::EidasLow,
    LevelOfAssurance::EidasLowNotified,
    LevelOfAssurance::UncertifiedEidasLow,
    LevelOfAssurance::EidasSubstantial,
    LevelOfAssurance::EidasSubstantialNotified,
    LevelOfAssurance::UncertifiedEidasSubstantial,
    LevelOfAssurance::EidasHigh,
    LevelOfAssurance::EidasHighNotified,
    LevelOfAssurance::UncertifiedEidasHigh,
];

impl LevelOfAssurance {
    /// Returns every level of assurance the profile defines.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &ALL
    }

    /// Resolves an authentication context class URI.
    ///
    /// # Errors
    ///
    /// Returns `LoaError::UnknownUri` if the URI is not defined by the profile.
    pub fn from_uri(uri: &str) -> Result<Self, LoaError> {
        ALL.iter()
            .copied()
            .find(|loa| loa.uri() == uri)
            .ok_or_else(|| LoaError::UnknownUri {
                uri: uri.to_string(),
            })
    }

    /// Returns the authentication context class URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Loa1 => "http://id.elegnamnden.se/loa/1.0/loa1",
            Self::Loa2 => "http://id.elegnamnden.se/loa/1.0/loa2",
            Self::UncertifiedLoa2 => "http://id.swedenconnect.se/loa/1.0/uncertified-loa2",
            Self::Loa2NonResident => "http://id.swedenconnect.se/loa/1.0/loa2-nonresident",
            Self::Loa3 => "http://id.elegnamnden.se/loa/1.0/loa3",
            Self::UncertifiedLoa3 => "http://id.swedenconnect.se/loa/1.0/uncertified-loa3",
            Self::Loa3NonResident => "http://id.swedenconnect.se/loa/1.0/loa3-nonresident",
            Self::Loa4 => "http://id.elegnamnden.se/loa/1.0/loa4",
            Self::Loa4NonResident => "http://id.swedenconnect.se/loa/1.0/loa4-nonresident",
            Self::EidasLow => "http://id.elegnamnden.se/loa/1.0/eidas-low",
            Self::EidasLowNotified => "http://id.elegnamnden.se/loa/1.0/eidas-nf-low",
            Self::UncertifiedEidasLow => "http://id.swedenconnect.se/loa/1.0/uncertified-eidas-low",
            Self::EidasSubstantial => "http://id.elegnamnden.se/loa/1.0/eidas-sub",
            Self::EidasSubstantialNotified => "http://id.elegnamnden.se/loa/1.0/eidas-nf-sub",
            Self::UncertifiedEidasSubstantial => {
                "http://id.swedenconnect.se/loa/1.0/uncertified-eidas-sub"
            }
            Self::EidasHigh => "http://id.elegnamnden.se/loa/1.0/eidas-high",
            Self::EidasHighNotified => "http://id.elegnamnden.se/loa/1.0/eidas-nf-high",
            Self::UncertifiedEidasHigh => {
                "http://id.swedenconnect.se/loa/1.0/uncertified-eidas-high"
            }
        }
    }

    /// Returns true for the eIDAS levels.
    #[must_use]
    pub const fn is_eidas(self) -> bool {
        matches!(
            self,
            Self::EidasLow
                | Self::EidasLowNotified
                | Self::UncertifiedEidasLow
                | Self::EidasSubstantial
                | Self::EidasSubstantialNotified
                | Self::UncertifiedEidasSubstantial
                | Self::EidasHigh
                | Self::EidasHighNotified
                | Self::UncertifiedEidasHigh
        )
    }

    /// Returns true for the eIDAS levels backed by a notified scheme.
    #[must_use]
    pub const fn is_notified(self) -> bool {
        matches!(
            self,
            Self::EidasLowNotified | Self::EidasSubstantialNotified | Self::EidasHighNotified
        )
    }

    /// Returns true for the levels that demand holder-of-key confirmation
    /// by default.
    #[must_use]
    pub const fn requires_holder_of_key(self) -> bool {
        matches!(self, Self::Loa4 | Self::Loa4NonResident)
    }
}

impl fmt::Display for LevelOfAssurance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

impl FromStr for LevelOfAssurance {
    type Err = LoaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for LevelOfAssurance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.uri())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for LevelOfAssurance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_uri(&s).map_err(serde::de::Error::custom)
    }
}

/// An ordered, de-duplicated set of accepted levels of assurance.
///
/// ```
/// use sweid_saml::{LevelOfAssurance, LoaSet};
///
/// let set = LoaSet::from_iter([LevelOfAssurance::Loa3, LevelOfAssurance::Loa4]);
/// assert!(set.contains_uri("http://id.elegnamnden.se/loa/1.0/loa3"));
/// assert!(!set.contains_uri("http://id.elegnamnden.se/loa/1.0/loa2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LoaSet {
    levels: Vec<LevelOfAssurance>,
}

impl LoaSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding every level the profile defines.
    #[must_use]
    pub fn all() -> Self {
        Self {
            levels: ALL.to_vec(),
        }
    }

    /// Creates the default set of levels that require holder-of-key.
    #[must_use]
    pub fn holder_of_key_defaults() -> Self {
        ALL.iter()
            .copied()
            .filter(|loa| loa.requires_holder_of_key())
            .collect()
    }

    /// Adds a level, keeping insertion order and ignoring duplicates.
    pub fn insert(&mut self, loa: LevelOfAssurance) {
        if !self.levels.contains(&loa) {
            self.levels.push(loa);
        }
    }

    /// Returns true if the level is in the set.
    #[must_use]
    pub fn contains(&self, loa: LevelOfAssurance) -> bool {
        self.levels.contains(&loa)
    }

    /// Returns true if the URI resolves to a level in the set.
    #[must_use]
    pub fn contains_uri(&self, uri: &str) -> bool {
        LevelOfAssurance::from_uri(uri).is_ok_and(|loa| self.contains(loa))
    }

    /// Returns the levels in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[LevelOfAssurance] {
        &self.levels
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the number of levels in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

impl FromIterator<LevelOfAssurance> for LoaSet {
    fn from_iter<I: IntoIterator<Item = LevelOfAssurance>>(iter: I) -> Self {
        let mut set = Self::new();
        for loa in iter {
            set.insert(loa);
        }
        set
    }
}
