//! Attributes, attribute statements and the profile's attribute templates.

use chrono::NaiveDate;

use crate::constants::ATTRNAME_FORMAT_URI;

/// Attribute names (OID URNs) defined by the Swedish eID attribute profile.
pub mod names {
    /// Surname.
    pub const SN: &str = "urn:oid:2.5.4.4";
    /// Given name.
    pub const GIVEN_NAME: &str = "urn:oid:2.5.4.42";
    /// Display name.
    pub const DISPLAY_NAME: &str = "urn:oid:2.16.840.1.113730.3.1.241";
    /// Gender.
    pub const GENDER: &str = "urn:oid:1.3.6.1.5.5.7.9.3";
    /// Swedish personal identity number.
    pub const PERSONAL_IDENTITY_NUMBER: &str = "urn:oid:1.2.752.29.4.13";
    /// Previous personal identity number.
    pub const PREVIOUS_PERSONAL_IDENTITY_NUMBER: &str = "urn:oid:1.2.752.201.3.15";
    /// Date of birth.
    pub const DATE_OF_BIRTH: &str = "urn:oid:1.3.6.1.5.5.7.9.1";
    /// Birth name.
    pub const BIRTH_NAME: &str = "urn:oid:1.2.752.201.3.8";
    /// Street address.
    pub const STREET: &str = "urn:oid:2.5.4.9";
    /// Post office box.
    pub const POST_OFFICE_BOX: &str = "urn:oid:2.5.4.18";
    /// Postal code.
    pub const POSTAL_CODE: &str = "urn:oid:2.5.4.17";
    /// Locality.
    pub const L: &str = "urn:oid:2.5.4.7";
    /// Country.
    pub const C: &str = "urn:oid:2.5.4.6";
    /// Place of birth.
    pub const PLACE_OF_BIRTH: &str = "urn:oid:1.3.6.1.5.5.7.9.2";
    /// Country of citizenship.
    pub const COUNTRY_OF_CITIZENSHIP: &str = "urn:oid:1.3.6.1.5.5.7.9.4";
    /// Country of residence.
    pub const COUNTRY_OF_RESIDENCE: &str = "urn:oid:1.3.6.1.5.5.7.9.5";
    /// Telephone number.
    pub const TELEPHONE_NUMBER: &str = "urn:oid:2.5.4.20";
    /// Mobile number.
    pub const MOBILE: &str = "urn:oid:0.9.2342.19200300.100.1.41";
    /// E-mail address.
    pub const MAIL: &str = "urn:oid:0.9.2342.19200300.100.1.3";
    /// Organization name.
    pub const O: &str = "urn:oid:2.5.4.10";
    /// Organizational unit.
    pub const OU: &str = "urn:oid:2.5.4.11";
    /// Organization identifier.
    pub const ORGANIZATION_IDENTIFIER: &str = "urn:oid:2.5.4.97";
    /// Organizational affiliation, a scoped value.
    pub const ORG_AFFILIATION: &str = "urn:oid:1.2.752.201.3.1";
    /// Transaction identifier.
    pub const TRANSACTION_IDENTIFIER: &str = "urn:oid:1.2.752.201.3.2";
    /// Authentication context parameters.
    pub const AUTH_CONTEXT_PARAMS: &str = "urn:oid:1.2.752.201.3.3";
    /// User certificate.
    pub const USER_CERTIFICATE: &str = "urn:oid:1.2.752.201.3.10";
    /// User signature.
    pub const USER_SIGNATURE: &str = "urn:oid:1.2.752.201.3.11";
    /// Authentication server signature.
    pub const AUTH_SERVER_SIGNATURE: &str = "urn:oid:1.2.752.201.3.13";
    /// Signed Authentication Data.
    pub const SAD: &str = "urn:oid:1.2.752.201.3.12";
    /// Digest of the SignMessage displayed to the user.
    pub const SIGN_MESSAGE_DIGEST: &str = "urn:oid:1.2.752.201.3.14";
    /// Provisional identifier.
    pub const PRID: &str = "urn:oid:1.2.752.201.3.4";
    /// Persistence of the provisional identifier.
    pub const PRID_PERSISTENCE: &str = "urn:oid:1.2.752.201.3.5";
    /// Personal identity number binding.
    pub const PERSONAL_IDENTITY_NUMBER_BINDING: &str = "urn:oid:1.2.752.201.3.6";
    /// Mapped personal identity number.
    pub const MAPPED_PERSONAL_IDENTITY_NUMBER: &str = "urn:oid:1.2.752.201.3.16";
    /// eIDAS person identifier.
    pub const EIDAS_PERSON_IDENTIFIER: &str = "urn:oid:1.2.752.201.3.7";
    /// eIDAS natural person address.
    pub const EIDAS_NATURAL_PERSON_ADDRESS: &str = "urn:oid:1.2.752.201.3.9";
    /// HSA identity of an employee.
    pub const EMPLOYEE_HSA_ID: &str = "urn:oid:1.2.752.29.6.2.1";
}

/// Format rule an attribute value must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFormat {
    /// Any non-blank string.
    Text,
    /// Twelve digits, `YYYYMMDDNNNN`.
    PersonalIdentityNumber,
    /// An ISO 8601 calendar date, `YYYY-MM-DD`.
    Date,
    /// An ISO 3166-1 alpha-2 code in upper case.
    CountryCode,
    /// A scoped value, `value@scope`.
    Scoped,
}

impl ValueFormat {
    /// Returns true if `value` is well-formed under this rule.
    ///
    /// ```
    /// use sweid_saml::ValueFormat;
    ///
    /// assert!(ValueFormat::PersonalIdentityNumber.check("199001011234"));
    /// assert!(!ValueFormat::PersonalIdentityNumber.check("19900101-1234"));
    /// assert!(ValueFormat::Scoped.check("kalle@example.se"));
    /// ```
    #[must_use]
    pub fn check(self, value: &str) -> bool {
        match self {
            Self::Text => !value.trim().is_empty(),
            Self::PersonalIdentityNumber => {
                value.len() == 12 && value.bytes().all(|b| b.is_ascii_digit())
            }
            Self::Date => {
                value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
            }
            Self::CountryCode => value.len() == 2 && value.bytes().all(|b| b.is_ascii_uppercase()),
            Self::Scoped => match value.split_once('@') {
                Some((local, scope)) => {
                    !local.is_empty() && !scope.is_empty() && !scope.contains('@')
                }
                None => false,
            },
        }
    }
}

/// Describes one attribute of the profile: its name, friendly name and the
/// format its values take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeTemplate {
    /// Attribute name (OID URN)
    pub name: &'static str,
    /// Friendly name
    pub friendly_name: &'static str,
    /// Value format
    pub format: ValueFormat,
}

impl AttributeTemplate {
    const fn new(name: &'static str, friendly_name: &'static str, format: ValueFormat) -> Self {
        Self {
            name,
            friendly_name,
            format,
        }
    }

    /// Looks up the template for an attribute name.
    ///
    /// ```
    /// use sweid_saml::{AttributeTemplate, ValueFormat, names};
    ///
    /// let t = AttributeTemplate::lookup(names::DATE_OF_BIRTH).unwrap();
    /// assert_eq!(t.friendly_name, "dateOfBirth");
    /// assert_eq!(t.format, ValueFormat::Date);
    /// ```
    #[must_use]
    pub fn lookup(name: &str) -> Option<&'static Self> {
        TEMPLATES.iter().find(|t| t.name == name)
    }

    /// Returns every template the profile defines.
    #[must_use]
    pub fn all() -> &'static [Self] {
        TEMPLATES
    }
}

pub(crate) mod templates {
    use super::{AttributeTemplate, ValueFormat, names};

    pub const SN: AttributeTemplate = AttributeTemplate::new(names::SN, "sn", ValueFormat::Text);
    pub const GIVEN_NAME: AttributeTemplate =
        AttributeTemplate::new(names::GIVEN_NAME, "givenName", ValueFormat::Text);
    pub const DISPLAY_NAME: AttributeTemplate =
        AttributeTemplate::new(names::DISPLAY_NAME, "displayName", ValueFormat::Text);
    pub const GENDER: AttributeTemplate =
        AttributeTemplate::new(names::GENDER, "gender", ValueFormat::Text);
    pub const PERSONAL_IDENTITY_NUMBER: AttributeTemplate = AttributeTemplate::new(
        names::PERSONAL_IDENTITY_NUMBER,
        "personalIdentityNumber",
        ValueFormat::PersonalIdentityNumber,
    );
    pub const PREVIOUS_PERSONAL_IDENTITY_NUMBER: AttributeTemplate = AttributeTemplate::new(
        names::PREVIOUS_PERSONAL_IDENTITY_NUMBER,
        "previousPersonalIdentityNumber",
        ValueFormat::PersonalIdentityNumber,
    );
    pub const DATE_OF_BIRTH: AttributeTemplate =
        AttributeTemplate::new(names::DATE_OF_BIRTH, "dateOfBirth", ValueFormat::Date);
    pub const BIRTH_NAME: AttributeTemplate =
        AttributeTemplate::new(names::BIRTH_NAME, "birthName", ValueFormat::Text);
    pub const STREET: AttributeTemplate =
        AttributeTemplate::new(names::STREET, "street", ValueFormat::Text);
    pub const POST_OFFICE_BOX: AttributeTemplate =
        AttributeTemplate::new(names::POST_OFFICE_BOX, "postOfficeBox", ValueFormat::Text);
    pub const POSTAL_CODE: AttributeTemplate =
        AttributeTemplate::new(names::POSTAL_CODE, "postalCode", ValueFormat::Text);
    pub const L: AttributeTemplate = AttributeTemplate::new(names::L, "l", ValueFormat::Text);
    pub const C: AttributeTemplate =
        AttributeTemplate::new(names::C, "c", ValueFormat::CountryCode);
    pub const PLACE_OF_BIRTH: AttributeTemplate =
        AttributeTemplate::new(names::PLACE_OF_BIRTH, "placeOfBirth", ValueFormat::Text);
    pub const COUNTRY_OF_CITIZENSHIP: AttributeTemplate = AttributeTemplate::new(
        names::COUNTRY_OF_CITIZENSHIP,
        "countryOfCitizenship",
        ValueFormat::CountryCode,
    );
    pub const COUNTRY_OF_RESIDENCE: AttributeTemplate = AttributeTemplate::new(
        names::COUNTRY_OF_RESIDENCE,
        "countryOfResidence",
        ValueFormat::CountryCode,
    );
    pub const TELEPHONE_NUMBER: AttributeTemplate =
        AttributeTemplate::new(names::TELEPHONE_NUMBER, "telephoneNumber", ValueFormat::Text);
    pub const MOBILE: AttributeTemplate =
        AttributeTemplate::new(names::MOBILE, "mobile", ValueFormat::Text);
    pub const MAIL: AttributeTemplate =
        AttributeTemplate::new(names::MAIL, "mail", ValueFormat::Text);
    pub const O: AttributeTemplate = AttributeTemplate::new(names::O, "o", ValueFormat::Text);
    pub const OU: AttributeTemplate = AttributeTemplate::new(names::OU, "ou", ValueFormat::Text);
    pub const ORGANIZATION_IDENTIFIER: AttributeTemplate = AttributeTemplate::new(
        names::ORGANIZATION_IDENTIFIER,
        "organizationIdentifier",
        ValueFormat::Text,
    );
    pub const ORG_AFFILIATION: AttributeTemplate =
        AttributeTemplate::new(names::ORG_AFFILIATION, "orgAffiliation", ValueFormat::Scoped);
    pub const TRANSACTION_IDENTIFIER: AttributeTemplate = AttributeTemplate::new(
        names::TRANSACTION_IDENTIFIER,
        "transactionIdentifier",
        ValueFormat::Text,
    );
    pub const AUTH_CONTEXT_PARAMS: AttributeTemplate = AttributeTemplate::new(
        names::AUTH_CONTEXT_PARAMS,
        "authContextParams",
        ValueFormat::Text,
    );
    pub const USER_CERTIFICATE: AttributeTemplate =
        AttributeTemplate::new(names::USER_CERTIFICATE, "userCertificate", ValueFormat::Text);
    pub const USER_SIGNATURE: AttributeTemplate =
        AttributeTemplate::new(names::USER_SIGNATURE, "userSignature", ValueFormat::Text);
    pub const AUTH_SERVER_SIGNATURE: AttributeTemplate = AttributeTemplate::new(
        names::AUTH_SERVER_SIGNATURE,
        "authServerSignature",
        ValueFormat::Text,
    );
    pub const SAD: AttributeTemplate = AttributeTemplate::new(names::SAD, "sad", ValueFormat::Text);
    pub const SIGN_MESSAGE_DIGEST: AttributeTemplate = AttributeTemplate::new(
        names::SIGN_MESSAGE_DIGEST,
        "signMessageDigest",
        ValueFormat::Text,
    );
    pub const PRID: AttributeTemplate =
        AttributeTemplate::new(names::PRID, "prid", ValueFormat::Text);
    pub const PRID_PERSISTENCE: AttributeTemplate =
        AttributeTemplate::new(names::PRID_PERSISTENCE, "pridPersistence", ValueFormat::Text);
    pub const PERSONAL_IDENTITY_NUMBER_BINDING: AttributeTemplate = AttributeTemplate::new(
        names::PERSONAL_IDENTITY_NUMBER_BINDING,
        "personalIdentityNumberBinding",
        ValueFormat::Text,
    );
    pub const MAPPED_PERSONAL_IDENTITY_NUMBER: AttributeTemplate = AttributeTemplate::new(
        names::MAPPED_PERSONAL_IDENTITY_NUMBER,
        "mappedPersonalIdentityNumber",
        ValueFormat::PersonalIdentityNumber,
    );
    pub const EIDAS_PERSON_IDENTIFIER: AttributeTemplate = AttributeTemplate::new(
        names::EIDAS_PERSON_IDENTIFIER,
        "eidasPersonIdentifier",
        ValueFormat::Text,
    );
    pub const EIDAS_NATURAL_PERSON_ADDRESS: AttributeTemplate = AttributeTemplate::new(
        names::EIDAS_NATURAL_PERSON_ADDRESS,
        "eidasNaturalPersonAddress",
        ValueFormat::Text,
    );
    pub const EMPLOYEE_HSA_ID: AttributeTemplate =
        AttributeTemplate::new(names::EMPLOYEE_HSA_ID, "employeeHsaId", ValueFormat::Text);
}

static TEMPLATES: &[AttributeTemplate] = &[
    templates::SN,
    templates::GIVEN_NAME,
    templates::DISPLAY_NAME,
    templates::GENDER,
    templates::PERSONAL_IDENTITY_NUMBER,
    templates::PREVIOUS_PERSONAL_IDENTITY_NUMBER,
    templates::DATE_OF_BIRTH,
    templates::BIRTH_NAME,
    templates::STREET,
    templates::POST_OFFICE_BOX,
    templates::POSTAL_CODE,
    templates::L,
    templates::C,
    templates::PLACE_OF_BIRTH,
    templates::COUNTRY_OF_CITIZENSHIP,
    templates::COUNTRY_OF_RESIDENCE,
    templates::TELEPHONE_NUMBER,
    templates::MOBILE,
    templates::MAIL,
    templates::O,
    templates::OU,
    templates::ORGANIZATION_IDENTIFIER,
    templates::ORG_AFFILIATION,
    templates::TRANSACTION_IDENTIFIER,
    templates::AUTH_CONTEXT_PARAMS,
    templates::USER_CERTIFICATE,
    templates::USER_SIGNATURE,
    templates::AUTH_SERVER_SIGNATURE,
    templates::SAD,
    templates::SIGN_MESSAGE_DIGEST,
    templates::PRID,
    templates::PRID_PERSISTENCE,
    templates::PERSONAL_IDENTITY_NUMBER_BINDING,
    templates::MAPPED_PERSONAL_IDENTITY_NUMBER,
    templates::EIDAS_PERSON_IDENTIFIER,
    templates::EIDAS_NATURAL_PERSON_ADDRESS,
    templates::EMPLOYEE_HSA_ID,
];

/// A SAML attribute with its string values.
///
/// ```
/// use sweid_saml::{Attribute, names};
///
/// let attr = Attribute::new(names::PERSONAL_IDENTITY_NUMBER, ["199001011234"]);
/// assert_eq!(attr.first_value(), Some("199001011234"));
/// assert_eq!(attr.friendly_name.as_deref(), Some("personalIdentityNumber"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Friendly name, if any
    pub friendly_name: Option<String>,
    /// Name format
    pub name_format: String,
    /// Attribute values
    pub values: Vec<String>,
}

impl Attribute {
    /// Creates an attribute with the URI name format. The friendly name is
    /// filled in from the profile's templates when the name is known.
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        let friendly_name = AttributeTemplate::lookup(&name).map(|t| t.friendly_name.to_string());
        Self {
            name,
            friendly_name,
            name_format: ATTRNAME_FORMAT_URI.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Overrides the friendly name.
    #[must_use]
    pub fn with_friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    /// Returns the first value, if any.
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Returns the profile template for this attribute, if known.
    #[must_use]
    pub fn template(&self) -> Option<&'static AttributeTemplate> {
        AttributeTemplate::lookup(&self.name)
    }
}

/// An attribute statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeStatement {
    /// The attributes, in document order
    pub attributes: Vec<Attribute>,
}

impl AttributeStatement {
    /// Creates a statement from attributes.
    #[must_use]
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Finds the first attribute with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns the first value of the named attribute.
    #[must_use]
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(Attribute::first_value)
    }

    /// Returns true if an attribute with the name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

/// An attribute requested by a service provider, as listed in its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestedAttribute {
    /// Attribute name
    pub name: String,
    /// Friendly name, if any
    pub friendly_name: Option<String>,
    /// Whether the attribute must be released
    pub is_required: bool,
}

impl RequestedAttribute {
    /// Creates a requested attribute.
    pub fn new(name: impl Into<String>, is_required: bool) -> Self {
        let name = name.into();
        let friendly_name = AttributeTemplate::lookup(&name).map(|t| t.friendly_name.to_string());
        Self {
            name,
            friendly_name,
            is_required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_names_are_unique() {
        let mut seen: Vec<_> = TEMPLATES.iter().map(|t| t.name).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), TEMPLATES.len());
    }

    #[test]
    fn unknown_attribute_has_no_template() {
        assert!(AttributeTemplate::lookup("urn:oid:1.2.3.4").is_none());
        let attr = Attribute::new("urn:oid:1.2.3.4", ["x"]);
        assert!(attr.friendly_name.is_none());
    }

    #[test]
    fn date_format() {
        assert!(ValueFormat::Date.check("1990-01-01"));
        assert!(!ValueFormat::Date.check("1990-13-01"));
        assert!(!ValueFormat::Date.check("19900101"));
    }

    #[test]
    fn country_code_format() {
        assert!(ValueFormat::CountryCode.check("SE"));
        assert!(!ValueFormat::CountryCode.check("se"));
        assert!(!ValueFormat::CountryCode.check("SWE"));
    }

    #[test]
    fn scoped_format() {
        assert!(ValueFormat::Scoped.check("a@b"));
        assert!(!ValueFormat::Scoped.check("a@"));
        assert!(!ValueFormat::Scoped.check("@b"));
        assert!(!ValueFormat::Scoped.check("a@b@c"));
        assert!(!ValueFormat::Scoped.check("ab"));
    }

    #[test]
    fn text_format_rejects_blank() {
        assert!(!ValueFormat::Text.check("   "));
        assert!(ValueFormat::Text.check("Kalle"));
    }

    #[test]
    fn statement_lookup() {
        let stmt = AttributeStatement::default()
            .with_attribute(Attribute::new(names::SN, ["Andersson"]))
            .with_attribute(Attribute::new(names::GIVEN_NAME, ["Kalle", "Karl"]));

        assert!(stmt.contains(names::SN));
        assert_eq!(stmt.first_value(names::GIVEN_NAME), Some("Kalle"));
        assert!(stmt.first_value(names::MAIL).is_none());
    }

    #[test]
    fn requested_attribute_gets_friendly_name() {
        let ra = RequestedAttribute::new(names::MAIL, false);
        assert_eq!(ra.friendly_name.as_deref(), Some("mail"));
        assert!(!ra.is_required);
    }
}
