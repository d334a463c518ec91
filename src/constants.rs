//! Protocol constants for the Swedish eID SAML profile.

/// SAML 2.0 assertion namespace.
pub const SAML2_ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 protocol namespace.
pub const SAML2_PROTOCOL_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// Persistent `NameID` format.
pub const NAMEID_FORMAT_PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";

/// Transient `NameID` format.
pub const NAMEID_FORMAT_TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";

/// Bearer subject confirmation method.
pub const CONFIRMATION_METHOD_BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";

/// Holder-of-key subject confirmation method.
pub const CONFIRMATION_METHOD_HOLDER_OF_KEY: &str = "urn:oasis:names:tc:SAML:2.0:cm:holder-of-key";

/// Top-level status code for a successful response.
pub const STATUS_SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

/// Top-level status code for a requester error.
pub const STATUS_REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";

/// Top-level status code for a responder error.
pub const STATUS_RESPONDER: &str = "urn:oasis:names:tc:SAML:2.0:status:Responder";

/// URI attribute name format, the only format the profile uses.
pub const ATTRNAME_FORMAT_URI: &str = "urn:oasis:names:tc:SAML:2.0:attrname-format:uri";

/// Namespace of the `SADRequest` extension.
pub const SAP_NS: &str = "http://id.elegnamnden.se/csig/1.1/sap/ns";

/// Namespace of the DSS extension carrying `SignMessage`.
pub const CSIG_NS: &str = "http://id.elegnamnden.se/csig/1.1/dss-ext/ns";

/// Namespace of the `PrincipalSelection` extension.
pub const PRINCIPAL_SELECTION_NS: &str =
    "http://id.swedenconnect.se/authn/1.0/principal-selection/ns";

/// SAD version requested when none is given.
pub const DEFAULT_SAD_VERSION: &str = "1.0";
