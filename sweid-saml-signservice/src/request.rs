//! The SAD request a signature service sends along with an authentication
//! request.

use crate::claims::SAD_VERSION;
use crate::error::RequestError;
use crate::sign_message::SignMessage;

/// A named request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: String,
}

/// Ordered request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestParams {
    params: Vec<Parameter>,
}

impl RequestParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::EmptyParameterName` if `name` is blank.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), RequestError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RequestError::EmptyParameterName);
        }
        self.params.push(Parameter {
            name,
            value: value.into(),
        });
        Ok(())
    }

    /// Returns the value of the first parameter named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// A request for a SAD, carried in the extensions of an authentication
/// request.
///
/// Never mutated once built; the factory and validator only read it.
///
/// ```
/// use sweid_saml_signservice::SadRequest;
///
/// let request = SadRequest::builder()
///     .id("_sadreq1")
///     .requester_id("https://sign.example.se")
///     .sign_request_id("f6e7d061a23293b0053dc7b038a04dad")
///     .doc_count(1)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.requested_version, "1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SadRequest {
    /// Request ID; a SAD answering it carries it as `irt`
    pub id: String,
    /// Entity ID of the signature service; the expected SAD audience
    pub requester_id: String,
    /// ID of the sign request the SAD authorizes
    pub sign_request_id: String,
    /// Number of documents to be signed
    pub doc_count: u32,
    /// Requested SAD version
    pub requested_version: String,
    /// Additional parameters
    pub request_params: RequestParams,
    /// The message to display, usually encrypted to the identity provider
    pub sign_message: Option<SignMessage>,
}

impl SadRequest {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> SadRequestBuilder {
        SadRequestBuilder::default()
    }
}

/// Builder for [`SadRequest`].
#[derive(Debug, Clone, Default)]
pub struct SadRequestBuilder {
    id: Option<String>,
    requester_id: Option<String>,
    sign_request_id: Option<String>,
    doc_count: Option<u32>,
    requested_version: Option<String>,
    params: Vec<(String, String)>,
    sign_message: Option<SignMessage>,
}

impl SadRequestBuilder {
    /// Sets the request ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the requester (signature service) entity ID.
    #[must_use]
    pub fn requester_id(mut self, id: impl Into<String>) -> Self {
        self.requester_id = Some(id.into());
        self
    }

    /// Sets the sign request ID.
    #[must_use]
    pub fn sign_request_id(mut self, id: impl Into<String>) -> Self {
        self.sign_request_id = Some(id.into());
        self
    }

    /// Sets the document count.
    #[must_use]
    pub fn doc_count(mut self, count: u32) -> Self {
        self.doc_count = Some(count);
        self
    }

    /// Overrides the requested version.
    #[must_use]
    pub fn requested_version(mut self, version: impl Into<String>) -> Self {
        self.requested_version = Some(version.into());
        self
    }

    /// Adds a request parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Attaches a sign message.
    #[must_use]
    pub fn sign_message(mut self, message: SignMessage) -> Self {
        self.sign_message = Some(message);
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// - `MissingField` if the ID, requester ID or sign request ID is unset
    /// - `NoDocuments` if the document count is unset or zero
    /// - `EmptyParameterName` if a parameter name is blank
    pub fn build(self) -> Result<SadRequest, RequestError> {
        let id = required(self.id, "id")?;
        let requester_id = required(self.requester_id, "requester_id")?;
        let sign_request_id = required(self.sign_request_id, "sign_request_id")?;
        let doc_count = match self.doc_count {
            Some(count) if count > 0 => count,
            _ => return Err(RequestError::NoDocuments),
        };

        let mut request_params = RequestParams::new();
        for (name, value) in self.params {
            request_params.push(name, value)?;
        }

        Ok(SadRequest {
            id,
            requester_id,
            sign_request_id,
            doc_count,
            requested_version: self
                .requested_version
                .unwrap_or_else(|| SAD_VERSION.to_string()),
            request_params,
            sign_message: self.sign_message,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, RequestError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(RequestError::MissingField { field })
}
