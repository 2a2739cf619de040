//! Transport-neutral request and response shapes for the registry backend.
//!
//! Form definitions build [`ApiRequest`] values; the outbound HTTP adapter
//! turns them into real requests. Keeping the shape here lets the domain
//! reason about headers, multipart parts and endpoints without a client
//! library in scope.

use std::fmt;

use serde_json::Value;

/// Header carrying the signed-in farmer's id on cattle registration.
pub const OWNER_ID_HEADER: &str = "X-Owner-Id";

/// Backend endpoint paths, relative to the configured base URL.
pub mod endpoints {
    use crate::domain::Role;

    /// Shared login endpoint for all roles.
    pub const LOGIN: &str = "/api/auth/login";
    /// Reports whether an INAPH-registered farmer has set a password.
    pub const INAPH_CHECK_PASSWORD: &str = "/api/auth/inaph/check-password";
    /// Sets the first password for an INAPH-registered farmer.
    pub const INAPH_CREATE_PASSWORD: &str = "/api/auth/inaph/create-password";
    /// Password login for INAPH-registered farmers.
    pub const INAPH_LOGIN: &str = "/api/auth/inaph/login";
    /// Multipart cattle registration.
    pub const ADD_CATTLE: &str = "/api/cattles/add-new-cattle";
    /// Multipart complaint submission.
    pub const SUBMIT_COMPLAINT: &str = "/api/complaints/cattle";

    /// Role-specific signup endpoint.
    pub fn signup(role: Role) -> String {
        format!("/api/auth/signup/{}", role.as_str())
    }
}

/// HTTP verbs the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// A file chosen for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl Upload {
    /// Wrap file contents, deriving the content type from the extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_owned();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Original file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// MIME type sent with the multipart part.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

// File bodies can be megabytes; keep debug output readable.
impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartField {
    name: String,
    value: MultipartValue,
}

/// Payload of a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartValue {
    /// Plain text value.
    Text(String),
    /// Binary file part.
    File(Upload),
}

impl MultipartField {
    /// Text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::Text(value.into()),
        }
    }

    /// File part.
    pub fn file(name: impl Into<String>, upload: Upload) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::File(upload),
        }
    }

    /// Part name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Part payload.
    pub fn value(&self) -> &MultipartValue {
        &self.value
    }

    /// Text payload, when this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            MultipartValue::Text(text) => Some(text),
            MultipartValue::File(_) => None,
        }
    }

    pub(crate) fn set_text(&mut self, value: String) {
        self.value = MultipartValue::Text(value);
    }
}

/// Request body variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// `multipart/form-data` parts in submission order.
    Multipart(Vec<MultipartField>),
}

/// A request destined for the registry backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: RequestBody,
}

impl ApiRequest {
    fn new(method: HttpMethod, path: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body,
        }
    }

    /// `GET` without a body.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, RequestBody::Empty)
    }

    /// `POST` with a JSON body.
    pub fn post_json(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path, RequestBody::Json(body))
    }

    /// `POST` with a multipart body.
    pub fn post_multipart(path: impl Into<String>, fields: Vec<MultipartField>) -> Self {
        Self::new(HttpMethod::Post, path, RequestBody::Multipart(fields))
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Multipart part with the given name, if the body is multipart.
    pub fn multipart_field(&self, name: &str) -> Option<&MultipartField> {
        match &self.body {
            RequestBody::Multipart(fields) => fields.iter().find(|field| field.name() == name),
            _ => None,
        }
    }

    /// Consume the request into its parts for an adapter.
    pub fn into_parts(self) -> ApiRequestParts {
        ApiRequestParts {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Owned pieces of an [`ApiRequest`].
#[derive(Debug)]
pub struct ApiRequestParts {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

/// Raw response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Response with a serialised JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::Role;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("cow.PNG", "image/png", Some("png"))]
    #[case("cow.jpeg", "image/jpeg", Some("jpeg"))]
    #[case("cow.jpg", "image/jpeg", Some("jpg"))]
    #[case("cow.gif", "image/gif", Some("gif"))]
    #[case("notes.txt", "application/octet-stream", Some("txt"))]
    #[case("README", "application/octet-stream", None)]
    fn upload_content_type_follows_extension(
        #[case] name: &str,
        #[case] content_type: &str,
        #[case] ext: Option<&str>,
    ) {
        let upload = Upload::new(name, vec![1, 2, 3]);
        assert_eq!(upload.content_type(), content_type);
        assert_eq!(upload.extension().as_deref(), ext);
        assert_eq!(upload.len(), 3);
    }

    #[test]
    fn upload_debug_omits_contents() {
        let upload = Upload::new("cow.png", vec![0; 4096]);
        let rendered = format!("{upload:?}");
        assert!(rendered.contains("len: 4096"));
        assert!(!rendered.contains("[0, 0"));
    }

    #[test]
    fn headers_match_case_insensitively() {
        let request = ApiRequest::post_multipart(endpoints::ADD_CATTLE, Vec::new())
            .with_header(OWNER_ID_HEADER, "42");
        assert_eq!(request.header("x-owner-id"), Some("42"));
        assert_eq!(request.method(), HttpMethod::Post);
    }

    #[rstest]
    #[case(Role::Farmer, "/api/auth/signup/farmer")]
    #[case(Role::Vet, "/api/auth/signup/vet")]
    #[case(Role::Shelter, "/api/auth/signup/shelter")]
    fn signup_path_includes_role(#[case] role: Role, #[case] expected: &str) {
        assert_eq!(endpoints::signup(role), expected);
    }

    #[test]
    fn success_covers_2xx_only() {
        assert!(ApiResponse::json(201, &json!({})).is_success());
        assert!(!ApiResponse::new(302, Vec::new()).is_success());
        assert!(!ApiResponse::new(422, Vec::new()).is_success());
    }
}
