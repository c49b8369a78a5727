//! Request assembly.
//!
//! [`RequestBuilder`] (and the [`build_request`] shorthand) turns a method, a
//! URI and a set of logical inputs into an [`OutboundRequest`]. The body
//! encoding is picked from which inputs are non-empty, first match wins:
//!
//! 1. file or stream attachments: `multipart/form-data`, with form fields
//!    written as plain parts of the same body
//! 2. a JSON body: passed through verbatim as `application/json`
//! 3. form fields: `application/x-www-form-urlencoded`
//! 4. nothing: an empty body, still labelled
//!    `application/x-www-form-urlencoded`
//!
//! Inputs that lose are dropped without an error: attachments win over a
//! JSON body, and a JSON body discards form fields. Nothing is ever merged
//! across strategies.
//!
//! Query parameters are always added to whatever query the URI already has.

use crate::body::Body;
use crate::form::{self, FORM_CONTENT_TYPE};
use crate::multipart::{Boundary, MultipartForm};
use crate::params::{FileAttachment, ParameterSet, StreamAttachment};
use crate::{Error, Result};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::path::PathBuf;
use url::Url;

/// The content type of a JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The body encoding chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `multipart/form-data` with attachments and fields.
    Multipart,
    /// Raw JSON bytes.
    Json,
    /// `application/x-www-form-urlencoded` fields.
    Form,
    /// No body.
    Empty,
}

impl BodyKind {
    /// Picks the encoding from which inputs are present.
    ///
    /// # Examples
    ///
    /// ```
    /// use postie::BodyKind;
    ///
    /// assert_eq!(BodyKind::select(true, true, true), BodyKind::Multipart);
    /// assert_eq!(BodyKind::select(false, true, true), BodyKind::Json);
    /// assert_eq!(BodyKind::select(false, false, true), BodyKind::Form);
    /// assert_eq!(BodyKind::select(false, false, false), BodyKind::Empty);
    /// ```
    pub fn select(has_attachments: bool, has_json: bool, has_form: bool) -> Self {
        if has_attachments {
            BodyKind::Multipart
        } else if has_json {
            BodyKind::Json
        } else if has_form {
            BodyKind::Form
        } else {
            BodyKind::Empty
        }
    }
}

/// A fully assembled request, ready to hand to a transport.
#[derive(Debug)]
pub struct OutboundRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Body,
    pub(crate) kind: BodyKind,
}

impl OutboundRequest {
    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the target URL, including the final query string
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the `Content-Type` header, if it is valid text
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    /// Get the request body
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Get the body encoding that was chosen
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Take the request body
    pub fn into_body(self) -> Body {
        self.body
    }
}

/// Fluent builder for an [`OutboundRequest`].
///
/// # Examples
///
/// ```no_run
/// use http::Method;
/// use postie::{BodyKind, RequestBuilder};
///
/// # fn example() -> Result<(), postie::Error> {
/// let request = RequestBuilder::new(Method::POST, "https://api.example.com/upload")
///     .query_param("album", "holiday")
///     .form_field("caption", "Beach")
///     .file("photo", "/tmp/beach.jpg")
///     .build()?;
///
/// assert_eq!(request.kind(), BodyKind::Multipart);
/// assert_eq!(request.url().query(), Some("album=holiday"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    method: Method,
    uri: String,
    headers: HeaderMap,
    query: ParameterSet,
    form: ParameterSet,
    files: Vec<FileAttachment>,
    streams: Vec<StreamAttachment<'a>>,
    json: Option<Body>,
    boundary: Option<Boundary>,
}

impl<'a> RequestBuilder<'a> {
    /// Starts a request for `method` and `uri`.
    ///
    /// The URI may already carry a query string; it is kept.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            query: ParameterSet::new(),
            form: ParameterSet::new(),
            files: Vec::new(),
            streams: Vec::new(),
            json: None,
            boundary: None,
        }
    }

    /// Adds a header to the request.
    ///
    /// `Content-Type` is always replaced by the one matching the chosen body.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter to the request.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Adds multiple query parameters to the request.
    pub fn query_params(mut self, params: ParameterSet) -> Self {
        self.query.extend(params);
        self
    }

    /// Adds a form field.
    ///
    /// Fields become multipart parts when attachments are present and are
    /// ignored when a JSON body is set.
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key.into(), value.into());
        self
    }

    /// Adds multiple form fields.
    pub fn form_fields(mut self, fields: ParameterSet) -> Self {
        self.form.extend(fields);
        self
    }

    /// Attaches a file under `field`, appending to an existing group of that name.
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let field = field.into();
        let path = path.into();
        match self.files.iter_mut().find(|group| group.field == field) {
            Some(group) => group.paths.push(path),
            None => self.files.push(FileAttachment::new(field, [path])),
        }
        self
    }

    /// Attaches a group of files.
    pub fn files(mut self, attachment: FileAttachment) -> Self {
        self.files.push(attachment);
        self
    }

    /// Attaches a group of caller-supplied sources.
    pub fn stream(mut self, attachment: StreamAttachment<'a>) -> Self {
        self.streams.push(attachment);
        self
    }

    /// Sets a raw JSON body, sent byte for byte.
    ///
    /// Ignored when attachments are present.
    pub fn json(mut self, body: impl Into<Body>) -> Self {
        self.json = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `value` cannot be serialized.
    pub fn json_value<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| Error::SerializationFailed(e.to_string()))?;
        Ok(self.json(bytes))
    }

    /// Uses a fixed multipart boundary instead of a random one.
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Assembles the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for a malformed URI and [`Error::Io`] if an
    /// attachment cannot be opened or read. Nothing is returned on failure.
    pub fn build(self) -> Result<OutboundRequest> {
        let mut url = Url::parse(&self.uri)?;

        let mut multipart = MultipartForm::new();
        for group in self.files {
            multipart = multipart.files(group);
        }
        for group in self.streams {
            multipart = multipart.stream(group);
        }
        if let Some(boundary) = self.boundary {
            multipart = multipart.boundary(boundary);
        }

        let kind = BodyKind::select(
            multipart.has_attachments(),
            self.json.is_some(),
            !self.form.is_empty(),
        );

        if kind == BodyKind::Multipart && self.json.is_some() {
            tracing::debug!("Ignoring JSON body: attachments take precedence");
        }
        if kind == BodyKind::Json && !self.form.is_empty() {
            tracing::debug!(
                fields = self.form.len(),
                "Ignoring form fields: JSON body takes precedence"
            );
        }

        let (content_type, body) = match (kind, self.json) {
            (BodyKind::Multipart, _) => {
                let encoded = multipart.fields(self.form).encode()?;
                (encoded.content_type, Body::Bytes(encoded.body))
            }
            (BodyKind::Json, Some(json)) => (JSON_CONTENT_TYPE.to_string(), json),
            (BodyKind::Form, _) => (
                FORM_CONTENT_TYPE.to_string(),
                Body::from(form::encode(&self.form)),
            ),
            (BodyKind::Empty, _) | (BodyKind::Json, None) => {
                (FORM_CONTENT_TYPE.to_string(), Body::Empty)
            }
        };

        let mut headers = self.headers;
        let content_type = HeaderValue::try_from(content_type)
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        headers.insert(CONTENT_TYPE, content_type);

        form::merge_query(&mut url, &self.query);

        tracing::debug!(
            method = %self.method,
            url = %url,
            body = ?kind,
            "Built request"
        );

        Ok(OutboundRequest {
            method: self.method,
            url,
            headers,
            body,
            kind,
        })
    }
}

/// Builds a request from every kind of input at once.
///
/// Equivalent to filling a [`RequestBuilder`]; see the module docs for which
/// input wins when several are given.
///
/// # Errors
///
/// See [`RequestBuilder::build`].
pub fn build_request(
    method: Method,
    uri: &str,
    query: &ParameterSet,
    form: &ParameterSet,
    files: Vec<FileAttachment>,
    streams: Vec<StreamAttachment<'_>>,
    json: Option<Body>,
) -> Result<OutboundRequest> {
    let mut builder = RequestBuilder::new(method, uri)
        .query_params(query.clone())
        .form_fields(form.clone());
    for group in files {
        builder = builder.files(group);
    }
    for group in streams {
        builder = builder.stream(group);
    }
    if let Some(json) = json {
        builder = builder.json(json);
    }
    builder.build()
}

/// `POST`s files from disk as `multipart/form-data`, with `form` as extra fields.
///
/// # Errors
///
/// See [`RequestBuilder::build`].
pub fn upload_files(
    uri: &str,
    query: &ParameterSet,
    form: &ParameterSet,
    files: Vec<FileAttachment>,
) -> Result<OutboundRequest> {
    build_request(Method::POST, uri, query, form, files, Vec::new(), None)
}

/// `POST`s caller-supplied sources as `multipart/form-data`, with `form` as extra fields.
///
/// # Errors
///
/// See [`RequestBuilder::build`].
pub fn upload_streams(
    uri: &str,
    query: &ParameterSet,
    form: &ParameterSet,
    streams: Vec<StreamAttachment<'_>>,
) -> Result<OutboundRequest> {
    build_request(Method::POST, uri, query, form, Vec::new(), streams, None)
}

/// `POST`s `form` as `application/x-www-form-urlencoded`.
///
/// # Errors
///
/// See [`RequestBuilder::build`].
pub fn post_form(uri: &str, query: &ParameterSet, form: &ParameterSet) -> Result<OutboundRequest> {
    build_request(Method::POST, uri, query, form, Vec::new(), Vec::new(), None)
}

/// Builds a `GET` carrying only query parameters.
///
/// # Errors
///
/// See [`RequestBuilder::build`].
pub fn get(uri: &str, query: &ParameterSet) -> Result<OutboundRequest> {
    build_request(
        Method::GET,
        uri,
        query,
        &ParameterSet::new(),
        Vec::new(),
        Vec::new(),
        None,
    )
}

/// `POST`s a raw JSON body.
///
/// # Errors
///
/// See [`RequestBuilder::build`].
pub fn post_json(uri: &str, query: &ParameterSet, json: impl Into<Body>) -> Result<OutboundRequest> {
    build_request(
        Method::POST,
        uri,
        query,
        &ParameterSet::new(),
        Vec::new(),
        Vec::new(),
        Some(json.into()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param_set;
    use serde::Serialize;

    #[test]
    fn test_precedence_table() {
        for has_json in [false, true] {
            for has_form in [false, true] {
                assert_eq!(BodyKind::select(true, has_json, has_form), BodyKind::Multipart);
            }
        }
        assert_eq!(BodyKind::select(false, true, false), BodyKind::Json);
        assert_eq!(BodyKind::select(false, true, true), BodyKind::Json);
        assert_eq!(BodyKind::select(false, false, true), BodyKind::Form);
        assert_eq!(BodyKind::select(false, false, false), BodyKind::Empty);
    }

    #[test]
    fn test_empty_attachment_groups_do_not_select_multipart() {
        let request = RequestBuilder::new(Method::POST, "http://x/y")
            .files(FileAttachment::new("f", Vec::<PathBuf>::new()))
            .stream(StreamAttachment::new("s"))
            .form_field("a", "1")
            .build()
            .unwrap();
        assert_eq!(request.kind(), BodyKind::Form);
        assert_eq!(request.body().as_bytes(), Some(&b"a=1"[..]));
    }

    #[test]
    fn test_no_inputs_still_sets_form_content_type() {
        let request = RequestBuilder::new(Method::DELETE, "http://x/items/1")
            .build()
            .unwrap();
        assert_eq!(request.kind(), BodyKind::Empty);
        assert!(request.body().is_empty());
        assert_eq!(request.content_type(), Some(FORM_CONTENT_TYPE));
        assert_eq!(request.method(), &Method::DELETE);
    }

    #[test]
    fn test_content_type_header_is_overridden() {
        let request = RequestBuilder::new(Method::POST, "http://x/y")
            .header("content-type", "text/plain")
            .unwrap()
            .header("x-trace", "abc")
            .unwrap()
            .json("{}")
            .build()
            .unwrap();
        assert_eq!(request.content_type(), Some(JSON_CONTENT_TYPE));
        assert_eq!(request.headers()["x-trace"], "abc");
    }

    #[test]
    fn test_json_value_serializes() {
        #[derive(Serialize)]
        struct Colour {
            name: &'static str,
            hex: &'static str,
        }

        let request = RequestBuilder::new(Method::PUT, "http://x/colours/red")
            .json_value(&Colour {
                name: "red",
                hex: "#f00",
            })
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.body().as_bytes(),
            Some(&br##"{"name":"red","hex":"#f00"}"##[..])
        );
    }

    #[test]
    fn test_invalid_header_is_a_configuration_error() {
        let err = RequestBuilder::new(Method::GET, "http://x/")
            .header("bad header", "v")
            .unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }

    #[test]
    fn test_invalid_uri_fails_before_reading_attachments() {
        let mut reads = 0usize;
        let source = std::io::Read::take(&b"data"[..], 4);
        let counting = CountingReader {
            inner: source,
            reads: &mut reads,
        };
        let err = RequestBuilder::new(Method::POST, "not a uri")
            .stream(StreamAttachment::new("s").with_source("a.txt", counting))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert_eq!(reads, 0);
    }

    struct CountingReader<'r, R> {
        inner: R,
        reads: &'r mut usize,
    }

    impl<R: std::io::Read> std::io::Read for CountingReader<'_, R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            *self.reads += 1;
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_get_merges_into_existing_query() {
        let request = get("http://x/y?a=1", &param_set([("a", "2"), ("b", "3")])).unwrap();
        assert_eq!(request.url().as_str(), "http://x/y?a=1&a=2&b=3");
        assert_eq!(request.method(), &Method::GET);
    }
}
