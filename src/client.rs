//! Handing built requests to an HTTP transport.
//!
//! Building a request never touches the network. When it is time to send,
//! an [`OutboundRequest`] converts into a [`reqwest::Request`], or goes
//! through [`Client`], a thin wrapper that adds default headers and a
//! timeout. Responses come back untouched: no decoding, no retries.

use crate::{Error, OutboundRequest, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

impl OutboundRequest {
    /// Converts this request into a [`reqwest::Request`].
    ///
    /// A lazily read body is drained into memory first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if draining the body fails.
    pub fn into_reqwest(self) -> Result<reqwest::Request> {
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        if !self.body.is_empty() {
            let bytes = self.body.into_bytes()?;
            *request.body_mut() = Some(reqwest::Body::from(bytes));
        }
        Ok(request)
    }
}

impl TryFrom<OutboundRequest> for reqwest::Request {
    type Error = Error;

    fn try_from(request: OutboundRequest) -> Result<Self> {
        request.into_reqwest()
    }
}

/// Sends [`OutboundRequest`]s over a shared `reqwest` client.
///
/// The client is cheap to clone and meant to be reused.
///
/// # Examples
///
/// ```no_run
/// use postie::Client;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), postie::Error> {
/// let client = Client::builder()
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
///
/// let request = postie::get("https://api.example.com/users", &postie::param_set([("page", "2")]))?;
/// let response = client.execute(request).await?;
/// println!("Status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Sends a built request and returns the raw response.
    ///
    /// Default headers are only added where the request does not already set
    /// that header, so a built `Content-Type` always survives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a lazy body cannot be read,
    /// [`Error::Timeout`] if the configured timeout elapses, and
    /// [`Error::Network`] for any other transport failure. Non-2xx statuses
    /// are not errors here.
    pub async fn execute(&self, request: OutboundRequest) -> Result<reqwest::Response> {
        let mut request = request.into_reqwest()?;

        for (name, value) in &self.inner.default_headers {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }
        if let Some(timeout) = self.inner.timeout {
            *request.timeout_mut() = Some(timeout);
        }

        let method = request.method().clone();
        let url = request.url().clone();

        tracing::debug!(
            method = %method,
            url = %url,
            "Executing HTTP request"
        );

        match self.inner.http_client.execute(request).await {
            Ok(response) => {
                tracing::info!(
                    status = response.status().as_u16(),
                    method = %method,
                    url = %url,
                    "Received HTTP response"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    method = %method,
                    url = %url,
                    "Request failed"
                );
                if e.is_timeout() {
                    Err(Error::Timeout)
                } else {
                    Err(Error::Network(e))
                }
            }
        }
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use postie::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), postie::Error> {
/// let client = ClientBuilder::new()
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            default_headers: HeaderMap::new(),
            timeout: None,
        }
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<Client> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                default_headers: self.default_headers,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{param_set, Body, RequestBuilder};
    use http::Method;
    use std::io::Cursor;

    #[test]
    fn test_into_reqwest_keeps_method_url_and_headers() {
        let request = crate::post_form(
            "http://x/y",
            &param_set([("q", "1")]),
            &param_set([("p", "2")]),
        )
        .unwrap();
        let converted = reqwest::Request::try_from(request).unwrap();

        assert_eq!(converted.method(), &Method::POST);
        assert_eq!(converted.url().as_str(), "http://x/y?q=1");
        assert_eq!(
            converted.headers()[http::header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let body = converted.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"p=2");
    }

    #[test]
    fn test_into_reqwest_drains_lazy_body() {
        let request = RequestBuilder::new(Method::POST, "http://x/json")
            .json(Body::from_reader(Cursor::new(b"[1,2,3]".to_vec())))
            .build()
            .unwrap();
        let converted = request.into_reqwest().unwrap();
        assert_eq!(converted.body().and_then(|b| b.as_bytes()), Some(&b"[1,2,3]"[..]));
    }

    #[test]
    fn test_empty_body_converts_to_none() {
        let request = crate::get("http://x/", &param_set([("a", "b")])).unwrap();
        let converted = request.into_reqwest().unwrap();
        assert!(converted.body().is_none());
    }

    #[test]
    fn test_builder_rejects_bad_default_header() {
        let result = Client::builder().default_header("x", "bad\nvalue");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }
}
