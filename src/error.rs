//! Error types for request construction.
//!
//! Every failure while building a request aborts the whole build. There is no
//! partially built request to recover, so callers only ever see a single
//! [`Error`] and decide for themselves whether to try again.

use std::io;

/// The main error type for building (and handing off) requests.
///
/// # Examples
///
/// ```no_run
/// use postie::{Error, ParameterSet};
///
/// # fn example() {
/// match postie::get("not a url", &ParameterSet::new()) {
///     Ok(request) => println!("Built request for {}", request.url()),
///     Err(Error::InvalidUrl(e)) => eprintln!("Bad URI: {}", e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An I/O error occurred while reading an attachment or writing the body.
    ///
    /// This covers files that cannot be opened, stat'ed or read, caller
    /// streams that fail or are empty when sniffed, and sinks that refuse
    /// writes.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An invalid URL was provided.
    ///
    /// This wraps URL parsing errors.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration was provided.
    ///
    /// This indicates a problem with how the request was configured, such as
    /// an injected multipart boundary that RFC 2046 does not allow or an
    /// invalid header value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to serialize a JSON request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// A network-level error occurred while handing the request to the transport.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport gave up waiting for the server.
    #[error("Request timed out")]
    Timeout,
}

impl Error {
    /// Returns `true` if this error came from attachment or body I/O.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Returns the underlying I/O error kind, if this is an I/O error.
    ///
    /// # Examples
    ///
    /// ```
    /// use postie::Error;
    /// use std::io;
    ///
    /// let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
    /// assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
    /// assert_eq!(Error::Timeout.io_kind(), None);
    /// ```
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// A specialized `Result` type for request construction.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_classified() {
        let err = Error::from(io::Error::new(io::ErrorKind::UnexpectedEof, "empty"));
        assert!(err.is_io());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::UnexpectedEof));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_url_errors_convert() {
        let err: Error = url::Url::parse("::nope").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(!err.is_io());
    }
}
