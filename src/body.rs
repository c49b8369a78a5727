//! Outbound request bodies.

use bytes::Bytes;
use std::fmt;
use std::io::{self, Read};

/// The body of an [`OutboundRequest`](crate::OutboundRequest).
///
/// Bodies are either fully buffered or a reader that is drained only when
/// the request is handed to a transport.
#[derive(Default)]
pub enum Body {
    /// No body at all.
    #[default]
    Empty,
    /// Buffered bytes.
    Bytes(Bytes),
    /// A lazily read source.
    Reader(Box<dyn Read + Send>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => write!(f, "Body::Empty"),
            Body::Bytes(bytes) => f.debug_tuple("Body::Bytes").field(&bytes.len()).finish(),
            Body::Reader(_) => write!(f, "Body::Reader(..)"),
        }
    }
}

impl Body {
    /// Creates a body that reads from `reader` on demand.
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Body::Reader(Box::new(reader))
    }

    /// Returns `true` for [`Body::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Returns the buffered bytes, if this body is buffered.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Empty => Some(&[]),
            Body::Bytes(bytes) => Some(bytes),
            Body::Reader(_) => None,
        }
    }

    /// Collects the body into memory, draining a lazy reader if needed.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while draining a reader.
    pub fn into_bytes(self) -> io::Result<Bytes> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Bytes(bytes) => Ok(bytes),
            Body::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Bytes(b)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Bytes(Bytes::from(s))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(b: &'static [u8]) -> Self {
        Body::Bytes(Bytes::from_static(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_body_is_drained_lazily() {
        let body = Body::from_reader(Cursor::new(b"{\"a\":1}".to_vec()));
        assert!(body.as_bytes().is_none());
        assert_eq!(body.into_bytes().unwrap(), Bytes::from_static(b"{\"a\":1}"));
    }

    #[test]
    fn test_empty_body_has_no_bytes() {
        let body = Body::default();
        assert!(body.is_empty());
        assert_eq!(body.as_bytes(), Some(&[][..]));
        assert!(body.into_bytes().unwrap().is_empty());
    }
}
