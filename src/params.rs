//! Logical request inputs: scalar parameters and attachments.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// Scalar key/value pairs used for query parameters and form fields.
///
/// Keys are unique. A sorted map keeps encoded output reproducible.
pub type ParameterSet = BTreeMap<String, String>;

/// Builds a [`ParameterSet`] from anything that yields key/value pairs.
///
/// # Examples
///
/// ```
/// let params = postie::param_set([("page", "2"), ("sort", "name")]);
/// assert_eq!(params["page"], "2");
/// ```
pub fn param_set<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// One multipart field holding one or more files from the file system.
///
/// Each path becomes its own part, in the order listed. Files are opened only
/// when the body is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// The form field name shared by every file in this group.
    pub field: String,

    /// The files to attach, in order.
    pub paths: Vec<PathBuf>,
}

impl FileAttachment {
    /// Creates a group for `field` with the given paths.
    pub fn new<P: Into<PathBuf>>(field: impl Into<String>, paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            field: field.into(),
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends one more path to this group.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }
}

/// One multipart field holding already-open byte sources.
///
/// Every source is paired with the filename to report for it and is read
/// exactly once, front to back. Pass `&mut reader` to keep ownership of a
/// handle you need to close yourself.
///
/// # Examples
///
/// ```
/// use postie::StreamAttachment;
///
/// let mut log = std::io::Cursor::new(b"line one\nline two\n".to_vec());
/// let attachment = StreamAttachment::new("logs")
///     .with_source("app.log", &mut log)
///     .with_source("inline.txt", &b"inline"[..]);
///
/// assert_eq!(attachment.len(), 2);
/// ```
pub struct StreamAttachment<'a> {
    /// The form field name shared by every source in this group.
    pub field: String,

    /// `(filename, source)` pairs, in order.
    pub sources: Vec<(String, Box<dyn Read + 'a>)>,
}

impl<'a> StreamAttachment<'a> {
    /// Creates an empty group for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sources: Vec::new(),
        }
    }

    /// Adds a source reported under `filename`.
    pub fn with_source(mut self, filename: impl Into<String>, source: impl Read + 'a) -> Self {
        self.sources.push((filename.into(), Box::new(source)));
        self
    }

    /// Returns the number of sources in this group.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if this group has no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for StreamAttachment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filenames: Vec<&str> = self.sources.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("StreamAttachment")
            .field("field", &self.field)
            .field("sources", &filenames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_set_keeps_last_value_and_sorts() {
        let set = param_set([("b", "1"), ("a", "2"), ("b", "3")]);
        let pairs: Vec<(&str, &str)> = set.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(pairs, vec![("a", "2"), ("b", "3")]);
    }

    #[test]
    fn test_file_attachment_paths_keep_their_order() {
        let group = FileAttachment::new("docs", ["first.txt"])
            .with_path("second.txt")
            .with_path(PathBuf::from("nested/third.txt"));

        assert_eq!(group.field, "docs");
        assert_eq!(
            group.paths,
            vec![
                PathBuf::from("first.txt"),
                PathBuf::from("second.txt"),
                PathBuf::from("nested/third.txt"),
            ]
        );
    }

    #[test]
    fn test_stream_attachment_debug_lists_filenames() {
        let attachment = StreamAttachment::new("logs")
            .with_source("a.log", &b"a"[..])
            .with_source("b.log", &b"b"[..]);

        assert_eq!(attachment.len(), 2);
        assert!(!attachment.is_empty());
        assert_eq!(
            format!("{attachment:?}"),
            r#"StreamAttachment { field: "logs", sources: ["a.log", "b.log"] }"#
        );
    }
}
