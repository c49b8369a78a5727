//! `multipart/form-data` body encoding.
//!
//! [`MultipartWriter`] does the byte-level framing on top of any
//! [`Write`] sink. [`MultipartForm`] collects the logical inputs (file
//! attachments, stream attachments and scalar fields) and encodes them in a
//! fixed order:
//!
//! 1. file parts, group by group, one part per path in the listed order
//! 2. stream parts, group by group, one part per source in the listed order
//! 3. scalar fields, sorted by key
//!
//! Every attachment part carries a sniffed `Content-Type` (see
//! [`crate::sniff`]) and a `Content-Disposition` with `filename` and `name`.
//!
//! # Examples
//!
//! ```
//! use postie::multipart::{Boundary, MultipartForm};
//! use postie::StreamAttachment;
//!
//! let encoded = MultipartForm::new()
//!     .stream(StreamAttachment::new("doc").with_source("notes.txt", &b"hi"[..]))
//!     .field("title", "Notes")
//!     .boundary(Boundary::new("XyZ")?)
//!     .encode()?;
//!
//! assert_eq!(encoded.content_type, "multipart/form-data; boundary=XyZ");
//! assert!(encoded.body.starts_with(b"--XyZ\r\n"));
//! assert!(encoded.body.ends_with(b"\r\n--XyZ--\r\n"));
//! # Ok::<(), postie::Error>(())
//! ```

use crate::params::{FileAttachment, ParameterSet, StreamAttachment};
use crate::{sniff, Error, Result};
use bytes::Bytes;
use rand::RngCore;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// RFC 2046 caps boundaries at 70 characters.
const MAX_BOUNDARY_LEN: usize = 70;

/// Random bytes per generated boundary; hex encoding doubles the length.
const BOUNDARY_ENTROPY: usize = 30;

/// A multipart boundary token.
///
/// Use [`Boundary::random`] for real requests and [`Boundary::new`] when a
/// reproducible body is needed, for example in tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Generates a fresh boundary from the thread-local random source.
    pub fn random() -> Self {
        let mut raw = [0u8; BOUNDARY_ENTROPY];
        rand::thread_rng().fill_bytes(&mut raw);
        Self(hex::encode(raw))
    }

    /// Uses a caller-chosen boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] unless the value is 1 to 70
    /// characters from the RFC 2046 boundary alphabet and does not end with
    /// a space.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > MAX_BOUNDARY_LEN {
            return Err(Error::ConfigurationError(format!(
                "multipart boundary must be 1 to {MAX_BOUNDARY_LEN} characters, got {}",
                value.len()
            )));
        }
        if let Some(c) = value.chars().find(|&c| !is_boundary_char(c)) {
            return Err(Error::ConfigurationError(format!(
                "invalid character {c:?} in multipart boundary"
            )));
        }
        if value.ends_with(' ') {
            return Err(Error::ConfigurationError(
                "multipart boundary must not end with a space".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Returns the boundary token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `multipart/form-data` content type carrying this boundary.
    ///
    /// The boundary is quoted when it contains characters that are special
    /// in header parameters.
    pub fn content_type(&self) -> String {
        if self.0.contains(|c: char| "()<>@,;:\\\"/[]?= ".contains(c)) {
            format!("multipart/form-data; boundary=\"{}\"", self.0)
        } else {
            format!("multipart/form-data; boundary={}", self.0)
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_boundary_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c)
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Low-level multipart framing over a [`Write`] sink.
///
/// Parts are written one after another; [`finish`](Self::finish) writes the
/// closing delimiter and hands the sink back.
#[derive(Debug)]
pub struct MultipartWriter<W: Write> {
    inner: W,
    boundary: Boundary,
    parts: usize,
}

impl<W: Write> MultipartWriter<W> {
    /// Creates a writer with a random boundary.
    pub fn new(inner: W) -> Self {
        Self::with_boundary(inner, Boundary::random())
    }

    /// Creates a writer with the given boundary.
    pub fn with_boundary(inner: W, boundary: Boundary) -> Self {
        Self {
            inner,
            boundary,
            parts: 0,
        }
    }

    /// Returns the boundary in use.
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Returns the `Content-Type` header value for the body being written.
    pub fn content_type(&self) -> String {
        self.boundary.content_type()
    }

    /// Returns how many parts have been started so far.
    pub fn parts_written(&self) -> usize {
        self.parts
    }

    /// Writes the delimiter and headers of a new part.
    ///
    /// Headers go out sorted by name, so the disposition always precedes the
    /// content type.
    fn begin_part(&mut self, disposition: &str, content_type: Option<&str>) -> io::Result<()> {
        if self.parts == 0 {
            write!(self.inner, "--{}\r\n", self.boundary)?;
        } else {
            write!(self.inner, "\r\n--{}\r\n", self.boundary)?;
        }
        write!(self.inner, "Content-Disposition: {disposition}\r\n")?;
        if let Some(content_type) = content_type {
            write!(self.inner, "Content-Type: {content_type}\r\n")?;
        }
        self.inner.write_all(b"\r\n")?;
        self.parts += 1;
        Ok(())
    }

    /// Writes one file from disk as an attachment part.
    ///
    /// The part's filename is the path's final component. The file is closed
    /// before this returns, whether or not the copy succeeded.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, stat'ed or read, if it is empty,
    /// or if the sink rejects a write.
    pub fn write_file(&mut self, field: &str, path: &Path) -> io::Result<u64> {
        let mut file = File::open(path).map_err(|e| with_path(e, path))?;
        let size = file.metadata().map_err(|e| with_path(e, path))?.len();
        let content_type = sniff::sniff_seekable(&mut file).map_err(|e| with_path(e, path))?;
        let filename = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy());

        self.begin_part(&attachment_disposition(field, &filename), Some(content_type))?;
        let copied = io::copy(&mut file, &mut self.inner)?;

        tracing::trace!(
            field = field,
            filename = %filename,
            content_type = content_type,
            size = size,
            "Wrote file part"
        );
        Ok(copied)
    }

    /// Writes one caller-supplied source as an attachment part.
    ///
    /// The source is read once: the sniffed prefix is replayed ahead of the
    /// rest, so the whole content ends up in the part.
    ///
    /// # Errors
    ///
    /// Fails if the source is empty or errors while being read, or if the
    /// sink rejects a write.
    pub fn write_stream<R: Read>(&mut self, field: &str, filename: &str, source: R) -> io::Result<u64> {
        let (content_type, mut replay) = sniff::sniff_stream(source)?;

        self.begin_part(&attachment_disposition(field, filename), Some(content_type))?;
        let copied = io::copy(&mut replay, &mut self.inner)?;

        tracing::trace!(
            field = field,
            filename = filename,
            content_type = content_type,
            bytes = copied,
            "Wrote stream part"
        );
        Ok(copied)
    }

    /// Writes a plain form field part.
    ///
    /// # Errors
    ///
    /// Fails if the sink rejects a write.
    pub fn write_field(&mut self, name: &str, value: &str) -> io::Result<()> {
        let disposition = format!("form-data; name=\"{}\"", escape_quotes(name));
        self.begin_part(&disposition, None)?;
        self.inner.write_all(value.as_bytes())
    }

    /// Writes the closing delimiter and returns the sink.
    ///
    /// # Errors
    ///
    /// Fails if the sink rejects the write or the flush.
    pub fn finish(mut self) -> io::Result<W> {
        write!(self.inner, "\r\n--{}--\r\n", self.boundary)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn attachment_disposition(field: &str, filename: &str) -> String {
    format!(
        "form-data; filename=\"{}\"; name=\"{}\"",
        escape_quotes(filename),
        escape_quotes(field)
    )
}

fn with_path(err: io::Error, path: &Path) -> io::Error {
    io::Error::new(err.kind(), format!("{}: {err}", path.display()))
}

/// A buffered multipart body together with its content type.
#[derive(Debug, Clone)]
pub struct EncodedForm {
    /// The `multipart/form-data; boundary=...` header value.
    pub content_type: String,

    /// The boundary used to frame `body`.
    pub boundary: Boundary,

    /// The complete body.
    pub body: Bytes,
}

/// The logical contents of a multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm<'a> {
    files: Vec<FileAttachment>,
    streams: Vec<StreamAttachment<'a>>,
    fields: ParameterSet,
    boundary: Option<Boundary>,
}

impl<'a> MultipartForm<'a> {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches one file under `field`.
    ///
    /// Files sharing a field name are grouped, keeping the order they were
    /// added in.
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let field = field.into();
        let path = path.into();
        match self.files.iter_mut().find(|group| group.field == field) {
            Some(group) => group.paths.push(path),
            None => self.files.push(FileAttachment::new(field, [path])),
        }
        self
    }

    /// Attaches a whole group of files.
    pub fn files(mut self, attachment: FileAttachment) -> Self {
        self.files.push(attachment);
        self
    }

    /// Attaches a group of caller-supplied sources.
    pub fn stream(mut self, attachment: StreamAttachment<'a>) -> Self {
        self.streams.push(attachment);
        self
    }

    /// Adds a scalar field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Adds several scalar fields.
    pub fn fields(mut self, fields: ParameterSet) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Uses a fixed boundary instead of a random one.
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Returns `true` if any file or stream source is attached.
    pub fn has_attachments(&self) -> bool {
        self.files.iter().any(|group| !group.paths.is_empty())
            || self.streams.iter().any(|group| !group.is_empty())
    }

    /// Encodes the form into memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if any attachment cannot be opened or read. No
    /// partial body is returned.
    pub fn encode(self) -> Result<EncodedForm> {
        let (boundary, body) = self.write_to(Vec::new())?;
        Ok(EncodedForm {
            content_type: boundary.content_type(),
            boundary,
            body: Bytes::from(body),
        })
    }

    /// Encodes the form into `sink`, returning the boundary used and the sink.
    ///
    /// On error the sink may hold a partial body; it must be discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if any attachment cannot be opened or read, or if
    /// the sink rejects a write.
    pub fn write_to<W: Write>(self, sink: W) -> Result<(Boundary, W)> {
        let boundary = self.boundary.unwrap_or_else(Boundary::random);
        let mut writer = MultipartWriter::with_boundary(sink, boundary);

        for group in &self.files {
            for path in &group.paths {
                writer.write_file(&group.field, path)?;
            }
        }
        for group in self.streams {
            for (filename, source) in group.sources {
                writer.write_stream(&group.field, &filename, source)?;
            }
        }
        for (name, value) in &self.fields {
            writer.write_field(name, value)?;
        }

        let parts = writer.parts_written();
        let boundary = writer.boundary().clone();
        let sink = writer.finish()?;

        tracing::debug!(parts = parts, boundary = %boundary, "Encoded multipart body");
        Ok((boundary, sink))
    }
}
