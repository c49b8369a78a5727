//! Content-type sniffing from the leading bytes of a source.
//!
//! Attachments never declare their own MIME type, so each part's
//! `Content-Type` is inferred from at most the first [`SNIFF_LEN`] bytes using
//! the WHATWG MIME sniffing table. Sources are never required to know their
//! length up front.
//!
//! Two adapters wrap the sniffer for real sources:
//!
//! - [`sniff_seekable`] reads the prefix and seeks back to where it started.
//! - [`sniff_stream`] is for one-shot readers that cannot rewind. It hands back
//!   a reader that replays the consumed prefix and then continues with the
//!   rest, so every byte comes out exactly once.
//!
//! # Examples
//!
//! ```
//! use postie::sniff::{detect_content_type, sniff_stream};
//! use std::io::Read;
//!
//! assert_eq!(detect_content_type(b"\x89PNG\r\n\x1a\n...."), "image/png");
//!
//! let (content_type, mut replay) = sniff_stream(&b"hello world"[..]).unwrap();
//! assert_eq!(content_type, "text/plain; charset=utf-8");
//!
//! let mut all = String::new();
//! replay.read_to_string(&mut all).unwrap();
//! assert_eq!(all, "hello world");
//! ```

use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// The maximum number of leading bytes the sniffer looks at.
pub const SNIFF_LEN: usize = 512;

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// A reader that yields a sniffed prefix followed by the rest of its source.
pub type Replay<R> = io::Chain<Cursor<Vec<u8>>, R>;

enum Signature {
    /// An HTML tag, upper-case in the table, matched case-insensitively after
    /// leading whitespace and followed by a space or `>`.
    Html(&'static [u8]),
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        skip_ws: bool,
        mime: &'static str,
    },
    Exact(&'static [u8], &'static str),
    Mp4,
}

// 34 NUL bytes followed by "LP".
const EOT_PATTERN: [u8; 36] = {
    let mut pattern = [0u8; 36];
    pattern[34] = b'L';
    pattern[35] = b'P';
    pattern
};

const EOT_MASK: [u8; 36] = {
    let mut mask = [0u8; 36];
    mask[34] = 0xFF;
    mask[35] = 0xFF;
    mask
};

static SIGNATURES: &[Signature] = &[
    Signature::Html(b"<!DOCTYPE HTML"),
    Signature::Html(b"<HTML"),
    Signature::Html(b"<HEAD"),
    Signature::Html(b"<SCRIPT"),
    Signature::Html(b"<IFRAME"),
    Signature::Html(b"<H1"),
    Signature::Html(b"<DIV"),
    Signature::Html(b"<FONT"),
    Signature::Html(b"<TABLE"),
    Signature::Html(b"<A"),
    Signature::Html(b"<STYLE"),
    Signature::Html(b"<TITLE"),
    Signature::Html(b"<B"),
    Signature::Html(b"<BODY"),
    Signature::Html(b"<BR"),
    Signature::Html(b"<P"),
    Signature::Html(b"<!--"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"<?xml",
        skip_ws: true,
        mime: "text/xml; charset=utf-8",
    },
    Signature::Exact(b"%PDF-", "application/pdf"),
    Signature::Exact(b"%!PS-Adobe-", "application/postscript"),
    // Byte order marks.
    Signature::Masked {
        mask: b"\xFF\xFF\x00\x00",
        pattern: b"\xFE\xFF\x00\x00",
        skip_ws: false,
        mime: "text/plain; charset=utf-16be",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\x00\x00",
        pattern: b"\xFF\xFE\x00\x00",
        skip_ws: false,
        mime: "text/plain; charset=utf-16le",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\x00",
        pattern: b"\xEF\xBB\xBF\x00",
        skip_ws: false,
        mime: TEXT_PLAIN_UTF8,
    },
    // Images.
    Signature::Exact(b"\x00\x00\x01\x00", "image/x-icon"),
    Signature::Exact(b"\x00\x00\x02\x00", "image/x-icon"),
    Signature::Exact(b"BM", "image/bmp"),
    Signature::Exact(b"GIF87a", "image/gif"),
    Signature::Exact(b"GIF89a", "image/gif"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WEBPVP",
        skip_ws: false,
        mime: "image/webp",
    },
    Signature::Exact(b"\x89PNG\r\n\x1a\n", "image/png"),
    Signature::Exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // Audio and video, in the order the sniffing standard prescribes.
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"FORM\x00\x00\x00\x00AIFF",
        skip_ws: false,
        mime: "audio/aiff",
    },
    Signature::Exact(b"ID3", "audio/mpeg"),
    Signature::Exact(b"OggS\x00", "application/ogg"),
    Signature::Exact(b"MThd\x00\x00\x00\x06", "audio/midi"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00AVI ",
        skip_ws: false,
        mime: "video/avi",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WAVE",
        skip_ws: false,
        mime: "audio/wave",
    },
    Signature::Mp4,
    Signature::Exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // Fonts.
    Signature::Masked {
        mask: &EOT_MASK,
        pattern: &EOT_PATTERN,
        skip_ws: false,
        mime: "application/vnd.ms-fontobject",
    },
    Signature::Exact(b"\x00\x01\x00\x00", "font/ttf"),
    Signature::Exact(b"OTTO", "font/otf"),
    Signature::Exact(b"ttcf", "font/collection"),
    Signature::Exact(b"wOFF", "font/woff"),
    Signature::Exact(b"wOF2", "font/woff2"),
    // Archives.
    Signature::Exact(b"\x1F\x8B\x08", "application/x-gzip"),
    Signature::Exact(b"PK\x03\x04", "application/zip"),
    Signature::Exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    Signature::Exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    Signature::Exact(b"\x00\x61\x73\x6D", "application/wasm"),
];

impl Signature {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Signature::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return None;
                }
                let same = tag.iter().zip(data).all(|(&t, &d)| {
                    if t.is_ascii_uppercase() {
                        t == d & 0xDF
                    } else {
                        t == d
                    }
                });
                if !same || !matches!(data[tag.len()], b' ' | b'>') {
                    return None;
                }
                Some(TEXT_HTML)
            }
            Signature::Masked {
                mask,
                pattern,
                skip_ws,
                mime,
            } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                if data.len() < pattern.len() {
                    return None;
                }
                let hit = pattern
                    .iter()
                    .zip(mask.iter())
                    .zip(data)
                    .all(|((&p, &m), &d)| d & m == p);
                hit.then_some(*mime)
            }
            Signature::Exact(prefix, mime) => data.starts_with(prefix).then_some(*mime),
            Signature::Mp4 => is_mp4(data).then_some("video/mp4"),
        }
    }
}

/// Scans an ISO BMFF `ftyp` box for an `mp4` major or compatible brand.
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }
    // Offset 12 holds the minor version, not a brand.
    (8..box_size)
        .step_by(4)
        .filter(|&offset| offset != 12)
        .any(|offset| &data[offset..offset + 3] == b"mp4")
}

fn is_sniff_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

/// Returns the best-guess MIME type for the given leading bytes.
///
/// Only the first [`SNIFF_LEN`] bytes are considered. When no signature
/// matches, content without binary control bytes is reported as
/// `text/plain; charset=utf-8` and anything else as
/// `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use postie::sniff::detect_content_type;
///
/// assert_eq!(detect_content_type(b"GIF89a..."), "image/gif");
/// assert_eq!(detect_content_type(b"  <html><body>"), "text/html; charset=utf-8");
/// assert_eq!(detect_content_type(b"just words"), "text/plain; charset=utf-8");
/// assert_eq!(detect_content_type(b"\x00\x01\x02\x03\x04"), "application/octet-stream");
/// ```
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];
    let first_non_ws = data
        .iter()
        .position(|&b| !is_sniff_ws(b))
        .unwrap_or(data.len());

    if let Some(mime) = SIGNATURES
        .iter()
        .find_map(|signature| signature.matches(data, first_non_ws))
    {
        return mime;
    }

    if data[first_non_ws..].iter().any(|&b| is_binary(b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN_UTF8
    }
}

/// Reads up to [`SNIFF_LEN`] bytes from `reader`, looping over short reads.
///
/// # Errors
///
/// Returns an `UnexpectedEof` error if the source yields no bytes at all,
/// even when the source is legitimately empty. Read failures are propagated.
pub fn read_prefix<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    reader
        .by_ref()
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut prefix)?;
    if prefix.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no bytes available to sniff a content type",
        ));
    }
    Ok(prefix)
}

/// Sniffs a re-readable source and restores its read position afterwards.
///
/// # Errors
///
/// Fails if the source is empty or if reading or seeking fails.
pub fn sniff_seekable<R: Read + Seek>(source: &mut R) -> io::Result<&'static str> {
    let start = source.stream_position()?;
    let prefix = read_prefix(source)?;
    source.seek(SeekFrom::Start(start))?;
    Ok(detect_content_type(&prefix))
}

/// Sniffs a one-shot source without losing the bytes it consumed.
///
/// The returned reader replays the consumed prefix and then continues with
/// the remainder of `source`, so downstream copies see the full content once.
///
/// # Errors
///
/// Fails if the source is empty or if reading fails.
pub fn sniff_stream<R: Read>(mut source: R) -> io::Result<(&'static str, Replay<R>)> {
    let prefix = read_prefix(&mut source)?;
    let content_type = detect_content_type(&prefix);
    Ok((content_type, Cursor::new(prefix).chain(source)))
}
