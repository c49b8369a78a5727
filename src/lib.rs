//! # Postie - build ready-to-send HTTP requests
//!
//! Postie turns a URI plus a handful of logical inputs (query parameters,
//! form fields, files on disk, open byte streams or a JSON payload) into a
//! complete request: method, encoded URL, body and the matching
//! `Content-Type`. You never touch multipart framing or form encoding.
//!
//! ## Quick Start
//!
//! ```no_run
//! use postie::{Client, FileAttachment};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), postie::Error> {
//!     // Upload two files plus a caption as multipart/form-data
//!     let request = postie::upload_files(
//!         "https://api.example.com/albums/7/photos",
//!         &postie::param_set([("notify", "true")]),
//!         &postie::param_set([("caption", "Holiday")]),
//!         vec![FileAttachment::new("photo", ["beach.jpg", "sunset.png"])],
//!     )?;
//!     println!("Content-Type: {:?}", request.content_type());
//!
//!     // Hand it to the transport
//!     let client = Client::builder().build()?;
//!     let response = client.execute(request).await?;
//!     println!("Status: {}", response.status());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Choosing the body
//!
//! The body encoding is picked from which inputs are non-empty, first match
//! wins:
//!
//! | Inputs present | Body | `Content-Type` |
//! |---|---|---|
//! | files or streams | multipart, form fields as parts | `multipart/form-data; boundary=...` |
//! | JSON | the JSON bytes, verbatim | `application/json` |
//! | form fields | form-encoded fields | `application/x-www-form-urlencoded` |
//! | nothing | empty | `application/x-www-form-urlencoded` |
//!
//! Losing inputs are dropped silently: attachments beat JSON, and JSON
//! discards form fields. Query parameters are always appended to the URI's
//! existing query.
//!
//! ## Attachments
//!
//! Each attachment part gets a `Content-Type` sniffed from its first 512
//! bytes (see [`sniff`]). Streams are read exactly once; the sniffed bytes
//! are replayed ahead of the rest so nothing is lost. An empty attachment is
//! an error.
//!
//! ```
//! use http::Method;
//! use postie::multipart::Boundary;
//! use postie::{BodyKind, RequestBuilder, StreamAttachment};
//!
//! let request = RequestBuilder::new(Method::POST, "http://localhost/upload?v=2")
//!     .query_param("dry_run", "1")
//!     .form_field("title", "Report")
//!     .stream(StreamAttachment::new("report").with_source("report.csv", &b"a,b\n1,2\n"[..]))
//!     .boundary(Boundary::new("fixed-boundary")?)
//!     .build()?;
//!
//! assert_eq!(request.kind(), BodyKind::Multipart);
//! assert_eq!(request.url().as_str(), "http://localhost/upload?dry_run=1&v=2");
//! assert_eq!(
//!     request.content_type(),
//!     Some("multipart/form-data; boundary=fixed-boundary")
//! );
//! # Ok::<(), postie::Error>(())
//! ```

mod body;
mod client;
mod error;
pub mod form;
pub mod multipart;
mod params;
mod request;
pub mod sniff;

pub use body::Body;
pub use client::{Client, ClientBuilder};
pub use error::{Error, Result};
pub use params::{param_set, FileAttachment, ParameterSet, StreamAttachment};
pub use request::{
    build_request, get, post_form, post_json, upload_files, upload_streams, BodyKind,
    OutboundRequest, RequestBuilder, JSON_CONTENT_TYPE,
};
