//! Example uploading in-memory sources without touching the filesystem.
//!
//! Streams are read exactly once. The first bytes are used to guess each
//! part's content type and are still sent in full.
//!
//! Run with: `cargo run --example upload_streams`

use postie::{Error, ParameterSet, StreamAttachment};
use std::io::Cursor;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("postie=debug,upload_streams=info")
        .init();

    let csv = "id,name\n1,ada\n2,grace\n".repeat(64);
    let png_header = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR".to_vec();

    let attachment = StreamAttachment::new("uploads")
        .with_source("people.csv", Cursor::new(csv.into_bytes()))
        .with_source("pixel.png", Cursor::new(png_header));

    let request = postie::upload_streams(
        "https://httpbin.org/post",
        &ParameterSet::new(),
        &ParameterSet::new(),
        vec![attachment],
    )?;

    println!("Content-Type: {}", request.content_type().unwrap_or("-"));

    // Print the part headers to show the sniffed types
    if let Some(body) = request.body().as_bytes() {
        for line in String::from_utf8_lossy(body).lines() {
            if line.starts_with("Content-") {
                println!("  {}", line);
            }
        }
    }

    let response = postie::Client::builder().build()?.execute(request).await?;
    println!("Status: {}", response.status());

    Ok(())
}
