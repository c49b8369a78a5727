//! Example uploading files from disk as multipart/form-data.
//!
//! This example shows how to:
//! - Group several files under one form field
//! - Send extra form fields alongside the files
//! - Inspect the built request before sending it
//!
//! Run with: `cargo run --example upload_files`

use postie::{param_set, Client, Error, FileAttachment};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("postie=debug,upload_files=info")
        .init();

    // Write a couple of files to upload
    let dir = tempfile::tempdir()?;
    let notes = dir.path().join("notes.txt");
    let page = dir.path().join("index.html");
    std::fs::write(&notes, "remember the milk\n")?;
    std::fs::write(&page, "<!DOCTYPE html><title>hi</title>")?;

    println!("=== Building the request ===");
    let request = postie::upload_files(
        "https://httpbin.org/post",
        &param_set([("source", "demo")]),
        &param_set([("author", "postie")]),
        vec![FileAttachment::new("documents", [&notes, &page])],
    )?;

    println!("Method: {}", request.method());
    println!("URL: {}", request.url());
    println!("Content-Type: {}", request.content_type().unwrap_or("-"));
    if let Some(body) = request.body().as_bytes() {
        println!("Body size: {} bytes", body.len());
    }

    println!("\n=== Sending ===");
    let client = Client::builder().build()?;
    let response = client.execute(request).await?;
    println!("Status: {}", response.status());
    println!("{}", response.text().await?);

    Ok(())
}
