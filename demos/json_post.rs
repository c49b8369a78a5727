//! Example posting JSON, and what happens to form fields when JSON is present.
//!
//! Run with: `cargo run --example json_post`

use http::Method;
use postie::{Client, Error, RequestBuilder};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("postie=debug,json_post=info")
        .init();

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .default_header("User-Agent", "postie-demo/0.1")?
        .build()?;

    println!("=== Raw JSON ===");
    let request = postie::post_json(
        "https://jsonplaceholder.typicode.com/posts",
        &postie::ParameterSet::new(),
        r#"{"title":"raw","body":"sent verbatim","userId":1}"#,
    )?;
    let response = client.execute(request).await?;
    println!("Status: {}", response.status());
    println!("{}", response.text().await?);

    println!("\n=== Serialized value, form field ignored ===");
    let post = NewPost {
        title: "typed".to_string(),
        body: "serialized with serde_json".to_string(),
        user_id: 1,
    };
    let request = RequestBuilder::new(Method::POST, "https://jsonplaceholder.typicode.com/posts")
        .form_field("ignored", "JSON wins over form fields")
        .json_value(&post)?
        .build()?;
    println!("Body kind: {:?}", request.kind());

    let response = client.execute(request).await?;
    println!("Status: {}", response.status());
    println!("{}", response.text().await?);

    Ok(())
}
