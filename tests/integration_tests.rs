//! Integration tests using wiremock to receive built requests over HTTP.

use postie::{param_set, Body, Client, Error, FileAttachment, ParameterSet, StreamAttachment};
use std::io::Cursor;
use std::time::Duration;
use wiremock::matchers::{body_bytes, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> Client {
    Client::builder().build().unwrap()
}

#[tokio::test]
async fn test_get_sends_merged_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query-a", "a"))
        .and(query_param("query-b", "b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = postie::get(
        &format!("{}/search?query-a=a", mock_server.uri()),
        &param_set([("query-b", "b")]),
    )
    .unwrap();

    let response = client().execute(request).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_post_form_body_and_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("post-a=a&post-b=b"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = postie::post_form(
        &format!("{}/form", mock_server.uri()),
        &ParameterSet::new(),
        &param_set([("post-a", "a"), ("post-b", "b")]),
    )
    .unwrap();

    let response = client().execute(request).await.unwrap();
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn test_post_json_is_byte_identical() {
    let mock_server = MockServer::start().await;
    let payload = br##"{color:"red",value:"#f00"}"##;

    Mock::given(method("POST"))
        .and(path("/json"))
        .and(header("content-type", "application/json"))
        .and(body_bytes(payload.to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = postie::post_json(
        &format!("{}/json", mock_server.uri()),
        &ParameterSet::new(),
        Body::from_reader(Cursor::new(payload.to_vec())),
    )
    .unwrap();

    client().execute(request).await.unwrap();
}

#[tokio::test]
async fn test_multipart_upload_reaches_the_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let gif = dir.path().join("sample.gif");
    std::fs::write(&gif, b"GIF89a\x01\x00\x01\x00\x00\x00\x00;").unwrap();

    let request = postie::upload_files(
        &format!("{}/upload", mock_server.uri()),
        &param_set([("query-a", "a")]),
        &param_set([("post-a", "a")]),
        vec![FileAttachment::new("single-file", [&gif])],
    )
    .unwrap();
    let content_type = request.content_type().unwrap().to_string();

    client().execute(request).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let received = &received[0];

    assert_eq!(received.url.query(), Some("query-a=a"));
    assert_eq!(received.headers["content-type"], content_type.as_str());

    let body = String::from_utf8_lossy(&received.body);
    assert!(body.contains(
        "Content-Disposition: form-data; filename=\"sample.gif\"; name=\"single-file\"\r\n\
         Content-Type: image/gif\r\n"
    ));
    assert!(body.contains("Content-Disposition: form-data; name=\"post-a\"\r\n\r\na\r\n"));
}

#[tokio::test]
async fn test_stream_upload_sends_full_content() {
    let mock_server = MockServer::start().await;
    let contents: Vec<u8> = (0..5000u32).map(|i| b'a' + (i % 26) as u8).collect();

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let request = postie::upload_streams(
        &format!("{}/upload", mock_server.uri()),
        &ParameterSet::new(),
        &ParameterSet::new(),
        vec![StreamAttachment::new("field1").with_source("file1", Cursor::new(contents.clone()))],
    )
    .unwrap();

    client().execute(request).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let body = &received[0].body;
    let needle = contents.as_slice();
    assert!(body.windows(needle.len()).any(|w| w == needle));
}

#[tokio::test]
async fn test_default_headers_do_not_override_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", "postie-tests/1.0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .default_header("User-Agent", "postie-tests/1.0")
        .unwrap()
        .default_header("Content-Type", "text/plain")
        .unwrap()
        .build()
        .unwrap();

    let request = postie::post_json(&mock_server.uri(), &ParameterSet::new(), "{}").unwrap();
    let response = client.execute(request).await.unwrap();
    assert_eq!(response.status().as_u16(), 204);
}

#[tokio::test]
async fn test_non_success_status_is_returned_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&mock_server)
        .await;

    let request = postie::get(&mock_server.uri(), &ParameterSet::new()).unwrap();
    let response = client().execute(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 503);
    assert_eq!(response.text().await.unwrap(), "busy");
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let request = postie::get(&mock_server.uri(), &ParameterSet::new()).unwrap();

    let result = client.execute(request).await;
    assert!(matches!(result, Err(Error::Timeout)), "got {:?}", result.err());
}
