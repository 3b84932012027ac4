use crate::build_app;
use crate::tests::support::{BOUNDARY, multipart_body, site_fixture, state_for};
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use tower::ServiceExt;

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn uploaded_files(site: &std::path::Path) -> Vec<String> {
    match std::fs::read_dir(site.join("assets/img/uploads")) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

// an upload lands under the uploads dir with a safe name, and its url serves the bytes back
#[tokio::test]
async fn test_upload_stores_file_and_serves_it() {
    let site = site_fixture();
    let app = build_app(state_for(site.path()).await);

    let response = app
        .clone()
        .oneshot(upload_request(multipart_body(
            "file",
            Some("my photo!.PNG"),
            b"fake-png-bytes",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let url = json["url"].as_str().unwrap().to_string();

    let stored = url
        .strip_prefix("/assets/img/uploads/")
        .expect("Should live under the uploads prefix");
    assert!(stored.starts_with("my_photo_-"));
    assert!(stored.ends_with(".PNG"));
    assert_eq!(uploaded_files(site.path()), vec![stored.to_string()]);

    // the returned url resolves through the static file fallback
    let served = app
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    let served_bytes = axum::body::to_bytes(served.into_body(), 1024 * 1024)
        .await
        .unwrap();
    assert_eq!(&served_bytes[..], b"fake-png-bytes");
}

// a form without the file field is a client error and writes nothing
#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let site = site_fixture();
    let app = build_app(state_for(site.path()).await);

    let response = app
        .oneshot(upload_request(multipart_body("caption", None, b"just text")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "No file uploaded");
    assert!(uploaded_files(site.path()).is_empty());
}

// an empty file input still sends a "file" part, but without a file name
#[tokio::test]
async fn test_upload_with_empty_file_input_is_rejected() {
    let site = site_fixture();
    let app = build_app(state_for(site.path()).await);

    let response = app
        .oneshot(upload_request(multipart_body("file", None, b"")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(uploaded_files(site.path()).is_empty());
}

// two uploads of the same file never overwrite each other
#[tokio::test]
async fn test_repeated_uploads_get_distinct_names() {
    let site = site_fixture();
    let app = build_app(state_for(site.path()).await);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(upload_request(multipart_body("file", Some("logo.svg"), b"<svg/>")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let mut files = uploaded_files(site.path());
    files.sort();
    files.dedup();
    assert_eq!(files.len(), 3);
}
