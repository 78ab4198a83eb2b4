//! Transform API integration tests.
//!
//! Run with: `cargo test -p webplab-api --test transform_test`

mod helpers;

use std::io::{Cursor, Read};

use axum_test::multipart::MultipartForm;
use helpers::fixtures::{create_corrupt_image, create_test_jpeg, create_test_png};
use helpers::{files_form, setup_test_server, setup_test_server_with_limits, test_limits};
use image::GenericImageView;
use serde_json::Value;
use webplab_core::RuntimeLimits;
use zip::ZipArchive;

fn header(response: &axum_test::TestResponse, name: &str) -> String {
    response
        .header(name)
        .to_str()
        .expect("ascii header")
        .to_string()
}

fn open_zip(body: &[u8]) -> ZipArchive<Cursor<Vec<u8>>> {
    ZipArchive::new(Cursor::new(body.to_vec())).expect("valid zip")
}

fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
    let mut content = String::new();
    archive
        .by_name(name)
        .expect("entry present")
        .read_to_string(&mut content)
        .expect("utf-8 entry");
    content
}

#[tokio::test]
async fn test_single_image_is_returned_directly() {
    let server = setup_test_server();
    let form = files_form(vec![("My Photo!!.PNG", "image/png", create_test_png(32, 16))]);

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(header(&response, "content-type"), "image/webp");
    assert_eq!(
        header(&response, "content-disposition"),
        "attachment; filename=\"my-photo.webp\""
    );
    assert_eq!(header(&response, "cache-control"), "no-store");
    assert_eq!(header(&response, "x-processed-files"), "1");
    assert_eq!(header(&response, "x-failed-files"), "0");

    let body = response.as_bytes();
    assert_eq!(header(&response, "x-total-output-bytes"), body.len().to_string());
    assert_eq!(
        image::guess_format(body).expect("known format"),
        image::ImageFormat::WebP
    );
}

#[tokio::test]
async fn test_options_are_applied() {
    let server = setup_test_server();
    let form = files_form(vec![("wide.png", "image/png", create_test_png(40, 20))])
        .add_text("options", r#"{"format":"png","width":"20","rotate":90}"#);

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(header(&response, "content-type"), "image/png");
    let decoded = image::load_from_memory(response.as_bytes()).expect("decodes");
    assert_eq!(decoded.dimensions(), (10, 20));
}

#[tokio::test]
async fn test_two_images_produce_archive() {
    let server = setup_test_server();
    let form = files_form(vec![
        ("cat.png", "image/png", create_test_png(8, 8)),
        ("cat.jpg", "image/jpeg", create_test_jpeg(8, 8)),
    ])
    .add_text("options", r#"{"format":"jpeg","quality":70}"#);

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(header(&response, "content-type"), "application/zip");
    assert_eq!(
        header(&response, "content-disposition"),
        "attachment; filename=\"webp-lab-results.zip\""
    );
    assert_eq!(header(&response, "x-processed-files"), "2");

    let mut archive = open_zip(response.as_bytes());
    let names: Vec<String> = archive.file_names().map(String::from).collect();
    assert!(names.contains(&"cat-1.jpg".to_string()));
    assert!(names.contains(&"cat-2.jpg".to_string()));
    assert!(names.contains(&"manifest.json".to_string()));
    assert!(!names.contains(&"errors.txt".to_string()));

    let manifest: Value = serde_json::from_str(&read_entry(&mut archive, "manifest.json")).unwrap();
    assert_eq!(manifest["options"]["format"], "jpeg");
    assert_eq!(manifest["options"]["quality"], 70);
    assert_eq!(manifest["totals"]["processed"], 2);
    assert_eq!(manifest["items"][1]["originalName"], "cat.jpg");
}

#[tokio::test]
async fn test_mixed_batch_reports_failures() {
    let server = setup_test_server();
    let form = files_form(vec![
        ("one.png", "image/png", create_test_png(8, 8)),
        ("notes.txt", "text/plain", b"hello".to_vec()),
        ("broken.png", "image/png", create_corrupt_image()),
    ]);

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(header(&response, "content-type"), "application/zip");
    assert_eq!(header(&response, "x-processed-files"), "1");
    assert_eq!(header(&response, "x-failed-files"), "2");

    let mut archive = open_zip(response.as_bytes());
    assert_eq!(archive.len(), 3);

    let manifest: Value = serde_json::from_str(&read_entry(&mut archive, "manifest.json")).unwrap();
    let items = manifest["items"].as_array().unwrap();
    assert_eq!(items[0]["status"], "ok");
    assert_eq!(items[0]["fileName"], "one-1.webp");
    assert_eq!(items[1]["reason"], "Unsupported file. Images only.");
    assert_eq!(items[2]["reason"], "The file does not look like a valid image.");

    let report = read_entry(&mut archive, "errors.txt");
    assert!(report.contains("Processed: 1"));
    assert!(report.contains("Failed: 2"));
    assert!(report.contains("1. notes.txt -> Unsupported file. Images only."));
    assert!(report.contains("2. broken.png -> The file does not look like a valid image."));
}

#[tokio::test]
async fn test_all_failed_returns_422_with_reasons() {
    let server = setup_test_server();
    let form = files_form(vec![
        ("notes.txt", "text/plain", b"hello".to_vec()),
        ("broken.png", "image/png", create_corrupt_image()),
    ]);

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert_eq!(body["error"], "No images could be transformed.");
    let failures = body["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0]["file"], "notes.txt");
    assert_eq!(failures[0]["reason"], "Unsupported file. Images only.");
    assert_eq!(failures[1]["file"], "broken.png");
}

#[tokio::test]
async fn test_no_files_is_rejected() {
    let server = setup_test_server();

    let form = MultipartForm::new().add_text("options", "{}");
    let response = server.post("/api/transform").multipart(form).await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "No images received.");
    assert_eq!(header(&response, "cache-control"), "no-store");

    // Zero-byte parts do not count as files
    let form = files_form(vec![("empty.png", "image/png", Vec::new())]);
    let response = server.post("/api/transform").multipart(form).await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_malformed_options_are_rejected() {
    let server = setup_test_server();
    let form = files_form(vec![("a.png", "image/png", create_test_png(4, 4))])
        .add_text("options", "{format: webp");

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid options field. It must be JSON.");
}

#[tokio::test]
async fn test_blank_options_use_defaults() {
    let server = setup_test_server();
    let form = files_form(vec![("a.png", "image/png", create_test_png(4, 4))])
        .add_text("options", "   ");

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(header(&response, "content-type"), "image/webp");
}

#[tokio::test]
async fn test_preset_overrides_options() {
    let server = setup_test_server();
    let form = files_form(vec![("a.png", "image/png", create_test_png(6, 6))])
        .add_text("options", r#"{"format":"jpeg"}"#)
        .add_text("preset", "archive-lossless");

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(header(&response, "content-type"), "image/png");
    assert_eq!(
        header(&response, "content-disposition"),
        "attachment; filename=\"a.png\""
    );
}

#[tokio::test]
async fn test_unknown_preset_is_rejected() {
    let server = setup_test_server();
    let form = files_form(vec![("a.png", "image/png", create_test_png(4, 4))])
        .add_text("preset", "does-not-exist");

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_batch_count_limit() {
    let server = setup_test_server_with_limits(RuntimeLimits {
        max_batch_files: 1,
        ..test_limits()
    });
    let form = files_form(vec![
        ("a.png", "image/png", create_test_png(4, 4)),
        ("b.png", "image/png", create_test_png(4, 4)),
    ]);

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["error"], "Batch too large. Max 1 files allowed (MAX_BATCH_FILES).");
}

#[tokio::test]
async fn test_file_size_limit() {
    let server = setup_test_server_with_limits(RuntimeLimits {
        max_input_file_mb: 0.0001,
        ..test_limits()
    });
    let form = files_form(vec![("big.png", "image/png", create_test_png(64, 64))]);

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["error"], "File big.png exceeds 0.0001 MB (MAX_INPUT_FILE_MB).");
}

#[tokio::test]
async fn test_total_size_limit() {
    let png = create_test_png(64, 64);
    let per_file_mb = png.len() as f64 / (1024.0 * 1024.0);
    let server = setup_test_server_with_limits(RuntimeLimits {
        // Each file fits on its own, the pair does not
        max_input_file_mb: per_file_mb * 1.5,
        max_total_input_mb: 0.0001,
        ..test_limits()
    });
    let form = files_form(vec![
        ("a.png", "image/png", png.clone()),
        ("b.png", "image/png", png),
    ]);

    let response = server.post("/api/transform").multipart(form).await;

    assert_eq!(response.status_code(), 413);
    assert_eq!(header(&response, "cache-control"), "no-store");
    let body: Value = response.json();
    assert_eq!(body["error"], "Batch exceeds 0.0001 MB total (MAX_TOTAL_INPUT_MB).");
}

#[tokio::test]
async fn test_presets_are_listed() {
    let server = setup_test_server();

    let response = server.get("/api/presets").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["webp-web", "avif-ultra", "social-1200", "archive-lossless"]);
}

#[tokio::test]
async fn test_health_and_docs() {
    let server = setup_test_server();

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(!header(&response, "x-request-id").is_empty());

    let response = server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let doc: Value = response.json();
    assert!(doc["paths"]["/api/transform"]["post"].is_object());
}
