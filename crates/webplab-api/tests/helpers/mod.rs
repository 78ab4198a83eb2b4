//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p webplab-api`.

pub mod fixtures;

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use webplab_api::setup::routes;
use webplab_api::state::AppState;
use webplab_core::{RuntimeLimits, ServerConfig};

pub fn test_limits() -> RuntimeLimits {
    RuntimeLimits {
        max_input_file_mb: 0.0,
        max_total_input_mb: 0.0,
        max_batch_files: 250,
        concurrency: 2,
    }
}

/// Test server with the given batch limits and default server settings.
pub fn setup_test_server_with_limits(limits: RuntimeLimits) -> TestServer {
    let config = ServerConfig::default();
    let state = Arc::new(AppState::new(config.clone()).with_limits(limits));
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    TestServer::new(router.into_make_service()).expect("Failed to create test server")
}

pub fn setup_test_server() -> TestServer {
    setup_test_server_with_limits(test_limits())
}

/// A `files` part holding `data`
pub fn file_part(name: &str, mime: &str, data: Vec<u8>) -> Part {
    Part::bytes(data).file_name(name).mime_type(mime)
}

/// Form with one `files` part per entry
pub fn files_form(files: Vec<(&str, &str, Vec<u8>)>) -> MultipartForm {
    files
        .into_iter()
        .fold(MultipartForm::new(), |form, (name, mime, data)| {
            form.add_part("files", file_part(name, mime, data))
        })
}
