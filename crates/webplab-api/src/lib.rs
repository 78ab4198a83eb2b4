//! WebP Lab API Library
//!
//! This crate provides the HTTP handlers, error mapping and application setup.

mod api_doc;
mod handlers;
mod utils;

pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
