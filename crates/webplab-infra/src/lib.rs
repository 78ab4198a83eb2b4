//! WebP Lab Infrastructure Library
//!
//! Shared plumbing for the HTTP service:
//! - Telemetry initialization (`tracing-subscriber`, plain or JSON output)
//! - Request ID middleware

pub mod middleware;
pub mod telemetry;

pub use middleware::{get_request_id, request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};
