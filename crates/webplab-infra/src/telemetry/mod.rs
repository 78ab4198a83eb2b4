//! Tracing subscriber setup
//!
//! One process-wide subscriber: `RUST_LOG` filtering plus a human-readable or JSON
//! formatter.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat};
