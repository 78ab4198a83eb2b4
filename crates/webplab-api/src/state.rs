//! Application state shared by every handler.

use tokio_util::sync::CancellationToken;
use webplab_core::{RuntimeLimits, ServerConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Cancelled on shutdown; every batch runs under a child of this token
    pub shutdown: CancellationToken,
    /// Fixed batch limits. When `None`, limits are re-read from the environment per request.
    pub limits: Option<RuntimeLimits>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: RuntimeLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn runtime_limits(&self) -> RuntimeLimits {
        self.limits.unwrap_or_else(RuntimeLimits::from_env)
    }
}
