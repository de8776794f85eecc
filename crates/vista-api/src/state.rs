//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;
use vista_core::CallContext;
use vista_embed::EmbedService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub embed: Arc<EmbedService>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(embed: Arc<EmbedService>, request_timeout: Duration) -> Self {
        Self {
            embed,
            request_timeout,
        }
    }

    /// Call context for one inbound request.
    pub fn call_context(&self) -> CallContext {
        CallContext::with_timeout(self.request_timeout)
    }
}
