use cosched_scheduler::{CoSchedulePlugin, CycleContext};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared extender state
#[derive(Clone)]
pub struct ExtenderState {
    /// Plugin answering every request
    pub plugin: Arc<CoSchedulePlugin>,

    /// Deadline for the cluster lookups of one request
    pub request_timeout: Duration,

    /// Cancelled on shutdown; each request runs under a child token
    pub token: CancellationToken,
}

impl ExtenderState {
    pub fn new(
        plugin: Arc<CoSchedulePlugin>,
        request_timeout: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            plugin,
            request_timeout,
            token,
        }
    }

    /// Cycle context for one request
    pub fn cycle_context(&self) -> CycleContext {
        CycleContext::new(self.token.child_token()).with_timeout(self.request_timeout)
    }
}
