pub mod filter;
pub mod prioritize;

// Re-export handler functions
pub use filter::*;
pub use prioritize::*;

/// Health check endpoint
pub async fn healthz() -> &'static str {
    "ok"
}

/// Liveness probe
pub async fn livez() -> &'static str {
    "ok"
}

/// Readiness probe
pub async fn readyz() -> &'static str {
    "ok"
}
