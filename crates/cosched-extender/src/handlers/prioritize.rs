use crate::response::ApiResponse;
use crate::types::{scale_score, ExtenderArgs, HostPriority};
use crate::{ApiError, ExtenderState, Result};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cosched_core::ObjectKey;
use cosched_scheduler::{score, Resolution};
use std::sync::Arc;
use tracing::debug;

/// POST /prioritize
///
/// Scores are reported on the extender scale; a failed resolution is a 500.
pub async fn prioritize_nodes(
    State(state): State<Arc<ExtenderState>>,
    Json(args): Json<ExtenderArgs>,
) -> Result<Response> {
    let candidates = args
        .candidates()
        .ok_or_else(|| ApiError::BadRequest("request carries neither nodes nor nodenames".to_string()))?;
    let pod_key = ObjectKey::for_pod(&args.pod);

    let ctx = state.cycle_context();
    let (gate, resolution) = state.plugin.prepare(&ctx, &args.pod).await;

    if let Resolution::Failed(cause) = resolution {
        return Err(ApiError::Internal(cause));
    }

    let max_score = state.plugin.config().max_node_score;
    let priorities: Vec<HostPriority> = candidates
        .into_iter()
        .flatten()
        .map(|host| {
            let result = score::score(&gate, &resolution, &host, max_score);
            HostPriority {
                score: scale_score(result.score, max_score),
                host,
            }
        })
        .collect();

    debug!(pod = %pod_key, hosts = priorities.len(), "Prioritized candidates");

    Ok(ApiResponse::ok(priorities).into_response())
}
