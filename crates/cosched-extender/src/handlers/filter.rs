use crate::response::ApiResponse;
use crate::types::{ExtenderArgs, ExtenderFilterResult, NodeList};
use crate::{ApiError, ExtenderState, Result};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cosched_core::ObjectKey;
use cosched_scheduler::{filter, StatusCode};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// POST /filter
///
/// Resolves the companion node once and evaluates every candidate against it.
pub async fn filter_nodes(
    State(state): State<Arc<ExtenderState>>,
    Json(args): Json<ExtenderArgs>,
) -> Result<Response> {
    let candidates = args
        .candidates()
        .ok_or_else(|| ApiError::BadRequest("request carries neither nodes nor nodenames".to_string()))?;
    let pod_key = ObjectKey::for_pod(&args.pod);

    let ctx = state.cycle_context();
    let (gate, resolution) = state.plugin.prepare(&ctx, &args.pod).await;

    // Indices into the candidate list
    let mut admitted: Vec<usize> = Vec::new();
    let mut failed_nodes = BTreeMap::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let node_name = match candidate {
            Some(name) => name.as_str(),
            None if gate.applies() => {
                warn!(pod = %pod_key, "Filter request contains a node without a name");
                return Ok(ApiResponse::ok(ExtenderFilterResult::failed("node not found")).into_response());
            }
            None => {
                admitted.push(index);
                continue;
            }
        };

        let result = filter::evaluate(&gate, &resolution, node_name);
        match result.code {
            StatusCode::Success => admitted.push(index),
            StatusCode::Unschedulable => {
                failed_nodes.insert(node_name.to_string(), result.reason.unwrap_or_default());
            }
            StatusCode::Error => {
                let cause = result.reason.unwrap_or_default();
                warn!(pod = %pod_key, error = %cause, "Filter failed, admitting no nodes");
                return Ok(ApiResponse::ok(ExtenderFilterResult::failed(cause)).into_response());
            }
        }
    }

    debug!(
        pod = %pod_key,
        admitted = admitted.len(),
        rejected = failed_nodes.len(),
        "Filtered candidates"
    );

    let keep: HashSet<usize> = admitted.iter().copied().collect();
    let mut response = ExtenderFilterResult {
        failed_nodes,
        ..Default::default()
    };

    match args.nodes {
        Some(nodes) => {
            response.nodes = Some(NodeList {
                items: nodes
                    .items
                    .into_iter()
                    .enumerate()
                    .filter(|(index, _)| keep.contains(index))
                    .map(|(_, node)| node)
                    .collect(),
            });
        }
        None => {
            response.node_names = Some(
                admitted
                    .into_iter()
                    .filter_map(|index| candidates[index].clone())
                    .collect(),
            );
        }
    }

    Ok(ApiResponse::ok(response).into_response())
}
