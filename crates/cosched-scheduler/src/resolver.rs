//! Companion node resolution.
//!
//! For each claim a pod mounts, in declaration order, the resolver asks two
//! sources which node serves the claim's share-manager:
//!
//! 1. the `ShareManager` resource, whose `status.ownerID` Longhorn sets as
//!    soon as it assigns the share-manager, before its pod exists;
//! 2. the `share-manager-<pv>` pod, once it is running.
//!
//! The first claim that yields a node decides. Nothing is cached: every call
//! reads the cluster again.

use crate::error::{Result, SchedulerError};
use crate::types::CycleContext;
use cosched_client::ClusterReader;
use cosched_core::{pod_namespace, ConflictPolicy, CoScheduleConfig, ObjectKey, ShareManager};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const READ_WRITE_MANY: &str = "ReadWriteMany";
const POD_RUNNING: &str = "Running";

/// Which source answered for a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanionSource {
    ShareManager,
    SharePod,
}

impl fmt::Display for CompanionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompanionSource::ShareManager => write!(f, "ShareManager status.ownerID"),
            CompanionSource::SharePod => write!(f, "share-manager pod"),
        }
    }
}

/// Node found for one claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimResolution {
    pub claim: String,
    pub volume: String,
    pub node: String,
    pub source: CompanionSource,
}

/// Resolves the node serving a pod's ReadWriteMany volume
pub struct DependencyResolver {
    reader: Arc<dyn ClusterReader>,
    config: Arc<CoScheduleConfig>,
}

impl DependencyResolver {
    pub fn new(reader: Arc<dyn ClusterReader>, config: Arc<CoScheduleConfig>) -> Self {
        Self { reader, config }
    }

    /// Node owning the share-manager for the pod's first resolvable claim
    ///
    /// `Ok(None)` means nothing is assigned yet. Errors are lookup failures,
    /// cancellation or an expired deadline.
    pub async fn resolve(&self, ctx: &CycleContext, pod: &Pod) -> Result<Option<String>> {
        let pod_key = ObjectKey::for_pod(pod);
        let namespace = pod_namespace(pod);
        let claims = claim_names(pod);

        if claims.is_empty() {
            debug!(pod = %pod_key, "Pod mounts no persistent volume claims");
            return Ok(None);
        }

        let mut found: Option<ClaimResolution> = None;

        for claim in claims {
            if let Some(first) = &found {
                // Only reached under ConflictPolicy::Report
                self.report_conflict(ctx, &pod_key, namespace, claim, first)
                    .await;
                continue;
            }

            if let Some(resolved) = self.resolve_claim(ctx, namespace, claim).await? {
                debug!(
                    pod = %pod_key,
                    claim = %resolved.claim,
                    volume = %resolved.volume,
                    node = %resolved.node,
                    source = %resolved.source,
                    "Resolved share-manager node"
                );

                if self.config.conflict_policy == ConflictPolicy::FirstMatch {
                    return Ok(Some(resolved.node));
                }
                found = Some(resolved);
            }
        }

        Ok(found.map(|r| r.node))
    }

    /// Resolve a single claim in the pod's namespace
    pub async fn resolve_claim(
        &self,
        ctx: &CycleContext,
        namespace: &str,
        claim_name: &str,
    ) -> Result<Option<ClaimResolution>> {
        let claim_key = ObjectKey::new(namespace, claim_name);

        let pvc = ctx
            .run(async {
                self.reader
                    .get_persistent_volume_claim(namespace, claim_name)
                    .await
                    .map_err(|e| {
                        SchedulerError::lookup_failed(format!("PersistentVolumeClaim {}", claim_key), e)
                    })
            })
            .await?;

        let pvc = match pvc {
            Some(pvc) => pvc,
            None => {
                debug!(claim = %claim_key, "Claim not found, skipping");
                return Ok(None);
            }
        };

        if !is_read_write_many(&pvc) {
            debug!(claim = %claim_key, "Claim is not ReadWriteMany, skipping");
            return Ok(None);
        }

        let volume = match bound_volume(&pvc) {
            Some(volume) => volume.to_string(),
            None => {
                debug!(claim = %claim_key, "Claim not bound yet, skipping");
                return Ok(None);
            }
        };

        let resolved = |node: String, source: CompanionSource| ClaimResolution {
            claim: claim_name.to_string(),
            volume: volume.clone(),
            node,
            source,
        };

        if let Some(node) = self.share_manager_owner(ctx, &volume).await? {
            return Ok(Some(resolved(node, CompanionSource::ShareManager)));
        }

        if let Some(node) = self.share_manager_pod_node(ctx, &volume).await? {
            return Ok(Some(resolved(node, CompanionSource::SharePod)));
        }

        debug!(claim = %claim_key, volume = %volume, "No share-manager assigned yet");
        Ok(None)
    }

    /// `status.ownerID` of the ShareManager, if it is running or starting
    async fn share_manager_owner(&self, ctx: &CycleContext, volume: &str) -> Result<Option<String>> {
        let namespace = &self.config.companion_namespace;
        let gvk = &self.config.share_manager_gvk;

        let object = ctx
            .run(async {
                self.reader
                    .get_custom_object(gvk, namespace, volume)
                    .await
                    .map_err(|e| {
                        SchedulerError::lookup_failed(
                            format!("{} {}/{}", gvk.kind, namespace, volume),
                            e,
                        )
                    })
            })
            .await?;

        let object = match object {
            Some(object) => object,
            None => return Ok(None),
        };

        let share_manager = ShareManager::from_value(&object);
        let owner = share_manager.usable_owner().map(str::to_string);
        if owner.is_none() {
            debug!(
                volume = %volume,
                state = ?share_manager.state,
                owner = ?share_manager.owner_id,
                "ShareManager has no usable owner"
            );
        }
        Ok(owner)
    }

    /// Node of the share-manager pod, if it is running and scheduled
    async fn share_manager_pod_node(
        &self,
        ctx: &CycleContext,
        volume: &str,
    ) -> Result<Option<String>> {
        let namespace = &self.config.companion_namespace;
        let name = self.config.share_manager_pod_name(volume);

        let pod = ctx
            .run(async {
                self.reader.get_pod(namespace, &name).await.map_err(|e| {
                    SchedulerError::lookup_failed(format!("Pod {}/{}", namespace, name), e)
                })
            })
            .await?;

        Ok(pod.as_ref().and_then(running_node).map(str::to_string))
    }

    async fn report_conflict(
        &self,
        ctx: &CycleContext,
        pod_key: &ObjectKey,
        namespace: &str,
        claim: &str,
        first: &ClaimResolution,
    ) {
        match self.resolve_claim(ctx, namespace, claim).await {
            Ok(Some(other)) if other.node != first.node => {
                warn!(
                    pod = %pod_key,
                    claim = %first.claim,
                    node = %first.node,
                    conflicting_claim = %other.claim,
                    conflicting_node = %other.node,
                    "Shared volumes are served from different nodes, keeping the first claim's node"
                );
            }
            Ok(_) => {}
            Err(e) => {
                debug!(pod = %pod_key, claim = %claim, error = %e, "Conflict check failed");
            }
        }
    }
}

/// Claim names referenced by the pod's volumes, in declaration order
pub fn claim_names(pod: &Pod) -> Vec<&str> {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.volumes.as_ref())
        .map(|volumes| {
            volumes
                .iter()
                .filter_map(|v| v.persistent_volume_claim.as_ref())
                .map(|source| source.claim_name.as_str())
                .collect()
        })
        .unwrap_or_default()
}

pub fn is_read_write_many(pvc: &PersistentVolumeClaim) -> bool {
    pvc.spec
        .as_ref()
        .and_then(|spec| spec.access_modes.as_ref())
        .is_some_and(|modes| modes.iter().any(|m| m == READ_WRITE_MANY))
}

/// `spec.volumeName`, if set and non-empty
pub fn bound_volume(pvc: &PersistentVolumeClaim) -> Option<&str> {
    pvc.spec
        .as_ref()
        .and_then(|spec| spec.volume_name.as_deref())
        .filter(|name| !name.is_empty())
}

fn running_node(pod: &Pod) -> Option<&str> {
    let running = pod
        .status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .is_some_and(|phase| phase == POD_RUNNING);
    if !running {
        return None;
    }
    pod.spec
        .as_ref()
        .and_then(|spec| spec.node_name.as_deref())
        .filter(|node| !node.is_empty())
}
