//! Builders shared by the unit tests of this crate.

use cosched_client::MockCluster;
use cosched_core::{GroupVersionKind, Node, PersistentVolumeClaim, Pod};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSpec, PodStatus, Volume,
};
use serde_json::json;
use std::collections::BTreeMap;

pub const VM_NAMESPACE: &str = "vms";

/// A virt-launcher pod mounting the given claims, optionally opted in
pub fn make_vm(opted_in: bool, claims: &[&str]) -> Pod {
    let mut pod = Pod::default();
    pod.metadata.name = Some("virt-launcher-vm-1".to_string());
    pod.metadata.namespace = Some(VM_NAMESPACE.to_string());
    if opted_in {
        pod.metadata.annotations = Some(BTreeMap::from([(
            "kubevirt-scheduler/co-schedule".to_string(),
            "true".to_string(),
        )]));
    }
    pod.spec = Some(PodSpec {
        volumes: Some(
            claims
                .iter()
                .map(|claim| Volume {
                    name: claim.to_string(),
                    persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                        claim_name: claim.to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .collect(),
        ),
        ..Default::default()
    });
    pod
}

/// Mark a pod as a KubeVirt migration target
pub fn make_migration_target(mut pod: Pod) -> Pod {
    pod.metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(
            "kubevirt.io/migrationJobUID".to_string(),
            "7d1e-migration".to_string(),
        );
    pod
}

pub fn make_claim(name: &str, volume: Option<&str>, modes: &[&str]) -> PersistentVolumeClaim {
    let mut claim = PersistentVolumeClaim::default();
    claim.metadata.name = Some(name.to_string());
    claim.metadata.namespace = Some(VM_NAMESPACE.to_string());
    claim.spec = Some(PersistentVolumeClaimSpec {
        access_modes: Some(modes.iter().map(|m| m.to_string()).collect()),
        volume_name: volume.map(str::to_string),
        ..Default::default()
    });
    claim
}

/// A bound ReadWriteMany claim
pub fn make_rwx_claim(name: &str, volume: &str) -> PersistentVolumeClaim {
    make_claim(name, Some(volume), &["ReadWriteMany"])
}

pub fn make_share_manager_pod(volume: &str, node: &str, phase: &str) -> Pod {
    let mut pod = Pod::default();
    pod.metadata.name = Some(format!("share-manager-{}", volume));
    pod.metadata.namespace = Some("longhorn-system".to_string());
    pod.spec = Some(PodSpec {
        node_name: Some(node.to_string()),
        ..Default::default()
    });
    pod.status = Some(PodStatus {
        phase: Some(phase.to_string()),
        ..Default::default()
    });
    pod
}

pub fn share_manager_gvk() -> GroupVersionKind {
    GroupVersionKind::from_api_version_kind("longhorn.io/v1beta2", "ShareManager")
}

pub async fn add_share_manager(
    cluster: &MockCluster,
    volume: &str,
    owner: Option<&str>,
    state: Option<&str>,
) {
    let mut status = serde_json::Map::new();
    if let Some(owner) = owner {
        status.insert("ownerID".to_string(), json!(owner));
    }
    if let Some(state) = state {
        status.insert("state".to_string(), json!(state));
    }

    cluster
        .add_custom_object(
            &share_manager_gvk(),
            json!({
                "apiVersion": "longhorn.io/v1beta2",
                "kind": "ShareManager",
                "metadata": { "name": volume, "namespace": "longhorn-system" },
                "status": status,
            }),
        )
        .await;
}

pub fn make_node(name: &str) -> Node {
    let mut node = Node::default();
    node.metadata.name = Some(name.to_string());
    node
}
