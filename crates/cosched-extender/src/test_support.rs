//! Fixtures for handler and router tests.

use crate::ExtenderState;
use cosched_client::MockCluster;
use cosched_core::{CoScheduleConfig, GroupVersionKind, PersistentVolumeClaim};
use cosched_scheduler::CoSchedulePlugin;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn make_state(cluster: &MockCluster) -> Arc<ExtenderState> {
    let plugin = CoSchedulePlugin::new(Arc::new(cluster.clone()), CoScheduleConfig::default())
        .expect("default config is valid");
    Arc::new(ExtenderState::new(
        Arc::new(plugin),
        Duration::from_secs(5),
        CancellationToken::new(),
    ))
}

/// VM pod JSON mounting `vm-disk`, as kube-scheduler would send it
pub fn vm_pod_json(opted_in: bool) -> Value {
    let annotations = if opted_in {
        json!({ "kubevirt-scheduler/co-schedule": "true" })
    } else {
        json!({})
    };
    json!({
        "metadata": {
            "name": "virt-launcher-vm-1",
            "namespace": "vms",
            "annotations": annotations
        },
        "spec": {
            "containers": [{ "name": "compute" }],
            "volumes": [{ "name": "disk", "persistentVolumeClaim": { "claimName": "vm-disk" } }]
        }
    })
}

/// Cluster where `vm-disk` is bound to `pvc-1`, optionally with a running
/// share-manager owned by `owner`
pub async fn make_cluster(owner: Option<&str>) -> MockCluster {
    let cluster = MockCluster::new();
    let claim: PersistentVolumeClaim = serde_json::from_value(json!({
        "metadata": { "name": "vm-disk", "namespace": "vms" },
        "spec": { "accessModes": ["ReadWriteMany"], "volumeName": "pvc-1" }
    }))
    .expect("valid claim");
    cluster.add_claim(claim).await;

    if let Some(owner) = owner {
        cluster
            .add_custom_object(
                &GroupVersionKind::from_api_version_kind("longhorn.io/v1beta2", "ShareManager"),
                json!({
                    "metadata": { "name": "pvc-1", "namespace": "longhorn-system" },
                    "status": { "ownerID": owner, "state": "running" }
                }),
            )
            .await;
    }
    cluster
}
