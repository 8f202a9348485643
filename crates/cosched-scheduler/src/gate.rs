use cosched_core::CoScheduleConfig;
use k8s_openapi::api::core::v1::Pod;

/// Whether the co-scheduling constraint applies to a pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Applies,
    /// Annotation missing or not exactly the opt-in value
    NotOptedIn,
    /// KubeVirt created this pod as a live-migration target; the migration
    /// controller owns its placement
    MigrationTarget { migration_job: String },
}

impl GateDecision {
    pub fn applies(&self) -> bool {
        matches!(self, GateDecision::Applies)
    }
}

/// Inspect pod metadata only; never touches the cluster
pub fn evaluate(pod: &Pod, config: &CoScheduleConfig) -> GateDecision {
    if !is_opted_in(pod, config) {
        return GateDecision::NotOptedIn;
    }

    if let Some(job) = migration_job(pod, config) {
        return GateDecision::MigrationTarget {
            migration_job: job.to_string(),
        };
    }

    GateDecision::Applies
}

pub fn applies(pod: &Pod, config: &CoScheduleConfig) -> bool {
    evaluate(pod, config).applies()
}

fn is_opted_in(pod: &Pod, config: &CoScheduleConfig) -> bool {
    pod.metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(&config.annotation_key))
        .is_some_and(|value| *value == config.annotation_value)
}

/// Presence of the label marks a migration target, whatever its value
fn migration_job<'a>(pod: &'a Pod, config: &CoScheduleConfig) -> Option<&'a str> {
    pod.metadata
        .labels
        .as_ref()
        .and_then(|l| l.get(&config.migration_target_label))
        .map(String::as_str)
}
