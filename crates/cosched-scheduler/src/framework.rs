use crate::filter::FilterPlugin;
use crate::plugin::CoSchedulePlugin;
use crate::score::{total_score, ScorePlugin};
use crate::types::{CycleContext, FilterResult};
use crate::{Result, SchedulerError};
use cosched_core::{Node, ObjectKey, Pod};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one filter and score pass for a pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Decisive filter result per candidate, in candidate order
    pub filter_results: Vec<FilterResult>,
    /// Summed score per feasible node, highest first
    pub scores: Vec<(String, i64)>,
    /// Highest scoring feasible node, if any
    pub selected: Option<String>,
}

impl CycleOutcome {
    pub fn feasible(&self) -> impl Iterator<Item = &str> {
        self.filter_results
            .iter()
            .filter(|r| r.passed())
            .map(|r| r.node_name.as_str())
    }
}

/// Minimal in-process scheduling framework
///
/// Runs filter plugins for every candidate concurrently, scores the
/// feasible nodes and picks the best one. Never binds.
#[derive(Default)]
pub struct Framework {
    filters: Vec<Arc<dyn FilterPlugin>>,
    scorers: Vec<Arc<dyn ScorePlugin>>,
}

impl Framework {
    pub fn new() -> Self {
        Self::default()
    }

    /// Framework with the co-scheduling plugin registered at both extension points
    pub fn with_plugin(plugin: Arc<CoSchedulePlugin>) -> Self {
        Self::new()
            .with_filter(plugin.clone())
            .with_scorer(plugin)
    }

    pub fn with_filter(mut self, filter: Arc<dyn FilterPlugin>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn ScorePlugin>) -> Self {
        self.scorers.push(scorer);
        self
    }

    /// Filter and score `nodes` for `pod`
    ///
    /// No feasible node is not an error: `selected` is `None`.
    pub async fn run_cycle(
        &self,
        ctx: &CycleContext,
        pod: &Pod,
        nodes: &[Node],
    ) -> Result<CycleOutcome> {
        let pod_key = ObjectKey::for_pod(pod);

        // Phase 1: Filter nodes
        let filtered = join_all(nodes.iter().map(|node| self.filter_node(ctx, pod, node))).await;

        let mut filter_results = Vec::with_capacity(filtered.len());
        for (plugin, result) in filtered {
            if result.is_error() {
                return Err(SchedulerError::plugin_failed(
                    plugin,
                    result.node_name,
                    result.reason.unwrap_or_default(),
                ));
            }
            if !result.passed() {
                debug!(
                    pod = %pod_key,
                    node = %result.node_name,
                    plugin = %plugin,
                    reason = result.reason.as_deref().unwrap_or(""),
                    "Node filtered out"
                );
            }
            filter_results.push(result);
        }

        let feasible: Vec<String> = filter_results
            .iter()
            .filter(|r| r.passed())
            .map(|r| r.node_name.clone())
            .collect();

        if feasible.is_empty() {
            info!(pod = %pod_key, candidates = nodes.len(), "No feasible nodes");
            return Ok(CycleOutcome {
                filter_results,
                scores: Vec::new(),
                selected: None,
            });
        }

        debug!(pod = %pod_key, feasible = feasible.len(), "Scoring feasible nodes");

        // Phase 2: Score nodes
        let scored = join_all(feasible.iter().map(|name| self.score_node(ctx, pod, name))).await;
        let mut scores = scored.into_iter().collect::<Result<Vec<_>>>()?;

        // Phase 3: Select best node; the sort is stable so ties keep candidate order
        scores.sort_by(|a, b| b.1.cmp(&a.1));
        let selected = scores.first().map(|(name, _)| name.clone());

        if let Some((name, score)) = scores.first() {
            info!(pod = %pod_key, node = %name, score = *score, "Selected node");
        }

        Ok(CycleOutcome {
            filter_results,
            scores,
            selected,
        })
    }

    /// Run filters in registration order, stopping at the first that does not pass
    async fn filter_node(&self, ctx: &CycleContext, pod: &Pod, node: &Node) -> (String, FilterResult) {
        let node_name = node.metadata.name.clone().unwrap_or_default();
        let mut last = ("".to_string(), FilterResult::pass(node_name));

        for filter in &self.filters {
            let result = filter.filter(ctx, pod, node).await;
            let passed = result.passed();
            last = (filter.name().to_string(), result);
            if !passed {
                break;
            }
        }

        last
    }

    async fn score_node(&self, ctx: &CycleContext, pod: &Pod, node_name: &str) -> Result<(String, i64)> {
        let mut results = Vec::with_capacity(self.scorers.len());

        for scorer in &self.scorers {
            let result = scorer.score(ctx, pod, node_name).await;
            if result.is_error() {
                return Err(SchedulerError::plugin_failed(
                    scorer.name(),
                    node_name,
                    result.reason.unwrap_or_default(),
                ));
            }
            results.push(result);
        }

        Ok((node_name.to_string(), total_score(&results)))
    }
}
