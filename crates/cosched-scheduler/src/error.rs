// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use cosched_client::ClientError;
use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// A cluster lookup failed for a reason other than not-found
    #[error("Failed to look up {object}: {source}")]
    #[diagnostic(
        code(cosched::scheduler::lookup_failed),
        help("The companion node could not be determined. The scheduling framework will retry the pod")
    )]
    LookupFailed {
        #[allow(unused)]
        object: String,
        #[source]
        source: ClientError,
    },

    /// The caller cancelled the scheduling cycle
    #[error("Scheduling cycle cancelled")]
    #[diagnostic(
        code(cosched::scheduler::cancelled),
        help("The scheduling framework abandoned this cycle; no decision was made")
    )]
    Cancelled,

    /// The cycle deadline elapsed before resolution finished
    #[error("Scheduling cycle deadline exceeded")]
    #[diagnostic(
        code(cosched::scheduler::deadline_exceeded),
        help("The API server answered too slowly. Check its latency or raise the request timeout")
    )]
    DeadlineExceeded,

    /// A plugin returned an error status during a cycle
    #[error("Plugin {plugin} failed on node {node_name}: {message}")]
    #[diagnostic(
        code(cosched::scheduler::plugin_failed),
        help("The plugin could not decide whether the node is suitable. Retry once the cause is resolved")
    )]
    PluginFailed {
        #[allow(unused)]
        plugin: String,
        #[allow(unused)]
        node_name: String,
        #[allow(unused)]
        message: String,
    },

    /// Core error
    #[error(transparent)]
    #[diagnostic(transparent)]
    CoreError(#[from] cosched_core::CoreError),
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create a LookupFailed error
    pub fn lookup_failed(object: impl Into<String>, source: ClientError) -> Self {
        Self::LookupFailed {
            object: object.into(),
            source,
        }
    }

    /// Create a PluginFailed error
    pub fn plugin_failed(
        plugin: impl Into<String>,
        node_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::PluginFailed {
            plugin: plugin.into(),
            node_name: node_name.into(),
            message: message.into(),
        }
    }
}
