use crate::error::{Result, SchedulerError};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline for one scheduling cycle
///
/// Every cluster lookup made on behalf of the cycle goes through `run`, so a
/// cancelled or expired cycle stops waiting on the API server at once.
#[derive(Debug, Clone)]
pub struct CycleContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CycleContext {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `fut` unless the cycle is cancelled or its deadline passes first
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let guarded = async {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(SchedulerError::Cancelled),
                result = fut => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| SchedulerError::DeadlineExceeded)?,
            None => guarded.await,
        }
    }
}

/// Outcome of resolving which node serves a pod's shared volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No share-manager is assigned yet, or the gate skipped resolution
    Unassigned,
    /// The share-manager is owned by this node
    Node(String),
    /// The lookup failed; carries the rendered cause
    Failed(String),
}

impl Resolution {
    pub fn node(&self) -> Option<&str> {
        match self {
            Resolution::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl From<Result<Option<String>>> for Resolution {
    fn from(result: Result<Option<String>>) -> Self {
        match result {
            Ok(Some(node)) => Resolution::Node(node),
            Ok(None) => Resolution::Unassigned,
            Err(e) => Resolution::Failed(e.to_string()),
        }
    }
}

/// Status a plugin reports for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Success,
    /// The node is unsuitable; the pod may fit elsewhere
    Unschedulable,
    /// Suitability could not be determined
    Error,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Success => write!(f, "Success"),
            StatusCode::Unschedulable => write!(f, "Unschedulable"),
            StatusCode::Error => write!(f, "Error"),
        }
    }
}

/// Result of filtering a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    /// Node name
    pub node_name: String,
    pub code: StatusCode,
    /// Reason for rejection or error (if any)
    pub reason: Option<String>,
}

impl FilterResult {
    /// Create a passing filter result
    pub fn pass(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            code: StatusCode::Success,
            reason: None,
        }
    }

    /// Create a rejecting filter result
    pub fn fail(node_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            code: StatusCode::Unschedulable,
            reason: Some(reason.into()),
        }
    }

    /// Create an error filter result
    pub fn error(node_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            code: StatusCode::Error,
            reason: Some(reason.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.code == StatusCode::Success
    }

    pub fn is_error(&self) -> bool {
        self.code == StatusCode::Error
    }
}

/// Result of scoring a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    /// Node name
    pub node_name: String,
    /// Score (0 to the configured maximum, higher is better)
    pub score: i64,
    pub code: StatusCode,
    pub reason: Option<String>,
}

impl ScoreResult {
    /// Create a successful score result
    pub fn new(node_name: impl Into<String>, score: i64) -> Self {
        Self {
            node_name: node_name.into(),
            score,
            code: StatusCode::Success,
            reason: None,
        }
    }

    /// Create an error score result; the score is always 0
    pub fn error(node_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            score: 0,
            code: StatusCode::Error,
            reason: Some(reason.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.code == StatusCode::Error
    }
}
