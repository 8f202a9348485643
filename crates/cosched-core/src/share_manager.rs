//! Typed view of a Longhorn `ShareManager` custom resource.
//!
//! The resource is fetched as untyped JSON because its schema belongs to
//! Longhorn. Every field is checked for presence and type before use; any
//! shape we do not recognise reads as "no usable owner".

use serde_json::Value;
use std::fmt;

/// Lifecycle states Longhorn reports in `status.state`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareManagerState {
    Stopped,
    Starting,
    Running,
    Error,
}

impl ShareManagerState {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stopped" => Some(ShareManagerState::Stopped),
            "starting" => Some(ShareManagerState::Starting),
            "running" => Some(ShareManagerState::Running),
            "error" => Some(ShareManagerState::Error),
            _ => None,
        }
    }

    /// Whether `status.ownerID` can be trusted as the serving node
    pub fn is_usable(&self) -> bool {
        matches!(self, ShareManagerState::Running | ShareManagerState::Starting)
    }
}

impl fmt::Display for ShareManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShareManagerState::Stopped => "stopped",
            ShareManagerState::Starting => "starting",
            ShareManagerState::Running => "running",
            ShareManagerState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// The parts of a ShareManager the resolver cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareManager {
    pub name: Option<String>,
    /// `status.ownerID`, None when absent, empty or not a string
    pub owner_id: Option<String>,
    /// `status.state`, None when absent or unrecognised
    pub state: Option<ShareManagerState>,
}

impl ShareManager {
    pub fn from_value(object: &Value) -> Self {
        let name = object
            .get("metadata")
            .and_then(Value::as_object)
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let status = match object.get("status").and_then(Value::as_object) {
            Some(status) => status,
            None => {
                return Self {
                    name,
                    ..Default::default()
                }
            }
        };

        let owner_id = status
            .get("ownerID")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let state = status
            .get("state")
            .and_then(Value::as_str)
            .and_then(ShareManagerState::parse);

        Self {
            name,
            owner_id,
            state,
        }
    }

    /// Owner node, only when the share-manager is running or starting
    pub fn usable_owner(&self) -> Option<&str> {
        match self.state {
            Some(state) if state.is_usable() => self.owner_id.as_deref(),
            _ => None,
        }
    }
}
