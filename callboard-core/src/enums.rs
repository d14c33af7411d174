//! Enum types for CALLBOARD entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONTACT / CALL LIFECYCLE
// ============================================================================

/// Lifecycle status of a contact as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    /// Saved but never called
    #[default]
    Pending,
    /// A call is queued or running
    Processing,
    /// The last call ended
    Completed,
    /// The last call failed
    Failed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Processing => "processing",
            ContactStatus::Completed => "completed",
            ContactStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ContactStatus::Completed | ContactStatus::Failed)
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ContactStatus::Pending),
            "processing" => Ok(ContactStatus::Processing),
            "completed" => Ok(ContactStatus::Completed),
            "failed" => Ok(ContactStatus::Failed),
            other => Err(format!("unknown contact status: {}", other)),
        }
    }
}

/// Status of a single placed call.
///
/// The backend relays the telephony provider's own vocabulary, so the
/// provider spellings (`registered`, `ongoing`, `error`) are accepted next to
/// the canonical ones. Anything unrecognized decodes to [`CallStatus::Unknown`],
/// which is never terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum CallStatus {
    #[default]
    NotStarted,
    InProgress,
    Ended,
    Failed,
    Unknown(String),
}

impl CallStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::NotStarted => "not-started",
            CallStatus::InProgress => "in-progress",
            CallStatus::Ended => "ended",
            CallStatus::Failed => "failed",
            CallStatus::Unknown(raw) => raw.as_str(),
        }
    }

    /// A terminal call will not change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Ended | CallStatus::Failed)
    }

    /// Contact status implied by this call status.
    pub fn contact_status(&self) -> ContactStatus {
        match self {
            CallStatus::NotStarted => ContactStatus::Pending,
            CallStatus::InProgress | CallStatus::Unknown(_) => ContactStatus::Processing,
            CallStatus::Ended => ContactStatus::Completed,
            CallStatus::Failed => ContactStatus::Failed,
        }
    }
}

impl From<String> for CallStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "not-started" | "registered" | "queued" => CallStatus::NotStarted,
            "in-progress" | "ongoing" => CallStatus::InProgress,
            "ended" | "completed" => CallStatus::Ended,
            "failed" | "error" => CallStatus::Failed,
            _ => CallStatus::Unknown(raw),
        }
    }
}

impl From<CallStatus> for String {
    fn from(status: CallStatus) -> Self {
        match status {
            CallStatus::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CONTAINERS
// ============================================================================

/// Status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    /// Cycle used by the project editor.
    pub fn next(&self) -> ProjectStatus {
        match self {
            ProjectStatus::Active => ProjectStatus::Completed,
            ProjectStatus::Completed => ProjectStatus::Archived,
            ProjectStatus::Archived => ProjectStatus::Active,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "archived" => Ok(ProjectStatus::Archived),
            other => Err(format!("unknown project status: {}", other)),
        }
    }
}

/// Status of a search group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchGroupStatus {
    #[default]
    Active,
    Completed,
    Archived,
    Paused,
}

impl SearchGroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchGroupStatus::Active => "active",
            SearchGroupStatus::Completed => "completed",
            SearchGroupStatus::Archived => "archived",
            SearchGroupStatus::Paused => "paused",
        }
    }

    pub fn next(&self) -> SearchGroupStatus {
        match self {
            SearchGroupStatus::Active => SearchGroupStatus::Paused,
            SearchGroupStatus::Paused => SearchGroupStatus::Completed,
            SearchGroupStatus::Completed => SearchGroupStatus::Archived,
            SearchGroupStatus::Archived => SearchGroupStatus::Active,
        }
    }
}

impl fmt::Display for SearchGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a flow attached to a search group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    #[default]
    Active,
    Inactive,
    Completed,
}

impl FlowStatus {
    pub fn next(&self) -> FlowStatus {
        match self {
            FlowStatus::Active => FlowStatus::Inactive,
            FlowStatus::Inactive => FlowStatus::Completed,
            FlowStatus::Completed => FlowStatus::Active,
        }
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowStatus::Active => "active",
            FlowStatus::Inactive => "inactive",
            FlowStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Outcome of a backend envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}
