//! Core entity structures
//!
//! Field names follow the backend's wire format: document ids are `_id`,
//! top-level fields are camelCase, the provider-produced analysis block and
//! provider resources are snake_case.

use crate::{
    AgentId, CallDetailId, CallStatus, ContactId, ContactStatus, FlowId, FlowStatus, LlmId,
    ProjectId, ProjectStatus, SearchGroupId, SearchGroupStatus, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// CONTACTS AND CALLS
// ============================================================================

/// A person with a phone number tracked for outbound calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: ContactId,
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Contact together with the most recent call made to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactWithLastCall {
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_call_detail: Option<CallDetail>,
}

/// Outcome record of one placed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDetail {
    #[serde(rename = "_id")]
    pub id: CallDetailId,
    pub customer_id: ContactId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    pub call_id: String,
    #[serde(default)]
    pub call_status: CallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_analysis: Option<CallAnalysis>,
    /// Call length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl CallDetail {
    /// Timestamp used to order two records of the same contact.
    pub fn freshness(&self) -> Option<Timestamp> {
        self.updated_at.or(self.created_at)
    }

    /// Whether `self` may replace `cached` without going back in time.
    ///
    /// Records lacking timestamps on either side always replace, the backend
    /// being the source of truth.
    pub fn supersedes(&self, cached: &CallDetail) -> bool {
        match (self.freshness(), cached.freshness()) {
            (Some(incoming), Some(existing)) => incoming >= existing,
            _ => true,
        }
    }
}

/// Post-call analysis produced by the telephony provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_successful: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_voicemail: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_analysis_data: BTreeMap<String, serde_json::Value>,
}

// ============================================================================
// PROJECTS
// ============================================================================

/// Scoping container for a roster and its calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub customers: Vec<ContactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Project as embedded in a search group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(rename = "_id")]
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ============================================================================
// SEARCH GROUPS
// ============================================================================

/// A reusable, named set of contacts usable across projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchGroup {
    #[serde(rename = "_id")]
    pub id: SearchGroupId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: SearchGroupStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub customers: Vec<GroupMember>,
    #[serde(default)]
    pub projects: Vec<ProjectRef>,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub settings: GroupSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl SearchGroup {
    /// Member count, preferring the backend's aggregate when present.
    pub fn member_count(&self) -> usize {
        self.customer_count
            .map(|count| count as usize)
            .filter(|count| *count > 0)
            .unwrap_or(self.customers.len())
    }

    pub fn linked_project_count(&self) -> usize {
        self.project_count
            .map(|count| count as usize)
            .filter(|count| *count > 0)
            .unwrap_or(self.projects.len())
    }

    pub fn is_linked_to(&self, project_id: &ProjectId) -> bool {
        self.projects.iter().any(|p| &p.id == project_id)
    }
}

/// Member of a search group.
///
/// Members added from outside the contact book may not have a contact
/// record yet, hence the optional id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ContactId>,
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(rename = "_id")]
    pub id: FlowId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: FlowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSettings {
    pub max_customers: u32,
    pub auto_assign_projects: bool,
    pub notification_enabled: bool,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            max_customers: 1000,
            auto_assign_projects: false,
            notification_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchGroupStats {
    pub total_customers: u32,
    pub total_projects: u32,
    pub total_flows: u32,
    #[serde(default)]
    pub status_stats: Vec<StatusCount>,
    #[serde(default)]
    pub call_detail_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    #[serde(rename = "_id")]
    pub status: String,
    pub count: u32,
}

// ============================================================================
// PROVIDER RESOURCES
// ============================================================================

/// Voice agent configured at the telephony provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub agent_name: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_engine: Option<ResponseEngine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_call_analysis_model: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_modification_timestamp: i64,
}

impl Agent {
    pub fn llm_id(&self) -> Option<&LlmId> {
        self.response_engine.as_ref().and_then(|e| e.llm_id.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEngine {
    #[serde(rename = "type")]
    pub engine_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_id: Option<LlmId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// LLM configuration backing an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Llm {
    pub llm_id: LlmId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Account returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}
