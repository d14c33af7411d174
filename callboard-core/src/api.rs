//! Backend seam.
//!
//! Every component that talks to the backend goes through [`CallCenterApi`],
//! so the REST client and in-memory test doubles are interchangeable.

use crate::{
    Agent, AgentId, BackendResult, BulkMembers, CallDetail, CallRequest, Contact, ContactId,
    ContactUpdate, ContactWithLastCall, ExternalMember, Flow, FlowId, FlowUpdate, Llm, LlmId,
    LlmUpdate, LoginRequest, LoginResponse, NewContact, NewFlow, NewProject, NewSearchGroup,
    Project, ProjectId, ProjectUpdate, SearchGroup, SearchGroupId, SearchGroupStats,
    SearchGroupUpdate,
};
use async_trait::async_trait;

// ============================================================================
// BACKEND TRAIT
// ============================================================================

#[async_trait]
pub trait CallCenterApi: Send + Sync {
    // --- session -------------------------------------------------------------

    /// Exchange credentials for a bearer token.
    async fn login(&self, credentials: LoginRequest) -> BackendResult<LoginResponse>;

    // --- projects ------------------------------------------------------------

    async fn list_projects(&self) -> BackendResult<Vec<Project>>;

    /// Fetch one project; `Ok(None)` when the backend answers 404.
    async fn get_project(&self, id: &ProjectId) -> BackendResult<Option<Project>>;

    async fn create_project(&self, project: NewProject) -> BackendResult<Project>;

    async fn update_project(&self, id: &ProjectId, update: ProjectUpdate)
        -> BackendResult<Project>;

    async fn delete_project(&self, id: &ProjectId) -> BackendResult<()>;

    // --- contacts ------------------------------------------------------------

    /// List contacts, optionally restricted to one project.
    async fn list_contacts(&self, project_id: Option<&ProjectId>) -> BackendResult<Vec<Contact>>;

    async fn create_contact(&self, contact: NewContact) -> BackendResult<Contact>;

    async fn update_contact(&self, id: &ContactId, update: ContactUpdate)
        -> BackendResult<Contact>;

    async fn delete_contact(&self, id: &ContactId) -> BackendResult<()>;

    /// Contacts of a project, each with its most recent call detail.
    async fn list_contacts_with_last_call(
        &self,
        project_id: &ProjectId,
    ) -> BackendResult<Vec<ContactWithLastCall>>;

    // --- call details --------------------------------------------------------

    async fn call_details_for_contact(&self, contact_id: &ContactId)
        -> BackendResult<Vec<CallDetail>>;

    async fn call_details_for_project(&self, project_id: &ProjectId)
        -> BackendResult<Vec<CallDetail>>;

    async fn call_details_for_contact_in_project(
        &self,
        contact_id: &ContactId,
        project_id: &ProjectId,
    ) -> BackendResult<Vec<CallDetail>>;

    // --- telephony provider --------------------------------------------------

    /// Ask the backend to place one outbound call.
    async fn start_call(&self, request: CallRequest) -> BackendResult<()>;

    async fn list_agents(&self) -> BackendResult<Vec<Agent>>;

    async fn get_agent(&self, id: &AgentId) -> BackendResult<Agent>;

    async fn get_llm(&self, id: &LlmId) -> BackendResult<Llm>;

    async fn update_llm(&self, id: &LlmId, update: LlmUpdate) -> BackendResult<Llm>;

    // --- search groups -------------------------------------------------------

    async fn list_search_groups(&self) -> BackendResult<Vec<SearchGroup>>;

    async fn get_search_group(&self, id: &SearchGroupId) -> BackendResult<SearchGroup>;

    async fn create_search_group(&self, group: NewSearchGroup) -> BackendResult<SearchGroup>;

    async fn update_search_group(
        &self,
        id: &SearchGroupId,
        update: SearchGroupUpdate,
    ) -> BackendResult<SearchGroup>;

    async fn delete_search_group(&self, id: &SearchGroupId) -> BackendResult<()>;

    async fn add_group_member(
        &self,
        id: &SearchGroupId,
        contact_id: &ContactId,
    ) -> BackendResult<SearchGroup>;

    async fn remove_group_member(
        &self,
        id: &SearchGroupId,
        contact_id: &ContactId,
    ) -> BackendResult<SearchGroup>;

    async fn add_external_member(
        &self,
        id: &SearchGroupId,
        member: ExternalMember,
    ) -> BackendResult<SearchGroup>;

    async fn add_bulk_members(
        &self,
        id: &SearchGroupId,
        members: BulkMembers,
    ) -> BackendResult<SearchGroup>;

    async fn link_project(
        &self,
        id: &SearchGroupId,
        project_id: &ProjectId,
    ) -> BackendResult<SearchGroup>;

    async fn unlink_project(
        &self,
        id: &SearchGroupId,
        project_id: &ProjectId,
    ) -> BackendResult<SearchGroup>;

    async fn add_flow(&self, id: &SearchGroupId, flow: NewFlow) -> BackendResult<Flow>;

    async fn update_flow(
        &self,
        id: &SearchGroupId,
        flow_id: &FlowId,
        update: FlowUpdate,
    ) -> BackendResult<Flow>;

    async fn remove_flow(&self, id: &SearchGroupId, flow_id: &FlowId) -> BackendResult<()>;

    async fn group_stats(&self, id: &SearchGroupId) -> BackendResult<SearchGroupStats>;

    async fn group_call_details(&self, id: &SearchGroupId) -> BackendResult<Vec<CallDetail>>;
}
