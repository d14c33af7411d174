//! CALLBOARD Test Utilities
//!
//! Centralized test infrastructure for the CALLBOARD workspace:
//! - `MockBackend`, an in-memory `CallCenterApi` that journals every request
//!   and can be told to fail specific routes
//! - Proptest generators for wire entities
//! - Test fixtures for common roster scenarios

pub use callboard_core::{
    Agent, AgentId, BackendError, BackendResult, BulkMembers, CallAnalysis, CallCenterApi,
    CallDetail, CallDetailId, CallRequest, CallStatus, Contact, ContactId, ContactStatus,
    ContactUpdate, ContactWithLastCall, EntityIdType, ExternalMember, Flow, FlowId, FlowStatus,
    FlowUpdate, GroupMember, GroupSettings, Llm, LlmId, LlmUpdate, LoginRequest, LoginResponse,
    NewContact, NewFlow, NewProject, NewSearchGroup, Project, ProjectId, ProjectRef,
    ProjectStatus, ProjectUpdate, ResponseEngine, SearchGroup, SearchGroupId, SearchGroupStats,
    SearchGroupStatus, SearchGroupUpdate, StatusCount, Timestamp, UserInfo,
};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

// ============================================================================
// MOCK BACKEND
// ============================================================================

/// One request as the backend would have received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }

    /// `"POST /retell/call"` style label.
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone)]
struct FailureRule {
    method: &'static str,
    path_prefix: String,
    /// Matching requests still allowed through before failures start.
    pass: usize,
    error: BackendError,
}

#[derive(Debug, Default)]
struct MockState {
    projects: Vec<Project>,
    contacts: Vec<Contact>,
    call_details: Vec<CallDetail>,
    groups: Vec<SearchGroup>,
    agents: Vec<Agent>,
    llms: Vec<Llm>,
    login: Option<(LoginRequest, LoginResponse)>,
    journal: Vec<RecordedRequest>,
    failures: Vec<FailureRule>,
    failing_phones: Vec<(String, BackendError)>,
    sequence: i64,
}

impl MockState {
    /// Journal the request, then apply any matching failure rule.
    fn begin(&mut self, method: &'static str, path: String, body: Option<Value>) -> BackendResult<()> {
        let failure = self
            .failures
            .iter_mut()
            .filter(|rule| rule.method == method && path.starts_with(&rule.path_prefix))
            .find_map(|rule| {
                if rule.pass > 0 {
                    rule.pass -= 1;
                    None
                } else {
                    Some(rule.error.clone())
                }
            });
        self.journal.push(RecordedRequest { method, path, body });
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{}_{:04}", prefix, self.sequence)
    }

    /// Monotonic clock so freshness comparisons are deterministic.
    fn stamp(&mut self) -> Timestamp {
        self.sequence += 1;
        fixtures::at(self.sequence)
    }

    fn latest_detail(&self, contact_id: &ContactId, project_id: Option<&ProjectId>) -> Option<CallDetail> {
        self.call_details
            .iter()
            .filter(|d| &d.customer_id == contact_id)
            .filter(|d| project_id.map_or(true, |p| d.project_id.as_ref() == Some(p)))
            .fold(None, |best: Option<&CallDetail>, d| match best {
                Some(current) if !d.supersedes(current) => Some(current),
                _ => Some(d),
            })
            .cloned()
    }

    fn group_mut(&mut self, id: &SearchGroupId) -> BackendResult<&mut SearchGroup> {
        self.groups
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| not_found::<SearchGroupId>(id))
    }

    fn group(&self, id: &SearchGroupId) -> BackendResult<SearchGroup> {
        self.groups
            .iter()
            .find(|g| &g.id == id)
            .cloned()
            .ok_or_else(|| not_found::<SearchGroupId>(id))
    }
}

fn not_found<I: EntityIdType>(id: &I) -> BackendError {
    BackendError::NotFound {
        entity: I::ENTITY_NAME,
        id: id.as_str().to_string(),
    }
}

fn body<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

fn sorted_newest_first(mut details: Vec<CallDetail>) -> Vec<CallDetail> {
    details.sort_by(|a, b| b.freshness().cmp(&a.freshness()));
    details
}

/// In-memory stand-in for the call-center backend.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the journal through another.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<RwLock<MockState>>,
}

impl MockBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, MockState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // === Seeding ===

    pub fn seed_project(&self, name: &str) -> Project {
        let mut state = self.write();
        let id = ProjectId::new(state.next_id("proj"));
        let stamp = state.stamp();
        let project = Project {
            created_at: Some(stamp),
            updated_at: Some(stamp),
            ..fixtures::project(id.as_str(), name)
        };
        state.projects.push(project.clone());
        project
    }

    pub fn seed_contact(&self, project_id: &ProjectId, name: &str, phone: &str) -> Contact {
        let mut state = self.write();
        let id = ContactId::new(state.next_id("cust"));
        let stamp = state.stamp();
        let contact = Contact {
            created_at: Some(stamp),
            updated_at: Some(stamp),
            ..fixtures::contact(id.as_str(), name, phone, Some(project_id))
        };
        if let Some(project) = state.projects.iter_mut().find(|p| &p.id == project_id) {
            project.customers.push(id);
        }
        state.contacts.push(contact.clone());
        contact
    }

    /// Append a call detail stamped after everything seeded so far.
    pub fn seed_call_detail(&self, contact_id: &ContactId, status: CallStatus) -> CallDetail {
        let mut state = self.write();
        let id = CallDetailId::new(state.next_id("detail"));
        let call_id = state.next_id("call");
        let stamp = state.stamp();
        let project_id = state
            .contacts
            .iter()
            .find(|c| &c.id == contact_id)
            .and_then(|c| c.project_id.clone());
        let detail = CallDetail {
            project_id,
            call_id,
            created_at: Some(stamp),
            updated_at: Some(stamp),
            ..fixtures::call_detail(id.as_str(), contact_id.as_str(), status)
        };
        state.call_details.push(detail.clone());
        detail
    }

    /// Move the latest call of a contact to `status`, as a provider webhook
    /// would.
    pub fn set_call_status(&self, contact_id: &ContactId, status: CallStatus) -> Option<CallDetail> {
        let mut state = self.write();
        let latest = state.latest_detail(contact_id, None)?;
        let stamp = state.stamp();
        let contact_status = status.contact_status();
        let detail = state.call_details.iter_mut().find(|d| d.id == latest.id)?;
        detail.call_status = status;
        detail.updated_at = Some(stamp);
        let updated = detail.clone();
        if let Some(contact) = state.contacts.iter_mut().find(|c| &c.id == contact_id) {
            contact.status = contact_status;
        }
        Some(updated)
    }

    pub fn seed_group(&self, name: &str, members: Vec<GroupMember>) -> SearchGroup {
        let mut state = self.write();
        let id = SearchGroupId::new(state.next_id("group"));
        let stamp = state.stamp();
        let group = SearchGroup {
            customers: members,
            created_at: Some(stamp),
            updated_at: Some(stamp),
            ..fixtures::search_group(id.as_str(), name)
        };
        state.groups.push(group.clone());
        group
    }

    pub fn seed_agent(&self, agent: Agent, llm: Llm) {
        let mut state = self.write();
        state.agents.push(agent);
        state.llms.push(llm);
    }

    /// Accept exactly these credentials at `POST /auth/login`.
    pub fn accept_login(&self, email: &str, password: &str, token: &str) {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = LoginResponse {
            token: token.to_string(),
            user: UserInfo {
                id: "user_0001".to_string(),
                name: "Test Operator".to_string(),
                email: email.to_string(),
            },
        };
        self.write().login = Some((request, response));
    }

    // === Failure injection ===

    /// Fail every request whose path starts with `path_prefix`.
    pub fn fail_requests(&self, method: &'static str, path_prefix: &str, error: BackendError) {
        self.fail_after(method, path_prefix, 0, error);
    }

    /// Let `successes` matching requests through, then fail the rest.
    pub fn fail_after(&self, method: &'static str, path_prefix: &str, successes: usize, error: BackendError) {
        self.write().failures.push(FailureRule {
            method,
            path_prefix: path_prefix.to_string(),
            pass: successes,
            error,
        });
    }

    /// Fail `POST /retell/call` for one phone number.
    pub fn fail_calls_to(&self, phone: &str, error: BackendError) {
        self.write().failing_phones.push((phone.to_string(), error));
    }

    /// Remove all failure rules.
    pub fn heal(&self) {
        let mut state = self.write();
        state.failures.clear();
        state.failing_phones.clear();
    }

    // === Inspection ===

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.write().journal.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.write()
            .journal
            .iter()
            .filter(|r| r.matches(method, path))
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.write().journal.len()
    }

    pub fn clear_journal(&self) {
        self.write().journal.clear();
    }

    /// Bodies of every `POST /retell/call`, in submission order.
    pub fn started_calls(&self) -> Vec<CallRequest> {
        self.requests_to("POST", "/retell/call")
            .into_iter()
            .filter_map(|r| r.body)
            .filter_map(|b| serde_json::from_value(b).ok())
            .collect()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.write().contacts.clone()
    }

    pub fn project(&self, id: &ProjectId) -> Option<Project> {
        self.write().projects.iter().find(|p| &p.id == id).cloned()
    }

    pub fn group(&self, id: &SearchGroupId) -> Option<SearchGroup> {
        self.write().group(id).ok()
    }

    pub fn llm(&self, id: &LlmId) -> Option<Llm> {
        self.write().llms.iter().find(|l| &l.llm_id == id).cloned()
    }
}

#[async_trait]
impl CallCenterApi for MockBackend {
    async fn login(&self, credentials: LoginRequest) -> BackendResult<LoginResponse> {
        let mut state = self.write();
        state.begin("POST", "/auth/login".to_string(), body(&credentials))?;
        match &state.login {
            Some((accepted, response)) if accepted == &credentials => Ok(response.clone()),
            _ => Err(BackendError::Unauthorized),
        }
    }

    // === Projects ===

    async fn list_projects(&self) -> BackendResult<Vec<Project>> {
        let mut state = self.write();
        state.begin("GET", "/projects".to_string(), None)?;
        Ok(state.projects.clone())
    }

    async fn get_project(&self, id: &ProjectId) -> BackendResult<Option<Project>> {
        let mut state = self.write();
        state.begin("GET", format!("/projects/{}", id), None)?;
        Ok(state.projects.iter().find(|p| &p.id == id).cloned())
    }

    async fn create_project(&self, project: NewProject) -> BackendResult<Project> {
        let mut state = self.write();
        state.begin("POST", "/projects".to_string(), body(&project))?;
        let id = ProjectId::new(state.next_id("proj"));
        let stamp = state.stamp();
        let created = Project {
            description: project.description,
            status: project.status,
            created_at: Some(stamp),
            updated_at: Some(stamp),
            ..fixtures::project(id.as_str(), &project.name)
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn update_project(&self, id: &ProjectId, update: ProjectUpdate) -> BackendResult<Project> {
        let mut state = self.write();
        state.begin("PUT", format!("/projects/{}", id), body(&update))?;
        let stamp = state.stamp();
        let project = state
            .projects
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| not_found(id))?;
        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(description) = update.description {
            project.description = Some(description);
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        project.updated_at = Some(stamp);
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &ProjectId) -> BackendResult<()> {
        let mut state = self.write();
        state.begin("DELETE", format!("/projects/{}", id), None)?;
        let before = state.projects.len();
        state.projects.retain(|p| &p.id != id);
        if state.projects.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }

    // === Contacts ===

    async fn list_contacts(&self, project_id: Option<&ProjectId>) -> BackendResult<Vec<Contact>> {
        let mut state = self.write();
        let path = match project_id {
            Some(id) => format!("/customers?projectId={}", id),
            None => "/customers".to_string(),
        };
        state.begin("GET", path, None)?;
        Ok(state
            .contacts
            .iter()
            .filter(|c| project_id.map_or(true, |id| c.project_id.as_ref() == Some(id)))
            .cloned()
            .collect())
    }

    async fn create_contact(&self, contact: NewContact) -> BackendResult<Contact> {
        let mut state = self.write();
        state.begin("POST", "/customers".to_string(), body(&contact))?;
        let id = ContactId::new(state.next_id("cust"));
        let stamp = state.stamp();
        let created = Contact {
            note: contact.note,
            created_at: Some(stamp),
            updated_at: Some(stamp),
            ..fixtures::contact(
                id.as_str(),
                &contact.name,
                &contact.phone_number,
                Some(&contact.project_id),
            )
        };
        if let Some(project) = state.projects.iter_mut().find(|p| p.id == contact.project_id) {
            project.customers.push(id);
        }
        state.contacts.push(created.clone());
        Ok(created)
    }

    async fn update_contact(&self, id: &ContactId, update: ContactUpdate) -> BackendResult<Contact> {
        let mut state = self.write();
        state.begin("PUT", format!("/customers/{}", id), body(&update))?;
        let stamp = state.stamp();
        let contact = state
            .contacts
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| not_found(id))?;
        if let Some(name) = update.name {
            contact.name = name;
        }
        if let Some(phone) = update.phone_number {
            contact.phone_number = phone;
        }
        if let Some(note) = update.note {
            contact.note = Some(note);
        }
        if let Some(project_id) = update.project_id.clone() {
            contact.project_id = Some(project_id);
        }
        contact.updated_at = Some(stamp);
        let updated = contact.clone();
        if let Some(project_id) = update.project_id {
            if let Some(project) = state.projects.iter_mut().find(|p| p.id == project_id) {
                if !project.customers.contains(id) {
                    project.customers.push(id.clone());
                }
            }
        }
        Ok(updated)
    }

    async fn delete_contact(&self, id: &ContactId) -> BackendResult<()> {
        let mut state = self.write();
        state.begin("DELETE", format!("/customers/{}", id), None)?;
        let before = state.contacts.len();
        state.contacts.retain(|c| &c.id != id);
        if state.contacts.len() == before {
            return Err(not_found(id));
        }
        for project in &mut state.projects {
            project.customers.retain(|c| c != id);
        }
        Ok(())
    }

    async fn list_contacts_with_last_call(
        &self,
        project_id: &ProjectId,
    ) -> BackendResult<Vec<ContactWithLastCall>> {
        let mut state = self.write();
        state.begin("GET", format!("/customers/call-details?projectId={}", project_id), None)?;
        Ok(state
            .contacts
            .iter()
            .filter(|c| c.project_id.as_ref() == Some(project_id))
            .map(|c| ContactWithLastCall {
                contact: c.clone(),
                last_call_detail: state.latest_detail(&c.id, Some(project_id)),
            })
            .collect())
    }

    // === Call details ===

    async fn call_details_for_contact(&self, contact_id: &ContactId) -> BackendResult<Vec<CallDetail>> {
        let mut state = self.write();
        state.begin("GET", format!("/call-details/customer/{}", contact_id), None)?;
        Ok(sorted_newest_first(
            state
                .call_details
                .iter()
                .filter(|d| &d.customer_id == contact_id)
                .cloned()
                .collect(),
        ))
    }

    async fn call_details_for_project(&self, project_id: &ProjectId) -> BackendResult<Vec<CallDetail>> {
        let mut state = self.write();
        state.begin("GET", format!("/call-details/project/{}", project_id), None)?;
        Ok(sorted_newest_first(
            state
                .call_details
                .iter()
                .filter(|d| d.project_id.as_ref() == Some(project_id))
                .cloned()
                .collect(),
        ))
    }

    async fn call_details_for_contact_in_project(
        &self,
        contact_id: &ContactId,
        project_id: &ProjectId,
    ) -> BackendResult<Vec<CallDetail>> {
        let mut state = self.write();
        state.begin(
            "GET",
            format!("/call-details/customer/{}/project/{}", contact_id, project_id),
            None,
        )?;
        Ok(sorted_newest_first(
            state
                .call_details
                .iter()
                .filter(|d| &d.customer_id == contact_id && d.project_id.as_ref() == Some(project_id))
                .cloned()
                .collect(),
        ))
    }

    // === Telephony provider ===

    async fn start_call(&self, request: CallRequest) -> BackendResult<()> {
        let mut state = self.write();
        state.begin("POST", "/retell/call".to_string(), body(&request))?;
        if let Some((_, error)) = state
            .failing_phones
            .iter()
            .find(|(phone, _)| phone == &request.phone_number)
        {
            return Err(error.clone());
        }

        let contact_id = state
            .contacts
            .iter()
            .find(|c| c.phone_number == request.phone_number && c.project_id.as_ref() == Some(&request.project_id))
            .map(|c| c.id.clone());
        if let Some(contact_id) = contact_id {
            let id = CallDetailId::new(state.next_id("detail"));
            let call_id = state.next_id("call");
            let stamp = state.stamp();
            state.call_details.push(CallDetail {
                project_id: Some(request.project_id.clone()),
                call_id,
                created_at: Some(stamp),
                updated_at: Some(stamp),
                ..fixtures::call_detail(id.as_str(), contact_id.as_str(), CallStatus::NotStarted)
            });
            if let Some(contact) = state.contacts.iter_mut().find(|c| c.id == contact_id) {
                contact.status = ContactStatus::Processing;
            }
        }
        Ok(())
    }

    async fn list_agents(&self) -> BackendResult<Vec<Agent>> {
        let mut state = self.write();
        state.begin("GET", "/retell/agents".to_string(), None)?;
        Ok(state.agents.clone())
    }

    async fn get_agent(&self, id: &AgentId) -> BackendResult<Agent> {
        let mut state = self.write();
        state.begin("GET", format!("/retell/agents/{}", id), None)?;
        state
            .agents
            .iter()
            .find(|a| &a.agent_id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn get_llm(&self, id: &LlmId) -> BackendResult<Llm> {
        let mut state = self.write();
        state.begin("GET", format!("/retell/llms/{}", id), None)?;
        state
            .llms
            .iter()
            .find(|l| &l.llm_id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn update_llm(&self, id: &LlmId, update: LlmUpdate) -> BackendResult<Llm> {
        let mut state = self.write();
        state.begin("PATCH", format!("/retell/llms/{}", id), body(&update))?;
        let llm = state
            .llms
            .iter_mut()
            .find(|l| &l.llm_id == id)
            .ok_or_else(|| not_found(id))?;
        llm.general_prompt = Some(update.general_prompt);
        if update.model.is_some() {
            llm.model = update.model;
        }
        Ok(llm.clone())
    }

    // === Search groups ===

    async fn list_search_groups(&self) -> BackendResult<Vec<SearchGroup>> {
        let mut state = self.write();
        state.begin("GET", "/search-groups".to_string(), None)?;
        Ok(state.groups.clone())
    }

    async fn get_search_group(&self, id: &SearchGroupId) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        state.begin("GET", format!("/search-groups/{}", id), None)?;
        state.group(id)
    }

    async fn create_search_group(&self, group: NewSearchGroup) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        state.begin("POST", "/search-groups".to_string(), body(&group))?;
        let id = SearchGroupId::new(state.next_id("group"));
        let stamp = state.stamp();
        let mut created = SearchGroup {
            description: group.description,
            created_at: Some(stamp),
            updated_at: Some(stamp),
            ..fixtures::search_group(id.as_str(), &group.name)
        };
        if let Some(settings) = group.settings {
            apply_settings(&mut created.settings, settings);
        }
        state.groups.push(created.clone());
        Ok(created)
    }

    async fn update_search_group(
        &self,
        id: &SearchGroupId,
        update: SearchGroupUpdate,
    ) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        state.begin("PUT", format!("/search-groups/{}", id), body(&update))?;
        let stamp = state.stamp();
        let group = state.group_mut(id)?;
        if let Some(name) = update.name {
            group.name = name;
        }
        if let Some(description) = update.description {
            group.description = Some(description);
        }
        if let Some(status) = update.status {
            group.status = status;
        }
        if let Some(settings) = update.settings {
            apply_settings(&mut group.settings, settings);
        }
        group.updated_at = Some(stamp);
        Ok(group.clone())
    }

    async fn delete_search_group(&self, id: &SearchGroupId) -> BackendResult<()> {
        let mut state = self.write();
        state.begin("DELETE", format!("/search-groups/{}", id), None)?;
        state.group(id)?;
        state.groups.retain(|g| &g.id != id);
        Ok(())
    }

    async fn add_group_member(&self, id: &SearchGroupId, contact_id: &ContactId) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        let request = callboard_core::MemberRef {
            customer_id: contact_id.clone(),
        };
        state.begin("POST", format!("/search-groups/{}/customers", id), body(&request))?;
        let contact = state
            .contacts
            .iter()
            .find(|c| &c.id == contact_id)
            .cloned()
            .ok_or_else(|| not_found(contact_id))?;
        let group = state.group_mut(id)?;
        if !group.customers.iter().any(|m| m.id.as_ref() == Some(contact_id)) {
            group.customers.push(fixtures::member_of(&contact));
        }
        Ok(group.clone())
    }

    async fn remove_group_member(&self, id: &SearchGroupId, contact_id: &ContactId) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        let request = callboard_core::MemberRef {
            customer_id: contact_id.clone(),
        };
        state.begin("DELETE", format!("/search-groups/{}/customers", id), body(&request))?;
        let group = state.group_mut(id)?;
        group.customers.retain(|m| m.id.as_ref() != Some(contact_id));
        Ok(group.clone())
    }

    async fn add_external_member(&self, id: &SearchGroupId, member: ExternalMember) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        state.begin("POST", format!("/search-groups/{}/customers/external", id), body(&member))?;
        let group = state.group_mut(id)?;
        group.customers.push(fixtures::external_member(&member.name, &member.phone_number));
        Ok(group.clone())
    }

    async fn add_bulk_members(&self, id: &SearchGroupId, members: BulkMembers) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        state.begin("POST", format!("/search-groups/{}/customers/bulk", id), body(&members))?;
        let group = state.group_mut(id)?;
        for member in members.customers {
            group.customers.push(fixtures::external_member(&member.name, &member.phone_number));
        }
        Ok(group.clone())
    }

    async fn link_project(&self, id: &SearchGroupId, project_id: &ProjectId) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        let request = callboard_core::ProjectLink {
            project_id: project_id.clone(),
        };
        state.begin("POST", format!("/search-groups/{}/projects", id), body(&request))?;
        let project = state
            .projects
            .iter()
            .find(|p| &p.id == project_id)
            .cloned()
            .ok_or_else(|| not_found(project_id))?;
        let group = state.group_mut(id)?;
        if !group.is_linked_to(project_id) {
            group.projects.push(ProjectRef {
                id: project.id,
                name: project.name,
                description: project.description,
                status: Some(project.status.as_str().to_string()),
            });
        }
        Ok(group.clone())
    }

    async fn unlink_project(&self, id: &SearchGroupId, project_id: &ProjectId) -> BackendResult<SearchGroup> {
        let mut state = self.write();
        let request = callboard_core::ProjectLink {
            project_id: project_id.clone(),
        };
        state.begin("DELETE", format!("/search-groups/{}/projects", id), body(&request))?;
        let group = state.group_mut(id)?;
        group.projects.retain(|p| &p.id != project_id);
        Ok(group.clone())
    }

    async fn add_flow(&self, id: &SearchGroupId, flow: NewFlow) -> BackendResult<Flow> {
        let mut state = self.write();
        state.begin("POST", format!("/search-groups/{}/flows", id), body(&flow))?;
        let flow_id = FlowId::new(state.next_id("flow"));
        let stamp = state.stamp();
        let created = Flow {
            id: flow_id,
            name: flow.name,
            description: flow.description,
            status: FlowStatus::Active,
            created_at: Some(stamp),
        };
        state.group_mut(id)?.flows.push(created.clone());
        Ok(created)
    }

    async fn update_flow(&self, id: &SearchGroupId, flow_id: &FlowId, update: FlowUpdate) -> BackendResult<Flow> {
        let mut state = self.write();
        state.begin("PUT", format!("/search-groups/{}/flows/{}", id, flow_id), body(&update))?;
        let group = state.group_mut(id)?;
        let flow = group
            .flows
            .iter_mut()
            .find(|f| &f.id == flow_id)
            .ok_or_else(|| not_found(flow_id))?;
        if let Some(name) = update.name {
            flow.name = name;
        }
        if let Some(description) = update.description {
            flow.description = Some(description);
        }
        if let Some(status) = update.status {
            flow.status = status;
        }
        Ok(flow.clone())
    }

    async fn remove_flow(&self, id: &SearchGroupId, flow_id: &FlowId) -> BackendResult<()> {
        let mut state = self.write();
        state.begin("DELETE", format!("/search-groups/{}/flows/{}", id, flow_id), None)?;
        state.group_mut(id)?.flows.retain(|f| &f.id != flow_id);
        Ok(())
    }

    async fn group_stats(&self, id: &SearchGroupId) -> BackendResult<SearchGroupStats> {
        let mut state = self.write();
        state.begin("GET", format!("/search-groups/{}/stats", id), None)?;
        let group = state.group(id)?;
        let member_ids: Vec<&ContactId> = group.customers.iter().filter_map(|m| m.id.as_ref()).collect();

        let mut status_stats: Vec<StatusCount> = Vec::new();
        for contact in state.contacts.iter().filter(|c| member_ids.contains(&&c.id)) {
            let label = contact.status.as_str();
            match status_stats.iter_mut().find(|s| s.status == label) {
                Some(entry) => entry.count += 1,
                None => status_stats.push(StatusCount {
                    status: label.to_string(),
                    count: 1,
                }),
            }
        }
        let call_detail_count = state
            .call_details
            .iter()
            .filter(|d| member_ids.contains(&&d.customer_id))
            .count();

        Ok(SearchGroupStats {
            total_customers: group.customers.len() as u32,
            total_projects: group.projects.len() as u32,
            total_flows: group.flows.len() as u32,
            status_stats,
            call_detail_count: call_detail_count as u32,
            created_at: group.created_at,
            last_updated: group.updated_at,
        })
    }

    async fn group_call_details(&self, id: &SearchGroupId) -> BackendResult<Vec<CallDetail>> {
        let mut state = self.write();
        state.begin("GET", format!("/search-groups/{}/call-details", id), None)?;
        let group = state.group(id)?;
        Ok(sorted_newest_first(
            state
                .call_details
                .iter()
                .filter(|d| group.customers.iter().any(|m| m.id.as_ref() == Some(&d.customer_id)))
                .cloned()
                .collect(),
        ))
    }
}

fn apply_settings(settings: &mut GroupSettings, input: callboard_core::GroupSettingsInput) {
    if let Some(max) = input.max_customers {
        settings.max_customers = max;
    }
    if let Some(auto) = input.auto_assign_projects {
        settings.auto_assign_projects = auto;
    }
    if let Some(notify) = input.notification_enabled {
        settings.notification_enabled = notify;
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating CALLBOARD wire entities.

    use super::*;
    use proptest::prelude::*;

    /// Ten-digit national phone number.
    pub fn arb_phone() -> impl Strategy<Value = String> {
        "[2-9][0-9]{9}"
    }

    pub fn arb_contact_id() -> impl Strategy<Value = ContactId> {
        "[a-f0-9]{24}".prop_map(|raw| ContactId::new(raw))
    }

    pub fn arb_project_id() -> impl Strategy<Value = ProjectId> {
        "[a-f0-9]{24}".prop_map(|raw| ProjectId::new(raw))
    }

    /// Generate a Timestamp within 2024.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (0i64..31_536_000).prop_map(fixtures::at)
    }

    pub fn arb_call_status() -> impl Strategy<Value = CallStatus> {
        prop_oneof![
            Just(CallStatus::NotStarted),
            Just(CallStatus::InProgress),
            Just(CallStatus::Ended),
            Just(CallStatus::Failed),
            Just(CallStatus::Unknown("dialing".to_string())),
        ]
    }

    pub fn arb_terminal_call_status() -> impl Strategy<Value = CallStatus> {
        prop_oneof![Just(CallStatus::Ended), Just(CallStatus::Failed)]
    }

    pub fn arb_contact_status() -> impl Strategy<Value = ContactStatus> {
        prop_oneof![
            Just(ContactStatus::Pending),
            Just(ContactStatus::Processing),
            Just(ContactStatus::Completed),
            Just(ContactStatus::Failed),
        ]
    }

    /// Call detail for `contact_id` with arbitrary status and freshness.
    pub fn arb_call_detail(contact_id: ContactId) -> impl Strategy<Value = CallDetail> {
        ("[a-f0-9]{24}", arb_call_status(), proptest::option::of(arb_timestamp())).prop_map(
            move |(id, status, updated_at)| CallDetail {
                updated_at,
                ..fixtures::call_detail(&id, contact_id.as_str(), status)
            },
        )
    }

    /// Roster of contacts with distinct ids and phone numbers.
    pub fn arb_roster(max: usize) -> impl Strategy<Value = Vec<Contact>> {
        proptest::collection::btree_set(arb_phone(), 0..=max).prop_flat_map(|phones| {
            let phones: Vec<String> = phones.into_iter().collect();
            let count = phones.len();
            (
                Just(phones),
                proptest::collection::vec(arb_contact_status(), count),
            )
                .prop_map(|(phones, statuses)| {
                    phones
                        .into_iter()
                        .zip(statuses)
                        .enumerate()
                        .map(|(i, (phone, status))| Contact {
                            status,
                            ..fixtures::contact(&format!("cust_{:04}", i), &format!("Contact {}", i), &phone, None)
                        })
                        .collect()
                })
        })
    }

    /// Group member, with or without a contact id.
    pub fn arb_group_member() -> impl Strategy<Value = GroupMember> {
        (proptest::option::of(arb_contact_id()), "[A-Z][a-z]{2,8}", arb_phone()).prop_map(
            |(id, name, phone)| GroupMember {
                id,
                ..fixtures::external_member(&name, &phone)
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// `2024-01-01T00:00:00Z` plus `seconds`.
    pub fn at(seconds: i64) -> Timestamp {
        let epoch = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        epoch + Duration::seconds(seconds)
    }

    pub fn project(id: &str, name: &str) -> Project {
        Project {
            id: ProjectId::new(id),
            name: name.to_string(),
            description: None,
            status: ProjectStatus::Active,
            customers: Vec::new(),
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn contact(id: &str, name: &str, phone: &str, project_id: Option<&ProjectId>) -> Contact {
        Contact {
            id: ContactId::new(id),
            name: name.to_string(),
            phone_number: phone.to_string(),
            project_id: project_id.cloned(),
            status: ContactStatus::Pending,
            note: None,
            record: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn call_detail(id: &str, contact_id: &str, status: CallStatus) -> CallDetail {
        CallDetail {
            id: CallDetailId::new(id),
            customer_id: ContactId::new(contact_id),
            project_id: None,
            call_id: format!("call_{}", id),
            call_status: status,
            transcript: None,
            recording_url: None,
            call_analysis: None,
            duration: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Ended call with a transcript and analysis filled in.
    pub fn analysed_call(id: &str, contact_id: &str, updated_at: Timestamp) -> CallDetail {
        CallDetail {
            transcript: Some("Agent: Hello\nUser: Hi, yes I'm interested".to_string()),
            recording_url: Some(format!("https://recordings.example.com/{}.wav", id)),
            call_analysis: Some(CallAnalysis {
                call_summary: Some("Caller is interested in a follow-up.".to_string()),
                user_sentiment: Some("Positive".to_string()),
                call_successful: Some(true),
                in_voicemail: Some(false),
                custom_analysis_data: Default::default(),
            }),
            duration: Some(42.0),
            created_at: Some(updated_at),
            updated_at: Some(updated_at),
            ..call_detail(id, contact_id, CallStatus::Ended)
        }
    }

    pub fn with_last_call(contact: Contact, detail: Option<CallDetail>) -> ContactWithLastCall {
        ContactWithLastCall {
            contact,
            last_call_detail: detail,
        }
    }

    pub fn search_group(id: &str, name: &str) -> SearchGroup {
        SearchGroup {
            id: SearchGroupId::new(id),
            name: name.to_string(),
            description: None,
            status: SearchGroupStatus::Active,
            created_by: None,
            customers: Vec::new(),
            projects: Vec::new(),
            flows: Vec::new(),
            settings: GroupSettings::default(),
            customer_count: None,
            project_count: None,
            flow_count: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Group member backed by an existing contact record.
    pub fn member_of(contact: &Contact) -> GroupMember {
        GroupMember {
            id: Some(contact.id.clone()),
            note: contact.note.clone(),
            record: contact.record.clone(),
            status: Some(contact.status.as_str().to_string()),
            ..external_member(&contact.name, &contact.phone_number)
        }
    }

    /// Group member with no contact record.
    pub fn external_member(name: &str, phone: &str) -> GroupMember {
        GroupMember {
            id: None,
            name: name.to_string(),
            phone_number: phone.to_string(),
            note: None,
            record: None,
            status: None,
            added_at: None,
            created_at: None,
        }
    }

    pub fn agent(agent_id: &str, llm_id: &str) -> Agent {
        Agent {
            agent_id: AgentId::new(agent_id),
            agent_name: format!("Agent {}", agent_id),
            version: 1,
            is_published: true,
            response_engine: Some(ResponseEngine {
                engine_type: "retell-llm".to_string(),
                llm_id: Some(LlmId::new(llm_id)),
                version: Some(1),
            }),
            voice_id: Some("11labs-Adrian".to_string()),
            voice_model: None,
            language: Some("en-US".to_string()),
            post_call_analysis_model: None,
            last_modification_timestamp: 1_704_067_200_000,
        }
    }

    pub fn llm(llm_id: &str, prompt: &str) -> Llm {
        Llm {
            llm_id: LlmId::new(llm_id),
            general_prompt: Some(prompt.to_string()),
            model: Some("gpt-4o".to_string()),
            extra: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_journal_records_failed_requests() {
        let backend = MockBackend::new();
        let project = backend.seed_project("Spring");
        backend.fail_requests("POST", "/customers", BackendError::Status {
            status: 500,
            body: "boom".to_string(),
        });

        let result = backend
            .create_contact(NewContact {
                name: "Ada".to_string(),
                phone_number: "5550000001".to_string(),
                project_id: project.id.clone(),
                note: None,
            })
            .await;

        assert!(matches!(result, Err(BackendError::Status { status: 500, .. })));
        assert_eq!(backend.requests_to("POST", "/customers").len(), 1);
        assert!(backend.contacts().is_empty());
    }

    #[tokio::test]
    async fn test_fail_after_lets_first_requests_through() {
        let backend = MockBackend::new();
        let project = backend.seed_project("Spring");
        backend.fail_after("POST", "/customers", 1, BackendError::Backend("duplicate".to_string()));

        for (i, expect_ok) in [(1, true), (2, false)] {
            let result = backend
                .create_contact(NewContact {
                    name: format!("Contact {}", i),
                    phone_number: format!("555000000{}", i),
                    project_id: project.id.clone(),
                    note: None,
                })
                .await;
            assert_eq!(result.is_ok(), expect_ok);
        }
    }

    #[tokio::test]
    async fn test_start_call_creates_pending_detail() {
        let backend = MockBackend::new();
        let project = backend.seed_project("Spring");
        let contact = backend.seed_contact(&project.id, "Ada", "5550000001");

        backend
            .start_call(CallRequest {
                name: contact.name.clone(),
                phone_number: contact.phone_number.clone(),
                project_id: project.id.clone(),
            })
            .await
            .unwrap();

        let rows = backend.list_contacts_with_last_call(&project.id).await.unwrap();
        let detail = rows[0].last_call_detail.clone().unwrap();
        assert_eq!(detail.call_status, CallStatus::NotStarted);

        let ended = backend.set_call_status(&contact.id, CallStatus::Ended).unwrap();
        assert!(ended.supersedes(&detail));
        assert_eq!(backend.started_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_project_is_none() {
        let backend = MockBackend::new();
        let project = backend.get_project(&ProjectId::new("nope")).await.unwrap();
        assert!(project.is_none());
    }
}
