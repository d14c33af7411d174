//! REST client for the call-center backend.
//!
//! Every endpoint answers with the `{status, data, message}` envelope. The
//! client unwraps it, maps 401 to [`BackendError::Unauthorized`] and any
//! other non-2xx answer to [`BackendError::Status`] carrying the body text.

use crate::config::TuiConfig;
use async_trait::async_trait;
use callboard_core::{
    Agent, AgentId, BackendError, BackendResult, BulkMembers, CallCenterApi, CallDetail,
    CallRequest, Contact, ContactId, ContactUpdate, ContactWithLastCall, Envelope, ExternalMember,
    Flow, FlowId, FlowUpdate, Llm, LlmId, LlmUpdate, LoginRequest, LoginResponse, MemberRef,
    NewContact, NewFlow, NewProject, NewSearchGroup, Project, ProjectId, ProjectLink,
    ProjectUpdate, SearchGroup, SearchGroupId, SearchGroupStats, SearchGroupUpdate,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid session token: {0}")]
    InvalidToken(String),
}

/// Bearer credentials for an authenticated backend session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn header_map(&self) -> Result<HeaderMap, ApiClientError> {
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| ApiClientError::InvalidToken(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl RestClient {
    /// Unauthenticated client; only `login` is expected to succeed with it.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: HeaderMap::new(),
        })
    }

    pub fn from_config(config: &TuiConfig) -> Result<Self, ApiClientError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Same connection pool, authenticated as `session`.
    pub fn with_session(&self, session: &Session) -> Result<Self, ApiClientError> {
        Ok(Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            auth_header: session.header_map()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url).headers(self.auth_header.clone())
    }

    /// Send and return the raw status and body, with 401 already mapped.
    async fn execute(&self, request: RequestBuilder, path: &str) -> BackendResult<(StatusCode, String)> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        tracing::debug!(path, status = status.as_u16(), "backend response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }
        Ok((status, body))
    }

    async fn envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> BackendResult<Envelope<T>> {
        let (status, body) = self.execute(request, path).await?;
        parse_envelope(status, &body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> BackendResult<Envelope<T>> {
        self.envelope(self.request(Method::GET, path), path).await
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, action: &str) -> BackendResult<Vec<T>> {
        self.get::<Vec<T>>(path).await?.into_list(action)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> BackendResult<Envelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.envelope(self.request(method, path).json(body), path).await
    }

    async fn delete(&self, path: &str, action: &str) -> BackendResult<()> {
        let envelope: Envelope<serde_json::Value> =
            self.envelope(self.request(Method::DELETE, path), path).await?;
        envelope.into_optional(action).map(|_| ())
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Transport(format!("request timed out: {}", err))
    } else {
        BackendError::Transport(err.to_string())
    }
}

fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> BackendResult<Envelope<T>> {
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    if body.trim().is_empty() {
        return Ok(Envelope::empty());
    }
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Accept either an envelope or the bare resource.
fn parse_envelope_or_bare<T: DeserializeOwned>(status: StatusCode, body: &str) -> BackendResult<Envelope<T>> {
    if !status.is_success() {
        return parse_envelope(status, body);
    }
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    let is_envelope = value
        .get("status")
        .and_then(|s| s.as_str())
        .map_or(false, |s| s == "success" || s == "error");
    if is_envelope {
        serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
    } else {
        serde_json::from_value(value)
            .map(Envelope::success)
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CallCenterApi for RestClient {
    async fn login(&self, credentials: LoginRequest) -> BackendResult<LoginResponse> {
        self.send_json(Method::POST, "/auth/login", &credentials)
            .await?
            .into_data("log in")
    }

    // ------------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------------

    async fn list_projects(&self) -> BackendResult<Vec<Project>> {
        self.list("/projects", "load projects").await
    }

    async fn get_project(&self, id: &ProjectId) -> BackendResult<Option<Project>> {
        let path = format!("/projects/{}", id);
        let (status, body) = self.execute(self.request(Method::GET, &path), &path).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_envelope(status, &body)?.into_optional("load project")
    }

    async fn create_project(&self, project: NewProject) -> BackendResult<Project> {
        self.send_json(Method::POST, "/projects", &project)
            .await?
            .into_data("create project")
    }

    async fn update_project(&self, id: &ProjectId, update: ProjectUpdate) -> BackendResult<Project> {
        self.send_json(Method::PUT, &format!("/projects/{}", id), &update)
            .await?
            .into_data("update project")
    }

    async fn delete_project(&self, id: &ProjectId) -> BackendResult<()> {
        self.delete(&format!("/projects/{}", id), "delete project").await
    }

    // ------------------------------------------------------------------------
    // Contacts
    // ------------------------------------------------------------------------

    async fn list_contacts(&self, project_id: Option<&ProjectId>) -> BackendResult<Vec<Contact>> {
        let mut request = self.request(Method::GET, "/customers");
        if let Some(id) = project_id {
            request = request.query(&[("projectId", id.to_string())]);
        }
        self.envelope::<Vec<Contact>>(request, "/customers")
            .await?
            .into_list("load customers")
    }

    async fn create_contact(&self, contact: NewContact) -> BackendResult<Contact> {
        self.send_json(Method::POST, "/customers", &contact)
            .await?
            .into_data("save customer")
    }

    async fn update_contact(&self, id: &ContactId, update: ContactUpdate) -> BackendResult<Contact> {
        self.send_json(Method::PUT, &format!("/customers/{}", id), &update)
            .await?
            .into_data("update customer")
    }

    async fn delete_contact(&self, id: &ContactId) -> BackendResult<()> {
        self.delete(&format!("/customers/{}", id), "delete customer").await
    }

    async fn list_contacts_with_last_call(
        &self,
        project_id: &ProjectId,
    ) -> BackendResult<Vec<ContactWithLastCall>> {
        let path = "/customers/call-details";
        let request = self
            .request(Method::GET, path)
            .query(&[("projectId", project_id.to_string())]);
        self.envelope::<Vec<ContactWithLastCall>>(request, path)
            .await?
            .into_list("load customers with call details")
    }

    // ------------------------------------------------------------------------
    // Call details
    // ------------------------------------------------------------------------

    async fn call_details_for_contact(&self, contact_id: &ContactId) -> BackendResult<Vec<CallDetail>> {
        let path = format!("/call-details/customer/{}", contact_id);
        self.list(&path, "load call details").await
    }

    async fn call_details_for_project(&self, project_id: &ProjectId) -> BackendResult<Vec<CallDetail>> {
        let path = format!("/call-details/project/{}", project_id);
        self.list(&path, "load call details").await
    }

    async fn call_details_for_contact_in_project(
        &self,
        contact_id: &ContactId,
        project_id: &ProjectId,
    ) -> BackendResult<Vec<CallDetail>> {
        let path = format!("/call-details/customer/{}/project/{}", contact_id, project_id);
        self.list(&path, "load call details").await
    }

    // ------------------------------------------------------------------------
    // Telephony provider
    // ------------------------------------------------------------------------

    async fn start_call(&self, request: CallRequest) -> BackendResult<()> {
        let envelope: Envelope<serde_json::Value> =
            self.send_json(Method::POST, "/retell/call", &request).await?;
        envelope.into_optional("start call").map(|_| ())
    }

    async fn list_agents(&self) -> BackendResult<Vec<Agent>> {
        self.list("/retell/agents", "load agents").await
    }

    async fn get_agent(&self, id: &AgentId) -> BackendResult<Agent> {
        self.get(&format!("/retell/agents/{}", id))
            .await?
            .into_data("load agent")
    }

    async fn get_llm(&self, id: &LlmId) -> BackendResult<Llm> {
        let path = format!("/retell/llms/{}", id);
        let (status, body) = self.execute(self.request(Method::GET, &path), &path).await?;
        parse_envelope_or_bare(status, &body)?.into_data("load LLM")
    }

    async fn update_llm(&self, id: &LlmId, update: LlmUpdate) -> BackendResult<Llm> {
        let path = format!("/retell/llms/{}", id);
        let request = self.request(Method::PATCH, &path).json(&update);
        let (status, body) = self.execute(request, &path).await?;
        parse_envelope_or_bare(status, &body)?.into_data("update LLM")
    }

    // ------------------------------------------------------------------------
    // Search groups
    // ------------------------------------------------------------------------

    async fn list_search_groups(&self) -> BackendResult<Vec<SearchGroup>> {
        self.list("/search-groups", "load search groups").await
    }

    async fn get_search_group(&self, id: &SearchGroupId) -> BackendResult<SearchGroup> {
        self.get(&format!("/search-groups/{}", id))
            .await?
            .into_data("load search group")
    }

    async fn create_search_group(&self, group: NewSearchGroup) -> BackendResult<SearchGroup> {
        self.send_json(Method::POST, "/search-groups", &group)
            .await?
            .into_data("create search group")
    }

    async fn update_search_group(
        &self,
        id: &SearchGroupId,
        update: SearchGroupUpdate,
    ) -> BackendResult<SearchGroup> {
        self.send_json(Method::PUT, &format!("/search-groups/{}", id), &update)
            .await?
            .into_data("update search group")
    }

    async fn delete_search_group(&self, id: &SearchGroupId) -> BackendResult<()> {
        self.delete(&format!("/search-groups/{}", id), "delete search group")
            .await
    }

    async fn add_group_member(&self, id: &SearchGroupId, contact_id: &ContactId) -> BackendResult<SearchGroup> {
        let body = MemberRef {
            customer_id: contact_id.clone(),
        };
        self.send_json(Method::POST, &format!("/search-groups/{}/customers", id), &body)
            .await?
            .into_data("add customer to search group")
    }

    async fn remove_group_member(&self, id: &SearchGroupId, contact_id: &ContactId) -> BackendResult<SearchGroup> {
        let body = MemberRef {
            customer_id: contact_id.clone(),
        };
        self.send_json(Method::DELETE, &format!("/search-groups/{}/customers", id), &body)
            .await?
            .into_data("remove customer from search group")
    }

    async fn add_external_member(&self, id: &SearchGroupId, member: ExternalMember) -> BackendResult<SearchGroup> {
        self.send_json(
            Method::POST,
            &format!("/search-groups/{}/customers/external", id),
            &member,
        )
        .await?
        .into_data("add external customer")
    }

    async fn add_bulk_members(&self, id: &SearchGroupId, members: BulkMembers) -> BackendResult<SearchGroup> {
        self.send_json(
            Method::POST,
            &format!("/search-groups/{}/customers/bulk", id),
            &members,
        )
        .await?
        .into_data("add customers in bulk")
    }

    async fn link_project(&self, id: &SearchGroupId, project_id: &ProjectId) -> BackendResult<SearchGroup> {
        let body = ProjectLink {
            project_id: project_id.clone(),
        };
        self.send_json(Method::POST, &format!("/search-groups/{}/projects", id), &body)
            .await?
            .into_data("add project to search group")
    }

    async fn unlink_project(&self, id: &SearchGroupId, project_id: &ProjectId) -> BackendResult<SearchGroup> {
        let body = ProjectLink {
            project_id: project_id.clone(),
        };
        self.send_json(Method::DELETE, &format!("/search-groups/{}/projects", id), &body)
            .await?
            .into_data("remove project from search group")
    }

    async fn add_flow(&self, id: &SearchGroupId, flow: NewFlow) -> BackendResult<Flow> {
        self.send_json(Method::POST, &format!("/search-groups/{}/flows", id), &flow)
            .await?
            .into_data("add flow")
    }

    async fn update_flow(&self, id: &SearchGroupId, flow_id: &FlowId, update: FlowUpdate) -> BackendResult<Flow> {
        self.send_json(
            Method::PUT,
            &format!("/search-groups/{}/flows/{}", id, flow_id),
            &update,
        )
        .await?
        .into_data("update flow")
    }

    async fn remove_flow(&self, id: &SearchGroupId, flow_id: &FlowId) -> BackendResult<()> {
        self.delete(
            &format!("/search-groups/{}/flows/{}", id, flow_id),
            "remove flow",
        )
        .await
    }

    async fn group_stats(&self, id: &SearchGroupId) -> BackendResult<SearchGroupStats> {
        self.get(&format!("/search-groups/{}/stats", id))
            .await?
            .into_data("load search group stats")
    }

    async fn group_call_details(&self, id: &SearchGroupId) -> BackendResult<Vec<CallDetail>> {
        let path = format!("/search-groups/{}/call-details", id);
        self.list(&path, "load search group call details").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::{CallStatus, EntityIdType};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> RestClient {
        RestClient::new(base_url, Duration::from_secs(5))
            .unwrap()
            .with_session(&Session::new("test-token"))
            .unwrap()
    }

    #[tokio::test]
    async fn list_projects_unwraps_envelope_and_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": [{"_id": "p1", "name": "Spring", "status": "active"}]
            })))
            .mount(&server)
            .await;

        let projects = test_client(&server.uri()).list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Spring");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_session_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(401).set_body_string("jwt expired"))
            .mount(&server)
            .await;

        let result = test_client(&server.uri()).list_projects().await;
        assert_eq!(result, Err(BackendError::Unauthorized));
    }

    #[tokio::test]
    async fn non_success_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/customers"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate phone"))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .create_contact(NewContact {
                name: "Ada".to_string(),
                phone_number: "5550000001".to_string(),
                project_id: ProjectId::new("p1"),
                note: None,
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(
            err,
            BackendError::Status {
                status: 409,
                body: "duplicate phone".to_string()
            }
        );
        assert!(err.to_string().contains("HTTP 409"), "got: {err}");
    }

    #[tokio::test]
    async fn error_envelope_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/retell/call"))
            .and(body_json(json!({
                "name": "Ada",
                "phoneNumber": "5550000001",
                "projectId": "p1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "message": "Agent not configured"
            })))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .start_call(CallRequest {
                name: "Ada".to_string(),
                phone_number: "5550000001".to_string(),
                project_id: ProjectId::new("p1"),
            })
            .await;
        assert_eq!(result, Err(BackendError::Backend("Agent not configured".to_string())));
    }

    #[tokio::test]
    async fn missing_project_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
            .mount(&server)
            .await;

        let project = test_client(&server.uri())
            .get_project(&ProjectId::new("nope"))
            .await
            .unwrap();
        assert!(project.is_none());
    }

    #[tokio::test]
    async fn call_details_poll_uses_project_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers/call-details"))
            .and(query_param("projectId", "p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": [{
                    "_id": "c1",
                    "name": "Ada",
                    "phoneNumber": "5550000001",
                    "lastCallDetail": {
                        "_id": "d1",
                        "customerId": "c1",
                        "callId": "call_1",
                        "callStatus": "ended"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let rows = test_client(&server.uri())
            .list_contacts_with_last_call(&ProjectId::new("p1"))
            .await
            .unwrap();
        let detail = rows[0].last_call_detail.as_ref().unwrap();
        assert_eq!(detail.call_status, CallStatus::Ended);
    }

    #[tokio::test]
    async fn llm_accepts_bare_resource() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/retell/llms/llm_9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "llm_id": "llm_9",
                "general_prompt": "Be brief",
                "model": "gpt-4o"
            })))
            .mount(&server)
            .await;

        let llm = test_client(&server.uri())
            .get_llm(&LlmId::new("llm_9"))
            .await
            .unwrap();
        assert_eq!(llm.general_prompt.as_deref(), Some("Be brief"));
    }

    #[tokio::test]
    async fn remove_member_sends_json_body_with_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/search-groups/g1/customers"))
            .and(body_json(json!({"customerId": "c1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {"_id": "g1", "name": "Leads"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let group = test_client(&server.uri())
            .remove_group_member(&SearchGroupId::new("g1"), &ContactId::new("c1"))
            .await
            .unwrap();
        assert!(group.customers.is_empty());
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/customers/c1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        test_client(&server.uri())
            .delete_contact(&ContactId::new("c1"))
            .await
            .unwrap();
    }

    #[test]
    fn session_debug_redacts_token() {
        let rendered = format!("{:?}", Session::new("secret"));
        assert!(!rendered.contains("secret"));
    }
}
