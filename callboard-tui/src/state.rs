//! Application state and view state definitions.

use std::sync::Arc;

use callboard_core::{
    Agent, AgentId, BackendError, CallCenterApi, CallDetail, CallDetailId, Contact, ContactId,
    Llm, Project, ProjectId, SearchGroup, SearchGroupId, SearchGroupStats,
};

use crate::config::TuiConfig;
use crate::nav::View;
use crate::notifications::{Notification, NotificationAction, NotificationLevel};
use crate::persistence::PersistedState;
use crate::poller::PollingReconciler;
use crate::prompt::{BulkMemberEditor, InputPrompt, LlmPromptEditor, PendingDelete};
use crate::roster::{Roster, RosterEditor, RosterEntry};
use crate::theme::SynthBruteTheme;

/// Notifications kept for the footer.
const NOTIFICATION_HISTORY: usize = 50;

pub struct App {
    pub config: TuiConfig,
    pub theme: SynthBruteTheme,
    pub api: Arc<dyn CallCenterApi>,
    pub active_view: View,
    pub active_project: Option<Project>,
    pub session_token: Option<String>,

    pub project_view: ProjectViewState,
    pub roster_view: RosterViewState,
    pub call_view: CallViewState,
    pub group_view: GroupViewState,
    pub agent_view: AgentViewState,

    pub poller: PollingReconciler,
    pub mode: Mode,
    pub show_help: bool,
    pub notifications: Vec<Notification>,
    pub modal: Option<Modal>,
}

impl App {
    pub fn new(config: TuiConfig, api: Arc<dyn CallCenterApi>) -> Self {
        let poller = PollingReconciler::new(config.poll_interval(), config.poll_ceiling());
        Self {
            theme: SynthBruteTheme::synthbrute(),
            config,
            api,
            active_view: View::default(),
            active_project: None,
            session_token: None,
            project_view: ProjectViewState::new(),
            roster_view: RosterViewState::new(),
            call_view: CallViewState::new(),
            group_view: GroupViewState::new(),
            agent_view: AgentViewState::new(),
            poller,
            mode: Mode::Normal,
            show_help: false,
            notifications: Vec::new(),
            modal: None,
        }
    }

    pub fn active_project_id(&self) -> Option<&ProjectId> {
        self.active_project.as_ref().map(|p| &p.id)
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
        if self.notifications.len() > NOTIFICATION_HISTORY {
            let excess = self.notifications.len() - NOTIFICATION_HISTORY;
            self.notifications.drain(..excess);
        }
    }

    /// Log a failed backend call and surface it in the footer. A 401 ends
    /// the session instead.
    pub fn report(&mut self, context: &str, error: &BackendError) {
        if error.is_unauthorized() {
            self.session_expired();
            return;
        }
        tracing::warn!(context, error = %error, "Backend request failed");
        self.notify(NotificationLevel::Error, format!("{}: {}", context, error));
    }

    pub fn session_expired(&mut self) {
        tracing::warn!("Session rejected by backend, clearing token");
        self.session_token = None;
        self.poller.stop();
        self.notifications.push(
            Notification::new(NotificationLevel::Error, "Session expired")
                .with_action(NotificationAction::Login),
        );
        self.modal = Some(Modal {
            title: "Session expired".to_string(),
            message: "The backend rejected the session token. Restart callboard to log in again."
                .to_string(),
        });
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            active_view: self.active_view,
            active_project_id: self.active_project_id().cloned(),
            session_token: self.session_token.clone(),
        }
    }

    pub fn select_next(&mut self) {
        match self.active_view {
            View::Projects => select_next_id(&self.project_view.projects, &mut self.project_view.selected),
            View::Roster => self.roster_view.move_cursor(true),
            View::CallDetails => select_next_id(&self.call_view.details, &mut self.call_view.selected),
            View::SearchGroups => self.group_view.move_cursor(true),
            View::Agents => select_next_id(&self.agent_view.agents, &mut self.agent_view.selected),
        }
    }

    pub fn select_previous(&mut self) {
        match self.active_view {
            View::Projects => select_prev_id(&self.project_view.projects, &mut self.project_view.selected),
            View::Roster => self.roster_view.move_cursor(false),
            View::CallDetails => select_prev_id(&self.call_view.details, &mut self.call_view.selected),
            View::SearchGroups => self.group_view.move_cursor(false),
            View::Agents => select_prev_id(&self.agent_view.agents, &mut self.agent_view.selected),
        }
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        match self.active_view {
            View::Roster => self.roster_view.focus = self.roster_view.focus.toggle(),
            View::SearchGroups => {
                let pane = self.group_view.pane;
                self.group_view.pane = if forward { pane.next() } else { pane.previous() };
            }
            _ => {}
        }
    }
}

/// Input routing. Anything but `Normal` captures the keyboard.
#[derive(Debug, Default)]
pub enum Mode {
    #[default]
    Normal,
    Prompt(InputPrompt),
    Confirm(PendingDelete),
    LlmPrompt(Box<LlmPromptEditor>),
    BulkMembers(Box<BulkMemberEditor>),
}

#[derive(Debug, Clone)]
pub struct Modal {
    pub title: String,
    pub message: String,
}

// ============================================================================
// SELECTION HELPERS
// ============================================================================

fn select_next_id<T: HasKey>(items: &[T], selected: &mut Option<T::Key>) {
    if items.is_empty() {
        *selected = None;
        return;
    }
    let next = selected
        .as_ref()
        .and_then(|id| items.iter().position(|item| item.key() == id))
        .map_or(0, |index| (index + 1) % items.len());
    *selected = Some(items[next].key().clone());
}

fn select_prev_id<T: HasKey>(items: &[T], selected: &mut Option<T::Key>) {
    if items.is_empty() {
        *selected = None;
        return;
    }
    let index = selected
        .as_ref()
        .and_then(|id| items.iter().position(|item| item.key() == id))
        .unwrap_or(0);
    let prev = if index == 0 { items.len() - 1 } else { index - 1 };
    *selected = Some(items[prev].key().clone());
}

fn step_cursor(cursor: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        0
    } else if forward {
        (cursor + 1) % len
    } else if cursor == 0 || cursor >= len {
        len - 1
    } else {
        cursor - 1
    }
}

pub(crate) trait HasKey {
    type Key: PartialEq + Clone;
    fn key(&self) -> &Self::Key;
}

impl HasKey for Project {
    type Key = ProjectId;
    fn key(&self) -> &ProjectId {
        &self.id
    }
}

impl HasKey for RosterEntry {
    type Key = ContactId;
    fn key(&self) -> &ContactId {
        &self.contact.id
    }
}

impl HasKey for CallDetail {
    type Key = CallDetailId;
    fn key(&self) -> &CallDetailId {
        &self.id
    }
}

impl HasKey for SearchGroup {
    type Key = SearchGroupId;
    fn key(&self) -> &SearchGroupId {
        &self.id
    }
}

impl HasKey for Agent {
    type Key = AgentId;
    fn key(&self) -> &AgentId {
        &self.agent_id
    }
}

pub(crate) fn position_of<T: HasKey>(items: &[T], selected: Option<&T::Key>) -> Option<usize> {
    let selected = selected?;
    items.iter().position(|item| item.key() == selected)
}

// ============================================================================
// VIEW STATE DEFINITIONS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ProjectViewState {
    pub projects: Vec<Project>,
    pub selected: Option<ProjectId>,
    pub loading: bool,
}

impl ProjectViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        let id = self.selected.as_ref()?;
        self.projects.iter().find(|p| &p.id == id)
    }

    pub fn replace_all(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        if position_of(&self.projects, self.selected.as_ref()).is_none() {
            self.selected = self.projects.first().map(|p| p.id.clone());
        }
    }

    pub fn upsert(&mut self, project: Project) {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project,
            None => {
                self.selected = Some(project.id.clone());
                self.projects.push(project);
            }
        }
    }

    pub fn remove(&mut self, id: &ProjectId) {
        self.projects.retain(|p| &p.id != id);
        if self.selected.as_ref() == Some(id) {
            self.selected = self.projects.first().map(|p| p.id.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RosterPane {
    #[default]
    Contacts,
    Drafts,
}

impl RosterPane {
    pub fn toggle(self) -> Self {
        match self {
            RosterPane::Contacts => RosterPane::Drafts,
            RosterPane::Drafts => RosterPane::Contacts,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RosterViewState {
    pub roster: Roster,
    pub editor: RosterEditor,
    pub focus: RosterPane,
    pub selected: Option<ContactId>,
    pub draft_cursor: usize,
    pub loading: bool,
}

impl RosterViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_entry(&self) -> Option<&RosterEntry> {
        self.roster.get(self.selected.as_ref()?)
    }

    pub fn move_cursor(&mut self, forward: bool) {
        match self.focus {
            RosterPane::Contacts if forward => select_next_id(self.roster.entries(), &mut self.selected),
            RosterPane::Contacts => select_prev_id(self.roster.entries(), &mut self.selected),
            RosterPane::Drafts => {
                self.draft_cursor = step_cursor(self.draft_cursor, self.editor.len(), forward);
            }
        }
    }

    /// Keep the cursors inside their lists after a change.
    pub fn clamp(&mut self) {
        if position_of(self.roster.entries(), self.selected.as_ref()).is_none() {
            self.selected = self.roster.entries().first().map(|e| e.contact.id.clone());
        }
        if self.draft_cursor >= self.editor.len() {
            self.draft_cursor = self.editor.len().saturating_sub(1);
        }
    }

    pub fn clear(&mut self) {
        self.roster.clear();
        self.selected = None;
    }
}

/// Which call history the call view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallScope {
    /// Every call in the active project.
    #[default]
    Project,
    /// One contact's calls in the active project.
    Contact,
    /// One contact's calls across all projects.
    ContactAllProjects,
}

impl CallScope {
    pub fn label(&self) -> &'static str {
        match self {
            CallScope::Project => "project",
            CallScope::Contact => "contact in project",
            CallScope::ContactAllProjects => "contact, all projects",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallViewState {
    pub contact: Option<Contact>,
    pub scope: CallScope,
    pub details: Vec<CallDetail>,
    pub selected: Option<CallDetailId>,
    pub loading: bool,
}

impl CallViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_detail(&self) -> Option<&CallDetail> {
        let id = self.selected.as_ref()?;
        self.details.iter().find(|d| &d.id == id)
    }

    /// Newest first.
    pub fn replace_all(&mut self, mut details: Vec<CallDetail>) {
        details.sort_by(|a, b| b.freshness().cmp(&a.freshness()));
        self.details = details;
        if position_of(&self.details, self.selected.as_ref()).is_none() {
            self.selected = self.details.first().map(|d| d.id.clone());
        }
    }

    pub fn focus_contact(&mut self, contact: Contact) {
        self.contact = Some(contact);
        self.scope = CallScope::Contact;
        self.details.clear();
        self.selected = None;
    }

    /// Cycle the scope; the contact scopes need a focused contact.
    pub fn cycle_scope(&mut self) {
        self.scope = match (self.scope, self.contact.is_some()) {
            (CallScope::Project, true) => CallScope::Contact,
            (CallScope::Contact, _) => CallScope::ContactAllProjects,
            _ => CallScope::Project,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupPane {
    #[default]
    Groups,
    Members,
    Projects,
    Flows,
}

impl GroupPane {
    pub fn title(&self) -> &'static str {
        match self {
            GroupPane::Groups => "Groups",
            GroupPane::Members => "Members",
            GroupPane::Projects => "Projects",
            GroupPane::Flows => "Flows",
        }
    }

    pub fn all() -> &'static [GroupPane] {
        &[GroupPane::Groups, GroupPane::Members, GroupPane::Projects, GroupPane::Flows]
    }

    pub fn next(self) -> Self {
        let all = Self::all();
        let index = all.iter().position(|p| *p == self).unwrap_or(0);
        all[(index + 1) % all.len()]
    }

    pub fn previous(self) -> Self {
        let all = Self::all();
        let index = all.iter().position(|p| *p == self).unwrap_or(0);
        all[if index == 0 { all.len() - 1 } else { index - 1 }]
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupViewState {
    pub groups: Vec<SearchGroup>,
    pub selected: Option<SearchGroupId>,
    /// Fully loaded group shown in the detail panes.
    pub detail: Option<SearchGroup>,
    pub stats: Option<SearchGroupStats>,
    pub call_details: Vec<CallDetail>,
    pub pane: GroupPane,
    pub member_cursor: usize,
    pub project_cursor: usize,
    pub flow_cursor: usize,
    pub loading: bool,
}

impl GroupViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_group(&self) -> Option<&SearchGroup> {
        let id = self.selected.as_ref()?;
        self.groups.iter().find(|g| &g.id == id)
    }

    /// Loaded detail, falling back to the list entry.
    pub fn current(&self) -> Option<&SearchGroup> {
        match &self.detail {
            Some(detail) if Some(&detail.id) == self.selected.as_ref() => Some(detail),
            _ => self.selected_group(),
        }
    }

    pub fn replace_all(&mut self, groups: Vec<SearchGroup>) {
        self.groups = groups;
        if position_of(&self.groups, self.selected.as_ref()).is_none() {
            self.selected = self.groups.first().map(|g| g.id.clone());
        }
    }

    /// Store a group returned by a mutation, in the list and the detail.
    pub fn upsert(&mut self, group: SearchGroup) {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group.clone(),
            None => self.groups.push(group.clone()),
        }
        self.selected = Some(group.id.clone());
        self.detail = Some(group);
        self.clamp();
    }

    pub fn remove(&mut self, id: &SearchGroupId) {
        self.groups.retain(|g| &g.id != id);
        if self.detail.as_ref().map(|d| &d.id) == Some(id) {
            self.detail = None;
            self.stats = None;
            self.call_details.clear();
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = self.groups.first().map(|g| g.id.clone());
        }
        self.pane = GroupPane::Groups;
    }

    pub fn move_cursor(&mut self, forward: bool) {
        let (members, projects, flows) = self
            .current()
            .map(|g| (g.customers.len(), g.projects.len(), g.flows.len()))
            .unwrap_or((0, 0, 0));
        match self.pane {
            GroupPane::Groups => {
                let before = self.selected.clone();
                if forward {
                    select_next_id(&self.groups, &mut self.selected);
                } else {
                    select_prev_id(&self.groups, &mut self.selected);
                }
                if before != self.selected {
                    self.member_cursor = 0;
                    self.project_cursor = 0;
                    self.flow_cursor = 0;
                }
            }
            GroupPane::Members => self.member_cursor = step_cursor(self.member_cursor, members, forward),
            GroupPane::Projects => self.project_cursor = step_cursor(self.project_cursor, projects, forward),
            GroupPane::Flows => self.flow_cursor = step_cursor(self.flow_cursor, flows, forward),
        }
    }

    fn clamp(&mut self) {
        let (members, projects, flows) = self
            .current()
            .map(|g| (g.customers.len(), g.projects.len(), g.flows.len()))
            .unwrap_or((0, 0, 0));
        self.member_cursor = self.member_cursor.min(members.saturating_sub(1));
        self.project_cursor = self.project_cursor.min(projects.saturating_sub(1));
        self.flow_cursor = self.flow_cursor.min(flows.saturating_sub(1));
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgentViewState {
    pub agents: Vec<Agent>,
    pub selected: Option<AgentId>,
    /// Agent opened with Enter, with its LLM when it has one.
    pub agent: Option<Agent>,
    pub llm: Option<Llm>,
    pub loading: bool,
}

impl AgentViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, agents: Vec<Agent>) {
        self.agents = agents;
        if position_of(&self.agents, self.selected.as_ref()).is_none() {
            self.selected = self.agents.first().map(|a| a.agent_id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::EntityIdType;
    use callboard_test_utils::fixtures;

    #[test]
    fn test_selection_wraps_both_ways() {
        let items = vec![fixtures::project("p1", "A"), fixtures::project("p2", "B")];
        let mut selected = None;

        select_next_id(&items, &mut selected);
        assert_eq!(selected, Some(ProjectId::new("p1")));
        select_next_id(&items, &mut selected);
        select_next_id(&items, &mut selected);
        assert_eq!(selected, Some(ProjectId::new("p1")));
        select_prev_id(&items, &mut selected);
        assert_eq!(selected, Some(ProjectId::new("p2")));
    }

    #[test]
    fn test_group_upsert_updates_detail_and_list() {
        let mut state = GroupViewState::new();
        state.replace_all(vec![fixtures::search_group("g1", "Leads")]);
        let mut renamed = fixtures::search_group("g1", "Hot leads");
        renamed.customers.push(fixtures::external_member("Ada", "5550000001"));

        state.upsert(renamed);

        assert_eq!(state.groups[0].name, "Hot leads");
        assert_eq!(state.current().map(|g| g.customers.len()), Some(1));
    }

    #[test]
    fn test_call_scope_needs_contact() {
        let mut state = CallViewState::new();
        state.cycle_scope();
        assert_eq!(state.scope, CallScope::Project);

        state.focus_contact(fixtures::contact("c1", "Ada", "5550000001", None));
        assert_eq!(state.scope, CallScope::Contact);
        state.cycle_scope();
        assert_eq!(state.scope, CallScope::ContactAllProjects);
        state.cycle_scope();
        assert_eq!(state.scope, CallScope::Project);
    }

    #[test]
    fn test_call_details_sorted_newest_first() {
        let mut state = CallViewState::new();
        let mut old = fixtures::call_detail("d1", "c1", callboard_core::CallStatus::Ended);
        old.updated_at = Some(fixtures::at(1));
        let mut new = fixtures::call_detail("d2", "c1", callboard_core::CallStatus::Ended);
        new.updated_at = Some(fixtures::at(2));

        state.replace_all(vec![old, new]);

        assert_eq!(state.details[0].id, CallDetailId::new("d2"));
        assert_eq!(state.selected, Some(CallDetailId::new("d2")));
    }
}
