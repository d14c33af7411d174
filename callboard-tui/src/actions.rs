//! Key handling and the operations behind each binding.
//!
//! Everything here runs on the event loop and mutates [`App`] directly.
//! Backend failures are reported through [`App::report`] and never abort
//! the loop.

use std::time::Instant;

use callboard_core::{
    BackendResult, BulkMembers, CallboardError, ContactWithLastCall, ExternalMember, FlowId,
    FlowUpdate, GroupSettingsInput, LlmUpdate, NewFlow, NewProject, NewSearchGroup, ProjectId,
    ProjectStatus, ProjectUpdate, SearchGroupId, SearchGroupUpdate, ValidationError,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::dispatcher::{dispatch_calls, DispatchError};
use crate::events::TuiEvent;
use crate::importer::{import_group, ImportError};
use crate::keys::{map_key, Action};
use crate::nav::View;
use crate::notifications::NotificationLevel;
use crate::poller::{spawn_poll_fetch, PollGeneration, StopReason, TickDecision};
use crate::prompt::{
    parse_bulk_members, BulkMemberEditor, InputPrompt, LlmPromptEditor, PendingDelete,
    PromptField, PromptKind, PromptOutcome,
};
use crate::roster::{save_drafts, SaveError};
use crate::state::{App, CallScope, GroupPane, Mode, RosterPane};

/// Handle one key press. Returns `true` when the app should quit.
pub async fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    if app.modal.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
            app.modal = None;
        }
        return false;
    }
    if app.show_help {
        app.show_help = false;
        return false;
    }

    match std::mem::take(&mut app.mode) {
        Mode::Normal => {
            if let Some(action) = map_key(key) {
                return handle_action(app, action).await;
            }
        }
        Mode::Prompt(mut prompt) => match prompt.handle_key(key) {
            PromptOutcome::Continue => app.mode = Mode::Prompt(prompt),
            PromptOutcome::Cancel => {}
            PromptOutcome::Submit => submit_prompt(app, prompt).await,
        },
        Mode::Confirm(pending) => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => confirm_delete(app, pending).await,
            KeyCode::Char('n') | KeyCode::Esc => {}
            _ => app.mode = Mode::Confirm(pending),
        },
        Mode::LlmPrompt(mut editor) => match editor_key(key) {
            EditorKey::Cancel => {}
            EditorKey::Save => save_llm_prompt(app, *editor).await,
            EditorKey::Input => {
                editor.textarea.input(key);
                app.mode = Mode::LlmPrompt(editor);
            }
        },
        Mode::BulkMembers(mut editor) => match editor_key(key) {
            EditorKey::Cancel => {}
            EditorKey::Save => submit_bulk_members(app, *editor).await,
            EditorKey::Input => {
                editor.textarea.input(key);
                app.mode = Mode::BulkMembers(editor);
            }
        },
    }
    false
}

enum EditorKey {
    Cancel,
    Save,
    Input,
}

fn editor_key(key: KeyEvent) -> EditorKey {
    match (key.code, key.modifiers.contains(KeyModifiers::CONTROL)) {
        (KeyCode::Esc, _) | (KeyCode::Char('c'), true) => EditorKey::Cancel,
        (KeyCode::Char('s'), true) => EditorKey::Save,
        _ => EditorKey::Input,
    }
}

/// Run a normal-mode action. Returns `true` when the app should quit.
pub async fn handle_action(app: &mut App, action: Action) -> bool {
    match action {
        Action::Quit => return true,
        Action::NextView => {
            let view = app.active_view.next();
            switch_view(app, view).await;
        }
        Action::PrevView => {
            let view = app.active_view.previous();
            switch_view(app, view).await;
        }
        Action::SwitchView(index) => {
            if let Some(view) = View::from_index(index) {
                switch_view(app, view).await;
            }
        }
        Action::MoveDown => app.select_next(),
        Action::MoveUp => app.select_previous(),
        Action::FocusLeft => app.cycle_focus(false),
        Action::FocusRight => app.cycle_focus(true),
        Action::OpenHelp => app.show_help = true,
        Action::Refresh => refresh_view(app).await,
        Action::Cancel => {
            app.notifications.pop();
        }
        other => match app.active_view {
            View::Projects => project_action(app, other).await,
            View::Roster => roster_action(app, other).await,
            View::CallDetails => {
                if other == Action::CycleStatus {
                    app.call_view.cycle_scope();
                    load_call_details(app).await;
                }
            }
            View::SearchGroups => group_action(app, other).await,
            View::Agents => agent_action(app, other).await,
        },
    }
    false
}

pub async fn switch_view(app: &mut App, view: View) {
    app.active_view = view;
    refresh_view(app).await;
}

/// Reload whatever the active view shows.
pub async fn refresh_view(app: &mut App) {
    match app.active_view {
        View::Projects => load_projects(app).await,
        View::Roster => {
            if app.active_project.is_some() {
                reload_roster(app).await;
            }
        }
        View::CallDetails => load_call_details(app).await,
        View::SearchGroups => {
            load_groups(app).await;
            if app.group_view.detail.is_some() {
                open_group(app).await;
            }
        }
        View::Agents => load_agents(app).await,
    }
}

// ============================================================================
// PROJECTS
// ============================================================================

async fn project_action(app: &mut App, action: Action) {
    match action {
        Action::Confirm => {
            if let Some(id) = app.project_view.selected.clone() {
                open_project(app, &id).await;
            }
        }
        Action::NewItem => {
            app.mode = Mode::Prompt(InputPrompt::new(
                PromptKind::NewProject,
                "New project",
                vec![PromptField::text("Name", ""), PromptField::text("Description", "")],
            ));
        }
        Action::EditItem => {
            if let Some(project) = app.project_view.selected_project() {
                app.mode = Mode::Prompt(InputPrompt::new(
                    PromptKind::EditProject(project.id.clone()),
                    format!("Edit {}", project.name),
                    vec![
                        PromptField::text("Name", project.name.clone()),
                        PromptField::text("Description", project.description.clone().unwrap_or_default()),
                    ],
                ));
            }
        }
        Action::CycleStatus => {
            if let Some(project) = app.project_view.selected_project() {
                let id = project.id.clone();
                let update = ProjectUpdate {
                    status: Some(project.status.next()),
                    ..ProjectUpdate::default()
                };
                update_project(app, &id, update).await;
            }
        }
        Action::DeleteItem => {
            if let Some(project) = app.project_view.selected_project() {
                app.mode = Mode::Confirm(PendingDelete::Project(project.id.clone(), project.name.clone()));
            }
        }
        _ => {}
    }
}

pub async fn load_projects(app: &mut App) {
    app.project_view.loading = true;
    match app.api.list_projects().await {
        Ok(projects) => app.project_view.replace_all(projects),
        Err(err) => app.report("Loading projects failed", &err),
    }
    app.project_view.loading = false;
}

/// Make `id` the active project and load its roster.
pub async fn open_project(app: &mut App, id: &ProjectId) {
    match app.api.get_project(id).await {
        Ok(Some(project)) => {
            if app.active_project_id() != Some(&project.id) {
                app.poller.stop();
                app.roster_view.clear();
                app.call_view = Default::default();
            }
            tracing::info!(project_id = %project.id, "Project opened");
            app.project_view.upsert(project.clone());
            app.active_project = Some(project);
            app.active_view = View::Roster;
            reload_roster(app).await;
        }
        Ok(None) => {
            app.project_view.remove(id);
            app.notify(NotificationLevel::Warning, format!("Project {} no longer exists", id));
        }
        Err(err) => app.report("Opening project failed", &err),
    }
}

async fn create_project(app: &mut App, project: NewProject) {
    match app.api.create_project(project).await {
        Ok(project) => {
            app.notify(NotificationLevel::Success, format!("Project '{}' created", project.name));
            app.project_view.upsert(project);
        }
        Err(err) => app.report("Creating project failed", &err),
    }
}

async fn update_project(app: &mut App, id: &ProjectId, update: ProjectUpdate) {
    match app.api.update_project(id, update).await {
        Ok(project) => {
            if app.active_project_id() == Some(&project.id) {
                app.active_project = Some(project.clone());
            }
            app.notify(NotificationLevel::Success, format!("Project '{}' updated", project.name));
            app.project_view.upsert(project);
        }
        Err(err) => app.report("Updating project failed", &err),
    }
}

// ============================================================================
// ROSTER
// ============================================================================

async fn roster_action(app: &mut App, action: Action) {
    match (action, app.roster_view.focus) {
        (Action::Save, _) => save_roster_drafts(app).await,
        (Action::StartCalls, _) => start_calls(app).await,
        (Action::AddRow, _) => {
            app.roster_view.draft_cursor = app.roster_view.editor.add_row();
            app.roster_view.focus = RosterPane::Drafts;
        }
        (Action::Select, RosterPane::Contacts) => {
            if let Some(id) = app.roster_view.selected.clone() {
                app.roster_view.roster.toggle_selection(&id);
            }
        }
        (Action::Confirm, RosterPane::Contacts) => {
            if let Some(entry) = app.roster_view.selected_entry() {
                app.call_view.focus_contact(entry.contact.clone());
                switch_view(app, View::CallDetails).await;
            }
        }
        (Action::DeleteItem, RosterPane::Contacts) => {
            if let Some(entry) = app.roster_view.selected_entry() {
                let contact = &entry.contact;
                app.mode = Mode::Confirm(PendingDelete::Contact(contact.id.clone(), contact.name.clone()));
            }
        }
        (Action::Confirm | Action::EditItem, RosterPane::Drafts) => {
            let index = app.roster_view.draft_cursor;
            if let Some(row) = app.roster_view.editor.rows().get(index) {
                app.mode = Mode::Prompt(InputPrompt::new(
                    PromptKind::DraftRow(index),
                    format!("Contact row {}", index + 1),
                    vec![PromptField::text("Name", row.name.clone()), PromptField::phone("Phone", &row.phone)],
                ));
            }
        }
        (Action::DeleteItem, RosterPane::Drafts) => {
            if app.roster_view.editor.remove_row(app.roster_view.draft_cursor) {
                app.roster_view.clamp();
            }
        }
        _ => {}
    }
}

/// Reload the active project's roster with each contact's last call.
pub async fn reload_roster(app: &mut App) {
    let Some(project_id) = app.active_project_id().cloned() else {
        app.notify(NotificationLevel::Warning, ValidationError::NoActiveProject.to_string());
        return;
    };
    app.roster_view.loading = true;
    match app.api.list_contacts_with_last_call(&project_id).await {
        Ok(rows) => {
            tracing::debug!(project_id = %project_id, count = rows.len(), "Roster reloaded");
            app.roster_view.roster.replace_all(rows);
            app.roster_view.clamp();
        }
        Err(err) => app.report("Loading roster failed", &err),
    }
    app.roster_view.loading = false;
}

pub async fn save_roster_drafts(app: &mut App) {
    let Some(project_id) = app.active_project_id().cloned() else {
        app.notify(NotificationLevel::Warning, ValidationError::NoActiveProject.to_string());
        return;
    };
    let result = save_drafts(app.api.as_ref(), &project_id, &mut app.roster_view.editor).await;
    app.roster_view.clamp();
    match result {
        Ok(saved) => {
            app.notify(NotificationLevel::Success, format!("Saved {} contact(s)", saved));
            reload_roster(app).await;
        }
        Err(SaveError::NoValidRows) => {
            app.notify(NotificationLevel::Warning, SaveError::NoValidRows.to_string());
        }
        Err(SaveError::Failed { saved, source }) => {
            app.report(&format!("Saved {} contact(s), then saving failed", saved), &source);
            if saved > 0 {
                reload_roster(app).await;
            }
        }
    }
}

pub async fn start_calls(app: &mut App) {
    let Some(project_id) = app.active_project_id().cloned() else {
        app.notify(NotificationLevel::Warning, ValidationError::NoActiveProject.to_string());
        return;
    };
    let result = dispatch_calls(
        app.api.as_ref(),
        &project_id,
        &mut app.roster_view.roster,
        &mut app.poller,
        Instant::now(),
    )
    .await;
    match result {
        Ok(outcome) => app.notify(
            NotificationLevel::Success,
            format!("Started {} call(s), watching for results", outcome.dispatched),
        ),
        Err(DispatchError::NothingSelected) => {
            app.notify(NotificationLevel::Warning, DispatchError::NothingSelected.to_string());
        }
        Err(DispatchError::Failed { dispatched, contact, source }) => {
            app.report(
                &format!("Started {} call(s), then calling {} failed", dispatched, contact),
                &source,
            );
        }
    }
}

// ============================================================================
// POLLING
// ============================================================================

/// Advance the reconciler on a poll tick, spawning a fetch when due.
pub fn on_poll_tick(app: &mut App, sender: &mpsc::Sender<TuiEvent>, now: Instant) {
    match app.poller.on_tick(now) {
        TickDecision::Fetch(generation) => match app.active_project_id().cloned() {
            Some(project_id) => {
                spawn_poll_fetch(app.api.clone(), project_id, generation, sender.clone())
            }
            None => {
                app.poller.on_fetch_failed(generation);
                app.poller.stop();
            }
        },
        TickDecision::SkipInFlight => {
            tracing::debug!("Previous poll still in flight, skipping tick");
        }
        TickDecision::Stopped(StopReason::CeilingReached) => {
            tracing::info!("Polling ceiling reached");
            app.notify(NotificationLevel::Info, "Stopped watching calls (time limit reached)");
        }
        TickDecision::Stopped(StopReason::AllSettled) | TickDecision::Idle => {}
    }
}

/// Merge a poll result into the roster.
pub fn on_poll_result(
    app: &mut App,
    project_id: ProjectId,
    generation: PollGeneration,
    result: BackendResult<Vec<ContactWithLastCall>>,
) {
    if app.active_project_id() != Some(&project_id) {
        tracing::debug!(project_id = %project_id, generation, "Dropping poll result for inactive project");
        app.poller.on_fetch_failed(generation);
        return;
    }
    match result {
        Ok(rows) => {
            let updated = app.roster_view.roster.merge_call_details(rows);
            let settled = app.roster_view.roster.all_settled();
            tracing::debug!(project_id = %project_id, updated, settled, "Poll result merged");
            if let Some(StopReason::AllSettled) = app.poller.on_merged(generation, settled) {
                tracing::info!(project_id = %project_id, "All calls settled, polling stopped");
                app.notify(NotificationLevel::Success, "All calls finished");
            }
        }
        Err(err) => {
            app.poller.on_fetch_failed(generation);
            if err.is_unauthorized() {
                app.session_expired();
            } else {
                tracing::warn!(project_id = %project_id, error = %err, "Poll fetch failed");
            }
        }
    }
}

// ============================================================================
// CALL DETAILS
// ============================================================================

pub async fn load_call_details(app: &mut App) {
    let project_id = app.active_project_id().cloned();
    let contact_id = app.call_view.contact.as_ref().map(|c| c.id.clone());
    let result = match (app.call_view.scope, project_id, contact_id) {
        (CallScope::ContactAllProjects, _, Some(contact_id)) => {
            app.api.call_details_for_contact(&contact_id).await
        }
        (CallScope::Contact, Some(project_id), Some(contact_id)) => {
            app.api
                .call_details_for_contact_in_project(&contact_id, &project_id)
                .await
        }
        (_, Some(project_id), _) => {
            app.call_view.scope = CallScope::Project;
            app.api.call_details_for_project(&project_id).await
        }
        (_, None, _) => {
            app.notify(NotificationLevel::Warning, ValidationError::NoActiveProject.to_string());
            return;
        }
    };
    match result {
        Ok(details) => app.call_view.replace_all(details),
        Err(err) => app.report("Loading call details failed", &err),
    }
}

// ============================================================================
// SEARCH GROUPS
// ============================================================================

async fn group_action(app: &mut App, action: Action) {
    let pane = app.group_view.pane;
    let Some(group) = app.group_view.current().cloned() else {
        if action == Action::NewItem {
            open_new_group_prompt(app);
        }
        return;
    };
    match (action, pane) {
        (Action::Confirm, _) => {
            open_group(app).await;
            if app.group_view.pane == GroupPane::Groups {
                app.group_view.pane = GroupPane::Members;
            }
        }
        (Action::NewItem, GroupPane::Groups) => open_new_group_prompt(app),
        (Action::NewItem, GroupPane::Members) => {
            app.mode = Mode::Prompt(InputPrompt::new(
                PromptKind::ExternalMember(group.id.clone()),
                format!("Add member to {}", group.name),
                vec![
                    PromptField::text("Name", ""),
                    PromptField::phone("Phone", ""),
                    PromptField::text("Note", ""),
                ],
            ));
        }
        (Action::NewItem, GroupPane::Projects) => link_active_project(app, &group.id).await,
        (Action::NewItem, GroupPane::Flows) => {
            app.mode = Mode::Prompt(InputPrompt::new(
                PromptKind::NewFlow(group.id.clone()),
                format!("New flow for {}", group.name),
                vec![PromptField::text("Name", ""), PromptField::text("Description", "")],
            ));
        }
        (Action::EditItem, GroupPane::Flows) => {
            if let Some(flow) = group.flows.get(app.group_view.flow_cursor) {
                app.mode = Mode::Prompt(InputPrompt::new(
                    PromptKind::EditFlow(group.id.clone(), flow.id.clone()),
                    format!("Edit flow {}", flow.name),
                    vec![
                        PromptField::text("Name", flow.name.clone()),
                        PromptField::text("Description", flow.description.clone().unwrap_or_default()),
                    ],
                ));
            }
        }
        (Action::EditItem, _) => {
            app.mode = Mode::Prompt(InputPrompt::new(
                PromptKind::EditGroup(group.id.clone()),
                format!("Edit {}", group.name),
                vec![
                    PromptField::text("Name", group.name.clone()),
                    PromptField::text("Description", group.description.clone().unwrap_or_default()),
                    PromptField::number("Max members", group.settings.max_customers.to_string()),
                ],
            ));
        }
        (Action::CycleStatus, GroupPane::Flows) => {
            if let Some(flow) = group.flows.get(app.group_view.flow_cursor) {
                let update = FlowUpdate {
                    status: Some(flow.status.next()),
                    ..FlowUpdate::default()
                };
                update_flow(app, &group.id, &flow.id, update).await;
            }
        }
        (Action::CycleStatus, _) => {
            let update = SearchGroupUpdate {
                status: Some(group.status.next()),
                ..SearchGroupUpdate::default()
            };
            update_group(app, &group.id, update).await;
        }
        (Action::DeleteItem, GroupPane::Groups) => {
            app.mode = Mode::Confirm(PendingDelete::Group(group.id.clone(), group.name.clone()));
        }
        (Action::DeleteItem, GroupPane::Members) => {
            if let Some(member) = group.customers.get(app.group_view.member_cursor) {
                match &member.id {
                    Some(contact_id) => {
                        app.mode = Mode::Confirm(PendingDelete::Member(
                            group.id.clone(),
                            contact_id.clone(),
                            member.name.clone(),
                        ));
                    }
                    None => app.notify(
                        NotificationLevel::Warning,
                        format!("{} has no contact record to remove", member.name),
                    ),
                }
            }
        }
        (Action::DeleteItem, GroupPane::Projects) => {
            if let Some(project) = group.projects.get(app.group_view.project_cursor) {
                app.mode = Mode::Confirm(PendingDelete::ProjectLink(
                    group.id.clone(),
                    project.id.clone(),
                    project.name.clone(),
                ));
            }
        }
        (Action::DeleteItem, GroupPane::Flows) => {
            if let Some(flow) = group.flows.get(app.group_view.flow_cursor) {
                app.mode = Mode::Confirm(PendingDelete::Flow(group.id.clone(), flow.id.clone(), flow.name.clone()));
            }
        }
        (Action::AddRow, _) => add_selected_contacts_to_group(app, &group.id).await,
        (Action::BulkAdd, _) => {
            app.mode = Mode::BulkMembers(Box::new(BulkMemberEditor::new(group.id.clone())));
        }
        (Action::Import, _) => import_into_active_project(app).await,
        _ => {}
    }
}

fn open_new_group_prompt(app: &mut App) {
    app.mode = Mode::Prompt(InputPrompt::new(
        PromptKind::NewGroup,
        "New search group",
        vec![
            PromptField::text("Name", ""),
            PromptField::text("Description", ""),
            PromptField::number("Max members", "1000"),
        ],
    ));
}

pub async fn load_groups(app: &mut App) {
    app.group_view.loading = true;
    match app.api.list_search_groups().await {
        Ok(groups) => app.group_view.replace_all(groups),
        Err(err) => app.report("Loading search groups failed", &err),
    }
    app.group_view.loading = false;
}

/// Load the selected group's members, stats and call details.
pub async fn open_group(app: &mut App) {
    let Some(id) = app.group_view.selected.clone() else {
        return;
    };
    match app.api.get_search_group(&id).await {
        Ok(group) => app.group_view.upsert(group),
        Err(err) => {
            app.report("Opening search group failed", &err);
            return;
        }
    }
    match app.api.group_stats(&id).await {
        Ok(stats) => app.group_view.stats = Some(stats),
        Err(err) => {
            app.group_view.stats = None;
            app.report("Loading group stats failed", &err);
        }
    }
    match app.api.group_call_details(&id).await {
        Ok(details) => app.group_view.call_details = details,
        Err(err) => app.report("Loading group call details failed", &err),
    }
}

async fn update_group(app: &mut App, id: &SearchGroupId, update: SearchGroupUpdate) {
    match app.api.update_search_group(id, update).await {
        Ok(group) => {
            app.notify(NotificationLevel::Success, format!("Group '{}' updated", group.name));
            app.group_view.upsert(group);
        }
        Err(err) => app.report("Updating search group failed", &err),
    }
}

async fn update_flow(
    app: &mut App,
    group_id: &SearchGroupId,
    flow_id: &FlowId,
    update: FlowUpdate,
) {
    match app.api.update_flow(group_id, flow_id, update).await {
        Ok(flow) => {
            app.notify(NotificationLevel::Success, format!("Flow '{}' updated", flow.name));
            open_group(app).await;
        }
        Err(err) => app.report("Updating flow failed", &err),
    }
}

async fn link_active_project(app: &mut App, group_id: &SearchGroupId) {
    let Some(project_id) = app.active_project_id().cloned() else {
        app.notify(NotificationLevel::Warning, ValidationError::NoActiveProject.to_string());
        return;
    };
    match app.api.link_project(group_id, &project_id).await {
        Ok(group) => {
            app.notify(NotificationLevel::Success, format!("Project linked to '{}'", group.name));
            app.group_view.upsert(group);
        }
        Err(err) => app.report("Linking project failed", &err),
    }
}

/// Add the roster's selected contacts to the group, one request each.
async fn add_selected_contacts_to_group(app: &mut App, group_id: &SearchGroupId) {
    let contacts: Vec<_> = app
        .roster_view
        .roster
        .selected_contacts()
        .into_iter()
        .map(|c| c.id.clone())
        .collect();
    if contacts.is_empty() {
        app.notify(NotificationLevel::Warning, ValidationError::NothingSelected.to_string());
        return;
    }
    let mut added = 0;
    for contact_id in contacts {
        match app.api.add_group_member(group_id, &contact_id).await {
            Ok(group) => {
                added += 1;
                app.group_view.upsert(group);
            }
            Err(err) => {
                app.report(&format!("Added {} member(s), then adding failed", added), &err);
                return;
            }
        }
    }
    app.notify(NotificationLevel::Success, format!("Added {} member(s)", added));
}

async fn submit_bulk_members(app: &mut App, editor: BulkMemberEditor) {
    let customers = match parse_bulk_members(&editor.text()) {
        Ok(members) => members,
        Err(err) => {
            app.notify(NotificationLevel::Warning, err.to_string());
            app.mode = Mode::BulkMembers(Box::new(editor));
            return;
        }
    };
    let count = customers.len();
    match app.api.add_bulk_members(&editor.group_id, BulkMembers { customers }).await {
        Ok(group) => {
            app.notify(NotificationLevel::Success, format!("Added {} member(s)", count));
            app.group_view.upsert(group);
        }
        Err(err) => {
            app.report("Adding members failed", &err);
            app.mode = Mode::BulkMembers(Box::new(editor));
        }
    }
}

pub async fn import_into_active_project(app: &mut App) {
    let Some(project_id) = app.active_project_id().cloned() else {
        app.notify(NotificationLevel::Warning, ValidationError::NoActiveProject.to_string());
        return;
    };
    let Some(group) = app.group_view.current().cloned() else {
        return;
    };
    match import_group(app.api.as_ref(), &group, &project_id).await {
        Ok(summary) => {
            let level = if summary.failed == 0 && summary.project_attached != Some(false) {
                NotificationLevel::Success
            } else {
                NotificationLevel::Warning
            };
            app.notify(level, summary.message());
            if let Ok(group) = app.api.get_search_group(&group.id).await {
                app.group_view.upsert(group);
            }
        }
        Err(ImportError::Validation(err)) => app.notify(NotificationLevel::Warning, err.to_string()),
    }
}

// ============================================================================
// AGENTS
// ============================================================================

async fn agent_action(app: &mut App, action: Action) {
    match action {
        Action::Confirm => open_agent(app).await,
        Action::EditItem => {
            let (Some(agent), Some(llm)) = (&app.agent_view.agent, &app.agent_view.llm) else {
                app.notify(NotificationLevel::Info, "Open an agent with an LLM first");
                return;
            };
            app.mode = Mode::LlmPrompt(Box::new(LlmPromptEditor::new(
                agent.agent_id.clone(),
                llm.llm_id.clone(),
                llm.model.clone(),
                agent.language.clone(),
                llm.general_prompt.as_deref().unwrap_or_default(),
            )));
        }
        _ => {}
    }
}

pub async fn load_agents(app: &mut App) {
    app.agent_view.loading = true;
    match app.api.list_agents().await {
        Ok(agents) => app.agent_view.replace_all(agents),
        Err(err) => app.report("Loading agents failed", &err),
    }
    app.agent_view.loading = false;
}

pub async fn open_agent(app: &mut App) {
    let Some(id) = app.agent_view.selected.clone() else {
        return;
    };
    let agent = match app.api.get_agent(&id).await {
        Ok(agent) => agent,
        Err(err) => {
            app.report("Opening agent failed", &err);
            return;
        }
    };
    app.agent_view.llm = None;
    if let Some(llm_id) = agent.llm_id().cloned() {
        match app.api.get_llm(&llm_id).await {
            Ok(llm) => app.agent_view.llm = Some(llm),
            Err(err) => app.report("Loading agent LLM failed", &err),
        }
    }
    app.agent_view.agent = Some(agent);
}

async fn save_llm_prompt(app: &mut App, editor: LlmPromptEditor) {
    let update = LlmUpdate {
        general_prompt: editor.text(),
        model: editor.model.clone(),
        language: editor.language.clone(),
        agent_id: editor.agent_id.clone(),
    };
    match app.api.update_llm(&editor.llm_id, update).await {
        Ok(llm) => {
            tracing::info!(llm_id = %llm.llm_id, "Agent prompt saved");
            app.notify(NotificationLevel::Success, "Prompt saved");
            app.agent_view.llm = Some(llm);
        }
        Err(err) => {
            app.report("Saving prompt failed", &err);
            app.mode = Mode::LlmPrompt(Box::new(editor));
        }
    }
}

// ============================================================================
// PROMPTS AND CONFIRMATIONS
// ============================================================================

async fn submit_prompt(app: &mut App, prompt: InputPrompt) {
    if let Err(err) = apply_prompt(app, &prompt).await {
        match err {
            CallboardError::Validation(err) => {
                app.notify(NotificationLevel::Warning, err.to_string());
                app.mode = Mode::Prompt(prompt);
            }
            CallboardError::Backend(err) => app.report(&prompt.title, &err),
        }
    }
}

async fn apply_prompt(app: &mut App, prompt: &InputPrompt) -> Result<(), CallboardError> {
    match &prompt.kind {
        PromptKind::NewProject => {
            let project = NewProject {
                name: prompt.required(0)?,
                description: prompt.optional(1),
                status: ProjectStatus::Active,
            };
            create_project(app, project).await;
        }
        PromptKind::EditProject(id) => {
            let update = ProjectUpdate {
                name: Some(prompt.required(0)?),
                description: prompt.optional(1),
                status: None,
            };
            update_project(app, id, update).await;
        }
        PromptKind::DraftRow(index) => {
            app.roster_view.editor.set_name(*index, prompt.value(0));
            app.roster_view.editor.set_phone(*index, prompt.value(1));
        }
        PromptKind::NewGroup => {
            let group = NewSearchGroup {
                name: prompt.required(0)?,
                description: prompt.optional(1),
                settings: Some(settings_from(prompt, 2)?),
            };
            let created = app.api.create_search_group(group).await?;
            app.notify(NotificationLevel::Success, format!("Group '{}' created", created.name));
            app.group_view.upsert(created);
        }
        PromptKind::EditGroup(id) => {
            let update = SearchGroupUpdate {
                name: Some(prompt.required(0)?),
                description: prompt.optional(1),
                status: None,
                settings: Some(settings_from(prompt, 2)?),
            };
            update_group(app, id, update).await;
        }
        PromptKind::ExternalMember(id) => {
            let member = ExternalMember {
                name: prompt.required(0)?,
                phone_number: prompt.required(1)?,
                note: prompt.optional(2),
                record: None,
            };
            let group = app.api.add_external_member(id, member).await?;
            app.notify(NotificationLevel::Success, "Member added");
            app.group_view.upsert(group);
        }
        PromptKind::NewFlow(id) => {
            let flow = NewFlow {
                name: prompt.required(0)?,
                description: prompt.optional(1),
            };
            let flow = app.api.add_flow(id, flow).await?;
            app.notify(NotificationLevel::Success, format!("Flow '{}' added", flow.name));
            open_group(app).await;
        }
        PromptKind::EditFlow(group_id, flow_id) => {
            let update = FlowUpdate {
                name: Some(prompt.required(0)?),
                description: prompt.optional(1),
                status: None,
            };
            update_flow(app, group_id, flow_id, update).await;
        }
    }
    Ok(())
}

fn settings_from(prompt: &InputPrompt, index: usize) -> Result<GroupSettingsInput, ValidationError> {
    let max_customers = match prompt.optional(index) {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| ValidationError::InvalidValue {
            field: "Max members".to_string(),
            reason: "must be a number".to_string(),
        })?),
        None => None,
    };
    Ok(GroupSettingsInput {
        max_customers,
        ..GroupSettingsInput::default()
    })
}

async fn confirm_delete(app: &mut App, pending: PendingDelete) {
    let api = app.api.clone();
    match pending {
        PendingDelete::Project(id, name) => match api.delete_project(&id).await {
            Ok(()) => {
                app.project_view.remove(&id);
                if app.active_project_id() == Some(&id) {
                    app.active_project = None;
                    app.poller.stop();
                    app.roster_view.clear();
                    app.call_view = Default::default();
                }
                app.notify(NotificationLevel::Success, format!("Project '{}' deleted", name));
            }
            Err(err) => app.report("Deleting project failed", &err),
        },
        PendingDelete::Contact(id, name) => match api.delete_contact(&id).await {
            Ok(()) => {
                app.roster_view.roster.remove_contact(&id);
                app.roster_view.clamp();
                app.notify(NotificationLevel::Success, format!("Contact '{}' deleted", name));
            }
            Err(err) => app.report("Deleting contact failed", &err),
        },
        PendingDelete::Group(id, name) => match api.delete_search_group(&id).await {
            Ok(()) => {
                app.group_view.remove(&id);
                app.notify(NotificationLevel::Success, format!("Group '{}' deleted", name));
            }
            Err(err) => app.report("Deleting search group failed", &err),
        },
        PendingDelete::Member(group_id, contact_id, name) => {
            match api.remove_group_member(&group_id, &contact_id).await {
                Ok(group) => {
                    app.group_view.upsert(group);
                    app.notify(NotificationLevel::Success, format!("'{}' removed from group", name));
                }
                Err(err) => app.report("Removing member failed", &err),
            }
        }
        PendingDelete::ProjectLink(group_id, project_id, name) => {
            match api.unlink_project(&group_id, &project_id).await {
                Ok(group) => {
                    app.group_view.upsert(group);
                    app.notify(NotificationLevel::Success, format!("Project '{}' unlinked", name));
                }
                Err(err) => app.report("Unlinking project failed", &err),
            }
        }
        PendingDelete::Flow(group_id, flow_id, name) => match api.remove_flow(&group_id, &flow_id).await {
            Ok(()) => {
                app.notify(NotificationLevel::Success, format!("Flow '{}' deleted", name));
                open_group(app).await;
            }
            Err(err) => app.report("Deleting flow failed", &err),
        },
    }
}
