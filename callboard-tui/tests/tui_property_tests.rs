use std::sync::Arc;
use std::time::{Duration, Instant};

use callboard_core::{BackendError, CallStatus, ContactStatus, EntityIdType, ProjectId};
use callboard_test_utils::{fixtures, MockBackend};
use callboard_tui::actions;
use callboard_tui::config::{AuthConfig, LoggingConfig, PollingConfig, ThemeConfig, TuiConfig};
use callboard_tui::events::TuiEvent;
use callboard_tui::keys::{map_key, Action};
use callboard_tui::nav::View;
use callboard_tui::notifications::NotificationLevel;
use callboard_tui::state::{App, GroupPane, Mode};
use callboard_tui::theme::{call_status_color, contact_status_color, SynthBruteTheme};
use callboard_tui::views::render_view;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use proptest::prelude::*;
use ratatui::{backend::TestBackend, Terminal};
use tokio::sync::mpsc;

fn base_config() -> TuiConfig {
    TuiConfig {
        api_base_url: "http://localhost:8080".to_string(),
        auth: AuthConfig {
            token: Some("test-token".to_string()),
            email: None,
            password: None,
        },
        request_timeout_ms: 5_000,
        refresh_interval_ms: 250,
        persistence_path: "tmp/callboard.json".into(),
        log_path: "tmp/callboard.log".into(),
        polling: PollingConfig {
            interval_ms: 1_000,
            ceiling_ms: 60_000,
        },
        logging: LoggingConfig {
            filter: "info".to_string(),
            json: false,
        },
        theme: ThemeConfig {
            name: "synthbrute".to_string(),
        },
    }
}

fn app_with(api: &MockBackend) -> App {
    App::new(base_config(), Arc::new(api.clone()))
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    }
}

fn last_message(app: &App) -> String {
    app.notifications
        .last()
        .map(|n| n.message.clone())
        .unwrap_or_default()
}

/// Open `project_id` and enter two draft rows.
async fn roster_with_drafts(api: &MockBackend, project_id: &ProjectId) -> App {
    let mut app = app_with(api);
    actions::open_project(&mut app, project_id).await;
    app.roster_view.editor.set_name(0, "Ada");
    app.roster_view.editor.set_phone(0, "(555) 000-0001");
    app.roster_view.editor.set_name(1, "Grace");
    app.roster_view.editor.set_phone(1, "555.000.0002");
    app
}

#[test]
fn config_requires_auth() {
    let mut config = base_config();
    config.auth = AuthConfig {
        token: None,
        email: None,
        password: None,
    };
    assert!(config.validate().is_err());
}

#[test]
fn config_requires_known_theme() {
    let mut config = base_config();
    config.theme = ThemeConfig {
        name: "unknown".to_string(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn base_config_is_valid() {
    base_config().validate().unwrap();
}

proptest! {
    #[test]
    fn keybinding_digit_switches_view(digit in 0u8..=9u8) {
        let ch = char::from(b'0' + digit);
        let action = map_key(key(KeyCode::Char(ch)));
        let expected = match ch {
            '1'..='9' => Some(Action::SwitchView(ch as usize - '1' as usize)),
            _ => None,
        };
        prop_assert_eq!(action, expected);
    }

    #[test]
    fn switch_view_index_resolves_only_known_views(index in 0usize..9) {
        let view = View::from_index(index);
        prop_assert_eq!(view.is_some(), index < View::all().len());
    }

    #[test]
    fn view_cycle_returns_home(steps in 0usize..20) {
        let mut view = View::default();
        for _ in 0..steps {
            view = view.next();
        }
        for _ in 0..steps {
            view = view.previous();
        }
        prop_assert_eq!(view, View::default());
    }

    #[test]
    fn call_status_color_follows_contact_status(status in prop_oneof![
        Just(CallStatus::NotStarted),
        Just(CallStatus::InProgress),
        Just(CallStatus::Ended),
        Just(CallStatus::Failed),
    ]) {
        let theme = SynthBruteTheme::synthbrute();
        prop_assert_eq!(
            call_status_color(&status, &theme),
            contact_status_color(status.contact_status(), &theme)
        );
    }
}

#[test]
fn control_bindings_take_precedence() {
    let event = KeyEvent {
        code: KeyCode::Char('s'),
        modifiers: KeyModifiers::CONTROL,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    };
    assert_eq!(map_key(event), Some(Action::Save));
    assert_eq!(map_key(key(KeyCode::Char('c'))), Some(Action::StartCalls));
}

#[test]
fn unknown_call_status_has_its_own_color() {
    let theme = SynthBruteTheme::synthbrute();
    assert_eq!(
        call_status_color(&CallStatus::Unknown("voicemail".to_string()), &theme),
        theme.secondary
    );
    assert_eq!(contact_status_color(ContactStatus::Failed, &theme), theme.error);
}

#[tokio::test]
async fn save_select_dispatch_and_poll_until_settled() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    let mut app = roster_with_drafts(&api, &project.id).await;
    assert_eq!(app.active_view, View::Roster);

    actions::save_roster_drafts(&mut app).await;
    assert_eq!(api.requests_to("POST", "/customers").len(), 2);
    assert_eq!(app.roster_view.roster.len(), 2);
    assert!(app.roster_view.editor.valid_rows().is_empty());

    actions::handle_action(&mut app, Action::Select).await;
    actions::handle_action(&mut app, Action::MoveDown).await;
    actions::handle_action(&mut app, Action::Select).await;
    assert_eq!(app.roster_view.roster.selection_len(), 2);

    api.clear_journal();
    actions::handle_action(&mut app, Action::StartCalls).await;

    let phones: Vec<String> = api
        .started_calls()
        .into_iter()
        .map(|c| c.phone_number)
        .collect();
    assert_eq!(phones, vec!["5550000001", "5550000002"]);
    assert_eq!(api.requests_to("POST", "/retell/call").len(), 2);
    assert!(app.poller.is_polling());
    assert!(app.poller.take_rearmed());
    assert_eq!(app.roster_view.roster.selection_len(), 0);

    let contacts = api.contacts();
    for contact in &contacts {
        api.set_call_status(&contact.id, CallStatus::Ended);
    }

    let (tx, mut rx) = mpsc::channel(8);
    actions::on_poll_tick(&mut app, &tx, Instant::now());
    match rx.recv().await {
        Some(TuiEvent::PollResult {
            project_id,
            generation,
            result,
        }) => {
            actions::on_poll_result(&mut app, project_id, generation, result);
        }
        other => panic!("expected a poll result, got {:?}", other),
    }

    assert!(!app.poller.is_polling());
    assert!(app.roster_view.roster.all_settled());
    assert!(app
        .roster_view
        .roster
        .entries()
        .iter()
        .all(|e| e.display_status() == ContactStatus::Completed));
    assert_eq!(last_message(&app), "All calls finished");
}

#[tokio::test]
async fn poll_tick_skips_while_fetch_in_flight() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    let contact = api.seed_contact(&project.id, "Ada", "5550000001");
    let mut app = app_with(&api);
    actions::open_project(&mut app, &project.id).await;
    app.roster_view.roster.toggle_selection(&contact.id);
    actions::start_calls(&mut app).await;
    api.clear_journal();

    let (tx, mut rx) = mpsc::channel(8);
    let now = Instant::now();
    actions::on_poll_tick(&mut app, &tx, now);
    actions::on_poll_tick(&mut app, &tx, now + Duration::from_secs(1));

    let event = rx.recv().await;
    assert!(matches!(event, Some(TuiEvent::PollResult { .. })));
    assert!(rx.try_recv().is_err());
    assert_eq!(
        api.requests_to("GET", &format!("/customers/call-details?projectId={}", project.id))
            .len(),
        1
    );
}

#[tokio::test]
async fn poll_result_for_other_project_is_dropped() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    let contact = api.seed_contact(&project.id, "Ada", "5550000001");
    let mut app = app_with(&api);
    actions::open_project(&mut app, &project.id).await;

    let stale = fixtures::with_last_call(
        contact.clone(),
        Some(fixtures::call_detail("d-old", contact.id.as_str(), CallStatus::Failed)),
    );
    actions::on_poll_result(&mut app, ProjectId::new("other"), 1, Ok(vec![stale]));

    assert!(app.roster_view.roster.entries()[0].last_call.is_none());
}

#[tokio::test]
async fn late_result_from_previous_project_does_not_overlap_new_polling() {
    let api = MockBackend::new();
    let spring = api.seed_project("Spring campaign");
    let ada = api.seed_contact(&spring.id, "Ada", "5550000001");
    let autumn = api.seed_project("Autumn campaign");
    let grace = api.seed_contact(&autumn.id, "Grace", "5550000002");
    let mut app = app_with(&api);
    let (tx, mut rx) = mpsc::channel(8);
    let now = Instant::now();

    actions::open_project(&mut app, &spring.id).await;
    app.roster_view.roster.toggle_selection(&ada.id);
    actions::start_calls(&mut app).await;
    actions::on_poll_tick(&mut app, &tx, now);
    let spring_result = rx.recv().await;

    actions::open_project(&mut app, &autumn.id).await;
    app.roster_view.roster.toggle_selection(&grace.id);
    actions::start_calls(&mut app).await;
    assert!(app.poller.is_polling());
    api.clear_journal();

    // Spring's fetch has not been handled yet, so autumn waits.
    actions::on_poll_tick(&mut app, &tx, Instant::now());
    assert!(api.requests_to("GET", &format!("/customers/call-details?projectId={}", autumn.id)).is_empty());

    match spring_result {
        Some(TuiEvent::PollResult {
            project_id,
            generation,
            result,
        }) => {
            assert_eq!(project_id, spring.id);
            actions::on_poll_result(&mut app, project_id, generation, result);
        }
        other => panic!("expected a poll result, got {:?}", other),
    }
    assert!(app.poller.is_polling());

    actions::on_poll_tick(&mut app, &tx, Instant::now());
    match rx.recv().await {
        Some(TuiEvent::PollResult { project_id, .. }) => assert_eq!(project_id, autumn.id),
        other => panic!("expected a poll result, got {:?}", other),
    }
    assert_eq!(
        api.requests_to("GET", &format!("/customers/call-details?projectId={}", autumn.id))
            .len(),
        1
    );
}

#[tokio::test]
async fn dispatch_failure_keeps_selection_and_reports() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    let ada = api.seed_contact(&project.id, "Ada", "5550000001");
    let grace = api.seed_contact(&project.id, "Grace", "5550000002");
    api.fail_calls_to("5550000001", BackendError::Backend("no credit".to_string()));
    let mut app = app_with(&api);
    actions::open_project(&mut app, &project.id).await;
    app.roster_view.roster.toggle_selection(&ada.id);
    app.roster_view.roster.toggle_selection(&grace.id);

    actions::start_calls(&mut app).await;

    assert_eq!(api.requests_to("POST", "/retell/call").len(), 1);
    assert_eq!(app.roster_view.roster.selection_len(), 2);
    assert!(!app.poller.is_polling());
    let note = app.notifications.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert!(note.message.contains("no credit"));
}

#[tokio::test]
async fn start_calls_without_selection_warns() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    api.seed_contact(&project.id, "Ada", "5550000001");
    let mut app = app_with(&api);
    actions::open_project(&mut app, &project.id).await;
    api.clear_journal();

    actions::start_calls(&mut app).await;

    assert_eq!(api.request_count(), 0);
    assert_eq!(app.notifications.last().map(|n| n.level), Some(NotificationLevel::Warning));
}

#[tokio::test]
async fn unauthorized_response_ends_session() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    let mut app = app_with(&api);
    app.session_token = Some("stale".to_string());
    actions::open_project(&mut app, &project.id).await;
    api.fail_requests("GET", "/customers", BackendError::Unauthorized);

    actions::reload_roster(&mut app).await;

    assert!(app.session_token.is_none());
    assert!(app.modal.is_some());
    assert_eq!(app.persisted_state().session_token, None);

    actions::handle_key(&mut app, key(KeyCode::Enter)).await;
    assert!(app.modal.is_none());
}

#[tokio::test]
async fn deleting_active_project_clears_roster() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    api.seed_contact(&project.id, "Ada", "5550000001");
    let mut app = app_with(&api);
    actions::open_project(&mut app, &project.id).await;
    actions::switch_view(&mut app, View::Projects).await;

    actions::handle_action(&mut app, Action::DeleteItem).await;
    assert!(matches!(app.mode, Mode::Confirm(_)));
    actions::handle_key(&mut app, key(KeyCode::Char('y'))).await;

    assert_eq!(api.requests_to("DELETE", &format!("/projects/{}", project.id)).len(), 1);
    assert!(app.active_project.is_none());
    assert!(app.roster_view.roster.is_empty());
    assert!(app.project_view.projects.is_empty());
}

#[tokio::test]
async fn declining_confirmation_sends_nothing() {
    let api = MockBackend::new();
    api.seed_project("Spring campaign");
    let mut app = app_with(&api);
    actions::load_projects(&mut app).await;
    api.clear_journal();

    actions::handle_action(&mut app, Action::DeleteItem).await;
    actions::handle_key(&mut app, key(KeyCode::Char('n'))).await;

    assert!(matches!(app.mode, Mode::Normal));
    assert_eq!(api.request_count(), 0);
    assert_eq!(app.project_view.projects.len(), 1);
}

#[tokio::test]
async fn new_project_prompt_creates_project() {
    let api = MockBackend::new();
    let mut app = app_with(&api);

    actions::handle_action(&mut app, Action::NewItem).await;
    for c in "Autumn".chars() {
        actions::handle_key(&mut app, key(KeyCode::Char(c))).await;
    }
    actions::handle_key(&mut app, key(KeyCode::Enter)).await;

    assert!(matches!(app.mode, Mode::Normal));
    assert_eq!(api.requests_to("POST", "/projects").len(), 1);
    assert_eq!(app.project_view.projects.len(), 1);
    assert_eq!(app.project_view.projects[0].name, "Autumn");
}

#[tokio::test]
async fn blank_required_field_keeps_prompt_open() {
    let api = MockBackend::new();
    let mut app = app_with(&api);

    actions::handle_action(&mut app, Action::NewItem).await;
    actions::handle_key(&mut app, key(KeyCode::Enter)).await;

    assert!(matches!(app.mode, Mode::Prompt(_)));
    assert_eq!(api.request_count(), 0);
}

#[tokio::test]
async fn import_group_into_active_project() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    let group = api.seed_group(
        "Warm leads",
        vec![
            fixtures::external_member("Ada", "5550000001"),
            fixtures::external_member("Grace", "5550000002"),
        ],
    );
    let mut app = app_with(&api);
    actions::open_project(&mut app, &project.id).await;
    actions::switch_view(&mut app, View::SearchGroups).await;

    actions::handle_action(&mut app, Action::Import).await;

    assert_eq!(api.requests_to("POST", "/customers").len(), 2);
    assert!(api.group(&group.id).unwrap().is_linked_to(&project.id));
    assert_eq!(
        last_message(&app),
        "Imported 2 member(s): 0 linked, 2 created, 0 failed"
    );
    assert!(app.group_view.current().unwrap().is_linked_to(&project.id));
}

#[tokio::test]
async fn group_pane_cycles_with_focus_keys() {
    let api = MockBackend::new();
    api.seed_group("Warm leads", vec![fixtures::external_member("Ada", "5550000001")]);
    let mut app = app_with(&api);
    actions::switch_view(&mut app, View::SearchGroups).await;

    actions::handle_action(&mut app, Action::Confirm).await;
    assert_eq!(app.group_view.pane, GroupPane::Members);
    assert!(app.group_view.stats.is_some());

    actions::handle_action(&mut app, Action::FocusLeft).await;
    assert_eq!(app.group_view.pane, GroupPane::Groups);
}

#[tokio::test]
async fn agent_prompt_edit_saves_llm() {
    let api = MockBackend::new();
    api.seed_agent(fixtures::agent("agent_1", "llm_1"), fixtures::llm("llm_1", "Be brief."));
    let mut app = app_with(&api);
    actions::switch_view(&mut app, View::Agents).await;
    actions::handle_action(&mut app, Action::Confirm).await;
    assert!(app.agent_view.llm.is_some());

    actions::handle_action(&mut app, Action::EditItem).await;
    assert!(matches!(app.mode, Mode::LlmPrompt(_)));
    actions::handle_key(&mut app, key(KeyCode::Char('!'))).await;
    let save = KeyEvent {
        code: KeyCode::Char('s'),
        modifiers: KeyModifiers::CONTROL,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    };
    actions::handle_key(&mut app, save).await;

    assert!(matches!(app.mode, Mode::Normal));
    let llm = api.llm(&callboard_core::LlmId::new("llm_1")).unwrap();
    assert!(llm.general_prompt.unwrap().contains('!'));
}

#[tokio::test]
async fn every_view_renders() {
    let api = MockBackend::new();
    let project = api.seed_project("Spring campaign");
    let contact = api.seed_contact(&project.id, "Ada", "5550000001");
    api.seed_call_detail(&contact.id, CallStatus::Ended);
    api.seed_group("Warm leads", vec![fixtures::member_of(&contact)]);
    api.seed_agent(fixtures::agent("agent_1", "llm_1"), fixtures::llm("llm_1", "Be brief."));
    let mut app = app_with(&api);
    actions::open_project(&mut app, &project.id).await;

    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    for view in View::all() {
        actions::switch_view(&mut app, *view).await;
        terminal.draw(|f| render_view(f, &app)).unwrap();
    }

    app.show_help = true;
    terminal.draw(|f| render_view(f, &app)).unwrap();
    let screen: String = terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect();
    assert!(screen.contains("Spring campaign"));
    assert!(screen.contains("Keys"));
}
