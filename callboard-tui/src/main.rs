//! Callboard terminal client entry point.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use callboard_core::{CallCenterApi, LoginRequest};
use callboard_tui::actions;
use callboard_tui::api_client::{RestClient, Session};
use callboard_tui::config::TuiConfig;
use callboard_tui::error::TuiError;
use callboard_tui::events::TuiEvent;
use callboard_tui::persistence::{self, PersistedState};
use callboard_tui::state::App;
use callboard_tui::telemetry;
use callboard_tui::views::render_view;
use color_eyre::eyre::{eyre, WrapErr};
use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = TuiConfig::load().wrap_err("loading configuration")?;
    telemetry::init_logging(&config.logging, &config.log_path)?;

    let persisted = match persistence::load(&config.persistence_path) {
        Ok(state) => state.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring unreadable persisted state");
            PersistedState::default()
        }
    };

    let rest = RestClient::from_config(&config)?;
    let token = resolve_token(&config, &persisted, &rest).await?;
    let api: Arc<dyn CallCenterApi> = Arc::new(rest.with_session(&Session::new(token.clone()))?);

    let mut app = App::new(config, api);
    app.session_token = Some(token);
    app.active_view = persisted.active_view;

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard {};

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    spawn_input_reader(event_tx.clone());

    actions::load_projects(&mut app).await;
    if let Some(project_id) = &persisted.active_project_id {
        actions::open_project(&mut app, project_id).await;
        app.active_view = persisted.active_view;
    }
    actions::refresh_view(&mut app).await;

    let mut ticker = tokio::time::interval(app.config.refresh_interval());
    let mut poll_ticker = tokio::time::interval(app.poller.interval());

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {}
            _ = poll_ticker.tick() => {
                actions::on_poll_tick(&mut app, &event_tx, Instant::now());
            }
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, event).await {
                    break;
                }
                // First poll lands one interval after dispatch.
                if app.poller.take_rearmed() {
                    poll_ticker.reset();
                }
            }
        }
    }

    if let Err(err) = persistence::save(&app.config.persistence_path, &app.persisted_state()) {
        tracing::warn!(error = %err, "Failed to persist UI state");
    }
    tracing::info!("Callboard exiting");

    Ok(())
}

/// Configured token, then the persisted one, then a fresh login.
async fn resolve_token(
    config: &TuiConfig,
    persisted: &PersistedState,
    rest: &RestClient,
) -> color_eyre::Result<String> {
    if let Some(token) = config.auth.token.as_ref().filter(|t| !t.is_empty()) {
        return Ok(token.clone());
    }
    if let Some(token) = persisted.session_token.as_ref() {
        return Ok(token.clone());
    }
    let (email, password) = config
        .auth
        .credentials()
        .ok_or_else(|| eyre!("no session token and no login credentials configured"))?;
    let response = rest
        .login(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await
        .wrap_err("logging in")?;
    tracing::info!(user = %response.user.email, "Logged in");
    Ok(response.token)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let sent = match evt {
                    CrosstermEvent::Key(key) => sender.blocking_send(TuiEvent::Input(key)),
                    CrosstermEvent::Resize(width, height) => {
                        sender.blocking_send(TuiEvent::Resize { width, height })
                    }
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    });
}

async fn handle_event(app: &mut App, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Input(key) => return actions::handle_key(app, key).await,
        TuiEvent::PollResult {
            project_id,
            generation,
            result,
        } => {
            actions::on_poll_result(app, project_id, generation, result);
        }
        TuiEvent::Resize { .. } => {}
    }
    false
}
