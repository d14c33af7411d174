//! View rendering dispatch.

pub mod agents;
pub mod calls;
pub mod groups;
pub mod helpers;
pub mod projects;
pub mod roster;

pub use helpers::{centered_rect, two_column};

use crate::keys::HELP_LINES;
use crate::nav::View;
use crate::notifications::NotificationLevel;
use crate::prompt::InputPrompt;
use crate::state::{App, Mode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active_view {
        View::Projects => projects::render(f, app, layout[1]),
        View::Roster => roster::render(f, app, layout[1]),
        View::CallDetails => calls::render(f, app, layout[1]),
        View::SearchGroups => groups::render(f, app, layout[1]),
        View::Agents => agents::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);
    render_overlay(f, app);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let project = app
        .active_project
        .as_ref()
        .map(|p| p.name.as_str())
        .unwrap_or("none");
    let polling = if app.poller.is_polling() { "Polling" } else { "Idle" };
    let title = format!("CALLBOARD | Project: {} | {}", project, polling);

    let titles: Vec<Line> = View::all()
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!("{} {}", i + 1, view.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active_view.index())
        .block(Block::default().borders(Borders::ALL).title(Span::styled(
            title,
            Style::default().fg(app.theme.primary),
        )))
        .highlight_style(
            Style::default()
                .fg(app.theme.secondary)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = "j/k move • h/l pane • Tab switch view • n new • e edit • d delete • ? help • q quit";
    let (text, style) = if let Some(note) = app.notifications.last() {
        let color = match note.level {
            NotificationLevel::Info => app.theme.info,
            NotificationLevel::Warning => app.theme.warning,
            NotificationLevel::Error => app.theme.error,
            NotificationLevel::Success => app.theme.success,
        };
        (
            format!("{}: {}", note.level.label(), note.message),
            Style::default().fg(color),
        )
    } else {
        (help.to_string(), Style::default().fg(app.theme.text_dim))
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::TOP))
        .style(style);
    f.render_widget(footer, area);
}

fn render_overlay(f: &mut Frame<'_>, app: &App) {
    let screen = f.size();
    match &app.mode {
        Mode::Normal => {}
        Mode::Prompt(prompt) => render_prompt(f, app, prompt, screen),
        Mode::Confirm(pending) => {
            let area = centered_rect(50, 20, screen);
            let question = Paragraph::new(vec![
                Line::from(pending.question()),
                Line::default(),
                Line::from(Span::styled(
                    "y / Enter confirm • n / Esc cancel",
                    Style::default().fg(app.theme.text_dim),
                )),
            ])
            .block(
                Block::default()
                    .title("Confirm")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.warning)),
            )
            .wrap(Wrap { trim: true });
            f.render_widget(Clear, area);
            f.render_widget(question, area);
        }
        Mode::LlmPrompt(editor) => {
            let area = centered_rect(80, 70, screen);
            f.render_widget(Clear, area);
            f.render_widget(&editor.textarea, area);
        }
        Mode::BulkMembers(editor) => {
            let area = centered_rect(70, 60, screen);
            f.render_widget(Clear, area);
            f.render_widget(&editor.textarea, area);
        }
    }

    if app.show_help {
        render_help(f, app, screen);
    }
    if let Some(modal) = &app.modal {
        let area = centered_rect(60, 25, screen);
        let body = Paragraph::new(vec![
            Line::from(modal.message.clone()),
            Line::default(),
            Line::from(Span::styled(
                "Enter / Esc dismiss",
                Style::default().fg(app.theme.text_dim),
            )),
        ])
        .block(
            Block::default()
                .title(modal.title.as_str())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.error)),
        )
        .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(body, area);
    }
}

fn render_prompt(f: &mut Frame<'_>, app: &App, prompt: &InputPrompt, screen: Rect) {
    let height = (prompt.fields.len() as u16) * 3 + 3;
    let outer = centered_rect(60, 60, screen);
    let area = Rect {
        height: height.min(outer.height),
        ..outer
    };
    f.render_widget(Clear, area);
    f.render_widget(
        Block::default()
            .title(prompt.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border_focus)),
        area,
    );

    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    let mut constraints: Vec<Constraint> =
        prompt.fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, field) in prompt.fields.iter().enumerate() {
        let focused = i == prompt.focus;
        let border = if focused { app.theme.border_focus } else { app.theme.border };
        let cursor = if focused { "_" } else { "" };
        let input = Paragraph::new(format!("{}{}", field.value, cursor)).block(
            Block::default()
                .title(field.label)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
        f.render_widget(input, rows[i]);
    }
}

fn render_help(f: &mut Frame<'_>, app: &App, screen: Rect) {
    let area = centered_rect(60, 70, screen);
    let lines: Vec<Line> = HELP_LINES
        .iter()
        .map(|(keys, description)| {
            Line::from(vec![
                Span::styled(format!("{:<14}", keys), Style::default().fg(app.theme.primary)),
                Span::raw(*description),
            ])
        })
        .collect();
    let help = Paragraph::new(lines).block(
        Block::default()
            .title("Keys (any key closes)")
            .borders(Borders::ALL),
    );
    f.render_widget(Clear, area);
    f.render_widget(help, area);
}
