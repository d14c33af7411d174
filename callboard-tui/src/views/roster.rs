//! Roster view: persisted contacts, the draft editor, and polling status.

use std::time::Instant;

use crate::state::{position_of, App, RosterPane};
use crate::theme::contact_status_color;
use crate::views::helpers::{list_state, pane_block, two_column};
use crate::widgets::{DetailPanel, PollIndicator, ProgressBar};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (left, right) = two_column(area, 60);
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(left);

    render_contacts(f, app, left_chunks[0]);
    render_drafts(f, app, left_chunks[1]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
        .split(right);
    render_polling(f, app, right_chunks[0], right_chunks[1]);
    render_detail(f, app, right_chunks[2]);
}

fn render_contacts(f: &mut Frame<'_>, app: &App, area: Rect) {
    let view = &app.roster_view;
    let items: Vec<ListItem> = view
        .roster
        .entries()
        .iter()
        .map(|entry| {
            let marker = if view.roster.is_selected(&entry.contact) { "[x] " } else { "[ ] " };
            let status = entry.display_status();
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::raw(format!("{:<24} {:<12} ", entry.contact.name, entry.contact.phone_number)),
                Span::styled(
                    status.to_string(),
                    Style::default().fg(contact_status_color(status, &app.theme)),
                ),
            ]))
        })
        .collect();

    let title = format!(
        "Contacts ({} selected){}",
        view.roster.selection_len(),
        if view.loading { " loading" } else { "" }
    );
    let mut state = list_state(position_of(view.roster.entries(), view.selected.as_ref()));
    let list = List::new(items)
        .block(pane_block(&title, view.focus == RosterPane::Contacts, &app.theme))
        .highlight_style(Style::default().fg(app.theme.primary));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_drafts(f: &mut Frame<'_>, app: &App, area: Rect) {
    let view = &app.roster_view;
    let items: Vec<ListItem> = view
        .editor
        .rows()
        .iter()
        .map(|row| {
            let style = if row.is_valid() {
                Style::default().fg(app.theme.text)
            } else {
                Style::default().fg(app.theme.text_dim)
            };
            let name = if row.name.is_empty() { "<name>" } else { row.name.as_str() };
            let phone = if row.phone.is_empty() { "<phone>" } else { row.phone.as_str() };
            ListItem::new(Line::from(Span::styled(format!("{:<24} {}", name, phone), style)))
        })
        .collect();

    let focused = view.focus == RosterPane::Drafts;
    let mut state = list_state(focused.then_some(view.draft_cursor));
    let list = List::new(items)
        .block(pane_block("New contacts (a add, e edit, s save)", focused, &app.theme))
        .highlight_style(Style::default().fg(app.theme.secondary));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_polling(f: &mut Frame<'_>, app: &App, status_area: Rect, bar_area: Rect) {
    let live = app
        .roster_view
        .roster
        .entries()
        .iter()
        .filter(|e| !e.is_settled())
        .count();
    PollIndicator::from_reconciler(&app.poller).render(f, status_area, live, &app.theme);

    let elapsed = app
        .poller
        .started_at()
        .map(|started| Instant::now().saturating_duration_since(started).as_secs_f64())
        .unwrap_or(0.0);
    ProgressBar {
        title: format!("Elapsed / {}s ceiling", app.poller.ceiling().as_secs()),
        value: elapsed,
        max: app.poller.ceiling().as_secs_f64(),
        thresholds: (50.0, 85.0),
        low_style: Style::default().fg(app.theme.success),
        mid_style: Style::default().fg(app.theme.warning),
        high_style: Style::default().fg(app.theme.error),
    }
    .render(f, bar_area);
}

fn render_detail(f: &mut Frame<'_>, app: &App, area: Rect) {
    let mut detail = DetailPanel::new("Contact", Style::default().fg(app.theme.secondary));
    if let Some(entry) = app.roster_view.selected_entry() {
        let contact = &entry.contact;
        detail = detail
            .field("Contact ID", contact.id.to_string())
            .field("Name", contact.name.clone())
            .field("Phone", contact.phone_number.clone())
            .field("Status", entry.display_status().to_string())
            .optional("Record", contact.record.clone());
        if let Some(call) = &entry.last_call {
            detail = detail
                .field("Last call", call.call_id.clone())
                .field("Call status", call.call_status.to_string())
                .optional("Duration", call.duration.map(|d| format!("{:.0}s", d)))
                .optional("Updated", call.freshness().map(|t| t.to_rfc3339()));
        }
        detail = detail.body(contact.note.as_deref());
    }
    detail.render(f, area);
}
