//! Call detail browser.

use crate::state::{position_of, App};
use crate::theme::{call_status_color, sentiment_color};
use crate::views::helpers::{list_state, two_column};
use crate::widgets::DetailPanel;
use callboard_core::CallDetail;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (list_area, detail_area) = two_column(area, 40);
    let view = &app.call_view;

    let items: Vec<ListItem> = view
        .details
        .iter()
        .map(|detail| {
            let when = detail
                .freshness()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", when)),
                Span::styled(
                    detail.call_status.to_string(),
                    Style::default().fg(call_status_color(&detail.call_status, &app.theme)),
                ),
            ]))
        })
        .collect();

    let subject = view
        .contact
        .as_ref()
        .map(|c| format!(" {}", c.name))
        .unwrap_or_default();
    let title = format!(
        "Calls [{}]{}{}",
        view.scope.label(),
        subject,
        if view.loading { " loading" } else { "" }
    );
    let mut state = list_state(position_of(&view.details, view.selected.as_ref()));
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().fg(app.theme.primary));
    f.render_stateful_widget(list, list_area, &mut state);

    match view.selected_detail() {
        Some(detail) => render_detail(f, app, detail, detail_area),
        None => DetailPanel::new("Call", Style::default().fg(app.theme.secondary)).render(f, detail_area),
    }
}

fn render_detail(f: &mut Frame<'_>, app: &App, detail: &CallDetail, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(area);

    let analysis = detail.call_analysis.as_ref();
    DetailPanel::new("Call", Style::default().fg(app.theme.secondary))
        .field("Call ID", detail.call_id.clone())
        .field("Status", detail.call_status.to_string())
        .optional("Duration", detail.duration.map(|d| format!("{:.0}s", d)))
        .optional("Recording", detail.recording_url.clone())
        .optional(
            "Successful",
            analysis.and_then(|a| a.call_successful).map(|ok| ok.to_string()),
        )
        .optional(
            "Voicemail",
            analysis.and_then(|a| a.in_voicemail).map(|vm| vm.to_string()),
        )
        .optional("Updated", detail.freshness().map(|t| t.to_rfc3339()))
        .render(f, chunks[0]);

    let mut lines = Vec::new();
    if let Some(analysis) = analysis {
        if let Some(sentiment) = &analysis.user_sentiment {
            lines.push(Line::from(vec![
                Span::styled("Sentiment: ", Style::default().fg(app.theme.secondary)),
                Span::styled(
                    sentiment.clone(),
                    Style::default().fg(sentiment_color(sentiment, &app.theme)),
                ),
            ]));
        }
        if let Some(summary) = &analysis.call_summary {
            lines.push(Line::from(Span::styled(
                "Summary:",
                Style::default().fg(app.theme.secondary),
            )));
            lines.extend(summary.lines().map(|l| Line::from(l.to_string())));
        }
        for (key, value) in &analysis.custom_analysis_data {
            lines.push(Line::from(format!("{}: {}", key, value)));
        }
        lines.push(Line::default());
    }
    match &detail.transcript {
        Some(transcript) => lines.extend(transcript.lines().map(|l| Line::from(l.to_string()))),
        None => lines.push(Line::from(Span::styled(
            "No transcript yet",
            Style::default().fg(app.theme.text_dim),
        ))),
    }

    let body = Paragraph::new(lines)
        .block(Block::default().title("Analysis / Transcript").borders(Borders::ALL))
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(body, chunks[1]);
}
