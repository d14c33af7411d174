//! Project list view.

use crate::state::{position_of, App};
use crate::theme::project_status_color;
use crate::views::helpers::{list_state, two_column};
use crate::widgets::DetailPanel;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (list_area, detail_area) = two_column(area, 50);
    let view = &app.project_view;

    let items: Vec<ListItem> = view
        .projects
        .iter()
        .map(|project| {
            let active = app.active_project_id() == Some(&project.id);
            let marker = if active { "* " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!("{} ({})", project.name, project.status),
                    Style::default().fg(project_status_color(project.status, &app.theme)),
                ),
            ]))
        })
        .collect();

    let title = if view.loading { "Projects (loading)" } else { "Projects" };
    let mut state = list_state(position_of(&view.projects, view.selected.as_ref()));
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().fg(app.theme.primary));
    f.render_stateful_widget(list, list_area, &mut state);

    let mut detail = DetailPanel::new("Details", Style::default().fg(app.theme.secondary));
    if let Some(project) = view.selected_project() {
        detail = detail
            .field("Project ID", project.id.to_string())
            .field("Name", project.name.clone())
            .field("Status", project.status.to_string())
            .field("Contacts", project.customers.len().to_string())
            .optional("Created by", project.created_by.clone())
            .optional("Created", project.created_at.map(|t| t.to_rfc3339()))
            .optional("Updated", project.updated_at.map(|t| t.to_rfc3339()))
            .body(project.description.as_deref());
    }
    detail.render(f, detail_area);
}
