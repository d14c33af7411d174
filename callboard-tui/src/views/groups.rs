//! Search group management view.

use crate::state::{position_of, App, GroupPane};
use crate::theme::{contact_status_color, group_status_color};
use crate::views::helpers::{list_state, pane_block, two_column};
use crate::widgets::{DetailPanel, ProgressBar};
use callboard_core::{ContactStatus, SearchGroup};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (list_area, right) = two_column(area, 35);
    render_group_list(f, app, list_area);

    let Some(group) = app.group_view.current() else {
        DetailPanel::new("Group", Style::default().fg(app.theme.secondary)).render(f, right);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(right);
    render_summary(f, app, group, chunks[0]);
    render_capacity(f, app, group, chunks[1]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(chunks[2]);
    render_members(f, app, group, panes[0]);
    render_projects(f, app, group, panes[1]);
    render_flows(f, app, group, panes[2]);
}

fn render_group_list(f: &mut Frame<'_>, app: &App, area: Rect) {
    let view = &app.group_view;
    let items: Vec<ListItem> = view
        .groups
        .iter()
        .map(|group| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", group.name)),
                Span::styled(
                    format!("[{}] {}", group.status, group.member_count()),
                    Style::default().fg(group_status_color(group.status, &app.theme)),
                ),
            ]))
        })
        .collect();

    let title = if view.loading { "Search groups (loading)" } else { "Search groups" };
    let mut state = list_state(position_of(&view.groups, view.selected.as_ref()));
    let list = List::new(items)
        .block(pane_block(title, view.pane == GroupPane::Groups, &app.theme))
        .highlight_style(Style::default().fg(app.theme.primary));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_summary(f: &mut Frame<'_>, app: &App, group: &SearchGroup, area: Rect) {
    let mut panel = DetailPanel::new("Group", Style::default().fg(app.theme.secondary))
        .field("Name", group.name.clone())
        .field("Status", group.status.to_string())
        .optional("Description", group.description.clone())
        .field(
            "Settings",
            format!(
                "auto-assign {} / notify {}",
                group.settings.auto_assign_projects, group.settings.notification_enabled
            ),
        );
    if let Some(stats) = &app.group_view.stats {
        let by_status = stats
            .status_stats
            .iter()
            .map(|s| format!("{} {}", s.status, s.count))
            .collect::<Vec<_>>()
            .join(", ");
        panel = panel
            .field("Calls", stats.call_detail_count.to_string())
            .field("By status", by_status);
    }
    panel.render(f, area);
}

fn render_capacity(f: &mut Frame<'_>, app: &App, group: &SearchGroup, area: Rect) {
    let max = group.settings.max_customers;
    ProgressBar {
        title: format!("Members {}/{}", group.member_count(), max),
        value: group.member_count() as f64,
        max: f64::from(max),
        thresholds: (75.0, 95.0),
        low_style: Style::default().fg(app.theme.success),
        mid_style: Style::default().fg(app.theme.warning),
        high_style: Style::default().fg(app.theme.error),
    }
    .render(f, area);
}

fn render_members(f: &mut Frame<'_>, app: &App, group: &SearchGroup, area: Rect) {
    let items: Vec<ListItem> = group
        .customers
        .iter()
        .map(|member| {
            let status = member
                .status
                .as_deref()
                .and_then(|s| s.parse::<ContactStatus>().ok());
            let style = status
                .map(|s| Style::default().fg(contact_status_color(s, &app.theme)))
                .unwrap_or_default();
            let linked = if member.id.is_some() { "" } else { " (new)" };
            ListItem::new(Line::from(Span::styled(
                format!("{} {}{}", member.name, member.phone_number, linked),
                style,
            )))
        })
        .collect();
    render_pane(f, app, items, GroupPane::Members, app.group_view.member_cursor, area);
}

fn render_projects(f: &mut Frame<'_>, app: &App, group: &SearchGroup, area: Rect) {
    let items: Vec<ListItem> = group
        .projects
        .iter()
        .map(|project| {
            let active = app.active_project_id() == Some(&project.id);
            let marker = if active { "* " } else { "" };
            ListItem::new(format!("{}{}", marker, project.name))
        })
        .collect();
    render_pane(f, app, items, GroupPane::Projects, app.group_view.project_cursor, area);
}

fn render_flows(f: &mut Frame<'_>, app: &App, group: &SearchGroup, area: Rect) {
    let items: Vec<ListItem> = group
        .flows
        .iter()
        .map(|flow| ListItem::new(format!("{} [{}]", flow.name, flow.status)))
        .collect();
    render_pane(f, app, items, GroupPane::Flows, app.group_view.flow_cursor, area);
}

fn render_pane(
    f: &mut Frame<'_>,
    app: &App,
    items: Vec<ListItem>,
    pane: GroupPane,
    cursor: usize,
    area: Rect,
) {
    let focused = app.group_view.pane == pane;
    let selected = (focused && !items.is_empty()).then_some(cursor);
    let mut state = list_state(selected);
    let list = List::new(items)
        .block(pane_block(pane.title(), focused, &app.theme))
        .highlight_style(Style::default().fg(app.theme.primary));
    f.render_stateful_widget(list, area, &mut state);
}
