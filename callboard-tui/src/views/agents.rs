//! Agent list and LLM prompt view.

use crate::state::{position_of, App};
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
    let (list_area, detail_area) = two_column(area, 40);
    let view = &app.agent_view;

    let items: Vec<ListItem> = view
        .agents
        .iter()
        .map(|agent| {
            let style = if agent.is_published {
                Style::default().fg(app.theme.success)
            } else {
                Style::default().fg(app.theme.text)
            };
            ListItem::new(Line::from(Span::styled(
                format!("{} (v{})", agent.agent_name, agent.version),
                style,
            )))
        })
        .collect();

    let title = if view.loading { "Agents (loading)" } else { "Agents" };
    let mut state = list_state(position_of(&view.agents, view.selected.as_ref()));
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().fg(app.theme.primary));
    f.render_stateful_widget(list, list_area, &mut state);

    let mut detail = DetailPanel::new("Agent (Enter open, e edit prompt)", Style::default().fg(app.theme.secondary));
    let opened = view
        .agent
        .as_ref()
        .filter(|agent| Some(&agent.agent_id) == view.selected.as_ref());
    if let Some(agent) = opened {
        detail = detail
            .field("Agent ID", agent.agent_id.to_string())
            .field("Name", agent.agent_name.clone())
            .field("Published", agent.is_published.to_string())
            .optional("Voice", agent.voice_id.clone())
            .optional("Language", agent.language.clone())
            .optional("LLM", agent.llm_id().map(|id| id.to_string()));
        if let Some(llm) = view.llm.as_ref().filter(|llm| Some(&llm.llm_id) == agent.llm_id()) {
            detail = detail
                .optional("Model", llm.model.clone())
                .body(llm.general_prompt.as_deref());
        }
    }
    detail.render(f, detail_area);
}
