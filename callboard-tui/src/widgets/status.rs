//! Polling state indicator for the roster view.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::poller::PollingReconciler;
use crate::theme::SynthBruteTheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollIndicator {
    Idle,
    /// Armed, waiting for the next tick.
    Waiting,
    /// A fetch is out; ticks are skipped until it reports.
    Fetching,
}

impl PollIndicator {
    pub fn from_reconciler(poller: &PollingReconciler) -> Self {
        match (poller.is_polling(), poller.fetch_outstanding()) {
            (false, _) => PollIndicator::Idle,
            (true, false) => PollIndicator::Waiting,
            (true, true) => PollIndicator::Fetching,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PollIndicator::Idle => "Idle",
            PollIndicator::Waiting => "Watching calls",
            PollIndicator::Fetching => "Fetching call status",
        }
    }

    pub fn color(self, theme: &SynthBruteTheme) -> Color {
        match self {
            PollIndicator::Idle => theme.text_dim,
            PollIndicator::Waiting => theme.warning,
            PollIndicator::Fetching => theme.info,
        }
    }

    /// `live` counts contacts whose last call has not settled yet.
    pub fn render(self, f: &mut Frame<'_>, area: Rect, live: usize, theme: &SynthBruteTheme) {
        let mut spans = vec![Span::styled(self.label(), Style::default().fg(self.color(theme)))];
        if self != PollIndicator::Idle {
            spans.push(Span::styled(
                format!("  {} live", live),
                Style::default().fg(theme.text_muted),
            ));
        }
        let paragraph = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .title("Polling")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        );
        f.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_indicator_follows_reconciler() {
        let start = Instant::now();
        let mut poller = PollingReconciler::new(Duration::from_secs(10), Duration::from_secs(300));
        assert_eq!(PollIndicator::from_reconciler(&poller), PollIndicator::Idle);

        let generation = poller.arm(start);
        assert_eq!(PollIndicator::from_reconciler(&poller), PollIndicator::Waiting);

        poller.on_tick(start + Duration::from_secs(10));
        assert_eq!(PollIndicator::from_reconciler(&poller), PollIndicator::Fetching);

        poller.on_fetch_failed(generation);
        assert_eq!(PollIndicator::from_reconciler(&poller), PollIndicator::Waiting);
    }
}
