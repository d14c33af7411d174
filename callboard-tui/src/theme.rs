//! SynthBrute theme and color utilities.

use callboard_core::{CallStatus, ContactStatus, ProjectStatus, SearchGroupStatus};
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct SynthBruteTheme {
    pub bg: Color,
    pub bg_secondary: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub secondary_dim: Color,
    pub tertiary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl SynthBruteTheme {
    pub fn synthbrute() -> Self {
        Self {
            bg: Color::Rgb(10, 10, 10),
            bg_secondary: Color::Rgb(26, 26, 26),
            bg_highlight: Color::Rgb(42, 42, 42),
            primary: Color::Rgb(0, 255, 255),
            primary_dim: Color::Rgb(0, 136, 136),
            secondary: Color::Rgb(255, 0, 255),
            secondary_dim: Color::Rgb(136, 0, 136),
            tertiary: Color::Rgb(255, 255, 0),
            success: Color::Rgb(0, 255, 0),
            warning: Color::Rgb(255, 170, 0),
            error: Color::Rgb(255, 0, 64),
            info: Color::Rgb(0, 200, 255),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(136, 136, 136),
            text_muted: Color::Rgb(68, 68, 68),
            border: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 255, 255),
        }
    }
}

pub fn contact_status_color(status: ContactStatus, theme: &SynthBruteTheme) -> Color {
    match status {
        ContactStatus::Pending => theme.text_dim,
        ContactStatus::Processing => theme.warning,
        ContactStatus::Completed => theme.success,
        ContactStatus::Failed => theme.error,
    }
}

pub fn call_status_color(status: &CallStatus, theme: &SynthBruteTheme) -> Color {
    match status {
        CallStatus::Unknown(_) => theme.secondary,
        other => contact_status_color(other.contact_status(), theme),
    }
}

pub fn project_status_color(status: ProjectStatus, theme: &SynthBruteTheme) -> Color {
    match status {
        ProjectStatus::Active => theme.primary,
        ProjectStatus::Completed => theme.success,
        ProjectStatus::Archived => theme.text_muted,
    }
}

pub fn group_status_color(status: SearchGroupStatus, theme: &SynthBruteTheme) -> Color {
    match status {
        SearchGroupStatus::Active => theme.primary,
        SearchGroupStatus::Completed => theme.success,
        SearchGroupStatus::Archived => theme.text_muted,
        SearchGroupStatus::Paused => theme.warning,
    }
}

pub fn sentiment_color(sentiment: &str, theme: &SynthBruteTheme) -> Color {
    match sentiment.trim().to_ascii_lowercase().as_str() {
        "positive" => theme.success,
        "negative" => theme.error,
        "neutral" => theme.text,
        _ => theme.text_dim,
    }
}
