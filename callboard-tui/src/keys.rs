//! Keybinding definitions for the TUI.
//!
//! Only normal-mode keys go through [`map_key`]; while a prompt or the
//! prompt editor is open, keys are fed to it directly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextView,
    PrevView,
    SwitchView(usize),
    MoveUp,
    MoveDown,
    FocusLeft,
    FocusRight,
    Select,
    Confirm,
    Cancel,
    NewItem,
    EditItem,
    DeleteItem,
    AddRow,
    BulkAdd,
    CycleStatus,
    Save,
    StartCalls,
    Import,
    Refresh,
    OpenHelp,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Cancel),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('s') => Some(Action::Save),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::OpenHelp),
        KeyCode::Char('n') => Some(Action::NewItem),
        KeyCode::Char('e') => Some(Action::EditItem),
        KeyCode::Char('d') => Some(Action::DeleteItem),
        KeyCode::Char('a') => Some(Action::AddRow),
        KeyCode::Char('b') => Some(Action::BulkAdd),
        KeyCode::Char('t') => Some(Action::CycleStatus),
        KeyCode::Char('s') => Some(Action::Save),
        KeyCode::Char('c') => Some(Action::StartCalls),
        KeyCode::Char('i') => Some(Action::Import),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Tab => Some(Action::NextView),
        KeyCode::BackTab => Some(Action::PrevView),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::FocusLeft),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::FocusRight),
        KeyCode::Char(' ') => Some(Action::Select),
        KeyCode::Char(c @ '1'..='9') => Some(Action::SwitchView(c as usize - '1' as usize)),
        _ => None,
    }
}

/// One line per binding, shown by the help overlay.
pub const HELP_LINES: &[(&str, &str)] = &[
    ("1-5 / Tab", "switch view"),
    ("j/k", "move selection"),
    ("h/l", "switch pane"),
    ("Enter", "open"),
    ("space", "select contact for calling"),
    ("c", "start calls for selected contacts"),
    ("n / e / d", "new / edit / delete"),
    ("a", "add draft row / add selected contacts to group"),
    ("s", "save draft rows"),
    ("t", "cycle status"),
    ("b", "bulk add members"),
    ("i", "import group into active project"),
    ("r / Ctrl-r", "refresh"),
    ("Ctrl-s", "save prompt"),
    ("Esc", "cancel"),
    ("q", "quit"),
];
