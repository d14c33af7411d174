//! Event types for the TUI event loop.

use callboard_core::{BackendResult, ContactWithLastCall, ProjectId};
use crossterm::event::KeyEvent;

use crate::poller::PollGeneration;

#[derive(Debug)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    /// Result of a background poll fetch.
    PollResult {
        project_id: ProjectId,
        generation: PollGeneration,
        result: BackendResult<Vec<ContactWithLastCall>>,
    },
}
