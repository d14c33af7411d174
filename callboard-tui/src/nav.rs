//! Navigation and view switching utilities.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum View {
    #[default]
    Projects,
    Roster,
    CallDetails,
    SearchGroups,
    Agents,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Projects => "Projects",
            View::Roster => "Roster",
            View::CallDetails => "Calls",
            View::SearchGroups => "Groups",
            View::Agents => "Agents",
        }
    }

    pub fn all() -> &'static [View] {
        &[
            View::Projects,
            View::Roster,
            View::CallDetails,
            View::SearchGroups,
            View::Agents,
        ]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<View> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> View {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> View {
        let idx = self.index();
        let all = Self::all();
        let prev = if idx == 0 { all.len() - 1 } else { idx - 1 };
        all[prev]
    }

    /// Views that show data scoped to the active project.
    pub fn needs_project(&self) -> bool {
        matches!(self, View::Roster | View::CallDetails)
    }
}
