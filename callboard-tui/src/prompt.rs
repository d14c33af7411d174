//! Modal input forms and the multi-line prompt editors.

use callboard_core::{
    push_phone_char, sanitize_phone_input, AgentId, ContactId, ExternalMember, FlowId, LlmId,
    ProjectId, SearchGroupId, ValidationError,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::{Block, Borders};
use tui_textarea::TextArea;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Digits only, capped like any phone entry.
    Phone,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptField {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

impl PromptField {
    pub fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            kind: FieldKind::Text,
        }
    }

    pub fn phone(label: &'static str, value: &str) -> Self {
        Self {
            label,
            value: sanitize_phone_input(value),
            kind: FieldKind::Phone,
        }
    }

    pub fn number(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            kind: FieldKind::Number,
        }
    }

    fn push(&mut self, c: char) {
        match self.kind {
            FieldKind::Text => self.value.push(c),
            FieldKind::Phone => {
                push_phone_char(&mut self.value, c);
            }
            FieldKind::Number => {
                if c.is_ascii_digit() && self.value.len() < 9 {
                    self.value.push(c);
                }
            }
        }
    }
}

/// What a submitted form creates or changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    NewProject,
    EditProject(ProjectId),
    DraftRow(usize),
    NewGroup,
    EditGroup(SearchGroupId),
    ExternalMember(SearchGroupId),
    NewFlow(SearchGroupId),
    EditFlow(SearchGroupId, FlowId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Continue,
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPrompt {
    pub kind: PromptKind,
    pub title: String,
    pub fields: Vec<PromptField>,
    pub focus: usize,
}

impl InputPrompt {
    pub fn new(kind: PromptKind, title: impl Into<String>, fields: Vec<PromptField>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields,
            focus: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => PromptOutcome::Cancel,
                KeyCode::Char('s') => PromptOutcome::Submit,
                _ => PromptOutcome::Continue,
            };
        }
        match key.code {
            KeyCode::Esc => return PromptOutcome::Cancel,
            KeyCode::Enter => return PromptOutcome::Submit,
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.push(c);
                }
            }
            _ => {}
        }
        PromptOutcome::Continue
    }

    /// Trimmed value of field `index`.
    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.trim()).unwrap_or("")
    }

    /// Trimmed value, `None` when blank.
    pub fn optional(&self, index: usize) -> Option<String> {
        let value = self.value(index);
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Value of a required field.
    pub fn required(&self, index: usize) -> Result<String, ValidationError> {
        self.optional(index).ok_or_else(|| ValidationError::RequiredFieldMissing {
            field: self
                .fields
                .get(index)
                .map(|f| f.label.to_string())
                .unwrap_or_default(),
        })
    }

    fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    fn focus_previous(&mut self) {
        if !self.fields.is_empty() {
            self.focus = if self.focus == 0 {
                self.fields.len() - 1
            } else {
                self.focus - 1
            };
        }
    }
}

/// Yes/no guard in front of destructive requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
    Project(ProjectId, String),
    Contact(ContactId, String),
    Group(SearchGroupId, String),
    Member(SearchGroupId, ContactId, String),
    ProjectLink(SearchGroupId, ProjectId, String),
    Flow(SearchGroupId, FlowId, String),
}

impl PendingDelete {
    pub fn question(&self) -> String {
        match self {
            PendingDelete::Project(_, name) => format!("Delete project '{}'?", name),
            PendingDelete::Contact(_, name) => format!("Delete contact '{}'?", name),
            PendingDelete::Group(_, name) => format!("Delete search group '{}'?", name),
            PendingDelete::Member(_, _, name) => format!("Remove '{}' from the group?", name),
            PendingDelete::ProjectLink(_, _, name) => {
                format!("Unlink project '{}' from the group?", name)
            }
            PendingDelete::Flow(_, _, name) => format!("Delete flow '{}'?", name),
        }
    }
}

/// Editing an agent's general prompt.
#[derive(Debug, Clone)]
pub struct LlmPromptEditor {
    pub agent_id: AgentId,
    pub llm_id: LlmId,
    pub model: Option<String>,
    pub language: Option<String>,
    pub textarea: TextArea<'static>,
}

impl LlmPromptEditor {
    pub fn new(
        agent_id: AgentId,
        llm_id: LlmId,
        model: Option<String>,
        language: Option<String>,
        prompt: &str,
    ) -> Self {
        let mut textarea = TextArea::new(prompt.lines().map(str::to_string).collect());
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title("General prompt (Ctrl-s save, Esc cancel)"),
        );
        Self {
            agent_id,
            llm_id,
            model,
            language,
            textarea,
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }
}

/// Pasting members into a group, one `name, phone[, note]` per line.
#[derive(Debug, Clone)]
pub struct BulkMemberEditor {
    pub group_id: SearchGroupId,
    pub textarea: TextArea<'static>,
}

impl BulkMemberEditor {
    pub fn new(group_id: SearchGroupId) -> Self {
        let mut textarea = TextArea::default();
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title("name, phone[, note] per line (Ctrl-s add, Esc cancel)"),
        );
        Self { group_id, textarea }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }
}

/// Parse `name, phone[, note]` lines. Blank lines are skipped.
pub fn parse_bulk_members(text: &str) -> Result<Vec<ExternalMember>, ValidationError> {
    let mut members = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, ',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let phone = sanitize_phone_input(parts.next().unwrap_or_default());
        let note = parts.next().filter(|n| !n.is_empty()).map(str::to_string);
        if name.is_empty() || phone.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("line {}", number + 1),
                reason: "expected 'name, phone[, note]'".to_string(),
            });
        }
        members.push(ExternalMember {
            name: name.to_string(),
            phone_number: phone,
            note,
            record: None,
        });
    }
    if members.is_empty() {
        return Err(ValidationError::NoValidRows);
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        }
    }

    fn type_str(prompt: &mut InputPrompt, text: &str) {
        for c in text.chars() {
            prompt.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_prompt_moves_between_fields_and_sanitizes_phone() {
        let mut prompt = InputPrompt::new(
            PromptKind::DraftRow(0),
            "Edit row",
            vec![PromptField::text("Name", ""), PromptField::phone("Phone", "")],
        );
        type_str(&mut prompt, "Ada");
        prompt.handle_key(key(KeyCode::Tab));
        type_str(&mut prompt, "555-123-4567-99");

        assert_eq!(prompt.value(0), "Ada");
        assert_eq!(prompt.value(1), "5551234567");
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PromptOutcome::Submit);
    }

    #[test]
    fn test_required_reports_field_label() {
        let prompt = InputPrompt::new(
            PromptKind::NewProject,
            "New project",
            vec![PromptField::text("Name", "  ")],
        );
        assert_eq!(
            prompt.required(0),
            Err(ValidationError::RequiredFieldMissing {
                field: "Name".to_string()
            })
        );
    }

    #[test]
    fn test_escape_cancels() {
        let mut prompt = InputPrompt::new(PromptKind::NewGroup, "New group", vec![PromptField::text("Name", "")]);
        assert_eq!(prompt.handle_key(key(KeyCode::Esc)), PromptOutcome::Cancel);
    }

    #[test]
    fn test_bulk_members_parse() {
        let members = parse_bulk_members("Ada, (555) 000-0001\n\nGrace,5550000002, call after 5\n").unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].phone_number, "5550000001");
        assert_eq!(members[1].note.as_deref(), Some("call after 5"));
    }

    #[test]
    fn test_bulk_members_reject_bad_line() {
        assert!(matches!(
            parse_bulk_members("Ada, 5550000001\nno phone here"),
            Err(ValidationError::InvalidValue { field, .. }) if field == "line 2"
        ));
        assert_eq!(parse_bulk_members("  \n"), Err(ValidationError::NoValidRows));
    }

    #[test]
    fn test_llm_editor_round_trips_text() {
        let editor = LlmPromptEditor::new(
            AgentId::from("agent_1"),
            LlmId::from("llm_1"),
            None,
            None,
            "You are a helpful caller.\nBe brief.",
        );
        assert_eq!(editor.text(), "You are a helpful caller.\nBe brief.");
    }
}
