//! Contact roster: the draft editor for new rows and the persisted roster
//! with its cached call details and multi-selection.

use callboard_core::{
    push_phone_char, sanitize_phone_input, BackendError, CallCenterApi, CallDetail, Contact,
    ContactId, ContactStatus, ContactWithLastCall, NewContact, ProjectId,
};
use uuid::Uuid;

/// Blank rows a fresh editor starts with.
pub const INITIAL_DRAFT_ROWS: usize = 2;

// ============================================================================
// DRAFT EDITOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRow {
    /// Local key, never sent to the backend.
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

impl DraftRow {
    pub fn blank() -> Self {
        Self {
            id: Uuid::now_v7(),
            name: String::new(),
            phone: String::new(),
        }
    }

    /// Non-blank name and non-blank phone.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.phone.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEditor {
    rows: Vec<DraftRow>,
}

impl Default for RosterEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl RosterEditor {
    pub fn new() -> Self {
        Self {
            rows: (0..INITIAL_DRAFT_ROWS).map(|_| DraftRow::blank()).collect(),
        }
    }

    pub fn rows(&self) -> &[DraftRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn add_row(&mut self) -> usize {
        self.rows.push(DraftRow::blank());
        self.rows.len() - 1
    }

    /// Removes a row. The last remaining row cannot be removed.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.rows.len() <= 1 || index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        true
    }

    pub fn set_name(&mut self, index: usize, name: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.name = name.into();
        }
    }

    /// Stores the sanitized form of `raw`.
    pub fn set_phone(&mut self, index: usize, raw: &str) {
        if let Some(row) = self.rows.get_mut(index) {
            row.phone = sanitize_phone_input(raw);
        }
    }

    /// Keystroke entry into a phone cell. Returns whether the char was kept.
    pub fn push_phone_char(&mut self, index: usize, c: char) -> bool {
        self.rows
            .get_mut(index)
            .map(|row| push_phone_char(&mut row.phone, c))
            .unwrap_or(false)
    }

    pub fn valid_rows(&self) -> Vec<&DraftRow> {
        self.rows.iter().filter(|row| row.is_valid()).collect()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn discard(&mut self, id: Uuid) {
        self.rows.retain(|row| row.id != id);
        if self.rows.is_empty() {
            self.rows.push(DraftRow::blank());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Enter at least one contact with a name and phone number")]
    NoValidRows,

    #[error("Saved {saved} contact(s) before failing: {source}")]
    Failed {
        saved: usize,
        #[source]
        source: BackendError,
    },
}

/// Submit every valid draft row to the backend, one at a time.
///
/// On success the editor is reset. On the first failure the remaining rows
/// are left untouched; rows already saved are dropped from the draft.
pub async fn save_drafts<A>(
    api: &A,
    project_id: &ProjectId,
    editor: &mut RosterEditor,
) -> Result<usize, SaveError>
where
    A: CallCenterApi + ?Sized,
{
    let pending: Vec<DraftRow> = editor.valid_rows().into_iter().cloned().collect();
    if pending.is_empty() {
        return Err(SaveError::NoValidRows);
    }

    let mut saved = 0;
    for row in pending {
        let request = NewContact {
            name: row.name.trim().to_string(),
            phone_number: row.phone.clone(),
            project_id: project_id.clone(),
            note: None,
        };
        match api.create_contact(request).await {
            Ok(contact) => {
                tracing::debug!(contact_id = %contact.id, project_id = %project_id, "Contact saved");
                editor.discard(row.id);
                saved += 1;
            }
            Err(source) => {
                tracing::warn!(project_id = %project_id, saved, error = %source, "Contact save failed");
                return Err(SaveError::Failed { saved, source });
            }
        }
    }

    editor.reset();
    tracing::info!(project_id = %project_id, saved, "Draft rows saved");
    Ok(saved)
}

// ============================================================================
// PERSISTED ROSTER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub contact: Contact,
    pub last_call: Option<CallDetail>,
}

impl RosterEntry {
    /// Status shown to the user: derived from the cached call detail when
    /// one exists, otherwise the server-reported contact status.
    pub fn display_status(&self) -> ContactStatus {
        match &self.last_call {
            Some(detail) => detail.call_status.contact_status(),
            None => self.contact.status,
        }
    }

    /// Absent or terminal call detail.
    pub fn is_settled(&self) -> bool {
        self.last_call
            .as_ref()
            .map_or(true, |detail| detail.call_status.is_terminal())
    }
}

impl From<ContactWithLastCall> for RosterEntry {
    fn from(row: ContactWithLastCall) -> Self {
        Self {
            contact: row.contact,
            last_call: row.last_call_detail,
        }
    }
}

/// Persisted contacts of the active project plus the dispatch selection.
///
/// Selection is keyed by phone number and kept in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    selection: Vec<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ContactId) -> Option<&RosterEntry> {
        self.entries.iter().find(|entry| &entry.contact.id == id)
    }

    /// Replace the whole roster after a reload. Selections whose phone no
    /// longer appears are dropped.
    pub fn replace_all(&mut self, rows: Vec<ContactWithLastCall>) {
        self.entries = rows.into_iter().map(RosterEntry::from).collect();
        let entries = &self.entries;
        self.selection
            .retain(|phone| entries.iter().any(|e| &e.contact.phone_number == phone));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.selection.clear();
    }

    /// Toggle a contact in or out of the selection. Returns the new state.
    pub fn toggle_selection(&mut self, id: &ContactId) -> bool {
        let Some(phone) = self.get(id).map(|e| e.contact.phone_number.clone()) else {
            return false;
        };
        if let Some(pos) = self.selection.iter().position(|p| p == &phone) {
            self.selection.remove(pos);
            false
        } else {
            self.selection.push(phone);
            true
        }
    }

    pub fn is_selected(&self, contact: &Contact) -> bool {
        self.selection.contains(&contact.phone_number)
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected contacts in selection order.
    pub fn selected_contacts(&self) -> Vec<&Contact> {
        self.selection
            .iter()
            .filter_map(|phone| {
                self.entries
                    .iter()
                    .find(|e| &e.contact.phone_number == phone)
                    .map(|e| &e.contact)
            })
            .collect()
    }

    /// Drop a contact from the roster and from the selection.
    pub fn remove_contact(&mut self, id: &ContactId) -> Option<Contact> {
        let pos = self.entries.iter().position(|e| &e.contact.id == id)?;
        let removed = self.entries.remove(pos).contact;
        self.selection.retain(|phone| phone != &removed.phone_number);
        Some(removed)
    }

    /// Merge a poll result into the cached call details.
    ///
    /// Rows are matched by contact id, falling back to phone number. A
    /// cached detail is only replaced by one at least as fresh. Returns the
    /// number of entries whose cached detail changed.
    pub fn merge_call_details(&mut self, incoming: Vec<ContactWithLastCall>) -> usize {
        let mut updated = 0;
        for row in incoming {
            let Some(detail) = row.last_call_detail else {
                continue;
            };
            let position = self
                .entries
                .iter()
                .position(|e| e.contact.id == row.contact.id)
                .or_else(|| {
                    self.entries
                        .iter()
                        .position(|e| e.contact.phone_number == row.contact.phone_number)
                });
            let Some(entry) = position.and_then(|pos| self.entries.get_mut(pos)) else {
                continue;
            };
            let replace = match &entry.last_call {
                Some(cached) => detail.supersedes(cached),
                None => true,
            };
            if replace && entry.last_call.as_ref() != Some(&detail) {
                entry.last_call = Some(detail);
                updated += 1;
            }
        }
        updated
    }

    /// Every contact's cached call detail is absent or terminal.
    pub fn all_settled(&self) -> bool {
        self.entries.iter().all(RosterEntry::is_settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::{CallStatus, EntityIdType};
    use callboard_test_utils::{fixtures, MockBackend};

    fn roster_with(contacts: &[Contact]) -> Roster {
        let mut roster = Roster::new();
        roster.replace_all(
            contacts
                .iter()
                .cloned()
                .map(|c| fixtures::with_last_call(c, None))
                .collect(),
        );
        roster
    }

    #[test]
    fn test_editor_starts_with_two_blank_rows() {
        let editor = RosterEditor::new();
        assert_eq!(editor.len(), INITIAL_DRAFT_ROWS);
        assert!(editor.valid_rows().is_empty());
    }

    #[test]
    fn test_last_row_cannot_be_removed() {
        let mut editor = RosterEditor::new();
        assert!(editor.remove_row(0));
        assert!(!editor.remove_row(0));
        assert_eq!(editor.len(), 1);
    }

    #[test]
    fn test_phone_entry_is_sanitized() {
        let mut editor = RosterEditor::new();
        editor.set_phone(0, "(555) 123-4567 ext 89");
        assert_eq!(editor.rows()[0].phone, "5551234567");
        assert!(!editor.push_phone_char(0, '8'));
        assert!(!editor.push_phone_char(1, 'x'));
        assert!(editor.push_phone_char(1, '5'));
    }

    #[test]
    fn test_blank_name_row_is_not_valid() {
        let mut editor = RosterEditor::new();
        editor.set_name(0, "   ");
        editor.set_phone(0, "5551234567");
        assert!(editor.valid_rows().is_empty());
    }

    #[tokio::test]
    async fn test_save_without_valid_rows_sends_nothing() {
        let api = MockBackend::new();
        let mut editor = RosterEditor::new();
        editor.set_name(0, "Ada");

        let result = save_drafts(&api, &ProjectId::new("p1"), &mut editor).await;

        assert!(matches!(result, Err(SaveError::NoValidRows)));
        assert_eq!(api.request_count(), 0);
    }

    #[tokio::test]
    async fn test_save_resets_editor_on_success() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        let mut editor = RosterEditor::new();
        editor.set_name(0, "Ada");
        editor.set_phone(0, "5550000001");
        editor.set_name(1, "Grace");
        editor.set_phone(1, "5550000002");
        let before: Vec<Uuid> = editor.rows().iter().map(|r| r.id).collect();

        let saved = save_drafts(&api, &project.id, &mut editor).await.unwrap();

        assert_eq!(saved, 2);
        assert_eq!(editor.len(), INITIAL_DRAFT_ROWS);
        assert!(editor.rows().iter().all(|r| r.name.is_empty() && r.phone.is_empty()));
        assert!(editor.rows().iter().all(|r| !before.contains(&r.id)));
        assert_eq!(api.requests_to("POST", "/customers").len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_unsaved_rows_only() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        api.fail_after(
            "POST",
            "/customers",
            1,
            BackendError::Status {
                status: 409,
                body: "duplicate phone".to_string(),
            },
        );
        let mut editor = RosterEditor::new();
        editor.add_row();
        for (i, (name, phone)) in [("Ada", "5550000001"), ("Grace", "5550000002"), ("Linus", "5550000003")]
            .iter()
            .enumerate()
        {
            editor.set_name(i, *name);
            editor.set_phone(i, phone);
        }

        let result = save_drafts(&api, &project.id, &mut editor).await;

        match result {
            Err(SaveError::Failed { saved, source }) => {
                assert_eq!(saved, 1);
                assert_eq!(source.to_string(), "HTTP 409: duplicate phone");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // Third row never attempted.
        assert_eq!(api.requests_to("POST", "/customers").len(), 2);
        let names: Vec<&str> = editor.rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Grace", "Linus"]);
    }

    #[test]
    fn test_selection_follows_selection_order() {
        let pid = ProjectId::new("p1");
        let a = fixtures::contact("c1", "Ada", "5550000001", Some(&pid));
        let b = fixtures::contact("c2", "Grace", "5550000002", Some(&pid));
        let mut roster = roster_with(&[a.clone(), b.clone()]);

        assert!(roster.toggle_selection(&b.id));
        assert!(roster.toggle_selection(&a.id));

        let order: Vec<&str> = roster.selected_contacts().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["Grace", "Ada"]);
        assert!(!roster.toggle_selection(&b.id));
        assert_eq!(roster.selection_len(), 1);
    }

    #[test]
    fn test_remove_contact_drops_selection() {
        let pid = ProjectId::new("p1");
        let a = fixtures::contact("c1", "Ada", "5550000001", Some(&pid));
        let mut roster = roster_with(&[a.clone()]);
        roster.toggle_selection(&a.id);

        assert!(roster.remove_contact(&a.id).is_some());
        assert!(roster.is_empty());
        assert_eq!(roster.selection_len(), 0);
    }

    #[test]
    fn test_display_status_prefers_call_detail() {
        let mut contact = fixtures::contact("c1", "Ada", "5550000001", None);
        contact.status = ContactStatus::Failed;
        let entry = RosterEntry {
            contact: contact.clone(),
            last_call: Some(fixtures::call_detail("d1", "c1", CallStatus::InProgress)),
        };
        assert_eq!(entry.display_status(), ContactStatus::Processing);

        let bare = RosterEntry {
            contact,
            last_call: None,
        };
        assert_eq!(bare.display_status(), ContactStatus::Failed);
    }

    #[test]
    fn test_merge_never_goes_back_in_time() {
        let a = fixtures::contact("c1", "Ada", "5550000001", None);
        let mut roster = roster_with(&[a.clone()]);

        let mut newer = fixtures::call_detail("d1", "c1", CallStatus::Ended);
        newer.updated_at = Some(fixtures::at(20));
        let mut older = fixtures::call_detail("d1", "c1", CallStatus::InProgress);
        older.updated_at = Some(fixtures::at(10));

        assert_eq!(roster.merge_call_details(vec![fixtures::with_last_call(a.clone(), Some(newer))]), 1);
        assert_eq!(roster.merge_call_details(vec![fixtures::with_last_call(a.clone(), Some(older))]), 0);
        assert_eq!(roster.entries()[0].display_status(), ContactStatus::Completed);
    }

    #[test]
    fn test_merge_falls_back_to_phone_and_ignores_strangers() {
        let a = fixtures::contact("c1", "Ada", "5550000001", None);
        let mut roster = roster_with(&[a]);

        let renamed = fixtures::contact("c1-new", "Ada", "5550000001", None);
        let stranger = fixtures::contact("c9", "Eve", "5559999999", None);
        let updated = roster.merge_call_details(vec![
            fixtures::with_last_call(renamed, Some(fixtures::call_detail("d1", "c1-new", CallStatus::Failed))),
            fixtures::with_last_call(stranger, Some(fixtures::call_detail("d2", "c9", CallStatus::Ended))),
        ]);

        assert_eq!(updated, 1);
        assert_eq!(roster.len(), 1);
        assert!(roster.all_settled());
    }

    #[test]
    fn test_all_settled_treats_missing_detail_as_settled() {
        let a = fixtures::contact("c1", "Ada", "5550000001", None);
        let b = fixtures::contact("c2", "Grace", "5550000002", None);
        let mut roster = roster_with(&[a, b.clone()]);
        assert!(roster.all_settled());

        roster.merge_call_details(vec![fixtures::with_last_call(
            b,
            Some(fixtures::call_detail("d1", "c2", CallStatus::NotStarted)),
        )]);
        assert!(!roster.all_settled());
    }
}
