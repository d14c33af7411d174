//! Import a search group's members into a project.

use callboard_core::{
    CallCenterApi, ContactUpdate, GroupMember, NewContact, ProjectId, SearchGroup, ValidationError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Existing contacts moved into the project.
    pub linked: usize,
    /// Members without a contact record, created in the project.
    pub created: usize,
    pub failed: usize,
    /// `Some(false)` when linking the group to the project failed; `None`
    /// when it was not attempted.
    pub project_attached: Option<bool>,
}

impl ImportSummary {
    pub fn succeeded(&self) -> usize {
        self.linked + self.created
    }

    pub fn message(&self) -> String {
        let mut message = format!(
            "Imported {} member(s): {} linked, {} created, {} failed",
            self.succeeded(),
            self.linked,
            self.created,
            self.failed
        );
        if self.project_attached == Some(false) {
            message.push_str(" (group not linked to project)");
        }
        message
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Attach every member of `group` to `project_id`.
///
/// Members are attempted independently and failures only count against the
/// summary. After at least one success the group is linked to the project.
pub async fn import_group<A>(
    api: &A,
    group: &SearchGroup,
    project_id: &ProjectId,
) -> Result<ImportSummary, ImportError>
where
    A: CallCenterApi + ?Sized,
{
    if group.customers.is_empty() {
        return Err(ValidationError::EmptyGroup(group.name.clone()).into());
    }

    let mut summary = ImportSummary::default();
    for member in &group.customers {
        match import_member(api, member, project_id).await {
            Ok(MemberOutcome::Linked) => summary.linked += 1,
            Ok(MemberOutcome::Created) => summary.created += 1,
            Err(error) => {
                tracing::warn!(
                    group_id = %group.id,
                    member = %member.name,
                    error = %error,
                    "Group member import failed"
                );
                summary.failed += 1;
            }
        }
    }

    if summary.succeeded() > 0 && !group.is_linked_to(project_id) {
        let attached = match api.link_project(&group.id, project_id).await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(group_id = %group.id, project_id = %project_id, error = %error, "Linking group to project failed");
                false
            }
        };
        summary.project_attached = Some(attached);
    }

    tracing::info!(
        group_id = %group.id,
        project_id = %project_id,
        linked = summary.linked,
        created = summary.created,
        failed = summary.failed,
        "Search group imported"
    );
    Ok(summary)
}

enum MemberOutcome {
    Linked,
    Created,
}

async fn import_member<A>(
    api: &A,
    member: &GroupMember,
    project_id: &ProjectId,
) -> callboard_core::BackendResult<MemberOutcome>
where
    A: CallCenterApi + ?Sized,
{
    match &member.id {
        Some(id) => {
            let update = ContactUpdate {
                project_id: Some(project_id.clone()),
                ..ContactUpdate::default()
            };
            api.update_contact(id, update).await?;
            Ok(MemberOutcome::Linked)
        }
        None => {
            let contact = NewContact {
                name: member.name.clone(),
                phone_number: member.phone_number.clone(),
                project_id: project_id.clone(),
                note: member.note.clone(),
            };
            api.create_contact(contact).await?;
            Ok(MemberOutcome::Created)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::BackendError;
    use callboard_test_utils::{fixtures, MockBackend};

    #[tokio::test]
    async fn test_empty_group_sends_nothing() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        let group = api.seed_group("Empty", Vec::new());
        api.clear_journal();

        let result = import_group(&api, &group, &project.id).await;

        assert!(matches!(
            result,
            Err(ImportError::Validation(ValidationError::EmptyGroup(_)))
        ));
        assert_eq!(api.request_count(), 0);
    }

    #[tokio::test]
    async fn test_members_are_linked_or_created() {
        let api = MockBackend::new();
        let source = api.seed_project("Old campaign");
        let target = api.seed_project("Spring campaign");
        let existing = api.seed_contact(&source.id, "Ada", "5550000001");
        let group = api.seed_group(
            "Warm leads",
            vec![fixtures::member_of(&existing), fixtures::external_member("Grace", "5550000002")],
        );

        let summary = import_group(&api, &group, &target.id).await.unwrap();

        assert_eq!(summary.linked, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.project_attached, Some(true));
        assert_eq!(api.requests_to("PUT", &format!("/customers/{}", existing.id)).len(), 1);
        assert_eq!(api.requests_to("POST", "/customers").len(), 1);
        assert!(api.group(&group.id).unwrap().is_linked_to(&target.id));
    }

    #[tokio::test]
    async fn test_partial_failure_is_counted_not_fatal() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        let group = api.seed_group(
            "Cold leads",
            vec![
                fixtures::external_member("Ada", "5550000001"),
                fixtures::external_member("Grace", "5550000002"),
                fixtures::external_member("Linus", "5550000003"),
            ],
        );
        api.fail_after("POST", "/customers", 1, BackendError::Backend("duplicate".to_string()));

        let summary = import_group(&api, &group, &project.id).await.unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(api.requests_to("POST", "/customers").len(), 3);
        assert_eq!(summary.message(), "Imported 1 member(s): 0 linked, 1 created, 2 failed");
    }

    #[tokio::test]
    async fn test_no_success_skips_project_link() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        let group = api.seed_group("Cold leads", vec![fixtures::external_member("Ada", "5550000001")]);
        api.fail_requests("POST", "/customers", BackendError::Backend("duplicate".to_string()));

        let summary = import_group(&api, &group, &project.id).await.unwrap();

        assert_eq!(summary.project_attached, None);
        assert!(api
            .requests_to("POST", &format!("/search-groups/{}/projects", group.id))
            .is_empty());
    }

    #[tokio::test]
    async fn test_link_failure_is_reported_in_summary() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        let group = api.seed_group("Warm leads", vec![fixtures::external_member("Ada", "5550000001")]);
        api.fail_requests("POST", "/search-groups", BackendError::Backend("locked".to_string()));

        let summary = import_group(&api, &group, &project.id).await.unwrap();

        assert_eq!(summary.project_attached, Some(false));
        assert!(summary.message().ends_with("(group not linked to project)"));
    }
}
