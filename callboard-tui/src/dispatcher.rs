//! Bulk call dispatch for the selected roster contacts.

use std::time::Instant;

use callboard_core::{BackendError, CallCenterApi, CallRequest, ProjectId};

use crate::poller::PollingReconciler;
use crate::roster::Roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub dispatched: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Select at least one contact")]
    NothingSelected,

    #[error("Started {dispatched} call(s), then calling {contact} failed: {source}")]
    Failed {
        dispatched: usize,
        contact: String,
        #[source]
        source: BackendError,
    },
}

/// Start one call per selected contact, sequentially and in selection
/// order.
///
/// The first failure aborts the loop; calls already started stay started
/// and the selection is kept. When every call starts, the selection is
/// cleared and the reconciler is armed at `now`.
pub async fn dispatch_calls<A>(
    api: &A,
    project_id: &ProjectId,
    roster: &mut Roster,
    reconciler: &mut PollingReconciler,
    now: Instant,
) -> Result<DispatchOutcome, DispatchError>
where
    A: CallCenterApi + ?Sized,
{
    let requests: Vec<CallRequest> = roster
        .selected_contacts()
        .into_iter()
        .map(|contact| CallRequest {
            name: contact.name.clone(),
            phone_number: contact.phone_number.clone(),
            project_id: project_id.clone(),
        })
        .collect();
    if requests.is_empty() {
        return Err(DispatchError::NothingSelected);
    }

    let mut dispatched = 0;
    for request in requests {
        let contact = request.name.clone();
        if let Err(source) = api.start_call(request).await {
            tracing::warn!(
                project_id = %project_id,
                dispatched,
                contact = %contact,
                error = %source,
                "Call dispatch aborted"
            );
            return Err(DispatchError::Failed {
                dispatched,
                contact,
                source,
            });
        }
        dispatched += 1;
    }

    roster.clear_selection();
    reconciler.arm(now);
    tracing::info!(project_id = %project_id, dispatched, "Calls dispatched, polling armed");
    Ok(DispatchOutcome { dispatched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::ContactId;
    use callboard_test_utils::MockBackend;
    use std::time::Duration;

    async fn loaded_roster(api: &MockBackend, project_id: &ProjectId) -> Roster {
        let mut roster = Roster::new();
        roster.replace_all(api.list_contacts_with_last_call(project_id).await.unwrap());
        api.clear_journal();
        roster
    }

    fn reconciler() -> PollingReconciler {
        PollingReconciler::new(Duration::from_secs(10), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_nothing_selected_sends_nothing() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        api.seed_contact(&project.id, "Ada", "5550000001");
        let mut roster = loaded_roster(&api, &project.id).await;
        let mut poller = reconciler();

        let result = dispatch_calls(&api, &project.id, &mut roster, &mut poller, Instant::now()).await;

        assert!(matches!(result, Err(DispatchError::NothingSelected)));
        assert_eq!(api.request_count(), 0);
        assert!(!poller.is_polling());
    }

    #[tokio::test]
    async fn test_dispatch_follows_selection_order_and_arms_polling() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        let ada = api.seed_contact(&project.id, "Ada", "5550000001");
        let grace = api.seed_contact(&project.id, "Grace", "5550000002");
        let mut roster = loaded_roster(&api, &project.id).await;
        roster.toggle_selection(&grace.id);
        roster.toggle_selection(&ada.id);
        let mut poller = reconciler();
        let now = Instant::now();

        let outcome = dispatch_calls(&api, &project.id, &mut roster, &mut poller, now)
            .await
            .unwrap();

        assert_eq!(outcome.dispatched, 2);
        let phones: Vec<String> = api.started_calls().into_iter().map(|c| c.phone_number).collect();
        assert_eq!(phones, vec!["5550000002", "5550000001"]);
        assert_eq!(roster.selection_len(), 0);
        assert_eq!(poller.started_at(), Some(now));
    }

    #[tokio::test]
    async fn test_failure_aborts_and_keeps_selection() {
        let api = MockBackend::new();
        let project = api.seed_project("Spring campaign");
        let ids: Vec<ContactId> = ["5550000001", "5550000002", "5550000003"]
            .iter()
            .enumerate()
            .map(|(i, phone)| api.seed_contact(&project.id, &format!("Contact {}", i), phone).id)
            .collect();
        api.fail_calls_to(
            "5550000002",
            BackendError::Status {
                status: 502,
                body: "provider unavailable".to_string(),
            },
        );
        let mut roster = loaded_roster(&api, &project.id).await;
        for id in &ids {
            roster.toggle_selection(id);
        }
        let mut poller = reconciler();

        let result = dispatch_calls(&api, &project.id, &mut roster, &mut poller, Instant::now()).await;

        match result {
            Err(DispatchError::Failed { dispatched, contact, source }) => {
                assert_eq!(dispatched, 1);
                assert_eq!(contact, "Contact 1");
                assert_eq!(source.to_string(), "HTTP 502: provider unavailable");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(api.requests_to("POST", "/retell/call").len(), 2);
        assert_eq!(roster.selection_len(), 3);
        assert!(!poller.is_polling());
    }
}
