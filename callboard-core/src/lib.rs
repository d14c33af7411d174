//! CALLBOARD Core - Domain and Wire Types
//!
//! Typed mirrors of the call-center backend's resources, the request bodies
//! it accepts, its response envelope, and the [`CallCenterApi`] trait every
//! other crate talks to the backend through. No I/O lives here.

mod api;
mod entities;
mod enums;
mod envelope;
mod error;
mod identity;
pub mod phone;
mod requests;

pub use api::CallCenterApi;
pub use entities::*;
pub use enums::*;
pub use envelope::Envelope;
pub use error::*;
pub use identity::*;
pub use phone::{push_phone_char, sanitize_phone_input, PhoneNumber, PHONE_MAX_DIGITS};
pub use requests::*;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contact_decodes_wire_names() {
        let contact: Contact = serde_json::from_value(json!({
            "_id": "c1",
            "name": "Ada",
            "phoneNumber": "5551234567",
            "projectId": "p1",
            "status": "processing",
            "createdAt": "2024-05-01T10:00:00Z",
            "someFutureField": 42
        }))
        .unwrap();

        assert_eq!(contact.id, ContactId::new("c1"));
        assert_eq!(contact.project_id, Some(ProjectId::new("p1")));
        assert_eq!(contact.status, ContactStatus::Processing);
        assert!(contact.updated_at.is_none());
    }

    #[test]
    fn test_contact_with_last_call_flattens() {
        let row: ContactWithLastCall = serde_json::from_value(json!({
            "_id": "c1",
            "name": "Ada",
            "phoneNumber": "5551234567",
            "lastCallDetail": {
                "_id": "d1",
                "customerId": "c1",
                "callId": "call_1",
                "callStatus": "ongoing",
                "callAnalysis": {
                    "call_summary": "Left a message",
                    "in_voicemail": true,
                    "custom_analysis_data": {"interested": false}
                }
            }
        }))
        .unwrap();

        let detail = row.last_call_detail.unwrap();
        assert_eq!(row.contact.name, "Ada");
        assert_eq!(detail.call_status, CallStatus::InProgress);
        let analysis = detail.call_analysis.unwrap();
        assert_eq!(analysis.in_voicemail, Some(true));
        assert_eq!(analysis.custom_analysis_data["interested"], json!(false));
    }

    #[test]
    fn test_call_status_aliases() {
        assert_eq!(CallStatus::from("registered".to_string()), CallStatus::NotStarted);
        assert_eq!(CallStatus::from("error".to_string()), CallStatus::Failed);
        assert_eq!(CallStatus::from("completed".to_string()), CallStatus::Ended);
        assert_eq!(CallStatus::from("IN_PROGRESS".to_string()), CallStatus::InProgress);

        let unknown = CallStatus::from("dialing".to_string());
        assert_eq!(unknown, CallStatus::Unknown("dialing".to_string()));
        assert!(!unknown.is_terminal());
        assert_eq!(unknown.contact_status(), ContactStatus::Processing);
    }

    #[test]
    fn test_call_status_serializes_canonical() {
        let value = serde_json::to_value(CallStatus::InProgress).unwrap();
        assert_eq!(value, json!("in-progress"));
    }

    #[test]
    fn test_freshness_prefers_updated_at() {
        let base: CallDetail = serde_json::from_value(json!({
            "_id": "d1",
            "customerId": "c1",
            "callId": "call_1",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:05:00Z"
        }))
        .unwrap();

        let mut older = base.clone();
        older.updated_at = None;
        assert!(base.supersedes(&older));
        assert!(!older.supersedes(&base));

        let mut bare = base.clone();
        bare.created_at = None;
        bare.updated_at = None;
        assert!(bare.supersedes(&base));
    }

    #[test]
    fn test_search_group_counts_fall_back_to_lists() {
        let group: SearchGroup = serde_json::from_value(json!({
            "_id": "g1",
            "name": "Leads",
            "customers": [
                {"_id": "c1", "name": "Ada", "phoneNumber": "5550000001"},
                {"name": "Bob", "phoneNumber": "5550000002"}
            ],
            "projects": [{"_id": "p1", "name": "Spring"}]
        }))
        .unwrap();

        assert_eq!(group.member_count(), 2);
        assert_eq!(group.linked_project_count(), 1);
        assert!(group.is_linked_to(&ProjectId::new("p1")));
        assert!(group.customers[1].id.is_none());
        assert_eq!(group.settings, GroupSettings::default());
    }

    #[test]
    fn test_agent_llm_id() {
        let agent: Agent = serde_json::from_value(json!({
            "agent_id": "ag_1",
            "agent_name": "Outbound",
            "response_engine": {"type": "retell-llm", "llm_id": "llm_9"}
        }))
        .unwrap();
        assert_eq!(agent.llm_id(), Some(&LlmId::new("llm_9")));
    }

    #[test]
    fn test_llm_keeps_unknown_fields() {
        let llm: Llm = serde_json::from_value(json!({
            "llm_id": "llm_9",
            "general_prompt": "Be brief",
            "begin_message": "Hi"
        }))
        .unwrap();
        assert_eq!(llm.extra["begin_message"], json!("Hi"));
    }

    #[test]
    fn test_contact_update_omits_absent_fields() {
        let update = ContactUpdate {
            project_id: Some(ProjectId::new("p1")),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(update).unwrap(), json!({"projectId": "p1"}));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_call_status() -> impl Strategy<Value = CallStatus> {
        prop_oneof![
            Just(CallStatus::NotStarted),
            Just(CallStatus::InProgress),
            Just(CallStatus::Ended),
            Just(CallStatus::Failed),
            "[a-z]{3,12}".prop_map(CallStatus::from),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_terminal_call_maps_to_terminal_contact(status in arb_call_status()) {
            prop_assert_eq!(status.is_terminal(), status.contact_status().is_terminal());
        }

        #[test]
        fn prop_call_status_string_roundtrip(status in arb_call_status()) {
            let wire: String = status.clone().into();
            prop_assert_eq!(CallStatus::from(wire), status);
        }
    }
}
