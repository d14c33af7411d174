//! Response envelope shared by every backend endpoint.
//!
//! ```json
//! { "status": "success" | "error", "data": ..., "message": "..." }
//! ```

use crate::{BackendError, BackendResult, EnvelopeStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: EnvelopeStatus,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: Some(data),
            message: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: None,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Unwrap the payload, which may legitimately be absent.
    ///
    /// `action` names the operation for the fallback error message when the
    /// backend reports an error without one.
    pub fn into_optional(self, action: &str) -> BackendResult<Option<T>> {
        match self.status {
            EnvelopeStatus::Success => Ok(self.data),
            EnvelopeStatus::Error => Err(BackendError::Backend(
                self.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| format!("Failed to {}", action)),
            )),
        }
    }

    /// Unwrap a payload that must be present.
    pub fn into_data(self, action: &str) -> BackendResult<T> {
        self.into_optional(action)?
            .ok_or_else(|| BackendError::Decode(format!("Failed to {}: no data returned", action)))
    }
}

impl<T> Envelope<Vec<T>> {
    /// Unwrap a list payload; an absent list is empty.
    pub fn into_list(self, action: &str) -> BackendResult<Vec<T>> {
        Ok(self.into_optional(action)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_surfaces_message() {
        let envelope: Envelope<u32> = Envelope::error("phone already exists");
        assert_eq!(
            envelope.into_data("save contact"),
            Err(BackendError::Backend("phone already exists".to_string()))
        );
    }

    #[test]
    fn test_error_envelope_without_message_uses_action() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(
            envelope.into_optional("delete project"),
            Err(BackendError::Backend("Failed to delete project".to_string()))
        );
    }

    #[test]
    fn test_missing_list_is_empty() {
        let envelope: Envelope<Vec<u32>> = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(envelope.into_list("list projects"), Ok(vec![]));
    }

    #[test]
    fn test_missing_required_data_is_decode_error() {
        let envelope: Envelope<u32> = Envelope::empty();
        assert!(matches!(
            envelope.into_data("create project"),
            Err(BackendError::Decode(_))
        ));
    }
}
