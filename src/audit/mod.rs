//! Structured audit trail for provisioning operations.
//!
//! Every create/read/delete/list posts an [`AuditEvent`] describing what
//! happened. Events are buffered on a lock-free channel ([`buffer`]) and
//! flushed in batches by a background worker to an [`AuditSink`] — in
//! production an append-only JSON-lines file, date-partitioned
//! (`audit-YYYY-MM-DD.json`).
//!
//! The trail is observability only: a sink failure is logged and swallowed,
//! never surfaced to the provisioning operation that produced the event.

pub mod buffer;
pub mod sink;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use buffer::{AuditBuffer, AuditBufferConfig};
pub use sink::{AuditSink, FileSink};

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
}

/// One audit record, serialized as a single JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    /// Provisioning operation, e.g. "create", "delete", "list"
    pub operation: String,

    /// Resource type, e.g. "User"
    pub resource: String,

    /// Identifier of the affected resource, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Whether the operation succeeded
    pub status: AuditStatus,

    /// Operation-specific payload (e.g. the invited email)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Error text for failed operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    /// Record a successful operation.
    pub fn success(
        operation: impl Into<String>,
        resource: impl Into<String>,
        resource_id: Option<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            resource: resource.into(),
            resource_id,
            status: AuditStatus::Success,
            details,
            error: None,
        }
    }

    /// Record a failed operation.
    pub fn failure(
        operation: impl Into<String>,
        resource: impl Into<String>,
        resource_id: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            resource: resource.into(),
            resource_id,
            status: AuditStatus::Failure,
            details: None,
            error: Some(error.into()),
        }
    }
}

/// Errors from audit sinks.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to write audit log: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize audit event: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_event_json_lines_shape() {
        let event = AuditEvent::success(
            "create",
            "User",
            Some("42".to_string()),
            Some(serde_json::json!({"email": "ada@example.com"})),
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["operation"], "create");
        assert_eq!(json["resource"], "User");
        assert_eq!(json["resourceId"], "42");
        assert_eq!(json["status"], "success");
        assert_eq!(json["details"]["email"], "ada@example.com");
        assert!(json.get("error").is_none());
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_failure_event_carries_error_only() {
        let event = AuditEvent::failure("delete", "User", Some("octocat".to_string()), "boom");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["status"], "failure");
        assert_eq!(json["error"], "boom");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_event_without_resource_id_omits_field() {
        let event = AuditEvent::success("list", "User", None, None);
        let json = serde_json::to_value(&event).unwrap();

        assert!(json.get("resourceId").is_none());
    }
}
