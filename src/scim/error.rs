//! SCIM 2.0 error envelope per RFC 7644 Section 3.12.
//!
//! Every failed operation surfaces as this body shape; nothing else ever
//! crosses the protocol boundary on failure.

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::types::{SCHEMA_ERROR, SCIM_MEDIA_TYPE};

/// SCIM error response per RFC 7644.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimErrorResponse {
    /// SCIM schema URIs (always contains the Error schema)
    pub schemas: Vec<String>,

    /// HTTP status code as a string (e.g., "400", "404")
    pub status: String,

    /// SCIM-specific error type (optional, per RFC 7644)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scim_type: Option<ScimErrorType>,

    /// Human-readable error detail
    pub detail: String,
}

impl ScimErrorResponse {
    fn new(status: StatusCode, scim_type: Option<ScimErrorType>, detail: impl Into<String>) -> Self {
        Self {
            schemas: vec![SCHEMA_ERROR.to_string()],
            status: status.as_u16().to_string(),
            scim_type,
            detail: detail.into(),
        }
    }

    /// Invalid JSON syntax error (400)
    pub fn invalid_syntax(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            Some(ScimErrorType::InvalidSyntax),
            detail,
        )
    }

    /// Invalid attribute value (400)
    pub fn invalid_value(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            Some(ScimErrorType::InvalidValue),
            detail,
        )
    }

    /// Generic bad request without specific scimType (400)
    #[allow(dead_code)] // Part of the envelope constructor set
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, None, detail)
    }

    /// Resource not found (404)
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, None, detail)
    }

    /// Internal server error (500)
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, None, detail)
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status.parse().unwrap_or(500))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ScimErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match serde_json::to_vec(&self) {
            Ok(body) => Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, SCIM_MEDIA_TYPE)
                .body(Body::from(body))
                .unwrap(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize SCIM error response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// SCIM error types per RFC 7644 Section 3.12, limited to the kinds the
/// bridge emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScimErrorType {
    /// Request body has invalid JSON syntax
    InvalidSyntax,

    /// Attribute value is invalid for its type
    InvalidValue,
}

impl std::fmt::Display for ScimErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScimErrorType::InvalidSyntax => write!(f, "invalidSyntax"),
            ScimErrorType::InvalidValue => write!(f, "invalidValue"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_shape() {
        let err = ScimErrorResponse::invalid_value("User must have at least one email address");

        assert_eq!(err.status, "400");
        assert_eq!(err.scim_type, Some(ScimErrorType::InvalidValue));

        let json = serde_json::to_string_pretty(&err).unwrap();
        assert!(json.contains("\"scimType\": \"invalidValue\""));
        assert!(json.contains("\"status\": \"400\""));
        assert!(json.contains(SCHEMA_ERROR));
    }

    #[test]
    fn test_not_found_omits_scim_type() {
        let err = ScimErrorResponse::not_found("User not found");

        assert_eq!(err.status, "404");
        assert_eq!(err.scim_type, None);

        let json = serde_json::to_string_pretty(&err).unwrap();
        assert!(!json.contains("scimType"));
    }

    #[test]
    fn test_status_code_round_trip() {
        assert_eq!(
            ScimErrorResponse::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ScimErrorResponse::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ScimErrorResponse::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_content_type() {
        let response = ScimErrorResponse::internal("remote call failed").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            SCIM_MEDIA_TYPE
        );
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(format!("{}", ScimErrorType::InvalidSyntax), "invalidSyntax");
        assert_eq!(format!("{}", ScimErrorType::InvalidValue), "invalidValue");
    }
}
