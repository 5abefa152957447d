//! SCIM 2.0 User resource endpoints.
//!
//! Per-request flow: extract/validate the SCIM resource, hand it to the
//! provisioning service, and shape the result into `application/scim+json`.
//! No cross-request state; failures always come back as the SCIM error
//! envelope via `From<ProvisioningError>`.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    AppState,
    scim::{SCIM_MEDIA_TYPE, ScimErrorResponse, ScimUser},
};

/// Maximum accepted request body, matching the router-level limit.
const MAX_BODY_BYTES: usize = 256 * 1024;

// =============================================================================
// Custom Response Type for SCIM Content-Type
// =============================================================================

/// SCIM JSON response with correct Content-Type and status code.
pub struct ScimJsonWithStatus<T> {
    body: T,
    status: StatusCode,
}

impl<T: Serialize> ScimJsonWithStatus<T> {
    pub fn ok(body: T) -> Self {
        Self {
            body,
            status: StatusCode::OK,
        }
    }

    pub fn created(body: T) -> Self {
        Self {
            body,
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ScimJsonWithStatus<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.body) {
            Ok(body) => Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, SCIM_MEDIA_TYPE)
                .body(Body::from(body))
                .unwrap(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize SCIM response");
                ScimErrorResponse::internal("Failed to serialize response").into_response()
            }
        }
    }
}

// =============================================================================
// User Endpoints
// =============================================================================

/// Create a new user.
///
/// `POST /scim/v2/Users`
///
/// Maps to an organization invitation. Returns 201 Created with the SCIM
/// receipt on success; malformed JSON yields an `invalidSyntax` envelope
/// before the service is involved.
#[tracing::instrument(name = "scim.users.create", skip_all)]
pub async fn create_user(State(state): State<AppState>, request: axum::extract::Request) -> Response {
    let bytes = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            return ScimErrorResponse::invalid_syntax(format!("Failed to read request body: {}", e))
                .into_response();
        }
    };

    let scim_user: ScimUser = match serde_json::from_slice(&bytes) {
        Ok(u) => u,
        Err(e) => {
            return ScimErrorResponse::invalid_syntax(format!("Invalid JSON: {}", e))
                .into_response();
        }
    };

    match state.provisioning.create_user(&scim_user).await {
        Ok(created) => ScimJsonWithStatus::created(created).into_response(),
        Err(e) => ScimErrorResponse::from(e).into_response(),
    }
}

/// Get a user by GitHub login.
///
/// `GET /scim/v2/Users/{id}`
#[tracing::instrument(name = "scim.users.get", skip_all, fields(%id))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.provisioning.get_user(&id).await {
        Ok(user) => ScimJsonWithStatus::ok(user).into_response(),
        Err(e) => ScimErrorResponse::from(e).into_response(),
    }
}

/// Delete a user (remove the organization membership).
///
/// `DELETE /scim/v2/Users/{id}`
///
/// Success is 204 with no body.
#[tracing::instrument(name = "scim.users.delete", skip_all, fields(%id))]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.provisioning.delete_user(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ScimErrorResponse::from(e).into_response(),
    }
}

/// List all users.
///
/// `GET /scim/v2/Users`
///
/// Returns the whole membership in one page; filtering and pagination
/// parameters are not supported.
#[tracing::instrument(name = "scim.users.list", skip_all)]
pub async fn list_users(State(state): State<AppState>) -> Response {
    match state.provisioning.list_users().await {
        Ok(page) => ScimJsonWithStatus::ok(page).into_response(),
        Err(e) => ScimErrorResponse::from(e).into_response(),
    }
}
