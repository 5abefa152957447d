//! SCIM 2.0 discovery endpoint (RFC 7644 Section 4).

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::scim::{SCIM_MEDIA_TYPE, ScimErrorResponse, ServiceProviderConfig};

/// SCIM JSON response with correct Content-Type.
pub struct ScimJson<T>(pub T);

impl<T: Serialize> IntoResponse for ScimJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => Response::builder()
                .status(StatusCode::OK)
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

/// Get the SCIM Service Provider Configuration.
///
/// `GET /scim/v2/ServiceProviderConfig`
///
/// A static capability descriptor — patch is declared, bulk/filter/sort/
/// etag/password changes are not, and bearer token is the only
/// authentication scheme. Returned unconditionally; no failure path.
#[tracing::instrument(name = "scim.discovery.service_provider_config", skip_all)]
pub async fn service_provider_config() -> impl IntoResponse {
    ScimJson(ServiceProviderConfig::default())
}
