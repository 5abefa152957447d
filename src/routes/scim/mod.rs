//! SCIM 2.0 HTTP surface, mounted at `/scim/v2`.
//!
//! | Operation    | Route                      | Success |
//! |--------------|----------------------------|---------|
//! | Capabilities | GET /ServiceProviderConfig | 200     |
//! | Create       | POST /Users                | 201     |
//! | Read         | GET /Users/{id}            | 200     |
//! | Delete       | DELETE /Users/{id}         | 204     |
//! | List         | GET /Users                 | 200     |
//!
//! All bodies use `application/scim+json`; failures are always the SCIM
//! error envelope.

pub mod discovery;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// Build the SCIM router.
pub fn scim_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/ServiceProviderConfig",
            get(discovery::service_provider_config),
        )
        .route("/Users", post(users::create_user).get(users::list_users))
        .route(
            "/Users/{id}",
            get(users::get_user).delete(users::delete_user),
        )
}
