//! SCIM 2.0 user provisioning against the GitHub organization.
//!
//! This service is the single translation point between SCIM operations and
//! the membership directory: it validates the inbound resource, invokes the
//! directory, shapes the result (or failure) back into SCIM terms, and posts
//! an audit event. No state is carried between requests; the directory
//! arbitrates uniqueness, so concurrent creates for the same identity are
//! neither serialized nor deduplicated here.

use std::sync::Arc;

use serde_json::json;

use crate::{
    audit::{AuditBuffer, AuditEvent},
    directory::{DirectoryError, MembershipDirectory},
    scim::{
        MapError, ScimErrorResponse, ScimListResponse, ScimMeta, ScimUser, to_remote_invitation,
        to_scim_user,
    },
};

const RESOURCE_USER: &str = "User";

/// Provisioning error taxonomy.
///
/// Exactly three kinds cross the protocol boundary; the
/// [`From<ProvisioningError>`] impl on [`ScimErrorResponse`] is the one place
/// each kind is mapped to a status.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// Malformed SCIM input; never reaches the remote system.
    #[error("{0}")]
    Validation(String),

    /// The remote lookup returned no record. Terminal, not retried.
    #[error("User '{0}' not found")]
    NotFound(String),

    /// Any other failure from the membership directory. Subtypes are logged,
    /// not distinguished in the response.
    #[error(transparent)]
    Remote(#[from] DirectoryError),
}

impl From<MapError> for ProvisioningError {
    fn from(e: MapError) -> Self {
        ProvisioningError::Validation(e.to_string())
    }
}

impl From<ProvisioningError> for ScimErrorResponse {
    fn from(e: ProvisioningError) -> Self {
        match e {
            ProvisioningError::Validation(msg) => ScimErrorResponse::invalid_value(msg),
            ProvisioningError::NotFound(login) => {
                ScimErrorResponse::not_found(format!("User '{}' not found", login))
            }
            ProvisioningError::Remote(e) => ScimErrorResponse::internal(e.to_string()),
        }
    }
}

/// Stateless pass-through from SCIM operations to the membership directory.
#[derive(Clone)]
pub struct ProvisioningService {
    directory: Arc<dyn MembershipDirectory>,
    audit: Arc<AuditBuffer>,
}

impl ProvisioningService {
    pub fn new(directory: Arc<dyn MembershipDirectory>, audit: Arc<AuditBuffer>) -> Self {
        Self { directory, audit }
    }

    /// Create: derive an invitation from the SCIM user and send it.
    ///
    /// The response `id` is the remote-assigned invitation id and
    /// `meta.created` the remote creation timestamp. Validation failures are
    /// surfaced before any remote call is made.
    #[tracing::instrument(
        name = "provision.create",
        skip_all,
        fields(user_name = %user.user_name)
    )]
    pub async fn create_user(&self, user: &ScimUser) -> Result<ScimUser, ProvisioningError> {
        if user.user_name.trim().is_empty() {
            let err = ProvisioningError::Validation("userName must not be blank".to_string());
            self.audit_failure("create", None, &err);
            return Err(err);
        }

        let invitation = match to_remote_invitation(user) {
            Ok(invitation) => invitation,
            Err(e) => {
                let err = ProvisioningError::from(e);
                self.audit_failure("create", None, &err);
                return Err(err);
            }
        };

        let receipt = match self.directory.invite(&invitation).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::warn!(error = %e, email = %invitation.email, "Invitation failed");
                let err = ProvisioningError::from(e);
                self.audit_failure("create", None, &err);
                return Err(err);
            }
        };

        let id = receipt.id.to_string();
        tracing::info!(invitation_id = %id, email = %invitation.email, "User invited");
        self.audit.record(AuditEvent::success(
            "create",
            RESOURCE_USER,
            Some(id.clone()),
            Some(json!({
                "userName": invitation.username,
                "email": invitation.email,
            })),
        ));

        Ok(ScimUser {
            id: Some(id.clone()),
            emails: user.emails.clone(),
            active: true,
            meta: Some(
                ScimMeta::user(Some(receipt.created_at), None)
                    .with_location(format!("/scim/v2/Users/{}", id)),
            ),
            ..ScimUser::new(user.user_name.clone())
        })
    }

    /// Read: live lookup by GitHub login.
    #[tracing::instrument(name = "provision.get", skip_all, fields(%login))]
    pub async fn get_user(&self, login: &str) -> Result<ScimUser, ProvisioningError> {
        let member = match self.directory.get(login).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                let err = ProvisioningError::NotFound(login.to_string());
                self.audit_failure("get", Some(login), &err);
                return Err(err);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Membership lookup failed");
                let err = ProvisioningError::from(e);
                self.audit_failure("get", Some(login), &err);
                return Err(err);
            }
        };

        self.audit.record(AuditEvent::success(
            "get",
            RESOURCE_USER,
            Some(login.to_string()),
            None,
        ));
        Ok(to_scim_user(&member, login))
    }

    /// Delete: remove the membership. Success carries no body.
    #[tracing::instrument(name = "provision.delete", skip_all, fields(%login))]
    pub async fn delete_user(&self, login: &str) -> Result<(), ProvisioningError> {
        if let Err(e) = self.directory.remove(login).await {
            tracing::warn!(error = %e, "Membership removal failed");
            let err = ProvisioningError::from(e);
            self.audit_failure("delete", Some(login), &err);
            return Err(err);
        }

        tracing::info!("User removed from organization");
        self.audit.record(AuditEvent::success(
            "delete",
            RESOURCE_USER,
            Some(login.to_string()),
            None,
        ));
        Ok(())
    }

    /// List: the full membership in a single page.
    ///
    /// `totalResults`/`itemsPerPage` are the set size and `startIndex` is 1 —
    /// no true pagination at the SCIM surface, a documented scope limitation.
    #[tracing::instrument(name = "provision.list", skip_all)]
    pub async fn list_users(&self) -> Result<ScimListResponse<ScimUser>, ProvisioningError> {
        let members = match self.directory.list_all().await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(error = %e, "Member listing failed");
                let err = ProvisioningError::from(e);
                self.audit_failure("list", None, &err);
                return Err(err);
            }
        };

        self.audit.record(AuditEvent::success(
            "list",
            RESOURCE_USER,
            None,
            Some(json!({"count": members.len()})),
        ));

        let users = members
            .iter()
            .map(|member| to_scim_user(member, &member.login))
            .collect();
        Ok(ScimListResponse::single_page(users))
    }

    fn audit_failure(&self, operation: &str, resource_id: Option<&str>, err: &ProvisioningError) {
        self.audit.record(AuditEvent::failure(
            operation,
            RESOURCE_USER,
            resource_id.map(String::from),
            err.to_string(),
        ));
    }
}

// =============================================================================
// Tests
// =============================================================================
