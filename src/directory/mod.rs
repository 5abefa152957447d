//! Remote organization-membership directory.
//!
//! The provisioning service talks to the remote directory through the
//! [`MembershipDirectory`] trait so tests can substitute a spy or mock for the
//! live GitHub API. The production implementation is [`GitHubDirectory`].

pub mod github;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use github::GitHubDirectory;

/// The only role the bridge provisions. There is no admin provisioning path
/// from SCIM.
pub const ROLE_DIRECT_MEMBER: &str = "direct_member";

/// Invitation request derived from a SCIM create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteInvitation {
    /// Address the invitation is sent to
    pub email: String,
    /// The SCIM userName, carried for audit context (GitHub invites by email)
    pub username: String,
    /// Membership role, always [`ROLE_DIRECT_MEMBER`]
    pub role: String,
}

/// What the remote system returns for a successful invitation.
#[derive(Debug, Clone, Deserialize)]
pub struct InvitationReceipt {
    /// Remote-assigned invitation id, exposed as the SCIM `id` on create
    pub id: i64,
    /// When the invitation was created
    pub created_at: DateTime<Utc>,
}

/// Normalized membership record.
///
/// `login` is the stable identifier used as the SCIM `id`/`userName`.
/// Timestamps are optional because GitHub's membership and member-list
/// payloads omit them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMember {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Membership state, `"active"` or `"pending"`
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Errors from the remote membership directory.
///
/// The provisioning layer collapses all of these into a generic SCIM error
/// envelope; the subtypes exist for logging.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Authentication with the remote directory failed: {0}")]
    Auth(String),

    #[error("Remote directory rate limit exceeded")]
    RateLimited,

    #[error("Remote directory rejected the request: {0}")]
    Rejected(String),

    #[error("Resource not found in the remote directory: {0}")]
    NotFound(String),

    #[error("Remote directory API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode remote directory response: {0}")]
    Decode(String),
}

/// The four membership operations the bridge consumes.
///
/// One remote attempt per call; no retry or cancellation is exposed here.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// Invite an address into the organization. Fails on duplicate or
    /// invalid input.
    async fn invite(&self, invitation: &RemoteInvitation)
    -> Result<InvitationReceipt, DirectoryError>;

    /// Remove a member (or cancel their pending membership). Fails when the
    /// login is not associated with the organization.
    async fn remove(&self, login: &str) -> Result<(), DirectoryError>;

    /// Look up a membership. `Ok(None)` on not-found, distinct from a failed
    /// call.
    async fn get(&self, login: &str) -> Result<Option<RemoteMember>, DirectoryError>;

    /// Fetch the complete membership of the organization.
    async fn list_all(&self) -> Result<Vec<RemoteMember>, DirectoryError>;
}
