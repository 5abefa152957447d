//! Pure mapping between SCIM User resources and GitHub membership records.
//!
//! Both directions are stateless free functions: SCIM -> invitation on create,
//! GitHub member -> SCIM User on read/list. Display names are split on ASCII
//! whitespace (first token = given name, rest = family name), which is
//! best-effort for multi-word family names; a round-trip through GitHub is not
//! guaranteed to be byte-exact.

use crate::{
    directory::{RemoteInvitation, RemoteMember, ROLE_DIRECT_MEMBER},
    scim::types::{SCHEMA_USER, ScimEmail, ScimMeta, ScimName, ScimUser},
};

/// Placeholder email domain for members whose address GitHub withholds
/// (private or unverified email). Keeps the outbound SCIM representation
/// schema-complete: `emails` is never empty.
pub const NOREPLY_DOMAIN: &str = "users.noreply.github.com";

/// Mapping failures. The only guard in an otherwise total translation.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("User must have at least one email address")]
    MissingEmail,
}

/// Derive the invitation request for a SCIM create.
///
/// The entry flagged `primary: true` wins the address tie-break, otherwise the
/// first entry. Fails before any remote call when no usable address exists.
pub fn to_remote_invitation(user: &ScimUser) -> Result<RemoteInvitation, MapError> {
    let email = user.primary_email().filter(|e| !e.is_empty());

    match email {
        Some(email) => Ok(RemoteInvitation {
            email: email.to_string(),
            username: user.user_name.clone(),
            role: ROLE_DIRECT_MEMBER.to_string(),
        }),
        None => Err(MapError::MissingEmail),
    }
}

/// Build the outbound SCIM User for a GitHub membership record.
///
/// `id` is the identifier to expose, always the stable GitHub login. Always
/// succeeds and always emits exactly one primary email, synthesized from the
/// login when GitHub withholds the address.
pub fn to_scim_user(member: &RemoteMember, id: &str) -> ScimUser {
    let (given_name, family_name) = split_display_name(member.name.as_deref());

    let email = match member.email.as_deref().filter(|e| !e.is_empty()) {
        Some(email) => email.to_string(),
        None => format!("{}@{}", member.login, NOREPLY_DOMAIN),
    };

    ScimUser {
        schemas: vec![SCHEMA_USER.to_string()],
        id: Some(id.to_string()),
        user_name: member.login.clone(),
        name: Some(ScimName {
            given_name,
            family_name,
        }),
        emails: vec![ScimEmail::primary(email)],
        active: member.state == "active",
        meta: Some(ScimMeta::user(member.created_at, member.updated_at)),
    }
}

/// Split a display name into (given, family) on ASCII whitespace.
/// A single-token name yields an empty family name.
fn split_display_name(name: Option<&str>) -> (String, String) {
    let Some(name) = name else {
        return (String::new(), String::new());
    };

    let mut tokens = name.split_ascii_whitespace();
    let given = tokens.next().unwrap_or_default().to_string();
    let family = tokens.collect::<Vec<_>>().join(" ");

    (given, family)
}

// =============================================================================
// Tests
// =============================================================================
