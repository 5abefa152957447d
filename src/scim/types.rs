//! SCIM 2.0 resource and protocol types.
//!
//! Defines the core User resource and the protocol envelopes (ListResponse,
//! ServiceProviderConfig) per RFC 7643/7644, scoped to what the bridge
//! exposes: user provisioning against a GitHub organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Schema URIs
// =============================================================================

/// SCIM Core User schema URI
pub const SCHEMA_USER: &str = "urn:ietf:params:scim:schemas:core:2.0:User";

/// SCIM ListResponse schema URI
pub const SCHEMA_LIST_RESPONSE: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";

/// SCIM Error schema URI
pub const SCHEMA_ERROR: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// SCIM ServiceProviderConfig schema URI
pub const SCHEMA_SERVICE_PROVIDER_CONFIG: &str =
    "urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig";

/// Media type for SCIM payloads per RFC 7644 Section 3.1
pub const SCIM_MEDIA_TYPE: &str = "application/scim+json";

// =============================================================================
// Resource Metadata
// =============================================================================

/// Resource metadata common to all SCIM resources.
///
/// Timestamps are optional because the GitHub membership endpoints the bridge
/// reads from do not always include them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimMeta {
    /// The resource type (e.g., "User")
    pub resource_type: String,

    /// When the resource was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// When the resource was last modified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// The URI of the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ScimMeta {
    /// Create metadata for a User resource
    pub fn user(created: Option<DateTime<Utc>>, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            resource_type: "User".to_string(),
            created,
            last_modified,
            location: None,
        }
    }

    /// Set the location URI
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

// =============================================================================
// User Resource (RFC 7643)
// =============================================================================

/// SCIM User resource.
///
/// The inbound representation sent by the identity provider on create, and
/// the outbound representation the bridge builds from GitHub membership
/// records. `id` is absent on inbound payloads and always set outbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    /// SCIM schema URIs for this resource
    pub schemas: Vec<String>,

    /// Server-assigned unique identifier (the GitHub login, or the
    /// invitation id on create receipts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Unique identifier for the user; treated as the GitHub username key
    pub user_name: String,

    /// User's name components
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<ScimName>,

    /// Email addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<ScimEmail>,

    /// Whether the user is active
    #[serde(default = "default_true")]
    pub active: bool,

    /// Resource metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ScimMeta>,
}

impl ScimUser {
    /// Create a new SCIM user with minimal required fields
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            schemas: vec![SCHEMA_USER.to_string()],
            id: None,
            user_name: user_name.into(),
            name: None,
            emails: Vec::new(),
            active: true,
            meta: None,
        }
    }

    /// Resolve the address to provision with: the entry flagged primary wins,
    /// otherwise the first entry. `None` when the list is empty.
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|e| e.primary.unwrap_or(false))
            .or_else(|| self.emails.first())
            .map(|e| e.value.as_str())
    }
}

/// User's name components
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimName {
    /// Given name (first name); empty when the source record has none
    #[serde(default)]
    pub given_name: String,

    /// Family name (last name); empty when the source record has none
    #[serde(default)]
    pub family_name: String,
}

/// Email address with type and primary flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimEmail {
    /// Email address value
    pub value: String,

    /// Email type (e.g., "work", "home")
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub email_type: Option<String>,

    /// Whether this is the primary email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

impl ScimEmail {
    /// Create a primary email entry
    pub fn primary(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            email_type: None,
            primary: Some(true),
        }
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// List Response (RFC 7644)
// =============================================================================

/// SCIM list response envelope.
///
/// The bridge returns the full membership in a single page: `totalResults`
/// and `itemsPerPage` both equal the set size and `startIndex` is 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimListResponse<T> {
    /// SCIM schema URIs
    pub schemas: Vec<String>,

    /// Total number of results available
    pub total_results: u32,

    /// Number of results returned in this response
    pub items_per_page: u32,

    /// 1-based index of the first result in this response
    pub start_index: u32,

    /// The list of resources
    #[serde(rename = "Resources")]
    pub resources: Vec<T>,
}

impl<T> ScimListResponse<T> {
    /// Create a single-page list response covering the whole result set
    pub fn single_page(resources: Vec<T>) -> Self {
        let total = resources.len() as u32;
        Self {
            schemas: vec![SCHEMA_LIST_RESPONSE.to_string()],
            total_results: total,
            items_per_page: total,
            start_index: 1,
            resources,
        }
    }
}

// =============================================================================
// Service Provider Configuration (RFC 7644)
// =============================================================================

/// Service Provider Configuration.
///
/// Advertises the bridge's capabilities: PATCH is declared, everything else
/// (bulk, filter, sort, etag, password changes) is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderConfig {
    /// SCIM schema URIs
    pub schemas: Vec<String>,

    /// Documentation URI for this SCIM implementation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_uri: Option<String>,

    /// PATCH operation support
    pub patch: FeatureSupport,

    /// Bulk operation support
    pub bulk: BulkSupport,

    /// Filter support
    pub filter: FilterSupport,

    /// Change password support
    pub change_password: FeatureSupport,

    /// Sort support
    pub sort: FeatureSupport,

    /// ETag support
    pub etag: FeatureSupport,

    /// Supported authentication schemes
    pub authentication_schemes: Vec<AuthenticationScheme>,
}

impl Default for ServiceProviderConfig {
    fn default() -> Self {
        Self {
            schemas: vec![SCHEMA_SERVICE_PROVIDER_CONFIG.to_string()],
            documentation_uri: None,
            patch: FeatureSupport { supported: true },
            bulk: BulkSupport::unsupported(),
            filter: FilterSupport::unsupported(),
            change_password: FeatureSupport { supported: false },
            sort: FeatureSupport { supported: false },
            etag: FeatureSupport { supported: false },
            authentication_schemes: vec![AuthenticationScheme::oauth_bearer()],
        }
    }
}

/// Simple feature support flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSupport {
    pub supported: bool,
}

/// Bulk operation support configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSupport {
    pub supported: bool,
    pub max_operations: u32,
    pub max_payload_size: u32,
}

impl BulkSupport {
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            max_operations: 0,
            max_payload_size: 0,
        }
    }
}

/// Filter support configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSupport {
    pub supported: bool,
    pub max_results: u32,
}

impl FilterSupport {
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            max_results: 0,
        }
    }
}

/// Authentication scheme definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationScheme {
    /// Display name
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// URI to specification document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_uri: Option<String>,

    /// Scheme type identifier
    #[serde(rename = "type")]
    pub scheme_type: String,

    /// Whether this is the primary authentication method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

impl AuthenticationScheme {
    /// Create OAuth 2.0 Bearer Token scheme
    pub fn oauth_bearer() -> Self {
        Self {
            name: "OAuth Bearer Token".to_string(),
            description: "Authentication scheme using the OAuth Bearer Token standard".to_string(),
            spec_uri: Some("https://tools.ietf.org/html/rfc6750".to_string()),
            scheme_type: "oauthbearertoken".to_string(),
            primary: Some(true),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
