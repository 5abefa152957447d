//! SCIM 2.0 Protocol Implementation
//!
//! Types and utilities for the bridge's SCIM 2.0 (System for Cross-domain
//! Identity Management) surface. Identity providers like Okta, Azure AD and
//! OneLogin speak this protocol to provision and deprovision users.
//!
//! ## RFC References
//!
//! - RFC 7643: SCIM Core Schema
//! - RFC 7644: SCIM Protocol
//!
//! ## Module Structure
//!
//! - [`types`]: Core SCIM resource and protocol types (User, ListResponse,
//!   ServiceProviderConfig)
//! - [`error`]: SCIM error envelope per RFC 7644
//! - [`mapper`]: Pure translation between SCIM users and GitHub membership

pub mod error;
pub mod mapper;
pub mod types;

pub use error::*;
pub use mapper::{MapError, to_remote_invitation, to_scim_user};
pub use types::*;
