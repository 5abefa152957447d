//! Business logic services.

pub mod provisioning;

pub use provisioning::{ProvisioningError, ProvisioningService};
