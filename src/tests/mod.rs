//! Consolidated test modules.
//!
//! End-to-end tests that drive the full axum app against a mocked GitHub
//! API.
