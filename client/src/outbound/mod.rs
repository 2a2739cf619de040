//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **registry**: reqwest client for the registry REST backend
//! - **nominatim**: reqwest client for OpenStreetMap reverse geocoding
//! - **storage**: file-backed key-value store for the session
//!
//! Adapters translate between domain types and transport representations.
//! They contain no business logic.

mod http_support;
pub mod nominatim;
pub mod registry;
pub mod storage;
