//! Registry backend outbound adapter.
//!
//! A thin reqwest implementation of the `RegistryApi` port.

mod http_api;

pub use http_api::ReqwestRegistryApi;
