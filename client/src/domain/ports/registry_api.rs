//! Driven port for talking to the registry backend.
//!
//! Forms describe what to send as an [`ApiRequest`]; adapters own the
//! transport. Any HTTP status is a successful exchange at this level. Only
//! failures to obtain a response surface as [`RegistryApiError`].

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::api::{ApiRequest, ApiResponse};

define_port_error! {
    /// Errors surfaced when no response could be obtained.
    pub enum RegistryApiError {
        /// Connection, DNS or I/O failure before a response arrived.
        Transport { message: String } => "registry transport failed: {message}",
        /// The request exceeded the configured timeout.
        Timeout { message: String } => "registry request timed out: {message}",
        /// The adapter could not encode the request.
        InvalidRequest { message: String } => "registry request invalid: {message}",
    }
}

/// Port for issuing requests to the registry backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Send one request and return the raw response.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use lifetag_client::domain::api::{endpoints, ApiRequest, ApiResponse};
    /// use lifetag_client::domain::ports::{FixtureRegistryApi, RegistryApi};
    ///
    /// let api = FixtureRegistryApi::new();
    /// api.push_response(ApiResponse::new(200, "{}"));
    /// let response = api.send(ApiRequest::get(endpoints::INAPH_CHECK_PASSWORD)).await?;
    /// assert_eq!(response.status(), 200);
    /// # Ok::<(), lifetag_client::domain::ports::RegistryApiError>(())
    /// ```
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RegistryApiError>;
}

/// Scripted fixture that replays queued outcomes and records every request.
///
/// When the script runs dry the fixture reports a transport failure, the same
/// thing a client sees when the backend is down.
#[derive(Debug, Default)]
pub struct FixtureRegistryApi {
    script: Mutex<VecDeque<Result<ApiResponse, RegistryApiError>>>,
    sent: Mutex<Vec<ApiRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FixtureRegistryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn push_response(&self, response: ApiResponse) {
        lock(&self.script).push_back(Ok(response));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: RegistryApiError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Requests received so far, oldest first.
    pub fn sent(&self) -> Vec<ApiRequest> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl RegistryApi for FixtureRegistryApi {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RegistryApiError> {
        lock(&self.sent).push(request);
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| Err(RegistryApiError::transport("no scripted response")))
    }
}
