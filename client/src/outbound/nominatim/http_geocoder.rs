//! Reqwest-backed Nominatim reverse geocoder.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::super::http_support::{body_preview, build_client};
use super::dto::ReverseResponseDto;
use crate::domain::ports::{
    Coordinates, GeocodedAddress, ReverseGeocoder, ReverseGeocoderError,
};

/// Nominatim's usage policy requires an identifying user agent.
pub const DEFAULT_USER_AGENT: &str = "lifetag-client/0.1";

/// Reverse geocoder against one Nominatim `/reverse` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
}

impl NominatimGeocoder {
    /// Build a geocoder with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        Self::with_user_agent(endpoint, timeout, DEFAULT_USER_AGENT)
    }

    /// Build a geocoder that identifies itself as `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_user_agent(
        endpoint: Url,
        timeout: Option<Duration>,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout, Some(user_agent))?,
            endpoint,
        })
    }

    fn lookup_url(&self, coordinates: Coordinates) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("lat", &coordinates.latitude.to_string())
            .append_pair("lon", &coordinates.longitude.to_string())
            .append_pair("format", "json")
            .append_pair("addressdetails", "1");
        url
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(
        &self,
        coordinates: Coordinates,
    ) -> Result<GeocodedAddress, ReverseGeocoderError> {
        let response = self
            .client
            .get(self.lookup_url(coordinates))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| ReverseGeocoderError::transport(error.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| ReverseGeocoderError::transport(error.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        debug!(%coordinates, "reverse geocoded");
        parse_address(body.as_ref())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ReverseGeocoderError {
    if status == StatusCode::NOT_FOUND {
        return ReverseGeocoderError::not_found();
    }
    let preview = body_preview(body);
    if preview.is_empty() {
        ReverseGeocoderError::transport(format!("status {}", status.as_u16()))
    } else {
        ReverseGeocoderError::transport(format!("status {}: {preview}", status.as_u16()))
    }
}

fn parse_address(body: &[u8]) -> Result<GeocodedAddress, ReverseGeocoderError> {
    let decoded: ReverseResponseDto = serde_json::from_slice(body).map_err(|error| {
        ReverseGeocoderError::decode(format!("invalid Nominatim JSON payload: {error}"))
    })?;
    if decoded.error.is_some() {
        return Err(ReverseGeocoderError::not_found());
    }
    Ok(decoded.into_domain())
}
