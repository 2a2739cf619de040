//! Driven port for turning coordinates into a human-readable address.
//!
//! Complaint forms use this to pre-fill the location field. The domain owns
//! the address shape and the formatting rules; adapters only fetch.

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;

/// WGS84 point captured from the reporter's device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Structured address components as returned by the geocoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub village: Option<String>,
    pub town: Option<String>,
    pub city: Option<String>,
    pub state_district: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

/// Reverse-geocoding result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodedAddress {
    pub display_name: Option<String>,
    pub parts: AddressParts,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl GeocodedAddress {
    /// Format the address for the location field.
    ///
    /// Components are joined with `", "` in street-to-region order. The
    /// locality slot takes the first of neighbourhood or suburb, the
    /// settlement slot the first of village, town or city. When no component
    /// is present the geocoder's display name is used instead.
    pub fn formatted(&self) -> Option<String> {
        let parts = &self.parts;
        let pieces: Vec<&str> = [
            present(parts.house_number.as_ref()),
            present(parts.road.as_ref()),
            present(parts.neighbourhood.as_ref()).or(present(parts.suburb.as_ref())),
            present(parts.village.as_ref())
                .or(present(parts.town.as_ref()))
                .or(present(parts.city.as_ref())),
            present(parts.state_district.as_ref()),
            present(parts.state.as_ref()),
            present(parts.postcode.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if pieces.is_empty() {
            present(self.display_name.as_ref()).map(str::to_owned)
        } else {
            Some(pieces.join(", "))
        }
    }
}

define_port_error! {
    /// Errors raised while reverse geocoding.
    pub enum ReverseGeocoderError {
        /// The geocoding service could not be reached or refused the call.
        Transport { message: String } => "geocoder transport failed: {message}",
        /// The response body was not the expected shape.
        Decode { message: String } => "geocoder response decode failed: {message}",
        /// The service has no address for the coordinates.
        NotFound => "no address found for these coordinates",
    }
}

/// Port for coordinate-to-address lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Resolve `coordinates` to an address.
    async fn reverse(
        &self,
        coordinates: Coordinates,
    ) -> Result<GeocodedAddress, ReverseGeocoderError>;
}

/// Fixture that never finds an address.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureReverseGeocoder;

#[async_trait]
impl ReverseGeocoder for FixtureReverseGeocoder {
    async fn reverse(
        &self,
        _coordinates: Coordinates,
    ) -> Result<GeocodedAddress, ReverseGeocoderError> {
        Err(ReverseGeocoderError::not_found())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_owned())
    }

    #[test]
    fn formats_components_in_order() {
        let address = GeocodedAddress {
            display_name: some("ignored"),
            parts: AddressParts {
                house_number: some("12"),
                road: some("MG Road"),
                suburb: some("Shivajinagar"),
                town: some("Pune"),
                city: some("Pune City"),
                state_district: some("Pune District"),
                state: some("Maharashtra"),
                postcode: some("411005"),
                ..AddressParts::default()
            },
        };
        assert_eq!(
            address.formatted().as_deref(),
            Some("12, MG Road, Shivajinagar, Pune, Pune District, Maharashtra, 411005")
        );
    }

    #[test]
    fn neighbourhood_wins_over_suburb_and_village_over_city() {
        let address = GeocodedAddress {
            display_name: None,
            parts: AddressParts {
                neighbourhood: some("Ward 4"),
                suburb: some("East"),
                village: some("Rampur"),
                city: some("Bareilly"),
                ..AddressParts::default()
            },
        };
        assert_eq!(address.formatted().as_deref(), Some("Ward 4, Rampur"));
    }

    #[test]
    fn falls_back_to_display_name() {
        let address = GeocodedAddress {
            display_name: some("Somewhere, India"),
            parts: AddressParts {
                road: some("   "),
                ..AddressParts::default()
            },
        };
        assert_eq!(address.formatted().as_deref(), Some("Somewhere, India"));
        assert_eq!(GeocodedAddress::default().formatted(), None);
    }

    #[tokio::test]
    async fn fixture_reports_not_found() {
        let err = FixtureReverseGeocoder
            .reverse(Coordinates::new(18.52, 73.85))
            .await
            .expect_err("fixture never resolves");
        assert_eq!(err, ReverseGeocoderError::NotFound);
    }
}
