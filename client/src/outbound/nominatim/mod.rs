//! Nominatim outbound adapter.
//!
//! Reverse geocoding over the Nominatim JSON API, implementing the
//! `ReverseGeocoder` port.

mod dto;
mod http_geocoder;

pub use http_geocoder::{DEFAULT_USER_AGENT, NominatimGeocoder};
