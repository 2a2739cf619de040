//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod key_value_store;
mod registry_api;
mod reverse_geocoder;

pub use key_value_store::{KeyValueStore, MemoryKeyValueStore, StorageError};
#[cfg(test)]
pub use registry_api::MockRegistryApi;
pub use registry_api::{FixtureRegistryApi, RegistryApi, RegistryApiError};
#[cfg(test)]
pub use reverse_geocoder::MockReverseGeocoder;
pub use reverse_geocoder::{
    AddressParts, Coordinates, FixtureReverseGeocoder, GeocodedAddress, ReverseGeocoder,
    ReverseGeocoderError,
};
