//! DTOs for decoding Nominatim reverse-geocoding responses.

use serde::Deserialize;

use crate::domain::ports::{AddressParts, GeocodedAddress};

#[derive(Debug, Deserialize)]
pub(super) struct ReverseResponseDto {
    pub(super) display_name: Option<String>,
    #[serde(default)]
    pub(super) address: AddressDto,
    /// Present instead of an address when nothing matched.
    pub(super) error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AddressDto {
    house_number: Option<String>,
    road: Option<String>,
    neighbourhood: Option<String>,
    suburb: Option<String>,
    village: Option<String>,
    town: Option<String>,
    city: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
}

impl ReverseResponseDto {
    pub(super) fn into_domain(self) -> GeocodedAddress {
        let address = self.address;
        GeocodedAddress {
            display_name: self.display_name,
            parts: AddressParts {
                house_number: address.house_number,
                road: address.road,
                neighbourhood: address.neighbourhood,
                suburb: address.suburb,
                village: address.village,
                town: address.town,
                city: address.city,
                state_district: address.state_district,
                state: address.state,
                postcode: address.postcode,
            },
        }
    }
}
