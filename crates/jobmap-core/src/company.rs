//! Company office data as returned by the company lookup service.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Free-form postal address. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: Option<String>,
    pub city: Option<String>,
    pub geographic_area: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Present fields joined with `", "` in postal order, or `None` when every
    /// field is absent or empty.
    #[must_use]
    pub fn display_string(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.line1,
            &self.city,
            &self.geographic_area,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|f| f.as_deref().filter(|s| !s.is_empty()))
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// One office: an address plus, sometimes, coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyLocation {
    pub address: Option<Address>,
    pub geo: Option<Coordinate>,
}

impl CompanyLocation {
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.city.as_deref())
    }

    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.address
            .as_ref()
            .and_then(|a| a.country.as_deref())
            .filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn display_address(&self) -> Option<String> {
        self.address.as_ref().and_then(Address::display_string)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationGroup {
    pub locations: Vec<CompanyLocation>,
}

/// Known office locations of one employer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyLocationRecord {
    pub name: Option<String>,
    pub headquarter: Option<CompanyLocation>,
    pub confirmed_locations: Vec<CompanyLocation>,
    pub grouped_locations_by_country: Vec<LocationGroup>,
    pub logo_url: Option<String>,
}

impl CompanyLocationRecord {
    /// Match candidates in priority order: grouped-by-country locations
    /// first, then confirmed locations.
    pub fn candidate_locations(&self) -> impl Iterator<Item = &CompanyLocation> {
        self.grouped_locations_by_country
            .iter()
            .flat_map(|g| g.locations.iter())
            .chain(self.confirmed_locations.iter())
    }
}
