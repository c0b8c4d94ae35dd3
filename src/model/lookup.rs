//! "Choose existing" picker data built from the lookup endpoints.

use super::{Coordinates, Governor};

/// Existing governors and coordinate pairs the form can offer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickerOptions {
    pub governors: Vec<String>,
    pub coordinates: Vec<Coordinates>,
}

impl PickerOptions {
    /// Blank governor names are dropped; both lists are deduplicated and sorted.
    pub fn from_lookups(governors: Vec<Governor>, coordinates: Vec<Coordinates>) -> Self {
        let mut names: Vec<String> = governors
            .into_iter()
            .map(|g| g.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();

        let mut coords = coordinates;
        coords.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        coords.dedup();

        Self {
            governors: names,
            coordinates: coords,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.governors.is_empty() && self.coordinates.is_empty()
    }
}
