//! City entity and its wire shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Form of government. Serialized as the server's enum name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Government {
    #[default]
    Aristocracy,
    Matriarchy,
    Noocracy,
    Patriarchy,
}

impl Government {
    pub const ALL: [Government; 4] = [
        Government::Aristocracy,
        Government::Matriarchy,
        Government::Noocracy,
        Government::Patriarchy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Government::Aristocracy => "ARISTOCRACY",
            Government::Matriarchy => "MATRIARCHY",
            Government::Noocracy => "NOOCRACY",
            Government::Patriarchy => "PATRIARCHY",
        }
    }
}

impl fmt::Display for Government {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Government {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Government::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown government '{}'", s))
    }
}

/// Composite position of a city. Not independently addressable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The city's governor (a `Human` on the server).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Governor {
    #[serde(default)]
    pub name: String,
}

impl Governor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// A city as returned by the list and detail endpoints.
///
/// `id` and `creation_date` are server-owned; everything else round-trips
/// through [`CityPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: i64,
    pub name: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub creation_date: Option<NaiveDate>,
    pub area: f64,
    pub population: i64,
    #[serde(default)]
    pub establishment_date: Option<NaiveDate>,
    #[serde(default)]
    pub capital: bool,
    #[serde(default)]
    pub meters_above_sea_level: Option<f64>,
    pub timezone: i32,
    #[serde(default)]
    pub car_code: Option<i32>,
    #[serde(default)]
    pub government: Government,
    #[serde(default)]
    pub governor: Governor,
}

impl City {
    /// Client-editable part of the entity.
    pub fn to_payload(&self) -> CityPayload {
        CityPayload {
            name: self.name.clone(),
            coordinates: self.coordinates,
            area: self.area,
            population: self.population,
            establishment_date: self.establishment_date,
            capital: self.capital,
            meters_above_sea_level: self.meters_above_sea_level,
            timezone: self.timezone,
            car_code: self.car_code,
            government: self.government,
            governor: self.governor.clone(),
        }
    }
}

/// Body of create and update requests: the entity minus id and creation date.
///
/// Nullable fields serialize as explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPayload {
    pub name: String,
    pub coordinates: Coordinates,
    pub area: f64,
    pub population: i64,
    pub establishment_date: Option<NaiveDate>,
    pub capital: bool,
    pub meters_above_sea_level: Option<f64>,
    pub timezone: i32,
    pub car_code: Option<i32>,
    pub government: Government,
    pub governor: Governor,
}

// =============================================================================
// LIST RESPONSE
// =============================================================================

/// One page of the list endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CityPage {
    pub cities: Vec<City>,
    pub current_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> serde_json::Value {
        json!({
            "id": 7,
            "name": "Tver",
            "coordinates": {"x": 12, "y": -5.5},
            "creationDate": "2024-03-01",
            "area": 152.2,
            "population": 416000,
            "establishmentDate": null,
            "capital": false,
            "metersAboveSeaLevel": 140.0,
            "timezone": 3,
            "carCode": 69,
            "government": "PATRIARCHY",
            "governor": {"name": "Rudenya"}
        })
    }

    #[test]
    fn test_city_decodes_server_shape() {
        let city: City = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(city.id, 7);
        assert_eq!(city.coordinates, Coordinates { x: 12.0, y: -5.5 });
        assert_eq!(city.creation_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(city.government, Government::Patriarchy);
        assert_eq!(city.car_code, Some(69));
        assert_eq!(city.establishment_date, None);
    }

    #[test]
    fn test_payload_drops_server_owned_fields() {
        let city: City = serde_json::from_value(sample_json()).unwrap();
        let body = serde_json::to_value(city.to_payload()).unwrap();
        assert!(body.get("id").is_none());
        assert!(body.get("creationDate").is_none());
        assert_eq!(body["governor"]["name"], "Rudenya");
        assert_eq!(body["establishmentDate"], serde_json::Value::Null);
    }

    #[test]
    fn test_government_parse() {
        assert_eq!("noocracy".parse::<Government>(), Ok(Government::Noocracy));
        assert!("MONARCHY".parse::<Government>().is_err());
    }

    #[test]
    fn test_page_tolerates_missing_fields() {
        let page: CityPage = serde_json::from_value(json!({"cities": [], "totalPages": 0})).unwrap();
        assert_eq!(page.total_items, 0);
        assert!(page.cities.is_empty());
    }
}
