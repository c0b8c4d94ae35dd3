//! Table columns, shared by filters and sorting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A column of the cities table. The string form is the server's key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Column {
    #[default]
    Id,
    Name,
    CoordinatesX,
    CoordinatesY,
    CreationDate,
    Area,
    Population,
    EstablishmentDate,
    Capital,
    MetersAboveSeaLevel,
    Timezone,
    CarCode,
    Government,
    Governor,
}

impl Column {
    pub const ALL: [Column; 14] = [
        Column::Id,
        Column::Name,
        Column::CoordinatesX,
        Column::CoordinatesY,
        Column::CreationDate,
        Column::Area,
        Column::Population,
        Column::EstablishmentDate,
        Column::Capital,
        Column::MetersAboveSeaLevel,
        Column::Timezone,
        Column::CarCode,
        Column::Government,
        Column::Governor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
            Column::CoordinatesX => "coordinatesX",
            Column::CoordinatesY => "coordinatesY",
            Column::CreationDate => "creationDate",
            Column::Area => "area",
            Column::Population => "population",
            Column::EstablishmentDate => "establishmentDate",
            Column::Capital => "capital",
            Column::MetersAboveSeaLevel => "metersAboveSeaLevel",
            Column::Timezone => "timezone",
            Column::CarCode => "carCode",
            Column::Government => "government",
            Column::Governor => "governor",
        }
    }

    /// Query parameter carrying this column's filter, e.g. `timezoneFilter`.
    pub fn filter_param(&self) -> String {
        format!("{}Filter", self.as_str())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown column '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}
