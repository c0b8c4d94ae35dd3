//! City field rules.
//!
//! One canonical editable shape ([`CityDraft`]) and one pure function
//! ([`validate`]) over it. The form runs it before submit; the API layer
//! runs it again on every create/update payload so an invalid body never
//! reaches the network.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{City, CityPayload, Coordinates, Government, Governor};

pub const TIMEZONE_MIN: i32 = -13;
pub const TIMEZONE_MAX: i32 = 15;
pub const COORDINATE_X_MAX: f64 = 913.0;
/// Exclusive lower bound.
pub const COORDINATE_Y_MIN: f64 = -243.0;
pub const CAR_CODE_MIN: i32 = 1;
pub const CAR_CODE_MAX: i32 = 1000;

pub fn timezone_in_range(timezone: i32) -> bool {
    (TIMEZONE_MIN..=TIMEZONE_MAX).contains(&timezone)
}

// =============================================================================
// FIELDS AND TABS
// =============================================================================

/// Form section. Ordering is the order tabs are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FormTab {
    #[default]
    Basic,
    Coordinates,
    Government,
    Additional,
    Governor,
}

/// Editable field, addressed by its dotted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    Name,
    Area,
    Population,
    CoordinatesX,
    CoordinatesY,
    Government,
    Capital,
    Timezone,
    CarCode,
    MetersAboveSeaLevel,
    EstablishmentDate,
    GovernorName,
}

impl FormField {
    pub const ALL: [FormField; 12] = [
        FormField::Name,
        FormField::Area,
        FormField::Population,
        FormField::CoordinatesX,
        FormField::CoordinatesY,
        FormField::Government,
        FormField::Capital,
        FormField::Timezone,
        FormField::CarCode,
        FormField::MetersAboveSeaLevel,
        FormField::EstablishmentDate,
        FormField::GovernorName,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Area => "area",
            FormField::Population => "population",
            FormField::CoordinatesX => "coordinates.x",
            FormField::CoordinatesY => "coordinates.y",
            FormField::Government => "government",
            FormField::Capital => "capital",
            FormField::Timezone => "timezone",
            FormField::CarCode => "carCode",
            FormField::MetersAboveSeaLevel => "metersAboveSeaLevel",
            FormField::EstablishmentDate => "establishmentDate",
            FormField::GovernorName => "governor.name",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        FormField::ALL.into_iter().find(|f| f.path() == path)
    }

    pub fn tab(&self) -> FormTab {
        match self {
            FormField::Name | FormField::Area | FormField::Population => FormTab::Basic,
            FormField::CoordinatesX | FormField::CoordinatesY => FormTab::Coordinates,
            FormField::Government | FormField::Capital => FormTab::Government,
            FormField::Timezone
            | FormField::CarCode
            | FormField::MetersAboveSeaLevel
            | FormField::EstablishmentDate => FormTab::Additional,
            FormField::GovernorName => FormTab::Governor,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Field -> message map produced by [`validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(BTreeMap<FormField, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn remove(&mut self, field: FormField) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Copy every entry of `other` over this map; `other` wins on conflict.
    pub fn merge(&mut self, other: &ValidationErrors) {
        for (field, message) in &other.0 {
            self.0.insert(*field, message.clone());
        }
    }

    /// First tab (in display order) that holds an error.
    pub fn first_tab(&self) -> Option<FormTab> {
        self.0.keys().map(FormField::tab).min()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Please fix the errors in the form")?;
        let mut sep = ": ";
        for (field, message) in &self.0 {
            write!(f, "{}{}: {}", sep, field, message)?;
            sep = "; ";
        }
        Ok(())
    }
}

// =============================================================================
// DRAFT
// =============================================================================

/// Editable city. Numeric fields are `None` when the input is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CityDraft {
    pub name: String,
    pub coordinates_x: Option<f64>,
    pub coordinates_y: Option<f64>,
    pub area: Option<f64>,
    pub population: Option<i64>,
    pub establishment_date: Option<NaiveDate>,
    pub capital: bool,
    pub meters_above_sea_level: Option<f64>,
    pub timezone: Option<i32>,
    pub car_code: Option<i32>,
    pub government: Government,
    pub governor_name: String,
}

impl Default for CityDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            coordinates_x: Some(0.0),
            coordinates_y: Some(0.0),
            area: Some(0.0),
            population: Some(0),
            establishment_date: None,
            capital: false,
            meters_above_sea_level: None,
            timezone: Some(0),
            car_code: None,
            government: Government::default(),
            governor_name: String::new(),
        }
    }
}

impl From<&City> for CityDraft {
    fn from(city: &City) -> Self {
        CityDraft::from(&city.to_payload())
    }
}

impl From<&CityPayload> for CityDraft {
    fn from(payload: &CityPayload) -> Self {
        Self {
            name: payload.name.clone(),
            coordinates_x: Some(payload.coordinates.x),
            coordinates_y: Some(payload.coordinates.y),
            area: Some(payload.area),
            population: Some(payload.population),
            establishment_date: payload.establishment_date,
            capital: payload.capital,
            meters_above_sea_level: payload.meters_above_sea_level,
            timezone: Some(payload.timezone),
            car_code: payload.car_code,
            government: payload.government,
            governor_name: payload.governor.name.clone(),
        }
    }
}

impl CityDraft {
    /// Validate and convert into a request body.
    pub fn to_payload(&self) -> Result<CityPayload, ValidationErrors> {
        let errors = validate(self);
        if !errors.is_empty() {
            return Err(errors);
        }
        match (
            self.coordinates_x,
            self.coordinates_y,
            self.area,
            self.population,
            self.timezone,
        ) {
            (Some(x), Some(y), Some(area), Some(population), Some(timezone)) => Ok(CityPayload {
                name: self.name.clone(),
                coordinates: Coordinates { x, y },
                area,
                population,
                establishment_date: self.establishment_date,
                capital: self.capital,
                meters_above_sea_level: self.meters_above_sea_level,
                timezone,
                car_code: self.car_code,
                government: self.government,
                governor: Governor::new(self.governor_name.clone()),
            }),
            // validate() reports every missing required number
            _ => Err(errors),
        }
    }
}

// =============================================================================
// RULES
// =============================================================================

/// Pure rule check over a draft.
pub fn validate(draft: &CityDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if draft.name.trim().is_empty() {
        errors.insert(FormField::Name, "Name is required");
    }

    match draft.population {
        None => errors.insert(FormField::Population, "Population is required"),
        Some(p) if p <= 0 => errors.insert(FormField::Population, "Population must be > 0"),
        _ => {}
    }

    match draft.area {
        None => errors.insert(FormField::Area, "Area is required"),
        Some(a) if a.is_nan() || a <= 0.0 => errors.insert(FormField::Area, "Area must be > 0"),
        _ => {}
    }

    match draft.timezone {
        None => errors.insert(FormField::Timezone, "Timezone is required"),
        Some(t) if !timezone_in_range(t) => errors.insert(
            FormField::Timezone,
            format!("Timezone must be between {} and {}", TIMEZONE_MIN, TIMEZONE_MAX),
        ),
        _ => {}
    }

    match draft.coordinates_x {
        None => errors.insert(FormField::CoordinatesX, "X is required"),
        Some(x) if x.is_nan() || x > COORDINATE_X_MAX => {
            errors.insert(FormField::CoordinatesX, "X must be ≤ 913")
        }
        _ => {}
    }

    match draft.coordinates_y {
        None => errors.insert(FormField::CoordinatesY, "Y is required"),
        Some(y) if y.is_nan() || y <= COORDINATE_Y_MIN => {
            errors.insert(FormField::CoordinatesY, "Y must be > -243")
        }
        _ => {}
    }

    if let Some(code) = draft.car_code {
        if !(CAR_CODE_MIN..=CAR_CODE_MAX).contains(&code) {
            errors.insert(FormField::CarCode, "Car code must be between 1 and 1000");
        }
    }

    if draft.governor_name.trim().is_empty() {
        errors.insert(FormField::GovernorName, "Governor name is required");
    }

    errors
}
