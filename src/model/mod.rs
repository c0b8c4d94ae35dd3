//! Domain types for the cities console.

mod city;
mod columns;
mod lookup;

pub use city::{City, CityPage, CityPayload, Coordinates, Government, Governor};
pub use columns::{Column, SortDirection};
pub use lookup::PickerOptions;
