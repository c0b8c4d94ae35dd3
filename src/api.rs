//! Cities API client
//!
//! One method per remote operation. Each wraps the generic transport and
//! recontextualizes failures with an operation prefix. Mutating calls run
//! the field rules first, so an invalid body never reaches the network.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ConsoleError, Result};
use crate::list::ListQuery;
use crate::model::{City, CityPage, CityPayload, Coordinates, Governor, PickerOptions};
use crate::transport::{HttpMethod, Reply, Transport};
use crate::validation::CityDraft;

pub const OP_LIST: &str = "Failed to fetch cities";
pub const OP_GET: &str = "Failed to fetch city";
pub const OP_CREATE: &str = "Failed to create city";
pub const OP_UPDATE: &str = "Failed to update city";
pub const OP_DELETE: &str = "Failed to delete city";
pub const OP_SUM_TIMEZONES: &str = "Failed to calculate sum of timezones";
pub const OP_AVERAGE_CAR_CODE: &str = "Failed to calculate average car code";
pub const OP_TIMEZONE_LESS_THAN: &str = "Failed to fetch cities by timezone";
pub const OP_DISTANCE_MOST_POPULATED: &str = "Failed to calculate distance to most populated city";
pub const OP_DISTANCE_NEWEST: &str = "Failed to calculate distance to newest city";
pub const OP_GOVERNORS: &str = "Failed to fetch governors";
pub const OP_COORDINATES: &str = "Failed to fetch coordinates";

#[derive(Clone)]
pub struct CityApi {
    transport: Arc<dyn Transport>,
}

impl CityApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        self.transport
            .request(method, path, body)
            .await
            .and_then(Reply::decode::<T>)
            .map_err(|e| {
                warn!(operation, path, error = %e, "API call failed");
                ConsoleError::operation(operation, e)
            })
    }

    /// Like `call` but accepts any success body, including none.
    async fn call_discarding(
        &self,
        operation: &'static str,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<()> {
        self.transport
            .request(method, path, body)
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!(operation, path, error = %e, "API call failed");
                ConsoleError::operation(operation, e)
            })
    }

    /// Numeric aggregates may come back as `null` (or empty) when the table is empty.
    async fn call_number(&self, operation: &'static str, path: &str) -> Result<Option<f64>> {
        match self.transport.request(HttpMethod::Get, path, None).await {
            Ok(Reply::NoContent) => Ok(None),
            Ok(reply) => reply
                .decode::<Option<f64>>()
                .map_err(|e| ConsoleError::operation(operation, e)),
            Err(e) => {
                warn!(operation, path, error = %e, "API call failed");
                Err(ConsoleError::operation(operation, e))
            }
        }
    }

    // -------------------------------------------------------------------------
    // CRUD
    // -------------------------------------------------------------------------

    pub async fn list(&self, query: &ListQuery) -> Result<CityPage> {
        let path = query.path();
        debug!(%path, "Fetching city page");
        self.call(OP_LIST, HttpMethod::Get, &path, None).await
    }

    /// A 404 becomes [`ConsoleError::NotFound`].
    pub async fn get_by_id(&self, id: i64) -> Result<City> {
        ensure_id(id)?;
        self.call(OP_GET, HttpMethod::Get, &format!("/get-by-id/{}", id), None)
            .await
            .map_err(|e| if e.is_not_found() { ConsoleError::NotFound(id) } else { e })
    }

    pub async fn create(&self, payload: &CityPayload) -> Result<()> {
        let body = checked_body(payload)?;
        self.call_discarding(OP_CREATE, HttpMethod::Post, "/add", Some(body))
            .await
    }

    pub async fn update(&self, id: i64, payload: &CityPayload) -> Result<()> {
        ensure_id(id)?;
        let body = checked_body(payload)?;
        self.call_discarding(
            OP_UPDATE,
            HttpMethod::Put,
            &format!("/update-by-id/{}", id),
            Some(body),
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        ensure_id(id)?;
        self.call_discarding(OP_DELETE, HttpMethod::Delete, &format!("/delete-by-id/{}", id), None)
            .await
    }

    // -------------------------------------------------------------------------
    // Aggregates
    // -------------------------------------------------------------------------

    pub async fn sum_of_timezones(&self) -> Result<Option<f64>> {
        self.call_number(OP_SUM_TIMEZONES, "/sum-of-timezones").await
    }

    pub async fn average_car_code(&self) -> Result<Option<f64>> {
        self.call_number(OP_AVERAGE_CAR_CODE, "/average-car-code").await
    }

    /// No range check here; callers decide whether to bound-check.
    pub async fn cities_with_timezone_less_than(&self, timezone: i32) -> Result<Vec<City>> {
        self.call(
            OP_TIMEZONE_LESS_THAN,
            HttpMethod::Get,
            &format!("/timezone-less-than/{}", timezone),
            None,
        )
        .await
    }

    pub async fn distance_to_most_populated(&self) -> Result<Option<f64>> {
        self.call_number(OP_DISTANCE_MOST_POPULATED, "/distance-to-most-populated")
            .await
    }

    pub async fn distance_to_newest(&self) -> Result<Option<f64>> {
        self.call_number(OP_DISTANCE_NEWEST, "/distance-to-newest").await
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    pub async fn governors(&self) -> Result<Vec<Governor>> {
        self.call(OP_GOVERNORS, HttpMethod::Get, "/governors", None).await
    }

    pub async fn coordinates(&self) -> Result<Vec<Coordinates>> {
        self.call(OP_COORDINATES, HttpMethod::Get, "/coordinates", None)
            .await
    }

    /// Both lookup lists, fetched concurrently.
    pub async fn picker_options(&self) -> Result<PickerOptions> {
        let (governors, coordinates) = tokio::try_join!(self.governors(), self.coordinates())?;
        Ok(PickerOptions::from_lookups(governors, coordinates))
    }
}

fn ensure_id(id: i64) -> Result<()> {
    if id <= 0 {
        return Err(ConsoleError::InvalidInput(format!("Invalid city ID: {}", id)));
    }
    Ok(())
}

fn checked_body(payload: &CityPayload) -> Result<Value> {
    CityDraft::from(payload)
        .to_payload()
        .map_err(ConsoleError::Validation)?;
    serde_json::to_value(payload)
        .map_err(|e| ConsoleError::InvalidInput(format!("Unserializable city: {}", e)))
}
