//! Special functions panel: server-side aggregates over the whole table.
//!
//! Each function tracks its own request lifecycle, so several may run at
//! once and one failing leaves the others' results in place.

use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::api::CityApi;
use crate::error::{ConsoleError, Result};
use crate::model::City;
use crate::notice::Notice;
use crate::task::TaskStatus;
use crate::validation::{timezone_in_range, TIMEZONE_MAX, TIMEZONE_MIN};

pub const MSG_INVALID_TIMEZONE: &str = "Please enter a valid timezone value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AggregateFunction {
    SumOfTimezones,
    AverageCarCode,
    CitiesWithTimezoneLessThan,
    DistanceToMostPopulated,
    DistanceToNewest,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 5] = [
        AggregateFunction::SumOfTimezones,
        AggregateFunction::AverageCarCode,
        AggregateFunction::CitiesWithTimezoneLessThan,
        AggregateFunction::DistanceToMostPopulated,
        AggregateFunction::DistanceToNewest,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AggregateFunction::SumOfTimezones => "Sum of timezones",
            AggregateFunction::AverageCarCode => "Average car code",
            AggregateFunction::CitiesWithTimezoneLessThan => "Cities with timezone less than",
            AggregateFunction::DistanceToMostPopulated => "Distance to most populated city",
            AggregateFunction::DistanceToNewest => "Distance to newest city",
        }
    }

    /// Whether the function reads the timezone input.
    pub fn takes_input(&self) -> bool {
        matches!(self, AggregateFunction::CitiesWithTimezoneLessThan)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateResult {
    /// `None` when the server had nothing to aggregate.
    Number(Option<f64>),
    Cities(Vec<City>),
}

/// Two decimals for numbers, "N/A" for an empty aggregate.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => "N/A".to_string(),
    }
}

pub fn format_result(result: &AggregateResult) -> String {
    match result {
        AggregateResult::Number(value) => format_number(*value),
        AggregateResult::Cities(cities) => format!("Found {} cities", cities.len()),
    }
}

type Status = TaskStatus<AggregateResult, ConsoleError>;

#[derive(Debug)]
pub struct AggregatesPanel {
    check_timezone_bounds: bool,
    timezone_input: String,
    results: BTreeMap<AggregateFunction, Status>,
    notices: Vec<Notice>,
}

impl AggregatesPanel {
    pub fn new(check_timezone_bounds: bool) -> Self {
        Self {
            check_timezone_bounds,
            timezone_input: String::new(),
            results: BTreeMap::new(),
            notices: Vec::new(),
        }
    }

    /// Editing the input invalidates the previous list result.
    pub fn set_timezone_input(&mut self, input: impl Into<String>) {
        self.timezone_input = input.into();
        self.results
            .remove(&AggregateFunction::CitiesWithTimezoneLessThan);
    }

    pub fn timezone_input(&self) -> &str {
        &self.timezone_input
    }

    /// Integer, and inside the canonical range when bound-checking is on.
    pub fn parse_timezone_input(&self) -> Result<i32> {
        let timezone = self
            .timezone_input
            .trim()
            .parse::<i32>()
            .map_err(|_| ConsoleError::InvalidInput(MSG_INVALID_TIMEZONE.to_string()))?;
        if self.check_timezone_bounds && !timezone_in_range(timezone) {
            return Err(ConsoleError::InvalidInput(format!(
                "Timezone must be between {} and {}",
                TIMEZONE_MIN, TIMEZONE_MAX
            )));
        }
        Ok(timezone)
    }

    /// Run one function. Input errors are reported without touching the
    /// network or the function's previous result.
    pub async fn execute(
        &mut self,
        api: &CityApi,
        function: AggregateFunction,
    ) -> Result<AggregateResult> {
        if self.is_running(function) {
            debug!(%function, "Aggregate already running");
            return Err(ConsoleError::InvalidInput(format!(
                "{} is already running",
                function
            )));
        }

        let timezone = if function.takes_input() {
            match self.parse_timezone_input() {
                Ok(tz) => Some(tz),
                Err(e) => {
                    self.notices.push(Notice::error(e.to_string()));
                    return Err(e);
                }
            }
        } else {
            None
        };

        self.results.insert(function, TaskStatus::InProgress);
        let result = match (function, timezone) {
            (AggregateFunction::SumOfTimezones, _) => {
                api.sum_of_timezones().await.map(AggregateResult::Number)
            }
            (AggregateFunction::AverageCarCode, _) => {
                api.average_car_code().await.map(AggregateResult::Number)
            }
            (AggregateFunction::CitiesWithTimezoneLessThan, tz) => api
                .cities_with_timezone_less_than(tz.unwrap_or_default())
                .await
                .map(AggregateResult::Cities),
            (AggregateFunction::DistanceToMostPopulated, _) => api
                .distance_to_most_populated()
                .await
                .map(AggregateResult::Number),
            (AggregateFunction::DistanceToNewest, _) => {
                api.distance_to_newest().await.map(AggregateResult::Number)
            }
        };

        match &result {
            Ok(value) => {
                debug!(%function, result = %format_result(value), "Aggregate computed");
                self.notices
                    .push(Notice::success(success_message(function, value, timezone)));
            }
            Err(e) => {
                warn!(%function, error = %e, "Aggregate failed");
                self.notices.push(Notice::error(e.to_string()));
            }
        }
        self.results
            .insert(function, TaskStatus::Finished(result.clone()));
        result
    }

    pub fn is_running(&self, function: AggregateFunction) -> bool {
        self.results
            .get(&function)
            .is_some_and(TaskStatus::is_in_progress)
    }

    pub fn result(&self, function: AggregateFunction) -> Option<&AggregateResult> {
        self.results.get(&function).and_then(TaskStatus::ok)
    }

    pub fn error(&self, function: AggregateFunction) -> Option<&ConsoleError> {
        self.results.get(&function).and_then(TaskStatus::err)
    }

    /// Display text for a finished function.
    pub fn formatted(&self, function: AggregateFunction) -> Option<String> {
        self.result(function).map(format_result)
    }

    /// Drop every result and the timezone input.
    pub fn clear_results(&mut self) {
        self.results.clear();
        self.timezone_input.clear();
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

fn success_message(
    function: AggregateFunction,
    result: &AggregateResult,
    timezone: Option<i32>,
) -> String {
    match (function, result) {
        (AggregateFunction::CitiesWithTimezoneLessThan, AggregateResult::Cities(cities)) => {
            format!(
                "Found {} cities with timezone less than {}",
                cities.len(),
                timezone.unwrap_or_default()
            )
        }
        (AggregateFunction::DistanceToMostPopulated | AggregateFunction::DistanceToNewest, r) => {
            format!("{}: {} units", function, format_result(r))
        }
        (_, r) => format!("{}: {}", function, format_result(r)),
    }
}
