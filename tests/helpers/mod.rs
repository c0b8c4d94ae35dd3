//! Scripted transport and socket connector for integration tests.
//!
//! Both record what the console asked for and answer from a per-route
//! script, so tests can assert on request counts, bodies and timing under
//! tokio's paused clock.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use cities_console::realtime::{Socket, SocketConnector};
use cities_console::transport::{HttpMethod, Reply, Transport};
use cities_console::{City, CityApi, ConsoleError, Coordinates, Government, Governor, TransportError};

// =============================================================================
// FIXTURES
// =============================================================================

pub fn city(id: i64, name: &str) -> City {
    City {
        id,
        name: name.to_string(),
        coordinates: Coordinates { x: 10.0, y: 20.0 },
        creation_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1),
        area: 150.5,
        population: 250_000,
        establishment_date: chrono::NaiveDate::from_ymd_opt(1850, 6, 12),
        capital: false,
        meters_above_sea_level: Some(120.0),
        timezone: 3,
        car_code: Some(69),
        government: Government::Noocracy,
        governor: Governor::new("Ivanov"),
    }
}

/// List endpoint body with the given cities on page `page`.
pub fn page_json(cities: &[City], page: u32, total_pages: u32) -> Value {
    json!({
        "cities": cities,
        "currentPage": page,
        "totalItems": cities.len() as u64 * total_pages as u64,
        "totalPages": total_pages,
        "pageSize": 5,
        "sortBy": "id",
        "sortDirection": "asc"
    })
}

pub fn http_error(status: u16, message: &str) -> TransportError {
    TransportError::Http {
        status,
        message: message.to_string(),
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub at: Instant,
}

impl Recorded {
    /// Path without the query string.
    pub fn route(&self) -> &str {
        route_of(&self.path)
    }
}

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    result: Result<Reply, TransportError>,
}

#[derive(Default)]
struct Route {
    queue: VecDeque<Scripted>,
    fallback: Option<Scripted>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer the next request to `route` once.
    pub fn push(&self, route: &str, delay: Duration, result: Result<Reply, TransportError>) {
        self.routes
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .queue
            .push_back(Scripted { delay, result });
    }

    pub fn push_json(&self, route: &str, body: Value) {
        self.push(route, Duration::ZERO, Ok(Reply::Json(body)));
    }

    /// Answer every request to `route` that has no queued response.
    pub fn always(&self, route: &str, delay: Duration, result: Result<Reply, TransportError>) {
        self.routes
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .fallback = Some(Scripted { delay, result });
    }

    pub fn always_json(&self, route: &str, body: Value) {
        self.always(route, Duration::ZERO, Ok(Reply::Json(body)));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, route: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.route() == route)
            .collect()
    }

    pub fn count(&self, route: &str) -> usize {
        self.requests_to(route).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Reply, TransportError> {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            body,
            at: Instant::now(),
        });

        let scripted = {
            let mut routes = self.routes.lock().unwrap();
            routes.get_mut(route_of(path)).and_then(|route| {
                route
                    .queue
                    .pop_front()
                    .or_else(|| route.fallback.clone())
            })
        };

        match scripted {
            Some(Scripted { delay, result }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(http_error(500, &format!("no scripted response for {}", path))),
        }
    }
}

fn route_of(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

pub fn api_over(transport: &Arc<ScriptedTransport>) -> CityApi {
    CityApi::new(transport.clone())
}

// =============================================================================
// SOCKETS
// =============================================================================

/// What the next `connect` call does.
#[derive(Debug, Clone)]
pub enum ConnectStep {
    Fail,
    /// Deliver `frames`, then either stay open until closed or hang up.
    Open { frames: Vec<String>, hold: bool },
}

#[derive(Default)]
pub struct ScriptedConnector {
    steps: Mutex<VecDeque<ConnectStep>>,
    connects: Mutex<Vec<Instant>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    /// Once the script runs out every connect fails.
    pub fn new(steps: Vec<ConnectStep>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connects.lock().unwrap().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }

    /// Client-initiated closes.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SocketConnector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Socket>, ConsoleError> {
        self.connects.lock().unwrap().push(Instant::now());
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(ConnectStep::Fail);
        match step {
            ConnectStep::Fail => Err(ConsoleError::Channel(format!("{} refused", url))),
            ConnectStep::Open { frames, hold } => Ok(Box::new(ScriptedSocket {
                frames: frames.into(),
                hold,
                closes: self.closes.clone(),
            })),
        }
    }
}

struct ScriptedSocket {
    frames: VecDeque<String>,
    hold: bool,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Socket for ScriptedSocket {
    async fn next_text(&mut self) -> Option<Result<String, ConsoleError>> {
        if let Some(frame) = self.frames.pop_front() {
            return Some(Ok(frame));
        }
        if self.hold {
            std::future::pending::<()>().await;
        }
        None
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn event_frame(kind: &str, data: Value) -> String {
    json!({ "type": kind, "data": data }).to_string()
}
