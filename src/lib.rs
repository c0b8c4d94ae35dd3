//! Cities Console - client-side sync for the cities admin console
//!
//! Keeps a paginated, filtered, sorted view of the city table consistent
//! with the server while the user edits it and while other clients mutate it.
//!
//! ## Components
//! - `transport` / `api`: HTTP calls with operation-prefixed errors
//! - `list`: query descriptor, debounced refetch, stale-response guard
//! - `realtime`: push channel with bounded exponential reconnect
//! - `form`, `detail`, `aggregates`: the entity editor, id lookup and
//!   special functions panel
//! - `console`: wires list and channel together for one mounted view
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cities_console::{CityConsole, ConsoleConfig, Column};
//!
//! # async fn run() -> cities_console::Result<()> {
//! cities_console::logging::init();
//! let config = ConsoleConfig::from_env()?;
//! let api = config.build_api()?;
//! let channel = Arc::new(config.build_channel());
//!
//! let mut console = CityConsole::mount(api, channel, &config).await;
//! console.list().set_filter(Column::Name, "Tv");
//! let page = console.list().snapshot();
//! println!("{} cities", page.total_items);
//! console.unmount().await;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Runtime setup
pub mod config;
pub mod logging;

// City schema and its rules
pub mod model;
pub mod validation;

// Server access
pub mod api;
pub mod transport;

// State machines
pub mod aggregates;
pub mod detail;
pub mod form;
pub mod list;
pub mod notice;
pub mod realtime;
pub mod task;
pub mod timer;

// View wiring
pub mod console;

pub use aggregates::{AggregateFunction, AggregateResult, AggregatesPanel};
pub use api::CityApi;
pub use config::ConsoleConfig;
pub use console::CityConsole;
pub use detail::{DetailLookup, DetailModal};
pub use error::{ConsoleError, Result, TransportError};
pub use form::{EntityForm, FormMode, FormOutcome, SubmitRequest};
pub use list::{FetchOutcome, ListController, ListQuery, ListSnapshot, ListState};
pub use model::{City, CityPage, CityPayload, Column, Coordinates, Government, Governor, SortDirection};
pub use notice::{Notice, NoticeLevel};
pub use realtime::{ChannelStatus, EventKind, RealtimeChannel, RealtimeEvent, ReconnectPolicy};
pub use task::TaskStatus;
pub use transport::{HttpTransport, Transport};
pub use validation::{validate, CityDraft, FormField, FormTab, ValidationErrors};
