//! List Query State and its controller.

mod controller;
mod query;
mod state;

pub use controller::ListController;
pub use query::ListQuery;
pub use state::{visible_pages, FetchOutcome, FetchTicket, ListSnapshot, ListState, PAGE_WINDOW};
