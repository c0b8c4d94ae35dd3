//! Detail Lookup: fetch one city by id into a read-only modal.
//!
//! Independent of the list: it never touches pagination and is not
//! invalidated by realtime events. The modal shows the entity as it was at
//! fetch time.

use tracing::{debug, warn};

use crate::api::CityApi;
use crate::error::{ConsoleError, Result};
use crate::form::EntityForm;
use crate::model::City;
use crate::notice::Notice;

pub const MSG_INVALID_ID: &str = "Please enter a valid city ID";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailModal {
    #[default]
    Closed,
    Open(City),
}

#[derive(Debug, Default)]
pub struct DetailLookup {
    input: String,
    modal: DetailModal,
    searching: bool,
    notices: Vec<Notice>,
}

/// Positive integer ids only.
pub fn parse_id(input: &str) -> Result<i64> {
    match input.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ConsoleError::InvalidInput(MSG_INVALID_ID.to_string())),
    }
}

impl DetailLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Look up the id typed into the search box. The modal opens only on
    /// success; any failure leaves it closed and raises a notice.
    pub async fn search_by_id(&mut self, api: &CityApi) -> Result<()> {
        let id = match parse_id(&self.input) {
            Ok(id) => id,
            Err(e) => {
                self.notices.push(Notice::error(MSG_INVALID_ID));
                return Err(e);
            }
        };

        self.searching = true;
        let result = api.get_by_id(id).await;
        self.searching = false;

        match result {
            Ok(city) => {
                debug!(id, "Opening city detail");
                self.modal = DetailModal::Open(city);
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "City lookup failed");
                self.modal = DetailModal::Closed;
                self.notices.push(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn close(&mut self) {
        self.modal = DetailModal::Closed;
    }

    /// Hand the displayed city to the form for editing and close the modal.
    pub fn edit_selected(&mut self, form: &mut EntityForm) -> bool {
        match std::mem::take(&mut self.modal) {
            DetailModal::Open(city) => {
                form.open_for_edit(&city);
                true
            }
            DetailModal::Closed => false,
        }
    }

    pub fn modal(&self) -> &DetailModal {
        &self.modal
    }

    pub fn selected(&self) -> Option<&City> {
        match &self.modal {
            DetailModal::Open(city) => Some(city),
            DetailModal::Closed => None,
        }
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
