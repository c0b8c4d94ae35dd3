//! Entity Form State Machine
//!
//! ```text
//! Closed -> Open(new) | Open(editing) -> Submitting -> Closed      (saved)
//!           Open(*) -> Closed                                      (cancel)
//!           Submitting -> Open(*)                 (invalid or server failure)
//! ```
//!
//! The form owns one [`CityDraft`]; field edits arrive as dotted paths with
//! raw input text, validation is the pure [`validate`] rule set, and the
//! outcome of every transition is reported through [`Notice`] values.

use chrono::NaiveDate;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::api::CityApi;
use crate::error::{ConsoleError, Result};
use crate::model::{City, CityPayload, Coordinates, Government, PickerOptions};
use crate::notice::Notice;
use crate::task::TaskStatus;
use crate::validation::{validate, CityDraft, FormField, FormTab, ValidationErrors};

pub const MSG_FIX_ERRORS: &str = "Please fix the errors in the form";
pub const MSG_CREATED: &str = "City created successfully!";
pub const MSG_UPDATED: &str = "City updated successfully!";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred";
pub const MSG_LOOKUPS_FAILED: &str = "Failed to load existing data";

// =============================================================================
// STATES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Closed,
    Creating,
    Editing { id: i64 },
}

impl FormMode {
    pub fn is_open(&self) -> bool {
        !matches!(self, FormMode::Closed)
    }
}

/// What a validated submit will send.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest {
    Create(CityPayload),
    Update { id: i64, payload: CityPayload },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    /// Server accepted the entity; the form is closed and the list should refetch.
    Saved,
    /// Local validation blocked the submit; nothing was sent.
    Invalid,
    /// Server or network failure; the form stays open for a retry.
    Failed(ConsoleError),
}

#[derive(Debug, Default)]
pub struct EntityForm {
    mode: FormMode,
    draft: CityDraft,
    errors: ValidationErrors,
    /// Raw input that did not parse; held until the field is edited again.
    input_errors: ValidationErrors,
    submitting: bool,
    active_tab: FormTab,
    picker: TaskStatus<PickerOptions, ConsoleError>,
    notices: Vec<Notice>,
}

impl EntityForm {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Open / close
    // -------------------------------------------------------------------------

    /// Fresh draft with schema defaults.
    pub fn open_for_create(&mut self) {
        self.reset(FormMode::Creating, CityDraft::default());
    }

    /// Seed the draft from an existing entity.
    pub fn open_for_edit(&mut self, city: &City) {
        self.reset(FormMode::Editing { id: city.id }, CityDraft::from(city));
    }

    /// Discard the draft. Refused while a submit is in flight.
    pub fn cancel(&mut self) -> bool {
        if self.submitting {
            debug!("Ignoring cancel while submitting");
            return false;
        }
        self.reset(FormMode::Closed, CityDraft::default());
        true
    }

    fn reset(&mut self, mode: FormMode, draft: CityDraft) {
        self.mode = mode;
        self.draft = draft;
        self.errors.clear();
        self.input_errors.clear();
        self.submitting = false;
        self.active_tab = FormTab::Basic;
    }

    pub fn set_tab(&mut self, tab: FormTab) {
        self.active_tab = tab;
    }

    // -------------------------------------------------------------------------
    // Field edits
    // -------------------------------------------------------------------------

    /// Apply raw input to the field at `path` (`"name"`, `"coordinates.x"`,
    /// `"governor.name"`, ...). Empty numeric input means "no value".
    ///
    /// Input that does not parse leaves the draft unchanged and records a
    /// field error that blocks submit until the field is edited again; an
    /// unknown path is an error.
    pub fn set_field(&mut self, path: &str, input: &str) -> Result<()> {
        let field = FormField::from_path(path)
            .ok_or_else(|| ConsoleError::InvalidInput(format!("Unknown form field: {}", path)))?;

        self.clear_error(field);
        if let Err(message) = self.apply(field, input) {
            self.errors.insert(field, message.clone());
            self.input_errors.insert(field, message);
        }
        Ok(())
    }

    fn clear_error(&mut self, field: FormField) {
        self.errors.remove(field);
        self.input_errors.remove(field);
    }

    fn apply(&mut self, field: FormField, input: &str) -> std::result::Result<(), String> {
        let draft = &mut self.draft;
        match field {
            FormField::Name => draft.name = input.to_string(),
            FormField::GovernorName => draft.governor_name = input.to_string(),
            FormField::CoordinatesX => draft.coordinates_x = parse_number(input, "X")?,
            FormField::CoordinatesY => draft.coordinates_y = parse_number(input, "Y")?,
            FormField::Area => draft.area = parse_number(input, "Area")?,
            FormField::Population => draft.population = parse_number(input, "Population")?,
            FormField::MetersAboveSeaLevel => {
                draft.meters_above_sea_level = parse_number(input, "Meters above sea level")?
            }
            FormField::Timezone => draft.timezone = parse_number(input, "Timezone")?,
            FormField::CarCode => draft.car_code = parse_number(input, "Car code")?,
            FormField::Capital => {
                draft.capital = input
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| "Capital must be true or false".to_string())?
            }
            FormField::Government => {
                draft.government = Government::from_str(input.trim())
                    .map_err(|_| format!("Unknown government: {}", input.trim()))?
            }
            FormField::EstablishmentDate => {
                let input = input.trim();
                draft.establishment_date = if input.is_empty() {
                    None
                } else {
                    Some(
                        NaiveDate::parse_from_str(input, "%Y-%m-%d")
                            .map_err(|_| "Establishment date must be YYYY-MM-DD".to_string())?,
                    )
                };
            }
        }
        Ok(())
    }

    pub fn set_capital(&mut self, capital: bool) {
        self.clear_error(FormField::Capital);
        self.draft.capital = capital;
    }

    pub fn set_government(&mut self, government: Government) {
        self.clear_error(FormField::Government);
        self.draft.government = government;
    }

    /// Adopt an existing governor from the picker.
    pub fn choose_governor(&mut self, name: &str) {
        self.clear_error(FormField::GovernorName);
        self.draft.governor_name = name.to_string();
    }

    /// Adopt an existing coordinate pair from the picker.
    pub fn choose_coordinates(&mut self, coordinates: Coordinates) {
        self.clear_error(FormField::CoordinatesX);
        self.clear_error(FormField::CoordinatesY);
        self.draft.coordinates_x = Some(coordinates.x);
        self.draft.coordinates_y = Some(coordinates.y);
    }

    // -------------------------------------------------------------------------
    // Picker options
    // -------------------------------------------------------------------------

    /// Fetch governors and coordinates for the "choose existing" pickers.
    /// Failure is reported but never blocks editing.
    pub async fn load_picker_options(&mut self, api: &CityApi) {
        self.picker = TaskStatus::InProgress;
        let result = api.picker_options().await;
        if let Err(e) = &result {
            warn!(error = %e, "Picker options unavailable");
            self.notices.push(Notice::error(MSG_LOOKUPS_FAILED));
        }
        self.picker = TaskStatus::Finished(result);
    }

    pub fn picker_options(&self) -> Option<&PickerOptions> {
        self.picker.ok()
    }

    pub fn is_loading_picker_options(&self) -> bool {
        self.picker.is_in_progress()
    }

    // -------------------------------------------------------------------------
    // Validation and submit
    // -------------------------------------------------------------------------

    /// Run the rules over the draft. Unparsed input counts as an error too.
    /// On failure the errors are stored, the first tab holding an error
    /// becomes active and one notice is raised.
    pub fn validate(&mut self) -> bool {
        self.errors = validate(&self.draft);
        self.errors.merge(&self.input_errors);
        match self.errors.first_tab() {
            None => true,
            Some(tab) => {
                self.active_tab = tab;
                self.notices.push(Notice::error(MSG_FIX_ERRORS));
                debug!(errors = self.errors.len(), ?tab, "Form validation failed");
                false
            }
        }
    }

    /// Validate and build the request. Enters `submitting` on success.
    pub fn prepare_submit(&mut self) -> Option<SubmitRequest> {
        if self.submitting || !self.mode.is_open() {
            return None;
        }
        if !self.validate() {
            return None;
        }
        let payload = match self.draft.to_payload() {
            Ok(payload) => payload,
            Err(errors) => {
                self.errors = errors;
                return None;
            }
        };
        self.submitting = true;
        match self.mode {
            FormMode::Editing { id } => Some(SubmitRequest::Update { id, payload }),
            _ => Some(SubmitRequest::Create(payload)),
        }
    }

    /// Apply the server's answer to a prepared submit.
    pub fn finish_submit(&mut self, result: Result<()>) -> FormOutcome {
        self.submitting = false;
        match result {
            Ok(()) => {
                let message = match self.mode {
                    FormMode::Editing { .. } => MSG_UPDATED,
                    _ => MSG_CREATED,
                };
                info!(mode = ?self.mode, "City saved");
                self.notices.push(Notice::success(message));
                self.reset(FormMode::Closed, CityDraft::default());
                FormOutcome::Saved
            }
            Err(e) => {
                warn!(mode = ?self.mode, error = %e, "City save failed");
                if let ConsoleError::Validation(errors) = &e {
                    self.errors = errors.clone();
                    if let Some(tab) = errors.first_tab() {
                        self.active_tab = tab;
                    }
                }
                let message = e.to_string();
                self.notices.push(Notice::error(if message.is_empty() {
                    MSG_UNEXPECTED.to_string()
                } else {
                    message
                }));
                FormOutcome::Failed(e)
            }
        }
    }

    /// Validate, send create or update, and settle the form.
    pub async fn submit(&mut self, api: &CityApi) -> FormOutcome {
        let Some(request) = self.prepare_submit() else {
            return FormOutcome::Invalid;
        };
        let result = match &request {
            SubmitRequest::Create(payload) => api.create(payload).await,
            SubmitRequest::Update { id, payload } => api.update(*id, payload).await,
        };
        self.finish_submit(result)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_open()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn draft(&self) -> &CityDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn active_tab(&self) -> FormTab {
        self.active_tab
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

/// Empty input is "no value"; anything else must parse.
fn parse_number<T: FromStr>(input: &str, label: &str) -> std::result::Result<Option<T>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse::<T>()
        .map(Some)
        .map_err(|_| format!("{} must be a number", label))
}
