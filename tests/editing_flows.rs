//! Form, detail lookup and special functions against a scripted transport

mod helpers;

use serde_json::json;
use std::time::Duration;

use cities_console::aggregates::MSG_INVALID_TIMEZONE;
use cities_console::detail::MSG_INVALID_ID;
use cities_console::form::{MSG_FIX_ERRORS, MSG_UPDATED};
use cities_console::transport::{HttpMethod, Reply};
use cities_console::{
    AggregateFunction, AggregateResult, AggregatesPanel, DetailLookup, DetailModal, EntityForm,
    FormField, FormMode, FormOutcome, FormTab, Notice,
};
use helpers::{api_over, city, http_error, ScriptedTransport};

// =============================================================================
// FORM
// =============================================================================

#[tokio::test]
async fn test_unmodified_edit_sends_original_entity() {
    let transport = ScriptedTransport::new();
    transport.push("/update-by-id/42", Duration::ZERO, Ok(Reply::NoContent));
    let api = api_over(&transport);
    let original = city(42, "Tver");

    let mut form = EntityForm::new();
    form.open_for_edit(&original);
    assert_eq!(form.submit(&api).await, FormOutcome::Saved);

    let request = &transport.requests()[0];
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.path, "/update-by-id/42");
    assert_eq!(
        request.body,
        Some(serde_json::to_value(original.to_payload()).unwrap())
    );
    assert_eq!(form.mode(), FormMode::Closed);
    assert_eq!(form.take_notices(), vec![Notice::success(MSG_UPDATED)]);
}

#[tokio::test]
async fn test_invalid_form_blocks_submit() {
    let transport = ScriptedTransport::new();
    let api = api_over(&transport);

    let mut form = EntityForm::new();
    form.open_for_create();
    for (path, input) in [
        ("name", ""),
        ("population", "0"),
        ("area", "1"),
        ("timezone", "20"),
        ("coordinates.x", "1000"),
        ("coordinates.y", "0"),
        ("carCode", "2000"),
        ("governor.name", ""),
    ] {
        form.set_field(path, input).unwrap();
    }

    assert_eq!(form.submit(&api).await, FormOutcome::Invalid);
    assert!(transport.requests().is_empty());

    let errors: Vec<FormField> = form.errors().fields().collect();
    assert_eq!(
        errors,
        vec![
            FormField::Name,
            FormField::Population,
            FormField::CoordinatesX,
            FormField::Timezone,
            FormField::CarCode,
            FormField::GovernorName,
        ]
    );
    assert!(form.error(FormField::Area).is_none());
    assert!(form.error(FormField::CoordinatesY).is_none());
    assert_eq!(form.active_tab(), FormTab::Basic);
    assert_eq!(form.take_notices(), vec![Notice::error(MSG_FIX_ERRORS)]);
    assert!(form.is_open());
}

#[tokio::test]
async fn test_unparsed_input_is_never_sent() {
    let transport = ScriptedTransport::new();
    transport.push("/update-by-id/42", Duration::ZERO, Ok(Reply::NoContent));
    let api = api_over(&transport);

    let mut form = EntityForm::new();
    form.open_for_edit(&city(42, "Tver"));
    form.set_field("area", "abc").unwrap();

    assert_eq!(form.submit(&api).await, FormOutcome::Invalid);
    assert!(transport.requests().is_empty());
    assert_eq!(form.error(FormField::Area), Some("Area must be a number"));
    assert_eq!(form.take_notices(), vec![Notice::error(MSG_FIX_ERRORS)]);

    form.set_field("area", "200").unwrap();
    assert_eq!(form.submit(&api).await, FormOutcome::Saved);
    let body = transport.requests()[0].body.clone().unwrap();
    assert_eq!(body["area"], json!(200.0));
}

#[tokio::test]
async fn test_server_rejection_keeps_form_for_retry() {
    let transport = ScriptedTransport::new();
    transport.push(
        "/add",
        Duration::ZERO,
        Err(http_error(409, "City with this name already exists")),
    );
    transport.push("/add", Duration::ZERO, Ok(Reply::NoContent));
    let api = api_over(&transport);

    let mut form = EntityForm::new();
    form.open_for_create();
    form.set_field("name", "Tver").unwrap();
    form.set_field("area", "152").unwrap();
    form.set_field("population", "400000").unwrap();
    form.set_field("governor.name", "Rudenya").unwrap();

    let outcome = form.submit(&api).await;
    assert!(matches!(outcome, FormOutcome::Failed(ref e) if e.status() == Some(409)));
    assert_eq!(form.mode(), FormMode::Creating);
    assert!(!form.is_submitting());
    assert_eq!(
        form.take_notices()[0].message,
        "Failed to create city: City with this name already exists"
    );

    assert_eq!(form.submit(&api).await, FormOutcome::Saved);
    assert_eq!(transport.count("/add"), 2);
}

#[tokio::test]
async fn test_picker_choices_fill_draft() {
    let transport = ScriptedTransport::new();
    transport.push_json("/governors", json!([{ "name": "Sobyanin" }]));
    transport.push_json("/coordinates", json!([{ "x": 37.6, "y": 55.7 }]));
    let api = api_over(&transport);

    let mut form = EntityForm::new();
    form.open_for_create();
    form.load_picker_options(&api).await;
    let options = form.picker_options().cloned().unwrap();

    form.choose_governor(&options.governors[0]);
    form.choose_coordinates(options.coordinates[0]);
    assert_eq!(form.draft().governor_name, "Sobyanin");
    assert_eq!(form.draft().coordinates_x, Some(37.6));
    assert_eq!(form.draft().coordinates_y, Some(55.7));
}

#[tokio::test]
async fn test_picker_failure_only_notifies() {
    let transport = ScriptedTransport::new();
    let api = api_over(&transport);

    let mut form = EntityForm::new();
    form.open_for_create();
    form.load_picker_options(&api).await;
    assert!(form.picker_options().is_none());
    assert!(form.is_open());
    assert_eq!(form.take_notices().len(), 1);
}

// =============================================================================
// DETAIL LOOKUP
// =============================================================================

#[tokio::test]
async fn test_search_rejects_bad_id_locally() {
    let transport = ScriptedTransport::new();
    let api = api_over(&transport);
    let mut lookup = DetailLookup::new();

    for input in ["", "abc", "0", "-2"] {
        lookup.set_input(input);
        assert!(lookup.search_by_id(&api).await.is_err());
    }
    assert!(transport.requests().is_empty());
    assert!(lookup
        .take_notices()
        .iter()
        .all(|n| n.message == MSG_INVALID_ID));
}

#[tokio::test]
async fn test_search_miss_leaves_modal_closed() {
    let transport = ScriptedTransport::new();
    transport.push(
        "/get-by-id/7",
        Duration::ZERO,
        Err(http_error(404, "City not found")),
    );
    let api = api_over(&transport);
    let mut lookup = DetailLookup::new();

    lookup.set_input("7");
    assert!(lookup.search_by_id(&api).await.unwrap_err().is_not_found());
    assert_eq!(lookup.modal(), &DetailModal::Closed);
    assert_eq!(
        lookup.take_notices(),
        vec![Notice::error("City with ID 7 not found")]
    );
    assert!(!lookup.is_searching());
}

#[tokio::test]
async fn test_search_hit_hands_off_to_form() {
    let transport = ScriptedTransport::new();
    transport.push_json("/get-by-id/9", serde_json::to_value(city(9, "Omsk")).unwrap());
    let api = api_over(&transport);
    let mut lookup = DetailLookup::new();
    let mut form = EntityForm::new();

    lookup.set_input(" 9 ");
    lookup.search_by_id(&api).await.unwrap();
    assert_eq!(lookup.selected().map(|c| c.name.as_str()), Some("Omsk"));

    assert!(lookup.edit_selected(&mut form));
    assert_eq!(lookup.modal(), &DetailModal::Closed);
    assert_eq!(form.mode(), FormMode::Editing { id: 9 });
    assert_eq!(form.draft().name, "Omsk");
}

// =============================================================================
// SPECIAL FUNCTIONS
// =============================================================================

#[tokio::test]
async fn test_out_of_range_timezone_blocked_when_checking() {
    let transport = ScriptedTransport::new();
    let api = api_over(&transport);
    let mut panel = AggregatesPanel::new(true);

    panel.set_timezone_input("20");
    let err = panel
        .execute(&api, AggregateFunction::CitiesWithTimezoneLessThan)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Timezone must be between -13 and 15");
    assert!(transport.requests().is_empty());

    panel.set_timezone_input("three");
    assert!(panel
        .execute(&api, AggregateFunction::CitiesWithTimezoneLessThan)
        .await
        .is_err());
    assert_eq!(panel.take_notices().last().unwrap().message, MSG_INVALID_TIMEZONE);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_out_of_range_timezone_surfaces_server_error_when_unchecked() {
    let transport = ScriptedTransport::new();
    transport.push(
        "/timezone-less-than/20",
        Duration::ZERO,
        Err(http_error(400, "Timezone must be between -13 and 15")),
    );
    let api = api_over(&transport);
    let mut panel = AggregatesPanel::new(false);

    panel.set_timezone_input("20");
    let err = panel
        .execute(&api, AggregateFunction::CitiesWithTimezoneLessThan)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(
        panel.error(AggregateFunction::CitiesWithTimezoneLessThan),
        Some(&err)
    );
    assert!(!panel.is_running(AggregateFunction::CitiesWithTimezoneLessThan));
    assert!(panel.take_notices()[0].is_error());
}

#[tokio::test]
async fn test_results_are_tracked_per_function() {
    let transport = ScriptedTransport::new();
    transport.push_json("/sum-of-timezones", json!(17));
    transport.push_json("/average-car-code", json!(123.456));
    transport.push_json(
        "/timezone-less-than/5",
        json!([city(1, "Tver"), city(2, "Pskov")]),
    );
    let api = api_over(&transport);
    let mut panel = AggregatesPanel::new(true);

    panel.execute(&api, AggregateFunction::SumOfTimezones).await.unwrap();
    panel.execute(&api, AggregateFunction::AverageCarCode).await.unwrap();
    panel.set_timezone_input("5");
    let found = panel
        .execute(&api, AggregateFunction::CitiesWithTimezoneLessThan)
        .await
        .unwrap();
    assert!(matches!(found, AggregateResult::Cities(ref c) if c.len() == 2));

    assert_eq!(panel.formatted(AggregateFunction::SumOfTimezones).as_deref(), Some("17.00"));
    assert_eq!(panel.formatted(AggregateFunction::AverageCarCode).as_deref(), Some("123.46"));
    assert_eq!(
        panel.formatted(AggregateFunction::CitiesWithTimezoneLessThan).as_deref(),
        Some("Found 2 cities")
    );
    assert!(panel.formatted(AggregateFunction::DistanceToNewest).is_none());

    panel.set_timezone_input("6");
    assert!(panel.result(AggregateFunction::CitiesWithTimezoneLessThan).is_none());
    assert!(panel.result(AggregateFunction::SumOfTimezones).is_some());
}
