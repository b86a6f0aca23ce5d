use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers::{
    approve_appointment, book_appointment, get_appointment, list_appointments,
    reject_appointment, update_status,
};
use appointment_cell::models::{
    AppointmentListParams, AppointmentStatus, BookAppointmentRequest, StatusUpdateRequest,
};
use appointment_cell::services::validation::{PAST_DATE_MESSAGE, SLOT_CONFLICT_MESSAGE};
use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockDbRows, TestAccount, TestConfig};

fn config_for(mock_server: &MockServer) -> Arc<AppConfig> {
    TestConfig::with_database_url(&mock_server.uri()).to_arc()
}

fn ext(account: &TestAccount) -> Extension<AuthUser> {
    Extension(account.to_auth_user())
}

fn empty_params() -> AppointmentListParams {
    AppointmentListParams {
        status: None,
        date_from: None,
        date_to: None,
        q: None,
        limit: None,
        offset: None,
    }
}

fn book_request(doctor: Uuid, date: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        description: "Routine consultation".to_string(),
    }
}

async fn mount_account_lookup(mock_server: &MockServer, account: &TestAccount) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("id", format!("eq.{}", account.id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([MockDbRows::account(account)])),
        )
        .mount(mock_server)
        .await;
}

async fn mount_free_slot(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_book_appointment_success() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");

    mount_account_lookup(&mock_server, &patient).await;
    mount_account_lookup(&mock_server, &doctor).await;
    mount_free_slot(&mock_server).await;

    let appointment_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDbRows::appointment(
                appointment_id,
                patient.id,
                doctor.id,
                "2099-05-20",
                "10:00:00",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = book_appointment(
        State(config_for(&mock_server)),
        ext(&patient),
        Json(book_request(doctor.id, "2099-05-20")),
    )
    .await;

    let (status, Json(body)) = result.expect("booking should succeed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment"]["status"], "pending");
    assert_eq!(body["appointment"]["patient_id"], json!(patient.id));
    assert_eq!(body["appointment"]["doctor_id"], json!(doctor.id));
}

#[tokio::test]
async fn test_book_appointment_forbidden_for_doctor_caller() {
    let mock_server = MockServer::start().await;
    let doctor = TestAccount::doctor("doctor1");
    let other_doctor = TestAccount::doctor("doctor2");

    let result = book_appointment(
        State(config_for(&mock_server)),
        ext(&doctor),
        Json(book_request(other_doctor.id, "2099-05-20")),
    )
    .await;

    match result.unwrap_err() {
        AppError::Forbidden(msg) => assert_eq!(msg, "Only patients can create appointments."),
        other => panic!("Expected Forbidden, got {:?}", other),
    }
}

#[tokio::test]
async fn test_book_appointment_past_date() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");

    mount_account_lookup(&mock_server, &patient).await;
    mount_account_lookup(&mock_server, &doctor).await;
    mount_free_slot(&mock_server).await;

    let result = book_appointment(
        State(config_for(&mock_server)),
        ext(&patient),
        Json(book_request(doctor.id, "2020-01-01")),
    )
    .await;

    match result.unwrap_err() {
        AppError::Validation(errors) => {
            assert_eq!(errors.messages("date"), [PAST_DATE_MESSAGE]);
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_book_appointment_taken_slot() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");

    mount_account_lookup(&mock_server, &patient).await;
    mount_account_lookup(&mock_server, &doctor).await;

    // Another patient already holds the slot in a pending state.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment(
                Uuid::new_v4(),
                Uuid::new_v4(),
                doctor.id,
                "2099-05-20",
                "10:00:00",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = book_appointment(
        State(config_for(&mock_server)),
        ext(&patient),
        Json(book_request(doctor.id, "2099-05-20")),
    )
    .await;

    match result.unwrap_err() {
        AppError::Validation(errors) => {
            assert_eq!(errors.messages("time"), [SLOT_CONFLICT_MESSAGE]);
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_book_appointment_conflict_surfaces_as_field_error() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");

    mount_account_lookup(&mock_server, &patient).await;
    mount_account_lookup(&mock_server, &doctor).await;
    mount_free_slot(&mock_server).await;

    // Pre-check saw a free slot, but a concurrent booking won the insert
    // race and the partial unique index rejected ours.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let result = book_appointment(
        State(config_for(&mock_server)),
        ext(&patient),
        Json(book_request(doctor.id, "2099-05-20")),
    )
    .await;

    match result.unwrap_err() {
        AppError::Validation(errors) => {
            assert_eq!(errors.messages("time"), [SLOT_CONFLICT_MESSAGE]);
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_appointments_scopes_to_patient() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment(
                Uuid::new_v4(),
                patient.id,
                doctor.id,
                "2026-09-10",
                "09:00:00",
                "approved"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = list_appointments(
        State(config_for(&mock_server)),
        ext(&patient),
        Query(empty_params()),
    )
    .await;

    let Json(body) = result.expect("listing should succeed");
    assert_eq!(body["count"], 1);
    assert_eq!(body["appointments"][0]["status"], "approved");
}

#[tokio::test]
async fn test_list_appointments_staff_sees_none() {
    let mock_server = MockServer::start().await;
    let staff = TestAccount::staff("admin1");

    // No database mock mounted: the staff scope never queries.
    let result = list_appointments(
        State(config_for(&mock_server)),
        ext(&staff),
        Query(empty_params()),
    )
    .await;

    let Json(body) = result.expect("listing should succeed");
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_list_appointments_rejects_malformed_date_filter() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");

    let mut params = empty_params();
    params.date_from = Some("20-01-2026".to_string());

    let result = list_appointments(
        State(config_for(&mock_server)),
        ext(&patient),
        Query(params),
    )
    .await;

    match result.unwrap_err() {
        AppError::BadRequest(msg) => {
            assert_eq!(msg, "Invalid date format. Use YYYY-MM-DD for date_from/date_to.");
        }
        other => panic!("Expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_appointment_hidden_from_non_party() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");
    let outsider = TestAccount::patient("patient2");

    let appointment_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment(
                appointment_id,
                patient.id,
                doctor.id,
                "2026-09-10",
                "09:00:00",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = get_appointment(
        State(config_for(&mock_server)),
        ext(&outsider),
        Path(appointment_id),
    )
    .await;

    assert_matches!(result.unwrap_err(), AppError::NotFound(_));
}

#[tokio::test]
async fn test_approve_appointment_success() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment(
                appointment_id,
                patient.id,
                doctor.id,
                "2026-09-10",
                "09:00:00",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(query_param("status", "eq.pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment(
                appointment_id,
                patient.id,
                doctor.id,
                "2026-09-10",
                "09:00:00",
                "approved"
            )
        ])))
        .mount(&mock_server)
        .await;

    mount_account_lookup(&mock_server, &patient).await;
    mount_account_lookup(&mock_server, &doctor).await;

    let result = approve_appointment(
        State(config_for(&mock_server)),
        ext(&doctor),
        Path(appointment_id),
    )
    .await;

    let Json(body) = result.expect("approval should succeed");
    assert_eq!(body["success"], true);
    assert_eq!(body["changed"], true);
    assert_eq!(body["appointment"]["status"], "approved");
    // Mail transport is disabled in the test config, so the status change
    // carries the not-notified warning.
    assert!(body["warning"].is_string());
}

#[tokio::test]
async fn test_reject_appointment_success() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment(
                appointment_id,
                patient.id,
                doctor.id,
                "2026-09-10",
                "09:00:00",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment(
                appointment_id,
                patient.id,
                doctor.id,
                "2026-09-10",
                "09:00:00",
                "rejected"
            )
        ])))
        .mount(&mock_server)
        .await;

    mount_account_lookup(&mock_server, &patient).await;
    mount_account_lookup(&mock_server, &doctor).await;

    let result = reject_appointment(
        State(config_for(&mock_server)),
        ext(&doctor),
        Path(appointment_id),
    )
    .await;

    let Json(body) = result.expect("rejection should succeed");
    assert_eq!(body["changed"], true);
    assert_eq!(body["appointment"]["status"], "rejected");
}

#[tokio::test]
async fn test_approve_appointment_already_resolved_is_noop() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");
    let doctor = TestAccount::doctor("doctor1");
    let appointment_id = Uuid::new_v4();

    // No PATCH and no account mocks mounted: a no-op must not write or
    // send anything.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment(
                appointment_id,
                patient.id,
                doctor.id,
                "2026-09-10",
                "09:00:00",
                "approved"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = approve_appointment(
        State(config_for(&mock_server)),
        ext(&doctor),
        Path(appointment_id),
    )
    .await;

    let Json(body) = result.expect("repeat approval should be a no-op");
    assert_eq!(body["success"], true);
    assert_eq!(body["changed"], false);
    assert_eq!(body["appointment"]["status"], "approved");
    assert!(body.get("warning").is_none());
}

#[tokio::test]
async fn test_approve_appointment_of_other_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    let doctor = TestAccount::doctor("doctor1");

    // The owner filter is part of the query, so a non-owner sees no rows.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = approve_appointment(
        State(config_for(&mock_server)),
        ext(&doctor),
        Path(Uuid::new_v4()),
    )
    .await;

    assert_matches!(result.unwrap_err(), AppError::NotFound(_));
}

#[tokio::test]
async fn test_approve_appointment_forbidden_for_patient() {
    let mock_server = MockServer::start().await;
    let patient = TestAccount::patient("patient1");

    let result = approve_appointment(
        State(config_for(&mock_server)),
        ext(&patient),
        Path(Uuid::new_v4()),
    )
    .await;

    match result.unwrap_err() {
        AppError::Forbidden(msg) => {
            assert_eq!(msg, "Only doctors can update appointment status.");
        }
        other => panic!("Expected Forbidden, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_status_rejects_pending() {
    let mock_server = MockServer::start().await;
    let doctor = TestAccount::doctor("doctor1");

    let result = update_status(
        State(config_for(&mock_server)),
        ext(&doctor),
        Path(Uuid::new_v4()),
        Json(StatusUpdateRequest {
            status: AppointmentStatus::Pending,
        }),
    )
    .await;

    match result.unwrap_err() {
        AppError::BadRequest(msg) => {
            assert_eq!(msg, "Status must be approved or rejected.");
        }
        other => panic!("Expected BadRequest, got {:?}", other),
    }
}
