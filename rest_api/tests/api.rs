// rest_api/tests/api.rs
mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{failing_predictor, TestApp};
use models::medical::{EmergencyStatus, RecipientType};
use rest_api::config::parse_responders;
use rest_api::seed_responders;
use storage::RecordStore;

// --- Auth ---

#[tokio::test]
async fn duplicate_registration_is_conflict_and_adds_no_user() {
    let app = TestApp::new();
    app.register("jane@example.com", "patient").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "JANE@example.com",
                "password": "another-pass",
                "phone": "555-0142",
                "name": "Jane Again",
                "role": "patient",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
    assert_eq!(app.store.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn registration_validates_before_writing() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "x@example.com", "password": "123", "name": "X", "role": "patient" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "password must be at least 6 characters long");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "x@example.com", "password": "123456", "name": "X", "phone": "555-0100", "role": "nurse" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "x@example.com", "password": "123456", "name": "X", "role": "patient" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "phone is required");
    assert!(app.store.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::new();
    app.register("doc@example.com", "doctor").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "doc@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "doc@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "doctor");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/api/auth/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.call(Method::GET, "/api/vitals", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update_keeps_role() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/auth/profile",
            Some(&token),
            Some(json!({ "name": "Pat Renamed", "bloodType": "A-", "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Pat Renamed");
    assert_eq!(body["user"]["role"], "patient");
    assert_eq!(body["profile"]["bloodType"], "A-");
    assert_eq!(body["profile"]["height"], "170 cm");
}

// --- Role gating ---

#[tokio::test]
async fn non_admin_listing_users_is_forbidden_without_store_access() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    let before = app.store.operations();
    let (status, body) = app.call(Method::GET, "/api/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
    assert_eq!(app.store.operations(), before);
}

#[tokio::test]
async fn admin_delete_cascades_and_reports_missing_users() {
    let app = TestApp::new();
    let (admin, _) = app.register("root@example.com", "admin").await;
    let (_, patient_user) = app.register("pat@example.com", "patient").await;

    let (status, body) = app.call(Method::GET, "/api/admin/patients", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patients"].as_array().unwrap().len(), 1);

    let uri = format!("/api/admin/users/{}", patient_user);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.list_patients().await.unwrap().is_empty());

    let (status, _) = app.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call(Method::DELETE, "/api/admin/users/not-a-uuid", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_accounts_lose_access() {
    let app = TestApp::new();
    let (root, _) = app.register("root@example.com", "admin").await;
    let (other, other_id) = app.register("other@example.com", "admin").await;
    let (patient, patient_id) = app.register("pat@example.com", "patient").await;

    for id in [&other_id, &patient_id] {
        let (status, _) = app
            .call(Method::DELETE, &format!("/api/admin/users/{}", id), Some(&root), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.call(Method::GET, "/api/admin/users", Some(&other), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token, user not found");

    let (status, _) = app.call(Method::GET, "/api/vitals", Some(&patient), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.call(Method::GET, "/api/patient/profile", Some(&patient), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call(Method::GET, "/api/admin/users", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
}

// --- Vitals and alerts ---

#[tokio::test]
async fn vitals_date_range_is_inclusive() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    for ts in [
        "2023-12-31T23:59:59Z",
        "2024-01-01T00:00:00Z",
        "2024-01-15T12:00:00Z",
        "2024-01-31T23:59:59Z",
        "2024-02-01T00:00:00Z",
    ] {
        let (status, body) = app
            .call(
                Method::POST,
                "/api/vitals",
                Some(&token),
                Some(json!({ "type": "heart_rate", "value": 72, "unit": "bpm", "timestamp": ts })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, body) = app
        .call(
            Method::GET,
            "/api/vitals?startDate=2024-01-01&endDate=2024-01-31",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let stamps: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["timestamp"].as_str().unwrap())
        .collect();
    assert_eq!(stamps.len(), 3);
    assert!(stamps[0].starts_with("2024-01-31"));
    assert!(stamps[2].starts_with("2024-01-01"));
}

#[tokio::test]
async fn vitals_query_validates_parameters() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    for uri in [
        "/api/vitals?startDate=2024-02-30",
        "/api/vitals?type=glucose",
        "/api/vitals?limit=0",
        "/api/vitals?patientId=123",
        "/api/vitals?startDate=2024-02-01&endDate=2024-01-01",
    ] {
        let (status, _) = app.call(Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn doctors_must_name_an_existing_patient() {
    let app = TestApp::new();
    let (doctor, _) = app.register("doc@example.com", "doctor").await;
    let (patient, _) = app.register("pat@example.com", "patient").await;
    let patient_id = app.patient_id(&patient).await;

    let (status, _) = app.call(Method::GET, "/api/vitals", Some(&doctor), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = format!("/api/vitals?patientId={}", Uuid::new_v4());
    let (status, _) = app.call(Method::GET, &unknown, Some(&doctor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/vitals",
            Some(&doctor),
            Some(json!({ "patientId": patient_id, "type": "blood_pressure", "value": "120/80", "unit": "mmHg" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call(Method::GET, &format!("/api/vitals?patientId={}", patient_id), Some(&doctor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["value"], "120/80");
}

#[tokio::test]
async fn alerts_put_anomalies_ahead_of_stored_alerts() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/alerts",
            Some(&token),
            Some(json!({ "type": "system", "title": "Checkup", "message": "Annual checkup due" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.call(
        Method::POST,
        "/api/vitals",
        Some(&token),
        Some(json!({ "type": "heart_rate", "value": 150, "unit": "bpm" })),
    )
    .await;

    let (status, body) = app.call(Method::GET, "/api/alerts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let alerts = body.as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["message"], "Anomaly detected in heart_rate: 150 bpm");
    assert_eq!(alerts[1]["title"], "Checkup");

    let (_, body) = app.call(Method::GET, "/api/alerts?type=system", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn alert_date_window_bounds_anomalies() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    let june = json!({ "type": "heart_rate", "value": 150, "unit": "bpm", "timestamp": "2023-06-01T00:00:00Z" });
    let (status, _) = app.call(Method::POST, "/api/vitals", Some(&token), Some(june)).await;
    assert_eq!(status, StatusCode::CREATED);

    let january = "/api/alerts?startDate=2024-01-01&endDate=2024-01-31";
    let (status, body) = app.call(Method::GET, january, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty(), "unexpected alerts: {}", body);

    let mid_january = json!({ "type": "heart_rate", "value": 151, "unit": "bpm", "timestamp": "2024-01-10T00:00:00Z" });
    let (status, _) = app.call(Method::POST, "/api/vitals", Some(&token), Some(mid_january)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.call(Method::GET, january, Some(&token), None).await;
    let alerts = body.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["id"], "anomaly-2024-01-10T00:00:00+00:00");
}

#[tokio::test]
async fn only_admins_target_other_users_with_alerts() {
    let app = TestApp::new();
    let (patient, _) = app.register("pat@example.com", "patient").await;
    let (admin, _) = app.register("root@example.com", "admin").await;
    let (_, other) = app.register("doc@example.com", "doctor").await;

    let body = json!({ "userId": other, "type": "system", "title": "Hi", "message": "Hello" });
    let (status, _) = app.call(Method::POST, "/api/alerts", Some(&patient), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, created) = app.call(Method::POST, "/api/alerts", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["alert"]["userId"], other);
}

#[tokio::test]
async fn health_status_uses_predictor_verdict() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;
    app.call(
        Method::POST,
        "/api/vitals",
        Some(&token),
        Some(json!({ "type": "temperature", "value": 36.6, "unit": "C" })),
    )
    .await;

    let (status, body) = app.call(Method::GET, "/api/health-status", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthStatus"]["status"], "Stable");
    assert_eq!(body["healthStatus"]["riskLevel"], "Low");
    assert!(body["healthStatus"]["lastEvaluated"].is_string());

    let other = format!("/api/health-status?patientId={}", Uuid::new_v4());
    let (status, _) = app.call(Method::GET, &other, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Doctor notes ---

#[tokio::test]
async fn doctor_notes_round_trip() {
    let app = TestApp::new();
    let (doctor, _) = app.register("doc@example.com", "doctor").await;
    let (patient, _) = app.register("pat@example.com", "patient").await;
    let patient_id = app.patient_id(&patient).await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/doctor/notes",
            Some(&doctor),
            Some(json!({ "patientId": Uuid::new_v4(), "note": "Follow up" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/doctor/notes",
            Some(&doctor),
            Some(json!({ "patientId": patient_id, "note": "x".repeat(1001) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/doctor/notes",
            Some(&doctor),
            Some(json!({ "patientId": patient_id, "note": "Follow up in two weeks" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.call(Method::GET, "/api/doctor/notes", Some(&doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"][0]["note"], "Follow up in two weeks");
    assert_eq!(body["notes"][0]["patient"]["name"], "patient user");

    let (status, _) = app.call(Method::GET, "/api/doctor/notes", Some(&patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// --- Emergency dispatch ---

#[tokio::test]
async fn trigger_without_contacts_writes_one_ambulance_notification() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/emergency/trigger",
            Some(&token),
            Some(json!({ "location": { "latitude": 40.0, "longitude": -73.0 } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["emergency"]["status"], "active");
    assert_eq!(body["emergency"]["hospitalId"], "h-1");
    assert_eq!(body["emergency"]["ambulanceId"], "a-1");

    let notifications = app.store.list_notifications().await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].recipient_type, RecipientType::Ambulance);
    assert_eq!(notifications[0].recipient_id, "a-1");
}

#[tokio::test]
async fn predictor_failure_still_dispatches_to_general_hospital() {
    let app = TestApp::with_predictor(failing_predictor().await, None);
    let (token, _) = app.register("pat@example.com", "patient").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/emergency/trigger",
            Some(&token),
            Some(json!({ "location": { "latitude": 40.0, "longitude": -73.0 }, "notes": "chest pain" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["emergency"]["hospitalName"], "General Hospital");
    assert_eq!(body["emergency"]["estimatedAmbulanceArrival"], "15 minutes");
}

#[tokio::test]
async fn trigger_rejects_bad_input_before_dispatch() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    let (status, body) = app
        .call(Method::POST, "/api/emergency/trigger", Some(&token), Some(json!({ "notes": "help" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Location is required");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/emergency/trigger",
            Some(&token),
            Some(json!({ "location": { "latitude": 40.0, "longitude": -73.0 }, "notes": "x".repeat(501) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/emergency/trigger",
            Some(&token),
            Some(json!({ "location": { "latitude": 95.0, "longitude": -73.0 } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.list_notifications().await.unwrap().is_empty());
}

#[tokio::test]
async fn second_cancel_is_not_found_and_status_stays_cancelled() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;
    let (_, body) = app
        .call(
            Method::POST,
            "/api/emergency/trigger",
            Some(&token),
            Some(json!({ "location": { "latitude": 40.0, "longitude": -73.0 } })),
        )
        .await;
    let emergency_id = body["emergency"]["id"].as_str().unwrap().to_string();

    let cancel = json!({ "emergencyId": emergency_id, "reason": "False alarm" });
    let (status, body) = app
        .call(Method::POST, "/api/emergency/cancel", Some(&token), Some(cancel.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emergency"]["cancellationReason"], "False alarm");

    let (status, body) = app
        .call(Method::POST, "/api/emergency/cancel", Some(&token), Some(cancel))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Active emergency not found");

    let stored = app
        .store
        .emergency_by_id(emergency_id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, EmergencyStatus::Cancelled);
}

#[tokio::test]
async fn qr_trigger_needs_no_token_and_names_the_patient() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;
    let patient_id = app.patient_id(&token).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/emergency/trigger-by-qr",
            None,
            Some(json!({ "patientCode": patient_id, "location": { "latitude": 40.0, "longitude": -73.0 } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["emergency"]["patientName"], "patient user");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/emergency/trigger-by-qr",
            None,
            Some(json!({ "patientCode": "abc", "location": { "latitude": 40.0, "longitude": -73.0 } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/emergency/trigger-by-qr",
            None,
            Some(json!({ "patientCode": Uuid::new_v4(), "location": { "latitude": 40.0, "longitude": -73.0 } })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Invalid patient code");
}

#[tokio::test]
async fn status_enriches_known_responders() {
    let app = TestApp::new();
    let responders = parse_responders(
        "hospitals:\n  - id: h-1\n    name: City Hospital\n    address: 1 Main St\n",
    )
    .unwrap();
    tokio_test::assert_ok!(seed_responders(app.store.as_ref(), &responders).await);
    let (token, _) = app.register("pat@example.com", "patient").await;

    let (status, body) = app.call(Method::GET, "/api/emergency/status", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    app.call(
        Method::POST,
        "/api/emergency/trigger",
        Some(&token),
        Some(json!({ "location": { "latitude": 40.0, "longitude": -73.0 } })),
    )
    .await;
    let (_, body) = app.call(Method::GET, "/api/emergency/status", Some(&token), None).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["emergencies"][0]["hospital"]["name"], "City Hospital");
    assert_eq!(body["emergencies"][0]["hospital"]["address"], "1 Main St");
    assert!(body["emergencies"][0]["ambulance"]["name"].is_null());
}

// --- Communication sessions ---

#[tokio::test]
async fn comms_without_configuration_is_not_implemented() {
    let app = TestApp::new();
    let (token, _) = app.register("pat@example.com", "patient").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/comms/sessions",
            Some(&token),
            Some(json!({ "sessionType": "video", "participantIds": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["error"], "Communication service not configured");
}

#[tokio::test]
async fn comms_session_lifecycle() {
    let app = TestApp::with_comms();
    let (patient, patient_user) = app.register("pat@example.com", "patient").await;
    let (doctor, doctor_user) = app.register("doc@example.com", "doctor").await;
    let (outsider, _) = app.register("other@example.com", "patient").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/comms/sessions",
            Some(&patient),
            Some(json!({ "sessionType": "video", "participantIds": [doctor_user] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["session"]["token"]["token"].is_string());
    let session_id = body["session"]["id"].as_str().unwrap().to_string();

    let participants_uri = format!("/api/comms/sessions/{}/participants", session_id);
    let (status, _) = app.call(Method::GET, &participants_uri, Some(&outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, body) = app.call(Method::GET, &participants_uri, Some(&doctor), None).await;
    let ids: Vec<&str> = body["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&patient_user.as_str()));

    let (status, body) = app.call(Method::GET, "/api/comms/sessions", Some(&doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);

    let end_uri = format!("/api/comms/sessions/{}/end", session_id);
    let (status, _) = app.call(Method::PUT, &end_uri, Some(&outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(Method::PUT, &end_uri, Some(&doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::PUT, &end_uri, Some(&patient), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let join_uri = format!("/api/comms/sessions/{}/join", session_id);
    let (status, _) = app.call(Method::POST, &join_uri, Some(&outsider), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.call(Method::GET, "/api/comms/sessions?status=ended", Some(&patient), None).await;
    assert_eq!(body["sessions"][0]["status"], "ended");
}

#[tokio::test]
async fn joining_and_leaving_an_active_session() {
    let app = TestApp::with_comms();
    let (patient, _) = app.register("pat@example.com", "patient").await;
    let (doctor, _) = app.register("doc@example.com", "doctor").await;

    let (_, body) = app
        .call(
            Method::POST,
            "/api/comms/sessions",
            Some(&patient),
            Some(json!({ "sessionType": "audio", "participantIds": [] })),
        )
        .await;
    let session_id = body["session"]["id"].as_str().unwrap().to_string();

    let leave_uri = format!("/api/comms/sessions/{}/leave", session_id);
    let (status, _) = app.call(Method::POST, &leave_uri, Some(&doctor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let join_uri = format!("/api/comms/sessions/{}/join", session_id);
    let (status, body) = app.call(Method::POST, &join_uri, Some(&doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["type"], "audio");

    let (status, _) = app.call(Method::POST, &leave_uri, Some(&doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::POST, &join_uri, Some(&doctor), None).await;
    assert_eq!(status, StatusCode::OK);

    let participants_uri = format!("/api/comms/sessions/{}/participants", session_id);
    let (_, body) = app.call(Method::GET, &participants_uri, Some(&patient), None).await;
    let statuses: Vec<&str> = body["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["active", "active"]);
}

#[tokio::test]
async fn health_check_is_public() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
