// rest_api/src/lib.rs
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod state;

pub use config::{load_app_config, load_responders, AppConfig, RespondersFile};
pub use errors::{ApiError, ApiResult};
pub use state::{seed_responders, AppState};

use handlers::{admin, alerts, auth, comms, doctor, emergency, health_status, patient, vitals};

/// Every API route, bound to `state`. CORS is added by `start_server`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check_handler))
        // --- Auth ---
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/reset-password", post(auth::reset_password_handler))
        .route(
            "/api/auth/profile",
            get(auth::get_profile_handler).put(auth::update_profile_handler),
        )
        // --- Patient ---
        .route("/api/patient/profile", get(patient::get_patient_profile_handler))
        .route("/api/patient/emergency-contacts", get(patient::get_emergency_contacts_handler))
        .route("/api/patient/medical-records", get(patient::get_medical_records_handler))
        // --- Doctor ---
        .route("/api/doctor/profile", get(doctor::get_doctor_profile_handler))
        .route(
            "/api/doctor/notes",
            get(doctor::get_notes_handler).post(doctor::create_note_handler),
        )
        // --- Monitoring ---
        .route("/api/vitals", get(vitals::get_vitals_handler).post(vitals::create_vital_handler))
        .route("/api/alerts", get(alerts::get_alerts_handler).post(alerts::create_alert_handler))
        .route("/api/health-status", get(health_status::get_health_status_handler))
        // --- Emergency ---
        .route("/api/emergency/trigger", post(emergency::trigger_emergency_handler))
        .route("/api/emergency/trigger-by-qr", post(emergency::trigger_by_qr_handler))
        .route("/api/emergency/status", get(emergency::get_emergency_status_handler))
        .route("/api/emergency/cancel", post(emergency::cancel_emergency_handler))
        // --- Admin ---
        .route("/api/admin/users", get(admin::list_users_handler))
        .route("/api/admin/users/:userId", delete(admin::delete_user_handler))
        .route("/api/admin/patients", get(admin::list_patients_handler))
        .route("/api/admin/doctors", get(admin::list_doctors_handler))
        .route("/api/admin/notifications", get(admin::list_notifications_handler))
        // --- Communication ---
        .route(
            "/api/comms/sessions",
            get(comms::list_sessions_handler).post(comms::create_session_handler),
        )
        .route("/api/comms/sessions/:sessionId/end", put(comms::end_session_handler))
        .route("/api/comms/sessions/:sessionId/join", post(comms::join_session_handler))
        .route("/api/comms/sessions/:sessionId/leave", post(comms::leave_session_handler))
        .route(
            "/api/comms/sessions/:sessionId/participants",
            get(comms::list_participants_handler),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(frontend_url: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))
        .with_context(|| format!("Invalid FRONTEND_URL: {}", frontend_url))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]))
}

/// Serves the API until `shutdown_rx` fires.
pub async fn start_server(config: &AppConfig, state: AppState, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
    let app = build_router(state).layer(cors_layer(&config.frontend_url)?);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!(%addr, "API server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
            info!("Received shutdown signal");
        })
        .await
        .context("API server failed to start or run")?;

    info!("API server stopped");
    Ok(())
}
