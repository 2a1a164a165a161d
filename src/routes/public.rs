use actix_web::{web, HttpResponse, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{authenticate_credentials, hash_password, new_id, AuthUser};
use crate::catalog;
use crate::db::log_activity;
use crate::error::ScheduleError;
use crate::models::ROLE_CLIENT;
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/api/services").route(web::get().to(list_services)))
        .service(
            web::resource("/api/services/{id}/stylists")
                .route(web::get().to(list_eligible_stylists)),
        )
        .service(web::resource("/api/auth/register").route(web::post().to(register)))
        .service(web::resource("/api/auth/login").route(web::post().to(login)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, ScheduleError> {
    let services = catalog::list_services(&state.db).await?;
    Ok(HttpResponse::Ok().json(services))
}

/// Stylists qualified for the service and currently offered for booking.
/// An unknown service is 404; a service nobody performs is an empty list.
async fn list_eligible_stylists(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ScheduleError> {
    let service_id = path.into_inner();
    let service = catalog::get_service(&state.db, &service_id).await?;
    let stylists = catalog::stylists_for_service(&state.db, &service.id).await?;
    Ok(HttpResponse::Ok().json(stylists))
}

#[derive(Deserialize)]
struct RegisterInput {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
}

#[derive(Serialize)]
struct IdentityView {
    id: String,
    name: String,
    email: String,
    role: String,
}

impl From<AuthUser> for IdentityView {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Self-service sign-up always creates a client-role account. Stylists and
/// admins are provisioned by an administrator.
async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterInput>,
) -> Result<HttpResponse, ScheduleError> {
    let payload = payload.into_inner();
    let mut errors = Vec::new();
    if payload.name.trim().is_empty() {
        errors.push("Name is required.".to_string());
    }
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        errors.push("A valid email is required.".to_string());
    }
    if payload.password.len() < 6 {
        errors.push("Password must be at least 6 characters.".to_string());
    }
    if !errors.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "invalid_input",
            "messages": errors,
        })));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|_| ScheduleError::Persistence(sqlx::Error::Protocol("password hash failed".into())))?;
    let id = new_id();

    let result = sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, phone, active, created_at)
           VALUES (?, ?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(&id)
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(ROLE_CLIENT)
    .bind(password_hash)
    .bind(&payload.phone)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(err))
            if matches!(err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            return Ok(HttpResponse::Conflict().json(json!({
                "error": "email_taken",
                "message": "An account with this email already exists.",
            })));
        }
        Err(err) => return Err(err.into()),
    }

    log_activity(
        &state.db,
        "user_registered",
        &format!("{} registered.", payload.name.trim()),
        Some(&id),
        None,
    )
    .await;

    Ok(HttpResponse::Created().json(IdentityView {
        id,
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        role: ROLE_CLIENT.to_string(),
    }))
}

#[derive(Deserialize)]
struct LoginInput {
    email: String,
    password: String,
}

/// Credential check for the UI. The API itself stays stateless: every
/// authenticated call carries Basic credentials.
async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginInput>,
) -> Result<HttpResponse, ScheduleError> {
    let payload = payload.into_inner();
    match authenticate_credentials(&state, &payload.email, &payload.password).await {
        Some(user) => Ok(HttpResponse::Ok().json(IdentityView::from(user))),
        None => Err(ScheduleError::Unauthenticated),
    }
}
