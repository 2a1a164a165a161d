use actix_web::{web, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{admin_validator, hash_password, new_id, AuthUser};
use crate::catalog;
use crate::db::log_activity;
use crate::error::ScheduleError;
use crate::lifecycle;
use crate::models::{
    ActivityRow, AppointmentStatus, ROLE_STYLIST, STYLIST_AVAILABLE, STYLIST_STATUSES,
};
use crate::repo;
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .wrap(HttpAuthentication::basic(admin_validator))
            .service(web::resource("/appointments").route(web::get().to(list_appointments)))
            .service(
                web::resource("/appointments/{id}")
                    .route(web::delete().to(delete_appointment)),
            )
            .service(
                web::resource("/appointments/{id}/status")
                    .route(web::post().to(override_status)),
            )
            .service(web::resource("/stats").route(web::get().to(stats)))
            .service(web::resource("/users").route(web::get().to(list_users)))
            .service(web::resource("/stylists").route(web::post().to(create_stylist)))
            .service(
                web::resource("/stylists/{id}/status")
                    .route(web::post().to(set_stylist_status)),
            ),
    );
}

#[derive(Deserialize)]
struct AppointmentFilter {
    status: Option<String>,
    date: Option<NaiveDate>,
}

async fn list_appointments(
    state: web::Data<AppState>,
    query: web::Query<AppointmentFilter>,
) -> Result<HttpResponse, ScheduleError> {
    let filter = query.into_inner();
    if let Some(status) = filter.status.as_deref() {
        if status.parse::<AppointmentStatus>().is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "invalid_input",
                "message": format!("'{status}' is not an appointment status"),
            })));
        }
    }

    let rows = repo::list_all(&state.db, filter.status.as_deref(), filter.date).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize)]
struct StatusChange {
    status: AppointmentStatus,
}

/// Admin override: any target from any non-terminal state, through the
/// same state machine entry point everyone else uses.
async fn override_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<StatusChange>,
) -> Result<HttpResponse, ScheduleError> {
    let actor = auth.into_inner();
    let appointment_id = path.into_inner();
    let detail =
        lifecycle::transition(&state.db, &actor, &appointment_id, payload.status).await?;
    Ok(HttpResponse::Ok().json(detail))
}

async fn delete_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ScheduleError> {
    let actor = auth.into_inner();
    let appointment_id = path.into_inner();
    lifecycle::delete(&state.db, &actor, &appointment_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn stats(state: web::Data<AppState>) -> Result<HttpResponse, ScheduleError> {
    let today = Local::now().date_naive();
    let total = count(&state, "SELECT COUNT(*) FROM appointments", None).await;
    let today_count = count(
        &state,
        "SELECT COUNT(*) FROM appointments WHERE date = ?",
        Some(&today.to_string()),
    )
    .await;
    let pending = count(
        &state,
        "SELECT COUNT(*) FROM appointments WHERE status = 'pending'",
        None,
    )
    .await;
    let users = count(&state, "SELECT COUNT(*) FROM users WHERE active = 1", None).await;

    let activities = sqlx::query_as::<_, ActivityRow>(
        "SELECT message, created_at FROM activities ORDER BY created_at DESC LIMIT 10",
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    Ok(HttpResponse::Ok().json(json!({
        "appointments_total": total,
        "appointments_today": today_count,
        "appointments_pending": pending,
        "users_total": users,
        "recent_activity": activities,
    })))
}

#[derive(Serialize, sqlx::FromRow)]
struct UserView {
    id: String,
    name: String,
    email: String,
    role: String,
    phone: Option<String>,
    active: i64,
    created_at: String,
}

async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ScheduleError> {
    let users = sqlx::query_as::<_, UserView>(
        r#"SELECT id, name, email, role, phone, active, created_at
           FROM users
           ORDER BY created_at DESC"#,
    )
    .fetch_all(&state.db)
    .await
    .map_err(ScheduleError::Persistence)?;

    Ok(HttpResponse::Ok().json(users))
}

#[derive(Deserialize)]
struct CreateStylistInput {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
    specialty: Option<String>,
    status: Option<String>,
    service_ids: Vec<String>,
}

/// Provisions a stylist account, their profile, and their qualification
/// set in one transaction.
async fn create_stylist(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<CreateStylistInput>,
) -> Result<HttpResponse, ScheduleError> {
    let actor = auth.into_inner();
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
    let status = payload
        .status
        .clone()
        .unwrap_or_else(|| STYLIST_AVAILABLE.to_string());
    if !STYLIST_STATUSES.contains(&status.as_str()) {
        errors.push(format!("'{status}' is not a stylist status."));
    }
    if !errors.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "invalid_input",
            "messages": errors,
        })));
    }

    for service_id in &payload.service_ids {
        catalog::get_service(&state.db, service_id).await?;
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|_| ScheduleError::Persistence(sqlx::Error::Protocol("password hash failed".into())))?;
    let user_id = new_id();
    let stylist_id = new_id();

    let mut tx = state.db.begin().await.map_err(ScheduleError::Persistence)?;

    let inserted = sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, phone, active, created_at)
           VALUES (?, ?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(&user_id)
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(ROLE_STYLIST)
    .bind(&password_hash)
    .bind(&payload.phone)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await;

    if let Err(sqlx::Error::Database(err)) = &inserted {
        if matches!(err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return Ok(HttpResponse::Conflict().json(json!({
                "error": "email_taken",
                "message": "An account with this email already exists.",
            })));
        }
    }
    inserted.map_err(ScheduleError::Persistence)?;

    sqlx::query(
        r#"INSERT INTO stylists (id, user_id, specialty, status, phone)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(&stylist_id)
    .bind(&user_id)
    .bind(payload.specialty.as_deref().unwrap_or("").trim())
    .bind(&status)
    .bind(&payload.phone)
    .execute(&mut *tx)
    .await
    .map_err(ScheduleError::Persistence)?;

    for service_id in &payload.service_ids {
        sqlx::query("INSERT INTO stylist_services (stylist_id, service_id) VALUES (?, ?)")
            .bind(&stylist_id)
            .bind(service_id)
            .execute(&mut *tx)
            .await
            .map_err(ScheduleError::Persistence)?;
    }

    tx.commit().await.map_err(ScheduleError::Persistence)?;

    log_activity(
        &state.db,
        "stylist_created",
        &format!("{} created stylist profile {}.", actor.name, payload.name.trim()),
        Some(&actor.id),
        None,
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "id": stylist_id,
        "user_id": user_id,
        "name": payload.name.trim(),
        "status": status,
        "service_ids": payload.service_ids,
    })))
}

#[derive(Deserialize)]
struct StylistStatusChange {
    status: String,
}

/// Availability flip for a stylist. Setting `inactive` removes them from
/// every eligible-stylist listing without touching their qualifications.
async fn set_stylist_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<StylistStatusChange>,
) -> Result<HttpResponse, ScheduleError> {
    let actor = auth.into_inner();
    let stylist_id = path.into_inner();
    let status = payload.into_inner().status;

    if !STYLIST_STATUSES.contains(&status.as_str()) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "invalid_input",
            "message": format!("'{status}' is not a stylist status"),
        })));
    }

    let result = sqlx::query("UPDATE stylists SET status = ? WHERE id = ?")
        .bind(&status)
        .bind(&stylist_id)
        .execute(&state.db)
        .await
        .map_err(ScheduleError::Persistence)?;

    if result.rows_affected() == 0 {
        return Err(ScheduleError::NotFound);
    }

    log_activity(
        &state.db,
        "stylist_status",
        &format!("{} set stylist {} to {}.", actor.name, stylist_id, status),
        Some(&actor.id),
        None,
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({ "id": stylist_id, "status": status })))
}

async fn count(state: &web::Data<AppState>, query: &str, param: Option<&str>) -> i64 {
    let mut q = sqlx::query_scalar::<_, i64>(query);
    if let Some(param) = param {
        q = q.bind(param.to_string());
    }
    q.fetch_one(&state.db).await.unwrap_or(0)
}
