use actix_web::{web, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{basic_validator, AuthUser};
use crate::booking::{self, BookingRequest};
use crate::error::ScheduleError;
use crate::lifecycle;
use crate::models::{AppointmentStatus, StylistRow, ROLE_STYLIST};
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/me")
            .wrap(HttpAuthentication::basic(basic_validator))
            .route(web::get().to(me)),
    )
    .service(
        web::scope("/api/appointments")
            .wrap(HttpAuthentication::basic(basic_validator))
            .service(
                web::resource("")
                    .route(web::get().to(list_mine))
                    .route(web::post().to(create)),
            )
            .service(web::resource("/{id}/status").route(web::post().to(change_status))),
    );
}

/// The caller's normalized identity, with the linked client or stylist
/// record when one exists.
async fn me(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ScheduleError> {
    let actor = auth.into_inner();
    let client = booking::find_client(&state.db, &actor.id).await?;
    let stylist = if actor.role == ROLE_STYLIST {
        sqlx::query_as::<_, StylistRow>(
            r#"SELECT s.id, s.user_id, u.name AS name, s.specialty, s.status, s.phone
               FROM stylists s
               JOIN users u ON u.id = s.user_id
               WHERE s.user_id = ?
               LIMIT 1"#,
        )
        .bind(&actor.id)
        .fetch_optional(&state.db)
        .await
        .map_err(ScheduleError::Persistence)?
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(json!({
        "id": actor.id,
        "name": actor.name,
        "email": actor.email,
        "role": actor.role,
        "client": client,
        "stylist": stylist,
    })))
}

async fn create(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<BookingRequest>,
) -> Result<HttpResponse, ScheduleError> {
    let actor = auth.into_inner();
    let detail = booking::book_appointment(
        &state.db,
        Some(&actor),
        &payload.into_inner(),
        booking::salon_now(),
    )
    .await?;
    Ok(HttpResponse::Created().json(detail))
}

/// Appointments scoped to the caller. Clients and stylists only ever see
/// their own; an admin sees everything.
async fn list_mine(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ScheduleError> {
    let actor = auth.into_inner();
    let appointments = booking::list_my_appointments(&state.db, &actor).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

#[derive(Deserialize)]
struct StatusChange {
    status: AppointmentStatus,
}

async fn change_status(
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
