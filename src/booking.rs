use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::{new_id, AuthUser};
use crate::availability;
use crate::catalog;
use crate::db::log_activity;
use crate::error::ScheduleError;
use crate::models::{AppointmentDetail, ClientRow};
use crate::repo::{self, NewAppointment};

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub service_id: String,
    pub stylist_id: String,
    pub date: NaiveDate,
    pub slot: String,
    pub note: Option<String>,
}

/// Admission pipeline for a new appointment. Checks run in a fixed order
/// and short-circuit on the first failure; the final insert leans on the
/// slot uniqueness index, so a concurrent booking for the same slot loses
/// with `SlotTaken` rather than creating a duplicate.
pub async fn book_appointment(
    pool: &SqlitePool,
    actor: Option<&AuthUser>,
    request: &BookingRequest,
    now: NaiveDateTime,
) -> Result<AppointmentDetail, ScheduleError> {
    let actor = actor.ok_or(ScheduleError::Unauthenticated)?;
    let client = resolve_client(pool, actor).await?;

    let service = catalog::get_service(pool, &request.service_id).await?;

    let eligible = catalog::stylists_for_service(pool, &service.id).await?;
    if !eligible.iter().any(|s| s.id == request.stylist_id) {
        return Err(ScheduleError::StylistNotQualified);
    }

    if availability::is_salon_closed(request.date) {
        return Err(ScheduleError::SalonClosed);
    }
    if !availability::is_valid_slot(&request.slot) {
        return Err(ScheduleError::InvalidSlot(request.slot.clone()));
    }
    if availability::is_slot_in_past(request.date, &request.slot, now) {
        return Err(ScheduleError::SlotInPast);
    }
    if !availability::is_slot_free(pool, &request.stylist_id, request.date, &request.slot).await? {
        return Err(ScheduleError::SlotTaken);
    }

    let note = request
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let appointment_id = repo::create(
        pool,
        &NewAppointment {
            client_id: client.id,
            stylist_id: request.stylist_id.clone(),
            service_id: service.id.clone(),
            date: request.date,
            slot: request.slot.clone(),
            note,
            price_at_booking: service.price,
            duration_at_booking: service.duration_minutes,
        },
    )
    .await?;

    log_activity(
        pool,
        "appointment_created",
        &format!(
            "{} booked {} for {} at {}.",
            actor.name, service.name, request.date, request.slot
        ),
        Some(&actor.id),
        Some(&appointment_id),
    )
    .await;

    repo::get_detail(pool, &appointment_id).await
}

/// Resolves the actor to a client record, provisioning one on first
/// booking. The phone carried on the user account seeds the new record.
pub async fn resolve_client(
    pool: &SqlitePool,
    actor: &AuthUser,
) -> Result<ClientRow, ScheduleError> {
    if let Some(client) = find_client(pool, &actor.id).await? {
        return Ok(client);
    }

    // A concurrent first booking may provision the record between the read
    // and this insert; the unique user_id constraint keeps one row and the
    // re-read is authoritative either way.
    let result = sqlx::query(
        r#"INSERT INTO clients (id, user_id, phone, address)
           SELECT ?, id, phone, NULL FROM users WHERE id = ?"#,
    )
    .bind(new_id())
    .bind(&actor.id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(err))
            if matches!(err.kind(), sqlx::error::ErrorKind::UniqueViolation) => {}
        Err(err) => return Err(err.into()),
    }

    find_client(pool, &actor.id)
        .await?
        .ok_or(ScheduleError::Unauthenticated)
}

pub async fn find_client(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<ClientRow>, ScheduleError> {
    let row = sqlx::query_as::<_, ClientRow>(
        "SELECT id, user_id, phone, address FROM clients WHERE user_id = ? LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Appointments the actor is allowed to see: their own, scoped server-side
/// by role. Nobody receives another actor's list.
pub async fn list_my_appointments(
    pool: &SqlitePool,
    actor: &AuthUser,
) -> Result<Vec<AppointmentDetail>, ScheduleError> {
    use crate::models::{ROLE_CLIENT, ROLE_STYLIST};

    if actor.role == ROLE_CLIENT {
        match find_client(pool, &actor.id).await? {
            Some(client) => repo::list_by_client(pool, &client.id).await,
            None => Ok(Vec::new()),
        }
    } else if actor.role == ROLE_STYLIST {
        match find_stylist_id(pool, &actor.id).await? {
            Some(stylist_id) => repo::list_by_stylist(pool, &stylist_id).await,
            None => Ok(Vec::new()),
        }
    } else {
        repo::list_all(pool, None, None).await
    }
}

async fn find_stylist_id(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<String>, ScheduleError> {
    let id = sqlx::query_scalar::<_, String>("SELECT id FROM stylists WHERE user_id = ? LIMIT 1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// The salon runs on a single local clock. Kept out of the validation path
/// so tests can pin `now`.
pub fn salon_now() -> NaiveDateTime {
    Local::now().naive_local()
}
