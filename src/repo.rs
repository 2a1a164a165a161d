use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::auth::new_id;
use crate::error::ScheduleError;
use crate::models::{AppointmentDetail, AppointmentRow};

/// Shared join for the denormalized appointment view.
const DETAIL_SELECT: &str = r#"
    SELECT a.id, a.client_id, a.stylist_id, a.service_id, a.date, a.slot,
           a.status, a.note, a.price_at_booking, a.duration_at_booking,
           a.created_at,
           sv.name AS service_name,
           su.name AS stylist_name,
           cu.name AS client_name
    FROM appointments a
    JOIN services sv ON sv.id = a.service_id
    JOIN stylists st ON st.id = a.stylist_id
    JOIN users su ON su.id = st.user_id
    JOIN clients c ON c.id = a.client_id
    JOIN users cu ON cu.id = c.user_id
"#;

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: String,
    pub stylist_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub slot: String,
    pub note: Option<String>,
    pub price_at_booking: f64,
    pub duration_at_booking: i64,
}

/// Inserts a pending appointment. The partial unique index on
/// (stylist_id, date, slot, non-cancelled) is the double-booking guard:
/// when two writers race for the same slot, the loser's insert fails and
/// surfaces as `SlotTaken`.
pub async fn create(pool: &SqlitePool, new: &NewAppointment) -> Result<String, ScheduleError> {
    let id = new_id();
    let result = sqlx::query(
        r#"INSERT INTO appointments
           (id, client_id, stylist_id, service_id, date, slot, status, note,
            price_at_booking, duration_at_booking, created_at)
           VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&new.client_id)
    .bind(&new.stylist_id)
    .bind(&new.service_id)
    .bind(new.date)
    .bind(&new.slot)
    .bind(&new.note)
    .bind(new.price_at_booking)
    .bind(new.duration_at_booking)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(id),
        Err(sqlx::Error::Database(err))
            if matches!(err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            Err(ScheduleError::SlotTaken)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_by_id(
    pool: &SqlitePool,
    appointment_id: &str,
) -> Result<AppointmentRow, ScheduleError> {
    sqlx::query_as::<_, AppointmentRow>(
        r#"SELECT id, client_id, stylist_id, service_id, date, slot, status, note,
                  price_at_booking, duration_at_booking, created_at
           FROM appointments
           WHERE id = ?
           LIMIT 1"#,
    )
    .bind(appointment_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ScheduleError::NotFound)
}

pub async fn get_detail(
    pool: &SqlitePool,
    appointment_id: &str,
) -> Result<AppointmentDetail, ScheduleError> {
    let query = format!("{DETAIL_SELECT} WHERE a.id = ? LIMIT 1");
    sqlx::query_as::<_, AppointmentDetail>(&query)
        .bind(appointment_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ScheduleError::NotFound)
}

/// Compare-and-set status write. Returns false when the row no longer
/// carries `expected`; the caller lost a race and must not retry blindly.
pub async fn update_status_guarded(
    pool: &SqlitePool,
    appointment_id: &str,
    expected: &str,
    target: &str,
) -> Result<bool, ScheduleError> {
    let result = sqlx::query("UPDATE appointments SET status = ? WHERE id = ? AND status = ?")
        .bind(target)
        .bind(appointment_id)
        .bind(expected)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn delete(pool: &SqlitePool, appointment_id: &str) -> Result<(), ScheduleError> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
        .bind(appointment_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ScheduleError::NotFound);
    }
    Ok(())
}

pub async fn list_by_client(
    pool: &SqlitePool,
    client_id: &str,
) -> Result<Vec<AppointmentDetail>, ScheduleError> {
    let query = format!("{DETAIL_SELECT} WHERE a.client_id = ? ORDER BY a.date DESC, a.slot DESC");
    let rows = sqlx::query_as::<_, AppointmentDetail>(&query)
        .bind(client_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_by_stylist(
    pool: &SqlitePool,
    stylist_id: &str,
) -> Result<Vec<AppointmentDetail>, ScheduleError> {
    let query = format!("{DETAIL_SELECT} WHERE a.stylist_id = ? ORDER BY a.date DESC, a.slot DESC");
    let rows = sqlx::query_as::<_, AppointmentDetail>(&query)
        .bind(stylist_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_by_date(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<AppointmentDetail>, ScheduleError> {
    let query = format!("{DETAIL_SELECT} WHERE a.date = ? ORDER BY a.slot");
    let rows = sqlx::query_as::<_, AppointmentDetail>(&query)
        .bind(date)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Admin listing with optional status and date filters.
pub async fn list_all(
    pool: &SqlitePool,
    status: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<Vec<AppointmentDetail>, ScheduleError> {
    let mut query = String::from(DETAIL_SELECT);
    query.push_str(" WHERE 1 = 1");
    if status.is_some() {
        query.push_str(" AND a.status = ?");
    }
    if date.is_some() {
        query.push_str(" AND a.date = ?");
    }
    query.push_str(" ORDER BY a.date DESC, a.slot DESC");

    let mut q = sqlx::query_as::<_, AppointmentDetail>(&query);
    if let Some(status) = status {
        q = q.bind(status.to_string());
    }
    if let Some(date) = date {
        q = q.bind(date);
    }

    let rows = q.fetch_all(pool).await?;
    Ok(rows)
}
