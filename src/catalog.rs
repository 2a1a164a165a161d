use sqlx::SqlitePool;

use crate::error::ScheduleError;
use crate::models::{ServiceRow, StylistRow};

/// Active services, as shown in the public catalog.
pub async fn list_services(pool: &SqlitePool) -> Result<Vec<ServiceRow>, ScheduleError> {
    let rows = sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, name, description, price, duration_minutes, active
           FROM services
           WHERE active = 1
           ORDER BY name"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_service(
    pool: &SqlitePool,
    service_id: &str,
) -> Result<ServiceRow, ScheduleError> {
    sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, name, description, price, duration_minutes, active
           FROM services
           WHERE id = ? AND active = 1
           LIMIT 1"#,
    )
    .bind(service_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ScheduleError::UnknownService)
}

/// Stylists qualified to perform the service, excluding inactive stylists
/// and deactivated user accounts. An empty result is a valid answer; the
/// unknown-service case is `get_service`'s to report.
pub async fn stylists_for_service(
    pool: &SqlitePool,
    service_id: &str,
) -> Result<Vec<StylistRow>, ScheduleError> {
    let rows = sqlx::query_as::<_, StylistRow>(
        r#"SELECT s.id, s.user_id, u.name AS name, s.specialty, s.status, s.phone
           FROM stylists s
           JOIN stylist_services q ON q.stylist_id = s.id
           JOIN users u ON u.id = s.user_id
           WHERE q.service_id = ? AND s.status != 'inactive' AND u.active = 1
           ORDER BY u.name"#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
