use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::{hash_password, new_id};
use crate::models::{ROLE_ADMIN, ROLE_STYLIST, STYLIST_AVAILABLE};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_admin(pool).await?;
    seed_services(pool).await?;
    seed_demo_stylist(pool).await?;
    Ok(())
}

/// Append-only audit trail. Best effort: a failed insert never fails the
/// operation being recorded.
pub async fn log_activity(
    pool: &SqlitePool,
    kind: &str,
    message: &str,
    user_id: Option<&str>,
    appointment_id: Option<&str>,
) {
    let _ = sqlx::query(
        r#"INSERT INTO activities (id, kind, message, created_at, user_id, appointment_id)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(kind)
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .bind(appointment_id)
    .execute(pool)
    .await;
}

async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing =
        sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE role = ? LIMIT 1")
            .bind(ROLE_ADMIN)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Ok(());
    }

    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@beautyroom.local".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Salon Admin".to_string());

    if password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash = hash_password(&password)
        .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;

    sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, phone, active, created_at)
           VALUES (?, ?, ?, ?, ?, NULL, 1, ?)"#,
    )
    .bind(new_id())
    .bind(name)
    .bind(email)
    .bind(ROLE_ADMIN)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_services(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let services: [(&str, &str, f64, i64); 4] = [
        ("Haircut", "Wash, precision cut, and blow-dry.", 250.0, 45),
        ("Coloring", "Full color or root touch-up with toner.", 800.0, 90),
        ("Styling", "Event styling, waves, or updo.", 350.0, 60),
        ("Manicure", "Classic manicure with polish.", 200.0, 30),
    ];

    for (name, description, price, duration) in services {
        let exists =
            sqlx::query_as::<_, (String,)>("SELECT id FROM services WHERE name = ? LIMIT 1")
                .bind(name)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }
        sqlx::query(
            r#"INSERT INTO services (id, name, description, price, duration_minutes, active)
               VALUES (?, ?, ?, ?, ?, 1)"#,
        )
        .bind(new_id())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(duration)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Optional demo stylist qualified for the seeded services, gated behind
/// SEED_DEMO so production databases stay clean.
async fn seed_demo_stylist(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    if env::var("SEED_DEMO").unwrap_or_else(|_| "false".to_string()) != "true" {
        return Ok(());
    }

    let exists = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE role = ? LIMIT 1")
        .bind(ROLE_STYLIST)
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        return Ok(());
    }

    let email = env::var("STYLIST_EMAIL").unwrap_or_else(|_| "stylist@beautyroom.local".to_string());
    let password = env::var("STYLIST_PASSWORD").unwrap_or_else(|_| "change-me".to_string());
    let name = env::var("STYLIST_NAME").unwrap_or_else(|_| "Demo Stylist".to_string());
    if password == "change-me" {
        log::warn!("STYLIST_PASSWORD not set. Using default password 'change-me'. Set STYLIST_PASSWORD in production.");
    }

    let password_hash = hash_password(&password)
        .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    let user_id = new_id();

    sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, phone, active, created_at)
           VALUES (?, ?, ?, ?, ?, NULL, 1, ?)"#,
    )
    .bind(&user_id)
    .bind(name)
    .bind(email)
    .bind(ROLE_STYLIST)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    let stylist_id = new_id();
    sqlx::query(
        r#"INSERT INTO stylists (id, user_id, specialty, status, phone)
           VALUES (?, ?, 'Cut & color', ?, NULL)"#,
    )
    .bind(&stylist_id)
    .bind(&user_id)
    .bind(STYLIST_AVAILABLE)
    .execute(pool)
    .await?;

    let service_ids = sqlx::query_scalar::<_, String>(
        "SELECT id FROM services WHERE name IN ('Haircut', 'Coloring', 'Styling')",
    )
    .fetch_all(pool)
    .await?;

    for service_id in service_ids {
        sqlx::query("INSERT INTO stylist_services (stylist_id, service_id) VALUES (?, ?)")
            .bind(&stylist_id)
            .bind(service_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}
