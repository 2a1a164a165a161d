#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use beautyroom::auth::{hash_password, new_id, AuthUser};
use beautyroom::models::{ROLE_ADMIN, ROLE_CLIENT, ROLE_STYLIST, STYLIST_AVAILABLE};

pub const PASSWORD: &str = "password1";

pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    beautyroom::db::run_migrations(&pool)
        .await
        .expect("migrations");
    pool
}

pub async fn create_user(pool: &SqlitePool, name: &str, email: &str, role: &str) -> AuthUser {
    let id = new_id();
    let password_hash = hash_password(PASSWORD).expect("hash");
    sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, phone, active, created_at)
           VALUES (?, ?, ?, ?, ?, NULL, 1, ?)"#,
    )
    .bind(&id)
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .expect("insert user");

    AuthUser {
        id,
        name: name.to_string(),
        email: email.to_string(),
        role: role.to_string(),
    }
}

pub async fn create_client_user(pool: &SqlitePool, name: &str, email: &str) -> AuthUser {
    create_user(pool, name, email, ROLE_CLIENT).await
}

pub async fn create_admin(pool: &SqlitePool) -> AuthUser {
    create_user(pool, "Salon Admin", "admin@test.local", ROLE_ADMIN).await
}

pub async fn create_service(pool: &SqlitePool, name: &str, price: f64, duration: i64) -> String {
    let id = new_id();
    sqlx::query(
        r#"INSERT INTO services (id, name, description, price, duration_minutes, active)
           VALUES (?, ?, NULL, ?, ?, 1)"#,
    )
    .bind(&id)
    .bind(name)
    .bind(price)
    .bind(duration)
    .execute(pool)
    .await
    .expect("insert service");
    id
}

/// Creates a stylist user plus profile and returns (stylist_id, identity).
pub async fn create_stylist(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    status: &str,
) -> (String, AuthUser) {
    let user = create_user(pool, name, email, ROLE_STYLIST).await;
    let stylist_id = new_id();
    sqlx::query(
        r#"INSERT INTO stylists (id, user_id, specialty, status, phone)
           VALUES (?, ?, 'Cut & color', ?, NULL)"#,
    )
    .bind(&stylist_id)
    .bind(&user.id)
    .bind(status)
    .execute(pool)
    .await
    .expect("insert stylist");
    (stylist_id, user)
}

pub async fn qualify(pool: &SqlitePool, stylist_id: &str, service_id: &str) {
    sqlx::query("INSERT INTO stylist_services (stylist_id, service_id) VALUES (?, ?)")
        .bind(stylist_id)
        .bind(service_id)
        .execute(pool)
        .await
        .expect("insert qualification");
}

/// Convenience: an available stylist qualified for the given service.
pub async fn create_qualified_stylist(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    service_id: &str,
) -> (String, AuthUser) {
    let (stylist_id, user) = create_stylist(pool, name, email, STYLIST_AVAILABLE).await;
    qualify(pool, &stylist_id, service_id).await;
    (stylist_id, user)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Monday 2026-03-02 at noon; the fixed clock the booking tests pin.
pub fn monday_noon() -> NaiveDateTime {
    date(2026, 3, 2).and_hms_opt(12, 0, 0).expect("valid time")
}

/// The Tuesday following `monday_noon`.
pub fn tomorrow() -> NaiveDate {
    date(2026, 3, 3)
}
