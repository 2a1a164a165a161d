use actix_web::{
    dev::ServiceRequest, error::ErrorUnauthorized, web, Error, HttpMessage,
};
use actix_web_httpauth::extractors::basic::BasicAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use uuid::Uuid;

use crate::models::{UserRow, ROLE_ADMIN};
use crate::state::AppState;

/// The normalized identity every core operation receives. Resolved once
/// per request from Basic credentials; the core never reads ambient
/// session state.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<UserRow> for AuthUser {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn authenticate_credentials(
    state: &AppState,
    email: &str,
    password: &str,
) -> Option<AuthUser> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, role, password_hash, phone, active, created_at
           FROM users
           WHERE email = ? AND active = 1
           LIMIT 1"#,
    )
    .bind(email)
    .fetch_optional(&state.db)
    .await
    .ok()??;

    if !verify_password(password, &user.password_hash) {
        return None;
    }

    Some(user.into())
}

async fn authenticate(req: &ServiceRequest, credentials: &BasicAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ErrorUnauthorized("Unauthorized"))?;
    let email = credentials.user_id();
    let password = credentials.password().unwrap_or_default();
    authenticate_credentials(state, email, password)
        .await
        .ok_or_else(|| ErrorUnauthorized("Unauthorized"))
}

pub async fn basic_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            if user.role != ROLE_ADMIN {
                return Err((ErrorUnauthorized("Admin access required"), req));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
