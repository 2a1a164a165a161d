use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STYLIST: &str = "stylist";
pub const ROLE_CLIENT: &str = "client";

pub const STYLIST_AVAILABLE: &str = "available";
pub const STYLIST_BUSY: &str = "busy";
pub const STYLIST_ON_BREAK: &str = "on-break";
pub const STYLIST_INACTIVE: &str = "inactive";

pub const STYLIST_STATUSES: [&str; 4] = [
    STYLIST_AVAILABLE,
    STYLIST_BUSY,
    STYLIST_ON_BREAK,
    STYLIST_INACTIVE,
];

/// Lifecycle status of an appointment. `Cancelled` and `Completed` are
/// terminal; every change between the others goes through
/// `lifecycle::transition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
    }
}

impl FromStr for AppointmentStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub active: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i64,
    pub active: i64,
}

/// A stylist joined with the display name of the linked user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StylistRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub specialty: String,
    pub status: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClientRow {
    pub id: String,
    pub user_id: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: String,
    pub client_id: String,
    pub stylist_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub slot: String,
    pub status: String,
    pub note: Option<String>,
    pub price_at_booking: f64,
    pub duration_at_booking: i64,
    pub created_at: String,
}

/// An appointment joined with its display fields. The joined names are
/// read-time conveniences; the stored entity only holds the references
/// and the price/duration snapshot taken at booking time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AppointmentDetail {
    pub id: String,
    pub client_id: String,
    pub stylist_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub slot: String,
    pub status: String,
    pub note: Option<String>,
    pub price_at_booking: f64,
    pub duration_at_booking: i64,
    pub created_at: String,
    pub service_name: String,
    pub stylist_name: String,
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityRow {
    pub message: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>(), Ok(status));
        }
        assert!("accepted".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!AppointmentStatus::Pending.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
    }
}
