use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Every failure a scheduling operation can surface. All variants except
/// `Persistence` are deterministic for a given request; retrying them does
/// not change the outcome.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("unknown service")]
    UnknownService,
    #[error("stylist does not offer this service")]
    StylistNotQualified,
    #[error("the salon is closed on that day")]
    SalonClosed,
    #[error("'{0}' is not a bookable time slot")]
    InvalidSlot(String),
    #[error("that time slot has already passed")]
    SlotInPast,
    #[error("that time slot is already taken")]
    SlotTaken,
    #[error("this status change is not allowed")]
    InvalidTransition,
    #[error("not allowed")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("storage error")]
    Persistence(#[from] sqlx::Error),
}

impl ScheduleError {
    /// Stable machine-readable code carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::Unauthenticated => "unauthenticated",
            ScheduleError::UnknownService => "unknown_service",
            ScheduleError::StylistNotQualified => "stylist_not_qualified",
            ScheduleError::SalonClosed => "salon_closed",
            ScheduleError::InvalidSlot(_) => "invalid_slot",
            ScheduleError::SlotInPast => "slot_in_past",
            ScheduleError::SlotTaken => "slot_taken",
            ScheduleError::InvalidTransition => "invalid_transition",
            ScheduleError::Forbidden => "forbidden",
            ScheduleError::NotFound => "not_found",
            ScheduleError::Persistence(_) => "persistence",
        }
    }
}

impl ResponseError for ScheduleError {
    fn status_code(&self) -> StatusCode {
        match self {
            ScheduleError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ScheduleError::Forbidden => StatusCode::FORBIDDEN,
            ScheduleError::UnknownService | ScheduleError::NotFound => StatusCode::NOT_FOUND,
            ScheduleError::SlotTaken | ScheduleError::InvalidTransition => StatusCode::CONFLICT,
            ScheduleError::StylistNotQualified
            | ScheduleError::SalonClosed
            | ScheduleError::InvalidSlot(_)
            | ScheduleError::SlotInPast => StatusCode::UNPROCESSABLE_ENTITY,
            ScheduleError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ScheduleError::Persistence(err) = self {
            log::error!("Storage error: {err}");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_client_status_codes() {
        assert_eq!(ScheduleError::SlotTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ScheduleError::SalonClosed.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ScheduleError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ScheduleError::UnknownService.status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ScheduleError::SlotInPast.code(), "slot_in_past");
        assert_eq!(
            ScheduleError::InvalidSlot("25:00".into()).code(),
            "invalid_slot"
        );
    }
}
