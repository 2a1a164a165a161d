use sqlx::SqlitePool;

use crate::auth::AuthUser;
use crate::db::log_activity;
use crate::error::ScheduleError;
use crate::models::{AppointmentDetail, AppointmentStatus, ROLE_ADMIN, ROLE_CLIENT, ROLE_STYLIST};
use crate::repo;

/// pending -> {confirmed, cancelled}; confirmed -> {cancelled, completed}.
/// Terminal states allow nothing.
pub fn is_legal(current: AppointmentStatus, target: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    matches!(
        (current, target),
        (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) | (Confirmed, Completed)
    )
}

/// Pure admission decision for a status change. `owns` is whether the actor
/// is the appointment's own client (client role) or its assigned stylist
/// (stylist role).
///
/// Admins may move a non-terminal appointment to any other status, including
/// jumps the regular graph forbids. For everyone else the graph applies
/// first, then the role rules: a client may only cancel their own pending
/// appointment; a stylist may confirm or cancel a pending appointment
/// assigned to them and complete their own confirmed one.
pub fn authorize(
    role: &str,
    owns: bool,
    current: AppointmentStatus,
    target: AppointmentStatus,
) -> Result<(), ScheduleError> {
    use AppointmentStatus::*;

    if current.is_terminal() || current == target {
        return Err(ScheduleError::InvalidTransition);
    }
    if role == ROLE_ADMIN {
        return Ok(());
    }
    if !is_legal(current, target) {
        return Err(ScheduleError::InvalidTransition);
    }
    if !owns {
        return Err(ScheduleError::Forbidden);
    }

    let allowed = if role == ROLE_CLIENT {
        current == Pending && target == Cancelled
    } else if role == ROLE_STYLIST {
        matches!(
            (current, target),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed)
        )
    } else {
        false
    };

    if allowed {
        Ok(())
    } else {
        Err(ScheduleError::Forbidden)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OwnershipRow {
    status: String,
    client_user_id: String,
    stylist_user_id: String,
}

/// Applies a status change on behalf of `actor`. The write is a
/// compare-and-set against the status read here; a concurrent change makes
/// the set miss and the request fails `InvalidTransition` without touching
/// the row.
pub async fn transition(
    pool: &SqlitePool,
    actor: &AuthUser,
    appointment_id: &str,
    target: AppointmentStatus,
) -> Result<AppointmentDetail, ScheduleError> {
    let row = sqlx::query_as::<_, OwnershipRow>(
        r#"SELECT a.status, c.user_id AS client_user_id, st.user_id AS stylist_user_id
           FROM appointments a
           JOIN clients c ON c.id = a.client_id
           JOIN stylists st ON st.id = a.stylist_id
           WHERE a.id = ?
           LIMIT 1"#,
    )
    .bind(appointment_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ScheduleError::NotFound)?;

    let current: AppointmentStatus = row
        .status
        .parse()
        .map_err(|_| ScheduleError::InvalidTransition)?;

    let owns = if actor.role == ROLE_CLIENT {
        row.client_user_id == actor.id
    } else if actor.role == ROLE_STYLIST {
        row.stylist_user_id == actor.id
    } else {
        true
    };

    authorize(&actor.role, owns, current, target)?;

    let applied =
        repo::update_status_guarded(pool, appointment_id, current.as_str(), target.as_str())
            .await?;
    if !applied {
        // Someone else moved the appointment between read and write.
        return Err(ScheduleError::InvalidTransition);
    }

    log_activity(
        pool,
        "appointment_status",
        &format!(
            "{} moved appointment {} from {} to {}.",
            actor.name, appointment_id, current, target
        ),
        Some(&actor.id),
        Some(appointment_id),
    )
    .await;

    repo::get_detail(pool, appointment_id).await
}

/// Destructive removal, valid in any state. Admin only; this is not a
/// status transition and leaves no tombstone beyond the activity trail.
pub async fn delete(
    pool: &SqlitePool,
    actor: &AuthUser,
    appointment_id: &str,
) -> Result<(), ScheduleError> {
    if actor.role != ROLE_ADMIN {
        return Err(ScheduleError::Forbidden);
    }

    repo::delete(pool, appointment_id).await?;

    log_activity(
        pool,
        "appointment_deleted",
        &format!("{} deleted appointment {}.", actor.name, appointment_id),
        Some(&actor.id),
        Some(appointment_id),
    )
    .await;

    Ok(())
}
