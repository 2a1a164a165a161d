mod common;

use beautyroom::booking::{self, BookingRequest};
use beautyroom::error::ScheduleError;
use beautyroom::lifecycle;
use beautyroom::models::AppointmentStatus::*;
use beautyroom::repo;
use common::*;

async fn book(
    pool: &sqlx::SqlitePool,
    client: &beautyroom::auth::AuthUser,
    service_id: &str,
    stylist_id: &str,
    slot: &str,
) -> String {
    booking::book_appointment(
        pool,
        Some(client),
        &BookingRequest {
            service_id: service_id.to_string(),
            stylist_id: stylist_id.to_string(),
            date: tomorrow(),
            slot: slot.to_string(),
            note: None,
        },
        monday_noon(),
    )
    .await
    .unwrap()
    .id
}

#[actix_web::test]
async fn the_full_haircut_story() {
    let pool = setup_pool().await;
    let haircut = create_service(&pool, "Haircut", 250.0, 45).await;
    let (ana_id, ana) = create_qualified_stylist(&pool, "Ana", "ana@test.local", &haircut).await;
    let carla = create_client_user(&pool, "Carla", "carla@test.local").await;
    let diego = create_client_user(&pool, "Diego", "diego@test.local").await;

    // Carla books Ana for tomorrow at 10:00.
    let id = book(&pool, &carla, &haircut, &ana_id, "10:00").await;
    let detail = repo::get_detail(&pool, &id).await.unwrap();
    assert_eq!(detail.status, "pending");
    assert_eq!(detail.stylist_name, "Ana");
    assert_eq!(detail.client_name, "Carla");
    assert_eq!(detail.service_name, "Haircut");

    // Diego tries the same slot and loses.
    let err = booking::book_appointment(
        &pool,
        Some(&diego),
        &BookingRequest {
            service_id: haircut.clone(),
            stylist_id: ana_id.clone(),
            date: tomorrow(),
            slot: "10:00".to_string(),
            note: None,
        },
        monday_noon(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ScheduleError::SlotTaken));

    // Ana confirms, then completes.
    let confirmed = lifecycle::transition(&pool, &ana, &id, Confirmed).await.unwrap();
    assert_eq!(confirmed.status, "confirmed");
    let completed = lifecycle::transition(&pool, &ana, &id, Completed).await.unwrap();
    assert_eq!(completed.status, "completed");

    // Carla cannot cancel a completed appointment.
    let err = lifecycle::transition(&pool, &carla, &id, Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTransition));
}

#[actix_web::test]
async fn client_cancels_own_pending_but_nothing_else() {
    let pool = setup_pool().await;
    let haircut = create_service(&pool, "Haircut", 250.0, 45).await;
    let (ana_id, ana) = create_qualified_stylist(&pool, "Ana", "ana@test.local", &haircut).await;
    let carla = create_client_user(&pool, "Carla", "carla@test.local").await;
    let diego = create_client_user(&pool, "Diego", "diego@test.local").await;

    let id = book(&pool, &carla, &haircut, &ana_id, "10:00").await;

    // A stranger cannot touch it.
    let err = lifecycle::transition(&pool, &diego, &id, Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden));

    // The owner cannot confirm their own appointment.
    let err = lifecycle::transition(&pool, &carla, &id, Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden));

    // Once confirmed, the client can no longer cancel.
    lifecycle::transition(&pool, &ana, &id, Confirmed).await.unwrap();
    let err = lifecycle::transition(&pool, &carla, &id, Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden));

    // A fresh pending appointment the owner can cancel, exactly once.
    let id2 = book(&pool, &carla, &haircut, &ana_id, "11:00").await;
    let cancelled = lifecycle::transition(&pool, &carla, &id2, Cancelled).await.unwrap();
    assert_eq!(cancelled.status, "cancelled");
    let err = lifecycle::transition(&pool, &carla, &id2, Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTransition));
}

#[actix_web::test]
async fn stylist_only_acts_on_their_own_assignments() {
    let pool = setup_pool().await;
    let haircut = create_service(&pool, "Haircut", 250.0, 45).await;
    let (ana_id, _ana) = create_qualified_stylist(&pool, "Ana", "ana@test.local", &haircut).await;
    let (_mia_id, mia) = create_qualified_stylist(&pool, "Mia", "mia@test.local", &haircut).await;
    let carla = create_client_user(&pool, "Carla", "carla@test.local").await;

    let id = book(&pool, &carla, &haircut, &ana_id, "10:00").await;

    let err = lifecycle::transition(&pool, &mia, &id, Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden));
}

#[actix_web::test]
async fn skipping_confirmation_needs_an_admin() {
    let pool = setup_pool().await;
    let haircut = create_service(&pool, "Haircut", 250.0, 45).await;
    let (ana_id, ana) = create_qualified_stylist(&pool, "Ana", "ana@test.local", &haircut).await;
    let carla = create_client_user(&pool, "Carla", "carla@test.local").await;
    let admin = create_admin(&pool).await;

    let id = book(&pool, &carla, &haircut, &ana_id, "10:00").await;

    let err = lifecycle::transition(&pool, &ana, &id, Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTransition));

    let completed = lifecycle::transition(&pool, &admin, &id, Completed).await.unwrap();
    assert_eq!(completed.status, "completed");

    // Terminal even for the admin.
    let err = lifecycle::transition(&pool, &admin, &id, Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTransition));
}

#[actix_web::test]
async fn cancelled_appointments_release_their_slot() {
    let pool = setup_pool().await;
    let haircut = create_service(&pool, "Haircut", 250.0, 45).await;
    let (ana_id, _) = create_qualified_stylist(&pool, "Ana", "ana@test.local", &haircut).await;
    let carla = create_client_user(&pool, "Carla", "carla@test.local").await;
    let diego = create_client_user(&pool, "Diego", "diego@test.local").await;

    let id = book(&pool, &carla, &haircut, &ana_id, "10:00").await;
    lifecycle::transition(&pool, &carla, &id, beautyroom::models::AppointmentStatus::Cancelled)
        .await
        .unwrap();

    // The slot is free again for someone else.
    let id2 = book(&pool, &diego, &haircut, &ana_id, "10:00").await;
    assert_ne!(id, id2);
}

#[actix_web::test]
async fn deletion_is_admin_only_and_frees_the_slot() {
    let pool = setup_pool().await;
    let haircut = create_service(&pool, "Haircut", 250.0, 45).await;
    let (ana_id, ana) = create_qualified_stylist(&pool, "Ana", "ana@test.local", &haircut).await;
    let carla = create_client_user(&pool, "Carla", "carla@test.local").await;
    let admin = create_admin(&pool).await;

    let id = book(&pool, &carla, &haircut, &ana_id, "10:00").await;
    // Deletion works from any state, including terminal ones.
    lifecycle::transition(&pool, &ana, &id, Confirmed).await.unwrap();
    lifecycle::transition(&pool, &ana, &id, Completed).await.unwrap();

    let err = lifecycle::delete(&pool, &carla, &id).await.unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden));
    let err = lifecycle::delete(&pool, &ana, &id).await.unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden));

    lifecycle::delete(&pool, &admin, &id).await.unwrap();
    assert!(matches!(
        repo::get_by_id(&pool, &id).await,
        Err(ScheduleError::NotFound)
    ));
    assert!(matches!(
        lifecycle::delete(&pool, &admin, &id).await,
        Err(ScheduleError::NotFound)
    ));

    // The slot opens up again.
    book(&pool, &carla, &haircut, &ana_id, "10:00").await;
}

#[actix_web::test]
async fn guarded_update_misses_when_the_state_moved() {
    let pool = setup_pool().await;
    let haircut = create_service(&pool, "Haircut", 250.0, 45).await;
    let (ana_id, ana) = create_qualified_stylist(&pool, "Ana", "ana@test.local", &haircut).await;
    let carla = create_client_user(&pool, "Carla", "carla@test.local").await;

    let id = book(&pool, &carla, &haircut, &ana_id, "10:00").await;
    lifecycle::transition(&pool, &ana, &id, Confirmed).await.unwrap();

    // A writer still assuming 'pending' must not win.
    let applied = repo::update_status_guarded(&pool, &id, "pending", "cancelled")
        .await
        .unwrap();
    assert!(!applied);
    assert_eq!(repo::get_by_id(&pool, &id).await.unwrap().status, "confirmed");
}

#[actix_web::test]
async fn listings_are_scoped_to_the_actor() {
    let pool = setup_pool().await;
    let haircut = create_service(&pool, "Haircut", 250.0, 45).await;
    let (ana_id, ana) = create_qualified_stylist(&pool, "Ana", "ana@test.local", &haircut).await;
    let (mia_id, mia) = create_qualified_stylist(&pool, "Mia", "mia@test.local", &haircut).await;
    let carla = create_client_user(&pool, "Carla", "carla@test.local").await;
    let diego = create_client_user(&pool, "Diego", "diego@test.local").await;

    book(&pool, &carla, &haircut, &ana_id, "10:00").await;
    book(&pool, &carla, &haircut, &mia_id, "11:00").await;
    book(&pool, &diego, &haircut, &ana_id, "12:00").await;

    let carlas = booking::list_my_appointments(&pool, &carla).await.unwrap();
    assert_eq!(carlas.len(), 2);
    assert!(carlas.iter().all(|a| a.client_name == "Carla"));

    let anas = booking::list_my_appointments(&pool, &ana).await.unwrap();
    assert_eq!(anas.len(), 2);
    assert!(anas.iter().all(|a| a.stylist_name == "Ana"));

    let mias = booking::list_my_appointments(&pool, &mia).await.unwrap();
    assert_eq!(mias.len(), 1);

    // A client who never booked sees an empty list, not an error.
    let eve = create_client_user(&pool, "Eve", "eve@test.local").await;
    assert!(booking::list_my_appointments(&pool, &eve).await.unwrap().is_empty());

    let by_date = repo::list_by_date(&pool, tomorrow()).await.unwrap();
    assert_eq!(by_date.len(), 3);
    // Date listings come back in slot order.
    let slots: Vec<&str> = by_date.iter().map(|a| a.slot.as_str()).collect();
    assert_eq!(slots, vec!["10:00", "11:00", "12:00"]);
}
