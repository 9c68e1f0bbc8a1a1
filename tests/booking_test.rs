mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use rust_decimal_macros::dec;
use uuid::Uuid;

use bistro_api::{
    errors::ServiceError,
    services::bookings::{CreateBookingInput, CreateMenuInput, UpdateMenuInput},
};

#[tokio::test]
async fn bookings_round_trip() {
    let app = TestApp::new().await;
    let tomorrow = Utc::now().date_naive() + Duration::days(1);

    let created = app
        .state
        .services
        .bookings
        .create_booking(CreateBookingInput {
            first_name: "Ana".to_string(),
            reservation_date: tomorrow,
            reservation_slot: 12,
        })
        .await
        .expect("booking should succeed");

    assert_eq!(created.reservation_date, tomorrow);

    let all = app.state.services.bookings.list_bookings().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].first_name, "Ana");
}

#[tokio::test]
async fn double_booking_a_slot_fails_without_persisting() {
    let app = TestApp::new().await;
    let date = Utc::now().date_naive() + Duration::days(2);

    app.state
        .services
        .bookings
        .create_booking(CreateBookingInput {
            first_name: "First".to_string(),
            reservation_date: date,
            reservation_slot: 19,
        })
        .await
        .unwrap();

    let conflict = app
        .state
        .services
        .bookings
        .create_booking(CreateBookingInput {
            first_name: "Second".to_string(),
            reservation_date: date,
            reservation_slot: 19,
        })
        .await;

    match conflict {
        Err(ServiceError::ValidationError(msg)) => {
            assert!(msg.contains("already booked"), "unexpected message: {msg}")
        }
        other => panic!("expected slot-conflict validation error, got {other:?}"),
    }

    let all = app.state.services.bookings.list_bookings().await.unwrap();
    assert_eq!(all.len(), 1, "conflicting booking must not be persisted");

    // A different slot on the same date is fine.
    app.state
        .services
        .bookings
        .create_booking(CreateBookingInput {
            first_name: "Third".to_string(),
            reservation_date: date,
            reservation_slot: 20,
        })
        .await
        .expect("different slot should succeed");
}

#[tokio::test]
async fn past_dates_are_rejected() {
    let app = TestApp::new().await;
    let yesterday = Utc::now().date_naive() - Duration::days(1);

    let result = app
        .state
        .services
        .bookings
        .create_booking(CreateBookingInput {
            first_name: "Late".to_string(),
            reservation_date: yesterday,
            reservation_slot: 10,
        })
        .await;

    match result {
        Err(ServiceError::ValidationError(msg)) => {
            assert!(msg.contains("past"), "unexpected message: {msg}")
        }
        other => panic!("expected past-date validation error, got {other:?}"),
    }

    assert!(app
        .state
        .services
        .bookings
        .list_bookings()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn booking_today_is_allowed() {
    let app = TestApp::new().await;

    app.state
        .services
        .bookings
        .create_booking(CreateBookingInput {
            first_name: "Same Day".to_string(),
            reservation_date: Utc::now().date_naive(),
            reservation_slot: 18,
        })
        .await
        .expect("same-day booking should succeed");
}

#[tokio::test]
async fn standalone_menu_crud() {
    let app = TestApp::new().await;
    let svc = &app.state.services.bookings;

    let entry = svc
        .create_menu_entry(CreateMenuInput {
            name: "Greek Salad".to_string(),
            price: dec!(12.50),
        })
        .await
        .unwrap();

    let fetched = svc.get_menu_entry(entry.id).await.unwrap();
    assert_eq!(fetched.name, "Greek Salad");

    // Partial update: price only, name untouched.
    let updated = svc
        .update_menu_entry(
            entry.id,
            UpdateMenuInput {
                name: None,
                price: Some(dec!(13.75)),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Greek Salad");
    assert_eq!(updated.price, dec!(13.75));

    svc.delete_menu_entry(entry.id).await.unwrap();
    assert!(matches!(
        svc.get_menu_entry(entry.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn menu_price_must_be_positive() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .bookings
        .create_menu_entry(CreateMenuInput {
            name: "Free Lunch".to_string(),
            price: dec!(0.00),
        })
        .await;

    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn unknown_menu_entry_is_not_found() {
    let app = TestApp::new().await;
    let result = app
        .state
        .services
        .bookings
        .get_menu_entry(Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
