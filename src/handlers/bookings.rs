use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, message_response, success_response};
use crate::services::bookings::{CreateBookingInput, CreateMenuInput, UpdateMenuInput};
use crate::AppState;

// The booking module carries no auth gate; see DESIGN.md.

/// GET /bookings
pub async fn list_bookings(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let bookings = state.services.bookings.list_bookings().await?;
    Ok(success_response(bookings))
}

/// POST /bookings — rejects past dates and occupied slots.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(input): Json<CreateBookingInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.services.bookings.create_booking(input).await?;
    Ok(created_response(booking))
}

/// GET /menu — the standalone restaurant menu.
pub async fn list_menu(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let entries = state.services.bookings.list_menu().await?;
    Ok(success_response(entries))
}

/// POST /menu
pub async fn create_menu_entry(
    State(state): State<AppState>,
    Json(input): Json<CreateMenuInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let entry = state.services.bookings.create_menu_entry(input).await?;
    Ok(created_response(entry))
}

/// GET /menu/:id
pub async fn get_menu_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let entry = state.services.bookings.get_menu_entry(id).await?;
    Ok(success_response(entry))
}

/// PUT /menu/:id — partial update.
pub async fn update_menu_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateMenuInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let entry = state.services.bookings.update_menu_entry(id, input).await?;
    Ok(success_response(entry))
}

/// DELETE /menu/:id
pub async fn delete_menu_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.bookings.delete_menu_entry(id).await?;
    Ok(message_response("menu entry deleted"))
}
