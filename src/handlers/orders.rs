use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::auth::{policy, AuthUser};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, message_response, success_response};
use crate::services::orders::UpdateOrderInput;
use crate::AppState;

/// GET /orders — scoped by role: managers see all, delivery crew their
/// assignments, customers their own.
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let scope = policy::order_list_scope(&user);
    let orders = state.services.orders.list_orders(scope).await?;
    Ok(success_response(orders))
}

/// POST /orders — checkout: converts the caller's cart into an order.
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.place_order(user.user_id).await?;
    Ok(created_response(order))
}

/// GET /orders/:id — owner, manager, or the assigned crew member.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    policy::authorize_order_view(&user, &order.order)?;
    Ok(success_response(order))
}

/// PUT /orders/:id — partial update. Managers may change any field;
/// the assigned crew member may change only the status.
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(input): Json<UpdateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let existing = state.services.orders.get_order(id).await?;
    policy::authorize_order_update(&user, &existing.order, input.only_status())?;

    let updated = state.services.orders.update_order(id, input).await?;
    Ok(success_response(updated))
}

/// DELETE /orders/:id — managers only; removes the order items too.
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize_order_delete(&user)?;

    state.services.orders.delete_order(id).await?;
    Ok(message_response("order deleted"))
}
