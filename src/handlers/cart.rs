use axum::{extract::State, response::IntoResponse, Json};

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, message_response, success_response};
use crate::services::cart::AddToCartInput;
use crate::AppState;

/// GET /cart/menu-items — the caller's own cart.
pub async fn list_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.cart.list(user.user_id).await?;
    Ok(success_response(items))
}

/// POST /cart/menu-items — idempotent upsert of one line.
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<AddToCartInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let entry = state.services.cart.add_item(user.user_id, input).await?;
    Ok(created_response(entry))
}

/// DELETE /cart/menu-items — clears the caller's cart unconditionally.
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.cart.clear(user.user_id).await?;
    Ok(message_response("all items removed from cart"))
}
