use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::auth::{policy, OptionalAuthUser};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, message_response, success_response};
use crate::services::catalog::{
    CreateCategoryInput, CreateMenuItemInput, MenuItemFilters, UpdateMenuItemInput,
};
use crate::AppState;

/// GET /categories — open to anyone.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(categories))
}

/// POST /categories — authenticated; manager-only when the catalog
/// write policy is restricted.
pub async fn create_category(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Json(input): Json<CreateCategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize_catalog_write(user.as_ref(), state.config.restrict_catalog_writes)?;

    let category = state.services.catalog.create_category(input).await?;
    Ok(created_response(category))
}

/// GET /menu-items — open; supports category/featured filters and
/// price/title ordering.
pub async fn list_menu_items(
    State(state): State<AppState>,
    Query(filters): Query<MenuItemFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.catalog.list_menu_items(filters).await?;
    Ok(success_response(items))
}

/// POST /menu-items
pub async fn create_menu_item(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Json(input): Json<CreateMenuItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize_catalog_write(user.as_ref(), state.config.restrict_catalog_writes)?;

    let item = state.services.catalog.create_menu_item(input).await?;
    Ok(created_response(item))
}

/// GET /menu-items/:id — open.
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.catalog.get_menu_item(id).await?;
    Ok(success_response(item))
}

/// PUT/PATCH /menu-items/:id — partial update either way.
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalAuthUser(user): OptionalAuthUser,
    Json(input): Json<UpdateMenuItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize_catalog_write(user.as_ref(), state.config.restrict_catalog_writes)?;

    let item = state.services.catalog.update_menu_item(id, input).await?;
    Ok(success_response(item))
}

/// DELETE /menu-items/:id
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalAuthUser(user): OptionalAuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize_catalog_write(user.as_ref(), state.config.restrict_catalog_writes)?;

    state.services.catalog.delete_menu_item(id).await?;
    Ok(message_response("menu item deleted"))
}
