//! Bistro API Library
//!
//! Restaurant ordering backend: menu catalog, per-user carts,
//! cart-to-order checkout, role-gated order management, staff groups,
//! and table bookings.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub auth: Arc<auth::AuthService>,
    pub services: handlers::AppServices,
}

/// Builds the API surface. Authentication is layered on in `main`; open
/// endpoints simply never look for a caller.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Catalog
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/menu-items",
            get(handlers::catalog::list_menu_items).post(handlers::catalog::create_menu_item),
        )
        .route(
            "/menu-items/:id",
            get(handlers::catalog::get_menu_item)
                .put(handlers::catalog::update_menu_item)
                .patch(handlers::catalog::update_menu_item)
                .delete(handlers::catalog::delete_menu_item),
        )
        // Cart (self-scoped)
        .route(
            "/cart/menu-items",
            get(handlers::cart::list_cart)
                .post(handlers::cart::add_to_cart)
                .delete(handlers::cart::clear_cart),
        )
        // Orders
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::place_order),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        // Staff group management
        .route(
            "/groups/:group/users",
            get(handlers::staff::list_group_members)
                .post(handlers::staff::add_group_member)
                .delete(handlers::staff::remove_group_member),
        )
        // Booking module (no auth gate; see DESIGN.md)
        .route(
            "/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route(
            "/menu",
            get(handlers::bookings::list_menu).post(handlers::bookings::create_menu_entry),
        )
        .route(
            "/menu/:id",
            get(handlers::bookings::get_menu_entry)
                .put(handlers::bookings::update_menu_entry)
                .delete(handlers::bookings::delete_menu_entry),
        )
}

async fn api_status() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    Json(json!({
        "status": "ok",
        "service": "bistro-api",
        "version": version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
