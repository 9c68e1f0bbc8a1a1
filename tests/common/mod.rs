use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use bistro_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::{category, menu_item, user, user_role, CategoryModel, MenuItemModel, UserModel},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

/// Test harness: application state backed by an in-memory SQLite
/// database with the embedded migrations applied.
pub struct TestApp {
    pub state: AppState,
    pub auth: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only".to_string(),
            "127.0.0.1".to_string(),
            0,
        );
        // A single pooled connection keeps the in-memory schema alive.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations failed");

        let db = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(
            AuthConfig::new(cfg.jwt_secret.clone(), Duration::from_secs(3600)),
            db.clone(),
            event_sender.clone(),
        ));

        let services = AppServices::new(db.clone(), event_sender.clone());

        let state = AppState {
            db,
            config: cfg,
            event_sender,
            auth: auth.clone(),
            services,
        };

        Self {
            state,
            auth,
            _event_task: event_task,
        }
    }

    /// Full router with the authentication middleware, as served in main.
    #[allow(dead_code)]
    pub fn router(&self) -> Router {
        bistro_api::api_routes()
            .nest(
                "/auth",
                bistro_api::auth::auth_routes().with_state(self.auth.clone()),
            )
            .layer(axum::middleware::from_fn_with_state(
                self.auth.clone(),
                bistro_api::auth::authenticate,
            ))
            .with_state(self.state.clone())
    }

    /// Inserts a user directly; the password hash is a placeholder since
    /// most tests mint tokens instead of logging in.
    #[allow(dead_code)]
    pub async fn create_user(
        &self,
        username: &str,
        roles: &[&str],
        is_superuser: bool,
    ) -> UserModel {
        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            password_hash: Set("!".to_string()),
            is_superuser: Set(is_superuser),
            active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to insert test user");

        for role in roles {
            user_role::ActiveModel {
                user_id: Set(account.id),
                role: Set(role.to_string()),
            }
            .insert(&*self.state.db)
            .await
            .expect("failed to insert test role");
        }

        account
    }

    /// Mints an access token for the user carrying the given roles.
    #[allow(dead_code)]
    pub fn token_for(&self, account: &UserModel, roles: &[&str]) -> String {
        self.auth
            .issue_token(account, roles.iter().map(|r| r.to_string()).collect())
            .expect("failed to issue token")
            .access_token
    }

    /// Seeds one category.
    #[allow(dead_code)]
    pub async fn seed_category(&self, slug: &str) -> CategoryModel {
        category::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(slug.to_string()),
            title: Set(slug.to_string()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to insert test category")
    }

    /// Seeds one menu item under the given category.
    #[allow(dead_code)]
    pub async fn seed_menu_item(
        &self,
        category_id: Uuid,
        title: &str,
        price: Decimal,
    ) -> MenuItemModel {
        menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            price: Set(price),
            featured: Set(false),
            category_id: Set(category_id),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to insert test menu item")
    }
}
