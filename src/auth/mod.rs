//! Authentication and authorization.
//!
//! Bearer-token authentication (HS256 JWTs) with role claims, plus the
//! pure access-control policy consumed by every handler. Passwords are
//! argon2-hashed. The middleware is lenient: requests without
//! credentials continue anonymously and open endpoints accept them;
//! protected extractors reject them with 401.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{user, user_role, User, UserModel, UserRole};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

pub mod policy;

pub use policy::StaffGroup;

/// Claim structure for access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub roles: Vec<String>,
    pub is_superuser: bool,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated caller extracted from a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
    pub is_superuser: bool,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_manager(&self) -> bool {
        self.has_role(policy::MANAGER)
    }

    pub fn is_delivery_crew(&self) -> bool {
        self.has_role(policy::DELIVERY_CREW)
    }
}

/// Extractor for endpoints that require authentication.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("authentication required".to_string()))
    }
}

/// Extractor for endpoints that are open but behave differently for
/// authenticated callers.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthUser>().cloned()))
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            jwt_issuer: "bistro-auth".to_string(),
            jwt_audience: "bistro-api".to_string(),
            token_expiration,
        }
    }
}

/// Issues and validates tokens and manages account credentials.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            config,
            db,
            event_sender,
        }
    }

    /// Registers a new account with an argon2-hashed password.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserModel, ServiceError> {
        request.validate()?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {e}")))?
            .to_string();

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(request.username.clone()),
            email: Set(request.email),
            password_hash: Set(password_hash),
            is_superuser: Set(false),
            active: Set(true),
            created_at: Set(Utc::now()),
        };

        let created = model.insert(&*self.db).await.map_err(|e| {
            ServiceError::conflict_on_unique(
                e,
                format!("username '{}' is already taken", request.username),
            )
        })?;

        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;

        info!(user_id = %created.id, "Registered user");
        Ok(created)
    }

    /// Verifies credentials and issues an access token.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: LoginRequest) -> Result<TokenResponse, ServiceError> {
        let account = User::find()
            .filter(user::Column::Username.eq(credentials.username.as_str()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".to_string()))?;

        if !account.active {
            return Err(ServiceError::Unauthorized("account is disabled".to_string()));
        }

        let parsed = PasswordHash::new(&account.password_hash)
            .map_err(|e| ServiceError::InternalError(format!("corrupt password hash: {e}")))?;
        Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed)
            .map_err(|_| ServiceError::Unauthorized("invalid credentials".to_string()))?;

        let roles = self.user_roles(account.id).await?;
        self.issue_token(&account, roles)
    }

    /// Role names currently granted to the user.
    pub async fn user_roles(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let roles = UserRole::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| r.role)
            .collect();
        Ok(roles)
    }

    /// Signs an access token for the given account and role set.
    pub fn issue_token(
        &self,
        account: &UserModel,
        roles: Vec<String>,
    ) -> Result<TokenResponse, ServiceError> {
        let now = Utc::now();
        let expires_in = self.config.token_expiration.as_secs() as i64;

        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            roles,
            is_superuser: account.is_superuser,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + expires_in,
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("token creation failed: {e}")))?;

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in,
        })
    }

    /// Validates a token and returns the caller it describes.
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("token has expired".to_string())
            }
            _ => ServiceError::Unauthorized("invalid token".to_string()),
        })?
        .claims;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;

        Ok(AuthUser {
            user_id,
            username: claims.username,
            roles: claims.roles,
            is_superuser: claims.is_superuser,
        })
    }
}

/// Bearer-token middleware. A valid token attaches an [`AuthUser`] to the
/// request; a bad token fails the request; no token continues anonymously.
pub async fn authenticate(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .map(str::to_owned);

    if let Some(token) = token {
        match auth_service.validate_token(&token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(err) => return err.into_response(),
        }
    }

    next.run(request).await
}

/// Registration and login endpoints.
pub fn auth_routes() -> Router<Arc<AuthService>> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
}

async fn register_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = auth_service.register(request).await?;
    Ok((
        http::StatusCode::CREATED,
        Json(AccountResponse::from(account)),
    ))
}

async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let tokens = auth_service.login(credentials).await?;
    Ok(Json(tokens))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "email must be valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<UserModel> for AccountResponse {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}
