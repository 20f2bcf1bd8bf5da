//! # gridpulse_api
//!
//! HTTP API library for GridPulse accounts.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use gridpulse_core::auth::AuthError;
use gridpulse_core::auth::jwt::TokenIssuer;
use gridpulse_core::auth::password::PasswordHasher;
use gridpulse_core::auth::queries::AccountRepository;
use gridpulse_core::health::LivenessProber;
use gridpulse_core::session::SessionCache;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, liveness};

/// Shared application state passed to all handlers.
///
/// Built once at startup and read-only afterwards; the repository, cache
/// and pingers wrap pooled clients that are safe for concurrent use.
#[derive(Clone)]
pub struct AppState {
    /// Account storage.
    pub accounts: Arc<dyn AccountRepository>,
    /// Session token cache.
    pub sessions: Arc<dyn SessionCache>,
    /// Dependency liveness prober.
    pub prober: LivenessProber,
    /// Token signer/verifier keyed with `config.jwt_secret`.
    pub tokens: TokenIssuer,
    /// Password hasher with `config.bcrypt_cost`.
    pub hasher: PasswordHasher,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Assemble the state, deriving the token issuer and hasher from `config`.
    pub fn new(
        config: ApiConfig,
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionCache>,
        prober: LivenessProber,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            accounts,
            sessions,
            prober,
            tokens: TokenIssuer::new(config.jwt_secret.as_bytes())?,
            hasher: PasswordHasher::with_cost(config.bcrypt_cost),
            config,
        })
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_LIVENESS, get(liveness::liveness_handler))
        .route(routes::GET_LIVENESS_ALIAS, get(liveness::liveness_handler))
        .route(routes::POST_USER_REGISTER, post(auth::register_handler))
        .route(routes::POST_USER_LOGIN, post(auth::login_handler))
        .route(routes::POST_USER_REFRESH, post(auth::refresh_handler));

    // Protected routes (require a valid access token)
    let protected = Router::new()
        .route(routes::GET_USER, get(auth::current_user_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
