//! Routes, shared state and error mapping for the HTTP service.
//!
//! ## Structure
//!
//! - [`handler`] - request handlers for `/auth` and `/_status`.
//! - [`error`] - [`ApiError`](error::ApiError), the single place core errors
//!   become status codes.

pub mod error;
pub mod handler;


use crate::server::config::ServerConfig;
use axum::{Router, routing::get};
use latchkey::{CredentialStore, EndpointPool, Issuer, Validator};
use std::sync::Arc;

/// Store handle shared by the issuer and the validator.
pub type SharedStore = Arc<dyn CredentialStore>;

#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<Issuer<SharedStore>>,
    pub validator: Arc<Validator<SharedStore>>,
}

impl AppState {
    pub fn new(store: SharedStore, config: &ServerConfig) -> latchkey::Result<Self> {
        let pool = config.endpoints.iter().cloned().collect::<EndpointPool>();
        let issuer = Issuer::new(Arc::clone(&store), pool, config.policy)?;
        let validator = Validator::new(store).with_timeout(config.policy.store_timeout);
        Ok(Self {
            issuer: Arc::new(issuer),
            validator: Arc::new(validator),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth", get(handler::issue).post(handler::validate))
        .route("/_status", get(handler::status))
        .with_state(state)
}
