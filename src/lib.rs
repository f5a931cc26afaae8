pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;

use crate::services::{auth_service::AuthService, candidato_service::CandidatoService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub candidato_service: CandidatoService,
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let candidato_service = CandidatoService::new(pool.clone());
        let auth_service = AuthService::new(
            pool.clone(),
            candidato_service.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_secs,
        );

        Self {
            pool,
            candidato_service,
            auth_service,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/candidatos",
            get(routes::candidatos::listar).post(routes::candidatos::criar),
        )
        .route(
            "/candidatos/:id",
            get(routes::candidatos::buscar_por_id)
                .put(routes::candidatos::atualizar)
                .patch(routes::candidatos::atualizar_parcialmente)
                .delete(routes::candidatos::deletar),
        )
        .route(
            "/candidatos/:id/senha",
            patch(routes::candidatos::alterar_senha),
        )
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .layer(axum::middleware::from_fn(
            middleware::auth::require_bearer_auth,
        ))
        .with_state(state)
}
