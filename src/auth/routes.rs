use axum::{
    Router,
    routing::{get, post, put},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::get_profile))
        .route(
            "/auth/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/auth/change-password", put(handlers::change_password))
        .route("/auth/logout", post(handlers::logout))
}
