use axum::{
    Router,
    routing::{get, put},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route(
            "/restaurants",
            get(handlers::get_restaurants).post(handlers::create_restaurant),
        )
        .route(
            "/restaurants/{id}",
            get(handlers::get_restaurant_by_id)
                .put(handlers::update_restaurant)
                .delete(handlers::delete_restaurant),
        )
        .route("/restaurants/{id}/status", put(handlers::set_restaurant_status))
}
