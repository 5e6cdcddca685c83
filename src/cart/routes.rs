use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route("/cart", get(handlers::get_cart))
        .route("/cart/add", post(handlers::add_to_cart))
        .route("/cart/update/{item_id}", put(handlers::update_quantity))
        .route("/cart/remove/{item_id}", delete(handlers::remove_from_cart))
        .route("/cart/clear", delete(handlers::clear_cart))
}
