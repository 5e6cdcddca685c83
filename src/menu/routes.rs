use axum::{
    Router,
    routing::{get, post},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route(
            "/menu/restaurant/{restaurant_id}",
            get(handlers::get_restaurant_menu),
        )
        .route("/menu", post(handlers::create_menu_item))
        .route(
            "/menu/{id}",
            get(handlers::get_menu_item)
                .put(handlers::update_menu_item)
                .delete(handlers::delete_menu_item),
        )
}
