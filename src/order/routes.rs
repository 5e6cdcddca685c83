use super::handlers::{
    cancel_order, create_order, get_my_orders, get_order_by_id, get_restaurant_orders, rate_order,
    update_order_status,
};
use crate::utils::types::Pool;
use axum::routing::{get, post, put};
use axum::Router;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route("/orders", post(create_order).get(get_my_orders))
        .route("/orders/{id}", get(get_order_by_id))
        .route("/orders/restaurant/{restaurant_id}", get(get_restaurant_orders))
        .route("/orders/{id}/status", put(update_order_status))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/rate", post(rate_order))
}
