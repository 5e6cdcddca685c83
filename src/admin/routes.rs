use super::handlers::{
    get_all_orders, get_dashboard, get_pending_restaurants, get_users, set_user_status,
};
use crate::utils::types::Pool;
use axum::routing::{get, put};
use axum::Router;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route("/admin/dashboard", get(get_dashboard))
        .route("/admin/users", get(get_users))
        .route("/admin/users/{id}/status", put(set_user_status))
        .route("/admin/orders", get(get_all_orders))
        .route("/admin/restaurants/pending", get(get_pending_restaurants))
}
