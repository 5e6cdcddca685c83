pub mod handlers;
pub mod models;
pub mod pricing;
pub mod routes;
