mod admin;
mod auth;
mod cart;
mod menu;
mod order;
mod pool;
mod restaurant;
mod utils;

use axum::Router;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use listenfd::ListenFd;
use tokio::net::TcpListener;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "axum_eats=debug,tower_http=debug".into()),
        )
        .init();

    tokio::task::spawn_blocking(|| {
        let mut conn = axum_eats::establish_connection().expect("database connection failed");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("migrations failed");
    })
    .await
    .expect("migration task panicked");

    let pool = pool::get_pool().await.expect("db pool init failed");

    let routes = Router::new()
        .merge(auth::routes::get_routes())
        .merge(restaurant::routes::get_routes())
        .merge(menu::routes::get_routes())
        .merge(cart::routes::get_routes())
        .merge(order::routes::get_routes())
        .merge(admin::routes::get_routes())
        .with_state(pool);
    let app = Router::new()
        .nest("/api", routes)
        .fallback(utils::handler_404);

    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0).unwrap() {
        // if we are given a tcp listener on listen fd 0, we use that one
        Some(listener) => {
            listener.set_nonblocking(true).unwrap();
            TcpListener::from_std(listener).unwrap()
        }
        // otherwise fall back to local listening
        None => TcpListener::bind("127.0.0.1:3000").await.unwrap(),
    };
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
