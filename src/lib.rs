use diesel::prelude::*;
use dotenvy::dotenv;
use std::env;

pub mod schema;

/// Blocking connection, used for running embedded migrations at startup.
/// Request handlers go through the async pool in `pool.rs` instead.
pub fn establish_connection() -> ConnectionResult<PgConnection> {
    dotenv().ok();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgConnection::establish(&db_url)
}
