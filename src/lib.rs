#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Assemble the server. Configuration and the database connection are
/// loaded when the returned rocket is ignited.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .mount("/", api::status_routes())
        .mount(api::API_BASE, api::routes())
        .register("/", error::catchers())
}

/// Connect to the database named in the config.
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .unwrap();
    mongodb::Client::with_uri_str(db_uri).await.unwrap()
}

/// A fresh, randomly named database, so tests can run in parallel.
#[cfg(test)]
fn database() -> String {
    format!("test{}", rand::random::<u32>())
}

/// Build a rocket against the given database, bypassing `DatabaseFairing`.
#[cfg(test)]
async fn rocket_for_db(db_client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = db_client.database(db_name);
    config::prepare_database(&db).await.unwrap();

    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .manage(db_client)
        .manage(db)
        .mount("/", api::status_routes())
        .mount(api::API_BASE, api::routes())
        .register("/", error::catchers())
}

/// An `Authorization` header carrying a valid admin token.
#[cfg(test)]
fn admin_header(
    client: &rocket::local::asynchronous::Client,
) -> rocket::http::Header<'static> {
    use crate::model::api::auth::AuthToken;

    let config = client.rocket().state::<Config>().unwrap();
    let token = AuthToken::new("admin").encode(config, chrono::Duration::minutes(5));
    rocket::http::Header::new("Authorization", format!("Bearer {token}"))
}
