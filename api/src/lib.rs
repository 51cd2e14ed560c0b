#[macro_use]
extern crate rocket;

pub mod config;
pub mod error;
pub mod fairings;
pub mod logger;
pub mod models;
pub mod repository;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use rocket::{Build, Rocket};

use crate::fairings::{Cors, RequestLogger};
use crate::state::AppState;

/// Assembles the HTTP application over the given stores.
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .attach(Cors)
        .attach(RequestLogger)
        .mount("/", routes::all())
        .register("/", routes::catchers())
}
