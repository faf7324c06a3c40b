#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate awards_test;

use std::sync::Arc;

use rocket::{Build, Rocket};

use crate::client::AwardsApi;
use crate::config::{ApiFairing, ConfigFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

/// The server, talking to the GraphQL endpoint named in the config.
pub fn build() -> Rocket<Build> {
    assemble(ApiFairing::graphql())
}

/// The server, talking to the given API instead.
pub fn rocket_for_api(api: Arc<dyn AwardsApi>) -> Rocket<Build> {
    assemble(ApiFairing::with_api(api))
}

fn assemble(api_fairing: ApiFairing) -> Rocket<Build> {
    rocket::build()
        .attach(ConfigFairing)
        .attach(api_fairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
}
