use std::sync::Arc;

use chrono::Duration;
use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::client::{cache::QueryCache, AwardsApi, AwardsService, GraphQlClient};
use crate::model::session::SessionStore;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    api_url: String,
    auth_ttl: u32,
    cache_ttl: u32,
    session_ttl: u32,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// The GraphQL endpoint of the Bench Promos API.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Lifetime of cached query results. `None` when configured as zero,
    /// in which case entries live until a mutation invalidates them.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl > 0).then(|| Duration::seconds(self.cache_ttl.into()))
    }

    /// How long an idle voting session is kept.
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl.into())
    }

    /// Secret key used to sign auth token cookies.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that connects to the awards API and places the cached
/// `AwardsService` and the `SessionStore` into managed state.
/// Must be attached after [`ConfigFairing`].
pub struct ApiFairing {
    api: Option<Arc<dyn AwardsApi>>,
}

impl ApiFairing {
    /// Talk to the GraphQL endpoint from the config.
    pub fn graphql() -> Self {
        Self { api: None }
    }

    /// Use the given implementation instead.
    pub fn with_api(api: Arc<dyn AwardsApi>) -> Self {
        Self { api: Some(api) }
    }
}

#[rocket::async_trait]
impl Fairing for ApiFairing {
    fn info(&self) -> Info {
        Info {
            name: "Awards API",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.state::<Config>() {
            Some(config) => config,
            None => {
                error!("Application config must be loaded before the awards API");
                return Err(rocket);
            }
        };

        let api = match &self.api {
            Some(api) => api.clone(),
            None => {
                info!("Using awards API at {}", config.api_url());
                Arc::new(GraphQlClient::new(config.api_url())) as Arc<dyn AwardsApi>
            }
        };
        let cache = match config.cache_ttl() {
            Some(ttl) => QueryCache::with_ttl(ttl),
            None => QueryCache::new(),
        };
        let sessions = SessionStore::new(config.session_ttl());

        // Manage the state.
        rocket = rocket
            .manage(AwardsService::new(api, cache))
            .manage(sessions);
        Ok(rocket)
    }
}
