use bazaar_core::config;
use bazaar_events::RedisBusConfig;

/// Products service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ProductsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3121). Env var: `PRODUCTS_PORT`.
    pub port: u16,
    /// Consumer group defaults to `products`.
    pub bus: RedisBusConfig,
}

impl ProductsConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: config::required("DATABASE_URL"),
            port: config::parse_or("PRODUCTS_PORT", 3121),
            bus: RedisBusConfig::from_env("products"),
        }
    }
}
