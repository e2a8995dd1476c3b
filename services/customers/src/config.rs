use bazaar_core::config;
use bazaar_events::RedisBusConfig;
use bazaar_outbox::PublisherConfig;

/// Customers service configuration loaded from environment variables.
#[derive(Debug)]
pub struct CustomersConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3120). Env var: `CUSTOMERS_PORT`.
    pub port: u16,
    /// Whether this instance drains the outbox. Run the publisher role from
    /// one deployment only. Env var: `OUTBOX_PUBLISHER_ENABLED`.
    pub publisher_enabled: bool,
    pub publisher: PublisherConfig,
    pub bus: RedisBusConfig,
}

impl CustomersConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: config::required("DATABASE_URL"),
            port: config::parse_or("CUSTOMERS_PORT", 3120),
            publisher_enabled: config::flag_or("OUTBOX_PUBLISHER_ENABLED", true),
            publisher: PublisherConfig::from_env(),
            bus: RedisBusConfig::from_env("customers"),
        }
    }
}
