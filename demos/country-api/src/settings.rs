use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub data_dir: Option<String>,
    pub pool_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub countries_url: String,
    pub rates_url: String,
    pub base_currency: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub sources: SourceSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.pool_size", country_rates::config::DEFAULT_POOL_SIZE as i64)?
            .set_default("sources.countries_url", country_rates::config::COUNTRIES_URL)?
            .set_default("sources.rates_url", country_rates::config::RATES_URL)?
            .set_default("sources.base_currency", country_rates::config::BASE_CURRENCY)?
            .set_default(
                "sources.timeout_secs",
                country_rates::config::DEFAULT_TIMEOUT.as_secs() as i64,
            )?
            // Load from config/country-api.toml
            .add_source(File::with_name("config/country-api").required(false))
            // Override from environment (e.g., COUNTRY_API__SERVER__PORT=8080)
            .add_source(Environment::with_prefix("COUNTRY_API").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
