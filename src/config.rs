use config::{Config as ConfigLoader, Environment};
use serde::Deserialize;

use crate::error::Result;

/// Startup configuration for the binary, read from `CRPT_*` environment
/// variables (optionally via a `.env` file). The library itself takes all of
/// this through constructor arguments and setters instead.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub base_url: String,
    pub auth_token: String,
    pub product_group: String,
    pub request_limit: usize,
    pub interval_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let config = ConfigLoader::builder()
            .set_default("base_url", "https://ismp.crpt.ru")?
            .set_default("request_limit", 10_i64)?
            .set_default("interval_secs", 1_i64)?
            .set_default("log_level", "info")?
            .add_source(Environment::with_prefix("CRPT"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}
