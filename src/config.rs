use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

use crate::sources::msrc::MSRC_API_BASE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the CVRF API; override for mirrors or test servers.
    pub msrc_api_base: String,
    pub log_to_file: bool,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let msrc_api_base =
            env::var("MSRC_BULLETINS__API_BASE").unwrap_or_else(|_| MSRC_API_BASE.to_string());

        let log_to_file = env::var("MSRC_BULLETINS__LOG_TO_FILE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let log_dir = env::var("MSRC_BULLETINS__LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        Ok(Self {
            msrc_api_base,
            log_to_file,
            log_dir,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            msrc_api_base: MSRC_API_BASE.to_string(),
            log_to_file: false,
            log_dir: "logs".to_string(),
        }
    }
}
