use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::leaderboard::DEFAULT_PAGE_LENGTH;

/// Máximo de posiciones por petición que acepta la API de leaderboards
const MAX_PAGE_LENGTH: i64 = 100;

const DEFAULT_USER_AGENT: &str = "trackmania-bot Discord Bot : https://github.com/Khujou/trackmania-bot";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,

    // Paths
    pub data_dir: PathBuf,

    // Nadeo (cuenta de servidor dedicado)
    pub server_login: String,
    pub server_password: String,

    // OAuth
    pub oauth_client_id: String,
    pub oauth_client_secret: String,

    // HTTP
    pub user_agent: String,

    // Leaderboard
    pub page_length: i64,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?,

            // Paths
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),

            // Nadeo
            server_login: std::env::var("TM_SERVER_ACC_LOGIN")
                .context("TM_SERVER_ACC_LOGIN is not set")?,
            server_password: std::env::var("TM_SERVER_ACC_PASSWORD")
                .context("TM_SERVER_ACC_PASSWORD is not set")?,

            // OAuth
            oauth_client_id: std::env::var("TM_OAUTH2_CLIENT_ID")
                .context("TM_OAUTH2_CLIENT_ID is not set")?,
            oauth_client_secret: std::env::var("TM_OAUTH2_CLIENT_SECRET")
                .context("TM_OAUTH2_CLIENT_SECRET is not set")?,

            // HTTP
            user_agent: std::env::var("USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),

            // Leaderboard
            page_length: std::env::var("LEADERBOARD_PAGE_LENGTH")
                .unwrap_or_else(|_| DEFAULT_PAGE_LENGTH.to_string())
                .parse()
                .context("LEADERBOARD_PAGE_LENGTH must be an integer")?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Credentials must not be empty
    /// - Page length must be between 1 and 100 (upstream API limit)
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("DISCORD_TOKEN", &self.discord_token),
            ("TM_SERVER_ACC_LOGIN", &self.server_login),
            ("TM_SERVER_ACC_PASSWORD", &self.server_password),
            ("TM_OAUTH2_CLIENT_ID", &self.oauth_client_id),
            ("TM_OAUTH2_CLIENT_SECRET", &self.oauth_client_secret),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        if !(1..=MAX_PAGE_LENGTH).contains(&self.page_length) {
            anyhow::bail!(
                "Leaderboard page length must be between 1 and {}, got: {}",
                MAX_PAGE_LENGTH,
                self.page_length
            );
        }

        if self.user_agent.trim().is_empty() {
            anyhow::bail!("USER_AGENT must not be empty");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Secrets are never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Data dir: {}\n  \
            Nadeo login: {}\n  \
            OAuth client: {}\n  \
            Leaderboard page length: {}",
            self.data_dir.display(),
            self.server_login,
            self.oauth_client_id,
            self.page_length,
        )
    }
}

/// Default configuration values.
///
/// Credentials have no defaults and must be provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            data_dir: "./data".into(),
            server_login: String::new(),
            server_password: String::new(),
            oauth_client_id: String::new(),
            oauth_client_secret: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_length: DEFAULT_PAGE_LENGTH,
        }
    }
}
