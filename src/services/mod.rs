//! # Services
//!
//! HTTP access to the Trackmania web services.
//!
//! Every upstream (Core, Live, OAuth and the public trackmania.exchange API) is
//! an [`HttpService`] with its own base URL and, for Nadeo, a token provider. Callers depend on the [`EndpointFetcher`]
//! capability only, so tests swap in a mock.

pub mod auth;
pub mod trackmania;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::TokenCacheProvider;

pub const CORE_URL: &str = "https://prod.trackmania.core.nadeo.online";
pub const LIVE_URL: &str = "https://live-services.trackmania.nadeo.live";
pub const OAUTH_URL: &str = "https://api.trackmania.com";
pub const EXCHANGE_URL: &str = "https://trackmania.exchange";

pub const CORE_AUDIENCE: &str = "NadeoServices";
pub const LIVE_AUDIENCE: &str = "NadeoLiveServices";
pub const OAUTH_AUDIENCE: &str = "trackmania";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Lectura de un endpoint JSON. `name` solo se usa para logs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EndpointFetcher: Send + Sync {
    async fn fetch_endpoint(&self, name: &str, path: &str) -> Result<serde_json::Value>;
}

/// Cliente HTTP compartido por todos los servicios
pub fn http_client(user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(user_agent)
        .build()
        .context("Failed to create HTTP client")
}

/// Servicio HTTP autenticado con un [`TokenCacheProvider`]
pub struct HttpService {
    name: &'static str,
    base_url: String,
    client: reqwest::Client,
    tokens: Option<Arc<TokenCacheProvider>>,
}

impl HttpService {
    pub fn new(
        name: &'static str,
        base_url: impl Into<String>,
        client: reqwest::Client,
        tokens: Option<Arc<TokenCacheProvider>>,
    ) -> Self {
        Self {
            name,
            base_url: base_url.into(),
            client,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EndpointFetcher for HttpService {
    async fn fetch_endpoint(&self, name: &str, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("🌐 Fetching endpoint \"{}\"", url);

        let started = Instant::now();
        let mut request = self.client.get(&url);
        if let Some(tokens) = &self.tokens {
            request = request.header(AUTHORIZATION, tokens.authorization().await?);
        }

        let body = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Error fetching \"{url}\""))?
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("Invalid JSON from \"{url}\""))?;

        debug!("⏱️ {}.{} completado en {:?}", self.name, name, started.elapsed());
        Ok(body)
    }
}
