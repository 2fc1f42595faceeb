//! Obtención de tokens de acceso.
//!
//! Cada fetcher etiqueta su resultado según la forma que devuelve el
//! servicio: Nadeo responde con un token firmado (`accessToken` con claim
//! `exp`), la API OAuth con `access_token` + `expires_in`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{CORE_URL, OAUTH_URL};
use crate::cache::{FetchedToken, Fetcher, OAuthToken, SignedToken};

/// Token de Nadeo con las credenciales de una cuenta de servidor dedicado
pub struct NadeoTokenFetcher {
    client: reqwest::Client,
    login: String,
    password: String,
    audience: String,
}

impl NadeoTokenFetcher {
    pub fn new(
        client: reqwest::Client,
        login: impl Into<String>,
        password: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            client,
            login: login.into(),
            password: password.into(),
            audience: audience.into(),
        }
    }
}

#[async_trait]
impl Fetcher<FetchedToken> for NadeoTokenFetcher {
    async fn fetch(&self) -> Result<FetchedToken> {
        info!("🔑 Solicitando token Nadeo para {}", self.audience);

        let token: SignedToken = self
            .client
            .post(format!("{CORE_URL}/v2/authentication/token/basic"))
            .basic_auth(&self.login, Some(&self.password))
            .json(&json!({ "audience": self.audience }))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Nadeo authentication failed for {}", self.audience))?
            .json()
            .await
            .context("Unexpected Nadeo token response")?;

        Ok(FetchedToken::Signed(token))
    }
}

/// Token OAuth2 `client_credentials` de api.trackmania.com
pub struct OAuthTokenFetcher {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl OAuthTokenFetcher {
    pub fn new(
        client: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl Fetcher<FetchedToken> for OAuthTokenFetcher {
    async fn fetch(&self) -> Result<FetchedToken> {
        info!("🔑 Solicitando token OAuth");

        let token: OAuthToken = self
            .client
            .post(format!("{OAUTH_URL}/api/access_token"))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .context("OAuth client_credentials request failed")?
            .json()
            .await
            .context("Unexpected OAuth token response")?;

        Ok(FetchedToken::OAuth(token))
    }
}
