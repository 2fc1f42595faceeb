use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine as _,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use super::provider::{CacheError, ExpiringCacheProvider, Fetcher};
use crate::clock::{self, Clock};
use crate::storage::DurableStore;

/// Token tal como lo entrega el servicio de autenticación, etiquetado en el
/// punto de fetch según su forma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FetchedToken {
    /// OAuth2 `client_credentials`: vida relativa en `expires_in`
    #[serde(rename = "oauth")]
    OAuth(OAuthToken),
    /// Token firmado de tres segmentos con un claim `exp`
    #[serde(rename = "signed")]
    Signed(SignedToken),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    #[serde(default)]
    pub token_type: Option<String>,
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl FetchedToken {
    pub fn access_token(&self) -> &str {
        match self {
            FetchedToken::OAuth(token) => &token.access_token,
            FetchedToken::Signed(token) => &token.access_token,
        }
    }

    /// Valor del header `Authorization` para este token
    pub fn authorization_header(&self) -> String {
        match self {
            FetchedToken::OAuth(token) => format!("Bearer {}", token.access_token),
            FetchedToken::Signed(token) => format!("nadeo_v1 t={}", token.access_token),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExpiryDerivationError {
    #[error("signed token has {0} segments, expected 3")]
    SegmentCount(usize),

    #[error("token payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token payload has no numeric exp claim")]
    MissingExp,
}

/// Calcula el instante de expiración (segundos unix) de un token obtenido en `fetched_at`.
pub fn derive_expiry(token: &FetchedToken, fetched_at: i64) -> Result<i64, ExpiryDerivationError> {
    match token {
        FetchedToken::OAuth(oauth) => Ok(fetched_at + oauth.expires_in),
        FetchedToken::Signed(signed) => {
            let segments: Vec<&str> = signed.access_token.split('.').collect();
            if segments.len() != 3 {
                return Err(ExpiryDerivationError::SegmentCount(segments.len()));
            }

            let payload = segments[1].trim_end_matches('=');
            let bytes = URL_SAFE_NO_PAD
                .decode(payload)
                .or_else(|_| STANDARD_NO_PAD.decode(payload))?;
            let claims: serde_json::Value = serde_json::from_slice(&bytes)?;

            claims
                .get("exp")
                .and_then(serde_json::Value::as_f64)
                .map(|exp| exp.floor() as i64)
                .ok_or(ExpiryDerivationError::MissingExp)
        }
    }
}

/// Token en caché junto a su expiración ya calculada
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    #[serde(flatten)]
    pub token: FetchedToken,
    #[serde(
        rename = "expiryTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry_time: Option<i64>,
}

impl CachedToken {
    pub fn new(token: FetchedToken) -> Self {
        Self {
            token,
            expiry_time: None,
        }
    }

    /// Calcula `expiry_time` una sola vez. Recalcular un `expires_in` relativo
    /// en cada carga haría que el token nunca expirara.
    ///
    /// Si la forma del token no se reconoce la expiración queda en `0`: el
    /// siguiente acceso fuerza un refresh.
    pub fn with_expiry(mut self, now: i64) -> Self {
        if self.expiry_time.is_some() {
            return self;
        }

        let expiry = match derive_expiry(&self.token, now) {
            Ok(expiry) => expiry,
            Err(e) => {
                error!("Unable to determine expiry for token: {}", e);
                0
            }
        };
        self.expiry_time = Some(expiry);
        self
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expiry_time.unwrap_or(0) < now
    }

    pub fn access_token(&self) -> &str {
        self.token.access_token()
    }

    pub fn authorization_header(&self) -> String {
        self.token.authorization_header()
    }
}

/// Caché de token de acceso para una audiencia, persistido como JSON.
pub struct TokenCacheProvider {
    inner: ExpiringCacheProvider<CachedToken>,
}

impl TokenCacheProvider {
    /// Proveedor guardado en `accessToken-<audience>.json`
    pub fn new<F>(audience: &str, store: Arc<dyn DurableStore>, fetcher: F) -> Self
    where
        F: Fetcher<FetchedToken> + 'static,
    {
        Self::with_clock(
            format!("accessToken-{audience}.json"),
            store,
            fetcher,
            clock::system_clock(),
        )
    }

    pub fn with_clock<F>(
        storage_key: impl Into<String>,
        store: Arc<dyn DurableStore>,
        fetcher: F,
        clock: Clock,
    ) -> Self
    where
        F: Fetcher<FetchedToken> + 'static,
    {
        let fetcher: Arc<dyn Fetcher<FetchedToken>> = Arc::new(fetcher);
        let expiry_clock = clock.clone();
        let post_process_clock = clock;

        let inner = ExpiringCacheProvider::json(
            storage_key,
            store,
            move |token: &CachedToken| token.is_expired(expiry_clock()),
            move || {
                let fetcher = fetcher.clone();
                async move {
                    let token = fetcher.fetch().await?;
                    debug!("🔑 Nuevo token obtenido");
                    Ok::<_, anyhow::Error>(CachedToken::new(token))
                }
            },
        )
        .with_post_process(move |token: CachedToken| token.with_expiry(post_process_clock()));

        Self { inner }
    }

    pub async fn get_token(&self) -> Result<CachedToken, CacheError> {
        self.inner.get_data().await
    }

    pub async fn get_data(&self) -> Result<CachedToken, CacheError> {
        self.inner.get_data().await
    }

    /// Header `Authorization` listo para usar
    pub async fn authorization(&self) -> Result<String, CacheError> {
        Ok(self.get_token().await?.authorization_header())
    }

    pub fn storage_key(&self) -> &str {
        self.inner.storage_key()
    }
}
