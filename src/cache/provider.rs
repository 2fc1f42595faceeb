use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::{future::Future, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::storage::DurableStore;

/// Origen de datos frescos para un proveedor de caché.
///
/// Cualquier `Fn() -> impl Future<Output = anyhow::Result<T>>` sirve.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<T>;
}

#[async_trait]
impl<T, F, Fut> Fetcher<T> for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    async fn fetch(&self) -> anyhow::Result<T> {
        (self)().await
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// El fetch falló; no hay valor seguro que servir en su lugar
    #[error("refreshing cached {key} failed")]
    RefreshFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

type DeserializeFn<T> = Box<dyn Fn(&[u8]) -> anyhow::Result<T> + Send + Sync>;
type SerializeFn<T> = Box<dyn Fn(&T) -> anyhow::Result<Vec<u8>> + Send + Sync>;
type PostProcessFn<T> = Box<dyn Fn(T) -> T + Send + Sync>;
type ExpiredFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Caché de un único valor con expiración derivada del propio valor.
///
/// Un proveedor gestiona exactamente un recurso lógico (el TOTD de hoy, el
/// token de una audiencia) guardado bajo una clave de un [`DurableStore`].
///
/// [`get_data`](Self::get_data):
///
/// 1. Si no hay valor en memoria, intenta cargarlo del almacenamiento. Un
///    slot vacío o corrupto cuenta como "sin valor" y solo se registra.
/// 2. Aplica `post_process` a lo cargado.
/// 3. Si sigue sin valor o `is_expired(valor)`, llama al fetcher, aplica
///    `post_process`, lo persiste y lo guarda en memoria.
///
/// El slot en memoria está protegido por un [`Mutex`] de tokio que se
/// mantiene durante todo el ciclo, así que llamadas concurrentes que ven el
/// valor expirado esperan a un único refresh y reciben su resultado.
pub struct ExpiringCacheProvider<T> {
    storage_key: String,
    store: Arc<dyn DurableStore>,
    deserialize: DeserializeFn<T>,
    post_process: PostProcessFn<T>,
    serialize: SerializeFn<T>,
    is_expired: ExpiredFn<T>,
    fetcher: Box<dyn Fetcher<T>>,
    slot: Mutex<Option<T>>,
}

impl<T> ExpiringCacheProvider<T>
where
    T: Clone + Send + 'static,
{
    pub fn new<D, S, E, F>(
        storage_key: impl Into<String>,
        store: Arc<dyn DurableStore>,
        deserialize: D,
        serialize: S,
        is_expired: E,
        fetcher: F,
    ) -> Self
    where
        D: Fn(&[u8]) -> anyhow::Result<T> + Send + Sync + 'static,
        S: Fn(&T) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
        E: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fetcher<T> + 'static,
    {
        Self {
            storage_key: storage_key.into(),
            store,
            deserialize: Box::new(deserialize),
            post_process: Box::new(|value: T| value),
            serialize: Box::new(serialize),
            is_expired: Box::new(is_expired),
            fetcher: Box::new(fetcher),
            slot: Mutex::new(None),
        }
    }

    /// Transformación aplicada tanto a lo leído del almacenamiento como a lo recién obtenido
    pub fn with_post_process<P>(mut self, post_process: P) -> Self
    where
        P: Fn(T) -> T + Send + Sync + 'static,
    {
        self.post_process = Box::new(post_process);
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Devuelve el valor en caché, refrescándolo si falta o ha expirado.
    ///
    /// # Errors
    ///
    /// [`CacheError::RefreshFailed`] si hacía falta refrescar y el fetcher falló.
    /// Nunca se sirve un valor expirado en su lugar.
    ///
    /// # Valores recién obtenidos
    ///
    /// Un valor cargado o guardado en memoria solo se devuelve si no ha
    /// expirado. Lo que acaba de devolver el fetcher se devuelve siempre, aunque
    /// `is_expired` ya lo dé por expirado (p. ej. un token sin expiración
    /// reconocible): se registra un warning, se persiste y la siguiente llamada
    /// vuelve a refrescar. No se reintenta en bucle dentro de la misma llamada.
    pub async fn get_data(&self) -> Result<T, CacheError> {
        let mut slot = self.slot.lock().await;

        if slot.is_none() {
            *slot = self.load().await;
        }

        match slot.as_ref() {
            Some(value) if !(self.is_expired)(value) => {
                debug!("✅ Cache hit para {}", self.storage_key);
                return Ok(value.clone());
            }
            Some(_) => info!("⏰ {} expirado, refrescando", self.storage_key),
            None => info!("❌ Sin datos en caché para {}, refrescando", self.storage_key),
        }

        let fresh = self
            .fetcher
            .fetch()
            .await
            .map_err(|source| CacheError::RefreshFailed {
                key: self.storage_key.clone(),
                source,
            })?;
        let fresh = (self.post_process)(fresh);

        if (self.is_expired)(&fresh) {
            warn!("⚠️ El valor recién obtenido para {} ya está expirado", self.storage_key);
        }

        self.persist(&fresh).await;
        *slot = Some(fresh.clone());

        Ok(fresh)
    }

    async fn load(&self) -> Option<T> {
        let bytes = match self.store.read(&self.storage_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read cached data from {}, fetching instead: {}", self.storage_key, e);
                return None;
            }
        };

        match (self.deserialize)(&bytes) {
            Ok(value) => Some((self.post_process)(value)),
            Err(e) => {
                warn!("Cached data in {} is unreadable, fetching instead: {:#}", self.storage_key, e);
                None
            }
        }
    }

    /// Un fallo al persistir no invalida el valor fresco: se registra y se sirve igual.
    async fn persist(&self, value: &T) {
        let bytes = match (self.serialize)(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("No se pudo serializar {}: {:#}", self.storage_key, e);
                return;
            }
        };

        match self.store.write(&self.storage_key, &bytes).await {
            Ok(()) => debug!("💾 {} persistido", self.storage_key),
            Err(e) => warn!("No se pudo persistir {}: {}", self.storage_key, e),
        }
    }
}

impl<T> ExpiringCacheProvider<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Proveedor que guarda el valor como JSON legible.
    pub fn json<E, F>(
        storage_key: impl Into<String>,
        store: Arc<dyn DurableStore>,
        is_expired: E,
        fetcher: F,
    ) -> Self
    where
        E: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fetcher<T> + 'static,
    {
        Self::new(
            storage_key,
            store,
            |bytes: &[u8]| Ok(serde_json::from_slice(bytes)?),
            |value: &T| Ok(serde_json::to_vec_pretty(value)?),
            is_expired,
            fetcher,
        )
    }
}
