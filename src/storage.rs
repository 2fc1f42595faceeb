use async_trait::async_trait;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Errores del almacenamiento duradero
#[derive(Debug, Error)]
pub enum StoreError {
    /// No hay nada guardado bajo esta clave. Para el caché es un miss, no un fallo.
    #[error("no stored value for {key}")]
    NotFound { key: String },

    #[error("storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Primitiva de almacenamiento de un solo valor por clave.
///
/// Cada escritura reemplaza el contenido completo (la última gana). Da igual
/// si detrás hay un archivo o una fila de base de datos.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Almacenamiento basado en archivos: una clave es un archivo dentro de `data_dir`
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub async fn new(data_dir: PathBuf) -> Result<Self, StoreError> {
        // Crear directorio de datos si no existe
        fs::create_dir_all(&data_dir)
            .await
            .map_err(|source| StoreError::Io {
                key: data_dir.display().to_string(),
                source,
            })?;

        info!("📁 Storage inicializado en: {}", data_dir.display());

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(key)
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let file_path = self.file_path(key);
        match fs::read(&file_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let file_path = self.file_path(key);

        // Escribir a un temporal y renombrar: un lector nunca ve un archivo a medias
        let tmp_path = self.data_dir.join(format!(".{key}.tmp"));
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        fs::write(&tmp_path, bytes).await.map_err(io_err)?;
        fs::rename(&tmp_path, &file_path).await.map_err(io_err)?;

        debug!("💾 {} bytes guardados en {}", bytes.len(), file_path.display());
        Ok(())
    }
}

/// Almacenamiento en memoria, útil para pruebas y para ejecuciones sin disco
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: std::sync::Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.slots
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.slots.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
