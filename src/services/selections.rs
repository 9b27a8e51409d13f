//! Persistence of the user's selected cities.
//!
//! The store only knows how to load and save the full list; `Selections`
//! serializes load-modify-save cycles behind a mutex so concurrent requests
//! cannot lose each other's updates.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::fs;
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::City;

/// Where selected cities are kept between requests and restarts.
#[async_trait]
pub trait SelectionStore: Send + Sync {
    async fn load(&self) -> Result<Vec<City>, AppError>;
    async fn save(&self, selections: &[City]) -> Result<(), AppError>;
}

/// Selections stored as a pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSelectionStore {
    path: PathBuf,
}

impl JsonFileSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next save is written to before being renamed over `path`.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SelectionStore for JsonFileSelectionStore {
    async fn load(&self) -> Result<Vec<City>, AppError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, selections: &[City]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(selections)?;
        // Readers see either the old file or the new one, never a partial write.
        let staging = self.staging_path();
        fs::write(&staging, json).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

/// Non-persistent store, used when no file path is wanted.
#[derive(Debug, Default)]
pub struct InMemorySelectionStore {
    cities: StdMutex<Vec<City>>,
}

#[async_trait]
impl SelectionStore for InMemorySelectionStore {
    async fn load(&self) -> Result<Vec<City>, AppError> {
        self.cities
            .lock()
            .map(|c| c.clone())
            .map_err(|_| AppError::InternalError("Selection store lock poisoned".to_string()))
    }

    async fn save(&self, selections: &[City]) -> Result<(), AppError> {
        let mut cities = self
            .cities
            .lock()
            .map_err(|_| AppError::InternalError("Selection store lock poisoned".to_string()))?;
        *cities = selections.to_vec();
        Ok(())
    }
}

/// Shared handle to the selection store.
#[derive(Clone)]
pub struct Selections {
    store: Arc<Mutex<Box<dyn SelectionStore>>>,
}

impl Selections {
    pub fn new(store: impl SelectionStore + 'static) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
        }
    }

    pub async fn list(&self) -> Result<Vec<City>, AppError> {
        self.store.lock().await.load().await
    }

    /// Add `city` unless a city with the same id is already selected.
    /// Returns whether the selection changed.
    pub async fn add(&self, city: City) -> Result<bool, AppError> {
        let store = self.store.lock().await;
        let mut cities = store.load().await?;
        if cities.iter().any(|c| c.id == city.id) {
            return Ok(false);
        }
        tracing::info!("Selecting city {} ({})", city.name, city.id);
        cities.push(city);
        store.save(&cities).await?;
        Ok(true)
    }

    /// Remove the city with `id`. Returns whether it was selected.
    pub async fn remove(&self, id: i64) -> Result<bool, AppError> {
        let store = self.store.lock().await;
        let mut cities = store.load().await?;
        let before = cities.len();
        cities.retain(|c| c.id != id);
        if cities.len() == before {
            return Ok(false);
        }
        tracing::info!("Removed city {} from selections", id);
        store.save(&cities).await?;
        Ok(true)
    }
}
