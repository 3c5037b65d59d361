//! Data store for the TTD shop.
//!
//! There is no database. The catalog, coupons, customers and orders are
//! seeded from mock data and kept in memory behind a [`tokio::sync::RwLock`].
//! Every mutation is flushed to a pretty-printed JSON snapshot so the
//! storefront, the admin and the CLI share one data file.
//!
//! # Snapshot file
//!
//! The file is written to a temporary sibling and renamed into place. Before
//! each read or write the store compares the file's modification time with
//! the one it last loaded and reloads when another process has written since.
//!
//! # Repositories
//!
//! Access goes through small repositories borrowing the [`Store`]:
//!
//! ```ignore
//! let product = ProductRepository::new(&store).get_by_slug("boat-airdopes-141").await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod data;
pub mod repos;
pub mod seed;
mod snapshot;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;
use tokio::sync::RwLock;
use ttd_core::cart::CartError;
use ttd_core::order::OrderError;
use ttd_core::validation::FieldErrors;

pub use data::{StoreData, StoreSettings};
pub use repos::{
    CheckoutError, CouponRepository, CustomerRepository, OrderRepository, PlaceOrder,
    ProductDraft, ProductRepository, SettingsRepository,
};

/// Errors from store and repository operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the snapshot failed.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email or slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Submitted form data failed validation.
    #[error("invalid input")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Checkout(#[from] repos::CheckoutError),
}

impl From<FieldErrors> for StoreError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

struct Loaded {
    data: StoreData,
    /// Modification time of the snapshot when `data` was loaded or saved.
    mtime: Option<SystemTime>,
}

struct StoreInner {
    path: Option<PathBuf>,
    state: RwLock<Loaded>,
}

/// Shared handle to the store. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open the snapshot at `path`, seeding and writing it first when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let (data, mtime) = if tokio::fs::try_exists(&path).await? {
            let (data, mtime) = snapshot::load(&path).await?;
            tracing::info!(path = %path.display(), products = data.products.len(), orders = data.orders.len(), "Loaded store snapshot");
            (data, mtime)
        } else {
            let data = seed::seed_data(chrono::Utc::now());
            let mtime = snapshot::save(&path, &data).await?;
            tracing::info!(path = %path.display(), "Seeded new store snapshot");
            (data, Some(mtime))
        };
        Ok(Self::from_parts(Some(path), data, mtime))
    }

    /// A store that lives only in memory. Used by tests.
    #[must_use]
    pub fn in_memory(data: StoreData) -> Self {
        Self::from_parts(None, data, None)
    }

    fn from_parts(path: Option<PathBuf>, data: StoreData, mtime: Option<SystemTime>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path,
                state: RwLock::new(Loaded { data, mtime }),
            }),
        }
    }

    /// Path of the snapshot file, if persistent.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Run `f` against the current data.
    ///
    /// # Errors
    ///
    /// Returns an error if a newer snapshot exists but cannot be loaded.
    pub async fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> Result<R, StoreError> {
        if self.is_stale().await? {
            let mut guard = self.inner.state.write().await;
            self.reload_if_stale(&mut guard).await?;
        }
        let guard = self.inner.state.read().await;
        Ok(f(&guard.data))
    }

    /// Apply a mutation and flush the snapshot.
    ///
    /// `f` runs against a copy of the data; the copy replaces the live data
    /// only when `f` succeeds and the snapshot is written.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or an I/O error from the snapshot.
    pub async fn write<R>(
        &self,
        f: impl FnOnce(&mut StoreData) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut guard = self.inner.state.write().await;
        self.reload_if_stale(&mut guard).await?;

        let mut draft = guard.data.clone();
        let out = f(&mut draft)?;
        if let Some(path) = &self.inner.path {
            guard.mtime = Some(snapshot::save(path, &draft).await?);
        }
        guard.data = draft;
        Ok(out)
    }

    /// Replace all data, e.g. when re-seeding.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub async fn replace(&self, data: StoreData) -> Result<(), StoreError> {
        self.write(|current| {
            *current = data;
            Ok(())
        })
        .await
    }

    async fn is_stale(&self) -> Result<bool, StoreError> {
        let Some(path) = &self.inner.path else {
            return Ok(false);
        };
        let on_disk = snapshot::modified(path).await?;
        let loaded = self.inner.state.read().await.mtime;
        Ok(on_disk.is_some() && on_disk > loaded)
    }

    async fn reload_if_stale(&self, loaded: &mut Loaded) -> Result<(), StoreError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };
        let on_disk = snapshot::modified(path).await?;
        if on_disk.is_none() || on_disk <= loaded.mtime {
            return Ok(());
        }
        let (data, mtime) = snapshot::load(path).await?;
        tracing::debug!(path = %path.display(), "Reloaded store snapshot written by another process");
        loaded.data = data;
        loaded.mtime = mtime;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_seeds_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = Store::open(&path).await.unwrap();
        assert!(path.exists());
        let products = store.read(|d| d.products.len()).await.unwrap();
        assert!(products > 0);
    }

    #[tokio::test]
    async fn test_writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = Store::open(&path).await.unwrap();
        store
            .write(|d| {
                d.settings.low_stock_threshold = 7;
                Ok(())
            })
            .await
            .unwrap();

        let reopened = Store::open(&path).await.unwrap();
        let threshold = reopened
            .read(|d| d.settings.low_stock_threshold)
            .await
            .unwrap();
        assert_eq!(threshold, 7);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_data_untouched() {
        let store = Store::in_memory(seed::seed_data(chrono::Utc::now()));
        let before = store.read(|d| d.products.len()).await.unwrap();
        let result: Result<(), StoreError> = store
            .write(|d| {
                d.products.clear();
                Err(StoreError::NotFound)
            })
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
        assert_eq!(store.read(|d| d.products.len()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_reloads_snapshot_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let storefront = Store::open(&path).await.unwrap();
        let admin = Store::open(&path).await.unwrap();

        // Make sure the second write lands on a later mtime.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        admin
            .write(|d| {
                d.settings.low_stock_threshold = 3;
                Ok(())
            })
            .await
            .unwrap();

        let seen = storefront
            .read(|d| d.settings.low_stock_threshold)
            .await
            .unwrap();
        assert_eq!(seen, 3);
    }
}
