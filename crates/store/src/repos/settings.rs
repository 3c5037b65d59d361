//! Shop-wide settings.

use tracing::instrument;

use crate::{Store, StoreError, StoreSettings};

pub struct SettingsRepository<'a> {
    store: &'a Store,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get(&self) -> Result<StoreSettings, StoreError> {
        self.store.read(|d| d.settings.clone()).await
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    #[instrument(skip(self, settings))]
    pub async fn update(&self, settings: StoreSettings) -> Result<(), StoreError> {
        self.store
            .write(|d| {
                d.settings = settings;
                Ok(())
            })
            .await?;
        tracing::info!("Store settings updated");
        Ok(())
    }
}
