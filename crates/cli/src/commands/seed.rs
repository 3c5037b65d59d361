//! Write a fresh seed snapshot.
//!
//! Seeding replaces every product, customer and order, so an existing file is
//! only overwritten with `--force`. Running servers pick up the new file on
//! their next request.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use ttd_store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("{} already exists; pass --force to replace it", .0.display())]
    Exists(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not remove old data file: {0}")]
    Io(#[from] std::io::Error),
}

/// Seed `path`.
///
/// # Errors
///
/// Returns [`SeedError::Exists`] when the file exists and `force` is false.
pub async fn run(path: &Path, force: bool) -> Result<(), SeedError> {
    if tokio::fs::try_exists(path).await? {
        if !force {
            return Err(SeedError::Exists(path.to_path_buf()));
        }
        info!(path = %path.display(), "Replacing existing data file");
        tokio::fs::remove_file(path).await?;
    }

    let store = Store::open(path).await?;
    let (products, users, orders) = store
        .read(|d| (d.products.len(), d.users.len(), d.orders.len()))
        .await?;
    info!(
        path = %path.display(),
        products,
        users,
        orders,
        "Seed data written"
    );
    Ok(())
}
