//! Order export.

use std::path::Path;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use ttd_core::OrderStatus;
use ttd_core::order::AdminOrderFilter;
use ttd_store::{Store, StoreData, StoreError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0}")]
    InvalidStatus(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not encode orders: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Pretty JSON array of the matching orders, newest first.
///
/// # Errors
///
/// Returns an error if the orders cannot be encoded.
pub fn render(data: &StoreData, status: Option<OrderStatus>) -> Result<String, serde_json::Error> {
    let filter = AdminOrderFilter {
        status,
        ..AdminOrderFilter::default()
    };
    serde_json::to_string_pretty(&filter.apply(&data.orders))
}

/// Export orders to `out`, or stdout when `out` is `None`.
///
/// # Errors
///
/// Returns an error for an unknown status or if the export cannot be written.
pub async fn export(
    path: &Path,
    out: Option<&Path>,
    status: Option<&str>,
) -> Result<(), ExportError> {
    let status = status
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(ExportError::InvalidStatus)?;

    let store = Store::open(path).await?;
    let (json, count) = store
        .read(|d| {
            let count = d
                .orders
                .iter()
                .filter(|o| status.is_none_or(|s| o.order_status == s))
                .count();
            render(d, status).map(|json| (json, count))
        })
        .await??;

    match out {
        Some(file) => {
            tokio::fs::write(file, format!("{json}\n")).await?;
            tracing::info!(file = %file.display(), count, "Orders exported");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
            tracing::info!(count, "Orders exported");
        }
    }
    Ok(())
}
