//! One-shot toast notifications carried across a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastVariant {
    Success,
    Error,
    Info,
}

impl ToastVariant {
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Error => "toast-error",
            Self::Info => "toast-info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            variant: ToastVariant::Success,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            variant: ToastVariant::Error,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            variant: ToastVariant::Info,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Queue a toast for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn push(session: &Session, toast: Toast) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<Toast> = session.get(keys::FLASH).await?.unwrap_or_default();
    pending.push(toast);
    session.insert(keys::FLASH, pending).await
}

/// Remove and return every queued toast.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn take(session: &Session) -> Result<Vec<Toast>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Toast>>(keys::FLASH)
        .await?
        .unwrap_or_default())
}
