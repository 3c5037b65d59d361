//! Light/dark theme toggle.

use axum::{Form, response::Redirect};
use tower_sessions::Session;
use tracing::instrument;

use super::{ReturnTo, back_to};
use crate::error::Result;
use crate::services::visitor;

/// Flip the theme and return to the page the toggle was pressed on.
#[instrument(skip(session))]
pub async fn toggle(session: Session, Form(form): Form<ReturnTo>) -> Result<Redirect> {
    let theme = visitor::theme(&session).await?.toggled();
    visitor::set_theme(&session, theme).await?;
    tracing::debug!(theme = %theme, "Theme changed");
    Ok(back_to(form.next.as_deref(), "/"))
}
