//! Shop settings route handlers.
//!
//! Changes apply to carts and checkouts from the next request on; placed
//! orders keep the amounts they were charged.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::address::INDIAN_STATES;
use ttd_core::validation::FieldErrors;
use ttd_store::SettingsRepository;

use crate::error::Result;
use crate::filters;
use crate::forms::SettingsForm;
use crate::middleware::RequireAdminAuth;
use crate::models::{Chrome, Toast, flash};
use crate::state::AppState;

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub chrome: Chrome,
    pub form: SettingsForm,
    pub errors: FieldErrors,
    pub states: &'static [&'static str],
    pub data_file: String,
}

impl SettingsTemplate {
    fn is_state(&self, state: &&str) -> bool {
        self.form.home_state.eq_ignore_ascii_case(state)
    }
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(settings_page).post(save_settings))
}

/// Settings page handler.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn settings_page(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<SettingsTemplate> {
    let settings = SettingsRepository::new(state.store()).get().await?;

    Ok(SettingsTemplate {
        chrome,
        form: SettingsForm::from(&settings),
        errors: FieldErrors::new(),
        states: INDIAN_STATES,
        data_file: state.config().data_file.display().to_string(),
    })
}

/// Save settings.
#[instrument(skip(state, session, chrome, admin, form), fields(user_id = %admin.id))]
async fn save_settings(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let settings = match form.validate() {
        Ok(settings) => settings,
        Err(errors) => {
            let data_file = state.config().data_file.display().to_string();
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                SettingsTemplate {
                    chrome,
                    form,
                    errors,
                    states: INDIAN_STATES,
                    data_file,
                },
            )
                .into_response());
        }
    };

    tracing::info!(
        gst_rate = %settings.pricing.gst_rate,
        delivery_fee = %settings.pricing.delivery_fee,
        home_state = %settings.pricing.home_state,
        "Shop settings updated"
    );
    SettingsRepository::new(state.store())
        .update(settings)
        .await?;
    flash::push(&session, Toast::success("Settings saved")).await?;
    Ok(Redirect::to("/settings").into_response())
}
