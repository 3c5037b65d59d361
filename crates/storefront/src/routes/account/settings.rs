//! Account settings: profile, password and notification preferences.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::user::{NotificationPreferences, PasswordChangeInput, ProfileInput, User};
use ttd_core::validation::FieldErrors;
use ttd_store::{CustomerRepository, StoreError};

use super::load_user;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Chrome, CurrentCustomer, Toast, flash, session_keys};
use crate::state::AppState;

const SETTINGS_PATH: &str = "/account/settings";

/// Notification checkboxes. Unticked boxes are absent from the post.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsForm {
    pub email_notifications: Option<String>,
    pub sms_notifications: Option<String>,
    pub push_notifications: Option<String>,
    pub order_updates: Option<String>,
    pub promotions: Option<String>,
    pub newsletter: Option<String>,
}

impl From<NotificationsForm> for NotificationPreferences {
    fn from(form: NotificationsForm) -> Self {
        Self {
            email_notifications: form.email_notifications.is_some(),
            sms_notifications: form.sms_notifications.is_some(),
            push_notifications: form.push_notifications.is_some(),
            order_updates: form.order_updates.is_some(),
            promotions: form.promotions.is_some(),
            newsletter: form.newsletter.is_some(),
        }
    }
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/settings.html")]
pub struct SettingsTemplate {
    pub chrome: Chrome,
    pub profile: ProfileInput,
    pub preferences: NotificationPreferences,
    /// Errors for whichever form was just submitted.
    pub errors: FieldErrors,
}

impl SettingsTemplate {
    fn new(chrome: Chrome, user: &User) -> Self {
        Self {
            chrome,
            profile: ProfileInput {
                name: user.name.clone(),
                email: user.email.to_string(),
                phone: user.phone.clone(),
            },
            preferences: user.preferences,
            errors: FieldErrors::new(),
        }
    }

    fn rejected(mut self, errors: FieldErrors) -> Response {
        self.errors = errors;
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

/// Display the settings page.
#[instrument(skip(state, chrome, customer), fields(user_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
) -> Result<SettingsTemplate> {
    let user = load_user(&state, customer.id).await?;
    Ok(SettingsTemplate::new(chrome, &user))
}

/// Update name, email and phone.
///
/// The session copy of the customer is refreshed so the header greeting
/// follows the new name.
#[instrument(skip(state, session, chrome, customer, form), fields(user_id = %customer.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<ProfileInput>,
) -> Result<Response> {
    let user = load_user(&state, customer.id).await?;
    let mut page = SettingsTemplate::new(chrome, &user);

    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            page.profile = form;
            return Ok(page.rejected(errors));
        }
    };

    match CustomerRepository::new(state.store())
        .update_profile(customer.id, update)
        .await
    {
        Ok(user) => {
            session
                .insert(
                    session_keys::CURRENT_CUSTOMER,
                    CurrentCustomer::from_user(&user, customer.token),
                )
                .await?;
            flash::push(&session, Toast::success("Profile updated")).await?;
            Ok(Redirect::to(SETTINGS_PATH).into_response())
        }
        Err(StoreError::Conflict(message)) => {
            let mut errors = FieldErrors::new();
            errors.add("email", message);
            page.profile = form;
            Ok(page.rejected(errors))
        }
        Err(e) => Err(e.into()),
    }
}

/// Validate a password change. Passwords are held by the auth provider,
/// so a valid form is only acknowledged.
#[instrument(skip(state, session, chrome, customer, form), fields(user_id = %customer.id))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<PasswordChangeInput>,
) -> Result<Response> {
    if let Err(errors) = form.validate() {
        let user = load_user(&state, customer.id).await?;
        return Ok(SettingsTemplate::new(chrome, &user).rejected(errors));
    }

    tracing::info!("Password change acknowledged");
    flash::push(&session, Toast::success("Password updated")).await?;
    Ok(Redirect::to(SETTINGS_PATH).into_response())
}

/// Save notification preferences.
#[instrument(skip(state, session, customer, form), fields(user_id = %customer.id))]
pub async fn update_notifications(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<NotificationsForm>,
) -> Result<Redirect> {
    CustomerRepository::new(state.store())
        .update_preferences(customer.id, form.into())
        .await?;
    flash::push(&session, Toast::success("Notification preferences saved")).await?;
    Ok(Redirect::to(SETTINGS_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unticked_boxes_are_off() {
        let prefs = NotificationPreferences::from(NotificationsForm {
            order_updates: Some("on".to_owned()),
            newsletter: Some("on".to_owned()),
            ..NotificationsForm::default()
        });
        assert!(prefs.order_updates);
        assert!(prefs.newsletter);
        assert!(!prefs.email_notifications);
        assert!(!prefs.sms_notifications);
        assert!(!prefs.push_notifications);
        assert!(!prefs.promotions);
    }
}
