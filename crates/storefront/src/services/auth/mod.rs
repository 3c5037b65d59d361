//! Authentication service.
//!
//! Sign-in is a stub: in mock mode any well-formed credentials are accepted
//! and the account is found or created in the store. In remote mode the auth
//! API decides, and the local account is linked by email or phone.

mod error;
pub mod remote;

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use rand::Rng;
use secrecy::SecretString;
use ttd_core::user::{Registration, User};
use ttd_core::validation::is_valid_otp;
use ttd_core::Email;
use ttd_store::{CustomerRepository, Store, StoreError};

pub use error::{AuthError, NETWORK_ERROR_MESSAGE};
pub use remote::{RemoteAuthClient, RemoteSession, RemoteUser};

use crate::config::AuthApiConfig;

/// How long an issued OTP stays valid.
pub const OTP_TTL: Duration = Duration::from_secs(5 * 60);

/// Minimum password length on the sign-in form.
pub const MIN_LOGIN_PASSWORD_LENGTH: usize = 6;

/// A signed-in account plus the remote API token, if any.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub token: Option<String>,
}

/// Result of asking for an OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpIssued {
    pub message: String,
    /// The code itself, only in mock mode so it can be logged.
    pub dev_code: Option<String>,
}

#[derive(Clone)]
enum Backend {
    Mock,
    Remote(RemoteAuthClient),
}

/// What we remember about an outstanding OTP.
#[derive(Clone)]
enum PendingOtp {
    Mock,
    Remote { otp_id: Option<String> },
}

/// Authentication service shared through `AppState`.
#[derive(Clone)]
pub struct AuthService {
    backend: Backend,
    store: Store,
    otps: Cache<String, PendingOtp>,
}

impl AuthService {
    /// # Errors
    ///
    /// Returns an error if the remote client cannot be built.
    pub fn new(config: &AuthApiConfig, store: Store) -> Result<Self, AuthError> {
        let backend = if config.use_mock {
            Backend::Mock
        } else {
            Backend::Remote(RemoteAuthClient::new(config)?)
        };
        Ok(Self {
            backend,
            store,
            otps: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(OTP_TTL)
                .build(),
        })
    }

    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self.backend, Backend::Mock)
    }

    fn customers(&self) -> CustomerRepository<'_> {
        CustomerRepository::new(&self.store)
    }

    /// Email + password sign-in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccountDisabled`] for deactivated accounts, or
    /// whatever the remote API reports.
    #[tracing::instrument(skip(self, password), fields(email = %email))]
    pub async fn login_with_email(
        &self,
        email: &Email,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<SignedIn, AuthError> {
        let token = match &self.backend {
            Backend::Mock => None,
            Backend::Remote(client) => Some(client.login(email.as_str(), password).await?.token),
        };
        self.ensure_not_disabled(email).await?;
        let user = self.customers().sign_in_with_email(email, now).await?;
        tracing::info!(user_id = %user.id, "Email sign-in");
        Ok(SignedIn { user, token })
    }

    /// Issue a one-time code for `phone` (ten digits, already validated).
    ///
    /// # Errors
    ///
    /// Returns whatever the remote API reports.
    #[tracing::instrument(skip(self))]
    pub async fn send_otp(&self, phone: &str) -> Result<OtpIssued, AuthError> {
        match &self.backend {
            Backend::Mock => {
                let code = format!("{:06}", rand::rng().random_range(0..1_000_000));
                tracing::info!(phone, code = %code, "Mock OTP issued");
                self.otps.insert(phone.to_owned(), PendingOtp::Mock).await;
                Ok(OtpIssued {
                    message: "OTP sent successfully".to_owned(),
                    dev_code: Some(code),
                })
            }
            Backend::Remote(client) => {
                let sent = client.send_otp(phone).await?;
                self.otps
                    .insert(
                        phone.to_owned(),
                        PendingOtp::Remote {
                            otp_id: sent.otp_id,
                        },
                    )
                    .await;
                Ok(OtpIssued {
                    message: sent
                        .message
                        .unwrap_or_else(|| "OTP sent successfully".to_owned()),
                    dev_code: None,
                })
            }
        }
    }

    /// Check a code and sign in.
    ///
    /// In mock mode any six-digit code is accepted as long as one was issued
    /// for this phone within [`OTP_TTL`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidOtp`], [`AuthError::OtpExpired`] or whatever
    /// the remote API reports.
    #[tracing::instrument(skip(self, otp))]
    pub async fn verify_otp(
        &self,
        phone: &str,
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedIn, AuthError> {
        if !is_valid_otp(otp) {
            return Err(AuthError::InvalidOtp);
        }
        let pending = self.otps.get(phone).await.ok_or(AuthError::OtpExpired)?;

        let (user, token) = match (&self.backend, pending) {
            (Backend::Remote(client), PendingOtp::Remote { otp_id }) => {
                let session = client.verify_otp(phone, otp.trim(), otp_id.as_deref()).await?;
                let profile = if session.user.email.is_some() {
                    session.user
                } else {
                    client.me(&session.token).await.unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Profile lookup failed, linking by phone");
                        RemoteUser::default()
                    })
                };
                let user = match profile.email.as_deref().map(Email::parse) {
                    Some(Ok(email)) => {
                        self.ensure_not_disabled(&email).await?;
                        self.customers().sign_in_with_email(&email, now).await?
                    }
                    _ => self.customers().sign_in_with_phone(phone, now).await?,
                };
                (user, Some(session.token))
            }
            _ => (self.customers().sign_in_with_phone(phone, now).await?, None),
        };
        if !user.is_active() {
            return Err(AuthError::AccountDisabled);
        }
        self.otps.invalidate(phone).await;
        tracing::info!(user_id = %user.id, "Phone sign-in");
        Ok(SignedIn { user, token })
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccountExists`] when the email is taken, or
    /// whatever the remote API reports.
    #[tracing::instrument(skip(self, registration, password), fields(email = %registration.email))]
    pub async fn register(
        &self,
        registration: Registration,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<SignedIn, AuthError> {
        match &self.backend {
            Backend::Mock => {
                let user = self
                    .customers()
                    .register(registration, now)
                    .await
                    .map_err(|e| match e {
                        StoreError::Conflict(_) => AuthError::AccountExists,
                        other => AuthError::Store(other),
                    })?;
                tracing::info!(user_id = %user.id, "Account registered");
                Ok(SignedIn { user, token: None })
            }
            Backend::Remote(client) => {
                let session = client
                    .register(
                        &registration.name,
                        registration.email.as_str(),
                        &registration.phone,
                        password,
                    )
                    .await?;
                let email = registration.email.clone();
                let user = match self.customers().register(registration, now).await {
                    Ok(user) => user,
                    // Already known locally: link to the existing account.
                    Err(StoreError::Conflict(_)) => {
                        self.customers().sign_in_with_email(&email, now).await?
                    }
                    Err(other) => return Err(other.into()),
                };
                Ok(SignedIn {
                    user,
                    token: Some(session.token),
                })
            }
        }
    }

    /// Tell the remote API the token is no longer in use. Failures are
    /// logged; the local session is cleared regardless.
    pub async fn logout(&self, token: Option<&str>) {
        if let (Backend::Remote(client), Some(token)) = (&self.backend, token)
            && let Err(e) = client.logout(token).await
        {
            tracing::warn!(error = %e, "Remote logout failed");
        }
    }

    async fn ensure_not_disabled(&self, email: &Email) -> Result<(), AuthError> {
        match self.customers().get_by_email(email.as_str()).await? {
            Some(user) if !user.is_active() => Err(AuthError::AccountDisabled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ttd_store::StoreData;
    use ttd_store::seed::{DEMO_EMAIL, seed_data};

    use super::*;

    fn mock_service() -> AuthService {
        let config = AuthApiConfig {
            use_mock: true,
            base_url: "http://localhost:3001/api/v1".to_owned(),
            api_key: None,
        };
        AuthService::new(&config, Store::in_memory(seed_data(Utc::now()))).unwrap()
    }

    #[tokio::test]
    async fn test_email_login_finds_existing_account() {
        let auth = mock_service();
        let email = Email::parse(DEMO_EMAIL).unwrap();
        let signed_in = auth
            .login_with_email(&email, &SecretString::from("whatever"), Utc::now())
            .await
            .unwrap();
        assert_eq!(signed_in.user.name, "Demo User");
        assert!(signed_in.token.is_none());
    }

    #[tokio::test]
    async fn test_email_login_creates_account() {
        let auth = mock_service();
        let email = Email::parse("new.person@example.com").unwrap();
        let signed_in = auth
            .login_with_email(&email, &SecretString::from("whatever"), Utc::now())
            .await
            .unwrap();
        assert_eq!(signed_in.user.email, email);
    }

    #[tokio::test]
    async fn test_disabled_account_is_refused() {
        let auth = mock_service();
        let disabled = auth
            .customers()
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|u| !u.is_active())
            .unwrap();
        let err = auth
            .login_with_email(&disabled.email, &SecretString::from("whatever"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_otp_requires_issued_code() {
        let auth = mock_service();
        let err = auth
            .verify_otp("9000012345", "123456", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OtpExpired));

        let issued = auth.send_otp("9000012345").await.unwrap();
        assert_eq!(issued.dev_code.as_ref().map(String::len), Some(6));

        let err = auth
            .verify_otp("9000012345", "12ab56", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOtp));

        let signed_in = auth
            .verify_otp("9000012345", "000000", Utc::now())
            .await
            .unwrap();
        assert_eq!(signed_in.user.phone, "9000012345");
        assert!(signed_in.user.email.as_str().ends_with("@mobile.ttdsoftware.in"));

        // Codes are single use.
        assert!(auth.verify_otp("9000012345", "000000", Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_otp_refuses_disabled_account() {
        let auth = mock_service();
        let disabled = auth
            .customers()
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|u| u.phone == "9123456780")
            .unwrap();
        assert!(!disabled.is_active());

        auth.send_otp("9123456780").await.unwrap();
        let err = auth
            .verify_otp("9123456780", "000000", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));

        let after = auth.customers().get(disabled.id).await.unwrap().unwrap();
        assert_eq!(after.last_login_at, disabled.last_login_at);
    }

    /// Auth API whose OTP replies carry no email and whose profile lookup fails.
    async fn remote_service_without_profile() -> AuthService {
        use axum::{Json, Router, http::StatusCode, routing::{get, post}};
        use serde_json::json;

        let app = Router::new()
            .route(
                "/api/v1/auth/send-otp",
                post(|| async { Json(json!({"message": "sent", "otpId": "otp-1"})) }),
            )
            .route(
                "/api/v1/auth/verify-otp",
                post(|| async { Json(json!({"user": {"phone": "9000054321"}, "token": "tok-9"})) }),
            )
            .route(
                "/api/v1/auth/me",
                get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "expired"}))) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = AuthApiConfig {
            use_mock: false,
            base_url: format!("http://{addr}/api/v1"),
            api_key: None,
        };
        AuthService::new(&config, Store::in_memory(seed_data(Utc::now()))).unwrap()
    }

    #[tokio::test]
    async fn test_remote_otp_links_by_phone_when_profile_fails() {
        let auth = remote_service_without_profile().await;
        assert!(!auth.is_mock());

        let issued = auth.send_otp("9000054321").await.unwrap();
        assert!(issued.dev_code.is_none());

        let signed_in = auth
            .verify_otp("9000054321", "123456", Utc::now())
            .await
            .unwrap();
        assert_eq!(signed_in.token.as_deref(), Some("tok-9"));
        assert_eq!(signed_in.user.phone, "9000054321");
        assert!(signed_in.user.email.as_str().ends_with("@mobile.ttdsoftware.in"));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let auth = mock_service();
        let registration = Registration {
            name: "Demo Again".to_owned(),
            email: Email::parse(DEMO_EMAIL).unwrap(),
            phone: "9000000001".to_owned(),
        };
        let err = auth
            .register(registration, &SecretString::from("Passw0rd"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountExists));
    }

    #[tokio::test]
    async fn test_register_new_account() {
        let auth = AuthService::new(
            &AuthApiConfig {
                use_mock: true,
                base_url: String::new(),
                api_key: None,
            },
            Store::in_memory(StoreData::default()),
        )
        .unwrap();
        let registration = Registration {
            name: "Meera Iyer".to_owned(),
            email: Email::parse("meera@example.com").unwrap(),
            phone: "9000000002".to_owned(),
        };
        let signed_in = auth
            .register(registration, &SecretString::from("Passw0rd"), Utc::now())
            .await
            .unwrap();
        assert_eq!(signed_in.user.name, "Meera Iyer");
    }
}
