//! Client for the remote auth API.
//!
//! Used only when `USE_MOCK_API=false`. Every call maps a non-success
//! response to [`AuthError::Rejected`] carrying the server's `message`, or
//! the supplied fallback when the body has none.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::AuthError;
use crate::config::AuthApiConfig;

/// User record as returned by the API. Every field is optional so that
/// unexpected payload shapes still deserialize.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Successful login, OTP verification or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSession {
    #[serde(default)]
    pub user: RemoteUser,
    pub token: String,
    #[serde(default, rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Reply to a send-OTP request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OtpSent {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "otpId")]
    pub otp_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SendOtpBody {
    phone: String,
}

#[derive(Serialize)]
struct VerifyOtpBody<'a> {
    phone: String,
    otp: &'a str,
    #[serde(rename = "otpId", skip_serializing_if = "Option::is_none")]
    otp_id: Option<&'a str>,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    phone: String,
    password: &'a str,
}

/// The API expects E.164 numbers.
fn international(phone: &str) -> String {
    format!("+91{phone}")
}

#[derive(Clone)]
pub struct RemoteAuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteAuthClient {
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &AuthApiConfig) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key.expose_secret())
                .map_err(|_| AuthError::Rejected("Invalid API key format".to_owned()))?;
            headers.insert("x-api-key", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] or [`AuthError::Network`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<RemoteSession, AuthError> {
        let body = LoginBody {
            email,
            password: password.expose_secret(),
        };
        self.post("/auth/login", &body, "Login failed. Please check your credentials.")
            .await
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] or [`AuthError::Network`].
    #[instrument(skip(self))]
    pub async fn send_otp(&self, phone: &str) -> Result<OtpSent, AuthError> {
        let body = SendOtpBody {
            phone: international(phone),
        };
        self.post("/auth/send-otp", &body, "Failed to send OTP. Please try again.")
            .await
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] or [`AuthError::Network`].
    #[instrument(skip(self, otp))]
    pub async fn verify_otp(
        &self,
        phone: &str,
        otp: &str,
        otp_id: Option<&str>,
    ) -> Result<RemoteSession, AuthError> {
        let body = VerifyOtpBody {
            phone: international(phone),
            otp,
            otp_id,
        };
        self.post("/auth/verify-otp", &body, "Invalid OTP. Please try again.")
            .await
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] or [`AuthError::Network`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password: &SecretString,
    ) -> Result<RemoteSession, AuthError> {
        let body = RegisterBody {
            name,
            email,
            phone: international(phone),
            password: password.expose_secret(),
        };
        self.post("/auth/register", &body, "Registration failed. Please try again.")
            .await
    }

    /// Invalidate a token. The body of the reply is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the request cannot be sent.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.client
            .post(format!("{}/auth/logout", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Ok(())
    }

    /// Fetch the profile behind a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] or [`AuthError::Network`].
    #[instrument(skip_all)]
    pub async fn me(&self, token: &str) -> Result<RemoteUser, AuthError> {
        let response = self
            .client
            .get(format!("{}/auth/me", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;
        Self::decode(response, "Session expired. Please sign in again.").await
    }

    async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, AuthError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        Self::decode(response, fallback).await
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, AuthError> {
        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Auth API refused request");
            return Err(AuthError::Rejected(
                body.message.unwrap_or_else(|| fallback.to_owned()),
            ));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    use super::*;

    /// Serve a fake auth API on an ephemeral port.
    async fn fake_api() -> String {
        let app = Router::new()
            .route(
                "/api/v1/auth/login",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == "secret123" {
                        (
                            StatusCode::OK,
                            Json(json!({
                                "user": {"name": "Remote Person", "email": body["email"]},
                                "token": "tok-1"
                            })),
                        )
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"message": "Wrong password"})),
                        )
                    }
                }),
            )
            .route(
                "/api/v1/auth/send-otp",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["phone"], "+919876543210");
                    Json(json!({"success": true, "message": "sent", "otpId": "otp-7"}))
                }),
            )
            .route(
                "/api/v1/auth/register",
                post(|| async { (StatusCode::BAD_REQUEST, "not json") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/v1")
    }

    fn client(base_url: String) -> RemoteAuthClient {
        RemoteAuthClient::new(&AuthApiConfig {
            use_mock: false,
            base_url,
            api_key: Some(SecretString::from("key")),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_success_and_server_message() {
        let api = client(fake_api().await);

        let session = api
            .login("a@b.in", &SecretString::from("secret123"))
            .await
            .unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.user.name.as_deref(), Some("Remote Person"));

        let err = api
            .login("a@b.in", &SecretString::from("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Wrong password");
    }

    #[tokio::test]
    async fn test_send_otp_prefixes_country_code() {
        let api = client(fake_api().await);
        let sent = api.send_otp("9876543210").await.unwrap();
        assert_eq!(sent.otp_id.as_deref(), Some("otp-7"));
    }

    #[tokio::test]
    async fn test_error_without_message_uses_fallback() {
        let api = client(fake_api().await);
        let err = api
            .register("A", "a@b.in", "9876543210", &SecretString::from("Passw0rd"))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Registration failed. Please try again.");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(format!("http://{addr}/api/v1"));
        let err = api.send_otp("9876543210").await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert_eq!(err.public_message(), super::super::error::NETWORK_ERROR_MESSAGE);
    }
}
