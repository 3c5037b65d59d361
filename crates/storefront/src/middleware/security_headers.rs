//! Security headers middleware.
//!
//! Pages are plain server-rendered HTML with every asset served from our own
//! origin, so the policy is locked down to `'self'`.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

const CSP: &str = "default-src 'none'; \
                   script-src 'self'; \
                   style-src 'self'; \
                   font-src 'self'; \
                   img-src 'self' data:; \
                   connect-src 'self'; \
                   frame-src 'none'; \
                   object-src 'none'; \
                   base-uri 'self'; \
                   form-action 'self'; \
                   frame-ancestors 'none'";

const PERMISSIONS_POLICY: &str = "accelerometer=(), \
                                  camera=(), \
                                  display-capture=(), \
                                  geolocation=(), \
                                  gyroscope=(), \
                                  magnetometer=(), \
                                  microphone=(), \
                                  payment=(), \
                                  usb=()";

/// Add security headers to all responses.
///
/// HSTS is only sent when the public base URL is HTTPS.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let https = state.config().base_url.starts_with("https://");
    let mut response = next.run(request).await;
    apply(response.headers_mut(), https);
    response
}

fn apply(headers: &mut HeaderMap, https: bool) {
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(PERMISSIONS_POLICY),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Pages carry the visitor's cart and account details.
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    if https {
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsts_only_over_https() {
        let mut plain = HeaderMap::new();
        apply(&mut plain, false);
        assert!(!plain.contains_key(STRICT_TRANSPORT_SECURITY));
        assert_eq!(plain[X_FRAME_OPTIONS], "DENY");

        let mut secure = HeaderMap::new();
        apply(&mut secure, true);
        assert!(secure.contains_key(STRICT_TRANSPORT_SECURITY));
    }

    #[test]
    fn test_keeps_existing_cache_control() {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=60"));
        apply(&mut headers, false);
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=60");
    }
}
