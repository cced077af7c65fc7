//! Security Headers Middleware
//!
//! Adds hardening headers to every response. The API serves JSON only, so
//! the content security policy forbids everything; admin responses are
//! additionally marked uncacheable.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Request, Response},
};
use tower::{Layer, Service};

/// Paths whose responses must never be cached by browsers or proxies.
const NO_STORE_PREFIX: &str = "/api/admin";

/// Security headers configuration
#[derive(Clone, Debug)]
pub struct SecurityHeadersConfig {
    /// Send `Strict-Transport-Security` (HTTPS deployments only)
    pub enable_hsts: bool,
    pub hsts_max_age: u64,
    pub content_security_policy: String,
    pub referrer_policy: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enable_hsts: false,
            hsts_max_age: 31_536_000,
            content_security_policy: "default-src 'none'; frame-ancestors 'none'".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
        }
    }
}

impl SecurityHeadersConfig {
    /// HSTS is only sent in production, where TLS terminates in front of us.
    pub fn for_environment(is_production: bool) -> Self {
        Self {
            enable_hsts: is_production,
            ..Default::default()
        }
    }

    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        ];

        if self.enable_hsts {
            if let Ok(value) =
                HeaderValue::from_str(&format!("max-age={}; includeSubDomains", self.hsts_max_age))
            {
                headers.push((header::STRICT_TRANSPORT_SECURITY, value));
            }
        }
        if let Ok(value) = HeaderValue::from_str(&self.content_security_policy) {
            headers.push((header::CONTENT_SECURITY_POLICY, value));
        }
        if let Ok(value) = HeaderValue::from_str(&self.referrer_policy) {
            headers.push((header::REFERRER_POLICY, value));
        }
        headers
    }
}

/// Layer that adds security headers to responses
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl SecurityHeadersLayer {
    pub fn new(config: SecurityHeadersConfig) -> Self {
        Self {
            headers: Arc::new(config.headers()),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersMiddleware {
            inner,
            headers: self.headers.clone(),
        }
    }
}

/// Middleware service that adds security headers
#[derive(Clone)]
pub struct SecurityHeadersMiddleware<S> {
    inner: S,
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl<S> Service<Request<Body>> for SecurityHeadersMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let headers = self.headers.clone();
        let no_store = request.uri().path().starts_with(NO_STORE_PREFIX);

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            let response_headers = response.headers_mut();

            for (name, value) in headers.iter() {
                response_headers.insert(name.clone(), value.clone());
            }
            if no_store {
                response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            }

            Ok(response)
        })
    }
}

/// Security headers for the configured environment.
pub fn create_security_headers_layer(is_production: bool) -> SecurityHeadersLayer {
    SecurityHeadersLayer::new(SecurityHeadersConfig::for_environment(is_production))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    async fn ok() -> &'static str {
        "OK"
    }

    fn app(is_production: bool) -> Router {
        Router::new()
            .route("/health", get(ok))
            .route("/api/admin/me", get(ok))
            .layer(create_security_headers_layer(is_production))
    }

    async fn get_headers(app: Router, uri: &str) -> axum::http::HeaderMap {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().headers().clone()
    }

    #[tokio::test]
    async fn adds_baseline_headers() {
        let headers = get_headers(app(false), "/health").await;

        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(
            headers[header::CONTENT_SECURITY_POLICY],
            "default-src 'none'; frame-ancestors 'none'"
        );
        assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn production_sends_hsts() {
        let headers = get_headers(app(true), "/health").await;
        assert_eq!(
            headers[header::STRICT_TRANSPORT_SECURITY],
            "max-age=31536000; includeSubDomains"
        );
    }

    #[tokio::test]
    async fn admin_responses_are_not_cached() {
        let headers = get_headers(app(false), "/api/admin/me").await;
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    }
}
