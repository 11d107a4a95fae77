//! HTTP server for the dependency cache.
//!
//! This module implements the HTTP server that:
//! - Accepts GitHub webhook deliveries and applies them to the cache
//! - Serves the cache contents as JSON
//! - Provides a health check for liveness probes
//!
//! # Endpoints
//!
//! - `POST /` - Accepts GitHub webhook deliveries (returns 200 OK)
//! - `GET /` - Returns the cache snapshot as JSON
//! - `GET /health` - Returns 200 if the server is running
//!
//! Any other method on `/` is answered with 400 Bad Request.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use tower_http::trace::TraceLayer;

use crate::ingest::Ingest;
use crate::jenkins::BuildSystem;
use crate::webhooks::WebhookSecret;

pub mod health;
pub mod read;
pub mod webhook;

pub use health::health_handler;
pub use read::read_handler;
pub use webhook::webhook_handler;

/// A header name and the value a reader must send in it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken {
    header: String,
    value: String,
}

impl ApiToken {
    /// Returns `None` unless both the header name and the value are set.
    pub fn from_parts(header: impl Into<String>, value: impl Into<String>) -> Option<Self> {
        let header = header.into();
        let value = value.into();
        if header.is_empty() || value.is_empty() {
            None
        } else {
            Some(ApiToken { header, value })
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Whether the presented header value matches.
    pub fn accepts(&self, presented: Option<&str>) -> bool {
        presented == Some(self.value.as_str())
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiToken")
            .field("header", &self.header)
            .field("value", &"***")
            .finish()
    }
}

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<B> {
    inner: Arc<AppStateInner<B>>,
}

struct AppStateInner<B> {
    ingest: Ingest<B>,

    /// Deliveries are only verified when a secret is configured.
    webhook_secret: Option<WebhookSecret>,

    /// Reads are only authenticated when a token is configured.
    api_token: Option<ApiToken>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: BuildSystem> AppState<B> {
    pub fn new(
        ingest: Ingest<B>,
        webhook_secret: Option<WebhookSecret>,
        api_token: Option<ApiToken>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                ingest,
                webhook_secret,
                api_token,
            }),
        }
    }

    pub fn ingest(&self) -> &Ingest<B> {
        &self.inner.ingest
    }

    pub fn webhook_secret(&self) -> Option<&WebhookSecret> {
        self.inner.webhook_secret.as_ref()
    }

    pub fn api_token(&self) -> Option<&ApiToken> {
        self.inner.api_token.as_ref()
    }
}

async fn unsupported_method() -> StatusCode {
    StatusCode::BAD_REQUEST
}

/// Builds the axum Router with all endpoints.
pub fn build_router<B: BuildSystem>(app_state: AppState<B>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route(
            "/",
            post(webhook_handler::<B>)
                .get(read_handler::<B>)
                .fallback(unsupported_method),
        )
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
