//! Integration tests for Astro Tickets.
//!
//! Each test spawns the full storefront router in-process on an ephemeral
//! port, next to a mock form backend that records what the contact form
//! sends. No external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p astro-tickets-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_flows` - Adding, removing and checking out through HTTP
//! - `contact_form` - Validation, submission and the WhatsApp redirect
//! - `pages` - Page rendering, health and security headers

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use astro_tickets_storefront::build_router;
use astro_tickets_storefront::config::StorefrontConfig;
use astro_tickets_storefront::state::AppState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use reqwest::Client;
use serde_json::Value;
use tokio::net::TcpListener;

/// Path of the form backend mock.
const FORM_PATH: &str = "/f/test-form";

/// Mock of the hosted form backend.
#[derive(Clone)]
pub struct FormBackend {
    pub url: String,
    received: Arc<Mutex<Vec<Value>>>,
}

impl FormBackend {
    /// Start a backend answering every submission with `status`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(status: StatusCode) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(FORM_PATH, post(record))
            .with_state((Arc::clone(&received), status));

        let addr = serve(app).await;
        Self {
            url: format!("http://{addr}{FORM_PATH}"),
            received,
        }
    }

    /// Payloads received so far.
    #[must_use]
    pub fn received(&self) -> Vec<Value> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn record(
    State((received, status)): State<(Arc<Mutex<Vec<Value>>>, StatusCode)>,
    Json(payload): Json<Value>,
) -> StatusCode {
    received
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(payload);
    status
}

/// A running storefront plus a cookie-keeping client.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub backend: FormBackend,
}

impl TestApp {
    /// Spawn with a form backend that accepts submissions.
    pub async fn spawn() -> Self {
        Self::spawn_with_backend(StatusCode::OK).await
    }

    /// Spawn with a form backend answering with `status`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration, catalog or listener cannot be set up.
    pub async fn spawn_with_backend(status: StatusCode) -> Self {
        let backend = FormBackend::start(status).await;
        let endpoint = backend.url.clone();

        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("http://127.0.0.1".to_string()),
            "STOREFRONT_CONTENT_DIR" => Some(storefront_dir("content")),
            "STOREFRONT_STATIC_DIR" => Some(storefront_dir("static")),
            "CONTACT_FORM_ENDPOINT" => Some(endpoint.clone()),
            "CONTACT_WHATSAPP_PHONE" => Some("34600111222".to_string()),
            _ => None,
        })
        .expect("Failed to build test configuration");

        let state = AppState::new(config).expect("Failed to initialize application state");
        let addr = serve(build_router(state)).await;

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address: format!("http://{addr}"),
            client,
            backend,
        }
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    /// GET a path and return status and body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn get(&self, path: &str) -> (reqwest::StatusCode, String) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed");
        let status = resp.status();
        (status, resp.text().await.expect("Failed to read response"))
    }

    /// POST a form as HTMX would and return the raw response.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Current cart totals from `/cart/summary.json`.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn cart_summary(&self) -> Value {
        self.client
            .get(self.url("/cart/summary.json"))
            .send()
            .await
            .expect("GET request failed")
            .json()
            .await
            .expect("Summary is not JSON")
    }
}

fn storefront_dir(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../storefront")
        .join(name)
        .display()
        .to_string()
}

/// Serve a router on an ephemeral port with peer addresses available.
async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server failed");
    });

    addr
}
