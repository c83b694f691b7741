//! Page rendering, health and response headers.
//!
//! Run with: cargo test -p astro-tickets-integration-tests

use astro_tickets_integration_tests::TestApp;
use reqwest::StatusCode;

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_listing_pages_render() {
    let app = TestApp::spawn().await;

    let (status, events) = app.get("/events").await;
    assert_eq!(status, StatusCode::OK);
    assert!(events.contains("Abono Festival Astro 2026"));
    assert!(events.contains("Agotado"));
    assert!(!events.contains("Camiseta Astro Tour"));

    let (status, merch) = app.get("/merch").await;
    assert_eq!(status, StatusCode::OK);
    assert!(merch.contains("Camiseta Astro Tour"));
    assert!(merch.contains("Tu carrito está vacío"));

    let (status, home) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(home.contains("Destacados"));
}

#[tokio::test]
async fn test_location_page_carries_map_settings() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/location").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"data-lat="40.4169""#));
    assert!(body.contains("Sala Sol"));
    assert!(body.contains("marker-icon-2x.png"));
}

#[tokio::test]
async fn test_dashboard_and_data() {
    let app = TestApp::spawn().await;

    let (status, page) = app.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Ingresos Totales"));
    assert!(page.contains("60.800€"));
    assert!(page.contains("<svg"));

    let data: serde_json::Value = app
        .client
        .get(app.url("/admin/dashboard/data.json"))
        .send()
        .await
        .expect("GET request failed")
        .json()
        .await
        .expect("Dashboard data is not JSON");
    assert_eq!(data["sales"].as_array().map(Vec::len), Some(12));
    assert_eq!(data["categories"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_security_headers_and_nonce() {
    let app = TestApp::spawn().await;
    let resp = app
        .client
        .get(app.url("/contact"))
        .header("x-request-id", "test-request-42")
        .send()
        .await
        .expect("GET request failed");

    let header = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    assert_eq!(header("x-frame-options"), "DENY");
    assert_eq!(header("x-request-id"), "test-request-42");

    let csp = header("content-security-policy");
    let nonce = csp
        .split_whitespace()
        .find_map(|token| token.strip_prefix("'nonce-"))
        .map(|rest| rest.trim_end_matches(';').trim_end_matches('\'').to_string())
        .unwrap_or_default();
    assert!(!nonce.is_empty());
    assert!(csp.contains("https://*.tile.openstreetmap.org"));

    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains(&format!(r#"nonce="{nonce}""#)));
}

#[tokio::test]
async fn test_static_assets_served() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/static/js/map.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("scrollWheelZoom: false"));
}
