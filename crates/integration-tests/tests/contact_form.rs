//! Contact form validation, submission and the WhatsApp fallback.
//!
//! Run with: cargo test -p astro-tickets-integration-tests

use astro_tickets_integration_tests::TestApp;
use reqwest::StatusCode;

const VALID: [(&str, &str); 3] = [
    ("name", "Ana López"),
    ("email", "ana@example.com"),
    ("message", "Me gustaría reservar entradas para un grupo de diez."),
];

#[tokio::test]
async fn test_valid_submission_reaches_backend() {
    let app = TestApp::spawn().await;

    let resp = app.htmx_post("/contact", &VALID).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("✅ ¡Enviado!"));
    assert!(body.contains("load delay:5s"));
    // Fields are reset after success.
    assert!(!body.contains("Ana López"));

    let received = app.backend.received();
    assert_eq!(received.len(), 1);
    let payload = &received[0];
    assert_eq!(payload["name"], "Ana López");
    assert_eq!(payload["email"], "ana@example.com");
    assert_eq!(payload["_replyto"], "ana@example.com");
    assert_eq!(payload["_subject"], "💼 Consulta de Proyecto Web - Ana López");
}

#[tokio::test]
async fn test_backend_failure_shows_error_state() {
    let app = TestApp::spawn_with_backend(axum::http::StatusCode::INTERNAL_SERVER_ERROR).await;

    let body = app
        .htmx_post("/contact", &VALID)
        .await
        .text()
        .await
        .expect("Failed to read response");

    assert!(body.contains("❌ Error"));
    assert!(body.contains("load delay:3s"));
    assert!(body.contains("WhatsApp"));
    // Values are kept so the visitor can retry.
    assert!(body.contains("Ana López"));
    assert_eq!(app.backend.received().len(), 1);
}

#[tokio::test]
async fn test_invalid_submission_is_not_sent() {
    let app = TestApp::spawn().await;

    let body = app
        .htmx_post(
            "/contact",
            &[("name", " Al "), ("email", "ana@example"), ("message", "Hola")],
        )
        .await
        .text()
        .await
        .expect("Failed to read response");

    assert!(body.contains("El nombre debe tener al menos 3 caracteres."));
    assert!(body.contains("Por favor, introduce un correo electrónico válido."));
    assert!(body.contains("El mensaje es demasiado corto (mínimo 10 caracteres)."));
    assert!(body.contains("Enviar Email"));
    assert!(app.backend.received().is_empty());
}

#[tokio::test]
async fn test_blur_validation() {
    let app = TestApp::spawn().await;

    // Nothing typed yet: no validation.
    let resp = app
        .htmx_post("/contact/validate", &[("name", ""), ("email", ""), ("message", "")])
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .htmx_post("/contact/validate", &[("name", "Ana"), ("email", "mal"), ("message", "")])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains(r#"id="error-email""#));
    assert!(body.contains("Por favor, introduce un correo electrónico válido."));
    assert!(!body.contains("El nombre debe tener"));
}

#[tokio::test]
async fn test_reset_form_keeps_values() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/contact/form?name=Ana&email=ana%40example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"value="Ana""#));
    assert!(body.contains("Enviar Email"));
    assert!(!body.contains("load delay"));
}

#[tokio::test]
async fn test_whatsapp_redirect() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/contact/whatsapp?name=Ana&message=Hola"))
        .send()
        .await
        .expect("GET request failed");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(location.starts_with("https://wa.me/34600111222?text="));
    assert!(location.contains("Nombre%3A%20Ana"));
    assert!(location.contains("A%20completar"));
}
