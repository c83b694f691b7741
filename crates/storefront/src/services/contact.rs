//! Contact form delivery to the third-party form backend.
//!
//! One POST per valid submission; any 2xx counts as delivered. There is no
//! retry: a failure is shown to the visitor together with the WhatsApp
//! alternative.

use astro_tickets_core::{ContactForm, ContactPayload};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::ContactConfig;

/// Body used for the WhatsApp message when the visitor left it empty.
const DEFAULT_WHATSAPP_BODY: &str = "Quisiera más información sobre tus servicios.";
const PLACEHOLDER: &str = "A completar";

/// Errors that can occur when delivering a contact submission.
#[derive(Debug, Error)]
pub enum ContactError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Form backend error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Client for the form backend.
#[derive(Debug, Clone)]
pub struct ContactClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ContactClient {
    /// Create a new contact client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ContactConfig) -> Result<Self, ContactError> {
        let mut headers = HeaderMap::new();
        // Ask for a JSON answer instead of the backend's HTML thank-you redirect
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Deliver a payload.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-2xx response.
    pub async fn submit(&self, payload: &ContactPayload) -> Result<(), ContactError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContactError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Build the `wa.me` link for the WhatsApp fallback.
///
/// Works with a partially filled form: blank fields get placeholders.
#[must_use]
pub fn whatsapp_link(phone: &str, form: &ContactForm) -> String {
    let or_placeholder = |value: &str, placeholder: &'static str| {
        if value.is_empty() {
            placeholder.to_string()
        } else {
            value.to_string()
        }
    };

    let text = format!(
        "Hola Alberto!\n\n\
         Me interesa hablar contigo sobre un proyecto web.\n\n\
         {}\n\n\
         Mis datos:\n\
         Nombre: {}\n\
         Email: {}\n\n\
         ¿Podemos tomar un café y hablar del proyecto?",
        or_placeholder(&form.message, DEFAULT_WHATSAPP_BODY),
        or_placeholder(&form.name, PLACEHOLDER),
        or_placeholder(&form.email, PLACEHOLDER),
    );

    format!("https://wa.me/{phone}?text={}", urlencoding::encode(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_link_placeholders() {
        let link = whatsapp_link("34641607924", &ContactForm::default());
        let text = link
            .strip_prefix("https://wa.me/34641607924?text=")
            .map(|encoded| urlencoding::decode(encoded).map(|t| t.into_owned()));

        let Some(Ok(text)) = text else {
            panic!("unexpected link: {link}");
        };
        assert!(text.starts_with("Hola Alberto!\n\n"));
        assert!(text.contains(DEFAULT_WHATSAPP_BODY));
        assert!(text.contains("Nombre: A completar\n"));
        assert!(text.contains("Email: A completar\n"));
    }

    #[test]
    fn test_whatsapp_link_uses_form_values() {
        let form = ContactForm {
            name: "Ana".to_string(),
            email: String::new(),
            message: "Quiero una tienda & blog".to_string(),
        };
        let link = whatsapp_link("34600111222", &form);

        assert!(link.contains("Quiero%20una%20tienda%20%26%20blog"));
        assert!(link.contains("Nombre%3A%20Ana"));
        assert!(!link.contains(' '));
    }
}
