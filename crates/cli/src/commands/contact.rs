//! Contact submission preview.

use astro_tickets_core::{ContactForm, FieldErrors};
use astro_tickets_storefront::services::whatsapp_link;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContactPreviewError {
    #[error("Invalid submission: {}", describe(.0))]
    Invalid(FieldErrors),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

fn describe(errors: &FieldErrors) -> String {
    [errors.name, errors.email, errors.message]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate a submission, then log its JSON payload and WhatsApp link.
///
/// The WhatsApp link is logged even for invalid input, matching the
/// storefront, where it works on a partially filled form.
///
/// # Errors
///
/// Returns an error if validation fails.
pub fn preview(
    name: String,
    email: String,
    message: String,
    phone: &str,
) -> Result<(), ContactPreviewError> {
    let form = ContactForm {
        name,
        email,
        message,
    };

    tracing::info!("WhatsApp: {}", whatsapp_link(phone, &form));

    let submission = form.validate().map_err(ContactPreviewError::Invalid)?;
    let payload = serde_json::to_string_pretty(&submission.payload())?;
    tracing::info!("Payload:\n{payload}");
    Ok(())
}
