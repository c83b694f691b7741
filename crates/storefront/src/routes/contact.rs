//! Contact form route handlers.
//!
//! The form is one HTMX fragment that replaces itself on submit. Its status
//! (idle, submitting, success, error) decides the button label and which
//! controls are disabled; success and error schedule a reload of the idle
//! form through `hx-trigger="load delay:…"`.

use askama::Template;
use askama_web::WebTemplate;
use astro_tickets_core::{ContactForm, FieldErrors, SubmissionStatus};
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::CspNonce;
use crate::services::whatsapp_link;
use crate::state::AppState;

/// Contact form display data.
pub struct ContactFormView {
    pub form: ContactForm,
    pub errors: FieldErrors,
    pub status: SubmissionStatus,
    /// Seconds until the idle form is reloaded, for success and error.
    pub reset_secs: Option<u64>,
}

impl ContactFormView {
    #[must_use]
    pub fn new(form: ContactForm, errors: FieldErrors, status: SubmissionStatus) -> Self {
        Self {
            form,
            errors,
            status,
            reset_secs: status.reset_after().map(|d| d.as_secs()),
        }
    }

    #[must_use]
    pub fn idle(form: ContactForm) -> Self {
        Self::new(form, FieldErrors::default(), SubmissionStatus::Idle)
    }

    /// Label shown while a request is in flight.
    #[must_use]
    pub const fn submitting_label(&self) -> &'static str {
        SubmissionStatus::Submitting.button_label()
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact/show.html")]
pub struct ContactShowTemplate {
    pub contact: ContactFormView,
    pub nonce: String,
}

/// Contact form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/contact_form.html")]
pub struct ContactFormTemplate {
    pub contact: ContactFormView,
}

/// Out-of-band field error spans (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/field_errors.html")]
pub struct FieldErrorsTemplate {
    pub errors: FieldErrors,
}

/// Display the contact page.
#[instrument(skip(nonce))]
pub async fn show(CspNonce(nonce): CspNonce) -> impl IntoResponse {
    ContactShowTemplate {
        contact: ContactFormView::idle(ContactForm::default()),
        nonce,
    }
}

/// Submit the contact form.
///
/// Invalid input re-renders the form with per-field errors and sends
/// nothing. A valid form is posted to the form backend once; the outcome
/// becomes the success or error status.
#[instrument(skip(state, headers, nonce, form))]
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    CspNonce(nonce): CspNonce,
    Form(form): Form<ContactForm>,
) -> Response {
    let contact = match form.validate() {
        Err(errors) => {
            tracing::debug!("Contact form rejected by validation");
            ContactFormView::new(form, errors, SubmissionStatus::Idle)
        }
        Ok(submission) => match state.contact().submit(&submission.payload()).await {
            Ok(()) => {
                tracing::info!(domain = submission.email.domain(), "Contact form sent");
                add_breadcrumb("contact", "Contact form sent", None);
                ContactFormView::new(
                    ContactForm::default(),
                    FieldErrors::default(),
                    SubmissionStatus::Success,
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send contact form");
                ContactFormView::new(form, FieldErrors::default(), SubmissionStatus::Error)
            }
        },
    };

    if headers.contains_key("hx-request") {
        ContactFormTemplate { contact }.into_response()
    } else {
        ContactShowTemplate { contact, nonce }.into_response()
    }
}

/// Validate the form on field blur (HTMX).
///
/// Nothing is re-validated while every field is still empty.
#[instrument(skip(form))]
pub async fn validate(Form(form): Form<ContactForm>) -> Response {
    if !form.has_input() {
        return StatusCode::NO_CONTENT.into_response();
    }

    FieldErrorsTemplate {
        errors: form.errors(),
    }
    .into_response()
}

/// The idle form, keeping any values carried in the query (HTMX).
#[instrument(skip(form))]
pub async fn form(Query(form): Query<ContactForm>) -> impl IntoResponse {
    ContactFormTemplate {
        contact: ContactFormView::idle(form),
    }
}

/// Redirect to WhatsApp with the form contents as the message.
#[instrument(skip(state, form))]
pub async fn whatsapp(
    State(state): State<AppState>,
    Query(form): Query<ContactForm>,
) -> Redirect {
    Redirect::to(&whatsapp_link(
        &state.config().contact.whatsapp_phone,
        &form,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_delays() {
        let success = ContactFormView::new(
            ContactForm::default(),
            FieldErrors::default(),
            SubmissionStatus::Success,
        );
        assert_eq!(success.reset_secs, Some(5));

        let error = ContactFormView::new(
            ContactForm::default(),
            FieldErrors::default(),
            SubmissionStatus::Error,
        );
        assert_eq!(error.reset_secs, Some(3));

        assert_eq!(ContactFormView::idle(ContactForm::default()).reset_secs, None);
    }

    #[test]
    fn test_invalid_form_renders_errors() {
        let form = ContactForm {
            name: "Al".to_string(),
            email: "nope".to_string(),
            message: "Hola".to_string(),
        };
        let errors = form.errors();
        let html = FieldErrorsTemplate { errors }.render().unwrap_or_default();

        assert!(html.contains("El nombre debe tener al menos 3 caracteres."));
        assert!(html.contains("hx-swap-oob"));
    }
}
