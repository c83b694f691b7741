//! Contact form validation, outbound payload and submission status.
//!
//! Validation runs on submit and again whenever a field loses focus (as
//! long as the visitor has typed something). The payload shape is what the
//! third-party form backend expects.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Email;

/// Minimum trimmed length of the name field.
pub const MIN_NAME_CHARS: usize = 3;

/// Minimum trimmed length of the message field.
pub const MIN_MESSAGE_CHARS: usize = 10;

pub const NAME_TOO_SHORT: &str = "El nombre debe tener al menos 3 caracteres.";
pub const EMAIL_INVALID: &str = "Por favor, introduce un correo electrónico válido.";
pub const MESSAGE_TOO_SHORT: &str = "El mensaje es demasiado corto (mínimo 10 caracteres).";

/// Raw contact form fields as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Per-field validation messages. `None` means the field is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub name: Option<&'static str>,
    pub email: Option<&'static str>,
    pub message: Option<&'static str>,
}

impl FieldErrors {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.message.is_none()
    }
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: Email,
    pub message: String,
}

/// JSON body sent to the form backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(rename = "_subject")]
    pub subject: String,
    #[serde(rename = "_replyto")]
    pub reply_to: String,
}

impl ContactForm {
    /// Whether any field has content; blur validation is skipped otherwise.
    #[must_use]
    pub fn has_input(&self) -> bool {
        !(self.name.is_empty() && self.email.is_empty() && self.message.is_empty())
    }

    /// Check every field and collect all messages at once.
    #[must_use]
    pub fn errors(&self) -> FieldErrors {
        FieldErrors {
            name: (self.name.trim().chars().count() < MIN_NAME_CHARS).then_some(NAME_TOO_SHORT),
            email: Email::parse(&self.email).is_err().then_some(EMAIL_INVALID),
            message: (self.message.trim().chars().count() < MIN_MESSAGE_CHARS)
                .then_some(MESSAGE_TOO_SHORT),
        }
    }

    /// Validate the form.
    ///
    /// Field values are kept verbatim (untrimmed) in the submission.
    ///
    /// # Errors
    ///
    /// Returns the [`FieldErrors`] when any field is invalid.
    pub fn validate(&self) -> Result<ContactSubmission, FieldErrors> {
        let errors = self.errors();
        match Email::parse(&self.email) {
            Ok(email) if errors.is_empty() => Ok(ContactSubmission {
                name: self.name.clone(),
                email,
                message: self.message.clone(),
            }),
            _ => Err(errors),
        }
    }
}

impl ContactSubmission {
    /// Build the backend payload.
    #[must_use]
    pub fn payload(&self) -> ContactPayload {
        ContactPayload {
            name: self.name.clone(),
            email: self.email.to_string(),
            message: self.message.clone(),
            subject: format!("💼 Consulta de Proyecto Web - {}", self.name),
            reply_to: self.email.to_string(),
        }
    }
}

/// Lifecycle of one submission, driving the form's feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

impl SubmissionStatus {
    /// Whether the submit button must be disabled.
    #[must_use]
    pub const fn submit_disabled(self) -> bool {
        matches!(self, Self::Submitting | Self::Success)
    }

    /// Whether the inputs (and the WhatsApp button) must be disabled.
    #[must_use]
    pub const fn inputs_disabled(self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// Label of the submit button.
    #[must_use]
    pub const fn button_label(self) -> &'static str {
        match self {
            Self::Idle => "Enviar Email",
            Self::Submitting => "Enviando...",
            Self::Success => "✅ ¡Enviado!",
            Self::Error => "❌ Error",
        }
    }

    /// How long the status is shown before the form returns to idle.
    #[must_use]
    pub const fn reset_after(self) -> Option<Duration> {
        match self {
            Self::Success => Some(Duration::from_secs(5)),
            Self::Error => Some(Duration::from_secs(3)),
            Self::Idle | Self::Submitting => None,
        }
    }
}
