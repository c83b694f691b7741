//! Cart slot inspection.
//!
//! Decodes a persisted slot exactly as the storefront does on restore, so a
//! support request ("my cart is empty") can be checked against the raw value.

use std::path::Path;

use astro_tickets_core::types::price::format_euros;
use astro_tickets_core::{CartState, DecodeError, restore_slot};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while inspecting a slot.
#[derive(Debug, Error)]
pub enum CartInspectError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// What survived decoding, and what did not.
#[derive(Debug)]
pub struct Inspection {
    pub state: CartState,
    pub dropped: Vec<(String, DecodeError)>,
    pub total_items: u64,
    pub total_price: Decimal,
}

/// Decode a raw slot value.
#[must_use]
pub fn inspect(raw: &str) -> Inspection {
    let report = restore_slot(Some(raw));
    Inspection {
        total_items: report.state.total_item_count(),
        total_price: report.state.total_price(),
        state: report.state,
        dropped: report.dropped,
    }
}

/// Read a slot from a file and log the inspection.
///
/// # Errors
///
/// Returns an error if the file cannot be read. Undecodable content is not an
/// error; it shows up as dropped entries.
pub fn inspect_file(path: &Path) -> Result<(), CartInspectError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CartInspectError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let inspection = inspect(&raw);

    for line in inspection.state.lines() {
        tracing::info!(
            "{} x{} @ {} = {} ({})",
            line.id,
            line.quantity,
            line.price,
            format_euros(line.line_total().unwrap_or_default()),
            line.name
        );
    }
    for (key, reason) in &inspection.dropped {
        tracing::warn!("Dropped entry {key:?}: {reason}");
    }
    tracing::info!(
        "{} line(s), {} item(s), total {}; {} entr(ies) dropped",
        inspection.state.len(),
        inspection.total_items,
        format_euros(inspection.total_price),
        inspection.dropped.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_keeps_valid_and_reports_dropped() {
        let raw = r#"{
            "t1": {"id": "t1", "name": "Entrada", "price": 10, "quantity": 2, "image": ""},
            "m1": "{\"id\":\"m1\",\"name\":\"Gorra\",\"price\":\"15\",\"quantity\":1}",
            "bad": {"id": "bad", "name": "Rota", "price": "abc", "quantity": 1},
            "neg": {"id": "neg", "name": "Negativa", "price": -1, "quantity": 1}
        }"#;

        let inspection = inspect(raw);

        assert_eq!(inspection.state.len(), 2);
        assert_eq!(inspection.total_items, 3);
        assert_eq!(inspection.total_price, Decimal::from(35));
        let mut dropped: Vec<&str> = inspection.dropped.iter().map(|(k, _)| k.as_str()).collect();
        dropped.sort_unstable();
        assert_eq!(dropped, vec!["bad", "neg"]);
    }

    #[test]
    fn test_inspect_non_object_slot_is_empty() {
        let inspection = inspect("[1, 2, 3]");
        assert!(inspection.state.is_empty());
        assert_eq!(inspection.total_price, Decimal::ZERO);
    }
}
