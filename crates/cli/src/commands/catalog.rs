//! Catalog content checks.

use std::path::Path;

use astro_tickets_storefront::catalog::{Catalog, CatalogError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogCheckError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("{0} listing file(s) rejected")]
    Rejected(usize),
}

/// Load every listing under `dir` and report files the storefront would skip.
///
/// # Errors
///
/// Returns an error if the content cannot be read or any file is rejected.
pub fn check(dir: &Path) -> Result<(), CatalogCheckError> {
    let report = Catalog::load_with_report(dir)?;
    let catalog = &report.catalog;

    tracing::info!(
        "{} listing(s): {} ticket(s), {} merch",
        catalog.len(),
        catalog.tickets().count(),
        catalog.merch().count()
    );
    match catalog.primary_venue() {
        Some((entry, venue)) => tracing::info!(
            "Map venue: {} ({}, {}) from {}",
            venue.name,
            venue.latitude,
            venue.longitude,
            entry.listing.id
        ),
        None => tracing::warn!("No ticket listing has a venue; the map page will be empty"),
    }

    for (path, e) in &report.rejected {
        tracing::error!("{}: {e}", path.display());
    }

    if report.rejected.is_empty() {
        Ok(())
    } else {
        Err(CatalogCheckError::Rejected(report.rejected.len()))
    }
}
