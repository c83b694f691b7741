//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::services::ContactClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog, the contact client and configuration. Nothing in here is
/// per-visitor; carts live in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    contact: ContactClient,
    dashboard: Dashboard,
}

impl AppState {
    /// Create a new application state, loading the catalog from
    /// `config.content_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or the HTTP client
    /// for the contact backend cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let catalog = Catalog::load(&config.content_dir)?;
        tracing::info!(listings = catalog.len(), "Catalog loaded");
        Self::with_catalog(config, catalog)
    }

    /// Create a new application state around an existing catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the contact backend cannot be built.
    pub fn with_catalog(config: StorefrontConfig, catalog: Catalog) -> Result<Self> {
        let contact = ContactClient::new(&config.contact)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                contact,
                dashboard: Dashboard::sample(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the contact form backend client.
    #[must_use]
    pub fn contact(&self) -> &ContactClient {
        &self.inner.contact
    }

    #[must_use]
    pub fn dashboard(&self) -> &Dashboard {
        &self.inner.dashboard
    }
}
