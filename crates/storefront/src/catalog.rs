//! Ticket and merchandise catalog loaded from markdown files.
//!
//! Listings live under `content/tickets/*.md` and `content/merch/*.md`. Each
//! file carries YAML front matter with the listing fields and a markdown
//! body used as the description:
//!
//! ```markdown
//! ---
//! id: festival-pass
//! name: Abono Festival Astro
//! price: 45
//! stock: 12
//! image: /static/images/festival.webp
//! date: 2026-07-18
//! venue:
//!   name: Parque del Oeste
//!   latitude: 40.4255
//!   longitude: -3.7236
//! ---
//! Three days of live music...
//! ```
//!
//! Files that fail to parse are logged and skipped; the rest of the catalog
//! still loads.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use astro_tickets_core::{Listing, ListingKind, Price, ProductId};
use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::{Deserialize, Serialize};
use url::Url;

/// Zoom used when a venue does not specify one.
const DEFAULT_MAP_ZOOM: u8 = 15;

/// Catalog loading errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid listing {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("Duplicate listing id: {0}")]
    DuplicateId(String),
}

/// Front matter of a listing file.
#[derive(Debug, Clone, Deserialize)]
struct ListingMeta {
    id: String,
    name: String,
    /// Kept untyped; prices go through `Price::coerce`.
    price: serde_json::Value,
    stock: u32,
    #[serde(default)]
    image: String,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    venue: Option<Venue>,
    #[serde(default)]
    featured: bool,
}

/// Where an event takes place.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Venue {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

const fn default_zoom() -> u8 {
    DEFAULT_MAP_ZOOM
}

/// A listing with its presentation data.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub listing: Listing,
    pub date: Option<NaiveDate>,
    pub venue: Option<Venue>,
    pub featured: bool,
    pub description_html: String,
}

/// Files skipped while loading, with the reason.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub catalog: Catalog,
    pub rejected: Vec<(PathBuf, CatalogError)>,
}

/// In-memory catalog, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Arc<Vec<CatalogEntry>>,
}

impl Catalog {
    /// Load every listing under `content_dir`, logging and skipping bad files.
    ///
    /// # Errors
    ///
    /// Returns an error if a listing directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, CatalogError> {
        let report = Self::load_with_report(content_dir)?;
        for (path, e) in &report.rejected {
            tracing::error!("Failed to load listing {:?}: {}", path, e);
        }
        Ok(report.catalog)
    }

    /// Load every listing and return the rejected files alongside.
    ///
    /// # Errors
    ///
    /// Returns an error if a listing directory exists but cannot be read.
    pub fn load_with_report(content_dir: &Path) -> Result<LoadReport, CatalogError> {
        let mut entries = Vec::new();
        let mut rejected = Vec::new();

        for (subdir, kind) in [("tickets", ListingKind::Ticket), ("merch", ListingKind::Merch)] {
            let dir = content_dir.join(subdir);
            if !dir.exists() {
                tracing::warn!("Listing directory does not exist: {:?}", dir);
                continue;
            }

            for path in markdown_files(&dir)? {
                match load_entry(&path, kind) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => rejected.push((path, e)),
                }
            }
        }

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(entries.len());
        for entry in entries {
            if seen.insert(entry.listing.id.clone()) {
                tracing::info!("Loaded listing: {}", entry.listing.id);
                unique.push(entry);
            } else {
                rejected.push((
                    content_dir.to_path_buf(),
                    CatalogError::DuplicateId(entry.listing.id.to_string()),
                ));
            }
        }

        Ok(LoadReport {
            catalog: Self::from_entries(unique),
            rejected,
        })
    }

    /// Build a catalog from already-parsed entries.
    ///
    /// Tickets are ordered by date then name, merchandise by name.
    #[must_use]
    pub fn from_entries(mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by(|a, b| {
            let kind_rank = |e: &CatalogEntry| u8::from(e.listing.kind == ListingKind::Merch);
            kind_rank(a)
                .cmp(&kind_rank(b))
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.listing.name.cmp(&b.listing.name))
        });
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Get an entry by listing id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.listing.id.as_str() == id)
    }

    pub fn tickets(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.of_kind(ListingKind::Ticket)
    }

    pub fn merch(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.of_kind(ListingKind::Merch)
    }

    /// Entries flagged `featured: true` for the home page.
    pub fn featured(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.featured)
    }

    /// The venue of the first ticket listing that has one.
    #[must_use]
    pub fn primary_venue(&self) -> Option<(&CatalogEntry, &Venue)> {
        self.tickets()
            .find_map(|e| e.venue.as_ref().map(|venue| (e, venue)))
    }

    /// Origins of listing images hosted elsewhere, for the CSP `img-src`.
    #[must_use]
    pub fn image_origins(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter_map(|e| Url::parse(&e.listing.image).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(|url| url.origin().ascii_serialization())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn of_kind(&self, kind: ListingKind) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.listing.kind == kind)
    }
}

/// Markdown files of a directory, sorted for stable load order.
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CatalogError::Io(e.to_string()))?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}

/// Load a single listing from a markdown file.
fn load_entry(path: &Path, kind: ListingKind) -> Result<CatalogEntry, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io(e.to_string()))?;
    parse_entry(&content, kind)
}

/// Parse listing front matter and body.
///
/// # Errors
///
/// Returns an error for missing front matter or invalid listing fields.
pub fn parse_entry(content: &str, kind: ListingKind) -> Result<CatalogEntry, CatalogError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<ListingMeta> = matter
        .parse(content)
        .map_err(|e| CatalogError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| CatalogError::Parse("Missing frontmatter".to_string()))?;

    let id = ProductId::parse(&meta.id).map_err(|e| CatalogError::Invalid {
        field: "id",
        message: e.to_string(),
    })?;
    if meta.name.trim().is_empty() {
        return Err(CatalogError::Invalid {
            field: "name",
            message: "cannot be empty".to_string(),
        });
    }
    let price = Price::coerce(&meta.price).map_err(|e| CatalogError::Invalid {
        field: "price",
        message: e.to_string(),
    })?;
    if let Some(venue) = &meta.venue {
        validate_venue(venue)?;
    }

    Ok(CatalogEntry {
        listing: Listing {
            id,
            name: meta.name,
            price,
            initial_stock: meta.stock,
            image: meta.image,
            kind,
        },
        date: meta.date,
        venue: meta.venue,
        featured: meta.featured,
        description_html: render_markdown(&parsed.content),
    })
}

fn validate_venue(venue: &Venue) -> Result<(), CatalogError> {
    let invalid = |message: &str| CatalogError::Invalid {
        field: "venue",
        message: message.to_string(),
    };
    if !(-90.0..=90.0).contains(&venue.latitude) {
        return Err(invalid("latitude must be within -90..=90"));
    }
    if !(-180.0..=180.0).contains(&venue.longitude) {
        return Err(invalid("longitude must be within -180..=180"));
    }
    if venue.zoom > 19 {
        return Err(invalid("zoom must be at most 19"));
    }
    Ok(())
}

/// Render a listing description with GitHub Flavored Markdown.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;

    markdown_to_html(content, &options)
}
