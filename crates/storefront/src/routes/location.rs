//! Venue map page.
//!
//! The page carries everything Leaflet needs as `data-` attributes on the
//! map container; `static/js/map.js` reads them and builds the map.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::catalog::{CatalogEntry, Venue};
use crate::config::MapConfig;
use crate::filters;
use crate::middleware::CspNonce;
use crate::middleware::security_headers::ASSET_CDN;
use crate::state::AppState;

/// Leaflet release whose marker images the map uses.
const LEAFLET_VERSION: &str = "1.9.4";

/// Map widget settings.
#[derive(Clone, Debug, PartialEq)]
pub struct MapView {
    pub venue: String,
    pub event: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
    pub icon_url: String,
    pub icon_retina_url: String,
    pub shadow_url: String,
}

impl MapView {
    #[must_use]
    pub fn new(entry: &CatalogEntry, venue: &Venue, map: &MapConfig) -> Self {
        let images = format!("{ASSET_CDN}/leaflet@{LEAFLET_VERSION}/dist/images");
        Self {
            venue: venue.name.clone(),
            event: entry.listing.name.clone(),
            latitude: venue.latitude,
            longitude: venue.longitude,
            zoom: venue.zoom,
            tile_url: map.tile_url.clone(),
            attribution: map.tile_attribution.clone(),
            icon_url: format!("{images}/marker-icon.png"),
            icon_retina_url: format!("{images}/marker-icon-2x.png"),
            shadow_url: format!("{images}/marker-shadow.png"),
        }
    }
}

/// Location page template.
#[derive(Template, WebTemplate)]
#[template(path = "location.html")]
pub struct LocationTemplate {
    pub map: Option<MapView>,
    pub leaflet_version: &'static str,
    pub nonce: String,
}

/// Display the venue map.
#[instrument(skip(state, nonce))]
pub async fn show(State(state): State<AppState>, CspNonce(nonce): CspNonce) -> impl IntoResponse {
    let map = state
        .catalog()
        .primary_venue()
        .map(|(entry, venue)| MapView::new(entry, venue, &state.config().map));

    if map.is_none() {
        tracing::warn!("No listing has a venue; map not rendered");
    }

    LocationTemplate {
        map,
        leaflet_version: LEAFLET_VERSION,
        nonce,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use astro_tickets_core::ListingKind;

    use super::*;
    use crate::catalog::parse_entry;

    #[test]
    fn test_map_view_from_venue() {
        let entry = parse_entry(
            "---
id: festival-pass
name: Abono Festival
price: 45
stock: 12
venue:
  name: Parque del Oeste
  latitude: 40.4255
  longitude: -3.7236
---
",
            ListingKind::Ticket,
        )
        .unwrap();
        let venue = entry.venue.clone().unwrap();
        let config = MapConfig {
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution: "OpenStreetMap".to_string(),
        };

        let view = MapView::new(&entry, &venue, &config);

        assert_eq!(view.zoom, 15);
        assert_eq!(view.venue, "Parque del Oeste");
        assert_eq!(
            view.icon_url,
            "https://unpkg.com/leaflet@1.9.4/dist/images/marker-icon.png"
        );
    }
}
