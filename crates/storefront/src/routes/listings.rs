//! Event and merchandise listing pages.
//!
//! Every listing carries a ticket control: a quantity selector bounded by
//! the stock left after what the visitor already has in the cart.

use askama::Template;
use askama_web::WebTemplate;
use astro_tickets_core::{CartState, ListingKind, StockError};
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::CatalogEntry;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::cart::CartView;
use crate::services::SessionCart;
use crate::state::AppState;

/// Feedback shown under a ticket control after an add.
#[derive(Clone)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    #[must_use]
    pub fn added(units: u32) -> Self {
        let text = if units == 1 {
            "¡Añadido al carrito!".to_string()
        } else {
            format!("¡{units} unidades añadidas al carrito!")
        };
        Self {
            text,
            is_error: false,
        }
    }

    #[must_use]
    pub fn rejected(error: &StockError) -> Self {
        let text = match error {
            StockError::ZeroQuantity => "Selecciona al menos una unidad.".to_string(),
            StockError::SoldOut(_) => "Agotado.".to_string(),
            StockError::ExceedsStock { remaining: 1, .. } => "Solo queda 1 disponible.".to_string(),
            StockError::ExceedsStock { remaining, .. } => {
                format!("Solo quedan {remaining} disponibles.")
            }
            StockError::Cart(_) => "No se pudo añadir al carrito.".to_string(),
        };
        Self {
            text,
            is_error: true,
        }
    }
}

/// Listing display data, including its ticket control.
#[derive(Clone)]
pub struct ListingView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub price: String,
    pub is_ticket: bool,
    pub date: Option<String>,
    pub venue: Option<String>,
    pub description_html: String,
    pub remaining: u32,
    pub options: Vec<u32>,
    pub sold_out: bool,
    pub low_stock: bool,
    pub notice: Option<Notice>,
}

impl ListingView {
    /// Build the view against the visitor's current cart.
    #[must_use]
    pub fn new(entry: &CatalogEntry, cart: &CartState) -> Self {
        let listing = &entry.listing;
        Self {
            id: listing.id.to_string(),
            name: listing.name.clone(),
            image: listing.image.clone(),
            price: listing.price.to_string(),
            is_ticket: listing.kind == ListingKind::Ticket,
            date: entry.date.map(|d| d.format("%d/%m/%Y").to_string()),
            venue: entry.venue.as_ref().map(|v| v.name.clone()),
            description_html: entry.description_html.clone(),
            remaining: listing.remaining_stock(cart),
            options: listing.quantity_options(cart),
            sold_out: listing.is_sold_out(cart),
            low_stock: listing.is_low_stock(cart),
            notice: None,
        }
    }

    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Events page template.
#[derive(Template, WebTemplate)]
#[template(path = "events.html")]
pub struct EventsTemplate {
    pub listings: Vec<ListingView>,
    pub nonce: String,
}

/// Merchandise page template.
#[derive(Template, WebTemplate)]
#[template(path = "merch.html")]
pub struct MerchTemplate {
    pub listings: Vec<ListingView>,
    pub cart: CartView,
    pub nonce: String,
}

/// Ticket control fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/ticket_control.html")]
pub struct TicketControlTemplate {
    pub item: ListingView,
}

/// Display ticket listings.
#[instrument(skip(state, session, nonce))]
pub async fn events(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let cart = SessionCart::load(session).await;
    let listings = state
        .catalog()
        .tickets()
        .map(|entry| ListingView::new(entry, cart.state()))
        .collect();

    EventsTemplate { listings, nonce }
}

/// Display merchandise listings next to the cart.
#[instrument(skip(state, session, nonce))]
pub async fn merch(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let cart = SessionCart::load(session).await;
    let listings = state
        .catalog()
        .merch()
        .map(|entry| ListingView::new(entry, cart.state()))
        .collect();

    MerchTemplate {
        listings,
        cart: CartView::from(cart.state()),
        nonce,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use astro_tickets_core::{CartStore, MemoryStorage};

    use super::*;
    use crate::catalog::parse_entry;

    const SHOW: &str = "---
id: late-show
name: Sesión Nocturna
price: 18
stock: 6
image: /static/images/late-show.webp
date: 2026-09-01
venue:
  name: Sala Sol
  latitude: 40.4169
  longitude: -3.7035
---
Doors at 22:00.
";

    #[test]
    fn test_view_tracks_cart_quantity() {
        let entry = parse_entry(SHOW, ListingKind::Ticket).unwrap();
        let mut store = CartStore::open(MemoryStorage::new());
        entry.listing.add_units(&mut store, 2).unwrap();

        let view = ListingView::new(&entry, store.state());

        assert_eq!(view.remaining, 4);
        assert_eq!(view.options, vec![1, 2, 3, 4]);
        assert!(view.low_stock);
        assert!(!view.sold_out);
        assert_eq!(view.price, "18.00€");
        assert_eq!(view.date.as_deref(), Some("01/09/2026"));
        assert_eq!(view.venue.as_deref(), Some("Sala Sol"));
    }

    #[test]
    fn test_rejection_notices() {
        let notice = Notice::rejected(&StockError::ExceedsStock {
            requested: 4,
            remaining: 2,
        });
        assert!(notice.is_error);
        assert_eq!(notice.text, "Solo quedan 2 disponibles.");
        assert_eq!(
            Notice::rejected(&StockError::ExceedsStock {
                requested: 2,
                remaining: 1,
            })
            .text,
            "Solo queda 1 disponible."
        );
        assert_eq!(Notice::added(3).text, "¡3 unidades añadidas al carrito!");
    }
}
