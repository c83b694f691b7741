//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the visitor's session; every mutation is written
//! back before the response and announces itself with `HX-Trigger:
//! cart-updated` so the navbar badge refreshes.

use askama::Template;
use askama_web::WebTemplate;
use astro_tickets_core::types::price::format_euros;
use astro_tickets_core::{CartCandidate, CartChange, CartState};
use axum::{
    Form, Json,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::listings::{ListingView, Notice, TicketControlTemplate};
use crate::services::SessionCart;
use crate::state::AppState;

/// HTMX event fired after any cart mutation.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart line display data for templates.
#[derive(Clone, Serialize)]
pub struct CartLineView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: String,
    pub item_count: u64,
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        let items = state
            .lines()
            .map(|line| CartLineView {
                id: line.id.to_string(),
                name: line.name.clone(),
                image: line.image.clone(),
                quantity: line.quantity,
                price: line.price.to_string(),
                line_price: format_euros(line.line_total().unwrap_or_default()),
            })
            .collect();

        Self {
            items,
            total: format_euros(state.total_price()),
            item_count: state.total_item_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub id: String,
    pub quantity: Option<u32>,
}

/// Form data naming a cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub nonce: String,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Checkout acknowledgment fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_success.html")]
pub struct CheckoutSuccessTemplate {
    pub total: String,
}

/// Totals and lines as served by `/cart/summary.json`.
#[derive(Serialize)]
pub struct CartSummary {
    pub total_items: u64,
    pub total_price: String,
    pub lines: Vec<CartLineView>,
}

/// Display cart page.
#[instrument(skip(session, nonce))]
pub async fn show(session: Session, CspNonce(nonce): CspNonce) -> impl IntoResponse {
    let cart = SessionCart::load(session).await;

    CartShowTemplate {
        cart: CartView::from(cart.state()),
        nonce,
    }
}

/// Add units of a listing to the cart (HTMX).
///
/// Returns the listing's ticket control re-rendered with the new remaining
/// stock. Rejected quantities leave the cart untouched and come back as a
/// notice on the same control.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    if let Err(e) = require_id(&form.id) {
        return e.into_response();
    }
    let Some(entry) = state.catalog().get(&form.id) else {
        return AppError::NotFound(format!("Listing {}", form.id)).into_response();
    };

    let quantity = form.quantity.unwrap_or(1);
    let mut cart = SessionCart::load(session).await;
    let outcome = entry.listing.add_units(cart.store_mut(), quantity);
    let cart_state = cart.commit().await;

    match outcome {
        Ok(remaining) => {
            tracing::info!(id = %form.id, quantity, remaining, "Added to cart");
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[
                    ("id", form.id.as_str()),
                    ("quantity", quantity.to_string().as_str()),
                ]),
            );
            let item = ListingView::new(entry, &cart_state).with_notice(Notice::added(quantity));
            (AppendHeaders([CART_UPDATED]), TicketControlTemplate { item }).into_response()
        }
        Err(e) => {
            tracing::warn!(id = %form.id, quantity, error = %e, "Add to cart rejected");
            let item = ListingView::new(entry, &cart_state).with_notice(Notice::rejected(&e));
            TicketControlTemplate { item }.into_response()
        }
    }
}

/// Add one more unit of a line already in the cart (HTMX).
///
/// Re-adds the stored line as-is, so the price first seen is kept.
#[instrument(skip(session))]
pub async fn increment(session: Session, Form(form): Form<LineForm>) -> Response {
    if let Err(e) = require_id(&form.id) {
        return e.into_response();
    }
    let mut cart = SessionCart::load(session).await;
    let change = match cart.state().get(&form.id).map(CartCandidate::from) {
        Some(candidate) => cart.store_mut().add_item(candidate).unwrap_or_else(|e| {
            tracing::error!(id = %form.id, error = %e, "Failed to increment cart line");
            CartChange::Unchanged
        }),
        None => CartChange::Unchanged,
    };
    let cart_state = cart.commit().await;

    items_response(change, &cart_state)
}

/// Remove one unit of a line (HTMX).
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<LineForm>) -> Response {
    if let Err(e) = require_id(&form.id) {
        return e.into_response();
    }
    let mut cart = SessionCart::load(session).await;
    let change = cart.store_mut().remove_item(&form.id);
    let cart_state = cart.commit().await;

    items_response(change, &cart_state)
}

/// Confirm checkout: acknowledge the total and empty the cart (HTMX).
#[instrument(skip(session))]
pub async fn checkout(session: Session) -> Response {
    let mut cart = SessionCart::load(session).await;
    if cart.state().is_empty() {
        return CartItemsTemplate {
            cart: CartView::from(cart.state()),
        }
        .into_response();
    }

    let total = format_euros(cart.store().total_price());
    let items = cart.store().total_item_count();
    cart.store_mut().clear();
    cart.commit().await;

    tracing::info!(total = %total, items, "Checkout confirmed");
    add_breadcrumb("cart", "Checkout confirmed", Some(&[("total", total.as_str())]));

    (
        AppendHeaders([CART_UPDATED]),
        CheckoutSuccessTemplate { total },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = SessionCart::load(session).await;

    CartCountTemplate {
        count: cart.store().total_item_count(),
    }
}

/// Cart totals and lines as JSON.
#[instrument(skip(session))]
pub async fn summary(session: Session) -> Json<CartSummary> {
    let cart = SessionCart::load(session).await;
    let view = CartView::from(cart.state());

    Json(CartSummary {
        total_items: view.item_count,
        total_price: format!("{:.2}", cart.store().total_price()),
        lines: view.items,
    })
}

/// Reject cart posts that name no line at all.
fn require_id(id: &str) -> Result<(), AppError> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("missing listing id".to_string()));
    }
    Ok(())
}

/// Cart items fragment, announcing the change when there was one.
fn items_response(change: CartChange, state: &CartState) -> Response {
    let fragment = CartItemsTemplate {
        cart: CartView::from(state),
    };
    if change.is_mutation() {
        (AppendHeaders([CART_UPDATED]), fragment).into_response()
    } else {
        fragment.into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use astro_tickets_core::{CartStore, MemoryStorage, ProductId};
    use serde_json::json;

    use super::*;

    fn candidate(id: &str, price: serde_json::Value) -> CartCandidate {
        CartCandidate {
            id: ProductId::parse(id).unwrap(),
            name: format!("Entrada {id}"),
            price,
            image: String::new(),
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add_item(candidate("t1", json!(10))).unwrap();
        store.add_item(candidate("t1", json!(10))).unwrap();
        store.add_item(candidate("m1", json!("7.5"))).unwrap();

        let view = CartView::from(store.state());

        assert_eq!(view.item_count, 3);
        assert_eq!(view.total, "27.50€");
        let t1 = view.items.iter().find(|i| i.id == "t1").unwrap();
        assert_eq!(t1.quantity, 2);
        assert_eq!(t1.price, "10.00€");
        assert_eq!(t1.line_price, "20.00€");
    }

    #[test]
    fn test_require_id() {
        assert!(require_id("t1").is_ok());
        assert!(matches!(require_id("  "), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::from(&CartState::new());
        assert!(view.items.is_empty());
        assert_eq!(view.item_count, 0);
        assert_eq!(view.total, "0.00€");
    }
}
