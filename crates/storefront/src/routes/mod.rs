//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured events)
//! GET  /health                 - Health check
//!
//! # Listings
//! GET  /events                 - Ticket listings with ticket controls
//! GET  /merch                  - Merchandise listings and cart list
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add N units (returns ticket_control, triggers cart-updated)
//! POST /cart/increment         - Add one unit of a line (returns cart_items fragment)
//! POST /cart/remove            - Remove one unit (returns cart_items fragment)
//! POST /cart/checkout          - Confirm checkout and clear (returns checkout_success)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/summary.json      - Totals and lines as JSON
//!
//! # Contact
//! GET  /contact                - Contact page
//! POST /contact                - Submit form (returns contact_form fragment)
//! POST /contact/validate       - Blur validation (out-of-band error spans)
//! GET  /contact/form           - Idle form, used to reset after success/error
//! GET  /contact/whatsapp       - Redirect to WhatsApp with the form contents
//!
//! # Venue
//! GET  /location               - Venue map
//!
//! # Admin
//! GET  /admin/dashboard            - Analytics dashboard
//! GET  /admin/dashboard/data.json  - Chart series as JSON
//! ```

pub mod cart;
pub mod contact;
pub mod dashboard;
pub mod home;
pub mod listings;
pub mod location;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{cart_rate_limiter, contact_rate_limiter};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
        .route("/count", get(cart::count))
        .route("/summary.json", get(cart::summary))
        .layer(cart_rate_limiter())
}

/// Create the contact routes router.
///
/// Only submissions get the strict limit; they are the requests that reach
/// the form backend.
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(contact::show).merge(post(contact::submit).layer(contact_rate_limiter())),
        )
        .route(
            "/validate",
            post(contact::validate).layer(cart_rate_limiter()),
        )
        .route("/form", get(contact::form))
        .route("/whatsapp", get(contact::whatsapp))
}

/// Create the admin dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::show))
        .route("/data.json", get(dashboard::data))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        // Listings
        .route("/events", get(listings::events))
        .route("/merch", get(listings::merch))
        // Cart routes
        .nest("/cart", cart_routes())
        // Contact routes
        .nest("/contact", contact_routes())
        // Venue map
        .route("/location", get(location::show))
        // Admin
        .nest("/admin/dashboard", dashboard_routes())
}
