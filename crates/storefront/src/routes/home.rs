//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::listings::ListingView;
use crate::services::SessionCart;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<ListingView>,
    pub venue: Option<String>,
    pub nonce: String,
}

/// Display the home page with the featured listings.
#[instrument(skip(state, session, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let cart = SessionCart::load(session).await;
    let catalog = state.catalog();

    HomeTemplate {
        featured: catalog
            .featured()
            .map(|entry| ListingView::new(entry, cart.state()))
            .collect(),
        venue: catalog.primary_venue().map(|(_, venue)| venue.name.clone()),
        nonce,
    }
}
