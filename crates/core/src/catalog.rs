//! Catalog listings and the stock-aware ticket control.
//!
//! Stock bookkeeping is visual only: the remaining stock shown next to a
//! listing is its initial stock minus what the visitor already holds in the
//! cart. Nothing is reserved or reconciled with an inventory system.

use serde::Serialize;

use crate::cart::{CartCandidate, CartError, CartState, CartStorage, CartStore};
use crate::types::{Price, ProductId};

/// Largest number of units a single "add to cart" action may add.
pub const MAX_UNITS_PER_ADD: u32 = 5;

/// Below this many units left a listing is flagged as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// What kind of product a listing sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Ticket,
    Merch,
}

/// Errors from the ticket control.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    /// Zero units requested.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Nothing left to sell.
    #[error("{0} is sold out")]
    SoldOut(ProductId),
    /// More units requested than remain.
    #[error("requested {requested} units but only {remaining} remain")]
    ExceedsStock { requested: u32, remaining: u32 },
    /// The cart rejected the item.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// A purchasable ticket type or merchandise item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub initial_stock: u32,
    pub image: String,
    pub kind: ListingKind,
}

impl Listing {
    /// Units still available to this visitor.
    #[must_use]
    pub fn remaining_stock(&self, cart: &CartState) -> u32 {
        self.initial_stock
            .saturating_sub(cart.quantity_of(self.id.as_str()))
    }

    #[must_use]
    pub fn is_sold_out(&self, cart: &CartState) -> bool {
        self.remaining_stock(cart) == 0
    }

    #[must_use]
    pub fn is_low_stock(&self, cart: &CartState) -> bool {
        self.remaining_stock(cart) < LOW_STOCK_THRESHOLD
    }

    /// Quantities offered by the selector: `1..=min(5, remaining)`.
    ///
    /// Empty when sold out.
    #[must_use]
    pub fn quantity_options(&self, cart: &CartState) -> Vec<u32> {
        (1..=self.remaining_stock(cart).min(MAX_UNITS_PER_ADD)).collect()
    }

    /// The cart candidate for one unit of this listing.
    #[must_use]
    pub fn candidate(&self) -> CartCandidate {
        CartCandidate {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price.into(),
            image: self.image.clone(),
        }
    }

    /// Add `quantity` units to the cart, one `add_item` per unit.
    ///
    /// The request is checked against the remaining stock first; a rejected
    /// request leaves the cart untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StockError`] for a zero quantity, a sold-out listing, a
    /// quantity above the remaining stock, or a cart rejection.
    pub fn add_units<S: CartStorage>(
        &self,
        store: &mut CartStore<S>,
        quantity: u32,
    ) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::ZeroQuantity);
        }
        let remaining = self.remaining_stock(store.state());
        if remaining == 0 {
            return Err(StockError::SoldOut(self.id.clone()));
        }
        if quantity > remaining {
            return Err(StockError::ExceedsStock {
                requested: quantity,
                remaining,
            });
        }

        for _ in 0..quantity {
            store.add_item(self.candidate())?;
        }
        Ok(self.remaining_stock(store.state()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cart::MemoryStorage;

    fn listing(stock: u32) -> Listing {
        Listing {
            id: ProductId::parse("festival-pass").unwrap(),
            name: "Abono festival".to_string(),
            price: Price::coerce(&json!(45)).unwrap(),
            initial_stock: stock,
            image: "/static/images/festival.webp".to_string(),
            kind: ListingKind::Ticket,
        }
    }

    #[test]
    fn test_quantity_options_capped_at_five() {
        let cart = CartState::new();
        assert_eq!(listing(20).quantity_options(&cart), vec![1, 2, 3, 4, 5]);
        assert_eq!(listing(3).quantity_options(&cart), vec![1, 2, 3]);
        assert!(listing(0).quantity_options(&cart).is_empty());
    }

    #[test]
    fn test_add_units_reduces_remaining_stock() {
        let ticket = listing(6);
        let mut store = CartStore::open(MemoryStorage::new());

        assert_eq!(ticket.add_units(&mut store, 4), Ok(2));
        assert_eq!(store.state().quantity_of("festival-pass"), 4);
        assert!(ticket.is_low_stock(store.state()));
        assert_eq!(ticket.quantity_options(store.state()), vec![1, 2]);
    }

    #[test]
    fn test_add_units_rejects_more_than_remaining() {
        let ticket = listing(3);
        let mut store = CartStore::open(MemoryStorage::new());
        ticket.add_units(&mut store, 2).unwrap();

        assert_eq!(
            ticket.add_units(&mut store, 2),
            Err(StockError::ExceedsStock {
                requested: 2,
                remaining: 1
            })
        );
        assert_eq!(store.state().quantity_of("festival-pass"), 2);
    }

    #[test]
    fn test_sold_out() {
        let ticket = listing(1);
        let mut store = CartStore::open(MemoryStorage::new());
        ticket.add_units(&mut store, 1).unwrap();

        assert!(ticket.is_sold_out(store.state()));
        assert!(matches!(
            ticket.add_units(&mut store, 1),
            Err(StockError::SoldOut(_))
        ));
    }

    #[test]
    fn test_zero_quantity() {
        let mut store = CartStore::open(MemoryStorage::new());
        assert_eq!(
            listing(5).add_units(&mut store, 0),
            Err(StockError::ZeroQuantity)
        );
        assert!(store.state().is_empty());
    }

    #[test]
    fn test_removing_from_cart_frees_stock() {
        let ticket = listing(2);
        let mut store = CartStore::open(MemoryStorage::new());
        ticket.add_units(&mut store, 2).unwrap();
        store.remove_item("festival-pass");

        assert_eq!(ticket.remaining_stock(store.state()), 1);
    }
}
