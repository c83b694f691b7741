//! Astro Tickets Core - cart store and shared domain types.
//!
//! This crate provides the pieces of the ticket shop that carry invariants:
//! - `storefront` - Server-rendered shop (listings, cart, contact, dashboard)
//! - `cli` - Offline tools for inspecting cart slots and catalog content
//!
//! # Architecture
//!
//! The core crate contains only types, pure state transitions and the
//! storage port trait - no HTTP, no sessions, no filesystem. The storefront
//! supplies the session-backed storage implementation.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for product IDs, prices and email addresses
//! - [`cart`] - Cart state, write-through store and persisted-slot decoding
//! - [`catalog`] - Listings and the stock-aware ticket control
//! - [`contact`] - Contact form validation, payload and submission status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod contact;
pub mod types;

pub use cart::{
    CART_STORAGE_KEY, CartCandidate, CartChange, CartError, CartLine, CartState, CartStorage,
    CartStore, DecodeError, MemoryStorage, RestoreReport, StorageError, restore_slot,
};
pub use catalog::{Listing, ListingKind, MAX_UNITS_PER_ADD, StockError};
pub use contact::{ContactForm, ContactPayload, ContactSubmission, FieldErrors, SubmissionStatus};
pub use types::*;
