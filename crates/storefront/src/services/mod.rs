//! Services used by the route handlers.
//!
//! - `cart_session` - Cart storage slot kept in the visitor session
//! - `contact` - Contact form delivery and the WhatsApp fallback link

pub mod cart_session;
pub mod contact;

pub use cart_session::{SessionCart, SessionSlot};
pub use contact::{ContactClient, ContactError, whatsapp_link};
