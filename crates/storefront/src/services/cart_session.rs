//! Cart storage backed by the visitor's session.
//!
//! The session holds the serialized cart under [`CART_STORAGE_KEY`], the
//! same slot a browser would keep in local storage. A request loads the
//! slot once, runs its cart operations against an in-memory copy, and
//! [`SessionCart::commit`] writes the result back before the response goes
//! out.

use astro_tickets_core::{CART_STORAGE_KEY, CartState, CartStorage, CartStore, StorageError};
use tower_sessions::Session;

/// In-memory copy of the session slot.
#[derive(Debug, Default)]
pub struct SessionSlot {
    raw: Option<String>,
    dirty: bool,
}

impl SessionSlot {
    #[must_use]
    pub const fn new(raw: Option<String>) -> Self {
        Self { raw, dirty: false }
    }

    /// Whether a save or remove happened since loading.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl CartStorage for SessionSlot {
    fn load(&self, key: &str) -> Option<String> {
        if key == CART_STORAGE_KEY {
            self.raw.clone()
        } else {
            None
        }
    }

    fn save(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        if key != CART_STORAGE_KEY {
            return Err(StorageError(format!("unknown session slot: {key}")));
        }
        self.raw = Some(value);
        self.dirty = true;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if key != CART_STORAGE_KEY {
            return Err(StorageError(format!("unknown session slot: {key}")));
        }
        self.raw = None;
        self.dirty = true;
        Ok(())
    }
}

/// A cart store bound to the current request's session.
pub struct SessionCart {
    session: Session,
    store: CartStore<SessionSlot>,
}

impl SessionCart {
    /// Load the visitor's cart. A missing or unreadable slot yields an empty cart.
    pub async fn load(session: Session) -> Self {
        let raw = match session.get::<String>(CART_STORAGE_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cart slot from session");
                None
            }
        };
        Self {
            session,
            store: CartStore::open(SessionSlot::new(raw)),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &CartStore<SessionSlot> {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut CartStore<SessionSlot> {
        &mut self.store
    }

    #[must_use]
    pub const fn state(&self) -> &CartState {
        self.store.state()
    }

    /// Write the slot back to the session if it changed.
    ///
    /// Failures are logged; the response is still built from the in-memory
    /// state.
    pub async fn commit(self) -> CartState {
        let state = self.store.state().clone();
        let slot = self.store.into_storage();
        if !slot.is_dirty() {
            return state;
        }

        let result = match slot.raw {
            Some(raw) => self.session.insert(CART_STORAGE_KEY, raw).await,
            None => self
                .session
                .remove::<String>(CART_STORAGE_KEY)
                .await
                .map(|_| ()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write cart slot to session");
        }
        state
    }
}
