//! Cart state, the write-through cart store and persisted-slot decoding.
//!
//! The cart is a mapping `ProductId -> CartLine`. [`CartState`] holds the
//! pure transitions (add, remove, clear) and the derived totals;
//! [`CartStore`] wraps a state together with a [`CartStorage`] port and
//! flushes the serialized mapping after every mutation.
//!
//! # Persisted format
//!
//! One storage key, [`CART_STORAGE_KEY`], holding a JSON object:
//!
//! ```json
//! { "t1": { "id": "t1", "name": "Entrada general", "price": 20, "quantity": 2, "image": "/img/t1.webp" } }
//! ```
//!
//! Entries are decoded one by one. A corrupt entry is dropped and logged;
//! it never fails the whole restore.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{Price, PriceError, ProductId};

/// Storage key of the persisted cart slot.
pub const CART_STORAGE_KEY: &str = "astro-tickets-cart";

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The candidate's price could not be coerced to a number.
    #[error("invalid price for {name}: {source}")]
    InvalidPrice {
        /// Display name of the rejected item.
        name: String,
        /// Underlying coercion failure.
        #[source]
        source: PriceError,
    },
}

/// Why a persisted entry was dropped during restore.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The entry was a string that is not valid JSON.
    #[error("entry is not valid JSON: {0}")]
    Parse(String),
    /// The entry is not a JSON object.
    #[error("entry is not an object")]
    NotAnObject,
    /// A required field is missing, empty or of the wrong type.
    #[error("missing or empty field `{0}`")]
    MissingField(&'static str),
    /// The price failed numeric coercion.
    #[error("invalid price: {0}")]
    Price(#[from] PriceError),
    /// The quantity is not an integer of at least 1.
    #[error("invalid quantity: {0}")]
    Quantity(String),
    /// The entry's id does not match the key it is stored under.
    #[error("entry id `{id}` stored under key `{key}`")]
    KeyMismatch {
        /// Mapping key.
        key: String,
        /// Id found inside the entry.
        id: String,
    },
}

/// A storage write failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cart storage failure: {0}")]
pub struct StorageError(pub String);

// =============================================================================
// Line items and state
// =============================================================================

/// One purchasable item currently in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Always at least 1; a line reaching zero is removed instead.
    pub quantity: u32,
    pub image: String,
}

impl CartLine {
    /// `price × quantity`, or `None` if the product overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.line_total(self.quantity)
    }
}

/// An item offered to [`CartState::add`].
///
/// The price is untyped on purpose: it comes from form posts and content
/// files and is coerced when the item is added.
#[derive(Debug, Clone, PartialEq)]
pub struct CartCandidate {
    pub id: ProductId,
    pub name: String,
    pub price: Value,
    pub image: String,
}

impl From<&CartLine> for CartCandidate {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            price: line.price.into(),
            image: line.image.clone(),
        }
    }
}

/// Outcome of a cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was created with quantity 1.
    Inserted,
    /// An existing line gained one unit.
    Incremented { quantity: u32 },
    /// An existing line lost one unit and is still present.
    Decremented { quantity: u32 },
    /// A line was deleted.
    Removed,
    /// The whole cart was emptied.
    Cleared,
    /// Nothing happened (e.g. removing an absent id).
    Unchanged,
}

impl CartChange {
    /// Whether the state differs from before the operation.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// The cart mapping. Single source of truth for every derived value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CartState {
    lines: BTreeMap<ProductId, CartLine>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a line by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CartLine> {
        self.lines.get(id)
    }

    /// Iterate over the lines, ordered by id.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `id` currently in the cart (0 when absent).
    #[must_use]
    pub fn quantity_of(&self, id: &str) -> u32 {
        self.lines.get(id).map_or(0, |line| line.quantity)
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `price × quantity`; a line whose total overflows counts as 0.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines
            .values()
            .filter_map(CartLine::line_total)
            .fold(Decimal::ZERO, |sum, line_total| {
                sum.checked_add(line_total).unwrap_or(sum)
            })
    }

    /// Add one unit of `candidate`.
    ///
    /// An existing line keeps its name, price and image and only gains one
    /// unit. A new line is inserted with quantity 1 and the coerced price.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidPrice`] if the candidate's price is not
    /// numeric; the state is left untouched.
    pub fn add(&mut self, candidate: CartCandidate) -> Result<CartChange, CartError> {
        let price = Price::coerce(&candidate.price).map_err(|source| CartError::InvalidPrice {
            name: candidate.name.clone(),
            source,
        })?;

        if let Some(line) = self.lines.get_mut(candidate.id.as_str()) {
            line.quantity = line.quantity.saturating_add(1);
            return Ok(CartChange::Incremented {
                quantity: line.quantity,
            });
        }

        self.lines.insert(
            candidate.id.clone(),
            CartLine {
                id: candidate.id,
                name: candidate.name,
                price,
                quantity: 1,
                image: candidate.image,
            },
        );
        Ok(CartChange::Inserted)
    }

    /// Remove one unit of `id`, deleting the line when it was the last one.
    pub fn remove(&mut self, id: &str) -> CartChange {
        match self.lines.get_mut(id) {
            Some(line) if line.quantity > 1 => {
                line.quantity -= 1;
                CartChange::Decremented {
                    quantity: line.quantity,
                }
            }
            Some(_) => {
                self.lines.remove(id);
                CartChange::Removed
            }
            None => CartChange::Unchanged,
        }
    }

    /// Drop every line.
    pub fn clear(&mut self) -> CartChange {
        self.lines.clear();
        CartChange::Cleared
    }

    /// Serialize the mapping into the persisted slot format.
    #[must_use]
    pub fn encode(&self) -> String {
        // A map of plain structs with string keys cannot fail to serialize.
        serde_json::to_string(&self.lines).unwrap_or_else(|_| "{}".to_string())
    }
}

// =============================================================================
// Restore
// =============================================================================

/// Result of decoding a persisted slot, including what was thrown away.
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub state: CartState,
    pub dropped: Vec<(String, DecodeError)>,
}

/// Decode a persisted slot into a cart state.
///
/// Never fails: a slot that is not a JSON object yields an empty cart, and
/// each invalid entry is skipped. Every drop is logged at `warn`.
#[must_use]
pub fn restore_slot(raw: Option<&str>) -> RestoreReport {
    let Some(raw) = raw else {
        return RestoreReport::default();
    };

    let entries: Map<String, Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Persisted cart slot is not a JSON object, starting empty");
            return RestoreReport::default();
        }
    };

    let mut report = RestoreReport::default();
    for (key, value) in entries {
        match decode_entry(&key, value) {
            Ok(line) => {
                report.state.lines.insert(line.id.clone(), line);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping corrupt cart entry");
                report.dropped.push((key, e));
            }
        }
    }
    report
}

/// Decode and validate one persisted entry.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing the first problem found.
pub fn decode_entry(key: &str, value: Value) -> Result<CartLine, DecodeError> {
    let value = match value {
        Value::String(encoded) => {
            serde_json::from_str(&encoded).map_err(|e| DecodeError::Parse(e.to_string()))?
        }
        other => other,
    };
    let Value::Object(fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let id = required_str(&fields, "id")?;
    let id = ProductId::parse(id).map_err(|_| DecodeError::MissingField("id"))?;
    if id.as_str() != key {
        return Err(DecodeError::KeyMismatch {
            key: key.to_string(),
            id: id.to_string(),
        });
    }
    let name = required_str(&fields, "name")?.to_string();
    let price = Price::coerce(fields.get("price").unwrap_or(&Value::Null))?;
    let quantity = decode_quantity(fields.get("quantity").unwrap_or(&Value::Null))?;
    let image = fields
        .get("image")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(CartLine {
        id,
        name,
        price,
        quantity,
        image,
    })
}

fn required_str<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, DecodeError> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingField(field))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn decode_quantity(value: &Value) -> Result<u32, DecodeError> {
    let quantity = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            // Whole floats such as `2.0` are accepted.
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    quantity
        .filter(|q| *q >= 1)
        .and_then(|q| u32::try_from(q).ok())
        .ok_or_else(|| DecodeError::Quantity(value.to_string()))
}

// =============================================================================
// Storage port
// =============================================================================

/// A key-value slot the cart persists into.
pub trait CartStorage {
    /// Read the raw value under `key`, if any.
    fn load(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the device rejects the write.
    fn save(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete `key` entirely.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the device rejects the removal.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage, for tests and offline tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a raw cart slot.
    #[must_use]
    pub fn with_cart_slot(raw: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(CART_STORAGE_KEY.to_string(), raw.into());
        Self { slots }
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.slots.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.slots.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.slots.remove(key);
        Ok(())
    }
}

// =============================================================================
// Store
// =============================================================================

/// Cart state bound to a storage slot with write-through persistence.
#[derive(Debug)]
pub struct CartStore<S> {
    state: CartState,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Restore the cart from `storage`, dropping corrupt entries.
    #[must_use]
    pub fn open(storage: S) -> Self {
        let raw = storage.load(CART_STORAGE_KEY);
        let report = restore_slot(raw.as_deref());
        Self {
            state: report.state,
            storage,
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Release the storage device, e.g. to commit it elsewhere.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Add one unit of `candidate` and persist.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidPrice`] if the price is not numeric.
    /// Nothing is persisted in that case.
    pub fn add_item(&mut self, candidate: CartCandidate) -> Result<CartChange, CartError> {
        let id = candidate.id.clone();
        match self.state.add(candidate) {
            Ok(change) => {
                self.persist();
                Ok(change)
            }
            Err(e) => {
                tracing::error!(id = %id, error = %e, "Rejected cart item");
                Err(e)
            }
        }
    }

    /// Remove one unit of `id` and persist. Absent ids are a no-op.
    pub fn remove_item(&mut self, id: &str) -> CartChange {
        let change = self.state.remove(id);
        if change.is_mutation() {
            self.persist();
        }
        change
    }

    /// Empty the cart and delete the storage key.
    pub fn clear(&mut self) -> CartChange {
        let change = self.state.clear();
        if let Err(e) = self.storage.remove(CART_STORAGE_KEY) {
            tracing::warn!(error = %e, "Failed to remove persisted cart");
        }
        change
    }

    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.state.total_item_count()
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.state.total_price()
    }

    fn persist(&mut self) {
        if let Err(e) = self.storage.save(CART_STORAGE_KEY, self.state.encode()) {
            tracing::warn!(error = %e, "Failed to persist cart");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn candidate(id: &str, price: Value) -> CartCandidate {
        CartCandidate {
            id: ProductId::parse(id).unwrap(),
            name: format!("Entrada {id}"),
            price,
            image: format!("/images/{id}.webp"),
        }
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::open(MemoryStorage::new())
    }

    #[test]
    fn test_repeated_adds_count_up_and_keep_first_price() {
        let mut store = store();
        assert_eq!(store.add_item(candidate("t1", json!(10))), Ok(CartChange::Inserted));
        for n in 2..=4 {
            assert_eq!(
                store.add_item(candidate("t1", json!(99))),
                Ok(CartChange::Incremented { quantity: n })
            );
        }

        let line = store.state().get("t1").unwrap();
        assert_eq!(line.quantity, 4);
        assert_eq!(line.price.amount(), Decimal::from(10));
        assert_eq!(store.total_price(), Decimal::from(40));
    }

    #[test]
    fn test_add_twice_remove_once() {
        let mut store = store();
        store.add_item(candidate("t1", json!(10))).unwrap();
        store.add_item(candidate("t1", json!(10))).unwrap();
        assert_eq!(
            store.remove_item("t1"),
            CartChange::Decremented { quantity: 1 }
        );

        assert_eq!(store.state().quantity_of("t1"), 1);
        assert_eq!(store.total_price(), Decimal::from(10));
    }

    #[test]
    fn test_string_price_is_coerced() {
        let mut store = store();
        store.add_item(candidate("t1", json!("20"))).unwrap();

        assert_eq!(
            store.state().get("t1").unwrap().price.amount(),
            Decimal::from(20)
        );
        assert_eq!(store.total_price(), Decimal::from(20));
    }

    #[test]
    fn test_non_numeric_price_is_rejected_without_side_effects() {
        let mut store = store();
        let result = store.add_item(candidate("t1", json!("abc")));

        assert!(matches!(result, Err(CartError::InvalidPrice { .. })));
        assert_eq!(store.total_item_count(), 0);
        assert!(store.storage().load(CART_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_remove_quantity_times_then_noop() {
        let mut store = store();
        for _ in 0..3 {
            store.add_item(candidate("t1", json!(5))).unwrap();
        }
        store.remove_item("t1");
        store.remove_item("t1");
        assert_eq!(store.remove_item("t1"), CartChange::Removed);
        assert!(store.state().get("t1").is_none());

        let persisted = store.storage().load(CART_STORAGE_KEY);
        assert_eq!(store.remove_item("t1"), CartChange::Unchanged);
        assert_eq!(store.storage().load(CART_STORAGE_KEY), persisted);
    }

    #[test]
    fn test_totals_across_lines() {
        let mut store = store();
        store.add_item(candidate("t1", json!(10))).unwrap();
        store.add_item(candidate("t1", json!(10))).unwrap();
        store.add_item(candidate("m1", json!("12.50"))).unwrap();
        store.add_item(candidate("m2", json!(0))).unwrap();

        assert_eq!(store.total_item_count(), 4);
        assert_eq!(store.total_price(), Decimal::new(3250, 2));
    }

    #[test]
    fn test_overflowing_line_contributes_zero() {
        let mut state = CartState::new();
        state.add(candidate("big", json!(Decimal::MAX.to_string()))).unwrap();
        state.add(candidate("big", json!(1))).unwrap();
        state.add(candidate("t1", json!(10))).unwrap();

        assert_eq!(state.total_price(), Decimal::from(10));
        assert_eq!(state.total_item_count(), 3);
    }

    #[test]
    fn test_every_mutation_writes_through() {
        let mut store = store();
        store.add_item(candidate("t1", json!(10))).unwrap();
        store.add_item(candidate("t1", json!(10))).unwrap();

        let reopened = CartStore::open(store.into_storage());
        assert_eq!(reopened.state().quantity_of("t1"), 2);
    }

    #[test]
    fn test_clear_removes_storage_key() {
        let mut store = store();
        store.add_item(candidate("t1", json!(10))).unwrap();
        assert_eq!(store.clear(), CartChange::Cleared);

        assert_eq!(store.total_item_count(), 0);
        assert_eq!(store.total_price(), Decimal::ZERO);
        assert!(store.storage().load(CART_STORAGE_KEY).is_none());

        let reopened = CartStore::open(store.into_storage());
        assert!(reopened.state().is_empty());
    }

    #[test]
    fn test_persisted_format() {
        let mut store = store();
        store.add_item(candidate("t1", json!("20"))).unwrap();

        let raw = store.storage().load(CART_STORAGE_KEY).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["t1"]["id"], "t1");
        assert_eq!(value["t1"]["quantity"], 1);
        assert_eq!(value["t1"]["price"].as_f64(), Some(20.0));
        assert_eq!(value["t1"]["image"], "/images/t1.webp");
    }

    #[test]
    fn test_restore_drops_corrupt_entries() {
        let raw = json!({
            "ok": {"id": "ok", "name": "Entrada", "price": 15, "quantity": 2, "image": "a.webp"},
            "stringy": {"id": "stringy", "name": "Camiseta", "price": "19.90", "quantity": "1"},
            "encoded": "{\"id\":\"encoded\",\"name\":\"Taza\",\"price\":8,\"quantity\":1,\"image\":\"\"}",
            "no-id": {"name": "x", "price": 1, "quantity": 1},
            "bad-price": {"id": "bad-price", "name": "x", "price": "abc", "quantity": 1},
            "zero-qty": {"id": "zero-qty", "name": "x", "price": 1, "quantity": 0},
            "frac-qty": {"id": "frac-qty", "name": "x", "price": 1, "quantity": 1.5},
            "garbage": "{not json",
            "array": [1, 2],
            "moved": {"id": "elsewhere", "name": "x", "price": 1, "quantity": 1}
        })
        .to_string();

        let report = restore_slot(Some(&raw));
        let ids: Vec<&str> = report.state.lines().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["encoded", "ok", "stringy"]);
        assert_eq!(report.dropped.len(), 7);
        assert_eq!(
            report.state.get("stringy").unwrap().price.amount(),
            Decimal::new(1990, 2)
        );
        assert_eq!(report.state.get("stringy").unwrap().image, "");
    }

    #[test]
    fn test_restore_reports_reasons() {
        assert_eq!(
            decode_entry("a", json!({"name": "x", "price": 1, "quantity": 1})),
            Err(DecodeError::MissingField("id"))
        );
        assert_eq!(
            decode_entry("a", json!({"id": "a", "name": "", "price": 1, "quantity": 1})),
            Err(DecodeError::MissingField("name"))
        );
        assert!(matches!(
            decode_entry("a", json!({"id": "a", "name": "x", "price": "abc", "quantity": 1})),
            Err(DecodeError::Price(PriceError::NotANumber(_)))
        ));
        assert!(matches!(
            decode_entry("a", json!("{oops")),
            Err(DecodeError::Parse(_))
        ));
        assert_eq!(decode_entry("a", json!(42)), Err(DecodeError::NotAnObject));
    }

    #[test]
    fn test_restore_unparseable_slot_is_empty() {
        assert!(restore_slot(Some("not json")).state.is_empty());
        assert!(restore_slot(Some("[1,2,3]")).state.is_empty());
        assert!(restore_slot(None).state.is_empty());
    }

    #[test]
    fn test_open_restores_from_storage() {
        let storage = MemoryStorage::with_cart_slot(
            json!({"t1": {"id": "t1", "name": "General", "price": 10, "quantity": 3, "image": ""}})
                .to_string(),
        );
        let store = CartStore::open(storage);
        assert_eq!(store.total_item_count(), 3);
        assert_eq!(store.total_price(), Decimal::from(30));
    }

    #[test]
    fn test_candidate_from_line_readds_same_item() {
        let mut store = store();
        store.add_item(candidate("t1", json!("12.5"))).unwrap();
        let again = CartCandidate::from(store.state().get("t1").unwrap());
        store.add_item(again).unwrap();

        assert_eq!(store.state().quantity_of("t1"), 2);
        assert_eq!(store.total_price(), Decimal::from(25));
    }
}
