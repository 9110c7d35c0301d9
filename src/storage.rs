//! Storage
//!
//! The boundary with client-persisted storage. The basket lives under a
//! well-known local key; the position ledger and the in-progress product
//! configuration live under session-scoped keys and are cleared together
//! when the basket becomes empty.
//!
//! Every load path recovers: a corrupt or missing value yields empty or
//! default state and a warning, never an error. Consistency across tabs is
//! last-write-wins by design; no locking is attempted.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    basket::{Basket, BasketLine},
    customization::Customization,
    ledger::PositionLedger,
    positions::Method,
};

/// Local-storage key holding the basket.
pub const BASKET_KEY: &str = "quoteBasket";

/// Session key holding the in-progress product configuration.
pub const PRODUCT_KEY: &str = "customizingProduct";

/// Session key holding the selected positions.
pub const POSITIONS_KEY: &str = "selectedPositions";

/// Session key holding the per-position methods.
pub const METHODS_KEY: &str = "positionMethods";

/// Session key holding the per-position customizations.
pub const CUSTOMIZATIONS_KEY: &str = "positionCustomizations";

/// Session key holding the configuration-flow step index.
pub const STEP_KEY: &str = "currentPositionIndex";

/// All session-scoped keys, cleared together.
pub const SESSION_KEYS: [&str; 5] = [
    PRODUCT_KEY,
    POSITIONS_KEY,
    METHODS_KEY,
    CUSTOMIZATIONS_KEY,
    STEP_KEY,
];

/// A key-value store of persisted strings, as the client provides.
pub trait ClientStore {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&mut self, key: &str, value: &str);

    /// Delete a value.
    fn remove(&mut self, key: &str);
}

/// An in-memory [`ClientStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: FxHashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

fn read_json<T: DeserializeOwned>(store: &dyn ClientStore, key: &str) -> Option<T> {
    let stored = store.get(key)?;
    match serde_json::from_str(&stored) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, %error, "discarding unreadable stored value");
            None
        }
    }
}

fn write_json<T: Serialize>(store: &mut dyn ClientStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(encoded) => store.set(key, &encoded),
        Err(error) => {
            warn!(key, %error, "failed to encode value; stored copy left unchanged");
        }
    }
}

/// Load the basket, treating corrupt or missing data as empty.
#[must_use]
pub fn load_basket(store: &dyn ClientStore) -> Basket {
    store
        .get(BASKET_KEY)
        .map_or_else(Basket::new, |stored| Basket::from_json_str(&stored))
}

/// Persist the basket.
pub fn save_basket(store: &mut dyn ClientStore, basket: &Basket) {
    write_json(store, BASKET_KEY, basket);
}

/// Persist the basket and, when it has emptied, clear all session state
/// with it.
pub fn sync_after_mutation(store: &mut dyn ClientStore, basket: &Basket) {
    save_basket(store, basket);

    if basket.is_empty() {
        debug!("basket emptied; clearing session state");
        clear_session(store);
    }
}

/// Load the in-progress product configuration, if one is stored.
#[must_use]
pub fn load_current_product(store: &dyn ClientStore) -> Option<BasketLine> {
    read_json(store, PRODUCT_KEY)
}

/// Persist the in-progress product configuration.
pub fn save_current_product(store: &mut dyn ClientStore, product: &BasketLine) {
    write_json(store, PRODUCT_KEY, product);
}

/// A stored position selection. Current versions persist a bare name;
/// older ones persisted a record carrying the method and rate snapshots.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredSelection {
    Name(String),
    Entry {
        position: String,
        #[serde(default)]
        method: Option<Method>,
    },
}

/// Load the position ledger from its session keys.
///
/// Selections whose method cannot be recovered are skipped rather than
/// defaulted: a position is never activated without an explicit method.
#[must_use]
pub fn load_ledger(store: &dyn ClientStore) -> PositionLedger {
    let selections: Vec<StoredSelection> = read_json(store, POSITIONS_KEY).unwrap_or_default();
    let methods: FxHashMap<String, Method> = read_json(store, METHODS_KEY).unwrap_or_default();
    let customizations: Vec<Option<Customization>> =
        read_json(store, CUSTOMIZATIONS_KEY).unwrap_or_default();
    let step: usize = store
        .get(STEP_KEY)
        .and_then(|stored| stored.trim().parse().ok())
        .unwrap_or(0);

    let mut ledger = PositionLedger::new();
    for (slot, selection) in selections.into_iter().enumerate() {
        let (position, fallback_method) = match selection {
            StoredSelection::Name(position) => (position, None),
            StoredSelection::Entry { position, method } => (position, method),
        };

        let Some(method) = methods.get(&position).copied().or(fallback_method) else {
            warn!(%position, "stored selection has no method; skipping");
            continue;
        };

        ledger.choose_method(&position, method);

        if let Some(customization) = customizations.get(slot).cloned().flatten() {
            if let Err(error) = ledger.customize(&position, customization.artifact) {
                warn!(%position, %error, "dropping stored customization");
            }
        }
    }

    ledger.set_step(step);
    ledger
}

/// Persist the position ledger to its session keys.
///
/// An empty ledger removes its keys entirely.
pub fn save_ledger(store: &mut dyn ClientStore, ledger: &PositionLedger) {
    if ledger.is_empty() {
        store.remove(POSITIONS_KEY);
        store.remove(METHODS_KEY);
        store.remove(CUSTOMIZATIONS_KEY);
        store.remove(STEP_KEY);
        return;
    }

    write_json(store, POSITIONS_KEY, &ledger.selected());

    let methods: FxHashMap<&str, Method> = ledger
        .entries()
        .map(|(position, method, _)| (position, method))
        .collect();
    write_json(store, METHODS_KEY, &methods);

    let customizations: Vec<Option<&Customization>> = ledger
        .selected()
        .iter()
        .map(|position| ledger.customization(position))
        .collect();
    write_json(store, CUSTOMIZATIONS_KEY, &customizations);

    store.set(STEP_KEY, &ledger.step().to_string());
}

/// Remove all session-scoped state.
pub fn clear_session(store: &mut dyn ClientStore) {
    for key in SESSION_KEYS {
        store.remove(key);
    }
}
