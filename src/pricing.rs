//! Pricing
//!
//! Volume-discount ladders keyed by product code. A ladder is resolved
//! against the *aggregate* quantity of a product code across the whole
//! basket, never a single line's quantity, so two lines of the same garment
//! in different sizes always price identically.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One rung of a volume-discount ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Smallest aggregate quantity this tier applies to.
    #[serde(rename = "min")]
    pub min_quantity: u32,

    /// VAT-exclusive unit price at this tier.
    #[serde(rename = "price")]
    pub unit_price: Decimal,
}

/// A price break as returned by the remote product catalog API.
///
/// `max` is advisory display data; resolution only ever consults `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreak {
    /// Smallest quantity the break applies to.
    pub min: u32,
    /// Largest quantity the break applies to (display only).
    pub max: u32,
    /// VAT-exclusive unit price within the break.
    pub price: Decimal,
}

/// The full discount ladder for one product code.
///
/// Tiers are held in descending `min_quantity` order; resolution scans from
/// the top and the first tier whose threshold is met wins, so exactly one
/// tier ever applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingLadder {
    list_price: Decimal,
    tiers: Vec<PriceTier>,
}

impl PricingLadder {
    /// Create a ladder from an undiscounted list price and its tiers.
    ///
    /// Tier order in the input is irrelevant; they are re-sorted descending.
    #[must_use]
    pub fn new(list_price: Decimal, mut tiers: Vec<PriceTier>) -> Self {
        tiers.sort_by(|a, b| b.min_quantity.cmp(&a.min_quantity));
        Self { list_price, tiers }
    }

    /// Adapt the catalog API's price-break array into a ladder.
    ///
    /// The break with the lowest `min` supplies the list price. Returns
    /// `None` for an empty array.
    #[must_use]
    pub fn from_price_breaks(breaks: &[PriceBreak]) -> Option<Self> {
        let list_price = breaks
            .iter()
            .min_by_key(|price_break| price_break.min)?
            .price;

        let tiers = breaks
            .iter()
            .map(|price_break| PriceTier {
                min_quantity: price_break.min,
                unit_price: price_break.price,
            })
            .collect();

        Some(Self::new(list_price, tiers))
    }

    /// The undiscounted reference price.
    #[must_use]
    pub fn list_price(&self) -> Decimal {
        self.list_price
    }

    /// Tiers in descending `min_quantity` order.
    #[must_use]
    pub fn tiers(&self) -> &[PriceTier] {
        &self.tiers
    }

    /// Resolve the unit price for an aggregate quantity.
    ///
    /// A ladder whose lowest threshold exceeds the quantity is a
    /// configuration gap, not an error; the list price applies.
    #[must_use]
    pub fn resolve(&self, aggregate_quantity: u32) -> Decimal {
        self.tiers
            .iter()
            .find(|tier| tier.min_quantity <= aggregate_quantity)
            .map_or(self.list_price, |tier| tier.unit_price)
    }
}

/// Ladders for every product code with volume pricing.
#[derive(Debug, Clone, Default)]
pub struct PricingCatalog {
    ladders: FxHashMap<String, PricingLadder>,
}

impl PricingCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ladder for a product code, replacing any existing one.
    pub fn insert(&mut self, code: impl Into<String>, ladder: PricingLadder) {
        self.ladders.insert(code.into(), ladder);
    }

    /// Look up a product code's ladder.
    #[must_use]
    pub fn ladder(&self, code: &str) -> Option<&PricingLadder> {
        self.ladders.get(code)
    }

    /// Resolve the unit price for a product code at an aggregate quantity.
    ///
    /// Codes absent from the catalog degrade to the caller-supplied fallback
    /// (the line's list price or previously stored price), or zero when no
    /// fallback is known.
    #[must_use]
    pub fn resolve(
        &self,
        code: &str,
        aggregate_quantity: u32,
        fallback: Option<Decimal>,
    ) -> Decimal {
        match self.ladders.get(code) {
            Some(ladder) => ladder.resolve(aggregate_quantity),
            None => fallback.unwrap_or_default(),
        }
    }

    /// Number of product codes with a ladder.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ladders.len()
    }

    /// Check whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ladders.is_empty()
    }
}
