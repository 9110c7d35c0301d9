//! Basket
//!
//! The quote basket and its lines, as persisted in client storage under the
//! `quoteBasket` key. A line is one product/colour combination; its unit
//! price is owned by the reconciler, which re-resolves it from the aggregate
//! quantity of all lines sharing the product code.
//!
//! Stored data is client-controlled and may be stale or corrupted, so every
//! read path here is lenient: an unreadable basket is an empty basket, and a
//! line's quantity fields accept any legacy shape and coerce.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{
    pricing::PricingCatalog,
    quantity::{Normalized, RawQty, RawSizeMap, SizeQuantities, lenient_size_map},
    reconcile::{Reconciliation, reconcile},
};

/// Product code used for grouping when a stored line carries none.
pub(crate) const UNKNOWN_CODE: &str = "UNKNOWN";

/// Errors related to basket mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BasketError {
    /// A line index was out of range.
    #[error("Basket line {0} not found")]
    LineNotFound(usize),
}

/// One product/colour combination in the quote basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLine")]
pub struct BasketLine {
    code: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,

    #[serde(rename = "color", skip_serializing_if = "Option::is_none")]
    colour: Option<String>,

    #[serde(rename = "image", skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    quantities: Option<SizeQuantities>,

    #[serde(rename = "quantity")]
    total: u32,

    #[serde(rename = "size", skip_serializing_if = "Option::is_none")]
    summary: Option<String>,

    #[serde(
        rename = "price",
        serialize_with = "two_decimal_string",
        skip_serializing_if = "Option::is_none"
    )]
    unit_price: Option<Decimal>,

    #[serde(
        rename = "basePrice",
        serialize_with = "two_decimal_string",
        skip_serializing_if = "Option::is_none"
    )]
    list_price: Option<Decimal>,

    // Set when deserialization had to repair the stored shape; consumed by
    // the next normalization pass.
    #[serde(skip)]
    pending_changed: bool,
}

fn two_decimal_string<S: serde::Serializer>(
    value: &Option<Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(amount) => serializer.serialize_str(&format!("{amount:.2}")),
        None => serializer.serialize_none(),
    }
}

/// A basket line exactly as persisted, before coercion into the canonical
/// shape. Older app versions stored the size map under `sizes` and quantity
/// fields as strings or floats; all of that is accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLine {
    code: Option<String>,
    name: Option<String>,
    color: Option<String>,
    image: Option<String>,
    #[serde(deserialize_with = "lenient_size_map")]
    quantities: Option<RawSizeMap>,
    #[serde(deserialize_with = "lenient_size_map")]
    sizes: Option<RawSizeMap>,
    size: Option<String>,
    quantity: Option<RawQty>,
    price: Option<RawQty>,
    #[serde(rename = "basePrice")]
    base_price: Option<RawQty>,
}

impl From<RawLine> for BasketLine {
    fn from(raw: RawLine) -> Self {
        let mut pending = false;

        // `quantities` is canonical; `sizes` is the legacy spelling. Data
        // arriving under the legacy field is always flagged so callers
        // persist the canonical shape.
        let (raw_map, legacy) = match (raw.quantities, raw.sizes) {
            (Some(map), _) => (Some(map), false),
            (None, Some(map)) => (Some(map), true),
            (None, None) => (None, false),
        };
        if legacy {
            pending = true;
        }

        let quantities = raw_map.map(|map| {
            let (coerced, lossy) = map.coerce();
            if lossy {
                pending = true;
            }
            coerced
        });

        let (flat, flat_lossy) = raw
            .quantity
            .as_ref()
            .map_or((0, false), RawQty::coerce_count);
        if flat_lossy && quantities.is_none() {
            pending = true;
        }

        Self {
            code: raw.code.unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
            colour: raw.color,
            image_url: raw.image,
            quantities,
            total: flat,
            summary: raw.size,
            unit_price: raw.price.as_ref().and_then(RawQty::as_decimal),
            list_price: raw.base_price.as_ref().and_then(RawQty::as_decimal),
            pending_changed: pending,
        }
    }
}

impl BasketLine {
    /// Create a line for a configured product.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            colour: None,
            image_url: None,
            quantities: None,
            total: 0,
            summary: None,
            unit_price: None,
            list_price: None,
            pending_changed: false,
        }
    }

    /// Set the display colour name.
    #[must_use]
    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = Some(colour.into());
        self
    }

    /// Set the display image URL.
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Set the per-size quantity map.
    #[must_use]
    pub fn with_quantities(mut self, quantities: SizeQuantities) -> Self {
        self.total = quantities.total();
        self.quantities = Some(quantities);
        self
    }

    /// Set a flat quantity for a line with no size distribution.
    #[must_use]
    pub fn with_flat_quantity(mut self, quantity: u32) -> Self {
        self.quantities = None;
        self.total = quantity;
        self
    }

    /// Set the undiscounted list price.
    #[must_use]
    pub fn with_list_price(mut self, list_price: Decimal) -> Self {
        self.list_price = Some(list_price);
        self
    }

    /// Product code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Product code for grouping; empty codes group under a sentinel.
    #[must_use]
    pub(crate) fn code_key(&self) -> &str {
        if self.code.is_empty() {
            UNKNOWN_CODE
        } else {
            &self.code
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display colour name, if any.
    #[must_use]
    pub fn colour(&self) -> Option<&str> {
        self.colour.as_deref()
    }

    /// Display image URL, if any.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Per-size quantity map, absent for legacy flat-quantity lines.
    #[must_use]
    pub fn quantities(&self) -> Option<&SizeQuantities> {
        self.quantities.as_ref()
    }

    /// Total units across the line.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.total
    }

    /// Human-readable size summary, e.g. `"5xS, 3xL"`.
    #[must_use]
    pub fn size_summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// VAT-exclusive unit price, as last resolved by the reconciler.
    #[must_use]
    pub fn unit_price(&self) -> Option<Decimal> {
        self.unit_price
    }

    /// Undiscounted reference price.
    #[must_use]
    pub fn list_price(&self) -> Option<Decimal> {
        self.list_price
    }

    pub(crate) fn set_list_price(&mut self, list_price: Decimal) {
        self.list_price = Some(list_price);
    }

    /// Replace the stored unit price if the freshly resolved one differs.
    ///
    /// Prices are compared by their fixed two-decimal representation, which
    /// is also how they are persisted.
    pub(crate) fn replace_unit_price(&mut self, resolved: Decimal) -> bool {
        let formatted = format!("{resolved:.2}");
        let stored = self.unit_price.map(|price| format!("{price:.2}"));

        if stored.as_deref() == Some(formatted.as_str()) {
            false
        } else {
            self.unit_price = Some(resolved);
            true
        }
    }

    /// Normalize the line's quantity representation in place.
    ///
    /// Rebuilds the size map without zero-quantity entries, recomputes the
    /// size summary and the total, and reports whether anything about the
    /// persisted representation changed. Lines with no size map keep their
    /// flat quantity. A line normalizing to zero is left in place; removal
    /// is the mutating caller's job.
    pub(crate) fn normalize(&mut self) -> Normalized {
        let mut changed = std::mem::take(&mut self.pending_changed);

        let total = if let Some(mut map) = self.quantities.take() {
            if map.drop_empty_sizes() {
                changed = true;
            }

            let summary = map.summary();
            if self.summary.as_deref() != Some(summary.as_str()) {
                self.summary = Some(summary);
                changed = true;
            }

            let total = map.total();
            self.quantities = Some(map);
            total
        } else {
            self.total
        };

        if self.total != total {
            self.total = total;
            changed = true;
        }

        Normalized { total, changed }
    }
}

/// The quote basket: an ordered sequence of lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Basket {
    lines: Vec<BasketLine>,
}

impl Basket {
    /// Create an empty basket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a basket with the given lines.
    #[must_use]
    pub fn with_lines(lines: impl Into<Vec<BasketLine>>) -> Self {
        Self {
            lines: lines.into(),
        }
    }

    /// Parse a persisted basket.
    ///
    /// Storage is client-controlled: unparseable or wrong-shaped input is
    /// treated as an empty basket, never an error.
    #[must_use]
    pub fn from_json_str(stored: &str) -> Self {
        serde_json::from_str(stored).unwrap_or_else(|error| {
            warn!(%error, "stored basket was unreadable; starting empty");
            Self::default()
        })
    }

    /// Serialize to the canonical persisted shape.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The lines in basket order.
    #[must_use]
    pub fn lines(&self) -> &[BasketLine] {
        &self.lines
    }

    pub(crate) fn lines_mut(&mut self) -> &mut [BasketLine] {
        &mut self.lines
    }

    /// Get a line by index.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::LineNotFound`] if the index is out of range.
    pub fn get_line(&self, index: usize) -> Result<&BasketLine, BasketError> {
        self.lines.get(index).ok_or(BasketError::LineNotFound(index))
    }

    /// Iterate over the lines in basket order.
    pub fn iter(&self) -> impl Iterator<Item = &BasketLine> {
        self.lines.iter()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check whether the basket has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total garment units across every line.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.total_quantity()))
    }

    /// Append a configured product line.
    pub fn push_line(&mut self, line: BasketLine) {
        self.lines.push(line);
    }

    /// Normalize every line and re-resolve unit prices from aggregate
    /// quantities. See [`reconcile`].
    pub fn reconcile(&mut self, catalog: &PricingCatalog) -> Reconciliation {
        reconcile(self, catalog)
    }

    /// Apply a quantity delta to a line, then reconcile.
    ///
    /// With a size label, the delta applies to that size's entry (creating
    /// it on increment); a size reaching zero is dropped, and a line whose
    /// map empties is removed. Without a size label the delta applies to the
    /// flat quantity, removing the line at zero. Callers persist the basket
    /// after every user-initiated mutation regardless of the reported
    /// `changed` flag.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::LineNotFound`] if the index is out of range.
    pub fn update_quantity(
        &mut self,
        index: usize,
        delta: i64,
        size: Option<&str>,
        catalog: &PricingCatalog,
    ) -> Result<Reconciliation, BasketError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(BasketError::LineNotFound(index))?;

        let remove_line = if let (Some(size_label), Some(map)) = (size, line.quantities.as_mut()) {
            let updated = i64::from(map.quantity(size_label)) + delta;
            if updated > 0 {
                map.set(size_label, clamp_count(updated));
                false
            } else {
                map.remove(size_label);
                map.is_empty()
            }
        } else {
            let updated = i64::from(line.total) + delta;
            if updated > 0 {
                line.total = clamp_count(updated);
                false
            } else {
                true
            }
        };

        if remove_line {
            self.lines.remove(index);
        }

        Ok(self.reconcile(catalog))
    }

    /// Remove a size row or a whole line, then reconcile.
    ///
    /// With a size label the size entry is removed, and the line goes with
    /// it if the map empties; without one the whole line is removed.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::LineNotFound`] if the index is out of range.
    pub fn remove(
        &mut self,
        index: usize,
        size: Option<&str>,
        catalog: &PricingCatalog,
    ) -> Result<Reconciliation, BasketError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(BasketError::LineNotFound(index))?;

        let remove_line = if let (Some(size_label), Some(map)) = (size, line.quantities.as_mut()) {
            map.remove(size_label);
            map.is_empty()
        } else {
            true
        };

        if remove_line {
            self.lines.remove(index);
        }

        Ok(self.reconcile(catalog))
    }
}

fn clamp_count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
