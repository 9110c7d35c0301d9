//! Quantities
//!
//! Canonical per-size quantity maps plus the lenient scalar handling needed to
//! read quantity-like values back out of client-controlled storage. Stored
//! baskets arrive in whatever shape an older page version left behind, so
//! every scalar here coerces instead of failing: negatives and junk become 0,
//! never an error.

use std::fmt;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, IgnoredAny, MapAccess, Visitor},
    ser::SerializeMap,
};
use smallvec::SmallVec;

/// Outcome of normalizing one basket line's quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized {
    /// Total units across the line after normalization.
    pub total: u32,
    /// Whether normalization altered the persisted representation.
    pub changed: bool,
}

/// An insertion-ordered size label -> quantity map.
///
/// Serializes as a JSON map; deserialization preserves document order, which
/// is also the order the size summary string is built in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeQuantities {
    entries: SmallVec<[(String, u32); 6]>,
}

impl SizeQuantities {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantity for a size, appending the size if it is new.
    pub fn set(&mut self, size: &str, quantity: u32) {
        if let Some(entry) = self.entries.iter_mut().find(|(label, _)| label == size) {
            entry.1 = quantity;
        } else {
            self.entries.push((size.to_string(), quantity));
        }
    }

    /// Get the quantity for a size (0 when the size is absent).
    #[must_use]
    pub fn quantity(&self, size: &str) -> u32 {
        self.entries
            .iter()
            .find(|(label, _)| label == size)
            .map_or(0, |(_, quantity)| *quantity)
    }

    /// Remove a size, returning whether it was present.
    pub fn remove(&mut self, size: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(label, _)| label != size);
        self.entries.len() != before
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .map(|(label, quantity)| (label.as_str(), *quantity))
    }

    /// Number of sizes present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no sizes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |sum, (_, quantity)| sum.saturating_add(*quantity))
    }

    /// Drop entries with a zero quantity, returning whether any were dropped.
    pub fn drop_empty_sizes(&mut self) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(_, quantity)| *quantity > 0);
        self.entries.len() != before
    }

    /// Build the human-readable summary, e.g. `"5xS, 3xL"`.
    ///
    /// Zero-quantity entries are skipped; an empty map yields an empty string.
    #[must_use]
    pub fn summary(&self) -> String {
        let segments: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, quantity)| *quantity > 0)
            .map(|(size, quantity)| format!("{quantity}x{size}"))
            .collect();

        segments.join(", ")
    }
}

impl FromIterator<(String, u32)> for SizeQuantities {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for SizeQuantities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (size, quantity) in &self.entries {
            map.serialize_entry(size, quantity)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SizeQuantities {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SizeQuantitiesVisitor;

        impl<'de> Visitor<'de> for SizeQuantitiesVisitor {
            type Value = SizeQuantities;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of size labels to quantities")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = SmallVec::new();
                while let Some((size, quantity)) = access.next_entry::<String, u32>()? {
                    entries.push((size, quantity));
                }
                Ok(SizeQuantities { entries })
            }
        }

        deserializer.deserialize_map(SizeQuantitiesVisitor)
    }
}

/// A quantity-like scalar as found in persisted storage.
///
/// Client storage has carried integers, floats, numeric strings, nulls and
/// booleans in quantity and price positions across app versions. `RawQty`
/// accepts them all and coerces on demand; maps and arrays in a scalar
/// position decode as [`RawQty::Missing`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawQty {
    /// A non-negative integer.
    Count(u64),
    /// A negative integer.
    Signed(i64),
    /// A floating-point number.
    Real(f64),
    /// A string, possibly numeric.
    Text(String),
    /// A boolean.
    Flag(bool),
    /// Null, or a shape that is not a scalar at all.
    Missing,
}

impl RawQty {
    /// Coerce to a quantity.
    ///
    /// Returns the coerced count and whether the coercion was lossy, i.e.
    /// whether re-serializing the coerced value would differ from what was
    /// stored. Negatives and non-numeric values coerce to `(0, true)`.
    #[must_use]
    pub fn coerce_count(&self) -> (u32, bool) {
        match self {
            Self::Count(value) => decimal_to_count(Decimal::from(*value)),
            Self::Signed(value) => decimal_to_count(Decimal::from(*value)),
            Self::Real(value) => Decimal::from_f64(*value).map_or((0, true), decimal_to_count),
            Self::Text(value) => {
                let (count, _) = value
                    .trim()
                    .parse::<Decimal>()
                    .map_or((0, true), decimal_to_count);
                // The stored representation changes even when the digits parse
                // cleanly, so a string is always lossy.
                (count, true)
            }
            Self::Flag(_) | Self::Missing => (0, true),
        }
    }

    /// Interpret as a monetary amount, if the scalar is numeric.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Count(value) => Some(Decimal::from(*value)),
            Self::Signed(value) => Some(Decimal::from(*value)),
            Self::Real(value) => Decimal::from_f64(*value),
            Self::Text(value) => value.trim().parse().ok(),
            Self::Flag(_) | Self::Missing => None,
        }
    }
}

fn decimal_to_count(value: Decimal) -> (u32, bool) {
    if value.is_sign_negative() {
        return (0, true);
    }

    let truncated = value.trunc();
    match truncated.to_u32() {
        Some(count) => (count, truncated != value),
        None => (u32::MAX, true),
    }
}

impl<'de> Deserialize<'de> for RawQty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawQtyVisitor;

        impl<'de> Visitor<'de> for RawQtyVisitor {
            type Value = RawQty;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a quantity-like scalar")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(RawQty::Count(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                if value >= 0 {
                    Ok(RawQty::Count(value.unsigned_abs()))
                } else {
                    Ok(RawQty::Signed(value))
                }
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                Ok(RawQty::Real(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(RawQty::Text(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(RawQty::Text(value))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
                Ok(RawQty::Flag(value))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(RawQty::Missing)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(RawQty::Missing)
            }

            fn visit_some<D2: Deserializer<'de>>(
                self,
                deserializer: D2,
            ) -> Result<Self::Value, D2::Error> {
                deserializer.deserialize_any(self)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                while access.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(RawQty::Missing)
            }

            fn visit_seq<A: de::SeqAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                while access.next_element::<IgnoredAny>()?.is_some() {}
                Ok(RawQty::Missing)
            }
        }

        deserializer.deserialize_any(RawQtyVisitor)
    }
}

/// A size map exactly as stored, before coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawSizeMap {
    entries: Vec<(String, RawQty)>,
}

impl RawSizeMap {
    /// Coerce every entry, keeping zeros so the normalizer can both drop them
    /// and detect that it did. Returns the map and whether any single value
    /// coerced lossily.
    pub(crate) fn coerce(&self) -> (SizeQuantities, bool) {
        let mut lossy = false;
        let mut coerced = SizeQuantities::new();

        for (size, raw) in &self.entries {
            let (quantity, entry_lossy) = raw.coerce_count();
            if entry_lossy {
                lossy = true;
            }
            coerced.set(size, quantity);
        }

        (coerced, lossy)
    }
}

/// Deserialize an optional size map, treating any non-map shape as absent.
pub(crate) fn lenient_size_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RawSizeMap>, D::Error> {
    struct LenientMapVisitor;

    impl<'de> Visitor<'de> for LenientMapVisitor {
        type Value = Option<RawSizeMap>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a size map, or any non-map shape to ignore")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some((size, raw)) = access.next_entry::<String, RawQty>()? {
                entries.push((size, raw));
            }
            Ok(Some(RawSizeMap { entries }))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(
            self,
            deserializer: D2,
        ) -> Result<Self::Value, D2::Error> {
            deserializer.deserialize_any(self)
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_seq<A: de::SeqAccess<'de>>(
            self,
            mut access: A,
        ) -> Result<Self::Value, A::Error> {
            while access.next_element::<IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientMapVisitor)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn summary_skips_zero_quantities() {
        let mut quantities = SizeQuantities::new();
        quantities.set("S", 5);
        quantities.set("M", 0);
        quantities.set("L", 3);

        assert_eq!(quantities.summary(), "5xS, 3xL");
    }

    #[test]
    fn summary_of_empty_map_is_empty() {
        assert_eq!(SizeQuantities::new().summary(), "");
    }

    #[test]
    fn set_updates_in_place_preserving_order() {
        let mut quantities = SizeQuantities::new();
        quantities.set("S", 1);
        quantities.set("M", 2);
        quantities.set("S", 9);

        let entries: Vec<(&str, u32)> = quantities.iter().collect();

        assert_eq!(entries, vec![("S", 9), ("M", 2)]);
    }

    #[test]
    fn drop_empty_sizes_reports_removal() {
        let mut quantities = SizeQuantities::new();
        quantities.set("S", 5);
        quantities.set("M", 0);

        assert!(quantities.drop_empty_sizes());
        assert_eq!(quantities.len(), 1);
        assert!(!quantities.drop_empty_sizes());
    }

    #[test]
    fn deserialization_preserves_document_order() -> TestResult {
        let quantities: SizeQuantities = serde_json::from_str(r#"{"XL":2,"S":7,"M":1}"#)?;

        let sizes: Vec<&str> = quantities.iter().map(|(size, _)| size).collect();

        assert_eq!(sizes, vec!["XL", "S", "M"]);
        Ok(())
    }

    #[test]
    fn round_trips_through_json() -> TestResult {
        let mut quantities = SizeQuantities::new();
        quantities.set("S", 5);
        quantities.set("L", 3);

        let encoded = serde_json::to_string(&quantities)?;
        assert_eq!(encoded, r#"{"S":5,"L":3}"#);

        let decoded: SizeQuantities = serde_json::from_str(&encoded)?;
        assert_eq!(decoded, quantities);
        Ok(())
    }

    #[test]
    fn integer_counts_coerce_losslessly() {
        assert_eq!(RawQty::Count(5).coerce_count(), (5, false));
        assert_eq!(RawQty::Real(3.0).coerce_count(), (3, false));
    }

    #[test]
    fn negative_counts_coerce_to_zero() {
        assert_eq!(RawQty::Signed(-4).coerce_count(), (0, true));
        assert_eq!(RawQty::Real(-2.5).coerce_count(), (0, true));
    }

    #[test]
    fn fractional_counts_truncate_and_flag() {
        assert_eq!(RawQty::Real(2.7).coerce_count(), (2, true));
    }

    #[test]
    fn numeric_strings_coerce_but_flag() {
        assert_eq!(RawQty::Text("5".to_string()).coerce_count(), (5, true));
        assert_eq!(RawQty::Text(" 12 ".to_string()).coerce_count(), (12, true));
    }

    #[test]
    fn junk_coerces_to_zero() {
        assert_eq!(RawQty::Text("many".to_string()).coerce_count(), (0, true));
        assert_eq!(RawQty::Flag(true).coerce_count(), (0, true));
        assert_eq!(RawQty::Missing.coerce_count(), (0, true));
    }

    #[test]
    fn raw_qty_decodes_non_scalars_as_missing() -> TestResult {
        let raw: RawQty = serde_json::from_str(r#"{"nested": true}"#)?;
        assert_eq!(raw, RawQty::Missing);

        let raw: RawQty = serde_json::from_str("[1, 2]")?;
        assert_eq!(raw, RawQty::Missing);
        Ok(())
    }

    #[test]
    fn as_decimal_parses_numbers_and_strings() {
        use rust_decimal::Decimal;

        assert_eq!(
            RawQty::Text("16.54".to_string()).as_decimal(),
            Some(Decimal::new(1654, 2))
        );
        assert_eq!(RawQty::Count(17).as_decimal(), Some(Decimal::from(17)));
        assert_eq!(RawQty::Missing.as_decimal(), None);
    }
}
