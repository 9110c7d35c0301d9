//! Reconciliation
//!
//! The pass that keeps a persisted basket consistent: normalize every line's
//! quantity shape, then re-resolve every line's unit price from its product
//! code's aggregate quantity. Runs after every mutation and on every basket
//! load, and is idempotent, so callers may invoke it as often as they like.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{basket::Basket, pricing::PricingCatalog};

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Whether the pass altered the basket's persisted representation.
    ///
    /// Informational: callers persist unconditionally after user-initiated
    /// mutations and may use this to skip redundant writes during passive
    /// reconciliation (e.g. page load).
    pub changed: bool,

    /// Aggregate quantity per product code, for average-price displays and
    /// customization cost aggregation. Codes whose lines all normalized to
    /// zero are absent.
    pub totals_by_code: FxHashMap<String, u32>,
}

/// Normalize quantities and re-resolve prices across the whole basket.
///
/// Two lines sharing a product code always end up with the same unit price,
/// resolved from their *combined* quantity; this is the volume-discount
/// guarantee. A freshly resolved price always overrides a stored one: stored
/// prices are a cache of the last resolution, never authoritative. Lines
/// with a zero quantity are tolerated (excluded from the totals, priced
/// harmlessly); removing them is the mutation paths' responsibility.
pub fn reconcile(basket: &mut Basket, catalog: &PricingCatalog) -> Reconciliation {
    let mut totals_by_code: FxHashMap<String, u32> = FxHashMap::default();
    let mut changed = false;

    for line in basket.lines_mut() {
        let normalized = line.normalize();
        if normalized.changed {
            changed = true;
        }
        if normalized.total > 0 {
            let entry = totals_by_code.entry(line.code_key().to_string()).or_insert(0);
            *entry = entry.saturating_add(normalized.total);
        }
    }

    for line in basket.lines_mut() {
        let aggregate = totals_by_code.get(line.code_key()).copied().unwrap_or(0);
        let fallback = line.list_price().or_else(|| line.unit_price());

        if line.list_price().is_none() {
            if let Some(ladder) = catalog.ladder(line.code_key()) {
                line.set_list_price(ladder.list_price());
                changed = true;
            }
        }

        let resolved = catalog.resolve(line.code_key(), aggregate, fallback);
        if line.replace_unit_price(resolved) {
            changed = true;
        }
    }

    debug!(
        changed,
        lines = basket.len(),
        codes = totals_by_code.len(),
        "basket reconciled"
    );

    Reconciliation {
        changed,
        totals_by_code,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        basket::BasketLine,
        pricing::{PriceTier, PricingLadder},
        quantity::SizeQuantities,
    };

    use super::*;

    fn gd067_catalog() -> PricingCatalog {
        let mut catalog = PricingCatalog::new();
        catalog.insert(
            "GD067",
            PricingLadder::new(
                Decimal::new(1758, 2),
                vec![
                    PriceTier {
                        min_quantity: 1,
                        unit_price: Decimal::new(1758, 2),
                    },
                    PriceTier {
                        min_quantity: 10,
                        unit_price: Decimal::new(1654, 2),
                    },
                    PriceTier {
                        min_quantity: 25,
                        unit_price: Decimal::new(1618, 2),
                    },
                ],
            ),
        );
        catalog
    }

    fn sized_line(code: &str, pairs: &[(&str, u32)]) -> BasketLine {
        let mut quantities = SizeQuantities::new();
        for (size, quantity) in pairs {
            quantities.set(size, *quantity);
        }
        BasketLine::new(code, "Test Hoodie").with_quantities(quantities)
    }

    #[test]
    fn unset_price_is_resolved_from_aggregate_quantity() -> TestResult {
        let catalog = gd067_catalog();
        let mut basket = Basket::with_lines([sized_line("GD067", &[("S", 5), ("M", 5)])]);

        let outcome = reconcile(&mut basket, &catalog);

        assert!(outcome.changed, "first resolution must report a change");
        assert_eq!(outcome.totals_by_code.get("GD067"), Some(&10));

        let line = basket.get_line(0)?;
        assert_eq!(line.total_quantity(), 10);
        assert_eq!(line.unit_price(), Some(Decimal::new(1654, 2)));
        Ok(())
    }

    #[test]
    fn reconcile_is_idempotent() -> TestResult {
        let catalog = gd067_catalog();
        let mut basket = Basket::with_lines([
            sized_line("GD067", &[("S", 5), ("M", 0), ("L", 3)]),
            sized_line("GD067", &[("XL", 4)]),
        ]);

        let first = reconcile(&mut basket, &catalog);
        let snapshot = basket.to_json_string()?;
        let second = reconcile(&mut basket, &catalog);

        assert!(first.changed);
        assert!(!second.changed, "second pass must be a no-op");
        assert_eq!(basket.to_json_string()?, snapshot);
        assert_eq!(first.totals_by_code, second.totals_by_code);
        Ok(())
    }

    #[test]
    fn lines_sharing_a_code_price_identically() -> TestResult {
        let catalog = gd067_catalog();
        // 14 + 11 = 25 units: each line alone sits in the 10-tier, together
        // they reach the 25-tier.
        let mut basket = Basket::with_lines([
            sized_line("GD067", &[("S", 14)]),
            sized_line("GD067", &[("L", 11)]),
        ]);

        reconcile(&mut basket, &catalog);

        assert_eq!(
            basket.get_line(0)?.unit_price(),
            Some(Decimal::new(1618, 2))
        );
        assert_eq!(
            basket.get_line(0)?.unit_price(),
            basket.get_line(1)?.unit_price()
        );
        Ok(())
    }

    #[test]
    fn zero_quantity_line_is_excluded_from_totals() {
        let catalog = gd067_catalog();
        let mut basket = Basket::with_lines([sized_line("GD067", &[("S", 0)])]);

        let outcome = reconcile(&mut basket, &catalog);

        assert!(!outcome.totals_by_code.contains_key("GD067"));
        // Defensive tolerance only: the line itself stays until a mutation
        // path removes it.
        assert_eq!(basket.len(), 1);
    }

    #[test]
    fn missing_list_price_is_backfilled_from_ladder() -> TestResult {
        let catalog = gd067_catalog();
        let mut basket = Basket::with_lines([sized_line("GD067", &[("S", 5)])]);

        reconcile(&mut basket, &catalog);

        assert_eq!(
            basket.get_line(0)?.list_price(),
            Some(Decimal::new(1758, 2))
        );
        Ok(())
    }

    #[test]
    fn unknown_code_keeps_stored_price_as_fallback() -> TestResult {
        let catalog = gd067_catalog();
        let mut basket = Basket::from_json_str(
            r#"[{"code":"ZZ999","quantities":{"S":4},"quantity":4,"price":"9.99"}]"#,
        );

        let outcome = reconcile(&mut basket, &catalog);

        assert_eq!(basket.get_line(0)?.unit_price(), Some(Decimal::new(999, 2)));
        assert_eq!(outcome.totals_by_code.get("ZZ999"), Some(&4));
        Ok(())
    }

    #[test]
    fn lines_without_a_code_group_together() {
        let catalog = PricingCatalog::new();
        let mut basket = Basket::from_json_str(
            r#"[{"quantities":{"S":2},"quantity":2},{"quantities":{"M":3},"quantity":3}]"#,
        );

        let outcome = reconcile(&mut basket, &catalog);

        assert_eq!(outcome.totals_by_code.get("UNKNOWN"), Some(&5));
    }
}
