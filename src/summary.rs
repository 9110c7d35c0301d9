//! Order summary
//!
//! The cost breakdown shown alongside the basket: garment cost from the
//! reconciled lines, per-position application costs, the one-time
//! logo-setup fee, delivery and VAT. Every position's application cost is
//! charged per total garment unit across the whole basket, mirroring the
//! reconciler's aggregate pricing rule.

use rust_decimal::Decimal;

use crate::{
    basket::Basket,
    customization::Artifact,
    ledger::PositionLedger,
    positions::{Method, PositionCatalog},
    vat::VatDisplay,
};

/// One-time fee applied when any position carries an uploaded logo.
fn logo_setup_fee() -> Decimal {
    Decimal::new(1200, 2)
}

/// One application cost row in the breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationCost {
    /// The position this row is for.
    pub position: String,
    /// Display label, e.g. `"Left Breast Embroidery"` or `"Large Back Text"`.
    pub label: String,
    /// The method the cost was looked up with.
    pub method: Method,
    /// Unit cost from the position table.
    pub unit_cost: Decimal,
    /// Aggregate garment quantity the unit cost is multiplied by.
    pub quantity: u32,
    /// Row total.
    pub total: Decimal,
}

/// The full VAT-exclusive cost breakdown for the current order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostBreakdown {
    /// Garment cost: sum of unit price x quantity over every line.
    pub garment: Decimal,
    /// Per-position application rows.
    pub applications: Vec<ApplicationCost>,
    /// Sum of the application rows.
    pub application_total: Decimal,
    /// One-time logo-setup fee, zero when no position has an uploaded logo.
    pub logo_setup: Decimal,
    /// Delivery cost (currently always free).
    pub delivery: Decimal,
    /// Garment + applications + logo setup + delivery.
    pub subtotal: Decimal,
    /// VAT on the subtotal at the display collaborator's rate.
    pub vat: Decimal,
}

impl CostBreakdown {
    /// Compute the breakdown for the current basket and ledger state.
    ///
    /// Positions missing from the price table contribute no row; that is a
    /// configuration gap, not an error.
    #[must_use]
    pub fn compute(
        basket: &Basket,
        ledger: &PositionLedger,
        positions: &PositionCatalog,
        vat: &dyn VatDisplay,
    ) -> Self {
        let aggregate_units = basket.total_units();
        let aggregate = Decimal::from(aggregate_units);

        let garment = basket
            .iter()
            .map(|line| {
                line.unit_price().unwrap_or_default() * Decimal::from(line.total_quantity())
            })
            .sum::<Decimal>();

        let mut applications = Vec::new();
        let mut application_total = Decimal::ZERO;

        for (position, method, customization) in ledger.entries() {
            let Some(unit_cost) = positions.unit_cost(position, method) else {
                continue;
            };

            let total = unit_cost * aggregate;
            application_total += total;

            let type_label = match customization.map(|customization| &customization.artifact) {
                Some(Artifact::Text { .. }) => "Text",
                _ => method.label(),
            };

            applications.push(ApplicationCost {
                position: position.to_string(),
                label: format!("{position} {type_label}"),
                method,
                unit_cost,
                quantity: aggregate_units,
                total,
            });
        }

        let logo_setup = if ledger.has_logo_upload() {
            logo_setup_fee()
        } else {
            Decimal::ZERO
        };

        let delivery = Decimal::ZERO;
        let subtotal = garment + application_total + logo_setup + delivery;
        let vat_amount = vat.rate() * subtotal;

        Self {
            garment,
            applications,
            application_total,
            logo_setup,
            delivery,
            subtotal,
            vat: vat_amount,
        }
    }

    /// The subtotal with VAT added.
    #[must_use]
    pub fn total_inc_vat(&self) -> Decimal {
        self.subtotal + self.vat
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        basket::BasketLine,
        customization::{Artifact, LogoFile, TextStyle},
        pricing::{PriceTier, PricingCatalog, PricingLadder},
        quantity::SizeQuantities,
        vat::StandardVat,
    };

    use super::*;

    fn reconciled_basket(units: &[(&str, u32)]) -> Basket {
        let mut catalog = PricingCatalog::new();
        catalog.insert(
            "GD067",
            PricingLadder::new(
                Decimal::new(1758, 2),
                vec![PriceTier {
                    min_quantity: 1,
                    unit_price: Decimal::new(1654, 2),
                }],
            ),
        );

        let mut quantities = SizeQuantities::new();
        for (size, quantity) in units {
            quantities.set(size, *quantity);
        }

        let mut basket =
            Basket::with_lines([BasketLine::new("GD067", "Test Hoodie").with_quantities(quantities)]);
        basket.reconcile(&catalog);
        basket
    }

    #[test]
    fn application_costs_use_aggregate_quantity() -> TestResult {
        let basket = reconciled_basket(&[("S", 7), ("M", 5)]);

        let mut ledger = PositionLedger::new();
        ledger.choose_method("Left Breast", Method::Embroidery);
        ledger.customize(
            "Left Breast",
            Artifact::Text {
                text: "Crew".to_string(),
                style: TextStyle::default(),
            },
        )?;
        ledger.choose_method("Right Breast", Method::Print);
        ledger.customize(
            "Right Breast",
            Artifact::Text {
                text: "2026".to_string(),
                style: TextStyle::default(),
            },
        )?;

        let breakdown = CostBreakdown::compute(
            &basket,
            &ledger,
            &PositionCatalog::standard(),
            &StandardVat::new(false),
        );

        // 5.00 x 12 + 3.50 x 12 = 102.00, no logo fee for text artifacts.
        assert_eq!(breakdown.application_total, Decimal::new(10200, 2));
        assert_eq!(breakdown.logo_setup, Decimal::ZERO);
        Ok(())
    }

    #[test]
    fn logo_upload_adds_one_time_setup_fee() -> TestResult {
        let basket = reconciled_basket(&[("S", 2)]);

        let mut ledger = PositionLedger::new();
        ledger.choose_method("Left Breast", Method::Embroidery);
        ledger.customize(
            "Left Breast",
            Artifact::logo(
                &LogoFile {
                    name: "logo.png",
                    mime: "image/png",
                    size_bytes: 1024,
                },
                "payload",
            )?,
        )?;
        ledger.choose_method("Large Back", Method::Print);
        ledger.customize(
            "Large Back",
            Artifact::logo(
                &LogoFile {
                    name: "back.png",
                    mime: "image/png",
                    size_bytes: 1024,
                },
                "payload",
            )?,
        )?;

        let breakdown = CostBreakdown::compute(
            &basket,
            &ledger,
            &PositionCatalog::standard(),
            &StandardVat::new(false),
        );

        // The fee applies once, not per uploaded logo.
        assert_eq!(breakdown.logo_setup, Decimal::new(1200, 2));
        Ok(())
    }

    #[test]
    fn garment_cost_sums_price_times_quantity() {
        let basket = reconciled_basket(&[("S", 3)]);

        let breakdown = CostBreakdown::compute(
            &basket,
            &PositionLedger::new(),
            &PositionCatalog::standard(),
            &StandardVat::new(false),
        );

        assert_eq!(breakdown.garment, Decimal::new(4962, 2));
        assert_eq!(breakdown.application_total, Decimal::ZERO);
        assert_eq!(breakdown.subtotal, Decimal::new(4962, 2));
    }

    #[test]
    fn vat_is_twenty_percent_of_subtotal() {
        let basket = reconciled_basket(&[("S", 3)]);

        let breakdown = CostBreakdown::compute(
            &basket,
            &PositionLedger::new(),
            &PositionCatalog::standard(),
            &StandardVat::new(false),
        );

        // 49.62 * 0.20 = 9.924; VAT stays full precision until display.
        assert_eq!(breakdown.vat, Decimal::new(9924, 3));
        assert_eq!(breakdown.total_inc_vat(), Decimal::new(59544, 3));
    }

    #[test]
    fn text_artifacts_label_as_text() -> TestResult {
        let basket = reconciled_basket(&[("S", 1)]);

        let mut ledger = PositionLedger::new();
        ledger.choose_method("Large Back", Method::Print);
        ledger.customize(
            "Large Back",
            Artifact::Text {
                text: "Est. 1998".to_string(),
                style: TextStyle::default(),
            },
        )?;

        let breakdown = CostBreakdown::compute(
            &basket,
            &ledger,
            &PositionCatalog::standard(),
            &StandardVat::new(false),
        );

        assert_eq!(
            breakdown.applications.first().map(|row| row.label.as_str()),
            Some("Large Back Text")
        );
        Ok(())
    }

    #[test]
    fn unknown_positions_are_skipped() {
        let basket = reconciled_basket(&[("S", 1)]);

        let mut ledger = PositionLedger::new();
        ledger.choose_method("Collar", Method::Print);

        let breakdown = CostBreakdown::compute(
            &basket,
            &ledger,
            &PositionCatalog::standard(),
            &StandardVat::new(false),
        );

        assert!(breakdown.applications.is_empty());
    }
}
