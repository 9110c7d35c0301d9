//! Positions
//!
//! Garment placements eligible for a print or embroidery application, and
//! the static position x method unit-cost table. These costs are independent
//! of the garment's volume-discount ladder; they are charged per total
//! garment unit when the order summary is computed.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Application method for a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Stitched application.
    Embroidery,
    /// Printed application.
    Print,
}

impl Method {
    /// Display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Embroidery => "Embroidery",
            Self::Print => "Print",
        }
    }
}

/// Per-method unit costs for one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRates {
    /// Unit cost when embroidered.
    pub embroidery: Decimal,
    /// Unit cost when printed.
    pub print: Decimal,
}

impl PositionRates {
    /// The unit cost for a method.
    #[must_use]
    pub fn unit_cost(&self, method: Method) -> Decimal {
        match method {
            Method::Embroidery => self.embroidery,
            Method::Print => self.print,
        }
    }
}

/// The position x method price table.
#[derive(Debug, Clone, Default)]
pub struct PositionCatalog {
    rates: FxHashMap<String, PositionRates>,
}

impl PositionCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard garment placements.
    #[must_use]
    pub fn standard() -> Self {
        let small = PositionRates {
            embroidery: Decimal::new(500, 2),
            print: Decimal::new(350, 2),
        };
        let large = PositionRates {
            embroidery: Decimal::new(700, 2),
            print: Decimal::new(500, 2),
        };

        let mut catalog = Self::new();
        for position in [
            "Left Breast",
            "Right Breast",
            "Left Arm",
            "Right Arm",
            "Small Centre Front",
        ] {
            catalog.insert(position, small);
        }
        for position in ["Large Centre Front", "Large Back"] {
            catalog.insert(position, large);
        }
        catalog
    }

    /// Register rates for a position, replacing any existing entry.
    pub fn insert(&mut self, position: impl Into<String>, rates: PositionRates) {
        self.rates.insert(position.into(), rates);
    }

    /// Look up a position's rates.
    #[must_use]
    pub fn rates(&self, position: &str) -> Option<&PositionRates> {
        self.rates.get(position)
    }

    /// The unit cost for a position and method, if the position is known.
    #[must_use]
    pub fn unit_cost(&self, position: &str, method: Method) -> Option<Decimal> {
        self.rates
            .get(position)
            .map(|rates| rates.unit_cost(method))
    }

    /// Number of positions in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn standard_table_has_seven_placements() {
        assert_eq!(PositionCatalog::standard().len(), 7);
    }

    #[test]
    fn unit_cost_follows_method() {
        let catalog = PositionCatalog::standard();

        assert_eq!(
            catalog.unit_cost("Left Breast", Method::Embroidery),
            Some(Decimal::new(500, 2))
        );
        assert_eq!(
            catalog.unit_cost("Left Breast", Method::Print),
            Some(Decimal::new(350, 2))
        );
        assert_eq!(
            catalog.unit_cost("Large Back", Method::Print),
            Some(Decimal::new(500, 2))
        );
    }

    #[test]
    fn unknown_position_has_no_cost() {
        assert_eq!(
            PositionCatalog::standard().unit_cost("Collar", Method::Print),
            None
        );
    }

    #[test]
    fn method_serializes_lowercase() -> TestResult {
        assert_eq!(serde_json::to_string(&Method::Embroidery)?, r#""embroidery""#);
        assert_eq!(serde_json::from_str::<Method>(r#""print""#)?, Method::Print);
        Ok(())
    }
}
