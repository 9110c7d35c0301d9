//! Fixtures
//!
//! YAML-backed reference data: pricing ladders and the position price
//! table, loadable from a string or file for tests and demos. The bundled
//! standard set carries the GD067 hoodie ladder and the seven stock
//! placements.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    positions::{PositionCatalog, PositionRates},
    pricing::{PriceTier, PricingCatalog, PricingLadder},
};

/// Fixture parsing errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading a fixture file.
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

const STANDARD_SET: &str = r"
pricing:
  - code: GD067
    base_price: 17.58
    tiers:
      - { min: 1, price: 17.58 }
      - { min: 10, price: 16.54 }
      - { min: 25, price: 16.18 }
      - { min: 50, price: 14.94 }
      - { min: 100, price: 13.49 }
      - { min: 250, price: 12.59 }
positions:
  - { name: Left Breast, embroidery: 5.00, print: 3.50 }
  - { name: Right Breast, embroidery: 5.00, print: 3.50 }
  - { name: Left Arm, embroidery: 5.00, print: 3.50 }
  - { name: Right Arm, embroidery: 5.00, print: 3.50 }
  - { name: Small Centre Front, embroidery: 5.00, print: 3.50 }
  - { name: Large Centre Front, embroidery: 7.00, print: 5.00 }
  - { name: Large Back, embroidery: 7.00, print: 5.00 }
";

#[derive(Debug, Deserialize)]
struct FixtureDoc {
    #[serde(default)]
    pricing: Vec<LadderDoc>,
    #[serde(default)]
    positions: Vec<PositionDoc>,
}

#[derive(Debug, Deserialize)]
struct LadderDoc {
    code: String,
    base_price: Decimal,
    #[serde(default)]
    tiers: Vec<PriceTier>,
}

#[derive(Debug, Deserialize)]
struct PositionDoc {
    name: String,
    embroidery: Decimal,
    print: Decimal,
}

/// A parsed fixture set: pricing ladders plus the position price table.
#[derive(Debug, Clone)]
pub struct QuoteFixture {
    pricing: PricingCatalog,
    positions: PositionCatalog,
}

impl QuoteFixture {
    /// Parse a fixture set from YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] on invalid YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let doc: FixtureDoc = serde_norway::from_str(yaml)?;

        let mut pricing = PricingCatalog::new();
        for ladder in doc.pricing {
            pricing.insert(ladder.code, PricingLadder::new(ladder.base_price, ladder.tiers));
        }

        let mut positions = PositionCatalog::new();
        for position in doc.positions {
            positions.insert(
                position.name,
                PositionRates {
                    embroidery: position.embroidery,
                    print: position.print,
                },
            );
        }

        Ok(Self { pricing, positions })
    }

    /// Parse a fixture set from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] on IO or parse failure.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// The bundled standard fixture set.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the bundled document fails to parse.
    pub fn standard() -> Result<Self, FixtureError> {
        Self::from_yaml(STANDARD_SET)
    }

    /// The pricing catalog.
    #[must_use]
    pub fn pricing(&self) -> &PricingCatalog {
        &self.pricing
    }

    /// The position price table.
    #[must_use]
    pub fn positions(&self) -> &PositionCatalog {
        &self.positions
    }

    /// Consume the fixture into its catalogs.
    #[must_use]
    pub fn into_parts(self) -> (PricingCatalog, PositionCatalog) {
        (self.pricing, self.positions)
    }
}
