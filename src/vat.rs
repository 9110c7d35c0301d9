//! VAT display
//!
//! The engine stores and compares VAT-exclusive base amounts only; applying
//! the rate and rendering a currency string happens here, at the display
//! boundary, and nowhere else.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso};

/// Options for formatting a base amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Apply the VAT rate when the toggle is on. Off for values that are
    /// themselves a VAT amount.
    pub include_vat: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { include_vat: true }
    }
}

/// The VAT presentation collaborator.
///
/// Implementations own the inc/ex VAT toggle state; the engine only ever
/// hands them base amounts.
pub trait VatDisplay {
    /// Whether prices are being displayed inclusive of VAT.
    fn is_on(&self) -> bool;

    /// The VAT rate.
    fn rate(&self) -> Percentage;

    /// Format a base amount as a currency string, applying the rate when
    /// the toggle is on and the options ask for it.
    fn format(&self, base: Decimal, options: FormatOptions) -> String {
        let value = if options.include_vat && self.is_on() {
            base + self.rate() * base
        } else {
            base
        };

        let minor = (value.round_dp(2) * Decimal::ONE_HUNDRED)
            .to_i64()
            .unwrap_or(0);
        Money::from_minor(minor, iso::GBP).to_string()
    }

    /// The suffix shown next to formatted amounts.
    fn suffix(&self) -> &'static str {
        if self.is_on() { "inc VAT" } else { "ex VAT" }
    }
}

/// The standard UK VAT presentation: a simple on/off toggle at 20%.
#[derive(Debug, Clone, Copy)]
pub struct StandardVat {
    on: bool,
    rate: Percentage,
}

impl StandardVat {
    /// Create a toggle at the standard 20% rate.
    #[must_use]
    pub fn new(on: bool) -> Self {
        Self {
            on,
            rate: Percentage::from(0.2),
        }
    }

    /// Create a toggle with a custom rate.
    #[must_use]
    pub fn with_rate(on: bool, rate: Percentage) -> Self {
        Self { on, rate }
    }

    /// Flip the toggle.
    pub fn set_on(&mut self, on: bool) {
        self.on = on;
    }
}

impl Default for StandardVat {
    fn default() -> Self {
        Self::new(false)
    }
}

impl VatDisplay for StandardVat {
    fn is_on(&self) -> bool {
        self.on
    }

    fn rate(&self) -> Percentage {
        self.rate
    }
}
