//! Tailor prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    basket::{Basket, BasketError, BasketLine},
    customization::{
        Artifact, Customization, CustomizationError, LogoFile, LogoUpload, TextStyle,
        validate_logo_file,
    },
    fixtures::{FixtureError, QuoteFixture},
    ledger::{LedgerError, PositionLedger},
    positions::{Method, PositionCatalog, PositionRates},
    pricing::{PriceBreak, PriceTier, PricingCatalog, PricingLadder},
    quantity::{RawQty, SizeQuantities},
    quote::{CustomerDetails, QuoteError, QuotePayload},
    reconcile::{Reconciliation, reconcile},
    storage::{ClientStore, MemoryStore},
    summary::{ApplicationCost, CostBreakdown},
    vat::{FormatOptions, StandardVat, VatDisplay},
};
