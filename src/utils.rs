//! Utils

use clap::Parser;

/// Arguments for the quote basket demo
#[derive(Debug, Parser)]
pub struct DemoQuoteArgs {
    /// Quantity per seeded size (defaults to the standard demo order)
    #[clap(short, long)]
    pub n: Option<u32>,

    /// Display prices inclusive of VAT
    #[clap(short, long)]
    pub vat: bool,
}
