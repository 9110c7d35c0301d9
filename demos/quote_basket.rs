//! Quote Basket Demo
//!
//! Seeds a basket with a sized hoodie order and two customized positions,
//! reconciles it against the standard pricing fixture, and prints the
//! resulting cost breakdown.
//!
//! Use `-n` to override the per-size quantity
//! Use `--vat` to display prices inclusive of VAT

use anyhow::Result;
use clap::Parser;
use tabled::{Table, Tabled, settings::Style};

use tailor::{
    basket::{Basket, BasketLine},
    customization::{Artifact, LogoFile, TextStyle},
    fixtures::QuoteFixture,
    ledger::PositionLedger,
    positions::Method,
    quantity::SizeQuantities,
    summary::CostBreakdown,
    utils::DemoQuoteArgs,
    vat::{FormatOptions, StandardVat, VatDisplay},
};

#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

#[expect(clippy::print_stdout, reason = "Demo code")]
fn main() -> Result<()> {
    let args = DemoQuoteArgs::parse();
    let per_size = args.n.unwrap_or(5);

    let fixture = QuoteFixture::standard()?;
    let vat = StandardVat::new(args.vat);

    let mut quantities = SizeQuantities::new();
    quantities.set("S", per_size);
    quantities.set("M", per_size);

    let mut basket = Basket::with_lines([
        BasketLine::new("GD067", "Heavy Blend Hoodie")
            .with_colour("Navy")
            .with_quantities(quantities),
    ]);
    let outcome = basket.reconcile(fixture.pricing());

    let mut ledger = PositionLedger::new();
    ledger.choose_method("Left Breast", Method::Embroidery);
    ledger.customize(
        "Left Breast",
        Artifact::logo(
            &LogoFile {
                name: "crest.png",
                mime: "image/png",
                size_bytes: 48 * 1024,
            },
            "demo-payload",
        )?,
    )?;
    ledger.choose_method("Large Back", Method::Print);
    ledger.customize(
        "Large Back",
        Artifact::text("EST. 1998", TextStyle::default())?,
    )?;

    let breakdown = CostBreakdown::compute(&basket, &ledger, fixture.positions(), &vat);

    let format = |amount| vat.format(amount, FormatOptions::default());
    let mut rows = vec![BreakdownRow {
        item: "Garment cost".to_string(),
        amount: format(breakdown.garment),
    }];
    for application in &breakdown.applications {
        rows.push(BreakdownRow {
            item: application.label.clone(),
            amount: format(application.total),
        });
    }
    rows.push(BreakdownRow {
        item: "Logo setup".to_string(),
        amount: format(breakdown.logo_setup),
    });
    rows.push(BreakdownRow {
        item: "Delivery".to_string(),
        amount: format(breakdown.delivery),
    });
    rows.push(BreakdownRow {
        item: format!("Total ({})", vat.suffix()),
        amount: format(breakdown.subtotal),
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());

    println!("{table}");
    for (code, total) in &outcome.totals_by_code {
        println!("{code}: {total} units");
    }

    Ok(())
}
