//! # Order Engine Demo
//!
//! Seeds a small pharmacy catalog and drives one full register flow
//! against the in-memory collaborators: tabs, FEFO adds, loose-unit
//! lines, discount clamping, a batch switch with auto-split, and a
//! delivery checkout into the sale log.
//!
//! ## Usage
//! ```bash
//! # Run with defaults (8 tabs, $5.00 delivery fee)
//! cargo run -p mortar-catalog --bin demo
//!
//! # Override limits
//! cargo run -p mortar-catalog --bin demo -- --tabs 4 --fee 250
//!
//! # Engine debug logging
//! RUST_LOG=debug cargo run -p mortar-catalog --bin demo
//! ```
//!
//! Environment variables `MORTAR_MAX_OPEN_TABS` and
//! `MORTAR_DELIVERY_FEE_CENTS` are read first; command-line flags win.

use std::env;

use chrono::NaiveDate;
use mortar_core::{
    Batch, BatchCatalog, CartOutcome, Checkout, CheckoutConfig, CustomerRef, DiscountRate,
    Money, PaymentMethod, ProductKey, SaleMode, SaleType, SessionConfig,
    DEFAULT_DELIVERY_FEE_CENTS, DEFAULT_MAX_OPEN_TABS,
};
use mortar_catalog::{EngineState, MemoryCatalog, SaleLog};
use tracing_subscriber::FmtSubscriber;

/// Seed batches. Panadol and Amoxil are multi-batch products (FEFO and
/// auto-split material); Insulatard's margin is razor thin (discount
/// clamping material); the ORS carries an explicit 15% override.
///
/// Columns: id, product, form, category, code, price¢, cost¢,
/// stock packs, units/pack, expiry, override bps (0 = none)
#[rustfmt::skip]
const SEED_BATCHES: &[(&str, &str, &str, &str, &str, i64, i64, i64, i64, (i32, u32, u32), u32)] = &[
    ("PAN-001", "Panadol Extra",   "Tablet",  "Analgesic",   "PAN-X",   1099,   850,  5,  6, (2025, 11, 30),    0),
    ("PAN-002", "Panadol Extra",   "Tablet",  "Analgesic",   "PAN-X",   1099,   850, 12,  6, (2026,  8, 31),    0),
    ("AMX-001", "Amoxil 500",      "Capsule", "Antibiotic",  "AMX-500", 2450,  1960,  2, 12, (2025,  9, 30),    0),
    ("AMX-002", "Amoxil 500",      "Capsule", "Antibiotic",  "AMX-500", 2450,  1960,  8, 12, (2026,  2, 28),    0),
    ("INS-001", "Insulatard",      "Vial",    "Diabetes",    "INS-N",  89500, 86000,  6,  1, (2025, 10, 31),    0),
    ("ORS-001", "ORS Sachet",      "Powder",  "Rehydration", "ORS-1",    350,   210, 40,  1, (2027,  1, 31), 1500),
    ("VTC-001", "Cecon Vitamin C", "Tablet",  "Supplement",  "VTC-C",    899,   540,  9, 30, (2026,  5, 31),    0),
];

fn seed_catalog() -> Result<MemoryCatalog, Box<dyn std::error::Error>> {
    let mut catalog = MemoryCatalog::new();
    for &(id, name, form, category, code, price, cost, stock, upp, (y, m, d), cap) in SEED_BATCHES {
        let expiry = NaiveDate::from_ymd_opt(y, m, d).ok_or("bad seed expiry")?;
        catalog.insert(Batch {
            id: id.to_string(),
            product_name: name.to_string(),
            dosage_form: form.to_string(),
            category: category.to_string(),
            code: code.to_string(),
            barcode: None,
            price_cents: price,
            cost_cents: cost,
            stock_packs: stock,
            units_per_pack: upp,
            expiry,
            max_discount: (cap > 0).then(|| DiscountRate::from_bps(cap)),
        })?;
    }
    Ok(catalog)
}

fn key(name: &str, form: &str) -> ProductKey {
    ProductKey {
        name: name.to_string(),
        dosage_form: form.to_string(),
    }
}

fn env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    // Environment first, flags win
    let mut max_tabs: usize = env_or("MORTAR_MAX_OPEN_TABS", DEFAULT_MAX_OPEN_TABS);
    let mut delivery_fee: i64 = env_or("MORTAR_DELIVERY_FEE_CENTS", DEFAULT_DELIVERY_FEE_CENTS);

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tabs" | "-t" => {
                if i + 1 < args.len() {
                    max_tabs = args[i + 1].parse().unwrap_or(max_tabs);
                    i += 1;
                }
            }
            "--fee" | "-f" => {
                if i + 1 < args.len() {
                    delivery_fee = args[i + 1].parse().unwrap_or(delivery_fee);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mortar POS Order Engine Demo");
                println!();
                println!("Usage: demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --tabs <N>    Max open order tabs (default: {})", DEFAULT_MAX_OPEN_TABS);
                println!("  -f, --fee <CENTS> Delivery fee in cents (default: {})", DEFAULT_DELIVERY_FEE_CENTS);
                println!("  -h, --help        Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🧪 Mortar POS Order Engine Demo");
    println!("===============================");
    println!("Max tabs:     {}", max_tabs);
    println!("Delivery fee: {}", Money::from_cents(delivery_fee));
    println!();

    let catalog = seed_catalog()?;
    println!("✓ Seeded catalog with {} batches across {} products", catalog.len(), catalog.products().len());

    let state = EngineState::new(SessionConfig::new().with_max_open(max_tabs));
    let checkout = Checkout::new(CheckoutConfig::new().with_delivery_fee_cents(delivery_fee));
    let mut ledger = SaleLog::new();

    // ── Tab 1: a delivery order ──────────────────────────────────────────
    let tab1 = state
        .with_sessions_mut(|mgr| mgr.create())
        .ok_or("session cap reached before the demo even started")?;
    println!();
    println!("Tab 1 ({})", tab1);

    // FEFO: Panadol has two batches; the 2025-11 one must win
    let panadol = key("Panadol Extra", "Tablet");
    state.with_sessions_mut(|mgr| mgr.add_product(&catalog, &panadol, None));
    state.with_sessions_mut(|mgr| mgr.add_product(&catalog, &panadol, None));
    println!("  ✓ Panadol ×2 packs, FEFO picked the Nov-2025 batch");

    // Loose units on a 30-tablet pack
    let cecon = catalog.batch_by_id("VTC-001").ok_or("seed batch missing")?;
    state.with_sessions_mut(|mgr| {
        mgr.active_cart_mut()
            .map(|cart| cart.add_line(&cecon, SaleMode::Unit, 10))
    });
    println!("  ✓ Cecon ×10 loose tablets ({} per tablet)", cecon.price().prorated(1, cecon.units_per_pack));

    // Discount clamping on a thin margin
    let insulin = catalog.batch_by_id("INS-001").ok_or("seed batch missing")?;
    let outcome = state.with_sessions_mut(|mgr| {
        let cart = mgr.active_cart_mut()?;
        cart.add_line(&insulin, SaleMode::Pack, 1);
        Some(cart.set_line_discount(&insulin, SaleMode::Pack, DiscountRate::from_percent(10)))
    });
    match outcome {
        Some(CartOutcome::Clamped { requested_bps, applied_bps }) => println!(
            "  ⚠ Insulatard discount: requested {} bps, margin only allows {} bps",
            requested_bps, applied_bps
        ),
        other => println!("  ✓ Insulatard discount outcome: {:?}", other),
    }

    // Auto-split: 5 packs of Amoxil against a 2-pack batch
    let amoxil = key("Amoxil 500", "Capsule");
    let report = state
        .with_sessions_mut(|mgr| mgr.switch_batch(&catalog, &amoxil, "AMX-001", 5, 0))
        .ok_or("no active session")?;
    println!(
        "  ✓ Amoxil 5 packs auto-split across {} batches (shortfall: {} packs)",
        report.lines.len(),
        report.shortfall_packs()
    );

    // ── Tab 2: a pinned counter order ────────────────────────────────────
    let tab2 = state
        .with_sessions_mut(|mgr| mgr.create())
        .ok_or("session cap reached")?;
    state.with_sessions_mut(|mgr| {
        mgr.rename(&tab2, "Mrs. Khan");
        mgr.set_pinned(&tab2, true);
        mgr.set_customer(&tab2, Some(CustomerRef::named("Mrs. Khan")));
        let ors = key("ORS Sachet", "Powder");
        for _ in 0..3 {
            mgr.add_product(&catalog, &ors, None);
        }
        if let Some(cart) = mgr.active_cart_mut() {
            cart.set_order_discount(DiscountRate::from_percent(5));
        }
    });
    println!();
    println!("Tab 2 ({}) pinned for Mrs. Khan: ORS ×3, 5% order discount", tab2);

    // ── Checkout tab 1 as a delivery ─────────────────────────────────────
    state.with_sessions_mut(|mgr| mgr.set_active(&tab1));
    let snapshot = state.with_sessions_mut(|mgr| {
        let session = mgr.active().cloned().ok_or("no active session")?;
        checkout
            .finalize(&session, &catalog, PaymentMethod::Cash, SaleType::Delivery, &mut ledger)
            .map_err(|e| e.to_string())
    })?;
    state.with_sessions_mut(|mgr| mgr.close(&tab1));

    println!();
    println!("Receipt {}", snapshot.id);
    println!("--------------------------------------------------");
    for line in &snapshot.lines {
        println!(
            "  {:<28} {:>6.2} {} @ {:>8}  {:>9}",
            line.product_name,
            line.quantity,
            line.mode,
            Money::from_cents(line.unit_price_cents),
            Money::from_cents(line.line_total_cents),
        );
    }
    println!("--------------------------------------------------");
    println!("  Subtotal        {:>9}", Money::from_cents(snapshot.subtotal_cents));
    println!("  Delivery fee    {:>9}", Money::from_cents(snapshot.delivery_fee_cents));
    println!("  Grand total     {:>9}", Money::from_cents(snapshot.grand_total_cents));

    // ── Wrap up ──────────────────────────────────────────────────────────
    let closed = state.with_sessions_mut(|mgr| mgr.close_unpinned());
    let summaries = state.with_sessions(|mgr| mgr.summaries(&catalog));
    println!();
    println!("✓ Closed {} unpinned tab(s); {} still open:", closed, summaries.len());
    for row in &summaries {
        println!(
            "  {} {:<12} {} line(s), {}",
            if row.pinned { "📌" } else { "  " },
            row.title,
            row.line_count,
            Money::from_cents(row.order_total_cents),
        );
    }
    println!();
    println!("✓ Sale log: {} order(s), revenue {}", ledger.len(), Money::from_cents(ledger.revenue_cents()));
    println!();
    println!("✓ Demo complete!");
    Ok(())
}
