//! # BoreQuote CLI
//!
//! Terminal quotation for a borewell job. Prompts for the job details,
//! prices them with `bore_core`, prints the breakdown and the JSON result,
//! and records the invoice in the configured book when asked.
//!
//! Configuration is read from `$BOREQUOTE_CONFIG` or the platform config
//! directory (see `bore_core::config`). `RUST_LOG` overrides the configured
//! log level.

use std::io::{self, BufRead, Write};

use bore_core::calculations::{
    calculate_invoice, CasingEntry, FlatCharges, InvoiceInput, InvoiceTotals, LineKind,
};
use bore_core::config::{default_config_path, AppConfig, StorageConfig};
use bore_core::file_io::{load_or_create_book, with_locked_book};
use bore_core::invoice_book::CustomerInfo;
use bore_core::rates::{default_rate_table, profiles::FACTORY_PROFILE};
use bore_core::{BoreResult, DrillingInput};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn prompt_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input).ok()?;
    Some(input.trim().to_string())
}

fn prompt_f64(prompt: &str, default: f64) -> f64 {
    prompt_line(prompt)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn prompt_yes(prompt: &str) -> bool {
    prompt_line(prompt)
        .map(|s| s.eq_ignore_ascii_case("y") || s.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let config_path = default_config_path();
    let config = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_logging(&cfg.logging.level);
            cfg
        }
        Err(e) => {
            init_logging("warn");
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    println!("BoreQuote - Borewell Drilling Quotation");
    println!("=======================================");
    println!();

    // Read only for its profiles; saving re-reads the file under the lock
    let storage = &config.storage;
    let book = match &storage.book_path {
        Some(path) => match load_or_create_book(path, &storage.business_name, &storage.owner) {
            Ok(book) => Some(book),
            Err(e) => {
                warn!("Could not open invoice book {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    // Configured profile first, then the book's active one, then factory rates
    let (profile_name, rates) = match &book {
        Some(b) => match b.profile(&config.defaults.profile) {
            Some(profile) => (profile.name.clone(), profile.slabs.clone()),
            None => (b.settings.active_profile.clone(), b.active_rates()),
        },
        None => (FACTORY_PROFILE.to_string(), default_rate_table()),
    };

    let total_depth_ft = prompt_f64("Total depth (ft) [0]: ", 0.0);
    let old_bore_depth_ft = prompt_f64("Old bore depth to flush (ft) [0]: ", 0.0);
    let flushing_rate = if old_bore_depth_ft > 0.0 {
        prompt_f64(
            &format!("Flushing rate per ft [{}]: ", config.defaults.flushing_rate),
            config.defaults.flushing_rate,
        )
    } else {
        config.defaults.flushing_rate
    };
    let buffer_limit_ft = prompt_f64(
        &format!("Buffer limit (ft) [{}]: ", config.defaults.buffer_limit_ft),
        config.defaults.buffer_limit_ft,
    );

    let mut casings = Vec::new();
    for diameter_in in [7.0, 10.0] {
        let depth_ft = prompt_f64(&format!("{}\" casing length (ft) [0]: ", diameter_in), 0.0);
        if depth_ft > 0.0 {
            let rate = prompt_f64(&format!("{}\" casing rate per ft [0]: ", diameter_in), 0.0);
            casings.push(CasingEntry::new(diameter_in, depth_ft, rate));
        }
    }

    let charges = FlatCharges {
        bata: prompt_f64("Bata [0]: ", 0.0),
        transport: prompt_f64("Transport [0]: ", 0.0),
        extra_time: prompt_f64("Extra time [0]: ", 0.0),
    };
    let discount = prompt_f64("Discount [0]: ", 0.0);

    let input = InvoiceInput {
        drilling: DrillingInput {
            total_depth_ft,
            old_bore_depth_ft,
            flushing_rate,
            rates,
            buffer_limit_ft,
        },
        casings,
        charges,
        extras: Vec::new(),
        discount,
    };

    if let Err(e) = input.validate() {
        println!();
        println!("Warning: {}", e);
    }

    let totals = calculate_invoice(&input);
    print_totals(&profile_name, &totals);

    println!();
    println!("JSON Output:");
    if let Ok(json) = serde_json::to_string_pretty(&totals) {
        println!("{}", json);
    }

    if let (Some(_), Some(path)) = (&book, &config.storage.book_path) {
        println!();
        if prompt_yes("Save this invoice to the book? [y/N]: ") {
            let customer = CustomerInfo {
                name: prompt_line("Customer name: ").unwrap_or_default(),
                phone: prompt_line("Phone: ").unwrap_or_default(),
                address: prompt_line("Address: ").unwrap_or_default(),
            };
            match record_invoice(path, &config.storage, customer, input) {
                Ok(number) => println!("Saved as invoice #{}", number),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    if let Ok(json) = serde_json::to_string_pretty(&e) {
                        eprintln!("{}", json);
                    }
                }
            }
        }
    }
}

fn record_invoice(
    path: &std::path::Path,
    storage: &StorageConfig,
    customer: CustomerInfo,
    input: InvoiceInput,
) -> BoreResult<u32> {
    let number = with_locked_book(
        path,
        &storage.owner,
        &storage.business_name,
        &storage.owner,
        |book| {
            let id = book.add_invoice(customer, input);
            book.get_invoice(&id).map_or(0, |inv| inv.number)
        },
    )?;

    info!(number, path = %path.display(), "invoice recorded");
    Ok(number)
}

fn print_totals(profile_name: &str, totals: &InvoiceTotals) {
    println!();
    println!("═══════════════════════════════════════════════════");
    println!("  DRILLING ({})", profile_name);
    println!("═══════════════════════════════════════════════════");
    if totals.drilling.is_empty() {
        println!("  (nothing to bill)");
    }
    for line in &totals.drilling.breakdown {
        let label = match line.kind {
            LineKind::Rebore => "re-bore",
            LineKind::Drilling => "drilling",
        };
        println!(
            "  {:<16} {:>8.1} ft x {:>8.2} = {:>12.2}  {}",
            line.range, line.depth_ft, line.rate, line.amount, label
        );
    }
    println!("  {:<44} {:>12.2}", "Drilling total", totals.drilling.total_cost);

    if !totals.casing_lines.is_empty() {
        println!();
        for casing in &totals.casing_lines {
            println!(
                "  {:<16} {:>8.1} ft x {:>8.2} = {:>12.2}",
                format!("{}\" casing", casing.diameter_in),
                casing.depth_ft,
                casing.rate,
                casing.amount
            );
        }
    }

    println!();
    println!("  {:<44} {:>12.2}", "Casing", totals.casing_total);
    println!(
        "  {:<44} {:>12.2}",
        "Bata / transport / extra time", totals.flat_charges_total
    );
    println!("  {:<44} {:>12.2}", "Extras", totals.extras_total);
    println!("  {:<44} {:>12.2}", "Subtotal", totals.subtotal);
    println!("  {:<44} {:>12.2}", "Discount", -totals.discount);
    println!("═══════════════════════════════════════════════════");
    println!("  {:<44} {:>12.2}", "GRAND TOTAL", totals.grand_total);
    println!("═══════════════════════════════════════════════════");
}
