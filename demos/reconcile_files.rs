//! Reconcile a bank statement export against a books export
//!
//! ```text
//! cargo run --example reconcile_files -- bank.csv books.csv
//! ```

use bank_reconciliation::{LedgerSide, Reconciler, DEFAULT_RELATION_WINDOW_DAYS};
use std::fs::File;
use std::io::BufReader;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(bank_path), Some(books_path)) = (args.next(), args.next()) else {
        eprintln!("usage: reconcile_files <bank-file> <books-file>");
        std::process::exit(2);
    };

    println!("🏦 Bank Reconciliation\n");

    let mut session = Reconciler::default();
    for (side, path) in [(LedgerSide::Bank, &bank_path), (LedgerSide::Books, &books_path)] {
        let reader = BufReader::new(File::open(path)?);
        match session.load(side, reader) {
            Ok(count) => {
                let ledger = session.ledger(side);
                println!(
                    "  ✓ {}: {} entries parsed, {} rows skipped",
                    side,
                    count,
                    ledger.failed().len()
                );
                if let Some((first, last)) = ledger.date_span() {
                    println!("    covering {} to {}", first, last);
                }
            }
            Err(e) => {
                eprintln!("  ✗ {}: {} ({})", side, e.user_message(), e);
                std::process::exit(1);
            }
        }
    }
    println!();

    let money = session.settings().money.clone();
    let result = session.run().clone();
    println!(
        "🔗 Reconciled from bank row {} / books row {}\n",
        result.bank_offset, result.books_offset
    );

    println!("📋 Matches: {}", result.matches.len());
    for m in &result.matches {
        for pointer in m.pointers() {
            if let Some(entry) = session.ledgers().entry(*pointer) {
                println!(
                    "  {:<5} {} {:>14}  {}",
                    pointer.side.to_string(),
                    entry.date(),
                    money.format_minor(entry.amount()),
                    entry.narration()
                );
            }
        }
        println!();
    }

    for side in [LedgerSide::Bank, LedgerSide::Books] {
        let missing = result.missing_for(side);
        println!("❓ {} entries with no counterpart: {}", side, missing.len());
        for &index in missing {
            if let Some(entry) = session.ledger(side).get(index) {
                println!(
                    "  #{:<4} {} {:>14}  {}",
                    index,
                    entry.date(),
                    money.format_minor(entry.amount()),
                    entry.narration()
                );
            }
        }
        println!();
    }

    let relations = session.suggestions(DEFAULT_RELATION_WINDOW_DAYS);
    if !relations.is_empty() {
        println!("💡 Possible relations:");
        for relation in &relations {
            println!(
                "  bank #{} <- books {:?}{}",
                relation.bank_index,
                relation.books_indices,
                if relation.is_exact { " (exact)" } else { "" }
            );
        }
        println!();
    }

    let summary = session.summary();
    println!("📊 Summary");
    println!(
        "  Matched:          {} (bank total {})",
        summary.matched, summary.matched_bank_total
    );
    println!(
        "  Missing in books: {} (total {})",
        summary.missing_in_books, summary.missing_in_books_total
    );
    println!(
        "  Missing in bank:  {} (total {})",
        summary.missing_in_bank, summary.missing_in_bank_total
    );

    Ok(())
}
