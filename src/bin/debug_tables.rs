//! Debug tool: print the tables detected in a PDF

use po_labels::tables::table_to_markdown;
use po_labels::{extract_tables, load_document, HeaderLabels};
use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <pdf_file>", args[0]);
        process::exit(1);
    }

    let tables = match load_document(&args[1]).and_then(|doc| extract_tables(&doc)) {
        Ok(tables) => tables,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if tables.is_empty() {
        println!("No tables found");
        return;
    }

    let labels = HeaderLabels::default();
    for (i, table) in tables.iter().enumerate() {
        let header = table.header();
        let status = if labels.matches(&header) {
            "qualifies"
        } else {
            "skipped"
        };
        println!(
            "=== Table {} (page {}, {} rows, {}) ===",
            i + 1,
            table.page,
            table.cells.len(),
            status
        );
        println!("{}", table_to_markdown(table));
    }
}
