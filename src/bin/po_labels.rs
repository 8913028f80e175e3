//! CLI tool turning a purchase-order PDF into printable labels

use po_labels::{
    convert_pdf, output_path_for, ArgsOrPrompt, ConfigSupplier, FontSupplier, LabelConfig,
    LabelError, Prompter, SystemFonts,
};
use std::env;
use std::io;
use std::process;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("Usage: po-labels [pdf_file] [XXXX-YY]");
        println!();
        println!("Creates one numbered label page per unit ordered.");
        println!("Missing arguments are prompted for.");
        return;
    }

    let stdin = io::stdin();
    let mut config = ArgsOrPrompt::from_args(args, Prompter::new(stdin.lock(), io::stdout()));

    let converted = match run(&mut config) {
        Ok(converted) => converted,
        Err(e) => {
            match e {
                LabelError::NoTables | LabelError::NoQualifyingTables | LabelError::NoLabels => {
                    println!("{}", e)
                }
                LabelError::InputClosed => println!(),
                _ => println!("Error processing PDF file: {}", e),
            }
            false
        }
    };

    if !converted {
        process::exit(1);
    }
}

/// Returns false when there was nothing to convert
fn run(config: &mut impl ConfigSupplier) -> Result<bool, LabelError> {
    let input = config.source_path()?;
    if !input.exists() {
        println!("File does not exist!");
        return Ok(false);
    }
    let output = output_path_for(&input);

    let start = config.serial_start()?;

    let selection = SystemFonts::default().load();
    for warning in &selection.warnings {
        println!("Warning: {}", warning);
    }

    let report = convert_pdf(&input, &output, &start, selection.font, &LabelConfig::default())?;

    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    if report.serial_overflow {
        println!("Warning: serial numbers went past two digits");
    }
    if let Some((first, last)) = &report.serials {
        println!(
            "{} labels ({} to {}) from {} of {} tables",
            report.labels, first, last, report.tables_used, report.tables_found
        );
    }
    println!("PDF has been created successfully: {}", output.display());
    Ok(true)
}
