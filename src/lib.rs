//! Purchase-order PDFs to printable labels using lopdf
//!
//! This crate provides:
//! - Table extraction from text-based PDFs
//! - Location of the order tables by their item name, spec and quantity headers
//! - One numbered label per unit ordered, rendered as small PDF pages

pub mod extractor;
pub mod fonts;
pub mod locator;
pub mod normalize;
pub mod prompt;
pub mod render;
pub mod sequencer;
pub mod tables;
pub mod tounicode;

pub use extractor::{load_document, load_document_mem, TextItem};
pub use fonts::{BuiltinFont, FontSelection, FontSupplier, LabelFont, SystemFonts};
pub use locator::{find_target_tables, ColumnIndices, HeaderLabels};
pub use prompt::{ArgsOrPrompt, ConfigSupplier, Prompter};
pub use render::{LabelDocument, LabelLayout, PageGeometry};
pub use sequencer::{LabelEntry, LabelRun, RowWarning, SerialStart, SerialStartError};
pub use tables::{extract_tables, Table};

use lopdf::Document;
use std::path::{Path, PathBuf};

/// Settings for a conversion
#[derive(Debug, Clone, PartialEq)]
pub struct LabelConfig {
    /// Header labels identifying the order tables
    pub headers: HeaderLabels,
    /// Names longer than this many words are shortened
    pub max_name_words: usize,
    pub layout: LabelLayout,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            headers: HeaderLabels::default(),
            max_name_words: 10,
            layout: LabelLayout::default(),
        }
    }
}

/// What a conversion did
#[derive(Debug)]
pub struct ConversionReport {
    /// Tables detected anywhere in the source
    pub tables_found: usize,
    /// Tables carrying the required columns
    pub tables_used: usize,
    /// Labels (and output pages) produced
    pub labels: usize,
    /// First and last serial issued
    pub serials: Option<(String, String)>,
    /// Rows that were skipped
    pub warnings: Vec<RowWarning>,
    /// Serials grew past two digits
    pub serial_overflow: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Turn detected tables into numbered label entries
///
/// Fails when there is nothing to print, so no empty output is written.
pub fn build_label_run(
    tables: &[Table],
    start: &SerialStart,
    config: &LabelConfig,
) -> Result<LabelRun, LabelError> {
    if tables.is_empty() {
        return Err(LabelError::NoTables);
    }

    let target = find_target_tables(tables, &config.headers);
    let columns = target
        .columns(&config.headers)
        .ok_or(LabelError::NoQualifyingTables)?;
    log::info!(
        "{} of {} tables carry the required columns",
        target.tables.len(),
        tables.len()
    );

    let run = sequencer::LabelSequencer::new(start, config.max_name_words)
        .sequence(&target.tables, &columns);
    if run.entries.is_empty() {
        return Err(LabelError::NoLabels);
    }
    Ok(run)
}

/// Extract, sequence and render the labels of a loaded document
pub fn convert_document(
    doc: &Document,
    start: &SerialStart,
    font: LabelFont,
    config: &LabelConfig,
) -> Result<(LabelDocument, ConversionReport), LabelError> {
    let timer = std::time::Instant::now();

    let tables = extract_tables(doc)?;
    let run = build_label_run(&tables, start, config)?;
    let tables_used = find_target_tables(&tables, &config.headers).tables.len();

    let mut document = LabelDocument::new(font, config.layout.clone());
    for entry in &run.entries {
        document.add_label(entry)?;
    }

    let serials = match (run.entries.first(), run.entries.last()) {
        (Some(first), Some(last)) => Some((first.serial.clone(), last.serial.clone())),
        _ => None,
    };
    let report = ConversionReport {
        tables_found: tables.len(),
        tables_used,
        labels: run.entries.len(),
        serials,
        warnings: run.warnings,
        serial_overflow: run.serial_overflow,
        processing_time_ms: timer.elapsed().as_millis() as u64,
    };
    Ok((document, report))
}

/// Convert a purchase-order PDF file into a label PDF at `output`
pub fn convert_pdf<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    start: &SerialStart,
    font: LabelFont,
    config: &LabelConfig,
) -> Result<ConversionReport, LabelError> {
    let doc = load_document(input)?;
    let (document, mut report) = convert_document(&doc, start, font, config)?;
    let timer = std::time::Instant::now();
    document.save(output.as_ref())?;
    report.processing_time_ms += timer.elapsed().as_millis() as u64;
    Ok(report)
}

/// Convert a purchase-order PDF held in memory, returning the label PDF bytes
pub fn convert_pdf_mem(
    buffer: &[u8],
    start: &SerialStart,
    font: LabelFont,
    config: &LabelConfig,
) -> Result<(Vec<u8>, ConversionReport), LabelError> {
    let doc = load_document_mem(buffer)?;
    let (document, report) = convert_document(&doc, start, font, config)?;
    Ok((document.into_bytes()?, report))
}

/// `<input without extension>_output.pdf`, next to the input
pub fn output_path_for(input: &Path) -> PathBuf {
    let mut name = input.with_extension("").into_os_string();
    name.push("_output.pdf");
    PathBuf::from(name)
}

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF is encrypted")]
    Encrypted,
    #[error("No tables found in the PDF")]
    NoTables,
    #[error("Required columns not found in the PDF")]
    NoQualifyingTables,
    #[error("No labels to print: every order row was empty or invalid")]
    NoLabels,
    #[error("Input closed before a value was entered")]
    InputClosed,
    #[error("Font error: {0}")]
    Font(String),
}

impl From<lopdf::Error> for LabelError {
    fn from(e: lopdf::Error) -> Self {
        LabelError::Parse(e.to_string())
    }
}
