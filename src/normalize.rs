//! Row normalization: turning a table row into a line item

use crate::locator::ColumnIndices;

/// Full-width colon separating locale prefixes from spec values
pub const FULLWIDTH_COLON: char = '：';

/// Quantity used when the cell does not parse as an integer
pub const DEFAULT_QUANTITY: u32 = 1;

/// Largest quantity turned into labels; anything above is a misread cell
pub const MAX_QUANTITY: u32 = 100_000;

/// One purchase-order line, cleaned and ready for labelling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub spec: String,
    pub quantity: u32,
}

/// Why a row could not become a line item
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),
    #[error("quantity {0} is above the limit of {max} labels", max = MAX_QUANTITY)]
    QuantityOutOfRange(i64),
}

/// Shorten `text` to at most `max_words` whitespace-separated words
///
/// Text within the limit is returned untouched, spacing included; longer
/// text is rebuilt from its first `max_words` words joined by single spaces.
pub fn summarize_name(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    words[..max_words].join(" ")
}

/// Keep only what follows the last full-width colon on each line
pub fn clean_spec(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let line = line.trim();
            match line.rfind(FULLWIDTH_COLON) {
                Some(pos) => line[pos + FULLWIDTH_COLON.len_utf8()..].trim(),
                None => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a quantity cell, defaulting to 1 when it is not an integer
///
/// Full-width digits and signs count as their ASCII forms.
pub fn parse_quantity(text: &str) -> i64 {
    text.trim()
        .chars()
        .map(to_ascii_digit)
        .collect::<String>()
        .parse::<i64>()
        .unwrap_or(i64::from(DEFAULT_QUANTITY))
}

fn to_ascii_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
        '＋' => '+',
        '－' => '-',
        _ => c,
    }
}

/// Build a line item from one data row
///
/// Returns `Ok(None)` for rows that are silently dropped: rows too short to
/// hold every column, and rows with an empty name or quantity.
pub fn normalize_row(
    row: &[String],
    columns: &ColumnIndices,
    max_name_words: usize,
) -> Result<Option<LineItem>, RowError> {
    if row.len() <= columns.max_index() {
        return Ok(None);
    }

    let name = row[columns.name].trim();
    let spec = row[columns.spec].trim();
    let quantity = row[columns.quantity].trim();

    if name.is_empty() || quantity.is_empty() {
        return Ok(None);
    }

    let parsed = parse_quantity(quantity);
    if parsed <= 0 {
        return Err(RowError::NonPositiveQuantity(parsed));
    }
    let quantity = u32::try_from(parsed)
        .ok()
        .filter(|q| *q <= MAX_QUANTITY)
        .ok_or(RowError::QuantityOutOfRange(parsed))?;

    Ok(Some(LineItem {
        name: summarize_name(name, max_name_words),
        spec: clean_spec(spec),
        quantity,
    }))
}
