//! Label sequencing: one numbered label per unit of quantity
//!
//! Serial numbers come from a single [`SerialCounter`] owned by the
//! [`LabelSequencer`], so numbering runs across every row and table of a
//! conversion and is never reset or reused.

use crate::locator::ColumnIndices;
use crate::normalize::{normalize_row, LineItem, RowError};
use crate::tables::Table;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static SERIAL_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})$").expect("valid serial pattern"));

/// Largest counter value that still fits the two-digit serial field
pub const MAX_TWO_DIGIT_COUNTER: u32 = 99;

/// Where numbering starts: the `XXXX-YY` value entered by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialStart {
    prefix: String,
    start: u32,
}

/// Why an `XXXX-YY` value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SerialStartError {
    #[error("Please use the format XXXX-YY")]
    MissingSeparator,
    #[error("Invalid input. Please use the format XXXX-YY")]
    Malformed,
    #[error("Prefix must be 4 digits")]
    Prefix,
    #[error("Start number must be 2 digits")]
    StartNumber,
}

impl SerialStart {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn start(&self) -> u32 {
        self.start
    }
}

impl FromStr for SerialStart {
    type Err = SerialStartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(caps) = SERIAL_START.captures(s) {
            return Ok(Self {
                prefix: caps[1].to_string(),
                start: caps[2].parse().map_err(|_| SerialStartError::StartNumber)?,
            });
        }

        // Work out which part is wrong so the operator gets a useful hint.
        if !s.contains('-') {
            return Err(SerialStartError::MissingSeparator);
        }
        let parts: Vec<&str> = s.split('-').collect();
        let [prefix, start] = parts[..] else {
            return Err(SerialStartError::Malformed);
        };
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if prefix.len() != 4 || !all_digits(prefix) {
            return Err(SerialStartError::Prefix);
        }
        if start.len() != 2 || !all_digits(start) {
            return Err(SerialStartError::StartNumber);
        }
        Err(SerialStartError::Malformed)
    }
}

impl fmt::Display for SerialStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.prefix, self.start)
    }
}

/// The run's serial counter
#[derive(Debug, Clone)]
pub struct SerialCounter {
    prefix: String,
    next: u32,
}

impl SerialCounter {
    pub fn new(start: &SerialStart) -> Self {
        Self {
            prefix: start.prefix.clone(),
            next: start.start,
        }
    }

    /// Issue the next serial and advance
    ///
    /// Past 99 the numeric field simply widens (`1234-100`); it is never
    /// truncated or wrapped.
    pub fn next_serial(&mut self) -> String {
        let serial = format!("{}-{:02}", self.prefix, self.next);
        self.next += 1;
        serial
    }

    /// Value the next serial will carry
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Whether an issued serial needed more than two digits
    pub fn overflowed(&self) -> bool {
        self.next > MAX_TWO_DIGIT_COUNTER + 1
    }
}

/// One printable label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub name: String,
    pub spec: String,
    /// `i/N` position within the line item
    pub fraction: String,
    /// `PREFIX-NN` serial
    pub serial: String,
}

/// A row that was skipped, with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWarning {
    /// Index of the qualifying table (0-based)
    pub table: usize,
    /// Index of the data row within the table (0-based, header excluded)
    pub row: usize,
    /// Page the table was found on
    pub page: u32,
    pub error: RowError,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error processing row {} of table {} (page {}): {}",
            self.row + 1,
            self.table + 1,
            self.page,
            self.error
        )
    }
}

/// Everything the sequencer produced for one conversion
#[derive(Debug, Clone, Default)]
pub struct LabelRun {
    pub entries: Vec<LabelEntry>,
    pub warnings: Vec<RowWarning>,
    /// Set when serials grew past two digits
    pub serial_overflow: bool,
}

/// Expands line items into numbered label entries
#[derive(Debug)]
pub struct LabelSequencer {
    counter: SerialCounter,
    max_name_words: usize,
}

impl LabelSequencer {
    pub fn new(start: &SerialStart, max_name_words: usize) -> Self {
        Self {
            counter: SerialCounter::new(start),
            max_name_words,
        }
    }

    /// One entry per unit of `item.quantity`, consuming one serial each
    pub fn expand(&mut self, item: &LineItem) -> Vec<LabelEntry> {
        (1..=item.quantity)
            .map(|i| LabelEntry {
                name: item.name.clone(),
                spec: item.spec.clone(),
                fraction: format!("{}/{}", i, item.quantity),
                serial: self.counter.next_serial(),
            })
            .collect()
    }

    /// Sequence every data row of the qualifying tables, in order
    pub fn sequence(mut self, tables: &[&Table], columns: &ColumnIndices) -> LabelRun {
        let mut run = LabelRun::default();

        for (table_idx, table) in tables.iter().enumerate() {
            for (row_idx, row) in table.data_rows().iter().enumerate() {
                match normalize_row(row, columns, self.max_name_words) {
                    Ok(Some(item)) => run.entries.extend(self.expand(&item)),
                    Ok(None) => {}
                    Err(error) => {
                        let warning = RowWarning {
                            table: table_idx,
                            row: row_idx,
                            page: table.page,
                            error,
                        };
                        log::warn!("{}", warning);
                        run.warnings.push(warning);
                    }
                }
            }
        }

        run.serial_overflow = self.counter.overflowed();
        if run.serial_overflow {
            log::warn!(
                "serial counter reached {}, past the two-digit field",
                self.counter.peek() - 1
            );
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(s: &str) -> SerialStart {
        s.parse().unwrap()
    }

    fn item(name: &str, quantity: u32) -> LineItem {
        LineItem {
            name: name.into(),
            spec: "M6".into(),
            quantity,
        }
    }

    fn table(rows: &[[&str; 3]]) -> Table {
        let mut cells = vec![vec!["货品名称".to_string(), "规格".into(), "数量".into()]];
        cells.extend(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()));
        Table::new(1, cells)
    }

    const COLUMNS: ColumnIndices = ColumnIndices {
        name: 0,
        spec: 1,
        quantity: 2,
    };

    #[test]
    fn test_parse_serial_start() {
        let parsed = start("1234-01");
        assert_eq!(parsed.prefix(), "1234");
        assert_eq!(parsed.start(), 1);
        assert_eq!(parsed.to_string(), "1234-01");
        assert_eq!(start(" 0007-00\n").start(), 0);
    }

    #[test]
    fn test_serial_start_errors() {
        assert_eq!("123401".parse::<SerialStart>(), Err(SerialStartError::MissingSeparator));
        assert_eq!("12-34-56".parse::<SerialStart>(), Err(SerialStartError::Malformed));
        assert_eq!("123-01".parse::<SerialStart>(), Err(SerialStartError::Prefix));
        assert_eq!("12a4-01".parse::<SerialStart>(), Err(SerialStartError::Prefix));
        assert_eq!("1234-1".parse::<SerialStart>(), Err(SerialStartError::StartNumber));
        assert_eq!("1234-".parse::<SerialStart>(), Err(SerialStartError::StartNumber));
        // Full-width digits are not ASCII digits
        assert_eq!("１２３４-01".parse::<SerialStart>(), Err(SerialStartError::Prefix));
    }

    #[test]
    fn test_quantity_three_gives_three_fractions() {
        let mut sequencer = LabelSequencer::new(&start("5000-10"), 10);
        let entries = sequencer.expand(&item("螺栓", 3));

        let fractions: Vec<&str> = entries.iter().map(|e| e.fraction.as_str()).collect();
        let serials: Vec<&str> = entries.iter().map(|e| e.serial.as_str()).collect();
        assert_eq!(fractions, ["1/3", "2/3", "3/3"]);
        assert_eq!(serials, ["5000-10", "5000-11", "5000-12"]);
        assert!(entries.iter().all(|e| e.name == "螺栓" && e.spec == "M6"));
    }

    #[test]
    fn test_serials_run_across_rows() {
        let tables = [table(&[["螺栓", "M6", "2"], ["垫片", "M6", "3"]])];
        let refs: Vec<&Table> = tables.iter().collect();

        let run = LabelSequencer::new(&start("1234-01"), 10).sequence(&refs, &COLUMNS);
        let serials: Vec<&str> = run.entries.iter().map(|e| e.serial.as_str()).collect();
        assert_eq!(serials, ["1234-01", "1234-02", "1234-03", "1234-04", "1234-05"]);
        assert!(run.warnings.is_empty());
        assert!(!run.serial_overflow);
    }

    #[test]
    fn test_serials_run_across_tables() {
        let tables = [table(&[["螺栓", "M6", "1"]]), table(&[["垫片", "M6", "2"]])];
        let refs: Vec<&Table> = tables.iter().collect();

        let run = LabelSequencer::new(&start("1234-08"), 10).sequence(&refs, &COLUMNS);
        let serials: Vec<&str> = run.entries.iter().map(|e| e.serial.as_str()).collect();
        assert_eq!(serials, ["1234-08", "1234-09", "1234-10"]);
        assert_eq!(run.entries[2].fraction, "2/2");
    }

    #[test]
    fn test_non_numeric_quantity_gives_one_label() {
        let tables = [table(&[["螺栓", "M6", "abc"]])];
        let refs: Vec<&Table> = tables.iter().collect();

        let run = LabelSequencer::new(&start("1234-01"), 10).sequence(&refs, &COLUMNS);
        assert_eq!(run.entries.len(), 1);
        assert_eq!(run.entries[0].fraction, "1/1");
    }

    #[test]
    fn test_failed_rows_consume_no_serials() {
        let tables = [table(&[
            ["螺栓", "M6", "1"],
            ["坏行", "M6", "0"],
            ["", "M6", "4"],
            ["垫片", "M6", "1"],
        ])];
        let refs: Vec<&Table> = tables.iter().collect();

        let run = LabelSequencer::new(&start("1234-01"), 10).sequence(&refs, &COLUMNS);
        let serials: Vec<&str> = run.entries.iter().map(|e| e.serial.as_str()).collect();
        assert_eq!(serials, ["1234-01", "1234-02"]);
        assert_eq!(run.warnings.len(), 1);
        assert_eq!(run.warnings[0].row, 1);
        assert_eq!(run.warnings[0].error, RowError::NonPositiveQuantity(0));
        assert!(run.warnings[0].to_string().contains("row 2 of table 1"));
    }

    #[test]
    fn test_counter_widens_past_99() {
        let tables = [table(&[["螺栓", "M6", "3"]])];
        let refs: Vec<&Table> = tables.iter().collect();

        let run = LabelSequencer::new(&start("1234-98"), 10).sequence(&refs, &COLUMNS);
        let serials: Vec<&str> = run.entries.iter().map(|e| e.serial.as_str()).collect();
        assert_eq!(serials, ["1234-98", "1234-99", "1234-100"]);
        assert!(run.serial_overflow);
    }

    #[test]
    fn test_counter_at_99_is_not_overflow() {
        let mut counter = SerialCounter::new(&start("1234-99"));
        assert_eq!(counter.next_serial(), "1234-99");
        assert!(!counter.overflowed());
        assert_eq!(counter.next_serial(), "1234-100");
        assert!(counter.overflowed());
    }
}
