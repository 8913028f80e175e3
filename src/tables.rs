//! Table detection and formatting
//!
//! Purchase orders lay their line items out as a grid: a header row with the
//! column labels, then data rows whose cells sit under those labels. Items
//! are clustered into rows by Y; the first row with several separated cells
//! opens a region and fixes the column anchors, and following rows extend
//! the region while they stay within its horizontal extent.

use crate::extractor::{extract_text_items, TextItem};
use crate::LabelError;
use lopdf::Document;

/// Rows closer than this fraction of the font size share a row
const ROW_TOLERANCE_RATIO: f32 = 0.5;

/// Items separated by less than this many ems belong to the same cell
const CELL_GAP_RATIO: f32 = 1.0;

/// A vertical gap above this many ems between rows ends a table
const MAX_ROW_GAP_RATIO: f32 = 4.0;

/// Wrapped lines sit closer than this fraction of the table's row pitch
const CONTINUATION_PITCH_RATIO: f32 = 0.75;

/// A detected table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Page the table was found on (1-indexed)
    pub page: u32,
    /// Column anchors (x centres of the header cells)
    pub columns: Vec<f32>,
    /// Cell contents indexed by (row, col); row 0 is the header
    pub cells: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from plain cell text, without layout information
    pub fn new(page: u32, cells: Vec<Vec<String>>) -> Self {
        Self {
            page,
            columns: Vec::new(),
            cells,
        }
    }

    /// The header row, trimmed
    pub fn header(&self) -> Vec<String> {
        self.cells
            .first()
            .map(|row| row.iter().map(|c| c.trim().to_string()).collect())
            .unwrap_or_default()
    }

    /// Every row after the header
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.cells.get(1..).unwrap_or(&[])
    }
}

/// Load every table of a document, in page order
pub fn extract_tables(doc: &Document) -> Result<Vec<Table>, LabelError> {
    let items = extract_text_items(doc)?;

    let mut pages: Vec<u32> = items.iter().map(|i| i.page).collect();
    pages.dedup();

    let mut tables = Vec::new();
    for page in pages {
        let page_items: Vec<TextItem> = items.iter().filter(|i| i.page == page).cloned().collect();
        let found = detect_tables(&page_items);
        log::debug!("page {}: {} tables", page, found.len());
        tables.extend(found);
    }

    Ok(tables)
}

/// A cluster of items sharing a baseline, sorted left to right
#[derive(Debug)]
struct Row<'a> {
    y: f32,
    font_size: f32,
    items: Vec<&'a TextItem>,
}

/// Items of one row that sit next to each other
#[derive(Debug)]
struct Segment<'a> {
    items: Vec<&'a TextItem>,
}

impl Segment<'_> {
    fn left(&self) -> f32 {
        self.items.first().map_or(0.0, |i| i.x)
    }

    fn right(&self) -> f32 {
        self.items.iter().map(|i| i.right()).fold(f32::MIN, f32::max)
    }

    fn center(&self) -> f32 {
        (self.left() + self.right()) / 2.0
    }
}

/// Column layout fixed by a table's header row
#[derive(Debug)]
struct Region {
    anchors: Vec<f32>,
    left: f32,
    right: f32,
    last_y: f32,
    /// Gap between the header and the first data row
    pitch: Option<f32>,
}

impl Region {
    fn from_header(segments: &[Segment<'_>], y: f32) -> Self {
        let anchors: Vec<f32> = segments.iter().map(Segment::center).collect();
        let avg_gap = if anchors.len() > 1 {
            (anchors[anchors.len() - 1] - anchors[0]) / (anchors.len() - 1) as f32
        } else {
            0.0
        };
        let left = segments.first().map_or(0.0, Segment::left);
        let right = segments.last().map_or(0.0, Segment::right);
        Self {
            anchors,
            left: left - avg_gap / 2.0,
            right: right + avg_gap / 2.0,
            last_y: y,
            pitch: None,
        }
    }

    /// Whether `row` continues the table
    fn accepts(&self, row: &Row<'_>, segments: &[Segment<'_>]) -> bool {
        let gap = self.last_y - row.y;
        if gap > row.font_size * MAX_ROW_GAP_RATIO {
            return false;
        }
        segments.iter().all(|s| {
            let center = s.center();
            center >= self.left && center <= self.right
        })
    }

    /// Whether `row` holds wrapped lines of `prev` rather than a new row
    ///
    /// The first cell must be empty, the row must sit clearly closer than the
    /// table's row pitch, and it may only extend cells `prev` already filled.
    fn continues(&self, gap: f32, prev: &[String], row: &[String]) -> bool {
        let Some(pitch) = self.pitch else {
            return false;
        };
        row.first().is_some_and(|c| c.is_empty())
            && row.iter().any(|c| !c.is_empty())
            && gap < pitch * CONTINUATION_PITCH_RATIO
            && row
                .iter()
                .zip(prev)
                .all(|(text, above)| text.is_empty() || !above.is_empty())
    }

    fn column_of(&self, segment: &Segment<'_>) -> usize {
        let center = segment.center();
        self.anchors
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (center - **a)
                    .abs()
                    .partial_cmp(&(center - **b).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map_or(0, |(idx, _)| idx)
    }

    fn cells(&self, segments: &[Segment<'_>]) -> Vec<String> {
        let mut cells = vec![String::new(); self.anchors.len()];
        for segment in segments {
            let cell = &mut cells[self.column_of(segment)];
            let text = join_cell_items(&segment.items);
            if text.is_empty() {
                continue;
            }
            if !cell.is_empty() {
                cell.push(' ');
            }
            cell.push_str(&text);
        }
        cells
    }
}

/// Detect tables in the text items of a single page
pub fn detect_tables(items: &[TextItem]) -> Vec<Table> {
    let rows = group_rows(items);
    let Some(page) = items.first().map(|i| i.page) else {
        return Vec::new();
    };

    let mut tables = Vec::new();
    let mut region: Option<(Region, Vec<Vec<String>>)> = None;

    for row in &rows {
        let segments = split_segments(row);

        if let Some((current, cells)) = region.as_mut() {
            if current.accepts(row, &segments) {
                let gap = current.last_y - row.y;
                let row_cells = current.cells(&segments);
                let has_data = cells.len() > 1;
                match cells.last_mut() {
                    Some(prev) if has_data && current.continues(gap, prev, &row_cells) => {
                        merge_continuation(prev, row_cells);
                    }
                    _ => {
                        current.pitch.get_or_insert(gap);
                        cells.push(row_cells);
                    }
                }
                current.last_y = row.y;
                continue;
            }
            if let Some((done, cells)) = region.take() {
                finish_table(page, done, cells, &mut tables);
            }
        }

        if segments.len() >= 2 {
            let header = Region::from_header(&segments, row.y);
            let header_cells = header.cells(&segments);
            region = Some((header, vec![header_cells]));
        }
    }

    if let Some((done, cells)) = region {
        finish_table(page, done, cells, &mut tables);
    }

    tables
}

fn finish_table(page: u32, region: Region, cells: Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if cells.len() < 2 {
        return;
    }
    tables.push(Table {
        page,
        columns: region.anchors,
        cells,
    });
}

/// Append wrapped lines to the cells of the row above, separated by newlines
fn merge_continuation(prev_row: &mut [String], row: Vec<String>) {
    for (prev, text) in prev_row.iter_mut().zip(row) {
        if text.is_empty() {
            continue;
        }
        if !prev.is_empty() {
            prev.push('\n');
        }
        prev.push_str(&text);
    }
}

/// Cluster items into rows by Y position, top of the page first
fn group_rows(items: &[TextItem]) -> Vec<Row<'_>> {
    let mut sorted: Vec<&TextItem> = items.iter().collect();
    sorted.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal));

    let mut rows: Vec<Row<'_>> = Vec::new();
    for item in sorted {
        let joins_last = rows.last().is_some_and(|row| {
            let tolerance = row.font_size.max(item.font_size) * ROW_TOLERANCE_RATIO;
            (row.y - item.y).abs() <= tolerance
        });

        if joins_last {
            if let Some(row) = rows.last_mut() {
                row.items.push(item);
                row.y = row.items.iter().map(|i| i.y).sum::<f32>() / row.items.len() as f32;
                row.font_size = row.font_size.max(item.font_size);
            }
        } else {
            rows.push(Row {
                y: item.y,
                font_size: item.font_size,
                items: vec![item],
            });
        }
    }

    for row in &mut rows {
        row.items
            .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }

    rows
}

/// Split a row into horizontally separated segments
fn split_segments<'a>(row: &Row<'a>) -> Vec<Segment<'a>> {
    let mut segments: Vec<Segment<'a>> = Vec::new();
    let min_gap = row.font_size * CELL_GAP_RATIO;

    for &item in &row.items {
        match segments.last_mut() {
            Some(segment) if item.x - segment.right() < min_gap => segment.items.push(item),
            _ => segments.push(Segment { items: vec![item] }),
        }
    }

    segments
}

/// Join the items of one cell, left to right
fn join_cell_items(items: &[&TextItem]) -> String {
    let mut result = String::new();

    for (i, item) in items.iter().enumerate() {
        let text = item.text.trim();
        if text.is_empty() {
            continue;
        }

        if result.is_empty() {
            result.push_str(text);
            continue;
        }

        // Adjacent glyph runs (a Tj per character is common in CJK output)
        // carry no gap and must not gain a space.
        let prev = items[i - 1];
        let touching = item.x - prev.right() < item.font_size * 0.15;
        let prev_ends_with_hyphen = result.ends_with('-');
        let curr_starts_with_hyphen = text.starts_with('-');

        if touching || prev_ends_with_hyphen || curr_starts_with_hyphen {
            result.push_str(text);
        } else {
            result.push(' ');
            result.push_str(text);
        }
    }

    result
}

/// Format a table as markdown
pub fn table_to_markdown(table: &Table) -> String {
    if table.cells.is_empty() || table.cells[0].is_empty() {
        return String::new();
    }

    let num_cols = table.cells.iter().map(Vec::len).max().unwrap_or(0);
    let cells: Vec<Vec<String>> = table
        .cells
        .iter()
        .map(|row| {
            (0..num_cols)
                .map(|col| {
                    row.get(col)
                        .map(|c| c.replace('|', "\\|").replace('\n', "<br>"))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let col_widths: Vec<usize> = (0..num_cols)
        .map(|col| {
            cells
                .iter()
                .map(|row| row[col].chars().count())
                .max()
                .unwrap_or(3)
                .max(3)
        })
        .collect();

    let mut output = String::new();
    for (row_idx, row) in cells.iter().enumerate() {
        output.push('|');
        for (col_idx, cell) in row.iter().enumerate() {
            let pad = col_widths[col_idx] - cell.chars().count();
            output.push_str(&format!(" {}{} |", cell, " ".repeat(pad)));
        }
        output.push('\n');

        if row_idx == 0 {
            output.push('|');
            for width in &col_widths {
                output.push_str(&format!(" {} |", "-".repeat(*width)));
            }
            output.push('\n');
        }
    }

    output
}
