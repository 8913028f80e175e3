//! Locating purchase-order tables by their header row

use crate::tables::Table;

/// Column labels a table's header must carry to be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLabels {
    /// Item name column (default `货品名称`)
    pub name: String,
    /// Specification column (default `规格`)
    pub spec: String,
    /// Quantity column (default `数量`)
    pub quantity: String,
}

impl Default for HeaderLabels {
    fn default() -> Self {
        Self::new("货品名称", "规格", "数量")
    }
}

impl HeaderLabels {
    pub fn new(name: impl Into<String>, spec: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            quantity: quantity.into(),
        }
    }

    /// Whether a trimmed header row contains all three labels
    pub fn matches(&self, header: &[String]) -> bool {
        [&self.name, &self.spec, &self.quantity]
            .iter()
            .all(|label| header.iter().any(|cell| cell == *label))
    }
}

/// Positions of the three columns within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub name: usize,
    pub spec: usize,
    pub quantity: usize,
}

impl ColumnIndices {
    /// Resolve column positions from a trimmed header row (first match wins)
    pub fn resolve(header: &[String], labels: &HeaderLabels) -> Option<Self> {
        let position = |label: &str| header.iter().position(|cell| cell == label);
        Some(Self {
            name: position(labels.name.as_str())?,
            spec: position(labels.spec.as_str())?,
            quantity: position(labels.quantity.as_str())?,
        })
    }

    /// A row needs more cells than this to carry all three columns
    pub fn max_index(&self) -> usize {
        self.name.max(self.spec).max(self.quantity)
    }
}

/// Tables that carry the required columns
#[derive(Debug)]
pub struct TargetTables<'a> {
    /// Qualifying tables, in document order
    pub tables: Vec<&'a Table>,
    /// Header row of the first qualifying table
    pub header: Option<Vec<String>>,
}

impl TargetTables<'_> {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Column positions shared by every qualifying table
    ///
    /// All tables are read with the first header's layout, so documents
    /// that reorder columns between tables are not supported.
    pub fn columns(&self, labels: &HeaderLabels) -> Option<ColumnIndices> {
        self.header
            .as_deref()
            .and_then(|header| ColumnIndices::resolve(header, labels))
    }
}

/// Find every table whose header contains the required labels
pub fn find_target_tables<'a>(tables: &'a [Table], labels: &HeaderLabels) -> TargetTables<'a> {
    let mut target = TargetTables {
        tables: Vec::new(),
        header: None,
    };

    for table in tables {
        let header = table.header();
        if !labels.matches(&header) {
            log::debug!(
                "skipping table on page {}: header {:?} lacks required columns",
                table.page,
                header
            );
            continue;
        }
        target.tables.push(table);
        if target.header.is_none() {
            target.header = Some(header);
        }
    }

    target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        Table::new(
            1,
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_table_missing_a_header_is_excluded() {
        let tables = vec![
            table(&[&["序号", "货品名称", "规格", "数量"], &["1", "螺栓", "M6", "2"]]),
            table(&[&["货品名称", "数量"], &["垫片", "5"]]),
            table(&[&["货品名称", " 规格 ", "数量"], &["螺母", "M6", "3"]]),
        ];

        let target = find_target_tables(&tables, &HeaderLabels::default());
        assert_eq!(target.tables.len(), 2);
        assert_eq!(target.tables[0].data_rows()[0][1], "螺栓");
        assert_eq!(target.tables[1].data_rows()[0][0], "螺母");
        assert_eq!(
            target.header.as_deref(),
            Some(&["序号", "货品名称", "规格", "数量"].map(String::from)[..])
        );
    }

    #[test]
    fn test_columns_resolved_from_first_header() {
        let tables = vec![table(&[&["数量", "规格", "货品名称"], &["1", "M6", "螺栓"]])];
        let labels = HeaderLabels::default();
        let target = find_target_tables(&tables, &labels);

        let columns = target.columns(&labels).unwrap();
        assert_eq!(
            columns,
            ColumnIndices {
                name: 2,
                spec: 1,
                quantity: 0
            }
        );
        assert_eq!(columns.max_index(), 2);
    }

    #[test]
    fn test_no_qualifying_tables() {
        let tables = vec![table(&[&["Item", "Qty"], &["Bolt", "1"]])];
        let target = find_target_tables(&tables, &HeaderLabels::default());
        assert!(target.is_empty());
        assert!(target.header.is_none());
    }

    #[test]
    fn test_custom_labels() {
        let tables = vec![table(&[&["Item", "Spec", "Qty"], &["Bolt", "M6", "1"]])];
        let labels = HeaderLabels::new("Item", "Spec", "Qty");
        assert_eq!(find_target_tables(&tables, &labels).tables.len(), 1);
    }

    #[test]
    fn test_header_match_is_exact() {
        let header = vec!["货品名称(中文)".to_string(), "规格".into(), "数量".into()];
        assert!(!HeaderLabels::default().matches(&header));
    }
}
