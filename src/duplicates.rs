use std::collections::HashMap;
use tracing::trace;

use crate::domain::AppError;
use crate::table::{CellValue, Table};

/// Values of a single column that occur more than once.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateReport {
    pub column: String,
    /// Ordered by count descending, then by value.
    pub duplicates: Vec<(CellValue, usize)>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty()
    }

    /// Occurrences beyond the first of every duplicated value.
    pub fn total_duplicate_rows(&self) -> usize {
        self.duplicates.iter().map(|(_, count)| count - 1).sum()
    }
}

pub fn find_duplicates(table: &Table, column: &str) -> Result<DuplicateReport, AppError> {
    let values = table.values(column)?;
    Ok(DuplicateReport {
        column: column.to_string(),
        duplicates: duplicated_values(values),
    })
}

fn duplicated_values(values: Vec<CellValue>) -> Vec<(CellValue, usize)> {
    let mut counts: HashMap<CellValue, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut duplicates: Vec<(CellValue, usize)> =
        counts.into_iter().filter(|(_, count)| *count > 1).collect();
    duplicates.sort_unstable_by(|(va, ca), (vb, cb)| cb.cmp(ca).then_with(|| va.cmp(vb)));
    trace!("Found {} duplicated values", duplicates.len());
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn counts_values_seen_more_than_once() {
        let df = df!("c" => ["A", "A", "B", "C", "C", "C"]).unwrap();
        let report = find_duplicates(&Table::from_frame("t", df), "c").unwrap();
        assert_eq!(report.duplicates, vec![(text("C"), 3), (text("A"), 2)]);
        assert_eq!(report.total_duplicate_rows(), 3);
        assert!(!report.is_empty());
    }

    #[test]
    fn unique_values_have_no_duplicates() {
        let df = df!("c" => [1i64, 2, 3]).unwrap();
        let report = find_duplicates(&Table::from_frame("t", df), "c").unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_duplicate_rows(), 0);
    }

    #[test]
    fn missing_cells_are_not_counted() {
        let df = df!("c" => [None, None, Some(7i64), Some(7)]).unwrap();
        let report = find_duplicates(&Table::from_frame("t", df), "c").unwrap();
        assert_eq!(report.duplicates, vec![(CellValue::Int(7), 2)]);
    }

    #[test]
    fn large_integer_ids_are_not_merged() {
        let df = df!("id" => [9_007_199_254_740_992i64, 9_007_199_254_740_993]).unwrap();
        let report = find_duplicates(&Table::from_frame("t", df), "id").unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_duplicate_rows(), 0);
    }

    #[test]
    fn ties_are_ordered_by_value() {
        let values = ["b", "a", "b", "a", "z"].map(text).to_vec();
        assert_eq!(
            duplicated_values(values),
            vec![(text("a"), 2), (text("b"), 2)]
        );
    }
}
