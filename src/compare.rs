use std::collections::BTreeSet;
use tracing::info;

use crate::domain::AppError;
use crate::table::{CellValue, Table};

pub const SAMPLE_SIZE: usize = 10;

/// Set relation between the distinct values of two columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub primary_column: String,
    pub secondary_column: String,
    pub common: BTreeSet<CellValue>,
    pub only_in_primary: BTreeSet<CellValue>,
    pub only_in_secondary: BTreeSet<CellValue>,
}

/// Up to `SAMPLE_SIZE` members in ascending order, or `None` for an empty set.
pub fn sample(values: &BTreeSet<CellValue>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(
            values
                .iter()
                .take(SAMPLE_SIZE)
                .map(|v| v.to_string())
                .collect(),
        )
    }
}

pub fn compare_columns(
    primary: &Table,
    primary_column: &str,
    secondary: &Table,
    secondary_column: &str,
) -> Result<ComparisonReport, AppError> {
    let a: BTreeSet<CellValue> = primary.values(primary_column)?.into_iter().collect();
    let b: BTreeSet<CellValue> = secondary.values(secondary_column)?.into_iter().collect();

    let report = ComparisonReport {
        primary_column: primary_column.to_string(),
        secondary_column: secondary_column.to_string(),
        common: a.intersection(&b).cloned().collect(),
        only_in_primary: a.difference(&b).cloned().collect(),
        only_in_secondary: b.difference(&a).cloned().collect(),
    };
    info!(
        "Compared {}[{}] with {}[{}]: {} common, {} only primary, {} only secondary",
        primary.name(),
        primary_column,
        secondary.name(),
        secondary_column,
        report.common.len(),
        report.only_in_primary.len(),
        report.only_in_secondary.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn ints(values: &[i64]) -> BTreeSet<CellValue> {
        values.iter().map(|v| CellValue::Int(*v)).collect()
    }

    #[test]
    fn splits_values_into_common_and_exclusive_sets() {
        let a = Table::from_frame("a", df!("x" => [1i64, 2, 3, 4, 4]).unwrap());
        let b = Table::from_frame("b", df!("y" => [3i64, 4, 5, 6]).unwrap());
        let report = compare_columns(&a, "x", &b, "y").unwrap();
        assert_eq!(report.common, ints(&[3, 4]));
        assert_eq!(report.only_in_primary, ints(&[1, 2]));
        assert_eq!(report.only_in_secondary, ints(&[5, 6]));
    }

    #[test]
    fn integers_and_floats_are_equal_but_text_is_not() {
        let a = Table::from_frame("a", df!("x" => [5i64, 6]).unwrap());
        let b = Table::from_frame("b", df!("y" => [5.0f64, 7.5]).unwrap());
        let report = compare_columns(&a, "x", &b, "y").unwrap();
        assert_eq!(report.common, ints(&[5]));

        let c = Table::from_frame("c", df!("z" => ["5", "6"]).unwrap());
        let report = compare_columns(&a, "x", &c, "z").unwrap();
        assert!(report.common.is_empty());
        assert_eq!(report.only_in_primary.len(), 2);
        assert_eq!(report.only_in_secondary.len(), 2);
    }

    #[test]
    fn large_integers_are_compared_exactly() {
        let a = Table::from_frame("a", df!("x" => [9_007_199_254_740_993i64]).unwrap());
        let b = Table::from_frame("b", df!("y" => [9_007_199_254_740_992i64]).unwrap());
        let report = compare_columns(&a, "x", &b, "y").unwrap();
        assert!(report.common.is_empty());
        assert_eq!(report.only_in_primary, ints(&[9_007_199_254_740_993]));
        assert_eq!(report.only_in_secondary, ints(&[9_007_199_254_740_992]));
        assert_eq!(
            sample(&report.only_in_primary),
            Some(vec!["9007199254740993".to_string()])
        );
    }

    #[test]
    fn missing_values_are_ignored() {
        let a = Table::from_frame("a", df!("x" => [Some("k"), None]).unwrap());
        let b = Table::from_frame("b", df!("y" => [None::<&str>, Some("k")]).unwrap());
        let report = compare_columns(&a, "x", &b, "y").unwrap();
        assert_eq!(report.common.len(), 1);
        assert!(report.only_in_primary.is_empty());
        assert!(report.only_in_secondary.is_empty());
    }

    #[test]
    fn samples_are_sorted_and_capped() {
        let values = ints(&(0..25i64).rev().collect::<Vec<_>>());
        let s = sample(&values).unwrap();
        assert_eq!(s.len(), SAMPLE_SIZE);
        assert_eq!(s.first().map(String::as_str), Some("0"));
        assert_eq!(s.last().map(String::as_str), Some("9"));
        assert_eq!(sample(&BTreeSet::new()), None);
    }
}
