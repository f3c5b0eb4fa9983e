use polars::prelude::*;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::AppError;
use crate::table::{Table, column_floats, column_text, is_float_type, is_numeric_type};

pub const PREVIEW_ROWS: usize = 5;

pub const STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Type and missing-value information for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub numeric: bool,
    pub missing: usize,
    pub missing_percentage: f64,
}

impl ColumnProfile {
    pub fn missing_label(&self) -> String {
        format_percentage(self.missing_percentage)
    }
}

/// Descriptive statistics of a numeric column. Statistics of an empty column are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStatistics {
    /// Values in the order of `STATISTICS`.
    pub fn rendered(&self) -> Vec<String> {
        let mut out = vec![self.count.to_string()];
        out.extend(
            [
                self.mean, self.std, self.min, self.q25, self.q50, self.q75, self.max,
            ]
            .iter()
            .map(|v| format_statistic(*v)),
        );
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub nrows: usize,
    /// Column name and rendered cells of the first `PREVIEW_ROWS` rows.
    pub preview: Vec<(String, Vec<String>)>,
    pub columns: Vec<ColumnProfile>,
    /// `None` when the table has no numeric column.
    pub statistics: Option<Vec<ColumnStatistics>>,
}

pub fn profile(table: &Table) -> Result<Profile, AppError> {
    let start_time = Instant::now();
    let nrows = table.nrows();

    let head = table.frame().head(Some(PREVIEW_ROWS));
    let preview = head
        .get_columns()
        .iter()
        .map(|c| Ok((c.name().to_string(), column_text(c)?)))
        .collect::<Result<Vec<_>, AppError>>()?;

    // Each column is profiled in its own rayon task, results keep column order
    let names = table.column_names();
    let columns = names
        .par_iter()
        .map(|name| profile_column(table.column(name)?, nrows))
        .collect::<Result<Vec<_>, AppError>>()?;

    let numeric: Vec<&ColumnProfile> = columns.iter().filter(|c| c.numeric).collect();
    let statistics = if numeric.is_empty() {
        None
    } else {
        let stats = numeric
            .par_iter()
            .map(|c| column_statistics(table.column(&c.name)?))
            .collect::<Result<Vec<_>, AppError>>()?;
        Some(stats)
    };

    for c in columns.iter() {
        debug!(
            "Profile: \"{}\" {}, missing {} ({})",
            c.name,
            c.dtype,
            c.missing,
            c.missing_label()
        );
    }
    info!(
        "Profiled {} in {}ms",
        table.name(),
        start_time.elapsed().as_millis()
    );

    Ok(Profile {
        nrows,
        preview,
        columns,
        statistics,
    })
}

fn profile_column(column: &Column, nrows: usize) -> Result<ColumnProfile, AppError> {
    let dtype = column.dtype();
    let missing = if is_float_type(dtype) {
        column_floats(column)?.iter().filter(|v| v.is_none()).count()
    } else {
        column.null_count()
    };
    Ok(ColumnProfile {
        name: column.name().to_string(),
        dtype: dtype.to_string(),
        numeric: is_numeric_type(dtype),
        missing,
        missing_percentage: missing_percentage(missing, nrows),
    })
}

pub fn column_statistics(column: &Column) -> Result<ColumnStatistics, AppError> {
    let mut values: Vec<f64> = column_floats(column)?.into_iter().flatten().collect();
    values.sort_by(f64::total_cmp);

    let ca = Float64Chunked::from_vec(column.name().clone(), values.clone());
    Ok(ColumnStatistics {
        name: column.name().to_string(),
        count: values.len(),
        mean: ca.mean(),
        std: ca.std(1),
        min: ca.min(),
        q25: quantile(&values, 0.25),
        q50: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: ca.max(),
    })
}

/// Linear interpolation between the closest ranks of sorted `values`.
fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let pos = q * (values.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * frac)
}

/// Share of missing cells in percent, rounded to two decimals. An empty table has 0%.
pub fn missing_percentage(missing: usize, nrows: usize) -> f64 {
    if nrows == 0 {
        return 0.0;
    }
    (missing as f64 / nrows as f64 * 100.0 * 100.0).round() / 100.0
}

pub fn format_percentage(p: f64) -> String {
    format!("{}%", format_float(p))
}

fn format_statistic(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let rounded = (v * 1_000_000.0).round() / 1_000_000.0;
            format_float(rounded)
        }
        Some(v) => v.to_string(),
        None => "NaN".to_string(),
    }
}

// Whole numbers keep one decimal place: 50.0, 33.33
fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let df = df!(
            "id" => [1i64, 2, 3, 4],
            "name" => [Some("a"), None, Some("c"), None],
            "score" => [Some(1.0f64), Some(2.0), None, Some(f64::NAN)],
        )
        .unwrap();
        Table::from_frame("t", df)
    }

    #[test]
    fn percentage_is_rounded_and_guarded() {
        assert_eq!(missing_percentage(1, 3), 33.33);
        assert_eq!(missing_percentage(2, 3), 66.67);
        assert_eq!(missing_percentage(0, 0), 0.0);
        assert_eq!(missing_percentage(5, 0), 0.0);
        assert_eq!(format_percentage(50.0), "50.0%");
        assert_eq!(format_percentage(33.33), "33.33%");
        assert_eq!(format_percentage(0.0), "0.0%");
    }

    #[test]
    fn columns_report_type_and_missing_values() {
        let p = profile(&table()).unwrap();
        assert_eq!(p.nrows, 4);
        let summary: Vec<(&str, usize, bool)> = p
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.missing, c.numeric))
            .collect();
        assert_eq!(
            summary,
            vec![("id", 0, true), ("name", 2, false), ("score", 2, true)]
        );
        assert_eq!(p.columns[1].missing_label(), "50.0%");
        assert_eq!(p.columns[0].dtype, "i64");
    }

    #[test]
    fn preview_is_capped_at_five_rows() {
        let df = df!("x" => (0..12i64).collect::<Vec<_>>()).unwrap();
        let p = profile(&Table::from_frame("t", df)).unwrap();
        assert_eq!(p.preview.len(), 1);
        assert_eq!(p.preview[0].1, vec!["0", "1", "2", "3", "4"]);

        let p = profile(&table()).unwrap();
        assert_eq!(p.preview[1].1, vec!["a", "∅", "c", "∅"]);
    }

    #[test]
    fn statistics_cover_numeric_columns_only() {
        let p = profile(&table()).unwrap();
        let stats = p.statistics.unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["id", "score"]);

        let id = &stats[0];
        assert_eq!(id.count, 4);
        assert_eq!(id.mean, Some(2.5));
        assert_eq!(id.min, Some(1.0));
        assert_eq!(id.q25, Some(1.75));
        assert_eq!(id.q50, Some(2.5));
        assert_eq!(id.q75, Some(3.25));
        assert_eq!(id.max, Some(4.0));
        let std = id.std.unwrap();
        assert!((std - 1.290994).abs() < 1e-6);

        assert_eq!(stats[1].count, 2);
    }

    #[test]
    fn no_numeric_columns_means_no_statistics() {
        let df = df!("s" => ["a", "b"]).unwrap();
        let p = profile(&Table::from_frame("t", df)).unwrap();
        assert!(p.statistics.is_none());
    }

    #[test]
    fn empty_numeric_column_renders_nan() {
        let df = df!("f" => [None::<f64>, None]).unwrap();
        let stats = column_statistics(df.column("f").unwrap()).unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(
            stats.rendered(),
            vec!["0", "NaN", "NaN", "NaN", "NaN", "NaN", "NaN", "NaN"]
        );
    }
}
