use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use tracing::{debug, info};

use crate::domain::AppError;

/// An uploaded CSV file, fully parsed into memory.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    frame: DataFrame,
}

impl Table {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        Self::check_file(path)?;

        let start_time = Instant::now();
        let frame = LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()?
            .collect()?;
        info!(
            "Parsed {} ({} rows, {} columns) in {}ms",
            path.display(),
            frame.height(),
            frame.width(),
            start_time.elapsed().as_millis()
        );
        for column in frame.get_columns() {
            debug!("Column: \"{}\" {:?}", column.name(), column.dtype());
        }

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        Ok(Self::from_frame(name, frame))
    }

    pub fn from_frame(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }

    fn check_file(path: &Path) -> Result<(), AppError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::FileNotFound,
            ErrorKind::PermissionDenied => AppError::PermissionDenied,
            _ => AppError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(AppError::NotAFile);
        }
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(()),
            _ => Err(AppError::UnknownFileType),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn nrows(&self) -> usize {
        self.frame.height()
    }

    pub fn ncolumns(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column, AppError> {
        self.frame
            .column(name)
            .map_err(|_| AppError::UnknownColumn(name.to_string()))
    }

    /// Non-missing values of a column, in row order.
    pub fn values(&self, name: &str) -> Result<Vec<CellValue>, AppError> {
        column_values(self.column(name)?)
    }
}

pub fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

pub fn is_float_type(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Render every cell of a column as display text. Missing cells become `∅`.
pub fn column_text(column: &Column) -> Result<Vec<String>, AppError> {
    let col = column.cast(&DataType::String)?;
    let series = col.str()?;
    Ok(series
        .into_iter()
        .map(|value| match value {
            Some(s) => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
            None => String::from("∅"),
        })
        .collect())
}

/// Float view of a numeric column. NaN cells are reported as missing.
pub fn column_floats(column: &Column) -> Result<Vec<Option<f64>>, AppError> {
    let col = column.cast(&DataType::Float64)?;
    let series = col.as_materialized_series().f64()?;
    Ok(series
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect())
}

fn column_values(column: &Column) -> Result<Vec<CellValue>, AppError> {
    let dtype = column.dtype();
    let values = if is_signed_integer_type(dtype) {
        let col = column.cast(&DataType::Int64)?;
        col.as_materialized_series()
            .i64()?
            .into_iter()
            .flatten()
            .map(CellValue::Int)
            .collect()
    } else if is_unsigned_integer_type(dtype) {
        let col = column.cast(&DataType::UInt64)?;
        col.as_materialized_series()
            .u64()?
            .into_iter()
            .flatten()
            .map(CellValue::UInt)
            .collect()
    } else if is_numeric_type(dtype) {
        column_floats(column)?
            .into_iter()
            .flatten()
            .map(CellValue::Float)
            .collect()
    } else if matches!(dtype, DataType::Boolean) {
        column
            .as_materialized_series()
            .bool()?
            .into_iter()
            .flatten()
            .map(CellValue::Bool)
            .collect()
    } else {
        let col = column.cast(&DataType::String)?;
        col.str()?
            .into_iter()
            .flatten()
            .map(|s| CellValue::Text(s.to_string()))
            .collect()
    };
    Ok(values)
}

fn is_signed_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
    )
}

fn is_unsigned_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
    )
}

/// A non-missing cell, keyed by its stored representation.
///
/// Integers are kept exact. Numbers compare by their mathematical value
/// regardless of integer or float storage, so `5` equals `5.0` while
/// `9007199254740993` and `9007199254740992.0` stay distinct. A number never
/// equals text. Ordering is booleans, then numbers, then text.
#[derive(Debug, Clone)]
pub enum CellValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl CellValue {
    fn rank(&self) -> u8 {
        match self {
            CellValue::Bool(_) => 0,
            CellValue::Int(_) | CellValue::UInt(_) | CellValue::Float(_) => 1,
            CellValue::Text(_) => 2,
        }
    }

    fn number(&self) -> Option<Number> {
        match self {
            CellValue::Int(i) => Some(Number::Exact(i128::from(*i))),
            CellValue::UInt(u) => Some(Number::Exact(i128::from(*u))),
            CellValue::Float(f) => Some(Number::from_float(*f)),
            _ => None,
        }
    }
}

// 2^127, the first float past the i128 range
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

/// Canonical form of a numeric cell. Floats holding a whole number in the
/// i128 range become `Exact`, so equal values always share one form.
#[derive(Debug, Clone, Copy)]
enum Number {
    Exact(i128),
    Inexact(f64),
}

impl Number {
    fn from_float(f: f64) -> Self {
        if f.fract() == 0.0 && (-I128_BOUND..I128_BOUND).contains(&f) {
            Number::Exact(f as i128)
        } else {
            Number::Inexact(f)
        }
    }

    fn compare(self, other: Self) -> Ordering {
        match (self, other) {
            (Number::Exact(a), Number::Exact(b)) => a.cmp(&b),
            (Number::Inexact(a), Number::Inexact(b)) => a.total_cmp(&b),
            (Number::Exact(a), Number::Inexact(b)) => exact_cmp_inexact(a, b),
            (Number::Inexact(a), Number::Exact(b)) => exact_cmp_inexact(b, a).reverse(),
        }
    }
}

// `f` is never a whole number inside the i128 range here, so the two are never equal
fn exact_cmp_inexact(i: i128, f: f64) -> Ordering {
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    let floor = f.floor();
    if floor >= I128_BOUND {
        Ordering::Less
    } else if floor < -I128_BOUND {
        Ordering::Greater
    } else if i <= floor as i128 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            _ => match (self.number(), other.number()) {
                (Some(a), Some(b)) => a.compare(b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CellValue::Bool(b) => b.hash(state),
            CellValue::Text(s) => s.hash(state),
            _ => match self.number() {
                Some(Number::Exact(i)) => i.hash(state),
                Some(Number::Inexact(f)) => f.to_bits().hash(state),
                None => {}
            },
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::UInt(u) => write!(f, "{u}"),
            CellValue::Float(n) => write!(f, "{}", if *n == 0.0 { 0.0 } else { *n }),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Expand `~` and environment variables in a user supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf, AppError> {
    let expanded =
        shellexpand::full(raw.trim()).map_err(|e| AppError::PathExpansion(e.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn numbers_compare_across_storage() {
        assert_eq!(CellValue::Int(5), CellValue::Float(5.0));
        assert_eq!(CellValue::UInt(5), CellValue::Int(5));
        assert_eq!(CellValue::Float(0.0), CellValue::Float(-0.0));
        assert_ne!(CellValue::Int(5), CellValue::Float(5.5));
        assert_ne!(CellValue::Int(5), CellValue::Text("5".into()));
        assert!(CellValue::Int(-1) < CellValue::UInt(0));
        assert!(CellValue::Float(f64::NEG_INFINITY) < CellValue::Int(i64::MIN));
        assert!(CellValue::UInt(u64::MAX) < CellValue::Float(f64::INFINITY));

        let set: HashSet<CellValue> = [
            CellValue::Float(-0.0),
            CellValue::Float(0.0),
            CellValue::Int(0),
            CellValue::UInt(0),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn large_integers_stay_exact() {
        let a = CellValue::Int(9_007_199_254_740_992);
        let b = CellValue::Int(9_007_199_254_740_993);
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(b.to_string(), "9007199254740993");

        // 2^53 + 1 has no f64 form, the nearest float is 2^53
        assert_eq!(a, CellValue::Float(9_007_199_254_740_992.0));
        assert_ne!(b, CellValue::Float(9_007_199_254_740_992.0));
        assert!(b > CellValue::Float(9_007_199_254_740_992.0));
        assert_ne!(CellValue::UInt(u64::MAX), CellValue::UInt(u64::MAX - 1));
        assert_eq!(CellValue::UInt(u64::MAX - 1).to_string(), "18446744073709551614");

        let set: HashSet<CellValue> = [a, b, CellValue::Float(9_007_199_254_740_992.0)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn values_are_ordered_by_kind_then_value() {
        let mut values = vec![
            CellValue::Text("b".into()),
            CellValue::Int(10),
            CellValue::Text("a".into()),
            CellValue::Float(2.5),
            CellValue::UInt(2),
            CellValue::Bool(true),
        ];
        values.sort();
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(rendered, vec!["true", "2", "2.5", "10", "a", "b"]);
    }

    #[test]
    fn column_values_skip_missing() {
        let df = df!(
            "n" => [Some(1i64), None, Some(3)],
            "s" => [Some("x"), Some("y"), None],
        )
        .unwrap();
        let table = Table::from_frame("t", df);
        assert_eq!(
            table.values("n").unwrap(),
            vec![CellValue::Int(1), CellValue::Int(3)]
        );
        assert_eq!(
            table.values("s").unwrap(),
            vec![CellValue::Text("x".into()), CellValue::Text("y".into())]
        );
        assert!(matches!(
            table.values("missing"),
            Err(AppError::UnknownColumn(_))
        ));
    }

    #[test]
    fn nan_counts_as_missing() {
        let df = df!("f" => [Some(1.5f64), Some(f64::NAN), None]).unwrap();
        let floats = column_floats(df.column("f").unwrap()).unwrap();
        assert_eq!(floats, vec![Some(1.5), None, None]);
    }

    #[test]
    fn column_text_marks_missing_and_newlines() {
        let df = df!("s" => [Some("a\nb"), None]).unwrap();
        let text = column_text(df.column("s").unwrap()).unwrap();
        assert_eq!(text, vec!["a ↵ b".to_string(), "∅".to_string()]);
    }

    #[test]
    fn load_rejects_non_csv_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("data.txt");
        fs::write(&txt, "a,b\n1,2\n").unwrap();
        assert!(matches!(Table::load(&txt), Err(AppError::UnknownFileType)));
        assert!(matches!(
            Table::load(&dir.path().join("nope.csv")),
            Err(AppError::FileNotFound)
        ));
        assert!(matches!(Table::load(dir.path()), Err(AppError::NotAFile)));
    }

    #[test]
    fn load_infers_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.CSV");
        fs::write(&path, "id,name,score\n1,ann,2.5\n2,bob,\n").unwrap();
        let table = Table::load(&path).unwrap();
        assert_eq!(table.name(), "data.CSV");
        assert_eq!(table.nrows(), 2);
        assert_eq!(table.column_names(), vec!["id", "name", "score"]);
        assert!(is_numeric_type(table.column("id").unwrap().dtype()));
        assert!(!is_numeric_type(table.column("name").unwrap().dtype()));
        assert!(is_float_type(table.column("score").unwrap().dtype()));
    }

    #[test]
    fn large_integer_column_is_read_exactly() {
        let df = df!(
            "i" => [9_007_199_254_740_993i64],
            "u" => [u64::MAX],
            "f" => [0.5f64],
        )
        .unwrap();
        let table = Table::from_frame("t", df);
        assert_eq!(
            table.values("i").unwrap(),
            vec![CellValue::Int(9_007_199_254_740_993)]
        );
        assert!(matches!(
            table.values("u").unwrap().as_slice(),
            [CellValue::UInt(u64::MAX)]
        ));
        assert!(matches!(
            table.values("f").unwrap().as_slice(),
            [CellValue::Float(f)] if *f == 0.5
        ));
    }

    #[test]
    fn expand_path_resolves_home() {
        let home = PathBuf::from(std::env::var("HOME").unwrap());
        assert_eq!(expand_path(" ~/a.csv ").unwrap(), home.join("a.csv"));
        assert_eq!(expand_path("$HOME/a.csv").unwrap(), home.join("a.csv"));
        assert!(matches!(
            expand_path("$TABPROBE_UNSET_VARIABLE/a.csv"),
            Err(AppError::PathExpansion(_))
        ));
    }
}
