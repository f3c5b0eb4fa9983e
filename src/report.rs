//! The page shown for the current files and selections.
//!
//! `render` is a pure function of its inputs: every interaction rebuilds the
//! whole page from the two file slots and the selections, nothing derived is
//! kept between renders.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::compare::{ComparisonReport, compare_columns};
use crate::domain::AppError;
use crate::duplicates::{DuplicateReport, find_duplicates};
use crate::profile::{Profile, profile};
use crate::table::Table;

pub const PROMPT: &str = "Upload a CSV file to get started!";

#[derive(Debug, Default)]
pub enum FileSlot {
    #[default]
    Empty,
    Loaded(Table),
    Failed {
        path: PathBuf,
        reason: String,
    },
}

impl FileSlot {
    /// Load a CSV file. Failures are kept in the slot instead of being raised.
    pub fn load(path: &Path) -> Self {
        match Table::load(path) {
            Ok(table) => FileSlot::Loaded(table),
            Err(e) => {
                error!("Failed to load {}: {e}", path.display());
                FileSlot::Failed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            FileSlot::Loaded(table) => Some(table),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            FileSlot::Empty => "(none)".to_string(),
            FileSlot::Loaded(table) => table.name().to_string(),
            FileSlot::Failed { path, .. } => format!("{} (failed)", file_name(path)),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string()
}

/// Column names chosen in the selectors. `None` means the first column.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selection {
    pub duplicate_column: Option<String>,
    pub compare_primary: Option<String>,
    pub compare_secondary: Option<String>,
}

/// A column selector populated from a table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub options: Vec<String>,
    pub selected: usize,
}

impl Selector {
    /// Falls back to the first option when `selected` is unset or no longer present.
    pub fn resolve(options: Vec<String>, selected: Option<&str>) -> Self {
        let selected = selected
            .and_then(|name| options.iter().position(|o| o == name))
            .unwrap_or(0);
        Self { options, selected }
    }

    pub fn value(&self) -> Option<&str> {
        self.options.get(self.selected).map(String::as_str)
    }

    /// The option `step` positions away, wrapping around.
    pub fn cycled(&self, step: isize) -> Option<String> {
        if self.options.is_empty() {
            return None;
        }
        let n = self.options.len() as isize;
        let idx = (self.selected as isize + step).rem_euclid(n) as usize;
        Some(self.options[idx].clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateSection {
    pub selector: Selector,
    /// `None` when the table has no columns to select.
    pub report: Option<DuplicateReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonSection {
    Failed {
        name: String,
        reason: String,
    },
    Ready {
        name: String,
        nrows: usize,
        ncolumns: usize,
        primary: Selector,
        secondary: Selector,
        /// Only present on the render triggered by "Compare Files".
        result: Option<ComparisonReport>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub name: String,
    pub profile: Profile,
    pub duplicates: DuplicateSection,
    pub comparison: Option<ComparisonSection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Prompt,
    Failed { name: String, reason: String },
    Analysis(Box<Analysis>),
}

impl Page {
    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            Page::Analysis(analysis) => Some(analysis.as_ref()),
            _ => None,
        }
    }
}

pub fn failure_text(reason: &str) -> String {
    format!("Failed to parse file: {reason}")
}

pub fn render(
    primary: &FileSlot,
    secondary: &FileSlot,
    selection: &Selection,
    compare_requested: bool,
) -> Page {
    let table = match primary {
        FileSlot::Empty => return Page::Prompt,
        FileSlot::Failed { path, reason } => {
            return Page::Failed {
                name: file_name(path),
                reason: reason.clone(),
            };
        }
        FileSlot::Loaded(table) => table,
    };

    match analyse(table, secondary, selection, compare_requested) {
        Ok(analysis) => Page::Analysis(Box::new(analysis)),
        Err(e) => {
            error!("Analysis of {} failed: {e}", table.name());
            Page::Failed {
                name: table.name().to_string(),
                reason: e.to_string(),
            }
        }
    }
}

fn analyse(
    table: &Table,
    secondary: &FileSlot,
    selection: &Selection,
    compare_requested: bool,
) -> Result<Analysis, AppError> {
    let profile = profile(table)?;

    let selector = Selector::resolve(
        table.column_names(),
        selection.duplicate_column.as_deref(),
    );
    let report = match selector.value() {
        Some(column) => Some(find_duplicates(table, column)?),
        None => None,
    };
    let duplicates = DuplicateSection { selector, report };

    let comparison = match secondary {
        FileSlot::Empty => None,
        FileSlot::Failed { path, reason } => Some(ComparisonSection::Failed {
            name: file_name(path),
            reason: reason.clone(),
        }),
        FileSlot::Loaded(other) => Some(comparison(
            table,
            other,
            selection,
            compare_requested,
        )?),
    };

    Ok(Analysis {
        name: table.name().to_string(),
        profile,
        duplicates,
        comparison,
    })
}

fn comparison(
    table: &Table,
    other: &Table,
    selection: &Selection,
    compare_requested: bool,
) -> Result<ComparisonSection, AppError> {
    let primary = Selector::resolve(table.column_names(), selection.compare_primary.as_deref());
    let secondary = Selector::resolve(
        other.column_names(),
        selection.compare_secondary.as_deref(),
    );

    let result = match (compare_requested, primary.value(), secondary.value()) {
        (true, Some(a), Some(b)) => Some(compare_columns(table, a, other, b)?),
        (true, _, _) => {
            info!("Nothing to compare, one of the files has no columns");
            None
        }
        _ => None,
    };

    Ok(ComparisonSection::Ready {
        name: other.name().to_string(),
        nrows: other.nrows(),
        ncolumns: other.ncolumns(),
        primary,
        secondary,
        result,
    })
}
