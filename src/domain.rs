use std::io;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    PolarsError(#[from] PolarsError),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("not a file")]
    NotAFile,
    #[error("unknown file type, expected a .csv file")]
    UnknownFileType,
    #[error("cannot expand path: {0}")]
    PathExpansion(String),
    #[error("unknown column \"{0}\"")]
    UnknownColumn(String),
}

/// Runtime settings, assembled from the command line in `main`.
#[derive(Debug, Clone, Setters)]
pub struct AppConfig {
    /// Milliseconds to wait for a terminal event before redrawing.
    pub event_poll_time: u64,
    /// Cells wider than this are truncated when rendered in report tables.
    pub max_column_width: usize,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 32,
            log_file: std::env::temp_dir().join("tabprobe.log"),
        }
    }
}

/// Which file slot a path prompt loads into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Exit,
    Enter,
    Help,
    FocusNext,
    FocusPrev,
    SelectNext,
    SelectPrev,
    Compare,
    OpenFile(Slot),
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollTop,
    ScrollBottom,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
Files
  o          open primary CSV file
  s          open secondary CSV file (for comparison)

Controls
  Tab        focus next control
  Shift-Tab  focus previous control
  Left/Right change the focused column selection
  Enter      press the focused button
  c          compare files

Report
  Up/Down    scroll
  PgUp/PgDn  scroll a page
  Home/End   jump to top / bottom

  ?          show this help
  Esc        close popup / cancel input
  q          quit";
