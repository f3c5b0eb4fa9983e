//! Profile a CSV file and compare one of its columns against a second file.
//!
//! The pipeline is `table` (loading) -> `profile` / `duplicates` / `compare`
//! (derived reports) -> `report` (page for the current inputs). `model`,
//! `controller` and `ui` drive it from a terminal.

pub mod compare;
pub mod controller;
pub mod domain;
pub mod duplicates;
pub mod inputter;
pub mod model;
pub mod profile;
pub mod report;
pub mod table;
pub mod ui;
