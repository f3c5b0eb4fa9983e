use std::path::Path;
use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use tracing::{info, trace};

use crate::domain::{AppConfig, AppError, HELP_TEXT, Message, Slot};
use crate::inputter::{InputResult, Inputter};
use crate::report::{ComparisonSection, FileSlot, Page, Selection, failure_text, render};
use crate::table::expand_path;
use crate::ui::{REPORT_BORDER_HEIGHT, ReportText, STATUSLINE_HEIGHT, report_text};

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Modus {
    Report,
    Popup,
    Input(Slot),
}

/// Interactive controls of the report, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    DuplicateColumn,
    ComparePrimary,
    CompareSecondary,
    CompareButton,
}

/// Everything the UI needs to draw one frame.
pub struct UIData<'a> {
    pub title: String,
    pub report: &'a ReportText,
    pub scroll: usize,
    pub primary: String,
    pub secondary: String,
    pub popup: Option<&'static str>,
    pub prompt: Option<(Slot, &'a InputResult)>,
    pub status_message: &'a str,
}

pub struct Model {
    config: AppConfig,
    pub status: Status,
    modus: Modus,
    primary: FileSlot,
    secondary: FileSlot,
    selection: Selection,
    compare_requested: bool,
    page: Page,
    report: ReportText,
    focus: Option<Control>,
    scroll: usize,
    report_height: usize,
    input: Inputter,
    last_input: InputResult,
    /// Last path submitted in the prompt, offered again on the next open.
    last_path: String,
    status_message: String,
}

impl Model {
    pub fn init(config: &AppConfig) -> Self {
        let mut model = Self {
            config: config.clone(),
            status: Status::Ready,
            modus: Modus::Report,
            primary: FileSlot::Empty,
            secondary: FileSlot::Empty,
            selection: Selection::default(),
            compare_requested: false,
            page: Page::Prompt,
            report: ReportText::default(),
            focus: None,
            scroll: 0,
            report_height: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            last_path: String::new(),
            status_message: "Started tabprobe!".to_string(),
        };
        model.rerun();
        model
    }

    /// Replace the file in `slot`. A file that fails to load leaves a failed slot behind.
    pub fn load_file(&mut self, slot: Slot, path: &Path) {
        let start_time = Instant::now();
        let file = FileSlot::load(path);
        match &file {
            FileSlot::Loaded(table) => {
                let duration = start_time.elapsed().as_millis();
                info!("Loaded {} into {slot:?} slot in {duration}ms", table.name());
                self.set_status_message(format!("Loaded {} in {duration}ms ...", table.name()));
            }
            FileSlot::Failed { reason, .. } => self.set_status_message(failure_text(reason)),
            FileSlot::Empty => {}
        }
        match slot {
            Slot::Primary => self.primary = file,
            Slot::Secondary => self.secondary = file,
        }
        self.compare_requested = false;
        self.rerun();
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn focus(&self) -> Option<Control> {
        self.focus
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn get_uidata(&self) -> UIData<'_> {
        let title = match self.primary.table() {
            Some(table) => format!("{} ({} rows)", table.name(), table.nrows()),
            None => "tabprobe".to_string(),
        };
        UIData {
            title,
            report: &self.report,
            scroll: self.scroll,
            primary: self.primary.label(),
            secondary: self.secondary.label(),
            popup: (self.modus == Modus::Popup).then_some(HELP_TEXT),
            prompt: match self.modus {
                Modus::Input(slot) => Some((slot, &self.last_input)),
                _ => None,
            },
            status_message: &self.status_message,
        }
    }

    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::Input(_))
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Message) -> Result<(), AppError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::Report => match message {
                Message::Quit => self.quit(),
                Message::Help => self.modus = Modus::Popup,
                Message::OpenFile(slot) => self.enter_input(slot),
                Message::FocusNext => self.move_focus(1),
                Message::FocusPrev => self.move_focus(-1),
                Message::SelectNext => self.cycle_selection(1),
                Message::SelectPrev => self.cycle_selection(-1),
                Message::Compare => self.compare(),
                Message::Enter => {
                    if self.focus == Some(Control::CompareButton) {
                        self.compare();
                    }
                }
                Message::ScrollUp => self.scroll_by(-1),
                Message::ScrollDown => self.scroll_by(1),
                Message::ScrollPageUp => self.scroll_by(-(self.report_height.max(1) as isize)),
                Message::ScrollPageDown => self.scroll_by(self.report_height.max(1) as isize),
                Message::ScrollTop => self.scroll = 0,
                Message::ScrollBottom => self.scroll = self.max_scroll(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::RawKey(_) => {}
            },
            Modus::Popup => match message {
                Message::Quit => self.quit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::Enter | Message::Help => self.modus = Modus::Report,
                _ => {}
            },
            Modus::Input(slot) => match message {
                Message::RawKey(key) => self.raw_input(slot, key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => {}
            },
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    /// Rebuild the page from the current files and selections.
    fn rerun(&mut self) {
        let start_time = Instant::now();
        self.page = render(
            &self.primary,
            &self.secondary,
            &self.selection,
            self.compare_requested,
        );
        let controls = self.controls();
        if !self.focus.is_some_and(|f| controls.contains(&f)) {
            self.focus = controls.first().copied();
        }
        self.refresh_report();
        trace!("Rerun took {}ms", start_time.elapsed().as_millis());
    }

    fn refresh_report(&mut self) {
        self.report = report_text(&self.page, self.focus, self.config.max_column_width);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Controls present on the current page.
    pub fn controls(&self) -> Vec<Control> {
        let mut controls = Vec::new();
        if let Some(analysis) = self.page.analysis() {
            if !analysis.duplicates.selector.options.is_empty() {
                controls.push(Control::DuplicateColumn);
            }
            if let Some(ComparisonSection::Ready { .. }) = analysis.comparison {
                controls.extend([
                    Control::ComparePrimary,
                    Control::CompareSecondary,
                    Control::CompareButton,
                ]);
            }
        }
        controls
    }

    fn move_focus(&mut self, step: isize) {
        let controls = self.controls();
        if controls.is_empty() {
            return;
        }
        let current = self
            .focus
            .and_then(|f| controls.iter().position(|c| *c == f))
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(controls.len() as isize) as usize;
        self.focus = Some(controls[next]);
        self.refresh_report();
        self.scroll_to_focus();
    }

    fn scroll_to_focus(&mut self) {
        let Some(row) = self.focus.and_then(|f| self.report.anchor(f)) else {
            return;
        };
        if row < self.scroll {
            self.scroll = row;
        } else if self.report_height > 0 && row >= self.scroll + self.report_height {
            self.scroll = row + 1 - self.report_height;
        }
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn cycle_selection(&mut self, step: isize) {
        let Some(analysis) = self.page.analysis() else {
            return;
        };
        let selected = match (self.focus, &analysis.comparison) {
            (Some(Control::DuplicateColumn), _) => analysis.duplicates.selector.cycled(step),
            (Some(Control::ComparePrimary), Some(ComparisonSection::Ready { primary, .. })) => {
                primary.cycled(step)
            }
            (
                Some(Control::CompareSecondary),
                Some(ComparisonSection::Ready { secondary, .. }),
            ) => secondary.cycled(step),
            _ => return,
        };
        match self.focus {
            Some(Control::DuplicateColumn) => self.selection.duplicate_column = selected,
            Some(Control::ComparePrimary) => self.selection.compare_primary = selected,
            Some(Control::CompareSecondary) => self.selection.compare_secondary = selected,
            _ => return,
        }
        trace!("Selection changed: {:?}", self.selection);
        self.compare_requested = false;
        self.rerun();
    }

    fn compare(&mut self) {
        let ready = self
            .page
            .analysis()
            .is_some_and(|a| matches!(a.comparison, Some(ComparisonSection::Ready { .. })));
        if !ready {
            self.set_status_message("Load a primary and a secondary file to compare");
            return;
        }
        self.compare_requested = true;
        self.rerun();
        self.compare_requested = false;
    }

    fn enter_input(&mut self, slot: Slot) {
        trace!("Entering input mode for {slot:?} ...");
        self.modus = Modus::Input(slot);
        self.input.start(&self.last_path);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, slot: Slot, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if !self.last_input.finished {
            return;
        }
        self.modus = Modus::Report;
        if self.last_input.canceled || self.last_input.input.trim().is_empty() {
            return;
        }
        self.last_path = self.last_input.input.trim().to_string();
        match expand_path(&self.last_path) {
            Ok(path) => self.load_file(slot, &path),
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    fn max_scroll(&self) -> usize {
        self.report.lines.len().saturating_sub(self.report_height)
    }

    fn scroll_by(&mut self, delta: isize) {
        let target = self.scroll as isize + delta;
        self.scroll = (target.max(0) as usize).min(self.max_scroll());
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!("UI was resized! w:{width}, h:{height}");
        self.report_height = height
            .saturating_sub(STATUSLINE_HEIGHT as usize)
            .saturating_sub(REPORT_BORDER_HEIGHT);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }
}
