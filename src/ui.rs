use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::compare::sample;
use crate::domain::Slot;
use crate::inputter::InputResult;
use crate::model::{Control, UIData};
use crate::profile::{ColumnProfile, STATISTICS};
use crate::report::{Analysis, ComparisonSection, Page, PROMPT, Selector, failure_text};

pub const STATUSLINE_HEIGHT: u16 = 1;
pub const SIDEBAR_WIDTH: u16 = 38;
/// Rows taken by the report border.
pub const REPORT_BORDER_HEIGHT: usize = 2;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
const COLUMN_SEPARATOR: &str = " │ ";

/// A rendered column of a report table.
#[derive(Clone, Debug)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

impl ColumnView {
    fn new(name: impl Into<String>, data: Vec<String>, max_column_width: usize) -> Self {
        let name = name.into();
        let widest = data
            .iter()
            .map(|s| s.chars().count())
            .chain(std::iter::once(name.chars().count()))
            .max()
            .unwrap_or(0);
        Self {
            width: std::cmp::min(widest + COLUMN_WIDTH_MARGIN, max_column_width),
            name,
            data,
        }
    }
}

/// Report lines plus the line each control is drawn on.
#[derive(Default, Debug)]
pub struct ReportText {
    pub lines: Vec<Line<'static>>,
    pub anchors: Vec<(Control, usize)>,
}

impl ReportText {
    fn push(&mut self, line: Line<'static>) {
        self.lines.push(line);
    }

    fn blank(&mut self) {
        self.lines.push(Line::default());
    }

    fn heading(&mut self, text: &str) {
        self.blank();
        self.push(Line::from(Span::styled(
            text.to_string(),
            Style::new().fg(Color::Cyan).bold(),
        )));
    }

    fn metric(&mut self, label: &str, value: impl ToString) {
        self.push(Line::from(vec![
            Span::raw(format!("{label}: ")),
            Span::raw(value.to_string()).bold(),
        ]));
    }

    fn table(&mut self, columns: &[ColumnView]) {
        self.lines.extend(table_lines(columns));
    }

    fn control(&mut self, control: Control, line: Line<'static>) {
        self.anchors.push((control, self.lines.len()));
        self.push(line);
    }

    /// One line per line of `reason`, the first carrying the failure banner.
    fn failure(&mut self, reason: &str) {
        let message = failure_text(reason);
        let mut lines = message.lines();
        if let Some(first) = lines.next() {
            self.push(failure(first));
        }
        for line in lines {
            self.push(Line::from(Span::styled(
                format!("  {line}"),
                Style::new().fg(Color::Red),
            )));
        }
    }

    /// The lines inside a viewport of `height` rows scrolled down by `scroll`.
    pub fn visible(&self, scroll: usize, height: usize) -> &[Line<'static>] {
        let start = scroll.min(self.lines.len());
        let end = start.saturating_add(height).min(self.lines.len());
        &self.lines[start..end]
    }

    pub fn anchor(&self, control: Control) -> Option<usize> {
        self.anchors
            .iter()
            .find(|(c, _)| *c == control)
            .map(|(_, line)| *line)
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width < 3 {
        return "".to_string();
    }
    let mut reduced: String = value.chars().take(width - 3).collect();
    reduced.push_str("...");
    reduced
}

fn pad(value: &str, width: usize) -> String {
    format!("{:<width$}", truncate(value, width))
}

fn table_lines(columns: &[ColumnView]) -> Vec<Line<'static>> {
    let nrows = columns.iter().map(|c| c.data.len()).max().unwrap_or(0);
    let header = columns
        .iter()
        .map(|c| pad(&c.name, c.width))
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR);

    let mut lines = vec![Line::from(Span::raw(header).bold().underlined())];
    for ridx in 0..nrows {
        let row = columns
            .iter()
            .map(|c| pad(c.data.get(ridx).map(String::as_str).unwrap_or(""), c.width))
            .collect::<Vec<_>>()
            .join(COLUMN_SEPARATOR);
        lines.push(Line::from(row));
    }
    lines
}

fn selector_line(label: &str, selector: &Selector, focused: bool) -> Line<'static> {
    let value = format!(" ◀ {} ▶ ", selector.value().unwrap_or("-"));
    let style = if focused {
        Style::new().reversed().bold()
    } else {
        Style::new().fg(Color::Yellow)
    };
    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(value, style),
    ])
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::new().reversed().bold()
    } else {
        Style::new().bold()
    };
    Line::from(Span::styled(format!("[ {label} ]"), style))
}

fn warning(text: &str) -> Line<'static> {
    Line::from(Span::styled(format!("⚠ {text}"), Style::new().fg(Color::Yellow)))
}

fn success(text: &str) -> Line<'static> {
    Line::from(Span::styled(format!("✔ {text}"), Style::new().fg(Color::Green)))
}

fn failure(text: &str) -> Line<'static> {
    Line::from(Span::styled(format!("✘ {text}"), Style::new().fg(Color::Red)))
}

pub fn report_text(page: &Page, focus: Option<Control>, max_column_width: usize) -> ReportText {
    let mut text = ReportText::default();
    match page {
        Page::Prompt => text.push(Line::from(Span::styled(
            PROMPT,
            Style::new().fg(Color::Blue),
        ))),
        Page::Failed { name, reason } => {
            text.push(Line::from(name.clone()).bold());
            text.failure(reason);
        }
        Page::Analysis(analysis) => analysis_text(&mut text, analysis, focus, max_column_width),
    }
    text
}

fn analysis_text(
    text: &mut ReportText,
    analysis: &Analysis,
    focus: Option<Control>,
    max_column_width: usize,
) {
    let profile = &analysis.profile;
    let mw = max_column_width;

    text.push(Line::from(Span::styled(
        "Dataset Preview",
        Style::new().fg(Color::Cyan).bold(),
    )));
    let preview: Vec<ColumnView> = profile
        .preview
        .iter()
        .map(|(name, data)| ColumnView::new(name.clone(), data.clone(), mw))
        .collect();
    text.table(&preview);

    text.heading("Dataset Information");
    text.metric("Total Rows", profile.nrows);

    let names: Vec<String> = profile.columns.iter().map(|c| c.name.clone()).collect();
    let field = |f: fn(&ColumnProfile) -> String| -> Vec<String> {
        profile.columns.iter().map(f).collect()
    };

    text.heading("Column Types");
    text.table(&[
        ColumnView::new("Column", names.clone(), mw),
        ColumnView::new("Data Type", field(|c: &ColumnProfile| c.dtype.clone()), mw),
    ]);

    text.heading("Missing Values");
    text.table(&[
        ColumnView::new("Column", names, mw),
        ColumnView::new("Missing Values", field(|c: &ColumnProfile| c.missing.to_string()), mw),
        ColumnView::new("Percentage", field(|c: &ColumnProfile| c.missing_label()), mw),
    ]);

    text.heading("Summary Statistics");
    match &profile.statistics {
        Some(statistics) => {
            let mut columns = vec![ColumnView::new(
                "",
                STATISTICS.iter().map(|s| s.to_string()).collect(),
                mw,
            )];
            columns.extend(
                statistics
                    .iter()
                    .map(|s| ColumnView::new(s.name.clone(), s.rendered(), mw)),
            );
            text.table(&columns);
        }
        None => text.push(warning("No numeric columns found for statistics.")),
    }

    text.heading("Single Column Duplicate Analysis");
    let duplicates = &analysis.duplicates;
    text.control(
        Control::DuplicateColumn,
        selector_line(
            "Select column to analyze duplicates",
            &duplicates.selector,
            focus == Some(Control::DuplicateColumn),
        ),
    );
    match &duplicates.report {
        Some(report) if !report.is_empty() => {
            text.push(Line::from(format!(
                "Found {} values that appear multiple times:",
                report.duplicates.len()
            )));
            let (values, counts): (Vec<String>, Vec<String>) = report
                .duplicates
                .iter()
                .map(|(v, c)| (v.to_string(), c.to_string()))
                .unzip();
            text.table(&[
                ColumnView::new("Value", values, mw),
                ColumnView::new("Count", counts, mw),
            ]);
            text.metric("Total Duplicate Rows", report.total_duplicate_rows());
        }
        Some(_) => text.push(success("No duplicate values found in this column!")),
        None => text.push(warning("The file has no columns.")),
    }

    match &analysis.comparison {
        None => {}
        Some(ComparisonSection::Failed { name, reason }) => {
            text.heading("File Comparison");
            text.push(Line::from(format!("Secondary file: {name}")));
            text.failure(reason);
        }
        Some(ComparisonSection::Ready {
            name,
            nrows,
            ncolumns,
            primary,
            secondary,
            result,
        }) => {
            text.heading("File Comparison");
            text.push(Line::from(format!(
                "Secondary file: {name} ({nrows} rows, {ncolumns} columns)"
            )));
            text.control(
                Control::ComparePrimary,
                selector_line(
                    "Select column from primary file",
                    primary,
                    focus == Some(Control::ComparePrimary),
                ),
            );
            text.control(
                Control::CompareSecondary,
                selector_line(
                    "Select column from secondary file",
                    secondary,
                    focus == Some(Control::CompareSecondary),
                ),
            );
            text.control(
                Control::CompareButton,
                button_line("Compare Files", focus == Some(Control::CompareButton)),
            );

            if let Some(report) = result {
                text.heading("Duplicate Analysis");
                text.metric("Common Values", report.common.len());
                text.metric("Values only in primary file", report.only_in_primary.len());
                text.metric(
                    "Values only in secondary file",
                    report.only_in_secondary.len(),
                );
                for (label, values) in [
                    ("Sample common values", &report.common),
                    ("Sample values only in primary", &report.only_in_primary),
                    ("Sample values only in secondary", &report.only_in_secondary),
                ] {
                    text.blank();
                    text.push(Line::from(label).italic());
                    let rendered = match sample(values) {
                        Some(values) => format!("[{}]", values.join(", ")),
                        None => "None".to_string(),
                    };
                    text.push(Line::from(rendered));
                }
            }
        }
    }
}

fn sidebar_lines(uidata: &UIData) -> Vec<Line<'static>> {
    vec![
        Line::from("Primary CSV file").bold(),
        Line::from(Span::raw(uidata.primary.clone()).yellow()),
        Line::default(),
        Line::from("Secondary CSV file").bold(),
        Line::from("(for comparison)").italic(),
        Line::from(Span::raw(uidata.secondary.clone()).yellow()),
        Line::default(),
        Line::from(vec!["<o>".blue().bold(), " open primary".into()]),
        Line::from(vec!["<s>".blue().bold(), " open secondary".into()]),
        Line::from(vec!["<c>".blue().bold(), " compare files".into()]),
        Line::from(vec!["<?>".blue().bold(), " help".into()]),
        Line::from(vec!["<q>".blue().bold(), " quit".into()]),
    ]
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn prompt_label(slot: Slot) -> &'static str {
    match slot {
        Slot::Primary => "Primary CSV path: ",
        Slot::Secondary => "Secondary CSV path: ",
    }
}

fn draw_statusline(frame: &mut Frame, area: Rect, uidata: &UIData) {
    match uidata.prompt {
        Some((slot, input)) => {
            draw_prompt(frame, area, prompt_label(slot), input);
        }
        None => {
            let status = Paragraph::new(Line::from(uidata.status_message.to_string()).dark_gray());
            frame.render_widget(status, area);
        }
    }
}

fn draw_prompt(frame: &mut Frame, area: Rect, label: &str, input: &InputResult) {
    let line = Line::from(vec![
        Span::raw(label.to_string()).bold(),
        Span::raw(input.input.clone()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
    let x = area.x + (label.chars().count() + input.cursor_pos) as u16;
    frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
}

pub fn draw(frame: &mut Frame, uidata: &UIData) {
    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .areas(frame.area());
    let [report, statusline] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(STATUSLINE_HEIGHT)]).areas(main);

    let files = Block::bordered()
        .title(Line::from(" Upload Files ".bold()).centered())
        .border_set(border::ROUNDED);
    frame.render_widget(
        Paragraph::new(sidebar_lines(uidata))
            .wrap(Wrap { trim: false })
            .block(files),
        sidebar,
    );

    let block = Block::bordered()
        .title(Line::from(Span::raw(format!(" {} ", uidata.title)).bold()).centered())
        .border_set(border::THICK);
    let height = block.inner(report).height as usize;
    frame.render_widget(
        Paragraph::new(uidata.report.visible(uidata.scroll, height).to_vec()).block(block),
        report,
    );

    draw_statusline(frame, statusline, uidata);

    if let Some(message) = uidata.popup {
        let area = popup_area(frame.area(), 60, 70);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .title_bottom(Line::from(vec![" Close ".into(), "<Esc> ".blue().bold()]).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(message).block(block), area);
    }
}
