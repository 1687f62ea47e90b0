use colored::{ColoredString, Colorize};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::fetcher::FetchError;
use crate::model::Record;
use crate::paginator::{Page, PageLabel};
use crate::view::ViewState;

pub const TITLE: &str = "Project Funding Table";
pub const COLUMNS: [&str; 3] = ["S No", "Amount Pledged", "Percentage Funded"];
pub const LOADING: &str = "Loading records...";

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "S No")]
    sequence_number: i64,
    #[tabled(rename = "Amount Pledged")]
    amount_pledged: f64,
    #[tabled(rename = "Percentage Funded")]
    percentage_funded: f64,
}

impl From<&Record> for RecordRow {
    fn from(r: &Record) -> Self {
        Self {
            sequence_number: r.sequence_number,
            amount_pledged: r.amount_pledged,
            percentage_funded: r.percentage_funded,
        }
    }
}

/// One entry of the page-control strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Previous { enabled: bool },
    Page { number: usize, active: bool },
    Ellipsis,
    Next { enabled: bool },
}

pub fn control_strip<T>(page: &Page<'_, T>) -> Vec<Control> {
    let mut controls = Vec::with_capacity(page.labels.len() + 2);
    controls.push(Control::Previous {
        enabled: page.has_previous,
    });
    for label in page.labels.iter().copied() {
        controls.push(match label {
            PageLabel::Page(number) => Control::Page {
                number,
                active: page.is_active(label),
            },
            PageLabel::Ellipsis => Control::Ellipsis,
        });
    }
    controls.push(Control::Next {
        enabled: page.has_next,
    });
    controls
}

pub fn render_table(items: &[Record]) -> String {
    let mut table = Table::new(items.iter().map(RecordRow::from));
    table.with(Style::modern());
    table.to_string()
}

/// Whether terminal styling is applied to rendered text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paint {
    Styled,
    Plain,
}

impl Paint {
    fn apply(self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        match self {
            Paint::Styled => style(text).to_string(),
            Paint::Plain => text.to_string(),
        }
    }
}

fn controls_with<T>(page: &Page<'_, T>, paint: Paint) -> String {
    control_strip(page)
        .into_iter()
        .map(|c| match c {
            Control::Previous { enabled: true } => paint.apply("< Previous", |s| s.bold()),
            Control::Previous { enabled: false } => paint.apply("  Previous", |s| s.dimmed()),
            Control::Next { enabled: true } => paint.apply("Next >", |s| s.bold()),
            Control::Next { enabled: false } => paint.apply("Next  ", |s| s.dimmed()),
            Control::Page {
                number,
                active: true,
            } => paint.apply(&format!("[{number}]"), |s| s.bold().green()),
            Control::Page {
                number,
                active: false,
            } => number.to_string(),
            Control::Ellipsis => paint.apply("...", |s| s.dimmed()),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn render_controls<T>(page: &Page<'_, T>) -> String {
    controls_with(page, Paint::Styled)
}

pub fn render_summary<T>(page: &Page<'_, T>) -> String {
    match page.showing {
        Some((first, last)) => format!(
            "Page {} of {} :: records {}-{} of {}",
            page.number, page.total_pages, first, last, page.total_records
        ),
        None => "No records".to_string(),
    }
}

fn error_with(err: &FetchError, paint: Paint) -> String {
    format!(
        "{}{}{} {}: {}",
        paint.apply("[", |s| s.bold().white()),
        paint.apply("ERR", |s| s.bold().red()),
        paint.apply("]", |s| s.bold().white()),
        err.kind().label(),
        err
    )
}

pub fn render_error(err: &FetchError) -> String {
    error_with(err, Paint::Styled)
}

fn page_with(page: &Page<'_, Record>, paint: Paint) -> String {
    let mut out = String::new();
    out.push_str(&paint.apply(TITLE, |s| s.bold()));
    out.push('\n');
    out.push_str(&render_table(page.items));
    out.push('\n');
    out.push_str(&render_summary(page));
    out.push('\n');
    out.push_str(&controls_with(page, paint));
    out.push('\n');
    out
}

/// Renders the whole view: placeholder, or optional error line, table,
/// summary and control strip.
pub fn render_view_with(state: &ViewState<'_>, paint: Paint) -> String {
    match state {
        ViewState::Loading => format!("{LOADING}\n"),
        ViewState::Ready(page) => page_with(page, paint),
        ViewState::Failed { error, page } => {
            let mut out = error_with(error, paint);
            out.push('\n');
            out.push_str(&page_with(page, paint));
            out
        }
    }
}

pub fn render_view(state: &ViewState<'_>) -> String {
    render_view_with(state, Paint::Styled)
}
