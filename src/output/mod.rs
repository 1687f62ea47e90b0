pub mod report;

use serde::Serialize;

use crate::fetcher::FetchError;
use crate::model::Record;
use crate::paginator::Page;
use crate::render::{self, Paint};
use crate::view::ViewState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct PageExport<'a> {
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub labels: Vec<String>,
    pub error_kind: Option<&'static str>,
    pub error: Option<String>,
    pub records: &'a [Record],
}

impl<'a> PageExport<'a> {
    pub fn new(page: &Page<'a, Record>, error: Option<&FetchError>) -> Self {
        Self {
            page: page.number,
            total_pages: page.total_pages,
            page_size: page.page_size,
            total_records: page.total_records,
            labels: page.labels.iter().map(|l| l.to_string()).collect(),
            error_kind: error.map(|e| e.kind().label()),
            error: error.map(|e| e.to_string()),
            records: page.items,
        }
    }
}

/// The terminal view as printed with colors off.
pub fn render_text(page: &Page<'_, Record>, error: Option<&FetchError>) -> Vec<u8> {
    let state = match error {
        Some(error) => ViewState::Failed {
            error,
            page: page.clone(),
        },
        None => ViewState::Ready(page.clone()),
    };
    render::render_view_with(&state, Paint::Plain).into_bytes()
}

pub fn render_json(export: &PageExport<'_>) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = serde_json::to_vec_pretty(export)?;
    out.push(b'\n');
    Ok(out)
}

pub fn render_html(page: &Page<'_, Record>, error: Option<&FetchError>) -> Vec<u8> {
    let message = error.map(|e| format!("{}: {}", e.kind().label(), e));
    report::render_html(page, message.as_deref())
}

pub fn render(
    format: OutputFormat,
    page: &Page<'_, Record>,
    error: Option<&FetchError>,
) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(page, error)),
        OutputFormat::Json => render_json(&PageExport::new(page, error)),
        OutputFormat::Html => Ok(render_html(page, error)),
    }
}
