use crate::model::Record;
use crate::paginator::Page;
use crate::render::{self, Control};

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_rows(items: &[Record]) -> String {
    let mut out = String::new();
    for r in items {
        out.push_str(&format!(
            "              <tr>\n                <td>{}</td>\n                <td>{}</td>\n                <td>{}</td>\n              </tr>\n",
            r.sequence_number, r.amount_pledged, r.percentage_funded
        ));
    }
    out
}

fn render_strip(page: &Page<'_, Record>) -> String {
    let mut out = String::new();
    for control in render::control_strip(page) {
        let item = match control {
            Control::Previous { enabled } => button("Previous", enabled, false),
            Control::Next { enabled } => button("Next", enabled, false),
            Control::Page { number, active } => button(&number.to_string(), true, active),
            Control::Ellipsis => r#"<span class="table-dots">...</span>"#.to_string(),
        };
        out.push_str("          ");
        out.push_str(&item);
        out.push('\n');
    }
    out
}

fn button(label: &str, enabled: bool, active: bool) -> String {
    let class = if active {
        "page-number active"
    } else if label.chars().all(|c| c.is_ascii_digit()) {
        "page-number"
    } else {
        "pagination-button"
    };
    let disabled = if enabled { "" } else { " disabled" };
    format!(r#"<button class="{class}" type="button"{disabled}>{label}</button>"#)
}

pub fn render_html(page: &Page<'_, Record>, error: Option<&str>) -> Vec<u8> {
    let headers = render::COLUMNS
        .iter()
        .map(|c| format!("<th>{}</th>", escape_html(c)))
        .collect::<Vec<_>>()
        .join("");
    let error_banner = error
        .map(|e| format!(r#"    <div class="error">{}</div>"#, escape_html(e)))
        .unwrap_or_default();

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <style>
    body {{ font-family: 'Inter', sans-serif; background: #f8fafc; color: #0f172a; }}
    .table-container {{ max-width: 960px; margin: 40px auto; }}
    .table {{ width: 100%; border-collapse: collapse; }}
    .table th, .table td {{ padding: 10px 16px; border-bottom: 1px solid #e2e8f0; text-align: left; }}
    .pagination {{ display: flex; gap: 8px; align-items: center; margin-top: 16px; }}
    .page-number.active {{ background: #135bec; color: #fff; }}
    button[disabled] {{ opacity: 0.4; }}
    .error {{ background: #fef2f2; color: #b91c1c; padding: 12px 16px; margin-bottom: 16px; }}
  </style>
</head>
<body>
  <div class="table-container">
{error_banner}
    <div class="table-header">
      <h2 class="table-title">{title}</h2>
      <p class="table-summary">{summary}</p>
    </div>
    <table class="table">
      <thead>
        <tr>{headers}</tr>
      </thead>
      <tbody>
{rows}      </tbody>
    </table>
    <div class="pagination">
{strip}    </div>
  </div>
</body>
</html>
"####,
        title = escape_html(render::TITLE),
        summary = escape_html(&render::render_summary(page)),
        error_banner = error_banner,
        headers = headers,
        rows = render_rows(page.items),
        strip = render_strip(page),
    );
    html.into_bytes()
}
