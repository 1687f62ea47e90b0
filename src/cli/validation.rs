use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page_size) = args.page_size {
        crate::utils::parse_positive(page_size, "page-size")?;
    }
    if let Some(page) = args.page {
        crate::utils::parse_positive(page, "page")?;
    }
    if let Some(timeout) = args.timeout {
        crate::utils::parse_positive(timeout, "timeout")?;
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or html"
            ));
        }
    }
    if let Some(url) = args.url.as_deref() {
        reqwest::Url::parse(url.trim()).map_err(|e| format!("invalid --url '{url}': {e}"))?;
    }
    Ok(())
}
