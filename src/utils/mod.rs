use reqwest::header::{HeaderName, HeaderValue};

/// Parses a `Key: Value` header line.
pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| "expected format 'Key: Value'".to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".to_string());
    }
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| format!("invalid header name '{name}'"))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|_| "invalid header value".to_string())?;
    Ok((name, value))
}

pub fn parse_positive(value: usize, what: &str) -> Result<usize, String> {
    if value == 0 {
        return Err(format!("invalid {what}, expected positive integer"));
    }
    Ok(value)
}
