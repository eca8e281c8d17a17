//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Host part of a URL, for compact link labels.
///
/// Usage in templates: `{{ project.live_url|host }}`
#[askama::filter_fn]
pub fn host(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(host_of(&value.to_string()))
}

fn host_of(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| raw.to_string())
}
