//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year, for the footer.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css, computed by the build script.
///
/// Usage in templates: `/static/css/derived/main.{{ ""|css_hash }}.css`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Renders a 0-5 rating as filled and empty stars.
///
/// Usage in templates: `{{ product.rating|stars }}`
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let value: f32 = rating.to_string().parse().unwrap_or_default();
    let filled = value.round().clamp(0.0, 5.0);
    let mut out = String::with_capacity(15);
    for i in 0..5_u8 {
        out.push(if f32::from(i) < filled { '★' } else { '☆' });
    }
    Ok(out)
}
