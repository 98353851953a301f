//! Custom Askama template filters.

use std::fmt::Display;

use chrono::Utc;
use rust_decimal::Decimal;

use delightful_naturals_core::format_zar;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(Utc::now().year())
}

/// Formats an amount in Rand, e.g. `R300.00`.
///
/// Usage in templates: `{{ order.total|zar }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn zar(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = amount.to_string();
    Ok(raw
        .parse::<Decimal>()
        .map_or_else(|_| format!("R{raw}"), format_zar))
}
