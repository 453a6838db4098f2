//! Weight number parsing
//!
//! Product names write weights as integers, decimals (with `.` or `,`),
//! simple fractions (`3/4`) or compound fractions (`1-1/2`).

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static DECIMAL_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d),(\d)").expect("valid decimal comma regex"));

/// Rewrites European decimal commas to dots
///
/// ```
/// use jewel_scout::normalize::normalize_decimal_commas;
///
/// assert_eq!(normalize_decimal_commas("0,50 ct"), "0.50 ct");
/// assert_eq!(normalize_decimal_commas("rings, 1/2 ct"), "rings, 1/2 ct");
/// ```
pub fn normalize_decimal_commas(text: &str) -> Cow<'_, str> {
    DECIMAL_COMMA.replace_all(text, "$1.$2")
}

/// Parses a weight number to carats
///
/// Compound fractions are whole plus fraction; a zero denominator or any
/// unparseable text yields `None`.
///
/// ```
/// use jewel_scout::normalize::parse_weight_number;
///
/// assert_eq!(parse_weight_number("1-1/2"), Some(1.5));
/// assert_eq!(parse_weight_number("3/4"), Some(0.75));
/// assert_eq!(parse_weight_number("0,25"), Some(0.25));
/// assert_eq!(parse_weight_number("1/0"), None);
/// ```
pub fn parse_weight_number(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = normalize_decimal_commas(&compact);

    if let Some((whole, fraction)) = compact.split_once('-') {
        let whole: f64 = whole.parse().ok()?;
        return Some(whole + parse_fraction(fraction)?);
    }

    if compact.contains('/') {
        return parse_fraction(&compact);
    }

    compact.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_fraction(text: &str) -> Option<f64> {
    let (numerator, denominator) = text.split_once('/')?;
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;

    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}
