//! Diamond weight extraction

use super::numbers::{normalize_decimal_commas, parse_weight_number};
use once_cell::sync::Lazy;
use regex::Regex;

/// Weights at or above this are not per-item diamond weights
const MAX_PLAUSIBLE_CARATS: f64 = 5.0;

/// Stones whose weights are never reported
const SIMULATED_STONES: &[&str] = &["CUBIC ZIRCONIA", "SAPPHIRE", "CREATED"];

static LEADING_METAL: Lazy<Regex> = Lazy::new(|| {
    let colors = "WHITE|YELLOW|ROSE|PINK|RED|GREEN|BLACK";
    Regex::new(&format!(
        concat!(
            r"^\s*(?:",
            r"\d{{1,2}}\s*(?:KARAT|KT|K)\b\s*(?:(?:{c})\s*GOLD|TWO[\s-]?TONE(?:\s*GOLD)?|GOLD)?",
            r"|\d{{1,2}}\s*(?:CARAT|CT)\s*(?:(?:{c})\s*GOLD|GOLD)",
            r"|STERLING\s+SILVER|PLATINUM|(?:{c})\s*GOLD",
            r")"
        ),
        c = colors
    ))
    .expect("valid leading metal regex")
});

static WEIGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(\d+\s*-\s*\d+\s*/\s*\d+|\d+\s*/\s*\d+|\d*\.\d+|\d+)",
        r"\s*(CARATS?(?:\s*T\.?\s*W(?:\.|\b))?|CTW(?:\.|\b)|CT\.?(?:\s*T\.?\s*W(?:\.|\b)|\s*W\b)?)"
    ))
    .expect("valid weight regex")
});

/// One number + unit occurrence
#[derive(Debug)]
struct WeightMatch<'a> {
    number: &'a str,
    unit: &'a str,
    carats: f64,
}

impl WeightMatch<'_> {
    fn is_total_weight(&self) -> bool {
        let unit: String = self
            .unit
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect();
        unit.contains("TW")
    }

    fn render(&self) -> String {
        let number: String = self.number.chars().filter(|c| !c.is_whitespace()).collect();
        if self.is_total_weight() {
            format!("{}ct tw", number)
        } else {
            format!("{}ct", number)
        }
    }
}

/// Extracts the canonical diamond weight from a product text
///
/// The smallest weight below five carats wins, first occurrence on ties.
/// The `tw` suffix comes from the winning match's own unit.
/// Texts naming cubic zirconia, sapphire or created stones yield `None`.
///
/// ```
/// use jewel_scout::normalize::extract_diawt_value;
///
/// assert_eq!(extract_diawt_value("0,50 ct tw Diamond Ring").as_deref(), Some("0.50ct tw"));
/// assert_eq!(extract_diawt_value("1/2 ct and 3/4 ct tw Setting").as_deref(), Some("1/2ct"));
/// assert_eq!(extract_diawt_value("1-3/4 ct Cubic Zirconia Ring"), None);
/// ```
pub fn extract_diawt_value(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    let upper = normalize_decimal_commas(&upper);

    let rest = match LEADING_METAL.find(&upper) {
        Some(prefix) => &upper[prefix.end()..],
        None => &upper[..],
    };

    if SIMULATED_STONES.iter().any(|stone| rest.contains(stone)) {
        return None;
    }

    let mut best: Option<WeightMatch<'_>> = None;
    for caps in WEIGHT.captures_iter(rest) {
        let (Some(number), Some(unit)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(carats) = parse_weight_number(number.as_str()) else {
            continue;
        };
        if carats >= MAX_PLAUSIBLE_CARATS {
            continue;
        }

        let candidate = WeightMatch {
            number: number.as_str(),
            unit: unit.as_str(),
            carats,
        };
        let smaller = best
            .as_ref()
            .map_or(true, |current| candidate.carats < current.carats);
        if smaller {
            best = Some(candidate);
        }
    }

    best.map(|m| m.render().to_lowercase())
}
