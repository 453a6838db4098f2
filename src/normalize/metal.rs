//! Metal and karat extraction
//!
//! Three pattern families run over the uppercased text:
//! 1. karat + colour + gold phrases (`9K WHITE GOLD`, `14CT ROSE GOLD & WHITE GOLD`)
//! 2. named metals (`PLATINUM`, `STERLING SILVER`, `ROSE GOLD`, ...)
//! 3. bare karat tokens (`18K`, `9CT`)
//!
//! The longest match that is not contained in a longer one wins.

use once_cell::sync::Lazy;
use regex::Regex;

const GOLD_COLORS: &str = "WHITE|YELLOW|ROSE|PINK|RED|GREEN|BLACK";

/// Karat units in match priority order; `K` last so `18KTWO TONE` splits as `18K TWO TONE`
const KARAT_UNITS: &str = "KARAT|CARAT|KT|CT|K";

/// Metals returned verbatim
const PURE_METALS: &[&str] = &[
    "PLATINUM",
    "STERLING SILVER",
    "SILVER",
    "TITANIUM",
    "BRASS",
    "PALLADIUM",
    "COPPER",
    "ALLOY",
];

static GOLD_PHRASE: Lazy<Regex> = Lazy::new(|| {
    let tone = format!(
        r"(?:(?:{c})\s*GOLD|TWO[\s-]?TONE(?:\s*GOLD)?|TRI[\s-]?COLOU?R(?:\s*GOLD)?|GOLD)",
        c = GOLD_COLORS
    );
    Regex::new(&format!(
        r"\b(\d{{1,2}})\s*(?:{units})\s*({tone}(?:\s*(?:&|\bAND\b)\s*(?:(?:{c})\s*)?GOLD)?)",
        units = KARAT_UNITS,
        tone = tone,
        c = GOLD_COLORS
    ))
    .expect("valid gold phrase regex")
});

static NAMED_METAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:STERLING\s+SILVER|PLATINUM|SILVER|(?:{c})\s*GOLD|GOLD|TITANIUM|BRASS|PALLADIUM|COPPER|ALLOY)\b",
        c = GOLD_COLORS
    ))
    .expect("valid named metal regex")
});

static BARE_KARAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(\d{{1,2}})\s*(?:{units})\b", units = KARAT_UNITS))
        .expect("valid bare karat regex")
});

static DIAMOND_METAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bDIAMOND\s+(STERLING\s+SILVER|PLATINUM|SILVER|TITANIUM|PALLADIUM|STAINLESS\s+STEEL|TUNGSTEN(?:\s+CARBIDE)?|COBALT|CERAMIC|VERMEIL)\b",
    )
    .expect("valid diamond metal regex")
});

static CONCATENATED_GOLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"({c}|TONE|COLOU?R)\s*GOLD", c = GOLD_COLORS))
        .expect("valid concatenated gold regex")
});

static TWO_TONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TWO[\s-]?TONE").expect("valid two tone regex"));

static TRI_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TRI[\s-]?COLOU?R").expect("valid tri color regex"));

static JOINER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:&|\bAND\b)\s*").expect("valid joiner regex"));

/// Extracts the canonical metal/karat descriptor from a product text
///
/// # Returns
///
/// * a lowercase pure metal name (`"platinum"`, `"sterling silver"`, ...)
/// * a lowercase karat expression with a `k` suffix (`"14k white gold"`)
/// * the metal after `DIAMOND` when nothing else matched
/// * `"diamond"` when the text only mentions diamonds
/// * `None` otherwise
///
/// # Examples
///
/// ```
/// use jewel_scout::normalize::extract_kt_value;
///
/// assert_eq!(extract_kt_value("14K White Gold & Rose Gold Ring").as_deref(), Some("14k white gold & rose gold"));
/// assert_eq!(extract_kt_value("Sterling Silver Huggie Earrings").as_deref(), Some("sterling silver"));
/// assert_eq!(extract_kt_value("Diamond Solitaire Pendant").as_deref(), Some("diamond"));
/// assert_eq!(extract_kt_value("0.5 ct Pendant"), None);
/// ```
pub fn extract_kt_value(text: &str) -> Option<String> {
    let upper = text.to_uppercase();

    let mut found: Vec<&str> = Vec::new();
    found.extend(karat_matches(&GOLD_PHRASE, &upper));
    found.extend(NAMED_METAL.find_iter(&upper).map(|m| m.as_str()));
    found.extend(karat_matches(&BARE_KARAT, &upper));

    if let Some(primary) = strongest_match(found) {
        let canonical = collapse_whitespace(primary);
        if PURE_METALS.contains(&canonical.as_str()) {
            return Some(canonical.to_lowercase());
        }
        return Some(format_karat_phrase(&canonical).to_lowercase());
    }

    if let Some(caps) = DIAMOND_METAL.captures(&upper) {
        return Some(collapse_whitespace(&caps[1]).to_lowercase());
    }

    if upper.contains("DIAMOND") {
        return Some("diamond".to_string());
    }

    None
}

/// Karat matches whose number is not glued to a decimal point or fraction
///
/// `0.5 CT` and `1/4 CT GOLD` carry diamond weights, not purities.
fn karat_matches<'a>(pattern: &'a Regex, upper: &'a str) -> impl Iterator<Item = &'a str> {
    pattern.find_iter(upper).filter_map(move |m| {
        let preceding = upper[..m.start()].chars().last();
        match preceding {
            Some('.') | Some(',') | Some('/') | Some('-') => None,
            _ => Some(m.as_str()),
        }
    })
}

/// Picks the longest match not contained in a longer one
///
/// Ties keep their discovery order, so family 1 beats family 2 at equal length.
fn strongest_match(found: Vec<&str>) -> Option<&str> {
    let mut unique: Vec<&str> = Vec::new();
    for m in found {
        let m = m.trim();
        if !m.is_empty() && !unique.contains(&m) {
            unique.push(m);
        }
    }

    // Stable sort keeps discovery order for equal lengths
    unique.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut kept: Vec<&str> = Vec::new();
    for m in unique {
        if !kept.iter().any(|longer| longer.contains(m)) {
            kept.push(m);
        }
    }

    kept.first().copied()
}

/// Renders a karat phrase or named gold as `<n>K <descriptor>`
fn format_karat_phrase(phrase: &str) -> String {
    if let Some(caps) = GOLD_PHRASE.captures(phrase) {
        return format!("{}K {}", &caps[1], tidy_descriptor(&caps[2]));
    }

    if let Some(caps) = BARE_KARAT.captures(phrase) {
        return format!("{}K", &caps[1]);
    }

    tidy_descriptor(phrase)
}

/// Splits glued words and normalizes dual-tone joiners
fn tidy_descriptor(descriptor: &str) -> String {
    let text = TWO_TONE.replace_all(descriptor, "TWO TONE");
    let text = TRI_COLOR.replace_all(&text, "TRI COLOR");
    let text = CONCATENATED_GOLD.replace_all(&text, "$1 GOLD");
    let text = JOINER.replace_all(&text, " & ");
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kt(text: &str) -> Option<String> {
        extract_kt_value(text)
    }

    #[test]
    fn test_dual_tone_phrase() {
        assert_eq!(
            kt("14K White Gold & Rose Gold Ring").as_deref(),
            Some("14k white gold & rose gold")
        );
        assert_eq!(
            kt("18kt yellow gold and white gold band").as_deref(),
            Some("18k yellow gold & white gold")
        );
        assert_eq!(
            kt("10K Rose Gold&White Gold Hoops").as_deref(),
            Some("10k rose gold & white gold")
        );
    }

    #[test]
    fn test_carat_suffix_becomes_k() {
        assert_eq!(kt("9ct White Gold Ring").as_deref(), Some("9k white gold"));
        assert_eq!(kt("14 CARAT ROSE GOLD").as_deref(), Some("14k rose gold"));
        assert_eq!(kt("18 Karat Gold Chain").as_deref(), Some("18k gold"));
        assert_eq!(kt("Solid 9CT Bangle").as_deref(), Some("9k"));
    }

    #[test]
    fn test_concatenated_words_are_split() {
        assert_eq!(kt("18KTWO TONE Ring").as_deref(), Some("18k two tone"));
        assert_eq!(kt("14KWHITEGOLD STUDS").as_deref(), Some("14k white gold"));
        assert_eq!(kt("14K Two-Tone Gold Band").as_deref(), Some("14k two tone gold"));
        assert_eq!(kt("RoseGold Pendant").as_deref(), Some("rose gold"));
    }

    #[test]
    fn test_pure_metals() {
        assert_eq!(
            kt("Sterling Silver Huggie Earrings").as_deref(),
            Some("sterling silver")
        );
        assert_eq!(kt("Diamond Platinum Band").as_deref(), Some("platinum"));
        assert_eq!(kt("Titanium Wedding Band").as_deref(), Some("titanium"));
        assert_eq!(kt("Silver  Chain").as_deref(), Some("silver"));
    }

    #[test]
    fn test_karat_phrase_beats_submatches() {
        // "14K" and "WHITE GOLD" are both contained in the phrase
        assert_eq!(
            kt("Diamond Ring in 14K White Gold").as_deref(),
            Some("14k white gold")
        );
        // Longest wins over a shorter standalone metal elsewhere
        assert_eq!(
            kt("Silver clasp, 18K Yellow Gold pendant").as_deref(),
            Some("18k yellow gold")
        );
    }

    #[test]
    fn test_decimal_weight_is_not_a_karat() {
        assert_eq!(kt("0.5 ct"), None);
        assert_eq!(kt("1.25CT Pendant"), None);
        assert_eq!(kt("1/2 CT Pendant"), None);
        assert_eq!(kt("0,5 ct Diamond Pendant").as_deref(), Some("diamond"));
    }

    #[test]
    fn test_weight_before_gold_is_not_a_karat() {
        assert_eq!(kt("0.25 CT White Gold Band").as_deref(), Some("white gold"));
        assert_eq!(kt("1/4 CT Gold Ring").as_deref(), Some("gold"));
        assert_eq!(kt("1-1/2 ct Rose Gold Studs").as_deref(), Some("rose gold"));
        // A real karat later in the text still wins
        assert_eq!(
            kt("1/4 CT Diamond Ring 14K Yellow Gold").as_deref(),
            Some("14k yellow gold")
        );
    }

    #[test]
    fn test_diamond_metal_fallback() {
        assert_eq!(
            kt("Diamond Tungsten Carbide Band").as_deref(),
            Some("tungsten carbide")
        );
        assert_eq!(
            kt("Diamond Stainless  Steel Watch").as_deref(),
            Some("stainless steel")
        );
    }

    #[test]
    fn test_diamond_sentinel_and_none() {
        assert_eq!(kt("Diamond Solitaire Pendant").as_deref(), Some("diamond"));
        assert_eq!(kt("Lab Diamonds Tennis Bracelet").as_deref(), Some("diamond"));
        assert_eq!(kt("Pearl Drop Earrings"), None);
        assert_eq!(kt(""), None);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        for input in [
            "14K White Gold & Rose Gold Ring",
            "18KTWO TONE Ring",
            "Sterling Silver Huggie Earrings",
            "9ct Yellow Gold",
            "Diamond Solitaire Pendant",
            "RoseGold Pendant",
            "Solid 9CT Bangle",
        ] {
            let once = kt(input).unwrap();
            assert_eq!(kt(&once).as_deref(), Some(once.as_str()), "input: {}", input);
        }

        // Fallback metals lose their DIAMOND anchor and come back empty
        let once = kt("Diamond Tungsten Band").unwrap();
        assert_eq!(kt(&once), None);
    }

    #[test]
    fn test_strongest_match() {
        assert_eq!(
            strongest_match(vec!["14K", "14K WHITE GOLD", "WHITE GOLD", "14K"]),
            Some("14K WHITE GOLD")
        );
        assert_eq!(strongest_match(vec![]), None);
        assert_eq!(strongest_match(vec!["GOLD", "SILVER"]), Some("SILVER"));
    }
}
