//! Disallow-rule extraction and URL matching
//!
//! Only `Disallow` lines are read. User-agent groups are not distinguished:
//! a path disallowed for any agent counts as disallowed.

use regex::Regex;
use url::Url;

/// Extracts the trimmed pattern of every `Disallow:` line
///
/// Matching is case-insensitive on the directive name. Empty values
/// (`Disallow:` with nothing after it) allow everything and are skipped.
///
/// # Example
///
/// ```
/// use jewel_scout::robots::parse_disallow_patterns;
///
/// let patterns = parse_disallow_patterns("User-agent: *\nDisallow: /cart\nDISALLOW: /*?sort=\n");
/// assert_eq!(patterns, vec!["/cart".to_string(), "/*?sort=".to_string()]);
/// ```
pub fn parse_disallow_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let (key, value) = trimmed.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("disallow") {
                return None;
            }

            // Strip trailing comments
            let value = value.split('#').next().unwrap_or("").trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}

/// Checks a URL against a list of disallow patterns
///
/// A pattern matches when any of the following holds:
/// - it contains `*` and the URL path (with query) matches it as a wildcard
/// - the URL path starts with the literal pattern
/// - the URL has a query and the pattern carries a `key=value` filter whose key
///   is present in that query
///
/// A pattern that cannot be evaluated is treated as a non-match; the remaining
/// patterns are still checked. An empty list never disallows anything.
///
/// # Examples
///
/// ```
/// use jewel_scout::robots::is_disallowed;
///
/// let patterns = vec!["/checkout".to_string(), "/*?*sort=".to_string()];
/// assert!(is_disallowed("https://shop.example.com/checkout/step1", &patterns));
/// assert!(is_disallowed("https://shop.example.com/rings?page=2&sort=price", &patterns));
/// assert!(!is_disallowed("https://shop.example.com/rings", &patterns));
/// assert!(!is_disallowed("https://shop.example.com/rings", &[]));
/// ```
pub fn is_disallowed(url: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match pattern_matches(url, pattern) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::debug!("Skipping robots pattern '{}' for {}: {}", pattern, url, e);
            false
        }
    })
}

/// Evaluates a single pattern
fn pattern_matches(url: &str, pattern: &str) -> Result<bool, String> {
    let parsed = Url::parse(url).map_err(|e| e.to_string())?;
    let path = parsed.path();
    let query = parsed.query();

    if pattern.contains('*') {
        let target = match query {
            Some(q) => format!("{}?{}", path, q),
            None => path.to_string(),
        };
        if wildcard_regex(pattern)?.is_match(&target) {
            return Ok(true);
        }
    } else if path.starts_with(pattern) {
        return Ok(true);
    }

    if query.is_some() {
        if let Some(key) = query_filter_key(pattern) {
            return Ok(parsed.query_pairs().any(|(k, _)| k == key));
        }
    }

    Ok(false)
}

/// Converts a robots wildcard into an anchored regex
///
/// `*` matches any sequence; a trailing `$` anchors the end.
fn wildcard_regex(pattern: &str) -> Result<Regex, String> {
    let (body, anchored) = match pattern.strip_suffix('$') {
        Some(body) => (body, true),
        None => (pattern, false),
    };

    let escaped: Vec<String> = body.split('*').map(regex::escape).collect();
    let mut source = format!("^{}", escaped.join(".*"));
    if anchored {
        source.push('$');
    }

    Regex::new(&source).map_err(|e| e.to_string())
}

/// Returns the key of a `key=value` query filter encoded in a pattern
///
/// `/*?*color=` yields `color`; `/search?q=rings` yields `q`.
fn query_filter_key(pattern: &str) -> Option<&str> {
    let (before_eq, _) = pattern.split_once('=')?;
    let key = before_eq
        .rsplit(|c| c == '?' || c == '&' || c == '*')
        .next()?
        .trim();

    (!key.is_empty() && !key.contains('/')).then_some(key)
}
