//! Product grid extraction from rendered listing HTML
//!
//! Listing pages repeat one item element per product. For every item the
//! configured selectors pick out:
//! - the product name (required)
//! - the price text
//! - the image URL (`src`, `data-src` or the first `srcset` entry)
//! - the product link

use crate::config::SiteEntry;
use crate::ScoutError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled selectors for one site's product grid
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    item: Selector,
    name: Selector,
    price: Option<Selector>,
    image: Option<Selector>,
    link: Option<Selector>,
}

impl ListingSelectors {
    /// Compiles the selectors
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Selector` naming the first selector that fails to parse.
    pub fn parse(
        item: &str,
        name: &str,
        price: Option<&str>,
        image: Option<&str>,
        link: Option<&str>,
    ) -> Result<Self, ScoutError> {
        Ok(Self {
            item: compile(item)?,
            name: compile(name)?,
            price: price.map(compile).transpose()?,
            image: image.map(compile).transpose()?,
            link: link.map(compile).transpose()?,
        })
    }

    pub fn from_site(site: &SiteEntry) -> Result<Self, ScoutError> {
        Self::parse(
            &site.item_selector,
            &site.name_selector,
            site.price_selector.as_deref(),
            site.image_selector.as_deref(),
            site.link_selector.as_deref(),
        )
    }
}

fn compile(selector: &str) -> Result<Selector, ScoutError> {
    Selector::parse(selector).map_err(|e| ScoutError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Raw texts of one product item, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProductText {
    /// Whitespace-collapsed name text; empty when the name element is missing
    pub name: String,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
}

/// Extracts product items in document order
///
/// The first `already_seen` items are skipped, so an infinite-scroll page
/// that re-renders earlier products only yields the new ones.
///
/// # Arguments
///
/// * `html` - The rendered page content
/// * `selectors` - The site's compiled selectors
/// * `base_url` - The page URL for resolving relative image and product links
/// * `already_seen` - Items returned by earlier calls for the same page
pub fn extract_listings(
    html: &str,
    selectors: &ListingSelectors,
    base_url: &Url,
    already_seen: usize,
) -> Vec<RawProductText> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.item)
        .skip(already_seen)
        .map(|item| RawProductText {
            name: first_text(item, &selectors.name).unwrap_or_default(),
            price: selectors
                .price
                .as_ref()
                .and_then(|selector| first_text(item, selector)),
            image_url: selectors
                .image
                .as_ref()
                .and_then(|selector| image_source(item, selector))
                .and_then(|src| resolve_link(&src, base_url)),
            product_url: selectors
                .link
                .as_ref()
                .and_then(|selector| first_attr(item, selector, "href"))
                .and_then(|href| resolve_link(&href, base_url)),
        })
        .collect()
}

/// Running position inside an infinite-scroll listing
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingCursor {
    seen: usize,
}

impl ListingCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Extracts the items rendered since the last call
    pub fn advance(
        &mut self,
        html: &str,
        selectors: &ListingSelectors,
        base_url: &Url,
    ) -> Vec<RawProductText> {
        let fresh = extract_listings(html, selectors, base_url, self.seen);
        self.seen += fresh.len();
        fresh
    }
}

fn first_text(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
}

fn first_attr(item: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    item.select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Lazy-loaded grids keep the real URL out of `src`
fn image_source(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let element = item.select(selector).next()?;
    let attrs = element.value();

    for name in ["src", "data-src", "data-original"] {
        if let Some(value) = attrs.attr(name).map(str::trim) {
            if !value.is_empty() && !value.starts_with("data:") {
                return Some(value.to_string());
            }
        }
    }

    attrs
        .attr("srcset")
        .and_then(|srcset| srcset.split(',').next())
        .and_then(|entry| entry.split_whitespace().next())
        .map(str::to_string)
}

/// Resolves an href against the page URL
///
/// Returns None for script, mail, phone and data links, and for anything
/// that does not resolve to HTTP(S).
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
