//! Fixed-layout product rows and their serialized form

use super::RawProductText;
use crate::normalize::{extract_diawt_value, extract_kt_value};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Column layout shared by every site
pub const ROW_COLUMNS: [&str; 9] = [
    "site",
    "name",
    "price",
    "metal",
    "diamond_weight",
    "image_url",
    "image_path",
    "product_url",
    "scraped_at",
];

pub const COL_SITE: usize = 0;
pub const COL_NAME: usize = 1;
pub const COL_PRICE: usize = 2;
pub const COL_METAL: usize = 3;
pub const COL_DIAMOND_WEIGHT: usize = 4;
pub const COL_IMAGE_URL: usize = 5;
pub const COL_IMAGE_PATH: usize = 6;
pub const COL_PRODUCT_URL: usize = 7;
pub const COL_SCRAPED_AT: usize = 8;

/// Written in place of a metal or weight that could not be extracted
pub const NOT_AVAILABLE: &str = "NA";

/// Lays out raw product texts in `ROW_COLUMNS` order
///
/// Metal, diamond weight and image path are left empty for
/// [`process_row`] and the image downloader to fill in.
pub fn row_from_listing(site: &str, raw: &RawProductText, scraped_at: DateTime<Utc>) -> Vec<String> {
    let mut row = vec![String::new(); ROW_COLUMNS.len()];
    row[COL_SITE] = site.to_string();
    row[COL_NAME] = raw.name.clone();
    row[COL_PRICE] = raw.price.clone().unwrap_or_default();
    row[COL_IMAGE_URL] = raw.image_url.clone().unwrap_or_default();
    row[COL_PRODUCT_URL] = raw.product_url.clone().unwrap_or_default();
    row[COL_SCRAPED_AT] = scraped_at.to_rfc3339();
    row
}

/// Pads or truncates a row to `ROW_COLUMNS` and fills the normalized fields
///
/// Metal and diamond weight are extracted from the name column and written
/// as `"NA"` when nothing is found.
pub fn process_row(mut fields: Vec<String>) -> Vec<String> {
    fields.resize(ROW_COLUMNS.len(), String::new());

    let name = fields[COL_NAME].clone();
    fields[COL_METAL] = extract_kt_value(&name).unwrap_or_else(|| NOT_AVAILABLE.to_string());
    fields[COL_DIAMOND_WEIGHT] =
        extract_diawt_value(&name).unwrap_or_else(|| NOT_AVAILABLE.to_string());

    fields
}

/// One normalized product, as appended to the records file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub site: String,
    pub name: String,
    pub price: Option<String>,
    pub metal: String,
    pub diamond_weight: String,
    pub image_url: Option<String>,
    pub image_path: String,
    pub product_url: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Builds a record from a processed row
    ///
    /// Empty optional columns become `None`. A missing or unparseable
    /// timestamp column falls back to `fallback_time`.
    pub fn from_row(row: &[String], fallback_time: DateTime<Utc>) -> Self {
        let column = |index: usize| row.get(index).cloned().unwrap_or_default();
        let optional = |index: usize| row.get(index).filter(|v| !v.is_empty()).cloned();

        let scraped_at = row
            .get(COL_SCRAPED_AT)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(fallback_time);

        Self {
            site: column(COL_SITE),
            name: column(COL_NAME),
            price: optional(COL_PRICE),
            metal: column(COL_METAL),
            diamond_weight: column(COL_DIAMOND_WEIGHT),
            image_url: optional(COL_IMAGE_URL),
            image_path: column(COL_IMAGE_PATH),
            product_url: optional(COL_PRODUCT_URL),
            scraped_at,
        }
    }

    /// Serializes to one line of JSON
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_process_row_pads_and_normalizes() {
        let row = process_row(strings(&["shop", "14K White Gold 1/2 ct tw Ring"]));
        assert_eq!(row.len(), ROW_COLUMNS.len());
        assert_eq!(row[COL_METAL], "14k white gold");
        assert_eq!(row[COL_DIAMOND_WEIGHT], "1/2ct tw");
        assert_eq!(row[COL_PRICE], "");
        assert_eq!(row[COL_SCRAPED_AT], "");
    }

    #[test]
    fn test_process_row_truncates() {
        let mut long = strings(&["shop", "Pearl Studs"]);
        long.extend(std::iter::repeat("extra".to_string()).take(20));
        let row = process_row(long);
        assert_eq!(row.len(), ROW_COLUMNS.len());
    }

    #[test]
    fn test_process_row_writes_na() {
        let row = process_row(strings(&["shop", "Pearl Drop Earrings", "$40", "stale", "stale"]));
        assert_eq!(row[COL_METAL], NOT_AVAILABLE);
        assert_eq!(row[COL_DIAMOND_WEIGHT], NOT_AVAILABLE);
        assert_eq!(row[COL_PRICE], "$40");
    }

    #[test]
    fn test_row_from_listing() {
        let raw = RawProductText {
            name: "Platinum Band".to_string(),
            price: Some("$900".to_string()),
            image_url: None,
            product_url: Some("https://shop.test/p/band".to_string()),
        };
        let row = row_from_listing("shop", &raw, at());
        assert_eq!(row[COL_SITE], "shop");
        assert_eq!(row[COL_NAME], "Platinum Band");
        assert_eq!(row[COL_IMAGE_URL], "");
        assert_eq!(row[COL_IMAGE_PATH], "");
        assert_eq!(row[COL_SCRAPED_AT], "2024-03-01T12:30:00+00:00");
    }

    #[test]
    fn test_record_from_row() {
        let raw = RawProductText {
            name: "Platinum Band".to_string(),
            price: None,
            image_url: Some("https://shop.test/img/band.jpg".to_string()),
            product_url: None,
        };
        let mut row = process_row(row_from_listing("shop", &raw, at()));
        row[COL_IMAGE_PATH] = "images/shop-0.jpg".to_string();

        let record = ProductRecord::from_row(&row, Utc::now());
        assert_eq!(record.metal, "platinum");
        assert_eq!(record.diamond_weight, NOT_AVAILABLE);
        assert_eq!(record.price, None);
        assert_eq!(record.image_url.as_deref(), Some("https://shop.test/img/band.jpg"));
        assert_eq!(record.image_path, "images/shop-0.jpg");
        assert_eq!(record.scraped_at, at());
    }

    #[test]
    fn test_record_timestamp_fallback() {
        let row = process_row(strings(&["shop", "Gold Chain"]));
        let record = ProductRecord::from_row(&row, at());
        assert_eq!(record.scraped_at, at());
        assert_eq!(record.metal, "gold");
    }

    #[test]
    fn test_json_line() {
        let row = process_row(row_from_listing(
            "shop",
            &RawProductText {
                name: "9ct Rose Gold Ring".to_string(),
                ..Default::default()
            },
            at(),
        ));
        let line = ProductRecord::from_row(&row, at()).to_json_line().unwrap();
        assert!(line.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["metal"], "9k rose gold");
        assert_eq!(value["diamond_weight"], "NA");
        assert_eq!(value["price"], serde_json::Value::Null);
        assert_eq!(value["scraped_at"], "2024-03-01T12:30:00Z");
    }
}
