//! Listing pages to product records
//!
//! This module covers the caller side of page acquisition:
//! - Extracting product texts from the rendered grid
//! - Assembling fixed-layout rows with normalized metal and weight
//! - Downloading product images concurrently

mod extract;
mod images;
mod record;

pub use extract::{extract_listings, ListingCursor, ListingSelectors, RawProductText};
pub use images::{download_images, DownloadOptions, ImageRequest, IMAGE_UNAVAILABLE};
pub use record::{
    process_row, row_from_listing, ProductRecord, COL_DIAMOND_WEIGHT, COL_IMAGE_PATH,
    COL_IMAGE_URL, COL_METAL, COL_NAME, COL_PRICE, COL_PRODUCT_URL, COL_SCRAPED_AT, COL_SITE,
    NOT_AVAILABLE, ROW_COLUMNS,
};
