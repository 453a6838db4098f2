//! Integration tests for Jewel-Scout
//!
//! These tests drive the public API end-to-end: configuration loading,
//! robots-aware page acquisition through browser test doubles, listing
//! extraction and row assembly.

mod normalization;
mod scrape;
