//! Text normalization for product names
//!
//! This module provides pure functions that turn free-text product names into:
//! - a canonical metal/karat descriptor (`"14k white gold"`, `"platinum"`)
//! - a canonical diamond weight (`"1/2ct"`, `"0.50ct tw"`)
//!
//! All inputs are uppercased before matching, and all outputs are lowercase.

mod metal;
mod numbers;
mod weight;

pub use metal::extract_kt_value;
pub use numbers::{normalize_decimal_commas, parse_weight_number};
pub use weight::extract_diawt_value;
