//! SiteTrack Common - Shared constants and helpers
//!
//! # Examples
//!
//! ```
//! use sitetrack_common::{format_currency, truncate_string, NOT_AVAILABLE};
//!
//! assert_eq!(NOT_AVAILABLE, "N/A");
//! assert_eq!(format_currency(1500.0), "$1,500.00");
//! assert_eq!(truncate_string("hello world", 5), "he...");
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
