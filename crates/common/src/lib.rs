//! Common types shared across the FashionFactory showcase crates.

pub mod geometry;
pub mod error;

pub use geometry::{EdgeSizes, Rect};
pub use error::{SiteError, SiteResult};
