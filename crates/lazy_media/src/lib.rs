//! Deferred media loading.
//!
//! A [`LazyVideo`] renders a `<video>` placeholder whose real source is held
//! back in `data-src`. Once mounted it watches its own visibility and, the
//! first time it comes within 50px of the viewport with at least 10% of its
//! area visible, binds the source, starts loading and optionally playback.
//! The transition happens at most once per instance.

pub mod loader;
pub mod props;
pub mod watch;

#[cfg(test)]
mod fake;

pub use loader::{LazyVideo, VisibilityState};
pub use props::LazyVideoProps;
pub use watch::{VisibilityReport, VisibilityWatch, WatchCallback, WatchId, WatchOptions};
