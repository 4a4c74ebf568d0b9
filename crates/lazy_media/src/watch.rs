//! Visibility watch: the platform capability a lazy video observes itself with.
//!
//! The trait is the seam between the trigger logic and whatever reports
//! visibility. [`IntersectionObserverController`] implements it for real
//! pages; tests inject a fake that invokes callbacks directly.

use common::SiteResult;
use dom::NodeId;
use std::sync::Arc;
use web_apis::{
    IntersectionCallback, IntersectionObserverController, IntersectionObserverEntry,
    IntersectionObserverOptions, RootMargin, Threshold,
};

/// Watch registration identifier.
pub type WatchId = u64;

/// Callback invoked with each visibility report for the watched element.
pub type WatchCallback = Arc<dyn Fn(VisibilityReport) + Send + Sync>;

/// Proximity margin and visibility threshold of a watch.
#[derive(Clone, Debug, PartialEq)]
pub struct WatchOptions {
    /// Distance around the viewport within which an element counts as approaching.
    pub root_margin: RootMargin,
    /// Minimum visible fraction of the element's area.
    pub threshold: f64,
}

impl WatchOptions {
    pub const LAZY_MEDIA_MARGIN: &'static str = "50px";
    pub const LAZY_MEDIA_THRESHOLD: f64 = 0.1;

    /// 50px around the viewport, 10% visible.
    pub fn lazy_media() -> Self {
        Self {
            root_margin: RootMargin::pixels(50.0),
            threshold: Self::LAZY_MEDIA_THRESHOLD,
        }
    }

    /// Build options from a root-margin string such as `"50px"` or `"10% 0px"`.
    pub fn parse(root_margin: &str, threshold: f64) -> SiteResult<Self> {
        Ok(Self {
            root_margin: RootMargin::parse(root_margin)?,
            threshold,
        })
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::lazy_media()
    }
}

/// One visibility observation of a watched element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityReport {
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
}

impl VisibilityReport {
    pub fn visible(intersection_ratio: f64) -> Self {
        Self {
            intersection_ratio,
            is_intersecting: true,
        }
    }

    pub fn hidden() -> Self {
        Self {
            intersection_ratio: 0.0,
            is_intersecting: false,
        }
    }

    /// Whether this report satisfies a watch's threshold.
    pub fn reaches(&self, threshold: f64) -> bool {
        self.is_intersecting && self.intersection_ratio >= threshold
    }
}

impl From<&IntersectionObserverEntry> for VisibilityReport {
    fn from(entry: &IntersectionObserverEntry) -> Self {
        Self {
            intersection_ratio: entry.intersection_ratio,
            is_intersecting: entry.is_intersecting,
        }
    }
}

/// Something that can watch an element's visibility.
pub trait VisibilityWatch: Send + Sync {
    /// Start watching `target`. The callback may run on the first
    /// observation pass even if nothing has scrolled.
    fn observe(
        &self,
        target: NodeId,
        options: &WatchOptions,
        callback: WatchCallback,
    ) -> SiteResult<WatchId>;

    /// Stop a watch and release it. Unknown ids are ignored.
    ///
    /// Called from inside the watch's own callback while the loader holds
    /// its state lock, so implementations must not invoke callbacks here.
    fn disconnect(&self, id: WatchId);
}

impl VisibilityWatch for IntersectionObserverController {
    fn observe(
        &self,
        target: NodeId,
        options: &WatchOptions,
        callback: WatchCallback,
    ) -> SiteResult<WatchId> {
        let forward: IntersectionCallback =
            Arc::new(move |entries: &[IntersectionObserverEntry]| {
                for entry in entries.iter().filter(|e| e.target == target) {
                    callback(VisibilityReport::from(entry));
                }
            });

        let id = self.create_observer(
            forward,
            IntersectionObserverOptions {
                root_margin: options.root_margin.clone(),
                threshold: Threshold::Single(options.threshold),
            },
        )?;
        IntersectionObserverController::observe(self, id, target);
        Ok(id)
    }

    fn disconnect(&self, id: WatchId) {
        IntersectionObserverController::disconnect(self, id);
    }
}
