//! Intersection Observer API implementation.
//!
//! Observers are registered with an [`IntersectionObserverController`],
//! which computes entries against the viewport on every `process()` pass and
//! delivers them to the observer callbacks.

use common::{EdgeSizes, Rect, SiteError, SiteResult};
use dom::NodeId;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Observer identifier, unique per controller.
pub type ObserverId = u64;

/// Callback invoked with the entries queued for one observer.
pub type IntersectionCallback = Arc<dyn Fn(&[IntersectionObserverEntry]) + Send + Sync>;

/// Intersection Observer.
struct IntersectionObserver {
    /// Callback function.
    callback: IntersectionCallback,
    /// Root margin.
    root_margin: RootMargin,
    /// Thresholds, sorted ascending.
    thresholds: SmallVec<[f64; 4]>,
    /// Observed targets.
    targets: Vec<ObservationTarget>,
}

/// A target plus the last state delivered for it.
struct ObservationTarget {
    node: NodeId,
    /// `(threshold index, is_intersecting)` of the last delivered entry.
    /// `None` until the initial observation has been delivered.
    previous: Option<(usize, bool)>,
}

impl IntersectionObserver {
    fn new(callback: IntersectionCallback, options: IntersectionObserverOptions) -> SiteResult<Self> {
        Ok(Self {
            callback,
            root_margin: options.root_margin,
            thresholds: normalize_thresholds(options.threshold)?,
            targets: Vec::new(),
        })
    }

    fn observe(&mut self, node: NodeId) {
        if !self.targets.iter().any(|t| t.node == node) {
            self.targets.push(ObservationTarget { node, previous: None });
        }
    }

    fn unobserve(&mut self, node: NodeId) {
        self.targets.retain(|t| t.node != node);
    }
}

/// Clamp thresholds into `[0, 1]`, sort, and dedup. An empty list means `[0]`.
fn normalize_thresholds(threshold: Threshold) -> SiteResult<SmallVec<[f64; 4]>> {
    let mut thresholds: SmallVec<[f64; 4]> = match threshold {
        Threshold::Single(t) => SmallVec::from_elem(t, 1),
        Threshold::Multiple(ts) => ts.into_iter().collect(),
    };

    if thresholds.iter().any(|t| !t.is_finite()) {
        return Err(SiteError::invalid("threshold must be a finite number"));
    }

    for t in &mut thresholds {
        *t = t.clamp(0.0, 1.0);
    }
    thresholds.sort_by_key(|t| OrderedFloat(*t));
    thresholds.dedup();

    if thresholds.is_empty() {
        thresholds.push(0.0);
    }
    Ok(thresholds)
}

/// Intersection Observer options.
#[derive(Clone, Debug)]
pub struct IntersectionObserverOptions {
    /// Root margin.
    pub root_margin: RootMargin,
    /// Threshold(s).
    pub threshold: Threshold,
}

impl Default for IntersectionObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::default(),
            threshold: Threshold::Single(0.0),
        }
    }
}

/// Root margin specification.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    /// Same pixel margin on every side.
    pub fn pixels(px: f64) -> Self {
        let value = MarginValue::Pixels(px);
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Parse root margin from a CSS-style shorthand string.
    pub fn parse(margin: &str) -> SiteResult<Self> {
        let parts: Vec<&str> = margin.split_whitespace().collect();

        match parts.len() {
            0 => Ok(Self::default()),
            1 => {
                let value = MarginValue::parse(parts[0])?;
                Ok(Self {
                    top: value,
                    right: value,
                    bottom: value,
                    left: value,
                })
            }
            2 => {
                let vertical = MarginValue::parse(parts[0])?;
                let horizontal = MarginValue::parse(parts[1])?;
                Ok(Self {
                    top: vertical,
                    right: horizontal,
                    bottom: vertical,
                    left: horizontal,
                })
            }
            3 => {
                let horizontal = MarginValue::parse(parts[1])?;
                Ok(Self {
                    top: MarginValue::parse(parts[0])?,
                    right: horizontal,
                    bottom: MarginValue::parse(parts[2])?,
                    left: horizontal,
                })
            }
            4 => Ok(Self {
                top: MarginValue::parse(parts[0])?,
                right: MarginValue::parse(parts[1])?,
                bottom: MarginValue::parse(parts[2])?,
                left: MarginValue::parse(parts[3])?,
            }),
            _ => Err(SiteError::parse(format!("invalid root margin: {margin:?}"))),
        }
    }

    /// Resolve against the root bounds. Percentages of the vertical edges
    /// use the root height, horizontal edges the root width.
    pub fn resolve(&self, root: &Rect) -> EdgeSizes {
        EdgeSizes::new(
            self.top.to_pixels(root.height),
            self.right.to_pixels(root.width),
            self.bottom.to_pixels(root.height),
            self.left.to_pixels(root.width),
        )
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Margin value (pixels or percentage).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginValue {
    Pixels(f64),
    Percentage(f64),
}

impl MarginValue {
    /// Parse a margin value.
    pub fn parse(value: &str) -> SiteResult<Self> {
        let value = value.trim();
        let invalid = || SiteError::parse(format!("invalid margin value: {value:?}"));

        let parsed = if let Some(num) = value.strip_suffix('%') {
            MarginValue::Percentage(num.parse::<f64>().map_err(|_| invalid())?)
        } else if let Some(num) = value.strip_suffix("px") {
            MarginValue::Pixels(num.parse::<f64>().map_err(|_| invalid())?)
        } else {
            // Unitless values are pixels.
            MarginValue::Pixels(value.parse::<f64>().map_err(|_| invalid())?)
        };

        match parsed {
            MarginValue::Pixels(v) | MarginValue::Percentage(v) if !v.is_finite() => Err(invalid()),
            _ => Ok(parsed),
        }
    }

    /// Get the value in pixels given a reference size.
    pub fn to_pixels(&self, reference: f64) -> f64 {
        match self {
            MarginValue::Pixels(px) => *px,
            MarginValue::Percentage(pct) => reference * pct / 100.0,
        }
    }
}

impl Default for MarginValue {
    fn default() -> Self {
        MarginValue::Pixels(0.0)
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginValue::Pixels(px) => write!(f, "{}px", px),
            MarginValue::Percentage(pct) => write!(f, "{}%", pct),
        }
    }
}

/// Threshold specification.
#[derive(Clone, Debug)]
pub enum Threshold {
    Single(f64),
    Multiple(Vec<f64>),
}

/// Intersection observer entry.
#[derive(Clone, Debug)]
pub struct IntersectionObserverEntry {
    /// Target element.
    pub target: NodeId,
    /// Bounding client rect.
    pub bounding_client_rect: Rect,
    /// Intersection rect.
    pub intersection_rect: Rect,
    /// Root bounds, margin applied.
    pub root_bounds: Rect,
    /// Intersection ratio.
    pub intersection_ratio: f64,
    /// Is intersecting.
    pub is_intersecting: bool,
    /// Milliseconds since the controller was created.
    pub time: f64,
}

struct Registry {
    observers: HashMap<ObserverId, IntersectionObserver>,
    counter: ObserverId,
}

/// Intersection observer controller.
///
/// Cloning yields another handle onto the same registry.
#[derive(Clone)]
pub struct IntersectionObserverController {
    registry: Arc<RwLock<Registry>>,
    origin: Instant,
}

impl IntersectionObserverController {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry {
                observers: HashMap::new(),
                counter: 0,
            })),
            origin: Instant::now(),
        }
    }

    /// Create and register an observer.
    pub fn create_observer(
        &self,
        callback: IntersectionCallback,
        options: IntersectionObserverOptions,
    ) -> SiteResult<ObserverId> {
        let observer = IntersectionObserver::new(callback, options)?;
        let mut registry = self.registry.write();
        registry.counter += 1;
        let id = registry.counter;
        registry.observers.insert(id, observer);
        tracing::trace!(observer = id, "intersection observer created");
        Ok(id)
    }

    /// Start observing a target. Returns false for an unknown observer.
    pub fn observe(&self, id: ObserverId, target: NodeId) -> bool {
        match self.registry.write().observers.get_mut(&id) {
            Some(observer) => {
                observer.observe(target);
                true
            }
            None => false,
        }
    }

    /// Stop observing a target.
    pub fn unobserve(&self, id: ObserverId, target: NodeId) {
        if let Some(observer) = self.registry.write().observers.get_mut(&id) {
            observer.unobserve(target);
        }
    }

    /// Stop observing all targets and release the observer.
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let removed = self.registry.write().observers.remove(&id).is_some();
        if removed {
            tracing::trace!(observer = id, "intersection observer disconnected");
        }
        removed
    }

    pub fn is_observing(&self, id: ObserverId, target: NodeId) -> bool {
        self.registry
            .read()
            .observers
            .get(&id)
            .map(|o| o.targets.iter().any(|t| t.node == target))
            .unwrap_or(false)
    }

    /// Number of registered observers.
    pub fn live_observers(&self) -> usize {
        self.registry.read().observers.len()
    }

    /// Root margin of a registered observer.
    pub fn root_margin(&self, id: ObserverId) -> Option<RootMargin> {
        self.registry.read().observers.get(&id).map(|o| o.root_margin.clone())
    }

    /// Thresholds of a registered observer.
    pub fn thresholds(&self, id: ObserverId) -> Option<Vec<f64>> {
        self.registry
            .read()
            .observers
            .get(&id)
            .map(|o| o.thresholds.to_vec())
    }

    /// Run one observation pass (called after layout or scroll changes).
    ///
    /// `targets` holds client rects of mounted elements; targets absent from
    /// the map are skipped. Returns the number of entries delivered.
    pub fn process(&self, viewport: &Rect, targets: &HashMap<NodeId, Rect>) -> usize {
        let time = self.origin.elapsed().as_secs_f64() * 1000.0;
        let mut queued: Vec<(ObserverId, IntersectionCallback, Vec<IntersectionObserverEntry>)> =
            Vec::new();

        {
            let mut registry = self.registry.write();
            for (&id, observer) in registry.observers.iter_mut() {
                let root = viewport.outset(&observer.root_margin.resolve(viewport));
                let mut entries = Vec::new();

                for target in &mut observer.targets {
                    let Some(target_rect) = targets.get(&target.node) else {
                        continue;
                    };
                    let entry =
                        compute_entry(target.node, target_rect, &root, &observer.thresholds, time);
                    let index = threshold_index(entry.intersection_ratio, &observer.thresholds);
                    let state = (index, entry.is_intersecting);

                    if target.previous != Some(state) {
                        target.previous = Some(state);
                        entries.push(entry);
                    }
                }

                if !entries.is_empty() {
                    queued.push((id, observer.callback.clone(), entries));
                }
            }
        }

        // Callbacks run without the registry lock so they may disconnect.
        let mut delivered = 0;
        for (id, callback, entries) in queued {
            if !self.registry.read().observers.contains_key(&id) {
                continue;
            }
            delivered += entries.len();
            callback(&entries);
        }
        delivered
    }
}

impl Default for IntersectionObserverController {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_entry(
    target: NodeId,
    target_rect: &Rect,
    root_bounds: &Rect,
    thresholds: &[f64],
    time: f64,
) -> IntersectionObserverEntry {
    let intersection = target_rect.edge_inclusive_intersection(root_bounds);

    let intersection_ratio = match &intersection {
        Some(int_rect) if target_rect.area() > 0.0 => int_rect.area() / target_rect.area(),
        // A zero-area target touching the root counts as fully visible.
        Some(_) => 1.0,
        None => 0.0,
    };
    let min_threshold = thresholds.first().copied().unwrap_or(0.0);

    IntersectionObserverEntry {
        target,
        bounding_client_rect: *target_rect,
        intersection_rect: intersection.unwrap_or_default(),
        root_bounds: *root_bounds,
        intersection_ratio,
        is_intersecting: intersection.is_some() && intersection_ratio >= min_threshold,
        time,
    }
}

/// Number of thresholds the ratio has reached.
fn threshold_index(ratio: f64, thresholds: &[f64]) -> usize {
    thresholds.iter().filter(|&&t| ratio >= t).count()
}
