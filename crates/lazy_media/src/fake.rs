//! In-memory visibility watch for driving lazy videos in tests.

use crate::watch::{VisibilityReport, VisibilityWatch, WatchCallback, WatchId, WatchOptions};
use common::{SiteError, SiteResult};
use dom::NodeId;
use parking_lot::Mutex;
use std::collections::HashMap;

struct Registration {
    target: NodeId,
    options: WatchOptions,
    callback: WatchCallback,
}

#[derive(Default)]
struct Inner {
    watches: HashMap<WatchId, Registration>,
    counter: WatchId,
    disconnects: usize,
}

/// Fake watch: reports are emitted by hand and delivered synchronously.
#[derive(Default)]
pub(crate) struct FakeWatch {
    inner: Mutex<Inner>,
    /// Delivered from inside `observe()` when set.
    report_on_observe: Option<VisibilityReport>,
    fail_observe: bool,
}

impl FakeWatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reporting_on_observe(report: VisibilityReport) -> Self {
        Self {
            report_on_observe: Some(report),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_observe: true,
            ..Self::default()
        }
    }

    /// Deliver a report to every live watch on `target`.
    pub(crate) fn emit(&self, target: NodeId, report: VisibilityReport) {
        let callbacks: Vec<WatchCallback> = self
            .inner
            .lock()
            .watches
            .values()
            .filter(|r| r.target == target)
            .map(|r| r.callback.clone())
            .collect();
        for callback in callbacks {
            callback(report);
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.inner.lock().watches.len()
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.inner.lock().disconnects
    }

    pub(crate) fn options_for(&self, target: NodeId) -> Option<WatchOptions> {
        self.inner
            .lock()
            .watches
            .values()
            .find(|r| r.target == target)
            .map(|r| r.options.clone())
    }
}

impl VisibilityWatch for FakeWatch {
    fn observe(
        &self,
        target: NodeId,
        options: &WatchOptions,
        callback: WatchCallback,
    ) -> SiteResult<WatchId> {
        if self.fail_observe {
            return Err(SiteError::invalid("watch unavailable"));
        }

        let id = {
            let mut inner = self.inner.lock();
            inner.counter += 1;
            let id = inner.counter;
            inner.watches.insert(
                id,
                Registration {
                    target,
                    options: options.clone(),
                    callback: callback.clone(),
                },
            );
            id
        };

        if let Some(report) = self.report_on_observe {
            callback(report);
        }
        Ok(id)
    }

    fn disconnect(&self, id: WatchId) {
        let mut inner = self.inner.lock();
        if inner.watches.remove(&id).is_some() {
            inner.disconnects += 1;
        }
    }
}
