//! Lazy video component.

use crate::props::LazyVideoProps;
use crate::watch::{VisibilityReport, VisibilityWatch, WatchCallback, WatchId, WatchOptions};
use common::SiteResult;
use dom::{ElementRef, NodeId};
use media::MediaElement;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Lifecycle of the visibility watch (not of the media).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityState {
    /// No watch attached.
    Unobserved,
    /// Watch attached, waiting for the element to approach the viewport.
    Observing,
    /// The one-time load fired and the watch was released.
    Triggered,
}

#[derive(Debug)]
struct LoaderState {
    /// Flips to true once and never back.
    loaded: bool,
    visibility: VisibilityState,
    watch_id: Option<WatchId>,
}

/// A video whose source is bound only when it first nears the viewport.
pub struct LazyVideo {
    props: LazyVideoProps,
    options: WatchOptions,
    media: Arc<MediaElement>,
    state: Arc<Mutex<LoaderState>>,
    watch: Option<Arc<dyn VisibilityWatch>>,
}

impl LazyVideo {
    /// Create a lazy video with the standard 50px / 10% watch.
    pub fn new(props: LazyVideoProps) -> Self {
        Self::with_options(props, WatchOptions::lazy_media())
    }

    /// Create a lazy video with custom watch options.
    pub fn with_options(props: LazyVideoProps, options: WatchOptions) -> Self {
        let media = MediaElement::new();
        media.set_dataset("src", &props.src);
        media.set_class_name(&props.class_name);
        media.set_loop(props.looping);
        media.set_muted(props.muted);
        media.set_plays_inline(props.plays_inline);
        media.set_poster(props.poster.as_deref());
        media.set_preload(props.preload);

        Self {
            props,
            options,
            media: Arc::new(media),
            state: Arc::new(Mutex::new(LoaderState {
                loaded: false,
                visibility: VisibilityState::Unobserved,
                watch_id: None,
            })),
            watch: None,
        }
    }

    /// The rendered media element.
    pub fn media(&self) -> &Arc<MediaElement> {
        &self.media
    }

    /// DOM handle of the rendered element, for mounting into a tree.
    pub fn element(&self) -> ElementRef {
        self.media.element()
    }

    /// Serialize the rendered element in its current state.
    pub fn render(&self) -> String {
        self.media.outer_html()
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    pub fn visibility_state(&self) -> VisibilityState {
        self.state.lock().visibility
    }

    /// Attach the visibility watch for the element mounted at `node`.
    ///
    /// No-op when a watch is already live or the load has already fired.
    pub fn mount(&mut self, node: NodeId, watch: Arc<dyn VisibilityWatch>) -> SiteResult<()> {
        {
            let mut state = self.state.lock();
            if state.visibility != VisibilityState::Unobserved {
                return Ok(());
            }
            state.visibility = VisibilityState::Observing;
        }

        let callback = self.trigger_callback(Arc::downgrade(&watch));
        let id = match watch.observe(node, &self.options, callback) {
            Ok(id) => id,
            Err(err) => {
                self.state.lock().visibility = VisibilityState::Unobserved;
                return Err(err);
            }
        };

        let mut state = self.state.lock();
        if state.visibility == VisibilityState::Triggered {
            // Fired from inside observe(), before the id was known.
            watch.disconnect(id);
        } else {
            state.watch_id = Some(id);
            self.watch = Some(watch);
        }
        Ok(())
    }

    /// Release the watch. Safe to call repeatedly and before any trigger.
    pub fn unmount(&mut self) {
        let id = {
            let mut state = self.state.lock();
            if state.visibility == VisibilityState::Observing {
                state.visibility = VisibilityState::Unobserved;
            }
            state.watch_id.take()
        };

        if let Some(watch) = self.watch.take() {
            if let Some(id) = id {
                watch.disconnect(id);
            }
        }
    }

    fn trigger_callback(&self, watch: Weak<dyn VisibilityWatch>) -> WatchCallback {
        let state = self.state.clone();
        let media = self.media.clone();
        let auto_play = self.props.auto_play;
        let threshold = self.options.threshold;

        Arc::new(move |report: VisibilityReport| {
            // The guard check, the load, and the disconnect happen under one lock.
            let mut state = state.lock();
            if state.loaded || state.visibility != VisibilityState::Observing {
                return;
            }
            if !report.reaches(threshold) {
                return;
            }

            let src = media.dataset("src").unwrap_or_default();
            media.set_src(&src);
            media.load();
            state.loaded = true;
            debug!(src = %src, ratio = report.intersection_ratio, "lazy video triggered");

            if auto_play {
                if let Err(err) = media.play() {
                    trace!(src = %src, error = %err, "autoplay rejected");
                }
            }

            state.visibility = VisibilityState::Triggered;
            if let Some(id) = state.watch_id.take() {
                if let Some(watch) = watch.upgrade() {
                    watch.disconnect(id);
                }
            }
        })
    }
}

impl Drop for LazyVideo {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for LazyVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyVideo")
            .field("src", &self.props.src)
            .field("state", &*self.state.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeWatch;
    use common::Rect;
    use dom::{DomTree, Window};
    use media::{AutoplayPolicy, Preload};
    use web_apis::IntersectionObserverController;

    fn mounted(tree: &mut DomTree, video: &LazyVideo, layout: Rect) -> NodeId {
        tree.append(video.element(), layout)
    }

    #[test]
    fn test_render_before_trigger() {
        let video = LazyVideo::new(
            LazyVideoProps::new("clip.mp4")
                .with_class_name("w-full h-auto")
                .with_loop(true)
                .with_muted(true)
                .with_plays_inline(true)
                .with_poster("poster.webp"),
        );

        assert_eq!(
            video.render(),
            r#"<video data-src="clip.mp4" class="w-full h-auto" loop muted playsinline poster="poster.webp" preload="none"></video>"#
        );
        assert!(video.media().src().is_none());
        assert_eq!(video.visibility_state(), VisibilityState::Unobserved);
    }

    #[test]
    fn test_scenario_single_trigger() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        let mut video = LazyVideo::new(
            LazyVideoProps::new("clip.mp4")
                .with_auto_play(true)
                .with_preload(Preload::None),
        );
        let node = mounted(&mut tree, &video, Rect::new(0.0, 2000.0, 320.0, 568.0));
        video.mount(node, watch.clone()).unwrap();
        video.media().set_autoplay_policy(AutoplayPolicy::Allowed);

        assert_eq!(watch.options_for(node), Some(WatchOptions::lazy_media()));
        assert_eq!(video.visibility_state(), VisibilityState::Observing);

        watch.emit(node, VisibilityReport::visible(0.1));

        let media = video.media();
        assert_eq!(media.src().as_deref(), Some("clip.mp4"));
        assert_eq!(media.load_count(), 1);
        assert_eq!(media.play_attempts(), 1);
        assert!(!media.paused());
        assert_eq!(watch.live(), 0);
        assert!(video.is_loaded());
        assert_eq!(video.visibility_state(), VisibilityState::Triggered);

        watch.emit(node, VisibilityReport::visible(1.0));
        assert_eq!(media.load_count(), 1);
        assert_eq!(media.play_attempts(), 1);
    }

    #[test]
    fn test_below_threshold_does_not_trigger() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4"));
        let node = mounted(&mut tree, &video, Rect::ZERO);
        video.mount(node, watch.clone()).unwrap();

        watch.emit(node, VisibilityReport::hidden());
        watch.emit(node, VisibilityReport::visible(0.05));

        assert!(!video.is_loaded());
        assert!(video.media().src().is_none());
        assert_eq!(video.media().load_count(), 0);
        assert_eq!(watch.live(), 1);
    }

    #[test]
    fn test_no_autoplay_never_plays() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4").with_muted(true));
        let node = mounted(&mut tree, &video, Rect::ZERO);
        video.mount(node, watch.clone()).unwrap();

        watch.emit(node, VisibilityReport::visible(0.5));

        assert_eq!(video.media().src().as_deref(), Some("clip.mp4"));
        assert_eq!(video.media().play_attempts(), 0);
        assert!(video.media().paused());
    }

    #[test]
    fn test_rejected_autoplay_is_swallowed() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        // Unmuted autoplay under the default muted-only policy is rejected.
        let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4").with_auto_play(true));
        let node = mounted(&mut tree, &video, Rect::ZERO);
        video.mount(node, watch.clone()).unwrap();

        watch.emit(node, VisibilityReport::visible(1.0));

        assert!(video.is_loaded());
        assert_eq!(video.media().src().as_deref(), Some("clip.mp4"));
        assert_eq!(video.media().play_attempts(), 1);
        assert!(video.media().paused());
        assert_eq!(watch.live(), 0);
    }

    #[test]
    fn test_unmount_before_trigger_releases_watch() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        let before = watch.live();

        let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4"));
        let node = mounted(&mut tree, &video, Rect::ZERO);
        video.mount(node, watch.clone()).unwrap();
        assert_eq!(watch.live(), before + 1);

        video.unmount();
        video.unmount();
        assert_eq!(watch.live(), before);
        assert_eq!(watch.disconnects(), 1);
        assert_eq!(video.visibility_state(), VisibilityState::Unobserved);

        watch.emit(node, VisibilityReport::visible(1.0));
        assert!(video.media().src().is_none());
    }

    #[test]
    fn test_drop_releases_watch() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        {
            let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4"));
            let node = mounted(&mut tree, &video, Rect::ZERO);
            video.mount(node, watch.clone()).unwrap();
            assert_eq!(watch.live(), 1);
        }
        assert_eq!(watch.live(), 0);
    }

    #[test]
    fn test_mount_twice_keeps_one_watch() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4"));
        let node = mounted(&mut tree, &video, Rect::ZERO);

        video.mount(node, watch.clone()).unwrap();
        video.mount(node, watch.clone()).unwrap();
        assert_eq!(watch.live(), 1);
    }

    #[test]
    fn test_no_remount_after_trigger() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4"));
        let node = mounted(&mut tree, &video, Rect::ZERO);
        video.mount(node, watch.clone()).unwrap();
        watch.emit(node, VisibilityReport::visible(1.0));

        video.unmount();
        video.mount(node, watch.clone()).unwrap();
        assert_eq!(watch.live(), 0);
        assert_eq!(video.visibility_state(), VisibilityState::Triggered);
        assert_eq!(video.media().load_count(), 1);
    }

    #[test]
    fn test_trigger_during_observe() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::reporting_on_observe(VisibilityReport::visible(1.0)));
        let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4"));
        let node = mounted(&mut tree, &video, Rect::ZERO);

        video.mount(node, watch.clone()).unwrap();
        assert!(video.is_loaded());
        assert_eq!(watch.live(), 0);
        assert_eq!(video.media().load_count(), 1);
    }

    #[test]
    fn test_failed_observe_leaves_unobserved() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::failing());
        let mut video = LazyVideo::new(LazyVideoProps::new("clip.mp4"));
        let node = mounted(&mut tree, &video, Rect::ZERO);

        assert!(video.mount(node, watch).is_err());
        assert_eq!(video.visibility_state(), VisibilityState::Unobserved);
    }

    #[test]
    fn test_empty_source_passes_through() {
        let mut tree = DomTree::new();
        let watch = Arc::new(FakeWatch::new());
        let mut video = LazyVideo::new(LazyVideoProps::new("").with_auto_play(true));
        let node = mounted(&mut tree, &video, Rect::ZERO);
        video.mount(node, watch.clone()).unwrap();

        watch.emit(node, VisibilityReport::visible(1.0));

        assert!(video.is_loaded());
        assert_eq!(video.media().src().as_deref(), Some(""));
        assert_eq!(video.media().load_count(), 1);
        assert!(video.media().error().is_some());
    }

    #[test]
    fn test_in_view_at_mount_fires_on_first_pass() {
        let controller = Arc::new(IntersectionObserverController::new());
        let mut tree = DomTree::new();
        let window = Window::new(375, 812);

        let mut video = LazyVideo::new(LazyVideoProps::background("hero.mp4"));
        let node = mounted(&mut tree, &video, Rect::new(0.0, 120.0, 375.0, 667.0));
        video.mount(node, controller.clone()).unwrap();
        assert_eq!(controller.live_observers(), 1);

        controller.process(&window.viewport(), &tree.client_rects(&window));

        assert!(video.is_loaded());
        assert!(!video.media().paused());
        assert_eq!(controller.live_observers(), 0);
    }

    #[test]
    fn test_margin_triggers_before_on_screen() {
        let controller = Arc::new(IntersectionObserverController::new());
        let mut tree = DomTree::new();
        let mut window = Window::new(800, 600);

        let mut video = LazyVideo::new(LazyVideoProps::new("later.mp4"));
        let node = mounted(&mut tree, &video, Rect::new(0.0, 1000.0, 400.0, 200.0));
        video.mount(node, controller.clone()).unwrap();

        controller.process(&window.viewport(), &tree.client_rects(&window));
        assert!(!video.is_loaded());

        // Element top at 620 in client space: 30px inside the margin, 15% visible.
        window.scroll_to(0.0, 380.0);
        controller.process(&window.viewport(), &tree.client_rects(&window));
        assert!(video.is_loaded());
        assert_eq!(video.media().current_src(), "later.mp4");
        assert!(video.render().contains(r#" src="later.mp4""#));

        window.scroll_to(0.0, 0.0);
        controller.process(&window.viewport(), &tree.client_rects(&window));
        window.scroll_to(0.0, 900.0);
        controller.process(&window.viewport(), &tree.client_rects(&window));
        assert_eq!(video.media().load_count(), 1);
    }

    #[test]
    fn test_never_visible_never_loads() {
        let controller = Arc::new(IntersectionObserverController::new());
        let mut tree = DomTree::new();
        let window = Window::new(800, 600);

        let mut video = LazyVideo::new(LazyVideoProps::new("footer.mp4"));
        let node = mounted(&mut tree, &video, Rect::new(0.0, 5000.0, 400.0, 200.0));
        video.mount(node, controller.clone()).unwrap();

        for _ in 0..3 {
            controller.process(&window.viewport(), &tree.client_rects(&window));
        }
        assert!(!video.is_loaded());
        assert_eq!(controller.live_observers(), 1);

        drop(video);
        assert_eq!(controller.live_observers(), 0);
    }
}
