//! Showcase page: lazy videos laid out on a scrolling surface.

use std::fmt;
use std::sync::Arc;

use common::SiteResult;
use dom::{DomTree, NodeId, Window};
use lazy_media::{LazyVideo, VisibilityState};
use serde::Serialize;
use tracing::{debug, info};
use web_apis::IntersectionObserverController;

use crate::config::{MediaSlot, Scene, ShowcaseConfig, MIN_SCROLL_STEP};

struct MountedVideo {
    slot: MediaSlot,
    video: LazyVideo,
    node: Option<NodeId>,
    /// Scroll offset of the pass that triggered the load.
    loaded_at: Option<f64>,
}

impl MountedVideo {
    /// A triggered video has its source bound and its load started.
    fn is_loaded(&self) -> bool {
        let media = self.video.media();
        media.src().is_some() && media.load_count() > 0
    }
}

/// A page of lazy videos driven by a simulated viewport.
pub struct ShowcasePage {
    config: ShowcaseConfig,
    tree: DomTree,
    window: Window,
    observers: Arc<IntersectionObserverController>,
    videos: Vec<MountedVideo>,
    document_height: f64,
    passes: usize,
}

impl ShowcasePage {
    /// Create the page. Nothing is mounted yet.
    pub fn new(config: ShowcaseConfig, scene: Scene) -> Self {
        let videos = scene
            .slots
            .into_iter()
            .map(|slot| {
                let video = LazyVideo::with_options(slot.props.clone(), config.watch.clone());
                video.media().set_autoplay_policy(config.autoplay_policy);
                MountedVideo {
                    slot,
                    video,
                    node: None,
                    loaded_at: None,
                }
            })
            .collect();

        Self {
            window: Window::new(config.viewport_width, config.viewport_height),
            config,
            tree: DomTree::new(),
            observers: Arc::new(IntersectionObserverController::new()),
            videos,
            document_height: scene.document_height,
            passes: 0,
        }
    }

    /// Mount every video into the tree and attach its watch.
    pub fn mount_all(&mut self) -> SiteResult<()> {
        for entry in &mut self.videos {
            let node = self.tree.append(entry.video.element(), entry.slot.layout);
            entry.node = Some(node);
            entry.video.mount(node, self.observers.clone())?;
            debug!(slot = %entry.slot.id, "video mounted");
        }
        Ok(())
    }

    /// Run one observation pass at the current scroll offset.
    pub fn process(&mut self) -> usize {
        let delivered = self
            .observers
            .process(&self.window.viewport(), &self.tree.client_rects(&self.window));
        self.passes += 1;

        let scroll_y = self.window.scroll_y;
        for entry in &mut self.videos {
            if entry.loaded_at.is_none() && entry.is_loaded() {
                entry.loaded_at = Some(scroll_y);
                info!(
                    slot = %entry.slot.id,
                    src = %entry.slot.props.src,
                    scroll_y,
                    playing = !entry.video.media().paused(),
                    "video loaded"
                );
            }
        }
        delivered
    }

    pub fn scroll_to(&mut self, y: f64) {
        let max = self.max_scroll();
        self.window.scroll_to(0.0, y.min(max));
    }

    /// Process once at the top, then scroll to the bottom in configured steps,
    /// processing after each step.
    pub fn scroll_through(&mut self) {
        self.scroll_to(0.0);
        self.process();

        let step = self.config.scroll_step.max(MIN_SCROLL_STEP);
        let max = self.max_scroll();
        while self.window.scroll_y < max {
            let before = self.window.scroll_y;
            self.scroll_to(before + step);
            if self.window.scroll_y <= before {
                break;
            }
            self.process();
        }
    }

    /// Unmount every video and remove it from the tree.
    pub fn unmount_all(&mut self) {
        for entry in &mut self.videos {
            entry.video.unmount();
            if let Some(node) = entry.node.take() {
                self.tree.remove(node);
            }
        }
    }

    fn max_scroll(&self) -> f64 {
        let height = self.document_height.max(self.tree.document_height());
        self.window.max_scroll_y(height)
    }

    pub fn live_observers(&self) -> usize {
        self.observers.live_observers()
    }

    pub fn to_html(&self) -> String {
        self.tree.to_html()
    }

    /// Summarize the run.
    pub fn report(&self) -> ShowcaseReport {
        ShowcaseReport {
            viewport: (self.config.viewport_width, self.config.viewport_height),
            passes: self.passes,
            live_observers: self.live_observers(),
            videos: self
                .videos
                .iter()
                .map(|entry| {
                    let media = entry.video.media();
                    VideoReport {
                        id: entry.slot.id.clone(),
                        section: entry.slot.section.clone(),
                        src: entry.slot.props.src.clone(),
                        loaded: entry.is_loaded(),
                        loaded_at: entry.loaded_at,
                        playing: !media.paused(),
                        load_count: media.load_count(),
                        play_attempts: media.play_attempts(),
                        watch: entry.video.visibility_state(),
                    }
                })
                .collect(),
        }
    }
}

/// Outcome of one video.
#[derive(Clone, Debug, Serialize)]
pub struct VideoReport {
    pub id: String,
    pub section: String,
    pub src: String,
    pub loaded: bool,
    pub loaded_at: Option<f64>,
    pub playing: bool,
    pub load_count: usize,
    pub play_attempts: usize,
    pub watch: VisibilityState,
}

/// Outcome of a showcase run.
#[derive(Clone, Debug, Serialize)]
pub struct ShowcaseReport {
    pub viewport: (u32, u32),
    pub passes: usize,
    /// Observers still registered when the report was taken.
    pub live_observers: usize,
    pub videos: Vec<VideoReport>,
}

impl ShowcaseReport {
    pub fn loaded_count(&self) -> usize {
        self.videos.iter().filter(|v| v.loaded).count()
    }
}

impl fmt::Display for ShowcaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "viewport {}x{}, {} observation passes",
            self.viewport.0, self.viewport.1, self.passes
        )?;
        for video in &self.videos {
            let at = match video.loaded_at {
                Some(y) => format!("loaded at scroll {y:.0}px"),
                None => "not loaded".to_string(),
            };
            writeln!(
                f,
                "  {:<16} {:<44} {:<24} {}",
                video.id,
                video.src,
                at,
                if video.playing { "playing" } else { "paused" }
            )?;
        }
        write!(
            f,
            "{}/{} loaded, {} live observers",
            self.loaded_count(),
            self.videos.len(),
            self.live_observers
        )
    }
}
