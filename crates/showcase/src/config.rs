//! Showcase configuration and scene description.

use common::{Rect, SiteError, SiteResult};
use lazy_media::{LazyVideoProps, WatchOptions};
use media::AutoplayPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Smallest scroll step, in pixels.
pub const MIN_SCROLL_STEP: f64 = 1.0;

/// Showcase run configuration.
#[derive(Clone, Debug)]
pub struct ShowcaseConfig {
    /// Viewport width.
    pub viewport_width: u32,
    /// Viewport height.
    pub viewport_height: u32,
    /// Pixels scrolled between observation passes.
    pub scroll_step: f64,
    /// Autoplay policy applied to every media element.
    pub autoplay_policy: AutoplayPolicy,
    /// Base for resolving relative media paths.
    pub base_url: Option<Url>,
    /// Watch options for every lazy video.
    pub watch: WatchOptions,
}

impl ShowcaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phone-sized viewport.
    pub fn mobile() -> Self {
        Self {
            viewport_width: 375,
            viewport_height: 812,
            ..Self::default()
        }
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set scroll step. Steps below [`MIN_SCROLL_STEP`] are rejected.
    pub fn with_scroll_step(mut self, step: f64) -> SiteResult<Self> {
        if !(step.is_finite() && step >= MIN_SCROLL_STEP) {
            return Err(SiteError::config(format!(
                "scroll step must be at least {MIN_SCROLL_STEP}px, got {step}"
            )));
        }
        self.scroll_step = step;
        Ok(self)
    }

    pub fn with_autoplay_policy(mut self, policy: AutoplayPolicy) -> Self {
        self.autoplay_policy = policy;
        self
    }

    pub fn with_base_url(mut self, base: &str) -> SiteResult<Self> {
        let url = Url::parse(base).map_err(|e| SiteError::parse(format!("{base}: {e}")))?;
        self.base_url = Some(url);
        Ok(self)
    }
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            scroll_step: 100.0,
            autoplay_policy: AutoplayPolicy::default(),
            base_url: None,
            watch: WatchOptions::lazy_media(),
        }
    }
}

/// One media slot on the page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaSlot {
    /// Slot identifier used in reports.
    pub id: String,
    /// Page section the slot belongs to.
    #[serde(default)]
    pub section: String,
    /// Layout box in document coordinates.
    pub layout: Rect,
    #[serde(flatten)]
    pub props: LazyVideoProps,
}

/// Media slots of a page plus its total height.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Document height; the lowest slot bottom is used when smaller.
    #[serde(default)]
    pub document_height: f64,
    pub slots: Vec<MediaSlot>,
}

const CLIP_CLASS: &str = "w-full h-auto object-cover aspect-[9/16]";

impl Scene {
    /// Media slots of the FashionFactory landing page: the hero "you get"
    /// clip and six social-proof results further down.
    pub fn landing() -> Self {
        let mut slots = vec![MediaSlot {
            id: "hero-after".to_string(),
            section: "hero".to_string(),
            layout: Rect::new(680.0, 180.0, 360.0, 640.0),
            props: LazyVideoProps::background("assets/hero/hero-after.mp4")
                .with_class_name(CLIP_CLASS),
        }];

        for n in 1..=6 {
            let column = ((n - 1) % 3) as f64;
            let row = ((n - 1) / 3) as f64;
            slots.push(MediaSlot {
                id: format!("social-proof-{n}"),
                section: "social-proof".to_string(),
                layout: Rect::new(80.0 + column * 400.0, 1600.0 + row * 900.0, 360.0, 640.0),
                props: LazyVideoProps::background(format!("assets/social-proof/{n}-after.mp4"))
                    .with_class_name(CLIP_CLASS)
                    .with_poster(&format!("assets/social-proof/{n}-before.webp")),
            });
        }

        Self {
            document_height: 7200.0,
            slots,
        }
    }

    pub fn from_json(json: &str) -> SiteResult<Self> {
        serde_json::from_str(json).map_err(|e| SiteError::config(format!("invalid scene: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> SiteResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Resolve relative media and poster paths against `base`.
    /// Empty sources are left untouched.
    pub fn resolve_against(&mut self, base: &Url) -> SiteResult<()> {
        let join = |path: &str| -> SiteResult<String> {
            base.join(path)
                .map(String::from)
                .map_err(|e| SiteError::parse(format!("{path}: {e}")))
        };

        for slot in &mut self.slots {
            if !slot.props.src.is_empty() {
                slot.props.src = join(&slot.props.src)?;
            }
            if let Some(poster) = slot.props.poster.take() {
                slot.props.poster = Some(join(&poster)?);
            }
        }
        Ok(())
    }
}
