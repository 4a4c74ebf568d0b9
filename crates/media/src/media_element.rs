//! HTMLMediaElement implementation for `<video>`.
//!
//! Content attributes live on the shared DOM element so that serializing
//! the tree reflects them; load and playback state is kept alongside.

use crate::policy::AutoplayPolicy;
use dom::{ElementData, ElementRef, TagName};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Media element (video).
#[derive(Debug)]
pub struct MediaElement {
    /// Backing DOM element.
    element: ElementRef,
    /// Current source URL (set by the load algorithm).
    current_src: RwLock<String>,
    /// Network state.
    network_state: RwLock<MediaNetworkState>,
    /// Paused flag.
    paused: RwLock<bool>,
    /// Error.
    error: RwLock<Option<MediaError>>,
    /// Autoplay policy of the embedding surface.
    policy: RwLock<AutoplayPolicy>,
    load_count: AtomicUsize,
    play_attempts: AtomicUsize,
}

impl MediaElement {
    /// Create a new `<video>` element.
    pub fn new() -> Self {
        Self {
            element: ElementData::new(TagName::video()).into_ref(),
            current_src: RwLock::new(String::new()),
            network_state: RwLock::new(MediaNetworkState::Empty),
            paused: RwLock::new(true),
            error: RwLock::new(None),
            policy: RwLock::new(AutoplayPolicy::default()),
            load_count: AtomicUsize::new(0),
            play_attempts: AtomicUsize::new(0),
        }
    }

    /// Shared handle to the DOM element, for mounting into a tree.
    pub fn element(&self) -> ElementRef {
        self.element.clone()
    }

    /// Serialize the element.
    pub fn outer_html(&self) -> String {
        self.element.read().outer_html()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.element.read().get_attribute(name).map(str::to_string)
    }

    fn flag(&self, name: &str) -> bool {
        self.element.read().has_attribute(name)
    }

    fn set_flag(&self, name: &str, present: bool) {
        self.element.write().toggle_attribute(name, present);
    }

    // Source attributes

    /// Get src attribute.
    pub fn src(&self) -> Option<String> {
        self.attribute("src")
    }

    /// Bind the src attribute. Does not run the load algorithm.
    pub fn set_src(&self, src: &str) {
        self.element.write().set_attribute("src", src);
    }

    /// Get a `data-*` attribute.
    pub fn dataset(&self, name: &str) -> Option<String> {
        self.element.read().dataset(name).map(str::to_string)
    }

    /// Set a `data-*` attribute.
    pub fn set_dataset(&self, name: &str, value: &str) {
        self.element
            .write()
            .set_attribute(&format!("data-{}", name), value);
    }

    /// Get current src.
    pub fn current_src(&self) -> String {
        self.current_src.read().clone()
    }

    pub fn class_name(&self) -> String {
        self.attribute("class").unwrap_or_default()
    }

    /// Set the class attribute. An empty value removes it.
    pub fn set_class_name(&self, class: &str) {
        let mut element = self.element.write();
        if class.is_empty() {
            element.remove_attribute("class");
        } else {
            element.set_attribute("class", class);
        }
    }

    pub fn poster(&self) -> Option<String> {
        self.attribute("poster")
    }

    pub fn set_poster(&self, poster: Option<&str>) {
        let mut element = self.element.write();
        match poster {
            Some(url) => element.set_attribute("poster", url),
            None => {
                element.remove_attribute("poster");
            }
        }
    }

    /// Get preload hint. Missing or unknown values map to `Auto`.
    pub fn preload(&self) -> Preload {
        self.attribute("preload")
            .and_then(|v| v.parse().ok())
            .unwrap_or(Preload::Auto)
    }

    pub fn set_preload(&self, preload: Preload) {
        self.element.write().set_attribute("preload", preload.as_str());
    }

    pub fn loop_(&self) -> bool {
        self.flag("loop")
    }

    pub fn set_loop(&self, loop_: bool) {
        self.set_flag("loop", loop_);
    }

    pub fn muted(&self) -> bool {
        self.flag("muted")
    }

    pub fn set_muted(&self, muted: bool) {
        self.set_flag("muted", muted);
    }

    pub fn plays_inline(&self) -> bool {
        self.flag("playsinline")
    }

    pub fn set_plays_inline(&self, plays_inline: bool) {
        self.set_flag("playsinline", plays_inline);
    }

    // State

    /// Get network state.
    pub fn network_state(&self) -> MediaNetworkState {
        *self.network_state.read()
    }

    /// Check if paused.
    pub fn paused(&self) -> bool {
        *self.paused.read()
    }

    /// Get error.
    pub fn error(&self) -> Option<MediaError> {
        self.error.read().clone()
    }

    pub fn autoplay_policy(&self) -> AutoplayPolicy {
        *self.policy.read()
    }

    pub fn set_autoplay_policy(&self, policy: AutoplayPolicy) {
        *self.policy.write() = policy;
    }

    /// Number of times the load algorithm ran.
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Number of `play()` calls, successful or not.
    pub fn play_attempts(&self) -> usize {
        self.play_attempts.load(Ordering::SeqCst)
    }

    // Methods

    /// Run the load algorithm against the current src attribute.
    pub fn load(&self) {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        *self.paused.write() = true;

        let src = self.src().unwrap_or_default();
        if src.is_empty() {
            *self.network_state.write() = MediaNetworkState::NoSource;
            *self.error.write() = Some(MediaError::SrcNotSupported);
        } else {
            *self.network_state.write() = MediaNetworkState::Loading;
            *self.error.write() = None;
        }
        tracing::trace!(src = %src, "media load");
        *self.current_src.write() = src;
    }

    /// Request playback.
    pub fn play(&self) -> Result<(), PlaybackError> {
        self.play_attempts.fetch_add(1, Ordering::SeqCst);

        if self.current_src.read().is_empty() {
            return Err(PlaybackError::NoSource);
        }
        if !self.autoplay_policy().permits(self.muted()) {
            return Err(PlaybackError::NotAllowed);
        }
        *self.paused.write() = false;
        Ok(())
    }

    /// Pause the media.
    pub fn pause(&self) {
        *self.paused.write() = true;
    }
}

impl Default for MediaElement {
    fn default() -> Self {
        Self::new()
    }
}

/// Media network state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaNetworkState {
    /// Not initialized.
    Empty = 0,
    /// Loading.
    Loading = 2,
    /// No source found.
    NoSource = 3,
}

/// Preload hint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    /// Don't preload.
    #[default]
    None,
    /// Preload metadata only.
    Metadata,
    /// Preload entire resource.
    Auto,
}

impl Preload {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preload::None => "none",
            Preload::Metadata => "metadata",
            Preload::Auto => "auto",
        }
    }
}

impl FromStr for Preload {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Preload::None),
            "metadata" => Ok(Preload::Metadata),
            "auto" | "" => Ok(Preload::Auto),
            other => Err(format!("unknown preload hint: {other}")),
        }
    }
}

/// Resource error recorded by the load algorithm. Fetch and decode
/// failures belong to the decoding layer and never reach this element.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("Source not supported")]
    SrcNotSupported,
}

impl MediaError {
    /// `MediaError.code` as exposed to page code.
    pub fn code(&self) -> u16 {
        match self {
            MediaError::SrcNotSupported => 4,
        }
    }
}

/// Rejection of a `play()` request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("play() request not allowed by autoplay policy")]
    NotAllowed,

    #[error("no source to play")]
    NoSource,
}
