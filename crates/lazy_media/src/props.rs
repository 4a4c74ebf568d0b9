//! Construction inputs for a lazy video.

use media::Preload;
use serde::{Deserialize, Serialize};

/// Lazy video properties.
///
/// Nothing here is validated: the source and poster are opaque URIs handed
/// to the media layer as given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LazyVideoProps {
    /// Deferred source, bound on first approach into view.
    pub src: String,
    /// CSS classes for the rendered element.
    #[serde(default)]
    pub class_name: String,
    /// Attempt playback right after the load starts.
    #[serde(default, alias = "autoplay")]
    pub auto_play: bool,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default, alias = "playsinline")]
    pub plays_inline: bool,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub preload: Preload,
}

impl LazyVideoProps {
    /// Create properties for the given source with everything else off.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            class_name: String::new(),
            auto_play: false,
            looping: false,
            muted: false,
            plays_inline: false,
            poster: None,
            preload: Preload::None,
        }
    }

    /// The configuration used for background showcase clips:
    /// autoplay, loop, muted, inline, metadata preload.
    pub fn background(src: impl Into<String>) -> Self {
        Self::new(src)
            .with_auto_play(true)
            .with_loop(true)
            .with_muted(true)
            .with_plays_inline(true)
            .with_preload(Preload::Metadata)
    }

    pub fn with_class_name(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self
    }

    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn with_plays_inline(mut self, plays_inline: bool) -> Self {
        self.plays_inline = plays_inline;
        self
    }

    pub fn with_poster(mut self, poster: &str) -> Self {
        self.poster = Some(poster.to_string());
        self
    }

    pub fn with_preload(mut self, preload: Preload) -> Self {
        self.preload = preload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let props = LazyVideoProps::new("clip.mp4");
        assert!(!props.auto_play);
        assert!(!props.looping);
        assert!(!props.muted);
        assert!(!props.plays_inline);
        assert_eq!(props.poster, None);
        assert_eq!(props.preload, Preload::None);
        assert_eq!(props.class_name, "");
    }

    #[test]
    fn test_background_preset() {
        let props = LazyVideoProps::background("hero.mp4");
        assert!(props.auto_play && props.looping && props.muted && props.plays_inline);
        assert_eq!(props.preload, Preload::Metadata);
    }

    #[test]
    fn test_deserialize() {
        let props: LazyVideoProps = serde_json::from_str(
            r#"{"src": "after.mp4", "autoPlay": true, "loop": true, "playsInline": true,
                "className": "aspect-[9/16]", "preload": "metadata"}"#,
        )
        .unwrap();

        assert_eq!(props.src, "after.mp4");
        assert!(props.auto_play);
        assert!(props.looping);
        assert!(!props.muted);
        assert!(props.plays_inline);
        assert_eq!(props.class_name, "aspect-[9/16]");
        assert_eq!(props.preload, Preload::Metadata);

        let minimal: LazyVideoProps = serde_json::from_str(r#"{"src": ""}"#).unwrap();
        assert_eq!(minimal, LazyVideoProps::new(""));
    }

    #[test]
    fn test_deserialize_requires_src() {
        assert!(serde_json::from_str::<LazyVideoProps>(r#"{"muted": true}"#).is_err());
    }
}
