//! DOM Element implementation.

use crate::attributes::AttributeMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to an element, held by both the tree and the component
/// that emitted it.
pub type ElementRef = Arc<RwLock<ElementData>>;

/// Tag names interned for cheap cloning and comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagName(Arc<str>);

impl TagName {
    pub fn new(name: &str) -> Self {
        static INTERNED: Lazy<RwLock<HashMap<String, Arc<str>>>> =
            Lazy::new(|| RwLock::new(HashMap::new()));

        let lower = name.to_ascii_lowercase();

        {
            let cache = INTERNED.read();
            if let Some(s) = cache.get(&lower) {
                return TagName(s.clone());
            }
        }

        let mut cache = INTERNED.write();
        let s = cache
            .entry(lower.clone())
            .or_insert_with(|| Arc::from(lower.as_str()))
            .clone();
        TagName(s)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn img() -> Self {
        Self::new("img")
    }
    pub fn video() -> Self {
        Self::new("video")
    }

    /// Void elements have no closing tag.
    pub fn is_void(&self) -> bool {
        matches!(
            self.as_str(),
            "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
                | "param" | "source" | "track" | "wbr"
        )
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for TagName {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == other.to_ascii_lowercase()
    }
}

/// Element-specific data.
#[derive(Clone, Debug)]
pub struct ElementData {
    /// Tag name (lowercase).
    pub tag_name: TagName,
    /// Attributes.
    pub attributes: AttributeMap,
    /// Class list (cached).
    pub class_list: SmallVec<[Arc<str>; 4]>,
}

impl ElementData {
    pub fn new(tag_name: TagName) -> Self {
        Self {
            tag_name,
            attributes: AttributeMap::new(),
            class_list: SmallVec::new(),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> ElementRef {
        Arc::new(RwLock::new(self))
    }

    /// Set an attribute, updating cached values.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name_lower = name.to_ascii_lowercase();
        if name_lower == "class" {
            self.class_list = value.split_whitespace().map(|s| Arc::from(s)).collect();
        }
        self.attributes.set(&name_lower, value);
    }

    /// Add or remove a boolean attribute.
    pub fn toggle_attribute(&mut self, name: &str, present: bool) {
        if present {
            self.set_attribute(name, "");
        } else {
            self.remove_attribute(name);
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(&name.to_ascii_lowercase())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(&name.to_ascii_lowercase())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let name_lower = name.to_ascii_lowercase();
        if name_lower == "class" {
            self.class_list.clear();
        }
        self.attributes.remove(&name_lower)
    }

    /// Read a `data-*` attribute (the element's dataset).
    pub fn dataset(&self, name: &str) -> Option<&str> {
        self.attributes.data(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list.iter().any(|c| c.as_ref() == class)
    }

    /// Serialize the element as an HTML fragment.
    pub fn outer_html(&self) -> String {
        let mut html = format!("<{}", self.tag_name);
        if !self.attributes.is_empty() {
            html.push(' ');
            html.push_str(&self.attributes.to_html());
        }
        html.push('>');
        if !self.tag_name.is_void() {
            html.push_str(&format!("</{}>", self.tag_name));
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_interning() {
        let a = TagName::new("VIDEO");
        let b = TagName::video();
        assert_eq!(a, b);
        assert_eq!(a, "video");
    }

    #[test]
    fn test_class_list_cache() {
        let mut elem = ElementData::new(TagName::video());
        elem.set_attribute("class", "w-full  object-cover");
        assert!(elem.has_class("w-full"));
        assert!(elem.has_class("object-cover"));

        elem.remove_attribute("class");
        assert!(!elem.has_class("w-full"));
    }

    #[test]
    fn test_toggle_attribute() {
        let mut elem = ElementData::new(TagName::video());
        elem.toggle_attribute("muted", true);
        assert!(elem.has_attribute("muted"));
        elem.toggle_attribute("muted", false);
        assert!(!elem.has_attribute("muted"));
    }

    #[test]
    fn test_outer_html() {
        let mut elem = ElementData::new(TagName::video());
        elem.set_attribute("data-src", "clip.mp4");
        elem.toggle_attribute("loop", true);
        assert_eq!(elem.dataset("src"), Some("clip.mp4"));
        assert_eq!(elem.outer_html(), r#"<video data-src="clip.mp4" loop></video>"#);

        let img = ElementData::new(TagName::img());
        assert_eq!(img.outer_html(), "<img>");
    }
}
