//! Element attributes.

use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Attributes of one element, kept in the order they were first set.
///
/// Boolean attributes hold an empty value and serialize as a bare name,
/// so `muted` renders as `muted` rather than `muted=""`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMap {
    attrs: IndexMap<Arc<str>, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Overwriting keeps the original position.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.attrs.get_mut(name) {
            Some(existing) => {
                existing.clear();
                existing.push_str(value);
            }
            None => {
                self.attrs.insert(Arc::from(name), value.to_owned());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Remove, shifting later attributes up.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.attrs.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(name, value)| (&**name, value.as_str()))
    }

    /// `data-*` lookup by unprefixed name: `data("src")` reads `data-src`.
    pub fn data(&self, name: &str) -> Option<&str> {
        self.get(&format!("data-{}", name.to_ascii_lowercase()))
    }

    /// Space-separated attribute list as it appears inside a start tag.
    pub fn to_html(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if value.is_empty() {
                f.write_str(name)?;
            } else {
                write!(f, "{name}=\"{}\"", escape_attribute(value))?;
            }
        }
        Ok(())
    }
}

/// Escape a value for a double-quoted attribute. Borrows when nothing
/// needs escaping.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
