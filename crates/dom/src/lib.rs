//! DOM element model and rendering surface.
//!
//! This crate provides the elements emitted by page components, the tree
//! they are mounted into, and the window whose viewport scrolls over them.

pub mod attributes;
pub mod element;
pub mod tree;
pub mod window;

pub use attributes::AttributeMap;
pub use element::{ElementData, ElementRef, TagName};
pub use tree::{DomTree, NodeId};
pub use window::Window;
