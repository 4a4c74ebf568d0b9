//! DOM Tree implementation.
//!
//! A flat rendering surface: elements are mounted with a layout box in
//! document coordinates and unmounted when their owner goes away.

use crate::element::ElementRef;
use crate::window::Window;
use common::Rect;
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! {
    /// Unique identifier for a mounted node.
    pub struct NodeId;
}

struct Node {
    element: ElementRef,
    layout: Rect,
}

/// The DOM tree structure.
#[derive(Default)]
pub struct DomTree {
    nodes: SlotMap<NodeId, Node>,
    /// Mount order, used for serialization.
    order: Vec<NodeId>,
}

impl DomTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount an element with its layout box.
    pub fn append(&mut self, element: ElementRef, layout: Rect) -> NodeId {
        let id = self.nodes.insert(Node { element, layout });
        self.order.push(id);
        tracing::trace!(?id, ?layout, "mounted element");
        id
    }

    /// Unmount a node, returning its element.
    pub fn remove(&mut self, id: NodeId) -> Option<ElementRef> {
        let node = self.nodes.remove(id)?;
        self.order.retain(|&n| n != id);
        tracing::trace!(?id, "unmounted element");
        Some(node.element)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bottom edge of the lowest layout box.
    pub fn document_height(&self) -> f64 {
        self.nodes
            .values()
            .map(|n| n.layout.bottom())
            .fold(0.0, f64::max)
    }

    /// Layout boxes translated into the window's client coordinates.
    pub fn client_rects(&self, window: &Window) -> HashMap<NodeId, Rect> {
        self.nodes
            .iter()
            .map(|(id, node)| (id, window.to_client(&node.layout)))
            .collect()
    }

    /// Serialize mounted elements in mount order.
    pub fn to_html(&self) -> String {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(*id))
            .map(|node| node.element.read().outer_html())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
