// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Toolbar Page: a Kurbo-native, in-memory model of a rendered page.
//!
//! The page is a tree of elements with markup facts (tag, attributes, text),
//! host-computed layout boxes, transforms, and scroll offsets.
//! It answers the two questions an overlay engine asks of a live document:
//! "what elements exist, in document order?" and "where is this element on screen right now?".
//!
//! - Represents a hierarchy of elements rooted at a single document element.
//! - Hands out generational [`ElementId`] handles, so identity is never derived from content.
//! - Computes viewport rectangles on demand in [`Page::rect_of`], composing the ancestor chain's
//!   transforms, element scroll offsets, and the window scroll. Nothing is cached between calls.
//!
//! ## Not a layout engine
//!
//! This crate does not perform layout.
//! Upstream code is expected to compute boxes with whatever layout system it has and then update
//! the page with the resulting bounds, transforms, and scroll offsets.
//!
//! ## Detached elements
//!
//! Elements inserted without a parent, or detached with [`Page::detach`], stay alive but are not
//! part of the rendered document: [`Page::rect_of`] returns `None` for them and
//! [`Page::descendants`] of the document element does not visit them.
//!
//! ## Minimal usage
//!
//! ```
//! use toolbar_page::{ElementData, ElementFlags, Page};
//! use kurbo::{Rect, Size, Vec2};
//!
//! let mut page = Page::new("https://example.com/", Size::new(800.0, 600.0));
//! let body = page.insert(
//!     Some(page.document_element()),
//!     ElementData::new("body").with_bounds(Rect::new(0.0, 0.0, 800.0, 2000.0)),
//! );
//! let button = page.insert(
//!     Some(body),
//!     ElementData::new("button")
//!         .with_bounds(Rect::new(10.0, 500.0, 110.0, 530.0))
//!         .with_text("Sign up"),
//! );
//!
//! page.set_window_scroll(Vec2::new(0.0, 400.0));
//! assert_eq!(page.rect_of(button), Some(Rect::new(10.0, 100.0, 110.0, 130.0)));
//!
//! page.detach(button);
//! assert_eq!(page.rect_of(button), None);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod types;

pub use types::{ElementData, ElementFlags, ElementId};

use alloc::string::String;
use alloc::vec::Vec;
use kurbo::{Affine, Point, Rect, Size, Vec2};

#[derive(Clone, Debug)]
struct Node {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    data: ElementData,
}

impl Node {
    fn new(data: ElementData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }
}

/// An in-memory page: element tree, location, viewport, and window scroll.
pub struct Page {
    nodes: Vec<Option<Node>>,
    // Generation per slot; survives removal so reuse can bump it.
    generations: Vec<u32>,
    free_list: Vec<usize>,
    document: ElementId,
    location: String,
    viewport: Size,
    window_scroll: Vec2,
}

impl core::fmt::Debug for Page {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Page")
            .field("location", &self.location)
            .field("viewport", &self.viewport)
            .field("window_scroll", &self.window_scroll)
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Create a page at `location` whose document element (`html`) fills the viewport.
    pub fn new(location: impl Into<String>, viewport: Size) -> Self {
        let mut page = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            document: ElementId::new(0, 1),
            location: location.into(),
            viewport,
            window_scroll: Vec2::ZERO,
        };
        page.document = page.insert(
            None,
            ElementData::new("html").with_bounds(Rect::from_origin_size(Point::ZERO, viewport)),
        );
        page
    }

    /// The root element of the rendered document.
    pub fn document_element(&self) -> ElementId {
        self.document
    }

    /// Current page location (URL).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Change the page location, as a client-side navigation does.
    ///
    /// The element tree is left untouched; hosts mutate it separately.
    pub fn navigate(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    /// Current viewport size.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Resize the viewport. The document element's box is resized to match.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        let document = self.document;
        self.set_local_bounds(document, Rect::from_origin_size(Point::ZERO, viewport));
    }

    /// Current window scroll offset.
    pub fn window_scroll(&self) -> Vec2 {
        self.window_scroll
    }

    /// Scroll the window.
    pub fn set_window_scroll(&mut self, scroll: Vec2) {
        self.window_scroll = scroll;
    }

    /// Insert a new element as the last child of `parent` (or detached if `None`).
    pub fn insert(&mut self, parent: Option<ElementId>, data: ElementData) -> ElementId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx] + 1;
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(data));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(data)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = ElementId::new(idx, generation);
        if let Some(p) = parent.filter(|p| self.is_alive(*p)) {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove an element (and its subtree). Handles to removed elements become stale.
    ///
    /// The document element cannot be removed.
    pub fn remove(&mut self, id: ElementId) {
        if !self.is_alive(id) || id == self.document {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        let children = self.node(id).children.clone();
        for child in children {
            self.remove(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Move `id` under `new_parent` (appended as last child), or detach it if `None`.
    pub fn reparent(&mut self, id: ElementId, new_parent: Option<ElementId>) {
        if !self.is_alive(id) || id == self.document {
            return;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.is_ancestor_or_self(id, p))
        {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
    }

    /// Detach `id` from the document, keeping it (and its subtree) alive.
    pub fn detach(&mut self, id: ElementId) {
        self.reparent(id, None);
    }

    /// Update the layout box.
    pub fn set_local_bounds(&mut self, id: ElementId, bounds: Rect) {
        if let Some(node) = self.node_opt_mut(id) {
            node.data.local_bounds = bounds;
        }
    }

    /// Update the local transform.
    pub fn set_local_transform(&mut self, id: ElementId, transform: Affine) {
        if let Some(node) = self.node_opt_mut(id) {
            node.data.local_transform = transform;
        }
    }

    /// Scroll an element's content.
    pub fn set_scroll_offset(&mut self, id: ElementId, offset: Vec2) {
        if let Some(node) = self.node_opt_mut(id) {
            node.data.scroll_offset = offset;
        }
    }

    /// Update flags.
    pub fn set_flags(&mut self, id: ElementId, flags: ElementFlags) {
        if let Some(node) = self.node_opt_mut(id) {
            node.data.flags = flags;
        }
    }

    /// Replace the element's own text.
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(node) = self.node_opt_mut(id) {
            node.data.text = text.into();
        }
    }

    /// Add or replace an attribute.
    pub fn set_attribute(&mut self, id: ElementId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.node_opt_mut(id) {
            node.data.set_attribute(name.into(), value.into());
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attribute(&mut self, id: ElementId, name: &str) {
        if let Some(node) = self.node_opt_mut(id) {
            node.data.attributes.retain(|(n, _)| n != name);
        }
    }

    /// Returns true if `id` refers to a live (not removed) element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Returns true if `id` is live and its ancestor chain reaches the document element.
    pub fn is_attached(&self, id: ElementId) -> bool {
        self.is_alive(id) && self.is_ancestor_or_self(self.document, id)
    }

    /// Element data, if `id` is live.
    pub fn data(&self, id: ElementId) -> Option<&ElementData> {
        self.node_opt(id).map(|n| &n.data)
    }

    /// Parent element, if any.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Children in document order. Empty for stale handles.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.node_opt(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Attribute value, if the element is live and carries it.
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.data(id).and_then(|d| d.attribute(name))
    }

    /// Rendered text of the element and its descendants.
    ///
    /// Non-blank text runs are trimmed and joined with a single space, in document order.
    pub fn inner_text(&self, id: ElementId) -> String {
        let mut out = String::new();
        for el in self.descendants(id) {
            let Some(data) = self.data(el) else { continue };
            let run = data.text.trim();
            if run.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(run);
        }
        out
    }

    /// Iterate `root` and its descendants in document (pre-)order.
    pub fn descendants(&self, root: ElementId) -> Descendants<'_> {
        let mut stack = Vec::new();
        if self.is_alive(root) {
            stack.push(root);
        }
        Descendants { page: self, stack }
    }

    /// Viewport-space bounding rectangle of an element, computed from current layout.
    ///
    /// Returns `None` when the element is stale, detached, hidden (itself or via an
    /// ancestor), or when its box has zero width and zero height.
    pub fn rect_of(&self, id: ElementId) -> Option<Rect> {
        let node = self.node_opt(id)?;
        let mut chain = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            chain.push(c);
            cur = self.node(c).parent;
        }
        if chain.last().copied() != Some(self.document) {
            return None;
        }

        let mut transform = Affine::translate(-self.window_scroll);
        for &el in chain.iter().rev() {
            let data = &self.node(el).data;
            if !data.flags.contains(ElementFlags::VISIBLE) {
                return None;
            }
            transform *= data.local_transform;
            if el != id {
                // An ancestor's scroll shifts its content, not its own box.
                transform *= Affine::translate(-data.scroll_offset);
            }
        }

        let rect = transform_rect_bbox(transform, node.data.local_bounds);
        if rect.width() == 0.0 && rect.height() == 0.0 {
            return None;
        }
        Some(rect)
    }

    // --- internals ---

    fn node_opt(&self, id: ElementId) -> Option<&Node> {
        if self.generations.get(id.idx()).copied() != Some(id.generation()) {
            return None;
        }
        self.nodes.get(id.idx())?.as_ref()
    }

    fn node_opt_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        if self.generations.get(id.idx()).copied() != Some(id.generation()) {
            return None;
        }
        self.nodes.get_mut(id.idx())?.as_mut()
    }

    fn node(&self, id: ElementId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling ElementId")
    }

    fn node_mut(&mut self, id: ElementId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling ElementId")
    }

    fn link_parent(&mut self, id: ElementId, parent: ElementId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: ElementId, parent: ElementId) {
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.node_opt(c).and_then(|n| n.parent);
        }
        false
    }
}

/// Document-order iterator returned by [`Page::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    page: &'a Page,
    stack: Vec<ElementId>,
}

impl Iterator for Descendants<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.page.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box in viewport space.
fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let p0 = affine * Point::new(rect.x0, rect.y0);
    let p1 = affine * Point::new(rect.x1, rect.y0);
    let p2 = affine * Point::new(rect.x0, rect.y1);
    let p3 = affine * Point::new(rect.x1, rect.y1);
    let min_x = p0.x.min(p1.x).min(p2.x).min(p3.x);
    let min_y = p0.y.min(p1.y).min(p2.y).min(p3.y);
    let max_x = p0.x.max(p1.x).max(p2.x).max(p3.x);
    let max_y = p0.y.max(p1.y).max(p2.y).max(p3.y);
    Rect::new(min_x, min_y, max_x, max_y)
}
