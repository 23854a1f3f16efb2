// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the page model: element handles, flags, and per-element data.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Affine, Rect, Vec2};

/// Handle to an element in a [`Page`](crate::Page).
///
/// This is a small, copyable handle that stays stable while the element lives
/// but becomes invalid when the element is removed.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `ElementId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `ElementId`.
///
/// Equality is identity: two elements with identical tags, attributes, and
/// geometry still have distinct handles, and a stale handle never aliases a
/// different live element because the generation must match.
///
/// Use [`Page::is_alive`](crate::Page::is_alive) to check whether a handle still refers to a live
/// element, and [`Page::is_attached`](crate::Page::is_attached) to check whether it is currently
/// part of the rendered document.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Element flags describing rendering and interactivity hints reported by the host.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// Element is rendered (not `display: none`). Hidden elements hide their subtree.
        const VISIBLE        = 0b0000_0001;
        /// Element carries a click handler.
        const CLICK_HANDLER  = 0b0000_0010;
        /// Element is styled with `cursor: pointer`.
        const POINTER_CURSOR = 0b0000_0100;
    }
}

impl Default for ElementFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Per-element data: markup facts plus the layout box computed by the host.
///
/// Bounds and transforms are expressed in the parent's coordinate space; the
/// page composes the ancestor chain (and scroll offsets) on demand in
/// [`Page::rect_of`](crate::Page::rect_of).
#[derive(Clone, Debug)]
pub struct ElementData {
    /// Lowercase tag name, e.g. `"a"` or `"button"`.
    pub tag: String,
    /// Attributes in source order. Names are compared case-sensitively.
    pub attributes: Vec<(String, String)>,
    /// The element's own text (not including descendants).
    pub text: String,
    /// Layout box in the parent's coordinate space.
    pub local_bounds: Rect,
    /// Transform relative to the parent's coordinate space.
    pub local_transform: Affine,
    /// Scroll offset of this element's content; applies to descendants only.
    pub scroll_offset: Vec2,
    /// Rendering and interactivity flags.
    pub flags: ElementFlags,
}

impl ElementData {
    /// Create element data for `tag` with empty bounds and default flags.
    pub fn new(tag: impl Into<String>) -> Self {
        let mut tag = tag.into();
        tag.make_ascii_lowercase();
        Self {
            tag,
            attributes: Vec::new(),
            text: String::new(),
            local_bounds: Rect::ZERO,
            local_transform: Affine::IDENTITY,
            scroll_offset: Vec2::ZERO,
            flags: ElementFlags::default(),
        }
    }

    /// Set the layout box.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.local_bounds = bounds;
        self
    }

    /// Add or replace an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name.into(), value.into());
        self
    }

    /// Set the element's own text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Replace the flags.
    pub fn with_flags(mut self, flags: ElementFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Value of the attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn set_attribute(&mut self, name: String, value: String) {
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_lowercased_and_attrs_replace() {
        let data = ElementData::new("BUTTON")
            .with_attr("class", "a")
            .with_attr("class", "b");
        assert_eq!(data.tag, "button");
        assert_eq!(data.attribute("class"), Some("b"));
        assert_eq!(data.attributes.len(), 1);
        assert_eq!(data.attribute("id"), None);
    }

    #[test]
    fn default_flags_are_visible_only() {
        let flags = ElementFlags::default();
        assert!(flags.contains(ElementFlags::VISIBLE));
        assert!(!flags.intersects(ElementFlags::CLICK_HANDLER | ElementFlags::POINTER_CURSOR));
    }
}
