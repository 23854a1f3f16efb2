// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document seams: the read-only view of a live page that the engine consumes.
//!
//! ## Overview
//!
//! The engine never owns elements. A host (a browser binding, or
//! [`toolbar_page::Page`](https://docs.rs/toolbar_page) via the `page_adapter` feature)
//! implements [`DocumentTree`] for structure and [`GeometryProvider`] for layout,
//! and hands out element handles of some [`ElementKey`] type.
//!
//! Both traits are queried afresh on every recomputation pass; implementations
//! should answer from current state and never from a cache.

use core::fmt::Debug;
use core::hash::Hash;

use kurbo::Rect;

/// Opaque handle to a live element.
///
/// Equality must be identity: two distinct elements never compare equal, even
/// when they look the same. Handles are borrowed from the page and may refer
/// to elements that have since been detached.
pub trait ElementKey: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> ElementKey for T {}

/// Computes an element's on-screen rectangle from current layout.
pub trait GeometryProvider<K> {
    /// Viewport-space bounding rectangle of `element`.
    ///
    /// Returns `None` when the element is not in the rendered tree or has
    /// zero width and zero height. Must be side-effect free.
    fn rect_of(&self, element: &K) -> Option<Rect>;
}

/// Structural, read-only access to the document.
pub trait DocumentTree<K> {
    /// Root element of the rendered document, if any.
    fn document_element(&self) -> Option<K>;

    /// Parent of `element`, or `None` for the root or a detached subtree root.
    fn parent_of(&self, element: &K) -> Option<K>;

    /// Children of `element` in document order.
    fn children_of(&self, element: &K) -> Vec<K>;

    /// Lowercase tag name.
    fn tag_name(&self, element: &K) -> String;

    /// Attribute value, if present.
    fn attribute(&self, element: &K, name: &str) -> Option<String>;

    /// Rendered text of the element including descendants.
    fn inner_text(&self, element: &K) -> String;

    /// True if the element carries a click handler or a pointer cursor.
    fn has_pointer_affordance(&self, element: &K) -> bool;

    /// Current page location (URL).
    fn location(&self) -> String;
}

/// Every element under the document root, in document (pre-)order.
pub fn document_order<K, D>(doc: &D) -> Vec<K>
where
    K: ElementKey,
    D: DocumentTree<K> + ?Sized,
{
    let mut out = Vec::new();
    let mut stack: Vec<K> = doc.document_element().into_iter().collect();
    while let Some(el) = stack.pop() {
        out.push(el);
        let mut children = doc.children_of(&el);
        children.reverse();
        stack.extend(children);
    }
    out
}

/// Classes of `element`, split on ASCII whitespace.
pub(crate) fn class_list<K, D>(doc: &D, element: &K) -> Vec<String>
where
    D: DocumentTree<K> + ?Sized,
{
    doc.attribute(element, "class")
        .map(|c| c.split_ascii_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}
