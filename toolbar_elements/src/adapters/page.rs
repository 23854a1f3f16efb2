// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter for Toolbar Page.
//!
//! ## Feature
//!
//! Enable with `page_adapter` (on by default).
//!
//! ## Notes
//!
//! [`Page`] already answers geometry on demand, so the adapter is a thin mapping.
//! Stale handles read as empty: no tag, no attributes, no children, no rect.

use kurbo::Rect;
use toolbar_page::{ElementFlags, ElementId, Page};

use crate::dom::{DocumentTree, GeometryProvider};

impl GeometryProvider<ElementId> for Page {
    fn rect_of(&self, element: &ElementId) -> Option<Rect> {
        Self::rect_of(self, *element)
    }
}

impl DocumentTree<ElementId> for Page {
    fn document_element(&self) -> Option<ElementId> {
        Some(Self::document_element(self))
    }

    fn parent_of(&self, element: &ElementId) -> Option<ElementId> {
        self.parent(*element)
    }

    fn children_of(&self, element: &ElementId) -> Vec<ElementId> {
        self.children(*element).to_vec()
    }

    fn tag_name(&self, element: &ElementId) -> String {
        self.data(*element).map(|d| d.tag.clone()).unwrap_or_default()
    }

    fn attribute(&self, element: &ElementId, name: &str) -> Option<String> {
        Self::attribute(self, *element, name).map(str::to_owned)
    }

    fn inner_text(&self, element: &ElementId) -> String {
        Self::inner_text(self, *element)
    }

    fn has_pointer_affordance(&self, element: &ElementId) -> bool {
        self.data(*element).is_some_and(|d| {
            d.flags
                .intersects(ElementFlags::CLICK_HANDLER | ElementFlags::POINTER_CURSOR)
        })
    }

    fn location(&self) -> String {
        Self::location(self).to_owned()
    }
}
