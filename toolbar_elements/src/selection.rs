// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover, highlight, and selection slots.
//!
//! The three slots are independent single-element cells, coupled so that at most
//! one transient outline is shown at a time:
//!
//! | trigger                 | hover   | highlight | selected |
//! |-------------------------|---------|-----------|----------|
//! | `set_hover(e)`          | `e`     | cleared   |          |
//! | `set_highlight(e)`      | cleared | `e`       |          |
//! | `set_selected(e)`       | cleared | cleared   | toggle   |
//! | inspect enabled         | cleared |           |          |
//! | `clear_all`             | cleared | cleared   | cleared  |
//!
//! Selecting the element that is already selected deselects it.

use crate::dom::{DocumentTree, ElementKey};
use crate::matcher::ElementMatcher;
use crate::registry::{ActionsForElement, MetadataMap};
use crate::types::ElementDetail;

/// Which slot a detail view reads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    /// The hovered element.
    Hover,
    /// The highlighted element.
    Highlight,
    /// The selected element.
    Selected,
}

/// The three selection slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionState<K> {
    hover: Option<K>,
    highlight: Option<K>,
    selected: Option<K>,
}

impl<K> Default for SelectionState<K> {
    fn default() -> Self {
        Self {
            hover: None,
            highlight: None,
            selected: None,
        }
    }
}

impl<K: ElementKey> SelectionState<K> {
    /// All slots empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hovered element.
    pub fn hover(&self) -> Option<K> {
        self.hover
    }

    /// Highlighted element.
    pub fn highlight(&self) -> Option<K> {
        self.highlight
    }

    /// Selected element.
    pub fn selected(&self) -> Option<K> {
        self.selected
    }

    /// Element in `slot`.
    pub fn get(&self, slot: Slot) -> Option<K> {
        match slot {
            Slot::Hover => self.hover,
            Slot::Highlight => self.highlight,
            Slot::Selected => self.selected,
        }
    }

    /// Set the hovered element; clears the highlight.
    pub fn set_hover(&mut self, element: Option<K>) {
        self.hover = element;
        self.highlight = None;
    }

    /// Set the highlighted element; clears hover.
    pub fn set_highlight(&mut self, element: Option<K>) {
        self.highlight = element;
        self.hover = None;
    }

    /// Select `element`, or deselect it if it is already selected. Clears hover and highlight.
    pub fn set_selected(&mut self, element: Option<K>) {
        self.selected = if self.selected == element { None } else { element };
        self.hover = None;
        self.highlight = None;
    }

    /// Clear only the hovered element.
    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    /// Clear only the highlighted element.
    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    /// Clear only the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Clear every slot.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// Detail view for `slot`.
    ///
    /// `None` when the slot is empty or its element is not in `map`. The descriptor is
    /// computed fresh from the document.
    pub fn detail<D>(
        &self,
        slot: Slot,
        map: &MetadataMap<K>,
        actions: &ActionsForElement<K>,
        matcher: &ElementMatcher,
        doc: &D,
    ) -> Option<ElementDetail<K>>
    where
        D: DocumentTree<K> + ?Sized,
    {
        let element = self.get(slot)?;
        let meta = map.get(&element)?;
        Some(ElementDetail {
            meta: meta.clone(),
            action_step: matcher.element_to_descriptor(doc, &element),
            actions: actions.get(&element).cloned().unwrap_or_default(),
        })
    }
}
