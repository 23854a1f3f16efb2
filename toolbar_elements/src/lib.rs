// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Toolbar Elements: the element inspection and overlay engine of an in-page toolbar.
//!
//! ## Overview
//!
//! The engine reconciles live page elements with several overlapping overlays (inspection
//! targets, heatmap counts, and action-step matches) and keeps their screen rectangles in
//! sync as the page scrolls, resizes, or changes. It never owns elements: the host hands out
//! handles of any [`ElementKey`](crate::dom::ElementKey) type and answers structure and layout
//! questions through [`DocumentTree`](crate::dom::DocumentTree) and
//! [`GeometryProvider`](crate::dom::GeometryProvider).
//!
//! ## Components
//!
//! - [`matcher`]: resolves action-step descriptors to elements and describes elements as steps.
//! - [`mode`]: inspect and heatmap switches, action editing, and the escape unwind order.
//! - [`registry`]: the merged per-element metadata map and the display priority.
//! - [`selection`]: hover, highlight, and selection slots and their detail views.
//! - [`watcher`]: page subscriptions and the scroll/resize debounce.
//! - [`logic`]: [`ElementsLogic`](crate::logic::ElementsLogic), the recomputation pipeline tying
//!   them together.
//! - [`session`]: [`ElementsSession`](crate::session::ElementsSession), one activation of the
//!   toolbar with its subscriptions.
//!
//! Every pass is a full rebuild from current inputs. Soft failures (a detached element, a
//! descriptor with no match, a stale selection) read as absent rather than as errors.
//!
//! ## Minimal usage
//!
//! ```
//! use core::time::Duration;
//! use kurbo::{Point, Rect, Size};
//! use toolbar_elements::config::ElementsConfig;
//! use toolbar_elements::session::ElementsSession;
//! use toolbar_elements::types::Effect;
//! use toolbar_elements::watcher::{ListenerTable, PageEvent};
//! use toolbar_page::{ElementData, ElementId, Page};
//!
//! let mut page = Page::new("https://example.com/", Size::new(800.0, 600.0));
//! let button = page.insert(
//!     Some(page.document_element()),
//!     ElementData::new("button")
//!         .with_text("Sign up")
//!         .with_bounds(Rect::new(10.0, 10.0, 110.0, 40.0)),
//! );
//!
//! let mut session: ElementsSession<ElementId, ListenerTable> =
//!     ElementsSession::new(ElementsConfig::default());
//! assert_eq!(session.logic_mut().enable_inspect(), vec![Effect::LoadActions]);
//! session.mount(ListenerTable::new(), &page);
//!
//! let hovered = session.logic().element_at(Point::new(20.0, 20.0));
//! assert_eq!(hovered, Some(button));
//!
//! // Escape turns inspection back off.
//! session.dispatch(&page, &PageEvent::key("Escape"), Duration::ZERO);
//! assert!(session.logic().elements_to_display().is_empty());
//! ```
//!
//! ## Features
//!
//! - `page_adapter` (default): implements the document traits for `toolbar_page::Page`.

pub mod adapters;
pub mod config;
pub mod dom;
pub mod logic;
pub mod matcher;
pub mod mode;
pub mod registry;
pub mod selection;
pub mod selector;
pub mod session;
pub mod stats;
pub mod types;
pub mod watcher;

#[cfg(all(test, feature = "page_adapter"))]
mod fixtures;
