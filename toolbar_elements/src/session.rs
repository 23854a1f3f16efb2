// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An activation cycle of the toolbar: the engine plus its page subscriptions.
//!
//! The owner of toolbar visibility mounts a session when the toolbar appears and
//! unmounts (or drops) it when the toolbar goes away. Page events are dispatched
//! through [`ElementsSession::dispatch`], and [`ElementsSession::tick`] runs the
//! trailing recomputation once the debounce deadline passes.

use core::time::Duration;

use crate::config::ElementsConfig;
use crate::dom::{DocumentTree, ElementKey, GeometryProvider};
use crate::logic::ElementsLogic;
use crate::types::Effect;
use crate::watcher::{EventSource, PageEvent, ViewportWatcher, WatcherAction};

/// [`ElementsLogic`] bound to a [`ViewportWatcher`] for one activation.
#[derive(Debug)]
pub struct ElementsSession<K, S: EventSource> {
    logic: ElementsLogic<K>,
    watcher: Option<ViewportWatcher<S>>,
}

impl<K: ElementKey, S: EventSource> ElementsSession<K, S> {
    /// A session that is not yet listening.
    pub fn new(config: ElementsConfig) -> Self {
        Self {
            logic: ElementsLogic::new(config),
            watcher: None,
        }
    }

    /// Subscribe on `source` and run a first pass.
    ///
    /// Mounting again first tears down the previous subscriptions.
    pub fn mount<P>(&mut self, source: S, page: &P)
    where
        P: DocumentTree<K> + GeometryProvider<K> + ?Sized,
    {
        self.unmount();
        let delay = self.logic.config().trailing_delay();
        self.watcher = Some(ViewportWatcher::mount(source, delay));
        self.logic.recompute(page);
    }

    /// Remove every subscription. Safe to call more than once.
    pub fn unmount(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.unmount();
        }
    }

    /// True while subscribed.
    pub fn is_mounted(&self) -> bool {
        self.watcher.is_some()
    }

    /// The engine.
    pub fn logic(&self) -> &ElementsLogic<K> {
        &self.logic
    }

    /// The engine, for input and mode changes. Call [`refresh`](Self::refresh) afterwards.
    pub fn logic_mut(&mut self) -> &mut ElementsLogic<K> {
        &mut self.logic
    }

    /// The watcher, while mounted.
    pub fn watcher(&self) -> Option<&ViewportWatcher<S>> {
        self.watcher.as_ref()
    }

    /// Run a pass now.
    pub fn refresh<P>(&mut self, page: &P)
    where
        P: DocumentTree<K> + GeometryProvider<K> + ?Sized,
    {
        self.logic.recompute(page);
    }

    /// Handle a page event at time `now`; returns the effects it produced.
    pub fn dispatch<P>(&mut self, page: &P, event: &PageEvent, now: Duration) -> Vec<Effect<K>>
    where
        P: DocumentTree<K> + GeometryProvider<K> + ?Sized,
    {
        let Some(action) = self.watcher.as_mut().and_then(|w| w.handle(event, now)) else {
            return Vec::new();
        };
        let effects = match action {
            WatcherAction::Recompute => Vec::new(),
            WatcherAction::Escape => self.logic.escape().1,
        };
        self.logic.recompute(page);
        effects
    }

    /// Run the trailing pass if its deadline has passed. Returns true if a pass ran.
    pub fn tick<P>(&mut self, page: &P, now: Duration) -> bool
    where
        P: DocumentTree<K> + GeometryProvider<K> + ?Sized,
    {
        let due = self.watcher.as_mut().is_some_and(|w| w.poll(now));
        if due {
            self.logic.recompute(page);
        }
        due
    }
}
