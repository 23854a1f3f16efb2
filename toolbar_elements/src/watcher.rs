// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page event subscriptions and the recompute debounce.
//!
//! ## Lifecycle
//!
//! [`ViewportWatcher::mount`] subscribes to every [`Subscription`] on the host's
//! [`EventSource`]. [`ViewportWatcher::unmount`] and `Drop` share one teardown path,
//! so each listener is removed exactly once however the watcher goes away.
//!
//! ## Debounce
//!
//! Time is passed in explicitly as a monotonic [`Duration`] (e.g. since page load).
//! A scroll or resize that starts a burst asks for an immediate recomputation; every
//! scroll or resize re-arms a single trailing deadline `delay` after itself, which
//! [`ViewportWatcher::poll`] reports once. A burst of events therefore produces one
//! leading and one trailing recomputation. Clicks recompute immediately and leave the
//! deadline alone.

use core::time::Duration;

/// A page-level event stream the watcher listens to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Subscription {
    /// Clicks anywhere in the document.
    DocumentClick,
    /// Window resizes.
    WindowResize,
    /// Key presses on the window.
    WindowKeyDown,
    /// Scrolls of any element, observed in the capture phase.
    CaptureScroll,
}

impl Subscription {
    /// Every subscription a mounted watcher holds.
    pub const ALL: [Self; 4] = [
        Self::DocumentClick,
        Self::WindowResize,
        Self::WindowKeyDown,
        Self::CaptureScroll,
    ];
}

/// Host-assigned id of one registered listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Where listeners are registered.
pub trait EventSource {
    /// Register a listener for `subscription`.
    fn subscribe(&mut self, subscription: Subscription) -> ListenerId;
    /// Remove a listener previously returned by [`subscribe`](Self::subscribe).
    fn unsubscribe(&mut self, id: ListenerId);
}

/// An [`EventSource`] that only bookkeeps, for hosts that route events themselves.
#[derive(Clone, Debug, Default)]
pub struct ListenerTable {
    next: u64,
    active: Vec<(ListenerId, Subscription)>,
}

impl ListenerTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// True if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// True if some listener is registered for `subscription`.
    pub fn is_subscribed(&self, subscription: Subscription) -> bool {
        self.active.iter().any(|(_, s)| *s == subscription)
    }
}

impl EventSource for ListenerTable {
    fn subscribe(&mut self, subscription: Subscription) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.active.push((id, subscription));
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.active.retain(|(active, _)| *active != id);
    }
}

/// An event delivered by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// A click anywhere in the document.
    Click,
    /// The window was resized.
    Resize,
    /// Something scrolled.
    Scroll,
    /// A key was pressed; `key` is the DOM key name, e.g. `"Escape"`.
    KeyDown {
        /// Key name.
        key: String,
    },
}

impl PageEvent {
    /// A key press event.
    pub fn key(key: impl Into<String>) -> Self {
        Self::KeyDown { key: key.into() }
    }
}

/// What the owner should do in response to an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WatcherAction {
    /// Run a recomputation pass now.
    Recompute,
    /// Apply one escape step.
    Escape,
}

/// Owns the page subscriptions and the trailing recompute deadline.
#[derive(Debug)]
pub struct ViewportWatcher<S: EventSource> {
    source: S,
    listeners: Vec<ListenerId>,
    delay: Duration,
    trailing_at: Option<Duration>,
}

impl<S: EventSource> ViewportWatcher<S> {
    /// Subscribe to every [`Subscription`] on `source`.
    pub fn mount(mut source: S, delay: Duration) -> Self {
        let listeners = Subscription::ALL
            .iter()
            .map(|s| source.subscribe(*s))
            .collect();
        tracing::debug!(?delay, "viewport watcher mounted");
        Self {
            source,
            listeners,
            delay,
            trailing_at: None,
        }
    }

    /// True until [`unmount`](Self::unmount) runs.
    pub fn is_mounted(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// The event source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Pending trailing deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.trailing_at
    }

    /// React to `event` at time `now`.
    pub fn handle(&mut self, event: &PageEvent, now: Duration) -> Option<WatcherAction> {
        if !self.is_mounted() {
            return None;
        }
        match event {
            PageEvent::Click => Some(WatcherAction::Recompute),
            PageEvent::Resize | PageEvent::Scroll => {
                // A deadline the host never polled ended its burst.
                let in_burst = self.trailing_at.is_some_and(|t| now < t);
                self.trailing_at = Some(now + self.delay);
                tracing::trace!(leading = !in_burst, "debounced geometry event");
                (!in_burst).then_some(WatcherAction::Recompute)
            }
            PageEvent::KeyDown { key } if key == "Escape" => Some(WatcherAction::Escape),
            PageEvent::KeyDown { .. } => None,
        }
    }

    /// True once when the trailing deadline has passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.trailing_at.is_some_and(|t| now >= t) {
            self.trailing_at = None;
            tracing::trace!("trailing recompute due");
            true
        } else {
            false
        }
    }

    /// Remove every listener and cancel the pending deadline. Later calls do nothing.
    pub fn unmount(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        for id in self.listeners.drain(..) {
            self.source.unsubscribe(id);
        }
        self.trailing_at = None;
        tracing::debug!("viewport watcher unmounted");
    }
}

impl<S: EventSource> Drop for ViewportWatcher<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
