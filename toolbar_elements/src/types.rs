// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: step descriptors, actions, heatmap entries, merged metadata, overlays, and effects.
//!
//! ## Overview
//!
//! Descriptors and actions come from collaborators and are (de)serializable with the
//! field names the rest of the product uses. Everything keyed by an element is generic
//! over the host's [`ElementKey`](crate::dom::ElementKey) handle.

use std::rc::Rc;

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Event name of steps generated from observed clicks.
pub const AUTOCAPTURE_EVENT: &str = "$autocapture";

/// How a step's `url` is compared against the page location.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlMatching {
    /// The location contains the url.
    #[default]
    Contains,
    /// The location equals the url.
    Exact,
    /// The url is a regular expression searched in the location.
    Regex,
}

/// A structural pattern an element must satisfy to match an action step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStepDescriptor {
    /// CSS selector the element must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Trimmed inner text the element must have.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Value of the element's `href` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Page url the step applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Comparison used for `url`.
    #[serde(default)]
    pub url_matching: UrlMatching,
    /// Tag name of the element the step was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    /// Event name, e.g. [`AUTOCAPTURE_EVENT`].
    #[serde(default)]
    pub event: Option<String>,
}

impl ActionStepDescriptor {
    /// An empty autocapture step.
    pub fn autocapture() -> Self {
        Self {
            event: Some(AUTOCAPTURE_EVENT.to_owned()),
            ..Self::default()
        }
    }

    /// True if this step matches autocaptured clicks.
    pub fn is_autocapture(&self) -> bool {
        self.event.as_deref() == Some(AUTOCAPTURE_EVENT)
    }
}

/// A named, ordered sequence of step descriptors.
///
/// The identifying index of an action is its position in the sorted action
/// list handed to the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Server id; `None` for an action that has not been saved yet.
    #[serde(default)]
    pub id: Option<i64>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Steps in order.
    #[serde(default)]
    pub steps: Vec<ActionStepDescriptor>,
}

/// Click-frequency statistics for one element, supplied by the heatmap collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapEntry<K> {
    /// The element the clicks resolved to.
    pub element: K,
    /// Number of clicks.
    pub count: u64,
    /// 1-based rank among all heatmap elements (1 = most clicked).
    pub rank_position: u32,
    /// Selector the statistics were aggregated under, if known.
    pub selector: Option<String>,
}

/// An inspection target with its current rect.
#[derive(Clone, Debug, PartialEq)]
pub struct InspectElement<K> {
    /// The element.
    pub element: K,
    /// Rect from the current pass.
    pub rect: Option<Rect>,
}

/// A heatmap entry with its current rect.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapElement<K> {
    /// The element.
    pub element: K,
    /// Number of clicks.
    pub count: u64,
    /// 1-based rank.
    pub rank_position: u32,
    /// Aggregation selector, if known.
    pub selector: Option<String>,
    /// Rect from the current pass.
    pub rect: Option<Rect>,
}

/// An element resolved from one step of the action being edited.
#[derive(Clone, Debug, PartialEq)]
pub struct StepElement<K> {
    /// The element.
    pub element: K,
    /// Index of the step within the edited action.
    pub step_index: usize,
    /// Rect from the current pass.
    pub rect: Option<Rect>,
}

/// An element resolved from an action's first autocapture step.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionMatch<K> {
    /// The matched action.
    pub action: Rc<Action>,
    /// The step that resolved.
    pub step: ActionStepDescriptor,
    /// The element.
    pub element: K,
    /// Rect from the current pass.
    pub rect: Option<Rect>,
    /// Position of the action in the sorted action list.
    pub action_index: usize,
}

/// Merged per-element record built by the [registry](crate::registry).
///
/// Every field except `element` is optional; each source fills the fields it knows.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementMetadata<K> {
    /// The element.
    pub element: K,
    /// Rect from the current pass.
    pub rect: Option<Rect>,
    /// Heatmap click count.
    pub count: Option<u64>,
    /// Heatmap rank.
    pub rank_position: Option<u32>,
    /// Heatmap aggregation selector.
    pub selector: Option<String>,
    /// Matched action.
    pub action: Option<Rc<Action>>,
    /// Matched step.
    pub step: Option<ActionStepDescriptor>,
    /// Matched action's position in the sorted list.
    pub action_index: Option<usize>,
    /// Matched step's position in the edited action.
    pub step_index: Option<usize>,
}

impl<K> ElementMetadata<K> {
    /// A record that only establishes presence.
    pub fn bare(element: K) -> Self {
        Self {
            element,
            rect: None,
            count: None,
            rank_position: None,
            selector: None,
            action: None,
            step: None,
            action_index: None,
            step_index: None,
        }
    }
}

/// One item of the display or label lists.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay<K> {
    /// An inspection target.
    Inspect(InspectElement<K>),
    /// A step element of the action being edited.
    Step(StepElement<K>),
    /// The representative match of an element in the action list.
    Action(ActionMatch<K>),
}

impl<K: Copy> Overlay<K> {
    /// The element this overlay covers.
    pub fn element(&self) -> K {
        match self {
            Self::Inspect(e) => e.element,
            Self::Step(e) => e.element,
            Self::Action(e) => e.element,
        }
    }

    /// The overlay's rect from the current pass.
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Self::Inspect(e) => e.rect,
            Self::Step(e) => e.rect,
            Self::Action(e) => e.rect,
        }
    }
}

/// Derived detail view for the hovered, highlighted, or selected element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementDetail<K> {
    /// The merged metadata for the element.
    pub meta: ElementMetadata<K>,
    /// A freshly computed descriptor for the element.
    pub action_step: ActionStepDescriptor,
    /// Actions whose first autocapture step resolves to the element.
    pub actions: Vec<ActionMatch<K>>,
}

/// Notification for a collaborator, returned from engine operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect<K> {
    /// Inspection was enabled; the actions collaborator should (re)load actions.
    LoadActions,
    /// The heatmap collaborator should disable the heatmap.
    DisableHeatmap,
    /// An element was picked for step `step_index` of the action being edited.
    InspectElementSelected {
        /// Picked element.
        element: K,
        /// Step awaiting the pick.
        step_index: usize,
    },
    /// The action-editing UI should become visible.
    ShowButtonActions,
    /// The toolbar should show the actions info panel.
    ShowActionsInfo,
    /// A new action should be started from `element`.
    NewAction {
        /// Element the action starts from.
        element: K,
        /// Descriptor computed for the element.
        step: ActionStepDescriptor,
    },
}

/// True if `rect` can be drawn: present, and not both zero width and zero height.
pub fn is_displayable(rect: Option<Rect>) -> bool {
    rect.is_some_and(|r| r.width() != 0.0 || r.height() != 0.0)
}
