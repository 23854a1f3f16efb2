// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interaction modes and the escape-key unwind order.
//!
//! Inspect and heatmap are independent switches; whichever was enabled last is the
//! primary input source while both are on. Action editing is driven from outside
//! through [`ActionEditing`], and a pending element pick turns inspection on
//! implicitly.

use std::rc::Rc;

use crate::types::Action;

/// The primary interaction mode, derived from the switches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Nothing active.
    #[default]
    Off,
    /// Click targets are highlighted for inspection.
    Inspecting,
    /// Heatmap counts are shown.
    HeatmapActive,
    /// The action-editing UI is open with neither inspect nor heatmap on.
    ActionEditing,
}

/// A switch that can be the last one enabled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// The inspect switch.
    Inspect,
    /// The heatmap switch.
    Heatmap,
}

/// The single action an escape key press performs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EscapeStep {
    /// Clear the hovered element.
    ClearHover,
    /// Clear the selected element.
    ClearSelection,
    /// Turn the heatmap off.
    DisableHeatmap,
    /// Turn inspection off.
    DisableInspect,
    /// Nothing left to unwind.
    Nothing,
}

/// State mirrored from the action-editing collaborator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionEditing {
    /// The action-editing UI is visible.
    pub visible: bool,
    /// Action currently being edited.
    pub selected_action: Option<Rc<Action>>,
    /// Step of the edited action that is waiting for an element pick.
    pub inspecting_step: Option<usize>,
}

impl ActionEditing {
    /// Step index awaiting a pick, if the UI is visible and picking.
    pub fn awaiting_pick(&self) -> Option<usize> {
        self.inspecting_step.filter(|_| self.visible)
    }
}

/// Tracks the inspect and heatmap switches and the action-editing state.
#[derive(Clone, Debug, Default)]
pub struct ModeController {
    inspect: bool,
    heatmap: bool,
    last_enabled: Option<Source>,
    editing: ActionEditing,
}

impl ModeController {
    /// Everything off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn inspection on and make it the last-enabled source.
    pub fn enable_inspect(&mut self) {
        self.inspect = true;
        self.last_enabled = Some(Source::Inspect);
        tracing::debug!(mode = ?self.mode(), "inspect enabled");
    }

    /// Turn inspection off.
    pub fn disable_inspect(&mut self) {
        self.inspect = false;
        tracing::debug!(mode = ?self.mode(), "inspect disabled");
    }

    /// Record that the heatmap collaborator enabled the heatmap.
    pub fn enable_heatmap(&mut self) {
        self.heatmap = true;
        self.last_enabled = Some(Source::Heatmap);
        tracing::debug!(mode = ?self.mode(), "heatmap enabled");
    }

    /// Record that the heatmap was disabled.
    pub fn disable_heatmap(&mut self) {
        self.heatmap = false;
        tracing::debug!(mode = ?self.mode(), "heatmap disabled");
    }

    /// Replace the mirrored action-editing state.
    pub fn set_action_editing(&mut self, editing: ActionEditing) {
        self.editing = editing;
        tracing::debug!(mode = ?self.mode(), "action editing updated");
    }

    /// Mirrored action-editing state.
    pub fn action_editing(&self) -> &ActionEditing {
        &self.editing
    }

    /// True if inspection was switched on explicitly.
    pub fn inspect_enabled_raw(&self) -> bool {
        self.inspect
    }

    /// True if inspection is on, explicitly or because a step is awaiting a pick.
    pub fn inspect_enabled(&self) -> bool {
        self.inspect || self.editing.awaiting_pick().is_some()
    }

    /// True if the heatmap is on.
    pub fn heatmap_enabled(&self) -> bool {
        self.heatmap
    }

    /// The switch enabled most recently, if any ever was.
    pub fn last_enabled(&self) -> Option<Source> {
        self.last_enabled
    }

    /// The current primary mode.
    pub fn mode(&self) -> Mode {
        match (self.inspect_enabled(), self.heatmap) {
            (true, true) if self.last_enabled == Some(Source::Heatmap) => Mode::HeatmapActive,
            (true, _) => Mode::Inspecting,
            (false, true) => Mode::HeatmapActive,
            (false, false) if self.editing.visible => Mode::ActionEditing,
            (false, false) => Mode::Off,
        }
    }

    /// Decide what one escape press does, given which selection slots are occupied.
    ///
    /// Exactly one step fires per press, in this order: hover, selection, heatmap when it
    /// was enabled last, inspection, heatmap.
    pub fn escape_step(&self, has_hover: bool, has_selection: bool) -> EscapeStep {
        if has_hover {
            EscapeStep::ClearHover
        } else if has_selection {
            EscapeStep::ClearSelection
        } else if self.last_enabled == Some(Source::Heatmap) && self.heatmap {
            EscapeStep::DisableHeatmap
        } else if self.inspect_enabled() {
            EscapeStep::DisableInspect
        } else if self.heatmap {
            EscapeStep::DisableHeatmap
        } else {
            EscapeStep::Nothing
        }
    }
}
