// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The elements engine: inputs, the recomputation pass, and derived views.
//!
//! ## Pass
//!
//! [`ElementsLogic::recompute`] runs the whole pipeline in dependency order, reading
//! the page through [`DocumentTree`] and [`GeometryProvider`]:
//!
//! 1. inspection targets (cached per page location while inspection is on) with fresh rects,
//! 2. heatmap elements with fresh rects, while the heatmap is on,
//! 3. step elements of the action being edited,
//! 4. the actions-for-element index and the action list,
//! 5. the merged [`MetadataMap`],
//! 6. the display and label lists.
//!
//! Views always reflect the last completed pass. Operations that change state return
//! the [`Effect`]s collaborators should act on; they do not run a pass themselves.

use std::rc::Rc;

use kurbo::Point;

use crate::config::ElementsConfig;
use crate::dom::{DocumentTree, ElementKey, GeometryProvider};
use crate::matcher::ElementMatcher;
use crate::mode::{ActionEditing, EscapeStep, Mode, ModeController};
use crate::registry::{self, ActionsForElement, DisplaySources, MetadataMap, RegistrySources};
use crate::selection::{SelectionState, Slot};
use crate::stats::ClickStats;
use crate::types::{
    Action, ActionMatch, Effect, ElementDetail, HeatmapElement, HeatmapEntry, InspectElement,
    Overlay, StepElement, is_displayable,
};

#[derive(Clone, Debug)]
struct TargetCache<K> {
    location: String,
    targets: Vec<K>,
}

/// Everything derived by one pass.
#[derive(Clone, Debug)]
struct PassViews<K> {
    inspect: Vec<InspectElement<K>>,
    heatmap: Vec<HeatmapElement<K>>,
    selected_action: Vec<StepElement<K>>,
    actions_for_element: ActionsForElement<K>,
    action_list: Vec<ActionMatch<K>>,
    map: MetadataMap<K>,
    display: Vec<Overlay<K>>,
    labels: Vec<Overlay<K>>,
}

impl<K> Default for PassViews<K> {
    fn default() -> Self {
        Self {
            inspect: Vec::new(),
            heatmap: Vec::new(),
            selected_action: Vec::new(),
            actions_for_element: ActionsForElement::default(),
            action_list: Vec::new(),
            map: MetadataMap::default(),
            display: Vec::new(),
            labels: Vec::new(),
        }
    }
}

/// The element-inspection engine for one page.
#[derive(Clone, Debug)]
pub struct ElementsLogic<K> {
    config: ElementsConfig,
    matcher: ElementMatcher,
    mode: ModeController,
    selection: SelectionState<K>,
    actions: Vec<Rc<Action>>,
    heatmap: Vec<HeatmapEntry<K>>,
    targets: Option<TargetCache<K>>,
    views: PassViews<K>,
    rect_update_counter: u64,
}

impl<K: ElementKey> Default for ElementsLogic<K> {
    fn default() -> Self {
        Self::new(ElementsConfig::default())
    }
}

impl<K: ElementKey> ElementsLogic<K> {
    /// A new engine with everything off.
    pub fn new(config: ElementsConfig) -> Self {
        Self {
            matcher: ElementMatcher::new(&config),
            config,
            mode: ModeController::new(),
            selection: SelectionState::new(),
            actions: Vec::new(),
            heatmap: Vec::new(),
            targets: None,
            views: PassViews::default(),
            rect_update_counter: 0,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ElementsConfig {
        &self.config
    }

    /// The matcher used by every pass.
    pub fn matcher(&self) -> &ElementMatcher {
        &self.matcher
    }

    /// The current primary mode.
    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    /// The mode switches.
    pub fn mode_controller(&self) -> &ModeController {
        &self.mode
    }

    /// The selection slots.
    pub fn selection(&self) -> &SelectionState<K> {
        &self.selection
    }

    /// True if inspection is on, explicitly or for an element pick.
    pub fn inspect_enabled(&self) -> bool {
        self.mode.inspect_enabled()
    }

    /// True if the heatmap is on.
    pub fn heatmap_enabled(&self) -> bool {
        self.mode.heatmap_enabled()
    }

    /// Number of passes run so far.
    pub fn rect_update_counter(&self) -> u64 {
        self.rect_update_counter
    }

    // --- inputs ---

    /// Replace the sorted action list.
    pub fn set_actions(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.actions = actions.into_iter().map(Rc::new).collect();
    }

    /// The sorted action list.
    pub fn actions(&self) -> &[Rc<Action>] {
        &self.actions
    }

    /// Replace the heatmap entries.
    pub fn set_heatmap_entries(&mut self, entries: Vec<HeatmapEntry<K>>) {
        self.heatmap = entries;
    }

    /// Sum of the heatmap counts.
    pub fn total_clicks(&self) -> u64 {
        self.heatmap.iter().map(|e| e.count).sum()
    }

    /// Mirror the action-editing collaborator. Selecting a different action clears the selection.
    pub fn set_action_editing(&mut self, editing: ActionEditing) {
        if self.mode.action_editing().selected_action != editing.selected_action {
            self.selection.clear_selection();
        }
        self.mode.set_action_editing(editing);
    }

    /// Drop the cached inspection targets so the next pass enumerates them again.
    ///
    /// The cache is keyed on the page location; call this when the page changes
    /// structure without navigating.
    pub fn invalidate_targets(&mut self) {
        self.targets = None;
    }

    // --- modes ---

    /// Turn inspection on.
    pub fn enable_inspect(&mut self) -> Vec<Effect<K>> {
        self.mode.enable_inspect();
        self.selection.clear_hover();
        effects(vec![Effect::LoadActions])
    }

    /// Turn inspection off and clear every selection slot.
    pub fn disable_inspect(&mut self) {
        self.mode.disable_inspect();
        self.selection.clear_all();
    }

    /// Observe the heatmap being enabled.
    pub fn enable_heatmap(&mut self) {
        self.mode.enable_heatmap();
    }

    /// Observe the heatmap being disabled; clears every selection slot.
    pub fn disable_heatmap(&mut self) {
        self.mode.disable_heatmap();
        self.selection.clear_all();
    }

    /// Apply one escape step.
    pub fn escape(&mut self) -> (EscapeStep, Vec<Effect<K>>) {
        let step = self
            .mode
            .escape_step(self.selection.hover().is_some(), self.selection.selected().is_some());
        tracing::debug!(?step, "escape");
        let out = match step {
            EscapeStep::ClearHover => {
                self.selection.clear_hover();
                Vec::new()
            }
            EscapeStep::ClearSelection => {
                self.selection.clear_selection();
                Vec::new()
            }
            EscapeStep::DisableHeatmap => {
                self.disable_heatmap();
                effects(vec![Effect::DisableHeatmap])
            }
            EscapeStep::DisableInspect => {
                self.disable_inspect();
                Vec::new()
            }
            EscapeStep::Nothing => Vec::new(),
        };
        (step, out)
    }

    // --- selection ---

    /// Set the hovered element.
    pub fn set_hover(&mut self, element: Option<K>) {
        self.selection.set_hover(element);
    }

    /// Set the highlighted element.
    pub fn set_highlight(&mut self, element: Option<K>) {
        self.selection.set_highlight(element);
    }

    /// Select `element`, toggling it off if already selected.
    pub fn set_selected(&mut self, element: Option<K>) {
        self.selection.set_selected(element);
    }

    /// Route a user pick.
    ///
    /// While a step of the edited action awaits an element, the pick goes to the
    /// action-editing collaborator; otherwise it toggles the selection.
    pub fn select_element(&mut self, element: Option<K>) -> Vec<Effect<K>> {
        self.selection.clear_highlight();
        match self.mode.action_editing().awaiting_pick() {
            Some(step_index) => {
                self.selection.clear_hover();
                effects(
                    element
                        .map(|element| Effect::InspectElementSelected {
                            element,
                            step_index,
                        })
                        .into_iter()
                        .collect(),
                )
            }
            None => {
                self.selection.set_selected(element);
                Vec::new()
            }
        }
    }

    /// Start a new action from `element` and reset the selection.
    pub fn create_action<D>(&mut self, doc: &D, element: K) -> Vec<Effect<K>>
    where
        D: DocumentTree<K> + ?Sized,
    {
        self.selection.clear_all();
        let step = self.matcher.element_to_descriptor(doc, &element);
        effects(vec![
            Effect::ShowButtonActions,
            Effect::ShowActionsInfo,
            Effect::NewAction { element, step },
        ])
    }

    // --- pass ---

    /// Recompute every derived view from the current page.
    pub fn recompute<P>(&mut self, page: &P)
    where
        P: DocumentTree<K> + GeometryProvider<K> + ?Sized,
    {
        self.rect_update_counter += 1;

        let targets = self.inspect_targets(page);
        let inspect: Vec<_> = targets
            .iter()
            .map(|&element| InspectElement {
                element,
                rect: page.rect_of(&element),
            })
            .collect();

        let heatmap: Vec<_> = if self.mode.heatmap_enabled() {
            self.heatmap
                .iter()
                .map(|e| HeatmapElement {
                    element: e.element,
                    count: e.count,
                    rank_position: e.rank_position,
                    selector: e.selector.clone(),
                    rect: page.rect_of(&e.element),
                })
                .collect()
        } else {
            Vec::new()
        };

        let editing = self.mode.action_editing();
        let selected_action = match (&editing.selected_action, editing.visible) {
            (Some(action), true) => registry::selected_action_elements(action, &self.matcher, page),
            _ => Vec::new(),
        };

        let actions_for_element = registry::actions_for_elements(&self.actions, &self.matcher, page);
        let action_list = registry::action_list_elements(&actions_for_element);

        let map = registry::rebuild(RegistrySources {
            inspect: &inspect,
            heatmap: &heatmap,
            selected_action: &selected_action,
            action_list: &action_list,
        });

        let sources = DisplaySources {
            inspect: &inspect,
            editing_visible: editing.visible,
            action_selected: editing.selected_action.is_some(),
            selected_action: &selected_action,
            action_list: &action_list,
        };
        let shown = registry::elements_to_display(sources);
        let labels = registry::labels_to_display(sources);

        tracing::trace!(
            pass = self.rect_update_counter,
            inspect = inspect.len(),
            heatmap = heatmap.len(),
            matched_elements = actions_for_element.len(),
            mapped = map.len(),
            displayed = shown.len(),
            "recomputed elements"
        );

        self.views = PassViews {
            inspect,
            heatmap,
            selected_action,
            actions_for_element,
            action_list,
            map,
            display: shown,
            labels,
        };
    }

    fn inspect_targets<D>(&mut self, doc: &D) -> Vec<K>
    where
        D: DocumentTree<K> + ?Sized,
    {
        if !self.mode.inspect_enabled() {
            self.targets = None;
            return Vec::new();
        }
        let location = doc.location();
        match &self.targets {
            Some(cache) if cache.location == location => cache.targets.clone(),
            _ => {
                let targets = self.matcher.all_clickable_targets(doc);
                tracing::debug!(%location, count = targets.len(), "enumerated click targets");
                self.targets = Some(TargetCache {
                    location,
                    targets: targets.clone(),
                });
                targets
            }
        }
    }

    // --- views ---

    /// Overlays to draw, from the last pass.
    pub fn elements_to_display(&self) -> &[Overlay<K>] {
        &self.views.display
    }

    /// Label badges to draw, from the last pass.
    pub fn labels_to_display(&self) -> &[Overlay<K>] {
        &self.views.labels
    }

    /// Inspection targets with their rects, unfiltered.
    pub fn inspect_elements(&self) -> &[InspectElement<K>] {
        &self.views.inspect
    }

    /// Heatmap elements with a displayable rect.
    pub fn heatmap_elements(&self) -> impl Iterator<Item = &HeatmapElement<K>> + '_ {
        self.views
            .heatmap
            .iter()
            .filter(|e| is_displayable(e.rect))
    }

    /// Resolved step elements of the action being edited.
    pub fn selected_action_elements(&self) -> &[StepElement<K>] {
        &self.views.selected_action
    }

    /// The actions-for-element index.
    pub fn actions_for_element(&self) -> &ActionsForElement<K> {
        &self.views.actions_for_element
    }

    /// The first action match per element.
    pub fn action_list_elements(&self) -> &[ActionMatch<K>] {
        &self.views.action_list
    }

    /// The merged metadata map.
    pub fn element_map(&self) -> &MetadataMap<K> {
        &self.views.map
    }

    fn detail<D>(&self, slot: Slot, doc: &D) -> Option<ElementDetail<K>>
    where
        D: DocumentTree<K> + ?Sized,
    {
        self.selection.detail(
            slot,
            &self.views.map,
            &self.views.actions_for_element,
            &self.matcher,
            doc,
        )
    }

    /// Detail view of the selected element.
    pub fn selected_element_meta<D>(&self, doc: &D) -> Option<ElementDetail<K>>
    where
        D: DocumentTree<K> + ?Sized,
    {
        self.detail(Slot::Selected, doc)
    }

    /// Detail view of the hovered element.
    pub fn hover_element_meta<D>(&self, doc: &D) -> Option<ElementDetail<K>>
    where
        D: DocumentTree<K> + ?Sized,
    {
        self.detail(Slot::Hover, doc)
    }

    /// Detail view of the highlighted element.
    pub fn highlight_element_meta<D>(&self, doc: &D) -> Option<ElementDetail<K>>
    where
        D: DocumentTree<K> + ?Sized,
    {
        self.detail(Slot::Highlight, doc)
    }

    /// Click statistics of the selected element, if it has a heatmap count.
    pub fn selected_click_stats(&self) -> Option<ClickStats> {
        let element = self.selection.selected()?;
        ClickStats::for_element(self.views.map.get(&element)?, self.total_clicks())
    }

    /// Topmost displayed overlay containing `point`, if any.
    pub fn element_at(&self, point: Point) -> Option<K> {
        self.views
            .display
            .iter()
            .rev()
            .find(|o| o.rect().is_some_and(|r| r.contains(point)))
            .map(Overlay::element)
    }
}

fn effects<K: ElementKey>(out: Vec<Effect<K>>) -> Vec<Effect<K>> {
    if !out.is_empty() {
        tracing::debug!(effects = ?out, "emitting effects");
    }
    out
}
