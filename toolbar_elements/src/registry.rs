// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The merged per-element registry and the display priority.
//!
//! ## Merge
//!
//! [`rebuild`] folds four sources into one [`MetadataMap`], in this order:
//! inspect targets, heatmap entries, step elements of the edited action, action-list
//! matches. The first source to mention an element fixes its position in the map;
//! later sources overwrite the fields they carry. A source's `rect` only
//! overwrites when it is present.
//!
//! ## Display
//!
//! [`elements_to_display`] is prioritized rather than merged: inspect targets if any,
//! else the edited action's step elements, else the action list, else nothing. Only
//! overlays with a displayable rect are returned, while the map keeps every element
//! so detail lookups still work for off-screen or collapsed ones.

use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::{DocumentTree, ElementKey, GeometryProvider};
use crate::matcher::ElementMatcher;
use crate::types::{
    Action, ActionMatch, ElementMetadata, HeatmapElement, InspectElement, Overlay, StepElement,
    is_displayable,
};

/// A map keyed by element identity that iterates in first-insertion order.
#[derive(Clone, Debug)]
pub struct ElementMap<K, V> {
    order: Vec<K>,
    entries: HashMap<K, V>,
}

/// Merged metadata per element.
pub type MetadataMap<K> = ElementMap<K, ElementMetadata<K>>;

/// Actions whose first resolvable autocapture step lands on each element.
pub type ActionsForElement<K> = ElementMap<K, Vec<ActionMatch<K>>>;

impl<K, V> Default for ElementMap<K, V> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<K: ElementKey, V> ElementMap<K, V> {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Value for `element`.
    pub fn get(&self, element: &K) -> Option<&V> {
        self.entries.get(element)
    }

    /// True if `element` has an entry.
    pub fn contains(&self, element: &K) -> bool {
        self.entries.contains_key(element)
    }

    /// Elements in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.iter()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k).map(|v| (k, v)))
    }

    /// Mutable value for `element`, inserting `make()` at the end if absent.
    pub fn get_or_insert_with(&mut self, element: K, make: impl FnOnce() -> V) -> &mut V {
        let order = &mut self.order;
        self.entries.entry(element).or_insert_with(|| {
            order.push(element);
            make()
        })
    }
}

impl<K: ElementKey, V: PartialEq> PartialEq for ElementMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.entries == other.entries
    }
}

/// The sources merged by [`rebuild`], each already carrying current rects.
#[derive(Clone, Copy, Debug)]
pub struct RegistrySources<'a, K> {
    /// Inspection targets.
    pub inspect: &'a [InspectElement<K>],
    /// Heatmap entries.
    pub heatmap: &'a [HeatmapElement<K>],
    /// Step elements of the action being edited.
    pub selected_action: &'a [StepElement<K>],
    /// Representative matches of the action list.
    pub action_list: &'a [ActionMatch<K>],
}

/// Merge all sources into a fresh map.
pub fn rebuild<K: ElementKey>(sources: RegistrySources<'_, K>) -> MetadataMap<K> {
    let mut map = MetadataMap::new();
    for e in sources.inspect {
        let meta = map.get_or_insert_with(e.element, || ElementMetadata::bare(e.element));
        meta.rect = e.rect.or(meta.rect);
    }
    for e in sources.heatmap {
        let meta = map.get_or_insert_with(e.element, || ElementMetadata::bare(e.element));
        meta.rect = e.rect.or(meta.rect);
        meta.count = Some(e.count);
        meta.rank_position = Some(e.rank_position);
        if e.selector.is_some() {
            meta.selector.clone_from(&e.selector);
        }
    }
    for e in sources.selected_action {
        let meta = map.get_or_insert_with(e.element, || ElementMetadata::bare(e.element));
        meta.rect = e.rect.or(meta.rect);
        meta.step_index = Some(e.step_index);
    }
    for e in sources.action_list {
        let meta = map.get_or_insert_with(e.element, || ElementMetadata::bare(e.element));
        meta.rect = e.rect.or(meta.rect);
        meta.action = Some(Rc::clone(&e.action));
        meta.step = Some(e.step.clone());
        meta.action_index = Some(e.action_index);
    }
    map
}

/// Resolve the first autocapture step of each action that lands on a live element.
///
/// `actions` is the sorted action list; an action's index in it is its
/// `action_index`. Actions with no resolvable autocapture step contribute nothing.
pub fn actions_for_elements<K, P>(
    actions: &[Rc<Action>],
    matcher: &ElementMatcher,
    page: &P,
) -> ActionsForElement<K>
where
    K: ElementKey,
    P: DocumentTree<K> + GeometryProvider<K> + ?Sized,
{
    let mut map = ActionsForElement::new();
    for (action_index, action) in actions.iter().enumerate() {
        let hit = action
            .steps
            .iter()
            .filter(|step| step.is_autocapture())
            .find_map(|step| {
                matcher
                    .descriptor_to_element(page, step)
                    .map(|element| (step, element))
            });
        let Some((step, element)) = hit else {
            continue;
        };
        map.get_or_insert_with(element, Vec::new)
            .push(ActionMatch {
                action: Rc::clone(action),
                step: step.clone(),
                element,
                rect: page.rect_of(&element),
                action_index,
            });
    }
    map
}

/// The first match per element, in map order.
pub fn action_list_elements<K: ElementKey>(map: &ActionsForElement<K>) -> Vec<ActionMatch<K>> {
    map.iter()
        .filter_map(|(_, matches)| matches.first().cloned())
        .collect()
}

/// Every step of `action` that resolves, with its index and current rect.
pub fn selected_action_elements<K, P>(
    action: &Action,
    matcher: &ElementMatcher,
    page: &P,
) -> Vec<StepElement<K>>
where
    K: ElementKey,
    P: DocumentTree<K> + GeometryProvider<K> + ?Sized,
{
    action
        .steps
        .iter()
        .enumerate()
        .filter_map(|(step_index, step)| {
            matcher
                .descriptor_to_element(page, step)
                .map(|element| StepElement {
                    element,
                    step_index,
                    rect: page.rect_of(&element),
                })
        })
        .collect()
}

/// Inputs to the display priority.
#[derive(Clone, Copy, Debug)]
pub struct DisplaySources<'a, K> {
    /// Inspection targets, unfiltered.
    pub inspect: &'a [InspectElement<K>],
    /// The action-editing UI is visible.
    pub editing_visible: bool,
    /// An action is selected for editing.
    pub action_selected: bool,
    /// Step elements of the selected action.
    pub selected_action: &'a [StepElement<K>],
    /// Representative matches of the action list.
    pub action_list: &'a [ActionMatch<K>],
}

/// Overlays to draw, by priority tier, with undisplayable rects removed.
///
/// The inspect tier applies only when at least one target has a displayable rect.
pub fn elements_to_display<K: ElementKey>(sources: DisplaySources<'_, K>) -> Vec<Overlay<K>> {
    if sources.inspect.iter().any(|e| is_displayable(e.rect)) {
        return sources
            .inspect
            .iter()
            .filter(|e| is_displayable(e.rect))
            .cloned()
            .map(Overlay::Inspect)
            .collect();
    }
    labels_to_display(sources)
}

/// Label badges to draw: the display tiers without the inspect tier.
pub fn labels_to_display<K: ElementKey>(sources: DisplaySources<'_, K>) -> Vec<Overlay<K>> {
    if !sources.editing_visible {
        return Vec::new();
    }
    if sources.action_selected && !sources.selected_action.is_empty() {
        return sources
            .selected_action
            .iter()
            .filter(|e| is_displayable(e.rect))
            .cloned()
            .map(Overlay::Step)
            .collect();
    }
    if !sources.action_selected && !sources.action_list.is_empty() {
        return sources
            .action_list
            .iter()
            .filter(|e| is_displayable(e.rect))
            .cloned()
            .map(Overlay::Action)
            .collect();
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionStepDescriptor;
    use kurbo::Rect;
    use proptest::prelude::*;

    fn r(x: f64) -> Option<Rect> {
        Some(Rect::new(x, x, x + 10.0, x + 10.0))
    }

    fn action_match(element: u32, action_index: usize, rect: Option<Rect>) -> ActionMatch<u32> {
        ActionMatch {
            action: Rc::new(Action {
                id: Some(action_index as i64),
                name: format!("action {action_index}"),
                steps: vec![ActionStepDescriptor::autocapture()],
            }),
            step: ActionStepDescriptor::autocapture(),
            element,
            rect,
            action_index,
        }
    }

    #[test]
    fn element_map_keeps_insertion_order() {
        let mut m: ElementMap<u32, u32> = ElementMap::new();
        *m.get_or_insert_with(3, || 0) += 1;
        *m.get_or_insert_with(1, || 0) += 1;
        *m.get_or_insert_with(3, || 0) += 1;
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(m.get(&3), Some(&2));
        assert_eq!(m.len(), 2);
        assert!(!m.contains(&2));
    }

    #[test]
    fn later_sources_overwrite_their_fields() {
        let inspect = [
            InspectElement { element: 1, rect: r(0.0) },
            InspectElement { element: 2, rect: None },
        ];
        let heatmap = [HeatmapElement {
            element: 2,
            count: 40,
            rank_position: 1,
            selector: Some("#two".into()),
            rect: r(5.0),
        }];
        let steps = [StepElement { element: 3, step_index: 0, rect: r(9.0) }];
        let list = [action_match(2, 4, None)];
        let map = rebuild(RegistrySources {
            inspect: &inspect,
            heatmap: &heatmap,
            selected_action: &steps,
            action_list: &list,
        });

        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        let two = map.get(&2).unwrap();
        assert_eq!(two.rect, r(5.0), "absent rect does not erase a present one");
        assert_eq!(two.count, Some(40));
        assert_eq!(two.selector.as_deref(), Some("#two"));
        assert_eq!(two.action_index, Some(4));
        assert_eq!(map.get(&3).unwrap().step_index, Some(0));
        assert_eq!(map.get(&1).unwrap().count, None);
    }

    #[test]
    fn display_priority_tiers() {
        let inspect = [
            InspectElement { element: 1, rect: r(0.0) },
            InspectElement { element: 2, rect: Some(Rect::ZERO) },
        ];
        let steps = [StepElement { element: 3, step_index: 1, rect: r(3.0) }];
        let list = [action_match(4, 0, r(4.0)), action_match(5, 1, None)];
        let base = DisplaySources {
            inspect: &inspect,
            editing_visible: true,
            action_selected: true,
            selected_action: &steps,
            action_list: &list,
        };

        let shown: Vec<u32> = elements_to_display(base).iter().map(Overlay::element).collect();
        assert_eq!(shown, vec![1], "inspect tier wins and drops zero-size targets");

        let no_inspect = DisplaySources { inspect: &[], ..base };
        let shown: Vec<u32> = elements_to_display(no_inspect).iter().map(Overlay::element).collect();
        assert_eq!(shown, vec![3]);

        let list_tier = DisplaySources { action_selected: false, ..no_inspect };
        let shown: Vec<u32> = elements_to_display(list_tier).iter().map(Overlay::element).collect();
        assert_eq!(shown, vec![4]);

        // A selected action with no resolved steps does not fall through to the list.
        let empty_steps = DisplaySources { selected_action: &[], ..no_inspect };
        assert!(elements_to_display(empty_steps).is_empty());

        let hidden = DisplaySources { editing_visible: false, ..no_inspect };
        assert!(elements_to_display(hidden).is_empty());

        // Labels skip the inspect tier.
        let labels: Vec<u32> = labels_to_display(base).iter().map(Overlay::element).collect();
        assert_eq!(labels, vec![3]);
    }

    #[test]
    fn undisplayable_inspect_targets_fall_through() {
        let inspect = [
            InspectElement { element: 1, rect: None },
            InspectElement { element: 2, rect: Some(Rect::ZERO) },
        ];
        let steps = [StepElement { element: 3, step_index: 0, rect: r(3.0) }];
        let sources = DisplaySources {
            inspect: &inspect,
            editing_visible: true,
            action_selected: true,
            selected_action: &steps,
            action_list: &[],
        };
        let shown: Vec<u32> = elements_to_display(sources).iter().map(Overlay::element).collect();
        assert_eq!(shown, vec![3], "step tier shows when no target can be drawn");
    }

    #[test]
    fn action_list_takes_first_match_per_element() {
        let mut map = ActionsForElement::new();
        map.get_or_insert_with(7, Vec::new).push(action_match(7, 0, r(1.0)));
        map.get_or_insert_with(7, Vec::new).push(action_match(7, 2, r(1.0)));
        map.get_or_insert_with(8, Vec::new).push(action_match(8, 1, r(2.0)));
        let reps: Vec<usize> = action_list_elements(&map).iter().map(|m| m.action_index).collect();
        assert_eq!(reps, vec![0, 1]);
    }

    fn arb_rect() -> impl Strategy<Value = Option<Rect>> {
        prop::option::of((0.0..500.0_f64, 0.0..500.0_f64, 0.0..50.0_f64, 0.0..50.0_f64))
            .prop_map(|r| r.map(|(x, y, w, h)| Rect::new(x, y, x + w, y + h)))
    }

    proptest! {
        #[test]
        fn rebuild_is_idempotent(
            inspect in prop::collection::vec((0..20_u32, arb_rect()), 0..20),
            heatmap in prop::collection::vec((0..20_u32, 0..100_u64, arb_rect()), 0..20),
            steps in prop::collection::vec((0..20_u32, arb_rect()), 0..5),
            list in prop::collection::vec((0..20_u32, arb_rect()), 0..5),
        ) {
            let inspect: Vec<_> = inspect
                .into_iter()
                .map(|(element, rect)| InspectElement { element, rect })
                .collect();
            let heatmap: Vec<_> = heatmap
                .into_iter()
                .enumerate()
                .map(|(i, (element, count, rect))| HeatmapElement {
                    element,
                    count,
                    rank_position: i as u32 + 1,
                    selector: None,
                    rect,
                })
                .collect();
            let steps: Vec<_> = steps
                .into_iter()
                .enumerate()
                .map(|(step_index, (element, rect))| StepElement { element, step_index, rect })
                .collect();
            let list: Vec<_> = list
                .into_iter()
                .enumerate()
                .map(|(i, (element, rect))| action_match(element, i, rect))
                .collect();
            let sources = RegistrySources {
                inspect: &inspect,
                heatmap: &heatmap,
                selected_action: &steps,
                action_list: &list,
            };
            let first = rebuild(sources);
            let second = rebuild(sources);
            prop_assert_eq!(&first, &second);

            let shown = elements_to_display(DisplaySources {
                inspect: &inspect,
                editing_visible: true,
                action_selected: !steps.is_empty(),
                selected_action: &steps,
                action_list: &list,
            });
            for overlay in shown {
                prop_assert!(is_displayable(overlay.rect()));
                prop_assert!(first.contains(&overlay.element()));
            }
        }
    }

    #[cfg(feature = "page_adapter")]
    mod on_page {
        use super::super::*;
        use crate::fixtures::{Fixture, action, autocapture};
        use crate::types::ActionStepDescriptor;

        #[test]
        fn first_resolvable_autocapture_step_per_action() {
            let f = Fixture::new();
            let pageview = ActionStepDescriptor {
                event: Some("$pageview".into()),
                url: Some("/pricing".into()),
                ..ActionStepDescriptor::default()
            };
            let actions = vec![
                Rc::new(action(1, "Missing", vec![autocapture(Some("#signup"), None)])),
                Rc::new(action(
                    2,
                    "Sign up",
                    vec![
                        pageview,
                        autocapture(Some("#nope"), None),
                        autocapture(Some(".btn"), None),
                        autocapture(Some("nav > a"), None),
                    ],
                )),
                Rc::new(action(3, "Also sign up", vec![autocapture(None, Some("Sign up"))])),
                Rc::new(action(4, "Terms", vec![autocapture(Some("a"), Some("Terms"))])),
            ];
            let map = actions_for_elements(&actions, &ElementMatcher::default(), &f.page);

            assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![f.signup, f.terms]);
            let signup = map.get(&f.signup).unwrap();
            assert_eq!(
                signup.iter().map(|m| m.action_index).collect::<Vec<_>>(),
                vec![1, 2]
            );
            assert_eq!(signup[0].step.selector.as_deref(), Some(".btn"));
            assert!(signup[0].rect.is_some());
            // Off-screen but attached: rect present, just outside the viewport.
            assert!(map.get(&f.terms).unwrap()[0].rect.is_some());
        }

        #[test]
        fn selected_action_steps_keep_their_index() {
            let f = Fixture::new();
            let edited = action(
                9,
                "Edited",
                vec![
                    autocapture(Some("#nope"), None),
                    autocapture(Some("nav > a:last-child"), None),
                    autocapture(None, Some("Ghost")),
                ],
            );
            let steps = selected_action_elements(&edited, &ElementMatcher::default(), &f.page);
            assert_eq!(steps.len(), 2);
            assert_eq!((steps[0].element, steps[0].step_index), (f.pricing_link, 1));
            assert_eq!((steps[1].element, steps[1].step_index, steps[1].rect), (f.ghost, 2, None));
        }
    }
}
