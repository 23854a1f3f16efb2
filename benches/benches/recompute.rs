// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Rect, Size, Vec2};
use toolbar_elements::logic::ElementsLogic;
use toolbar_elements::matcher::ElementMatcher;
use toolbar_elements::mode::ActionEditing;
use toolbar_elements::types::{Action, ActionStepDescriptor, HeatmapEntry};
use toolbar_page::{ElementData, ElementFlags, ElementId, Page};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

/// A listing page: `rows` sections, each with a heading, a link, a button, and a clickable card.
fn gen_listing(rows: usize) -> (Page, Vec<ElementId>) {
    let mut page = Page::new("https://bench.example/list?page=2", Size::new(1280.0, 800.0));
    let body = page.insert(
        Some(page.document_element()),
        ElementData::new("body").with_bounds(Rect::new(0.0, 0.0, 1280.0, rows as f64 * 120.0)),
    );
    let mut clickable = Vec::with_capacity(rows * 3);
    for row in 0..rows {
        let y = row as f64 * 120.0;
        let section = page.insert(
            Some(body),
            ElementData::new("section")
                .with_attr("class", "row")
                .with_bounds(Rect::new(0.0, y, 1280.0, y + 110.0)),
        );
        page.insert(
            Some(section),
            ElementData::new("h3")
                .with_text(format!("Item {row}"))
                .with_bounds(Rect::new(10.0, y, 400.0, y + 30.0)),
        );
        clickable.push(page.insert(
            Some(section),
            ElementData::new("a")
                .with_attr("href", format!("/item/{row}"))
                .with_text("Details")
                .with_bounds(Rect::new(10.0, y + 40.0, 90.0, y + 60.0)),
        ));
        clickable.push(page.insert(
            Some(section),
            ElementData::new("button")
                .with_attr("class", "btn buy")
                .with_text(format!("Buy {row}"))
                .with_bounds(Rect::new(100.0, y + 40.0, 180.0, y + 60.0)),
        ));
        clickable.push(page.insert(
            Some(section),
            ElementData::new("div")
                .with_attr("class", "card")
                .with_flags(ElementFlags::VISIBLE | ElementFlags::CLICK_HANDLER)
                .with_bounds(Rect::new(200.0, y, 600.0, y + 100.0)),
        ));
    }
    (page, clickable)
}

fn gen_actions(page: &Page, targets: &[ElementId], count: usize) -> Vec<Action> {
    let matcher = ElementMatcher::default();
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|i| {
            let target = targets[rng.below(targets.len())];
            let mut step = matcher.element_to_descriptor(page, &target);
            step.url = None;
            Action {
                id: Some(i as i64),
                name: format!("action {i}"),
                steps: vec![
                    ActionStepDescriptor {
                        selector: Some(".does-not-exist".into()),
                        ..ActionStepDescriptor::autocapture()
                    },
                    step,
                ],
            }
        })
        .collect()
}

fn bench_inspect_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("inspect_pass");
    for &rows in &[50_usize, 200] {
        let (mut page, targets) = gen_listing(rows);
        group.throughput(Throughput::Elements(targets.len() as u64));

        group.bench_function(format!("cold_targets_rows{rows}"), |b| {
            b.iter_batched(
                || {
                    let mut logic = ElementsLogic::<ElementId>::default();
                    logic.enable_inspect();
                    logic
                },
                |mut logic| {
                    logic.recompute(&page);
                    black_box(logic.elements_to_display().len());
                },
                BatchSize::SmallInput,
            );
        });

        let mut logic = ElementsLogic::<ElementId>::default();
        logic.enable_inspect();
        logic.recompute(&page);
        let mut scroll = 0.0;
        group.bench_function(format!("warm_scroll_rows{rows}"), |b| {
            b.iter(|| {
                scroll = (scroll + 37.0) % 2000.0;
                page.set_window_scroll(Vec2::new(0.0, scroll));
                logic.recompute(&page);
                black_box(logic.elements_to_display().len());
            });
        });
    }
    group.finish();
}

fn bench_action_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("action_matching");
    let (page, targets) = gen_listing(100);
    for &count in &[10_usize, 50] {
        let actions = gen_actions(&page, &targets, count);
        let mut logic = ElementsLogic::<ElementId>::default();
        logic.set_actions(actions);
        logic.set_action_editing(ActionEditing {
            visible: true,
            ..ActionEditing::default()
        });
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("actions{count}"), |b| {
            b.iter(|| {
                logic.recompute(&page);
                black_box(logic.action_list_elements().len());
            });
        });
    }
    group.finish();
}

fn bench_heatmap_merge(c: &mut Criterion) {
    let (page, targets) = gen_listing(200);
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    let entries: Vec<_> = targets
        .iter()
        .enumerate()
        .map(|(i, &element)| HeatmapEntry {
            element,
            count: rng.next_u64() % 500,
            rank_position: i as u32 + 1,
            selector: None,
        })
        .collect();
    let mut logic = ElementsLogic::<ElementId>::default();
    logic.set_heatmap_entries(entries);
    logic.enable_heatmap();
    logic.enable_inspect();
    c.bench_function("heatmap_and_inspect_merge_rows200", |b| {
        b.iter(|| {
            logic.recompute(&page);
            black_box(logic.element_map().len());
        });
    });
}

fn bench_describe(c: &mut Criterion) {
    let (page, targets) = gen_listing(200);
    let matcher = ElementMatcher::default();
    c.bench_function("element_to_descriptor_rows200", |b| {
        let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
        b.iter(|| {
            let target = targets[rng.below(targets.len())];
            black_box(matcher.element_to_descriptor(&page, &target));
        });
    });
}

criterion_group!(
    benches,
    bench_inspect_pass,
    bench_action_matching,
    bench_heatmap_merge,
    bench_describe,
);
criterion_main!(benches);
