// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared test page.

use kurbo::{Rect, Size};
use toolbar_page::{ElementData, ElementFlags, ElementId, Page};

use crate::types::{Action, ActionStepDescriptor};

pub(crate) const LOCATION: &str = "https://shop.example.com/pricing?ref=nav#plans";

/// A small marketing page:
///
/// ```text
/// html
///   body
///     nav
///       a[href="/"]            "Home"
///       a[href="/pricing"]     "Pricing"
///     main
///       button.btn.btn-primary "Sign up"   (data-attr="signup-button")
///       div.card               (cursor: pointer)
///         h2                   "Starter plan"
///       button                 "Ghost"     (zero size)
///       input[type="email"]
///       span                   "Plain text"
///       a[href="/terms"]       "Terms"     (far below the fold)
/// ```
#[derive(Debug)]
pub(crate) struct Fixture {
    pub(crate) page: Page,
    pub(crate) body: ElementId,
    pub(crate) nav: ElementId,
    pub(crate) home_link: ElementId,
    pub(crate) pricing_link: ElementId,
    pub(crate) main: ElementId,
    pub(crate) signup: ElementId,
    pub(crate) card: ElementId,
    pub(crate) card_title: ElementId,
    pub(crate) ghost: ElementId,
    pub(crate) email: ElementId,
    pub(crate) plain: ElementId,
    pub(crate) terms: ElementId,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let mut page = Page::new(LOCATION, Size::new(1280.0, 800.0));
        let root = page.document_element();
        let body = page.insert(
            Some(root),
            ElementData::new("body").with_bounds(Rect::new(0.0, 0.0, 1280.0, 3000.0)),
        );
        let nav = page.insert(
            Some(body),
            ElementData::new("nav").with_bounds(Rect::new(0.0, 0.0, 1280.0, 60.0)),
        );
        let home_link = page.insert(
            Some(nav),
            ElementData::new("a")
                .with_attr("href", "/")
                .with_text("Home")
                .with_bounds(Rect::new(10.0, 10.0, 80.0, 40.0)),
        );
        let pricing_link = page.insert(
            Some(nav),
            ElementData::new("a")
                .with_attr("href", "/pricing")
                .with_text("Pricing")
                .with_bounds(Rect::new(90.0, 10.0, 170.0, 40.0)),
        );
        let main = page.insert(
            Some(body),
            ElementData::new("main").with_bounds(Rect::new(0.0, 60.0, 1280.0, 3000.0)),
        );
        let signup = page.insert(
            Some(main),
            ElementData::new("button")
                .with_attr("class", "btn btn-primary")
                .with_attr("data-attr", "signup-button")
                .with_text("Sign up")
                .with_bounds(Rect::new(100.0, 100.0, 200.0, 140.0)),
        );
        let card = page.insert(
            Some(main),
            ElementData::new("div")
                .with_attr("class", "card")
                .with_flags(ElementFlags::VISIBLE | ElementFlags::POINTER_CURSOR)
                .with_bounds(Rect::new(100.0, 200.0, 400.0, 400.0)),
        );
        let card_title = page.insert(
            Some(card),
            ElementData::new("h2")
                .with_text("Starter plan")
                .with_bounds(Rect::new(110.0, 210.0, 390.0, 240.0)),
        );
        let ghost = page.insert(Some(main), ElementData::new("button").with_text("Ghost"));
        let email = page.insert(
            Some(main),
            ElementData::new("input")
                .with_attr("type", "email")
                .with_bounds(Rect::new(100.0, 450.0, 300.0, 480.0)),
        );
        let plain = page.insert(
            Some(main),
            ElementData::new("span")
                .with_text("Plain text")
                .with_bounds(Rect::new(100.0, 500.0, 200.0, 520.0)),
        );
        let terms = page.insert(
            Some(main),
            ElementData::new("a")
                .with_attr("href", "/terms")
                .with_text("Terms")
                .with_bounds(Rect::new(10.0, 2900.0, 60.0, 2920.0)),
        );
        Self {
            page,
            body,
            nav,
            home_link,
            pricing_link,
            main,
            signup,
            card,
            card_title,
            ghost,
            email,
            plain,
            terms,
        }
    }
}

pub(crate) fn autocapture(selector: Option<&str>, text: Option<&str>) -> ActionStepDescriptor {
    ActionStepDescriptor {
        selector: selector.map(str::to_owned),
        text: text.map(str::to_owned),
        ..ActionStepDescriptor::autocapture()
    }
}

pub(crate) fn action(id: i64, name: &str, steps: Vec<ActionStepDescriptor>) -> Action {
    Action {
        id: Some(id),
        name: name.to_owned(),
        steps,
    }
}
