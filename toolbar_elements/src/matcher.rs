// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element matching: descriptors to live elements and back.
//!
//! ## Resolution policy
//!
//! [`ElementMatcher::descriptor_to_element`] resolves a step as follows:
//!
//! 1. If the step has a `url`, the page location must match it under the step's
//!    [`UrlMatching`]; otherwise the step does not apply to this page.
//! 2. A step with no selector, no href, and no text matches nothing.
//! 3. Candidates are the selector's matches when a selector is present, otherwise every
//!    element in the document.
//! 4. `href` must equal the candidate's `href` attribute and `text` must equal its
//!    trimmed inner text (both compared after capping at `max_text_len` chars).
//! 5. The first remaining candidate in document order wins.
//!
//! Malformed selectors and url patterns are reported by
//! [`try_descriptor_to_element`](ElementMatcher::try_descriptor_to_element) and
//! downgraded to `None` with a warning by the non-`try` variant.

use regex::Regex;
use thiserror::Error;

use crate::config::ElementsConfig;
use crate::dom::{DocumentTree, ElementKey, document_order};
use crate::selector::{SelectorError, SelectorList, unique_selector};
use crate::types::{ActionStepDescriptor, UrlMatching};

/// Structured reasons a descriptor could not be evaluated.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The step's selector does not parse.
    #[error("invalid selector {selector:?}: {source}")]
    Selector {
        /// The selector as written.
        selector: String,
        /// Parse failure.
        #[source]
        source: SelectorError,
    },
    /// The step's url is not a valid regular expression.
    #[error("invalid url pattern {pattern:?}: {source}")]
    UrlPattern {
        /// The pattern as written.
        pattern: String,
        /// Compile failure.
        #[source]
        source: regex::Error,
    },
}

/// Resolves descriptors against a [`DocumentTree`] and enumerates click targets.
#[derive(Clone, Debug)]
pub struct ElementMatcher {
    clickable_tags: Vec<String>,
    max_text_len: usize,
}

impl Default for ElementMatcher {
    fn default() -> Self {
        Self::new(&ElementsConfig::default())
    }
}

impl ElementMatcher {
    /// Create a matcher from configuration.
    pub fn new(config: &ElementsConfig) -> Self {
        Self {
            clickable_tags: config.clickable_tags.clone(),
            max_text_len: config.max_text_len,
        }
    }

    /// Resolve `descriptor` to the best live match, or `None`.
    ///
    /// Malformed selectors and url patterns are logged and treated as no match.
    pub fn descriptor_to_element<K, D>(&self, doc: &D, descriptor: &ActionStepDescriptor) -> Option<K>
    where
        K: ElementKey,
        D: DocumentTree<K> + ?Sized,
    {
        match self.try_descriptor_to_element(doc, descriptor) {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(%error, "unresolvable action step");
                None
            }
        }
    }

    /// Resolve `descriptor`, reporting malformed selectors and url patterns.
    pub fn try_descriptor_to_element<K, D>(
        &self,
        doc: &D,
        descriptor: &ActionStepDescriptor,
    ) -> Result<Option<K>, MatchError>
    where
        K: ElementKey,
        D: DocumentTree<K> + ?Sized,
    {
        if let Some(url) = descriptor.url.as_deref().filter(|u| !u.is_empty())
            && !url_matches(&doc.location(), url, descriptor.url_matching)?
        {
            return Ok(None);
        }

        let selector = non_blank(descriptor.selector.as_deref());
        let href = descriptor.href.as_deref().filter(|h| !h.is_empty());
        let text = non_blank(descriptor.text.as_deref());
        if selector.is_none() && href.is_none() && text.is_none() {
            return Ok(None);
        }

        let candidates: Vec<K> = match selector {
            Some(selector) => SelectorList::parse(selector)
                .map_err(|source| MatchError::Selector {
                    selector: selector.to_owned(),
                    source,
                })?
                .query_all(doc),
            None => document_order(doc),
        };
        let text = text.map(|t| self.cap_text(t.trim()));

        Ok(candidates.into_iter().find(|el| {
            href.is_none_or(|h| doc.attribute(el, "href").as_deref() == Some(h))
                && text
                    .as_deref()
                    .is_none_or(|t| self.cap_text(doc.inner_text(el).trim()) == t)
        }))
    }

    /// Describe `element` so that [`descriptor_to_element`](Self::descriptor_to_element)
    /// resolves back to it while the page is unchanged.
    pub fn element_to_descriptor<K, D>(&self, doc: &D, element: &K) -> ActionStepDescriptor
    where
        K: ElementKey,
        D: DocumentTree<K> + ?Sized,
    {
        let text = doc.inner_text(element);
        let text = text.trim();
        let tag = doc.tag_name(element);
        ActionStepDescriptor {
            selector: Some(unique_selector(doc, element)),
            text: (!text.is_empty()).then(|| self.cap_text(text)),
            href: doc.attribute(element, "href"),
            url: Some(strip_query_and_fragment(&doc.location()).to_owned()),
            url_matching: UrlMatching::Contains,
            tag_name: (!tag.is_empty()).then_some(tag),
            ..ActionStepDescriptor::autocapture()
        }
    }

    /// Every element that counts as a click target, in document order.
    pub fn all_clickable_targets<K, D>(&self, doc: &D) -> Vec<K>
    where
        K: ElementKey,
        D: DocumentTree<K> + ?Sized,
    {
        document_order(doc)
            .into_iter()
            .filter(|el| self.is_clickable(doc, el))
            .collect()
    }

    /// True if `element` has a clickable tag or a pointer affordance.
    pub fn is_clickable<K, D>(&self, doc: &D, element: &K) -> bool
    where
        K: ElementKey,
        D: DocumentTree<K> + ?Sized,
    {
        let tag = doc.tag_name(element);
        self.clickable_tags.iter().any(|t| *t == tag) || doc.has_pointer_affordance(element)
    }

    fn cap_text(&self, text: &str) -> String {
        text.chars().take(self.max_text_len).collect()
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Compare a page location against a step url.
pub fn url_matches(location: &str, url: &str, matching: UrlMatching) -> Result<bool, MatchError> {
    Ok(match matching {
        UrlMatching::Contains => location.contains(url),
        UrlMatching::Exact => location == url,
        UrlMatching::Regex => Regex::new(url)
            .map_err(|source| MatchError::UrlPattern {
                pattern: url.to_owned(),
                source,
            })?
            .is_match(location),
    })
}

/// `url` up to (not including) its query string or fragment.
pub fn strip_query_and_fragment(url: &str) -> &str {
    url.find(['?', '#']).map_or(url, |end| &url[..end])
}
