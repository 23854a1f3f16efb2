// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A CSS selector subset: parsing, matching against a [`DocumentTree`], and unique-path generation.
//!
//! ## Supported syntax
//!
//! - Type and universal selectors: `button`, `*`.
//! - `#id`, `.class`.
//! - Attributes: `[name]`, `[name=value]`, `[name~=value]`, `[name^=value]`, `[name$=value]`,
//!   `[name*=value]`, with quoted or bare values.
//! - Pseudo-classes: `:first-child`, `:last-child`, `:first-of-type`, `:last-of-type`,
//!   `:nth-child(n)`, `:nth-of-type(n)` where `n` is a positive integer.
//! - Combinators: descendant (whitespace) and child (`>`), and selector lists (`,`).
//! - CSS escapes in identifiers and strings (`\.` and hex escapes such as `\31 `).
//!
//! Anything else is a [`SelectorError`].
//!
//! ## Generation
//!
//! [`unique_selector`] builds a child-combinator path that resolves to exactly the given
//! element: it stops at the nearest ancestor-or-self whose `id` is unique in the document and
//! disambiguates same-tag siblings with `:nth-of-type`.


use thiserror::Error;

use crate::dom::{DocumentTree, ElementKey, class_list, document_order};

/// Errors produced while parsing a selector.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector (or one entry of a list) is empty.
    #[error("empty selector")]
    Empty,
    /// A character that cannot appear at this position.
    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected {
        /// Byte offset into the source.
        offset: usize,
        /// The offending character.
        found: char,
    },
    /// The selector ended in the middle of a construct.
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    /// A pseudo-class outside the supported subset.
    #[error("unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),
    /// An `:nth-*` argument that is not a positive integer.
    #[error("invalid :nth argument {0:?}")]
    InvalidNth(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Simple {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attr {
        name: String,
        test: Option<(AttrOp, String)>,
    },
    NthChild {
        n: usize,
        of_type: bool,
        from_end: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One complex selector: compounds joined by combinators, left to right.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Vec<Simple>>,
    // combinators[i] joins compounds[i] and compounds[i + 1]
    combinators: Vec<Combinator>,
}

/// A parsed selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Complex>,
}

impl SelectorList {
    /// Parse `src`.
    pub fn parse(src: &str) -> Result<Self, SelectorError> {
        let mut p = Parser { src, pos: 0 };
        p.skip_ws();
        if p.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut selectors = Vec::new();
        loop {
            if p.peek() == Some(',') {
                return Err(SelectorError::Empty);
            }
            selectors.push(p.complex()?);
            p.skip_ws();
            match p.peek() {
                None => break,
                Some(',') => {
                    p.bump();
                    p.skip_ws();
                    if p.peek().is_none() {
                        return Err(SelectorError::Empty);
                    }
                }
                Some(found) => {
                    return Err(SelectorError::Unexpected {
                        offset: p.pos,
                        found,
                    });
                }
            }
        }
        Ok(Self { selectors })
    }

    /// True if `element` matches any selector in the list.
    pub fn matches<K, D>(&self, doc: &D, element: &K) -> bool
    where
        K: ElementKey,
        D: DocumentTree<K> + ?Sized,
    {
        self.selectors.iter().any(|c| {
            c.compounds
                .len()
                .checked_sub(1)
                .is_some_and(|last| matches_complex(doc, c, last, element))
        })
    }

    /// Every matching element under the document root, in document order.
    pub fn query_all<K, D>(&self, doc: &D) -> Vec<K>
    where
        K: ElementKey,
        D: DocumentTree<K> + ?Sized,
    {
        document_order(doc)
            .into_iter()
            .filter(|el| self.matches(doc, el))
            .collect()
    }
}

fn matches_complex<K, D>(doc: &D, complex: &Complex, idx: usize, element: &K) -> bool
where
    K: ElementKey,
    D: DocumentTree<K> + ?Sized,
{
    if !complex.compounds[idx]
        .iter()
        .all(|s| matches_simple(doc, s, element))
    {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match complex.combinators[idx - 1] {
        Combinator::Child => doc
            .parent_of(element)
            .is_some_and(|p| matches_complex(doc, complex, idx - 1, &p)),
        Combinator::Descendant => {
            let mut cur = doc.parent_of(element);
            while let Some(p) = cur {
                if matches_complex(doc, complex, idx - 1, &p) {
                    return true;
                }
                cur = doc.parent_of(&p);
            }
            false
        }
    }
}

fn matches_simple<K, D>(doc: &D, simple: &Simple, element: &K) -> bool
where
    K: ElementKey,
    D: DocumentTree<K> + ?Sized,
{
    match simple {
        Simple::Universal => true,
        Simple::Tag(tag) => doc.tag_name(element) == *tag,
        Simple::Id(id) => doc.attribute(element, "id").as_deref() == Some(id.as_str()),
        Simple::Class(class) => class_list(doc, element).iter().any(|c| c == class),
        Simple::Attr { name, test } => {
            let Some(value) = doc.attribute(element, name) else {
                return false;
            };
            match test {
                None => true,
                Some((AttrOp::Equals, v)) => value == *v,
                Some((AttrOp::Includes, v)) => value.split_ascii_whitespace().any(|w| w == v),
                Some((AttrOp::Prefix, v)) => !v.is_empty() && value.starts_with(v.as_str()),
                Some((AttrOp::Suffix, v)) => !v.is_empty() && value.ends_with(v.as_str()),
                Some((AttrOp::Substring, v)) => !v.is_empty() && value.contains(v.as_str()),
            }
        }
        Simple::NthChild {
            n,
            of_type,
            from_end,
        } => sibling_position(doc, element, *of_type, *from_end) == *n,
    }
}

/// 1-based position of `element` among its siblings (optionally only same-tag ones).
fn sibling_position<K, D>(doc: &D, element: &K, of_type: bool, from_end: bool) -> usize
where
    K: ElementKey,
    D: DocumentTree<K> + ?Sized,
{
    let Some(parent) = doc.parent_of(element) else {
        return 1;
    };
    let tag = of_type.then(|| doc.tag_name(element));
    let mut siblings: Vec<K> = doc
        .children_of(&parent)
        .into_iter()
        .filter(|s| tag.as_ref().is_none_or(|t| doc.tag_name(s) == *t))
        .collect();
    if from_end {
        siblings.reverse();
    }
    siblings
        .iter()
        .position(|s| s == element)
        .map_or(0, |i| i + 1)
}

/// Build a selector that resolves to exactly `element` while it stays attached.
pub fn unique_selector<K, D>(doc: &D, element: &K) -> String
where
    K: ElementKey,
    D: DocumentTree<K> + ?Sized,
{
    let mut segments = Vec::new();
    let mut cur = *element;
    loop {
        if let Some(id) = doc.attribute(&cur, "id").filter(|id| !id.is_empty())
            && sole_holder_of_id(doc, &id, &cur)
        {
            segments.push(format!("#{}", escape_ident(&id)));
            break;
        }
        let tag = doc.tag_name(&cur);
        let mut segment = if tag.is_empty() {
            "*".to_owned()
        } else {
            escape_ident(&tag)
        };
        for class in class_list(doc, &cur) {
            segment.push('.');
            segment.push_str(&escape_ident(&class));
        }
        let Some(parent) = doc.parent_of(&cur) else {
            segments.push(segment);
            break;
        };
        let same_tag = doc
            .children_of(&parent)
            .into_iter()
            .filter(|s| doc.tag_name(s) == tag)
            .count();
        if same_tag > 1 {
            let pos = sibling_position(doc, &cur, true, false);
            segment.push_str(&format!(":nth-of-type({pos})"));
        }
        segments.push(segment);
        cur = parent;
    }
    segments.reverse();
    segments.join(" > ")
}

fn sole_holder_of_id<K, D>(doc: &D, id: &str, element: &K) -> bool
where
    K: ElementKey,
    D: DocumentTree<K> + ?Sized,
{
    let mut holders = document_order(doc)
        .into_iter()
        .filter(|el| doc.attribute(el, "id").as_deref() == Some(id));
    holders.next() == Some(*element) && holders.next().is_none()
}

/// Escape `ident` so it parses back as a single identifier.
pub fn escape_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut chars = ident.chars().peekable();
    let mut first = true;
    while let Some(c) = chars.next() {
        let leading_digit = c.is_ascii_digit()
            && (first || (out == "-" && ident.starts_with('-')));
        if leading_digit {
            out.push_str(&format!("\\{:x} ", u32::from(c)));
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
        first = false;
        if chars.peek().is_none() && out == "-" {
            // A lone hyphen is not an identifier.
            out = "\\-".to_owned();
        }
    }
    out
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace; returns true if any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected {
                offset: self.pos,
                found,
            },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, want: char) -> Result<(), SelectorError> {
        if self.peek() == Some(want) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Vec<Simple>, SelectorError> {
        let mut simples = Vec::new();
        match self.peek() {
            Some('*') => {
                self.bump();
                simples.push(Simple::Universal);
            }
            Some(c) if is_ident_start(c) => {
                let mut tag = self.ident()?;
                tag.make_ascii_lowercase();
                simples.push(Simple::Tag(tag));
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    simples.push(Simple::Id(self.ident()?));
                }
                Some('.') => {
                    self.bump();
                    simples.push(Simple::Class(self.ident()?));
                }
                Some('[') => {
                    self.bump();
                    simples.push(self.attribute()?);
                }
                Some(':') => {
                    self.bump();
                    simples.push(self.pseudo()?);
                }
                _ => break,
            }
        }
        if simples.is_empty() {
            return Err(self.unexpected());
        }
        Ok(simples)
    }

    fn attribute(&mut self) -> Result<Simple, SelectorError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(Simple::Attr { name, test: None });
            }
            Some('=') => {
                self.bump();
                AttrOp::Equals
            }
            Some(c @ ('~' | '^' | '$' | '*')) => {
                self.bump();
                self.expect('=')?;
                match c {
                    '~' => AttrOp::Includes,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            _ => return Err(self.unexpected()),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                self.string(q)?
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(Simple::Attr {
            name,
            test: Some((op, value)),
        })
    }

    fn pseudo(&mut self) -> Result<Simple, SelectorError> {
        let mut name = self.ident()?;
        name.make_ascii_lowercase();
        let nth = |n, of_type, from_end| Simple::NthChild {
            n,
            of_type,
            from_end,
        };
        match name.as_str() {
            "first-child" => Ok(nth(1, false, false)),
            "last-child" => Ok(nth(1, false, true)),
            "first-of-type" => Ok(nth(1, true, false)),
            "last-of-type" => Ok(nth(1, true, true)),
            "nth-child" | "nth-of-type" => {
                self.expect('(')?;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ')') {
                    self.bump();
                }
                let arg = self.src[start..self.pos].trim().to_owned();
                self.expect(')')?;
                let n = arg
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(SelectorError::InvalidNth(arg))?;
                Ok(nth(n, name == "nth-of-type", false))
            }
            _ => Err(SelectorError::UnsupportedPseudo(name)),
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                out.push(self.escape()?);
            } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                self.bump();
                out.push(c);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.unexpected());
        }
        Ok(out)
    }

    fn string(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SelectorError::UnexpectedEnd),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    // Escaped newline is a line continuation.
                    if self.peek() == Some('\n') {
                        self.bump();
                    } else {
                        out.push(self.escape()?);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Decode the escape after a consumed backslash.
    fn escape(&mut self) -> Result<char, SelectorError> {
        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.bump();
        }
        if self.pos == start {
            return self.bump().ok_or(SelectorError::UnexpectedEnd);
        }
        let code = u32::from_str_radix(&self.src[start..self.pos], 16).unwrap_or(0xFFFD);
        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        Ok(char::from_u32(code)
            .filter(|c| *c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors() {
        assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("  "), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("a,"), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse(",a"), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("a >"), Err(SelectorError::UnexpectedEnd));
        assert_eq!(SelectorList::parse("[href"), Err(SelectorError::UnexpectedEnd));
        assert_eq!(SelectorList::parse("[href=\"x]"), Err(SelectorError::UnexpectedEnd));
        assert_eq!(
            SelectorList::parse("a:hover"),
            Err(SelectorError::UnsupportedPseudo("hover".into()))
        );
        assert_eq!(
            SelectorList::parse("li:nth-child(2n+1)"),
            Err(SelectorError::InvalidNth("2n+1".into()))
        );
        assert_eq!(
            SelectorList::parse("li:nth-of-type(0)"),
            Err(SelectorError::InvalidNth("0".into()))
        );
        assert_eq!(
            SelectorList::parse("a + b"),
            Err(SelectorError::Unexpected {
                offset: 2,
                found: '+'
            })
        );
    }

    #[test]
    fn parse_escapes() {
        let list = SelectorList::parse(r"#\31 23.a\.b").unwrap();
        assert_eq!(
            list.selectors[0].compounds[0],
            vec![Simple::Id("123".into()), Simple::Class("a.b".into())]
        );
        let list = SelectorList::parse(r#"[title='it\'s']"#).unwrap();
        assert_eq!(
            list.selectors[0].compounds[0],
            vec![Simple::Attr {
                name: "title".into(),
                test: Some((AttrOp::Equals, "it's".into())),
            }]
        );
    }

    #[test]
    fn escape_ident_roundtrips_awkward_names() {
        for raw in ["1col", "a.b", "with space", "-2x", "plain_name", "x:y", "-"] {
            let sel = format!(".{}", escape_ident(raw));
            let list = SelectorList::parse(&sel).unwrap();
            assert_eq!(
                list.selectors[0].compounds[0],
                vec![Simple::Class(raw.into())],
                "escaping {raw:?} gave {sel:?}"
            );
        }
    }

    #[cfg(feature = "page_adapter")]
    mod on_page {
        use super::super::*;
        use crate::fixtures::Fixture;

        #[test]
        fn matching_combinators_and_pseudos() {
            let f = Fixture::new();
            let q = |s: &str| SelectorList::parse(s).unwrap().query_all(&f.page);

            assert_eq!(q("nav > a"), vec![f.home_link, f.pricing_link]);
            assert_eq!(q("body a"), vec![f.home_link, f.pricing_link, f.terms]);
            assert_eq!(q("body > a"), Vec::new());
            assert_eq!(q("nav a:first-child"), vec![f.home_link]);
            assert_eq!(q("nav a:last-of-type"), vec![f.pricing_link]);
            assert_eq!(q("main > button:nth-of-type(2)"), vec![f.ghost]);
            assert_eq!(q("main > :nth-child(2)"), vec![f.card]);
            assert_eq!(q(".btn.btn-primary"), vec![f.signup]);
            assert_eq!(q("[data-attr=\"signup-button\"]"), vec![f.signup]);
            assert_eq!(q("[class~=btn-primary]"), vec![f.signup]);
            assert_eq!(q("a[href^=\"/p\"]"), vec![f.pricing_link]);
            assert_eq!(q("a[href$=terms]"), vec![f.terms]);
            assert_eq!(q("[type]"), vec![f.email]);
            assert_eq!(q("h2, .card"), vec![f.card, f.card_title]);
            assert_eq!(q("#signup"), Vec::new());
        }

        #[test]
        fn unique_selector_prefers_unique_id() {
            let mut f = Fixture::new();
            f.page.set_attribute(f.main, "id", "content");
            assert_eq!(
                unique_selector(&f.page, &f.signup),
                "#content > button.btn.btn-primary:nth-of-type(1)"
            );

            // A duplicated id is not an anchor.
            f.page.set_attribute(f.nav, "id", "content");
            assert_eq!(
                unique_selector(&f.page, &f.signup),
                "html > body > main > button.btn.btn-primary:nth-of-type(1)"
            );
        }

        #[test]
        fn unique_selector_resolves_back_for_every_element() {
            let f = Fixture::new();
            for el in document_order(&f.page) {
                let sel = unique_selector(&f.page, &el);
                let hits = SelectorList::parse(&sel).unwrap().query_all(&f.page);
                assert_eq!(hits, vec![el], "selector {sel:?}");
            }
        }
    }
}
