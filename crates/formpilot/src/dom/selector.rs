//! Structural selector engine.
//!
//! Supports selector groups (`a, b`), the descendant and child (`>`)
//! combinators, and compound steps built from `tag`, `*`, `#id`, `.class`,
//! `[attr]` and `[attr=value]`. Anything else is rejected with a
//! [`SelectorError`] rather than guessed at.

use super::{Document, NodeId};
use thiserror::Error;

/// Selector text could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported selector: {0}")]
pub struct SelectorError(pub String);

impl From<SelectorError> for crate::result::FormpilotError {
    fn from(err: SelectorError) -> Self {
        Self::InvalidSelector { selector: err.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Step {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    step: Step,
    // relation to the part on the left
    combinator: Option<Combinator>,
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Vec<Part>>,
}

impl Selector {
    /// Parse selector text
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let groups = split_groups(source)?
            .iter()
            .map(|group| parse_chain(group))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { groups })
    }

    /// Whether `el` matches any group of the selector
    pub fn matches<D: Document + ?Sized>(&self, doc: &D, el: NodeId) -> bool {
        self.groups
            .iter()
            .any(|parts| matches_chain(parts, doc, el))
    }
}

fn matches_chain<D: Document + ?Sized>(parts: &[Part], doc: &D, el: NodeId) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if !matches_step(&last.step, doc, el) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match last.combinator {
        Some(Combinator::Child) => doc
            .parent(el)
            .is_some_and(|parent| matches_chain(rest, doc, parent)),
        Some(Combinator::Descendant) | None => {
            let mut current = doc.parent(el);
            while let Some(ancestor) = current {
                if matches_chain(rest, doc, ancestor) {
                    return true;
                }
                current = doc.parent(ancestor);
            }
            false
        }
    }
}

fn matches_step<D: Document + ?Sized>(step: &Step, doc: &D, el: NodeId) -> bool {
    let Some(tag) = doc.tag_name(el) else {
        return false;
    };
    if let Some(expected) = &step.tag {
        if !expected.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &step.id {
        if doc.attribute(el, "id") != Some(id.as_str()) {
            return false;
        }
    }
    if !step.classes.is_empty() {
        let class_attr = doc.attribute(el, "class").unwrap_or_default();
        let present: Vec<&str> = class_attr.split_ascii_whitespace().collect();
        if !step.classes.iter().all(|class| present.contains(&class.as_str())) {
            return false;
        }
    }
    step.attrs.iter().all(|cond| match cond {
        AttrCondition::Exists { key } => doc.attribute(el, key).is_some(),
        AttrCondition::Eq { key, value } => doc.attribute(el, key) == Some(value.as_str()),
    })
}

/// Split on top-level commas, honoring brackets and quotes.
fn split_groups(source: &str) -> Result<Vec<String>, SelectorError> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut scanner = Scanner::default();

    for ch in source.chars() {
        if ch == ',' && scanner.at_top_level() {
            let trimmed = current.trim();
            if trimmed.is_empty() {
                return Err(SelectorError(source.to_string()));
            }
            groups.push(trimmed.to_string());
            current.clear();
            continue;
        }
        scanner.feed(ch).map_err(|()| SelectorError(source.to_string()))?;
        current.push(ch);
    }

    if !scanner.at_top_level() {
        return Err(SelectorError(source.to_string()));
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(SelectorError(source.to_string()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn parse_chain(selector: &str) -> Result<Vec<Part>, SelectorError> {
    let mut parts = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize(selector)? {
        if token == ">" {
            if pending.is_some() || parts.is_empty() {
                return Err(SelectorError(selector.to_string()));
            }
            pending = Some(Combinator::Child);
            continue;
        }
        let step = parse_step(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(Part { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(SelectorError(selector.to_string()));
    }
    Ok(parts)
}

fn tokenize(selector: &str) -> Result<Vec<String>, SelectorError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut scanner = Scanner::default();

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.trim().is_empty() {
            tokens.push(current.trim().to_string());
        }
        current.clear();
    };

    for ch in selector.chars() {
        if scanner.at_top_level() {
            if ch == '>' {
                flush(&mut current, &mut tokens);
                tokens.push(">".to_string());
                continue;
            }
            if ch == '+' || ch == '~' {
                return Err(SelectorError(selector.to_string()));
            }
            if ch.is_whitespace() {
                flush(&mut current, &mut tokens);
                continue;
            }
        }
        scanner
            .feed(ch)
            .map_err(|()| SelectorError(selector.to_string()))?;
        current.push(ch);
    }

    if !scanner.at_top_level() {
        return Err(SelectorError(selector.to_string()));
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

fn parse_step(token: &str) -> Result<Step, SelectorError> {
    let err = || SelectorError(token.to_string());
    let mut step = Step::default();
    let mut rest = token;

    while let Some(first) = rest.chars().next() {
        match first {
            '*' => {
                if step.universal || step.tag.is_some() {
                    return Err(err());
                }
                step.universal = true;
                rest = &rest[1..];
            }
            '#' => {
                let (ident, tail) = take_ident(&rest[1..]).ok_or_else(err)?;
                if step.id.replace(ident).is_some() {
                    return Err(err());
                }
                rest = tail;
            }
            '.' => {
                let (ident, tail) = take_ident(&rest[1..]).ok_or_else(err)?;
                step.classes.push(ident);
                rest = tail;
            }
            '[' => {
                let (cond, tail) = take_attr(rest).ok_or_else(err)?;
                step.attrs.push(cond);
                rest = tail;
            }
            _ => {
                let compound_started = step.tag.is_some()
                    || step.universal
                    || step.id.is_some()
                    || !step.classes.is_empty()
                    || !step.attrs.is_empty();
                if compound_started {
                    return Err(err());
                }
                let (ident, tail) = take_ident(rest).ok_or_else(err)?;
                step.tag = Some(ident.to_ascii_lowercase());
                rest = tail;
            }
        }
    }

    Ok(step)
}

fn take_ident(src: &str) -> Option<(String, &str)> {
    let end = src
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map_or(src.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    Some((src[..end].to_string(), &src[end..]))
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Parse `[key]` or `[key=value]` at the start of `src`.
fn take_attr(src: &str) -> Option<(AttrCondition, &str)> {
    let body_start = 1;
    let mut quote: Option<char> = None;
    let mut close = None;
    for (i, c) in src.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ']' => {
                close = Some(i);
                break;
            }
            None => {}
        }
    }
    let close = close?;
    let body = src[body_start..close].trim();
    let tail = &src[close + 1..];

    let cond = match body.split_once('=') {
        Some((key, value)) => {
            let key = key.trim();
            if key.is_empty() || !key.chars().all(is_ident_char) {
                return None;
            }
            AttrCondition::Eq {
                key: key.to_string(),
                value: unquote(value.trim())?,
            }
        }
        None => {
            if body.is_empty() || !body.chars().all(is_ident_char) {
                return None;
            }
            AttrCondition::Exists {
                key: body.to_string(),
            }
        }
    };
    Some((cond, tail))
}

fn unquote(value: &str) -> Option<String> {
    for q in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(q) {
            let inner = inner.strip_suffix(q)?;
            if inner.contains(q) {
                return None;
            }
            return Some(inner.to_string());
        }
    }
    if value.is_empty() || !value.chars().all(is_ident_char) {
        return None;
    }
    Some(value.to_string())
}

/// Tracks bracket and quote nesting while scanning selector text.
#[derive(Debug, Default)]
struct Scanner {
    brackets: usize,
    quote: Option<char>,
}

impl Scanner {
    fn at_top_level(&self) -> bool {
        self.brackets == 0 && self.quote.is_none()
    }

    fn feed(&mut self, ch: char) -> Result<(), ()> {
        if let Some(q) = self.quote {
            if ch == q {
                self.quote = None;
            }
            return Ok(());
        }
        match ch {
            '"' | '\'' if self.brackets > 0 => self.quote = Some(ch),
            '"' | '\'' | '(' | ')' | ':' => return Err(()),
            '[' => self.brackets += 1,
            ']' => {
                if self.brackets == 0 {
                    return Err(());
                }
                self.brackets -= 1;
            }
            _ => {}
        }
        Ok(())
    }
}
