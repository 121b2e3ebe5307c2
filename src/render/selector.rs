//! CSS selector subset used for content overrides.
//!
//! Supports type, universal, `#id`, `.class`, `[attr]` and `[attr=value]`
//! simple selectors, compound combinations of them, the descendant and child
//! combinators, and comma-separated lists.

use super::dom::{Document, Element, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError(pub String);

impl std::fmt::Display for SelectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid selector: {}", self.0)
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && *tag != el.name {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|a| match &a.value {
            Some(value) => el.attr(&a.name).as_deref() == Some(value.as_str()),
            None => el.has_attr(&a.name),
        })
    }
}

/// One selector of a list: compounds joined by combinators, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// The combinator of the first entry is unused.
    parts: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_at(doc, node, self.parts.len() - 1)
    }

    fn matches_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        let (combinator, compound) = &self.parts[index];
        if !compound.matches(el) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match combinator {
            Combinator::Child => doc
                .parent_element(node)
                .map(|p| self.matches_at(doc, p, index - 1))
                .unwrap_or(false),
            Combinator::Descendant => {
                let mut ancestor = doc.parent_element(node);
                while let Some(a) = ancestor {
                    if self.matches_at(doc, a, index - 1) {
                        return true;
                    }
                    ancestor = doc.parent_element(a);
                }
                false
            }
        }
    }
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    list: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let list = split_top_level(input)
            .into_iter()
            .map(parse_complex)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { list })
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.list.iter().any(|c| c.matches(doc, node))
    }

    /// All matching elements in document order.
    pub fn select(&self, doc: &Document) -> Vec<NodeId> {
        doc.elements()
            .into_iter()
            .filter(|&id| self.matches(doc, id))
            .collect()
    }
}

/// Split on commas that are not inside brackets or quotes.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn parse_complex(input: &str) -> Result<Complex, SelectorError> {
    let mut chars = input.trim().chars().peekable();
    let mut parts: Vec<(Combinator, Compound)> = Vec::new();
    let mut pending = Combinator::Descendant;

    while chars.peek().is_some() {
        let mut saw_space = false;
        while chars.peek().map(|c| c.is_whitespace()).unwrap_or(false) {
            chars.next();
            saw_space = true;
        }
        if chars.peek() == Some(&'>') {
            chars.next();
            pending = Combinator::Child;
            continue;
        }
        if saw_space && pending != Combinator::Child {
            pending = Combinator::Descendant;
        }

        let compound = parse_compound(&mut chars)?;
        if compound.is_empty() {
            return Err(SelectorError(input.to_string()));
        }
        parts.push((pending, compound));
        pending = Combinator::Descendant;
    }

    if parts.is_empty() {
        return Err(SelectorError(input.to_string()));
    }
    Ok(Complex { parts })
}

fn parse_compound(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();

    while let Some(&c) = chars.peek() {
        match c {
            '*' => {
                chars.next();
                compound.tag = Some("*".to_string());
            }
            '#' => {
                chars.next();
                compound.id = Some(take_ident(chars)?);
            }
            '.' => {
                chars.next();
                compound.classes.push(take_ident(chars)?);
            }
            '[' => {
                chars.next();
                compound.attrs.push(parse_attr(chars)?);
            }
            c if is_ident_char(c) => {
                compound.tag = Some(take_ident(chars)?.to_ascii_lowercase());
            }
            _ => break,
        }
    }

    Ok(compound)
}

fn take_ident(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<String, SelectorError> {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    if ident.is_empty() {
        return Err(SelectorError("expected identifier".to_string()));
    }
    Ok(ident)
}

fn parse_attr(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<AttrSelector, SelectorError> {
    skip_spaces(chars);
    let name = take_ident(chars)?.to_ascii_lowercase();
    skip_spaces(chars);

    let value = match chars.next() {
        Some(']') => return Ok(AttrSelector { name, value: None }),
        Some('=') => {
            skip_spaces(chars);
            let value = match chars.peek().copied() {
                Some(q @ ('"' | '\'')) => {
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == q => break,
                            Some(c) => value.push(c),
                            None => return Err(SelectorError("unterminated string".to_string())),
                        }
                    }
                    value
                }
                _ => take_ident(chars)?,
            };
            skip_spaces(chars);
            if chars.next() != Some(']') {
                return Err(SelectorError("expected ]".to_string()));
            }
            value
        }
        _ => return Err(SelectorError(format!("unsupported attribute selector [{}", name))),
    };

    Ok(AttrSelector {
        name,
        value: Some(value),
    })
}

fn skip_spaces(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().map(|c| c.is_whitespace()).unwrap_or(false) {
        chars.next();
    }
}
