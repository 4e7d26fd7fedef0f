//! Precedence-ordered tokenizer
//!
//! Patterns claim byte ranges of the source in registry order. A later
//! match is kept only if it is disjoint from every claim, sits inside the
//! content of a claim that is not code, or wraps an earlier claim inside
//! its own content. Crossing matches are dropped. The claims therefore
//! nest cleanly and are assembled into a tree, with the unclaimed text in
//! between filled by `Text` tokens.

use std::cmp::Reverse;
use std::collections::btree_map::{self, BTreeMap};
use std::ops::Range;

use super::registry::PatternRegistry;
use super::rules::PatternDefinition;
use super::tokens::Token;
use crate::error::{HighlightError, Result};

/// Tokenize `text` into a tree of tokens covering it end to end
pub fn tokenize<'a>(registry: &PatternRegistry, text: &'a str) -> Result<Vec<Token<'a>>> {
    let mut claims = Claims::new();
    for pattern in registry.patterns() {
        claim_matches(pattern, text, &mut claims)?;
    }
    Ok(fill_gaps(text, 0..text.len(), nest(claims.into_sorted())))
}

/// Accepted claims, indexed by start offset
///
/// Claims never cross, so the ones covering an offset form one chain of
/// containment. Each claim keeps its innermost container, and overlap
/// queries walk that chain plus the claims starting inside the candidate.
struct Claims<'a> {
    tokens: Vec<Token<'a>>,
    parents: Vec<Option<usize>>,
    by_start: BTreeMap<ClaimKey, usize>,
}

/// (start, end) with longer claims first among equal starts
type ClaimKey = (usize, Reverse<usize>);

impl<'a> Claims<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            parents: Vec::new(),
            by_start: BTreeMap::new(),
        }
    }

    /// Claims containing offset `pos`, innermost first
    fn covering(&self, pos: usize) -> Covering<'_, 'a> {
        // Last claim starting at or before `pos`; every claim covering
        // `pos` is it or one of its containers
        let next = self
            .by_start
            .range(..=(pos, Reverse(0)))
            .next_back()
            .map(|(_, &idx)| idx);
        Covering {
            claims: self,
            next,
            pos,
        }
    }

    /// Claims whose start lies in `range`
    fn starting_in(&self, range: Range<usize>) -> btree_map::Range<'_, ClaimKey, usize> {
        self.by_start
            .range((range.start, Reverse(usize::MAX))..(range.end, Reverse(usize::MAX)))
    }

    /// Whether `candidate` nests with or avoids every claim
    fn fits(&self, candidate: &Token<'_>) -> bool {
        let inner = candidate.content_range();
        self.covering(candidate.range.start)
            .chain(self.starting_in(candidate.range.clone()).map(|(_, &idx)| idx))
            .all(|idx| nests(candidate, inner.as_ref(), &self.tokens[idx]))
    }

    fn insert(&mut self, token: Token<'a>) {
        let idx = self.tokens.len();
        let range = token.range.clone();
        let parent = self
            .covering(range.start)
            .find(|&c| self.tokens[c].range.end >= range.end);

        // Claims inside the new one that shared its container move under it
        let adopted: Vec<usize> = self
            .starting_in(range.clone())
            .map(|(_, &idx)| idx)
            .filter(|&c| self.tokens[c].range.end <= range.end && self.parents[c] == parent)
            .collect();
        for child in adopted {
            self.parents[child] = Some(idx);
        }

        self.parents.push(parent);
        self.by_start.insert((range.start, Reverse(range.end)), idx);
        self.tokens.push(token);
    }

    /// Claims ordered by start, longest first
    fn into_sorted(self) -> Vec<Token<'a>> {
        let mut slots: Vec<Option<Token<'a>>> = self.tokens.into_iter().map(Some).collect();
        self.by_start
            .values()
            .filter_map(|&idx| slots[idx].take())
            .collect()
    }
}

/// Walks a containment chain, skipping containers that end before `pos`
struct Covering<'c, 'a> {
    claims: &'c Claims<'a>,
    next: Option<usize>,
    pos: usize,
}

impl Iterator for Covering<'_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some(idx) = self.next {
            self.next = self.claims.parents[idx];
            if self.claims.tokens[idx].range.end > self.pos {
                return Some(idx);
            }
        }
        None
    }
}

/// Scan `text` with one pattern, adding every placeable match to `claims`
fn claim_matches<'a>(
    pattern: &PatternDefinition,
    text: &'a str,
    claims: &mut Claims<'a>,
) -> Result<()> {
    let mut pos = 0;
    while let Some(caps) = pattern.captures_at(text, pos) {
        let whole = caps
            .get(0)
            .ok_or_else(|| HighlightError::extract(pattern.name, "match without group 0"))?;
        if whole.range().is_empty() {
            pos = next_char(text, whole.start());
            continue;
        }

        let candidate = pattern.extract(&caps)?;
        if claims.fits(&candidate) {
            pos = whole.end();
            claims.insert(candidate);
        } else {
            pos = resume_after(text, whole.start(), claims);
        }
    }
    Ok(())
}

/// Whether `candidate` and `claim` are disjoint or properly nested
fn nests(candidate: &Token<'_>, inner: Option<&Range<usize>>, claim: &Token<'_>) -> bool {
    if disjoint(&candidate.range, &claim.range) {
        return true;
    }
    if candidate.range == claim.range {
        return false;
    }
    let wraps_claim =
        !candidate.token_type().is_opaque() && inner.is_some_and(|c| contains(c, &claim.range));
    let inside_claim = !claim.token_type().is_opaque()
        && claim
            .content_range()
            .is_some_and(|c| contains(&c, &candidate.range));
    wraps_claim || inside_claim
}

/// Where to continue scanning after a rejected match starting at `start`
///
/// Inside code nothing can ever be placed, so skip to its end.
fn resume_after(text: &str, start: usize, claims: &Claims<'_>) -> usize {
    claims
        .covering(start)
        .map(|idx| &claims.tokens[idx])
        .filter(|claim| claim.token_type().is_opaque())
        .map(|claim| claim.range.end)
        .max()
        .unwrap_or_else(|| next_char(text, start))
}

fn next_char(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(pos + 1, |c| pos + c.len_utf8())
}

fn disjoint(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.end <= b.start || b.end <= a.start
}

fn contains(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// Arrange claims sorted by (start, longest first) into a forest
fn nest(claims: Vec<Token<'_>>) -> Vec<Token<'_>> {
    let mut roots = Vec::new();
    let mut stack: Vec<Token<'_>> = Vec::new();

    for token in claims {
        while stack
            .last()
            .is_some_and(|open| !contains(&open.range, &token.range))
        {
            if let Some(done) = stack.pop() {
                attach(done, &mut stack, &mut roots);
            }
        }
        stack.push(token);
    }
    while let Some(done) = stack.pop() {
        attach(done, &mut stack, &mut roots);
    }
    roots
}

fn attach<'a>(token: Token<'a>, stack: &mut [Token<'a>], roots: &mut Vec<Token<'a>>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(token),
        None => roots.push(token),
    }
}

/// Cover `span` completely, wrapping unclaimed stretches in `Text` tokens
fn fill_gaps<'a>(text: &'a str, span: Range<usize>, tokens: Vec<Token<'a>>) -> Vec<Token<'a>> {
    let mut filled = Vec::with_capacity(tokens.len() * 2 + 1);
    let mut cursor = span.start;

    for mut token in tokens {
        if token.range.start > cursor {
            filled.push(Token::text(text, cursor..token.range.start));
        }
        cursor = token.range.end;
        if let Some(content) = token.content_range() {
            let children = std::mem::take(&mut token.children);
            token.children = fill_gaps(text, content, children);
        }
        filled.push(token);
    }
    if cursor < span.end {
        filled.push(Token::text(text, cursor..span.end));
    }
    filled
}
