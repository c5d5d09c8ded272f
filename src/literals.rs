// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Literal extraction from a parsed pattern.
//!
//! A literal that every match must start with (a *prefix*) or contain (a
//! *required* literal) lets the matching engines jump through the input
//! with a substring search instead of trying every position. Extraction is
//! budgeted: past a point, a big literal set costs more to search than it
//! saves, so the extractor simply stops and reports what it has.

use crate::ast::{Ast, AstKind};

/// The longest literal worth extracting. Matches beyond this length are
/// confirmed by the engine anyway.
const MAX_LITERAL_LEN: usize = 64;

/// The most needles a multi-literal set may hold.
const MAX_ALTERNATES: usize = 32;

/// One extracted literal with its relationship to the match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Literal {
    pub bytes: Vec<u8>,
    /// Every match starts with these bytes.
    pub is_prefix: bool,
    /// Every match ends with these bytes.
    pub is_suffix: bool,
    /// Every match contains these bytes somewhere.
    pub is_required: bool,
}

/// The set of literals extracted from one pattern.
#[derive(Clone, Debug, Default)]
pub struct LiteralSet {
    pub lits: Vec<Literal>,
    /// True when `lits` is exactly the language of the pattern: a
    /// position matches the pattern if and only if one of these strings
    /// occurs there. Set for pure-literal patterns and all-literal
    /// alternations, and enables the multi-literal fast path.
    pub exact: bool,
}

impl LiteralSet {
    fn empty() -> LiteralSet {
        LiteralSet { lits: Vec::new(), exact: false }
    }

    /// Returns true if and only if nothing was extracted.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    /// The longest prefix literal, if any.
    pub fn best_prefix(&self) -> Option<&Literal> {
        self.lits
            .iter()
            .filter(|l| l.is_prefix)
            .max_by_key(|l| l.bytes.len())
    }

    /// The longest required literal, if any. Prefixes are required by
    /// definition and participate.
    pub fn best_required(&self) -> Option<&Literal> {
        self.lits
            .iter()
            .filter(|l| l.is_required)
            .max_by_key(|l| l.bytes.len())
    }

    /// The literal most worth searching for: the longest required
    /// literal, else the longest prefix, else the longest literal found
    /// anywhere. The engines consult the sharper `best_prefix` and
    /// `best_required` directly; this is the summary form.
    #[allow(dead_code)]
    pub fn get_best_literal(&self) -> Option<&Literal> {
        self.best_required()
            .or_else(|| self.best_prefix())
            .or_else(|| self.lits.iter().max_by_key(|l| l.bytes.len()))
    }

    /// The needles of an exact multi-literal set, in priority order.
    pub fn exact_needles(&self) -> Option<Vec<Vec<u8>>> {
        if !self.exact || self.lits.is_empty() {
            return None;
        }
        Some(self.lits.iter().map(|l| l.bytes.clone()).collect())
    }

    fn push_unique(&mut self, lit: Literal) {
        if lit.bytes.is_empty() {
            return;
        }
        if let Some(existing) =
            self.lits.iter_mut().find(|l| l.bytes == lit.bytes)
        {
            existing.is_prefix |= lit.is_prefix;
            existing.is_suffix |= lit.is_suffix;
            existing.is_required |= lit.is_required;
            return;
        }
        self.lits.push(lit);
    }
}

/// Extract literals from a pattern.
pub fn extract(ast: &Ast) -> LiteralSet {
    // A pattern that can match the empty string has no mandatory bytes
    // at all, and any jump scan built from partial literals would skip
    // its zero-width matches.
    if ast.matches_empty() {
        return LiteralSet::empty();
    }
    // An all-literal alternation is its own complete description; nothing
    // more can be learned by walking further. Anchors disqualify the
    // exact set: `^hello` matches strictly fewer positions than the
    // substring `hello` does.
    if !contains_anchor(ast) {
        if let Some(alts) = exact_alternates(ast) {
            return exact_set(alts);
        }
    }
    general_extract(ast)
}

fn exact_set(alts: Vec<Vec<u8>>) -> LiteralSet {
    // With several branches no single entry is a universal prefix or a
    // required literal; the per-entry flags stay false and the set's
    // exactness carries the information instead.
    let single = alts.len() == 1;
    let mut set = LiteralSet { lits: Vec::new(), exact: true };
    for bytes in alts {
        set.push_unique(Literal {
            bytes,
            is_prefix: single,
            is_suffix: single,
            is_required: single,
        });
    }
    set
}

fn general_extract(ast: &Ast) -> LiteralSet {
    let mut set = LiteralSet::empty();
    let (prefix, prefix_exact) = prefix_run(ast);
    if !prefix.is_empty() {
        set.push_unique(Literal {
            bytes: prefix,
            is_prefix: true,
            is_suffix: prefix_exact,
            is_required: true,
        });
    }
    let suffix = suffix_run(ast);
    if !suffix.is_empty() {
        set.push_unique(Literal {
            bytes: suffix,
            is_prefix: false,
            is_suffix: true,
            is_required: true,
        });
    }
    for run in required_runs(ast) {
        set.push_unique(Literal {
            bytes: run,
            is_prefix: false,
            is_suffix: false,
            is_required: true,
        });
    }
    // A common prefix across alternation branches is a prefix of every
    // match even when the branches themselves are not pure literals.
    if let Some(lcp) = alternation_common_prefix(ast) {
        set.push_unique(Literal {
            bytes: lcp,
            is_prefix: true,
            is_suffix: false,
            is_required: true,
        });
    }
    set
}

/// Returns true if and only if the pattern contains an anchor anywhere.
fn contains_anchor(ast: &Ast) -> bool {
    match ast.kind {
        AstKind::Anchor(_) => true,
        AstKind::Group { ref children, .. } => {
            children.iter().any(contains_anchor)
        }
        AstKind::Alternation { ref left, ref right } => {
            contains_anchor(left) || contains_anchor(right)
        }
        _ => false,
    }
}

/// The children of the top-level concatenation, with zero-width anchors
/// stripped; a lone atom is a one-child concatenation.
fn top_children(ast: &Ast) -> Vec<&Ast> {
    let children: Vec<&Ast> = match ast.kind {
        AstKind::Group { ref children, .. } if !ast.is_quantified() => {
            children.iter().collect()
        }
        _ => vec![ast],
    };
    children
        .into_iter()
        .filter(|c| !matches!(c.kind, AstKind::Anchor(_)))
        .collect()
}

/// If the pattern is an alternation whose branches are all pure literal
/// runs (or a single pure literal run), return the branch strings in
/// priority order.
fn exact_alternates(ast: &Ast) -> Option<Vec<Vec<u8>>> {
    let children = top_children(ast);
    if children.len() == 1 {
        if let AstKind::Alternation { .. } = children[0].kind {
            let mut branches = Vec::new();
            flatten_alternation(children[0], &mut branches);
            if branches.len() > MAX_ALTERNATES {
                return None;
            }
            return branches
                .iter()
                .map(|b| pure_literal_run(b))
                .collect::<Option<Vec<_>>>();
        }
    }
    // Not an alternation: the whole pattern must be one literal run.
    let mut bytes = Vec::new();
    for child in &children {
        bytes.append(&mut pure_literal_run(child)?);
    }
    if bytes.is_empty() || bytes.len() > MAX_LITERAL_LEN {
        None
    } else {
        Some(vec![bytes])
    }
}

/// Collect the branches of a right-associative alternation chain.
fn flatten_alternation<'a>(ast: &'a Ast, out: &mut Vec<&'a Ast>) {
    match ast.kind {
        AstKind::Alternation { ref left, ref right }
            if !ast.is_quantified() =>
        {
            out.push(left);
            flatten_alternation(right, out);
        }
        _ => out.push(ast),
    }
}

/// The byte string of a pure literal run: unquantified literals, possibly
/// inside unquantified groups. `None` when anything else participates.
fn pure_literal_run(ast: &Ast) -> Option<Vec<u8>> {
    fn walk(ast: &Ast, out: &mut Vec<u8>) -> bool {
        if ast.is_quantified() {
            return false;
        }
        match ast.kind {
            AstKind::Literal(b) => {
                out.push(b);
                out.len() <= MAX_LITERAL_LEN
            }
            AstKind::Group { ref children, .. } => {
                children.iter().all(|c| walk(c, out))
            }
            _ => false,
        }
    }
    let mut out = Vec::new();
    if walk(ast, &mut out) {
        Some(out)
    } else {
        None
    }
}

/// The literal bytes every match must start with, and whether the run
/// covers the entire pattern.
fn prefix_run(ast: &Ast) -> (Vec<u8>, bool) {
    let mut out = Vec::new();
    let children = top_children(ast);
    for child in &children {
        // A false return leaves any fixed leading bytes of `child` in
        // `out`; the run simply stops being exact there.
        if !append_mandatory(child, &mut out) {
            return (out, false);
        }
        if out.len() >= MAX_LITERAL_LEN {
            return (out, false);
        }
    }
    (out, true)
}

/// The literal bytes every match must end with.
fn suffix_run(ast: &Ast) -> Vec<u8> {
    let mut out = Vec::new();
    for child in top_children(ast).iter().rev() {
        if child.min != child.max {
            break;
        }
        let mut piece = Vec::new();
        if !append_mandatory(child, &mut piece) {
            break;
        }
        piece.extend_from_slice(&out);
        out = piece;
        if out.len() >= MAX_LITERAL_LEN {
            break;
        }
    }
    out
}

/// Append the bytes `node` must contribute to every match when it matches
/// the minimum number of times. Returns false when the contribution is
/// inexact or when `node` is not a literal contributor (class, wildcard,
/// alternation, optional subtree); `out` keeps whatever was appended
/// before the walk stopped.
fn append_mandatory(node: &Ast, out: &mut Vec<u8>) -> bool {
    if node.min == 0 {
        return false;
    }
    match node.kind {
        AstKind::Literal(b) => {
            let reps = (node.min as usize).min(MAX_LITERAL_LEN - out.len());
            out.extend(std::iter::repeat(b).take(reps));
            // Exact only when the repetition count is fixed.
            node.min == node.max
        }
        AstKind::Group { ref children, .. }
            if node.min == 1 && node.max == 1 =>
        {
            children.iter().all(|c| append_mandatory(c, out))
        }
        _ => false,
    }
}

/// Interior literal runs on the mandatory path: runs that every match
/// must contain, no matter which alternation branches or optional pieces
/// are taken around them.
fn required_runs(ast: &Ast) -> Vec<Vec<u8>> {
    fn flush(runs: &mut Vec<Vec<u8>>, current: &mut Vec<u8>) {
        if !current.is_empty() {
            runs.push(std::mem::take(current));
        }
    }
    fn walk(node: &Ast, runs: &mut Vec<Vec<u8>>, current: &mut Vec<u8>) {
        // Anything optional or branching breaks the current run.
        if node.min == 0
            || matches!(
                node.kind,
                AstKind::Alternation { .. }
                    | AstKind::Wildcard
                    | AstKind::Class(_)
            )
        {
            flush(runs, current);
            return;
        }
        match node.kind {
            AstKind::Literal(b) => {
                if current.len() < MAX_LITERAL_LEN {
                    current
                        .extend(std::iter::repeat(b).take(node.min as usize));
                }
                if node.min != node.max {
                    flush(runs, current);
                }
            }
            AstKind::Anchor(_) => {}
            AstKind::Group { ref children, .. } => {
                if node.min == 1 && node.max == 1 {
                    for child in children {
                        walk(child, runs, current);
                    }
                } else {
                    // Bytes inside a repeated group are still required,
                    // but do not concatenate with the surrounding run.
                    flush(runs, current);
                    for child in children {
                        walk(child, runs, current);
                    }
                    flush(runs, current);
                }
            }
            _ => flush(runs, current),
        }
    }
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for child in top_children(ast) {
        walk(child, &mut runs, &mut current);
    }
    flush(&mut runs, &mut current);
    runs
}

/// When the whole pattern is one alternation, the longest common prefix
/// of the branches' own prefixes. Only worth reporting at three bytes or
/// more.
fn alternation_common_prefix(ast: &Ast) -> Option<Vec<u8>> {
    const MIN_COMMON_PREFIX: usize = 3;
    let children = top_children(ast);
    if children.len() != 1 {
        return None;
    }
    if !matches!(children[0].kind, AstKind::Alternation { .. }) {
        return None;
    }
    let mut branches = Vec::new();
    flatten_alternation(children[0], &mut branches);
    let mut lcp: Option<Vec<u8>> = None;
    for branch in branches {
        let (prefix, _) = prefix_run(branch);
        lcp = Some(match lcp {
            None => prefix,
            Some(acc) => {
                let common = acc
                    .iter()
                    .zip(prefix.iter())
                    .take_while(|(a, b)| a == b)
                    .count();
                acc[..common].to_vec()
            }
        });
        if lcp.as_ref().map_or(false, |l| l.is_empty()) {
            return None;
        }
    }
    lcp.filter(|l| l.len() >= MIN_COMMON_PREFIX)
}
