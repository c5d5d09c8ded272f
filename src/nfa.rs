// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The backtracking engine.
//!
//! This is the engine of last resort: it handles every pattern the parser
//! accepts, at the cost of potentially super-linear time. Matching is a
//! recursive descent over a compiled mirror of the AST with an explicit
//! continuation threaded through: a continuation is a stack-allocated
//! linked list recording what remains to be matched, so no per-step
//! allocation happens.
//!
//! Quantifiers are greedy: each tries to consume as many instances as its
//! bound allows, then peels back one instance at a time until the
//! continuation succeeds. For single-byte nodes (literals, classes,
//! wildcard) the consume phase is a vectorized run scan and the peel is a
//! backwards walk over the run, which removes recursion from the common
//! `[x]*`/`x{n,m}` shapes entirely.
//!
//! Alternation evaluates both branches and keeps the longer overall
//! match, ties to the left. Together with greedy quantifiers this gives
//! the POSIX-like leftmost-longest semantics, and in particular makes
//! this engine agree with the DFA on everything both can run.
//!
//! Recursion is budgeted. Blowing the budget reports
//! [`Error::PatternTooComplex`] instead of overflowing the stack.

use tracing::trace;

use crate::ast::{Anchor, Ast, AstKind, ClassSet, UNBOUNDED};
use crate::byteclass::ClassMatcher;
use crate::classify::Classification;
use crate::error::Error;
use crate::twoway::{LiteralSearcher, MultiLiteralSearcher};

/// Default recursion budget. Each backtracking choice point costs a
/// handful of frames, so this supports patterns a few thousand choice
/// points deep.
pub const DEFAULT_RECURSION_LIMIT: usize = 8192;

/// A compiled backtracking program: the AST with eagerly-built byte-class
/// matchers at the leaves. Immutable after construction; all match state
/// lives on the call stack.
#[derive(Clone, Debug)]
pub struct Nfa {
    prog: PNode,
    anchored_start: bool,
    /// Jump scan: every match starts with this literal.
    prefix: Option<LiteralSearcher>,
    /// Jump scan for exact multi-literal patterns: every match starts
    /// with one of the needles.
    multi_prefix: Option<MultiLiteralSearcher>,
    /// Cutoff scan: every match contains this literal somewhere.
    required: Option<LiteralSearcher>,
    recursion_limit: usize,
}

/// One node of the compiled program. Quantifier bounds ride on the node,
/// exactly as in the AST.
#[derive(Clone, Debug)]
struct PNode {
    min: u32,
    max: u32,
    kind: PKind,
}

#[derive(Clone, Debug)]
enum PKind {
    /// Match one specific byte.
    Byte(u8),
    /// Match one byte of a class; the matcher carries the SIMD scanner.
    Class(ClassMatcher),
    Anchor(Anchor),
    /// Concatenation.
    Seq(Vec<PNode>),
    Alt(Box<PNode>, Box<PNode>),
}

impl PNode {
    fn from_ast(ast: &Ast) -> PNode {
        let kind = match ast.kind {
            AstKind::Literal(b) => PKind::Byte(b),
            AstKind::Wildcard => {
                PKind::Class(ClassMatcher::new(&ClassSet::dot()))
            }
            AstKind::Class(ref set) => {
                PKind::Class(ClassMatcher::new(set))
            }
            AstKind::Anchor(a) => PKind::Anchor(a),
            AstKind::Group { ref children, .. } => {
                PKind::Seq(children.iter().map(PNode::from_ast).collect())
            }
            AstKind::Alternation { ref left, ref right } => PKind::Alt(
                Box::new(PNode::from_ast(left)),
                Box::new(PNode::from_ast(right)),
            ),
        };
        PNode { min: ast.min, max: ast.max, kind }
    }

    /// Single-byte nodes get the non-recursive quantifier path.
    fn is_single_byte(&self) -> bool {
        matches!(self.kind, PKind::Byte(_) | PKind::Class(_))
    }
}

/// The rest of the pattern beyond the node currently being matched, as a
/// linked list through the call stack.
enum Cont<'p, 'k> {
    /// Nothing left: the position reached is the match end.
    Done,
    /// Remaining children of a concatenation, then `next`.
    Seq { nodes: &'p [PNode], idx: usize, next: &'k Cont<'p, 'k> },
    /// An in-progress quantifier over `node`: `at` is where the last
    /// instance started, for the zero-width guard.
    Rep { node: &'p PNode, count: u32, at: usize, next: &'k Cont<'p, 'k> },
}

impl Nfa {
    /// Compile a classified pattern. Infallible: the backtracker handles
    /// everything the parser accepts.
    pub fn compile(
        ast: &Ast,
        info: &Classification,
        recursion_limit: usize,
    ) -> Nfa {
        let prefix = if info.anchored_start {
            None
        } else {
            info.literals
                .best_prefix()
                .map(|lit| LiteralSearcher::new(lit.bytes.clone()))
        };
        let multi_prefix = if info.anchored_start || prefix.is_some() {
            None
        } else {
            info.literals
                .exact_needles()
                .filter(|needles| needles.len() > 1)
                .map(MultiLiteralSearcher::new)
        };
        let required = if prefix.is_some() || multi_prefix.is_some() {
            None
        } else {
            info.literals
                .best_required()
                .map(|lit| LiteralSearcher::new(lit.bytes.clone()))
        };
        Nfa {
            prog: PNode::from_ast(ast),
            anchored_start: info.anchored_start,
            prefix,
            multi_prefix,
            required,
            recursion_limit,
        }
    }

    /// Longest match starting exactly at `at`.
    pub fn match_at(
        &self,
        text: &[u8],
        at: usize,
    ) -> Result<Option<usize>, Error> {
        if at > text.len() {
            return Ok(None);
        }
        let mut run = Run {
            text,
            limit: self.recursion_limit,
            overflowed: false,
        };
        let result = run.match_node(&self.prog, at, &Cont::Done, 0);
        if run.overflowed {
            trace!(at, "recursion budget exceeded");
            return Err(Error::PatternTooComplex);
        }
        Ok(result)
    }

    /// Leftmost match with `match.start >= start`.
    pub fn find(
        &self,
        text: &[u8],
        start: usize,
    ) -> Result<Option<(usize, usize)>, Error> {
        if start > text.len() {
            return Ok(None);
        }
        if self.anchored_start {
            if start > 0 {
                return Ok(None);
            }
            return Ok(self.match_at(text, 0)?.map(|end| (0, end)));
        }
        let mut at = start;
        // The latest position at which the required literal is known to
        // occur; no match can start in a suffix that lacks it.
        let mut required_seen: Option<usize> = None;
        loop {
            if at > text.len() {
                return Ok(None);
            }
            if let Some(ref pre) = self.prefix {
                at = match pre.find(text, at) {
                    None => return Ok(None),
                    Some(p) => p,
                };
            } else if let Some(ref multi) = self.multi_prefix {
                at = match multi.find(text, at) {
                    None => return Ok(None),
                    Some((p, _)) => p,
                };
            } else if let Some(ref req) = self.required {
                let stale = required_seen.map_or(true, |q| q < at);
                if stale {
                    match req.find(text, at) {
                        None => return Ok(None),
                        Some(q) => required_seen = Some(q),
                    }
                }
            }
            if let Some(end) = self.match_at(text, at)? {
                return Ok(Some((at, end)));
            }
            at += 1;
        }
    }

    /// True iff some match starts at or after `start`.
    pub fn is_match(&self, text: &[u8], start: usize) -> Result<bool, Error> {
        Ok(self.find(text, start)?.is_some())
    }

    /// All non-overlapping matches, leftmost first, with the
    /// `p + max(L, 1)` advance rule.
    pub fn find_all(
        &self,
        text: &[u8],
    ) -> Result<Vec<(usize, usize)>, Error> {
        let mut out = Vec::new();
        let mut at = 0;
        while at <= text.len() {
            match self.find(text, at)? {
                None => break,
                Some((s, e)) => {
                    out.push((s, e));
                    at = s + (e - s).max(1);
                }
            }
        }
        Ok(out)
    }
}

/// Per-call match state: the input and the recursion accounting. All
/// backtracking state proper lives in the continuation chain on the call
/// stack.
struct Run<'t> {
    text: &'t [u8],
    limit: usize,
    overflowed: bool,
}

impl<'t> Run<'t> {
    /// Match `node` (with its quantifier) followed by `k`, starting at
    /// `pos`. Returns the end of the overall match.
    fn match_node<'p>(
        &mut self,
        node: &'p PNode,
        pos: usize,
        k: &Cont<'p, '_>,
        depth: usize,
    ) -> Option<usize> {
        if depth >= self.limit {
            self.overflowed = true;
            return None;
        }
        if node.min == 1 && node.max == 1 {
            return self.match_single(node, pos, k, depth + 1);
        }
        if node.max == 0 {
            return self.cont(k, pos, depth + 1);
        }
        if node.is_single_byte() {
            return self.bulk_quant(node, pos, k, depth + 1);
        }
        self.repeat(node, 0, pos, k, depth + 1)
    }

    /// Greedy quantifier over a single-byte node: scan the whole run at
    /// once, then peel back byte by byte.
    fn bulk_quant<'p>(
        &mut self,
        node: &'p PNode,
        pos: usize,
        k: &Cont<'p, '_>,
        depth: usize,
    ) -> Option<usize> {
        let remaining = self.text.len() - pos.min(self.text.len());
        let cap = if node.max == UNBOUNDED {
            remaining
        } else {
            remaining.min(node.max as usize)
        };
        let run = match node.kind {
            PKind::Byte(b) => {
                let mut n = 0;
                while n < cap && self.text[pos + n] == b {
                    n += 1;
                }
                n
            }
            PKind::Class(ref m) => m.run_len(self.text, pos, pos + cap),
            _ => unreachable!("bulk_quant requires a single-byte node"),
        };
        let need = node.min as usize;
        if run < need {
            return None;
        }
        for take in (need..=run).rev() {
            if depth + 1 >= self.limit {
                self.overflowed = true;
                return None;
            }
            if let Some(end) = self.cont(k, pos + take, depth + 1) {
                return Some(end);
            }
            if self.overflowed {
                return None;
            }
        }
        None
    }

    /// Greedy quantifier over a composite node: prefer one more instance,
    /// fall back to the continuation once the minimum is met.
    fn repeat<'p>(
        &mut self,
        node: &'p PNode,
        count: u32,
        pos: usize,
        k: &Cont<'p, '_>,
        depth: usize,
    ) -> Option<usize> {
        if depth >= self.limit {
            self.overflowed = true;
            return None;
        }
        if count < node.max {
            let more = Cont::Rep { node, count: count + 1, at: pos, next: k };
            if let Some(end) = self.match_single(node, pos, &more, depth + 1)
            {
                return Some(end);
            }
            if self.overflowed {
                return None;
            }
        }
        if count >= node.min {
            return self.cont(k, pos, depth + 1);
        }
        None
    }

    /// Match exactly one instance of `node`, then `k`.
    fn match_single<'p>(
        &mut self,
        node: &'p PNode,
        pos: usize,
        k: &Cont<'p, '_>,
        depth: usize,
    ) -> Option<usize> {
        if depth >= self.limit {
            self.overflowed = true;
            return None;
        }
        match node.kind {
            PKind::Byte(b) => {
                if self.text.get(pos) == Some(&b) {
                    self.cont(k, pos + 1, depth + 1)
                } else {
                    None
                }
            }
            PKind::Class(ref m) => {
                if self.text.get(pos).is_some_and(|&b| m.contains(b)) {
                    self.cont(k, pos + 1, depth + 1)
                } else {
                    None
                }
            }
            PKind::Anchor(Anchor::Start) => {
                if pos == 0 {
                    self.cont(k, pos, depth + 1)
                } else {
                    None
                }
            }
            PKind::Anchor(Anchor::End) => {
                if pos == self.text.len() {
                    self.cont(k, pos, depth + 1)
                } else {
                    None
                }
            }
            PKind::Seq(ref nodes) => match nodes.first() {
                None => self.cont(k, pos, depth + 1),
                Some(first) => {
                    let rest =
                        Cont::Seq { nodes: nodes.as_slice(), idx: 1, next: k };
                    self.match_node(first, pos, &rest, depth + 1)
                }
            },
            PKind::Alt(ref left, ref right) => {
                let a = self.match_node(left, pos, k, depth + 1);
                if self.overflowed {
                    return None;
                }
                let b = self.match_node(right, pos, k, depth + 1);
                // Longest wins; the left branch keeps ties.
                match (a, b) {
                    (Some(x), Some(y)) => Some(x.max(y)),
                    (a, b) => a.or(b),
                }
            }
        }
    }

    /// Resume the continuation at `pos`.
    fn cont<'p>(
        &mut self,
        k: &Cont<'p, '_>,
        pos: usize,
        depth: usize,
    ) -> Option<usize> {
        if depth >= self.limit {
            self.overflowed = true;
            return None;
        }
        match *k {
            Cont::Done => Some(pos),
            Cont::Seq { nodes, idx, next } => {
                if idx == nodes.len() {
                    self.cont(next, pos, depth + 1)
                } else {
                    let rest = Cont::Seq { nodes, idx: idx + 1, next };
                    self.match_node(&nodes[idx], pos, &rest, depth + 1)
                }
            }
            Cont::Rep { node, count, at, next } => {
                if pos == at {
                    // The instance matched nothing; further iterations
                    // would loop forever and can only match nothing too.
                    self.cont(next, pos, depth + 1)
                } else {
                    self.repeat(node, count, pos, next, depth + 1)
                }
            }
        }
    }
}
