// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The deterministic engine.
//!
//! Compilation is Thompson construction to a small byte-class epsilon-NFA
//! followed by subset construction into a dense `num_states x 256`
//! transition table. State 0 is the dead state; state 1 is the start
//! state. Construction fails with `PatternTooLarge` past the state budget
//! and `UnsupportedConstruct` for anything the table cannot express
//! (interior anchors); the dispatcher recovers both by falling back to
//! the backtracking engine.
//!
//! Execution is constant work per byte: one table load per input byte,
//! tracking the last accepting position for greedy longest-match
//! semantics. Two vector accelerations apply: states that loop on a byte
//! class bulk-advance with a [`ClassMatcher`] instead of stepping, and
//! unanchored scans jump between candidate start positions with a prefix
//! literal search or a start-byte class scan.

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{Anchor, Ast, AstKind, ClassSet, UNBOUNDED};
use crate::byteclass::ClassMatcher;
use crate::classify::{Classification, DFA_STATE_BUDGET};
use crate::error::Error;
use crate::twoway::{LiteralSearcher, MultiLiteralSearcher};

/// The dead state: all transitions in, none out.
const DEAD: u32 = 0;
/// The start state.
const START: u32 = 1;

/// Self-loops on fewer bytes than this are cheaper to step through.
const ACCEL_MIN_CLASS: usize = 4;

/// A start-byte set wider than this skips almost nothing.
const START_CLASS_LIMIT: usize = 128;

/// A compiled deterministic automaton. Immutable after construction and
/// freely shareable; execution keeps all its state in two locals.
#[derive(Clone, Debug)]
pub struct Dfa {
    /// Dense transition map, `num_states * 256` entries.
    table: Vec<u32>,
    /// Per-state accepting flag.
    accepting: Vec<bool>,
    /// True iff every match must start at position 0.
    anchored_start: bool,
    /// True iff every match must end at the end of the input.
    anchored_end: bool,
    /// Per-state bulk-advance matcher for states that loop on a class,
    /// indexing into `matchers`.
    state_class: Vec<Option<u32>>,
    matchers: Vec<ClassMatcher>,
    /// Jump-to-candidate scan for unanchored searches.
    prefilter: Option<LiteralSearcher>,
    /// Jump scan for exact multi-literal patterns (`a|b|c` over pure
    /// literal branches): every match starts with one of the needles.
    multi_prefilter: Option<MultiLiteralSearcher>,
    /// Scan for bytes the start state survives, used when there is no
    /// literal prefix.
    start_class: Option<ClassMatcher>,
}

impl Dfa {
    /// Compile a classified pattern into a DFA, with at most `state_limit`
    /// states. [`DFA_STATE_BUDGET`] is the default limit.
    pub fn compile(
        ast: &Ast,
        info: &Classification,
        state_limit: usize,
    ) -> Result<Dfa, Error> {
        // Thompson construction is linear in the expanded pattern, so a
        // limit on epsilon-NFA states also bounds quantifier unrolling.
        let mut builder =
            Builder { states: Vec::new(), limit: 2 * state_limit };
        let inner = strip_outer_anchors(ast, info);
        let (entry, exit) = builder.compile_seq(&inner)?;
        let (table, accepting) = determinize(&builder, entry, exit, state_limit)?;

        let num_states = accepting.len();
        let mut matchers = Vec::new();
        let mut state_class = vec![None; num_states];
        for s in 1..num_states {
            let mut loop_set = ClassSet::empty();
            for b in 0..=255u8 {
                if table[s * 256 + b as usize] == s as u32 {
                    loop_set.insert(b);
                }
            }
            if loop_set.len() >= ACCEL_MIN_CLASS {
                state_class[s] = Some(matchers.len() as u32);
                matchers.push(ClassMatcher::new(&loop_set));
            }
        }

        let prefilter = if info.anchored_start {
            None
        } else {
            info.literals
                .best_prefix()
                .map(|lit| LiteralSearcher::new(lit.bytes.clone()))
        };
        let multi_prefilter = if info.anchored_start || prefilter.is_some() {
            None
        } else {
            info.literals
                .exact_needles()
                .filter(|needles| needles.len() > 1)
                .map(MultiLiteralSearcher::new)
        };
        let start_class = if info.anchored_start
            || prefilter.is_some()
            || multi_prefilter.is_some()
        {
            None
        } else {
            let mut live = ClassSet::empty();
            for b in 0..=255u8 {
                if table[START as usize * 256 + b as usize] != DEAD {
                    live.insert(b);
                }
            }
            if live.len() <= START_CLASS_LIMIT {
                Some(ClassMatcher::new(&live))
            } else {
                None
            }
        };

        debug!(
            states = num_states,
            accelerated = matchers.len(),
            prefilter = prefilter.is_some(),
            "compiled DFA"
        );
        Ok(Dfa {
            table,
            accepting,
            anchored_start: info.anchored_start,
            anchored_end: info.anchored_end,
            state_class,
            matchers,
            prefilter,
            multi_prefilter,
            start_class,
        })
    }

    /// The number of states, dead state included.
    #[allow(dead_code)]
    pub fn num_states(&self) -> usize {
        self.accepting.len()
    }

    /// Longest match starting exactly at `at`, as the end offset.
    ///
    /// Respects the end anchor; the start anchor is the caller's business
    /// because only the caller knows whether `at` is a real start.
    pub fn run_from(&self, text: &[u8], at: usize) -> Option<usize> {
        let end = text.len();
        let mut state = START;
        let mut last_accept =
            if self.accepting[START as usize] { Some(at) } else { None };
        let mut pos = at;
        while pos < end {
            if let Some(mi) = self.state_class[state as usize] {
                let k = self.matchers[mi as usize].run_len(text, pos, end);
                if k > 0 {
                    pos += k;
                    if self.accepting[state as usize] {
                        last_accept = Some(pos);
                    }
                    if pos >= end {
                        break;
                    }
                }
            }
            state = self.table[state as usize * 256 + text[pos] as usize];
            if state == DEAD {
                break;
            }
            pos += 1;
            if self.accepting[state as usize] {
                last_accept = Some(pos);
            }
        }
        if self.anchored_end {
            if state != DEAD
                && pos == end
                && self.accepting[state as usize]
            {
                Some(end)
            } else {
                None
            }
        } else {
            last_accept
        }
    }

    /// Leftmost match with `match.start >= start`, as half-open offsets.
    pub fn find(&self, text: &[u8], start: usize) -> Option<(usize, usize)> {
        if start > text.len() {
            return None;
        }
        if self.anchored_start {
            if start > 0 {
                return None;
            }
            return self.run_from(text, 0).map(|end| (0, end));
        }
        let mut at = start;
        loop {
            at = self.candidate(text, at)?;
            if let Some(end) = self.run_from(text, at) {
                return Some((at, end));
            }
            at += 1;
            if at > text.len() {
                return None;
            }
        }
    }

    /// True iff some match starts at or after `start`. Stops at the first
    /// accepting state instead of chasing the longest match.
    pub fn is_match(&self, text: &[u8], start: usize) -> bool {
        if self.anchored_end {
            return self.find(text, start).is_some();
        }
        if start > text.len() {
            return false;
        }
        if self.anchored_start {
            return start == 0 && self.accepts_from(text, 0);
        }
        let mut at = start;
        loop {
            at = match self.candidate(text, at) {
                None => return false,
                Some(at) => at,
            };
            if self.accepts_from(text, at) {
                return true;
            }
            at += 1;
            if at > text.len() {
                return false;
            }
        }
    }

    /// All non-overlapping matches, leftmost first. A match of length `L`
    /// at `p` resumes the scan at `p + max(L, 1)`, so zero-width matches
    /// advance and cannot loop.
    pub fn find_all(&self, text: &[u8]) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut at = 0;
        while at <= text.len() {
            match self.find(text, at) {
                None => break,
                Some((s, e)) => {
                    out.push((s, e));
                    at = s + (e - s).max(1);
                }
            }
        }
        out
    }

    /// The next position at or after `at` where a match could start.
    /// `None` means the rest of the input cannot match.
    fn candidate(&self, text: &[u8], at: usize) -> Option<usize> {
        if self.accepting[START as usize] {
            // The pattern matches the empty string, so everywhere is a
            // candidate.
            return Some(at);
        }
        if at >= text.len() {
            return None;
        }
        if let Some(ref searcher) = self.prefilter {
            return searcher.find(text, at);
        }
        if let Some(ref multi) = self.multi_prefilter {
            return multi.find(text, at).map(|(pos, _)| pos);
        }
        if let Some(ref sc) = self.start_class {
            return sc.find_first(text, at);
        }
        Some(at)
    }

    fn accepts_from(&self, text: &[u8], at: usize) -> bool {
        let end = text.len();
        let mut state = START;
        if self.accepting[START as usize] {
            return true;
        }
        let mut pos = at;
        while pos < end {
            if let Some(mi) = self.state_class[state as usize] {
                // `state` is not accepting here, so the whole run can be
                // skipped without missing a match.
                pos += self.matchers[mi as usize].run_len(text, pos, end);
                if pos >= end {
                    break;
                }
            }
            state = self.table[state as usize * 256 + text[pos] as usize];
            if state == DEAD {
                return false;
            }
            if self.accepting[state as usize] {
                return true;
            }
            pos += 1;
        }
        false
    }
}

/// The top-level concatenation with outer anchors removed; the executor
/// re-imposes them via the `anchored_*` flags.
fn strip_outer_anchors<'a>(ast: &'a Ast, info: &Classification) -> Vec<&'a Ast> {
    let mut children: Vec<&Ast> = match ast.kind {
        AstKind::Group { ref children, .. } if !ast.is_quantified() => {
            children.iter().collect()
        }
        _ => vec![ast],
    };
    if info.anchored_start {
        while children.first().map_or(false, |c| {
            c.kind == AstKind::Anchor(Anchor::Start) && !c.is_quantified()
        }) {
            children.remove(0);
        }
    }
    if info.anchored_end {
        while children.last().map_or(false, |c| {
            c.kind == AstKind::Anchor(Anchor::End) && !c.is_quantified()
        }) {
            children.pop();
        }
    }
    children
}

/// A state of the intermediate epsilon-NFA: at most one consuming
/// transition plus any number of epsilon edges.
struct BState {
    on: Option<(ClassSet, usize)>,
    eps: Vec<usize>,
}

struct Builder {
    states: Vec<BState>,
    limit: usize,
}

impl Builder {
    fn push_state(&mut self) -> Result<usize, Error> {
        if self.states.len() >= self.limit {
            return Err(Error::PatternTooLarge);
        }
        self.states.push(BState { on: None, eps: Vec::new() });
        Ok(self.states.len() - 1)
    }

    fn eps(&mut self, from: usize, to: usize) {
        self.states[from].eps.push(to);
    }

    /// Compile a concatenation; returns its entry and exit states.
    fn compile_seq(&mut self, nodes: &[&Ast]) -> Result<(usize, usize), Error> {
        let entry = self.push_state()?;
        let mut cur = entry;
        for node in nodes {
            let (e, x) = self.compile_node(node)?;
            self.eps(cur, e);
            cur = x;
        }
        Ok((entry, cur))
    }

    /// Compile one node including its quantifier.
    fn compile_node(&mut self, node: &Ast) -> Result<(usize, usize), Error> {
        if node.min == 1 && node.max == 1 {
            return self.compile_once(node);
        }
        if node.max == 0 {
            // `{0}` consumes nothing.
            let s = self.push_state()?;
            return Ok((s, s));
        }
        let entry = self.push_state()?;
        let mut cur = entry;
        for _ in 0..node.min {
            let (e, x) = self.compile_once(node)?;
            self.eps(cur, e);
            cur = x;
        }
        if node.max == UNBOUNDED {
            let loop_head = self.push_state()?;
            let out = self.push_state()?;
            self.eps(cur, loop_head);
            let (e, x) = self.compile_once(node)?;
            self.eps(loop_head, e);
            self.eps(x, loop_head);
            self.eps(loop_head, out);
            cur = out;
        } else {
            let out = self.push_state()?;
            for _ in 0..(node.max - node.min) {
                self.eps(cur, out);
                let (e, x) = self.compile_once(node)?;
                self.eps(cur, e);
                cur = x;
            }
            self.eps(cur, out);
            cur = out;
        }
        Ok((entry, cur))
    }

    /// Compile one instance of a node, ignoring its quantifier.
    fn compile_once(&mut self, node: &Ast) -> Result<(usize, usize), Error> {
        match node.kind {
            AstKind::Literal(b) => {
                let mut set = ClassSet::empty();
                set.insert(b);
                self.byte_fragment(set)
            }
            AstKind::Wildcard => self.byte_fragment(ClassSet::dot()),
            AstKind::Class(ref set) => self.byte_fragment(set.clone()),
            // Anchors inside the pattern have no table encoding.
            AstKind::Anchor(_) => Err(Error::UnsupportedConstruct),
            AstKind::Group { ref children, .. } => {
                let refs: Vec<&Ast> = children.iter().collect();
                self.compile_seq(&refs)
            }
            AstKind::Alternation { ref left, ref right } => {
                let entry = self.push_state()?;
                let exit = self.push_state()?;
                let (le, lx) = self.compile_node(left)?;
                let (re, rx) = self.compile_node(right)?;
                self.eps(entry, le);
                self.eps(entry, re);
                self.eps(lx, exit);
                self.eps(rx, exit);
                Ok((entry, exit))
            }
        }
    }

    fn byte_fragment(&mut self, set: ClassSet) -> Result<(usize, usize), Error> {
        let entry = self.push_state()?;
        let exit = self.push_state()?;
        self.states[entry].on = Some((set, exit));
        Ok((entry, exit))
    }
}

/// Subset construction from the epsilon-NFA to a dense table.
fn determinize(
    builder: &Builder,
    entry: usize,
    accept: usize,
    state_limit: usize,
) -> Result<(Vec<u32>, Vec<bool>), Error> {
    let nfa_len = builder.states.len();
    let closure = |seed: Vec<usize>| -> Vec<usize> {
        let mut visited = vec![false; nfa_len];
        let mut stack = seed;
        let mut out = Vec::new();
        while let Some(s) = stack.pop() {
            if visited[s] {
                continue;
            }
            visited[s] = true;
            out.push(s);
            for &t in &builder.states[s].eps {
                if !visited[t] {
                    stack.push(t);
                }
            }
        }
        out.sort_unstable();
        out
    };

    // Row 0 is the dead state: all transitions stay dead.
    let mut table: Vec<u32> = vec![DEAD; 256];
    let mut accepting = vec![false];
    let mut ids: HashMap<Vec<usize>, u32> = HashMap::new();

    let start_set = closure(vec![entry]);
    ids.insert(start_set.clone(), START);
    table.extend(std::iter::repeat(DEAD).take(256));
    accepting.push(start_set.contains(&accept));

    let mut worklist = vec![(START, start_set)];
    while let Some((id, set)) = worklist.pop() {
        for b in 0..=255u8 {
            let mut targets = Vec::new();
            for &s in &set {
                if let Some((ref class, next)) = builder.states[s].on {
                    if class.contains(b) {
                        targets.push(next);
                    }
                }
            }
            if targets.is_empty() {
                continue;
            }
            let tset = closure(targets);
            let next_id = match ids.get(&tset) {
                Some(&existing) => existing,
                None => {
                    let new_id = accepting.len() as u32;
                    if accepting.len() >= state_limit {
                        return Err(Error::PatternTooLarge);
                    }
                    ids.insert(tset.clone(), new_id);
                    table.extend(std::iter::repeat(DEAD).take(256));
                    accepting.push(tset.contains(&accept));
                    worklist.push((new_id, tset));
                    new_id
                }
            };
            table[id as usize * 256 + b as usize] = next_id;
        }
    }
    Ok((table, accepting))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::parser::parse;

    fn dfa(pattern: &str) -> Dfa {
        try_dfa(pattern).unwrap()
    }

    fn try_dfa(pattern: &str) -> Result<Dfa, Error> {
        let ast = parse(pattern).unwrap();
        let info = classify(&ast);
        Dfa::compile(&ast, &info, DFA_STATE_BUDGET)
    }

    #[test]
    fn literal_chain() {
        let d = dfa("hello");
        // h-e-l-l-o plus start and dead.
        assert_eq!(d.num_states(), 7);
        assert_eq!(d.find(b"hello world hello", 0), Some((0, 5)));
        assert_eq!(d.find(b"hello world hello", 1), Some((12, 17)));
        assert_eq!(
            d.find_all(b"hello world hello"),
            vec![(0, 5), (12, 17)]
        );
        assert_eq!(d.find(b"help", 0), None);
    }

    #[test]
    fn single_byte() {
        let d = dfa("a");
        assert_eq!(
            d.find_all(b"banana"),
            vec![(1, 2), (3, 4), (5, 6)]
        );
    }

    #[test]
    fn class_plus_is_greedy() {
        let d = dfa("[0-9]+");
        assert_eq!(d.find(b"abc123def456", 0), Some((3, 6)));
        assert_eq!(
            d.find_all(b"abc123def456"),
            vec![(3, 6), (9, 12)]
        );
        assert_eq!(d.run_from(b"123x", 0), Some(3));
    }

    #[test]
    fn counted_repetition() {
        let d = dfa("a{2,4}");
        assert_eq!(d.run_from(b"a", 0), None);
        assert_eq!(d.run_from(b"aa", 0), Some(2));
        assert_eq!(d.run_from(b"aaaaaa", 0), Some(4));
        let d = dfa("a{3}");
        assert_eq!(d.run_from(b"aaaa", 0), Some(3));
        assert_eq!(d.run_from(b"aa", 0), None);
    }

    #[test]
    fn anchored_both_ends() {
        let d = dfa("^[a-z]+$");
        assert!(d.anchored_start && d.anchored_end);
        assert_eq!(d.find(b"hello", 0), Some((0, 5)));
        assert_eq!(d.find(b"Hello", 0), None);
        assert_eq!(d.find(b"hello", 1), None);
        assert_eq!(d.find_all(b"hello"), vec![(0, 5)]);
    }

    #[test]
    fn end_anchor_only() {
        let d = dfa("ab$");
        assert_eq!(d.find(b"ab ab", 0), Some((3, 5)));
        assert_eq!(d.find(b"abc", 0), None);
    }

    #[test]
    fn literal_alternation() {
        let d = dfa("apple|banana|cherry");
        assert!(d.multi_prefilter.is_some());
        let text = b"I like apple and banana";
        assert_eq!(d.find(text, 0), Some((7, 12)));
        assert_eq!(
            d.find_all(text),
            vec![(7, 12), (17, 23)]
        );
        // The jump scan must not skip an earlier match of a different
        // branch.
        assert_eq!(d.find(b"xx cherry apple", 0), Some((3, 9)));
    }

    #[test]
    fn phone_number() {
        let d = dfa(r"\d{3}-\d{3}-\d{4}");
        let text = b"call 555-123-4567 now";
        assert_eq!(d.find_all(text), vec![(5, 17)]);
    }

    #[test]
    fn empty_matchable_advances() {
        let d = dfa("a*");
        assert_eq!(d.run_from(b"aaab", 0), Some(3));
        assert_eq!(d.run_from(b"b", 0), Some(0));
        // Zero-width matches advance by one; the scan also reports the
        // empty match at the very end.
        assert_eq!(
            d.find_all(b"baa"),
            vec![(0, 0), (1, 3), (3, 3)]
        );
    }

    #[test]
    fn greedy_longest_from_each_start() {
        let d = dfa("[ab]+");
        assert_eq!(d.run_from(b"abba!", 0), Some(4));
        // Equivalent literal collapse: `aa|a` prefers the longest at a
        // given start under longest-match table semantics.
        let d = dfa("aa|a");
        assert_eq!(d.run_from(b"aa", 0), Some(2));
    }

    #[test]
    fn interior_anchor_is_unsupported() {
        match try_dfa("a$b") {
            Err(Error::UnsupportedConstruct) => {}
            other => panic!("expected UnsupportedConstruct, got {other:?}"),
        }
    }

    #[test]
    fn state_budget_enforced() {
        match try_dfa("[0-9]{5000}") {
            Err(Error::PatternTooLarge) => {}
            other => panic!("expected PatternTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn bulk_advance_agrees_with_stepping() {
        // Wide enough to get a per-state accelerator; the runs cross the
        // 16-byte chunk boundary.
        let d = dfa("[a-m]+");
        let text: Vec<u8> = std::iter::repeat(b'a')
            .take(100)
            .chain(std::iter::once(b'z'))
            .chain(std::iter::repeat(b'b').take(40))
            .collect();
        assert_eq!(d.run_from(&text, 0), Some(100));
        assert_eq!(d.find(&text, 100), Some((101, 141)));
    }

    #[test]
    fn is_match_early_exit() {
        let d = dfa("[0-9]+");
        assert!(d.is_match(b"abc123", 0));
        assert!(!d.is_match(b"abcdef", 0));
        assert!(!d.is_match(b"123abc", 3));
    }

    #[test]
    fn prefilter_used_for_prefix() {
        let d = dfa("abc[0-9]");
        assert!(d.prefilter.is_some());
        let mut text = vec![b'x'; 200];
        text.extend_from_slice(b"abc7");
        assert_eq!(d.find(&text, 0), Some((200, 204)));
    }
}
