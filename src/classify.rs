// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The pattern complexity classifier.
//!
//! One walk over the AST tags a pattern `Simple`, `Medium` or `Complex`
//! and records the optimization hints the engines consume. The tag drives
//! engine selection: `Simple` patterns compile to a DFA, `Medium` ones try
//! to, `Complex` ones go straight to the backtracker. Misclassification
//! toward the DFA is harmless: a failed DFA compile falls back to the
//! backtracker, which handles everything.

use std::fmt;

use tracing::debug;

use crate::ast::{Anchor, Ast, AstKind, UNBOUNDED};
use crate::literals::{self, LiteralSet};

/// The number of DFA states the compiler is allowed to build. This is the
/// one place size heuristics enter classification: a pattern that is
/// structurally simple but estimates past this budget is demoted.
pub const DFA_STATE_BUDGET: usize = 4096;

/// A simple concatenation has at most this many elements, where a run of
/// adjacent plain literals counts as one element.
const SIMPLE_CONCAT_LIMIT: usize = 6;

/// A simple alternation has at most this many branches.
const SIMPLE_ALT_LIMIT: usize = 8;

/// Structural bounds for the medium tier.
const MEDIUM_DEPTH_LIMIT: usize = 4;
const MEDIUM_CHILDREN_LIMIT: usize = 5;

/// How a pattern is expected to behave at match time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Complexity {
    /// Representable by a small acyclic byte-level DFA.
    Simple,
    /// Tractable structure; the DFA is worth attempting.
    Medium,
    /// Deep nesting or explosive quantifiers; backtracking only.
    Complex,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        })
    }
}

/// The engine the classifier expects to win for this pattern.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SuggestedEngine {
    Dfa,
    Hybrid,
    Nfa,
}

/// Facts about a pattern that let the engines skip work. Produced once at
/// compile time; read-only afterwards.
#[derive(Clone, Debug)]
pub struct OptimizationHints {
    pub has_literal_prefix: bool,
    pub literal_prefix: Vec<u8>,
    pub has_required_literal: bool,
    pub required_literal: Vec<u8>,
    pub benefits_from_simd: bool,
    pub suggested_engine: SuggestedEngine,
}

/// The full result of classification.
#[derive(Clone, Debug)]
pub struct Classification {
    pub complexity: Complexity,
    pub hints: OptimizationHints,
    pub literals: LiteralSet,
    /// True iff every match must start at position 0.
    pub anchored_start: bool,
    /// True iff every match must end at the end of the input.
    pub anchored_end: bool,
}

/// Classify a parsed pattern.
pub fn classify(ast: &Ast) -> Classification {
    let literals = literals::extract(ast);
    let anchored_start = leading_anchor(ast);
    let anchored_end = trailing_anchor(ast);

    let mostly_literal_alt = mostly_literal_alternation(ast);
    let complexity = if is_simple(ast) {
        // The tie-break: structurally simple but too many states.
        if estimate_states(ast) > DFA_STATE_BUDGET {
            Complexity::Medium
        } else {
            Complexity::Simple
        }
    } else if mostly_literal_alt
        || (is_medium(ast, 0) && estimate_states(ast) <= DFA_STATE_BUDGET)
    {
        Complexity::Medium
    } else {
        Complexity::Complex
    };

    let suggested_engine = match complexity {
        Complexity::Simple => SuggestedEngine::Dfa,
        Complexity::Medium => {
            if literals.exact || mostly_literal_alt {
                SuggestedEngine::Dfa
            } else {
                SuggestedEngine::Hybrid
            }
        }
        Complexity::Complex => SuggestedEngine::Nfa,
    };

    let prefix =
        literals.best_prefix().map(|l| l.bytes.clone()).unwrap_or_default();
    let required = literals
        .best_required()
        .map(|l| l.bytes.clone())
        .unwrap_or_default();
    let benefits_from_simd = required.len() >= 2
        || prefix.len() >= 2
        || literals.exact
        || has_scannable_repeat(ast);

    let hints = OptimizationHints {
        has_literal_prefix: !prefix.is_empty(),
        literal_prefix: prefix,
        has_required_literal: !required.is_empty(),
        required_literal: required,
        benefits_from_simd,
        suggested_engine,
    };
    debug!(
        %complexity,
        engine = ?hints.suggested_engine,
        simd = hints.benefits_from_simd,
        "classified pattern"
    );
    Classification { complexity, hints, literals, anchored_start, anchored_end }
}

/// Strip one level of trivial (unquantified, single-purpose) grouping.
fn unwrap_trivial(mut ast: &Ast) -> &Ast {
    while let AstKind::Group { ref children, .. } = ast.kind {
        if ast.is_quantified() || children.len() != 1 {
            break;
        }
        ast = &children[0];
    }
    ast
}

/// The top-level concatenation as a slice of children.
fn top_children(ast: &Ast) -> Vec<&Ast> {
    match ast.kind {
        AstKind::Group { ref children, .. } if !ast.is_quantified() => {
            children.iter().collect()
        }
        _ => vec![ast],
    }
}

/// Leading `^` at the top level. A quantified anchor (`^?`) is optional
/// and does not anchor the pattern.
fn leading_anchor(ast: &Ast) -> bool {
    top_children(ast).first().map_or(false, |c| {
        c.kind == AstKind::Anchor(Anchor::Start) && !c.is_quantified()
    })
}

/// Trailing `$` at the top level.
fn trailing_anchor(ast: &Ast) -> bool {
    top_children(ast).last().map_or(false, |c| {
        c.kind == AstKind::Anchor(Anchor::End) && !c.is_quantified()
    })
}

/// A single-byte matcher: literal, wildcard or class, any quantifier.
fn is_simple_atom(ast: &Ast) -> bool {
    matches!(
        ast.kind,
        AstKind::Literal(_) | AstKind::Wildcard | AstKind::Class(_)
    )
}

/// An unquantified run of plain literals (possibly grouped).
fn is_literal_run(ast: &Ast) -> bool {
    if ast.is_quantified() {
        return false;
    }
    match ast.kind {
        AstKind::Literal(_) => true,
        AstKind::Group { ref children, .. } => {
            children.iter().all(is_literal_run)
        }
        _ => false,
    }
}

/// SIMPLE: optional `^`/`$` around either a bounded concatenation of
/// single-byte atoms (literal runs count once) or one alternation over
/// literal/class branches.
fn is_simple(ast: &Ast) -> bool {
    let children: Vec<&Ast> = top_children(ast)
        .into_iter()
        .filter(|c| !matches!(c.kind, AstKind::Anchor(_)))
        .collect();
    if children.len() == 1 {
        let only = unwrap_trivial(children[0]);
        if let AstKind::Alternation { .. } = only.kind {
            if only.is_quantified() {
                return false;
            }
            let mut branches = Vec::new();
            flatten_alternation(only, &mut branches);
            return branches.len() <= SIMPLE_ALT_LIMIT
                && branches.iter().all(|b| {
                    let b = unwrap_trivial(b);
                    is_literal_run(b) || is_simple_atom(b)
                });
        }
    }
    // A concatenation of atoms, counting each literal run once.
    let mut elements = 0;
    let mut in_literal_run = false;
    for child in &children {
        match child.kind {
            AstKind::Literal(_) if !child.is_quantified() => {
                if !in_literal_run {
                    elements += 1;
                    in_literal_run = true;
                }
            }
            _ if is_simple_atom(child) => {
                elements += 1;
                in_literal_run = false;
            }
            _ => return false,
        }
    }
    elements <= SIMPLE_CONCAT_LIMIT
}

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

/// MEDIUM structure check: bounded nesting depth, bounded children per
/// group (literal runs count once), bounded alternation width.
fn is_medium(ast: &Ast, depth: usize) -> bool {
    if depth > MEDIUM_DEPTH_LIMIT {
        return false;
    }
    match ast.kind {
        AstKind::Literal(_)
        | AstKind::Wildcard
        | AstKind::Class(_)
        | AstKind::Anchor(_) => true,
        AstKind::Group { ref children, .. } => {
            let mut elements = 0;
            let mut in_literal_run = false;
            for child in children {
                match child.kind {
                    AstKind::Literal(_) if !child.is_quantified() => {
                        if !in_literal_run {
                            elements += 1;
                            in_literal_run = true;
                        }
                    }
                    _ => {
                        elements += 1;
                        in_literal_run = false;
                    }
                }
                if !is_medium(child, depth + 1) {
                    return false;
                }
            }
            elements <= MEDIUM_CHILDREN_LIMIT
        }
        AstKind::Alternation { .. } => {
            let mut branches = Vec::new();
            flatten_alternation(ast, &mut branches);
            branches.len() <= MEDIUM_CHILDREN_LIMIT
                && branches.iter().all(|b| is_medium(b, depth + 1))
        }
    }
}

/// True when the pattern is an alternation and at least 80% of its
/// branches are pure literal runs. Such patterns take the multi-literal
/// DFA path even when a stray branch is not literal.
fn mostly_literal_alternation(ast: &Ast) -> bool {
    let children: Vec<&Ast> = top_children(ast)
        .into_iter()
        .filter(|c| !matches!(c.kind, AstKind::Anchor(_)))
        .collect();
    if children.len() != 1 {
        return false;
    }
    let only = unwrap_trivial(children[0]);
    if !matches!(only.kind, AstKind::Alternation { .. })
        || only.is_quantified()
    {
        return false;
    }
    let mut branches = Vec::new();
    flatten_alternation(only, &mut branches);
    let literal =
        branches.iter().filter(|b| is_literal_run(unwrap_trivial(b))).count();
    literal * 5 >= branches.len() * 4
}

/// A node the vectorized scanners can chew through: a quantified
/// single-byte matcher with room to run.
fn has_scannable_repeat(ast: &Ast) -> bool {
    let scannable = |node: &Ast| {
        is_simple_atom(node)
            && (node.max == UNBOUNDED || node.max.saturating_sub(node.min) > 4)
    };
    fn any(ast: &Ast, f: &impl Fn(&Ast) -> bool) -> bool {
        if f(ast) {
            return true;
        }
        match ast.kind {
            AstKind::Group { ref children, .. } => {
                children.iter().any(|c| any(c, f))
            }
            AstKind::Alternation { ref left, ref right } => {
                any(left, f) || any(right, f)
            }
            _ => false,
        }
    }
    any(ast, &scannable)
}

/// Estimate the DFA state count, saturating just past the budget. The
/// estimate errs high; the compiler itself enforces the real budget.
pub fn estimate_states(ast: &Ast) -> usize {
    const CAP: usize = DFA_STATE_BUDGET + 1;
    let base = match ast.kind {
        AstKind::Literal(_) | AstKind::Wildcard | AstKind::Class(_) => 1,
        AstKind::Anchor(_) => 0,
        AstKind::Group { ref children, .. } => children
            .iter()
            .map(estimate_states)
            .fold(0usize, |a, b| a.saturating_add(b)),
        AstKind::Alternation { ref left, ref right } => {
            estimate_states(left)
                .saturating_add(estimate_states(right))
                .saturating_add(1)
        }
    };
    let reps = if ast.max == UNBOUNDED {
        (ast.min as usize).max(1)
    } else {
        ast.max as usize
    };
    base.saturating_mul(reps).min(CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn classify_str(pattern: &str) -> Classification {
        classify(&parse(pattern).unwrap())
    }

    macro_rules! assert_complexity {
        ($pattern:expr, $want:expr) => {
            assert_eq!(
                classify_str($pattern).complexity,
                $want,
                "pattern: {}",
                $pattern
            );
        };
    }

    #[test]
    fn simple_patterns() {
        assert_complexity!("hello", Complexity::Simple);
        assert_complexity!("hello world hello", Complexity::Simple);
        assert_complexity!("[0-9]+", Complexity::Simple);
        assert_complexity!("a*", Complexity::Simple);
        assert_complexity!("^[a-z]+$", Complexity::Simple);
        assert_complexity!(r"\d{3}-\d{3}-\d{4}", Complexity::Simple);
        assert_complexity!("a|b|c", Complexity::Simple);
        assert_complexity!("apple|banana|cherry", Complexity::Simple);
        assert_complexity!("(apple|banana|cherry)", Complexity::Simple);
    }

    #[test]
    fn medium_patterns() {
        // Non-trivial group structure.
        assert_complexity!("(ab)+c", Complexity::Medium);
        assert_complexity!("(a|b)(c|d)", Complexity::Medium);
    }

    #[test]
    fn mostly_literal_alternation_is_medium_with_dfa() {
        // Nine branches (not simple), eight of them literal: 8/9 >= 80%.
        let c = classify_str("aa|bb|cc|dd|ee|ff|gg|hh|i+");
        assert_eq!(c.complexity, Complexity::Medium);
        assert_eq!(c.hints.suggested_engine, SuggestedEngine::Dfa);
    }

    #[test]
    fn complex_patterns() {
        // Nesting past the depth bound.
        assert_complexity!("((((((a))))))", Complexity::Complex);
        // Wide group.
        assert_complexity!(
            "(a+)(b+)(c+)(d+)(e+)(f+)",
            Complexity::Complex
        );
    }

    #[test]
    fn state_budget_demotes() {
        // 100 * 100 byte states blow the 4096-state budget.
        assert!(estimate_states(&parse("[0-9]{100}").unwrap()) <= 100 + 1);
        assert_complexity!("[0-9]{100}", Complexity::Simple);
        assert_complexity!("[0-9]{5000}", Complexity::Medium);
    }

    #[test]
    fn anchors_detected() {
        let c = classify_str("^abc$");
        assert!(c.anchored_start && c.anchored_end);
        let c = classify_str("abc");
        assert!(!c.anchored_start && !c.anchored_end);
        // Anchors inside the pattern do not count as outer anchors.
        let c = classify_str("a(^b)?");
        assert!(!c.anchored_start);
    }

    #[test]
    fn hints_for_literal_prefix() {
        let c = classify_str("abc[0-9]+");
        assert!(c.hints.has_literal_prefix);
        assert_eq!(c.hints.literal_prefix, b"abc");
        assert!(c.hints.has_required_literal);
        assert!(c.hints.benefits_from_simd);
    }

    #[test]
    fn hints_for_class_repeat() {
        let c = classify_str("[0-9]+");
        assert!(!c.hints.has_literal_prefix);
        assert!(c.hints.benefits_from_simd);
        assert_eq!(c.hints.suggested_engine, SuggestedEngine::Dfa);
    }

    #[test]
    fn suggested_engine_for_complex() {
        let c = classify_str("((((((a))))))");
        assert_eq!(c.hints.suggested_engine, SuggestedEngine::Nfa);
    }
}
