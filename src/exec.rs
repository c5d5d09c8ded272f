// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use tracing::debug;

use crate::ast::Ast;
use crate::classify::{Classification, Complexity, SuggestedEngine};
use crate::dfa::Dfa;
use crate::error::Error;
use crate::nfa::Nfa;

/// Executor manages the execution of a compiled pattern.
///
/// In particular, it owns the one compiled form of the pattern (either a
/// DFA table or a backtracking program, never both), chosen once at
/// construction from the classifier's verdict. Failed DFA compilation is
/// recovered here by rebuilding as a backtracking program, so
/// construction only surfaces parse errors and explicit engine overrides
/// that cannot be honored.
#[derive(Clone, Debug)]
pub struct Executor {
    engine: Engine,
    /// How the classifier tagged the pattern; kept for diagnostics.
    complexity: Complexity,
}

#[derive(Clone, Debug)]
enum Engine {
    Dfa(Dfa),
    Nfa(Nfa),
}

/// A preference for matching engine selection.
///
/// This defaults to `Auto`, which routes through the classifier: simple
/// patterns (and medium ones that look like multi-literal alternations)
/// get the DFA, everything else the backtracker. Forcing `Nfa` always
/// works; forcing `Dfa` surfaces the compile error when the pattern
/// cannot be expressed as a table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EngineChoice {
    /// Let the classifier pick.
    #[default]
    Auto,
    /// Always compile the transition table; error when impossible.
    Dfa,
    /// Always use the backtracking engine.
    Nfa,
}

impl Executor {
    /// Build the executor for a parsed, classified pattern.
    pub fn new(
        ast: &Ast,
        info: &Classification,
        choice: EngineChoice,
        dfa_state_limit: usize,
        recursion_limit: usize,
    ) -> Result<Executor, Error> {
        let engine = match choice {
            EngineChoice::Dfa => Engine::Dfa(Dfa::compile(ast, info, dfa_state_limit)?),
            EngineChoice::Nfa => {
                Engine::Nfa(Nfa::compile(ast, info, recursion_limit))
            }
            EngineChoice::Auto => {
                let try_dfa = info.complexity == Complexity::Simple
                    || (info.complexity == Complexity::Medium
                        && info.hints.suggested_engine == SuggestedEngine::Dfa);
                if try_dfa {
                    match Dfa::compile(ast, info, dfa_state_limit) {
                        Ok(dfa) => Engine::Dfa(dfa),
                        Err(err @ Error::PatternTooLarge)
                        | Err(err @ Error::UnsupportedConstruct) => {
                            debug!(%err, "DFA compile failed; falling back");
                            Engine::Nfa(Nfa::compile(
                                ast,
                                info,
                                recursion_limit,
                            ))
                        }
                        Err(err) => return Err(err),
                    }
                } else {
                    Engine::Nfa(Nfa::compile(ast, info, recursion_limit))
                }
            }
        };
        Ok(Executor { engine, complexity: info.complexity })
    }

    /// Which engine ended up executing this pattern.
    pub fn engine_name(&self) -> &'static str {
        match self.engine {
            Engine::Dfa(_) => "dfa",
            Engine::Nfa(_) => "nfa",
        }
    }

    /// The classifier's tag for this pattern.
    pub fn complexity(&self) -> Complexity {
        self.complexity
    }

    /// Longest match starting exactly at position 0.
    pub fn match_at_zero(
        &self,
        text: &[u8],
    ) -> Result<Option<(usize, usize)>, Error> {
        match self.engine {
            Engine::Dfa(ref dfa) => {
                Ok(dfa.run_from(text, 0).map(|end| (0, end)))
            }
            Engine::Nfa(ref nfa) => {
                Ok(nfa.match_at(text, 0)?.map(|end| (0, end)))
            }
        }
    }

    /// Leftmost match anywhere at or after `start`.
    pub fn search_at(
        &self,
        text: &[u8],
        start: usize,
    ) -> Result<Option<(usize, usize)>, Error> {
        match self.engine {
            Engine::Dfa(ref dfa) => Ok(dfa.find(text, start)),
            Engine::Nfa(ref nfa) => nfa.find(text, start),
        }
    }

    /// True iff a match exists at or after `start`. Cheaper than
    /// `search_at`: the DFA stops at the first accepting state.
    pub fn is_match(&self, text: &[u8]) -> Result<bool, Error> {
        match self.engine {
            Engine::Dfa(ref dfa) => Ok(dfa.is_match(text, 0)),
            Engine::Nfa(ref nfa) => nfa.is_match(text, 0),
        }
    }

    /// All non-overlapping matches, leftmost first.
    pub fn find_all(
        &self,
        text: &[u8],
    ) -> Result<Vec<(usize, usize)>, Error> {
        match self.engine {
            Engine::Dfa(ref dfa) => Ok(dfa.find_all(text)),
            Engine::Nfa(ref nfa) => nfa.find_all(text),
        }
    }
}
