// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use crate::classify::{classify, Complexity, DFA_STATE_BUDGET};
use crate::error::Error;
use crate::exec::{EngineChoice, Executor};
use crate::nfa::DEFAULT_RECURSION_LIMIT;
use crate::parser::parse;

/// A compiled regular expression.
///
/// A `Regex` is immutable once built and cheap to share: matching
/// allocates nothing beyond its result and keeps all scratch state on the
/// stack, so `&Regex` can be used from many threads at once.
///
/// The three match operations, in increasing generality:
///
/// - [`match_at_zero`](Regex::match_at_zero): the longest match starting
///   exactly at position 0.
/// - [`search`](Regex::search): the leftmost match anywhere.
/// - [`find_all`](Regex::find_all) / [`find_iter`](Regex::find_iter):
///   every non-overlapping match, left to right.
///
/// These return `Option`/`Vec` and report a blown backtracking budget as
/// "no match"; the `try_` variants surface it as
/// [`Error::PatternTooComplex`] instead. The budget only exists on the
/// backtracking engine, so DFA-executed patterns never hit it.
#[derive(Clone, Debug)]
pub struct Regex {
    pattern: String,
    exec: Executor,
}

/// A single match in a haystack: a half-open byte range and the matched
/// text itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Match<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    fn new(text: &'t str, start: usize, end: usize) -> Match<'t> {
        Match { text, start, end }
    }

    /// Byte offset of the start of the match.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the end of the match.
    pub fn end(&self) -> usize {
        self.end
    }

    /// The match as a byte range into the haystack.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// Returns true if and only if the match is zero-width.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// The matched text.
    ///
    /// The engine matches bytes, so on non-ASCII text a pattern built
    /// from explicit high bytes can produce boundaries inside a
    /// multi-byte character; slicing panics there. Use
    /// [`as_bytes`](Match::as_bytes) when that can happen.
    pub fn as_str(&self) -> &'t str {
        &self.text[self.start..self.end]
    }

    /// The matched bytes.
    pub fn as_bytes(&self) -> &'t [u8] {
        &self.text.as_bytes()[self.start..self.end]
    }
}

impl fmt::Display for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A builder for a [`Regex`] with non-default limits or a forced engine.
///
/// ```
/// use simdre::RegexBuilder;
///
/// let re = RegexBuilder::new("[0-9]+")
///     .dfa_state_limit(1 << 12)
///     .build()
///     .unwrap();
/// assert!(re.is_match("abc123"));
/// ```
#[derive(Clone, Debug)]
pub struct RegexBuilder {
    pattern: String,
    engine: EngineChoice,
    dfa_state_limit: usize,
    recursion_limit: usize,
}

impl RegexBuilder {
    /// Start building a regex for `pattern`.
    pub fn new(pattern: &str) -> RegexBuilder {
        RegexBuilder {
            pattern: pattern.to_owned(),
            engine: EngineChoice::Auto,
            dfa_state_limit: DFA_STATE_BUDGET,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Force an engine instead of letting the classifier pick. Mostly
    /// useful in tests that compare engines against each other.
    pub fn engine(mut self, choice: EngineChoice) -> RegexBuilder {
        self.engine = choice;
        self
    }

    /// Cap the number of DFA states. Patterns exceeding the cap fall
    /// back to the backtracking engine (or fail construction when the
    /// DFA is forced).
    pub fn dfa_state_limit(mut self, limit: usize) -> RegexBuilder {
        self.dfa_state_limit = limit;
        self
    }

    /// Cap the backtracking recursion depth. Exceeding the cap at match
    /// time reports [`Error::PatternTooComplex`].
    pub fn recursion_limit(mut self, limit: usize) -> RegexBuilder {
        self.recursion_limit = limit;
        self
    }

    /// Compile the pattern.
    pub fn build(self) -> Result<Regex, Error> {
        let ast = parse(&self.pattern)?;
        let info = classify(&ast);
        let exec = Executor::new(
            &ast,
            &info,
            self.engine,
            self.dfa_state_limit,
            self.recursion_limit,
        )?;
        Ok(Regex { pattern: self.pattern, exec })
    }
}

impl Regex {
    /// Compile a pattern with default limits.
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        RegexBuilder::new(pattern).build()
    }

    /// The original pattern string.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// The longest match starting exactly at position 0, if any.
    pub fn match_at_zero<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.try_match_at_zero(text).unwrap_or(None)
    }

    /// Like [`match_at_zero`](Regex::match_at_zero), surfacing
    /// [`Error::PatternTooComplex`].
    pub fn try_match_at_zero<'t>(
        &self,
        text: &'t str,
    ) -> Result<Option<Match<'t>>, Error> {
        Ok(self
            .exec
            .match_at_zero(text.as_bytes())?
            .map(|(s, e)| Match::new(text, s, e)))
    }

    /// The leftmost match, if any.
    pub fn search<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.try_search(text).unwrap_or(None)
    }

    /// Like [`search`](Regex::search), surfacing
    /// [`Error::PatternTooComplex`].
    pub fn try_search<'t>(
        &self,
        text: &'t str,
    ) -> Result<Option<Match<'t>>, Error> {
        Ok(self
            .exec
            .search_at(text.as_bytes(), 0)?
            .map(|(s, e)| Match::new(text, s, e)))
    }

    /// Returns true if and only if the pattern matches somewhere in
    /// `text`. Cheaper than [`search`](Regex::search): engines stop at
    /// the first proof of a match.
    pub fn is_match(&self, text: &str) -> bool {
        self.try_is_match(text).unwrap_or(false)
    }

    /// Like [`is_match`](Regex::is_match), surfacing
    /// [`Error::PatternTooComplex`].
    pub fn try_is_match(&self, text: &str) -> Result<bool, Error> {
        self.exec.is_match(text.as_bytes())
    }

    /// All non-overlapping matches, leftmost first. Match starts are
    /// strictly increasing and the ranges are pairwise disjoint.
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        self.try_find_all(text).unwrap_or_default()
    }

    /// Like [`find_all`](Regex::find_all), surfacing
    /// [`Error::PatternTooComplex`].
    pub fn try_find_all<'t>(
        &self,
        text: &'t str,
    ) -> Result<Vec<Match<'t>>, Error> {
        Ok(self
            .exec
            .find_all(text.as_bytes())?
            .into_iter()
            .map(|(s, e)| Match::new(text, s, e))
            .collect())
    }

    /// Iterate over non-overlapping matches without collecting them.
    /// Stops early if the backtracking budget is exceeded.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches { re: self, text, at: 0 }
    }

    /// A one-line description of the compiled pattern, for tests and
    /// diagnostics: the pattern, the engine executing it and the
    /// classifier's complexity tag.
    pub fn get_stats(&self) -> String {
        format!(
            "pattern={} engine={} complexity={}",
            self.pattern,
            self.exec.engine_name(),
            self.exec.complexity(),
        )
    }

    /// Which engine executes this pattern: `"dfa"` or `"nfa"`.
    pub fn engine_name(&self) -> &'static str {
        self.exec.engine_name()
    }

    /// The classifier's tag for this pattern.
    pub fn complexity(&self) -> Complexity {
        self.exec.complexity()
    }
}

impl fmt::Display for Regex {
    /// Shows the original pattern.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// An iterator over non-overlapping matches, created by
/// [`Regex::find_iter`].
#[derive(Debug)]
pub struct Matches<'r, 't> {
    re: &'r Regex,
    text: &'t str,
    at: usize,
}

impl<'t> Iterator for Matches<'_, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        if self.at > self.text.len() {
            return None;
        }
        let (s, e) = self
            .re
            .exec
            .search_at(self.text.as_bytes(), self.at)
            .unwrap_or(None)?;
        // Zero-width matches advance by one so the scan cannot stall.
        self.at = s + (e - s).max(1);
        Some(Match::new(self.text, s, e))
    }
}
