// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A hybrid regular expression engine for byte-oriented (ASCII) patterns.
//!
//! Every pattern compiles into exactly one of two cooperating execution
//! machines. A classifier inspects the parsed pattern and routes it:
//!
//! - patterns with bounded, acyclic structure (literals, classes with
//!   quantifiers, short concatenations and literal alternations) compile
//!   into a dense **DFA** table and match in O(n) with constant work per
//!   byte;
//! - everything else runs on a **backtracking** matcher over the AST with
//!   greedy, POSIX-like leftmost-longest semantics and a recursion
//!   budget.
//!
//! Both engines lean on the same vectorized primitives: byte-class lane
//! masks for bulk runs (`[a-z]*` advances a chunk at a time) and
//! rare-byte-seeded Two-Way substring search for literal prefixes and
//! required literals.
//!
//! # Examples
//!
//! Compile once, match many times:
//!
//! ```
//! use simdre::Regex;
//!
//! let re = Regex::new("[0-9]+").unwrap();
//! let m = re.search("abc123def456").unwrap();
//! assert_eq!((m.start(), m.end(), m.as_str()), (3, 6, "123"));
//!
//! let all: Vec<&str> =
//!     re.find_all("abc123def456").iter().map(|m| m.as_str()).collect();
//! assert_eq!(all, vec!["123", "456"]);
//! ```
//!
//! Or use the free functions, which cache compilations by pattern
//! string:
//!
//! ```
//! assert!(simdre::is_match("^[a-z]+$", "hello").unwrap());
//! assert!(!simdre::is_match("^[a-z]+$", "Hello").unwrap());
//! ```
//!
//! # Syntax
//!
//! Literals, `.` (any byte but `\n`), `^`, `$`, `[...]` and `[^...]`
//! classes with `a-z` ranges, the shorthands `\d` `\w` `\s`, escaped
//! metacharacters, `|`, `(...)` and `(?:...)` groups, and the greedy
//! quantifiers `?`, `*`, `+`, `{n}`, `{n,}`, `{,m}`, `{n,m}`. Non-greedy
//! and possessive quantifiers, lookaround, backreferences and Unicode
//! classes are rejected at parse time. Bytes 128-255 pass through and
//! can be matched by explicit classes, but the shorthands stay ASCII.
//!
//! # Concurrency
//!
//! A compiled [`Regex`] is immutable; matching keeps every bit of
//! scratch state on the caller's stack, so one instance can serve any
//! number of threads simultaneously. The pattern cache behind the free
//! functions is internally synchronized and can be cleared with
//! [`cache_clear`].

#![warn(missing_docs)]

mod ast;
mod byteclass;
mod cache;
mod classify;
mod dfa;
mod error;
mod exec;
mod lexer;
mod literals;
mod nfa;
mod parser;
mod re;
mod twoway;

pub use crate::cache::{cache_clear, cache_len};
pub use crate::classify::Complexity;
pub use crate::error::Error;
pub use crate::exec::EngineChoice;
pub use crate::re::{Match, Matches, Regex, RegexBuilder};

/// The longest match of `pattern` starting exactly at position 0 of
/// `text`. Compiles through the pattern cache.
pub fn match_at_zero<'t>(
    pattern: &str,
    text: &'t str,
) -> Result<Option<Match<'t>>, Error> {
    Ok(cache::compile_cached(pattern)?.match_at_zero(text))
}

/// The leftmost match of `pattern` in `text`. Compiles through the
/// pattern cache.
pub fn search<'t>(
    pattern: &str,
    text: &'t str,
) -> Result<Option<Match<'t>>, Error> {
    Ok(cache::compile_cached(pattern)?.search(text))
}

/// All non-overlapping matches of `pattern` in `text`, leftmost first.
/// Compiles through the pattern cache.
pub fn find_all<'t>(
    pattern: &str,
    text: &'t str,
) -> Result<Vec<Match<'t>>, Error> {
    Ok(cache::compile_cached(pattern)?.find_all(text))
}

/// Returns true if and only if `pattern` matches somewhere in `text`.
/// Compiles through the pattern cache.
pub fn is_match(pattern: &str, text: &str) -> Result<bool, Error> {
    Ok(cache::compile_cached(pattern)?.is_match(text))
}
