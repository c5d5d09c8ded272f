// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Literal substring search.
//!
//! [`LiteralSearcher`] is Two-Way search (Crochemore & Perrin: a critical
//! factorization of the needle gives linear time with constant space)
//! seeded by a vectorized scan for the rarest byte of the needle. The scan
//! discards the bulk of the haystack without entering the comparison loop;
//! Two-Way keeps the worst case linear when the rare byte lies.
//!
//! [`MultiLiteralSearcher`] finds the earliest occurrence of any needle in
//! a set. Small sets run one rare-byte searcher per needle in lockstep;
//! larger sets build an Aho-Corasick automaton with leftmost-first match
//! semantics, which reports the same needle a backtracking alternation
//! would.

use std::cmp;

use aho_corasick::{AhoCorasick, MatchKind};
use memchr::memchr;

/// A compiled searcher for one literal needle.
#[derive(Clone, Debug)]
pub struct LiteralSearcher {
    needle: Vec<u8>,
    /// Position of the critical factorization.
    crit_pos: usize,
    /// The period to shift by on a mismatch in the left part.
    period: usize,
    /// True when the needle is periodic enough for the memory
    /// optimization (needle[..crit_pos] is a suffix of the period).
    periodic: bool,
    /// The least frequent byte of the needle and its offset, per a static
    /// byte-frequency ranking. The scan loop jumps between occurrences of
    /// this byte.
    rare_byte: u8,
    rare_offset: usize,
}

impl LiteralSearcher {
    /// Build a searcher. Accepts the empty needle, which matches at every
    /// position.
    pub fn new(needle: Vec<u8>) -> LiteralSearcher {
        if needle.len() < 2 {
            let rare_byte = needle.first().copied().unwrap_or(0);
            return LiteralSearcher {
                needle,
                crit_pos: 0,
                period: 1,
                periodic: false,
                rare_byte,
                rare_offset: 0,
            };
        }
        let (crit_fwd, period_fwd) = maximal_suffix(&needle, false);
        let (crit_rev, period_rev) = maximal_suffix(&needle, true);
        let (crit_pos, mut period) = if crit_fwd >= crit_rev {
            (crit_fwd, period_fwd)
        } else {
            (crit_rev, period_rev)
        };
        // The memory trick is only sound when the left part is a suffix of
        // the periodic right part; otherwise fall back to the conservative
        // shift.
        let periodic = needle[..crit_pos]
            == needle[period..][..crit_pos.min(needle.len() - period)]
            && crit_pos <= needle.len() - period;
        if !periodic {
            period = cmp::max(crit_pos, needle.len() - crit_pos) + 1;
        }
        let rare_offset = rarest_offset(&needle);
        let rare_byte = needle[rare_offset];
        LiteralSearcher { needle, crit_pos, period, periodic, rare_byte, rare_offset }
    }

    /// The needle this searcher was built from.
    #[allow(dead_code)]
    pub fn needle(&self) -> &[u8] {
        &self.needle
    }

    /// Find the first occurrence of the needle at or after `start`.
    ///
    /// The empty needle matches at `start` (when `start` is in bounds,
    /// including one past the end).
    pub fn find(&self, haystack: &[u8], start: usize) -> Option<usize> {
        let n = self.needle.len();
        if n == 0 {
            return if start <= haystack.len() { Some(start) } else { None };
        }
        if start + n > haystack.len() {
            return None;
        }
        if n == 1 {
            return memchr(self.rare_byte, &haystack[start..])
                .map(|i| start + i);
        }
        self.find_two_way(haystack, start)
    }

    fn find_two_way(&self, haystack: &[u8], start: usize) -> Option<usize> {
        let needle = &self.needle;
        let n = needle.len();
        let mut pos = start;
        // Number of left-part bytes known to match from a previous
        // period-length shift. Only ever non-zero for periodic needles.
        let mut memory = 0usize;
        while pos + n <= haystack.len() {
            if memory == 0 {
                // Jump to the next place the rare byte lines up. Any match
                // at p has the rare byte at p + rare_offset, so skipping to
                // the next occurrence never skips a match.
                match memchr(
                    self.rare_byte,
                    &haystack[pos + self.rare_offset..],
                ) {
                    None => return None,
                    Some(skip) => {
                        pos += skip;
                        if pos + n > haystack.len() {
                            return None;
                        }
                    }
                }
            }
            // Match the right part, left to right.
            let right_start = cmp::max(self.crit_pos, memory);
            let mut i = right_start;
            while i < n && needle[i] == haystack[pos + i] {
                i += 1;
            }
            if i < n {
                pos += i - self.crit_pos + 1;
                memory = 0;
                continue;
            }
            // Match the left part, right to left. Bytes below `memory`
            // matched during a previous window.
            let mut j = self.crit_pos;
            while j > memory && needle[j - 1] == haystack[pos + j - 1] {
                j -= 1;
            }
            if j <= memory {
                return Some(pos);
            }
            pos += self.period;
            memory = if self.periodic { n - self.period } else { 0 };
        }
        None
    }

    /// All non-overlapping occurrences, left to right. After each hit the
    /// scan resumes at `hit + max(needle.len(), 1)`.
    #[allow(dead_code)]
    pub fn find_all(&self, haystack: &[u8]) -> Vec<usize> {
        let mut out = Vec::new();
        let step = cmp::max(self.needle.len(), 1);
        let mut pos = 0;
        while let Some(hit) = self.find(haystack, pos) {
            out.push(hit);
            pos = hit + step;
        }
        out
    }
}

/// Compute the maximal suffix of `needle` and its period under the normal
/// (`order_greater == false`) or reversed byte order. Returns the start of
/// the maximal suffix and the period.
fn maximal_suffix(needle: &[u8], order_greater: bool) -> (usize, usize) {
    let mut left = 0;
    let mut right = 1;
    let mut offset = 0;
    let mut period = 1;
    while right + offset < needle.len() {
        let a = needle[right + offset];
        let b = needle[left + offset];
        if (a < b) != order_greater && a != b {
            // Suffix at `right` is larger; restart there.
            right += offset + 1;
            offset = 0;
            period = right - left;
        } else if a == b {
            if offset + 1 == period {
                right += offset + 1;
                offset = 0;
            } else {
                offset += 1;
            }
        } else {
            // Suffix at `left` is still maximal.
            left = right;
            right += 1;
            offset = 0;
            period = 1;
        }
    }
    (left, period)
}

/// Offset of the least frequent needle byte per `byte_rank`.
fn rarest_offset(needle: &[u8]) -> usize {
    let mut best = 0;
    for (i, &b) in needle.iter().enumerate() {
        if byte_rank(b) < byte_rank(needle[best]) {
            best = i;
        }
    }
    best
}

/// A coarse static ranking of how often each byte appears in typical
/// search text. Lower is rarer. Exact frequencies do not matter; the scan
/// only needs to avoid seeding on bytes like space or `e`.
fn byte_rank(b: u8) -> u8 {
    match b {
        b' ' | b'e' | b't' | b'a' | b'o' | b'i' | b'n' => 250,
        b's' | b'r' | b'h' | b'l' | b'd' | b'c' | b'u' => 235,
        b'm' | b'f' | b'p' | b'g' | b'w' | b'y' | b'b' | b'v' => 215,
        b'k' | b'x' | b'j' | b'q' | b'z' => 190,
        b'0'..=b'9' => 200,
        b'A'..=b'Z' => 170,
        b'\n' | b'\r' | b'\t' => 160,
        0x21..=0x2F | 0x3A..=0x40 | 0x5B..=0x60 | 0x7B..=0x7E => 120,
        _ => 40,
    }
}

/// A searcher for the earliest occurrence of any needle in a set.
#[derive(Clone, Debug)]
pub struct MultiLiteralSearcher {
    needles: Vec<Vec<u8>>,
    imp: MultiImp,
}

#[derive(Clone, Debug)]
enum MultiImp {
    /// No needles: never matches.
    Empty,
    /// Up to a handful of needles: per-needle rare-byte searchers run in
    /// parallel and the earliest hit wins; ties go to the lowest index.
    Seeded(Vec<LiteralSearcher>),
    /// The general case.
    Automaton(AhoCorasick),
}

/// Above this many needles the per-needle scan loses to an automaton.
const SEEDED_LIMIT: usize = 4;

impl MultiLiteralSearcher {
    /// Build a multi-needle searcher. Empty needles are dropped; priority
    /// between the remaining needles follows their order in `needles`.
    pub fn new(needles: Vec<Vec<u8>>) -> MultiLiteralSearcher {
        let needles: Vec<Vec<u8>> =
            needles.into_iter().filter(|n| !n.is_empty()).collect();
        let imp = if needles.is_empty() {
            MultiImp::Empty
        } else if needles.len() <= SEEDED_LIMIT {
            MultiImp::Seeded(
                needles
                    .iter()
                    .map(|n| LiteralSearcher::new(n.clone()))
                    .collect(),
            )
        } else {
            // Leftmost-first gives alternation priority: among matches
            // starting at the same position, the earliest-listed needle
            // wins, exactly like a backtracking `a|b|c`.
            let ac = AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostFirst)
                .build(&needles)
                .expect("needle set is non-empty and sizes are modest");
            MultiImp::Automaton(ac)
        };
        MultiLiteralSearcher { needles, imp }
    }

    /// The needles participating in the search.
    #[allow(dead_code)]
    pub fn needles(&self) -> &[Vec<u8>] {
        &self.needles
    }

    /// Find the earliest match at or after `start`, returning its position
    /// and the index of the needle that matched.
    pub fn find(
        &self,
        haystack: &[u8],
        start: usize,
    ) -> Option<(usize, usize)> {
        if start > haystack.len() {
            return None;
        }
        match self.imp {
            MultiImp::Empty => None,
            MultiImp::Seeded(ref searchers) => {
                let mut best: Option<(usize, usize)> = None;
                for (index, searcher) in searchers.iter().enumerate() {
                    if let Some(pos) = searcher.find(haystack, start) {
                        let better = match best {
                            None => true,
                            // Strict: an earlier-listed needle keeps ties.
                            Some((bpos, _)) => pos < bpos,
                        };
                        if better {
                            best = Some((pos, index));
                        }
                    }
                }
                best
            }
            MultiImp::Automaton(ref ac) => ac
                .find(&haystack[start..])
                .map(|m| (start + m.start(), m.pattern().as_usize())),
        }
    }
}
