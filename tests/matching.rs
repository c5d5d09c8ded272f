// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Black-box matching tests over the public API: concrete scenarios,
//! engine-agreement checks and the universal match-ordering laws.

use simdre::{EngineChoice, Regex, RegexBuilder};

fn spans(re: &Regex, text: &str) -> Vec<(usize, usize, String)> {
    re.find_all(text)
        .into_iter()
        .map(|m| (m.start(), m.end(), m.as_str().to_string()))
        .collect()
}

macro_rules! assert_find_all {
    ($pattern:expr, $text:expr, $expected:expr) => {{
        let re = Regex::new($pattern).unwrap();
        let got: Vec<(usize, usize, String)> = spans(&re, $text);
        let expected: Vec<(usize, usize, String)> = $expected
            .iter()
            .map(|&(s, e, t)| (s, e, String::from(t)))
            .collect();
        assert_eq!(got, expected, "pattern {:?} on {:?}", $pattern, $text);
    }};
}

#[test]
fn scenario_table() {
    assert_find_all!(
        "hello",
        "hello world hello",
        [(0, 5, "hello"), (12, 17, "hello")]
    );
    assert_find_all!("a", "banana", [(1, 2, "a"), (3, 4, "a"), (5, 6, "a")]);
    assert_find_all!(
        "[0-9]+",
        "abc123def456",
        [(3, 6, "123"), (9, 12, "456")]
    );
    assert_find_all!("^[a-z]+$", "hello", [(0, 5, "hello")]);
    let empty: [(usize, usize, &str); 0] = [];
    assert_find_all!("^[a-z]+$", "Hello", empty);
    assert_find_all!(
        "(apple|banana|cherry)",
        "I like apple and banana",
        [(7, 12, "apple"), (17, 23, "banana")]
    );
    assert_find_all!(
        r"\d{3}-\d{3}-\d{4}",
        "call 555-123-4567 now",
        [(5, 17, "555-123-4567")]
    );
}

/// Patterns used for cross-engine and law checks. All are accepted by
/// both engines; the first group compiles to a DFA under Auto.
const DFA_PATTERNS: &[&str] = &[
    "hello",
    "a",
    "[0-9]+",
    "a*",
    "x?",
    "[ab]{2,3}",
    "aa|a",
    "a|aa",
    "abc|abd",
    "a|",
    "^[a-z]+$",
    "^abc",
    "abc$",
    r"\d{3}-\d{3}-\d{4}",
    "",
];

const TEXTS: &[&str] = &[
    "",
    "a",
    "b",
    "aa",
    "aaa",
    "ab",
    "abab",
    "banana",
    "hello world hello",
    "abc123def456",
    "call 555-123-4567 now",
    "abcabdabc",
    "xxxaaa",
    "123",
];

/// Spec law: the DFA and the backtracker agree on every (pattern, text)
/// pair that the DFA can run at all.
#[test]
fn engines_agree() {
    for pattern in DFA_PATTERNS {
        let auto = Regex::new(pattern).unwrap();
        let nfa = RegexBuilder::new(pattern)
            .engine(EngineChoice::Nfa)
            .build()
            .unwrap();
        assert_eq!(auto.engine_name(), "dfa", "pattern {pattern:?}");
        for text in TEXTS {
            assert_eq!(
                spans(&auto, text),
                spans(&nfa, text),
                "find_all, pattern {pattern:?} on {text:?}"
            );
            let d = auto.match_at_zero(text).map(|m| (m.start(), m.end()));
            let n = nfa.match_at_zero(text).map(|m| (m.start(), m.end()));
            assert_eq!(
                d, n,
                "match_at_zero, pattern {pattern:?} on {text:?}"
            );
            assert_eq!(
                auto.is_match(text),
                nfa.is_match(text),
                "is_match, pattern {pattern:?} on {text:?}"
            );
        }
    }
}

/// Spec law: `match_at_zero` succeeds exactly when `search` finds a
/// match starting at 0, with the same offsets.
#[test]
fn match_at_zero_iff_search_at_zero() {
    for pattern in DFA_PATTERNS {
        let re = Regex::new(pattern).unwrap();
        for text in TEXTS {
            let at_zero =
                re.match_at_zero(text).map(|m| (m.start(), m.end()));
            let searched = re
                .search(text)
                .filter(|m| m.start() == 0)
                .map(|m| (m.start(), m.end()));
            match (at_zero, searched) {
                (Some((0, _)), Some((0, _))) | (None, None) => {}
                // `search` reports the leftmost match; if it starts at
                // 0 the anchored form must agree exactly.
                (a, s) => assert_eq!(
                    a, s,
                    "pattern {pattern:?} on {text:?}"
                ),
            }
            if let Some((s, _)) = at_zero {
                assert_eq!(s, 0);
            }
        }
    }
}

/// Spec law: `find_all` yields strictly increasing starts and pairwise
/// disjoint ranges.
#[test]
fn find_all_is_ordered_and_disjoint() {
    for pattern in DFA_PATTERNS {
        let re = Regex::new(pattern).unwrap();
        for text in TEXTS {
            let matches = re.find_all(text);
            for pair in matches.windows(2) {
                assert!(
                    pair[0].start() < pair[1].start(),
                    "starts not increasing: pattern {pattern:?} on {text:?}"
                );
                assert!(
                    pair[0].end() <= pair[1].start(),
                    "ranges overlap: pattern {pattern:?} on {text:?}"
                );
            }
            for m in &matches {
                assert!(m.start() <= m.end());
                assert!(m.end() <= text.len());
            }
        }
    }
}

/// Spec law: a literal-only pattern matches exactly the substring
/// occurrences of the literal (non-overlapping, left to right).
#[test]
fn literal_patterns_are_substring_search() {
    let cases = [
        ("ana", "banana bandana"),
        ("aa", "aaaa"),
        ("xyz", "no such thing"),
        ("a", "aaa"),
    ];
    for (needle, haystack) in cases {
        let re = Regex::new(needle).unwrap();
        let got: Vec<usize> =
            re.find_all(haystack).iter().map(|m| m.start()).collect();
        // Non-overlapping reference scan.
        let mut expected = Vec::new();
        let mut at = 0;
        while let Some(i) = haystack[at..].find(needle) {
            expected.push(at + i);
            at += i + needle.len();
        }
        assert_eq!(got, expected, "needle {needle:?}");
        for m in re.find_all(haystack) {
            assert_eq!(m.as_str(), needle);
        }
    }
}

/// Spec law: `a*` at position 0 consumes exactly the leading run.
#[test]
fn greedy_star_consumes_leading_run() {
    let re = Regex::new("a*").unwrap();
    for text in ["", "b", "ab", "aab", "aaaa", "aaab aa"] {
        let leading = text.bytes().take_while(|&b| b == b'a').count();
        let m = re.match_at_zero(text).unwrap();
        assert_eq!((m.start(), m.end()), (0, leading), "text {text:?}");
    }
}

/// Spec law: `^P` never matches past 0 and `P$` only matches at the end.
#[test]
fn anchor_laws() {
    let start_anchored = Regex::new("^a+").unwrap();
    for text in TEXTS {
        for m in start_anchored.find_all(text) {
            assert_eq!(m.start(), 0, "text {text:?}");
        }
    }
    let end_anchored = Regex::new("a+$").unwrap();
    for text in TEXTS {
        for m in end_anchored.find_all(text) {
            assert_eq!(m.end(), text.len(), "text {text:?}");
        }
    }
}

/// Spec law: `[S]+` and `[^S]+` matches jointly cover every position.
#[test]
fn class_duality_covers_the_text() {
    let inside = Regex::new("[0-9a-f]+").unwrap();
    let outside = Regex::new("[^0-9a-f]+").unwrap();
    for text in TEXTS {
        let mut covered = vec![false; text.len()];
        for m in inside.find_all(text).iter().chain(&outside.find_all(text))
        {
            for slot in &mut covered[m.range()] {
                assert!(!*slot, "double cover in {text:?}");
                *slot = true;
            }
        }
        assert!(
            covered.iter().all(|&c| c),
            "positions uncovered in {text:?}"
        );
    }
}

#[test]
fn randomized_engine_agreement() {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xC0FFEE);
    let patterns = [
        "[ab]+",
        "a*b",
        "(ab|ba)+",
        "a{2,4}b?",
        "[^b]+",
        "(a|b|c){3}",
    ];
    let compiled: Vec<(Regex, Regex)> = patterns
        .iter()
        .map(|p| {
            (
                Regex::new(p).unwrap(),
                RegexBuilder::new(p)
                    .engine(EngineChoice::Nfa)
                    .build()
                    .unwrap(),
            )
        })
        .collect();
    for _ in 0..300 {
        let len = rng.gen_range(0..40);
        let text: String =
            (0..len).map(|_| rng.gen_range(b'a'..=b'c') as char).collect();
        for (auto, nfa) in &compiled {
            if auto.engine_name() != "dfa" {
                continue;
            }
            assert_eq!(
                spans(auto, &text),
                spans(nfa, &text),
                "pattern {:?} on {:?}",
                auto.as_str(),
                text
            );
        }
    }
}

#[test]
fn zero_width_matches_advance() {
    assert_find_all!(
        "a*",
        "bb",
        [(0, 0, ""), (1, 1, ""), (2, 2, "")]
    );
    assert_find_all!(
        "a*",
        "baa",
        [(0, 0, ""), (1, 3, "aa"), (3, 3, "")]
    );
    // The empty pattern matches at every position.
    assert_find_all!("", "ab", [(0, 0, ""), (1, 1, ""), (2, 2, "")]);
}

#[test]
fn empty_alternation_branches() {
    let re = Regex::new("ab|").unwrap();
    assert_eq!(re.match_at_zero("ab").unwrap().as_str(), "ab");
    assert_eq!(re.match_at_zero("xy").unwrap().as_str(), "");
}

#[test]
fn high_bytes_pass_through() {
    // A multi-byte character in the pattern is a sequence of plain byte
    // literals and matches itself.
    assert!(simdre::is_match("é", "héllo").unwrap());
    // The shorthands stay ASCII: `\w` skips the two bytes of `é`.
    let re = Regex::new(r"\w+").unwrap();
    let got: Vec<(usize, usize)> =
        re.find_all("héllo").iter().map(|m| (m.start(), m.end())).collect();
    assert_eq!(got, vec![(0, 1), (3, 6)]);
}

#[test]
fn engine_routing_is_visible() {
    let simple = Regex::new("[0-9]+").unwrap();
    assert_eq!(
        simple.get_stats(),
        "pattern=[0-9]+ engine=dfa complexity=simple"
    );
    let complex = Regex::new("((((((a))))))").unwrap();
    assert_eq!(complex.engine_name(), "nfa");
    assert!(complex.get_stats().contains("complexity=complex"));
    // Too large to determinize: classified medium, executed by the
    // backtracker, still correct.
    let big = Regex::new("[0-9]{5000}").unwrap();
    assert_eq!(big.engine_name(), "nfa");
    let text = "7".repeat(5000);
    assert!(big.is_match(&text));
}

#[test]
fn free_functions_and_cache() {
    // No assertions on cache_len here: the cache is process-global and
    // other tests may run concurrently. The lifecycle itself is covered
    // by the unit tests next to the cache.
    assert!(simdre::is_match("ba+", "abaab").unwrap());
    let m = simdre::search("ba+", "abaab").unwrap().unwrap();
    assert_eq!((m.start(), m.end()), (1, 4));
    let m = simdre::match_at_zero("a", "abc").unwrap().unwrap();
    assert_eq!((m.start(), m.end()), (0, 1));
    let all = simdre::find_all("a+", "a aa aaa").unwrap();
    let got: Vec<&str> = all.iter().map(|m| m.as_str()).collect();
    assert_eq!(got, vec!["a", "aa", "aaa"]);
    assert!(simdre::search("(", "x").is_err());
    simdre::cache_clear();
}

#[test]
fn long_inputs_cross_simd_chunks() {
    // Exercise the vector paths across chunk boundaries with runs much
    // longer than one 16-byte chunk.
    let text =
        format!("{}{}{}", "x".repeat(1000), "123456", "y".repeat(1000));
    let re = Regex::new("[0-9]+").unwrap();
    let m = re.search(&text).unwrap();
    assert_eq!((m.start(), m.end()), (1000, 1006));

    let re = Regex::new("1234").unwrap();
    assert_eq!(re.search(&text).unwrap().start(), 1000);

    let re = Regex::new("y+$").unwrap();
    let m = re.search(&text).unwrap();
    assert_eq!((m.start(), m.end()), (1006, 2006));
}

#[test]
fn deep_pattern_reports_complexity_error_via_try() {
    let re = RegexBuilder::new("(a|b)+c")
        .recursion_limit(8)
        .build()
        .unwrap();
    let text = "ab".repeat(50);
    assert!(matches!(
        re.try_search(&text),
        Err(simdre::Error::PatternTooComplex)
    ));
    assert_eq!(re.search(&text), None);
}

#[test]
fn malformed_patterns_report_offsets() {
    match Regex::new("ab(cd").unwrap_err() {
        simdre::Error::MalformedPattern { offset, .. } => {
            assert_eq!(offset, 2)
        }
        err => panic!("unexpected error {err:?}"),
    }
    for bad in
        ["a**", "a*?", "*a", "a{", "a{}", "a{2,1}", "[z-a]", "[abc", "(?P<x>a)", r"\k"]
    {
        assert!(Regex::new(bad).is_err(), "pattern {bad:?}");
    }
}
