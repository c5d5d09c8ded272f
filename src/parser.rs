// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The recursive-descent pattern parser.
//!
//! Precedence, tightest first: atom, quantifier, concatenation,
//! alternation. Alternation is binary and right-associative. Quantifiers
//! are not nodes; they are recorded as `(min, max)` bounds on their target.
//!
//! Non-greedy (`a*?`) and possessive (`a*+`) quantifiers are rejected here
//! rather than silently parsed as something else.

use crate::ast::{Anchor, Ast, AstKind, ClassSet, UNBOUNDED};
use crate::error::Error;
use crate::lexer::{tokenize, Shorthand, Token, TokenKind};

/// Parse a pattern string into an AST.
pub fn parse(pattern: &str) -> Result<Ast, Error> {
    let tokens = tokenize(pattern)?;
    let mut parser = Parser { tokens, pos: 0, end: pattern.len(), next_group_id: 1 };
    let ast = parser.alternation()?;
    if let Some(tok) = parser.peek() {
        return Err(match tok.kind {
            TokenKind::CloseParen => {
                Error::syntax("unmatched closing parenthesis", tok.offset)
            }
            _ => Error::syntax("unexpected token", tok.offset),
        });
    }
    Ok(ast)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Byte length of the pattern, used as the offset of end-of-input errors.
    end: usize,
    next_group_id: u32,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// The offset to report for an error at the current position.
    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    /// alternation := concat ('|' alternation)?
    fn alternation(&mut self) -> Result<Ast, Error> {
        let left = self.concat()?;
        if self.peek_kind() != Some(TokenKind::Pipe) {
            return Ok(left);
        }
        self.bump();
        // An empty right branch (`a|`) matches the empty string.
        let right = self.alternation()?;
        Ok(Ast::new(AstKind::Alternation {
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// concat := (atom quantifier?)*
    ///
    /// An empty concatenation is an empty group, which matches the empty
    /// string. This is what makes empty alternation branches work.
    fn concat(&mut self) -> Result<Ast, Error> {
        let mut children = Vec::new();
        loop {
            match self.peek_kind() {
                None | Some(TokenKind::Pipe) | Some(TokenKind::CloseParen) => {
                    break;
                }
                _ => {
                    let atom = self.atom()?;
                    children.push(self.quantifier(atom)?);
                }
            }
        }
        if children.len() == 1 {
            Ok(children.pop().expect("len checked"))
        } else {
            Ok(Ast::group(children))
        }
    }

    fn atom(&mut self) -> Result<Ast, Error> {
        let tok = self.bump().expect("caller checked for EOF");
        match tok.kind {
            TokenKind::Literal(b) => Ok(Ast::literal(b)),
            TokenKind::Wildcard => Ok(Ast::new(AstKind::Wildcard)),
            TokenKind::Shorthand(s) => {
                Ok(Ast::new(AstKind::Class(class_for(s))))
            }
            TokenKind::Caret => Ok(Ast::new(AstKind::Anchor(Anchor::Start))),
            TokenKind::Dollar => Ok(Ast::new(AstKind::Anchor(Anchor::End))),
            TokenKind::OpenBracket => self.class(tok.offset),
            TokenKind::OpenParen => self.group(tok.offset),
            TokenKind::CloseBracket => {
                Err(Error::syntax("unmatched closing bracket", tok.offset))
            }
            TokenKind::Question | TokenKind::Star | TokenKind::Plus => {
                Err(Error::syntax(
                    "repetition operator has nothing to repeat",
                    tok.offset,
                ))
            }
            TokenKind::OpenBrace => Err(Error::syntax(
                "repetition quantifier has nothing to repeat",
                tok.offset,
            )),
            // A stray `}`, `,` or `-` outside any special position matches
            // itself.
            kind => Ok(Ast::literal(
                kind.literal_byte().expect("remaining kinds are literal"),
            )),
        }
    }

    /// Attach a quantifier suffix to `atom` if one is present.
    fn quantifier(&mut self, mut atom: Ast) -> Result<Ast, Error> {
        let (min, max) = match self.peek_kind() {
            Some(TokenKind::Question) => {
                self.bump();
                (0, 1)
            }
            Some(TokenKind::Star) => {
                self.bump();
                (0, UNBOUNDED)
            }
            Some(TokenKind::Plus) => {
                self.bump();
                (1, UNBOUNDED)
            }
            Some(TokenKind::OpenBrace) => self.counted_quantifier()?,
            _ => return Ok(atom),
        };
        atom.min = min;
        atom.max = max;
        // `a*?` is a non-greedy quantifier, `a*+` a possessive one and
        // `a**` is nonsense. All must fail loudly instead of matching
        // something subtly different from what was written.
        if let Some(tok) = self.peek() {
            if tok.kind.is_quantifier() {
                return Err(Error::syntax(
                    "non-greedy, possessive and stacked quantifiers \
                     are not supported",
                    tok.offset,
                ));
            }
        }
        Ok(atom)
    }

    /// Parse `{n}`, `{n,}`, `{,m}` or `{n,m}`. The opening brace has been
    /// seen but not consumed.
    fn counted_quantifier(&mut self) -> Result<(u32, u32), Error> {
        let brace = self.bump().expect("caller matched OpenBrace");
        let lo = self.number()?;
        match self.peek_kind() {
            Some(TokenKind::CloseBrace) => {
                self.bump();
                match lo {
                    Some(n) => Ok((n, n)),
                    None => Err(Error::syntax(
                        "empty repetition quantifier",
                        brace.offset,
                    )),
                }
            }
            Some(TokenKind::Comma) => {
                self.bump();
                let hi = self.number()?;
                if self.peek_kind() != Some(TokenKind::CloseBrace) {
                    return Err(Error::syntax(
                        "unclosed repetition quantifier",
                        self.offset(),
                    ));
                }
                self.bump();
                match (lo, hi) {
                    (Some(n), Some(m)) if n > m => Err(Error::syntax(
                        "invalid repetition range: min exceeds max",
                        brace.offset,
                    )),
                    (Some(n), Some(m)) => Ok((n, m)),
                    (Some(n), None) => Ok((n, UNBOUNDED)),
                    (None, Some(m)) => Ok((0, m)),
                    (None, None) => Err(Error::syntax(
                        "empty repetition quantifier",
                        brace.offset,
                    )),
                }
            }
            _ => Err(Error::syntax(
                "repetition quantifier must be numeric",
                self.offset(),
            )),
        }
    }

    /// Parse a decimal number from literal digit tokens, if present.
    fn number(&mut self) -> Result<Option<u32>, Error> {
        let mut value: Option<u32> = None;
        while let Some(TokenKind::Literal(b @ b'0'..=b'9')) = self.peek_kind()
        {
            let digit = u32::from(b - b'0');
            let acc = value.unwrap_or(0);
            value = Some(
                acc.checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(|| {
                        Error::syntax("repetition count too large", self.offset())
                    })?,
            );
            self.bump();
        }
        Ok(value)
    }

    /// Parse a bracket class. The opening bracket has been consumed;
    /// `open` is its offset.
    fn class(&mut self, open: usize) -> Result<Ast, Error> {
        let mut set = ClassSet::empty();
        let mut negated = false;
        if self.peek_kind() == Some(TokenKind::Caret) {
            self.bump();
            negated = true;
        }
        // A `]` immediately after `[` or `[^` is a member, not a closer.
        let mut first = true;
        loop {
            let tok = match self.peek() {
                None => {
                    return Err(Error::syntax(
                        "unterminated character class",
                        open,
                    ));
                }
                Some(tok) => tok,
            };
            match tok.kind {
                TokenKind::CloseBracket if !first => {
                    self.bump();
                    break;
                }
                TokenKind::Shorthand(s) => {
                    self.bump();
                    set.union(&class_for(s));
                }
                TokenKind::Dash => {
                    // A dash that is not between two members is a literal.
                    // This arm catches the leading position (`[-a]`) and
                    // the position right after a completed range.
                    self.bump();
                    set.insert(b'-');
                }
                kind => {
                    self.bump();
                    let lo = kind.literal_byte().unwrap_or(b']');
                    if self.range_follows() {
                        self.bump(); // the dash
                        let hi_tok = self.bump().expect("range_follows");
                        let hi = hi_tok
                            .kind
                            .literal_byte()
                            .expect("range_follows checked");
                        if lo > hi {
                            return Err(Error::syntax(
                                "invalid character range: start exceeds end",
                                hi_tok.offset,
                            ));
                        }
                        set.insert_range(lo, hi);
                    } else {
                        set.insert(lo);
                    }
                }
            }
            first = false;
        }
        if negated {
            set.negate();
        }
        Ok(Ast::new(AstKind::Class(set)))
    }

    /// Returns true if the next two tokens form a range tail `-X` where `X`
    /// is a class member byte. A dash followed by `]`, end-of-input or a
    /// shorthand class is a literal dash instead.
    fn range_follows(&self) -> bool {
        if self.peek_kind() != Some(TokenKind::Dash) {
            return false;
        }
        match self.tokens.get(self.pos + 1).map(|t| t.kind) {
            None | Some(TokenKind::CloseBracket) => false,
            Some(kind) => kind.literal_byte().is_some(),
        }
    }

    /// Parse a group. The opening paren has been consumed; `open` is its
    /// offset.
    fn group(&mut self, open: usize) -> Result<Ast, Error> {
        let capturing = if self.peek_kind() == Some(TokenKind::Question) {
            let question = self.bump().expect("peeked");
            match self.peek_kind() {
                Some(TokenKind::Literal(b':')) => {
                    self.bump();
                    false
                }
                _ => {
                    return Err(Error::syntax(
                        "unsupported group syntax: only (?:...) is \
                         recognized after (?",
                        question.offset,
                    ));
                }
            }
        } else {
            true
        };
        let group_id = if capturing {
            let id = self.next_group_id;
            self.next_group_id += 1;
            id
        } else {
            0
        };
        let body = self.alternation()?;
        if self.peek_kind() != Some(TokenKind::CloseParen) {
            return Err(Error::syntax("unclosed group", open));
        }
        self.bump();
        // An unquantified non-capturing concatenation can donate its
        // children directly; anything else becomes the sole child.
        let children = match body {
            Ast {
                kind: AstKind::Group { children, capturing: false, group_id: 0 },
                min: 1,
                max: 1,
            } => children,
            other => vec![other],
        };
        Ok(Ast::new(AstKind::Group { children, capturing, group_id }))
    }
}

fn class_for(shorthand: Shorthand) -> ClassSet {
    match shorthand {
        Shorthand::Digit => ClassSet::digit(),
        Shorthand::Word => ClassSet::word(),
        Shorthand::Space => ClassSet::space(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(pattern: &str) -> Ast {
        parse(pattern).unwrap()
    }

    fn err_offset(pattern: &str) -> usize {
        match parse(pattern).unwrap_err() {
            Error::MalformedPattern { offset, .. } => offset,
            err => panic!("expected MalformedPattern, got {err:?}"),
        }
    }

    #[test]
    fn literal_concat() {
        let ast = p("abc");
        match ast.kind {
            AstKind::Group { ref children, .. } => {
                assert_eq!(children.len(), 3);
                assert_eq!(children[0], Ast::literal(b'a'));
            }
            ref kind => panic!("expected group, got {kind:?}"),
        }
    }

    #[test]
    fn single_atom_is_not_wrapped() {
        assert_eq!(p("a"), Ast::literal(b'a'));
    }

    #[test]
    fn quantifier_bounds() {
        assert_eq!((p("a?").min, p("a?").max), (0, 1));
        assert_eq!((p("a*").min, p("a*").max), (0, UNBOUNDED));
        assert_eq!((p("a+").min, p("a+").max), (1, UNBOUNDED));
        assert_eq!((p("a{3}").min, p("a{3}").max), (3, 3));
        assert_eq!((p("a{2,}").min, p("a{2,}").max), (2, UNBOUNDED));
        assert_eq!((p("a{,4}").min, p("a{,4}").max), (0, 4));
        assert_eq!((p("a{2,4}").min, p("a{2,4}").max), (2, 4));
    }

    #[test]
    fn quantifier_errors() {
        assert!(parse("a{}").is_err());
        assert!(parse("a{,}").is_err());
        assert!(parse("a{4,2}").is_err());
        assert!(parse("a{x}").is_err());
        assert!(parse("a{2").is_err());
        assert!(parse("*a").is_err());
        assert!(parse("{3}").is_err());
        assert!(parse("a{99999999999}").is_err());
    }

    #[test]
    fn non_greedy_rejected() {
        assert!(parse("a*?").is_err());
        assert!(parse("a+?").is_err());
        assert!(parse("a??").is_err());
        assert!(parse("a*+").is_err());
        assert!(parse("a**").is_err());
        assert!(parse("a{2,3}?").is_err());
    }

    #[test]
    fn alternation_is_right_associative() {
        let ast = p("a|b|c");
        match ast.kind {
            AstKind::Alternation { ref left, ref right } => {
                assert_eq!(**left, Ast::literal(b'a'));
                match right.kind {
                    AstKind::Alternation { .. } => {}
                    ref kind => panic!("expected nested alt, got {kind:?}"),
                }
            }
            ref kind => panic!("expected alternation, got {kind:?}"),
        }
    }

    #[test]
    fn empty_alternation_branch() {
        let ast = p("a|");
        match ast.kind {
            AstKind::Alternation { ref right, .. } => {
                assert!(right.matches_empty());
            }
            ref kind => panic!("expected alternation, got {kind:?}"),
        }
        assert!(parse("|a").is_ok());
        assert!(parse("a||b").is_ok());
    }

    #[test]
    fn classes() {
        let ast = p("[a-fA-F0-9_]");
        match ast.kind {
            AstKind::Class(ref set) => {
                assert!(set.contains(b'c'));
                assert!(set.contains(b'D'));
                assert!(set.contains(b'7'));
                assert!(set.contains(b'_'));
                assert!(!set.contains(b'g'));
            }
            ref kind => panic!("expected class, got {kind:?}"),
        }
    }

    #[test]
    fn negated_class_is_folded() {
        let ast = p("[^a-z]");
        match ast.kind {
            AstKind::Class(ref set) => {
                assert!(set.negated);
                assert!(!set.contains(b'm'));
                assert!(set.contains(b'A'));
                assert!(set.contains(0xFF));
            }
            ref kind => panic!("expected class, got {kind:?}"),
        }
    }

    #[test]
    fn class_dash_rules() {
        // Leading and trailing dashes are literal.
        for pattern in ["[-a]", "[a-]"] {
            match p(pattern).kind {
                AstKind::Class(ref set) => {
                    assert!(set.contains(b'-'), "pattern {pattern}");
                    assert!(set.contains(b'a'), "pattern {pattern}");
                }
                ref kind => panic!("expected class, got {kind:?}"),
            }
        }
        assert!(parse("[z-a]").is_err());
    }

    #[test]
    fn class_shorthand_merge() {
        match p(r"[\s\d]").kind {
            AstKind::Class(ref set) => {
                assert!(set.contains(b' '));
                assert!(set.contains(b'5'));
                assert!(!set.contains(b'a'));
            }
            ref kind => panic!("expected class, got {kind:?}"),
        }
    }

    #[test]
    fn class_metacharacters_are_literal() {
        match p("[.+*?(){}|$^]").kind {
            AstKind::Class(ref set) => {
                for &b in b".+*?(){}|$^" {
                    assert!(set.contains(b), "missing {:?}", b as char);
                }
            }
            ref kind => panic!("expected class, got {kind:?}"),
        }
    }

    #[test]
    fn leading_close_bracket_is_member() {
        match p("[]a]").kind {
            AstKind::Class(ref set) => {
                assert!(set.contains(b']'));
                assert!(set.contains(b'a'));
            }
            ref kind => panic!("expected class, got {kind:?}"),
        }
    }

    #[test]
    fn groups_and_ids() {
        let ast = p("(a)(?:b)(c)");
        match ast.kind {
            AstKind::Group { ref children, .. } => {
                let ids: Vec<(bool, u32)> = children
                    .iter()
                    .map(|c| match c.kind {
                        AstKind::Group { capturing, group_id, .. } => {
                            (capturing, group_id)
                        }
                        ref kind => panic!("expected group, got {kind:?}"),
                    })
                    .collect();
                assert_eq!(ids, vec![(true, 1), (false, 0), (true, 2)]);
            }
            ref kind => panic!("expected group, got {kind:?}"),
        }
    }

    #[test]
    fn group_errors() {
        assert!(parse("(a").is_err());
        assert!(parse("a)").is_err());
        assert!(parse("(?P<name>a)").is_err());
        assert!(parse("(?=a)").is_err());
        assert!(parse("[a").is_err());
        assert!(parse("a]").is_err());
    }

    #[test]
    fn error_offsets() {
        assert_eq!(err_offset("ab(c"), 2);
        assert_eq!(err_offset("a{2"), 3);
        assert_eq!(err_offset("[z-a]"), 3);
    }

    #[test]
    fn anchors() {
        let ast = p("^a$");
        match ast.kind {
            AstKind::Group { ref children, .. } => {
                assert_eq!(
                    children[0].kind,
                    AstKind::Anchor(Anchor::Start)
                );
                assert_eq!(children[2].kind, AstKind::Anchor(Anchor::End));
            }
            ref kind => panic!("expected group, got {kind:?}"),
        }
    }

    #[test]
    fn nested_quantified_group() {
        let ast = p("(?:ab){2,3}");
        assert_eq!((ast.min, ast.max), (2, 3));
        match ast.kind {
            AstKind::Group { ref children, capturing, .. } => {
                assert!(!capturing);
                assert_eq!(children.len(), 2);
            }
            ref kind => panic!("expected group, got {kind:?}"),
        }
    }
}
