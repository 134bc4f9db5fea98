use crate::ast::{self, Ast, Position, Span};
use std::{borrow::Borrow, cell::Cell, result};

use super::{ClassItem, ErrorKind, Literal, LiteralKind, PerlClass, PerlClassKind};

type Result<T> = result::Result<T, ast::Error>;

pub struct Parser {
    p: String,
    pos: Cell<Position>,
    stack: Vec<GroupState>,
    captures: usize,
    names: Vec<String>,
    nest_limit: usize,
}

enum GroupState {
    Group {
        concat: ast::Concat,
        group: ast::Group,
    },
    Alternation {
        alt: ast::Alternation,
    },
}

/// What a backslash sequence stands for.
enum Escape {
    Char(char, LiteralKind),
    Perl(PerlClass),
}

impl Parser {
    pub fn new(p: String) -> Self {
        Parser {
            p,
            pos: Cell::new(Position::new(0)),
            stack: vec![],
            captures: 0,
            names: vec![],
            nest_limit: 250,
        }
    }

    /// Bounds how many groups and repetitions may enclose one another.
    pub fn nest_limit(mut self, limit: usize) -> Self {
        self.nest_limit = limit;
        self
    }

    fn pattern(&self) -> &str {
        self.p.borrow()
    }

    fn pos(&self) -> Position {
        self.pos.get()
    }

    fn span(&self) -> Span {
        Span::point(self.pos())
    }

    fn span_char(&self) -> Span {
        Span::new(
            self.pos(),
            Position {
                offset: self.offset() + self.char().len_utf8(),
            },
        )
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.pos())
    }

    fn error(&self, span: Span, kind: ast::ErrorKind) -> ast::Error {
        ast::Error {
            kind,
            pattern: self.pattern().to_string(),
            span,
        }
    }

    fn offset(&self) -> usize {
        self.pos().offset
    }

    fn bump(&self) -> bool {
        if self.is_eof() {
            return false;
        }
        self.pos
            .set(Position::new(self.pos().offset + self.char().len_utf8()));
        self.pattern()[self.offset()..].chars().next().is_some()
    }

    fn is_eof(&self) -> bool {
        self.offset() == self.p.len()
    }

    fn char(&self) -> char {
        self.char_at(self.pos().offset)
    }

    fn char_at(&self, i: usize) -> char {
        self.pattern()[i..]
            .chars()
            .next()
            .unwrap_or_else(|| panic!("expected char at offset {}", i))
    }

    /// The character after the current one, if any.
    fn peek(&self) -> Option<char> {
        if self.is_eof() {
            return None;
        }
        self.pattern()[self.offset() + self.char().len_utf8()..]
            .chars()
            .next()
    }

    fn open_groups(&self) -> usize {
        self.stack
            .iter()
            .filter(|s| matches!(s, GroupState::Group { .. }))
            .count()
    }

    /// Fails if `ast`, placed inside the groups still open, nests deeper
    /// than the limit.
    fn check_nest(&self, ast: &Ast, span: Span) -> Result<()> {
        if self.open_groups() + nest(ast) > self.nest_limit {
            return Err(self.error(span, ErrorKind::NestLimitExceeded(self.nest_limit)));
        }
        Ok(())
    }

    pub fn parse(&mut self) -> Result<Ast> {
        let mut concat = ast::Concat::new(self.span());
        loop {
            if self.is_eof() {
                break;
            }

            match self.char() {
                '(' => concat = self.push_group(concat)?,
                ')' => concat = self.pop_group(concat)?,
                '|' => concat = self.push_alternate(concat)?,
                '?' => concat = self.parse_repetition(concat, ast::RepetitionKind::ZeroOrOne)?,
                '*' => concat = self.parse_repetition(concat, ast::RepetitionKind::ZeroOrMore)?,
                '+' => concat = self.parse_repetition(concat, ast::RepetitionKind::OneOrMore)?,
                '{' => concat = self.parse_counted_repetition(concat)?,
                '[' => concat.asts.push(Ast::Class(self.parse_class()?)),
                '.' => concat.asts.push(self.parse_dot()),
                '^' => concat.asts.push(self.parse_assertion(ast::AssertionKind::StartText)),
                '$' => concat.asts.push(self.parse_assertion(ast::AssertionKind::EndText)),
                '\\' => concat.asts.push(self.parse_escape()?),
                _ => concat.asts.push(Ast::Literal(self.parse_primitive()?)),
            }
        }

        let ast = self.pop_end(concat)?;
        log::trace!("parsed {:?} with {} capture groups", self.pattern(), self.captures);
        Ok(ast)
    }

    fn parse_primitive(&self) -> Result<Literal> {
        let l = Literal {
            span: self.span_char(),
            kind: ast::LiteralKind::Verbatim,
            char: self.char(),
        };
        self.bump();
        Ok(l)
    }

    fn parse_dot(&self) -> Ast {
        let dot = ast::Dot {
            span: self.span_char(),
        };
        self.bump();
        Ast::Dot(dot)
    }

    fn parse_assertion(&self, kind: ast::AssertionKind) -> Ast {
        let assertion = ast::Assertion {
            span: self.span_char(),
            kind,
        };
        self.bump();
        Ast::Assertion(assertion)
    }

    fn parse_repetition(
        &self,
        mut concat: ast::Concat,
        kind: ast::RepetitionKind,
    ) -> Result<ast::Concat> {
        assert!(self.char() == '?' || self.char() == '*' || self.char() == '+');

        let start = self.pos();
        let ast = concat
            .asts
            .pop()
            .ok_or_else(|| self.error(self.span_char(), ErrorKind::InvalidQuantifier))?;

        let mut greedy = true;
        if self.bump() && self.char() == '?' {
            greedy = false;
            self.bump();
        }
        let rep = Ast::Repetition(ast::Repetition {
            op: ast::RepetitionOp {
                span: Span::new(start, self.pos()),
                kind,
            },
            greedy,
            ast: Box::new(ast),
        });
        self.check_nest(&rep, Span::new(start, self.pos()))?;
        concat.asts.push(rep);
        Ok(concat)
    }

    /// Parses `{m}`, `{m,}` or `{m,n}` applied to the last item of `concat`.
    fn parse_counted_repetition(&self, mut concat: ast::Concat) -> Result<ast::Concat> {
        assert_eq!(self.char(), '{');

        let start = self.pos();
        let ast = concat
            .asts
            .pop()
            .ok_or_else(|| self.error(self.span_char(), ErrorKind::InvalidQuantifier))?;
        let invalid = || self.error(self.span_from(start), ErrorKind::InvalidQuantifier);

        if !self.bump() {
            return Err(invalid());
        }
        let min = self.parse_decimal().ok_or_else(invalid)?;
        if self.is_eof() {
            return Err(invalid());
        }
        let range = match self.char() {
            '}' => ast::RepetitionRange::Exactly(min),
            ',' => {
                if !self.bump() {
                    return Err(invalid());
                }
                if self.char() == '}' {
                    ast::RepetitionRange::AtLeast(min)
                } else {
                    let max = self.parse_decimal().ok_or_else(invalid)?;
                    if self.is_eof() || self.char() != '}' {
                        return Err(invalid());
                    }
                    if min > max {
                        self.bump();
                        return Err(invalid());
                    }
                    ast::RepetitionRange::Bounded(min, max)
                }
            }
            _ => return Err(invalid()),
        };

        let mut greedy = true;
        if self.bump() && self.char() == '?' {
            greedy = false;
            self.bump();
        }
        let rep = Ast::Repetition(ast::Repetition {
            op: ast::RepetitionOp {
                span: Span::new(start, self.pos()),
                kind: ast::RepetitionKind::Range(range),
            },
            greedy,
            ast: Box::new(ast),
        });
        self.check_nest(&rep, Span::new(start, self.pos()))?;
        concat.asts.push(rep);
        Ok(concat)
    }

    fn parse_decimal(&self) -> Option<u32> {
        let start = self.offset();
        while !self.is_eof() && self.char().is_ascii_digit() {
            self.bump();
        }
        self.pattern()[start..self.offset()].parse::<u32>().ok()
    }

    fn push_group(&mut self, concat: ast::Concat) -> Result<ast::Concat> {
        assert!(self.char() == '(');
        if self.open_groups() >= self.nest_limit {
            return Err(self.error(
                self.span_char(),
                ErrorKind::NestLimitExceeded(self.nest_limit),
            ));
        }
        let open = self.pos();
        let kind = if self.bump() && self.char() == '?' {
            self.parse_group_kind(open)?
        } else {
            self.captures += 1;
            ast::GroupKind::Capture {
                index: self.captures,
                name: None,
            }
        };
        self.stack.push(GroupState::Group {
            concat,
            group: ast::Group {
                span: self.span_from(open),
                kind,
                ast: Box::new(Ast::Empty(ast::Empty { span: self.span() })),
            },
        });
        Ok(ast::Concat::new(self.span()))
    }

    /// Parses the `?:`, `?P<name>` or `?<name>` after an opening parenthesis.
    fn parse_group_kind(&mut self, open: Position) -> Result<ast::GroupKind> {
        assert_eq!(self.char(), '?');
        let unexpected = |p: &Parser| {
            let span = if p.is_eof() {
                p.span_from(open)
            } else {
                Span::new(open, Position::new(p.offset() + p.char().len_utf8()))
            };
            p.error(span, ErrorKind::UnexpectedToken)
        };
        if !self.bump() {
            return Err(unexpected(self));
        }
        match self.char() {
            ':' => {
                self.bump();
                Ok(ast::GroupKind::NonCapturing)
            }
            'P' if self.peek() == Some('<') => {
                self.bump();
                self.parse_group_name(open)
            }
            '<' => self.parse_group_name(open),
            _ => Err(unexpected(self)),
        }
    }

    fn parse_group_name(&mut self, open: Position) -> Result<ast::GroupKind> {
        assert_eq!(self.char(), '<');
        self.bump();
        let start = self.offset();
        while !self.is_eof() && self.char() != '>' {
            self.bump();
        }
        if self.is_eof() {
            return Err(self.error(self.span_from(open), ErrorKind::InvalidGroupName));
        }
        let name = self.pattern()[start..self.offset()].to_string();
        let name_span = Span::new(Position::new(start), self.pos());
        self.bump();

        let mut chars = name.chars();
        let valid = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
            && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
        if !valid {
            return Err(self.error(name_span, ErrorKind::InvalidGroupName));
        }
        if self.names.contains(&name) {
            return Err(self.error(name_span, ErrorKind::DuplicateGroupName));
        }
        self.names.push(name.clone());
        self.captures += 1;
        Ok(ast::GroupKind::Capture {
            index: self.captures,
            name: Some(name),
        })
    }

    fn pop_group(&mut self, mut group_concat: ast::Concat) -> Result<ast::Concat> {
        use self::GroupState::*;

        assert!(self.char() == ')');
        let err = Err(self.error(self.span_char(), ErrorKind::UnbalancedGroup));
        let (mut before_concat, mut group, alt) = match self.stack.pop() {
            None => return err,
            Some(Group { concat, group }) => (concat, group, None),
            Some(Alternation { alt }) => match self.stack.pop() {
                Some(Group { concat, group }) => (concat, group, Some(alt)),
                Some(Alternation { .. }) => return err,
                None => return err,
            },
        };
        group_concat.span.end = self.pos();
        self.bump();
        group.span.end = self.pos();

        match alt {
            Some(mut alt) => {
                alt.span.end = group_concat.span.end;
                alt.asts.push(group_concat.into_ast());
                group.ast = Box::new(alt.into_ast());
            }
            None => {
                group.ast = Box::new(group_concat.into_ast());
            }
        }

        let span = group.span;
        let group = Ast::Group(group);
        self.check_nest(&group, span)?;
        before_concat.asts.push(group);
        Ok(before_concat)
    }

    fn push_alternate(&mut self, mut concat: ast::Concat) -> Result<ast::Concat> {
        assert_eq!(self.char(), '|');
        concat.span.end = self.pos();
        match self.stack.last_mut() {
            Some(GroupState::Alternation { ref mut alt }) => {
                alt.asts.push(concat.into_ast());
            }
            _ => {
                let alt = ast::Alternation {
                    span: Span::new(concat.span.start, self.pos()),
                    asts: vec![concat.into_ast()],
                };
                self.stack.push(GroupState::Alternation { alt })
            }
        };

        self.bump();
        Ok(ast::Concat {
            span: self.span(),
            asts: vec![],
        })
    }

    fn pop_end(&mut self, mut concat: ast::Concat) -> Result<Ast> {
        concat.span.end = self.pos();
        let ast = match self.stack.pop() {
            Some(GroupState::Alternation { mut alt }) => {
                alt.span.end = self.pos();
                alt.asts.push(concat.into_ast());
                Ok(Ast::Alternation(alt))
            }
            Some(GroupState::Group { group, .. }) => {
                return Err(self.error(group.span, ErrorKind::UnbalancedGroup))
            }
            None => Ok(concat.into_ast()),
        };
        match self.stack.pop() {
            Some(GroupState::Alternation { .. }) => unreachable!(),
            Some(GroupState::Group { group, .. }) => {
                Err(self.error(group.span, ErrorKind::UnbalancedGroup))
            }
            None => ast,
        }
    }

    fn parse_class(&self) -> Result<ast::Class> {
        assert_eq!(self.char(), '[');
        let start = self.pos();
        let unterminated = || self.error(self.span_from(start), ErrorKind::UnterminatedClass);

        if !self.bump() {
            return Err(unterminated());
        }
        let mut negated = false;
        if self.char() == '^' {
            negated = true;
            if !self.bump() {
                return Err(unterminated());
            }
        }

        let mut items = vec![];
        loop {
            if self.is_eof() {
                return Err(unterminated());
            }
            if self.char() == ']' && !items.is_empty() {
                self.bump();
                break;
            }
            let atom_start = self.pos();
            let lo = match self.parse_class_atom()? {
                Escape::Perl(perl) => {
                    items.push(ClassItem::Perl(perl));
                    continue;
                }
                Escape::Char(c, _) => c,
            };
            let is_range = !self.is_eof()
                && self.char() == '-'
                && matches!(self.peek(), Some(c) if c != ']');
            if !is_range {
                items.push(ClassItem::Literal(lo));
                continue;
            }
            self.bump();
            match self.parse_class_atom()? {
                Escape::Char(hi, _) if lo <= hi => items.push(ClassItem::Range(lo, hi)),
                _ => {
                    return Err(self.error(self.span_from(atom_start), ErrorKind::InvalidClassRange))
                }
            }
        }

        Ok(ast::Class {
            span: self.span_from(start),
            negated,
            items,
        })
    }

    fn parse_class_atom(&self) -> Result<Escape> {
        if self.char() == '\\' {
            return self.parse_escape_sequence();
        }
        let c = self.char();
        self.bump();
        Ok(Escape::Char(c, LiteralKind::Verbatim))
    }

    fn parse_escape(&self) -> Result<Ast> {
        let start = self.pos();
        let ast = match self.parse_escape_sequence()? {
            Escape::Char(c, kind) => Ast::Literal(Literal {
                span: self.span_from(start),
                kind,
                char: c,
            }),
            Escape::Perl(perl) => Ast::Class(ast::Class {
                span: self.span_from(start),
                negated: false,
                items: vec![ClassItem::Perl(perl)],
            }),
        };
        Ok(ast)
    }

    fn parse_escape_sequence(&self) -> Result<Escape> {
        assert_eq!(self.char(), '\\');
        let start = self.pos();
        if !self.bump() {
            return Err(self.error(self.span_from(start), ErrorKind::UnexpectedToken));
        }
        let c = self.char();
        let perl = |kind, negated| Escape::Perl(PerlClass { kind, negated });
        let escape = match c {
            'd' => perl(PerlClassKind::Digit, false),
            'D' => perl(PerlClassKind::Digit, true),
            'w' => perl(PerlClassKind::Word, false),
            'W' => perl(PerlClassKind::Word, true),
            's' => perl(PerlClassKind::Space, false),
            'S' => perl(PerlClassKind::Space, true),
            'n' => Escape::Char('\n', LiteralKind::Special),
            't' => Escape::Char('\t', LiteralKind::Special),
            'r' => Escape::Char('\r', LiteralKind::Special),
            'f' => Escape::Char('\x0C', LiteralKind::Special),
            'v' => Escape::Char('\x0B', LiteralKind::Special),
            '0' => Escape::Char('\0', LiteralKind::Special),
            'x' | 'u' => return self.parse_hex_escape(start),
            c if c.is_ascii_punctuation() => Escape::Char(c, LiteralKind::Punctuation),
            _ => {
                self.bump();
                return Err(self.error(self.span_from(start), ErrorKind::InvalidEscape));
            }
        };
        self.bump();
        Ok(escape)
    }

    /// `\xHH` or `\u{H...}`, positioned on the `x`/`u`.
    fn parse_hex_escape(&self, start: Position) -> Result<Escape> {
        let invalid = || self.error(self.span_from(start), ErrorKind::InvalidEscape);
        let braced = self.char() == 'u';
        if !self.bump() {
            return Err(invalid());
        }
        let digits_start = self.offset();
        if braced {
            if self.char() != '{' || !self.bump() {
                return Err(invalid());
            }
            let digits_start = self.offset();
            while !self.is_eof() && self.char().is_ascii_hexdigit() {
                self.bump();
            }
            let digits = &self.pattern()[digits_start..self.offset()];
            if self.is_eof() || self.char() != '}' || digits.is_empty() || digits.len() > 6 {
                return Err(invalid());
            }
            self.bump();
            return u32::from_str_radix(digits, 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| Escape::Char(c, LiteralKind::Special))
                .ok_or_else(invalid);
        }
        for _ in 0..2 {
            if self.is_eof() || !self.char().is_ascii_hexdigit() {
                return Err(invalid());
            }
            self.bump();
        }
        let digits = &self.pattern()[digits_start..self.offset()];
        u32::from_str_radix(digits, 16)
            .ok()
            .and_then(char::from_u32)
            .map(|c| Escape::Char(c, LiteralKind::Special))
            .ok_or_else(invalid)
    }
}

/// The number of groups and repetitions on the deepest path through `ast`.
fn nest(ast: &Ast) -> usize {
    match *ast {
        Ast::Group(ref group) => 1 + nest(&group.ast),
        Ast::Repetition(ref rep) => 1 + nest(&rep.ast),
        Ast::Concat(ref concat) => concat.asts().iter().map(nest).max().unwrap_or(0),
        Ast::Alternation(ref alt) => alt.asts.iter().map(nest).max().unwrap_or(0),
        Ast::Empty(_) | Ast::Literal(_) | Ast::Dot(_) | Ast::Class(_) | Ast::Assertion(_) => 0,
    }
}

#[cfg(test)]
mod tests {

    use std::{ops::Range, vec};

    use super::Parser;
    use crate::ast::{self, Ast, ClassItem, ErrorKind, Position, Span};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn p(s: &str) -> super::Parser {
        Parser::new(s.to_string())
    }

    fn pp(s: &str) -> super::Result<Ast> {
        p(s).parse()
    }

    fn span(range: Range<usize>) -> Span {
        let start = Position::new(range.start);
        let end = Position::new(range.end);
        Span::new(start, end)
    }

    fn lit_one(c: char, p: usize) -> Ast {
        Ast::Literal(ast::Literal {
            span: span(p..p + c.len_utf8()),
            kind: ast::LiteralKind::Verbatim,
            char: c,
        })
    }

    fn empty(p: usize) -> Ast {
        Ast::Empty(ast::Empty { span: span(p..p) })
    }

    fn rep(s: Range<usize>, kind: ast::RepetitionKind, greedy: bool, ast: Ast) -> Ast {
        Ast::Repetition(ast::Repetition {
            op: ast::RepetitionOp { span: span(s), kind },
            greedy,
            ast: Box::new(ast),
        })
    }

    fn concat(r: Range<usize>, asts: Vec<Ast>) -> Ast {
        Ast::Concat(ast::Concat { span: span(r), asts })
    }

    fn alt(r: Range<usize>, asts: Vec<Ast>) -> Ast {
        Ast::Alternation(ast::Alternation { span: span(r), asts })
    }

    fn group(r: Range<usize>, index: usize, ast: Ast) -> Ast {
        Ast::Group(ast::Group {
            span: span(r),
            kind: ast::GroupKind::Capture { index, name: None },
            ast: Box::new(ast),
        })
    }

    fn class(r: Range<usize>, negated: bool, items: Vec<ClassItem>) -> Ast {
        Ast::Class(ast::Class {
            span: span(r),
            negated,
            items,
        })
    }

    #[test]
    fn parse_primitive() {
        assert_eq!(
            p(r"a").parse_primitive(),
            Ok(ast::Literal {
                span: span(0..1),
                kind: ast::LiteralKind::Verbatim,
                char: 'a',
            })
        );
        assert_eq!(
            p(r"☃").parse_primitive(),
            Ok(ast::Literal {
                span: span(0..3),
                kind: ast::LiteralKind::Verbatim,
                char: '☃',
            })
        );
    }

    #[test]
    fn parse_repetition() {
        use ast::RepetitionKind::{OneOrMore, ZeroOrMore, ZeroOrOne};
        assert_eq!(pp(r"a*"), Ok(rep(1..2, ZeroOrMore, true, lit_one('a', 0))));
        assert_eq!(pp(r"a+"), Ok(rep(1..2, OneOrMore, true, lit_one('a', 0))));
        assert_eq!(pp(r"a?"), Ok(rep(1..2, ZeroOrOne, true, lit_one('a', 0))));
        assert_eq!(pp(r"a*?"), Ok(rep(1..3, ZeroOrMore, false, lit_one('a', 0))));
        assert_eq!(
            pp(r"a*b"),
            Ok(concat(
                0..3,
                vec![
                    rep(1..2, ZeroOrMore, true, lit_one('a', 0)),
                    lit_one('b', 2),
                ]
            ))
        );
        assert_eq!(
            pp(r"a(b)*c"),
            Ok(concat(
                0..6,
                vec![
                    lit_one('a', 0),
                    rep(4..5, ZeroOrMore, true, group(1..4, 1, lit_one('b', 2))),
                    lit_one('c', 5),
                ]
            ))
        );
    }

    #[test]
    fn parse_counted_repetition() {
        use ast::RepetitionKind::Range;
        use ast::RepetitionRange::{AtLeast, Bounded, Exactly};
        assert_eq!(pp(r"a{3}"), Ok(rep(1..4, Range(Exactly(3)), true, lit_one('a', 0))));
        assert_eq!(pp(r"a{2,}"), Ok(rep(1..5, Range(AtLeast(2)), true, lit_one('a', 0))));
        assert_eq!(
            pp(r"a{1,12}?"),
            Ok(rep(1..8, Range(Bounded(1, 12)), false, lit_one('a', 0)))
        );
    }

    #[test]
    fn test_group() {
        assert_eq!(pp(r"(a)"), Ok(group(0..3, 1, lit_one('a', 1))));
        assert_eq!(
            pp(r"a(b(c))a"),
            Ok(concat(
                0..8,
                vec![
                    lit_one('a', 0),
                    group(
                        1..7,
                        1,
                        concat(2..6, vec![lit_one('b', 2), group(3..6, 2, lit_one('c', 4))])
                    ),
                    lit_one('a', 7)
                ]
            ))
        );
        assert_eq!(
            pp(r"(a|b)"),
            Ok(group(
                0..5,
                1,
                alt(1..4, vec![lit_one('a', 1), lit_one('b', 3)])
            ),)
        );
    }

    #[test]
    fn test_group_kinds() {
        assert_eq!(
            pp(r"(?:a)"),
            Ok(Ast::Group(ast::Group {
                span: span(0..5),
                kind: ast::GroupKind::NonCapturing,
                ast: Box::new(lit_one('a', 3)),
            }))
        );
        assert_eq!(
            pp(r"(?P<x>a)(?<y_1>b)"),
            Ok(concat(
                0..17,
                vec![
                    Ast::Group(ast::Group {
                        span: span(0..8),
                        kind: ast::GroupKind::Capture {
                            index: 1,
                            name: Some("x".to_string())
                        },
                        ast: Box::new(lit_one('a', 6)),
                    }),
                    Ast::Group(ast::Group {
                        span: span(8..17),
                        kind: ast::GroupKind::Capture {
                            index: 2,
                            name: Some("y_1".to_string())
                        },
                        ast: Box::new(lit_one('b', 15)),
                    }),
                ]
            ))
        );
    }

    #[test]
    fn test_alternation() {
        assert_eq!(
            pp(r"a|b"),
            Ok(alt(0..3, vec![lit_one('a', 0), lit_one('b', 2)]))
        );
        assert_eq!(
            pp(r"a|b|c"),
            Ok(alt(
                0..5,
                vec![lit_one('a', 0), lit_one('b', 2), lit_one('c', 4)]
            ))
        );
        assert_eq!(
            pp(r"ab|bc"),
            Ok(alt(
                0..5,
                vec![
                    concat(0..2, vec![lit_one('a', 0), lit_one('b', 1)]),
                    concat(3..5, vec![lit_one('b', 3), lit_one('c', 4)])
                ]
            ))
        );
        assert_eq!(
            pp(r"a||b"),
            Ok(alt(0..4, vec![lit_one('a', 0), empty(2), lit_one('b', 3),]))
        );
    }

    #[test]
    fn test_class() {
        assert_eq!(
            pp(r"[a-c_]"),
            Ok(class(
                0..6,
                false,
                vec![ClassItem::Range('a', 'c'), ClassItem::Literal('_')]
            ))
        );
        assert_eq!(
            pp(r"[^]-]"),
            Ok(class(
                0..5,
                true,
                vec![ClassItem::Literal(']'), ClassItem::Literal('-')]
            ))
        );
        assert_eq!(
            pp(r"[\d\]]"),
            Ok(class(
                0..6,
                false,
                vec![
                    ClassItem::Perl(ast::PerlClass {
                        kind: ast::PerlClassKind::Digit,
                        negated: false
                    }),
                    ClassItem::Literal(']')
                ]
            ))
        );
    }

    #[test]
    fn test_escapes_and_specials() {
        assert_eq!(
            pp(r"\*"),
            Ok(Ast::Literal(ast::Literal {
                span: span(0..2),
                kind: ast::LiteralKind::Punctuation,
                char: '*',
            }))
        );
        assert_eq!(
            pp(r"\x41\u{263a}"),
            Ok(concat(
                0..12,
                vec![
                    Ast::Literal(ast::Literal {
                        span: span(0..4),
                        kind: ast::LiteralKind::Special,
                        char: 'A',
                    }),
                    Ast::Literal(ast::Literal {
                        span: span(4..12),
                        kind: ast::LiteralKind::Special,
                        char: '☺',
                    }),
                ]
            ))
        );
        assert_eq!(
            pp(r"^.$"),
            Ok(concat(
                0..3,
                vec![
                    Ast::Assertion(ast::Assertion {
                        span: span(0..1),
                        kind: ast::AssertionKind::StartText,
                    }),
                    Ast::Dot(ast::Dot { span: span(1..2) }),
                    Ast::Assertion(ast::Assertion {
                        span: span(2..3),
                        kind: ast::AssertionKind::EndText,
                    }),
                ]
            ))
        );
    }

    #[rstest]
    #[case(r"(a", ErrorKind::UnbalancedGroup, 0..1)]
    #[case(r"a)", ErrorKind::UnbalancedGroup, 1..2)]
    #[case(r"(a|b", ErrorKind::UnbalancedGroup, 0..1)]
    #[case(r"a|b)", ErrorKind::UnbalancedGroup, 3..4)]
    #[case(r"*a", ErrorKind::InvalidQuantifier, 0..1)]
    #[case(r"a|+", ErrorKind::InvalidQuantifier, 2..3)]
    #[case(r"a{2,1}", ErrorKind::InvalidQuantifier, 1..6)]
    #[case(r"a{x}", ErrorKind::InvalidQuantifier, 1..2)]
    #[case(r"a{2", ErrorKind::InvalidQuantifier, 1..3)]
    #[case(r"{2}", ErrorKind::InvalidQuantifier, 0..1)]
    #[case(r"[ab", ErrorKind::UnterminatedClass, 0..3)]
    #[case(r"[", ErrorKind::UnterminatedClass, 0..1)]
    #[case(r"(?x)", ErrorKind::UnexpectedToken, 0..3)]
    #[case(r"a\", ErrorKind::UnexpectedToken, 1..2)]
    #[case(r"\q", ErrorKind::InvalidEscape, 0..2)]
    #[case(r"\xZZ", ErrorKind::InvalidEscape, 0..2)]
    #[case(r"[z-a]", ErrorKind::InvalidClassRange, 1..4)]
    #[case(r"(?P<1x>a)", ErrorKind::InvalidGroupName, 4..6)]
    #[case(r"(?<n>a)(?<n>b)", ErrorKind::DuplicateGroupName, 10..11)]
    fn parse_errors(#[case] pattern: &str, #[case] kind: ErrorKind, #[case] at: Range<usize>) {
        let err = pp(pattern).expect_err("pattern must be rejected");
        assert_eq!(err.kind(), &kind);
        assert_eq!(err.span(), &span(at));
        assert_eq!(err.pattern(), pattern);
    }

    #[test]
    fn nest_limit() {
        let deep = format!("{}a{}", "(?:".repeat(5000), ")".repeat(5000));
        let err = pp(&deep).expect_err("too deep");
        assert_eq!(err.kind(), &ErrorKind::NestLimitExceeded(250));
        assert_eq!(err.span(), &span(750..751));

        let stars = format!("a{}", "*".repeat(300));
        let err = pp(&stars).expect_err("too deep");
        assert_eq!(err.kind(), &ErrorKind::NestLimitExceeded(250));
        assert_eq!(err.span(), &span(251..252));

        let fits = format!("{}a{}", "(?:".repeat(250), ")".repeat(250));
        assert!(pp(&fits).is_ok());
    }

    #[rstest]
    #[case(r"((a))", 1..2)]
    #[case(r"(a*)", 2..3)]
    #[case(r"(a)*", 3..4)]
    #[case(r"a{2}+", 4..5)]
    fn nest_limit_counts_groups_and_repetitions(#[case] pattern: &str, #[case] at: Range<usize>) {
        let err = p(pattern)
            .nest_limit(1)
            .parse()
            .expect_err("deeper than one level");
        assert_eq!(err.kind(), &ErrorKind::NestLimitExceeded(1));
        assert_eq!(err.span(), &span(at));
    }

    #[test]
    fn test_adhoc_complex() {
        use ast::RepetitionKind::{OneOrMore, ZeroOrMore, ZeroOrOne};
        assert_eq!(
            pp(r"a*b(a?|c(d|e)+)fg"),
            Ok(concat(
                0..17,
                vec![
                    rep(1..2, ZeroOrMore, true, lit_one('a', 0)),
                    lit_one('b', 2),
                    group(
                        3..15,
                        1,
                        alt(
                            4..14,
                            vec![
                                rep(5..6, ZeroOrOne, true, lit_one('a', 4)),
                                concat(
                                    7..14,
                                    vec![
                                        lit_one('c', 7),
                                        rep(
                                            13..14,
                                            OneOrMore,
                                            true,
                                            group(
                                                8..13,
                                                2,
                                                alt(
                                                    9..12,
                                                    vec![lit_one('d', 9), lit_one('e', 11),]
                                                )
                                            )
                                        )
                                    ]
                                )
                            ]
                        ),
                    ),
                    lit_one('f', 15),
                    lit_one('g', 16),
                ]
            ))
        );
    }
}
