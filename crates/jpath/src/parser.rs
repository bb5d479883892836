//! A `nom`-based parser for JSON Path queries.
//!
//! Strict mode follows RFC 9535 to the letter. Lenient mode additionally
//! tolerates surrounding whitespace, `-` inside shorthand member names,
//! redundant leading zeros, `-0` and out-of-range indices, and comparisons
//! between non-singular queries.
use crate::ast::{BinaryOperator, Expression, Path, PrefixOperator, Segment, Selector};
use crate::error::ParseError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while_m_n},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{map, opt, recognize},
    error::ErrorKind,
    multi::separated_list1,
    sequence::{delimited, pair, terminated},
};
use std::cell::Cell;

/// Maximum depth of nested filters, parentheses and prefix operators.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Largest magnitude an index or slice bound may have in strict mode (2^53 - 1).
pub const MAX_EXACT_INTEGER: i64 = 9_007_199_254_740_991;

/// Parses a complete query. The text must start with `$`.
pub fn parse(text: &str, strict: bool) -> Result<Path, ParseError> {
    let parser = QueryParser {
        strict,
        depth: Cell::new(0),
    };
    let path = parser.query(text).map_err(|e| match e {
        nom::Err::Error(failure) | nom::Err::Failure(failure) => failure.into_parse_error(text),
        nom::Err::Incomplete(_) => ParseError::UnexpectedEndOfInput {
            position: text.len(),
        },
    })?;
    log::debug!(
        "parsed '{}' ({} mode) as {}",
        text,
        if strict { "strict" } else { "lenient" },
        path
    );
    Ok(path)
}

// --- Errors ---

#[derive(Debug, Clone, PartialEq)]
enum Reason {
    Unexpected,
    MalformedInteger(String),
    MalformedFloat(String),
    UnterminatedString,
    InvalidEscape(String),
    NonSingularQuery(String),
    EmptyBracket,
    InvalidSelector,
    InvalidQueryPrefix,
    SuperfluousInput,
    NestingTooDeep,
}

/// The parser's error type: where it stopped and why.
#[derive(Debug, Clone, PartialEq)]
struct Failure<'a> {
    input: &'a str,
    reason: Reason,
}

impl<'a> nom::error::ParseError<&'a str> for Failure<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Failure {
            input,
            reason: Reason::Unexpected,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl Failure<'_> {
    fn into_parse_error(self, text: &str) -> ParseError {
        let position = text.len().saturating_sub(self.input.len());
        let next = self.input.chars().next();
        match (self.reason, next) {
            (Reason::Unexpected | Reason::InvalidSelector, None) => {
                ParseError::UnexpectedEndOfInput { position }
            }
            (Reason::Unexpected, Some(found)) => {
                ParseError::UnexpectedCharacter { position, found }
            }
            (Reason::InvalidSelector, Some(found)) => {
                ParseError::InvalidSelector { position, found }
            }
            (Reason::MalformedInteger(literal), _) => {
                ParseError::MalformedInteger { position, literal }
            }
            (Reason::MalformedFloat(literal), _) => {
                ParseError::MalformedFloat { position, literal }
            }
            (Reason::UnterminatedString, _) => ParseError::UnterminatedString { position },
            (Reason::InvalidEscape(sequence), _) => {
                ParseError::InvalidEscape { position, sequence }
            }
            (Reason::NonSingularQuery(query), _) => {
                ParseError::NonSingularQuery { position, query }
            }
            (Reason::EmptyBracket, _) => ParseError::EmptyBracket { position },
            (Reason::InvalidQueryPrefix, _) => ParseError::InvalidQueryPrefix { position },
            (Reason::SuperfluousInput, _) => ParseError::SuperfluousInput {
                position,
                remainder: self.input.to_string(),
            },
            (Reason::NestingTooDeep, _) => ParseError::NestingTooDeep {
                position,
                limit: MAX_NESTING_DEPTH,
            },
        }
    }
}

type PResult<'a, T> = IResult<&'a str, T, Failure<'a>>;

fn fail<'a, T>(input: &'a str, reason: Reason) -> PResult<'a, T> {
    Err(nom::Err::Failure(Failure { input, reason }))
}

/// Turns a recoverable error into a hard failure once a construct is committed to.
fn commit(e: nom::Err<Failure<'_>>) -> nom::Err<Failure<'_>> {
    match e {
        nom::Err::Error(failure) => nom::Err::Failure(failure),
        other => other,
    }
}

// --- Lexical helpers ---

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn blank(input: &str) -> PResult<'_, &str> {
    take_while(is_blank)(input)
}

fn symbol<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    move |input| char(c)(input)
}

fn digits(input: &str) -> PResult<'_, &str> {
    digit1(input)
}

fn is_name_first(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c >= '\u{80}'
}

fn is_name_char(c: char) -> bool {
    is_name_first(c) || c.is_ascii_digit()
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(satisfy(is_name_first), take_while(is_name_char))).parse(input)
}

/// A comma between list items, with optional blank space on either side.
fn list_separator(input: &str) -> PResult<'_, char> {
    delimited(blank, symbol(','), blank).parse(input)
}

/// A run of string characters that need no decoding.
fn plain_characters(input: &str, quote: char) -> PResult<'_, &str> {
    take_while(move |c: char| c != quote && c != '\\' && c >= '\u{20}')(input)
}

fn hex4(input: &str) -> PResult<'_, u32> {
    map(take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()), |hex: &str| {
        hex.chars()
            .filter_map(|c| c.to_digit(16))
            .fold(0, |code, digit| code * 16 + digit)
    })
    .parse(input)
}

fn binary_operator(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(tag("||"), |_| BinaryOperator::Or),
        map(tag("&&"), |_| BinaryOperator::And),
        map(tag("=="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
        map(tag("<="), |_| BinaryOperator::LessOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterOrEqual),
        map(tag("<"), |_| BinaryOperator::Less),
        map(tag(">"), |_| BinaryOperator::Greater),
        map(tag("+"), |_| BinaryOperator::Add),
        map(tag("-"), |_| BinaryOperator::Subtract),
        map(tag("*"), |_| BinaryOperator::Multiply),
        map(tag("/"), |_| BinaryOperator::Divide),
    ))
    .parse(input)
}

/// The literal text up to the next character that cannot belong to a number.
fn number_text(input: &str) -> String {
    input
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.'))
        .collect()
}

// --- Parser ---

struct QueryParser {
    strict: bool,
    depth: Cell<usize>,
}

impl QueryParser {
    fn query<'a>(&self, text: &'a str) -> Result<Path, nom::Err<Failure<'a>>> {
        let input = if self.strict {
            text
        } else {
            text.trim_start_matches(is_blank)
        };
        let Ok((rest, _)) = symbol('$')(input) else {
            return Err(nom::Err::Failure(Failure {
                input,
                reason: Reason::InvalidQueryPrefix,
            }));
        };
        let (rest, path) = self.segments(rest, Path::Root)?;
        let rest = if self.strict {
            rest
        } else {
            rest.trim_start_matches(is_blank)
        };
        if !rest.is_empty() {
            return Err(nom::Err::Failure(Failure {
                input: rest,
                reason: Reason::SuperfluousInput,
            }));
        }
        Ok(path)
    }

    /// Runs `parse` one nesting level deeper, failing past `MAX_NESTING_DEPTH`.
    fn nested<'a, T>(
        &self,
        input: &'a str,
        parse: impl FnOnce(&'a str) -> PResult<'a, T>,
    ) -> PResult<'a, T> {
        let depth = self.depth.get();
        if depth >= MAX_NESTING_DEPTH {
            return fail(input, Reason::NestingTooDeep);
        }
        self.depth.set(depth + 1);
        let result = parse(input);
        self.depth.set(depth);
        result
    }

    /// Parses segments for as long as they follow. Blank space before a segment
    /// is consumed only when a segment actually follows it.
    fn segments<'a>(&self, input: &'a str, start: Path) -> PResult<'a, Path> {
        let mut input = input;
        let mut path = start;
        loop {
            let (after_blank, _) = blank(input)?;
            match self.segment(after_blank) {
                Ok((rest, segment)) => {
                    path = path.select(segment);
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, path)),
                Err(e) => return Err(e),
            }
        }
    }

    fn segment<'a>(&self, input: &'a str) -> PResult<'a, Segment> {
        if let Ok((rest, _)) = tag::<&str, &str, Failure<'a>>("..")(input) {
            let (rest, selectors) = self.dotted_selectors(rest, true).map_err(commit)?;
            return Ok((rest, Segment::Descendants(selectors)));
        }
        if let Ok((rest, _)) = symbol('.')(input) {
            let (rest, selectors) = self.dotted_selectors(rest, false).map_err(commit)?;
            return Ok((rest, Segment::Children(selectors)));
        }
        if input.starts_with('[') {
            let (rest, selectors) = self.bracketed_selectors(input).map_err(commit)?;
            return Ok((rest, Segment::Children(selectors)));
        }
        Err(nom::Err::Error(Failure {
            input,
            reason: Reason::Unexpected,
        }))
    }

    /// What may follow `.` or `..`: a member name or `*`, and after `..` also a bracket.
    fn dotted_selectors<'a>(&self, input: &'a str, descendant: bool) -> PResult<'a, Vec<Selector>> {
        match input.chars().next() {
            Some('*') => Ok((&input[1..], vec![Selector::Wildcard])),
            Some('[') if descendant => self.bracketed_selectors(input),
            Some(c) if is_name_first(c) => {
                let (rest, name) = self.member_name_shorthand(input)?;
                Ok((rest, vec![Selector::Member(name.to_string())]))
            }
            _ => fail(input, Reason::InvalidSelector),
        }
    }

    fn member_name_shorthand<'a>(&self, input: &'a str) -> PResult<'a, &'a str> {
        let allow_dash = !self.strict;
        recognize(pair(
            satisfy(is_name_first),
            take_while(move |c| is_name_char(c) || (allow_dash && c == '-')),
        ))
        .parse(input)
    }

    fn bracketed_selectors<'a>(&self, input: &'a str) -> PResult<'a, Vec<Selector>> {
        let (rest, _) = pair(symbol('['), blank).parse(input)?;
        if rest.starts_with(']') {
            return fail(input, Reason::EmptyBracket);
        }
        terminated(
            separated_list1(list_separator, |i| self.selector(i)),
            pair(blank, symbol(']')),
        )
        .parse(rest)
    }

    fn selector<'a>(&self, input: &'a str) -> PResult<'a, Selector> {
        match input.chars().next() {
            Some('*') => Ok((&input[1..], Selector::Wildcard)),
            Some('\'' | '"') => {
                let (rest, name) = self.string_literal(input)?;
                Ok((rest, Selector::Member(name)))
            }
            Some('?') => {
                let (rest, _) = blank(&input[1..])?;
                let (rest, expr) = self.nested(rest, |i| self.expression(i, 0))?;
                Ok((rest, Selector::Filter(expr)))
            }
            Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => self.index_or_slice(input),
            _ => fail(input, Reason::InvalidSelector),
        }
    }

    fn index_or_slice<'a>(&self, input: &'a str) -> PResult<'a, Selector> {
        let (after_start, start) = self.optional_index(input)?;
        let (rest, _) = blank(after_start)?;
        let Some(rest) = rest.strip_prefix(':') else {
            return match start {
                Some(index) => Ok((after_start, Selector::Index(index))),
                None => fail(input, Reason::InvalidSelector),
            };
        };
        let (rest, _) = blank(rest)?;
        let (after_end, end) = self.optional_index(rest)?;
        let (rest, _) = blank(after_end)?;
        let Some(rest) = rest.strip_prefix(':') else {
            return Ok((after_end, Selector::Slice { start, end, step: None }));
        };
        let (rest, _) = blank(rest)?;
        let (rest, step) = self.optional_index(rest)?;
        Ok((rest, Selector::Slice { start, end, step }))
    }

    fn optional_index<'a>(&self, input: &'a str) -> PResult<'a, Option<i64>> {
        if input.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
            let (rest, index) = self.index(input)?;
            Ok((rest, Some(index)))
        } else {
            Ok((input, None))
        }
    }

    /// An integer used as an index or slice bound.
    fn index<'a>(&self, input: &'a str) -> PResult<'a, i64> {
        let Ok((rest, literal)) = recognize(pair(opt(symbol('-')), digits)).parse(input) else {
            return fail(input, Reason::MalformedInteger(number_text(input)));
        };
        let malformed = || fail(input, Reason::MalformedInteger(literal.to_string()));
        let unsigned = literal.trim_start_matches('-');
        if self.strict && (literal == "-0" || (unsigned.len() > 1 && unsigned.starts_with('0'))) {
            return malformed();
        }
        let Ok(value) = literal.parse::<i64>() else {
            return malformed();
        };
        if self.strict && !(-MAX_EXACT_INTEGER..=MAX_EXACT_INTEGER).contains(&value) {
            return malformed();
        }
        Ok((rest, value))
    }

    fn string_literal<'a>(&self, input: &'a str) -> PResult<'a, String> {
        let quote = match input.chars().next() {
            Some(q @ ('\'' | '"')) => q,
            _ => return fail(input, Reason::Unexpected),
        };
        let mut rest = &input[1..];
        let mut value = String::new();
        loop {
            let (after, run) = plain_characters(rest, quote)?;
            value.push_str(run);
            rest = after;
            match rest.chars().next() {
                None => return fail(input, Reason::UnterminatedString),
                Some(c) if c == quote => return Ok((&rest[c.len_utf8()..], value)),
                Some('\\') => {
                    let (after, decoded) = self.escape_sequence(rest, quote)?;
                    value.push(decoded);
                    rest = after;
                }
                Some(_) => return fail(rest, Reason::Unexpected),
            }
        }
    }

    /// Decodes one escape; `input` starts at the backslash.
    fn escape_sequence<'a>(&self, input: &'a str, quote: char) -> PResult<'a, char> {
        let mut chars = input[1..].chars();
        let decoded = match chars.next() {
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('/') => '/',
            Some('\\') => '\\',
            Some('u') => return self.unicode_escape(input),
            Some(c) if c == quote || (!self.strict && matches!(c, '\'' | '"')) => c,
            Some(c) => return fail(input, Reason::InvalidEscape(format!("\\{c}"))),
            None => return fail(input, Reason::UnterminatedString),
        };
        Ok((chars.as_str(), decoded))
    }

    /// Decodes `\uXXXX`, joining a high surrogate with the low surrogate escape after it.
    fn unicode_escape<'a>(&self, input: &'a str) -> PResult<'a, char> {
        let invalid = || {
            let sequence: String = input.chars().take(12).collect();
            fail(input, Reason::InvalidEscape(sequence))
        };
        let Ok((rest, code)) = hex4(&input[2..]) else {
            return invalid();
        };
        let code = match code {
            0xD800..=0xDBFF => {
                let low = rest.strip_prefix("\\u").and_then(|after| hex4(after).ok());
                match low {
                    Some((after, low @ 0xDC00..=0xDFFF)) => {
                        let joined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                        return match char::from_u32(joined) {
                            Some(c) => Ok((after, c)),
                            None => invalid(),
                        };
                    }
                    _ => return invalid(),
                }
            }
            0xDC00..=0xDFFF => return invalid(),
            code => code,
        };
        match char::from_u32(code) {
            Some(c) => Ok((rest, c)),
            None => invalid(),
        }
    }

    // --- Filter expressions ---

    /// Precedence climbing over left-associative binary operators.
    fn expression<'a>(&self, input: &'a str, min_precedence: u8) -> PResult<'a, Expression> {
        let (mut rest, mut left) = self.unary(input)?;
        loop {
            let (after_blank, _) = blank(rest)?;
            let Ok((after_op, op)) = binary_operator(after_blank) else {
                return Ok((rest, left));
            };
            if op.precedence() < min_precedence {
                return Ok((rest, left));
            }
            let (right_input, _) = blank(after_op)?;
            let (after_right, right) = self.expression(right_input, op.precedence() + 1)?;
            if self.strict && op.is_comparison() {
                self.check_comparable(&left, input)?;
                self.check_comparable(&right, right_input)?;
            }
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
            rest = after_right;
        }
    }

    fn check_comparable<'a>(&self, operand: &Expression, at: &'a str) -> PResult<'a, ()> {
        match operand {
            Expression::Query(path) => fail(at, Reason::NonSingularQuery(path.to_string())),
            _ => Ok((at, ())),
        }
    }

    fn unary<'a>(&self, input: &'a str) -> PResult<'a, Expression> {
        match input.chars().next() {
            Some('!') => {
                let (rest, _) = blank(&input[1..])?;
                let (rest, operand) = self.nested(rest, |i| self.unary(i))?;
                Ok((
                    rest,
                    Expression::PrefixOp {
                        op: PrefixOperator::Not,
                        expr: Box::new(operand),
                    },
                ))
            }
            Some('-') if input[1..].starts_with(|c: char| c.is_ascii_digit()) => self.number(input),
            Some('-') => {
                let (rest, _) = blank(&input[1..])?;
                let (rest, operand) = self.nested(rest, |i| self.unary(i))?;
                Ok((
                    rest,
                    Expression::PrefixOp {
                        op: PrefixOperator::Negate,
                        expr: Box::new(operand),
                    },
                ))
            }
            _ => self.primary(input),
        }
    }

    fn primary<'a>(&self, input: &'a str) -> PResult<'a, Expression> {
        match input.chars().next() {
            Some('(') => {
                let (rest, _) = blank(&input[1..])?;
                let (rest, expr) = self.nested(rest, |i| self.expression(i, 0))?;
                let (rest, _) = blank(rest)?;
                let (rest, _) = symbol(')')(rest).map_err(commit)?;
                Ok((rest, expr))
            }
            Some('$') => self.embedded_query(&input[1..], Path::Root),
            Some('@') => self.embedded_query(&input[1..], Path::Current),
            Some('\'' | '"') => {
                let (rest, s) = self.string_literal(input)?;
                Ok((rest, Expression::String(s)))
            }
            Some(c) if c.is_ascii_digit() => self.number(input),
            Some(c) if is_name_first(c) => self.name_expression(input),
            _ => fail(input, Reason::Unexpected),
        }
    }

    fn embedded_query<'a>(&self, input: &'a str, start: Path) -> PResult<'a, Expression> {
        let (rest, path) = self.segments(input, start)?;
        Ok((rest, Expression::query(path)))
    }

    /// A keyword literal, a variable, or a function call.
    fn name_expression<'a>(&self, input: &'a str) -> PResult<'a, Expression> {
        let (rest, name) = identifier(input)?;
        if rest.starts_with('(') {
            return self.function_call(name, rest);
        }
        let expr = match name {
            "true" => Expression::Bool(true),
            "false" => Expression::Bool(false),
            "null" => Expression::Null,
            _ => Expression::Variable(name.to_string()),
        };
        Ok((rest, expr))
    }

    fn function_call<'a>(&self, name: &str, input: &'a str) -> PResult<'a, Expression> {
        self.nested(input, |input| {
            let (rest, _) = pair(symbol('('), blank).parse(input)?;
            let (rest, args) = match rest.strip_prefix(')') {
                Some(after) => (after, Vec::new()),
                None => terminated(
                    separated_list1(list_separator, |i| self.expression(i, 0)),
                    pair(blank, symbol(')')),
                )
                .parse(rest)
                .map_err(commit)?,
            };
            let call = Expression::FunctionCall {
                name: name.to_string(),
                args,
            };
            Ok((rest, call))
        })
    }

    /// A number literal, with an optional leading `-` folded into it.
    fn number<'a>(&self, input: &'a str) -> PResult<'a, Expression> {
        let parsed = recognize((
            opt(symbol('-')),
            digits,
            opt(pair(symbol('.'), digits)),
            opt((one_of("eE"), opt(one_of("+-")), digits)),
        ))
        .parse(input);
        let Ok((rest, literal)) = parsed else {
            return fail(input, Reason::MalformedFloat(number_text(input)));
        };
        let is_float = literal.contains(['.', 'e', 'E']);
        let integer_part = literal
            .trim_start_matches('-')
            .split(['.', 'e', 'E'])
            .next()
            .unwrap_or_default();
        if rest.starts_with(['.', 'e', 'E'])
            || (self.strict && integer_part.len() > 1 && integer_part.starts_with('0'))
        {
            let literal = number_text(input);
            return if is_float || literal.contains(['.', 'e', 'E']) {
                fail(input, Reason::MalformedFloat(literal))
            } else {
                fail(input, Reason::MalformedInteger(literal))
            };
        }
        if !is_float && let Ok(i) = literal.parse::<i64>() {
            return Ok((rest, Expression::Integer(i)));
        }
        match literal.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok((rest, Expression::Float(f))),
            _ => fail(input, Reason::MalformedFloat(literal.to_string())),
        }
    }
}
