//! Tokenizer and S-expression reader.
//!
//! The tokenizer turns source text into a flat token stream: delimiters
//! (`(`, `)`, `'`, `.`), literals, and symbols, with `;` comments skipped.
//! The reader consumes tokens from a [`TokenCursor`], one complete external
//! representation per call: `'x` expands to `(quote x)`, `(a . b)` builds a
//! dotted pair, and the bare word `nil` reads as the empty list.
//!
//! Running out of tokens mid-expression is an `Incomplete` error so the
//! interactive driver can pull continuation lines; running out before any
//! token is a clean end of input.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace1},
    combinator::{recognize, value},
    multi::many0_count,
    sequence::pair,
};

use crate::Error;
use crate::MAX_PARSE_DEPTH;
use crate::number::Number;
use crate::symbol::intern;
use crate::value::Value;

/// Characters that end a word: delimiters plus string/comment openers.
const DELIMITERS: &str = "()';\"";

/// Allowed non-alphanumeric characters in symbol names
const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_$";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LParen,
    RParen,
    Quote,
    Dot,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Sym(String),
}

/// Whitespace and line comments between tokens
fn atmosphere(input: &str) -> IResult<&str, usize> {
    many0_count(alt((multispace1, comment))).parse(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char(';'), take_while(|c| c != '\n'))).parse(input)
}

fn lex_delimiter(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::Quote, char('\'')),
    ))
    .parse(input)
}

fn lex_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !DELIMITERS.contains(c)).parse(input)
}

fn is_valid_symbol(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
}

/// Classify a delimiter-free word as a token.
fn classify_word(word: &str) -> Result<Token, Error> {
    if word == "." {
        return Ok(Token::Dot);
    }
    if word == "#t" {
        return Ok(Token::Bool(true));
    }
    if word == "#f" {
        return Ok(Token::Bool(false));
    }
    let mut chars = word.chars();
    let first = chars.next();
    let second = chars.next();
    let numeric = first.is_some_and(|c| c.is_ascii_digit())
        || (first == Some('-') && second.is_some_and(|c| c.is_ascii_digit()));
    if numeric {
        if let Ok(n) = word.parse::<i64>() {
            return Ok(Token::Int(n));
        }
        if word.contains('.')
            && let Ok(x) = word.parse::<f64>()
        {
            return Ok(Token::Float(x));
        }
        return Err(Error::invalid_syntax(format!(
            "invalid numeric literal: {word}"
        )));
    }
    if is_valid_symbol(word) {
        return Ok(Token::Sym(word.to_owned()));
    }
    Err(Error::invalid_syntax(format!("invalid token: {word}")))
}

/// Consume a double-quoted string literal, handling escape sequences.
/// Reaching end of input first is an incomplete-input error.
fn scan_string(input: &str) -> Result<(&str, String), Error> {
    // Caller guarantees the opening quote.
    let mut chars = input[1..].chars();
    let mut contents = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok((chars.as_str(), contents)),
            Some('\\') => match chars.next() {
                Some('n') => contents.push('\n'),
                Some('t') => contents.push('\t'),
                Some('r') => contents.push('\r'),
                Some('\\') => contents.push('\\'),
                Some('"') => contents.push('"'),
                Some(other) => {
                    return Err(Error::invalid_syntax(format!(
                        "unknown escape sequence: \\{other}"
                    )));
                }
                None => return Err(Error::incomplete("unterminated string literal")),
            },
            Some(ch) => contents.push(ch),
            None => return Err(Error::incomplete("unterminated string literal")),
        }
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let mut rest = input;
    let mut tokens = Vec::new();
    loop {
        if let Ok((after, _)) = atmosphere(rest) {
            rest = after;
        }
        if rest.is_empty() {
            return Ok(tokens);
        }
        if rest.starts_with('"') {
            let (after, contents) = scan_string(rest)?;
            tokens.push(Token::Str(contents));
            rest = after;
            continue;
        }
        if let Ok((after, token)) = lex_delimiter(rest) {
            tokens.push(token);
            rest = after;
            continue;
        }
        match lex_word(rest) {
            Ok((after, word)) => {
                tokens.push(classify_word(word)?);
                rest = after;
            }
            Err(_) => {
                let found: String = rest.chars().take(10).collect();
                return Err(Error::invalid_syntax(format!(
                    "unexpected character: {found}"
                )));
            }
        }
    }
}

/// A position in a token stream consumed by the reader.
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    pub fn from_source(source: &str) -> Result<TokenCursor, Error> {
        Ok(TokenCursor {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn pop(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

/// Read the next expression, or None at a clean end of input.
pub fn read(cursor: &mut TokenCursor) -> Result<Option<Value>, Error> {
    if cursor.peek().is_none() {
        return Ok(None);
    }
    read_expr(cursor, 0).map(Some)
}

fn read_expr(cursor: &mut TokenCursor, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(Error::too_deeply_nested(format!(
            "expression nested deeper than {MAX_PARSE_DEPTH}"
        )));
    }
    match cursor.pop() {
        None => Err(Error::incomplete("unexpected end of input")),
        Some(Token::Int(n)) => Ok(Value::Number(Number::Int(n))),
        Some(Token::Float(x)) => Ok(Value::Number(Number::Float(x))),
        Some(Token::Bool(b)) => Ok(Value::Boolean(b)),
        Some(Token::Str(s)) => Ok(Value::from(s.as_str())),
        Some(Token::Sym(name)) if name == "nil" => Ok(Value::Nil),
        Some(Token::Sym(name)) => Ok(Value::Symbol(intern(&name))),
        Some(Token::Quote) => {
            let quoted = read_expr(cursor, depth + 1)?;
            Ok(Value::list_from_slice(&[
                Value::Symbol(intern("quote")),
                quoted,
            ]))
        }
        Some(Token::LParen) => read_tail(cursor, depth + 1),
        Some(Token::RParen) => Err(Error::invalid_syntax("unexpected token: )")),
        Some(Token::Dot) => Err(Error::invalid_syntax("unexpected token: .")),
    }
}

/// Read the remainder of a list, starting before an element, a dot, or `)`.
fn read_tail(cursor: &mut TokenCursor, depth: usize) -> Result<Value, Error> {
    let mut items = Vec::new();
    loop {
        match cursor.peek() {
            None => return Err(Error::incomplete("unexpected end of input")),
            Some(Token::RParen) => {
                cursor.pop();
                return Ok(Value::list_from_slice(&items));
            }
            Some(Token::Dot) => {
                // A dot is only valid after at least one element.
                if items.is_empty() {
                    return Err(Error::invalid_syntax("unexpected token: ."));
                }
                cursor.pop();
                let tail = read_expr(cursor, depth)?;
                return match cursor.pop() {
                    Some(Token::RParen) => {
                        let mut result = tail;
                        for item in items.into_iter().rev() {
                            result = Value::cons(item, result);
                        }
                        Ok(result)
                    }
                    Some(_) => Err(Error::invalid_syntax("Expected one element after .")),
                    None => Err(Error::incomplete("unexpected end of input")),
                };
            }
            Some(_) => items.push(read_expr(cursor, depth)?),
        }
    }
}

/// Read the first expression from LINE.
pub fn read_line(line: &str) -> Result<Value, Error> {
    let mut cursor = TokenCursor::from_source(line)?;
    match read(&mut cursor)? {
        Some(expr) => Ok(expr),
        None => Err(Error::incomplete("unexpected end of input")),
    }
}

/// Read every expression from SOURCE.
pub fn read_all(source: &str) -> Result<Vec<Value>, Error> {
    let mut cursor = TokenCursor::from_source(source)?;
    let mut exprs = Vec::new();
    while let Some(expr) = read(&mut cursor)? {
        exprs.push(expr);
    }
    Ok(exprs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParseErrorKind;

    /// Expected outcomes for the data-driven reader tests
    enum ReadResult {
        /// Reading succeeds and the value prints back as this text
        Prints(&'static str),
        /// Reading fails with this parse error kind
        Fails(ParseErrorKind),
    }
    use ReadResult::*;

    fn run_read_tests(test_cases: Vec<(&str, ReadResult)>) {
        for (i, (input, expected)) in test_cases.into_iter().enumerate() {
            let test_id = format!("Read test #{}", i + 1);
            let result = read_line(input);
            match (result, expected) {
                (Ok(actual), Prints(text)) => {
                    let printed = format!("{actual}");
                    assert_eq!(printed, text, "{test_id}: print mismatch for '{input}'");

                    // Round trip: printing and re-reading must be stable.
                    let reread = read_line(&printed).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip read failed for '{printed}': {e:?}")
                    });
                    assert_eq!(
                        format!("{reread}"),
                        printed,
                        "{test_id}: round-trip mismatch for '{input}'"
                    );
                }
                (Err(Error::Parse(e)), Fails(kind)) => {
                    assert_eq!(e.kind, kind, "{test_id}: wrong error kind for '{input}'");
                }
                (Ok(actual), Fails(kind)) => {
                    panic!("{test_id}: expected {kind:?} for '{input}', got {actual:?}")
                }
                (Err(err), Prints(text)) => {
                    panic!("{test_id}: expected '{text}' for '{input}', got error {err:?}")
                }
                (Err(err), _) => {
                    panic!("{test_id}: unexpected error variant for '{input}': {err:?}")
                }
            }
        }
    }

    #[test]
    fn test_reader_comprehensive() {
        use ParseErrorKind::*;

        let test_cases = vec![
            // ===== ATOMS =====
            ("42", Prints("42")),
            ("-5", Prints("-5")),
            ("3.25", Prints("3.25")),
            ("-0.5", Prints("-0.5")),
            ("#t", Prints("#t")),
            ("#f", Prints("#f")),
            ("foo", Prints("foo")),
            ("set-car!", Prints("set-car!")),
            ("+", Prints("+")),
            ("-", Prints("-")),
            ("\"hello\"", Prints("\"hello\"")),
            (r#""line\nbreak""#, Prints("\"line\\nbreak\"")),
            (r#""quote \" inside""#, Prints("\"quote \\\" inside\"")),
            ("nil", Prints("()")),
            // ===== LISTS =====
            ("()", Prints("()")),
            ("(1 2 3)", Prints("(1 2 3)")),
            ("( 1   2\t3 )", Prints("(1 2 3)")),
            ("(a (b c) d)", Prints("(a (b c) d)")),
            ("(car '(1 2))", Prints("(car (quote (1 2)))")),
            // ===== DOTTED PAIRS =====
            ("(1 . 2)", Prints("(1 . 2)")),
            ("(1 2 . 3)", Prints("(1 2 . 3)")),
            ("(1 . (2 . (3 . ())))", Prints("(1 2 3)")),
            ("(1 . 2 3)", Fails(InvalidSyntax)),
            ("(. 2)", Fails(InvalidSyntax)),
            ("(1 . . 2)", Fails(InvalidSyntax)),
            // ===== QUOTE SHORTHAND =====
            ("'hello", Prints("(quote hello)")),
            ("'(1 2)", Prints("(quote (1 2))")),
            ("''x", Prints("(quote (quote x))")),
            // ===== COMMENTS =====
            ("; a comment\n42", Prints("42")),
            ("(1 ; inline\n 2)", Prints("(1 2)")),
            // ===== ERRORS =====
            ("", Fails(Incomplete)),
            ("   ", Fails(Incomplete)),
            ("(1 2", Fails(Incomplete)),
            ("(1 (2 3)", Fails(Incomplete)),
            ("'", Fails(Incomplete)),
            ("(1 . ", Fails(Incomplete)),
            ("\"unterminated", Fails(Incomplete)),
            (")", Fails(InvalidSyntax)),
            (".", Fails(InvalidSyntax)),
            ("123abc", Fails(InvalidSyntax)),
            ("1.2.3", Fails(InvalidSyntax)),
            (r#""bad \z escape""#, Fails(InvalidSyntax)),
            ("@strange", Fails(InvalidSyntax)),
        ];

        run_read_tests(test_cases);
    }

    #[test]
    fn test_reader_depth_limit() {
        let under = format!("{}1{}", "(".repeat(MAX_PARSE_DEPTH - 2), ")".repeat(MAX_PARSE_DEPTH - 2));
        assert!(read_line(&under).is_ok());

        let over = format!("{}1{}", "(".repeat(MAX_PARSE_DEPTH + 1), ")".repeat(MAX_PARSE_DEPTH + 1));
        match read_line(&over) {
            Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::TooDeeplyNested),
            other => panic!("expected depth error, got {other:?}"),
        }

        let quotes = format!("{}x", "'".repeat(MAX_PARSE_DEPTH + 1));
        assert!(read_line(&quotes).is_err());
    }

    #[test]
    fn test_read_all_multiple_expressions() {
        let exprs = read_all("(define x 1) x ; trailing comment").unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(format!("{}", exprs[0]), "(define x 1)");
        assert_eq!(format!("{}", exprs[1]), "x");

        assert!(read_all("").unwrap().is_empty());
        assert!(read_all("(+ 1").is_err());
    }

    #[test]
    fn test_read_line_takes_first_expression() {
        // Extra expressions after the first are left unread, as in a stream.
        let expr = read_line("(+ 1 2) ignored").unwrap();
        assert_eq!(format!("{expr}"), "(+ 1 2)");
    }
}
