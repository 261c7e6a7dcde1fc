//! Schemer - a small Scheme interpreter
//!
//! This crate implements a Scheme dialect with an S-expression reader, chained
//! environment frames, and an eval/apply core driven by a trampoline so that
//! tail calls run in constant stack space.
//!
//! ```scheme
//! (define (loop n) (if (= n 0) 'done (loop (- n 1))))
//! (loop 100000)                ; bounded stack, thanks to tail calls
//! (let ((x 1) (y 2)) (+ x y))  ; lexical binding
//! ((mu () x))                  ; dynamic binding with mu procedures
//! ```
//!
//! Three procedure flavors are supported beyond primitives: `lambda`
//! (lexically scoped), `mu` (dynamically scoped), and `nu` (call-by-name with
//! memoized thunks).
//!
//! ## Modules
//!
//! - `reader`: tokenizer and S-expression reader
//! - `value`: runtime value representation
//! - `frame`: environment frames
//! - `eval`: the trampolined eval/apply core and special forms
//! - `primitives`: the built-in procedure registry
//! - `number`: integer/float arithmetic with exactness normalization
//! - `symbol`: the global symbol intern table

use std::fmt;

/// Maximum nesting depth accepted by the reader
/// This limits deeply nested structures to keep reading off the host stack limit
pub const MAX_PARSE_DEPTH: usize = 100;

/// Maximum depth of nested (non-tail) evaluation
/// Tail calls do not consume depth; only nested sub-evaluations do.
/// Must stay low enough that the limit is reached before the host stack is
/// exhausted, even with unoptimized frames on a 2 MiB thread stack.
pub const MAX_EVAL_DEPTH: usize = 200;

/// When enabled, special forms and procedure calls hand their final expression
/// back to the evaluator loop instead of evaluating it recursively, so
/// iterative procedures written as tail recursion run in constant stack space.
pub const PROPER_TAIL_RECURSION: bool = true;

/// Categorizes the different kinds of reading errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the expression was complete (EOF, unterminated string, unclosed parens)
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
}

/// A structured error describing a reading failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
        }
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The reader could not turn the input into an expression
    Parse(ParseError),
    /// An error signalled while evaluating a Scheme program
    Eval(String),
    /// Clean unwinding requested by the exit primitive; only the driver
    /// handles this variant
    Exit,
}

impl Error {
    pub fn invalid_syntax(message: impl Into<String>) -> Self {
        Error::Parse(ParseError::new(ParseErrorKind::InvalidSyntax, message))
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        Error::Parse(ParseError::new(ParseErrorKind::Incomplete, message))
    }

    pub fn too_deeply_nested(message: impl Into<String>) -> Self {
        Error::Parse(ParseError::new(ParseErrorKind::TooDeeplyNested, message))
    }

    /// True if more input could complete the expression; the interactive
    /// driver uses this to pull continuation lines.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            Error::Parse(ParseError {
                kind: ParseErrorKind::Incomplete,
                ..
            })
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "SyntaxError: {}", e.message),
            Error::Eval(msg) => write!(f, "{msg}"),
            Error::Exit => write!(f, "exit"),
        }
    }
}

pub mod eval;
pub mod frame;
pub mod number;
pub mod primitives;
pub mod reader;
pub mod symbol;
pub mod value;
