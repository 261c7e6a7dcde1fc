//! Runtime value representation.
//!
//! The main enum, [`Value`], covers all Scheme data types: booleans, numbers,
//! interned symbols, immutable strings, mutable cons cells, the empty list,
//! the unspecified value, and the procedure flavors (primitives, closures,
//! and by-name thunks). Pairs are shared mutable cells, so dotted, improper,
//! and even circular structure can be built with `set-car!`/`set-cdr!`; the
//! list walks used for `list?`, `length`, and printing all terminate on
//! circular input.
//!
//! `Display` is the external representation that reads back to the value
//! (strings quoted and escaped); [`Value::to_display_string`] is the
//! `display` rendering with raw string contents.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::frame::Frame;
use crate::number::Number;
use crate::primitives::PrimitiveDef;
use crate::symbol::Symbol;

/// Core runtime value type.
#[derive(Clone)]
pub enum Value {
    /// Boolean values; #f is the only false value
    Boolean(bool),
    /// Exact integers and inexact floats
    Number(Number),
    /// Interned symbols (identifiers)
    Symbol(Symbol),
    /// Immutable string literals
    Str(Rc<String>),
    /// A mutable cons cell
    Pair(Pair),
    /// The empty list
    Nil,
    /// The unspecified value, printed as "okay"
    Unspecified,
    /// Built-in procedures from the static registry
    Primitive(&'static PrimitiveDef),
    /// User-defined procedures (lambda, mu, nu)
    Closure(Rc<Closure>),
    /// A by-name argument, forced at most once when fetched from a symbol
    Thunk(Rc<ThunkCell>),
}

/// A shared mutable cons cell holding `(first . second)`.
#[derive(Clone)]
pub struct Pair(Rc<RefCell<(Value, Value)>>);

impl Pair {
    pub fn new(first: Value, second: Value) -> Pair {
        Pair(Rc::new(RefCell::new((first, second))))
    }

    pub fn first(&self) -> Value {
        self.0.borrow().0.clone()
    }

    pub fn second(&self) -> Value {
        self.0.borrow().1.clone()
    }

    pub fn set_first(&self, value: Value) {
        self.0.borrow_mut().0 = value;
    }

    pub fn set_second(&self, value: Value) {
        self.0.borrow_mut().1 = value;
    }

    pub fn ptr_eq(&self, other: &Pair) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn as_ptr(&self) -> *const RefCell<(Value, Value)> {
        Rc::as_ptr(&self.0)
    }

    /// The end of the list headed by this pair: nil for a proper list, the
    /// atom after the dot for an improper list, or the first repeated pair
    /// for a circular list. Two-pointer walk, terminates on cycles.
    pub fn list_end(&self) -> Value {
        let mut slow = self.clone();
        let mut fast = self.second();
        loop {
            let ahead = match &fast {
                Value::Pair(p) if !p.ptr_eq(&slow) => p.clone(),
                _ => return fast,
            };
            fast = ahead.second();
            match &fast {
                Value::Pair(p) if !p.ptr_eq(&slow) => {}
                _ => return fast,
            }
            slow = match slow.second() {
                Value::Pair(next) => next,
                other => return other,
            };
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClosureKind {
    /// Lexical scope: the call frame extends the definition environment
    Lambda,
    /// Dynamic scope: the call frame extends the caller's environment
    Mu,
    /// Call-by-name: lexical scope, arguments passed as memoized thunks
    Nu,
}

impl ClosureKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClosureKind::Lambda => "lambda",
            ClosureKind::Mu => "mu",
            ClosureKind::Nu => "nu",
        }
    }
}

/// A user-defined procedure: formals, a single body expression (multiple
/// expressions are wrapped in `begin` at construction), and the captured
/// definition environment.
pub struct Closure {
    pub kind: ClosureKind,
    pub formals: Value,
    pub body: Value,
    pub env: Frame,
}

/// A deferred `(expression, environment)` for call-by-name arguments. The
/// result of the first forcing is memoized; later fetches reuse it.
pub struct ThunkCell {
    state: RefCell<ThunkState>,
}

enum ThunkState {
    Pending(Value, Frame),
    Forced(Value),
}

impl ThunkCell {
    pub fn new(expr: Value, env: Frame) -> ThunkCell {
        ThunkCell {
            state: RefCell::new(ThunkState::Pending(expr, env)),
        }
    }

    pub fn forced_value(&self) -> Option<Value> {
        match &*self.state.borrow() {
            ThunkState::Forced(value) => Some(value.clone()),
            ThunkState::Pending(..) => None,
        }
    }

    pub fn pending(&self) -> Option<(Value, Frame)> {
        match &*self.state.borrow() {
            ThunkState::Pending(expr, env) => Some((expr.clone(), env.clone())),
            ThunkState::Forced(_) => None,
        }
    }

    pub fn memoize(&self, value: Value) {
        *self.state.borrow_mut() = ThunkState::Forced(value);
    }
}

impl Value {
    pub fn cons(first: Value, second: Value) -> Value {
        Value::Pair(Pair::new(first, second))
    }

    /// Build a proper list from a slice of values.
    pub fn list_from_slice(items: &[Value]) -> Value {
        let mut result = Value::Nil;
        for item in items.iter().rev() {
            result = Value::cons(item.clone(), result);
        }
        result
    }

    /// Everything counts as true except #f.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    /// True for nil and for pairs whose list ends in nil; cycle-safe.
    pub fn is_list(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Pair(p) => matches!(p.list_end(), Value::Nil),
            _ => false,
        }
    }

    /// Length of a proper list; improper and circular lists are rejected.
    pub fn list_length(&self) -> Result<i64, Error> {
        match self {
            Value::Nil => Ok(0),
            Value::Pair(p) => {
                if !matches!(p.list_end(), Value::Nil) {
                    return Err(Error::Eval("length attempted on improper list".into()));
                }
                let mut n = 1i64;
                let mut rest = p.second();
                while let Value::Pair(next) = rest {
                    n += 1;
                    rest = next.second();
                }
                Ok(n)
            }
            _ => Err(Error::Eval("length attempted on a non-list".into())),
        }
    }

    /// Collect a proper list into a vector; anything else is a malformed list.
    pub fn list_to_vec(&self) -> Result<Vec<Value>, Error> {
        if !self.is_list() {
            return Err(Error::Eval(format!("malformed list: {self}")));
        }
        let mut items = Vec::new();
        let mut cur = self.clone();
        while let Value::Pair(p) = cur {
            items.push(p.first());
            cur = p.second();
        }
        Ok(items)
    }

    /// Identity equality: pairs, strings, and procedures by reference;
    /// symbols by interned handle; immediate values by value.
    pub fn is_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::Pair(a), Value::Pair(b)) => a.ptr_eq(b),
            (Value::Nil, Value::Nil) | (Value::Unspecified, Value::Unspecified) => true,
            (Value::Primitive(a), Value::Primitive(b)) => std::ptr::eq(*a, *b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Thunk(a), Value::Thunk(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Structural equality: pairs recursively, strings by content, everything
    /// else as `is_eq`.
    pub fn is_equal(&self, other: &Value) -> bool {
        let (mut x, mut y) = (self.clone(), other.clone());
        loop {
            match (x, y) {
                (Value::Pair(a), Value::Pair(b)) => {
                    if !a.first().is_equal(&b.first()) {
                        return false;
                    }
                    x = a.second();
                    y = b.second();
                }
                (Value::Str(a), Value::Str(b)) => return a == b,
                (a, b) => return a.is_eq(&b),
            }
        }
    }

    /// Short description of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Number(Number::Int(_)) => "integer",
            Value::Number(Number::Float(_)) => "float",
            Value::Symbol(_) => "symbol",
            Value::Str(_) => "string",
            Value::Pair(_) => "pair",
            Value::Nil => "nil",
            Value::Unspecified => "okay",
            Value::Primitive(_) => "primitive procedure",
            Value::Closure(c) => match c.kind {
                ClosureKind::Lambda => "lambda procedure",
                ClosureKind::Mu => "mu procedure",
                ClosureKind::Nu => "nu procedure",
            },
            Value::Thunk(_) => "thunk",
        }
    }

    /// The `display` rendering: like `Display`, but strings print their raw
    /// contents without quotes or escapes.
    pub fn to_display_string(&self) -> String {
        struct DisplayForm<'a>(&'a Value);
        impl fmt::Display for DisplayForm<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_value(self.0, f, false, &mut Vec::new())
            }
        }
        DisplayForm(self).to_string()
    }
}

type PairPtr = *const RefCell<(Value, Value)>;

/// Write the external representation. `path` holds the spine of pairs being
/// printed; revisiting one means the structure is circular, rendered as "...".
/// Shared acyclic structure prints normally because pairs are removed from
/// the path once their sublist is finished.
fn write_value(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    quote_strings: bool,
    path: &mut Vec<PairPtr>,
) -> fmt::Result {
    match value {
        Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
        Value::Number(n) => write!(f, "{n}"),
        Value::Symbol(s) => write!(f, "{s}"),
        Value::Str(s) => {
            if !quote_strings {
                return write!(f, "{s}");
            }
            write!(f, "\"")?;
            for ch in s.chars() {
                match ch {
                    '"' => write!(f, "\\\"")?,
                    '\\' => write!(f, "\\\\")?,
                    '\n' => write!(f, "\\n")?,
                    '\t' => write!(f, "\\t")?,
                    '\r' => write!(f, "\\r")?,
                    c => write!(f, "{c}")?,
                }
            }
            write!(f, "\"")
        }
        Value::Pair(head) => {
            write!(f, "(")?;
            let start = path.len();
            let mut cur = head.clone();
            loop {
                if path.contains(&cur.as_ptr()) {
                    write!(f, "...")?;
                    break;
                }
                path.push(cur.as_ptr());
                write_value(&cur.first(), f, quote_strings, path)?;
                match cur.second() {
                    Value::Pair(next) => {
                        write!(f, " ")?;
                        cur = next;
                    }
                    Value::Nil => break,
                    other => {
                        write!(f, " . ")?;
                        write_value(&other, f, quote_strings, path)?;
                        break;
                    }
                }
            }
            path.truncate(start);
            write!(f, ")")
        }
        Value::Nil => write!(f, "()"),
        Value::Unspecified => write!(f, "okay"),
        Value::Primitive(_) => write!(f, "#[primitive]"),
        Value::Closure(c) => {
            write!(f, "({} ", c.kind.keyword())?;
            write_value(&c.formals, f, quote_strings, path)?;
            write!(f, " ")?;
            write_value(&c.body, f, quote_strings, path)?;
            write!(f, ")")
        }
        Value::Thunk(_) => write!(f, "#[thunk]"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(self, f, true, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_debug(self, f, &mut Vec::new())
    }
}

fn write_debug(value: &Value, f: &mut fmt::Formatter<'_>, path: &mut Vec<PairPtr>) -> fmt::Result {
    match value {
        Value::Pair(p) => {
            if path.contains(&p.as_ptr()) {
                return write!(f, "...");
            }
            path.push(p.as_ptr());
            write!(f, "Pair(")?;
            write_debug(&p.first(), f, path)?;
            write!(f, ", ")?;
            write_debug(&p.second(), f, path)?;
            path.pop();
            write!(f, ")")
        }
        Value::Nil => write!(f, "nil"),
        Value::Symbol(s) => write!(f, "'{s}'"),
        other => write!(f, "{other}"),
    }
}

// Structural equality makes tests read naturally; use is_eq explicitly where
// identity matters.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(Number::from_f64(x))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::new(s.to_owned()))
    }
}

/// Helper for creating symbol values in tests and constructed expressions.
pub fn sym(name: &str) -> Value {
    Value::Symbol(crate::symbol::intern(name))
}
