//! Numeric values: exact integers and inexact floats.
//!
//! Arithmetic results that are mathematically whole and fit the integer range
//! normalize back to integers, so `(/ 4 2)` is the exact `2` while `(/ 1 2)`
//! is `0.5`. Integer overflow is detected and reported rather than wrapped.

use std::cmp::Ordering;
use std::fmt;

use crate::Error;

#[derive(Clone, Copy, Debug)]
pub enum Number {
    Int(i64),
    Float(f64),
}

fn overflow(operation: &str) -> Error {
    Error::Eval(format!("integer overflow in {operation}"))
}

fn division_by_zero() -> Error {
    Error::Eval("division by zero".into())
}

impl Number {
    /// Normalize a float: whole values within the integer range become exact.
    pub fn from_f64(x: f64) -> Number {
        if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
            Number::Int(x as i64)
        } else {
            Number::Float(x)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(x) => x == 0.0,
        }
    }

    pub fn add(self, other: Number) -> Result<Number, Error> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map(Number::Int)
                .ok_or_else(|| overflow("addition")),
            _ => Ok(Number::from_f64(self.as_f64() + other.as_f64())),
        }
    }

    pub fn sub(self, other: Number) -> Result<Number, Error> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map(Number::Int)
                .ok_or_else(|| overflow("subtraction")),
            _ => Ok(Number::from_f64(self.as_f64() - other.as_f64())),
        }
    }

    pub fn mul(self, other: Number) -> Result<Number, Error> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map(Number::Int)
                .ok_or_else(|| overflow("multiplication")),
            _ => Ok(Number::from_f64(self.as_f64() * other.as_f64())),
        }
    }

    pub fn neg(self) -> Result<Number, Error> {
        match self {
            Number::Int(n) => n
                .checked_neg()
                .map(Number::Int)
                .ok_or_else(|| overflow("negation")),
            Number::Float(x) => Ok(Number::Float(-x)),
        }
    }

    /// True division; the result is normalized, so whole quotients stay exact.
    pub fn div(self, other: Number) -> Result<Number, Error> {
        if other.is_zero() {
            return Err(division_by_zero());
        }
        Ok(Number::from_f64(self.as_f64() / other.as_f64()))
    }
}

/// Integer division truncating toward zero.
pub fn quotient(a: i64, b: i64) -> Result<i64, Error> {
    if b == 0 {
        return Err(division_by_zero());
    }
    a.checked_div(b).ok_or_else(|| overflow("quotient"))
}

/// Floor modulus: the result takes the sign of the divisor.
pub fn modulo(a: i64, b: i64) -> Result<i64, Error> {
    if b == 0 {
        return Err(division_by_zero());
    }
    if b == -1 {
        return Ok(0);
    }
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Truncated remainder: the result takes the sign of the dividend.
pub fn remainder(a: i64, b: i64) -> Result<i64, Error> {
    if b == 0 {
        return Err(division_by_zero());
    }
    if b == -1 {
        return Ok(0);
    }
    Ok(a % b)
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) => {
                // Whole floats escape normalization only outside the integer
                // range; keep a trailing ".0" so they read back as floats.
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
        }
    }
}
