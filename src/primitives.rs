//! The built-in procedure registry.
//!
//! Every primitive is a row in [`PRIMITIVES`]: its names, an arity contract
//! checked before the call, and a plain function pointer. Most primitives only
//! see their argument vector; `eval`, `apply`, and `load` also receive the
//! caller's environment and nesting depth.

use std::fs;
use std::io::{self, Write};

use crate::Error;
use crate::frame::Frame;
use crate::number::{self, Number};
use crate::symbol::intern;
use crate::value::{Pair, Value};

/// How many arguments a primitive accepts.
#[derive(Clone, Copy, Debug)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn validate(&self, name: &str, got: usize) -> Result<(), Error> {
        let ok = match *self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::Range(lo, hi) => got >= lo && got <= hi,
        };
        if ok {
            return Ok(());
        }
        let wanted = match *self {
            Arity::Exact(n) => format!("exactly {n}"),
            Arity::AtLeast(n) => format!("at least {n}"),
            Arity::Range(lo, hi) => format!("between {lo} and {hi}"),
        };
        Err(Error::Eval(format!(
            "{name} expected {wanted} argument(s), got {got}"
        )))
    }
}

/// The calling convention of a primitive.
pub enum PrimitiveFn {
    /// Receives only its evaluated arguments
    Simple(fn(Vec<Value>) -> Result<Value, Error>),
    /// Also receives the caller's environment and evaluation depth
    WithEnv(fn(Vec<Value>, &Frame, usize) -> Result<Value, Error>),
}

/// One registered primitive procedure.
pub struct PrimitiveDef {
    /// All names the primitive is bound to; the first is used in errors
    pub names: &'static [&'static str],
    pub arity: Arity,
    pub func: PrimitiveFn,
}

fn bad_type(value: &Value, k: usize, name: &str) -> Error {
    Error::Eval(format!(
        "argument {k} of {name} has wrong type ({})",
        value.type_name()
    ))
}

fn number_arg(value: &Value, i: usize) -> Result<Number, Error> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(Error::Eval(format!(
            "operand {i} ({other}) is not a number"
        ))),
    }
}

fn int_arg(args: &[Value], k: usize, name: &str) -> Result<i64, Error> {
    match &args[k] {
        Value::Number(Number::Int(n)) => Ok(*n),
        other => Err(bad_type(other, k, name)),
    }
}

fn pair_arg<'a>(args: &'a [Value], k: usize, name: &str) -> Result<&'a Pair, Error> {
    match &args[k] {
        Value::Pair(p) => Ok(p),
        other => Err(bad_type(other, k, name)),
    }
}

// ===== Type predicates =====

fn prim_is_boolean(args: Vec<Value>) -> Result<Value, Error> {
    Ok(matches!(args[0], Value::Boolean(_)).into())
}

fn prim_not(args: Vec<Value>) -> Result<Value, Error> {
    Ok((!args[0].is_truthy()).into())
}

fn prim_is_eq(args: Vec<Value>) -> Result<Value, Error> {
    Ok(args[0].is_eq(&args[1]).into())
}

fn prim_is_equal(args: Vec<Value>) -> Result<Value, Error> {
    Ok(args[0].is_equal(&args[1]).into())
}

fn prim_is_pair(args: Vec<Value>) -> Result<Value, Error> {
    Ok(matches!(args[0], Value::Pair(_)).into())
}

fn prim_is_null(args: Vec<Value>) -> Result<Value, Error> {
    Ok(matches!(args[0], Value::Nil).into())
}

fn prim_is_list(args: Vec<Value>) -> Result<Value, Error> {
    Ok(args[0].is_list().into())
}

fn prim_is_string(args: Vec<Value>) -> Result<Value, Error> {
    Ok(matches!(args[0], Value::Str(_)).into())
}

fn prim_is_symbol(args: Vec<Value>) -> Result<Value, Error> {
    Ok(matches!(args[0], Value::Symbol(_)).into())
}

fn prim_is_number(args: Vec<Value>) -> Result<Value, Error> {
    Ok(matches!(args[0], Value::Number(_)).into())
}

fn prim_is_integer(args: Vec<Value>) -> Result<Value, Error> {
    Ok(matches!(args[0], Value::Number(n) if n.is_integer()).into())
}

fn prim_is_atom(args: Vec<Value>) -> Result<Value, Error> {
    Ok((!matches!(args[0], Value::Pair(_))).into())
}

fn prim_is_even(args: Vec<Value>) -> Result<Value, Error> {
    let n = int_arg(&args, 0, "even?")?;
    Ok((n.rem_euclid(2) == 0).into())
}

fn prim_is_odd(args: Vec<Value>) -> Result<Value, Error> {
    let n = int_arg(&args, 0, "odd?")?;
    Ok((n.rem_euclid(2) == 1).into())
}

fn prim_is_zero(args: Vec<Value>) -> Result<Value, Error> {
    let n = number_arg(&args[0], 0).map_err(|_| bad_type(&args[0], 0, "zero?"))?;
    Ok(n.is_zero().into())
}

// ===== Pairs and lists =====

fn prim_cons(mut args: Vec<Value>) -> Result<Value, Error> {
    let second = args.pop().unwrap_or(Value::Nil);
    let first = args.pop().unwrap_or(Value::Nil);
    Ok(Value::cons(first, second))
}

fn prim_car(args: Vec<Value>) -> Result<Value, Error> {
    Ok(pair_arg(&args, 0, "car")?.first())
}

fn prim_cdr(args: Vec<Value>) -> Result<Value, Error> {
    Ok(pair_arg(&args, 0, "cdr")?.second())
}

fn prim_set_car(args: Vec<Value>) -> Result<Value, Error> {
    pair_arg(&args, 0, "set-car!")?.set_first(args[1].clone());
    Ok(Value::Unspecified)
}

fn prim_set_cdr(args: Vec<Value>) -> Result<Value, Error> {
    pair_arg(&args, 0, "set-cdr!")?.set_second(args[1].clone());
    Ok(Value::Unspecified)
}

fn prim_length(args: Vec<Value>) -> Result<Value, Error> {
    match &args[0] {
        Value::Nil | Value::Pair(_) => args[0].list_length().map(Value::from),
        other => Err(bad_type(other, 0, "length")),
    }
}

fn prim_list(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::list_from_slice(&args))
}

fn prim_append(mut args: Vec<Value>) -> Result<Value, Error> {
    // The final argument becomes the tail unchanged; earlier arguments must
    // be proper lists and are copied.
    let Some(mut result) = args.pop() else {
        return Ok(Value::Nil);
    };
    for (k, arg) in args.iter().enumerate().rev() {
        match arg {
            Value::Nil => {}
            Value::Pair(_) => {
                if !arg.is_list() {
                    return Err(Error::Eval("attempt to append to improper list".into()));
                }
                for item in arg.list_to_vec()?.into_iter().rev() {
                    result = Value::cons(item, result);
                }
            }
            other => return Err(bad_type(other, k, "append")),
        }
    }
    Ok(result)
}

// ===== Arithmetic =====

fn prim_add(args: Vec<Value>) -> Result<Value, Error> {
    let mut acc = Number::Int(0);
    for (i, arg) in args.iter().enumerate() {
        acc = acc.add(number_arg(arg, i)?)?;
    }
    Ok(Value::Number(acc))
}

fn prim_sub(args: Vec<Value>) -> Result<Value, Error> {
    let first = number_arg(&args[0], 0)?;
    if args.len() == 1 {
        return Ok(Value::Number(first.neg()?));
    }
    let mut acc = first;
    for (i, arg) in args.iter().enumerate().skip(1) {
        acc = acc.sub(number_arg(arg, i)?)?;
    }
    Ok(Value::Number(acc))
}

fn prim_mul(args: Vec<Value>) -> Result<Value, Error> {
    let mut acc = Number::Int(1);
    for (i, arg) in args.iter().enumerate() {
        acc = acc.mul(number_arg(arg, i)?)?;
    }
    Ok(Value::Number(acc))
}

fn prim_div(args: Vec<Value>) -> Result<Value, Error> {
    let first = number_arg(&args[0], 0)?;
    if args.len() == 1 {
        return Ok(Value::Number(Number::Int(1).div(first)?));
    }
    let mut acc = first;
    for (i, arg) in args.iter().enumerate().skip(1) {
        acc = acc.div(number_arg(arg, i)?)?;
    }
    Ok(Value::Number(acc))
}

fn prim_quotient(args: Vec<Value>) -> Result<Value, Error> {
    let a = int_arg(&args, 0, "quotient")?;
    let b = int_arg(&args, 1, "quotient")?;
    number::quotient(a, b).map(Value::from)
}

fn prim_modulo(args: Vec<Value>) -> Result<Value, Error> {
    let a = int_arg(&args, 0, "modulo")?;
    let b = int_arg(&args, 1, "modulo")?;
    number::modulo(a, b).map(Value::from)
}

fn prim_remainder(args: Vec<Value>) -> Result<Value, Error> {
    let a = int_arg(&args, 0, "remainder")?;
    let b = int_arg(&args, 1, "remainder")?;
    number::remainder(a, b).map(Value::from)
}

fn prim_floor(args: Vec<Value>) -> Result<Value, Error> {
    match number_arg(&args[0], 0).map_err(|_| bad_type(&args[0], 0, "floor"))? {
        n @ Number::Int(_) => Ok(Value::Number(n)),
        Number::Float(x) => Ok(Value::Number(Number::from_f64(x.floor()))),
    }
}

fn prim_ceil(args: Vec<Value>) -> Result<Value, Error> {
    match number_arg(&args[0], 0).map_err(|_| bad_type(&args[0], 0, "ceil"))? {
        n @ Number::Int(_) => Ok(Value::Number(n)),
        Number::Float(x) => Ok(Value::Number(Number::from_f64(x.ceil()))),
    }
}

fn comparison_args(args: &[Value], name: &str) -> Result<(Number, Number), Error> {
    let a = number_arg(&args[0], 0).map_err(|_| bad_type(&args[0], 0, name))?;
    let b = number_arg(&args[1], 1).map_err(|_| bad_type(&args[1], 1, name))?;
    Ok((a, b))
}

fn prim_num_eq(args: Vec<Value>) -> Result<Value, Error> {
    let (a, b) = comparison_args(&args, "=")?;
    Ok((a == b).into())
}

fn prim_lt(args: Vec<Value>) -> Result<Value, Error> {
    let (a, b) = comparison_args(&args, "<")?;
    Ok((a < b).into())
}

fn prim_gt(args: Vec<Value>) -> Result<Value, Error> {
    let (a, b) = comparison_args(&args, ">")?;
    Ok((a > b).into())
}

fn prim_le(args: Vec<Value>) -> Result<Value, Error> {
    let (a, b) = comparison_args(&args, "<=")?;
    Ok((a <= b).into())
}

fn prim_ge(args: Vec<Value>) -> Result<Value, Error> {
    let (a, b) = comparison_args(&args, ">=")?;
    Ok((a >= b).into())
}

// ===== Output and control =====

fn prim_display(args: Vec<Value>) -> Result<Value, Error> {
    print!("{}", args[0].to_display_string());
    let _ = io::stdout().flush();
    Ok(Value::Unspecified)
}

fn prim_print(args: Vec<Value>) -> Result<Value, Error> {
    println!("{}", args[0]);
    Ok(Value::Unspecified)
}

fn prim_newline(_args: Vec<Value>) -> Result<Value, Error> {
    println!();
    let _ = io::stdout().flush();
    Ok(Value::Unspecified)
}

fn prim_error(args: Vec<Value>) -> Result<Value, Error> {
    let message = match args.first() {
        Some(value) => value.to_display_string(),
        None => String::new(),
    };
    Err(Error::Eval(message))
}

fn prim_exit(_args: Vec<Value>) -> Result<Value, Error> {
    Err(Error::Exit)
}

// ===== Environment-aware primitives =====

fn prim_eval(mut args: Vec<Value>, env: &Frame, depth: usize) -> Result<Value, Error> {
    let expr = args.pop().unwrap_or(Value::Nil);
    crate::eval::eval_with_depth(expr, env.clone(), depth + 1)
}

fn prim_apply(mut args: Vec<Value>, env: &Frame, depth: usize) -> Result<Value, Error> {
    let arg_list = args.pop().unwrap_or(Value::Nil);
    let procedure = args.pop().unwrap_or(Value::Nil);
    crate::eval::apply(procedure, arg_list.list_to_vec()?, env, depth)
}

fn prim_load(args: Vec<Value>, env: &Frame, depth: usize) -> Result<Value, Error> {
    let name = match &args[0] {
        Value::Str(s) => s.to_string(),
        Value::Symbol(s) => s.name().to_owned(),
        other => return Err(bad_type(other, 0, "load")),
    };
    load_named(&name, env, depth)?;
    Ok(Value::Unspecified)
}

fn load_named(name: &str, env: &Frame, depth: usize) -> Result<(), Error> {
    let source = match fs::read_to_string(name) {
        Ok(s) => Ok(s),
        Err(e) => {
            // Bare module names get a second chance with the .scm suffix.
            if name.ends_with(".scm") {
                Err(e)
            } else {
                fs::read_to_string(format!("{name}.scm")).map_err(|_| e)
            }
        }
    }
    .map_err(|e| Error::Eval(format!("could not load {name}: {e}")))?;

    let global = env.global_frame();
    for expr in crate::reader::read_all(&source)? {
        crate::eval::eval_with_depth(expr, global.clone(), depth + 1)?;
    }
    Ok(())
}

/// Read and evaluate a Scheme source file in ENV's global frame.
pub fn load_file(name: &str, env: &Frame) -> Result<(), Error> {
    load_named(name, env, 0)
}

/// Install every primitive under each of its names.
pub fn install(env: &Frame) {
    for def in PRIMITIVES {
        for name in def.names {
            env.define(intern(name), Value::Primitive(def));
        }
    }
}

macro_rules! prim {
    ($names:expr, $arity:expr, $func:expr) => {
        PrimitiveDef {
            names: &$names,
            arity: $arity,
            func: PrimitiveFn::Simple($func),
        }
    };
}

macro_rules! prim_env {
    ($names:expr, $arity:expr, $func:expr) => {
        PrimitiveDef {
            names: &$names,
            arity: $arity,
            func: PrimitiveFn::WithEnv($func),
        }
    };
}

pub static PRIMITIVES: &[PrimitiveDef] = &[
    prim!(["boolean?"], Arity::Exact(1), prim_is_boolean),
    prim!(["not"], Arity::Exact(1), prim_not),
    prim!(["eq?", "eqv?"], Arity::Exact(2), prim_is_eq),
    prim!(["equal?"], Arity::Exact(2), prim_is_equal),
    prim!(["pair?"], Arity::Exact(1), prim_is_pair),
    prim!(["null?"], Arity::Exact(1), prim_is_null),
    prim!(["list?"], Arity::Exact(1), prim_is_list),
    prim!(["string?"], Arity::Exact(1), prim_is_string),
    prim!(["symbol?"], Arity::Exact(1), prim_is_symbol),
    prim!(["number?"], Arity::Exact(1), prim_is_number),
    prim!(["integer?"], Arity::Exact(1), prim_is_integer),
    prim!(["atom?"], Arity::Exact(1), prim_is_atom),
    prim!(["even?"], Arity::Exact(1), prim_is_even),
    prim!(["odd?"], Arity::Exact(1), prim_is_odd),
    prim!(["zero?"], Arity::Exact(1), prim_is_zero),
    prim!(["cons"], Arity::Exact(2), prim_cons),
    prim!(["car"], Arity::Exact(1), prim_car),
    prim!(["cdr"], Arity::Exact(1), prim_cdr),
    prim!(["set-car!"], Arity::Exact(2), prim_set_car),
    prim!(["set-cdr!"], Arity::Exact(2), prim_set_cdr),
    prim!(["length"], Arity::Exact(1), prim_length),
    prim!(["list"], Arity::AtLeast(0), prim_list),
    prim!(["append"], Arity::AtLeast(0), prim_append),
    prim!(["+"], Arity::AtLeast(0), prim_add),
    prim!(["-"], Arity::AtLeast(1), prim_sub),
    prim!(["*"], Arity::AtLeast(0), prim_mul),
    prim!(["/"], Arity::AtLeast(1), prim_div),
    prim!(["quotient"], Arity::Exact(2), prim_quotient),
    prim!(["modulo"], Arity::Exact(2), prim_modulo),
    prim!(["remainder"], Arity::Exact(2), prim_remainder),
    prim!(["floor"], Arity::Exact(1), prim_floor),
    prim!(["ceil"], Arity::Exact(1), prim_ceil),
    prim!(["="], Arity::Exact(2), prim_num_eq),
    prim!(["<"], Arity::Exact(2), prim_lt),
    prim!([">"], Arity::Exact(2), prim_gt),
    prim!(["<="], Arity::Exact(2), prim_le),
    prim!([">="], Arity::Exact(2), prim_ge),
    prim!(["display"], Arity::Exact(1), prim_display),
    prim!(["print"], Arity::Exact(1), prim_print),
    prim!(["newline"], Arity::Exact(0), prim_newline),
    prim!(["error"], Arity::Range(0, 1), prim_error),
    prim!(["exit"], Arity::Exact(0), prim_exit),
    prim_env!(["eval"], Arity::Exact(1), prim_eval),
    prim_env!(["apply"], Arity::Exact(2), prim_apply),
    prim_env!(["load"], Arity::Exact(1), prim_load),
];
