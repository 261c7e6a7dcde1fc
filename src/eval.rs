//! The trampolined eval/apply core and special forms.
//!
//! Evaluation advances a `(expression, environment)` pair in a loop: special
//! forms and procedure applications return the next pair instead of recursing
//! when their result is an expression in tail position, so tail calls run in
//! constant stack space. An environment of `None` marks the expression as a
//! finished value.
//!
//! Only nested (non-tail) evaluation consumes depth, bounded by
//! [`MAX_EVAL_DEPTH`] to turn runaway recursion into an error instead of a
//! stack overflow.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use crate::frame::Frame;
use crate::primitives::{self, PrimitiveFn};
use crate::symbol::{Symbol, intern};
use crate::value::{Closure, ClosureKind, ThunkCell, Value};
use crate::{Error, MAX_EVAL_DEPTH, PROPER_TAIL_RECURSION};

/// The next trampoline state: a value paired with the environment to continue
/// in, or `None` when the value is final.
type Tail = (Value, Option<Frame>);

type SpecialFormFn = fn(&Value, &Frame, usize) -> Result<Tail, Error>;

static SPECIAL_FORMS: LazyLock<HashMap<Symbol, SpecialFormFn>> = LazyLock::new(|| {
    let mut forms: HashMap<Symbol, SpecialFormFn> = HashMap::new();
    forms.insert(intern("quote"), eval_quote);
    forms.insert(intern("define"), eval_define);
    forms.insert(intern("if"), eval_if);
    forms.insert(intern("and"), eval_and);
    forms.insert(intern("or"), eval_or);
    forms.insert(intern("cond"), eval_cond);
    forms.insert(intern("begin"), eval_begin);
    forms.insert(intern("let"), eval_let);
    forms.insert(intern("lambda"), eval_lambda);
    forms.insert(intern("mu"), eval_mu);
    forms.insert(intern("nu"), eval_nu);
    // Form names without handlers yet; kept interned so they stay reserved.
    for name in [
        "define-macro",
        "set!",
        "quasiquote",
        "unquote",
        "unquote-splicing",
    ] {
        intern(name);
    }
    forms
});

/// A fresh global environment with every primitive installed.
pub fn create_global_frame() -> Frame {
    let global = Frame::new(None);
    primitives::install(&global);
    global
}

/// Evaluate EXPR in ENV.
pub fn eval(expr: Value, env: &Frame) -> Result<Value, Error> {
    eval_with_depth(expr, env.clone(), 0)
}

pub(crate) fn eval_with_depth(expr: Value, env: Frame, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::Eval("maximum recursion depth exceeded".into()));
    }
    let mut current = expr;
    let mut env = Some(env);
    loop {
        let Some(frame) = env.take() else {
            return Ok(current);
        };
        match current.clone() {
            Value::Symbol(s) => {
                current = force(frame.lookup(s)?, depth)?;
            }
            whole @ Value::Pair(_) => {
                if !whole.is_list() {
                    return Err(Error::Eval(format!("malformed list: {whole}")));
                }
                let Value::Pair(p) = &whole else { unreachable!() };
                let first = p.first();
                let operands = p.second();

                let handler = match &first {
                    Value::Symbol(s) => SPECIAL_FORMS.get(s).copied(),
                    _ => None,
                };
                let (value, next_env) = match handler {
                    Some(handle) => handle(&operands, &frame, depth)?,
                    None => {
                        let procedure = eval_with_depth(first, frame.clone(), depth + 1)?;
                        let args = evaluate_operands(&procedure, &operands, &frame, depth)?;
                        apply_step(procedure, args, &frame, depth)?
                    }
                };
                if PROPER_TAIL_RECURSION {
                    current = value;
                    env = next_env;
                } else {
                    current = complete(value, next_env, depth)?;
                }
            }
            other => {
                // Numbers, strings, booleans, nil, and the rest self-evaluate.
                current = other;
            }
        }
    }
}

/// Finish a trampoline state by evaluating its expression if one remains.
fn complete(value: Value, env: Option<Frame>, depth: usize) -> Result<Value, Error> {
    match env {
        Some(frame) => eval_with_depth(value, frame, depth + 1),
        None => Ok(value),
    }
}

/// Force a thunk, memoizing its value; anything else passes through.
fn force(value: Value, depth: usize) -> Result<Value, Error> {
    let Value::Thunk(cell) = &value else {
        return Ok(value);
    };
    if let Some(forced) = cell.forced_value() {
        return Ok(forced);
    }
    let Some((expr, env)) = cell.pending() else {
        return Ok(value);
    };
    let result = eval_with_depth(expr, env, depth + 1)?;
    cell.memoize(result.clone());
    Ok(result)
}

fn non_function(value: &Value) -> Error {
    Error::Eval(format!(
        "attempt to call something of non-function type ({})",
        value.type_name()
    ))
}

/// Turn the operand expressions into argument values: evaluated eagerly for
/// primitives, lambdas, and mus; wrapped in thunks for nus.
fn evaluate_operands(
    procedure: &Value,
    operands: &Value,
    env: &Frame,
    depth: usize,
) -> Result<Vec<Value>, Error> {
    match procedure {
        Value::Closure(c) if c.kind == ClosureKind::Nu => Ok(operands
            .list_to_vec()?
            .into_iter()
            .map(|expr| Value::Thunk(Rc::new(ThunkCell::new(expr, env.clone()))))
            .collect()),
        Value::Primitive(_) | Value::Closure(_) => operands
            .list_to_vec()?
            .into_iter()
            .map(|expr| eval_with_depth(expr, env.clone(), depth + 1))
            .collect(),
        other => Err(non_function(other)),
    }
}

/// One application step: primitives produce a final value, closures produce
/// their body as the next tail expression in a fresh call frame.
fn apply_step(procedure: Value, args: Vec<Value>, env: &Frame, depth: usize) -> Result<Tail, Error> {
    match procedure {
        Value::Primitive(def) => {
            def.arity.validate(def.names[0], args.len())?;
            let value = match def.func {
                PrimitiveFn::Simple(f) => f(args)?,
                PrimitiveFn::WithEnv(f) => f(args, env, depth)?,
            };
            Ok((value, None))
        }
        Value::Closure(c) => {
            // Mu procedures extend the caller's environment, not the one
            // captured at definition.
            let parent = match c.kind {
                ClosureKind::Mu => env.clone(),
                ClosureKind::Lambda | ClosureKind::Nu => c.env.clone(),
            };
            let frame = parent.make_call_frame(&c.formals, args)?;
            Ok((c.body.clone(), Some(frame)))
        }
        other => Err(non_function(&other)),
    }
}

/// Apply PROCEDURE to already-evaluated ARGS, running its body to completion.
pub(crate) fn apply(
    procedure: Value,
    args: Vec<Value>,
    env: &Frame,
    depth: usize,
) -> Result<Value, Error> {
    let (value, next) = apply_step(procedure, args, env, depth)?;
    complete(value, next, depth)
}

/// Collect a form's operands, checking the operand count against MIN and MAX.
fn check_form(operands: &Value, min: usize, max: Option<usize>) -> Result<Vec<Value>, Error> {
    let items = operands
        .list_to_vec()
        .map_err(|_| Error::Eval(format!("badly formed expression: {operands}")))?;
    if items.len() < min {
        return Err(Error::Eval("too few operands in form".into()));
    }
    if let Some(max) = max
        && items.len() > max
    {
        return Err(Error::Eval("too many operands in form".into()));
    }
    Ok(items)
}

/// Validate a formal parameter list: symbols only, each at most once, with an
/// optional dotted or bare rest symbol.
fn check_formals(formals: &Value) -> Result<(), Error> {
    let mut seen: Vec<Symbol> = Vec::new();
    let mut check = |value: Value| match value {
        Value::Symbol(s) => {
            if seen.contains(&s) {
                Err(Error::Eval(format!("duplicate symbol: {s}")))
            } else {
                seen.push(s);
                Ok(())
            }
        }
        other => Err(Error::Eval(format!("non-symbol: {other}"))),
    };
    let mut cur = formals.clone();
    loop {
        match cur {
            Value::Nil => return Ok(()),
            Value::Symbol(_) => return check(cur),
            Value::Pair(p) => {
                check(p.first())?;
                cur = p.second();
            }
            other => return Err(Error::Eval(format!("non-symbol: {other}"))),
        }
    }
}

/// The single expression for a procedure or form body, wrapping multiple
/// expressions in `begin`.
fn body_expression(body: &[Value]) -> Value {
    if body.len() == 1 {
        return body[0].clone();
    }
    let mut items = vec![Value::Symbol(intern("begin"))];
    items.extend_from_slice(body);
    Value::list_from_slice(&items)
}

// ===== Special form handlers =====

fn eval_quote(operands: &Value, _env: &Frame, _depth: usize) -> Result<Tail, Error> {
    let mut items = check_form(operands, 1, Some(1))?;
    Ok((items.pop().unwrap_or(Value::Nil), None))
}

fn eval_if(operands: &Value, env: &Frame, depth: usize) -> Result<Tail, Error> {
    let items = check_form(operands, 2, Some(3))?;
    let test = eval_with_depth(items[0].clone(), env.clone(), depth + 1)?;
    if test.is_truthy() {
        Ok((items[1].clone(), Some(env.clone())))
    } else if items.len() == 3 {
        Ok((items[2].clone(), Some(env.clone())))
    } else {
        Ok((Value::Unspecified, None))
    }
}

fn eval_and(operands: &Value, env: &Frame, depth: usize) -> Result<Tail, Error> {
    let items = check_form(operands, 0, None)?;
    let Some((last, init)) = items.split_last() else {
        return Ok((Value::from(true), None));
    };
    for item in init {
        let value = eval_with_depth(item.clone(), env.clone(), depth + 1)?;
        if !value.is_truthy() {
            return Ok((value, None));
        }
    }
    Ok((last.clone(), Some(env.clone())))
}

fn eval_or(operands: &Value, env: &Frame, depth: usize) -> Result<Tail, Error> {
    let items = check_form(operands, 0, None)?;
    let Some((last, init)) = items.split_last() else {
        return Ok((Value::from(false), None));
    };
    for item in init {
        let value = eval_with_depth(item.clone(), env.clone(), depth + 1)?;
        if value.is_truthy() {
            return Ok((value, None));
        }
    }
    Ok((last.clone(), Some(env.clone())))
}

fn eval_begin(operands: &Value, env: &Frame, depth: usize) -> Result<Tail, Error> {
    let items = check_form(operands, 0, None)?;
    let Some((last, init)) = items.split_last() else {
        return Ok((Value::Unspecified, None));
    };
    for item in init {
        eval_with_depth(item.clone(), env.clone(), depth + 1)?;
    }
    Ok((last.clone(), Some(env.clone())))
}

fn eval_cond(operands: &Value, env: &Frame, depth: usize) -> Result<Tail, Error> {
    let clauses = check_form(operands, 0, None)?;
    let else_symbol = intern("else");
    for (i, clause) in clauses.iter().enumerate() {
        let parts = clause
            .list_to_vec()
            .map_err(|_| Error::Eval(format!("badly formed expression: {clause}")))?;
        if parts.is_empty() {
            return Err(Error::Eval(format!("badly formed expression: {clause}")));
        }
        let is_else = matches!(parts[0], Value::Symbol(s) if s == else_symbol);
        let test = if is_else {
            if i + 1 != clauses.len() {
                return Err(Error::Eval("else must be last".into()));
            }
            if parts.len() == 1 {
                return Err(Error::Eval("badly formed else clause".into()));
            }
            Value::from(true)
        } else {
            eval_with_depth(parts[0].clone(), env.clone(), depth + 1)?
        };
        if test.is_truthy() {
            // A clause with no body yields its test value.
            if parts.len() == 1 {
                return Ok((test, None));
            }
            return Ok((body_expression(&parts[1..]), Some(env.clone())));
        }
    }
    Ok((Value::Unspecified, None))
}

fn eval_let(operands: &Value, env: &Frame, depth: usize) -> Result<Tail, Error> {
    let items = check_form(operands, 2, None)?;
    let bad_bindings = || Error::Eval("bad bindings list in let form".into());
    let bindings = items[0].list_to_vec().map_err(|_| bad_bindings())?;

    let frame = Frame::new(Some(env.clone()));
    for binding in bindings {
        let parts = binding.list_to_vec().map_err(|_| bad_bindings())?;
        let [Value::Symbol(name), init] = parts.as_slice() else {
            return Err(bad_bindings());
        };
        // Initializers see the enclosing environment, not each other.
        let value = eval_with_depth(init.clone(), env.clone(), depth + 1)?;
        frame.define(*name, value);
    }
    Ok((body_expression(&items[1..]), Some(frame)))
}

fn make_closure(kind: ClosureKind, operands: &Value, env: &Frame) -> Result<Tail, Error> {
    let items = check_form(operands, 2, None)?;
    check_formals(&items[0])?;
    let closure = Closure {
        kind,
        formals: items[0].clone(),
        body: body_expression(&items[1..]),
        env: env.clone(),
    };
    Ok((Value::Closure(Rc::new(closure)), None))
}

fn eval_lambda(operands: &Value, env: &Frame, _depth: usize) -> Result<Tail, Error> {
    make_closure(ClosureKind::Lambda, operands, env)
}

fn eval_mu(operands: &Value, env: &Frame, _depth: usize) -> Result<Tail, Error> {
    make_closure(ClosureKind::Mu, operands, env)
}

fn eval_nu(operands: &Value, env: &Frame, _depth: usize) -> Result<Tail, Error> {
    make_closure(ClosureKind::Nu, operands, env)
}

fn eval_define(operands: &Value, env: &Frame, depth: usize) -> Result<Tail, Error> {
    let items = check_form(operands, 2, None)?;
    match &items[0] {
        Value::Symbol(name) => {
            if items.len() > 2 {
                return Err(Error::Eval("too many operands in form".into()));
            }
            let value = eval_with_depth(items[1].clone(), env.clone(), depth + 1)?;
            env.define(*name, value);
            Ok((Value::Symbol(*name), None))
        }
        // (define (name . formals) body...) is sugar for a lambda binding.
        Value::Pair(target) => {
            let Value::Symbol(name) = target.first() else {
                return Err(Error::Eval("bad argument to define".into()));
            };
            let formals = target.second();
            check_formals(&formals)?;
            let closure = Closure {
                kind: ClosureKind::Lambda,
                formals,
                body: body_expression(&items[1..]),
                env: env.clone(),
            };
            env.define(name, Value::Closure(Rc::new(closure)));
            Ok((Value::Symbol(name), None))
        }
        _ => Err(Error::Eval("bad argument to define".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_line;

    fn eval_str(source: &str, env: &Frame) -> Result<Value, Error> {
        eval(read_line(source)?, env)
    }

    /// Expected outcomes for a sequential evaluation session
    enum Expected {
        /// Evaluation succeeds and the result prints as this text
        Prints(&'static str),
        /// Evaluation fails with this message
        Fails(&'static str),
    }
    use Expected::*;

    fn run_session(test_cases: Vec<(&str, Expected)>) {
        let env = create_global_frame();
        for (i, (input, expected)) in test_cases.into_iter().enumerate() {
            let test_id = format!("Eval test #{}", i + 1);
            match (eval_str(input, &env), expected) {
                (Ok(value), Prints(text)) => {
                    assert_eq!(format!("{value}"), text, "{test_id}: '{input}'");
                }
                (Err(err), Fails(message)) => {
                    assert_eq!(format!("{err}"), message, "{test_id}: '{input}'");
                }
                (Ok(value), Fails(message)) => {
                    panic!("{test_id}: expected error '{message}' for '{input}', got {value}")
                }
                (Err(err), Prints(text)) => {
                    panic!("{test_id}: expected '{text}' for '{input}', got error: {err}")
                }
            }
        }
    }

    #[test]
    fn test_eval_comprehensive() {
        let test_cases = vec![
            // ===== SELF-EVALUATING AND QUOTE =====
            ("42", Prints("42")),
            ("#t", Prints("#t")),
            ("\"hi\"", Prints("\"hi\"")),
            ("(quote (1 2))", Prints("(1 2)")),
            ("'(1 (2 3))", Prints("(1 (2 3))")),
            ("''x", Prints("(quote x)")),
            ("(quote)", Fails("too few operands in form")),
            ("(quote a b)", Fails("too many operands in form")),
            // ===== IF =====
            ("(if #t 1 2)", Prints("1")),
            ("(if #f 1 2)", Prints("2")),
            ("(if #f 1)", Prints("okay")),
            ("(if 0 1 2)", Prints("1")),
            ("(if '() 1 2)", Prints("1")),
            ("(if #t 1 2 3)", Fails("too many operands in form")),
            // ===== AND / OR =====
            ("(and)", Prints("#t")),
            ("(and 1 2 3)", Prints("3")),
            ("(and 1 #f 3)", Prints("#f")),
            ("(or)", Prints("#f")),
            ("(or #f 2 3)", Prints("2")),
            ("(or 1 (undefined))", Prints("1")),
            ("(and #f (undefined))", Prints("#f")),
            // ===== BEGIN =====
            ("(begin)", Prints("okay")),
            ("(begin 1 2 3)", Prints("3")),
            // ===== DEFINE =====
            ("(define x 3)", Prints("x")),
            ("x", Prints("3")),
            ("(define x (+ x 1))", Prints("x")),
            ("x", Prints("4")),
            ("(define (square y) (* y y))", Prints("square")),
            ("(square 5)", Prints("25")),
            ("(define (variadic . args) args)", Prints("variadic")),
            ("(variadic 1 2 3)", Prints("(1 2 3)")),
            ("(define (fixed a b) (+ a b))", Prints("fixed")),
            ("(fixed 1)", Fails("too few arguments to procedure")),
            ("(fixed 1 2 3)", Fails("too many arguments to procedure")),
            ("(define 5 1)", Fails("bad argument to define")),
            ("(define y)", Fails("too few operands in form")),
            ("(define z 1 2)", Fails("too many operands in form")),
            // ===== LET =====
            ("(let ((a 1) (b 2)) (+ a b))", Prints("3")),
            ("(let ((a 1)) (define a 9) a)", Prints("9")),
            ("(let ((p 1) (q p)) q)", Fails("unknown identifier: p")),
            ("(let (bad) 1)", Fails("bad bindings list in let form")),
            ("(let ((a)) a)", Fails("bad bindings list in let form")),
            // ===== COND =====
            (
                "(cond ((= 1 2) 'a) ((= 1 1) 'b) (else 'c))",
                Prints("b"),
            ),
            ("(cond ((= 1 2) 'a) (else 'c))", Prints("c")),
            ("(cond (#f 1))", Prints("okay")),
            ("(cond (5))", Prints("5")),
            ("(cond (#t 1 2 3))", Prints("3")),
            ("(cond (else))", Fails("badly formed else clause")),
            ("(cond (else 1) (#t 2))", Fails("else must be last")),
            // ===== LAMBDA =====
            ("((lambda (n) (* n 2)) 21)", Prints("42")),
            ("((lambda args args) 1 2)", Prints("(1 2)")),
            ("(lambda (a a) a)", Fails("duplicate symbol: a")),
            ("(lambda (1) 1)", Fails("non-symbol: 1")),
            ("(lambda (a))", Fails("too few operands in form")),
            // ===== APPLICATION ERRORS =====
            (
                "(1 2)",
                Fails("attempt to call something of non-function type (integer)"),
            ),
            (
                "(\"s\")",
                Fails("attempt to call something of non-function type (string)"),
            ),
            ("(undefined-proc)", Fails("unknown identifier: undefined-proc")),
            ("(+ 1 . 2)", Fails("malformed list: (+ 1 . 2)")),
            // ===== RESERVED FORMS =====
            ("(set! x 1)", Fails("unknown identifier: set!")),
            // ===== EVAL / APPLY =====
            ("(eval '(+ 1 2))", Prints("3")),
            ("(eval ''sym)", Prints("sym")),
            ("(apply + '(1 2 3))", Prints("6")),
            ("(apply + (cons 1 2))", Fails("malformed list: (1 . 2)")),
            // ===== CLOSURES CAPTURE THEIR ENVIRONMENT =====
            ("(define (adder n) (lambda (k) (+ n k)))", Prints("adder")),
            ("((adder 10) 5)", Prints("15")),
        ];
        run_session(test_cases);
    }

    #[test]
    fn test_tail_calls_run_in_constant_stack() {
        let env = create_global_frame();
        eval_str(
            "(define (countdown n) (if (= n 0) 'done (countdown (- n 1))))",
            &env,
        )
        .unwrap();
        assert_eq!(
            format!("{}", eval_str("(countdown 20000)", &env).unwrap()),
            "done"
        );

        // Mutual recursion through tail position.
        eval_str("(define (ev? n) (if (= n 0) #t (od? (- n 1))))", &env).unwrap();
        eval_str("(define (od? n) (if (= n 0) #f (ev? (- n 1))))", &env).unwrap();
        assert_eq!(eval_str("(od? 10001)", &env).unwrap(), Value::from(true));

        // Tail position inside and/or/begin/cond bodies.
        eval_str(
            "(define (spin n) (and #t (if (= n 0) 'ok (begin 0 (spin (- n 1))))))",
            &env,
        )
        .unwrap();
        assert_eq!(format!("{}", eval_str("(spin 20000)", &env).unwrap()), "ok");
    }

    #[test]
    fn test_nested_recursion_is_bounded() {
        let env = create_global_frame();

        // Non-tail recursion just under the limit completes normally; the
        // limit must be reachable without exhausting the host stack.
        eval_str(
            "(define (sum n) (if (= n 0) 0 (+ 1 (sum (- n 1)))))",
            &env,
        )
        .unwrap();
        let near = crate::MAX_EVAL_DEPTH - 50;
        assert_eq!(
            eval_str(&format!("(sum {near})"), &env).unwrap(),
            Value::from(near as i64)
        );

        // Unbounded non-tail recursion is cut off with an error, not a crash.
        eval_str("(define (grow n) (+ 1 (grow n)))", &env).unwrap();
        assert_eq!(
            eval_str("(grow 0)", &env).unwrap_err(),
            Error::Eval("maximum recursion depth exceeded".into())
        );
        assert_eq!(
            eval_str("(sum 100000)", &env).unwrap_err(),
            Error::Eval("maximum recursion depth exceeded".into())
        );
    }

    #[test]
    fn test_mu_uses_dynamic_scope() {
        let env = create_global_frame();
        eval_str("(define dyn (mu () captured))", &env).unwrap();
        eval_str("(define (with-binding captured) (dyn))", &env).unwrap();
        assert_eq!(
            eval_str("(with-binding 42)", &env).unwrap(),
            Value::from(42)
        );

        // The lexical flavor cannot see the caller's bindings.
        eval_str("(define lex (lambda () captured))", &env).unwrap();
        eval_str("(define (with-binding2 captured) (lex))", &env).unwrap();
        assert_eq!(
            eval_str("(with-binding2 42)", &env).unwrap_err(),
            Error::Eval("unknown identifier: captured".into())
        );
    }

    #[test]
    fn test_nu_arguments_are_lazy_and_memoized() {
        let env = create_global_frame();

        // An unused argument is never evaluated.
        eval_str("(define lazy (nu (a) 5))", &env).unwrap();
        assert_eq!(
            eval_str("(lazy (undefined-variable))", &env).unwrap(),
            Value::from(5)
        );

        // A used argument is evaluated exactly once.
        eval_str("(define counter (cons 0 0))", &env).unwrap();
        eval_str(
            "(define (bump) (begin (set-car! counter (+ (car counter) 1)) (car counter)))",
            &env,
        )
        .unwrap();
        eval_str("(define twice (nu (a) (+ a a)))", &env).unwrap();
        assert_eq!(eval_str("(twice (bump))", &env).unwrap(), Value::from(2));
        assert_eq!(eval_str("(car counter)", &env).unwrap(), Value::from(1));
    }

    #[test]
    fn test_circular_structure_is_safe_to_inspect() {
        let env = create_global_frame();
        eval_str("(define lst (list 1 2))", &env).unwrap();
        eval_str("(set-cdr! (cdr lst) lst)", &env).unwrap();
        assert_eq!(eval_str("(list? lst)", &env).unwrap(), Value::from(false));
        assert_eq!(
            eval_str("(length lst)", &env).unwrap_err(),
            Error::Eval("length attempted on improper list".into())
        );
        let printed = format!("{}", eval_str("lst", &env).unwrap());
        assert!(printed.contains("..."), "got {printed}");
    }

    #[test]
    fn test_load_evaluates_file_into_global() {
        let path = std::env::temp_dir().join("schemer-load-test.scm");
        std::fs::write(&path, "(define loaded-value 99)\n(define (loaded-f x) (* x 2))\n")
            .unwrap();
        let env = create_global_frame();
        eval_str(&format!("(load \"{}\")", path.display()), &env).unwrap();
        assert_eq!(eval_str("loaded-value", &env).unwrap(), Value::from(99));
        assert_eq!(eval_str("(loaded-f 21)", &env).unwrap(), Value::from(42));

        let err = eval_str("(load \"no-such-file-anywhere\")", &env).unwrap_err();
        assert!(
            format!("{err}").starts_with("could not load no-such-file-anywhere"),
            "got {err}"
        );
    }

    #[test]
    fn test_define_result_is_the_symbol() {
        let env = create_global_frame();
        let result = eval_str("(define probe 1)", &env).unwrap();
        assert!(result.is_eq(&crate::value::sym("probe")));
    }
}
