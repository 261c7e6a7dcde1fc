//! Environment frames.
//!
//! A [`Frame`] binds symbols to values and chains to an optional parent.
//! Frames are shared handles: closures capture their definition frame, call
//! frames extend it, and `define` mutates bindings in place. Lookup walks
//! out the parent chain; definitions always land in the receiving frame, so
//! inner definitions shadow outer ones.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::Error;
use crate::symbol::Symbol;
use crate::value::Value;

/// A shared handle to one environment frame.
#[derive(Clone)]
pub struct Frame(Rc<FrameData>);

struct FrameData {
    bindings: RefCell<HashMap<Symbol, Value>>,
    parent: Option<Frame>,
}

impl Frame {
    /// An empty frame with PARENT (None for the global frame).
    pub fn new(parent: Option<Frame>) -> Frame {
        Frame(Rc::new(FrameData {
            bindings: RefCell::new(HashMap::new()),
            parent,
        }))
    }

    /// Bind SYMBOL to VALUE in this frame, shadowing any outer binding.
    pub fn define(&self, symbol: Symbol, value: Value) {
        self.0.bindings.borrow_mut().insert(symbol, value);
    }

    /// The value bound to SYMBOL in this frame or the nearest enclosing one.
    pub fn lookup(&self, symbol: Symbol) -> Result<Value, Error> {
        let mut frame = Some(self.clone());
        while let Some(f) = frame {
            if let Some(value) = f.0.bindings.borrow().get(&symbol) {
                return Ok(value.clone());
            }
            frame = f.0.parent.clone();
        }
        Err(Error::Eval(format!("unknown identifier: {symbol}")))
    }

    /// The global environment at the root of the parent chain.
    pub fn global_frame(&self) -> Frame {
        let mut frame = self.clone();
        while let Some(parent) = frame.0.parent.clone() {
            frame = parent;
        }
        frame
    }

    /// A new child frame binding FORMALS positionally to VALS. A dotted tail
    /// symbol collects the remaining values as a list; otherwise the counts
    /// must match exactly.
    pub fn make_call_frame(&self, formals: &Value, vals: Vec<Value>) -> Result<Frame, Error> {
        let frame = Frame::new(Some(self.clone()));
        let mut formals = formals.clone();
        let mut vals = vals.into_iter();
        loop {
            match formals {
                Value::Nil => {
                    if vals.next().is_some() {
                        return Err(Error::Eval("too many arguments to procedure".into()));
                    }
                    return Ok(frame);
                }
                Value::Symbol(rest_name) => {
                    let rest: Vec<Value> = vals.collect();
                    frame.define(rest_name, Value::list_from_slice(&rest));
                    return Ok(frame);
                }
                Value::Pair(p) => {
                    let Value::Symbol(name) = p.first() else {
                        return Err(Error::Eval(format!(
                            "invalid formal parameter: {}",
                            p.first()
                        )));
                    };
                    let Some(value) = vals.next() else {
                        return Err(Error::Eval("too few arguments to procedure".into()));
                    };
                    frame.define(name, value);
                    formals = p.second();
                }
                other => {
                    return Err(Error::Eval(format!(
                        "invalid formal parameter list: {other}"
                    )));
                }
            }
        }
    }

    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::intern;
    use crate::value::sym;

    #[test]
    fn test_lookup_walks_parents() {
        let global = Frame::new(None);
        global.define(intern("x"), Value::from(1));
        let child = Frame::new(Some(global.clone()));

        assert_eq!(child.lookup(intern("x")).unwrap(), Value::from(1));
        let err = child.lookup(intern("missing")).unwrap_err();
        assert_eq!(err, Error::Eval("unknown identifier: missing".into()));
    }

    #[test]
    fn test_define_shadows_locally() {
        let global = Frame::new(None);
        global.define(intern("x"), Value::from(1));
        let child = Frame::new(Some(global.clone()));
        child.define(intern("x"), Value::from(2));

        assert_eq!(child.lookup(intern("x")).unwrap(), Value::from(2));
        assert_eq!(global.lookup(intern("x")).unwrap(), Value::from(1));
    }

    #[test]
    fn test_global_frame_finds_root() {
        let global = Frame::new(None);
        let middle = Frame::new(Some(global.clone()));
        let leaf = Frame::new(Some(middle));
        assert!(leaf.global_frame().ptr_eq(&global));
    }

    #[test]
    fn test_make_call_frame_exact() {
        let global = Frame::new(None);
        let formals = Value::list_from_slice(&[sym("a"), sym("b")]);
        let frame = global
            .make_call_frame(&formals, vec![Value::from(1), Value::from(2)])
            .unwrap();
        assert_eq!(frame.lookup(intern("a")).unwrap(), Value::from(1));
        assert_eq!(frame.lookup(intern("b")).unwrap(), Value::from(2));

        assert!(global.make_call_frame(&formals, vec![Value::from(1)]).is_err());
        assert!(
            global
                .make_call_frame(
                    &formals,
                    vec![Value::from(1), Value::from(2), Value::from(3)]
                )
                .is_err()
        );
    }

    #[test]
    fn test_make_call_frame_dotted_tail() {
        let global = Frame::new(None);
        let formals = Value::cons(sym("a"), sym("rest"));
        let frame = global
            .make_call_frame(
                &formals,
                vec![Value::from(1), Value::from(2), Value::from(3)],
            )
            .unwrap();
        assert_eq!(frame.lookup(intern("a")).unwrap(), Value::from(1));
        assert_eq!(
            frame.lookup(intern("rest")).unwrap(),
            Value::list_from_slice(&[Value::from(2), Value::from(3)])
        );

        // Bare symbol formals collect everything.
        let all = global
            .make_call_frame(&sym("args"), vec![Value::from(7)])
            .unwrap();
        assert_eq!(
            all.lookup(intern("args")).unwrap(),
            Value::list_from_slice(&[Value::from(7)])
        );
    }
}
