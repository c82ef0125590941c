//! Runtime objects. COOL instances are reference types: assigning a
//! variable or passing an argument shares the same underlying object, so
//! `Instance` lives behind an `Rc<RefCell<_>>` rather than being cloned on
//! every bind.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use cool_sema::types::{Context, TypeId};

/// The native payload `Int`, `String`, and `Bool` instances carry. User
/// classes (and `Object`/`IO`) have no payload of their own; their state
/// lives entirely in `attributes`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Int(i64),
    Str(String),
    Bool(bool),
}

#[derive(Debug)]
pub struct Instance {
    /// The *dynamic* class: the actual class `new` was called with, never
    /// `SELF_TYPE` (that marker is resolved before an `Instance` exists).
    pub class: TypeId,
    pub payload: Payload,
    pub attributes: rustc_hash::FxHashMap<String, Value>,
}

pub type InstanceRef = Rc<RefCell<Instance>>;

/// A COOL value: either `void` or a live object reference.
#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Object(InstanceRef),
}

impl Value {
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn as_instance(&self) -> Option<&InstanceRef> {
        match self {
            Value::Object(inst) => Some(inst),
            Value::Void => None,
        }
    }

    pub fn class_of(&self) -> Option<TypeId> {
        self.as_instance().map(|inst| inst.borrow().class)
    }
}

impl PartialEq for Value {
    /// COOL's `=` operator: void equals void, native payloads compare by
    /// value, everything else compares by reference identity.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Void, Value::Object(_)) | (Value::Object(_), Value::Void) => false,
            (Value::Object(a), Value::Object(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                match (&a.borrow().payload, &b.borrow().payload) {
                    (Payload::Int(x), Payload::Int(y)) => x == y,
                    (Payload::Str(x), Payload::Str(y)) => x == y,
                    (Payload::Bool(x), Payload::Bool(y)) => x == y,
                    _ => false,
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Object(inst) => match &inst.borrow().payload {
                Payload::Int(v) => write!(f, "{v}"),
                Payload::Str(v) => write!(f, "{v}"),
                Payload::Bool(v) => write!(f, "{v}"),
                Payload::None => write!(f, "<object>"),
            },
        }
    }
}

pub fn new_int(ctx: &Context, v: i64) -> Value {
    let class = ctx.lookup(cool_sema::types::INT).expect("Int is always installed");
    Value::Object(Rc::new(RefCell::new(Instance {
        class,
        payload: Payload::Int(v),
        attributes: rustc_hash::FxHashMap::default(),
    })))
}

pub fn new_string(ctx: &Context, v: impl Into<String>) -> Value {
    let class = ctx.lookup(cool_sema::types::STRING).expect("String is always installed");
    Value::Object(Rc::new(RefCell::new(Instance {
        class,
        payload: Payload::Str(v.into()),
        attributes: rustc_hash::FxHashMap::default(),
    })))
}

pub fn new_bool(ctx: &Context, v: bool) -> Value {
    let class = ctx.lookup(cool_sema::types::BOOL).expect("Bool is always installed");
    Value::Object(Rc::new(RefCell::new(Instance {
        class,
        payload: Payload::Bool(v),
        attributes: rustc_hash::FxHashMap::default(),
    })))
}

/// Extracts the native `i64` a well-typed `Int` instance carries. Panics if
/// `value` is not an `Int` instance, which the type checker guarantees
/// never happens for a well-typed program.
pub fn as_int(value: &Value) -> i64 {
    match value.as_instance().map(|i| i.borrow()) {
        Some(inst) => match inst.payload {
            Payload::Int(v) => v,
            _ => panic!("as_int called on a non-Int instance"),
        },
        None => panic!("as_int called on void"),
    }
}

pub fn as_str(value: &Value) -> String {
    match value.as_instance().map(|i| i.borrow()) {
        Some(inst) => match &inst.payload {
            Payload::Str(v) => v.clone(),
            _ => panic!("as_str called on a non-String instance"),
        },
        None => panic!("as_str called on void"),
    }
}

pub fn as_bool(value: &Value) -> bool {
    match value.as_instance().map(|i| i.borrow()) {
        Some(inst) => match inst.payload {
            Payload::Bool(v) => v,
            _ => panic!("as_bool called on a non-Bool instance"),
        },
        None => panic!("as_bool called on void"),
    }
}

/// The attribute default for a declared type when no initializer runs:
/// `0` for `Int`, `""` for `String`, `false` for `Bool`, `void` otherwise.
pub fn default_value(ctx: &Context, type_name: &str) -> Value {
    match type_name {
        cool_sema::types::INT => new_int(ctx, 0),
        cool_sema::types::STRING => new_string(ctx, ""),
        cool_sema::types::BOOL => new_bool(ctx, false),
        _ => Value::Void,
    }
}
