//! Built-in method bodies. Built-in methods have no COOL-level body to
//! walk (`Context::builtin_method` stubs one in only so type-checking has
//! something to look at); the evaluator special-cases dispatch on them
//! before it ever consults `Method::body`.

use cool_sema::types::Context;

use crate::error::ExecutionError;
use crate::instance::{self, Payload, Value};
use crate::io::CoolIo;

/// True iff `(owner_class_name, method)` names one of the nine built-ins,
/// i.e. whether dispatch on it should skip the COOL-level body entirely.
pub fn is_builtin(owner_class_name: &str, method: &str) -> bool {
    matches!(
        (owner_class_name, method),
        (cool_sema::types::OBJECT, "abort")
            | (cool_sema::types::OBJECT, "copy")
            | (cool_sema::types::OBJECT, "type_name")
            | (cool_sema::types::IO, "out_string")
            | (cool_sema::types::IO, "out_int")
            | (cool_sema::types::IO, "in_string")
            | (cool_sema::types::IO, "in_int")
            | (cool_sema::types::STRING, "length")
            | (cool_sema::types::STRING, "concat")
            | (cool_sema::types::STRING, "substr")
    )
}

pub fn call_builtin(
    ctx: &Context,
    io: &mut dyn CoolIo,
    receiver: &Value,
    method: &str,
    args: &[Value],
    receiver_context: &str,
) -> Result<Value, ExecutionError> {
    let receiver_inst = receiver.as_instance().ok_or_else(|| ExecutionError::VoidReference {
        context: receiver_context.to_string(),
    })?;

    match method {
        "abort" => {
            let class_name = ctx.get(receiver_inst.borrow().class).name.clone();
            io.write_str(&format!("Abort called from class {class_name}\n"));
            Err(ExecutionError::Abort { class_name })
        }
        "type_name" => {
            let class_name = ctx.get(receiver_inst.borrow().class).name.clone();
            Ok(instance::new_string(ctx, class_name))
        }
        "copy" => Ok(copy_instance(ctx, receiver)),
        "out_string" => {
            io.write_str(&instance::as_str(&args[0]));
            Ok(receiver.clone())
        }
        "out_int" => {
            io.write_str(&instance::as_int(&args[0]).to_string());
            Ok(receiver.clone())
        }
        "in_string" => Ok(instance::new_string(ctx, io.read_line().unwrap_or_default())),
        "in_int" => {
            let line = io.read_line().ok_or(ExecutionError::InputError)?;
            let value: i64 = line.trim().parse().map_err(|_| ExecutionError::InputError)?;
            Ok(instance::new_int(ctx, value))
        }
        "length" => {
            let s = instance::as_str(receiver);
            Ok(instance::new_int(ctx, s.chars().count() as i64))
        }
        "concat" => {
            let mut s = instance::as_str(receiver);
            s.push_str(&instance::as_str(&args[0]));
            Ok(instance::new_string(ctx, s))
        }
        "substr" => {
            let s: Vec<char> = instance::as_str(receiver).chars().collect();
            let i = instance::as_int(&args[0]);
            let l = instance::as_int(&args[1]);
            if i < 0 || l < 0 || i + l > s.len() as i64 {
                return Err(ExecutionError::SubstrOutOfRange);
            }
            let out: String = s[i as usize..(i + l) as usize].iter().collect();
            Ok(instance::new_string(ctx, out))
        }
        _ => unreachable!("is_builtin gates call_builtin to the nine known methods"),
    }
}

fn copy_instance(ctx: &Context, receiver: &Value) -> Value {
    let Some(inst) = receiver.as_instance() else {
        return Value::Void;
    };
    let inst = inst.borrow();
    let payload = inst.payload.clone();
    let attributes = inst
        .attributes
        .iter()
        .map(|(name, value)| (name.clone(), copy_value(ctx, value)))
        .collect();
    Value::Object(std::rc::Rc::new(std::cell::RefCell::new(crate::instance::Instance {
        class: inst.class,
        payload,
        attributes,
    })))
}

/// `Int`/`Bool` copy by value, `String` gets an independent instance,
/// everything else shares the existing reference (COOL has no mutable
/// reference types, so aliasing an attribute's object is unobservable).
fn copy_value(ctx: &Context, value: &Value) -> Value {
    match value {
        Value::Void => Value::Void,
        Value::Object(inst) => match &inst.borrow().payload {
            Payload::Int(v) => instance::new_int(ctx, *v),
            Payload::Bool(v) => instance::new_bool(ctx, *v),
            Payload::Str(v) => instance::new_string(ctx, v.clone()),
            Payload::None => value.clone(),
        },
    }
}
