//! The tree-walking evaluator. Dispatch recurses with the callee's `self`
//! passed down as an ordinary parameter, so the "call stack of current
//! instances" the evaluator needs is just Rust's own call stack: when a
//! nested dispatch returns, the caller's `self_val` local is still sitting
//! right there, unchanged.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use cool_parser::{BinOp, Expr};
use cool_sema::types::{self, Context, TypeId};

use crate::builtins;
use crate::error::ExecutionError;
use crate::instance::{self, Instance, Payload, Value};
use crate::io::CoolIo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameId(usize);

struct Frame {
    parent: Option<FrameId>,
    vars: FxHashMap<String, Value>,
}

/// A call-stack-shaped scope over runtime `Value`s, distinct from
/// `cool_sema::Scope`: a fresh one is built per method dispatch rather
/// than walking the static scope tree the type checker produced.
pub struct EvalScope {
    frames: Vec<Frame>,
}

impl EvalScope {
    pub fn new() -> EvalScope {
        EvalScope {
            frames: vec![Frame {
                parent: None,
                vars: FxHashMap::default(),
            }],
        }
    }

    pub fn root(&self) -> FrameId {
        FrameId(0)
    }

    pub fn child(&mut self, parent: FrameId) -> FrameId {
        let id = FrameId(self.frames.len());
        self.frames.push(Frame {
            parent: Some(parent),
            vars: FxHashMap::default(),
        });
        id
    }

    pub fn define(&mut self, frame: FrameId, name: impl Into<String>, value: Value) {
        self.frames[frame.0].vars.insert(name.into(), value);
    }

    pub fn lookup(&self, frame: FrameId, name: &str) -> Option<Value> {
        let mut cur = Some(frame);
        while let Some(f) = cur {
            let frame = &self.frames[f.0];
            if let Some(v) = frame.vars.get(name) {
                return Some(v.clone());
            }
            cur = frame.parent;
        }
        None
    }

    /// Walks up from `frame` looking for the nearest binding of `name` and
    /// overwrites it in place. Returns `false` if nothing bound it (the
    /// caller then falls back to an attribute assignment).
    pub fn assign(&mut self, frame: FrameId, name: &str, value: Value) -> bool {
        let mut cur = Some(frame);
        while let Some(f) = cur {
            if self.frames[f.0].vars.contains_key(name) {
                self.frames[f.0].vars.insert(name.to_string(), value);
                return true;
            }
            cur = self.frames[f.0].parent;
        }
        false
    }
}

impl Default for EvalScope {
    fn default() -> Self {
        EvalScope::new()
    }
}

pub struct Evaluator<'a> {
    ctx: &'a Context,
    io: &'a mut dyn CoolIo,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: &'a Context, io: &'a mut dyn CoolIo) -> Evaluator<'a> {
        Evaluator { ctx, io }
    }

    /// `new T`/`new SELF_TYPE`: allocates the instance and runs every
    /// visible attribute's initializer in declaration order (ancestors
    /// first), with `self` bound to the instance under construction so
    /// later initializers can already see earlier ones.
    pub fn instantiate(&mut self, class_id: TypeId) -> Result<Value, ExecutionError> {
        let class_name = self.ctx.get(class_id).name.clone();
        if class_name == types::INT || class_name == types::STRING || class_name == types::BOOL {
            return Ok(instance::default_value(self.ctx, &class_name));
        }

        let attrs: Vec<(String, String, Option<Expr>)> = self
            .ctx
            .all_attributes(class_id)
            .into_iter()
            .map(|a| (a.name.clone(), a.type_name.clone(), a.init.clone()))
            .collect();

        let inst = Rc::new(RefCell::new(Instance {
            class: class_id,
            payload: Payload::None,
            attributes: FxHashMap::default(),
        }));
        let self_val = Value::Object(inst.clone());

        for (name, type_name, init) in attrs {
            let value = match init {
                Some(init_expr) => {
                    let mut scope = EvalScope::new();
                    let root = scope.root();
                    self.eval_expr(&init_expr, &self_val, &mut scope, root)?
                }
                None => instance::default_value(self.ctx, &type_name),
            };
            inst.borrow_mut().attributes.insert(name, value);
        }

        Ok(self_val)
    }

    pub fn eval_expr(
        &mut self,
        expr: &Expr,
        self_val: &Value,
        scope: &mut EvalScope,
        frame: FrameId,
    ) -> Result<Value, ExecutionError> {
        match expr {
            Expr::Assign { name, value, .. } => {
                let v = self.eval_expr(value, self_val, scope, frame)?;
                if !scope.assign(frame, name, v.clone()) {
                    if let Some(inst) = self_val.as_instance() {
                        inst.borrow_mut().attributes.insert(name.clone(), v.clone());
                    }
                }
                Ok(v)
            }
            Expr::Block { exprs, .. } => {
                let mut last = Value::Void;
                for e in exprs {
                    last = self.eval_expr(e, self_val, scope, frame)?;
                }
                Ok(last)
            }
            Expr::Let { bindings, body, .. } => {
                let child = scope.child(frame);
                for (name, type_name, init) in bindings {
                    let value = match init {
                        Some(e) => self.eval_expr(e, self_val, scope, child)?,
                        None => instance::default_value(self.ctx, type_name),
                    };
                    scope.define(child, name.clone(), value);
                }
                self.eval_expr(body, self_val, scope, child)
            }
            Expr::SwitchCase { scrutinee, branches, .. } => {
                let scrutinee_val = self.eval_expr(scrutinee, self_val, scope, frame)?;
                let Some(dynamic_ty) = scrutinee_val.class_of() else {
                    return Err(ExecutionError::VoidReference {
                        context: "case".to_string(),
                    });
                };

                let mut cur = Some(dynamic_ty);
                let mut chosen = None;
                while let Some(c) = cur {
                    if let Some(branch) = branches
                        .iter()
                        .find(|b| self.ctx.lookup(&b.type_name) == Some(c))
                    {
                        chosen = Some(branch);
                        break;
                    }
                    cur = self.ctx.get(c).parent;
                }
                let Some(branch) = chosen else {
                    return Err(ExecutionError::NoBranchMatches);
                };

                let child = scope.child(frame);
                scope.define(child, branch.name.clone(), scrutinee_val);
                self.eval_expr(&branch.body, self_val, scope, child)
            }
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = instance::as_bool(&self.eval_expr(cond, self_val, scope, frame)?);
                if cond {
                    self.eval_expr(then_branch, self_val, scope, frame)
                } else {
                    self.eval_expr(else_branch, self_val, scope, frame)
                }
            }
            Expr::While { cond, body, .. } => {
                while instance::as_bool(&self.eval_expr(cond, self_val, scope, frame)?) {
                    self.eval_expr(body, self_val, scope, frame)?;
                }
                Ok(Value::Void)
            }
            Expr::MethodCall {
                receiver,
                ancestor,
                method,
                args,
                ..
            } => self.eval_call(
                receiver.as_deref(),
                ancestor.as_deref(),
                method,
                args,
                self_val,
                scope,
                frame,
            ),
            Expr::Variable { name, .. } => {
                if name == "self" {
                    return Ok(self_val.clone());
                }
                if let Some(v) = scope.lookup(frame, name) {
                    return Ok(v);
                }
                if let Some(inst) = self_val.as_instance() {
                    if let Some(v) = inst.borrow().attributes.get(name) {
                        return Ok(v.clone());
                    }
                }
                panic!("undefined variable \"{name}\" reached the evaluator unchecked");
            }
            Expr::Instantiate { type_name, .. } => {
                let class_id = if type_name == types::SELF_TYPE {
                    self_val
                        .class_of()
                        .expect("new SELF_TYPE dispatched on a void self")
                } else {
                    self.ctx
                        .lookup(type_name)
                        .expect("unknown type name reached the evaluator unchecked")
                };
                self.instantiate(class_id)
            }
            Expr::Integer { value, .. } => Ok(instance::new_int(self.ctx, *value)),
            Expr::String { value, .. } => Ok(instance::new_string(self.ctx, value.clone())),
            Expr::Boolean { value, .. } => Ok(instance::new_bool(self.ctx, *value)),
            Expr::Negation { expr, .. } => {
                let v = self.eval_expr(expr, self_val, scope, frame)?;
                Ok(instance::new_bool(self.ctx, !instance::as_bool(&v)))
            }
            Expr::Complement { expr, .. } => {
                let v = self.eval_expr(expr, self_val, scope, frame)?;
                Ok(instance::new_int(self.ctx, -instance::as_int(&v)))
            }
            Expr::IsVoid { expr, .. } => {
                let v = self.eval_expr(expr, self_val, scope, frame)?;
                Ok(instance::new_bool(self.ctx, v.is_void()))
            }
            Expr::Binary { op, left, right, .. } => {
                let l = self.eval_expr(left, self_val, scope, frame)?;
                let r = self.eval_expr(right, self_val, scope, frame)?;
                self.eval_binary(op, &l, &r)
            }
        }
    }

    fn eval_binary(&self, op: &BinOp, l: &Value, r: &Value) -> Result<Value, ExecutionError> {
        match op {
            BinOp::Equal => Ok(instance::new_bool(self.ctx, l == r)),
            BinOp::Plus => Ok(instance::new_int(self.ctx, instance::as_int(l) + instance::as_int(r))),
            BinOp::Minus => Ok(instance::new_int(self.ctx, instance::as_int(l) - instance::as_int(r))),
            BinOp::Star => Ok(instance::new_int(self.ctx, instance::as_int(l) * instance::as_int(r))),
            BinOp::Div => {
                let rhs = instance::as_int(r);
                if rhs == 0 {
                    return Err(ExecutionError::ZeroDivision);
                }
                Ok(instance::new_int(self.ctx, instance::as_int(l) / rhs))
            }
            BinOp::LessThan => Ok(instance::new_bool(self.ctx, instance::as_int(l) < instance::as_int(r))),
            BinOp::LessEqual => Ok(instance::new_bool(self.ctx, instance::as_int(l) <= instance::as_int(r))),
        }
    }

    fn eval_call(
        &mut self,
        receiver: Option<&Expr>,
        ancestor: Option<&str>,
        method: &str,
        args: &[Expr],
        self_val: &Value,
        scope: &mut EvalScope,
        frame: FrameId,
    ) -> Result<Value, ExecutionError> {
        let obj_val = match receiver {
            Some(e) => self.eval_expr(e, self_val, scope, frame)?,
            None => self_val.clone(),
        };
        if obj_val.is_void() {
            return Err(ExecutionError::VoidReference {
                context: method.to_string(),
            });
        }

        let mut arg_vals = Vec::with_capacity(args.len());
        for a in args {
            arg_vals.push(self.eval_expr(a, self_val, scope, frame)?);
        }

        let lookup_ty = match ancestor {
            Some(name) => self.ctx.lookup(name).expect("@Ancestor resolved by typeck"),
            None => obj_val.class_of().expect("checked non-void above"),
        };

        let (owner_ty, method_ref) = self
            .ctx
            .resolve_method(lookup_ty, method)
            .expect("dispatch target resolved by typeck");
        let owner_name = self.ctx.get(owner_ty).name.clone();

        if builtins::is_builtin(&owner_name, method) {
            return builtins::call_builtin(self.ctx, self.io, &obj_val, method, &arg_vals, method);
        }

        let mut call_scope = EvalScope::new();
        let root = call_scope.root();
        for ((param_name, _), arg_val) in method_ref.params.iter().zip(arg_vals) {
            call_scope.define(root, param_name.clone(), arg_val);
        }
        self.eval_expr(&method_ref.body, &obj_val, &mut call_scope, root)
    }
}

/// Finds `Main.main` and runs it, failing with `MainClassNotFound`/
/// `MainMethodNotFound` if either is missing.
pub fn run(ctx: &Context, io: &mut dyn CoolIo) -> Result<Value, ExecutionError> {
    let main_class = ctx.lookup("Main").ok_or(ExecutionError::MainClassNotFound)?;
    if ctx.resolve_method(main_class, "main").is_none() {
        return Err(ExecutionError::MainMethodNotFound);
    }

    let mut evaluator = Evaluator::new(ctx, io);
    let main_instance = evaluator.instantiate(main_class)?;
    debug!("evaluator dispatching Main.main");
    let mut scope = EvalScope::new();
    let root = scope.root();
    evaluator.eval_call(None, None, "main", &[], &main_instance, &mut scope, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MockIo;
    use cool_lexer::Lexer;

    fn run_source(src: &str) -> (Result<Value, ExecutionError>, String) {
        let (tokens, _) = Lexer::tokenize(src);
        let mut program = cool_parser::parse(&tokens).unwrap().0;
        let (ctx, _, errors) = cool_sema::analyze(&mut program);
        assert!(errors.is_empty(), "unexpected semantic errors: {errors:?}");
        let mut io = MockIo::default();
        let result = run(&ctx, &mut io);
        (result, io.output)
    }

    #[test]
    fn hello_world_prints_to_io() {
        let (result, output) = run_source(
            "class Main inherits IO {
                main(): Object { out_string(\"Hello, World.\\n\") };
            };",
        );
        assert!(result.is_ok());
        assert_eq!(output, "Hello, World.\n");
    }

    #[test]
    fn arithmetic_precedence_matches_expected_value() {
        let (result, _) = run_source("class Main { main(): Int { 1 + 2 * 3 }; };");
        assert_eq!(instance::as_int(&result.unwrap()), 7);
    }

    #[test]
    fn case_selects_most_specific_branch() {
        let (result, output) = run_source(
            "class A inherits IO {};
             class B inherits A {};
             class Main inherits IO {
                main(): Object {
                    let x: A <- new B in
                        case x of
                            a: A => out_string(\"A\");
                            b: B => out_string(\"B\");
                        esac
                };
             };",
        );
        assert!(result.is_ok());
        assert_eq!(output, "B");
    }

    #[test]
    fn division_by_zero_raises_execution_error() {
        let (result, _) = run_source("class Main { main(): Int { 1 / 0 }; };");
        assert_eq!(result.unwrap_err(), ExecutionError::ZeroDivision);
    }

    #[test]
    fn dispatch_on_void_raises_void_reference_error() {
        let (result, _) = run_source(
            "class Main { x: Main; main(): Object { x.main() }; };",
        );
        assert!(matches!(result, Err(ExecutionError::VoidReference { .. })));
    }

    #[test]
    fn new_self_type_instantiates_dynamic_class() {
        let (result, _) = run_source(
            "class A { make(): SELF_TYPE { new SELF_TYPE }; };
             class B inherits A {};
             class Main inherits IO {
                main(): Object {
                    let b: B <- new B in
                        out_string(b.make().type_name())
                };
             };",
        );
        assert!(result.is_ok());
    }
}
