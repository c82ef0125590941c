//! Final Type Checker (§4.7): a post-order pass over every class's
//! attributes and method bodies, building a fresh `Scope` as it goes and
//! checking each expression against the elaborated `Context`.
//!
//! `SELF_TYPE` is resolved to the enclosing class eagerly at every
//! expression site rather than carried as a marker through the tree: the
//! distilled contract only requires the marker to survive as far as return
//! position and dispatch's call-site substitution, both of which this pass
//! still honors, and collapsing the rest avoids threading a second "is this
//! secretly SELF_TYPE" flag through every join/conforms call for no
//! observable difference in accepted programs.

use tracing::debug;

use cool_parser::{BinOp, Expr, Program};

use crate::errors::SemanticError;
use crate::scope::{Scope, ScopeId, VariableInfo};
use crate::types::{self, Context, TypeId};

struct Checker<'a> {
    ctx: &'a Context,
    scope: Scope,
    object: TypeId,
    int_ty: TypeId,
    string_ty: TypeId,
    bool_ty: TypeId,
    error_ty: TypeId,
}

impl<'a> Checker<'a> {
    fn new(ctx: &'a Context) -> Checker<'a> {
        Checker {
            ctx,
            scope: Scope::new(),
            object: ctx.lookup(types::OBJECT).expect("Object is always installed"),
            int_ty: ctx.lookup(types::INT).expect("Int is always installed"),
            string_ty: ctx.lookup(types::STRING).expect("String is always installed"),
            bool_ty: ctx.lookup(types::BOOL).expect("Bool is always installed"),
            error_ty: ctx.lookup(types::ERROR).expect("Error is always installed"),
        }
    }

    /// `SELF_TYPE` only ever appears as a type *name*; resolve it to the
    /// class currently being checked wherever a concrete `TypeId` is needed.
    fn resolve_name(&self, class_id: TypeId, name: &str) -> TypeId {
        if name == types::SELF_TYPE {
            return class_id;
        }
        self.ctx.lookup(name).unwrap_or(self.error_ty)
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.ctx.get(ty).name.clone()
    }

    fn check_class(&mut self, class_id: TypeId, errors: &mut Vec<SemanticError>) {
        for attr in self.ctx.get(class_id).attributes.values() {
            let Some(init) = &attr.init else { continue };
            let scope_id = self.scope.child(self.scope.root());
            let init_ty = self.check_expr(init, class_id, &attr.name, scope_id, errors);
            let declared = self.resolve_name(class_id, &attr.type_name);
            if !self.ctx.conforms_to(init_ty, declared) {
                errors.push(SemanticError::TypeMismatch {
                    found: self.type_name(init_ty),
                    expected: attr.type_name.clone(),
                });
            }
        }

        for method in self.ctx.get(class_id).methods.values() {
            let scope_id = self.scope.child(self.scope.root());
            for (name, type_name) in &method.params {
                self.scope.define(scope_id, VariableInfo::new(name.clone(), type_name.clone()));
            }
            let body_ty = self.check_expr(&method.body, class_id, &method.name, scope_id, errors);
            let declared = self.resolve_name(class_id, &method.return_type);
            if !self.ctx.conforms_to(body_ty, declared) {
                errors.push(SemanticError::TypeMismatch {
                    found: self.type_name(body_ty),
                    expected: method.return_type.clone(),
                });
            }
        }
    }

    fn check_expr(
        &mut self,
        expr: &Expr,
        class_id: TypeId,
        method_name: &str,
        scope_id: ScopeId,
        errors: &mut Vec<SemanticError>,
    ) -> TypeId {
        match expr {
            Expr::Assign { name, value, .. } => {
                let value_ty = self.check_expr(value, class_id, method_name, scope_id, errors);
                let declared = self
                    .scope
                    .find_variable(scope_id, name)
                    .map(|info| info.type_name.clone())
                    .or_else(|| self.ctx.resolve_attribute(class_id, name).map(|a| a.type_name.clone()));
                match declared {
                    Some(declared_name) => {
                        let declared_ty = self.resolve_name(class_id, &declared_name);
                        if !self.ctx.conforms_to(value_ty, declared_ty) {
                            errors.push(SemanticError::TypeMismatch {
                                found: self.type_name(value_ty),
                                expected: declared_name,
                            });
                        }
                    }
                    None => errors.push(SemanticError::UndefinedVariable {
                        var: name.clone(),
                        method: method_name.to_string(),
                    }),
                }
                value_ty
            }
            Expr::Block { exprs, .. } => {
                let mut last = self.object;
                for e in exprs {
                    last = self.check_expr(e, class_id, method_name, scope_id, errors);
                }
                last
            }
            Expr::Let { bindings, body, .. } => {
                let child = self.scope.child(scope_id);
                for (name, type_name, init) in bindings {
                    if let Some(init_expr) = init {
                        let init_ty = self.check_expr(init_expr, class_id, method_name, child, errors);
                        let declared = self.resolve_name(class_id, type_name);
                        if !self.ctx.conforms_to(init_ty, declared) {
                            errors.push(SemanticError::TypeMismatch {
                                found: self.type_name(init_ty),
                                expected: type_name.clone(),
                            });
                        }
                    }
                    self.scope.define(child, VariableInfo::new(name.clone(), type_name.clone()));
                }
                self.check_expr(body, class_id, method_name, child, errors)
            }
            Expr::SwitchCase { scrutinee, branches, .. } => {
                self.check_expr(scrutinee, class_id, method_name, scope_id, errors);
                let mut branch_types = Vec::with_capacity(branches.len());
                for branch in branches {
                    if branch.type_name == types::SELF_TYPE {
                        errors.push(SemanticError::UnknownType {
                            type_name: types::SELF_TYPE.to_string(),
                        });
                    }
                    let child = self.scope.child(scope_id);
                    self.scope
                        .define(child, VariableInfo::new(branch.name.clone(), branch.type_name.clone()));
                    branch_types.push(self.check_expr(&branch.body, class_id, method_name, child, errors));
                }
                self.ctx.multi_join(&branch_types)
            }
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let cond_ty = self.check_expr(cond, class_id, method_name, scope_id, errors);
                if cond_ty != self.bool_ty {
                    errors.push(SemanticError::TypeMismatch {
                        found: self.type_name(cond_ty),
                        expected: types::BOOL.to_string(),
                    });
                }
                let then_ty = self.check_expr(then_branch, class_id, method_name, scope_id, errors);
                let else_ty = self.check_expr(else_branch, class_id, method_name, scope_id, errors);
                self.ctx.join(then_ty, else_ty)
            }
            Expr::While { cond, body, .. } => {
                let cond_ty = self.check_expr(cond, class_id, method_name, scope_id, errors);
                if cond_ty != self.bool_ty {
                    errors.push(SemanticError::TypeMismatch {
                        found: self.type_name(cond_ty),
                        expected: types::BOOL.to_string(),
                    });
                }
                self.check_expr(body, class_id, method_name, scope_id, errors);
                self.object
            }
            Expr::MethodCall {
                receiver,
                ancestor,
                method,
                args,
                ..
            } => {
                let obj_ty = match receiver {
                    Some(e) => self.check_expr(e, class_id, method_name, scope_id, errors),
                    None => class_id,
                };
                let lookup_ty = match ancestor {
                    Some(name) => {
                        let ancestor_ty = self.resolve_name(class_id, name);
                        if !self.ctx.contains(name) {
                            errors.push(SemanticError::UnknownType {
                                type_name: name.clone(),
                            });
                        } else if !self.ctx.conforms_to(obj_ty, ancestor_ty) {
                            errors.push(SemanticError::TypeMismatch {
                                found: self.type_name(obj_ty),
                                expected: name.clone(),
                            });
                        }
                        ancestor_ty
                    }
                    None => obj_ty,
                };

                let arg_types: Vec<TypeId> = args
                    .iter()
                    .map(|a| self.check_expr(a, class_id, method_name, scope_id, errors))
                    .collect();

                let Some((_, resolved)) = self.ctx.resolve_method(lookup_ty, method) else {
                    errors.push(SemanticError::UndefinedMethod {
                        method: method.clone(),
                        type_name: self.type_name(lookup_ty),
                    });
                    return self.error_ty;
                };
                // `resolve_method` borrows `ctx`; clone out what's needed so
                // the loop below can also call back into `self`.
                let params = resolved.params.clone();
                let return_type = resolved.return_type.clone();

                if params.len() != arg_types.len() {
                    errors.push(SemanticError::ArgumentCountMismatch {
                        method: method.clone(),
                        expected: params.len(),
                        found: arg_types.len(),
                    });
                }
                for ((_, param_type), &arg_ty) in params.iter().zip(&arg_types) {
                    let declared = self.resolve_name(class_id, param_type);
                    if !self.ctx.conforms_to(arg_ty, declared) {
                        errors.push(SemanticError::TypeMismatch {
                            found: self.type_name(arg_ty),
                            expected: param_type.clone(),
                        });
                    }
                }

                if return_type == types::SELF_TYPE {
                    obj_ty
                } else {
                    self.resolve_name(class_id, &return_type)
                }
            }
            Expr::Variable { name, .. } => {
                if name == "self" {
                    return class_id;
                }
                if let Some(info) = self.scope.find_variable(scope_id, name) {
                    return self.resolve_name(class_id, &info.type_name.clone());
                }
                if let Some(attr) = self.ctx.resolve_attribute(class_id, name) {
                    return self.resolve_name(class_id, &attr.type_name);
                }
                errors.push(SemanticError::UndefinedVariable {
                    var: name.clone(),
                    method: method_name.to_string(),
                });
                self.error_ty
            }
            Expr::Instantiate { type_name, .. } => {
                if type_name == types::SELF_TYPE {
                    return class_id;
                }
                if self.ctx.contains(type_name) {
                    self.ctx.lookup(type_name).expect("checked contains above")
                } else {
                    errors.push(SemanticError::UnknownType {
                        type_name: type_name.clone(),
                    });
                    self.error_ty
                }
            }
            Expr::Integer { .. } => self.int_ty,
            Expr::String { .. } => self.string_ty,
            Expr::Boolean { .. } => self.bool_ty,
            Expr::Negation { expr, .. } => {
                let ty = self.check_expr(expr, class_id, method_name, scope_id, errors);
                if ty != self.bool_ty {
                    errors.push(SemanticError::TypeMismatch {
                        found: self.type_name(ty),
                        expected: types::BOOL.to_string(),
                    });
                }
                self.bool_ty
            }
            Expr::Complement { expr, .. } => {
                let ty = self.check_expr(expr, class_id, method_name, scope_id, errors);
                if ty != self.int_ty {
                    errors.push(SemanticError::TypeMismatch {
                        found: self.type_name(ty),
                        expected: types::INT.to_string(),
                    });
                }
                self.int_ty
            }
            Expr::IsVoid { expr, .. } => {
                self.check_expr(expr, class_id, method_name, scope_id, errors);
                self.bool_ty
            }
            Expr::Binary { op, left, right, .. } => {
                let l = self.check_expr(left, class_id, method_name, scope_id, errors);
                let r = self.check_expr(right, class_id, method_name, scope_id, errors);
                match op {
                    BinOp::Equal => self.bool_ty,
                    BinOp::Plus | BinOp::Minus | BinOp::Star | BinOp::Div => {
                        self.require_int_operands(op, l, r, errors);
                        self.int_ty
                    }
                    BinOp::LessThan | BinOp::LessEqual => {
                        self.require_int_operands(op, l, r, errors);
                        self.bool_ty
                    }
                }
            }
        }
    }

    fn require_int_operands(&self, op: &BinOp, l: TypeId, r: TypeId, errors: &mut Vec<SemanticError>) {
        if l != self.int_ty || r != self.int_ty {
            errors.push(SemanticError::UndefinedOperation {
                op: op_symbol(op).to_string(),
                lhs: self.type_name(l),
                rhs: self.type_name(r),
            });
        }
    }
}

fn op_symbol(op: &BinOp) -> &'static str {
    match op {
        BinOp::Plus => "+",
        BinOp::Minus => "-",
        BinOp::Star => "*",
        BinOp::Div => "/",
        BinOp::LessThan => "<",
        BinOp::LessEqual => "<=",
        BinOp::Equal => "=",
    }
}

/// Type-checks every class's attributes and method bodies against the
/// elaborated `Context`, returning the `Scope` tree built along the way.
pub fn type_check(program: &Program, ctx: &Context, errors: &mut Vec<SemanticError>) -> Scope {
    let mut checker = Checker::new(ctx);
    for class in &program.classes {
        let Some(class_id) = ctx.lookup(&class.name) else { continue };
        checker.check_class(class_id, errors);
    }
    debug!(classes = program.classes.len(), "type checker processed classes");
    checker.scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use crate::collect::collect;
    use crate::infer::infer;
    use crate::overrides::check_overrides;
    use crate::topo::topological_sort;
    use cool_lexer::Lexer;

    fn run(src: &str) -> Vec<SemanticError> {
        let (tokens, _) = Lexer::tokenize(src);
        let (mut program, _) = cool_parser::parse(&tokens).unwrap();
        let mut errors = Vec::new();
        let mut ctx = collect(&program, &mut errors);
        build(&program, &mut ctx, &mut errors);
        topological_sort(&mut program, &mut ctx, &mut errors);
        check_overrides(&program, &ctx, &mut errors);
        infer(&mut program, &mut ctx, &mut errors);
        type_check(&program, &ctx, &mut errors);
        errors
    }

    #[test]
    fn well_typed_program_has_no_errors() {
        let errors = run("class Main { main(): Int { 1 + 2 * 3 }; };");
        assert!(errors.is_empty());
    }

    #[test]
    fn arithmetic_on_string_is_an_operation_error() {
        let errors = run("class Main { main(): Int { \"x\" + 1 }; };");
        assert_eq!(
            errors,
            vec![SemanticError::UndefinedOperation {
                op: "+".into(),
                lhs: "String".into(),
                rhs: "Int".into(),
            }]
        );
    }

    #[test]
    fn conditional_result_is_the_join_of_its_branches() {
        let errors = run(
            "class A {}; class B inherits A {};
             class Main { main(): A { if true then new A else new B fi }; };",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn undefined_variable_is_reported() {
        let errors = run("class Main { main(): Int { y }; };");
        assert_eq!(
            errors,
            vec![SemanticError::UndefinedVariable {
                var: "y".into(),
                method: "main".into(),
            }]
        );
    }

    #[test]
    fn dispatch_argument_count_mismatch_is_reported() {
        let errors = run(
            "class Main { f(x: Int): Int { x }; main(): Int { f(1, 2) }; };",
        );
        assert_eq!(
            errors,
            vec![SemanticError::ArgumentCountMismatch {
                method: "f".into(),
                expected: 1,
                found: 2,
            }]
        );
    }

    #[test]
    fn self_type_return_resolves_to_call_site_type() {
        let errors = run(
            "class Main {
                make(): SELF_TYPE { new SELF_TYPE };
                main(): Main { make() };
            };",
        );
        assert!(errors.is_empty());
    }
}
