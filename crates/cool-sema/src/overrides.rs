//! Overridden-method checker (§4.7): every method that shadows an
//! ancestor's method of the same name must keep its arity, parameter
//! types, and return type; attributes may never be redeclared at all.

use tracing::debug;

use cool_parser::Program;

use crate::errors::SemanticError;
use crate::types::Context;

pub fn check_overrides(program: &Program, ctx: &Context, errors: &mut Vec<SemanticError>) {
    for class in &program.classes {
        let Some(id) = ctx.lookup(&class.name) else { continue };
        let ty = ctx.get(id);
        let Some(parent) = ty.parent else { continue };

        for (name, attr) in &ty.attributes {
            if ctx.resolve_attribute(parent, name).is_some() {
                let _ = attr;
                errors.push(SemanticError::OverrideAttribute {
                    class: class.name.clone(),
                    attr: name.clone(),
                });
            }
        }

        for (name, method) in &ty.methods {
            if let Some((_, ancestor_method)) = ctx.resolve_method(parent, name) {
                if !method.same_signature(ancestor_method) {
                    errors.push(SemanticError::OverrideMethodSignature {
                        class: class.name.clone(),
                        method: name.clone(),
                    });
                }
            }
        }
    }

    debug!(classes = program.classes.len(), "override checker processed classes");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use crate::collect::collect;
    use cool_lexer::Lexer;

    fn run(src: &str) -> Vec<SemanticError> {
        let (tokens, _) = Lexer::tokenize(src);
        let (program, _) = cool_parser::parse(&tokens).unwrap();
        let mut errors = Vec::new();
        let mut ctx = collect(&program, &mut errors);
        build(&program, &mut ctx, &mut errors);
        check_overrides(&program, &ctx, &mut errors);
        errors
    }

    #[test]
    fn identical_override_is_fine() {
        let errors = run(
            "class A { f(x: Int): Int { x }; };
             class B inherits A { f(x: Int): Int { x }; };",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn mismatched_return_type_is_an_error() {
        let errors = run(
            "class A { f(): Int { 0 }; };
             class B inherits A { f(): Bool { true }; };",
        );
        assert_eq!(
            errors,
            vec![SemanticError::OverrideMethodSignature {
                class: "B".into(),
                method: "f".into(),
            }]
        );
    }

    #[test]
    fn redeclared_attribute_is_an_error() {
        let errors = run(
            "class A { x: Int; };
             class B inherits A { x: Int; };",
        );
        assert_eq!(
            errors,
            vec![SemanticError::OverrideAttribute {
                class: "B".into(),
                attr: "x".into(),
            }]
        );
    }
}
