//! Type Collector (§4.7): pre-installs the built-ins, then declares every
//! user class by name. Duplicate names are recorded but do not stop
//! collection -- the later passes simply see the first declaration.

use cool_parser::Program;
use tracing::debug;

use crate::errors::SemanticError;
use crate::types::Context;

pub fn collect(program: &Program, errors: &mut Vec<SemanticError>) -> Context {
    let mut ctx = Context::with_builtins();

    for class in &program.classes {
        if ctx.contains(&class.name) {
            errors.push(SemanticError::DuplicateClass {
                class: class.name.clone(),
            });
            continue;
        }
        ctx.declare(&class.name);
    }

    debug!(classes = program.classes.len(), "type collector processed classes");
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_lexer::Lexer;

    fn program(src: &str) -> Program {
        let (tokens, _) = Lexer::tokenize(src);
        cool_parser::parse(&tokens).unwrap().0
    }

    #[test]
    fn declares_user_classes() {
        let program = program("class Main { main(): Object { 0 }; };");
        let mut errors = Vec::new();
        let ctx = collect(&program, &mut errors);
        assert!(errors.is_empty());
        assert!(ctx.contains("Main"));
    }

    #[test]
    fn duplicate_class_name_is_an_error() {
        let program = program("class A {}; class A {};");
        let mut errors = Vec::new();
        collect(&program, &mut errors);
        assert_eq!(
            errors,
            vec![SemanticError::DuplicateClass { class: "A".into() }]
        );
    }
}
