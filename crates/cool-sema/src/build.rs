//! Type Builder (§4.7): resolves each class's parent (defaulting to
//! `Object`, rejecting `Int`/`String`/`Bool`/`SELF_TYPE`/unknown names),
//! then defines its attributes and methods on the `Context`.

use cool_parser::{AttrDecl, Feature, MethodDecl, Program};
use tracing::debug;

use crate::errors::SemanticError;
use crate::types::{self, Attribute, Context, Method};

const FORBIDDEN_PARENTS: &[&str] = &[types::INT, types::STRING, types::BOOL, types::SELF_TYPE];

pub fn build(program: &Program, ctx: &mut Context, errors: &mut Vec<SemanticError>) {
    for class in &program.classes {
        let Some(id) = ctx.lookup(&class.name) else {
            // Duplicate declarations were rejected by the collector; the
            // context has the *first* one, so later same-name decls have
            // no slot to build into.
            continue;
        };

        let object = ctx.lookup(types::OBJECT).expect("Object is always installed");
        let parent_id = match &class.parent {
            None => object,
            Some(parent_name) => {
                let forbidden = FORBIDDEN_PARENTS.contains(&parent_name.as_str());
                let unknown = !ctx.contains(parent_name);
                if forbidden || unknown {
                    errors.push(SemanticError::UnknownParent {
                        class: class.name.clone(),
                        parent: parent_name.clone(),
                    });
                    object
                } else {
                    ctx.lookup(parent_name).expect("checked contains above")
                }
            }
        };
        ctx.set_parent(id, parent_id);

        for feature in &class.features {
            match feature {
                Feature::Attr(attr) => build_attribute(ctx, id, &class.name, attr, errors),
                Feature::Method(method) => build_method(ctx, id, &class.name, method, errors),
            }
        }
    }

    debug!(classes = program.classes.len(), "type builder processed classes");
}

fn check_type_name(ctx: &Context, name: &str, errors: &mut Vec<SemanticError>) {
    if name == types::AUTO_TYPE || name == types::SELF_TYPE {
        return;
    }
    if !ctx.contains(name) {
        errors.push(SemanticError::UnknownType {
            type_name: name.to_string(),
        });
    }
}

fn build_attribute(
    ctx: &mut Context,
    id: types::TypeId,
    class_name: &str,
    attr: &AttrDecl,
    errors: &mut Vec<SemanticError>,
) {
    if ctx.get(id).attributes.contains_key(&attr.name) {
        errors.push(SemanticError::DuplicateAttribute {
            class: class_name.to_string(),
            attr: attr.name.clone(),
        });
        return;
    }
    check_type_name(ctx, &attr.type_name, errors);
    ctx.add_attribute(
        id,
        Attribute {
            name: attr.name.clone(),
            type_name: attr.type_name.clone(),
            init: attr.init.clone(),
        },
    );
}

fn build_method(
    ctx: &mut Context,
    id: types::TypeId,
    class_name: &str,
    method: &MethodDecl,
    errors: &mut Vec<SemanticError>,
) {
    if ctx.get(id).methods.contains_key(&method.name) {
        errors.push(SemanticError::DuplicateMethod {
            class: class_name.to_string(),
            method: method.name.clone(),
        });
        return;
    }
    for (_, param_type) in &method.params {
        if param_type == types::SELF_TYPE {
            errors.push(SemanticError::UnknownType {
                type_name: types::SELF_TYPE.to_string(),
            });
            continue;
        }
        check_type_name(ctx, param_type, errors);
    }
    check_type_name(ctx, &method.return_type, errors);
    ctx.add_method(
        id,
        Method {
            name: method.name.clone(),
            params: method.params.clone(),
            return_type: method.return_type.clone(),
            body: method.body.clone(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect;
    use cool_lexer::Lexer;

    fn build_context(src: &str) -> (Context, Vec<SemanticError>) {
        let (tokens, _) = Lexer::tokenize(src);
        let (program, _) = cool_parser::parse(&tokens).unwrap();
        let mut errors = Vec::new();
        let mut ctx = collect(&program, &mut errors);
        build(&program, &mut ctx, &mut errors);
        (ctx, errors)
    }

    #[test]
    fn defaults_parent_to_object() {
        let (ctx, errors) = build_context("class A {};");
        assert!(errors.is_empty());
        let a = ctx.lookup("A").unwrap();
        assert_eq!(ctx.get(a).parent, ctx.lookup("Object"));
    }

    #[test]
    fn rejects_int_as_parent() {
        let (_, errors) = build_context("class A inherits Int {};");
        assert_eq!(
            errors,
            vec![SemanticError::UnknownParent {
                class: "A".into(),
                parent: "Int".into(),
            }]
        );
    }

    #[test]
    fn duplicate_attribute_is_an_error() {
        let (_, errors) = build_context("class A { x: Int; x: Int; };");
        assert_eq!(
            errors,
            vec![SemanticError::DuplicateAttribute {
                class: "A".into(),
                attr: "x".into(),
            }]
        );
    }

    #[test]
    fn unknown_attribute_type_is_an_error() {
        let (_, errors) = build_context("class A { x: Nonexistent; };");
        assert_eq!(
            errors,
            vec![SemanticError::UnknownType {
                type_name: "Nonexistent".into(),
            }]
        );
    }
}
