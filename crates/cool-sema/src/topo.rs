//! Topological Sort (§4.7): orders user classes parent-before-child via a
//! DFS from `Object`, and guards the rest of the pipeline against cyclic
//! inheritance (which would otherwise send `Context::conforms_to`/`join`
//! into an infinite walk up the parent chain).

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use cool_parser::Program;

use crate::errors::SemanticError;
use crate::types::{self, Context, TypeId};

/// Reorders `program.classes` into topological (parent-before-child)
/// order. Classes that form a cycle among themselves (never reaching
/// `Object`) are reported once each and their parent link is reset to
/// `Object` so every later pass -- and `Context::conforms_to`/`join` in
/// particular -- can still walk a finite chain.
pub fn topological_sort(program: &mut Program, ctx: &mut Context, errors: &mut Vec<SemanticError>) {
    let object = ctx.lookup(types::OBJECT).expect("Object is always installed");

    let mut children: FxHashMap<TypeId, Vec<TypeId>> = FxHashMap::default();
    for class in &program.classes {
        let Some(id) = ctx.lookup(&class.name) else { continue };
        if let Some(parent) = ctx.get(id).parent {
            children.entry(parent).or_default().push(id);
        }
    }

    let mut order: Vec<TypeId> = Vec::new();
    let mut visited: FxHashSet<TypeId> = FxHashSet::default();
    let mut visiting: FxHashSet<TypeId> = FxHashSet::default();
    dfs(object, &children, &mut order, &mut visited, &mut visiting);

    for class in &program.classes {
        let Some(id) = ctx.lookup(&class.name) else { continue };
        if visited.contains(&id) {
            continue;
        }
        errors.push(SemanticError::CircularDependency {
            class: class.name.clone(),
        });
        ctx.set_parent(id, object);
        order.push(id);
    }

    let rank: FxHashMap<TypeId, usize> = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    program.classes.sort_by_key(|class| {
        ctx.lookup(&class.name)
            .and_then(|id| rank.get(&id).copied())
            .unwrap_or(usize::MAX)
    });

    debug!(classes = program.classes.len(), "topological sort ordered classes");
}

fn dfs(
    node: TypeId,
    children: &FxHashMap<TypeId, Vec<TypeId>>,
    order: &mut Vec<TypeId>,
    visited: &mut FxHashSet<TypeId>,
    visiting: &mut FxHashSet<TypeId>,
) {
    visited.insert(node);
    order.push(node);
    let Some(kids) = children.get(&node) else { return };
    for &child in kids {
        if visiting.contains(&child) {
            // A cycle not involving `Object`; the outer loop in
            // `topological_sort` records one diagnostic per class still
            // unvisited once this DFS returns.
            continue;
        }
        if !visited.contains(&child) {
            visiting.insert(child);
            dfs(child, children, order, visited, visiting);
            visiting.remove(&child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use crate::collect::collect;
    use cool_lexer::Lexer;

    fn run(src: &str) -> (Vec<String>, Vec<SemanticError>) {
        let (tokens, _) = Lexer::tokenize(src);
        let (mut program, _) = cool_parser::parse(&tokens).unwrap();
        let mut errors = Vec::new();
        let mut ctx = collect(&program, &mut errors);
        build(&program, &mut ctx, &mut errors);
        topological_sort(&mut program, &mut ctx, &mut errors);
        (program.classes.iter().map(|c| c.name.clone()).collect(), errors)
    }

    #[test]
    fn orders_parent_before_child() {
        let (order, errors) = run("class B inherits A {}; class A {};");
        assert!(errors.is_empty());
        assert_eq!(order, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn detects_mutual_inheritance_cycle() {
        let (_, errors) = run("class A inherits B {}; class B inherits A {};");
        assert_eq!(errors.len(), 2);
        for e in &errors {
            assert!(matches!(e, SemanticError::CircularDependency { .. }));
        }
    }
}
