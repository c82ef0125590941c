//! The lexical scope tree shared (in different ways) by the type checker,
//! the inference pass, and the evaluator.
//!
//! Frames are arena-indexed for the same reason types are: children must
//! be revisitable in the same traversal order by a later pass without a
//! raw parent/child pointer, since later passes rely on a scope's children
//! staying in the exact order they were created.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// A bound identifier and its static type. The evaluator does not walk this
/// tree; it builds its own, simpler call-stack-shaped scopes over the
/// runtime `Instance`s instead (see `cool_eval::EvalScope`).
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub name: String,
    pub type_name: String,
}

impl VariableInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> VariableInfo {
        VariableInfo {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug)]
struct Frame {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    variables: FxHashMap<String, VariableInfo>,
    /// Declaration order of `variables`, since a frame can shadow its own
    /// bindings (successive `let` bindings of the same name) and the most
    /// recent one must win.
    order: Vec<String>,
}

/// A tree of lexical frames, arena-backed. The root frame (index 0) always
/// exists once a `Scope` is constructed.
#[derive(Debug)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Scope {
    pub fn new() -> Scope {
        Scope {
            frames: vec![Frame {
                parent: None,
                children: Vec::new(),
                variables: FxHashMap::default(),
                order: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.frames.len() as u32);
        self.frames.push(Frame {
            parent: Some(parent),
            children: Vec::new(),
            variables: FxHashMap::default(),
            order: Vec::new(),
        });
        self.frames[parent.0 as usize].children.push(id);
        id
    }

    pub fn children_of(&self, scope: ScopeId) -> &[ScopeId] {
        &self.frames[scope.0 as usize].children
    }

    pub fn define(&mut self, scope: ScopeId, info: VariableInfo) {
        let frame = &mut self.frames[scope.0 as usize];
        if !frame.variables.contains_key(&info.name) {
            frame.order.push(info.name.clone());
        }
        frame.variables.insert(info.name.clone(), info);
    }

    /// True iff `name` is bound in `scope` itself (not an ancestor).
    pub fn is_local(&self, scope: ScopeId, name: &str) -> bool {
        self.frames[scope.0 as usize].variables.contains_key(name)
    }

    /// Walks `scope`'s parent chain looking for `name`.
    pub fn find_variable(&self, scope: ScopeId, name: &str) -> Option<&VariableInfo> {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            let frame = &self.frames[s.0 as usize];
            if let Some(info) = frame.variables.get(name) {
                return Some(info);
            }
            cur = frame.parent;
        }
        None
    }

    pub fn find_variable_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut VariableInfo> {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            let frame = &mut self.frames[s.0 as usize];
            if frame.variables.contains_key(name) {
                return frame.variables.get_mut(name);
            }
            cur = frame.parent;
        }
        None
    }

    pub fn parent_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.frames[scope.0 as usize].parent
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_variable_walks_parents() {
        let mut scope = Scope::new();
        let root = scope.root();
        scope.define(root, VariableInfo::new("x", "Int"));
        let child = scope.child(root);
        assert!(scope.find_variable(child, "x").is_some());
        assert!(!scope.is_local(child, "x"));
    }

    #[test]
    fn is_local_only_checks_current_frame() {
        let mut scope = Scope::new();
        let root = scope.root();
        let child = scope.child(root);
        scope.define(child, VariableInfo::new("y", "Int"));
        assert!(scope.is_local(child, "y"));
        assert!(!scope.is_local(root, "y"));
    }
}
