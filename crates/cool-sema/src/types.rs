//! The type system proper: `Type`, `Attribute`, `Method`, and the `Context`
//! that owns every type in a compile, arena-indexed so parent links never
//! need a raw back-reference.

use indexmap::IndexMap;

use cool_parser::Expr;

/// Index into a [`Context`]'s type arena. Stable for the lifetime of the
/// `Context` that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

/// A class attribute: declared name, declared type (mutated in place by
/// inference when it was spelled `AUTO_TYPE`), and the optional initializer
/// expression, captured once at type-build time.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub type_name: String,
    pub init: Option<Expr>,
}

/// A method: ordered parameter `(name, declared type)` pairs, a declared
/// return type, and the body expression captured at type-build time. Both
/// parameter types and the return type are mutated in place by inference.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub return_type: String,
    pub body: Expr,
}

impl Method {
    /// Structural equality used by the overridden-method checker: same
    /// arity, same parameter types (names may differ), same return type.
    pub fn same_signature(&self, other: &Method) -> bool {
        self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|((_, a), (_, b))| a == b)
            && self.return_type == other.return_type
    }
}

/// A named type: its own attributes and methods (insertion order
/// preserved), plus an optional parent link. Inherited members are not
/// copied in -- lookups walk the parent chain.
#[derive(Debug, Clone)]
pub struct Type {
    pub name: String,
    pub parent: Option<TypeId>,
    pub attributes: IndexMap<String, Attribute>,
    pub methods: IndexMap<String, Method>,
}

impl Type {
    fn new(name: impl Into<String>) -> Type {
        Type {
            name: name.into(),
            parent: None,
            attributes: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }
}

pub const OBJECT: &str = "Object";
pub const IO: &str = "IO";
pub const STRING: &str = "String";
pub const INT: &str = "Int";
pub const BOOL: &str = "Bool";
pub const SELF_TYPE: &str = "SELF_TYPE";
pub const AUTO_TYPE: &str = "AUTO_TYPE";
pub const ERROR: &str = "Error";

/// Mapping from type name to [`Type`], arena-backed. Built once by the type
/// collector and type builder, then read by every later pass.
#[derive(Debug)]
pub struct Context {
    types: Vec<Type>,
    by_name: IndexMap<String, TypeId>,
}

impl Context {
    pub fn new() -> Context {
        Context {
            types: Vec::new(),
            by_name: IndexMap::new(),
        }
    }

    /// Installs `AUTO_TYPE`, `SELF_TYPE`, `Error`, and the five concrete
    /// built-ins (`Object`, `IO`, `String`, `Int`, `Bool`) with their
    /// built-in methods, per §4.7's Type Collector.
    pub fn with_builtins() -> Context {
        let mut ctx = Context::new();

        // Marker types carry no methods/attributes of their own; lookups
        // on them never occur because the type checker resolves SELF_TYPE
        // to `current_type` and rejects bare AUTO_TYPE use before it gets
        // here. `Error` is a real entry so `conforms_to` can special-case it.
        ctx.declare(AUTO_TYPE);
        ctx.declare(SELF_TYPE);
        ctx.declare(ERROR);

        let object = ctx.declare(OBJECT);

        let io = ctx.declare(IO);
        ctx.set_parent(io, object);

        let string = ctx.declare(STRING);
        ctx.set_parent(string, object);

        let int = ctx.declare(INT);
        ctx.set_parent(int, object);

        let bool_ty = ctx.declare(BOOL);
        ctx.set_parent(bool_ty, object);

        ctx.add_method(object, builtin_method("abort", vec![], OBJECT));
        ctx.add_method(object, builtin_method("type_name", vec![], STRING));
        ctx.add_method(object, builtin_method("copy", vec![], SELF_TYPE));

        ctx.add_method(io, builtin_method("out_string", vec![("x", STRING)], SELF_TYPE));
        ctx.add_method(io, builtin_method("out_int", vec![("x", INT)], SELF_TYPE));
        ctx.add_method(io, builtin_method("in_string", vec![], STRING));
        ctx.add_method(io, builtin_method("in_int", vec![], INT));

        ctx.add_method(string, builtin_method("length", vec![], INT));
        ctx.add_method(
            string,
            builtin_method("concat", vec![("s", STRING)], STRING),
        );
        ctx.add_method(
            string,
            builtin_method("substr", vec![("i", INT), ("l", INT)], STRING),
        );

        ctx
    }

    pub fn declare(&mut self, name: impl Into<String>) -> TypeId {
        let name = name.into();
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type::new(name.clone()));
        self.by_name.insert(name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    pub fn type_by_name(&self, name: &str) -> Option<&Type> {
        self.lookup(name).map(|id| self.get(id))
    }

    pub fn set_parent(&mut self, id: TypeId, parent: TypeId) {
        self.get_mut(id).parent = Some(parent);
    }

    pub fn add_attribute(&mut self, id: TypeId, attr: Attribute) {
        self.get_mut(id).attributes.insert(attr.name.clone(), attr);
    }

    pub fn add_method(&mut self, id: TypeId, method: Method) {
        self.get_mut(id).methods.insert(method.name.clone(), method);
    }

    /// All declared type ids in declaration order, built-ins first.
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId)
    }

    /// Walks the parent chain of `id` to find a method by name, returning
    /// the owning type's id alongside it (the owner may be an ancestor).
    pub fn resolve_method(&self, id: TypeId, name: &str) -> Option<(TypeId, &Method)> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let ty = self.get(c);
            if let Some(m) = ty.methods.get(name) {
                return Some((c, m));
            }
            cur = ty.parent;
        }
        None
    }

    /// Walks the parent chain of `id` to find an attribute by name.
    pub fn resolve_attribute(&self, id: TypeId, name: &str) -> Option<&Attribute> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let ty = self.get(c);
            if let Some(a) = ty.attributes.get(name) {
                return Some(a);
            }
            cur = ty.parent;
        }
        None
    }

    /// All attributes visible on `id`, ancestors first so subclass
    /// initializers run after their parent's (the order `new` evaluates
    /// them in).
    pub fn all_attributes(&self, id: TypeId) -> Vec<&Attribute> {
        let mut chain = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            chain.push(c);
            cur = self.get(c).parent;
        }
        chain.reverse();
        chain
            .into_iter()
            .flat_map(|c| self.get(c).attributes.values())
            .collect()
    }

    /// `A` conforms to `B` iff `A == B`, `B` is `Error`, `A` is `Error`, or
    /// `A`'s parent conforms to `B`.
    pub fn conforms_to(&self, a: TypeId, b: TypeId) -> bool {
        let error = self.lookup(ERROR);
        if Some(a) == error || Some(b) == error {
            return true;
        }
        let mut cur = Some(a);
        while let Some(c) = cur {
            if c == b {
                return true;
            }
            cur = self.get(c).parent;
        }
        false
    }

    /// Nearest common ancestor of `a` and `b` under the parent chain.
    pub fn join(&self, a: TypeId, b: TypeId) -> TypeId {
        let error = self.lookup(ERROR).expect("Error is always installed");
        if a == error || b == error {
            return error;
        }
        let mut ancestors_of_a = Vec::new();
        let mut cur = Some(a);
        while let Some(c) = cur {
            ancestors_of_a.push(c);
            cur = self.get(c).parent;
        }
        let mut cur = Some(b);
        while let Some(c) = cur {
            if ancestors_of_a.contains(&c) {
                return c;
            }
            cur = self.get(c).parent;
        }
        self.lookup(OBJECT).expect("Object is always installed")
    }

    pub fn multi_join(&self, types: &[TypeId]) -> TypeId {
        let mut iter = types.iter().copied();
        let first = iter.next().expect("multi_join requires at least one type");
        iter.fold(first, |acc, t| self.join(acc, t))
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

fn builtin_method(name: &str, params: Vec<(&str, &str)>, return_type: &str) -> Method {
    Method {
        name: name.to_string(),
        params: params
            .into_iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect(),
        return_type: return_type.to_string(),
        // Built-in methods have no COOL-level body; the evaluator
        // special-cases dispatch on them before ever looking at `body`.
        body: Expr::Integer {
            value: 0,
            span: cool_common::Span::new(0, 0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_object_as_root() {
        let ctx = Context::with_builtins();
        let object = ctx.lookup(OBJECT).unwrap();
        assert!(ctx.get(object).parent.is_none());
        let io = ctx.lookup(IO).unwrap();
        assert_eq!(ctx.get(io).parent, Some(object));
    }

    #[test]
    fn conforms_to_walks_parent_chain() {
        let ctx = Context::with_builtins();
        let object = ctx.lookup(OBJECT).unwrap();
        let int = ctx.lookup(INT).unwrap();
        assert!(ctx.conforms_to(int, object));
        assert!(!ctx.conforms_to(object, int));
    }

    #[test]
    fn error_conforms_to_everything_and_vice_versa() {
        let ctx = Context::with_builtins();
        let error = ctx.lookup(ERROR).unwrap();
        let int = ctx.lookup(INT).unwrap();
        assert!(ctx.conforms_to(error, int));
        assert!(ctx.conforms_to(int, error));
    }

    #[test]
    fn join_finds_nearest_common_ancestor() {
        let ctx = Context::with_builtins();
        let int = ctx.lookup(INT).unwrap();
        let string = ctx.lookup(STRING).unwrap();
        let object = ctx.lookup(OBJECT).unwrap();
        assert_eq!(ctx.join(int, string), object);
    }

    #[test]
    fn multi_join_of_one_is_identity() {
        let ctx = Context::with_builtins();
        let int = ctx.lookup(INT).unwrap();
        assert_eq!(ctx.multi_join(&[int]), int);
    }
}
