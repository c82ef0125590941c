//! AUTO_TYPE inference (§4.8): builds a dependency graph over every
//! `AUTO_TYPE` attribute, parameter, return type, and `let` binding, solves
//! it to a fixpoint, then writes the resolved types back into both the AST
//! and the `Context`.
//!
//! Two logically distinct graph nodes from the dependency-graph design --
//! a variable's own slot and the class attribute it shadows -- are merged
//! into one node here: the two are always meant to carry the same type, so
//! giving them one identity makes the "symmetric cycle" between them free
//! (any edge touching either touches the single shared node) instead of
//! something to wire by hand.

use rustc_hash::FxHashMap;
use tracing::debug;

use cool_common::Span;
use cool_parser::{BinOp, Expr, Feature, Program};

use crate::errors::SemanticError;
use crate::types::{self, Context, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

#[derive(Debug, Clone)]
enum WriteTarget {
    Attribute {
        class: TypeId,
        attr: String,
    },
    Param {
        class: TypeId,
        method: String,
        index: usize,
        param_name: String,
    },
    Return {
        class: TypeId,
        method: String,
    },
    LetBinding {
        span: Span,
        index: usize,
        var_name: String,
    },
}

impl WriteTarget {
    fn label(&self, ctx: &Context) -> String {
        match self {
            WriteTarget::Attribute { class, attr } => {
                format!("{}.{}", ctx.get(*class).name, attr)
            }
            WriteTarget::Param {
                class,
                method,
                param_name,
                ..
            } => format!("{}.{}({})", ctx.get(*class).name, method, param_name),
            WriteTarget::Return { class, method } => {
                format!("{}.{} return type", ctx.get(*class).name, method)
            }
            WriteTarget::LetBinding { var_name, .. } => var_name.clone(),
        }
    }
}

enum NodeKind {
    Atom(TypeId),
    Slot,
    Branch { parts: Vec<NodeId> },
}

struct Node {
    kind: NodeKind,
    resolved: Option<TypeId>,
    targets: Vec<WriteTarget>,
}

struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Vec<NodeId>>,
}

impl Graph {
    fn new() -> Graph {
        Graph {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn push(&mut self, kind: NodeKind, resolved: Option<TypeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            resolved,
            targets: Vec::new(),
        });
        self.edges.push(Vec::new());
        id
    }

    fn atom(&mut self, ty: TypeId) -> NodeId {
        self.push(NodeKind::Atom(ty), Some(ty))
    }

    fn slot(&mut self) -> NodeId {
        self.push(NodeKind::Slot, None)
    }

    fn branch(&mut self, parts: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Branch { parts }, None)
    }

    fn add_target(&mut self, node: NodeId, target: WriteTarget) {
        self.nodes[node.0 as usize].targets.push(target);
    }

    fn is_atom(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0 as usize].kind, NodeKind::Atom(_))
    }

    fn atom_type(&self, node: NodeId) -> Option<TypeId> {
        match self.nodes[node.0 as usize].kind {
            NodeKind::Atom(ty) => Some(ty),
            _ => None,
        }
    }

    fn edge(&mut self, from: NodeId, to: NodeId) {
        if from != to {
            self.edges[from.0 as usize].push(to);
        }
    }

    /// Wires `a` and `b` per their concreteness: a known atom forces the
    /// other side; two open slots learn from whichever resolves first.
    fn connect(&mut self, a: NodeId, b: NodeId) {
        match (self.is_atom(a), self.is_atom(b)) {
            (true, true) | (false, false) if a == b => {}
            (true, _) => self.edge(a, b),
            (_, true) => self.edge(b, a),
            (false, false) => {
                self.edge(a, b);
                self.edge(b, a);
            }
        }
    }
}

/// Only a [`NodeKind::Slot`] accepts a value pushed along an edge; a
/// [`NodeKind::Branch`] is resolved exclusively by `resolve_branches`, never
/// by generic propagation, or a cycle through a branch could let one arm's
/// eventual value leak into the branch node directly and bypass the join.
fn propagate_once(graph: &mut Graph) -> bool {
    let mut changed = false;
    for u in 0..graph.nodes.len() {
        let Some(ty) = graph.nodes[u].resolved else { continue };
        let targets = graph.edges[u].clone();
        for v in targets {
            let vi = v.0 as usize;
            if graph.nodes[vi].resolved.is_none() && matches!(graph.nodes[vi].kind, NodeKind::Slot) {
                graph.nodes[vi].resolved = Some(ty);
                changed = true;
            }
        }
    }
    changed
}

/// Resolves every branch node ready under the current policy: `false`
/// requires every arm known (the ordinary case), `true` accepts any
/// non-empty subset (the cycle-breaking fallback, see `solve`).
fn resolve_branches(graph: &mut Graph, ctx: &Context, allow_partial: bool) -> bool {
    let mut changed = false;
    for idx in 0..graph.nodes.len() {
        if graph.nodes[idx].resolved.is_some() {
            continue;
        }
        let NodeKind::Branch { parts } = &graph.nodes[idx].kind else {
            continue;
        };
        let parts = parts.clone();
        let known: Vec<TypeId> = parts
            .iter()
            .filter_map(|p| graph.nodes[p.0 as usize].resolved)
            .collect();
        let ready = if allow_partial {
            !known.is_empty()
        } else {
            !known.is_empty() && known.len() == parts.len()
        };
        if ready {
            graph.nodes[idx].resolved = Some(ctx.multi_join(&known));
            changed = true;
        }
    }
    changed
}

fn solve(graph: &mut Graph, ctx: &Context) {
    loop {
        let mut changed = propagate_once(graph);
        changed |= resolve_branches(graph, ctx, false);
        if !changed {
            break;
        }
    }
    // Two AUTO_TYPE return types whose conditionals each reference the
    // other's call (mutual recursion) deadlock the loop above: every
    // branch is missing exactly one arm, forever. Once no full resolution
    // is left, join over whatever arms a branch DOES have -- this is the
    // only way such a pair ever settles on anything but the default.
    loop {
        let changed = resolve_branches(graph, ctx, true);
        if !changed {
            break;
        }
        loop {
            let mut more = propagate_once(graph);
            more |= resolve_branches(graph, ctx, false);
            if !more {
                break;
            }
        }
    }
}

struct Builder {
    graph: Graph,
    atom_cache: FxHashMap<TypeId, NodeId>,
    attr_nodes: FxHashMap<(TypeId, String), NodeId>,
    param_nodes: FxHashMap<(TypeId, String, usize), NodeId>,
    return_nodes: FxHashMap<(TypeId, String), NodeId>,
    env: Vec<FxHashMap<String, NodeId>>,
    error_ty: TypeId,
    int_ty: TypeId,
    string_ty: TypeId,
    bool_ty: TypeId,
    object_ty: TypeId,
}

impl Builder {
    fn new(ctx: &Context) -> Builder {
        Builder {
            graph: Graph::new(),
            atom_cache: FxHashMap::default(),
            attr_nodes: FxHashMap::default(),
            param_nodes: FxHashMap::default(),
            return_nodes: FxHashMap::default(),
            env: Vec::new(),
            error_ty: ctx.lookup(types::ERROR).expect("Error is always installed"),
            int_ty: ctx.lookup(types::INT).expect("Int is always installed"),
            string_ty: ctx.lookup(types::STRING).expect("String is always installed"),
            bool_ty: ctx.lookup(types::BOOL).expect("Bool is always installed"),
            object_ty: ctx.lookup(types::OBJECT).expect("Object is always installed"),
        }
    }

    fn push_env(&mut self) {
        self.env.push(FxHashMap::default());
    }

    fn pop_env(&mut self) {
        self.env.pop();
    }

    fn define_var(&mut self, name: &str, node: NodeId) {
        self.env
            .last_mut()
            .expect("a scope frame is always pushed before defining a variable")
            .insert(name.to_string(), node);
    }

    fn lookup_var(&mut self, name: &str) -> NodeId {
        for frame in self.env.iter().rev() {
            if let Some(&node) = frame.get(name) {
                return node;
            }
        }
        // An undefined variable is the identifier checker's error to
        // report; inference just gives it an isolated slot so the rest of
        // the graph keeps building.
        self.graph.slot()
    }

    fn atom_for(&mut self, ty: TypeId) -> NodeId {
        if let Some(&node) = self.atom_cache.get(&ty) {
            return node;
        }
        let node = self.graph.atom(ty);
        self.atom_cache.insert(ty, node);
        node
    }

    fn resolve_or_error(&self, ctx: &Context, name: &str) -> TypeId {
        ctx.lookup(name).unwrap_or(self.error_ty)
    }

    fn attr_node(&mut self, ctx: &Context, class: TypeId, name: &str) -> NodeId {
        let key = (class, name.to_string());
        if let Some(&node) = self.attr_nodes.get(&key) {
            return node;
        }
        let attr = ctx
            .get(class)
            .attributes
            .get(name)
            .expect("declared by the type builder");
        let node = if attr.type_name == types::AUTO_TYPE {
            let n = self.graph.slot();
            self.graph.add_target(
                n,
                WriteTarget::Attribute {
                    class,
                    attr: name.to_string(),
                },
            );
            n
        } else {
            let ty = self.resolve_or_error(ctx, &attr.type_name);
            self.atom_for(ty)
        };
        self.attr_nodes.insert(key, node);
        node
    }

    fn param_node(&mut self, ctx: &Context, class: TypeId, method: &str, index: usize) -> NodeId {
        let key = (class, method.to_string(), index);
        if let Some(&node) = self.param_nodes.get(&key) {
            return node;
        }
        let m = ctx
            .get(class)
            .methods
            .get(method)
            .expect("declared by the type builder");
        let (param_name, param_type) = &m.params[index];
        let node = if param_type == types::AUTO_TYPE {
            let n = self.graph.slot();
            self.graph.add_target(
                n,
                WriteTarget::Param {
                    class,
                    method: method.to_string(),
                    index,
                    param_name: param_name.clone(),
                },
            );
            n
        } else {
            let ty = self.resolve_or_error(ctx, param_type);
            self.atom_for(ty)
        };
        self.param_nodes.insert(key, node);
        node
    }

    fn return_node(&mut self, ctx: &Context, class: TypeId, method: &str) -> NodeId {
        let key = (class, method.to_string());
        if let Some(&node) = self.return_nodes.get(&key) {
            return node;
        }
        let m = ctx
            .get(class)
            .methods
            .get(method)
            .expect("declared by the type builder");
        let node = if m.return_type == types::AUTO_TYPE {
            let n = self.graph.slot();
            self.graph.add_target(
                n,
                WriteTarget::Return {
                    class,
                    method: method.to_string(),
                },
            );
            n
        } else if m.return_type == types::SELF_TYPE {
            // Only ever consulted from the declaring method's own `body ->
            // return` edge, where the returned value's type really is the
            // executing class -- dispatch call sites resolve `SELF_TYPE`
            // against the receiver independently, below.
            self.atom_for(class)
        } else {
            let ty = self.resolve_or_error(ctx, &m.return_type);
            self.atom_for(ty)
        };
        self.return_nodes.insert(key, node);
        node
    }

    fn build_class(&mut self, ctx: &Context, class_id: TypeId) {
        self.push_env();
        let self_node = self.atom_for(class_id);
        self.define_var("self", self_node);

        for attr in ctx.all_attributes(class_id) {
            if let Some(owner) = attribute_owner(ctx, class_id, &attr.name) {
                let node = self.attr_node(ctx, owner, &attr.name);
                self.define_var(&attr.name, node);
            }
        }

        let own_attrs: Vec<String> = ctx.get(class_id).attributes.keys().cloned().collect();
        for name in &own_attrs {
            self.build_attribute(ctx, class_id, name);
        }

        let own_methods: Vec<String> = ctx.get(class_id).methods.keys().cloned().collect();
        for name in &own_methods {
            self.build_method(ctx, class_id, name);
        }

        self.pop_env();
    }

    fn build_attribute(&mut self, ctx: &Context, class_id: TypeId, name: &str) {
        let node = self.attr_node(ctx, class_id, name);
        let attr = ctx.get(class_id).attributes.get(name).expect("just resolved above");
        if let Some(init) = attr.init.clone() {
            let init_node = self.build_expr(&init, class_id, ctx);
            self.graph.connect(init_node, node);
        }
    }

    fn build_method(&mut self, ctx: &Context, class_id: TypeId, name: &str) {
        self.push_env();
        let param_count = ctx.get(class_id).methods.get(name).expect("just resolved above").params.len();
        for i in 0..param_count {
            let m = ctx.get(class_id).methods.get(name).expect("just resolved above");
            let param_name = m.params[i].0.clone();
            let node = self.param_node(ctx, class_id, name, i);
            self.define_var(&param_name, node);
        }
        let body = ctx.get(class_id).methods.get(name).expect("just resolved above").body.clone();
        let body_node = self.build_expr(&body, class_id, ctx);
        self.pop_env();

        let return_is_auto = ctx.get(class_id).methods.get(name).expect("just resolved above").return_type == types::AUTO_TYPE;
        if return_is_auto {
            let ret_node = self.return_node(ctx, class_id, name);
            self.graph.edge(body_node, ret_node);
        }
    }

    fn build_expr(&mut self, expr: &Expr, class_id: TypeId, ctx: &Context) -> NodeId {
        match expr {
            Expr::Assign { name, value, .. } => {
                let val_node = self.build_expr(value, class_id, ctx);
                let var_node = self.lookup_var(name);
                self.graph.connect(val_node, var_node);
                val_node
            }
            Expr::Block { exprs, .. } => {
                let mut last = self.atom_for(self.object_ty);
                for e in exprs {
                    last = self.build_expr(e, class_id, ctx);
                }
                last
            }
            Expr::Let { bindings, body, span } => {
                self.push_env();
                for (i, (name, type_name, init)) in bindings.iter().enumerate() {
                    let var_node = if type_name == types::AUTO_TYPE {
                        let n = self.graph.slot();
                        self.graph.add_target(
                            n,
                            WriteTarget::LetBinding {
                                span: *span,
                                index: i,
                                var_name: name.clone(),
                            },
                        );
                        n
                    } else {
                        let ty = self.resolve_or_error(ctx, type_name);
                        self.atom_for(ty)
                    };
                    if let Some(init_expr) = init {
                        let init_node = self.build_expr(init_expr, class_id, ctx);
                        self.graph.connect(init_node, var_node);
                    }
                    self.define_var(name, var_node);
                }
                let body_node = self.build_expr(body, class_id, ctx);
                self.pop_env();
                body_node
            }
            Expr::SwitchCase {
                scrutinee, branches, ..
            } => {
                self.build_expr(scrutinee, class_id, ctx);
                let mut branch_nodes = Vec::with_capacity(branches.len());
                for branch in branches {
                    self.push_env();
                    let bound_ty = self.resolve_or_error(ctx, &branch.type_name);
                    let bound_node = self.atom_for(bound_ty);
                    self.define_var(&branch.name, bound_node);
                    branch_nodes.push(self.build_expr(&branch.body, class_id, ctx));
                    self.pop_env();
                }
                self.join_or_branch(ctx, branch_nodes)
            }
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.build_expr(cond, class_id, ctx);
                let then_node = self.build_expr(then_branch, class_id, ctx);
                let else_node = self.build_expr(else_branch, class_id, ctx);
                self.join_or_branch(ctx, vec![then_node, else_node])
            }
            Expr::While { cond, body, .. } => {
                self.build_expr(cond, class_id, ctx);
                self.build_expr(body, class_id, ctx);
                self.atom_for(self.object_ty)
            }
            Expr::MethodCall {
                receiver,
                ancestor,
                method,
                args,
                ..
            } => {
                let recv_node = match receiver {
                    Some(e) => self.build_expr(e, class_id, ctx),
                    None => self.atom_for(class_id),
                };
                let static_recv_ty = self.graph.atom_type(recv_node);
                let owner_ty = match ancestor {
                    Some(name) => ctx.lookup(name).or(static_recv_ty),
                    None => static_recv_ty,
                };
                let arg_nodes: Vec<NodeId> = args.iter().map(|a| self.build_expr(a, class_id, ctx)).collect();

                let Some(owner_ty) = owner_ty else {
                    return self.graph.slot();
                };
                let Some((decl_id, m)) = ctx.resolve_method(owner_ty, method) else {
                    return self.graph.slot();
                };
                let arity = m.params.len().min(arg_nodes.len());
                for (i, &arg_node) in arg_nodes.iter().enumerate().take(arity) {
                    let param_node = self.param_node(ctx, decl_id, method, i);
                    self.graph.connect(arg_node, param_node);
                }
                let return_type = m.return_type.clone();
                if return_type == types::AUTO_TYPE {
                    self.return_node(ctx, decl_id, method)
                } else if return_type == types::SELF_TYPE {
                    match static_recv_ty {
                        Some(t) => self.atom_for(t),
                        None => self.graph.slot(),
                    }
                } else {
                    let ty = self.resolve_or_error(ctx, &return_type);
                    self.atom_for(ty)
                }
            }
            Expr::Variable { name, .. } => {
                if name == "self" {
                    self.atom_for(class_id)
                } else {
                    self.lookup_var(name)
                }
            }
            Expr::Instantiate { type_name, .. } => {
                if type_name == types::SELF_TYPE {
                    self.atom_for(class_id)
                } else {
                    let ty = self.resolve_or_error(ctx, type_name);
                    self.atom_for(ty)
                }
            }
            Expr::Integer { .. } => self.atom_for(self.int_ty),
            Expr::String { .. } => self.atom_for(self.string_ty),
            Expr::Boolean { .. } => self.atom_for(self.bool_ty),
            Expr::Negation { expr, .. } => {
                let inner = self.build_expr(expr, class_id, ctx);
                let bool_atom = self.atom_for(self.bool_ty);
                self.graph.connect(bool_atom, inner);
                self.atom_for(self.bool_ty)
            }
            Expr::Complement { expr, .. } => {
                let inner = self.build_expr(expr, class_id, ctx);
                let int_atom = self.atom_for(self.int_ty);
                self.graph.connect(int_atom, inner);
                self.atom_for(self.int_ty)
            }
            Expr::IsVoid { expr, .. } => {
                self.build_expr(expr, class_id, ctx);
                self.atom_for(self.bool_ty)
            }
            Expr::Binary { op, left, right, .. } => {
                let l = self.build_expr(left, class_id, ctx);
                let r = self.build_expr(right, class_id, ctx);
                match op {
                    BinOp::Plus | BinOp::Minus | BinOp::Star | BinOp::Div => {
                        let int_atom = self.atom_for(self.int_ty);
                        self.graph.connect(int_atom, l);
                        let int_atom = self.atom_for(self.int_ty);
                        self.graph.connect(int_atom, r);
                        self.atom_for(self.int_ty)
                    }
                    BinOp::LessThan | BinOp::LessEqual => {
                        let int_atom = self.atom_for(self.int_ty);
                        self.graph.connect(int_atom, l);
                        let int_atom = self.atom_for(self.int_ty);
                        self.graph.connect(int_atom, r);
                        self.atom_for(self.bool_ty)
                    }
                    BinOp::Equal => self.atom_for(self.bool_ty),
                }
            }
        }
    }

    /// A conditional/case result: if every branch is already a known
    /// concrete atom, join them eagerly; otherwise defer to a `Branch`
    /// node the solver joins once it can.
    fn join_or_branch(&mut self, ctx: &Context, branch_nodes: Vec<NodeId>) -> NodeId {
        if branch_nodes.iter().all(|&n| self.graph.is_atom(n)) {
            let known: Vec<TypeId> = branch_nodes
                .iter()
                .map(|&n| self.graph.atom_type(n).expect("checked is_atom above"))
                .collect();
            self.atom_for(ctx.multi_join(&known))
        } else {
            self.graph.branch(branch_nodes)
        }
    }
}

fn attribute_owner(ctx: &Context, id: TypeId, name: &str) -> Option<TypeId> {
    let mut cur = Some(id);
    while let Some(c) = cur {
        if ctx.get(c).attributes.contains_key(name) {
            return Some(c);
        }
        cur = ctx.get(c).parent;
    }
    None
}

fn expr_children_mut(expr: &mut Expr) -> Vec<&mut Expr> {
    match expr {
        Expr::Assign { value, .. } => vec![value.as_mut()],
        Expr::Block { exprs, .. } => exprs.iter_mut().collect(),
        Expr::Let { bindings, body, .. } => {
            let mut v: Vec<&mut Expr> = bindings.iter_mut().filter_map(|(_, _, init)| init.as_mut()).collect();
            v.push(body.as_mut());
            v
        }
        Expr::SwitchCase { scrutinee, branches, .. } => {
            let mut v = vec![scrutinee.as_mut()];
            v.extend(branches.iter_mut().map(|b| &mut b.body));
            v
        }
        Expr::Conditional {
            cond,
            then_branch,
            else_branch,
            ..
        } => vec![cond.as_mut(), then_branch.as_mut(), else_branch.as_mut()],
        Expr::While { cond, body, .. } => vec![cond.as_mut(), body.as_mut()],
        Expr::MethodCall { receiver, args, .. } => {
            let mut v: Vec<&mut Expr> = receiver.as_deref_mut().into_iter().collect();
            v.extend(args.iter_mut());
            v
        }
        Expr::Variable { .. } | Expr::Instantiate { .. } | Expr::Integer { .. } | Expr::String { .. } | Expr::Boolean { .. } => {
            vec![]
        }
        Expr::Negation { expr, .. } | Expr::Complement { expr, .. } | Expr::IsVoid { expr, .. } => vec![expr.as_mut()],
        Expr::Binary { left, right, .. } => vec![left.as_mut(), right.as_mut()],
    }
}

fn find_let_by_span(expr: &mut Expr, span: Span) -> Option<&mut Expr> {
    if let Expr::Let { span: s, .. } = expr {
        if *s == span {
            return Some(expr);
        }
    }
    for child in expr_children_mut(expr) {
        if let Some(found) = find_let_by_span(child, span) {
            return Some(found);
        }
    }
    None
}

fn apply_target(program: &mut Program, ctx: &mut Context, target: &WriteTarget, type_name: &str) {
    match target {
        WriteTarget::Attribute { class, attr } => {
            let class_name = ctx.get(*class).name.clone();
            ctx.get_mut(*class)
                .attributes
                .get_mut(attr)
                .expect("declared by the type builder")
                .type_name = type_name.to_string();
            if let Some(decl) = program.classes.iter_mut().find(|c| c.name == class_name) {
                for feature in &mut decl.features {
                    if let Feature::Attr(a) = feature {
                        if a.name == *attr {
                            a.type_name = type_name.to_string();
                        }
                    }
                }
            }
        }
        WriteTarget::Param { class, method, index, .. } => {
            let class_name = ctx.get(*class).name.clone();
            ctx.get_mut(*class)
                .methods
                .get_mut(method)
                .expect("declared by the type builder")
                .params[*index]
                .1 = type_name.to_string();
            if let Some(decl) = program.classes.iter_mut().find(|c| c.name == class_name) {
                for feature in &mut decl.features {
                    if let Feature::Method(m) = feature {
                        if m.name == *method {
                            m.params[*index].1 = type_name.to_string();
                        }
                    }
                }
            }
        }
        WriteTarget::Return { class, method } => {
            let class_name = ctx.get(*class).name.clone();
            ctx.get_mut(*class)
                .methods
                .get_mut(method)
                .expect("declared by the type builder")
                .return_type = type_name.to_string();
            if let Some(decl) = program.classes.iter_mut().find(|c| c.name == class_name) {
                for feature in &mut decl.features {
                    if let Feature::Method(m) = feature {
                        if m.name == *method {
                            m.return_type = type_name.to_string();
                        }
                    }
                }
            }
        }
        WriteTarget::LetBinding { span, index, .. } => {
            for class in &mut program.classes {
                for feature in &mut class.features {
                    let body = match feature {
                        Feature::Attr(a) => a.init.as_mut(),
                        Feature::Method(m) => Some(&mut m.body),
                    };
                    if let Some(expr) = body {
                        if let Some(Expr::Let { bindings, .. }) = find_let_by_span(expr, *span) {
                            bindings[*index].1 = type_name.to_string();
                        }
                    }
                }
            }
        }
    }
}

/// Builds the dependency graph for every class, solves it, writes the
/// result into both `ctx` and `program`, and records an `InferenceError`
/// for any slot the solver never actually reached.
pub fn infer(program: &mut Program, ctx: &mut Context, errors: &mut Vec<SemanticError>) {
    let mut builder = Builder::new(ctx);

    for class in &program.classes {
        let Some(class_id) = ctx.lookup(&class.name) else { continue };
        builder.build_class(ctx, class_id);
    }

    let mut graph = builder.graph;
    solve(&mut graph, ctx);

    let object = ctx.lookup(types::OBJECT).expect("Object is always installed");
    for node in &mut graph.nodes {
        if node.resolved.is_none() {
            for target in &node.targets {
                errors.push(SemanticError::InferenceError { slot: target.label(ctx) });
            }
            node.resolved = Some(object);
        }
    }

    for node in &graph.nodes {
        let ty = node.resolved.expect("defaulted above");
        if node.targets.is_empty() {
            continue;
        }
        let type_name = ctx.get(ty).name.clone();
        for target in &node.targets {
            apply_target(program, ctx, target, &type_name);
        }
    }

    debug!(classes = program.classes.len(), "inference resolved AUTO_TYPE slots");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use crate::collect::collect;
    use crate::overrides::check_overrides;
    use crate::topo::topological_sort;
    use cool_lexer::Lexer;

    fn run(src: &str) -> (Program, Context, Vec<SemanticError>) {
        let (tokens, _) = Lexer::tokenize(src);
        let (mut program, _) = cool_parser::parse(&tokens).unwrap();
        let mut errors = Vec::new();
        let mut ctx = collect(&program, &mut errors);
        build(&program, &mut ctx, &mut errors);
        topological_sort(&mut program, &mut ctx, &mut errors);
        check_overrides(&program, &ctx, &mut errors);
        infer(&mut program, &mut ctx, &mut errors);
        (program, ctx, errors)
    }

    fn method_return<'a>(ctx: &'a Context, class: &str, method: &str) -> &'a str {
        let id = ctx.lookup(class).unwrap();
        &ctx.get(id).methods.get(method).unwrap().return_type
    }

    fn method_param<'a>(ctx: &'a Context, class: &str, method: &str, index: usize) -> &'a str {
        let id = ctx.lookup(class).unwrap();
        &ctx.get(id).methods.get(method).unwrap().params[index].1
    }

    #[test]
    fn no_auto_type_is_a_no_op() {
        let (_, _, errors) = run("class Main { main(): Int { 1 + 2 }; };");
        assert!(errors.is_empty());
    }

    #[test]
    fn attribute_infers_from_literal_init() {
        let (_, ctx, errors) = run("class Main { x: AUTO_TYPE <- 5; main(): Object { 0 }; };");
        assert!(errors.is_empty());
        let id = ctx.lookup("Main").unwrap();
        assert_eq!(ctx.get(id).attributes.get("x").unwrap().type_name, "Int");
    }

    #[test]
    fn let_binding_infers_from_init() {
        let (_, _, errors) = run(
            "class Main { main(): Int { let x: AUTO_TYPE <- 1 + 1 in x }; };",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn unresolved_slot_defaults_to_object_and_reports_error() {
        let (_, ctx, errors) = run("class Main { f(x: AUTO_TYPE): AUTO_TYPE { x }; main(): Object { 0 }; };");
        assert_eq!(method_param(&ctx, "Main", "f", 0), "Object");
        assert_eq!(method_return(&ctx, "Main", "f"), "Object");
        assert!(errors.iter().any(|e| matches!(e, SemanticError::InferenceError { .. })));
    }

    #[test]
    fn mutually_recursive_methods_infer_int_by_fixed_point() {
        let src = "class Main {
            main(): Object { 0 };
            f(a: AUTO_TYPE, b: AUTO_TYPE): AUTO_TYPE {
                if a = 1 then b else g(a + 1, b / 1) fi
            };
            g(a: AUTO_TYPE, b: AUTO_TYPE): AUTO_TYPE {
                if b = 1 then a else f(a / 2, b + 1) fi
            };
        };";
        let (_, ctx, errors) = run(src);
        assert!(errors.is_empty());
        assert_eq!(method_param(&ctx, "Main", "f", 0), "Int");
        assert_eq!(method_param(&ctx, "Main", "f", 1), "Int");
        assert_eq!(method_return(&ctx, "Main", "f"), "Int");
        assert_eq!(method_param(&ctx, "Main", "g", 0), "Int");
        assert_eq!(method_param(&ctx, "Main", "g", 1), "Int");
        assert_eq!(method_return(&ctx, "Main", "g"), "Int");
    }
}
