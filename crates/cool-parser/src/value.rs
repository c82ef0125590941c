//! The synthesized-attribute value every reduction rule produces and
//! consumes. One variant per shape a non-terminal in COOL's grammar can
//! synthesize; terminals synthesize `Token` directly.

use cool_lexer::Token;

use crate::ast::{CaseBranch, ClassDecl, Expr, Feature, Program};

#[derive(Debug, Clone)]
pub enum Value {
    Token(Token),
    Program(Program),
    ClassList(Vec<ClassDecl>),
    ClassDecl(ClassDecl),
    FeatureList(Vec<Feature>),
    Feature(Feature),
    ParamList(Vec<(String, String)>),
    Block(Vec<Expr>),
    DeclList(Vec<(String, String, Option<Expr>)>),
    CaseList(Vec<CaseBranch>),
    Expr(Expr),
    ExprList(Vec<Expr>),
}

impl Value {
    pub fn token(self) -> Token {
        match self {
            Value::Token(t) => t,
            other => panic!("expected Token attribute, got {other:?}"),
        }
    }

    pub fn program(self) -> Program {
        match self {
            Value::Program(p) => p,
            other => panic!("expected Program attribute, got {other:?}"),
        }
    }

    pub fn class_list(self) -> Vec<ClassDecl> {
        match self {
            Value::ClassList(v) => v,
            other => panic!("expected ClassList attribute, got {other:?}"),
        }
    }

    pub fn class_decl(self) -> ClassDecl {
        match self {
            Value::ClassDecl(c) => c,
            other => panic!("expected ClassDecl attribute, got {other:?}"),
        }
    }

    pub fn feature_list(self) -> Vec<Feature> {
        match self {
            Value::FeatureList(v) => v,
            other => panic!("expected FeatureList attribute, got {other:?}"),
        }
    }

    pub fn feature(self) -> Feature {
        match self {
            Value::Feature(f) => f,
            other => panic!("expected Feature attribute, got {other:?}"),
        }
    }

    pub fn param_list(self) -> Vec<(String, String)> {
        match self {
            Value::ParamList(v) => v,
            other => panic!("expected ParamList attribute, got {other:?}"),
        }
    }

    pub fn block(self) -> Vec<Expr> {
        match self {
            Value::Block(v) => v,
            other => panic!("expected Block attribute, got {other:?}"),
        }
    }

    pub fn decl_list(self) -> Vec<(String, String, Option<Expr>)> {
        match self {
            Value::DeclList(v) => v,
            other => panic!("expected DeclList attribute, got {other:?}"),
        }
    }

    pub fn case_list(self) -> Vec<CaseBranch> {
        match self {
            Value::CaseList(v) => v,
            other => panic!("expected CaseList attribute, got {other:?}"),
        }
    }

    pub fn expr(self) -> Expr {
        match self {
            Value::Expr(e) => e,
            other => panic!("expected Expr attribute, got {other:?}"),
        }
    }

    pub fn expr_list(self) -> Vec<Expr> {
        match self {
            Value::ExprList(v) => v,
            other => panic!("expected ExprList attribute, got {other:?}"),
        }
    }
}
