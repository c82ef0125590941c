//! COOL's attributed LALR(1) grammar, built on top of [`cool_grammar`].
//!
//! Non-terminal and terminal names mirror the donor language's own grammar
//! module: `program`, `class-list`, `class-def`, `feature-list`,
//! `attribute`, `method`, `param-list`, `block`, `declaration-list`,
//! `case-list`, `function-call`, `expr-list`, `not-empty-expr-list`,
//! `expr`, `comp`, `arith`, `term`, `factor`, `atom` -- each layer in the
//! `expr -> comp -> arith -> term -> factor -> atom` chain encodes one
//! level of operator precedence without an explicit precedence table.

use std::rc::Rc;

use cool_common::Span;
use cool_grammar::{build_lalr, Grammar, NonterminalId, ReductionRule, Symbol, Tables, TerminalId};
use cool_lexer::Token;
use rustc_hash::FxHashMap;

use crate::ast::{AttrDecl, BinOp, CaseBranch, ClassDecl, Expr, Feature, MethodDecl, Program};
use crate::error::TableError;
use crate::value::Value;

/// The built grammar plus its compiled LALR(1) tables and a name -> id
/// lookup for terminals, so the driver can translate a lexed
/// `TokenKind::terminal_name()` into the `TerminalId` the tables expect.
pub struct CoolGrammar {
    pub grammar: Grammar<Value>,
    pub tables: Tables,
    pub terminal_by_name: FxHashMap<&'static str, TerminalId>,
}

fn t(id: TerminalId) -> Symbol {
    Symbol::Terminal(id)
}

fn n(id: NonterminalId) -> Symbol {
    Symbol::Nonterminal(id)
}

fn type_name(tok: Token) -> (String, Span) {
    (tok.lexeme, tok.span)
}

impl CoolGrammar {
    pub fn build() -> Result<CoolGrammar, TableError> {
        let mut g: Grammar<Value> = Grammar::new();
        let mut terminal_by_name: FxHashMap<&'static str, TerminalId> = FxHashMap::default();

        macro_rules! term {
            ($name:expr) => {{
                let id = g.add_terminal($name);
                terminal_by_name.insert($name, id);
                id
            }};
        }

        let lbrace = term!("{");
        let rbrace = term!("}");
        let lparen = term!("(");
        let rparen = term!(")");
        let dot = term!(".");
        let comma = term!(",");
        let colon = term!(":");
        let semi = term!(";");
        let at = term!("@");
        let assign = term!("<-");
        let darrow = term!("=>");

        let kw_class = term!("class");
        let kw_inherits = term!("inherits");
        let kw_if = term!("if");
        let kw_then = term!("then");
        let kw_else = term!("else");
        let kw_fi = term!("fi");
        let kw_while = term!("while");
        let kw_loop = term!("loop");
        let kw_pool = term!("pool");
        let kw_let = term!("let");
        let kw_in = term!("in");
        let kw_case = term!("case");
        let kw_of = term!("of");
        let kw_esac = term!("esac");
        let kw_new = term!("new");
        let kw_isvoid = term!("isvoid");
        let kw_not = term!("not");
        let kw_true = term!("true");
        let kw_false = term!("false");

        let plus = term!("+");
        let minus = term!("-");
        let star = term!("*");
        let slash = term!("/");
        let lt = term!("<");
        let le = term!("<=");
        let eq = term!("=");
        let tilde = term!("~");

        let id = term!("id");
        let type_t = term!("type");
        let integer = term!("integer");
        let string = term!("string");

        let error = g.error;
        terminal_by_name.insert("EOF", g.eof);

        let program = g.add_nonterminal("program");
        let class_list = g.add_nonterminal("class-list");
        let class_def = g.add_nonterminal("class-def");
        let feature_list = g.add_nonterminal("feature-list");
        let attribute = g.add_nonterminal("attribute");
        let method = g.add_nonterminal("method");
        let param_list = g.add_nonterminal("param-list");
        let block = g.add_nonterminal("block");
        let declaration_list = g.add_nonterminal("declaration-list");
        let case_list = g.add_nonterminal("case-list");
        let function_call = g.add_nonterminal("function-call");
        let expr_list = g.add_nonterminal("expr-list");
        let not_empty_expr_list = g.add_nonterminal("not-empty-expr-list");
        let expr = g.add_nonterminal("expr");
        let comp = g.add_nonterminal("comp");
        let arith = g.add_nonterminal("arith");
        let term_nt = g.add_nonterminal("term");
        let factor = g.add_nonterminal("factor");
        let atom = g.add_nonterminal("atom");

        g.set_start(program);

        // program -> class-list
        let rule: ReductionRule<Value> = Rc::new(|f| Value::Program(Program { classes: f.take(1).class_list() }));
        g.add_production(program, vec![n(class_list)], Some(rule));

        // class-list -> class-def
        let rule: ReductionRule<Value> = Rc::new(|f| Value::ClassList(vec![f.take(1).class_decl()]));
        g.add_production(class_list, vec![n(class_def)], Some(rule));

        // class-list -> class-def class-list
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let head = f.take(1).class_decl();
            let mut rest = f.take(2).class_list();
            rest.insert(0, head);
            Value::ClassList(rest)
        });
        g.add_production(class_list, vec![n(class_def), n(class_list)], Some(rule));

        // class-def -> class type { feature-list }
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw = f.take(1).token();
            let (name, _) = type_name(f.take(2).token());
            let features = f.take(4).feature_list();
            let close = f.take(5).token();
            Value::ClassDecl(ClassDecl {
                name,
                parent: None,
                features,
                span: kw.span.merge(close.span),
            })
        });
        g.add_production(
            class_def,
            vec![t(kw_class), t(type_t), t(lbrace), n(feature_list), t(rbrace)],
            Some(rule),
        );

        // class-def -> class type inherits type { feature-list }
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw = f.take(1).token();
            let (name, _) = type_name(f.take(2).token());
            let (parent, _) = type_name(f.take(4).token());
            let features = f.take(6).feature_list();
            let close = f.take(7).token();
            Value::ClassDecl(ClassDecl {
                name,
                parent: Some(parent),
                features,
                span: kw.span.merge(close.span),
            })
        });
        g.add_production(
            class_def,
            vec![
                t(kw_class),
                t(type_t),
                t(kw_inherits),
                t(type_t),
                t(lbrace),
                n(feature_list),
                t(rbrace),
            ],
            Some(rule),
        );

        // feature-list -> <empty>
        let rule: ReductionRule<Value> = Rc::new(|_f| Value::FeatureList(vec![]));
        g.add_production(feature_list, vec![], Some(rule));

        // feature-list -> attribute ; feature-list
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let head = f.take(1).feature();
            let mut rest = f.take(3).feature_list();
            rest.insert(0, head);
            Value::FeatureList(rest)
        });
        g.add_production(feature_list, vec![n(attribute), t(semi), n(feature_list)], Some(rule));

        // feature-list -> method ; feature-list
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let head = f.take(1).feature();
            let mut rest = f.take(3).feature_list();
            rest.insert(0, head);
            Value::FeatureList(rest)
        });
        g.add_production(feature_list, vec![n(method), t(semi), n(feature_list)], Some(rule));

        // attribute -> id : type
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            Value::Feature(Feature::Attr(AttrDecl {
                name: name_tok.lexeme.clone(),
                type_name: type_tok.lexeme.clone(),
                init: None,
                span: name_tok.span.merge(type_tok.span),
            }))
        });
        g.add_production(attribute, vec![t(id), t(colon), t(type_t)], Some(rule));

        // attribute -> id : type <- expr
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let init = f.take(5).expr();
            let span = name_tok.span.merge(init.span());
            Value::Feature(Feature::Attr(AttrDecl {
                name: name_tok.lexeme.clone(),
                type_name: type_tok.lexeme.clone(),
                init: Some(init),
                span,
            }))
        });
        g.add_production(
            attribute,
            vec![t(id), t(colon), t(type_t), t(assign), n(expr)],
            Some(rule),
        );

        // method -> id ( ) : type { expr }
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let ret_tok = f.take(5).token();
            let body = f.take(7).expr();
            let close = f.take(8).token();
            Value::Feature(Feature::Method(MethodDecl {
                name: name_tok.lexeme.clone(),
                params: vec![],
                return_type: ret_tok.lexeme.clone(),
                body,
                span: name_tok.span.merge(close.span),
            }))
        });
        g.add_production(
            method,
            vec![
                t(id),
                t(lparen),
                t(rparen),
                t(colon),
                t(type_t),
                t(lbrace),
                n(expr),
                t(rbrace),
            ],
            Some(rule),
        );

        // method -> id ( param-list ) : type { expr }
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let params = f.take(3).param_list();
            let ret_tok = f.take(6).token();
            let body = f.take(8).expr();
            let close = f.take(9).token();
            Value::Feature(Feature::Method(MethodDecl {
                name: name_tok.lexeme.clone(),
                params,
                return_type: ret_tok.lexeme.clone(),
                body,
                span: name_tok.span.merge(close.span),
            }))
        });
        g.add_production(
            method,
            vec![
                t(id),
                t(lparen),
                n(param_list),
                t(rparen),
                t(colon),
                t(type_t),
                t(lbrace),
                n(expr),
                t(rbrace),
            ],
            Some(rule),
        );

        // param-list -> id : type
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            Value::ParamList(vec![(name_tok.lexeme.clone(), type_tok.lexeme.clone())])
        });
        g.add_production(param_list, vec![t(id), t(colon), t(type_t)], Some(rule));

        // param-list -> id : type , param-list
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let mut rest = f.take(5).param_list();
            rest.insert(0, (name_tok.lexeme.clone(), type_tok.lexeme.clone()));
            Value::ParamList(rest)
        });
        g.add_production(
            param_list,
            vec![t(id), t(colon), t(type_t), t(comma), n(param_list)],
            Some(rule),
        );

        // expr -> id <- expr
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let value = f.take(3).expr();
            let span = name_tok.span.merge(value.span());
            Value::Expr(Expr::Assign {
                name: name_tok.lexeme.clone(),
                value: Box::new(value),
                span,
            })
        });
        g.add_production(expr, vec![t(id), t(assign), n(expr)], Some(rule));

        // expr -> { block }
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let open = f.take(1).token();
            let exprs = f.take(2).block();
            let close = f.take(3).token();
            Value::Expr(Expr::Block {
                exprs,
                span: open.span.merge(close.span),
            })
        });
        g.add_production(expr, vec![t(lbrace), n(block), t(rbrace)], Some(rule));

        // expr -> if expr then expr else expr fi
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw_if_tok = f.take(1).token();
            let cond = f.take(2).expr();
            let then_branch = f.take(4).expr();
            let else_branch = f.take(6).expr();
            let kw_fi_tok = f.take(7).token();
            Value::Expr(Expr::Conditional {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
                span: kw_if_tok.span.merge(kw_fi_tok.span),
            })
        });
        g.add_production(
            expr,
            vec![
                t(kw_if),
                n(expr),
                t(kw_then),
                n(expr),
                t(kw_else),
                n(expr),
                t(kw_fi),
            ],
            Some(rule),
        );

        // expr -> while expr loop expr pool
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw_while_tok = f.take(1).token();
            let cond = f.take(2).expr();
            let body = f.take(4).expr();
            let kw_pool_tok = f.take(5).token();
            Value::Expr(Expr::While {
                cond: Box::new(cond),
                body: Box::new(body),
                span: kw_while_tok.span.merge(kw_pool_tok.span),
            })
        });
        g.add_production(
            expr,
            vec![t(kw_while), n(expr), t(kw_loop), n(expr), t(kw_pool)],
            Some(rule),
        );

        // expr -> let declaration-list in expr
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw_let_tok = f.take(1).token();
            let bindings = f.take(2).decl_list();
            let body = f.take(4).expr();
            let span = kw_let_tok.span.merge(body.span());
            Value::Expr(Expr::Let {
                bindings,
                body: Box::new(body),
                span,
            })
        });
        g.add_production(expr, vec![t(kw_let), n(declaration_list), t(kw_in), n(expr)], Some(rule));

        // expr -> case expr of case-list esac
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw_case_tok = f.take(1).token();
            let scrutinee = f.take(2).expr();
            let branches = f.take(4).case_list();
            let kw_esac_tok = f.take(5).token();
            Value::Expr(Expr::SwitchCase {
                scrutinee: Box::new(scrutinee),
                branches,
                span: kw_case_tok.span.merge(kw_esac_tok.span),
            })
        });
        g.add_production(
            expr,
            vec![t(kw_case), n(expr), t(kw_of), n(case_list), t(kw_esac)],
            Some(rule),
        );

        // expr -> not expr
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw_not_tok = f.take(1).token();
            let inner = f.take(2).expr();
            let span = kw_not_tok.span.merge(inner.span());
            Value::Expr(Expr::Negation {
                expr: Box::new(inner),
                span,
            })
        });
        g.add_production(expr, vec![t(kw_not), n(expr)], Some(rule));

        // expr -> comp
        let rule: ReductionRule<Value> = Rc::new(|f| f.take(1));
        g.add_production(expr, vec![n(comp)], Some(rule));

        // comp -> arith < arith | arith <= arith | arith = arith | arith
        let make_binop = |op: BinOp| -> ReductionRule<Value> {
            Rc::new(move |f| {
                let left = f.take(1).expr();
                let right = f.take(3).expr();
                let span = left.span().merge(right.span());
                Value::Expr(Expr::Binary {
                    op: op.clone(),
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                })
            })
        };
        g.add_production(comp, vec![n(arith), t(lt), n(arith)], Some(make_binop(BinOp::LessThan)));
        g.add_production(comp, vec![n(arith), t(le), n(arith)], Some(make_binop(BinOp::LessEqual)));
        g.add_production(comp, vec![n(arith), t(eq), n(arith)], Some(make_binop(BinOp::Equal)));
        let rule: ReductionRule<Value> = Rc::new(|f| f.take(1));
        g.add_production(comp, vec![n(arith)], Some(rule));

        // arith -> arith + term | arith - term | term
        g.add_production(arith, vec![n(arith), t(plus), n(term_nt)], Some(make_binop(BinOp::Plus)));
        g.add_production(arith, vec![n(arith), t(minus), n(term_nt)], Some(make_binop(BinOp::Minus)));
        let rule: ReductionRule<Value> = Rc::new(|f| f.take(1));
        g.add_production(arith, vec![n(term_nt)], Some(rule));

        // term -> term * factor | term / factor | factor
        g.add_production(term_nt, vec![n(term_nt), t(star), n(factor)], Some(make_binop(BinOp::Star)));
        g.add_production(term_nt, vec![n(term_nt), t(slash), n(factor)], Some(make_binop(BinOp::Div)));
        let rule: ReductionRule<Value> = Rc::new(|f| f.take(1));
        g.add_production(term_nt, vec![n(factor)], Some(rule));

        // factor -> isvoid factor | ~ factor | atom
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw_tok = f.take(1).token();
            let inner = f.take(2).expr();
            let span = kw_tok.span.merge(inner.span());
            Value::Expr(Expr::IsVoid {
                expr: Box::new(inner),
                span,
            })
        });
        g.add_production(factor, vec![t(kw_isvoid), n(factor)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let tilde_tok = f.take(1).token();
            let inner = f.take(2).expr();
            let span = tilde_tok.span.merge(inner.span());
            Value::Expr(Expr::Complement {
                expr: Box::new(inner),
                span,
            })
        });
        g.add_production(factor, vec![t(tilde), n(factor)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| f.take(1));
        g.add_production(factor, vec![n(atom)], Some(rule));

        // atom -> id | true | false | integer | string | function-call
        //       | new type | ( expr )
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let tok = f.take(1).token();
            Value::Expr(Expr::Variable {
                name: tok.lexeme.clone(),
                span: tok.span,
            })
        });
        g.add_production(atom, vec![t(id)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let tok = f.take(1).token();
            Value::Expr(Expr::Boolean { value: true, span: tok.span })
        });
        g.add_production(atom, vec![t(kw_true)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let tok = f.take(1).token();
            Value::Expr(Expr::Boolean { value: false, span: tok.span })
        });
        g.add_production(atom, vec![t(kw_false)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let tok = f.take(1).token();
            let value = match &tok.kind {
                cool_lexer::TokenKind::Int(v) => *v,
                _ => unreachable!("integer terminal must carry TokenKind::Int"),
            };
            Value::Expr(Expr::Integer { value, span: tok.span })
        });
        g.add_production(atom, vec![t(integer)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let tok = f.take(1).token();
            let value = match tok.kind {
                cool_lexer::TokenKind::Str(s) => s,
                _ => unreachable!("string terminal must carry TokenKind::Str"),
            };
            Value::Expr(Expr::String { value, span: tok.span })
        });
        g.add_production(atom, vec![t(string)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| f.take(1));
        g.add_production(atom, vec![n(function_call)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let kw_tok = f.take(1).token();
            let type_tok = f.take(2).token();
            Value::Expr(Expr::Instantiate {
                type_name: type_tok.lexeme.clone(),
                span: kw_tok.span.merge(type_tok.span),
            })
        });
        g.add_production(atom, vec![t(kw_new), t(type_t)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| f.take(2));
        g.add_production(atom, vec![t(lparen), n(expr), t(rparen)], Some(rule));

        // block -> expr ; | expr ; block
        let rule: ReductionRule<Value> = Rc::new(|f| Value::Block(vec![f.take(1).expr()]));
        g.add_production(block, vec![n(expr), t(semi)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let head = f.take(1).expr();
            let mut rest = f.take(3).block();
            rest.insert(0, head);
            Value::Block(rest)
        });
        g.add_production(block, vec![n(expr), t(semi), n(block)], Some(rule));

        // declaration-list: four forms (with/without init, with/without tail)
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            Value::DeclList(vec![(name_tok.lexeme.clone(), type_tok.lexeme.clone(), None)])
        });
        g.add_production(declaration_list, vec![t(id), t(colon), t(type_t)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let init = f.take(5).expr();
            Value::DeclList(vec![(name_tok.lexeme.clone(), type_tok.lexeme.clone(), Some(init))])
        });
        g.add_production(
            declaration_list,
            vec![t(id), t(colon), t(type_t), t(assign), n(expr)],
            Some(rule),
        );

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let mut rest = f.take(5).decl_list();
            rest.insert(0, (name_tok.lexeme.clone(), type_tok.lexeme.clone(), None));
            Value::DeclList(rest)
        });
        g.add_production(
            declaration_list,
            vec![t(id), t(colon), t(type_t), t(comma), n(declaration_list)],
            Some(rule),
        );

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let init = f.take(5).expr();
            let mut rest = f.take(7).decl_list();
            rest.insert(0, (name_tok.lexeme.clone(), type_tok.lexeme.clone(), Some(init)));
            Value::DeclList(rest)
        });
        g.add_production(
            declaration_list,
            vec![
                t(id),
                t(colon),
                t(type_t),
                t(assign),
                n(expr),
                t(comma),
                n(declaration_list),
            ],
            Some(rule),
        );

        // case-list -> id : type => expr ; | id : type => expr ; case-list
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let body = f.take(5).expr();
            let semi_tok = f.take(6).token();
            Value::CaseList(vec![CaseBranch {
                name: name_tok.lexeme.clone(),
                type_name: type_tok.lexeme.clone(),
                span: name_tok.span.merge(semi_tok.span),
                body,
            }])
        });
        g.add_production(
            case_list,
            vec![t(id), t(colon), t(type_t), t(darrow), n(expr), t(semi)],
            Some(rule),
        );

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let body = f.take(5).expr();
            let semi_tok = f.take(6).token();
            let mut rest = f.take(7).case_list();
            rest.insert(
                0,
                CaseBranch {
                    name: name_tok.lexeme.clone(),
                    type_name: type_tok.lexeme.clone(),
                    span: name_tok.span.merge(semi_tok.span),
                    body,
                },
            );
            Value::CaseList(rest)
        });
        g.add_production(
            case_list,
            vec![
                t(id),
                t(colon),
                t(type_t),
                t(darrow),
                n(expr),
                t(semi),
                n(case_list),
            ],
            Some(rule),
        );

        // function-call -> id ( expr-list )
        //               | atom . id ( expr-list )
        //               | atom @ type . id ( expr-list )
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let args = f.take(3).expr_list();
            let close = f.take(4).token();
            Value::Expr(Expr::MethodCall {
                receiver: None,
                ancestor: None,
                method: name_tok.lexeme.clone(),
                args,
                span: name_tok.span.merge(close.span),
            })
        });
        g.add_production(function_call, vec![t(id), t(lparen), n(expr_list), t(rparen)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let receiver = f.take(1).expr();
            let name_tok = f.take(3).token();
            let args = f.take(5).expr_list();
            let close = f.take(6).token();
            let span = receiver.span().merge(close.span);
            Value::Expr(Expr::MethodCall {
                receiver: Some(Box::new(receiver)),
                ancestor: None,
                method: name_tok.lexeme.clone(),
                args,
                span,
            })
        });
        g.add_production(
            function_call,
            vec![n(atom), t(dot), t(id), t(lparen), n(expr_list), t(rparen)],
            Some(rule),
        );

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let receiver = f.take(1).expr();
            let ancestor_tok = f.take(3).token();
            let name_tok = f.take(5).token();
            let args = f.take(7).expr_list();
            let close = f.take(8).token();
            let span = receiver.span().merge(close.span);
            Value::Expr(Expr::MethodCall {
                receiver: Some(Box::new(receiver)),
                ancestor: Some(ancestor_tok.lexeme.clone()),
                method: name_tok.lexeme.clone(),
                args,
                span,
            })
        });
        g.add_production(
            function_call,
            vec![
                n(atom),
                t(at),
                t(type_t),
                t(dot),
                t(id),
                t(lparen),
                n(expr_list),
                t(rparen),
            ],
            Some(rule),
        );

        // expr-list -> <empty> | not-empty-expr-list
        let rule: ReductionRule<Value> = Rc::new(|_f| Value::ExprList(vec![]));
        g.add_production(expr_list, vec![], Some(rule));
        let rule: ReductionRule<Value> = Rc::new(|f| f.take(1));
        g.add_production(expr_list, vec![n(not_empty_expr_list)], Some(rule));

        // not-empty-expr-list -> expr | expr , not-empty-expr-list
        let rule: ReductionRule<Value> = Rc::new(|f| Value::ExprList(vec![f.take(1).expr()]));
        g.add_production(not_empty_expr_list, vec![n(expr)], Some(rule));
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let head = f.take(1).expr();
            let mut rest = f.take(3).expr_list();
            rest.insert(0, head);
            Value::ExprList(rest)
        });
        g.add_production(
            not_empty_expr_list,
            vec![n(expr), t(comma), n(not_empty_expr_list)],
            Some(rule),
        );

        // Error productions. The driver detects a use of `ERROR` generically
        // and appends the diagnostic itself (see `driver.rs`); the rules
        // here only need to build the recovered value.
        let rule: ReductionRule<Value> = Rc::new(|f| {
            let head = f.take(1).feature();
            let mut rest = f.take(3).feature_list();
            rest.insert(0, head);
            Value::FeatureList(rest)
        });
        g.add_production(feature_list, vec![n(attribute), t(error), n(feature_list)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let head = f.take(1).feature();
            let mut rest = f.take(3).feature_list();
            rest.insert(0, head);
            Value::FeatureList(rest)
        });
        g.add_production(feature_list, vec![n(method), t(error), n(feature_list)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let body = f.take(5).expr();
            Value::CaseList(vec![CaseBranch {
                name: name_tok.lexeme.clone(),
                type_name: type_tok.lexeme.clone(),
                span: name_tok.span.merge(body.span()),
                body,
            }])
        });
        g.add_production(
            case_list,
            vec![t(id), t(colon), t(type_t), t(darrow), n(expr), t(error)],
            Some(rule),
        );

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let name_tok = f.take(1).token();
            let type_tok = f.take(3).token();
            let body = f.take(5).expr();
            let mut rest = f.take(7).case_list();
            rest.insert(
                0,
                CaseBranch {
                    name: name_tok.lexeme.clone(),
                    type_name: type_tok.lexeme.clone(),
                    span: name_tok.span.merge(body.span()),
                    body,
                },
            );
            Value::CaseList(rest)
        });
        g.add_production(
            case_list,
            vec![
                t(id),
                t(colon),
                t(type_t),
                t(darrow),
                n(expr),
                t(error),
                n(case_list),
            ],
            Some(rule),
        );

        let rule: ReductionRule<Value> = Rc::new(|f| Value::Block(vec![f.take(1).expr()]));
        g.add_production(block, vec![n(expr), t(error)], Some(rule));

        let rule: ReductionRule<Value> = Rc::new(|f| {
            let head = f.take(1).expr();
            let mut rest = f.take(3).block();
            rest.insert(0, head);
            Value::Block(rest)
        });
        g.add_production(block, vec![n(expr), t(error), n(block)], Some(rule));

        g.augment();
        let tables = build_lalr(&g).map_err(|conflicts| TableError { conflicts })?;

        Ok(CoolGrammar {
            grammar: g,
            tables,
            terminal_by_name,
        })
    }
}
