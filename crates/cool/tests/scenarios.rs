//! End-to-end scenarios exercising the full lexer -> parser -> sema ->
//! evaluator pipeline through `cool::run`/`cool::compile`.

use cool::{compile, run, RunError};
use cool_eval::{instance, io::MockIo};
use cool_sema::SemanticError;

#[test]
fn hello_world_prints_and_runs_cleanly() {
    let mut io = MockIo::default();
    let result = run(
        r#"class Main inherits IO { main(): IO { out_string("Hello, World.\n") }; }"#,
        &mut io,
    );
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(io.output, "Hello, World.\n");
}

#[test]
fn arithmetic_precedence_binds_multiplication_tighter() {
    let mut io = MockIo::default();
    let value = run("class Main { main(): Int { 1 + 2 * 3 }; }", &mut io).unwrap();
    assert_eq!(instance::as_int(&value), 7);
}

#[test]
fn auto_type_inference_resolves_mutually_recursive_methods_to_int() {
    let outcome = compile(
        "class Main { main(): Object { 0 };
           f(a: AUTO_TYPE, b: AUTO_TYPE): AUTO_TYPE {
             if a = 1 then b else g(a + 1, b / 1) fi };
           g(a: AUTO_TYPE, b: AUTO_TYPE): AUTO_TYPE {
             if b = 1 then a else f(a / 2, b + 1) fi }; }",
    )
    .unwrap();
    assert!(outcome.semantic_errors.is_empty(), "{:?}", outcome.semantic_errors);

    let main = outcome.ctx.lookup("Main").unwrap();
    let ty = outcome.ctx.get(main);
    let int_name = cool_sema::types::INT;
    assert_eq!(ty.methods["f"].params[0].1, int_name);
    assert_eq!(ty.methods["f"].params[1].1, int_name);
    assert_eq!(ty.methods["f"].return_type, int_name);
    assert_eq!(ty.methods["g"].params[0].1, int_name);
    assert_eq!(ty.methods["g"].params[1].1, int_name);
    assert_eq!(ty.methods["g"].return_type, int_name);
}

#[test]
fn case_selects_the_most_specific_matching_branch() {
    let mut io = MockIo::default();
    let result = run(
        "class A{}; class B inherits A{}; class C inherits A{};
         class Main inherits IO { main(): IO {
           let a: A <- new C in case a of
              x: B => out_string(\"B\\n\");
              x: C => out_string(\"C\\n\"); esac }; }",
        &mut io,
    );
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(io.output, "C\n");
}

#[test]
fn overriding_with_a_different_return_type_is_reported_and_pipeline_continues() {
    let outcome = compile(
        "class A { f(): Int { 0 }; };
         class B inherits A { f(): Bool { true }; };
         class Main { main(): Int { 0 }; };",
    )
    .unwrap();
    assert!(outcome
        .semantic_errors
        .iter()
        .any(|e| matches!(e, SemanticError::OverrideMethodSignature { class, method }
            if class == "B" && method == "f")));
    // Later passes still ran: Main is fully elaborated despite B's error.
    assert!(outcome.ctx.contains("Main"));
}

#[test]
fn unterminated_string_is_reported_as_a_lexical_error() {
    let outcome = compile("class Main { main(): Int { \"abc };").unwrap();
    assert!(!outcome.lex_errors.is_empty());
    assert!(outcome
        .lex_errors
        .iter()
        .any(|e| e.message.contains("string constant")));
}

#[test]
fn dispatch_on_void_surfaces_as_a_run_error() {
    let mut io = MockIo::default();
    let err = run("class Main { x: Main; main(): Object { x.main() }; }", &mut io).unwrap_err();
    assert!(matches!(err, RunError::Execution(cool_eval::ExecutionError::VoidReference { .. })));
}
