use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use morphic::{DispatchError, Engine, Error, Handler, Type, Value};

fn tag(name: &'static str) -> Handler {
    Handler::new(move |_| Ok(Value::String(name.to_string())))
}

fn dispatch_err(result: Result<Value, Error>) -> DispatchError {
    match result {
        Err(Error::Dispatch(err)) => err,
        other => panic!("Expected dispatch error, got {:?}", other),
    }
}

#[test]
fn wrong_type_carries_expected_union_and_index() {
    let engine = Engine::new();
    let f = engine
        .function("f", vec![("int", tag("int")), ("string", tag("string"))])
        .unwrap();

    let err = dispatch_err(f.call(&[Value::Bool(true)]));
    assert_eq!(
        err,
        DispatchError::WrongType {
            fn_name: "f".to_string(),
            index: 0,
            actual: "boolean".to_string(),
            expected: vec!["int".to_string(), "string".to_string()],
        }
    );
    assert_eq!(err.category(), "wrongType");
}

#[test]
fn too_few_args_points_at_the_missing_position() {
    let engine = Engine::new();
    let f = engine
        .function("f", vec![("string, ...int", tag("rest"))])
        .unwrap();

    let err = dispatch_err(f.call(&[Value::String("x".into())]));
    match err {
        DispatchError::TooFewArgs { ref fn_name, index, ref expected } => {
            assert_eq!(fn_name, "f");
            assert_eq!(index, 1);
            assert_eq!(expected, &vec!["int".to_string()]);
        }
        other => panic!("Expected tooFewArgs, got {:?}", other),
    }
}

#[test]
fn too_many_args_reports_the_longest_arity() {
    let engine = Engine::new();
    let f = engine.function("f", vec![("int", tag("one"))]).unwrap();

    let err = dispatch_err(f.call(&[Value::Int(1), Value::Int(2)]));
    assert_eq!(
        err,
        DispatchError::TooManyArgs {
            fn_name: "f".to_string(),
            actual: 2,
            expected_len: 1,
        }
    );
}

#[test]
fn mismatch_covers_interior_inconsistencies() {
    // Two predicates registered under one name: lookup compiles the first,
    // classification may match the second. Narrowing then succeeds while
    // the compiled predicate fails, which is exactly the mismatch fallback.
    let mut engine = Engine::empty();
    engine.add_type(Type::new("t", |v| matches!(v, Value::Int(_)))).unwrap();
    engine.add_type(Type::new("t", |v| matches!(v, Value::String(_)))).unwrap();

    let f = engine.function("f", vec![("t", tag("t"))]).unwrap();
    let err = dispatch_err(f.call(&[Value::String("x".into())]));
    assert_eq!(
        err,
        DispatchError::Mismatch {
            fn_name: "f".to_string(),
            actual: vec!["t".to_string()],
        }
    );
}

#[test]
fn no_signature_is_tried_after_a_report_is_built() {
    let ran = Arc::new(AtomicBool::new(false));
    let witness = ran.clone();
    let engine = Engine::new();
    let f = engine
        .function(
            "f",
            vec![(
                "int",
                Handler::new(move |_| {
                    witness.store(true, Ordering::SeqCst);
                    Ok(Value::Nil)
                }),
            )],
        )
        .unwrap();

    assert!(f.call(&[Value::String("x".into())]).is_err());
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn misplaced_rest_marker_is_a_syntax_error() {
    let engine = Engine::new();
    match engine.function("f", vec![("...int, string", tag("bad"))]) {
        Err(Error::Syntax { .. }) => {}
        other => panic!("Expected Syntax error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn unknown_type_comes_with_a_hint() {
    let engine = Engine::new();
    match engine.function("f", vec![("Int", tag("bad"))]) {
        Err(Error::UnknownType { name, suggestion }) => {
            assert_eq!(name, "Int");
            assert_eq!(suggestion.as_deref(), Some("int"));
        }
        other => panic!("Expected UnknownType, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn duplicate_signatures_with_different_handlers_are_rejected() {
    let engine = Engine::new();
    match engine.function("f", vec![("int", tag("a")), ("int ", tag("b"))]) {
        Err(Error::DuplicateSignature { signature }) => assert_eq!(signature, "int"),
        other => panic!("Expected DuplicateSignature, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn ignored_types_compile_away() {
    let mut engine = Engine::new();
    engine.ignore_type("nil");

    // "int|nil" compiles as if written "int".
    let f = engine.function("f", vec![("int|nil", tag("int"))]).unwrap();
    let keys: Vec<&str> = f.signatures().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["int"]);
    assert_eq!(f.call(&[Value::Int(1)]).unwrap(), Value::String("int".into()));
    assert!(f.call(&[Value::Nil]).is_err());

    // "nil" alone is dropped entirely, leaving nothing to compile.
    match engine.function("g", vec![("nil", tag("nil"))]) {
        Err(Error::NoSignatures) => {}
        other => panic!("Expected NoSignatures, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn messages_name_function_and_types() {
    let engine = Engine::new();
    let f = engine.function("pad", vec![("string, int", tag("pad"))]).unwrap();

    let err = dispatch_err(f.call(&[Value::String("x".into()), Value::Nil]));
    let message = Error::Dispatch(err).to_string();
    assert!(message.contains("function pad"));
    assert!(message.contains("expected: int"));
    assert!(message.contains("actual: nil"));
    assert!(message.contains("index: 1"));
}
