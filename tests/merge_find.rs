use morphic::{Engine, Error, Handler, Value};

fn tag(name: &'static str) -> Handler {
    Handler::new(move |_| Ok(Value::String(name.to_string())))
}

#[test]
fn find_returns_the_exact_overload() {
    let engine = Engine::new();
    let f = engine
        .function("f", vec![("int, int", tag("pair")), ("int, string", tag("mixed"))])
        .unwrap();

    let found = f.find("int, string").unwrap();
    assert_eq!(found.call(&[]).unwrap(), Value::String("mixed".into()));

    match f.find("string, int") {
        Err(Error::NotFound { signature }) => assert_eq!(signature, "string,int"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn find_round_trips_every_public_signature() {
    let engine = Engine::new();
    let f = engine
        .function(
            "f",
            vec![
                ("int", tag("a")),
                ("string, ...int", tag("b")),
                ("", tag("c")),
            ],
        )
        .unwrap();

    let keys: Vec<String> = f.signatures().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys.len(), 3);
    for key in keys {
        let direct = f
            .signatures()
            .find(|(k, _)| *k == key)
            .map(|(_, h)| h.call(&[]).unwrap())
            .unwrap();
        assert_eq!(f.find(&key).unwrap().call(&[]).unwrap(), direct);
    }
}

#[test]
fn find_accepts_a_sequence_of_type_names() {
    let engine = Engine::new();
    let f = engine
        .function("f", vec![("int, string", tag("mixed"))])
        .unwrap();

    let found = f.find_types(&["int", " string "]).unwrap();
    assert_eq!(found.call(&[]).unwrap(), Value::String("mixed".into()));
}

#[test]
fn conversion_twins_stay_out_of_the_public_signatures() {
    let mut engine = Engine::new();
    engine
        .add_conversion(morphic::Conversion::new("boolean", "int", |v| match v {
            Value::Bool(b) => Value::Int(if *b { 1 } else { 0 }),
            other => other.clone(),
        }))
        .unwrap();
    let f = engine.function("f", vec![("int", tag("int"))]).unwrap();

    let keys: Vec<&str> = f.signatures().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["int"]);
    assert!(f.find("int|boolean").is_err());
    // The widened def still dispatches.
    assert_eq!(f.call(&[Value::Bool(true)]).unwrap(), Value::String("int".into()));
}

#[test]
fn merge_combines_signature_maps() {
    let engine = Engine::new();
    let ints = engine.function("f", vec![("int", tag("int"))]).unwrap();
    let strings = engine.function("f", vec![("string", tag("string"))]).unwrap();

    let merged = engine.merge(&[ints, strings]).unwrap();
    assert_eq!(merged.name(), "f");
    assert_eq!(merged.call(&[Value::Int(1)]).unwrap(), Value::String("int".into()));
    assert_eq!(
        merged.call(&[Value::String("x".into())]).unwrap(),
        Value::String("string".into())
    );
}

#[test]
fn merge_order_does_not_change_the_signature_map() {
    let engine = Engine::new();
    let a = engine.function("f", vec![("int", tag("int"))]).unwrap();
    let b = engine.function("f", vec![("string", tag("string"))]).unwrap();
    let c = engine.function("f", vec![("list", tag("list"))]).unwrap();

    let forward = engine.merge(&[a.clone(), b.clone(), c.clone()]).unwrap();
    let backward = engine.merge(&[c, b, a]).unwrap();

    let mut forward_keys: Vec<String> =
        forward.signatures().map(|(k, _)| k.to_string()).collect();
    let mut backward_keys: Vec<String> =
        backward.signatures().map(|(k, _)| k.to_string()).collect();
    forward_keys.sort();
    backward_keys.sort();
    assert_eq!(forward_keys, backward_keys);

    for value in [Value::Int(1), Value::String("x".into()), Value::List(vec![])] {
        assert_eq!(
            forward.call(&[value.clone()]).unwrap(),
            backward.call(&[value]).unwrap()
        );
    }
}

#[test]
fn merge_rejects_conflicting_names() {
    let engine = Engine::new();
    let f = engine.function("f", vec![("int", tag("int"))]).unwrap();
    let g = engine.function("g", vec![("string", tag("string"))]).unwrap();

    match engine.merge(&[f, g]) {
        Err(Error::NameMismatch { expected, actual }) => {
            assert_eq!(expected, "f");
            assert_eq!(actual, "g");
        }
        other => panic!("Expected NameMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn merge_of_unnamed_functions_stays_unnamed() {
    let engine = Engine::new();
    let a = engine.function_anon(vec![("int", tag("int"))]).unwrap();
    let b = engine.function_anon(vec![("string", tag("string"))]).unwrap();

    let merged = engine.merge(&[a, b]).unwrap();
    assert_eq!(merged.name(), "");
}

#[test]
fn merge_adopts_the_only_named_input() {
    let engine = Engine::new();
    let named = engine.function("f", vec![("int", tag("int"))]).unwrap();
    let anon = engine.function_anon(vec![("string", tag("string"))]).unwrap();

    let merged = engine.merge(&[anon, named]).unwrap();
    assert_eq!(merged.name(), "f");
}

#[test]
fn merge_rejects_one_signature_with_two_implementations() {
    let engine = Engine::new();
    let a = engine.function("f", vec![("int", tag("a"))]).unwrap();
    let b = engine.function("f", vec![("int", tag("b"))]).unwrap();

    match engine.merge(&[a, b]) {
        Err(Error::DuplicateSignature { signature }) => assert_eq!(signature, "int"),
        other => panic!("Expected DuplicateSignature, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn merge_collapses_one_signature_bound_to_one_implementation() {
    let engine = Engine::new();
    let shared = tag("shared");
    let a = engine.function("f", vec![("int", shared.clone())]).unwrap();
    let b = engine
        .function("f", vec![("int", shared), ("string", tag("string"))])
        .unwrap();

    let merged = engine.merge(&[a, b]).unwrap();
    let keys: Vec<&str> = merged.signatures().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["int", "string"]);
}
