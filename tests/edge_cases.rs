use ruller_dsl::{
    source, CompileError, Dialect, Program, ProgramBuilder, RullerError, ValueKind,
};

/// Set `RUST_LOG=ruller_dsl=debug` to see pass decisions while debugging a test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn compile(json: &str) -> Result<Program, CompileError> {
    init_tracing();
    ProgramBuilder::new()
        .rule_group("menu", source::parse_document(json).unwrap())
        .compile()
}

#[test]
fn empty_document_is_a_single_root() {
    let program = compile("{}").unwrap();
    let nodes = program.nodes();
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].is_root());
    assert!(!nodes[0].explicit_condition);
    assert_eq!(nodes[0].compiled_condition, "true");
    assert!(nodes[0].output.is_empty());
}

#[test]
fn empty_items_array() {
    let program = compile(r#"{"_items": []}"#).unwrap();
    assert_eq!(program.nodes().len(), 1);
}

#[test]
fn single_map_items_is_one_child() {
    let program = compile(r#"{"_items": {"_condition": "input:a == 'x'", "label": "c"}}"#).unwrap();
    let nodes = program.nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].parent, Some(1));
    assert!(nodes[1].explicit_condition);
}

#[test]
fn deep_nesting() {
    let mut json = String::from("{}");
    for _ in 0..50 {
        json = format!(r#"{{"_items": [{json}]}}"#);
    }
    let program = compile(&json).unwrap();
    let nodes = program.nodes();
    assert_eq!(nodes.len(), 51);
    for pair in nodes.windows(2) {
        assert_eq!(pair[1].parent, Some(pair[0].id));
    }
}

#[test]
fn boolean_default_condition() {
    let program = compile(r#"{"_config": {"default_condition": false}, "_items": [{}]}"#).unwrap();
    assert!(program.nodes().iter().all(|n| n.compiled_condition == "false"));
}

#[test]
fn default_condition_with_inputs_is_typed_once() {
    let program = compile(
        r#"{"_config": {"default_condition": "input:env == 'prod'"}, "_items": [{}, {}, {}]}"#,
    )
    .unwrap();
    assert_eq!(program.input_types().len(), 1);
    assert_eq!(program.nodes().len(), 4);
}

#[test]
fn numeric_condition_fails_with_kind() {
    let err = compile(r#"{"_items": [{"_condition": 42}]}"#).unwrap_err();
    assert!(matches!(
        err,
        CompileError::InvalidConditionKind {
            actual: ValueKind::Int,
            ..
        }
    ));
}

#[test]
fn first_error_aborts_the_run() {
    init_tracing();
    let err = ProgramBuilder::new()
        .rule_group("a", source::parse_document(r#"{"_config": {"flatten": 1}}"#).unwrap())
        .rule_group("b", source::parse_document(r#"{"_condition": 1}"#).unwrap())
        .compile()
        .unwrap_err();
    assert_eq!(err.rule_group(), Some("a"));
}

#[test]
fn group_with_object_value() {
    let err = compile(r#"{"_groups": {"members": {"a": 1}}}"#).unwrap_err();
    assert_eq!(
        err.to_string(),
        "_groups 'members' in rule group 'menu' is neither an array of strings nor a string with a file path"
    );
}

#[test]
fn groups_must_be_a_map() {
    let err = compile(r#"{"_groups": ["a"]}"#).unwrap_err();
    assert!(matches!(err, CompileError::ConfigTypeError { ref key, .. } if key == "_groups"));
}

#[test]
fn reserved_keys_are_not_output() {
    let program = compile(r#"{"_note": "x", "_meta": {"a": 1}, "label": "y"}"#).unwrap();
    let node = &program.nodes()[0];
    assert_eq!(node.static_attributes.len(), 1);
    assert_eq!(node.output.scope_vars(), vec!["output"]);
}

#[test]
fn escaped_strings_in_conditions_and_output() {
    let program =
        compile(r#"{"_condition": "input:q == 'say \"hi\"'", "msg": "a \"b\""}"#).unwrap();
    let node = &program.nodes()[0];
    assert_eq!(
        node.compiled_condition,
        r#"context.input["q"] as String == "say \"hi\"""#
    );
    assert_eq!(
        node.output.statements()[1].to_string(),
        r#"output["msg"] = "a \"b\"""#
    );
}

#[test]
fn legacy_dialect_keeps_whole_run_semantics() {
    let program = ProgramBuilder::new()
        .rule_group(
            "menu",
            source::parse_document(r#"{"_items": [{"_condition": "input:age > 3"}, {}]}"#).unwrap(),
        )
        .dialect(Dialect::Legacy)
        .compile()
        .unwrap();
    let nodes = program.nodes();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[1].compiled_condition, r#"context.input["age"] as Float64 > 3"#);
}

#[test]
fn json_errors_surface_through_from_json_str() {
    assert!(matches!(
        Program::from_json_str("menu", "{"),
        Err(RullerError::Json(_))
    ));
}

#[test]
fn deeply_parenthesized_condition_is_a_syntax_error() {
    let deep = format!("{}true{}", "(".repeat(500), ")".repeat(500));
    let json = format!(r#"{{"_condition": "{deep}"}}"#);
    match compile(&json) {
        Err(CompileError::ConditionSyntax {
            rule_group,
            source: err,
            ..
        }) => {
            assert_eq!(rule_group, "menu");
            assert!(err.message().contains("nesting"), "{err}");
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }

    let shallow = format!("{}input:age > 3{}", "(".repeat(100), ")".repeat(100));
    assert!(compile(&format!(r#"{{"_condition": "{shallow}"}}"#)).is_ok());
}
