//! End-to-end conversion scenarios: recursion, naming, dialect isolation,
//! unknown kinds, record keys and concurrent runs over one shared graph.

use schemagraph_core::{
    convert, object_kind, Bound, ConvertError, DialectConfig, ErrorCode, NamePolicy, NodeKind, NumberChecks,
    PointerStyle, SchemaGraph, SchemaNode, Target,
};
use serde_json::{json, Value};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn all_targets() -> Vec<Target> {
    vec![Target::JsonSchema7, Target::JsonSchema2019_09, Target::OpenApi3]
}

/// Collect every `$ref` string in `value`.
fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(obj) => {
            if let Some(Value::String(target)) = obj.get("$ref") {
                out.push(target.clone());
            }
            for (key, child) in obj {
                if key != "$ref" {
                    collect_refs(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}

/// Every `$ref` in the rendered document resolves inside the document.
fn assert_refs_resolve(doc: &Value) {
    let mut refs = Vec::new();
    collect_refs(doc, &mut refs);
    for target in refs {
        let pointer = target
            .strip_prefix('#')
            .unwrap_or_else(|| panic!("non-local pointer {target}"));
        assert!(doc.pointer(pointer).is_some(), "dangling pointer {target} in {doc:#}");
    }
}

/// Recursively check that `keyword` never appears with a value matching `bad`.
fn assert_no_keyword(value: &Value, keyword: &str, bad: &dyn Fn(&Value) -> bool, path: &str) {
    match value {
        Value::Object(obj) => {
            if let Some(v) = obj.get(keyword) {
                assert!(!bad(v), "unexpected {keyword}: {v} at {path}");
            }
            for (key, child) in obj {
                assert_no_keyword(child, keyword, bad, &format!("{path}/{key}"));
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                assert_no_keyword(item, keyword, bad, &format!("{path}/{i}"));
            }
        }
        _ => {}
    }
}

/// A tree node with a label, children and an optional parent link.
fn tree_graph() -> (SchemaGraph, schemagraph_core::NodeId) {
    let mut graph = SchemaGraph::new();
    let tree = graph.declare();
    let label = graph.string();
    let children = graph.array(tree);
    let parent = graph.nullable(tree);
    let opt_parent = graph.optional(parent);
    graph
        .define(
            tree,
            SchemaNode::new(object_kind([("label", label), ("children", children), ("parent", opt_parent)]))
                .named("Tree"),
        )
        .unwrap();
    (graph, tree)
}

// ── Recursion ───────────────────────────────────────────────────────────────

#[test]
fn test_self_recursion_every_target() {
    for target in all_targets() {
        let (graph, tree) = tree_graph();
        let config = DialectConfig::for_target(target);
        let doc = convert(&graph, tree, &config).unwrap();

        let pointer = match target {
            Target::JsonSchema7 => "#/definitions/Tree",
            Target::JsonSchema2019_09 => "#/$defs/Tree",
            Target::OpenApi3 => "#/components/schemas/Tree",
        };
        assert_eq!(doc.schema()["$ref"], json!(pointer), "{target}");
        let body = &doc.definitions()["Tree"];
        assert_eq!(body["properties"]["children"]["items"]["$ref"], json!(pointer));
        assert_eq!(body["required"], json!(["label", "children"]));
        assert_refs_resolve(&doc.to_value());

        // One rule per distinct node reachable from the root.
        assert!(doc.stats().rules_invoked <= graph.len());
    }
}

#[test]
fn test_mutual_recursion_hoists_both() {
    let mut graph = SchemaGraph::new();
    let a = graph.declare();
    let b = graph.declare();
    let name = graph.string();
    graph
        .define(a, SchemaNode::new(object_kind([("name", name), ("b", b)])).named("A"))
        .unwrap();
    graph
        .define(b, SchemaNode::new(object_kind([("a", a)])).named("B"))
        .unwrap();

    let doc = convert(&graph, a, &DialectConfig::default()).unwrap();
    let names: Vec<&String> = doc.definitions().keys().collect();
    assert_eq!(names, ["A", "B"]);
    assert_eq!(doc.schema()["$ref"], json!("#/definitions/A"));
    assert_eq!(doc.definitions()["A"]["properties"]["b"], json!({"$ref": "#/definitions/B"}));
    assert_eq!(doc.definitions()["B"]["properties"]["a"], json!({"$ref": "#/definitions/A"}));
    assert_refs_resolve(&doc.to_value());
}

/// Without declared names only the node where the cycle is detected gets a
/// definition; the other member stays inline inside it. Two definitions for
/// A→B→A hold only when both types are named (see above).
#[test]
fn test_unnamed_mutual_recursion_hoists_only_the_cycle_entry() {
    let mut graph = SchemaGraph::new();
    let a = graph.declare();
    let b = graph.declare();
    let wrapper = graph.object([("b", b)]);
    graph.define(a, object_kind([("b", b)])).unwrap();
    graph.define(b, object_kind([("a", a)])).unwrap();
    let root = graph.object([("first", a), ("w", wrapper)]);

    let doc = convert(&graph, root, &DialectConfig::default()).unwrap();
    assert_eq!(doc.definitions().len(), 1);
    assert_eq!(doc.schema()["properties"]["first"], json!({"$ref": "#/definitions/schema0"}));
    assert_eq!(
        doc.definitions()["schema0"]["properties"]["b"]["properties"]["a"],
        json!({"$ref": "#/definitions/schema0"})
    );
    // `b` was resolved inline once and is reused as a copy elsewhere.
    assert_eq!(
        doc.schema()["properties"]["w"]["properties"]["b"]["properties"]["a"],
        json!({"$ref": "#/definitions/schema0"})
    );
    assert_refs_resolve(&doc.to_value());
}

// ── Naming ──────────────────────────────────────────────────────────────────

#[test]
fn test_naming_is_idempotent() {
    let (graph, tree) = tree_graph();
    let config = DialectConfig::for_target(Target::JsonSchema2019_09);
    let first = serde_json::to_string(&convert(&graph, tree, &config).unwrap()).unwrap();
    let second = serde_json::to_string(&convert(&graph, tree, &config).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_name_collision_suffix_and_error() {
    let mut graph = SchemaGraph::new();
    let s = graph.string();
    let n = graph.number();
    let first = graph.add(SchemaNode::new(object_kind([("s", s)])).named("Node"));
    let second = graph.add(SchemaNode::new(object_kind([("n", n)])).named("Node"));
    let root = graph.object([("first", first), ("second", second)]);

    let doc = convert(&graph, root, &DialectConfig::default()).unwrap();
    assert_eq!(doc.schema()["properties"]["first"], json!({"$ref": "#/definitions/Node"}));
    assert_eq!(doc.schema()["properties"]["second"], json!({"$ref": "#/definitions/Node_2"}));

    let strict = DialectConfig {
        name_policy: NamePolicy::Error,
        ..DialectConfig::default()
    };
    let err = convert(&graph, root, &strict).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::NameCollision);
    match err {
        ConvertError::NameCollision {
            name,
            first_path,
            second_path,
        } => {
            assert_eq!(name, "Node");
            assert_eq!(first_path.to_string(), "#/properties/first");
            assert_eq!(second_path.to_string(), "#/properties/second");
        }
        other => panic!("expected NameCollision, got {other:?}"),
    }
}

#[test]
fn test_structurally_equal_nodes_are_distinct() {
    let mut graph = SchemaGraph::new();
    let a = graph.add(SchemaNode::new(NodeKind::Boolean).named("Flag"));
    let b = graph.add(SchemaNode::new(NodeKind::Boolean).named("Flag"));
    let root = graph.object([("a", a), ("b", b)]);

    let doc = convert(&graph, root, &DialectConfig::default()).unwrap();
    assert_eq!(doc.definitions().len(), 2);
    assert!(doc.definitions().contains_key("Flag_2"));
}

// ── Dialects ────────────────────────────────────────────────────────────────

fn bounded_graph() -> (SchemaGraph, schemagraph_core::NodeId) {
    let mut graph = SchemaGraph::new();
    let score = graph.add(NodeKind::Number(NumberChecks {
        minimum: Some(Bound::exclusive(0.0)),
        maximum: Some(Bound::exclusive(10.0)),
        ..NumberChecks::default()
    }));
    let version = graph.literal(json!(2));
    let name = graph.string();
    let nick = graph.nullable(name);
    let root = graph.object([("score", score), ("version", version), ("nick", nick)]);
    (graph, root)
}

#[test]
fn test_dialect_isolation() {
    let (graph, root) = bounded_graph();

    let json7 = convert(&graph, root, &DialectConfig::default()).unwrap().to_value();
    assert_no_keyword(&json7, "exclusiveMinimum", &Value::is_boolean, "#");
    assert_no_keyword(&json7, "exclusiveMaximum", &Value::is_boolean, "#");
    assert_no_keyword(&json7, "nullable", &|_: &Value| true, "#");
    assert_eq!(json7["properties"]["version"], json!({"type": "integer", "const": 2}));
    assert_eq!(json7["properties"]["nick"], json!({"type": ["string", "null"]}));

    let oas = convert(&graph, root, &DialectConfig::for_target(Target::OpenApi3))
        .unwrap()
        .to_value();
    assert_no_keyword(&oas, "exclusiveMinimum", &Value::is_number, "#");
    assert_no_keyword(&oas, "exclusiveMaximum", &Value::is_number, "#");
    assert_no_keyword(&oas, "const", &|_: &Value| true, "#");
    assert_no_keyword(&oas, "type", &Value::is_array, "#");
    assert!(oas.get("$schema").is_none());
    assert_eq!(
        oas["properties"]["score"],
        json!({
            "type": "number",
            "minimum": 0,
            "exclusiveMinimum": true,
            "maximum": 10,
            "exclusiveMaximum": true
        })
    );
    assert_eq!(oas["properties"]["nick"], json!({"type": "string", "nullable": true}));
}

#[test]
fn test_pointer_style_overrides_target_default() {
    let (graph, tree) = tree_graph();
    let config = DialectConfig {
        target: Target::JsonSchema2019_09,
        pointer_style: PointerStyle::Definitions,
        ..DialectConfig::default()
    };
    let doc = convert(&graph, tree, &config).unwrap();
    assert_eq!(doc.schema()["$ref"], json!("#/definitions/Tree"));
    assert_refs_resolve(&doc.to_value());
}

// ── Unknown kinds ───────────────────────────────────────────────────────────

fn graph_with_custom() -> (SchemaGraph, schemagraph_core::NodeId) {
    let mut graph = SchemaGraph::new();
    let big = graph.add(NodeKind::Custom {
        name: "bigint".to_string(),
        children: vec![],
        payload: Value::Null,
    });
    let root = graph.object([("id", big)]);
    (graph, root)
}

#[test]
fn test_unknown_kind_strict() {
    let (graph, root) = graph_with_custom();
    let config = DialectConfig {
        strict_unknown_types: true,
        ..DialectConfig::default()
    };
    let err = convert(&graph, root, &config).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::UnsupportedType);
    assert_eq!(err.path().unwrap().to_string(), "#/properties/id");
    let report = err.to_json();
    assert_eq!(report["code"], json!("unsupported_type"));
    assert_eq!(report["path"], json!("#/properties/id"));
}

#[test]
fn test_unknown_kind_lenient() {
    let (graph, root) = graph_with_custom();
    let doc = convert(&graph, root, &DialectConfig::default()).unwrap();
    assert_eq!(doc.schema()["properties"]["id"], json!({}));
}

// ── Records ─────────────────────────────────────────────────────────────────

#[test]
fn test_record_enum_key_per_dialect() {
    let mut graph = SchemaGraph::new();
    let keys = graph.enumeration(["foo", "bar"]);
    let value = graph.number();
    let record = graph.record(Some(keys), value);
    let root = graph.object([("scores", record)]);

    let oas = convert(&graph, root, &DialectConfig::for_target(Target::OpenApi3))
        .unwrap()
        .to_value();
    assert_eq!(
        oas["properties"]["scores"]["properties"],
        json!({
            "foo": {"$ref": "#/properties/scores/additionalProperties"},
            "bar": {"$ref": "#/properties/scores/additionalProperties"}
        })
    );
    assert!(oas["properties"]["scores"].get("propertyNames").is_none());
    assert_refs_resolve(&oas);

    let json7 = convert(&graph, root, &DialectConfig::default()).unwrap().to_value();
    assert_eq!(
        json7["properties"]["scores"]["propertyNames"],
        json!({"enum": ["foo", "bar"]})
    );
    assert!(json7["properties"]["scores"].get("properties").is_none());
}

#[test]
fn test_hoisted_record_pointers_follow_definition() {
    let mut graph = SchemaGraph::new();
    let keys = graph.enumeration(["x"]);
    let value = graph.string();
    let record = graph.add(SchemaNode::new(NodeKind::Record {
        key: Some(keys),
        value,
    })
    .named("Labels"));
    let root = graph.object([("labels", record)]);

    let doc = convert(&graph, root, &DialectConfig::for_target(Target::OpenApi3)).unwrap();
    assert_eq!(
        doc.definitions()["Labels"]["properties"]["x"],
        json!({"$ref": "#/components/schemas/Labels/additionalProperties"})
    );
    assert_refs_resolve(&doc.to_value());
}

#[test]
fn test_moved_fragments_keep_default_payloads() {
    let payload = json!({"$ref": "#/a", "nested": {"$ref": "#/a/b"}});

    let mut graph = SchemaGraph::new();
    let any = graph.any();
    let root = graph.add(
        SchemaNode::new(NodeKind::Default {
            inner: any,
            value: payload.clone(),
        })
        .named("X"),
    );
    let doc = convert(&graph, root, &DialectConfig::default()).unwrap();
    assert_eq!(doc.definitions()["X"]["default"], payload);

    // An unnamed node reused without a cycle is copied, not hoisted.
    let mut graph = SchemaGraph::new();
    let any = graph.any();
    let shared = graph.add(NodeKind::Default {
        inner: any,
        value: payload.clone(),
    });
    let root = graph.object([("first", shared), ("second", shared)]);
    let doc = convert(&graph, root, &DialectConfig::default()).unwrap();
    assert_eq!(doc.schema()["properties"]["first"]["default"], payload);
    assert_eq!(doc.schema()["properties"]["second"]["default"], payload);
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[test]
fn test_deep_chain_hits_max_depth() {
    let mut graph = SchemaGraph::new();
    let mut current = graph.boolean();
    for _ in 0..100 {
        current = graph.array(current);
    }
    let err = convert(&graph, current, &DialectConfig::default()).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::MaxDepthExceeded);
}

#[test]
fn test_foreign_node_id_is_schema_error() {
    let mut other = SchemaGraph::new();
    for _ in 0..5 {
        other.string();
    }
    let foreign = other.string();

    let mut graph = SchemaGraph::new();
    let root = graph.array(foreign);
    let err = convert(&graph, root, &DialectConfig::default()).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::SchemaError);
    assert_eq!(err.path().unwrap().to_string(), "#/items");
}

#[test]
fn test_config_from_json() {
    let config: DialectConfig = serde_json::from_value(json!({
        "target": "openApi3",
        "pointer-style": "components-schemas",
        "strict-unknown-types": true
    }))
    .unwrap();
    assert_eq!(config.target, Target::OpenApi3);
    assert!(config.strict_unknown_types);
    assert_eq!(config.max_depth, 64);
}

// ── Concurrency ─────────────────────────────────────────────────────────────

#[test]
fn test_concurrent_runs_share_graph() {
    let (graph, tree) = tree_graph();
    let expected: Vec<Value> = all_targets()
        .into_iter()
        .map(|t| convert(&graph, tree, &DialectConfig::for_target(t)).unwrap().to_value())
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let graph = &graph;
                scope.spawn(move || {
                    let target = all_targets()[i % 3];
                    (i % 3, convert(graph, tree, &DialectConfig::for_target(target)).unwrap().to_value())
                })
            })
            .collect();
        for handle in handles {
            let (idx, value) = handle.join().unwrap();
            assert_eq!(value, expected[idx]);
        }
    });
}
