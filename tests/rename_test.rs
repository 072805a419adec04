mod setup;

use resolver_transformers::engine::resolvers::Operation;
use resolver_transformers::engine::transformers::rename::{create_rename_transformer, RenameRule};
use serde_json::json;
use setup::{args, call, init, memory_resolvers, value, Recorder, TestCtx};

fn fields() -> RenameRule {
    let mut fields = RenameRule::new();
    fields.insert("_id".to_string(), "id".to_string());
    fields.insert("owner_id".to_string(), "ownerId".to_string());
    fields
}

/// Passes if inputs reach the base resolver with backing names and results come back with
/// exposed names
#[tokio::test]
async fn rename_round_trip() {
    init();
    let recorder = Recorder::new();
    let resolvers = create_rename_transformer(memory_resolvers(&recorder), fields(), &[]);

    let result = call(
        &resolvers,
        Operation::Update,
        args(json!({"input": {"id": 1, "ownerId": 3, "name": "x"}})),
        &TestCtx::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        Some(value(json!({"_id": 1, "owner_id": 3, "name": "x"}))),
        recorder.last_input()
    );
    assert_eq!(
        value(json!({"id": 1, "name": "x", "password": "hunter2", "ownerId": 3})),
        result
    );
}

/// Passes if a call without input passes its arguments through unchanged
#[tokio::test]
async fn rename_absent_input() {
    init();
    let recorder = Recorder::new();
    let resolvers = create_rename_transformer(memory_resolvers(&recorder), fields(), &[]);

    let a = args(json!({"other": {"id": 1}}));
    call(&resolvers, Operation::Find, a.clone(), &TestCtx::default())
        .await
        .unwrap();

    assert_eq!(Some((Operation::Find, a)), recorder.last());
}

/// Passes if the caller's copy of the arguments is left as it was
#[tokio::test]
async fn rename_caller_args_isolated() {
    init();
    let recorder = Recorder::new();
    let resolvers = create_rename_transformer(memory_resolvers(&recorder), fields(), &[]);

    let a = args(json!({"input": {"id": 1}}));
    let kept = a.clone();
    call(&resolvers, Operation::Create, a, &TestCtx::default())
        .await
        .unwrap();

    assert_eq!(args(json!({"input": {"id": 1}})), kept);
    assert_eq!(Some(value(json!({"_id": 1}))), recorder.last_input());
}

/// Passes if list filters and orders are renamed in place and every node is renamed in edge
/// order, with the rest of the connection kept
#[tokio::test]
async fn rename_list() {
    init();
    let recorder = Recorder::new();
    let resolvers = create_rename_transformer(memory_resolvers(&recorder), fields(), &[]);

    let result = call(
        &resolvers,
        Operation::List,
        args(json!({"input": {
            "filter": [
                {"field": "ownerId", "op": "EQ", "value": 10},
                {"field": "name", "op": "EQ", "value": "user1"}
            ],
            "order": [{"field": "id", "direction": "DESC"}]
        }})),
        &TestCtx::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        Some(value(json!({
            "filter": [
                {"field": "owner_id", "op": "EQ", "value": 10},
                {"field": "name", "op": "EQ", "value": "user1"}
            ],
            "order": [{"field": "_id", "direction": "DESC"}]
        }))),
        recorder.last_input()
    );
    assert_eq!(
        value(json!({
            "edges": [
                {"node": {"id": 1, "name": "user1", "password": "hunter2", "ownerId": 10}},
                {"node": {"id": 2, "name": "user2", "password": "hunter2", "ownerId": 20}}
            ],
            "cursor": "next"
        })),
        result
    );
}

/// Passes if an excluded operation sees neither input nor output renamed
#[tokio::test]
async fn rename_excluded() {
    init();
    let recorder = Recorder::new();
    let resolvers =
        create_rename_transformer(memory_resolvers(&recorder), fields(), &[Operation::List]);

    let result = call(
        &resolvers,
        Operation::List,
        args(json!({"input": {"filter": [{"field": "id", "op": "EQ", "value": 1}]}})),
        &TestCtx::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        Some(value(json!({"filter": [{"field": "id", "op": "EQ", "value": 1}]}))),
        recorder.last_input()
    );
    let edges = &result.as_map().unwrap()["edges"];
    assert_eq!(
        value(json!([
            {"node": {"_id": 1, "name": "user1", "password": "hunter2", "owner_id": 10}},
            {"node": {"_id": 2, "name": "user2", "password": "hunter2", "owner_id": 20}}
        ])),
        *edges
    );
}

/// Passes if every operation of the map survives wrapping
#[test]
fn rename_preserves_operations() {
    let recorder = Recorder::new();
    let resolvers = create_rename_transformer(memory_resolvers(&recorder), fields(), &[]);

    assert!(resolvers.is_complete());
    assert_eq!(6, resolvers.len());
}
