use resolver_transformers::engine::context::RequestContext;
use resolver_transformers::engine::resolvers::{
    resolver_fn, Arguments, Info, Operation, ResolverFacade, ResolverMap,
};
use resolver_transformers::engine::value::{Map, Value};
use serde_json::json;
use std::convert::TryFrom;
use std::sync::{Arc, Mutex};

#[allow(dead_code)]
pub(crate) fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Request context optionally carrying args to inject
#[derive(Clone, Debug, Default)]
pub(crate) struct TestCtx {
    args: Option<Map>,
}

impl TestCtx {
    #[allow(dead_code)]
    pub(crate) fn with_args(args: serde_json::Value) -> TestCtx {
        TestCtx {
            args: Some(map(args)),
        }
    }
}

impl RequestContext for TestCtx {
    fn args(&self) -> Option<&Map> {
        self.args.as_ref()
    }
}

#[allow(dead_code)]
pub(crate) fn value(j: serde_json::Value) -> Value {
    Value::try_from(j).unwrap()
}

#[allow(dead_code)]
pub(crate) fn map(j: serde_json::Value) -> Map {
    value(j).as_map().unwrap().clone()
}

#[allow(dead_code)]
pub(crate) fn args(j: serde_json::Value) -> Arguments {
    Arguments::try_from(j).unwrap()
}

/// Records the arguments every base resolver is called with
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    calls: Arc<Mutex<Vec<(Operation, Arguments)>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub(crate) fn new() -> Recorder {
        Recorder::default()
    }

    fn record(&self, operation: Operation, args: &Arguments) {
        self.calls.lock().unwrap().push((operation, args.clone()));
    }

    pub(crate) fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn last(&self) -> Option<(Operation, Arguments)> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub(crate) fn last_input(&self) -> Option<Value> {
        self.last().and_then(|(_, a)| a.input().cloned())
    }
}

/// The record every entity operation starts from, stored with backing field names
#[allow(dead_code)]
pub(crate) fn stored_record(id: i64) -> Value {
    value(json!({
        "_id": id,
        "name": format!("user{}", id),
        "password": "hunter2",
        "owner_id": id * 10
    }))
}

/// An in-memory stand-in for a data source. Entity operations return the stored record with the
/// input laid over it; `list` returns two records wrapped in a connection with a page cursor.
pub(crate) fn memory_resolvers(recorder: &Recorder) -> ResolverMap<TestCtx> {
    let mut resolvers = ResolverMap::new();

    for &op in Operation::ALL.iter() {
        let recorder = recorder.clone();
        let resolver = resolver_fn(move |facade: ResolverFacade<TestCtx>| {
            recorder.record(op, facade.args());
            async move {
                if op.is_list() {
                    let mut connection = facade
                        .resolve_connection(vec![stored_record(1), stored_record(2)])?
                        .as_map()
                        .cloned()
                        .unwrap_or_default();
                    connection.insert("cursor".to_string(), Value::from("next"));
                    Ok(Value::Map(connection))
                } else {
                    let mut record = stored_record(1).as_map().cloned().unwrap_or_default();
                    if let Some(Value::Map(input)) = facade.input() {
                        record.extend(input.clone());
                    }
                    Ok(Value::Map(record))
                }
            }
        });
        resolvers.insert(op, resolver);
    }

    resolvers
}

/// A data source that records every call and finds nothing: each operation, `list` included,
/// resolves to null
#[allow(dead_code)]
pub(crate) fn empty_resolvers(recorder: &Recorder) -> ResolverMap<TestCtx> {
    let mut resolvers = ResolverMap::new();

    for &op in Operation::ALL.iter() {
        let recorder = recorder.clone();
        let resolver = resolver_fn(move |facade: ResolverFacade<TestCtx>| {
            recorder.record(op, facade.args());
            async move { facade.resolve_null() }
        });
        resolvers.insert(op, resolver);
    }

    resolvers
}

#[allow(dead_code)]
pub(crate) async fn call(
    resolvers: &ResolverMap<TestCtx>,
    operation: Operation,
    arguments: Arguments,
    context: &TestCtx,
) -> Result<Value, resolver_transformers::Error> {
    resolvers
        .resolve(
            operation,
            &Value::Null,
            arguments,
            context,
            &Info::new(operation.to_string()),
        )
        .await
}
