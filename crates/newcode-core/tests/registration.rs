//! End-to-end registration and dispatch behaviour through the public API.

use newcode_core::callbacks::{CallbackRegistry, Contribution, Event};
use newcode_core::tools::{
    AgentTools, BindOutcome, ConstructorRegistry, NamespacedTool, SkipReason, ToolBuilder,
    ToolDescriptor, ToolOutput, ToolRegistry, handler, register_fn,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counting_tool(name: &'static str, calls: Arc<AtomicUsize>) -> newcode_core::tools::RegisterFn {
    register_fn(move |host| {
        calls.fetch_add(1, Ordering::SeqCst);
        host.declare_tool(
            ToolBuilder::new(name)
                .description(format!("{name} for tests"))
                .handler(handler(|_| async { ToolOutput::ok(Value::Null) }))
                .build()?,
        )
    })
}

#[test]
fn known_tools_bind_once_and_unknown_is_warned() {
    let tools = ToolRegistry::new(Arc::new(CallbackRegistry::new()));
    let read_calls = Arc::new(AtomicUsize::new(0));
    let delete_calls = Arc::new(AtomicUsize::new(0));
    tools.register("read_file", counting_tool("read_file", read_calls.clone()));
    tools.register("delete_file", counting_tool("delete_file", delete_calls.clone()));

    let mut host = AgentTools::new("code-agent");
    let report = tools.resolve_and_bind(&mut host, ["read_file", "delete_file", "unknown_tool"]);

    assert_eq!(read_calls.load(Ordering::SeqCst), 1);
    assert_eq!(delete_calls.load(Ordering::SeqCst), 1);
    assert_eq!(host.names(), vec!["read_file", "delete_file"]);
    assert_eq!(report.warnings().len(), 1);
    assert_eq!(
        report.outcome("unknown_tool"),
        Some(&BindOutcome::Skipped(SkipReason::Unknown))
    );
}

#[test]
fn callbacks_run_in_registration_order_despite_failures() {
    let callbacks = CallbackRegistry::new();
    callbacks.register_fn(Event::LoadPrompt, "first", || Ok("first".into()));
    callbacks.register_fn(Event::LoadPrompt, "raises", || anyhow::bail!("broken plugin"));
    callbacks.register_fn(Event::LoadPrompt, "panics", || panic!("worse plugin"));
    callbacks.register_fn(Event::LoadPrompt, "last", || Ok("last".into()));

    let invocation = callbacks.invoke(&Event::LoadPrompt);
    assert_eq!(invocation.failures.len(), 2);
    assert_eq!(callbacks.invoke_text(&Event::LoadPrompt), vec!["first", "last"]);
}

#[test]
fn discovery_is_idempotent_and_survives_broken_plugins() {
    let callbacks = Arc::new(CallbackRegistry::new());
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    callbacks.register_fn(Event::RegisterTools, "broken", || anyhow::bail!("cannot import"));
    callbacks.register_fn(Event::RegisterTools, "healthy", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Contribution::Tool(ToolDescriptor::new(
            "plugin_tool",
            register_fn(|_| Ok(())),
        )))
    });

    let tools = ToolRegistry::new(callbacks);
    tools.register("read_file", register_fn(|_| Ok(())));

    let first = tools.list_available_names();
    let second = tools.list_available_names();
    let mut host = AgentTools::new("code-agent");
    let report = tools.resolve_and_bind(&mut host, ["read_file", "plugin_tool"]);

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert!(first.contains("plugin_tool"));
    assert_eq!(report.bound(), vec!["read_file", "plugin_tool"]);
    let discovery = tools.plugin_loader().last_report().unwrap();
    assert_eq!(discovery.failures.len(), 1);
}

#[test]
fn namespaced_miss_does_not_block_other_names() {
    let tools = ToolRegistry::new(Arc::new(CallbackRegistry::new()));
    let constructor = Arc::new(ConstructorRegistry::new());
    constructor.register_with_handler(
        NamespacedTool {
            identifier: "api.weather".into(),
            description: "Weather".into(),
            docstring: None,
            input_schema: json!({"type": "object"}),
        },
        handler(|_| async { ToolOutput::ok(json!("sunny")) }),
    );
    tools.add_source(constructor);
    tools.register("read_file", counting_tool("read_file", Arc::new(AtomicUsize::new(0))));

    let mut host = AgentTools::new("code-agent");
    let report = tools.resolve_and_bind(&mut host, ["uc:missing", "uc:api.weather", "read_file"]);

    assert_eq!(
        report.outcome("uc:missing"),
        Some(&BindOutcome::Skipped(SkipReason::MissingMetadata))
    );
    assert_eq!(report.bound(), vec!["uc:api.weather", "read_file"]);
    assert!(host.contains("api.weather"));
}

#[tokio::test]
async fn bound_namespaced_tool_is_callable() {
    let tools = ToolRegistry::new(Arc::new(CallbackRegistry::new()));
    let constructor = Arc::new(ConstructorRegistry::new());
    constructor.register_with_handler(
        NamespacedTool {
            identifier: "api.weather".into(),
            description: "Weather".into(),
            docstring: None,
            input_schema: json!({"type": "object"}),
        },
        handler(|args| async move { ToolOutput::ok(json!({"city": args["city"], "sky": "clear"})) }),
    );
    tools.add_source(constructor);

    let mut host = AgentTools::new("code-agent");
    tools.resolve_and_bind(&mut host, ["uc:api.weather"]);

    let output = host.call("api.weather", json!({"city": "Oslo"})).await.unwrap();
    assert!(output.success);
    assert_eq!(output.data["city"], "Oslo");
}
