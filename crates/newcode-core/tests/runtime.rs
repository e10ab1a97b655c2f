//! Runtime assembly from settings, manifest plugins and constructor manifests.

use newcode_core::callbacks::CommandHelp;
use newcode_core::plugins::MANIFEST_FILE;
use newcode_core::tools::{AgentTools, BindOutcome, SkipReason};
use newcode_core::{Runtime, Settings};
use std::path::Path;
use tempfile::TempDir;

fn settings_in(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.user_name = "ada".into();
    settings.plugins.directories = vec![root.join("plugins")];
    settings.constructor.directory = root.join("uc");
    settings
}

fn write_plugin(root: &Path, dir: &str, manifest: &str) {
    let path = root.join("plugins").join(dir);
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(path.join(MANIFEST_FILE), manifest).unwrap();
}

#[tokio::test]
async fn manifest_plugins_feed_prompts_commands_and_tools() {
    let temp = TempDir::new().unwrap();
    write_plugin(
        temp.path(),
        "house-rules",
        r#"{
            "id": "house-rules",
            "name": "House Rules",
            "version": "1.2.0",
            "prompt": "Prefer small diffs.",
            "commands": [{"name": "hello", "description": "Send a greeting", "response": "Hello, {args}!"}],
            "tools": [{"name": "echo_args", "description": "Echo", "command": ["cat"]}]
        }"#,
    );
    write_plugin(temp.path(), "broken", r#"{"id": "Broken Plugin", "name": "x", "version": "1"}"#);

    let runtime = Runtime::builder()
        .settings(settings_in(temp.path()))
        .build()
        .await
        .unwrap();

    assert_eq!(runtime.plugin_errors().len(), 1);
    assert_eq!(runtime.plugin_reports().len(), 1);
    assert!(runtime.render_prompt("shepherd").unwrap().ends_with("Prefer small diffs."));
    assert_eq!(runtime.command_help(), vec![CommandHelp::new("hello", "Send a greeting")]);
    assert!(runtime.tools().list_available_names().contains("echo_args"));
    assert_eq!(runtime.run_command("/hello world").as_deref(), Some("Hello, world!"));
    assert_eq!(runtime.run_command("/goodbye"), None);
}

#[cfg(unix)]
#[tokio::test]
async fn agent_build_binds_and_calls_tools() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("notes.txt");
    std::fs::write(&file, "hello\nworld\n").unwrap();

    let runtime = Runtime::builder()
        .settings(settings_in(temp.path()))
        .build()
        .await
        .unwrap();

    let mut host = AgentTools::new("bloodhound");
    let report = runtime.build_agent("bloodhound", &mut host).unwrap();
    assert_eq!(report.bound(), vec!["agent_run_shell_command", "read_file"]);

    let output = host
        .call("read_file", serde_json::json!({"file_path": file.display().to_string()}))
        .await
        .unwrap();
    assert_eq!(output.data["content"], "hello\nworld");
}

#[tokio::test]
async fn code_agent_degrades_to_available_tools() {
    let temp = TempDir::new().unwrap();
    let runtime = Runtime::builder()
        .settings(settings_in(temp.path()))
        .build()
        .await
        .unwrap();

    let mut host = AgentTools::new("code-agent");
    let report = runtime.build_agent("code-agent", &mut host).unwrap();

    assert!(report.failed().is_empty());
    for missing in ["invoke_agent", "ask_user_question", "load_image_for_analysis"] {
        assert_eq!(
            report.outcome(missing),
            Some(&BindOutcome::Skipped(SkipReason::Unknown)),
            "{missing}"
        );
    }
    assert!(host.contains("list_agents"));
    assert_eq!(host.len(), report.bound().len());
}
