//! File system tools: `list_files`, `read_file`, `edit_file`, `delete_file`.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use super::is_ignored_dir;
use crate::tools::{RegisterFn, ToolBuilder, ToolOutput, handler, parse_args, register_fn};

/// Entries returned by one `list_files` call.
const MAX_LIST_ENTRIES: usize = 1000;

/// Bytes inspected for NUL when detecting binary files.
const BINARY_SNIFF_BYTES: usize = 8192;

// ─────────────────────────────────────────────────────────────────────────────
// list_files
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFilesArgs {
    /// Directory to list, defaults to the working directory
    #[serde(default)]
    pub directory: Option<String>,
    /// Descend into subdirectories
    #[serde(default = "default_true")]
    pub recursive: bool,
}

fn default_true() -> bool {
    true
}

pub fn list_files() -> RegisterFn {
    register_fn(|host| {
        host.declare_tool(
            ToolBuilder::new("list_files")
                .description("List files and directories, skipping VCS and build output")
                .input_schema_from::<ListFilesArgs>()
                .handler(handler(|args| async move {
                    let args: ListFilesArgs = match parse_args(args) {
                        Ok(args) => args,
                        Err(output) => return output,
                    };
                    let root = PathBuf::from(args.directory.unwrap_or_else(|| ".".into()));
                    let recursive = args.recursive;
                    match tokio::task::spawn_blocking(move || walk(&root, recursive)).await {
                        Ok(output) => output,
                        Err(e) => ToolOutput::failure(format!("list_files task failed: {e}")),
                    }
                }))
                .build()?,
        )
    })
}

fn walk(root: &Path, recursive: bool) -> ToolOutput {
    if !root.is_dir() {
        return ToolOutput::failure(format!("not a directory: {}", root.display()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut entries = Vec::new();
    let mut truncated = false;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && is_ignored_dir(e.file_name())));

    for entry in walker.filter_map(Result::ok) {
        if entries.len() >= MAX_LIST_ENTRIES {
            truncated = true;
            break;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        entries.push(json!({
            "path": relative.display().to_string(),
            "is_dir": entry.file_type().is_dir(),
            "size": size,
        }));
    }

    ToolOutput::ok(json!({
        "directory": root.display().to_string(),
        "entries": entries,
        "truncated": truncated,
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// read_file
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileArgs {
    /// Path of the file to read
    pub file_path: String,
    /// First line to return, 1-based
    #[serde(default)]
    pub start_line: Option<usize>,
    /// Number of lines to return
    #[serde(default)]
    pub num_lines: Option<usize>,
}

pub fn read_file() -> RegisterFn {
    register_fn(|host| {
        host.declare_tool(
            ToolBuilder::new("read_file")
                .description("Read a text file, optionally a range of lines")
                .input_schema_from::<ReadFileArgs>()
                .handler(handler(|args| async move {
                    match parse_args::<ReadFileArgs>(args) {
                        Ok(args) => read(args).await,
                        Err(output) => output,
                    }
                }))
                .build()?,
        )
    })
}

async fn read(args: ReadFileArgs) -> ToolOutput {
    let bytes = match fs::read(&args.file_path).await {
        Ok(bytes) => bytes,
        Err(e) => return ToolOutput::failure(format!("failed to read {}: {e}", args.file_path)),
    };

    if bytes[..bytes.len().min(BINARY_SNIFF_BYTES)].contains(&0) {
        return ToolOutput::failure(format!("{} looks like a binary file", args.file_path));
    }

    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let total_lines = lines.len();

    let start = args.start_line.unwrap_or(1).max(1) - 1;
    let count = args.num_lines.unwrap_or(total_lines);
    let selected: Vec<&str> = lines.iter().skip(start).take(count).copied().collect();

    ToolOutput::ok(json!({
        "file_path": args.file_path,
        "content": selected.join("\n"),
        "num_lines": selected.len(),
        "total_lines": total_lines,
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// edit_file
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditFileArgs {
    /// Path of the file to create or modify
    pub file_path: String,
    /// Replace the whole file with this content
    #[serde(default)]
    pub content: Option<String>,
    /// Text to replace; must occur exactly once
    #[serde(default)]
    pub old_string: Option<String>,
    /// Replacement for `old_string`
    #[serde(default)]
    pub new_string: Option<String>,
}

pub fn edit_file() -> RegisterFn {
    register_fn(|host| {
        host.declare_tool(
            ToolBuilder::new("edit_file")
                .description("Write a file, or replace one unique snippet in it")
                .input_schema_from::<EditFileArgs>()
                .handler(handler(|args| async move {
                    match parse_args::<EditFileArgs>(args) {
                        Ok(args) => edit(args).await,
                        Err(output) => output,
                    }
                }))
                .build()?,
        )
    })
}

async fn edit(args: EditFileArgs) -> ToolOutput {
    let path = PathBuf::from(&args.file_path);

    if let Some(content) = args.content {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent).await {
                return ToolOutput::failure(format!("failed to create {}: {e}", parent.display()));
            }
        }
        return match fs::write(&path, &content).await {
            Ok(()) => ToolOutput::ok(json!({
                "file_path": args.file_path,
                "mode": "write",
                "bytes": content.len(),
            })),
            Err(e) => ToolOutput::failure(format!("failed to write {}: {e}", args.file_path)),
        };
    }

    let Some(old) = args.old_string.filter(|s| !s.is_empty()) else {
        return ToolOutput::failure("provide either content or old_string");
    };
    let new = args.new_string.unwrap_or_default();

    let current = match fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) => return ToolOutput::failure(format!("failed to read {}: {e}", args.file_path)),
    };

    match current.matches(old.as_str()).count() {
        0 => ToolOutput::failure(format!("old_string not found in {}", args.file_path)),
        1 => {
            let updated = current.replacen(old.as_str(), &new, 1);
            match fs::write(&path, &updated).await {
                Ok(()) => ToolOutput::ok(json!({
                    "file_path": args.file_path,
                    "mode": "replace",
                    "bytes": updated.len(),
                })),
                Err(e) => ToolOutput::failure(format!("failed to write {}: {e}", args.file_path)),
            }
        }
        n => ToolOutput::failure(format!(
            "old_string occurs {n} times in {}; make it unique",
            args.file_path
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// delete_file
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteFileArgs {
    /// Path of the file to delete
    pub file_path: String,
}

pub fn delete_file() -> RegisterFn {
    register_fn(|host| {
        host.declare_tool(
            ToolBuilder::new("delete_file")
                .description("Delete a single file")
                .input_schema_from::<DeleteFileArgs>()
                .handler(handler(|args| async move {
                    let args: DeleteFileArgs = match parse_args(args) {
                        Ok(args) => args,
                        Err(output) => return output,
                    };
                    if fs::metadata(&args.file_path).await.is_ok_and(|m| m.is_dir()) {
                        return ToolOutput::failure(format!("{} is a directory", args.file_path));
                    }
                    match fs::remove_file(&args.file_path).await {
                        Ok(()) => ToolOutput::ok(json!({"file_path": args.file_path, "deleted": true})),
                        Err(e) => ToolOutput::failure(format!("failed to delete {}: {e}", args.file_path)),
                    }
                }))
                .build()?,
        )
    })
}
