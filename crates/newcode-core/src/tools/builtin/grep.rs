//! `grep`: recursive regex search.

use regex::RegexBuilder;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::is_ignored_dir;
use crate::tools::{RegisterFn, ToolBuilder, ToolOutput, handler, parse_args, register_fn};

/// Matches returned by one search.
pub const MAX_MATCHES: usize = 200;

/// Files larger than this are not searched.
const MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GrepArgs {
    /// Regular expression to search for
    pub search_string: String,
    /// Directory to search, defaults to the working directory
    #[serde(default)]
    pub directory: Option<String>,
    /// Match case-insensitively
    #[serde(default)]
    pub ignore_case: bool,
}

pub fn grep() -> RegisterFn {
    register_fn(|host| {
        host.declare_tool(
            ToolBuilder::new("grep")
                .description("Search text files recursively for a regular expression")
                .docstring(format!("Returns at most {MAX_MATCHES} matches as file, line number and line text."))
                .input_schema_from::<GrepArgs>()
                .handler(handler(|args| async move {
                    let args: GrepArgs = match parse_args(args) {
                        Ok(args) => args,
                        Err(output) => return output,
                    };
                    match tokio::task::spawn_blocking(move || search(args)).await {
                        Ok(output) => output,
                        Err(e) => ToolOutput::failure(format!("grep task failed: {e}")),
                    }
                }))
                .build()?,
        )
    })
}

fn search(args: GrepArgs) -> ToolOutput {
    if args.search_string.is_empty() {
        return ToolOutput::failure("search_string must not be empty");
    }

    let root = PathBuf::from(args.directory.unwrap_or_else(|| ".".into()));
    if !root.exists() {
        return ToolOutput::failure(format!("no such directory: {}", root.display()));
    }

    let re = match RegexBuilder::new(&args.search_string)
        .case_insensitive(args.ignore_case)
        .build()
    {
        Ok(re) => re,
        Err(e) => return ToolOutput::failure(format!("invalid pattern: {e}")),
    };

    let mut matches = Vec::new();
    let mut truncated = false;

    let files = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && is_ignored_dir(e.file_name())))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.metadata().is_ok_and(|m| m.len() <= MAX_FILE_BYTES));

    'files: for entry in files {
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        for (index, line) in content.lines().enumerate() {
            if !re.is_match(line) {
                continue;
            }
            if matches.len() >= MAX_MATCHES {
                truncated = true;
                break 'files;
            }
            matches.push(json!({
                "file": display_path(&root, entry.path()),
                "line_number": index + 1,
                "line": line.trim_end(),
            }));
        }
    }

    ToolOutput::ok(json!({
        "search_string": args.search_string,
        "matches": matches,
        "truncated": truncated,
    }))
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
