//! Callback Registry
//!
//! Named extension points that decouple the core from plugin-provided
//! behaviour. Plugins register callbacks against an [`Event`]; the core
//! invokes every callback for that event, in registration order, and gathers
//! whatever they contribute.
//!
//! # Events
//!
//! - `load_prompt`: extra system-prompt text appended to every agent prompt
//! - `register_tools`: tool registration descriptors consumed by plugin discovery
//! - `custom_command_help`: help entries for plugin slash commands
//! - `custom_command`: plugin slash command handlers, see [`CallbackRegistry::run_command`]
//!
//! # Example
//!
//! ```rust
//! use newcode_core::callbacks::{CallbackRegistry, Contribution, Event};
//!
//! let callbacks = CallbackRegistry::new();
//! callbacks.register_fn(Event::LoadPrompt, "house-rules", || {
//!     Ok(Contribution::Text("Always run the tests.".into()))
//! });
//!
//! assert_eq!(callbacks.invoke_text(&Event::LoadPrompt), vec!["Always run the tests."]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use crate::isolate::isolate;
use crate::tools::ToolDescriptor;

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Named extension point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    /// Contribute text appended to agent system prompts.
    LoadPrompt,

    /// Contribute tool registration descriptors.
    RegisterTools,

    /// Contribute help entries for custom slash commands.
    CustomCommandHelp,

    /// Handle a custom slash command line.
    CustomCommand,

    /// Any other, plugin-defined extension point.
    Custom(String),
}

impl Event {
    /// Wire name of the event.
    pub fn as_str(&self) -> &str {
        match self {
            Event::LoadPrompt => "load_prompt",
            Event::RegisterTools => "register_tools",
            Event::CustomCommandHelp => "custom_command_help",
            Event::CustomCommand => "custom_command",
            Event::Custom(name) => name,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "load_prompt" => Event::LoadPrompt,
            "register_tools" => Event::RegisterTools,
            "custom_command_help" => Event::CustomCommandHelp,
            "custom_command" => Event::CustomCommand,
            other => Event::Custom(other.to_string()),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contributions
// ─────────────────────────────────────────────────────────────────────────────

/// Help entry for a plugin-provided slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHelp {
    /// Command name without the leading slash.
    pub name: String,
    /// One-line description.
    pub description: String,
}

impl CommandHelp {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Value returned by a callback.
#[derive(Debug, Clone)]
pub enum Contribution {
    /// Nothing to contribute.
    Nothing,
    /// A block of text.
    Text(String),
    /// Several lines of text.
    Lines(Vec<String>),
    /// A single tool registration descriptor.
    Tool(ToolDescriptor),
    /// Several tool registration descriptors.
    Tools(Vec<ToolDescriptor>),
    /// Slash command help entries.
    Commands(Vec<CommandHelp>),
    /// Arbitrary structured data for custom events.
    Value(serde_json::Value),
}

impl Contribution {
    /// Whether the contribution carries nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        match self {
            Contribution::Nothing => true,
            Contribution::Text(text) => text.is_empty(),
            Contribution::Lines(lines) => lines.is_empty(),
            Contribution::Tool(_) => false,
            Contribution::Tools(tools) => tools.is_empty(),
            Contribution::Commands(commands) => commands.is_empty(),
            Contribution::Value(value) => value.is_null(),
        }
    }
}

impl From<String> for Contribution {
    fn from(text: String) -> Self {
        Contribution::Text(text)
    }
}

impl From<&str> for Contribution {
    fn from(text: &str) -> Self {
        Contribution::Text(text.to_string())
    }
}

impl From<Vec<String>> for Contribution {
    fn from(lines: Vec<String>) -> Self {
        Contribution::Lines(lines)
    }
}

impl From<Option<Contribution>> for Contribution {
    fn from(value: Option<Contribution>) -> Self {
        value.unwrap_or(Contribution::Nothing)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callbacks
// ─────────────────────────────────────────────────────────────────────────────

/// Zero-argument callback body.
pub type CallbackFn = Arc<dyn Fn() -> anyhow::Result<Contribution> + Send + Sync>;

/// A registered callback handle.
#[derive(Clone)]
pub struct Callback {
    name: String,
    func: CallbackFn,
}

impl Callback {
    /// Wrap a closure as a named callback.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> anyhow::Result<Contribution> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Name used in logs and failure reports.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("name", &self.name).finish()
    }
}

/// A callback that failed during invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackFailure {
    /// Event being invoked.
    pub event: String,
    /// Name of the failing callback.
    pub callback: String,
    /// Error or panic message.
    pub message: String,
}

impl fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.event, self.callback, self.message)
    }
}

/// Result of invoking one event.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Non-empty contributions, in registration order.
    pub contributions: Vec<Contribution>,
    /// Callbacks that returned an error or panicked.
    pub failures: Vec<CallbackFailure>,
}

impl Invocation {
    /// Whether every callback ran cleanly.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// A slash command line split into name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// The full line, trimmed.
    pub line: String,
    /// Command name without the leading slash.
    pub name: String,
    /// Everything after the name, trimmed.
    pub args: String,
}

impl CommandInvocation {
    /// Parse `/name args...`. The slash is optional. Returns `None` for a
    /// blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let body = line.strip_prefix('/').unwrap_or(line).trim_start();
        if body.is_empty() {
            return None;
        }

        let (name, args) = match body.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (body, ""),
        };

        Some(Self {
            line: line.to_string(),
            name: name.to_string(),
            args: args.to_string(),
        })
    }
}

/// What a command handler did with a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Not this handler's command; try the next one.
    NotHandled,
    /// Handled, nothing to show.
    Handled,
    /// Handled, with text to show the user.
    Output(String),
}

/// Command handler body.
pub type CommandFn = Arc<dyn Fn(&CommandInvocation) -> anyhow::Result<CommandResult> + Send + Sync>;

#[derive(Clone)]
struct CommandHandler {
    name: String,
    func: CommandFn,
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Event name → ordered callback list.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: RwLock<HashMap<Event, Vec<Callback>>>,
    commands: RwLock<Vec<CommandHandler>>,
}

impl CallbackRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback to an event. The same handle may be registered twice.
    pub fn register(&self, event: Event, callback: Callback) {
        tracing::debug!(event = %event, callback = callback.name(), "registering callback");
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        callbacks.entry(event).or_default().push(callback);
    }

    /// Register a closure under a name.
    pub fn register_fn<F>(&self, event: Event, name: impl Into<String>, func: F)
    where
        F: Fn() -> anyhow::Result<Contribution> + Send + Sync + 'static,
    {
        self.register(event, Callback::new(name, func));
    }

    /// Append a `custom_command` handler.
    pub fn register_command<F>(&self, name: impl Into<String>, func: F)
    where
        F: Fn(&CommandInvocation) -> anyhow::Result<CommandResult> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(event = %Event::CustomCommand, callback = %name, "registering command handler");
        let mut commands = self
            .commands
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        commands.push(CommandHandler {
            name,
            func: Arc::new(func),
        });
    }

    /// Snapshot of the callbacks for an event.
    pub fn callbacks(&self, event: &Event) -> Vec<Callback> {
        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        callbacks.get(event).cloned().unwrap_or_default()
    }

    /// Number of callbacks registered for an event.
    pub fn count(&self, event: &Event) -> usize {
        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let registered = callbacks.get(event).map_or(0, Vec::len);
        if *event == Event::CustomCommand {
            registered + self.command_handlers().len()
        } else {
            registered
        }
    }

    /// Events that have at least one callback.
    pub fn events(&self) -> Vec<Event> {
        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut events: Vec<Event> = callbacks
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(event, _)| event.clone())
            .collect();
        if !self.command_handlers().is_empty() && !events.contains(&Event::CustomCommand) {
            events.push(Event::CustomCommand);
        }
        events
    }

    /// Remove every callback.
    pub fn clear(&self) {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        callbacks.clear();
        self.commands
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn command_handlers(&self) -> Vec<CommandHandler> {
        self.commands
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Offer a command to each handler in registration order.
    ///
    /// The first handler that takes it wins: `Output` yields its text,
    /// `Handled` yields an empty string. `None` means nobody handled it.
    /// Failing handlers are logged and skipped.
    pub fn run_command(&self, command: &CommandInvocation) -> Option<String> {
        for handler in self.command_handlers() {
            let func = handler.func.clone();
            match isolate(|| func(command)) {
                Ok(CommandResult::NotHandled) => continue,
                Ok(CommandResult::Handled) => return Some(String::new()),
                Ok(CommandResult::Output(text)) => return Some(text),
                Err(message) => {
                    tracing::warn!(
                        event = %Event::CustomCommand,
                        callback = %handler.name,
                        command = %command.name,
                        "command handler failed: {}",
                        message
                    );
                }
            }
        }
        tracing::debug!(command = %command.name, "no handler for command");
        None
    }

    /// Invoke every callback for an event, in registration order.
    ///
    /// A failing callback is logged and recorded; the remaining callbacks
    /// still run.
    pub fn invoke(&self, event: &Event) -> Invocation {
        // Snapshot first so callbacks may register further callbacks.
        let callbacks = self.callbacks(event);
        let mut invocation = Invocation::default();

        for callback in callbacks {
            let func = callback.func.clone();
            match isolate(|| func()) {
                Ok(contribution) => {
                    if !contribution.is_empty() {
                        invocation.contributions.push(contribution);
                    }
                }
                Err(message) => {
                    tracing::warn!(
                        event = %event,
                        callback = callback.name(),
                        "callback failed: {}",
                        message
                    );
                    invocation.failures.push(CallbackFailure {
                        event: event.to_string(),
                        callback: callback.name.clone(),
                        message,
                    });
                }
            }
        }

        invocation
    }

    /// Invoke an event and flatten its text contributions into lines.
    pub fn invoke_text(&self, event: &Event) -> Vec<String> {
        let mut lines = Vec::new();
        for contribution in self.invoke(event).contributions {
            match contribution {
                Contribution::Text(text) => lines.push(text),
                Contribution::Lines(more) => lines.extend(more.into_iter().filter(|l| !l.is_empty())),
                other => {
                    tracing::debug!(event = %event, "ignoring non-text contribution: {:?}", other);
                }
            }
        }
        lines
    }

    /// Invoke an event and flatten its command help contributions.
    pub fn invoke_commands(&self, event: &Event) -> Vec<CommandHelp> {
        self.invoke(event)
            .contributions
            .into_iter()
            .flat_map(|contribution| match contribution {
                Contribution::Commands(commands) => commands,
                _ => Vec::new(),
            })
            .collect()
    }
}
