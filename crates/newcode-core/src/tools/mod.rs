//! Tools
//!
//! - [`ToolRegistry`]: flat name → registration function, feature gates,
//!   namespaced sources and lazy plugin discovery
//! - [`ToolHost`]: the agent-side seam tools are declared on
//! - [`ConstructorRegistry`]: the `uc:` namespaced source
//! - [`builtin`]: file, search and shell tools

pub mod builders;
pub mod builtin;
pub mod command;
pub mod host;
pub mod namespaced;
pub mod registry;
pub mod types;

pub use builders::ToolBuilder;
pub use command::{DEFAULT_COMMAND_TIMEOUT, command_handler};
pub use host::AgentTools;
pub use namespaced::{
    CONSTRUCTOR_PREFIX, ConstructorManifest, ConstructorRegistry, NamespacedTool, NamespacedToolSource,
    split_namespaced,
};
pub use registry::{BindEntry, BindOutcome, BindReport, FeatureGate, SkipReason, ToolRegistry};
pub use types::{
    RegisterFn, ToolDeclaration, ToolDescriptor, ToolHandler, ToolHost, ToolHostError, ToolOutput,
    ToolRegistration, handler, parse_args, register_fn,
};
