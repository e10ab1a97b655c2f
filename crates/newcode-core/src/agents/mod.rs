//! Agents
//!
//! Agent personas are data: a name, a capability list and a prompt template.
//! The [`AgentCatalog`] binds a persona's capabilities through the tool
//! registry; prompts are rendered on demand from current settings plus the
//! `load_prompt` extension point.

pub mod catalog;
pub mod descriptor;
pub mod prompts;

pub use catalog::{AgentCatalog, builtin_agents};
pub use descriptor::{AgentDescriptor, AgentSummary, PromptContext, StaticAgent};
