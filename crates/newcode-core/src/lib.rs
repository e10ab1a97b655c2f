//! newcode core library
//!
//! The registration and dispatch layer behind the newcode agents:
//!
//! - [`callbacks`]: named extension points with ordered, failure-isolated fan-out
//! - [`tools`]: tool registry, feature gates, namespaced sources and built-in tools
//! - [`plugins`]: plugin installation and at-most-once tool discovery
//! - [`agents`]: agent personas, prompt rendering and capability binding
//! - [`runtime`]: owns all of the above for one process
//!
//! # Example
//!
//! ```rust,no_run
//! use newcode_core::Runtime;
//! use newcode_core::tools::AgentTools;
//!
//! # async fn example() -> newcode_core::CoreResult<()> {
//! let runtime = Runtime::load().await?;
//! let mut host = AgentTools::new("husky");
//! let report = runtime.build_agent("husky", &mut host)?;
//! for (name, reason) in report.skipped() {
//!     println!("{name}: {reason}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod callbacks;
pub mod error;
mod isolate;
pub mod plugins;
pub mod runtime;
pub mod settings;
pub mod tools;

pub use error::{CoreError, CoreResult};
pub use isolate::in_isolated_call;
pub use runtime::{Runtime, RuntimeBuilder};
pub use settings::Settings;
