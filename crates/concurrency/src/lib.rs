//! Concurrency layer for exclusive control
//!
//! This crate implements version-column based row concurrency control with:
//! - SQL statement templating per table (`template`)
//! - A process-wide descriptor cache with double-checked initialization (`cache`)
//! - Optimistic batch checks and pessimistic increments (`manager`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod manager;
pub mod naming;
pub mod template;

pub use cache::DescriptorCache;
pub use config::{ManagerConfig, DEFAULT_INITIAL_VERSION};
pub use manager::{ExclusiveControlManager, ExclusiveControlManagerBuilder};
pub use naming::{NamingStrategy, SnakeCaseNaming};
pub use template::{build_descriptor, SqlTemplates, TableDescriptor};
