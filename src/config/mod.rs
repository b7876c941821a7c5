//! Configuration loading and management for the Leave Ledger Engine.
//!
//! The engine has no global settings lookup: a [`LeavePolicy`] is built
//! once (programmatically or from YAML via [`PolicyLoader`]) and handed to
//! the engine at construction.

mod loader;
mod types;

pub use loader::PolicyLoader;
pub use types::{LeavePolicy, RetrySettings, YearBoundaryPolicy};
