//! Small utilities shared by every crate in the workspace.

pub mod env;
pub mod locks;
pub mod logging;

pub use env::{ConfigError, env_or, get_env_var};
pub use locks::KeyedLocks;
pub use logging::init_tracing;
