//! Host-facing helpers for covup: platform detection, environment secrets,
//! file modes and subprocess execution.

pub use error::{Error, Result};

pub mod arch;
pub mod command;
pub mod env;
mod error;
pub mod fs;
pub mod os;

pub use command::{Command, ExitReport, OUTPUT_TAIL_LIMIT};
pub use env::{Environment, MemoryEnv, ProcessEnv, SecretLifecycle};
pub use os::UploaderPlatform;
