//! Types and utilities shared by every binary in the workspace: the replicated
//! command wire format, the error taxonomy mapped onto HTTP responses, CLI flag
//! structs, and logging bootstrap.

pub mod command;
pub mod config;
pub mod error;
pub mod logging;

pub use command::Command;
pub use error::ApiError;
