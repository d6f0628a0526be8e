//! Shared vocabulary for aiderlib.
//!
//! This crate holds everything both halves of the system agree on:
//! - `paths`: the install layout (where the uv binary, the deployed Python
//!   project, and the virtualenv live)
//! - `request`: the caller-facing request model and the wire payload handed
//!   to the interpreter entrypoint
//! - `credentials`: provider credential snapshots
//! - `resolve`: request validation and normalization
//!
//! No I/O beyond the repository-path existence check in `resolve`; the
//! bootstrapper and the runtime bridge live in their own crates.

pub mod credentials;
pub mod paths;
pub mod request;
pub mod resolve;

pub use credentials::AmbientCredentials;
pub use paths::{InstallLayout, PathError};
pub use request::{AiderOutput, AiderRequest, ResolvedRequest};
pub use resolve::{resolve, EnvironmentError, ResolveError, ValidationError};
