//! Command and path sandbox validation.
//!
//! A pre-execution policy gate: callers construct a [`CommandValidator`] with
//! their workspace root and consult it before handing a command to a shell or
//! touching a path; [`PathValidator`] checks individual filenames wherever
//! agent-influenced input names a file. Every check returns a structured
//! [`ValidationResult`] — nothing here executes commands or enforces OS-level
//! sandboxing.
//!
//! Matching is conservative substring scanning over denylists (over-blocking
//! is accepted by design) and path resolution is pure string manipulation
//! that does not follow symlinks.

pub mod command;
pub mod filename;
pub mod policy;
pub mod verdict;

pub use command::CommandValidator;
pub use filename::PathValidator;
pub use policy::{PolicyExtensions, SecurityPolicy};
pub use verdict::{ErrorCode, SecurityError, ValidationResult};
