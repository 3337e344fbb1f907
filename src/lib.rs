//! cmdgate — command and path sandbox validator for autonomous agents.
//!
//! A gatekeeping layer that decides whether a shell command or filesystem
//! path issued by an agent is safe inside a bounded workspace directory. The
//! gate is advisory: it never executes anything itself, and a caller must
//! treat a rejection as a hard stop for that request.
//!
//! ```
//! use cmdgate::CommandValidator;
//!
//! let gate = CommandValidator::new("/home/agent/workspace");
//! assert!(gate.validate_command("cargo test").is_valid());
//! assert!(!gate.validate_command("sudo rm -rf /").is_valid());
//! assert!(!gate.validate_path("../../etc/passwd").is_valid());
//! ```

pub mod config;
pub mod error;
pub mod security;

pub use config::GateConfig;
pub use error::{GateError, Result};
pub use security::{
    CommandValidator, ErrorCode, PathValidator, PolicyExtensions, SecurityError, SecurityPolicy,
    ValidationResult,
};
