//! Validation verdict types.
//!
//! Every check returns a [`ValidationResult`] value; a rejection carries a
//! [`SecurityError`] describing the violation. Nothing here is ever thrown —
//! callers branch on the result and render `message`/`reason` verbatim to the
//! operator (both are guaranteed free of secrets and stack traces).

use serde::{Deserialize, Serialize};

/// Machine-readable violation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Command matched the dangerous-command denylist.
    DangerousCommand,
    /// Command contains a literal or percent-encoded traversal sequence.
    PathTraversal,
    /// Command invokes a network tool; network access needs separate approval.
    NetworkOperation,
    /// Command matched the destructive file-operation denylist.
    DangerousFileOp,
    /// Path resolves outside the workspace root.
    PathOutOfBounds,
    /// Path targets a protected system location.
    ProtectedPath,
    /// Filename contains an illegal byte.
    InvalidFilename,
    /// Filename carries a denylisted extension.
    DangerousExtension,
    /// Filename stem is a reserved device name.
    ReservedFilename,
}

impl ErrorCode {
    /// The wire/display form of the code (`DANGEROUS_COMMAND`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DangerousCommand => "DANGEROUS_COMMAND",
            Self::PathTraversal => "PATH_TRAVERSAL",
            Self::NetworkOperation => "NETWORK_OPERATION",
            Self::DangerousFileOp => "DANGEROUS_FILE_OP",
            Self::PathOutOfBounds => "PATH_OUT_OF_BOUNDS",
            Self::ProtectedPath => "PROTECTED_PATH",
            Self::InvalidFilename => "INVALID_FILENAME",
            Self::DangerousExtension => "DANGEROUS_EXTENSION",
            Self::ReservedFilename => "RESERVED_FILENAME",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single policy violation. Constructed fresh per rejection, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityError {
    /// Violation category.
    pub code: ErrorCode,
    /// Human-readable description, safe to display verbatim.
    pub message: String,
    /// The validator operation that produced the rejection.
    pub operation: String,
    /// Short machine-friendly reason.
    pub reason: String,
    /// The offending path, for path-related violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SecurityError {
    /// Build a violation for `operation` with a display message and short reason.
    pub fn new(
        code: ErrorCode,
        operation: &str,
        message: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            operation: operation.to_string(),
            reason: reason.into(),
            path: None,
        }
    }

    /// Attach the offending path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Outcome of a single validation call.
///
/// Invariant: `error` is present iff the result is a rejection. The fields are
/// private and only the [`allow`](Self::allow)/[`deny`](Self::deny)
/// constructors exist, so the invariant holds on every return path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<SecurityError>,
}

impl ValidationResult {
    /// The input passed every check.
    pub fn allow() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    /// The input was rejected with the given violation.
    pub fn deny(error: SecurityError) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }

    /// Whether the input may proceed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The violation, present iff the input was rejected.
    pub fn error(&self) -> Option<&SecurityError> {
        self.error.as_ref()
    }

    /// Consume the result, yielding the violation if any.
    pub fn into_error(self) -> Option<SecurityError> {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display_is_screaming_snake() {
        assert_eq!(ErrorCode::DangerousCommand.to_string(), "DANGEROUS_COMMAND");
        assert_eq!(ErrorCode::PathOutOfBounds.to_string(), "PATH_OUT_OF_BOUNDS");
        assert_eq!(ErrorCode::ReservedFilename.to_string(), "RESERVED_FILENAME");
    }

    #[test]
    fn test_code_serde_matches_display() {
        let json = serde_json::to_string(&ErrorCode::NetworkOperation).unwrap();
        assert_eq!(json, "\"NETWORK_OPERATION\"");
        let parsed: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ErrorCode::NetworkOperation);
    }

    #[test]
    fn test_allow_has_no_error() {
        let r = ValidationResult::allow();
        assert!(r.is_valid());
        assert!(r.error().is_none());
    }

    #[test]
    fn test_deny_carries_error() {
        let err = SecurityError::new(
            ErrorCode::PathTraversal,
            "validate_command",
            "Command contains a path traversal sequence",
            "path traversal sequence",
        );
        let r = ValidationResult::deny(err.clone());
        assert!(!r.is_valid());
        assert_eq!(r.error(), Some(&err));
        assert_eq!(r.into_error(), Some(err));
    }

    #[test]
    fn test_error_with_path() {
        let err = SecurityError::new(
            ErrorCode::PathOutOfBounds,
            "validate_path",
            "Path resolves outside the workspace",
            "outside workspace",
        )
        .with_path("/etc/passwd");
        assert_eq!(err.path.as_deref(), Some("/etc/passwd"));
    }

    #[test]
    fn test_result_json_shape() {
        let r = ValidationResult::allow();
        assert_eq!(serde_json::to_string(&r).unwrap(), "{\"valid\":true}");

        let r = ValidationResult::deny(SecurityError::new(
            ErrorCode::DangerousCommand,
            "validate_command",
            "Command matches dangerous pattern 'sudo rm'",
            "dangerous command pattern",
        ));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["error"]["code"], "DANGEROUS_COMMAND");
        assert!(json["error"].get("path").is_none());
    }

    #[test]
    fn test_error_display() {
        let err = SecurityError::new(
            ErrorCode::DangerousExtension,
            "validate_filename",
            "Filename has a denylisted extension 'exe'",
            "denylisted extension",
        );
        assert_eq!(
            err.to_string(),
            "DANGEROUS_EXTENSION: Filename has a denylisted extension 'exe'"
        );
    }
}
