//! Workspace-bound command and path validation.
//!
//! A [`CommandValidator`] is constructed once per workspace root and consulted
//! before a command string is handed to a shell or a path is touched. Every
//! call is a pure, synchronous function of the input, the immutable policy
//! tables, and the fixed workspace root, so instances are freely shared across
//! threads.
//!
//! Path checks are pure string manipulation: no filesystem access, no symlink
//! resolution. A symlink inside the workspace can therefore still point
//! outside it; callers that need that guarantee must enforce it at execution
//! time.

use std::sync::Arc;

use tracing::{debug, warn};

use super::policy::SecurityPolicy;
use super::verdict::{ErrorCode, SecurityError, ValidationResult};

/// Shell metacharacters removed by [`CommandValidator::sanitize_command`].
const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '`', '$', '(', ')', '{', '}', '[', ']'];

/// Pre-execution gate for shell commands and filesystem paths.
pub struct CommandValidator {
    workspace_root: String,
    policy: Arc<SecurityPolicy>,
}

impl CommandValidator {
    /// Bind a validator to an absolute, already-resolved workspace root.
    ///
    /// The root is taken as-is apart from stripping trailing slashes; the
    /// caller is responsible for resolving it (no canonicalization happens
    /// here or in any later check).
    pub fn new(workspace_root: impl Into<String>) -> Self {
        Self::with_policy(workspace_root, SecurityPolicy::builtin())
    }

    /// Same as [`new`](Self::new) with an explicit (config-extended) policy.
    pub fn with_policy(workspace_root: impl Into<String>, policy: Arc<SecurityPolicy>) -> Self {
        let mut root = workspace_root.into();
        while root.len() > 1 && root.ends_with('/') {
            root.pop();
        }
        Self {
            workspace_root: root,
            policy,
        }
    }

    /// The workspace root this validator is bound to.
    pub fn workspace_root(&self) -> &str {
        &self.workspace_root
    }

    /// Decide whether a raw command string may be passed to a shell.
    ///
    /// Checks run in a fixed order (denylist, traversal, network, file ops);
    /// the first hit wins and exactly one [`SecurityError`] is produced per
    /// call. Matching happens on a lowercased, trimmed copy — the caller must
    /// execute the *original* string if the command is permitted.
    pub fn validate_command(&self, command: &str) -> ValidationResult {
        let normalized = command.trim().to_lowercase();

        if let Some(pattern) = self.policy.dangerous_command_match(&normalized) {
            warn!(pattern, "Blocked command: dangerous pattern");
            return ValidationResult::deny(SecurityError::new(
                ErrorCode::DangerousCommand,
                "validate_command",
                format!("Command matches dangerous pattern '{}'", pattern),
                "dangerous command pattern",
            ));
        }

        if let Some(sequence) = self.policy.traversal_match(&normalized) {
            warn!(sequence, "Blocked command: path traversal sequence");
            return ValidationResult::deny(SecurityError::new(
                ErrorCode::PathTraversal,
                "validate_command",
                format!("Command contains path traversal sequence '{}'", sequence),
                "path traversal sequence",
            ));
        }

        if let Some(tool) = self.policy.network_match(&normalized) {
            warn!(tool, "Blocked command: network operation");
            return ValidationResult::deny(SecurityError::new(
                ErrorCode::NetworkOperation,
                "validate_command",
                format!(
                    "Command invokes network tool '{}'; network access requires explicit approval",
                    tool.trim()
                ),
                "network operation",
            ));
        }

        if let Some(pattern) = self.policy.file_op_match(&normalized) {
            warn!(pattern, "Blocked command: destructive file operation");
            return ValidationResult::deny(SecurityError::new(
                ErrorCode::DangerousFileOp,
                "validate_command",
                format!(
                    "Command matches destructive file operation '{}'",
                    pattern.trim()
                ),
                "destructive file operation",
            ));
        }

        debug!("Command passed validation");
        ValidationResult::allow()
    }

    /// Decide whether a path stays inside the workspace.
    ///
    /// The path is normalized (string-only, see [`normalize_path`]), then
    /// checked for workspace containment. A contained path is always valid,
    /// so a workspace nested under a protected-looking prefix never blocks
    /// itself; an uncontained path reports [`ErrorCode::ProtectedPath`] when
    /// it targets a protected system prefix, otherwise
    /// [`ErrorCode::PathOutOfBounds`].
    ///
    /// [`normalize_path`]: Self::normalize_path
    pub fn validate_path(&self, path: &str) -> ValidationResult {
        let normalized = self.normalize_path(path);

        if normalized.starts_with(&self.workspace_root) {
            debug!(path = %normalized, "Path contained in workspace");
            return ValidationResult::allow();
        }

        if let Some(prefix) = self.policy.protected_prefix_match(&normalized) {
            warn!(path = %normalized, prefix, "Blocked path: protected system location");
            return ValidationResult::deny(
                SecurityError::new(
                    ErrorCode::ProtectedPath,
                    "validate_path",
                    format!("Path targets protected system location '{}'", prefix),
                    "protected system path",
                )
                .with_path(normalized),
            );
        }

        warn!(path = %normalized, "Blocked path: outside workspace");
        ValidationResult::deny(
            SecurityError::new(
                ErrorCode::PathOutOfBounds,
                "validate_path",
                "Path resolves outside the workspace",
                "outside workspace",
            )
            .with_path(normalized),
        )
    }

    /// Resolve a path string against the workspace root without touching the
    /// filesystem.
    ///
    /// - `./rest` is anchored at the workspace root.
    /// - A leading run of `../` segments walks up the workspace root's
    ///   components; walking past the filesystem root collapses the whole
    ///   path to the unresolvable sentinel `/` (fail closed).
    /// - A bare relative path is anchored at the workspace root.
    /// - Slash runs are collapsed and a trailing slash is stripped (unless
    ///   the entire path is `/`).
    pub fn normalize_path(&self, path: &str) -> String {
        let trimmed = path.trim();

        let joined = if let Some(rest) = trimmed.strip_prefix("./") {
            format!("{}/{}", self.workspace_root, rest)
        } else if trimmed.starts_with("../") {
            let mut levels = 0usize;
            let mut rest = trimmed;
            while let Some(r) = rest.strip_prefix("../") {
                levels += 1;
                rest = r;
            }
            let components: Vec<&str> = self
                .workspace_root
                .split('/')
                .filter(|c| !c.is_empty())
                .collect();
            if levels >= components.len() {
                // Traversal escapes past the filesystem root.
                return "/".to_string();
            }
            let kept = &components[..components.len() - levels];
            format!("/{}/{}", kept.join("/"), rest)
        } else if !trimmed.starts_with('/') {
            format!("{}/{}", self.workspace_root, trimmed)
        } else {
            trimmed.to_string()
        };

        collapse_slashes(&joined)
    }

    /// Best-effort hardening of a command string.
    ///
    /// Removes shell metacharacters, collapses whitespace runs to single
    /// spaces, trims, and strips enclosing matching-quote layers. Idempotent.
    /// This is *not* a substitute for [`validate_command`]; sanitized output
    /// must still be validated before execution.
    ///
    /// [`validate_command`]: Self::validate_command
    pub fn sanitize_command(&self, command: &str) -> String {
        let stripped: String = command
            .chars()
            .filter(|c| !SHELL_METACHARACTERS.contains(c))
            .collect();

        let mut collapsed = String::with_capacity(stripped.len());
        let mut prev_ws = false;
        for c in stripped.chars() {
            if c.is_whitespace() {
                if !prev_ws {
                    collapsed.push(' ');
                }
                prev_ws = true;
            } else {
                collapsed.push(c);
                prev_ws = false;
            }
        }

        // Quote-stripping loops so the result is never itself quote-wrapped,
        // which is what makes a second application the identity.
        let mut s = collapsed.trim();
        loop {
            let bytes = s.as_bytes();
            if s.len() >= 2 {
                let (first, last) = (bytes[0], bytes[s.len() - 1]);
                if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
                    s = s[1..s.len() - 1].trim();
                    continue;
                }
            }
            break;
        }
        s.to_string()
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}
