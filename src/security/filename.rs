//! Filename validation and sanitization.
//!
//! Applied wherever a filename is accepted from agent-influenced input,
//! independently of any workspace binding. Validation rejects; sanitization
//! cleans. The two are deliberately separate: [`sanitize_filename`] does not
//! reject reserved device names, it only normalizes characters — a sanitized
//! name must still pass [`validate_filename`] before use.
//!
//! [`sanitize_filename`]: PathValidator::sanitize_filename
//! [`validate_filename`]: PathValidator::validate_filename

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::policy::SecurityPolicy;
use super::verdict::{ErrorCode, SecurityError, ValidationResult};

/// Maximum filename length in characters.
const MAX_FILENAME_CHARS: usize = 255;

/// Fallback name when sanitization leaves nothing.
const EMPTY_FILENAME_SUBSTITUTE: &str = "unnamed_file";

/// Characters replaced with `_` by sanitization.
const REPLACED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

// C0 controls plus the C1 range (U+0080–U+009F).
static CONTROL_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1F\u{80}-\u{9F}]").unwrap());

/// Stateless filename gate.
///
/// Holds only an immutable policy reference; every call is a pure function
/// of its input and the tables.
pub struct PathValidator {
    policy: Arc<SecurityPolicy>,
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PathValidator {
    /// Validator over the built-in policy tables.
    pub fn new() -> Self {
        Self::with_policy(SecurityPolicy::builtin())
    }

    /// Validator over an explicit (config-extended) policy.
    pub fn with_policy(policy: Arc<SecurityPolicy>) -> Self {
        Self { policy }
    }

    /// Check a filename against byte, extension, and reserved-name rules.
    ///
    /// Checks run in that order; the first failure wins.
    pub fn validate_filename(&self, name: &str) -> ValidationResult {
        if name.contains('\0') {
            warn!("Blocked filename: null byte");
            return ValidationResult::deny(
                SecurityError::new(
                    ErrorCode::InvalidFilename,
                    "validate_filename",
                    "Filename contains a null byte",
                    "null byte",
                )
                .with_path(name.replace('\0', "\\0")),
            );
        }

        if let Some((_, extension)) = name.rsplit_once('.') {
            let extension = extension.to_lowercase();
            if self.policy.is_dangerous_extension(&extension) {
                warn!(extension = %extension, "Blocked filename: denylisted extension");
                return ValidationResult::deny(
                    SecurityError::new(
                        ErrorCode::DangerousExtension,
                        "validate_filename",
                        format!("Filename has denylisted extension '{}'", extension),
                        "denylisted extension",
                    )
                    .with_path(name),
                );
            }
        }

        let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
        let stem_upper = stem.to_uppercase();
        if self.policy.is_reserved_filename(&stem_upper) {
            warn!(stem = %stem_upper, "Blocked filename: reserved device name");
            return ValidationResult::deny(
                SecurityError::new(
                    ErrorCode::ReservedFilename,
                    "validate_filename",
                    format!("Filename stem '{}' is a reserved device name", stem_upper),
                    "reserved device name",
                )
                .with_path(name),
            );
        }

        ValidationResult::allow()
    }

    /// Character-level cleanup of a filename.
    ///
    /// Strips control characters, replaces filesystem-hostile characters with
    /// `_`, trims leading/trailing periods and whitespace, substitutes
    /// `unnamed_file` for an empty result, and truncates to 255 characters
    /// while keeping the extension intact.
    pub fn sanitize_filename(&self, name: &str) -> String {
        let cleaned = CONTROL_CHARS_RE.replace_all(name, "");
        let replaced: String = cleaned
            .chars()
            .map(|c| if REPLACED_CHARS.contains(&c) { '_' } else { c })
            .collect();
        let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());

        if trimmed.is_empty() {
            return EMPTY_FILENAME_SUBSTITUTE.to_string();
        }
        truncate_preserving_extension(trimmed, MAX_FILENAME_CHARS)
    }
}

/// Cut `name` down to `max_chars` characters, reserving `extension + 1`
/// characters for the extension suffix when one exists.
fn truncate_preserving_extension(name: &str, max_chars: usize) -> String {
    let total = name.chars().count();
    if total <= max_chars {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((stem, extension)) if !extension.is_empty() => {
            let reserved = extension.chars().count() + 1;
            let keep = max_chars.saturating_sub(reserved);
            if keep == 0 {
                // Extension alone exhausts the budget; plain cut.
                name.chars().take(max_chars).collect()
            } else {
                let head: String = stem.chars().take(keep).collect();
                format!("{}.{}", head, extension)
            }
        }
        _ => name.chars().take(max_chars).collect(),
    }
}
