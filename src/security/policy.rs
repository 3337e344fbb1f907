//! Immutable policy tables and compiled denylist matchers.
//!
//! All tables are fixed at [`SecurityPolicy`] construction and never mutated
//! afterwards, so a single policy value can be shared across threads without
//! coordination. Configuration may *extend* the built-in tables (fail-closed);
//! nothing can be removed from them.
//!
//! Matching is conservative, case-insensitive substring scanning over the
//! already-lowercased input. No shell tokenization is performed, so false
//! positives are an accepted trade-off.

use std::collections::HashSet;
use std::sync::Arc;

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};

/// Commands that must never reach a shell.
const DANGEROUS_COMMANDS: &[&str] = &[
    "sudo rm",
    "sudo dd",
    "sudo mkfs",
    "sudo chmod",
    "sudo chown",
    "sudo su",
    "su -",
    "su root",
    "rm -rf /",
    "rm -fr /",
    "mkfs",
    "dd if=",
    "dd of=/dev/",
    ":(){",
    "> /dev/sda",
    "shutdown",
    "reboot",
    "poweroff",
    "init 0",
    "init 6",
    "kill -9 -1",
    "shred /dev",
    "wipefs",
    "fdisk /dev",
    "history -c",
];

/// Literal and percent-encoded directory traversal sequences.
///
/// Kept lowercase; input is lowercased before matching, which makes the
/// percent-encoded variants case-insensitive as well.
const TRAVERSAL_SEQUENCES: &[&str] = &[
    "../",
    "..\\",
    "..%2f",
    "..%5c",
    "%2e%2e%2f",
    "%2e%2e%5c",
];

/// Network tools, raw listeners, and HTTP-server one-liners.
///
/// Network access requires a separate, explicit approval path that this gate
/// does not provide, so any hit is rejected outright.
const NETWORK_TOOLS: &[&str] = &[
    "wget",
    "curl",
    "ssh",
    "scp",
    "rsync",
    "ftp",
    "telnet",
    "nc -l",
    "nc -e",
    "ncat",
    "netcat",
    "socat",
    "python -m http.server",
    "python3 -m http.server",
    "php -s ",
    "ruby -run -e httpd",
];

/// Destructive filesystem operations.
const DANGEROUS_FILE_OPS: &[&str] = &[
    "rm -rf",
    "rm -fr",
    "rm -r ",
    "rm -f /",
    "rm --recursive",
    "chmod -r ",
    "chmod --recursive",
    "chown -r ",
    "chown --recursive",
    "find / -delete",
    "find / -exec rm",
    "truncate -s 0 /",
    "mv /* ",
];

/// System path prefixes an agent must not touch.
const PROTECTED_PATHS: &[&str] = &[
    "/etc",
    "/bin",
    "/sbin",
    "/boot",
    "/dev",
    "/lib",
    "/lib64",
    "/proc",
    "/root",
    "/sys",
    "/usr/bin",
    "/usr/sbin",
    "/usr/lib",
    "/var/log",
];

/// Denylisted file extensions (lowercase, without the dot).
const DANGEROUS_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "com", "scr", "pif", "msi", "msp", "dll", "vbs", "vbe", "ws", "wsf",
    "wsh", "hta", "cpl", "msc", "jar", "lnk", "reg", "ps1",
];

/// Windows reserved device names (matched against the uppercased stem).
const RESERVED_FILENAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// User-supplied additions to the built-in tables.
///
/// Loaded once from the `[policy]` section of the config file. Entries are
/// lowercased on ingestion; there is no way to remove a built-in entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyExtensions {
    /// Extra dangerous-command substrings.
    pub deny_commands: Vec<String>,
    /// Extra network-tool substrings.
    pub deny_network: Vec<String>,
    /// Extra destructive file-operation substrings.
    pub deny_file_ops: Vec<String>,
    /// Extra protected system path prefixes.
    pub protected_paths: Vec<String>,
    /// Extra denylisted file extensions (without the dot).
    pub deny_extensions: Vec<String>,
}

/// A denylist with its compiled multi-pattern matcher.
#[derive(Debug)]
struct DenyList {
    patterns: Vec<String>,
    matcher: AhoCorasick,
}

impl DenyList {
    fn new(name: &str, builtin: &[&str], extra: &[String]) -> Result<Self> {
        let mut patterns: Vec<String> = builtin.iter().map(|p| p.to_lowercase()).collect();
        for p in extra {
            let p = p.to_lowercase();
            if !p.is_empty() && !patterns.contains(&p) {
                patterns.push(p);
            }
        }
        let matcher = AhoCorasick::new(&patterns)
            .map_err(|e| GateError::Policy(format!("Failed to compile '{}' table: {}", name, e)))?;
        Ok(Self { patterns, matcher })
    }

    /// First pattern found scanning left to right, if any.
    fn first_match(&self, haystack: &str) -> Option<&str> {
        self.matcher
            .find(haystack)
            .map(|m| self.patterns[m.pattern().as_usize()].as_str())
    }
}

/// The complete, read-only policy-table set.
#[derive(Debug)]
pub struct SecurityPolicy {
    dangerous_commands: DenyList,
    traversal_sequences: DenyList,
    network_tools: DenyList,
    dangerous_file_ops: DenyList,
    protected_paths: Vec<String>,
    dangerous_extensions: HashSet<String>,
    reserved_filenames: HashSet<String>,
}

static BUILTIN: Lazy<Arc<SecurityPolicy>> = Lazy::new(|| {
    Arc::new(
        SecurityPolicy::new(&PolicyExtensions::default())
            .expect("built-in security tables compile"),
    )
});

impl SecurityPolicy {
    /// Compile the built-in tables plus any configured extensions.
    pub fn new(ext: &PolicyExtensions) -> Result<Self> {
        let mut protected_paths: Vec<String> =
            PROTECTED_PATHS.iter().map(|p| p.to_string()).collect();
        for p in &ext.protected_paths {
            let p = p.trim_end_matches('/').to_string();
            if p.starts_with('/') && !protected_paths.contains(&p) {
                protected_paths.push(p);
            }
        }

        let mut dangerous_extensions: HashSet<String> = DANGEROUS_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .collect();
        dangerous_extensions.extend(
            ext.deny_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase()),
        );

        Ok(Self {
            dangerous_commands: DenyList::new(
                "dangerous commands",
                DANGEROUS_COMMANDS,
                &ext.deny_commands,
            )?,
            traversal_sequences: DenyList::new("traversal", TRAVERSAL_SEQUENCES, &[])?,
            network_tools: DenyList::new("network tools", NETWORK_TOOLS, &ext.deny_network)?,
            dangerous_file_ops: DenyList::new(
                "dangerous file operations",
                DANGEROUS_FILE_OPS,
                &ext.deny_file_ops,
            )?,
            protected_paths,
            dangerous_extensions,
            reserved_filenames: RESERVED_FILENAMES.iter().map(|n| n.to_string()).collect(),
        })
    }

    /// The shared built-in policy (no config extensions).
    pub fn builtin() -> Arc<SecurityPolicy> {
        Arc::clone(&BUILTIN)
    }

    /// Dangerous-command pattern contained in `normalized`, if any.
    pub fn dangerous_command_match(&self, normalized: &str) -> Option<&str> {
        self.dangerous_commands.first_match(normalized)
    }

    /// Traversal sequence contained in `normalized`, if any.
    pub fn traversal_match(&self, normalized: &str) -> Option<&str> {
        self.traversal_sequences.first_match(normalized)
    }

    /// Network-tool pattern contained in `normalized`, if any.
    pub fn network_match(&self, normalized: &str) -> Option<&str> {
        self.network_tools.first_match(normalized)
    }

    /// Destructive file-operation pattern contained in `normalized`, if any.
    pub fn file_op_match(&self, normalized: &str) -> Option<&str> {
        self.dangerous_file_ops.first_match(normalized)
    }

    /// Protected system prefix that `path` starts with, if any.
    pub fn protected_prefix_match(&self, path: &str) -> Option<&str> {
        self.protected_paths
            .iter()
            .find(|p| path.starts_with(p.as_str()))
            .map(|p| p.as_str())
    }

    /// Whether the (lowercased) extension is denylisted.
    pub fn is_dangerous_extension(&self, extension: &str) -> bool {
        self.dangerous_extensions.contains(extension)
    }

    /// Whether the (uppercased) filename stem is a reserved device name.
    pub fn is_reserved_filename(&self, stem: &str) -> bool {
        self.reserved_filenames.contains(stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_compile() {
        let policy = SecurityPolicy::builtin();
        assert!(policy.dangerous_command_match("sudo rm -rf /tmp").is_some());
        assert!(policy.traversal_match("cat ../../etc/passwd").is_some());
        assert!(policy.network_match("curl https://example.com").is_some());
        assert!(policy.file_op_match("rm -rf build").is_some());
    }

    #[test]
    fn test_no_match_on_benign_input() {
        let policy = SecurityPolicy::builtin();
        assert!(policy.dangerous_command_match("ls -la").is_none());
        assert!(policy.network_match("git status").is_none());
        assert!(policy.file_op_match("cargo test").is_none());
    }

    #[test]
    fn test_first_match_reports_pattern_text() {
        let policy = SecurityPolicy::builtin();
        let hit = policy.dangerous_command_match("please sudo rm this").unwrap();
        assert_eq!(hit, "sudo rm");
    }

    #[test]
    fn test_extensions_are_lowercased_on_ingest() {
        let ext = PolicyExtensions {
            deny_commands: vec!["DROP TABLE".to_string()],
            ..Default::default()
        };
        let policy = SecurityPolicy::new(&ext).unwrap();
        assert_eq!(
            policy.dangerous_command_match("psql -c 'drop table users'"),
            Some("drop table")
        );
    }

    #[test]
    fn test_extension_table_extension() {
        let ext = PolicyExtensions {
            deny_extensions: vec![".APK".to_string()],
            ..Default::default()
        };
        let policy = SecurityPolicy::new(&ext).unwrap();
        assert!(policy.is_dangerous_extension("apk"));
        assert!(policy.is_dangerous_extension("exe"));
        assert!(!policy.is_dangerous_extension("txt"));
    }

    #[test]
    fn test_protected_prefix_extension_requires_absolute() {
        let ext = PolicyExtensions {
            protected_paths: vec!["/srv/secrets/".to_string(), "relative".to_string()],
            ..Default::default()
        };
        let policy = SecurityPolicy::new(&ext).unwrap();
        assert_eq!(
            policy.protected_prefix_match("/srv/secrets/key"),
            Some("/srv/secrets")
        );
        assert!(policy.protected_prefix_match("relative/thing").is_none());
    }

    #[test]
    fn test_reserved_names() {
        let policy = SecurityPolicy::builtin();
        assert!(policy.is_reserved_filename("CON"));
        assert!(policy.is_reserved_filename("COM9"));
        assert!(policy.is_reserved_filename("LPT1"));
        assert!(!policy.is_reserved_filename("COM10"));
        assert!(!policy.is_reserved_filename("README"));
    }

    #[test]
    fn test_traversal_sequences_cover_encoded_forms() {
        let policy = SecurityPolicy::builtin();
        for needle in ["../", "..\\", "..%2f", "..%5c", "%2e%2e%2f", "%2e%2e%5c"] {
            let input = format!("cat {}x", needle);
            assert!(
                policy.traversal_match(&input).is_some(),
                "expected traversal match for {:?}",
                needle
            );
        }
    }
}
