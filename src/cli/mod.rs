//! Command-line interface.
//!
//! `cmdgate check ...` validates a command, path, or filename and prints the
//! verdict; `cmdgate sanitize ...` prints a best-effort cleaned form. The CLI
//! never executes anything. Exit code 0 means the input passed, 1 means it
//! was rejected, 2 means the gate itself failed to start.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cmdgate::{CommandValidator, GateConfig, PathValidator, SecurityPolicy, ValidationResult};

#[derive(Debug, Parser)]
#[command(
    name = "cmdgate",
    version,
    about = "Command and path sandbox validator for autonomous agents"
)]
pub(crate) struct Cli {
    /// Workspace root to confine commands and paths to (defaults to the
    /// configured root, then the current directory)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Emit the verdict as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate input against the sandbox policy
    #[command(subcommand)]
    Check(CheckTarget),
    /// Best-effort cleanup of input (not a substitute for `check`)
    #[command(subcommand)]
    Sanitize(SanitizeTarget),
}

#[derive(Debug, Subcommand)]
enum CheckTarget {
    /// A shell command string
    Command { input: String },
    /// A filesystem path
    Path { input: String },
    /// A bare filename
    Filename { input: String },
}

#[derive(Debug, Subcommand)]
enum SanitizeTarget {
    /// A shell command string
    Command { input: String },
    /// A filename
    Filename { input: String },
}

pub(crate) fn run(cli: Cli) -> Result<i32> {
    let config = GateConfig::load().context("Failed to load configuration")?;
    let policy = Arc::new(
        SecurityPolicy::new(&config.policy).context("Failed to build security policy")?,
    );
    let workspace = resolve_workspace(cli.workspace, config.workspace_root)?;

    match cli.command {
        Command::Check(target) => {
            let result = match &target {
                CheckTarget::Command { input } => {
                    CommandValidator::with_policy(workspace, policy).validate_command(input)
                }
                CheckTarget::Path { input } => {
                    CommandValidator::with_policy(workspace, policy).validate_path(input)
                }
                CheckTarget::Filename { input } => {
                    PathValidator::with_policy(policy).validate_filename(input)
                }
            };
            render(&result, cli.json)?;
            Ok(if result.is_valid() { 0 } else { 1 })
        }
        Command::Sanitize(target) => {
            let cleaned = match &target {
                SanitizeTarget::Command { input } => {
                    CommandValidator::with_policy(workspace, policy).sanitize_command(input)
                }
                SanitizeTarget::Filename { input } => {
                    PathValidator::with_policy(policy).sanitize_filename(input)
                }
            };
            println!("{}", cleaned);
            Ok(0)
        }
    }
}

/// Pick the workspace root: flag, then config, then the current directory.
///
/// The validator itself never resolves paths, so a relative root from the
/// flag is canonicalized here, at the embedding boundary.
fn resolve_workspace(flag: Option<PathBuf>, configured: Option<PathBuf>) -> Result<String> {
    let root = match flag.or(configured) {
        Some(p) => p,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let root = if root.is_absolute() {
        root
    } else {
        std::fs::canonicalize(&root)
            .with_context(|| format!("Failed to resolve workspace root {}", root.display()))?
    };
    Ok(root.to_string_lossy().into_owned())
}

fn render(result: &ValidationResult, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(result).context("Failed to serialize verdict")?
        );
        return Ok(());
    }
    match result.error() {
        None => println!("OK"),
        Some(err) => {
            println!("DENIED [{}] {}", err.code, err.message);
            if let Some(path) = &err.path {
                println!("  path: {}", path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from(["cmdgate", "check", "command", "ls -la"]).unwrap();
        match cli.command {
            Command::Check(CheckTarget::Command { input }) => assert_eq!(input, "ls -la"),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "cmdgate",
            "check",
            "path",
            "../x",
            "--workspace",
            "/tmp/ws",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.workspace.as_deref(), Some(std::path::Path::new("/tmp/ws")));
        assert!(cli.json);
    }

    #[test]
    fn test_parse_sanitize_filename() {
        let cli = Cli::try_parse_from(["cmdgate", "sanitize", "filename", "a<b>.txt"]).unwrap();
        match cli.command {
            Command::Sanitize(SanitizeTarget::Filename { input }) => assert_eq!(input, "a<b>.txt"),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["cmdgate"]).is_err());
    }

    #[test]
    fn test_resolve_workspace_prefers_flag() {
        let root = resolve_workspace(
            Some(PathBuf::from("/flag/root")),
            Some(PathBuf::from("/config/root")),
        )
        .unwrap();
        assert_eq!(root, "/flag/root");
    }

    #[test]
    fn test_resolve_workspace_falls_back_to_config() {
        let root = resolve_workspace(None, Some(PathBuf::from("/config/root"))).unwrap();
        assert_eq!(root, "/config/root");
    }
}
