//! Command-line parsing.
//!
//! gantry's surface is `gantry [global-flags] <task> [task-args…]`: global
//! flags are parsed up to the first positional, and everything after the
//! task name is handed to the task verbatim. `--help` before the task name
//! rewrites the invocation as `help <task>`; `--help` after it is just
//! another task argument.

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::logging::LogLevel;

/// Parsed command line.
#[derive(Parser, Debug)]
#[command(
    name = "gantry",
    about = "Run a gantry task.",
    version = option_env!("GANTRY_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
    disable_help_flag = true
)]
pub struct Cli {
    /// Show this help message, or help for the given task
    #[arg(long)]
    pub help: bool,

    /// Log level (DEBUG|INFO|WARN|ERROR|NONE)
    #[arg(long, value_enum, default_value_t = LogLevel::Debug, ignore_case = true)]
    pub log: LogLevel,

    /// Force task execution
    #[arg(long)]
    pub force: bool,

    /// Force execution including task dependencies
    #[arg(long)]
    pub force_all: bool,

    /// Clean before running task
    #[arg(long)]
    pub clean: bool,

    /// Clean all dependencies before running task
    #[arg(long)]
    pub clean_all: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, hide = true)]
    pub completions: Option<Shell>,

    /// Task name followed by arguments for the task
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub remainder: Vec<String>,
}

/// The effective task invocation after `--help` rewriting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Task to run; `help` when no task was given.
    pub task: String,
    /// Arguments handed to the task verbatim.
    pub args: Vec<String>,
}

impl Cli {
    /// Resolve the effective task and its arguments.
    ///
    /// With no positional task the effective task is `help`. When the
    /// `--help` flag is set, the invocation is rewritten as `help <task>`
    /// so `gantry --help foo` and `gantry help foo` behave the same.
    #[must_use]
    pub fn invocation(&self) -> Invocation {
        let mut parts = self.remainder.iter();
        let task = parts
            .next()
            .cloned()
            .unwrap_or_else(|| "help".to_string());
        let args: Vec<String> = parts.cloned().collect();

        if self.help {
            let args = if task == "help" { args } else { vec![task] };
            return Invocation {
                task: "help".to_string(),
                args,
            };
        }
        Invocation { task, args }
    }
}

/// Write completions for `shell` to stdout.
pub fn print_completions(shell: Shell) {
    clap_complete::generate(shell, &mut Cli::command(), "gantry", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_task_with_args() {
        let cli = Cli::parse_from(["gantry", "build", "--release", "x"]);
        let inv = cli.invocation();
        assert_eq!(inv.task, "build");
        assert_eq!(inv.args, vec!["--release", "x"]);
    }

    #[test]
    fn no_task_defaults_to_help() {
        let cli = Cli::parse_from(["gantry"]);
        let inv = cli.invocation();
        assert_eq!(inv.task, "help");
        assert!(inv.args.is_empty());
    }

    #[test]
    fn help_flag_before_task_rewrites_to_help_task() {
        let cli = Cli::parse_from(["gantry", "--help", "build"]);
        assert!(cli.help);
        let inv = cli.invocation();
        assert_eq!(inv.task, "help");
        assert_eq!(inv.args, vec!["build"]);
    }

    #[test]
    fn help_flag_after_task_is_a_task_arg() {
        let cli = Cli::parse_from(["gantry", "build", "--help"]);
        assert!(!cli.help);
        let inv = cli.invocation();
        assert_eq!(inv.task, "build");
        assert_eq!(inv.args, vec!["--help"]);
    }

    #[test]
    fn bare_help_flag_shows_general_help() {
        let cli = Cli::parse_from(["gantry", "--help"]);
        let inv = cli.invocation();
        assert_eq!(inv.task, "help");
        assert!(inv.args.is_empty());
    }

    #[test]
    fn parse_force_flags() {
        let cli = Cli::parse_from(["gantry", "--force", "build"]);
        assert!(cli.force);
        assert!(!cli.force_all);

        let cli = Cli::parse_from(["gantry", "--force-all", "build"]);
        assert!(cli.force_all);
    }

    #[test]
    fn parse_clean_flags() {
        let cli = Cli::parse_from(["gantry", "--clean", "build"]);
        assert!(cli.clean);

        let cli = Cli::parse_from(["gantry", "--clean-all", "build"]);
        assert!(cli.clean_all);
    }

    #[test]
    fn flags_after_task_go_to_the_task() {
        let cli = Cli::parse_from(["gantry", "build", "--force"]);
        assert!(!cli.force, "--force after the task belongs to the task");
        assert_eq!(cli.invocation().args, vec!["--force"]);
    }

    #[test]
    fn parse_log_level_uppercase() {
        let cli = Cli::parse_from(["gantry", "--log", "WARN", "build"]);
        assert_eq!(cli.log, LogLevel::Warn);
    }

    #[test]
    fn parse_log_level_ignores_case() {
        let cli = Cli::parse_from(["gantry", "--log", "error", "build"]);
        assert_eq!(cli.log, LogLevel::Error);
    }

    #[test]
    fn default_log_level_is_debug() {
        let cli = Cli::parse_from(["gantry", "build"]);
        assert_eq!(cli.log, LogLevel::Debug);
    }
}
