#![forbid(unsafe_code)]

mod cmd;
mod goal_command;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cadence: capacity-bounded iteration planner",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Read configuration from this file instead of the project or user config.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Planning",
        about = "Allocate a backlog into iterations",
        long_about = "Score, order and pack a backlog document into capacity-bounded iterations, \
                      then report metrics, risk, mitigations, recommendations and goals per iteration.",
        after_help = "EXAMPLES:\n    # Plan a backlog with the effective config\n    cadence plan backlog.json\n\n    # One-week iterations with a tighter buffer, as JSON\n    cadence plan backlog.json --iteration-days 7 --buffer 0.7 --format json\n\n    # Generate goal text with an external program\n    cadence plan backlog.json --goal-command ./goal.sh --goal-timeout 10"
    )]
    Plan(cmd::plan::PlanArgs),

    #[command(
        next_help_heading = "Planning",
        about = "Check a backlog document without planning it",
        long_about = "Parse and validate a backlog document against the effective config. \
                      Exits non-zero with a stable error code on the first problem found.",
        after_help = "EXAMPLES:\n    # Validate a backlog\n    cadence validate backlog.json\n\n    # Machine-readable result\n    cadence validate backlog.json --format json"
    )]
    Validate(cmd::validate::ValidateArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Show the effective configuration",
        long_about = "Print the configuration a run would use and where it was read from.",
        after_help = "EXAMPLES:\n    # Show effective config as TOML\n    cadence config\n\n    # Show a specific file merged over defaults\n    cadence --config team.toml config"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    cadence completions bash > ~/.local/share/bash-completion/completions/cadence"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "cadence=debug,info"
        } else {
            "cadence=info,warn"
        })
    });

    let format = env::var("CADENCE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the plan itself
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Plan(ref args) => cmd::plan::run_plan(args, config, output, &project_root),
        Commands::Validate(ref args) => {
            cmd::validate::run_validate(args, config, output, &project_root)
        }
        Commands::Config(ref args) => cmd::config::run_config(args, config, output, &project_root),
        Commands::Completions(ref args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_parses_overrides() {
        let cli = Cli::try_parse_from([
            "cadence",
            "plan",
            "backlog.json",
            "--iteration-days",
            "7",
            "--buffer",
            "0.7",
            "--format",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.format, Some(OutputMode::Json));
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(args.iteration_days, Some(7));
        assert_eq!(args.buffer, Some(0.7));
        assert_eq!(args.backlog, PathBuf::from("backlog.json"));
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["cadence", "validate", "b.json", "--json", "--config", "c.toml"])
            .expect("parse");
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["cadence", "--format", "yaml", "config"]).is_err());
    }
}
