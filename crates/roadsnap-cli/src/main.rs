#![forbid(unsafe_code)]

mod cmd;
mod jira;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "rsnap: Jira roadmap snapshots and reports",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (ignored when ROADSNAP_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Work directory holding snapshots and reports (default: current dir).
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Config file (default: <DIR>/rsnap-config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pick projects and snapshots from a numbered menu.
    #[arg(short, long, global = true)]
    interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Snapshots",
        about = "Record a snapshot of every configured project",
        long_about = "Fetch epics and their issues from Jira and store them under <DIR>/<Project>/<date>/raw_data.",
        after_help = "EXAMPLES:\n    # Snapshot all configured projects\n    rsnap cache\n\n    # Record under an explicit date\n    rsnap cache --date 2024-03-01\n\n    # Pick one project\n    rsnap cache -i"
    )]
    Cache(cmd::cache::CacheArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Summarize the latest snapshot of each project",
        long_about = "Bucket epics into Done, Ongoing, Overdue and To Do and write a markdown summary next to the snapshot.",
        after_help = "EXAMPLES:\n    # Summarize every project\n    rsnap list\n\n    # Pick a project and snapshot\n    rsnap list -i\n\n    # Emit machine-readable output\n    rsnap list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Chart bucket sizes across snapshots",
        long_about = "Render one stacked bar per snapshot date into <DIR>/<Project>/roadmap-stats.svg.",
        after_help = "EXAMPLES:\n    # Chart every project\n    rsnap chart\n\n    # Chart one project\n    rsnap chart --project \"Mobile App\""
    )]
    Chart(cmd::chart::ChartArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Write monthly plan-vs-actual reports for a year",
        long_about = "Compare the first and last snapshot of each month and write <DIR>/<Project>/<Project>-<year>.md.",
        after_help = "EXAMPLES:\n    # Report on the current year\n    rsnap report\n\n    # Report on 2024\n    rsnap report --year 2024 --json"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    rsnap completions bash\n\n    # Generate zsh completions\n    rsnap completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Filter used when `ROADSNAP_LOG` is not set.
const fn default_filter(verbose: bool, debug_env: bool) -> &'static str {
    if verbose || debug_env {
        "roadsnap=debug,rsnap=debug,info"
    } else {
        "roadsnap=info,rsnap=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ROADSNAP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, env::var("DEBUG").is_ok())));

    let format = env::var("ROADSNAP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let output = resolve_output_mode(cli.json);

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let dir = match cli.dir {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    let ctx = cmd::Context::load(dir, cli.config.as_deref(), output, cli.interactive)?;

    match &cli.command {
        Commands::Cache(args) => cmd::cache::run_cache(args, &ctx),
        Commands::List(args) => cmd::list::run_list(args, &ctx),
        Commands::Chart(args) => cmd::chart::run_chart(args, &ctx),
        Commands::Report(args) => cmd::report::run_report(args, &ctx),
        Commands::Completions(_) => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(command = ?cli.command, "starting");

    let output = resolve_output_mode(cli.json);
    if let Err(err) = run(cli) {
        let _ = render_error(output, &CliError::from_anyhow(&err));
        std::process::exit(1);
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
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["rsnap", "list", "--json"]);
        assert!(cli.json);
        assert!(resolve_output_mode(cli.json).is_json());
    }

    #[test]
    fn global_dir_and_config_parse() {
        let cli = Cli::parse_from([
            "rsnap",
            "report",
            "--year",
            "2024",
            "--dir",
            "/work",
            "--config",
            "/etc/rsnap.toml",
        ]);
        assert_eq!(cli.dir, Some(PathBuf::from("/work")));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/rsnap.toml")));
        assert!(matches!(cli.command, Commands::Report(ref args) if args.year == Some(2024)));
    }

    #[test]
    fn interactive_flag_parsed() {
        let cli = Cli::parse_from(["rsnap", "-i", "cache", "--date", "2024-03-01"]);
        assert!(cli.interactive);
        assert!(matches!(
            cli.command,
            Commands::Cache(ref args) if args.date == chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        ));
    }

    #[test]
    fn chart_project_filter_parsed() {
        let cli = Cli::parse_from(["rsnap", "chart", "--project", "Mobile App"]);
        assert!(matches!(cli.command, Commands::Chart(ref args) if args.project.as_deref() == Some("Mobile App")));
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::parse_from(["rsnap", "list", "-v"]);
        assert!(cli.verbose);
        let cli = Cli::parse_from(["rsnap", "--verbose", "report"]);
        assert!(cli.verbose);
    }

    #[test]
    fn verbose_raises_default_filter_to_debug() {
        assert_eq!(default_filter(false, false), "roadsnap=info,rsnap=info,warn");
        assert_eq!(default_filter(true, false), "roadsnap=debug,rsnap=debug,info");
        assert_eq!(default_filter(false, true), default_filter(true, false));
    }

    #[test]
    fn completions_shell_parsed() {
        let cli = Cli::parse_from(["rsnap", "completions", "bash"]);
        assert!(matches!(cli.command, Commands::Completions(_)));
    }
}
