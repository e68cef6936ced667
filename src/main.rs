use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use git_partial_pr::parse::parse_selection;
use git_partial_pr::{Config, PartialPr, PatchSource, PrRequest};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "git-partial-pr", version)]
#[command(about = "Open a pull request containing only selected lines of your working tree")]
struct Cli {
    /// Repository to operate on
    #[arg(short = 'C', global = true, default_value = ".")]
    repo: String,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log git commands and stage transitions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move the selected lines onto a new branch, commit, and push
    Create {
        /// Commit message; also names the branch
        #[arg(short, long)]
        message: String,

        /// Lines to include (e.g., "src/parser.rs:41" or "src/parser.rs:41..45")
        #[arg(required_unless_present = "staged", conflicts_with = "staged")]
        selection: Option<String>,

        /// Use everything currently staged instead of a line selection
        #[arg(long)]
        staged: bool,

        /// Branch name prefix (overrides the config file)
        #[arg(long)]
        username: Option<String>,

        /// Commit on the new branch but do not push it
        #[arg(long)]
        no_push: bool,

        /// Keep the new branch if the transition fails before committing
        #[arg(long)]
        keep_branch_on_failure: bool,

        /// Lines of diff context around each hunk
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        context: Option<u32>,
    },
    /// Print the patch a selection would produce without changing anything
    Extract {
        /// Lines to include (e.g., "src/parser.rs:41..45")
        selection: String,

        /// Lines of diff context around each hunk
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        context: Option<u32>,
    },
    /// Generate shell completions
    Completions { shell: Shell },
    /// Render the man page
    Man,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let partial = PartialPr::new(&cli.repo);

    match cli.command {
        Commands::Create {
            message,
            selection,
            staged,
            username,
            no_push,
            keep_branch_on_failure,
            context,
        } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if username.is_some() {
                config.username = username;
            }
            if no_push {
                config.push = false;
            }
            if keep_branch_on_failure {
                config.delete_branch_on_failure = false;
            }
            if let Some(context) = context {
                config.diff_context = context;
            }
            debug!(?config, "resolved configuration");

            let source = match selection {
                Some(selection) if !staged => {
                    let selection = parse_selection(&selection)?;
                    PatchSource::Selection {
                        path: selection.file,
                        range: selection.range,
                    }
                }
                _ => PatchSource::Staged,
            };

            let outcome = partial.create(&config, &PrRequest { source, message })?;

            println!(
                "Committed to {} (based on {})",
                outcome.branch, outcome.base_branch
            );
            if outcome.pushed {
                println!("Pushed {} to {}", outcome.branch, config.remote);
            }
            if let Some(url) = &outcome.pr_url {
                println!("Open a pull request: {url}");
            }
            if let Some(label) = &outcome.stash_left_in_place {
                eprintln!(
                    "warning: stash '{label}' was not found to restore; check `git stash list`"
                );
            }
        }
        Commands::Extract { selection, context } => {
            let config = Config::load(cli.config.as_deref())?;
            let selection = parse_selection(&selection)?;
            let range = selection
                .range
                .ok_or_else(|| format!("'{}' needs a line or range, e.g. FILE:N..M", selection.file))?;
            let patch = partial.extract(
                &selection.file,
                range,
                context.unwrap_or(config.diff_context),
            )?;
            print!("{patch}");
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-partial-pr", &mut io::stdout());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut io::stdout())?;
        }
    }

    Ok(())
}
