use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use git_weave::diff::format_records;
use git_weave::graph::Pass;
use git_weave::parse::parse_selection;
use git_weave::{GraphRequest, PatchPurpose, Settings, Weave, WeaveError};
use std::io::{self, Write};
use std::ops::Range;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "git-weave", version)]
#[command(about = "Commit graph lanes and line-level staging for git")]
struct Cli {
    /// Run as if started in this repository
    #[arg(short = 'C', global = true, default_value = ".")]
    repo: PathBuf,

    /// Settings file (defaults to ~/.config/git-weave/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more; repeat for more detail
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the commit graph, one visible commit per line
    Graph {
        /// Stop after this many commits
        #[arg(short = 'n', long)]
        max_count: Option<usize>,
        /// Hide the history only reachable from this branch tip
        #[arg(long, value_name = "REV")]
        hide: Vec<String>,
        /// Keep this commit visible even if hidden branches reach it
        #[arg(long, value_name = "REV")]
        show: Vec<String>,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
        /// Lanes kept in each row's snapshot
        #[arg(long)]
        max_lanes: Option<usize>,
        /// Open new lanes on the right instead of reusing free ones
        #[arg(long)]
        rightmost: bool,
        /// Revisions to start from (default: all refs)
        revisions: Vec<String>,
    },
    /// Show the numbered line records of a file's diff
    Diff {
        /// Show staged changes instead of unstaged ones
        #[arg(long)]
        cached: bool,
        #[arg(short = 'U', long = "unified", value_name = "N")]
        context: Option<usize>,
        file: String,
    },
    /// Stage the selected records of the unstaged diff (e.g. 4..9)
    Stage(PatchArgs),
    /// Unstage the selected records of the staged diff
    Unstage(PatchArgs),
    /// Discard the selected records of the unstaged diff from the working tree
    Discard(PatchArgs),
    /// Generate shell completions
    Completions { shell: Shell },
    /// Print the man page
    Man,
}

#[derive(clap::Args)]
struct PatchArgs {
    file: String,
    /// Record indices: N, N..M or N..=M
    #[arg(value_parser = parse_selection)]
    selection: Range<usize>,
    /// Context lines around the selection
    #[arg(short = 'U', long = "unified", value_name = "N")]
    context: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(WeaveError::NothingToPatch { file }) => {
            eprintln!("nothing to patch in {file}");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<(), WeaveError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };

    match cli.command {
        Commands::Graph {
            max_count,
            hide,
            show,
            json,
            max_lanes,
            rightmost,
            revisions,
        } => {
            if let Some(max_lanes) = max_lanes {
                settings.max_lanes = max_lanes;
            }
            settings.force_rightmost |= rightmost;

            let request = GraphRequest {
                max_count,
                revisions,
                hide,
                show,
            };
            let weave = Weave::new(cli.repo, settings);
            let rows = weave.graph(&request, |progress| {
                let pass = match progress.pass {
                    Pass::Hidden => "hidden",
                    Pass::Lanes => "lanes",
                };
                log::info!("{pass}: {}/{}", progress.done, progress.total);
            })?;

            let mut out = io::stdout().lock();
            if json {
                let text =
                    serde_json::to_string_pretty(&rows).map_err(|e| WeaveError::OutputFailed {
                        message: e.to_string(),
                    })?;
                print(&mut out, &text)?;
            } else {
                for row in &rows {
                    let parents: Vec<&str> = row.parents.iter().map(|p| p.short()).collect();
                    let line = format!(
                        "{:>3} {} {}",
                        row.frame.lane,
                        row.id.short(),
                        parents.join(" ")
                    );
                    print(&mut out, &line)?;
                }
            }
        }
        Commands::Diff {
            cached,
            context,
            file,
        } => {
            if let Some(context) = context {
                settings.context_lines = context;
            }
            let weave = Weave::new(cli.repo, settings);
            let records = weave.records(&file, cached)?;
            if records.is_empty() {
                return Err(WeaveError::NoChanges { file });
            }
            print(&mut io::stdout().lock(), format_records(&records).trim_end())?;
        }
        Commands::Stage(args) => patch(cli.repo, settings, args, PatchPurpose::Stage)?,
        Commands::Unstage(args) => patch(cli.repo, settings, args, PatchPurpose::Unstage)?,
        Commands::Discard(args) => patch(cli.repo, settings, args, PatchPurpose::Discard)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-weave", &mut io::stdout());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command())
                .render(&mut io::stdout())
                .map_err(write_error)?;
        }
    }

    Ok(())
}

fn patch(
    repo: PathBuf,
    mut settings: Settings,
    args: PatchArgs,
    purpose: PatchPurpose,
) -> Result<(), WeaveError> {
    if let Some(context) = args.context {
        settings.context_lines = context;
    }
    let weave = Weave::new(repo, settings);
    let output = weave.apply(&args.file, args.selection, purpose)?;
    if !output.is_empty() {
        print(&mut io::stdout().lock(), output.trim_end())?;
    }
    log::info!("applied {purpose} patch to {}", args.file);
    Ok(())
}

fn print(out: &mut impl Write, line: &str) -> Result<(), WeaveError> {
    writeln!(out, "{line}").map_err(write_error)
}

fn write_error(e: io::Error) -> WeaveError {
    WeaveError::OutputFailed {
        message: e.to_string(),
    }
}
