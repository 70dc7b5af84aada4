use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use diff_anchors::diff::format_parsed_diff;
use diff_anchors::{Anchor, DiffAnchorsError, WorkingTree, check_all, parse_diff};
use std::fs;
use std::io::{self, Read, Write};

#[derive(Parser)]
#[command(name = "diff-anchors")]
#[command(about = "Anchor review comments to diff ranges and detect when they go stale")]
struct Cli {
    /// Repository used by `collect` and `refresh`
    #[arg(long, global = true, default_value = ".")]
    repo: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a diff with hunk and line offsets for picking excerpts
    Show {
        /// Diff file to read ("-" or absent for stdin)
        diff: Option<String>,
    },
    /// Print a diff as JSON sections and files
    Parse {
        /// Diff file to read ("-" or absent for stdin)
        diff: Option<String>,
    },
    /// Capture an anchor for a line range of one hunk
    Excerpt {
        /// Diff file to read ("-" or absent for stdin)
        diff: Option<String>,
        /// Path of the file within the diff
        #[arg(long)]
        file: String,
        /// Index of the hunk within the file
        #[arg(long, default_value_t = 0)]
        hunk: usize,
        /// First line offset within the hunk (0 is the @@ line)
        #[arg(long)]
        start: usize,
        /// Last line offset within the hunk (inclusive)
        #[arg(long)]
        end: usize,
    },
    /// Re-check stored anchors against a diff
    Check {
        /// JSON array of anchors
        #[arg(long)]
        anchors: String,
        /// Diff file to read ("-" or absent for stdin)
        diff: Option<String>,
    },
    /// Print the sectioned working-tree diff of --repo
    Collect,
    /// Collect the working-tree diff of --repo and re-check anchors against it
    Refresh {
        /// JSON array of anchors
        #[arg(long)]
        anchors: String,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
    /// Generate a man page
    Man,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let tree = WorkingTree::new(&cli.repo);

    match cli.command {
        Commands::Show { diff } => {
            print!("{}", format_parsed_diff(&parse_diff(&read_diff(diff.as_deref())?)));
        }
        Commands::Parse { diff } => {
            let parsed = parse_diff(&read_diff(diff.as_deref())?);
            println!("{}", to_json(&parsed)?);
        }
        Commands::Excerpt {
            diff,
            file,
            hunk,
            start,
            end,
        } => {
            let parsed = parse_diff(&read_diff(diff.as_deref())?);
            let anchor = Anchor::capture(&parsed, &file, hunk, start, end)
                .ok_or_else(|| DiffAnchorsError::FileNotInDiff { path: file.clone() })?;
            if anchor.excerpt.is_empty() {
                eprintln!("warning: selection is empty, anchor will be stale");
            }
            println!("{}", to_json(&anchor)?);
        }
        Commands::Check { anchors, diff } => {
            let anchors = read_anchors(&anchors)?;
            let report = check_all(&anchors, &read_diff(diff.as_deref())?);
            eprintln!(
                "{} stale, {} changed",
                report.stale_count,
                report.changed.len()
            );
            println!("{}", to_json(&report.updated)?);
        }
        Commands::Collect => {
            println!("{}", tree.diff_text()?);
        }
        Commands::Refresh { anchors } => {
            let report = tree.refresh(&read_anchors(&anchors)?)?;
            eprintln!(
                "{} stale, {} changed",
                report.stale_count,
                report.changed.len()
            );
            println!("{}", to_json(&report.updated)?);
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "diff-anchors", &mut io::stdout());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut io::stdout())?;
        }
    }

    io::stdout().flush()?;
    Ok(())
}

/// Read diff text from a file, or from stdin for `-`/no argument
fn read_diff(path: Option<&str>) -> Result<String, DiffAnchorsError> {
    match path {
        None | Some("-") => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| DiffAnchorsError::Io {
                    path: "<stdin>".to_string(),
                    message: e.to_string(),
                })?;
            Ok(text)
        }
        Some(path) => fs::read_to_string(path).map_err(|e| DiffAnchorsError::Io {
            path: path.to_string(),
            message: e.to_string(),
        }),
    }
}

fn read_anchors(path: &str) -> Result<Vec<Anchor>, DiffAnchorsError> {
    let text = fs::read_to_string(path).map_err(|e| DiffAnchorsError::Io {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| DiffAnchorsError::Json {
        message: e.to_string(),
    })
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, DiffAnchorsError> {
    serde_json::to_string_pretty(value).map_err(|e| DiffAnchorsError::Json {
        message: e.to_string(),
    })
}
