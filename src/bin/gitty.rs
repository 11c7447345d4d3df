use anyhow::Result;
use clap::{CommandFactory, Parser};
use gitty::commands::scan::{self, ScanOptions};
use gitty::{buildinfo, resolve_root};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitty")]
#[command(about = "Report the last commit of every git repository under a directory")]
#[command(after_help = "Examples:
  gitty ~/src
  gitty --branches --truncate ~/src
  gitty --author \"Jane Doe\" --skip-dirs node_modules,target ~/src")]
struct Cli {
    /// Directory to scan. Takes precedence over --path
    #[arg(value_name = "PATH")]
    root: Option<PathBuf>,

    /// Directory to scan (defaults to $GITTY_PATH, then the current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// List every local branch instead of the checked-out one
    #[arg(short, long)]
    branches: bool,

    /// Truncate branch names longer than 25 characters
    #[arg(short, long)]
    truncate: bool,

    /// Only report commits by this author name (exact match)
    #[arg(short, long)]
    author: Option<String>,

    /// Comma separated directory names to skip, in addition to .terraform
    #[arg(short, long, value_name = "DIRS")]
    skip_dirs: Option<String>,

    /// Print the version number
    #[arg(short = 'V', long)]
    version: bool,
}

fn main() -> ExitCode {
    if env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::from(1);
    }

    let cli = Cli::parse();

    if cli.version {
        println!("{}", buildinfo::get());
        return ExitCode::SUCCESS;
    }

    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut options = ScanOptions::new(resolve_root(cli.root.or(cli.path)));
    options.branches = cli.branches;
    options.truncate = cli.truncate;
    options.author = cli.author.filter(|author| !author.is_empty());
    if let Some(skip_dirs) = cli.skip_dirs {
        options = options.skip_dirs_csv(&skip_dirs);
    }

    scan::execute(&options)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(err: &anyhow::Error) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "error");
    let _ = stderr.reset();
    let _ = writeln!(stderr, ": {:#}", err);
}
