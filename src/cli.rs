use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate, generate_to};

use magicrank::config::HTTP_TIMEOUT_SECONDS;
use magicrank::severity::{DEFAULT_GOOD_RANK, DEFAULT_MEDIUM_RANK};
use magicrank::{Model, SortCriterion};

pub const DEFAULT_HTML_PATH: &str = "data/output/report.html";
pub const DEFAULT_CSV_PATH: &str = "data/output/magic_formula.csv";

pub const SAVE_HTML_HELP: &str = "Save the HTML report to the given file (defaults to data/output/report.html when no path is provided).";
pub const SAVE_CSV_HELP: &str = "Save the sorted ranking table to the given CSV file (defaults to data/output/magic_formula.csv when no path is provided). Use --archive-csv to store a .gz instead.";
pub const ARCHIVE_CSV_HELP: &str = "Archive the saved CSV output into a .gz file (recommended for publishing).";
pub const INPUT_HELP: &str =
    "Read a saved JSON response from FILE instead of requesting the model endpoint.";
pub const INTERACTIVE_HELP: &str = "Keep the session open and read commands (model, sort, show, help, quit) from stdin.";

#[derive(Debug, Parser)]
#[command(
    name = "magicrank",
    about = "Fetch Magic Formula stock rankings (models A and B), sort them and render a console table and an HTML report.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = Model::B, help = "Model to load first.")]
    pub model: Model,
    #[arg(
        long,
        value_enum,
        value_name = "CRITERION",
        default_value_t = SortCriterion::MagicFormula,
        help = "Sort criterion for the ranking table."
    )]
    pub sort: SortCriterion,
    #[arg(long, value_name = "URL", help = "Override the model A endpoint.")]
    pub endpoint_a: Option<String>,
    #[arg(long, value_name = "URL", help = "Override the model B endpoint.")]
    pub endpoint_b: Option<String>,
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = HTTP_TIMEOUT_SECONDS,
        help = "HTTP request timeout in seconds."
    )]
    pub timeout: u64,
    #[arg(long, value_name = "FILE", help = INPUT_HELP)]
    pub input: Option<PathBuf>,
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_GOOD_RANK,
        help = "Highest rank still colored as good."
    )]
    pub good_rank: f64,
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MEDIUM_RANK,
        help = "Highest rank still colored as medium."
    )]
    pub medium_rank: f64,
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_HTML_PATH,
        help = SAVE_HTML_HELP
    )]
    pub save_html: Option<PathBuf>,
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CSV_PATH,
        help = SAVE_CSV_HELP
    )]
    pub save_csv: Option<PathBuf>,
    #[arg(long, help = ARCHIVE_CSV_HELP)]
    pub archive_csv: bool,
    #[arg(
        long,
        help = "Print every ranked stock with all columns instead of the top 10."
    )]
    pub full_output: bool,
    #[arg(long, help = "Disable progress spinner output.")]
    pub no_progress: bool,
    #[arg(long, short = 'i', help = INTERACTIVE_HELP)]
    pub interactive: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate shell completion scripts, optionally installing them for the current user.
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for.")]
        shell: Shell,
        #[arg(
            long,
            value_name = "DIR",
            help = "Directory to write the completion script to."
        )]
        output_dir: Option<PathBuf>,
        #[arg(
            long,
            help = "Install the completion script into the default location for the selected shell."
        )]
        install: bool,
    },
}

pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Completions {
            shell,
            output_dir,
            install,
        } => generate_completions(shell, output_dir, install),
    }
}

fn generate_completions(shell: Shell, output_dir: Option<PathBuf>, install: bool) -> Result<()> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();

    let target_dir = if let Some(dir) = output_dir {
        Some(dir)
    } else if install {
        Some(default_install_dir(shell)?)
    } else {
        None
    };

    if let Some(dir) = target_dir {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create completion directory {}", dir.display()))?;
        let path = generate_to(shell, &mut command, bin_name, &dir)
            .context("failed to write completion file")?;
        println!("Installed {shell:?} completions to {}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        generate(shell, &mut command, bin_name, &mut stdout);
        stdout
            .flush()
            .context("failed to flush completion output")?;
    }

    Ok(())
}

fn default_install_dir(shell: Shell) -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| {
        anyhow!("HOME environment variable is not set; use --output-dir to specify a path")
    })?;
    let mut path = PathBuf::from(home);

    match shell {
        Shell::Bash => {
            path.push(".local/share/bash-completion/completions");
            Ok(path)
        }
        Shell::Elvish => {
            path.push(".elvish/lib/completions");
            Ok(path)
        }
        Shell::Fish => {
            path.push(".config/fish/completions");
            Ok(path)
        }
        Shell::PowerShell => {
            path.push(".local/share/powershell/Scripts");
            Ok(path)
        }
        Shell::Zsh => {
            path.push(".local/share/zsh/site-functions");
            Ok(path)
        }
        other => Err(anyhow!(
            "no default install location for {other:?}; specify --output-dir"
        )),
    }
}
