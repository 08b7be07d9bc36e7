use crate::cli::Cli;
use crate::progress::{ProgressState, Stage, run_with_spinner};
use crate::session::{Command, HELP_TEXT, parse_command};
use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use magicrank::config::{Endpoints, Settings};
use magicrank::export::save_table_csv;
use magicrank::{
    Applied, ConsoleSink, FileGateway, Gateway, HtmlReport, HttpGateway, Model, Pipeline,
    PresentationSink, RankBands,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod progress;
mod session;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    colored::control::set_override(true);
    init_tracing();

    let mut cli = Cli::parse();

    if let Some(command) = cli.command.take() {
        crate::cli::handle_command(command)?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = build_settings(&cli)?;
    let gateway = build_gateway(&settings)?;
    let run_started_at = Local::now();

    let mut app = App {
        pipeline: Pipeline::new(settings.model, settings.criterion),
        gateway,
        console: ConsoleSink::new(settings.bands, cli.full_output, run_started_at)
            .with_loading_notice(cli.no_progress),
        report: HtmlReport::new(settings.bands, run_started_at),
        outputs: Outputs {
            html: cli.save_html,
            csv: cli.save_csv,
            archive_csv: cli.archive_csv,
        },
        progress: (!cli.no_progress).then(|| ProgressState::new(true)),
    };

    let loaded = app.load(settings.model).await?;

    if cli.interactive {
        app.interactive().await?;
        return Ok(ExitCode::SUCCESS);
    }

    Ok(if loaded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_settings(cli: &Cli) -> Result<Settings> {
    let bands = RankBands::new(cli.good_rank, cli.medium_rank)
        .map_err(|reason| anyhow!(reason))
        .context("invalid --good-rank/--medium-rank")?;
    let defaults = Endpoints::default();

    Ok(Settings {
        endpoints: Endpoints {
            model_a: cli.endpoint_a.clone().unwrap_or(defaults.model_a),
            model_b: cli.endpoint_b.clone().unwrap_or(defaults.model_b),
        },
        timeout: Duration::from_secs(cli.timeout),
        bands,
        model: cli.model,
        criterion: cli.sort,
        input: cli.input.clone(),
        ..Settings::default()
    })
}

fn build_gateway(settings: &Settings) -> Result<Box<dyn Gateway>> {
    match settings.input.as_ref() {
        Some(path) => {
            info!(path = %path.display(), "reading rankings from a saved response");
            Ok(Box::new(FileGateway::new(path.clone())))
        }
        None => Ok(Box::new(HttpGateway::new(settings)?)),
    }
}

struct Outputs {
    html: Option<PathBuf>,
    csv: Option<PathBuf>,
    archive_csv: bool,
}

struct App {
    pipeline: Pipeline,
    gateway: Box<dyn Gateway>,
    console: ConsoleSink,
    report: HtmlReport,
    outputs: Outputs,
    progress: Option<ProgressState>,
}

impl App {
    /// Runs one full cycle for `model`. Returns `false` when the fetch failed
    /// and the error state was rendered instead of a table.
    async fn load(&mut self, model: Model) -> Result<bool> {
        self.console.render_loading(model);
        self.report.render_loading(model);

        let today = Local::now().date_naive();
        let label = format!("model {model}");
        let result = run_with_spinner(
            self.progress.as_ref(),
            Stage::Fetch,
            &label,
            self.pipeline.load(self.gateway.as_ref(), model, today),
        )
        .await;
        if let Some(progress) = self.progress.as_ref() {
            progress.clear();
        }

        match result {
            Ok(Applied::Replaced { records }) => {
                debug!(%model, records, "rendering refreshed rankings");
                self.console.set_origin(self.pipeline.origin());
                self.render();
                self.save_outputs(true).await?;
                Ok(true)
            }
            Ok(Applied::Stale { sequence, latest }) => {
                debug!(sequence, latest, "ignored stale response");
                Ok(true)
            }
            Err(err) => {
                error!(%model, error = %err, "failed to load rankings");
                self.console.render_error(model, &err);
                self.report.render_error(model, &err);
                self.save_outputs(false).await?;
                Ok(false)
            }
        }
    }

    fn render(&mut self) {
        self.pipeline.render(&mut self.console);
        self.pipeline.render(&mut self.report);
    }

    async fn save_outputs(&mut self, table_available: bool) -> Result<()> {
        if let Some(path) = self.outputs.html.as_deref() {
            self.report.set_generated_at(Local::now());
            run_with_spinner(
                self.progress.as_ref(),
                Stage::Export,
                &path.display().to_string(),
                self.report.save(path),
            )
            .await?;
        }

        let mut csv_written = None;
        if let Some(path) = self.outputs.csv.as_deref() {
            if table_available {
                let sorted = self.pipeline.sorted();
                let written = run_with_spinner(
                    self.progress.as_ref(),
                    Stage::Export,
                    &path.display().to_string(),
                    save_table_csv(path, &sorted, self.outputs.archive_csv),
                )
                .await?;
                csv_written = Some(written);
            } else {
                warn!(path = %path.display(), "skipping CSV export after a failed load");
            }
        }
        if let Some(progress) = self.progress.as_ref() {
            progress.clear();
        }

        let csv_hint = if self.outputs.csv.is_some() {
            "not saved (no rankings loaded)"
        } else {
            "not saved (use --save-csv)"
        };
        print_path_line("Ranking CSV", csv_written.as_deref(), csv_hint);
        print_path_line(
            "HTML Report",
            self.outputs.html.as_deref(),
            "not saved (use --save-html)",
        );
        Ok(())
    }

    async fn interactive(&mut self) -> Result<()> {
        println!();
        println!("{}", HELP_TEXT.bright_black());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("{} ", "magicrank>".bright_cyan().bold());
            io::stdout().flush().context("failed to flush prompt")?;

            let Some(line) = lines
                .next_line()
                .await
                .context("failed to read command from stdin")?
            else {
                break;
            };

            let outcome = match parse_command(&line) {
                Ok(Command::Model(model)) => self.load(model).await.map(|_| ()),
                Ok(Command::Sort(criterion)) => {
                    self.pipeline.set_criterion(criterion);
                    info!(criterion = %self.pipeline.criterion(), "resorting loaded rankings");
                    self.render();
                    self.save_outputs(true).await
                }
                Ok(Command::Show) => {
                    self.render();
                    Ok(())
                }
                Ok(Command::Help) => {
                    println!("{HELP_TEXT}");
                    Ok(())
                }
                Ok(Command::Quit) => break,
                Ok(Command::Empty) => Ok(()),
                Err(message) => {
                    println!("{}", message.bright_red());
                    Ok(())
                }
            };

            if let Err(err) = outcome {
                let message = format!("{err:#}");
                error!(error = %message, "command failed");
                println!("{} {}", "Error:".bright_red().bold(), message.bright_white());
            }
        }

        Ok(())
    }
}

fn print_path_line(label: &str, path: Option<&Path>, hint: &str) {
    let label_colored = label.bright_yellow().bold();
    match path {
        Some(path) => println!(
            "{} {}",
            label_colored,
            format!("{}", path.display()).bright_white()
        ),
        None => println!("{} {}", label_colored, hint.bright_black()),
    }
}
