use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::future::Future;
use std::time::Duration;

const SPINNER_TICKS_BRAILLE_COLORED: [&str; 8] = [
    "\x1b[1;96m⠁\x1b[0m",
    "\x1b[1;96m⠂\x1b[0m",
    "\x1b[1;96m⠄\x1b[0m",
    "\x1b[1;96m⡀\x1b[0m",
    "\x1b[1;96m⢀\x1b[0m",
    "\x1b[1;96m⠠\x1b[0m",
    "\x1b[1;96m⠐\x1b[0m",
    "\x1b[1;96m⠈\x1b[0m",
];

const SPINNER_TICKS_BRAILLE_PLAIN: [&str; 8] = ["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈"];
const SPINNER_TICKS_ASCII: &str = "|/-\\";

const STAGE_TOTAL: u8 = 2;
const STAGE_FETCH: &str = "Fetch";
const STAGE_EXPORT: &str = "Export";

/// Step of a cycle shown as `[n/2]`: the model fetch, then writing reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Export,
}

impl Stage {
    const fn index(self) -> u8 {
        match self {
            Self::Fetch => 1,
            Self::Export => 2,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Fetch => STAGE_FETCH,
            Self::Export => STAGE_EXPORT,
        }
    }
}

/// Spinners drawn on stderr so the ranking tables on stdout stay clean.
/// Falls back to ASCII ticks on a dumb terminal.
pub struct ProgressState {
    multi: MultiProgress,
    style: ProgressStyle,
}

impl ProgressState {
    pub(crate) fn new(use_color: bool) -> Self {
        let use_ascii = is_dumb_term();
        let multi = MultiProgress::new();
        multi.set_draw_target(ProgressDrawTarget::stderr_with_hz(15));
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let style = if use_ascii {
            style.tick_chars(SPINNER_TICKS_ASCII)
        } else if use_color {
            style.tick_strings(&SPINNER_TICKS_BRAILLE_COLORED)
        } else {
            style.tick_strings(&SPINNER_TICKS_BRAILLE_PLAIN)
        };
        Self { multi, style }
    }

    pub(crate) fn spinner(&self, message: String) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(self.style.clone());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    pub(crate) fn clear(&self) {
        let _ = self.multi.clear();
    }
}

fn is_dumb_term() -> bool {
    std::env::var("TERM").is_ok_and(|term| term.eq_ignore_ascii_case("dumb"))
}

fn format_stage_message(stage: Stage, label: &str) -> String {
    let prefix = format!("[{}/{}]", stage.index(), STAGE_TOTAL);
    format!(
        "{} {}: {}",
        prefix.bright_yellow().bold(),
        stage.label().bright_cyan().bold(),
        label.bright_white().bold()
    )
}

/// Drives `fut` under a spinner, or silently when progress output is off.
pub async fn run_with_spinner<T, E>(
    progress: Option<&ProgressState>,
    stage: Stage,
    label: &str,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, E> {
    let Some(progress) = progress else {
        return fut.await;
    };
    let message = format_stage_message(stage, label);
    let bar = progress.spinner(message);
    let result = fut.await;
    match &result {
        Ok(_) => bar.finish_with_message(format!(
            "{} {}",
            format_stage_message(stage, label),
            "done".bright_green().bold()
        )),
        Err(_) => bar.finish_with_message(format!(
            "{} {}",
            format_stage_message(stage, label),
            "failed".bright_red().bold()
        )),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_message_shows_position_and_label() {
        let fetch = format_stage_message(Stage::Fetch, "model B");
        assert!(fetch.contains("[1/2]"));
        assert!(fetch.contains("Fetch"));
        assert!(fetch.contains("model B"));
        let export = format_stage_message(Stage::Export, "report.html");
        assert!(export.contains("[2/2]"));
        assert!(export.contains("Export"));
    }

    #[tokio::test]
    async fn disabled_progress_passes_result_through() {
        let ok: Result<u8, String> = run_with_spinner(None, Stage::Fetch, "x", async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));
        let err: Result<u8, String> =
            run_with_spinner(None, Stage::Fetch, "x", async { Err("down".to_string()) }).await;
        assert_eq!(err, Err("down".to_string()));
    }
}
