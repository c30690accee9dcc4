use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rotasolve::engine::progress::{Progress, ProgressCallback, StageStatus};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// One-line rendering of a stage's live counters.
pub fn describe(status: &StageStatus) -> String {
    match status {
        StageStatus::DeePass {
            pass,
            eliminated,
            combinations,
        } => format!(
            "pass {}, {} eliminated, {} combination(s) left",
            pass, eliminated, combinations
        ),
        StageStatus::ScmfCycle { cycle, p_variation } => {
            format!("cycle {}, max ΔP {:.2e}", cycle, p_variation)
        }
        StageStatus::MonteCarloStep {
            accepted,
            rejected,
            energy,
            temperature,
        } => format!(
            "accepted {} / rejected {}, E = {:.4} kcal/mol at {:.2} K",
            accepted, rejected, energy, temperature
        ),
    }
}

/// The terminal line of the running stage plus the summaries of finished ones.
struct StageLine {
    bar: ProgressBar,
    stage: &'static str,
    status: Option<StageStatus>,
    finished: Vec<String>,
}

impl StageLine {
    fn handle(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.stage = name;
                self.status = None;
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar
                    .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                self.bar.set_message(name);
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
                self.bar.set_style(bar_style());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = self.bar.length() {
                    self.bar.set_position(length);
                }
            }
            Progress::Status(status) => {
                self.bar
                    .set_message(format!("{}: {}", self.stage, describe(&status)));
                self.status = Some(status);
            }
            Progress::PhaseFinish => {
                let summary = match &self.status {
                    Some(status) => format!("✓ {}: {}", self.stage, describe(status)),
                    None => format!("✓ {}", self.stage),
                };
                self.bar.disable_steady_tick();
                self.bar.finish_and_clear();
                self.bar.suspend(|| eprintln!("{}", summary));
                self.finished.push(summary);
            }
            Progress::Message(msg) => {
                self.bar.suspend(|| eprintln!("  {}", msg));
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("[{bar:30.cyan/blue}] {pos}/{len} {elapsed:>4} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

/// Renders optimizer progress on stderr: a spinner or bar for the running stage, labelled
/// with its latest counters, and a summary line when the stage ends.
#[derive(Clone)]
pub struct CliProgressHandler {
    line: Arc<Mutex<StageLine>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        Self {
            line: Arc::new(Mutex::new(StageLine {
                bar,
                stage: "",
                status: None,
                finished: Vec::new(),
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let line = Arc::clone(&self.line);
        Box::new(move |progress: Progress| {
            let Ok(mut line) = line.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };
            line.handle(progress);
        })
    }

    /// Summary lines of the stages that have finished, in order.
    pub fn finished_stages(&self) -> Vec<String> {
        self.line
            .lock()
            .map(|line| line.finished.clone())
            .unwrap_or_default()
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
