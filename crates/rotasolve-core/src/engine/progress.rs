#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
    Status(StageStatus),
}

/// Live counters of the search stage that is currently running.
#[derive(Debug, Clone, PartialEq)]
pub enum StageStatus {
    DeePass {
        pass: usize,
        /// Rotamers eliminated so far, over all passes.
        eliminated: usize,
        combinations: u128,
    },
    ScmfCycle {
        cycle: usize,
        p_variation: f64,
    },
    MonteCarloStep {
        accepted: usize,
        rejected: usize,
        energy: f64,
        temperature: f64,
    },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Forwards a diagnostic line only when `enabled`; used for the optimizer's verbose mode.
    #[inline]
    pub fn message_if(&self, enabled: bool, message: impl FnOnce() -> String) {
        if enabled {
            self.report(Progress::Message(message()));
        }
    }
}
