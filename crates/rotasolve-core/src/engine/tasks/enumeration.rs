use crate::engine::codec::StateCodec;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::TopKTracker;
use crate::engine::tables::TableSet;
use tracing::{info, instrument};

/// Index-addressable cartesian product over per-position alive rotamer lists.
///
/// Index `0` selects the first alive rotamer everywhere; the last position varies fastest.
pub struct Enumerator<'a> {
    alive: &'a [Vec<usize>],
    total: u128,
}

impl<'a> Enumerator<'a> {
    pub fn new(alive: &'a [Vec<usize>]) -> Self {
        let total = alive
            .iter()
            .fold(1u128, |acc, list| acc.saturating_mul(list.len() as u128));
        Self { alive, total }
    }

    pub fn total_combinations(&self) -> u128 {
        self.total
    }

    /// Decodes a mixed-radix index into a reduced state, or `None` past the end.
    pub fn state(&self, index: u128) -> Option<Vec<usize>> {
        if index >= self.total {
            return None;
        }
        let mut remainder = index;
        let mut state = vec![0; self.alive.len()];
        for (slot, list) in state.iter_mut().zip(self.alive).rev() {
            let radix = list.len() as u128;
            *slot = list[(remainder % radix) as usize];
            remainder /= radix;
        }
        Some(state)
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        (0..self.total).filter_map(move |index| self.state(index))
    }
}

/// Scores every alive combination and offers it to `tracker` in original index space.
#[instrument(skip_all, name = "enumeration_task")]
pub fn run(
    tables: &TableSet,
    codec: &StateCodec,
    alive: &[Vec<usize>],
    tracker: &mut TopKTracker,
    reporter: &ProgressReporter,
) -> Result<u128, EngineError> {
    let enumerator = Enumerator::new(alive);
    let total = enumerator.total_combinations();
    reporter.report(Progress::TaskStart {
        total_steps: u64::try_from(total).unwrap_or(u64::MAX),
    });

    for state in enumerator.iter() {
        let energy = tables.state_energy(&state);
        tracker.save_min(energy, &codec.to_original(&state)?);
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    info!(
        combinations = total,
        best = tracker.best().map(|s| s.energy),
        "Enumeration complete."
    );
    Ok(total)
}
