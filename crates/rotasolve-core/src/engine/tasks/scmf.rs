use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter, StageStatus};
use crate::engine::tables::TableSet;
use crate::engine::utils::sampling::{boltzmann_probabilities, sample_index};
use rand::Rng;
use rand::seq::index;
use tracing::{debug, instrument, trace};

/// Boltzmann constant in kcal/(mol·K).
pub const BOLTZMANN_KCAL: f64 = 0.0019872;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScmfReport {
    pub cycles: usize,
    pub p_variation: f64,
    pub most_probable_state: Vec<usize>,
    pub most_probable_energy: f64,
}

/// Self-consistent mean field over per-position rotamer probabilities (reduced space).
///
/// Rotamers outside the alive lists keep probability zero throughout.
pub struct ScmfSolver<'a> {
    tables: &'a TableSet,
    alive: Vec<Vec<usize>>,
    probabilities: Vec<Vec<f64>>,
    temperature: f64,
    cycles: usize,
    p_variation: f64,
    current: Vec<usize>,
}

impl<'a> ScmfSolver<'a> {
    pub fn new(tables: &'a TableSet, alive: &[Vec<usize>], temperature: f64) -> Self {
        let probabilities = tables
            .rotamer_counts()
            .iter()
            .zip(alive)
            .map(|(&count, list)| {
                let mut row = vec![0.0; count];
                let share = 1.0 / list.len().max(1) as f64;
                for &r in list {
                    row[r] = share;
                }
                row
            })
            .collect();
        let current = alive
            .iter()
            .map(|list| list.first().copied().unwrap_or(0))
            .collect();
        Self {
            tables,
            alive: alive.to_vec(),
            probabilities,
            temperature,
            cycles: 0,
            p_variation: 0.0,
            current,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    pub fn probabilities(&self) -> &[Vec<f64>] {
        &self.probabilities
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Largest absolute probability change of the last cycle.
    pub fn p_variation(&self) -> f64 {
        self.p_variation
    }

    /// One synchronous update of every position from the previous cycle's probabilities.
    pub fn cycle(&mut self) -> Result<f64, EngineError> {
        let beta = 1.0 / (BOLTZMANN_KCAL * self.temperature);
        let mut updated = self.probabilities.clone();

        for (i, list) in self.alive.iter().enumerate() {
            if list.is_empty() {
                continue;
            }
            let energies: Vec<f64> = list.iter().map(|&r| self.mean_field_energy(i, r)).collect();
            let p = boltzmann_probabilities(&energies, beta)?;
            for (&r, value) in list.iter().zip(p) {
                updated[i][r] = value;
            }
        }

        self.p_variation = self
            .probabilities
            .iter()
            .flatten()
            .zip(updated.iter().flatten())
            .map(|(old, new)| (old - new).abs())
            .fold(0.0, f64::max);
        self.probabilities = updated;
        self.cycles += 1;
        trace!(cycle = self.cycles, p_variation = self.p_variation, "SCMF cycle.");
        Ok(self.p_variation)
    }

    /// Self energy plus the probability-weighted pair energy against every other position.
    fn mean_field_energy(&self, i: usize, r: usize) -> f64 {
        let mut energy = self.tables.self_energy.get(i, r);
        for (j, list) in self.alive.iter().enumerate() {
            if j == i {
                continue;
            }
            energy += list
                .iter()
                .map(|&s| self.probabilities[j][s] * self.tables.pair_energy.get(i, r, j, s))
                .sum::<f64>();
        }
        energy
    }

    /// The highest-probability rotamer at each position; ties go to the lower index.
    pub fn most_probable_state(&self) -> Vec<usize> {
        self.alive
            .iter()
            .zip(&self.probabilities)
            .map(|(list, row)| {
                list.iter()
                    .copied()
                    .fold(None, |best: Option<usize>, r| match best {
                        Some(b) if row[b] >= row[r] => Some(b),
                        _ => Some(r),
                    })
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn state_energy(&self, state: &[usize]) -> f64 {
        self.tables.state_energy(state)
    }

    /// `Σ ln P(i, s_i)`; negative infinity when any rotamer has zero probability.
    pub fn state_log_probability(&self, state: &[usize]) -> f64 {
        state
            .iter()
            .zip(&self.probabilities)
            .map(|(&r, row)| row.get(r).copied().unwrap_or(0.0).ln())
            .sum()
    }

    /// Shannon entropy of the product distribution, in nats.
    pub fn entropy(&self) -> f64 {
        self.probabilities
            .iter()
            .flatten()
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.ln())
            .sum()
    }

    pub fn current_state(&self) -> &[usize] {
        &self.current
    }

    pub fn set_current_state(&mut self, state: Vec<usize>) {
        self.current = state;
    }

    /// Resamples the current state from the probabilities: every position when
    /// `positions_to_move` covers them all, otherwise that many distinct positions
    /// chosen among those with more than one alive rotamer.
    pub fn move_random_state(
        &mut self,
        positions_to_move: usize,
        rng: &mut impl Rng,
    ) -> Result<&[usize], EngineError> {
        let total = self.alive.len();
        let chosen: Vec<usize> = if positions_to_move >= total {
            (0..total).filter(|&i| !self.alive[i].is_empty()).collect()
        } else {
            let movable: Vec<usize> = (0..total).filter(|&i| self.alive[i].len() > 1).collect();
            let amount = positions_to_move.min(movable.len());
            index::sample(rng, movable.len(), amount)
                .into_iter()
                .map(|k| movable[k])
                .collect()
        };

        for i in chosen {
            self.current[i] = sample_index(&self.probabilities[i], rng)?;
        }
        Ok(&self.current)
    }
}

/// Runs `cycles` SCMF updates and summarizes the outcome.
#[instrument(skip_all, name = "scmf_task", fields(cycles = cycles))]
pub fn run(
    solver: &mut ScmfSolver,
    cycles: usize,
    reporter: &ProgressReporter,
) -> Result<ScmfReport, EngineError> {
    reporter.report(Progress::TaskStart {
        total_steps: cycles as u64,
    });
    for _ in 0..cycles {
        let variation = solver.cycle()?;
        debug!(cycle = solver.cycles(), p_variation = variation, "SCMF cycle complete.");
        reporter.report(Progress::Status(StageStatus::ScmfCycle {
            cycle: solver.cycles(),
            p_variation: variation,
        }));
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    let most_probable_state = solver.most_probable_state();
    Ok(ScmfReport {
        cycles: solver.cycles(),
        p_variation: solver.p_variation(),
        most_probable_energy: solver.state_energy(&most_probable_state),
        most_probable_state,
    })
}
