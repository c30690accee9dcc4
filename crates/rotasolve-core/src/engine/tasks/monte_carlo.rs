use super::scmf::{BOLTZMANN_KCAL, ScmfSolver};
use crate::engine::codec::StateCodec;
use crate::engine::config::{AnnealingShape, MonteCarloConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter, StageStatus};
use crate::engine::state::TopKTracker;
use rand::Rng;
use tracing::{debug, info, instrument, trace};

/// Steepness of the sigmoidal schedule around the midpoint of the run.
const SIGMOID_STEEPNESS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingSchedule {
    pub start: f64,
    pub end: f64,
    pub cycles: usize,
    pub shape: AnnealingShape,
}

impl AnnealingSchedule {
    /// Temperature at `cycle`; equals `start` at cycle 0 and `end` at the last cycle.
    pub fn temperature(&self, cycle: usize) -> f64 {
        if self.cycles <= 1 {
            return self.start;
        }
        let fraction = (cycle as f64 / (self.cycles - 1) as f64).clamp(0.0, 1.0);
        match self.shape {
            AnnealingShape::Constant => self.start,
            AnnealingShape::Linear => self.start + (self.end - self.start) * fraction,
            AnnealingShape::Exponential => self.start * (self.end / self.start).powf(fraction),
            AnnealingShape::Sigmoidal => {
                let sigmoid = |f: f64| 1.0 / (1.0 + (SIGMOID_STEEPNESS * (f - 0.5)).exp());
                let (high, low) = (sigmoid(0.0), sigmoid(1.0));
                let weight = (sigmoid(fraction) - low) / (high - low);
                self.end + (self.start - self.end) * weight
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CycleBudget,
    MaxRejections,
    Converged,
}

/// Metropolis acceptance under an annealing schedule, with the stopping rules of a run.
#[derive(Debug, Clone)]
pub struct MonteCarloManager {
    schedule: AnnealingSchedule,
    max_reject: usize,
    delta_steps: usize,
    min_delta_e: f64,
    current_energy: f64,
    best_energy: f64,
    window_reference: f64,
    consecutive_rejects: usize,
    accepted: usize,
    rejected: usize,
    cycles: usize,
    stop: Option<StopReason>,
}

impl MonteCarloManager {
    pub fn new(config: &MonteCarloConfig) -> Self {
        Self {
            schedule: AnnealingSchedule {
                start: config.start_temperature,
                end: config.end_temperature,
                cycles: config.cycles,
                shape: config.shape,
            },
            max_reject: config.max_reject,
            delta_steps: config.delta_steps,
            min_delta_e: config.min_delta_e,
            current_energy: f64::INFINITY,
            best_energy: f64::INFINITY,
            window_reference: f64::INFINITY,
            consecutive_rejects: 0,
            accepted: 0,
            rejected: 0,
            cycles: 0,
            stop: None,
        }
    }

    /// Sets the energy of the current state without counting a cycle.
    pub fn set_energy(&mut self, energy: f64) {
        self.current_energy = energy;
        self.best_energy = self.best_energy.min(energy);
        if !self.window_reference.is_finite() {
            self.window_reference = energy;
        }
    }

    pub fn temperature(&self) -> f64 {
        self.schedule.temperature(self.cycles)
    }

    /// Decides whether to move to a candidate of `energy`. `log_proposal_ratio` is
    /// `ln P(current) - ln P(candidate)` under the proposal distribution.
    pub fn accept(&mut self, energy: f64, log_proposal_ratio: f64, rng: &mut impl Rng) -> bool {
        let temperature = self.temperature();
        let log_acceptance =
            -(energy - self.current_energy) / (BOLTZMANN_KCAL * temperature) + log_proposal_ratio;
        let accepted = if log_acceptance.is_nan() {
            false
        } else if log_acceptance >= 0.0 {
            true
        } else {
            rng.r#gen::<f64>() < log_acceptance.exp()
        };

        self.cycles += 1;
        if accepted {
            self.accepted += 1;
            self.consecutive_rejects = 0;
            self.current_energy = energy;
            self.best_energy = self.best_energy.min(energy);
        } else {
            self.rejected += 1;
            self.consecutive_rejects += 1;
        }
        trace!(energy, temperature, log_acceptance, accepted, "MC move.");
        self.update_stop();
        accepted
    }

    fn update_stop(&mut self) {
        if self.stop.is_some() {
            return;
        }
        if self.consecutive_rejects >= self.max_reject {
            self.stop = Some(StopReason::MaxRejections);
        } else if self.cycles % self.delta_steps == 0 {
            if self.window_reference - self.best_energy < self.min_delta_e {
                self.stop = Some(StopReason::Converged);
            }
            self.window_reference = self.best_energy;
        }
        if self.stop.is_none() && self.cycles >= self.schedule.cycles {
            self.stop = Some(StopReason::CycleBudget);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stop.is_some()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn current_energy(&self) -> f64 {
        self.current_energy
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloReport {
    pub cycles: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub stop_reason: Option<StopReason>,
    pub final_energy: f64,
    /// Final temperature of the schedule when the run stopped.
    pub final_temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloOutcome {
    /// Last accepted state, in original index space.
    pub final_state: Vec<usize>,
    pub report: MonteCarloReport,
}

/// Simulated annealing over SCMF-biased proposals.
///
/// The seed state is the SCMF most probable state when `seed_from_scmf` is set, otherwise
/// a full random draw. Each later cycle resamples one position. Every visited state is
/// offered to `tracker`.
#[instrument(skip_all, name = "monte_carlo_task")]
pub fn run(
    scmf: &mut ScmfSolver,
    codec: &StateCodec,
    config: &MonteCarloConfig,
    seed_from_scmf: bool,
    tracker: &mut TopKTracker,
    rng: &mut impl Rng,
    reporter: &ProgressReporter,
) -> Result<MonteCarloOutcome, EngineError> {
    let mut manager = MonteCarloManager::new(config);
    let positions = scmf.current_state().len();

    if seed_from_scmf {
        let seed = scmf.most_probable_state();
        scmf.set_current_state(seed);
    } else {
        scmf.move_random_state(positions, rng)?;
    }
    let mut current = scmf.current_state().to_vec();
    let mut current_log_p = scmf.state_log_probability(&current);
    let energy = scmf.state_energy(&current);
    tracker.save_min(energy, &codec.to_original(&current)?);
    manager.set_energy(energy);
    debug!(energy, state = ?current, "Seeded Monte Carlo.");

    reporter.report(Progress::TaskStart {
        total_steps: config.cycles as u64,
    });

    while !manager.is_complete() {
        let candidate = scmf.move_random_state(1, rng)?.to_vec();
        let candidate_log_p = scmf.state_log_probability(&candidate);
        let energy = scmf.state_energy(&candidate);
        tracker.save_min(energy, &codec.to_original(&candidate)?);

        if manager.accept(energy, current_log_p - candidate_log_p, rng) {
            current = candidate;
            current_log_p = candidate_log_p;
        } else {
            scmf.set_current_state(current.clone());
        }
        reporter.report(Progress::Status(StageStatus::MonteCarloStep {
            accepted: manager.accepted(),
            rejected: manager.rejected(),
            energy: manager.current_energy(),
            temperature: manager.temperature(),
        }));
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    let report = MonteCarloReport {
        cycles: manager.cycles(),
        accepted: manager.accepted(),
        rejected: manager.rejected(),
        stop_reason: manager.stop_reason(),
        final_energy: manager.current_energy(),
        final_temperature: manager.temperature(),
    };
    info!(
        cycles = report.cycles,
        accepted = report.accepted,
        rejected = report.rejected,
        final_energy = report.final_energy,
        stop_reason = ?report.stop_reason,
        "Monte Carlo finished."
    );

    Ok(MonteCarloOutcome {
        final_state: codec.to_original(&current)?,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::term::TermTally;
    use crate::engine::config::OptimizerConfig;
    use crate::engine::tables::TableSet;
    use crate::engine::utils::random::RandomSource;
    use rand::{SeedableRng, rngs::StdRng};

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn schedule(shape: AnnealingShape) -> AnnealingSchedule {
        AnnealingSchedule {
            start: 1000.0,
            end: 0.5,
            cycles: 101,
            shape,
        }
    }

    #[test]
    fn every_shape_starts_at_start_and_ends_at_end() {
        for shape in [
            AnnealingShape::Linear,
            AnnealingShape::Exponential,
            AnnealingShape::Sigmoidal,
        ] {
            let s = schedule(shape);
            assert!(f64_approx_equal(s.temperature(0), 1000.0), "{:?}", shape);
            assert!(f64_approx_equal(s.temperature(100), 0.5), "{:?}", shape);
            assert!(s.temperature(50) < 1000.0 && s.temperature(50) > 0.5);
        }
        assert_eq!(schedule(AnnealingShape::Constant).temperature(100), 1000.0);
    }

    #[test]
    fn exponential_schedule_is_geometric() {
        let s = schedule(AnnealingShape::Exponential);
        let expected = 1000.0 * (0.5f64 / 1000.0).powf(0.5);
        assert!(f64_approx_equal(s.temperature(50), expected));
    }

    #[test]
    fn downhill_moves_are_always_accepted() {
        let config = OptimizerConfig::default().monte_carlo;
        let mut manager = MonteCarloManager::new(&config);
        let mut rng = StdRng::seed_from_u64(1);
        manager.set_energy(10.0);
        assert!(manager.accept(5.0, 0.0, &mut rng));
        assert_eq!(manager.accepted(), 1);
        assert_eq!(manager.current_energy(), 5.0);
    }

    #[test]
    fn hopeless_uphill_moves_are_rejected_and_stop_after_max_reject() {
        let config = MonteCarloConfig {
            start_temperature: 1.0,
            end_temperature: 1.0,
            max_reject: 3,
            ..OptimizerConfig::default().monte_carlo
        };
        let mut manager = MonteCarloManager::new(&config);
        let mut rng = StdRng::seed_from_u64(1);
        manager.set_energy(0.0);
        for _ in 0..3 {
            assert!(!manager.accept(1e6, 0.0, &mut rng));
        }
        assert_eq!(manager.rejected(), 3);
        assert_eq!(manager.stop_reason(), Some(StopReason::MaxRejections));
    }

    #[test]
    fn proposal_ratio_corrects_the_metropolis_test() {
        let config = MonteCarloConfig {
            start_temperature: 1.0,
            end_temperature: 1.0,
            ..OptimizerConfig::default().monte_carlo
        };
        let mut rng = StdRng::seed_from_u64(1);

        // 0.05 uphill at 1 K costs about -25.2 in log space; a ratio of 30 outweighs it.
        let mut manager = MonteCarloManager::new(&config);
        manager.set_energy(0.0);
        assert!(manager.accept(0.05, 30.0, &mut rng));
        assert!(f64_approx_equal(manager.current_energy(), 0.05));

        // Without the ratio the same move is hopeless.
        let mut manager = MonteCarloManager::new(&config);
        manager.set_energy(0.0);
        assert!(!manager.accept(0.05, 0.0, &mut rng));

        // A level move is rejected when the candidate is far more likely to be proposed.
        let mut manager = MonteCarloManager::new(&config);
        manager.set_energy(0.0);
        assert!(!manager.accept(0.0, -1000.0, &mut rng));
        assert_eq!(manager.rejected(), 1);
        assert_eq!(manager.current_energy(), 0.0);
    }

    #[test]
    fn stalled_energy_triggers_convergence() {
        let config = MonteCarloConfig {
            delta_steps: 5,
            min_delta_e: 0.01,
            ..OptimizerConfig::default().monte_carlo
        };
        let mut manager = MonteCarloManager::new(&config);
        let mut rng = StdRng::seed_from_u64(1);
        manager.set_energy(1.0);
        for _ in 0..5 {
            manager.accept(1.0, 0.0, &mut rng);
        }
        assert_eq!(manager.stop_reason(), Some(StopReason::Converged));
        assert_eq!(manager.cycles(), 5);
    }

    #[test]
    fn cycle_budget_bounds_the_run() {
        let config = MonteCarloConfig {
            cycles: 4,
            delta_steps: 100,
            ..OptimizerConfig::default().monte_carlo
        };
        let mut manager = MonteCarloManager::new(&config);
        let mut rng = StdRng::seed_from_u64(1);
        manager.set_energy(100.0);
        let mut energy = 100.0;
        while !manager.is_complete() {
            energy -= 1.0;
            manager.accept(energy, 0.0, &mut rng);
        }
        assert_eq!(manager.cycles(), 4);
        assert_eq!(manager.stop_reason(), Some(StopReason::CycleBudget));
    }

    /// Every state but (0, 0, 0) has a strictly downhill single-position move.
    fn funnel_tables() -> TableSet {
        let mut tables = TableSet::new(&[2, 2, 2]);
        let self_energies = [[1.0, 5.0], [2.0, 3.0], [0.0, 0.5]];
        for (position, row) in self_energies.iter().enumerate() {
            for (rotamer, &energy) in row.iter().enumerate() {
                tables.add_self(position, rotamer, TermTally::single(energy));
            }
        }
        tables.add_pair(1, 0, 0, 1, TermTally::single(10.0));
        tables.add_pair(2, 0, 1, 0, TermTally::single(-1.0));
        tables
    }

    fn run_with_seed(seed: u64) -> (MonteCarloOutcome, Vec<(f64, Vec<usize>)>) {
        let tables = funnel_tables();
        let alive = vec![vec![0, 1]; 3];
        let codec = StateCodec::identity(&[2, 2, 2]);
        let mut scmf = ScmfSolver::new(&tables, &alive, 300.0);
        let config = MonteCarloConfig {
            cycles: 200,
            ..OptimizerConfig::default().monte_carlo
        };
        let mut tracker = TopKTracker::new(8);
        let mut rng = RandomSource::owned(seed);
        let outcome = run(
            &mut scmf,
            &codec,
            &config,
            false,
            &mut tracker,
            &mut rng,
            &ProgressReporter::new(),
        )
        .unwrap();
        let saved = tracker
            .solutions()
            .iter()
            .map(|s| (s.energy, s.state.clone()))
            .collect();
        (outcome, saved)
    }

    #[test]
    fn identical_seeds_give_identical_runs() {
        let (a, saved_a) = run_with_seed(77);
        let (b, saved_b) = run_with_seed(77);
        assert_eq!(a, b);
        assert_eq!(saved_a, saved_b);
    }

    #[test]
    fn best_visited_state_is_tracked_and_final_state_was_accepted() {
        let (outcome, saved) = run_with_seed(5);
        assert!(outcome.report.cycles > 0);
        assert_eq!(
            outcome.report.accepted + outcome.report.rejected,
            outcome.report.cycles
        );
        // The funnel leads every walk to the global minimum (0, 0, 0) at 2.0.
        assert_eq!(saved[0].1, vec![0, 0, 0]);
        assert!(f64_approx_equal(saved[0].0, 2.0));
        let tables = funnel_tables();
        assert!(f64_approx_equal(
            tables.state_energy(&outcome.final_state),
            outcome.report.final_energy
        ));
    }

    #[test]
    fn rejected_candidates_restore_the_last_accepted_state() {
        let tables = funnel_tables();
        let alive = vec![vec![0, 1]; 3];
        let codec = StateCodec::identity(&[2, 2, 2]);
        let mut scmf = ScmfSolver::new(&tables, &alive, 300.0);
        // Near absolute zero every uphill proposal fails, so the run ends on rejections.
        let config = MonteCarloConfig {
            start_temperature: 0.01,
            end_temperature: 0.01,
            cycles: 10_000,
            max_reject: 3,
            delta_steps: 10_000,
            ..OptimizerConfig::default().monte_carlo
        };
        let mut tracker = TopKTracker::new(4);
        let mut rng = RandomSource::owned(21);
        let outcome = run(
            &mut scmf,
            &codec,
            &config,
            false,
            &mut tracker,
            &mut rng,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(outcome.report.stop_reason, Some(StopReason::MaxRejections));
        assert_eq!(scmf.current_state(), outcome.final_state.as_slice());
        assert!(f64_approx_equal(
            tables.state_energy(scmf.current_state()),
            outcome.report.final_energy
        ));
    }
}
