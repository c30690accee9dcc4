use crate::core::forcefield::energy_set::EnergySet;
use crate::core::forcefield::params::EnergyParams;
use crate::core::models::system::ConformationalSystem;
use crate::engine::codec::StateCodec;
use crate::engine::config::OptimizerConfig;
use crate::engine::decomposition::{DecompositionOptions, EnergyDecomposer};
use crate::engine::error::EngineError;
use crate::engine::landscape::EnergyLandscape;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{Solution, TopKTracker};
use crate::engine::tasks::dee::{self, AliveSet, DeeReport};
use crate::engine::tasks::enumeration;
use crate::engine::tasks::monte_carlo::{self, MonteCarloReport};
use crate::engine::tasks::scmf::{self, ScmfReport, ScmfSolver};
use rand::Rng;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    solutions: Vec<Solution>,
    dee_alive: Vec<Vec<usize>>,
    dee_mask: Vec<Vec<bool>>,
    scmf_state: Option<Vec<usize>>,
    mc_final_state: Option<Vec<usize>>,
    pub dee_report: Option<DeeReport>,
    /// Number of enumerated combinations; `None` when enumeration did not run.
    pub enumerated: Option<u128>,
    pub scmf_report: Option<ScmfReport>,
    pub mc_report: Option<MonteCarloReport>,
}

impl OptimizationResult {
    /// Energies of the saved states, lowest first.
    pub fn min_bound(&self) -> Vec<f64> {
        self.solutions.iter().map(|s| s.energy).collect()
    }

    /// Saved states in original index space, in the order of [`Self::min_bound`].
    pub fn min_states(&self) -> Vec<Vec<usize>> {
        self.solutions.iter().map(|s| s.state.clone()).collect()
    }

    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn best(&self) -> Option<&Solution> {
        self.solutions.first()
    }

    /// Most probable state after the SCMF cycles, in original index space.
    pub fn scmf_state(&self) -> Option<&[usize]> {
        self.scmf_state.as_deref()
    }

    /// Last accepted Monte Carlo state, in original index space.
    pub fn mc_final_state(&self) -> Option<&[usize]> {
        self.mc_final_state.as_deref()
    }

    /// Original rotamer indices surviving both the cutoff and DEE, per position.
    pub fn dee_alive_rotamers(&self) -> &[Vec<usize>] {
        &self.dee_alive
    }

    /// Survival flags over every original rotamer, per position.
    pub fn dee_alive_mask(&self) -> &[Vec<bool>] {
        &self.dee_mask
    }
}

/// Decomposes `system` into energy tables under the cutoff and term options of `config`.
///
/// The system's active conformations are restored before this returns.
#[instrument(skip_all, name = "preparation_workflow")]
pub fn prepare(
    system: &mut ConformationalSystem,
    energy_set: &EnergySet,
    params: &EnergyParams,
    config: &OptimizerConfig,
    reporter: &ProgressReporter,
) -> Result<EnergyLandscape, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Energy Decomposition",
    });
    let positions = system.positions().to_vec();
    let options = DecompositionOptions {
        self_energy_cutoff: config.self_energy_cutoff,
        save_by_term: config.save_by_term,
    };
    let mut decomposer = EnergyDecomposer::new(system, energy_set, params)?;
    let decomposition = decomposer.calculate_energies(&options, reporter)?;
    reporter.report(Progress::PhaseFinish);

    let landscape = EnergyLandscape::new(positions, decomposition);
    info!(
        positions = landscape.positions().len(),
        terms = ?landscape.terms(),
        "Energy landscape ready."
    );
    Ok(landscape)
}

/// Runs the enabled search stages over `landscape` in order: DEE, enumeration, SCMF and
/// Monte Carlo. Every stage reports its states to one shared tracker.
#[instrument(skip_all, name = "optimization_workflow")]
pub fn run(
    landscape: &EnergyLandscape,
    config: &OptimizerConfig,
    rng: &mut impl Rng,
    reporter: &ProgressReporter,
) -> Result<OptimizationResult, EngineError> {
    let tables = &landscape.tables().total;
    let codec = landscape.codec();
    let mut tracker = TopKTracker::new(config.max_saved_results);
    info!(
        positions = codec.positions(),
        rotamers = ?landscape.reduced_rotamer_counts(),
        "Starting optimization."
    );

    // === Phase 1: Dead-end elimination ===
    let (alive, dee_report) = if config.dee.enabled {
        reporter.report(Progress::PhaseStart {
            name: "Dead-End Elimination",
        });
        let (alive, report) = dee::run(tables, config.dee.energy_offset, reporter);
        reporter.message_if(config.verbose, || {
            format!(
                "DEE: {} pass(es), {} rotamer(s) eliminated, {} combination(s) remain",
                report.passes,
                report.eliminated(),
                report.final_combinations
            )
        });
        reporter.report(Progress::PhaseFinish);
        (alive, Some(report))
    } else {
        (AliveSet::full(tables.rotamer_counts()), None)
    };

    let nothing_to_sample = alive.positions() == 0 || alive.lists().iter().any(Vec::is_empty);
    if nothing_to_sample {
        warn!("No position has a rotamer to sample; SCMF and Monte Carlo are skipped.");
    }

    // === Phase 2: Exhaustive enumeration ===
    let combinations = alive.combinations();
    let enumerated = if config.enumeration.enabled && combinations <= config.enumeration.limit {
        reporter.report(Progress::PhaseStart {
            name: "Enumeration",
        });
        let total = enumeration::run(tables, codec, alive.lists(), &mut tracker, reporter)?;
        reporter.message_if(config.verbose, || {
            format!("Enumeration: scored {} combination(s)", total)
        });
        reporter.report(Progress::PhaseFinish);
        Some(total)
    } else {
        if config.enumeration.enabled {
            info!(
                combinations,
                limit = config.enumeration.limit,
                "Too many combinations; skipping enumeration."
            );
        }
        None
    };

    // === Phase 3: Self-consistent mean field ===
    // The solver always exists: Monte Carlo draws its proposals from it.
    let mut solver = ScmfSolver::new(tables, alive.lists(), config.scmf.temperature);
    let scmf_report = if config.scmf.enabled && !nothing_to_sample {
        reporter.report(Progress::PhaseStart {
            name: "Mean-Field Relaxation",
        });
        let report = scmf::run(&mut solver, config.scmf.cycles, reporter)?;
        tracker.save_min(
            report.most_probable_energy,
            &codec.to_original(&report.most_probable_state)?,
        );
        reporter.message_if(config.verbose, || {
            format!(
                "SCMF: {} cycle(s), most probable energy {:.4}, final variation {:.2e}",
                report.cycles, report.most_probable_energy, report.p_variation
            )
        });
        reporter.report(Progress::PhaseFinish);
        Some(report)
    } else {
        None
    };

    // === Phase 4: Monte Carlo annealing ===
    let mc_outcome = if config.monte_carlo.enabled && !nothing_to_sample {
        reporter.report(Progress::PhaseStart {
            name: "Monte Carlo",
        });
        let outcome = monte_carlo::run(
            &mut solver,
            codec,
            &config.monte_carlo,
            scmf_report.is_some(),
            &mut tracker,
            rng,
            reporter,
        )?;
        reporter.message_if(config.verbose, || {
            format!(
                "Monte Carlo: {} cycle(s), {} accepted, final energy {:.4}",
                outcome.report.cycles, outcome.report.accepted, outcome.report.final_energy
            )
        });
        reporter.report(Progress::PhaseFinish);
        Some(outcome)
    } else {
        None
    };

    let result = OptimizationResult {
        dee_alive: original_alive_lists(codec, &alive)?,
        dee_mask: original_alive_mask(codec, &alive)?,
        scmf_state: scmf_report
            .as_ref()
            .map(|r| codec.to_original(&r.most_probable_state))
            .transpose()?,
        mc_final_state: mc_outcome.as_ref().map(|o| o.final_state.clone()),
        solutions: tracker.into_solutions(),
        dee_report,
        enumerated,
        scmf_report,
        mc_report: mc_outcome.map(|o| o.report),
    };

    info!(
        saved = result.solutions.len(),
        best = result.best().map(|s| s.energy),
        "Optimization complete."
    );
    Ok(result)
}

fn original_alive_lists(codec: &StateCodec, alive: &AliveSet) -> Result<Vec<Vec<usize>>, EngineError> {
    alive
        .lists()
        .iter()
        .enumerate()
        .map(|(position, list)| {
            list.iter()
                .map(|&reduced| {
                    codec.original_index(position, reduced).ok_or_else(|| {
                        EngineError::Internal(format!(
                            "Reduced rotamer {} at position {} has no original index",
                            reduced, position
                        ))
                    })
                })
                .collect()
        })
        .collect()
}

fn original_alive_mask(codec: &StateCodec, alive: &AliveSet) -> Result<Vec<Vec<bool>>, EngineError> {
    let mut mask: Vec<Vec<bool>> = codec
        .original_counts()
        .into_iter()
        .map(|count| vec![false; count])
        .collect();
    for (position, rotamers) in original_alive_lists(codec, alive)?.into_iter().enumerate() {
        for rotamer in rotamers {
            mask[position][rotamer] = true;
        }
    }
    Ok(mask)
}
