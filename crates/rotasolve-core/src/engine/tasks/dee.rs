use crate::engine::progress::{Progress, ProgressReporter, StageStatus};
use crate::engine::tables::TableSet;
use tracing::{debug, info, instrument};

/// Rotamers (reduced indices) still in play at every position.
#[derive(Debug, Clone, PartialEq)]
pub struct AliveSet {
    lists: Vec<Vec<usize>>,
    mask: Vec<Vec<bool>>,
}

impl AliveSet {
    /// Every rotamer alive.
    pub fn full(counts: &[usize]) -> Self {
        Self {
            lists: counts.iter().map(|&n| (0..n).collect()).collect(),
            mask: counts.iter().map(|&n| vec![true; n]).collect(),
        }
    }

    pub fn positions(&self) -> usize {
        self.lists.len()
    }

    pub fn alive(&self, position: usize) -> &[usize] {
        &self.lists[position]
    }

    pub fn lists(&self) -> &[Vec<usize>] {
        &self.lists
    }

    pub fn mask(&self) -> &[Vec<bool>] {
        &self.mask
    }

    pub fn is_alive(&self, position: usize, rotamer: usize) -> bool {
        self.mask
            .get(position)
            .and_then(|m| m.get(rotamer))
            .copied()
            .unwrap_or(false)
    }

    /// Product of the alive counts, saturating at `u128::MAX`.
    pub fn combinations(&self) -> u128 {
        self.lists
            .iter()
            .fold(1u128, |acc, list| acc.saturating_mul(list.len() as u128))
    }

    fn eliminate(&mut self, position: usize, rotamer: usize) {
        self.mask[position][rotamer] = false;
        self.lists[position].retain(|&r| r != rotamer);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeeReport {
    pub passes: usize,
    /// Rotamers eliminated in each pass.
    pub pass_eliminations: Vec<usize>,
    pub initial_combinations: u128,
    pub final_combinations: u128,
}

impl DeeReport {
    pub fn eliminated(&self) -> usize {
        self.pass_eliminations.iter().sum()
    }
}

/// Goldstein-singles dead-end elimination from a full alive set.
#[instrument(skip_all, name = "dee_task")]
pub fn run(
    tables: &TableSet,
    energy_offset: f64,
    reporter: &ProgressReporter,
) -> (AliveSet, DeeReport) {
    let mut alive = AliveSet::full(tables.rotamer_counts());
    let report = eliminate(tables, &mut alive, energy_offset, reporter);
    (alive, report)
}

/// Repeats elimination passes over `alive` until a pass removes nothing or a single
/// combination remains. The last rotamer of a position is never removed.
pub fn eliminate(
    tables: &TableSet,
    alive: &mut AliveSet,
    energy_offset: f64,
    reporter: &ProgressReporter,
) -> DeeReport {
    let mut report = DeeReport {
        initial_combinations: alive.combinations(),
        ..DeeReport::default()
    };
    info!(
        combinations = report.initial_combinations,
        "Starting dead-end elimination."
    );

    while alive.combinations() > 1 {
        let removed = single_pass(tables, alive, energy_offset);
        report.passes += 1;
        report.pass_eliminations.push(removed);
        debug!(
            pass = report.passes,
            removed,
            combinations = alive.combinations(),
            "Completed DEE pass."
        );
        reporter.report(Progress::Status(StageStatus::DeePass {
            pass: report.passes,
            eliminated: report.eliminated(),
            combinations: alive.combinations(),
        }));
        if removed == 0 {
            break;
        }
    }

    report.final_combinations = alive.combinations();
    info!(
        passes = report.passes,
        eliminated = report.eliminated(),
        combinations = report.final_combinations,
        "Dead-end elimination converged."
    );
    report
}

fn single_pass(tables: &TableSet, alive: &mut AliveSet, energy_offset: f64) -> usize {
    let mut removed = 0;
    for i in 0..alive.positions() {
        if alive.alive(i).len() < 2 {
            continue;
        }
        let snapshot = alive.alive(i).to_vec();
        let mut candidate = snapshot[0];
        let mut candidate_bound = optimistic_bound(tables, alive, i, candidate);

        for &r in &snapshot[1..] {
            if goldstein_eliminates(tables, alive, i, candidate, r, energy_offset) {
                alive.eliminate(i, r);
                removed += 1;
            } else if goldstein_eliminates(tables, alive, i, r, candidate, energy_offset) {
                alive.eliminate(i, candidate);
                removed += 1;
                candidate = r;
                candidate_bound = optimistic_bound(tables, alive, i, r);
            } else {
                let bound = optimistic_bound(tables, alive, i, r);
                if bound < candidate_bound {
                    candidate = r;
                    candidate_bound = bound;
                }
            }
        }
    }
    removed
}

/// Whether rotamer `t` at position `i` proves rotamer `r` cannot be in the optimum.
fn goldstein_eliminates(
    tables: &TableSet,
    alive: &AliveSet,
    i: usize,
    t: usize,
    r: usize,
    energy_offset: f64,
) -> bool {
    let mut bound = tables.self_energy.get(i, t) - tables.self_energy.get(i, r);
    for j in (0..alive.positions()).filter(|&j| j != i) {
        let worst = alive
            .alive(j)
            .iter()
            .map(|&s| tables.pair_energy.get(i, t, j, s) - tables.pair_energy.get(i, r, j, s))
            .fold(f64::NEG_INFINITY, f64::max);
        if worst.is_finite() {
            bound += worst;
        }
    }
    bound < energy_offset
}

/// Lowest energy rotamer `r` at `i` could contribute: its self energy plus the best pair
/// energy against every other position.
fn optimistic_bound(tables: &TableSet, alive: &AliveSet, i: usize, r: usize) -> f64 {
    let mut bound = tables.self_energy.get(i, r);
    for j in (0..alive.positions()).filter(|&j| j != i) {
        let best = alive
            .alive(j)
            .iter()
            .map(|&s| tables.pair_energy.get(i, r, j, s))
            .fold(f64::INFINITY, f64::min);
        if best.is_finite() {
            bound += best;
        }
    }
    bound
}
