use super::codec::{StateCodec, cutoff_mask};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::tables::{EnergyTables, PairTable, SelfTable, TableSet};
use super::transaction::SystemView;
use crate::core::forcefield::energy_set::EnergySet;
use crate::core::forcefield::params::EnergyParams;
use crate::core::forcefield::scoring::Scorer;
use crate::core::forcefield::term::TermTally;
use crate::core::models::atom::AtomOwner;
use crate::core::models::ids::{IdentityKey, PairKey};
use crate::core::models::position::VariablePosition;
use crate::core::models::system::{ConformationalSystem, ModelError};
use itertools::iproduct;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecompositionOptions {
    pub self_energy_cutoff: Option<f64>,
    pub save_by_term: bool,
}

/// Energy tables in reduced index space together with the codec that produced them.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub tables: EnergyTables,
    pub codec: StateCodec,
}

#[derive(Debug, Default)]
struct InteractionBuckets {
    fixed: Vec<usize>,
    self_terms: HashMap<IdentityKey, Vec<usize>>,
    pair_terms: HashMap<PairKey, Vec<usize>>,
}

/// Energy of one group of interactions, in total and split by term slot.
struct GroupTally {
    total: TermTally,
    per_term: Vec<TermTally>,
}

/// Full-space self energies for one table set, restricted once the cutoff is known.
struct SelfTallies {
    energy: SelfTable<f64>,
    count: SelfTable<u32>,
}

impl SelfTallies {
    fn new(counts: &[usize]) -> Self {
        Self {
            energy: SelfTable::new(counts),
            count: SelfTable::new(counts),
        }
    }

    fn record(&mut self, position: usize, rotamer: usize, tally: TermTally) {
        self.energy.set(position, rotamer, tally.energy);
        self.count.set(position, rotamer, tally.count);
    }

    fn into_table_set(self, fixed: TermTally, mask: &[Vec<bool>]) -> TableSet {
        let self_energy = self.energy.restrict(mask);
        let self_count = self.count.restrict(mask);
        let counts = self_energy.counts().to_vec();
        TableSet {
            fixed,
            self_energy,
            self_count,
            pair_energy: PairTable::new(&counts),
            pair_count: PairTable::new(&counts),
        }
    }
}

/// Splits every interaction of a system into fixed, self and pair groups and tabulates
/// their energies per rotamer and rotamer pair.
pub struct EnergyDecomposer<'a> {
    system: &'a mut ConformationalSystem,
    params: &'a EnergyParams,
    buckets: InteractionBuckets,
    terms: Vec<String>,
    /// Per interaction, the slot of its term in `terms`, or `None` when the term is inactive.
    term_slots: Vec<Option<usize>>,
}

impl<'a> EnergyDecomposer<'a> {
    pub fn new(
        system: &'a mut ConformationalSystem,
        energy_set: &EnergySet,
        params: &'a EnergyParams,
    ) -> Result<Self, EngineError> {
        let buckets = classify(system)?;

        let terms: Vec<String> = system
            .term_names()
            .into_iter()
            .filter(|name| energy_set.is_term_active(name))
            .map(str::to_string)
            .collect();
        let term_slots = system
            .interactions()
            .iter()
            .map(|interaction| terms.iter().position(|t| *t == interaction.term))
            .collect();

        debug!(
            fixed = buckets.fixed.len(),
            self_groups = buckets.self_terms.len(),
            pair_groups = buckets.pair_terms.len(),
            active_terms = ?terms,
            "Classified interactions."
        );

        Ok(Self {
            system,
            params,
            buckets,
            terms,
            term_slots,
        })
    }

    /// Names of the active terms, in the order used by per-term tables.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[instrument(skip_all, name = "energy_decomposition_task")]
    pub fn calculate_energies(
        &mut self,
        options: &DecompositionOptions,
        reporter: &ProgressReporter,
    ) -> Result<Decomposition, EngineError> {
        let counts: Vec<usize> = self
            .system
            .positions()
            .iter()
            .map(|p| p.total_rotamers())
            .collect();
        for (position, &count) in counts.iter().enumerate() {
            if count == 0 {
                warn!(position, "Variable position has no rotamers.");
            }
        }

        // Fixed energy does not depend on any variable conformation.
        let fixed = {
            let scorer = Scorer::new(&*self.system, self.params);
            self.score_group(&scorer, &self.buckets.fixed)?
        };
        info!(fixed_energy = fixed.total.energy, "Computed fixed energy.");

        let (self_total, self_by_term) = self.calculate_self_energies(&counts, reporter)?;

        let codec = match options.self_energy_cutoff {
            Some(cutoff) => StateCodec::from_mask(&cutoff_mask(&self_total.energy, cutoff)),
            None => StateCodec::identity(&counts),
        };
        let mask = codec.mask();
        if codec.is_pruned() {
            let kept: usize = codec.reduced_counts().iter().sum();
            let total: usize = counts.iter().sum();
            info!(kept, total, "Applied self-energy cutoff.");
        }

        let mut tables = EnergyTables {
            total: self_total.into_table_set(fixed.total, &mask),
            by_term: options.save_by_term.then(|| {
                self.terms
                    .iter()
                    .cloned()
                    .zip(self_by_term)
                    .zip(fixed.per_term.iter().copied())
                    .map(|((name, tallies), fixed)| (name, tallies.into_table_set(fixed, &mask)))
                    .collect()
            }),
        };

        self.calculate_pair_energies(&codec, &mut tables, reporter)?;

        Ok(Decomposition { tables, codec })
    }

    fn calculate_self_energies(
        &mut self,
        counts: &[usize],
        reporter: &ProgressReporter,
    ) -> Result<(SelfTallies, Vec<SelfTallies>), EngineError> {
        let mut total = SelfTallies::new(counts);
        let mut by_term: Vec<SelfTallies> =
            self.terms.iter().map(|_| SelfTallies::new(counts)).collect();

        reporter.report(Progress::TaskStart {
            total_steps: counts.len() as u64,
        });

        let positions = self.system.positions().to_vec();
        let empty = Vec::new();
        for (position, variable) in positions.iter().enumerate() {
            for (identity, entry) in variable.identities().iter().enumerate() {
                let key = IdentityKey::new(position, identity);
                let group = self.buckets.self_terms.get(&key).unwrap_or(&empty).clone();
                for conformation in 0..entry.conformation_count() {
                    let flat = variable.flat_index(identity, conformation).ok_or_else(|| {
                        EngineError::Internal(format!(
                            "Conformation {} of identity {:?} has no flat index",
                            conformation, key
                        ))
                    })?;
                    let tally = self.score_in_transaction(&[(key, conformation)], &group)?;
                    total.record(position, flat, tally.total);
                    for (slot, term_tally) in tally.per_term.into_iter().enumerate() {
                        by_term[slot].record(position, flat, term_tally);
                    }
                }
            }
            reporter.report(Progress::TaskIncrement);
        }

        reporter.report(Progress::TaskFinish);
        Ok((total, by_term))
    }

    fn calculate_pair_energies(
        &mut self,
        codec: &StateCodec,
        tables: &mut EnergyTables,
        reporter: &ProgressReporter,
    ) -> Result<(), EngineError> {
        let positions = self.system.positions().to_vec();
        let reduced_counts = codec.reduced_counts();

        reporter.report(Progress::TaskStart {
            total_steps: positions.len() as u64,
        });

        for i in 0..positions.len() {
            for j in 0..i {
                for (ri, rj) in iproduct!(0..reduced_counts[i], 0..reduced_counts[j]) {
                    let (ii, ci) = locate(codec, &positions[i], i, ri)?;
                    let (jj, cj) = locate(codec, &positions[j], j, rj)?;
                    let key_i = IdentityKey::new(i, ii);
                    let key_j = IdentityKey::new(j, jj);
                    let Some(pair_key) = PairKey::canonical(key_i, key_j) else {
                        continue;
                    };
                    let Some(group) = self.buckets.pair_terms.get(&pair_key).cloned() else {
                        continue;
                    };
                    let tally = self.score_in_transaction(&[(key_i, ci), (key_j, cj)], &group)?;
                    tables.total.add_pair(i, ri, j, rj, tally.total);
                    if let Some(by_term) = tables.by_term.as_mut() {
                        for (set, term_tally) in by_term.values_mut().zip(tally.per_term) {
                            set.add_pair(i, ri, j, rj, term_tally);
                        }
                    }
                }
            }
            reporter.report(Progress::TaskIncrement);
        }

        reporter.report(Progress::TaskFinish);
        Ok(())
    }

    fn score_in_transaction(
        &mut self,
        moves: &[(IdentityKey, usize)],
        group: &[usize],
    ) -> Result<GroupTally, EngineError> {
        let keys: Vec<IdentityKey> = moves.iter().map(|(key, _)| *key).collect();
        let params = self.params;
        let term_slots = &self.term_slots;
        let term_count = self.terms.len();
        let mut view = SystemView::new(&mut *self.system);
        view.transaction(&keys, |v| {
            for &(key, conformation) in moves {
                v.apply_move(key, conformation)?;
            }
            let scorer = Scorer::new(v.system(), params);
            tally_group(&scorer, v.system(), term_slots, term_count, group)
        })
    }

    fn score_group(&self, scorer: &Scorer, group: &[usize]) -> Result<GroupTally, EngineError> {
        tally_group(scorer, &*self.system, &self.term_slots, self.terms.len(), group)
    }
}

fn tally_group(
    scorer: &Scorer,
    system: &ConformationalSystem,
    term_slots: &[Option<usize>],
    term_count: usize,
    group: &[usize],
) -> Result<GroupTally, EngineError> {
    let mut tally = GroupTally {
        total: TermTally::default(),
        per_term: vec![TermTally::default(); term_count],
    };
    for &index in group {
        let Some(slot) = term_slots[index] else {
            continue;
        };
        let energy = scorer.score(&system.interactions()[index])?;
        tally.total += TermTally::single(energy);
        tally.per_term[slot] += TermTally::single(energy);
    }
    Ok(tally)
}

fn locate(
    codec: &StateCodec,
    position: &VariablePosition,
    index: usize,
    reduced: usize,
) -> Result<(usize, usize), EngineError> {
    codec
        .original_index(index, reduced)
        .and_then(|original| position.locate(original))
        .ok_or_else(|| {
            EngineError::Internal(format!(
                "Reduced rotamer {} of position {} does not map to a conformation",
                reduced, index
            ))
        })
}

fn classify(system: &ConformationalSystem) -> Result<InteractionBuckets, EngineError> {
    let mut buckets = InteractionBuckets::default();

    for (index, interaction) in system.interactions().iter().enumerate() {
        let mut touched: Vec<IdentityKey> = Vec::with_capacity(2);
        for &atom_id in &interaction.atoms {
            let atom = system
                .atom(atom_id)
                .ok_or(ModelError::AtomNotFound(atom_id))?;
            let AtomOwner::Variable(key) = atom.owner else {
                continue;
            };
            match touched.iter().find(|k| k.position == key.position) {
                Some(existing) if existing.identity != key.identity => {
                    return Err(EngineError::MismatchedIdentities {
                        term: interaction.term.clone(),
                        position: key.position,
                        first: existing.identity,
                        second: key.identity,
                    });
                }
                Some(_) => {}
                None => touched.push(key),
            }
        }

        match touched.as_slice() {
            [] => buckets.fixed.push(index),
            [key] => buckets.self_terms.entry(*key).or_default().push(index),
            [first, second] => {
                let pair_key = PairKey::canonical(*first, *second).ok_or_else(|| {
                    EngineError::Internal("Pair interaction within one position".to_string())
                })?;
                buckets.pair_terms.entry(pair_key).or_default().push(index);
            }
            _ => {
                return Err(EngineError::UnsupportedInteractionTopology {
                    term: interaction.term.clone(),
                    count: touched.len(),
                    positions: touched.iter().map(|k| k.position).collect(),
                });
            }
        }
    }

    Ok(buckets)
}
