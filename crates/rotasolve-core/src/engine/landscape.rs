use super::codec::{StateCodec, cutoff_mask};
use super::decomposition::Decomposition;
use super::error::EngineError;
use super::tables::{EnergyTables, TableSet};
use crate::core::models::position::VariablePosition;
use std::fmt;

/// Energies at or beyond this magnitude are printed as asterisks in summaries.
const SUMMARY_OVERFLOW: f64 = 1e14;

/// Tabulated energies of a conformational system, addressable by original-space states.
///
/// Tables are held in reduced (post-cutoff) index space; every public accessor takes
/// original rotamer indices and translates them through the [`StateCodec`].
#[derive(Debug, Clone)]
pub struct EnergyLandscape {
    positions: Vec<VariablePosition>,
    tables: EnergyTables,
    codec: StateCodec,
}

impl EnergyLandscape {
    pub fn new(positions: Vec<VariablePosition>, decomposition: Decomposition) -> Self {
        Self {
            positions,
            tables: decomposition.tables,
            codec: decomposition.codec,
        }
    }

    /// Builds a landscape from pre-tabulated full-space tables, applying the self-energy
    /// cutoff when one is given.
    pub fn from_tables(
        positions: Vec<VariablePosition>,
        tables: EnergyTables,
        self_energy_cutoff: Option<f64>,
    ) -> Result<Self, EngineError> {
        let counts = tables.rotamer_counts();
        if counts.len() != positions.len() {
            return Err(EngineError::IndexMismatch {
                expected: positions.len(),
                found: counts.len(),
            });
        }
        for (index, (position, &count)) in positions.iter().zip(counts).enumerate() {
            if position.total_rotamers() != count {
                return Err(EngineError::Internal(format!(
                    "Tables hold {} rotamers for position {} but it defines {}",
                    count,
                    index,
                    position.total_rotamers()
                )));
            }
        }

        let (tables, codec) = match self_energy_cutoff {
            Some(cutoff) => {
                let mask = cutoff_mask(&tables.total.self_energy, cutoff);
                (tables.restrict(&mask), StateCodec::from_mask(&mask))
            }
            None => {
                let codec = StateCodec::identity(counts);
                (tables, codec)
            }
        };

        Ok(Self {
            positions,
            tables,
            codec,
        })
    }

    pub fn positions(&self) -> &[VariablePosition] {
        &self.positions
    }

    /// Reduced-space tables.
    pub fn tables(&self) -> &EnergyTables {
        &self.tables
    }

    pub fn codec(&self) -> &StateCodec {
        &self.codec
    }

    /// Rotamers per position in original index space.
    pub fn number_of_rotamers(&self) -> Vec<usize> {
        self.codec.original_counts()
    }

    /// Rotamers per position that survived the self-energy cutoff.
    pub fn reduced_rotamer_counts(&self) -> Vec<usize> {
        self.codec.reduced_counts()
    }

    /// Names of the terms with a per-term breakdown, empty when none was recorded.
    pub fn terms(&self) -> Vec<&str> {
        self.tables
            .by_term
            .as_ref()
            .map(|terms| terms.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn fixed_energy(&self) -> f64 {
        self.tables.total.fixed.energy
    }

    pub fn self_energy(&self, position: usize, rotamer: usize) -> Result<f64, EngineError> {
        let reduced = self.codec.reduced_index(position, rotamer)?;
        Ok(self.tables.total.self_energy.get(position, reduced))
    }

    pub fn pair_energy(
        &self,
        position_a: usize,
        rotamer_a: usize,
        position_b: usize,
        rotamer_b: usize,
    ) -> Result<f64, EngineError> {
        let ra = self.codec.reduced_index(position_a, rotamer_a)?;
        let rb = self.codec.reduced_index(position_b, rotamer_b)?;
        Ok(self.tables.total.pair_energy.get(position_a, ra, position_b, rb))
    }

    /// Energy of an original-space state, either in total or for a single term.
    ///
    /// A term without recorded interactions contributes zero.
    pub fn state_energy(&self, state: &[usize], term: Option<&str>) -> Result<f64, EngineError> {
        let reduced = self.codec.to_reduced(state)?;
        Ok(self
            .table_set(term)?
            .map(|set| set.state_energy(&reduced))
            .unwrap_or(0.0))
    }

    pub fn state_interaction_count(
        &self,
        state: &[usize],
        term: Option<&str>,
    ) -> Result<u32, EngineError> {
        let reduced = self.codec.to_reduced(state)?;
        Ok(self
            .table_set(term)?
            .map(|set| set.state_count(&reduced))
            .unwrap_or(0))
    }

    pub fn summary(&self, state: &[usize]) -> Result<EnergySummary, EngineError> {
        let reduced = self.codec.to_reduced(state)?;
        let rows = self
            .tables
            .by_term
            .iter()
            .flatten()
            .map(|(name, set)| SummaryRow {
                label: name.clone(),
                energy: set.state_energy(&reduced),
                count: set.state_count(&reduced),
            })
            .collect();
        let total = SummaryRow {
            label: "Total".to_string(),
            energy: self.tables.total.state_energy(&reduced),
            count: self.tables.total.state_count(&reduced),
        };
        Ok(EnergySummary { rows, total })
    }

    /// One human-readable line per position describing the selected rotamer.
    pub fn state_descriptors(&self, state: &[usize]) -> Result<Vec<String>, EngineError> {
        // Validates length and range against the cutoff as well.
        self.codec.to_reduced(state)?;
        state
            .iter()
            .enumerate()
            .map(|(index, &flat)| {
                let position = &self.positions[index];
                let (identity, rotamer) =
                    position
                        .locate(flat)
                        .ok_or(EngineError::RotamerOutOfRange {
                            position: index,
                            rotamer: flat,
                            available: position.total_rotamers(),
                        })?;
                let name = position
                    .identity(identity)
                    .map(|i| i.name.as_str())
                    .unwrap_or("?");
                Ok(format!(
                    "Position {} ({}), identity {} ({}), rotamer {} ({})",
                    position.label, index, name, identity, rotamer, flat
                ))
            })
            .collect()
    }

    fn table_set(&self, term: Option<&str>) -> Result<Option<&TableSet>, EngineError> {
        match term {
            None => Ok(Some(&self.tables.total)),
            Some(name) => match &self.tables.by_term {
                Some(terms) => Ok(terms.get(name)),
                None => Err(EngineError::TermBreakdownUnavailable(name.to_string())),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    pub energy: f64,
    pub count: u32,
}

/// Per-term energy and interaction counts of one state, followed by the total.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySummary {
    pub rows: Vec<SummaryRow>,
    pub total: SummaryRow,
}

const SUMMARY_RULE: &str = "================  ======================  ===============";

impl fmt::Display for SummaryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.energy.abs() >= SUMMARY_OVERFLOW || !self.energy.is_finite() {
            write!(f, "{:<20}{:>20}{:>15}", self.label, "*".repeat(20), self.count)
        } else {
            write!(f, "{:<20}{:>20.6}{:>15}", self.label, self.energy, self.count)
        }
    }
}

impl fmt::Display for EnergySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SUMMARY_RULE)?;
        writeln!(f, "{:<20}{:>20}{:>15}", "Interaction Type", "Energy", "Number of Terms")?;
        writeln!(f, "{}", SUMMARY_RULE)?;
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        writeln!(f, "{}", SUMMARY_RULE)?;
        writeln!(f, "{}", self.total)
    }
}
