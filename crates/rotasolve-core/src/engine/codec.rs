use super::error::EngineError;
use super::tables::SelfTable;

/// Translates state vectors between the full ("original") rotamer numbering of each
/// position and the compacted ("reduced") numbering that remains after pruning.
#[derive(Debug, Clone, PartialEq)]
pub struct StateCodec {
    /// Per position, the reduced index of each original rotamer, `None` if pruned.
    reduced_of: Vec<Vec<Option<usize>>>,
    /// Per position, the original index of each reduced rotamer.
    original_of: Vec<Vec<usize>>,
    pruned: bool,
}

impl StateCodec {
    /// A codec that maps every index to itself.
    pub fn identity(counts: &[usize]) -> Self {
        Self {
            reduced_of: counts.iter().map(|&n| (0..n).map(Some).collect()).collect(),
            original_of: counts.iter().map(|&n| (0..n).collect()).collect(),
            pruned: false,
        }
    }

    pub fn from_mask(mask: &[Vec<bool>]) -> Self {
        let mut reduced_of = Vec::with_capacity(mask.len());
        let mut original_of = Vec::with_capacity(mask.len());
        for position_mask in mask {
            let mut forward = Vec::with_capacity(position_mask.len());
            let mut backward = Vec::new();
            for (original, &alive) in position_mask.iter().enumerate() {
                if alive {
                    forward.push(Some(backward.len()));
                    backward.push(original);
                } else {
                    forward.push(None);
                }
            }
            reduced_of.push(forward);
            original_of.push(backward);
        }
        Self {
            reduced_of,
            original_of,
            pruned: true,
        }
    }

    pub fn positions(&self) -> usize {
        self.reduced_of.len()
    }

    pub fn is_pruned(&self) -> bool {
        self.pruned
    }

    pub fn original_counts(&self) -> Vec<usize> {
        self.reduced_of.iter().map(Vec::len).collect()
    }

    pub fn reduced_counts(&self) -> Vec<usize> {
        self.original_of.iter().map(Vec::len).collect()
    }

    /// Survivor mask over original indices.
    pub fn mask(&self) -> Vec<Vec<bool>> {
        self.reduced_of
            .iter()
            .map(|p| p.iter().map(Option::is_some).collect())
            .collect()
    }

    pub fn original_index(&self, position: usize, reduced: usize) -> Option<usize> {
        self.original_of.get(position)?.get(reduced).copied()
    }

    /// Reduced index of one original rotamer.
    pub fn reduced_index(&self, position: usize, rotamer: usize) -> Result<usize, EngineError> {
        let map = self.reduced_of.get(position).ok_or(EngineError::IndexMismatch {
            expected: self.positions(),
            found: position + 1,
        })?;
        match map.get(rotamer) {
            Some(Some(reduced)) => Ok(*reduced),
            Some(None) => Err(EngineError::RotamerPruned { position, rotamer }),
            None => Err(EngineError::RotamerOutOfRange {
                position,
                rotamer,
                available: map.len(),
            }),
        }
    }

    pub fn to_reduced(&self, original: &[usize]) -> Result<Vec<usize>, EngineError> {
        self.check_length(original.len())?;
        original
            .iter()
            .enumerate()
            .map(|(position, &rotamer)| self.reduced_index(position, rotamer))
            .collect()
    }

    pub fn to_original(&self, reduced: &[usize]) -> Result<Vec<usize>, EngineError> {
        self.check_length(reduced.len())?;
        reduced
            .iter()
            .zip(&self.original_of)
            .enumerate()
            .map(|(position, (&rotamer, map))| {
                map.get(rotamer)
                    .copied()
                    .ok_or(EngineError::RotamerOutOfRange {
                        position,
                        rotamer,
                        available: map.len(),
                    })
            })
            .collect()
    }

    fn check_length(&self, found: usize) -> Result<(), EngineError> {
        if found != self.positions() {
            return Err(EngineError::IndexMismatch {
                expected: self.positions(),
                found,
            });
        }
        Ok(())
    }
}

/// Marks rotamers whose self energy lies strictly below the position's best plus `cutoff`.
pub fn cutoff_mask(self_energy: &SelfTable<f64>, cutoff: f64) -> Vec<Vec<bool>> {
    (0..self_energy.positions())
        .map(|position| {
            let row = self_energy.row(position);
            let best = row.iter().copied().fold(f64::INFINITY, f64::min);
            row.iter().map(|&e| e < best + cutoff).collect()
        })
        .collect()
}
