use crate::core::forcefield::term::TermTally;
use std::collections::BTreeMap;

/// Per-position rotamer values in one flat buffer addressed through per-position offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfTable<T> {
    offsets: Vec<usize>,
    counts: Vec<usize>,
    values: Vec<T>,
}

impl<T: Copy + Default> SelfTable<T> {
    pub fn new(counts: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(counts.len());
        let mut total = 0;
        for &count in counts {
            offsets.push(total);
            total += count;
        }
        Self {
            offsets,
            counts: counts.to_vec(),
            values: vec![T::default(); total],
        }
    }

    pub fn positions(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    #[inline]
    pub fn get(&self, position: usize, rotamer: usize) -> T {
        self.values[self.offsets[position] + rotamer]
    }

    #[inline]
    pub fn set(&mut self, position: usize, rotamer: usize, value: T) {
        let index = self.offsets[position] + rotamer;
        self.values[index] = value;
    }

    pub fn row(&self, position: usize) -> &[T] {
        let start = self.offsets[position];
        &self.values[start..start + self.counts[position]]
    }

    /// Keeps only the rotamers whose mask entry is set, preserving order.
    pub fn restrict(&self, mask: &[Vec<bool>]) -> Self {
        let counts: Vec<usize> = mask
            .iter()
            .map(|m| m.iter().filter(|&&alive| alive).count())
            .collect();
        let mut restricted = Self::new(&counts);
        for (position, position_mask) in mask.iter().enumerate() {
            let survivors = position_mask
                .iter()
                .enumerate()
                .filter(|(_, alive)| **alive)
                .map(|(original, _)| original);
            for (reduced, original) in survivors.enumerate() {
                restricted.set(position, reduced, self.get(position, original));
            }
        }
        restricted
    }
}

/// Pair values between rotamers of two distinct positions.
///
/// Only the lower triangle (`j < i`) is stored, one dense `n_i × n_j` block per position
/// pair. Lookups with `i < j` are transparently swapped.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTable<T> {
    counts: Vec<usize>,
    block_offsets: Vec<usize>,
    values: Vec<T>,
}

#[inline]
fn block_index(i: usize, j: usize) -> usize {
    i * (i - 1) / 2 + j
}

impl<T: Copy + Default> PairTable<T> {
    pub fn new(counts: &[usize]) -> Self {
        let mut block_offsets = Vec::new();
        let mut total = 0;
        for i in 1..counts.len() {
            for j in 0..i {
                block_offsets.push(total);
                total += counts[i] * counts[j];
            }
        }
        Self {
            counts: counts.to_vec(),
            block_offsets,
            values: vec![T::default(); total],
        }
    }

    #[inline]
    fn slot(&self, i: usize, ri: usize, j: usize, rj: usize) -> Option<usize> {
        let (i, ri, j, rj) = match i.cmp(&j) {
            std::cmp::Ordering::Greater => (i, ri, j, rj),
            std::cmp::Ordering::Less => (j, rj, i, ri),
            std::cmp::Ordering::Equal => return None,
        };
        Some(self.block_offsets[block_index(i, j)] + ri * self.counts[j] + rj)
    }

    /// Value between rotamer `ri` of position `i` and rotamer `rj` of position `j`.
    /// A position paired with itself yields the default value.
    #[inline]
    pub fn get(&self, i: usize, ri: usize, j: usize, rj: usize) -> T {
        self.slot(i, ri, j, rj)
            .map(|slot| self.values[slot])
            .unwrap_or_default()
    }

    #[inline]
    pub fn set(&mut self, i: usize, ri: usize, j: usize, rj: usize, value: T) {
        if let Some(slot) = self.slot(i, ri, j, rj) {
            self.values[slot] = value;
        }
    }

    pub fn restrict(&self, mask: &[Vec<bool>]) -> Self {
        let survivors: Vec<Vec<usize>> = mask
            .iter()
            .map(|m| {
                m.iter()
                    .enumerate()
                    .filter(|(_, alive)| **alive)
                    .map(|(original, _)| original)
                    .collect()
            })
            .collect();
        let counts: Vec<usize> = survivors.iter().map(Vec::len).collect();
        let mut restricted = Self::new(&counts);
        for i in 1..survivors.len() {
            for j in 0..i {
                for (ri, &oi) in survivors[i].iter().enumerate() {
                    for (rj, &oj) in survivors[j].iter().enumerate() {
                        restricted.set(i, ri, j, rj, self.get(i, oi, j, oj));
                    }
                }
            }
        }
        restricted
    }
}

/// Fixed, self and pair energies with matching interaction counts.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSet {
    pub fixed: TermTally,
    pub self_energy: SelfTable<f64>,
    pub self_count: SelfTable<u32>,
    pub pair_energy: PairTable<f64>,
    pub pair_count: PairTable<u32>,
}

impl TableSet {
    pub fn new(counts: &[usize]) -> Self {
        Self {
            fixed: TermTally::default(),
            self_energy: SelfTable::new(counts),
            self_count: SelfTable::new(counts),
            pair_energy: PairTable::new(counts),
            pair_count: PairTable::new(counts),
        }
    }

    pub fn rotamer_counts(&self) -> &[usize] {
        self.self_energy.counts()
    }

    pub fn add_self(&mut self, position: usize, rotamer: usize, tally: TermTally) {
        let energy = self.self_energy.get(position, rotamer) + tally.energy;
        let count = self.self_count.get(position, rotamer) + tally.count;
        self.self_energy.set(position, rotamer, energy);
        self.self_count.set(position, rotamer, count);
    }

    pub fn add_pair(&mut self, i: usize, ri: usize, j: usize, rj: usize, tally: TermTally) {
        let energy = self.pair_energy.get(i, ri, j, rj) + tally.energy;
        let count = self.pair_count.get(i, ri, j, rj) + tally.count;
        self.pair_energy.set(i, ri, j, rj, energy);
        self.pair_count.set(i, ri, j, rj, count);
    }

    /// Total energy of a state expressed in this table's index space.
    pub fn state_energy(&self, state: &[usize]) -> f64 {
        let mut energy = self.fixed.energy;
        for (i, &ri) in state.iter().enumerate() {
            energy += self.self_energy.get(i, ri);
            for (j, &rj) in state.iter().enumerate().take(i) {
                energy += self.pair_energy.get(i, ri, j, rj);
            }
        }
        energy
    }

    pub fn state_count(&self, state: &[usize]) -> u32 {
        let mut count = self.fixed.count;
        for (i, &ri) in state.iter().enumerate() {
            count += self.self_count.get(i, ri);
            for (j, &rj) in state.iter().enumerate().take(i) {
                count += self.pair_count.get(i, ri, j, rj);
            }
        }
        count
    }

    pub fn restrict(&self, mask: &[Vec<bool>]) -> Self {
        Self {
            fixed: self.fixed,
            self_energy: self.self_energy.restrict(mask),
            self_count: self.self_count.restrict(mask),
            pair_energy: self.pair_energy.restrict(mask),
            pair_count: self.pair_count.restrict(mask),
        }
    }
}

/// Totals plus, when requested, one [`TableSet`] per named energy term.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTables {
    pub total: TableSet,
    pub by_term: Option<BTreeMap<String, TableSet>>,
}

impl EnergyTables {
    pub fn new(counts: &[usize], terms: Option<&[String]>) -> Self {
        Self {
            total: TableSet::new(counts),
            by_term: terms.map(|names| {
                names
                    .iter()
                    .map(|name| (name.clone(), TableSet::new(counts)))
                    .collect()
            }),
        }
    }

    pub fn rotamer_counts(&self) -> &[usize] {
        self.total.rotamer_counts()
    }

    pub fn term(&self, name: &str) -> Option<&TableSet> {
        self.by_term.as_ref()?.get(name)
    }

    pub fn restrict(&self, mask: &[Vec<bool>]) -> Self {
        Self {
            total: self.total.restrict(mask),
            by_term: self.by_term.as_ref().map(|terms| {
                terms
                    .iter()
                    .map(|(name, set)| (name.clone(), set.restrict(mask)))
                    .collect()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn self_table_rows_follow_offsets() {
        let mut table = SelfTable::<f64>::new(&[2, 3]);
        table.set(1, 2, 7.5);
        table.set(0, 1, -1.0);
        assert_eq!(table.row(0), &[0.0, -1.0]);
        assert_eq!(table.row(1), &[0.0, 0.0, 7.5]);
    }

    #[test]
    fn pair_table_is_symmetric_in_access_order() {
        let mut table = PairTable::<f64>::new(&[2, 3, 2]);
        table.set(0, 1, 2, 0, 4.0);
        assert_eq!(table.get(2, 0, 0, 1), 4.0);
        assert_eq!(table.get(0, 1, 2, 0), 4.0);
        assert_eq!(table.get(1, 0, 0, 0), 0.0);
        assert_eq!(table.get(1, 0, 1, 0), 0.0);
    }

    #[test]
    fn pair_blocks_do_not_overlap() {
        let counts = [2, 3, 2];
        let mut table = PairTable::<u32>::new(&counts);
        let mut next = 1;
        for i in 1..counts.len() {
            for j in 0..i {
                for ri in 0..counts[i] {
                    for rj in 0..counts[j] {
                        table.set(i, ri, j, rj, next);
                        next += 1;
                    }
                }
            }
        }
        let mut next = 1;
        for i in 1..counts.len() {
            for j in 0..i {
                for ri in 0..counts[i] {
                    for rj in 0..counts[j] {
                        assert_eq!(table.get(j, rj, i, ri), next);
                        next += 1;
                    }
                }
            }
        }
    }

    #[test]
    fn state_energy_sums_fixed_self_and_lower_triangle_pairs() {
        let mut tables = TableSet::new(&[2, 2]);
        tables.fixed = TermTally::new(0.5, 1);
        tables.add_self(0, 0, TermTally::single(1.0));
        tables.add_self(1, 1, TermTally::single(3.0));
        tables.add_pair(1, 1, 0, 0, TermTally::single(10.0));
        assert!(f64_approx_equal(tables.state_energy(&[0, 1]), 14.5));
        assert_eq!(tables.state_count(&[0, 1]), 4);
        assert!(f64_approx_equal(tables.state_energy(&[1, 0]), 0.5));
    }

    #[test]
    fn restrict_keeps_survivors_in_order() {
        let mut tables = TableSet::new(&[3, 2]);
        for r in 0..3 {
            tables.add_self(0, r, TermTally::single(r as f64));
            tables.add_pair(1, 1, 0, r, TermTally::single(10.0 * r as f64));
        }
        let mask = vec![vec![true, false, true], vec![false, true]];
        let reduced = tables.restrict(&mask);
        assert_eq!(reduced.rotamer_counts(), &[2, 1]);
        assert_eq!(reduced.self_energy.row(0), &[0.0, 2.0]);
        assert_eq!(reduced.pair_energy.get(1, 0, 0, 1), 20.0);
    }
}
