use std::ops::{Add, AddAssign};

/// Accumulated energy of a group of interactions together with how many
/// interactions contributed to it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TermTally {
    pub energy: f64,
    pub count: u32,
}

impl TermTally {
    pub fn new(energy: f64, count: u32) -> Self {
        Self { energy, count }
    }

    /// A tally holding a single interaction energy.
    #[inline]
    pub fn single(energy: f64) -> Self {
        Self { energy, count: 1 }
    }
}

impl Add for TermTally {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            energy: self.energy + rhs.energy,
            count: self.count + rhs.count,
        }
    }
}

impl AddAssign for TermTally {
    fn add_assign(&mut self, rhs: Self) {
        self.energy += rhs.energy;
        self.count += rhs.count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_tally_with_specified_values() {
        let tally = TermTally::new(1.5, 3);
        assert_eq!(tally.energy, 1.5);
        assert_eq!(tally.count, 3);
    }

    #[test]
    fn single_counts_one_interaction() {
        assert_eq!(TermTally::single(-2.0), TermTally::new(-2.0, 1));
    }

    #[test]
    fn add_sums_energy_and_count() {
        let a = TermTally::new(1.0, 2);
        let b = TermTally::new(-4.0, 5);
        assert_eq!(a + b, TermTally::new(-3.0, 7));
    }

    #[test]
    fn add_assign_accumulates_energy_and_count() {
        let mut a = TermTally::new(1.0, 1);
        a += TermTally::new(2.0, 1);
        a += TermTally::default();
        assert_eq!(a, TermTally::new(3.0, 2));
    }

    #[test]
    fn default_initializes_to_zero() {
        let tally = TermTally::default();
        assert_eq!(tally.energy, 0.0);
        assert_eq!(tally.count, 0);
    }
}
