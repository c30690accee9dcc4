/// A scored state in original rotamer index space.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub energy: f64,
    pub state: Vec<usize>,
}

/// Keeps the `capacity` lowest-energy distinct states seen so far, sorted ascending.
#[derive(Debug, Clone)]
pub struct TopKTracker {
    capacity: usize,
    solutions: Vec<Solution>,
}

impl TopKTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            solutions: Vec::with_capacity(capacity.min(1024)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Offers a state; returns `true` if it was recorded.
    pub fn save_min(&mut self, energy: f64, state: &[usize]) -> bool {
        if self.capacity == 0 || energy.is_nan() {
            return false;
        }
        if self.solutions.len() >= self.capacity {
            if let Some(worst) = self.solutions.last() {
                if energy >= worst.energy {
                    return false;
                }
            }
        }

        let start = self.solutions.partition_point(|s| s.energy < energy);
        let end = start + self.solutions[start..].partition_point(|s| s.energy <= energy);
        if self.solutions[start..end].iter().any(|s| s.state == state) {
            return false;
        }

        self.solutions.insert(
            end,
            Solution {
                energy,
                state: state.to_vec(),
            },
        );
        if self.solutions.len() > self.capacity {
            self.solutions.pop();
        }
        true
    }

    /// Energies of the recorded states, ascending.
    pub fn min_bound(&self) -> Vec<f64> {
        self.solutions.iter().map(|s| s.energy).collect()
    }

    pub fn min_states(&self) -> Vec<Vec<usize>> {
        self.solutions.iter().map(|s| s.state.clone()).collect()
    }

    pub fn best(&self) -> Option<&Solution> {
        self.solutions.first()
    }

    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn into_solutions(self) -> Vec<Solution> {
        self.solutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_states_sorted_ascending() {
        let mut tracker = TopKTracker::new(5);
        for (energy, r) in [(3.0, 0), (-1.0, 1), (2.0, 2), (0.5, 3)] {
            assert!(tracker.save_min(energy, &[r]));
        }
        assert_eq!(tracker.min_bound(), vec![-1.0, 0.5, 2.0, 3.0]);
        assert_eq!(tracker.best().unwrap().state, vec![1]);
    }

    #[test]
    fn evicts_worst_when_over_capacity() {
        let mut tracker = TopKTracker::new(2);
        tracker.save_min(1.0, &[0]);
        tracker.save_min(2.0, &[1]);
        assert!(tracker.save_min(0.0, &[2]));
        assert_eq!(tracker.min_bound(), vec![0.0, 1.0]);
        assert_eq!(tracker.min_states(), vec![vec![2], vec![0]]);
    }

    #[test]
    fn worse_than_worst_when_full_is_a_no_op() {
        let mut tracker = TopKTracker::new(2);
        tracker.save_min(1.0, &[0]);
        tracker.save_min(2.0, &[1]);
        assert!(!tracker.save_min(2.0, &[5]));
        assert!(!tracker.save_min(7.0, &[6]));
        assert_eq!(tracker.min_states(), vec![vec![0], vec![1]]);
    }

    #[test]
    fn duplicate_states_are_rejected_but_energy_ties_are_kept() {
        let mut tracker = TopKTracker::new(4);
        assert!(tracker.save_min(1.0, &[0, 1]));
        assert!(!tracker.save_min(1.0, &[0, 1]));
        assert!(tracker.save_min(1.0, &[1, 0]));
        assert!(tracker.save_min(0.0, &[2, 2]));
        assert!(!tracker.save_min(1.0, &[1, 0]));
        assert_eq!(tracker.len(), 3);
        let bounds = tracker.min_bound();
        assert!(bounds.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn length_is_min_of_distinct_and_capacity() {
        let mut tracker = TopKTracker::new(3);
        for i in 0..10 {
            tracker.save_min(10.0 - i as f64, &[i]);
            tracker.save_min(10.0 - i as f64, &[i]);
        }
        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.min_bound(), vec![1.0, 2.0, 3.0]);
    }
}
