use rand::{Rng, distributions::WeightedIndex, prelude::Distribution};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Input energies list is empty, cannot perform sampling")]
    EmptyEnergies,
    #[error("Invalid beta value: {0}. Beta must be positive for Boltzmann sampling")]
    InvalidBeta(f64),
    #[error("Failed to create weighted distribution: {source}")]
    DistributionError {
        #[from]
        source: rand::distributions::WeightedError,
    },
}

/// Normalized Boltzmann probabilities `exp(-βE) / Z`, computed after shifting every
/// energy by the minimum so the largest weight is exactly one.
pub fn boltzmann_probabilities(energies: &[f64], beta: f64) -> Result<Vec<f64>, SamplingError> {
    if energies.is_empty() {
        return Err(SamplingError::EmptyEnergies);
    }
    if beta.is_nan() || beta <= 0.0 {
        return Err(SamplingError::InvalidBeta(beta));
    }

    let min_energy = energies.iter().copied().fold(f64::INFINITY, f64::min);
    let weights: Vec<f64> = energies
        .iter()
        .map(|&e| (-(e - min_energy) * beta).exp())
        .collect();
    // The minimum contributes a weight of one, so the sum is never below one.
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// Draws an index with probability proportional to `weights`.
#[instrument(level = "trace", skip_all)]
pub fn sample_index(weights: &[f64], rng: &mut impl Rng) -> Result<usize, SamplingError> {
    if weights.is_empty() {
        return Err(SamplingError::EmptyEnergies);
    }
    let dist = WeightedIndex::new(weights)?;
    Ok(dist.sample(rng))
}
