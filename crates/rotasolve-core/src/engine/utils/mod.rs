//! Helpers shared by the stochastic solvers: the random source and Boltzmann sampling.

pub mod random;
pub mod sampling;
