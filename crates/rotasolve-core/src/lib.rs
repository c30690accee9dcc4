//! # rotasolve Core Library
//!
//! Discrete rotamer-state optimization over pairwise-decomposed energies.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same strict three-layer split throughout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ConformationalSystem`,
//!   variable positions and their identities) and the interaction-energy provider
//!   (`EnergySet`, `EnergyParams`, `Scorer`).
//!
//! - **[`engine`]: The Logic Core.** Turns a system into fixed, self and pair energy
//!   tables under a transactional `SystemView`, prunes them, and searches them with
//!   dead-end elimination, exhaustive enumeration, self-consistent mean field and Monte
//!   Carlo annealing, collecting the best states in a bounded tracker.
//!
//! - **[`workflows`]: The Public API.** Sequences the engine stages into one configurable
//!   pipeline and reports results in the caller's original rotamer indices.

pub mod core;
pub mod engine;
pub mod workflows;
