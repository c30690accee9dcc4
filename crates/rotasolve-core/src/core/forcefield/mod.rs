//! # Force Field Module
//!
//! The interaction-energy provider consumed by the energy decomposer.
//!
//! ## Overview
//!
//! Interactions are filed under named energy terms. The [`energy_set::EnergySet`]
//! switches terms on and off, [`params::EnergyParams`] carries the physical constants,
//! and [`scoring::Scorer`] evaluates one interaction against the system's currently
//! active conformations. All potentials saturate to finite sentinels, so sums of
//! energies stay comparable even for clashing or coincident atoms.
//!
//! ## Key Components
//!
//! - [`energy_set`] - Term-keyed activation switches
//! - [`params`] - Immutable physical constants
//! - [`potentials`] - Saturating functional forms
//! - [`scoring`] - Per-interaction energy evaluation
//! - [`term`] - Energy/count tallies
//!
//! ```ignore
//! use rotasolve::core::forcefield::{params::EnergyParams, scoring::Scorer};
//!
//! let scorer = Scorer::new(&system, &params);
//! let energy = scorer.score(&system.interactions()[0])?;
//! ```

pub mod energy_set;
pub mod params;
pub(crate) mod potentials;
pub mod scoring;
pub mod term;
