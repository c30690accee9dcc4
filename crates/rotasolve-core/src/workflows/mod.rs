//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::core`] model and the [`crate::engine`]
//! stages into complete optimization runs.
//!
//! ## Overview
//!
//! A run has two steps. [`optimize::prepare`] decomposes a conformational system into
//! energy tables (or a caller builds an
//! [`EnergyLandscape`](crate::engine::landscape::EnergyLandscape) directly from
//! tabulated energies), and [`optimize::run`] searches those tables with the stages
//! enabled in the configuration, returning the ranked states and per-stage reports.
//!
//! ```ignore
//! use rotasolve::engine::{config::OptimizerConfigBuilder, progress::ProgressReporter};
//! use rotasolve::engine::utils::random::RandomSource;
//! use rotasolve::workflows::optimize;
//!
//! let config = OptimizerConfigBuilder::new().seed(42).build()?;
//! let reporter = ProgressReporter::new();
//! let landscape = optimize::prepare(&mut system, &energy_set, &params, &config, &reporter)?;
//! let mut rng = RandomSource::owned(config.seed);
//! let result = optimize::run(&landscape, &config, &mut rng, &reporter)?;
//! println!("best: {:?}", result.best());
//! ```

pub mod optimize;
