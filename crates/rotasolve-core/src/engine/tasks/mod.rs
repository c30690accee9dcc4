//! Search tasks over reduced energy tables.
//!
//! Each submodule is one stage of the optimizer: [`dee`] prunes rotamers that provably
//! cannot appear in the optimum, [`enumeration`] scores every surviving combination,
//! [`scmf`] relaxes per-position rotamer probabilities under a mean field, and
//! [`monte_carlo`] anneals over states proposed from those probabilities. Stages share
//! the [`TopKTracker`](crate::engine::state::TopKTracker) they report results to.

pub mod dee;
pub mod enumeration;
pub mod monte_carlo;
pub mod scmf;
