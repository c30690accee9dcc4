//! # Engine Module
//!
//! The stateful layer of rotasolve: it turns a conformational system into reduced energy
//! tables and searches those tables for the lowest-energy rotamer states.
//!
//! ## Overview
//!
//! Decomposition scores every interaction once per rotamer (self) or rotamer pair (pair)
//! while the system is held in a transaction, then prunes rotamers whose self energy is
//! far above the best at their position. Search tasks work exclusively on the resulting
//! reduced tables; the [`codec::StateCodec`] translates states between reduced and
//! original index space at every boundary.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Stage switches, temperatures, limits and validation
//! - **Decomposition** ([`decomposition`], [`tables`], [`codec`]) - Fixed, self and pair
//!   energy tables and the pruning map
//! - **Landscape** ([`landscape`]) - Read-only access to tables in original index space,
//!   per-term breakdowns and state descriptions
//! - **State Tracking** ([`state`]) - The bounded list of best distinct states
//! - **Search** ([`tasks`]) - DEE, enumeration, SCMF and Monte Carlo
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Key Capabilities
//!
//! - **Transactional scoring** that always restores the system's active conformations
//! - **Irreversible self-energy pruning** shared by every later stage
//! - **Per-term breakdowns** of any state when by-term tables are kept
//! - **Reproducible stochastic stages** driven by one seeded random source

pub mod codec;
pub mod config;
pub mod decomposition;
pub mod error;
pub mod landscape;
pub mod progress;
pub mod state;
pub mod tables;
pub mod tasks;
pub(crate) mod transaction;
pub mod utils;
