//! # Core Module
//!
//! Stateless building blocks of the optimizer.
//!
//! ## Architecture
//!
//! - **Conformational Representation** ([`models`]) - Variable positions, identities,
//!   atoms with per-conformation coordinates, and interactions grouped by term
//! - **Energy Evaluation** ([`forcefield`]) - Term switches, physical constants and the
//!   saturating per-interaction scorer
//!
//! Nothing in this layer knows about energy tables or search algorithms; those live in
//! [`crate::engine`].

pub mod forcefield;
pub mod models;
