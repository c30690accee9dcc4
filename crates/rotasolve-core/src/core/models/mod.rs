//! # Core Models Module
//!
//! Data structures describing the conformational system that the optimizer works on.
//!
//! ## Overview
//!
//! A system is a set of variable positions, each offering one or more identities,
//! each identity offering a number of discrete conformations (rotamers). Atoms are
//! owned either by the fixed context or by one identity of a variable position, and
//! carry one coordinate per conformation of their owner. Interactions group atoms
//! under an energy term name.
//!
//! ## Key Components
//!
//! - [`ids`] - Slot-map atom IDs and fixed-arity position/identity/rotamer keys
//! - [`atom`] - Atom ownership, per-conformation coordinates and parameters
//! - [`position`] - Variable positions, identities and the flat rotamer index
//! - [`interaction`] - Interaction functional forms and term grouping
//! - [`system`] - The complete [`system::ConformationalSystem`]
//!
//! ```ignore
//! use rotasolve::core::models::{atom::Atom, ids::IdentityKey, system::ConformationalSystem};
//!
//! let mut system = ConformationalSystem::new();
//! let pos = system.add_position("A 10", &[("SER", 3)]);
//! let og = system.add_atom(Atom::variable("OG", IdentityKey::new(pos, 0), coords))?;
//! ```

pub mod atom;
pub mod ids;
pub mod interaction;
pub mod position;
pub mod system;
