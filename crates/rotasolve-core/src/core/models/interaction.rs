use super::ids::AtomId;

/// The functional form of an interaction. Each form reads the current
/// coordinates (and parameters) of its atoms; the energy itself is computed by
/// [`crate::core::forcefield::scoring::Scorer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionKind {
    /// 12-6 Lennard-Jones between two atoms, using their per-atom parameters.
    LennardJones,
    /// Coulomb electrostatics between two atoms, using their partial charges.
    Coulomb,
    /// Harmonic distance restraint between two atoms.
    HarmonicBond {
        force_constant: f64,
        equilibrium_distance: f64,
    },
    /// Harmonic angle term over three atoms, the second being the vertex.
    HarmonicAngle {
        force_constant: f64,
        equilibrium_degrees: f64,
    },
    /// A constant contribution attached to a group of atoms.
    Constant(f64),
}

impl InteractionKind {
    /// Number of atoms the functional form expects, or `None` for any positive count.
    pub fn arity(&self) -> Option<usize> {
        match self {
            InteractionKind::LennardJones
            | InteractionKind::Coulomb
            | InteractionKind::HarmonicBond { .. } => Some(2),
            InteractionKind::HarmonicAngle { .. } => Some(3),
            InteractionKind::Constant(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionKind::LennardJones => "lennard-jones",
            InteractionKind::Coulomb => "coulomb",
            InteractionKind::HarmonicBond { .. } => "harmonic-bond",
            InteractionKind::HarmonicAngle { .. } => "harmonic-angle",
            InteractionKind::Constant(_) => "constant",
        }
    }
}

/// A scored interaction among a group of atoms, filed under an energy term name.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub term: String,
    pub atoms: Vec<AtomId>,
    pub kind: InteractionKind,
}
