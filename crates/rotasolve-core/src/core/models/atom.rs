use super::ids::IdentityKey;
use nalgebra::Point3;

/// Identifies which part of the structure an atom belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomOwner {
    /// Atom of the non-variable context; it has exactly one conformation.
    #[default]
    Fixed,
    /// Atom belonging to one identity of a variable position.
    Variable(IdentityKey),
}

impl AtomOwner {
    pub fn identity_key(&self) -> Option<IdentityKey> {
        match self {
            AtomOwner::Fixed => None,
            AtomOwner::Variable(key) => Some(*key),
        }
    }
}

/// Lennard-Jones parameters for a single atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LennardJonesParam {
    /// Half of the pair minimum-energy distance, in Angstroms.
    pub half_r_min: f64,
    /// Well depth (epsilon) in kcal/mol, stored as a positive number.
    pub well_depth: f64,
}

/// An atom of the conformational system.
///
/// Atoms of a variable identity carry one coordinate per conformation of that
/// identity; the coordinate in use is selected by the identity's active
/// conformation. Fixed atoms carry a single coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "OG1").
    pub name: String,
    /// The structural owner of the atom.
    pub owner: AtomOwner,
    /// Coordinates in Angstroms, one per conformation of the owning identity.
    pub conformations: Vec<Point3<f64>>,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// Optional Lennard-Jones parameters.
    pub lennard_jones: Option<LennardJonesParam>,
}

impl Atom {
    /// Creates a fixed atom at the given position.
    pub fn fixed(name: &str, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            owner: AtomOwner::Fixed,
            conformations: vec![position],
            partial_charge: 0.0,
            lennard_jones: None,
        }
    }

    /// Creates an atom owned by a variable identity with one coordinate per conformation.
    pub fn variable(name: &str, owner: IdentityKey, conformations: Vec<Point3<f64>>) -> Self {
        Self {
            name: name.to_string(),
            owner: AtomOwner::Variable(owner),
            conformations,
            partial_charge: 0.0,
            lennard_jones: None,
        }
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.partial_charge = charge;
        self
    }

    pub fn with_lennard_jones(mut self, half_r_min: f64, well_depth: f64) -> Self {
        self.lennard_jones = Some(LennardJonesParam {
            half_r_min,
            well_depth,
        });
        self
    }

    /// Returns the coordinate of the given conformation, falling back to the only
    /// coordinate of single-conformation atoms.
    pub fn position_in(&self, conformation: usize) -> Option<&Point3<f64>> {
        if self.conformations.len() == 1 {
            self.conformations.first()
        } else {
            self.conformations.get(conformation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_atom_has_single_conformation_and_no_identity() {
        let atom = Atom::fixed("CA", Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.conformations.len(), 1);
        assert_eq!(atom.owner.identity_key(), None);
        assert_eq!(atom.position_in(7), Some(&Point3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn variable_atom_resolves_coordinates_per_conformation() {
        let key = IdentityKey::new(0, 1);
        let atom = Atom::variable(
            "CB",
            key,
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
        )
        .with_charge(-0.3)
        .with_lennard_jones(1.9, 0.1);

        assert_eq!(atom.owner.identity_key(), Some(key));
        assert_eq!(atom.position_in(1), Some(&Point3::new(1.0, 0.0, 0.0)));
        assert_eq!(atom.position_in(2), None);
        assert_eq!(atom.partial_charge, -0.3);
        assert_eq!(
            atom.lennard_jones,
            Some(LennardJonesParam {
                half_r_min: 1.9,
                well_depth: 0.1
            })
        );
    }
}
