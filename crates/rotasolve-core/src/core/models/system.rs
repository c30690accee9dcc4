use super::atom::{Atom, AtomOwner};
use super::ids::{AtomId, IdentityKey};
use super::interaction::{Interaction, InteractionKind};
use super::position::{Identity, VariablePosition};
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Identity {0:?} does not exist in the system")]
    UnknownIdentity(IdentityKey),
    #[error("Conformation {conformation} is out of range for identity {key:?} ({available} available)")]
    ConformationOutOfRange {
        key: IdentityKey,
        conformation: usize,
        available: usize,
    },
    #[error("Atom with ID {0:?} not found in the system")]
    AtomNotFound(AtomId),
    #[error("Atom '{atom}' carries {found} coordinates but its identity has {expected} conformations")]
    ConformationCountMismatch {
        atom: String,
        expected: usize,
        found: usize,
    },
    #[error("Interaction of kind '{kind}' in term '{term}' expects {expected} atoms, got {found}")]
    InvalidArity {
        term: String,
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

/// The structural view consumed by the optimizer: variable positions with their
/// identities and conformations, the atoms they own, and the interactions among them.
///
/// Which conformation of each identity is currently exposed for scoring is part
/// of the system state and is changed through [`ConformationalSystem::set_active_conformation`].
#[derive(Debug, Clone, Default)]
pub struct ConformationalSystem {
    /// Primary storage for atoms using a slot map for stable IDs.
    atoms: SlotMap<AtomId, Atom>,
    /// Variable positions, indexed `0..P`.
    positions: Vec<VariablePosition>,
    /// All interactions, in insertion order.
    interactions: Vec<Interaction>,
}

impl ConformationalSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variable position with `(name, conformation_count)` identities and
    /// returns its index.
    pub fn add_position(&mut self, label: &str, identities: &[(&str, usize)]) -> usize {
        let identities = identities
            .iter()
            .map(|(name, count)| Identity::new(name, *count))
            .collect();
        self.positions.push(VariablePosition::new(label, identities));
        self.positions.len() - 1
    }

    pub fn add_atom(&mut self, atom: Atom) -> Result<AtomId, ModelError> {
        if let AtomOwner::Variable(key) = atom.owner {
            let identity = self.identity(key).ok_or(ModelError::UnknownIdentity(key))?;
            let expected = identity.conformation_count();
            if atom.conformations.len() != expected && atom.conformations.len() != 1 {
                return Err(ModelError::ConformationCountMismatch {
                    atom: atom.name.clone(),
                    expected,
                    found: atom.conformations.len(),
                });
            }
        } else if atom.conformations.len() != 1 {
            return Err(ModelError::ConformationCountMismatch {
                atom: atom.name.clone(),
                expected: 1,
                found: atom.conformations.len(),
            });
        }
        Ok(self.atoms.insert(atom))
    }

    pub fn add_interaction(
        &mut self,
        term: &str,
        atoms: Vec<AtomId>,
        kind: InteractionKind,
    ) -> Result<usize, ModelError> {
        if let Some(&missing) = atoms.iter().find(|id| !self.atoms.contains_key(**id)) {
            return Err(ModelError::AtomNotFound(missing));
        }
        let expected = kind.arity().unwrap_or(atoms.len().max(1));
        if atoms.len() != expected {
            return Err(ModelError::InvalidArity {
                term: term.to_string(),
                kind: kind.name(),
                expected,
                found: atoms.len(),
            });
        }
        self.interactions.push(Interaction {
            term: term.to_string(),
            atoms,
            kind,
        });
        Ok(self.interactions.len() - 1)
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn positions(&self) -> &[VariablePosition] {
        &self.positions
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// All term names used by at least one interaction, in sorted order.
    pub fn term_names(&self) -> BTreeSet<&str> {
        self.interactions.iter().map(|i| i.term.as_str()).collect()
    }

    pub fn identity(&self, key: IdentityKey) -> Option<&Identity> {
        self.positions.get(key.position)?.identity(key.identity)
    }

    pub fn active_conformation(&self, key: IdentityKey) -> Option<usize> {
        self.identity(key).map(Identity::active_conformation)
    }

    /// Selects which conformation of an identity is exposed for scoring.
    pub fn set_active_conformation(
        &mut self,
        key: IdentityKey,
        conformation: usize,
    ) -> Result<(), ModelError> {
        let identity = self
            .positions
            .get_mut(key.position)
            .and_then(|p| p.identity_mut(key.identity))
            .ok_or(ModelError::UnknownIdentity(key))?;
        if conformation >= identity.conformation_count() {
            return Err(ModelError::ConformationOutOfRange {
                key,
                conformation,
                available: identity.conformation_count(),
            });
        }
        identity.set_active_conformation(conformation);
        Ok(())
    }

    /// Current coordinate of an atom under the active conformations.
    pub fn current_position(&self, id: AtomId) -> Result<Point3<f64>, ModelError> {
        let atom = self.atoms.get(id).ok_or(ModelError::AtomNotFound(id))?;
        let conformation = match atom.owner {
            AtomOwner::Fixed => 0,
            AtomOwner::Variable(key) => self
                .active_conformation(key)
                .ok_or(ModelError::UnknownIdentity(key))?,
        };
        atom.position_in(conformation)
            .copied()
            .ok_or(ModelError::AtomNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_position_system() -> (ConformationalSystem, AtomId, AtomId) {
        let mut system = ConformationalSystem::new();
        system.add_position("A 1", &[("SER", 2)]);
        system.add_position("A 2", &[("THR", 1), ("VAL", 3)]);
        let og = system
            .add_atom(Atom::variable(
                "OG",
                IdentityKey::new(0, 0),
                vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            ))
            .unwrap();
        let ca = system
            .add_atom(Atom::fixed("CA", Point3::new(5.0, 0.0, 0.0)))
            .unwrap();
        (system, og, ca)
    }

    #[test]
    fn add_atom_rejects_unknown_identity() {
        let (mut system, _, _) = two_position_system();
        let result = system.add_atom(Atom::variable(
            "X",
            IdentityKey::new(3, 0),
            vec![Point3::origin()],
        ));
        assert_eq!(
            result,
            Err(ModelError::UnknownIdentity(IdentityKey::new(3, 0)))
        );
    }

    #[test]
    fn add_atom_rejects_wrong_conformation_count() {
        let (mut system, _, _) = two_position_system();
        let result = system.add_atom(Atom::variable(
            "CG1",
            IdentityKey::new(1, 1),
            vec![Point3::origin(), Point3::origin()],
        ));
        assert!(matches!(
            result,
            Err(ModelError::ConformationCountMismatch {
                expected: 3,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn add_interaction_validates_arity_and_atoms() {
        let (mut system, og, ca) = two_position_system();
        assert!(
            system
                .add_interaction("VDW", vec![og, ca], InteractionKind::LennardJones)
                .is_ok()
        );
        let bad = system.add_interaction("VDW", vec![og], InteractionKind::LennardJones);
        assert!(matches!(bad, Err(ModelError::InvalidArity { expected: 2, found: 1, .. })));
        assert_eq!(system.interactions().len(), 1);
    }

    #[test]
    fn current_position_follows_active_conformation() {
        let (mut system, og, ca) = two_position_system();
        assert_eq!(system.current_position(og).unwrap(), Point3::new(0.0, 0.0, 0.0));
        system
            .set_active_conformation(IdentityKey::new(0, 0), 1)
            .unwrap();
        assert_eq!(system.current_position(og).unwrap(), Point3::new(0.0, 1.0, 0.0));
        assert_eq!(system.current_position(ca).unwrap(), Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn set_active_conformation_rejects_out_of_range() {
        let (mut system, _, _) = two_position_system();
        let result = system.set_active_conformation(IdentityKey::new(1, 0), 1);
        assert!(matches!(
            result,
            Err(ModelError::ConformationOutOfRange { available: 1, .. })
        ));
        assert_eq!(system.active_conformation(IdentityKey::new(1, 0)), Some(0));
    }

    #[test]
    fn term_names_are_sorted_and_unique() {
        let (mut system, og, ca) = two_position_system();
        system
            .add_interaction("VDW", vec![og, ca], InteractionKind::LennardJones)
            .unwrap();
        system
            .add_interaction("ELEC", vec![og, ca], InteractionKind::Coulomb)
            .unwrap();
        system
            .add_interaction("VDW", vec![ca, og], InteractionKind::LennardJones)
            .unwrap();
        let names: Vec<_> = system.term_names().into_iter().collect();
        assert_eq!(names, vec!["ELEC", "VDW"]);
    }
}
