use super::params::EnergyParams;
use super::potentials;
use crate::core::models::atom::LennardJonesParam;
use crate::core::models::ids::AtomId;
use crate::core::models::interaction::{Interaction, InteractionKind};
use crate::core::models::system::{ConformationalSystem, ModelError};
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Atom {0:?} has no Lennard-Jones parameters")]
    MissingLennardJones(AtomId),
    #[error("Structure lookup failed while scoring: {0}")]
    Model(#[from] ModelError),
}

/// Evaluates interaction energies against the system's currently active
/// conformations. Every returned value is finite.
pub struct Scorer<'a> {
    system: &'a ConformationalSystem,
    params: &'a EnergyParams,
}

impl<'a> Scorer<'a> {
    pub fn new(system: &'a ConformationalSystem, params: &'a EnergyParams) -> Self {
        Self { system, params }
    }

    pub fn score(&self, interaction: &Interaction) -> Result<f64, ScoringError> {
        let energy = match interaction.kind {
            InteractionKind::LennardJones => {
                let (a, b) = self.pair_ids(interaction);
                let lj_a = self
                    .atom_lj(a)?
                    .ok_or(ScoringError::MissingLennardJones(a))?;
                let lj_b = self
                    .atom_lj(b)?
                    .ok_or(ScoringError::MissingLennardJones(b))?;
                let dist = self.distance(a, b)?;
                let r_min = lj_a.half_r_min + lj_b.half_r_min;
                let well_depth = (lj_a.well_depth * lj_b.well_depth).sqrt();
                potentials::lennard_jones_12_6(dist, r_min, well_depth)
            }
            InteractionKind::Coulomb => {
                let (a, b) = self.pair_ids(interaction);
                let q_a = self.charge(a)?;
                let q_b = self.charge(b)?;
                let dist = self.distance(a, b)?;
                potentials::coulomb(
                    dist,
                    q_a,
                    q_b,
                    self.params.coulomb_constant,
                    self.params.effective_dielectric(dist),
                )
            }
            InteractionKind::HarmonicBond {
                force_constant,
                equilibrium_distance,
            } => {
                let (a, b) = self.pair_ids(interaction);
                let dist = self.distance(a, b)?;
                potentials::harmonic(dist, equilibrium_distance, force_constant)
            }
            InteractionKind::HarmonicAngle {
                force_constant,
                equilibrium_degrees,
            } => {
                let p1 = self.system.current_position(interaction.atoms[0])?;
                let vertex = self.system.current_position(interaction.atoms[1])?;
                let p3 = self.system.current_position(interaction.atoms[2])?;
                match angle_radians(&p1, &vertex, &p3) {
                    Some(theta) => potentials::harmonic(
                        theta,
                        equilibrium_degrees.to_radians(),
                        force_constant,
                    ),
                    None => potentials::ENERGY_SENTINEL,
                }
            }
            InteractionKind::Constant(value) => value,
        };
        Ok(potentials::saturate(energy))
    }

    fn pair_ids(&self, interaction: &Interaction) -> (AtomId, AtomId) {
        (interaction.atoms[0], interaction.atoms[1])
    }

    fn distance(&self, a: AtomId, b: AtomId) -> Result<f64, ModelError> {
        let pa = self.system.current_position(a)?;
        let pb = self.system.current_position(b)?;
        Ok((pa - pb).norm())
    }

    fn charge(&self, id: AtomId) -> Result<f64, ModelError> {
        self.system
            .atom(id)
            .map(|atom| atom.partial_charge)
            .ok_or(ModelError::AtomNotFound(id))
    }

    fn atom_lj(&self, id: AtomId) -> Result<Option<LennardJonesParam>, ModelError> {
        self.system
            .atom(id)
            .map(|atom| atom.lennard_jones)
            .ok_or(ModelError::AtomNotFound(id))
    }
}

fn angle_radians(p1: &Point3<f64>, vertex: &Point3<f64>, p3: &Point3<f64>) -> Option<f64> {
    let u = p1 - vertex;
    let v = p3 - vertex;
    let norms = u.norm() * v.norm();
    if norms < 1e-12 {
        return None;
    }
    Some((u.dot(&v) / norms).clamp(-1.0, 1.0).acos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::ids::IdentityKey;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn setup() -> (ConformationalSystem, AtomId, AtomId, AtomId) {
        let mut system = ConformationalSystem::new();
        system.add_position("A 1", &[("SER", 2)]);
        let fixed = system
            .add_atom(
                Atom::fixed("N", Point3::new(0.0, 0.0, 0.0))
                    .with_charge(1.0)
                    .with_lennard_jones(1.0, 4.0),
            )
            .unwrap();
        let vertex = system
            .add_atom(Atom::fixed("CA", Point3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let moving = system
            .add_atom(
                Atom::variable(
                    "OG",
                    IdentityKey::new(0, 0),
                    vec![Point3::new(2.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
                )
                .with_charge(-1.0)
                .with_lennard_jones(1.0, 1.0),
            )
            .unwrap();
        (system, fixed, vertex, moving)
    }

    fn interaction(atoms: Vec<AtomId>, kind: InteractionKind) -> Interaction {
        Interaction {
            term: "TEST".to_string(),
            atoms,
            kind,
        }
    }

    #[test]
    fn lennard_jones_uses_combined_parameters() {
        let (system, fixed, _, moving) = setup();
        let params = EnergyParams::default();
        let scorer = Scorer::new(&system, &params);
        let energy = scorer
            .score(&interaction(vec![fixed, moving], InteractionKind::LennardJones))
            .unwrap();
        // r_min = 2.0 at distance 2.0, well depth sqrt(4 * 1) = 2.
        assert!(f64_approx_equal(energy, -2.0));
    }

    #[test]
    fn lennard_jones_without_parameters_is_an_error() {
        let (system, fixed, vertex, _) = setup();
        let params = EnergyParams::default();
        let scorer = Scorer::new(&system, &params);
        let result = scorer.score(&interaction(vec![fixed, vertex], InteractionKind::LennardJones));
        assert_eq!(result, Err(ScoringError::MissingLennardJones(vertex)));
    }

    #[test]
    fn coulomb_follows_active_conformation() {
        let (mut system, fixed, _, moving) = setup();
        let params = EnergyParams::default();
        let coulomb = interaction(vec![fixed, moving], InteractionKind::Coulomb);

        let at_two = Scorer::new(&system, &params).score(&coulomb).unwrap();
        assert!(f64_approx_equal(at_two, -params.coulomb_constant / 2.0));

        system
            .set_active_conformation(IdentityKey::new(0, 0), 1)
            .unwrap();
        let at_root_two = Scorer::new(&system, &params).score(&coulomb).unwrap();
        assert!(f64_approx_equal(
            at_root_two,
            -params.coulomb_constant / 2f64.sqrt()
        ));
    }

    #[test]
    fn harmonic_angle_is_zero_at_equilibrium() {
        let (mut system, fixed, vertex, moving) = setup();
        system
            .set_active_conformation(IdentityKey::new(0, 0), 1)
            .unwrap();
        let params = EnergyParams::default();
        let energy = Scorer::new(&system, &params)
            .score(&interaction(
                vec![fixed, vertex, moving],
                InteractionKind::HarmonicAngle {
                    force_constant: 50.0,
                    equilibrium_degrees: 90.0,
                },
            ))
            .unwrap();
        assert!(f64_approx_equal(energy, 0.0));
    }

    #[test]
    fn degenerate_angle_returns_sentinel() {
        let (system, fixed, _, _) = setup();
        let params = EnergyParams::default();
        let energy = Scorer::new(&system, &params)
            .score(&interaction(
                vec![fixed, fixed, fixed],
                InteractionKind::HarmonicAngle {
                    force_constant: 1.0,
                    equilibrium_degrees: 109.5,
                },
            ))
            .unwrap();
        assert_eq!(energy, potentials::ENERGY_SENTINEL);
    }

    #[test]
    fn harmonic_bond_and_constant_are_scored() {
        let (system, fixed, _, moving) = setup();
        let params = EnergyParams::default();
        let scorer = Scorer::new(&system, &params);
        let bond = scorer
            .score(&interaction(
                vec![fixed, moving],
                InteractionKind::HarmonicBond {
                    force_constant: 10.0,
                    equilibrium_distance: 1.5,
                },
            ))
            .unwrap();
        assert!(f64_approx_equal(bond, 2.5));
        let constant = scorer
            .score(&interaction(vec![moving], InteractionKind::Constant(-0.75)))
            .unwrap();
        assert!(f64_approx_equal(constant, -0.75));
    }
}
