/// Largest magnitude any single interaction energy may take.
pub const ENERGY_SENTINEL: f64 = 1e10;

const MIN_DISTANCE: f64 = 1e-6;

/// Clamps an energy into `[-ENERGY_SENTINEL, ENERGY_SENTINEL]`; NaN maps to the
/// positive sentinel so totals stay orderable.
#[inline]
pub fn saturate(energy: f64) -> f64 {
    if energy.is_nan() {
        ENERGY_SENTINEL
    } else {
        energy.clamp(-ENERGY_SENTINEL, ENERGY_SENTINEL)
    }
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return ENERGY_SENTINEL;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    saturate(well_depth * (rho12 - 2.0 * rho6))
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, coulomb_constant: f64, dielectric: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return q1.signum() * q2.signum() * ENERGY_SENTINEL;
    }
    saturate(coulomb_constant * q1 * q2 / (dielectric * dist))
}

#[inline]
pub fn harmonic(value: f64, equilibrium: f64, force_constant: f64) -> f64 {
    let delta = value - equilibrium;
    saturate(force_constant * delta * delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;
    const COULOMB_CONSTANT: f64 = 332.0637;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let energy = lennard_jones_12_6(2.0, 2.0, 10.0);
        assert!(f64_approx_equal(energy, -10.0));
    }

    #[test]
    fn lennard_jones_at_very_small_distance_returns_sentinel() {
        let energy = lennard_jones_12_6(1e-7, 2.0, 10.0);
        assert!(f64_approx_equal(energy, ENERGY_SENTINEL));
    }

    #[test]
    fn lennard_jones_saturates_instead_of_overflowing() {
        let energy = lennard_jones_12_6(1e-4, 4.0, 10.0);
        assert!(energy.is_finite());
        assert!(f64_approx_equal(energy, ENERGY_SENTINEL));
    }

    #[test]
    fn coulomb_calculates_repulsive_energy_correctly() {
        let energy = coulomb(1.0, 1.0, 1.0, COULOMB_CONSTANT, 1.0);
        assert!(f64_approx_equal(energy, COULOMB_CONSTANT));
    }

    #[test]
    fn coulomb_calculates_attractive_energy_correctly() {
        let energy = coulomb(2.0, 1.0, -1.0, COULOMB_CONSTANT, 1.0);
        assert!(f64_approx_equal(energy, -COULOMB_CONSTANT / 2.0));
    }

    #[test]
    fn coulomb_at_very_small_distance_returns_sentinel_with_correct_sign() {
        assert!(f64_approx_equal(
            coulomb(1e-7, 1.0, 1.0, COULOMB_CONSTANT, 1.0),
            ENERGY_SENTINEL
        ));
        assert!(f64_approx_equal(
            coulomb(1e-7, -1.0, 1.0, COULOMB_CONSTANT, 1.0),
            -ENERGY_SENTINEL
        ));
    }

    #[test]
    fn harmonic_is_zero_at_equilibrium_and_quadratic_away() {
        assert!(f64_approx_equal(harmonic(1.5, 1.5, 100.0), 0.0));
        assert!(f64_approx_equal(harmonic(2.0, 1.5, 100.0), 25.0));
    }

    #[test]
    fn saturate_maps_nan_and_infinities_to_finite_sentinels() {
        assert_eq!(saturate(f64::NAN), ENERGY_SENTINEL);
        assert_eq!(saturate(f64::INFINITY), ENERGY_SENTINEL);
        assert_eq!(saturate(f64::NEG_INFINITY), -ENERGY_SENTINEL);
        assert_eq!(saturate(-3.0), -3.0);
    }
}
