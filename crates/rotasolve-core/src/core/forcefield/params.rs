use serde::Deserialize;

const DEFAULT_COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

/// Physical constants used by the interaction-energy formulas.
///
/// Passed by reference to every [`super::scoring::Scorer`]; there is no global
/// instance.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct EnergyParams {
    pub coulomb_constant: f64,
    pub dielectric_constant: f64,
    /// Scales the dielectric by the distance (ε·r), the usual implicit-solvent shortcut.
    pub distance_dependent_dielectric: bool,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            coulomb_constant: DEFAULT_COULOMB_CONSTANT,
            dielectric_constant: 1.0,
            distance_dependent_dielectric: false,
        }
    }
}

impl EnergyParams {
    #[inline]
    pub fn effective_dielectric(&self, dist: f64) -> f64 {
        if self.distance_dependent_dielectric {
            self.dielectric_constant * dist
        } else {
            self.dielectric_constant
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_vacuum_dielectric() {
        let params = EnergyParams::default();
        assert_eq!(params.dielectric_constant, 1.0);
        assert_eq!(params.effective_dielectric(3.0), 1.0);
    }

    #[test]
    fn distance_dependent_dielectric_scales_with_distance() {
        let params = EnergyParams {
            dielectric_constant: 4.0,
            distance_dependent_dielectric: true,
            ..EnergyParams::default()
        };
        assert_eq!(params.effective_dielectric(2.5), 10.0);
    }
}
