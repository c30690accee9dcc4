use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub const DEFAULT_SELF_ENERGY_CUTOFF: f64 = 15.0;

/// Shape of the Monte Carlo temperature schedule between its start and end values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnealingShape {
    Constant,
    Linear,
    #[default]
    Exponential,
    Sigmoidal,
}

impl FromStr for AnnealingShape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constant" => Ok(Self::Constant),
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            "sigmoidal" => Ok(Self::Sigmoidal),
            other => Err(ConfigError::InvalidParameter {
                name: "mc_shape",
                reason: format!(
                    "unknown annealing shape '{}'; expected constant, linear, exponential or sigmoidal",
                    other
                ),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeeConfig {
    pub enabled: bool,
    pub energy_offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationConfig {
    pub enabled: bool,
    pub limit: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScmfConfig {
    pub enabled: bool,
    pub temperature: f64,
    pub cycles: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloConfig {
    pub enabled: bool,
    pub start_temperature: f64,
    pub end_temperature: f64,
    pub cycles: usize,
    pub shape: AnnealingShape,
    pub max_reject: usize,
    pub delta_steps: usize,
    pub min_delta_e: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub dee: DeeConfig,
    pub enumeration: EnumerationConfig,
    pub scmf: ScmfConfig,
    pub monte_carlo: MonteCarloConfig,
    pub max_saved_results: usize,
    pub self_energy_cutoff: Option<f64>,
    pub save_by_term: bool,
    /// Zero selects a time-based seed.
    pub seed: u64,
    pub verbose: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            dee: DeeConfig {
                enabled: true,
                energy_offset: 0.0,
            },
            enumeration: EnumerationConfig {
                enabled: true,
                limit: 1000,
            },
            scmf: ScmfConfig {
                enabled: true,
                temperature: 300.0,
                cycles: 100,
            },
            monte_carlo: MonteCarloConfig {
                enabled: true,
                start_temperature: 1000.0,
                end_temperature: 0.5,
                cycles: 2000,
                shape: AnnealingShape::Exponential,
                max_reject: 200,
                delta_steps: 100,
                min_delta_e: 0.01,
            },
            max_saved_results: 100,
            self_energy_cutoff: None,
            save_by_term: false,
            seed: 0,
            verbose: false,
        }
    }
}

#[derive(Default)]
pub struct OptimizerConfigBuilder {
    run_dee: Option<bool>,
    run_enum: Option<bool>,
    run_scmf: Option<bool>,
    run_mc: Option<bool>,
    dee_energy_offset: Option<f64>,
    enumeration_limit: Option<u128>,
    max_saved_results: Option<usize>,
    self_energy_cutoff: Option<Option<f64>>,
    save_by_term: Option<bool>,
    scmf_temperature: Option<f64>,
    scmf_cycles: Option<usize>,
    mc_start_temperature: Option<f64>,
    mc_end_temperature: Option<f64>,
    mc_cycles: Option<usize>,
    mc_shape: Option<AnnealingShape>,
    mc_max_reject: Option<usize>,
    mc_delta_steps: Option<usize>,
    mc_min_delta_e: Option<f64>,
    seed: Option<u64>,
    verbose: Option<bool>,
}

impl OptimizerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_dee(mut self, enabled: bool) -> Self {
        self.run_dee = Some(enabled);
        self
    }
    pub fn run_enum(mut self, enabled: bool) -> Self {
        self.run_enum = Some(enabled);
        self
    }
    pub fn run_scmf(mut self, enabled: bool) -> Self {
        self.run_scmf = Some(enabled);
        self
    }
    pub fn run_mc(mut self, enabled: bool) -> Self {
        self.run_mc = Some(enabled);
        self
    }
    pub fn dee_energy_offset(mut self, offset: f64) -> Self {
        self.dee_energy_offset = Some(offset);
        self
    }
    pub fn enumeration_limit(mut self, limit: u128) -> Self {
        self.enumeration_limit = Some(limit);
        self
    }
    pub fn max_saved_results(mut self, n: usize) -> Self {
        self.max_saved_results = Some(n);
        self
    }
    /// `None` disables pruning by self energy.
    pub fn self_energy_cutoff(mut self, cutoff: Option<f64>) -> Self {
        self.self_energy_cutoff = Some(cutoff);
        self
    }
    pub fn save_by_term(mut self, enabled: bool) -> Self {
        self.save_by_term = Some(enabled);
        self
    }
    pub fn scmf_temperature(mut self, kelvin: f64) -> Self {
        self.scmf_temperature = Some(kelvin);
        self
    }
    pub fn scmf_cycles(mut self, cycles: usize) -> Self {
        self.scmf_cycles = Some(cycles);
        self
    }
    pub fn mc_start_temperature(mut self, kelvin: f64) -> Self {
        self.mc_start_temperature = Some(kelvin);
        self
    }
    pub fn mc_end_temperature(mut self, kelvin: f64) -> Self {
        self.mc_end_temperature = Some(kelvin);
        self
    }
    pub fn mc_cycles(mut self, cycles: usize) -> Self {
        self.mc_cycles = Some(cycles);
        self
    }
    pub fn mc_shape(mut self, shape: AnnealingShape) -> Self {
        self.mc_shape = Some(shape);
        self
    }
    pub fn mc_max_reject(mut self, n: usize) -> Self {
        self.mc_max_reject = Some(n);
        self
    }
    pub fn mc_delta_steps(mut self, n: usize) -> Self {
        self.mc_delta_steps = Some(n);
        self
    }
    pub fn mc_min_delta_e(mut self, delta: f64) -> Self {
        self.mc_min_delta_e = Some(delta);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn build(self) -> Result<OptimizerConfig, ConfigError> {
        let defaults = OptimizerConfig::default();

        let config = OptimizerConfig {
            dee: DeeConfig {
                enabled: self.run_dee.unwrap_or(defaults.dee.enabled),
                energy_offset: self
                    .dee_energy_offset
                    .unwrap_or(defaults.dee.energy_offset),
            },
            enumeration: EnumerationConfig {
                enabled: self.run_enum.unwrap_or(defaults.enumeration.enabled),
                limit: self.enumeration_limit.unwrap_or(defaults.enumeration.limit),
            },
            scmf: ScmfConfig {
                enabled: self.run_scmf.unwrap_or(defaults.scmf.enabled),
                temperature: self.scmf_temperature.unwrap_or(defaults.scmf.temperature),
                cycles: self.scmf_cycles.unwrap_or(defaults.scmf.cycles),
            },
            monte_carlo: MonteCarloConfig {
                enabled: self.run_mc.unwrap_or(defaults.monte_carlo.enabled),
                start_temperature: self
                    .mc_start_temperature
                    .unwrap_or(defaults.monte_carlo.start_temperature),
                end_temperature: self
                    .mc_end_temperature
                    .unwrap_or(defaults.monte_carlo.end_temperature),
                cycles: self.mc_cycles.unwrap_or(defaults.monte_carlo.cycles),
                shape: self.mc_shape.unwrap_or(defaults.monte_carlo.shape),
                max_reject: self.mc_max_reject.unwrap_or(defaults.monte_carlo.max_reject),
                delta_steps: self
                    .mc_delta_steps
                    .unwrap_or(defaults.monte_carlo.delta_steps),
                min_delta_e: self
                    .mc_min_delta_e
                    .unwrap_or(defaults.monte_carlo.min_delta_e),
            },
            max_saved_results: self
                .max_saved_results
                .unwrap_or(defaults.max_saved_results),
            self_energy_cutoff: self
                .self_energy_cutoff
                .unwrap_or(defaults.self_energy_cutoff),
            save_by_term: self.save_by_term.unwrap_or(defaults.save_by_term),
            seed: self.seed.unwrap_or(defaults.seed),
            verbose: self.verbose.unwrap_or(defaults.verbose),
        };

        config.validate()?;
        Ok(config)
    }
}

impl OptimizerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_saved_results == 0 {
            return Err(invalid("max_saved_results", "must be at least 1"));
        }
        if let Some(cutoff) = self.self_energy_cutoff {
            if !(cutoff.is_finite() && cutoff > 0.0) {
                return Err(invalid(
                    "self_energy_cutoff",
                    format!("must be a finite positive energy, got {}", cutoff),
                ));
            }
        }
        if !self.dee.energy_offset.is_finite() {
            return Err(invalid("dee_energy_offset", "must be finite"));
        }
        if !(self.scmf.temperature.is_finite() && self.scmf.temperature > 0.0) {
            return Err(invalid(
                "scmf_temperature",
                format!("must be positive, got {}", self.scmf.temperature),
            ));
        }

        let mc = &self.monte_carlo;
        for (name, value) in [
            ("mc_start_temperature", mc.start_temperature),
            ("mc_end_temperature", mc.end_temperature),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, format!("must be positive, got {}", value)));
            }
        }
        if mc.enabled && mc.cycles == 0 {
            return Err(invalid("mc_cycles", "must be at least 1 when Monte Carlo is enabled"));
        }
        if mc.max_reject == 0 {
            return Err(invalid("mc_max_reject", "must be at least 1"));
        }
        if mc.delta_steps == 0 {
            return Err(invalid("mc_delta_steps", "must be at least 1"));
        }
        if !(mc.min_delta_e.is_finite() && mc.min_delta_e >= 0.0) {
            return Err(invalid(
                "mc_min_delta_e",
                format!("must be a finite non-negative energy, got {}", mc.min_delta_e),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_without_overrides_yields_defaults() {
        let config = OptimizerConfigBuilder::new().build().unwrap();
        assert_eq!(config, OptimizerConfig::default());
        assert!(config.dee.enabled && config.scmf.enabled && config.monte_carlo.enabled);
        assert_eq!(config.enumeration.limit, 1000);
        assert_eq!(config.monte_carlo.shape, AnnealingShape::Exponential);
        assert_eq!(config.self_energy_cutoff, None);
    }

    #[test]
    fn builder_applies_overrides() {
        let config = OptimizerConfigBuilder::new()
            .run_mc(false)
            .self_energy_cutoff(Some(DEFAULT_SELF_ENERGY_CUTOFF))
            .mc_shape(AnnealingShape::Linear)
            .max_saved_results(5)
            .seed(42)
            .build()
            .unwrap();
        assert!(!config.monte_carlo.enabled);
        assert_eq!(config.self_energy_cutoff, Some(15.0));
        assert_eq!(config.monte_carlo.shape, AnnealingShape::Linear);
        assert_eq!(config.max_saved_results, 5);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn zero_saved_results_is_rejected() {
        let err = OptimizerConfigBuilder::new()
            .max_saved_results(0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "max_saved_results",
                ..
            }
        ));
    }

    #[test]
    fn non_positive_temperatures_are_rejected() {
        assert!(OptimizerConfigBuilder::new().scmf_temperature(0.0).build().is_err());
        assert!(OptimizerConfigBuilder::new()
            .mc_end_temperature(-1.0)
            .build()
            .is_err());
    }

    #[test]
    fn non_positive_cutoff_is_rejected() {
        assert!(OptimizerConfigBuilder::new()
            .self_energy_cutoff(Some(-2.0))
            .build()
            .is_err());
        assert!(OptimizerConfigBuilder::new()
            .self_energy_cutoff(Some(0.0))
            .build()
            .is_err());
    }

    #[test]
    fn annealing_shapes_parse_case_insensitively() {
        assert_eq!("Sigmoidal".parse::<AnnealingShape>(), Ok(AnnealingShape::Sigmoidal));
        assert_eq!(" linear ".parse::<AnnealingShape>(), Ok(AnnealingShape::Linear));
        assert!("cubic".parse::<AnnealingShape>().is_err());
    }
}
