use crate::cli::SolveArgs;
use crate::error::{CliError, Result};
use rotasolve::engine::config::{
    AnnealingShape, DEFAULT_SELF_ENERGY_CUTOFF, OptimizerConfig, OptimizerConfigBuilder,
};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDeeConfig {
    enabled: Option<bool>,
    energy_offset: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialEnumerationConfig {
    enabled: Option<bool>,
    limit: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialScmfConfig {
    enabled: Option<bool>,
    temperature: Option<f64>,
    cycles: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialMonteCarloConfig {
    enabled: Option<bool>,
    start_temperature: Option<f64>,
    end_temperature: Option<f64>,
    cycles: Option<usize>,
    shape: Option<AnnealingShape>,
    max_reject: Option<usize>,
    delta_steps: Option<usize>,
    min_delta_e: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialResultsConfig {
    max_saved: Option<usize>,
    save_by_term: Option<bool>,
    seed: Option<u64>,
    verbose: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialPruningConfig {
    enabled: Option<bool>,
    self_energy_cutoff: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialOptimizerConfig {
    dee: Option<PartialDeeConfig>,
    enumeration: Option<PartialEnumerationConfig>,
    scmf: Option<PartialScmfConfig>,
    monte_carlo: Option<PartialMonteCarloConfig>,
    results: Option<PartialResultsConfig>,
    pruning: Option<PartialPruningConfig>,
}

impl PartialOptimizerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Applies `-S` values and command-line flags on top of the file, then validates.
    /// Command-line flags win over `-S` values, which win over the file. Any `-v` on the
    /// command line also turns on the optimizer's stage messages.
    pub fn merge_with_cli(mut self, args: &SolveArgs, verbosity: u8) -> Result<OptimizerConfig> {
        self.apply_set_values(&args.set_values)?;

        let dee = self.dee.take().unwrap_or_default();
        let enumeration = self.enumeration.take().unwrap_or_default();
        let scmf = self.scmf.take().unwrap_or_default();
        let mc = self.monte_carlo.take().unwrap_or_default();
        let results = self.results.take().unwrap_or_default();
        let pruning = self.pruning.take().unwrap_or_default();

        let mut builder = OptimizerConfigBuilder::new()
            .run_dee(!args.no_dee && dee.enabled.unwrap_or(true))
            .run_enum(!args.no_enum && enumeration.enabled.unwrap_or(true))
            .run_scmf(!args.no_scmf && scmf.enabled.unwrap_or(true))
            .run_mc(!args.no_mc && mc.enabled.unwrap_or(true))
            .save_by_term(args.by_term || results.save_by_term.unwrap_or(false))
            .self_energy_cutoff(Self::merge_cutoff(args.self_energy_cutoff, &pruning));

        if let Some(v) = dee.energy_offset {
            builder = builder.dee_energy_offset(v);
        }
        if let Some(v) = enumeration.limit {
            builder = builder.enumeration_limit(u128::from(v));
        }
        if let Some(v) = scmf.temperature {
            builder = builder.scmf_temperature(v);
        }
        if let Some(v) = scmf.cycles {
            builder = builder.scmf_cycles(v);
        }
        builder = Self::merge_monte_carlo(builder, mc);

        if let Some(v) = args.num_solutions.or(results.max_saved) {
            builder = builder.max_saved_results(v);
        }
        if let Some(v) = args.seed.or(results.seed) {
            builder = builder.seed(v);
        }
        if verbosity > 0 {
            builder = builder.verbose(true);
        } else if let Some(v) = results.verbose {
            builder = builder.verbose(v);
        }

        Ok(builder.build()?)
    }

    /// A cutoff on the command line always enables pruning; `[pruning] enabled = true`
    /// without a value falls back to the library default.
    fn merge_cutoff(cli_value: Option<f64>, pruning: &PartialPruningConfig) -> Option<f64> {
        if cli_value.is_some() {
            return cli_value;
        }
        match (pruning.enabled, pruning.self_energy_cutoff) {
            (Some(false), _) => None,
            (_, Some(cutoff)) => Some(cutoff),
            (Some(true), None) => Some(DEFAULT_SELF_ENERGY_CUTOFF),
            (None, None) => None,
        }
    }

    fn merge_monte_carlo(
        mut builder: OptimizerConfigBuilder,
        mc: PartialMonteCarloConfig,
    ) -> OptimizerConfigBuilder {
        if let Some(v) = mc.start_temperature {
            builder = builder.mc_start_temperature(v);
        }
        if let Some(v) = mc.end_temperature {
            builder = builder.mc_end_temperature(v);
        }
        if let Some(v) = mc.cycles {
            builder = builder.mc_cycles(v);
        }
        if let Some(v) = mc.shape {
            builder = builder.mc_shape(v);
        }
        if let Some(v) = mc.max_reject {
            builder = builder.mc_max_reject(v);
        }
        if let Some(v) = mc.delta_steps {
            builder = builder.mc_delta_steps(v);
        }
        if let Some(v) = mc.min_delta_e {
            builder = builder.mc_min_delta_e(v);
        }
        builder
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "dee.enabled" => {
                    self.dee.get_or_insert_with(Default::default).enabled =
                        Some(parse(key, value)?)
                }
                "dee.energy-offset" => {
                    self.dee.get_or_insert_with(Default::default).energy_offset =
                        Some(parse(key, value)?)
                }
                "enumeration.enabled" => {
                    self.enumeration.get_or_insert_with(Default::default).enabled =
                        Some(parse(key, value)?)
                }
                "enumeration.limit" => {
                    self.enumeration.get_or_insert_with(Default::default).limit =
                        Some(parse(key, value)?)
                }
                "scmf.enabled" => {
                    self.scmf.get_or_insert_with(Default::default).enabled =
                        Some(parse(key, value)?)
                }
                "scmf.temperature" => {
                    self.scmf.get_or_insert_with(Default::default).temperature =
                        Some(parse(key, value)?)
                }
                "scmf.cycles" => {
                    self.scmf.get_or_insert_with(Default::default).cycles =
                        Some(parse(key, value)?)
                }
                "monte-carlo.enabled" => {
                    self.monte_carlo.get_or_insert_with(Default::default).enabled =
                        Some(parse(key, value)?)
                }
                "monte-carlo.start-temperature" => {
                    self.monte_carlo.get_or_insert_with(Default::default).start_temperature =
                        Some(parse(key, value)?)
                }
                "monte-carlo.end-temperature" => {
                    self.monte_carlo.get_or_insert_with(Default::default).end_temperature =
                        Some(parse(key, value)?)
                }
                "monte-carlo.cycles" => {
                    self.monte_carlo.get_or_insert_with(Default::default).cycles =
                        Some(parse(key, value)?)
                }
                "monte-carlo.shape" => {
                    self.monte_carlo.get_or_insert_with(Default::default).shape =
                        Some(parse(key, value)?)
                }
                "monte-carlo.max-reject" => {
                    self.monte_carlo.get_or_insert_with(Default::default).max_reject =
                        Some(parse(key, value)?)
                }
                "monte-carlo.delta-steps" => {
                    self.monte_carlo.get_or_insert_with(Default::default).delta_steps =
                        Some(parse(key, value)?)
                }
                "monte-carlo.min-delta-e" => {
                    self.monte_carlo.get_or_insert_with(Default::default).min_delta_e =
                        Some(parse(key, value)?)
                }
                "results.max-saved" => {
                    self.results.get_or_insert_with(Default::default).max_saved =
                        Some(parse(key, value)?)
                }
                "results.save-by-term" => {
                    self.results.get_or_insert_with(Default::default).save_by_term =
                        Some(parse(key, value)?)
                }
                "results.seed" => {
                    self.results.get_or_insert_with(Default::default).seed =
                        Some(parse(key, value)?)
                }
                "results.verbose" => {
                    self.results.get_or_insert_with(Default::default).verbose =
                        Some(parse(key, value)?)
                }
                "pruning.enabled" => {
                    self.pruning.get_or_insert_with(Default::default).enabled =
                        Some(parse(key, value)?)
                }
                "pruning.self-energy-cutoff" => {
                    self.pruning.get_or_insert_with(Default::default).self_energy_cutoff =
                        Some(parse(key, value)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn solve_args(extra: &[&str]) -> SolveArgs {
        let mut args = vec!["rotasolve", "solve", "-p", "problem.toml"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Solve(args) => args,
            _ => panic!("Expected 'solve' subcommand"),
        }
    }

    #[test]
    fn empty_configuration_yields_library_defaults() {
        let config = PartialOptimizerConfig::default()
            .merge_with_cli(&solve_args(&[]), 0)
            .unwrap();
        assert_eq!(config, OptimizerConfig::default());
    }

    #[test]
    fn file_values_are_loaded_and_merged() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "config.toml",
            r#"
            [dee]
            energy-offset = 0.25

            [enumeration]
            limit = 50000

            [monte-carlo]
            cycles = 500
            shape = "sigmoidal"

            [results]
            max-saved = 7
            seed = 42

            [pruning]
            enabled = true
            "#,
        );
        let config = PartialOptimizerConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&solve_args(&[]), 0)
            .unwrap();

        assert_eq!(config.dee.energy_offset, 0.25);
        assert_eq!(config.enumeration.limit, 50_000);
        assert_eq!(config.monte_carlo.cycles, 500);
        assert_eq!(config.monte_carlo.shape, AnnealingShape::Sigmoidal);
        assert_eq!(config.max_saved_results, 7);
        assert_eq!(config.seed, 42);
        assert_eq!(config.self_energy_cutoff, Some(DEFAULT_SELF_ENERGY_CUTOFF));
    }

    #[test]
    fn cli_flags_override_file_values() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "override.toml",
            r#"
            [results]
            max-saved = 5
            seed = 1

            [pruning]
            self-energy-cutoff = 20.0
            "#,
        );
        let args = solve_args(&[
            "--no-dee",
            "--no-mc",
            "-n",
            "12",
            "--seed",
            "99",
            "--self-energy-cutoff",
            "4.0",
        ]);
        let config = PartialOptimizerConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args, 0)
            .unwrap();

        assert!(!config.dee.enabled);
        assert!(!config.monte_carlo.enabled);
        assert!(config.scmf.enabled);
        assert_eq!(config.max_saved_results, 12);
        assert_eq!(config.seed, 99);
        assert_eq!(config.self_energy_cutoff, Some(4.0));
    }

    #[test]
    fn set_values_override_file_values() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "set.toml",
            r#"
            [scmf]
            cycles = 10
            "#,
        );
        let args = solve_args(&[
            "-S",
            "scmf.cycles=250",
            "-S",
            "monte-carlo.shape=linear",
            "-S",
            "results.verbose=true",
        ]);
        let config = PartialOptimizerConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args, 0)
            .unwrap();

        assert_eq!(config.scmf.cycles, 250);
        assert_eq!(config.monte_carlo.shape, AnnealingShape::Linear);
        assert!(config.verbose);
    }

    #[test]
    fn log_verbosity_turns_on_stage_messages() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "quiet.toml", "[results]\nverbose = false\n");

        let silent = PartialOptimizerConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&solve_args(&[]), 0)
            .unwrap();
        assert!(!silent.verbose);
        let chatty = PartialOptimizerConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&solve_args(&[]), 1)
            .unwrap();
        assert!(chatty.verbose);
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["scmf.cycles", "scmf.cycles=many", "nonsense.key=1"] {
            let result =
                PartialOptimizerConfig::default().merge_with_cli(&solve_args(&["-S", bad]), 0);
            assert!(matches!(result, Err(CliError::Config(_))), "{}", bad);
        }
    }

    #[test]
    fn invalid_merged_values_fail_validation() {
        let result = PartialOptimizerConfig::default()
            .merge_with_cli(&solve_args(&["-S", "scmf.temperature=-5"]), 0);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "unknown.toml", "[annealing]\ncycles = 3\n");
        let result = PartialOptimizerConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
