use crate::error::{CliError, Result};
use rotasolve::core::forcefield::term::TermTally;
use rotasolve::core::models::position::{Identity, VariablePosition};
use rotasolve::engine::landscape::EnergyLandscape;
use rotasolve::engine::tables::EnergyTables;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Energies keyed by term name.
type TermValues<T> = BTreeMap<String, T>;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct IdentityEntry {
    name: String,
    rotamers: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PositionEntry {
    label: String,
    identities: Vec<IdentityEntry>,
    /// One value per flat rotamer for each term.
    #[serde(default)]
    self_energies: TermValues<Vec<f64>>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PairEntry {
    positions: [usize; 2],
    /// Rows follow the rotamers of the first position, columns those of the second.
    energies: TermValues<Vec<Vec<f64>>>,
}

/// A tabulated energy problem as read from TOML.
///
/// ```toml
/// fixed-energy = { vdw = -3.5 }
///
/// [[positions]]
/// label = "A 10"
/// identities = [{ name = "SER", rotamers = 2 }]
/// self-energies = { vdw = [1.0, 5.0] }
///
/// [[pairs]]
/// positions = [1, 0]
/// energies = { vdw = [[0.0, 10.0], [10.0, 0.0]] }
/// ```
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProblemFile {
    #[serde(default)]
    fixed_energy: TermValues<f64>,
    positions: Vec<PositionEntry>,
    #[serde(default)]
    pairs: Vec<PairEntry>,
}

impl ProblemFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading problem from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Names of every term mentioned anywhere in the problem, sorted.
    pub fn terms(&self) -> Vec<String> {
        let mut terms: BTreeSet<&str> = self.fixed_energy.keys().map(String::as_str).collect();
        for position in &self.positions {
            terms.extend(position.self_energies.keys().map(String::as_str));
        }
        for pair in &self.pairs {
            terms.extend(pair.energies.keys().map(String::as_str));
        }
        terms.into_iter().map(str::to_string).collect()
    }

    /// Validates the problem and builds full-space tables, with per-term tables when
    /// `by_term` is set.
    pub fn into_problem(self, by_term: bool) -> Result<Problem> {
        let terms = self.terms();
        let positions: Vec<VariablePosition> = self
            .positions
            .iter()
            .map(|entry| {
                let identities = entry
                    .identities
                    .iter()
                    .map(|i| Identity::new(&i.name, i.rotamers))
                    .collect();
                VariablePosition::new(&entry.label, identities)
            })
            .collect();
        let counts: Vec<usize> = positions.iter().map(|p| p.total_rotamers()).collect();
        let mut tables = EnergyTables::new(&counts, by_term.then_some(terms.as_slice()));

        for (term, &energy) in &self.fixed_energy {
            tables.total.fixed += TermTally::single(energy);
            if let Some(set) = tables.by_term.as_mut().and_then(|t| t.get_mut(term)) {
                set.fixed += TermTally::single(energy);
            }
        }

        for (index, entry) in self.positions.iter().enumerate() {
            for (term, values) in &entry.self_energies {
                if values.len() != counts[index] {
                    return Err(CliError::Problem(format!(
                        "position '{}' has {} rotamers but term '{}' lists {} self energies",
                        entry.label,
                        counts[index],
                        term,
                        values.len()
                    )));
                }
                for (rotamer, &energy) in values.iter().enumerate() {
                    tables.total.add_self(index, rotamer, TermTally::single(energy));
                    if let Some(set) = tables.by_term.as_mut().and_then(|t| t.get_mut(term)) {
                        set.add_self(index, rotamer, TermTally::single(energy));
                    }
                }
            }
        }

        for pair in &self.pairs {
            let [a, b] = pair.positions;
            if a == b || a >= counts.len() || b >= counts.len() {
                return Err(CliError::Problem(format!(
                    "pair {:?} must name two different positions below {}",
                    pair.positions,
                    counts.len()
                )));
            }
            for (term, matrix) in &pair.energies {
                let shape_ok = matrix.len() == counts[a]
                    && matrix.iter().all(|row| row.len() == counts[b]);
                if !shape_ok {
                    return Err(CliError::Problem(format!(
                        "pair {:?} term '{}' must be a {}x{} matrix",
                        pair.positions, term, counts[a], counts[b]
                    )));
                }
                for (ra, row) in matrix.iter().enumerate() {
                    for (rb, &energy) in row.iter().enumerate() {
                        tables.total.add_pair(a, ra, b, rb, TermTally::single(energy));
                        if let Some(set) = tables.by_term.as_mut().and_then(|t| t.get_mut(term)) {
                            set.add_pair(a, ra, b, rb, TermTally::single(energy));
                        }
                    }
                }
            }
        }

        debug!(
            positions = positions.len(),
            pairs = self.pairs.len(),
            terms = ?terms,
            "Tabulated problem built."
        );
        Ok(Problem { positions, tables })
    }
}

/// Positions and full-space tables of a validated problem.
#[derive(Debug, Clone)]
pub struct Problem {
    pub positions: Vec<VariablePosition>,
    pub tables: EnergyTables,
}

impl Problem {
    pub fn into_landscape(self, self_energy_cutoff: Option<f64>) -> Result<EnergyLandscape> {
        Ok(EnergyLandscape::from_tables(
            self.positions,
            self.tables,
            self_energy_cutoff,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    const TWO_BY_TWO: &str = r#"
        fixed-energy = { vdw = 0.5, elec = -0.5 }

        [[positions]]
        label = "A 1"
        identities = [{ name = "SER", rotamers = 2 }]
        self-energies = { vdw = [1.0, 4.0], elec = [0.0, 1.0] }

        [[positions]]
        label = "A 2"
        identities = [{ name = "GLY", rotamers = 1 }, { name = "ALA", rotamers = 1 }]
        self-energies = { vdw = [2.0, 3.0] }

        [[pairs]]
        positions = [1, 0]
        energies = { vdw = [[0.0, 10.0], [10.0, 0.0]] }
    "#;

    fn parse(content: &str) -> ProblemFile {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn terms_are_collected_from_every_section() {
        assert_eq!(parse(TWO_BY_TWO).terms(), vec!["elec", "vdw"]);
    }

    #[test]
    fn tables_sum_terms_into_totals() {
        let problem = parse(TWO_BY_TWO).into_problem(true).unwrap();
        let total = &problem.tables.total;
        assert!(f64_approx_equal(total.fixed.energy, 0.0));
        assert_eq!(total.fixed.count, 2);
        assert_eq!(total.self_energy.row(0), &[1.0, 5.0]);
        assert_eq!(total.pair_energy.get(0, 1, 1, 0), 10.0);
        assert!(f64_approx_equal(total.state_energy(&[0, 0]), 3.0));

        let elec = problem.tables.term("elec").unwrap();
        assert_eq!(elec.self_energy.row(0), &[0.0, 1.0]);
        assert_eq!(elec.self_energy.row(1), &[0.0, 0.0]);
    }

    #[test]
    fn landscape_accepts_original_indices() {
        let landscape = parse(TWO_BY_TWO)
            .into_problem(false)
            .unwrap()
            .into_landscape(None)
            .unwrap();
        assert_eq!(landscape.number_of_rotamers(), vec![2, 2]);
        assert!(f64_approx_equal(
            landscape.state_energy(&[1, 1], None).unwrap(),
            8.0
        ));
    }

    #[test]
    fn self_energy_length_mismatch_is_rejected() {
        let content = r#"
            [[positions]]
            label = "A 1"
            identities = [{ name = "SER", rotamers = 3 }]
            self-energies = { vdw = [1.0, 4.0] }
        "#;
        let result = parse(content).into_problem(false);
        assert!(matches!(result, Err(CliError::Problem(_))));
    }

    #[test]
    fn pair_on_a_single_position_is_rejected() {
        let content = r#"
            [[positions]]
            label = "A 1"
            identities = [{ name = "SER", rotamers = 1 }]

            [[pairs]]
            positions = [0, 0]
            energies = { vdw = [[1.0]] }
        "#;
        let result = parse(content).into_problem(false);
        assert!(matches!(result, Err(CliError::Problem(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let content = r#"
            bogus = 1
            positions = []
        "#;
        assert!(toml::from_str::<ProblemFile>(content).is_err());
    }

    #[test]
    fn from_file_reports_parse_failures_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "positions = 3").unwrap();
        let result = ProblemFile::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
