use crate::cli::EnergyArgs;
use crate::error::Result;
use crate::problem::ProblemFile;
use tracing::info;

pub fn run(args: EnergyArgs) -> Result<()> {
    info!("Loading problem from {:?}", &args.problem);
    let landscape = ProblemFile::from_file(&args.problem)?
        .into_problem(true)?
        .into_landscape(None)?;

    for line in landscape.state_descriptors(&args.state)? {
        println!("{}", line);
    }
    println!("{}", landscape.summary(&args.state)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use rotasolve::engine::error::EngineError;
    use std::fs;
    use std::path::PathBuf;

    fn write_problem(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("problem.toml");
        fs::write(
            &path,
            r#"
            [[positions]]
            label = "A 1"
            identities = [{ name = "SER", rotamers = 2 }]
            self-energies = { vdw = [1.0, 5.0] }
            "#,
        )
        .unwrap();
        path
    }

    #[test]
    fn valid_state_prints_its_summary() {
        let dir = tempfile::tempdir().unwrap();
        let args = EnergyArgs {
            problem: write_problem(&dir),
            state: vec![1],
        };
        assert!(run(args).is_ok());
    }

    #[test]
    fn wrong_state_length_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let args = EnergyArgs {
            problem: write_problem(&dir),
            state: vec![0, 0],
        };
        let result = run(args);
        assert!(matches!(
            result,
            Err(CliError::Engine(EngineError::IndexMismatch { .. }))
        ));
    }

    #[test]
    fn out_of_range_rotamer_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let args = EnergyArgs {
            problem: write_problem(&dir),
            state: vec![4],
        };
        let result = run(args);
        assert!(matches!(
            result,
            Err(CliError::Engine(EngineError::RotamerOutOfRange { .. }))
        ));
    }
}
