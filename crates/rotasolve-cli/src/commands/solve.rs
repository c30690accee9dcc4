use crate::cli::SolveArgs;
use crate::config::PartialOptimizerConfig;
use crate::error::Result;
use crate::problem::ProblemFile;
use crate::utils::progress::CliProgressHandler;
use rotasolve::engine::progress::ProgressReporter;
use rotasolve::engine::state::Solution;
use rotasolve::engine::utils::random::RandomSource;
use rotasolve::workflows::optimize;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info, warn};

pub fn run(args: SolveArgs, verbosity: u8) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialOptimizerConfig::from_file(path)?,
        None => PartialOptimizerConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args, verbosity)?;

    info!("Loading problem from {:?}", &args.problem);
    let landscape = ProblemFile::from_file(&args.problem)?
        .into_problem(config.save_by_term)?
        .into_landscape(config.self_energy_cutoff)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let mut rng = RandomSource::owned(config.seed);
    info!(seed = ?rng.seed(), "Random source ready.");

    eprintln!("Starting optimization...");
    let result = optimize::run(&landscape, &config, &mut rng, &reporter)?;
    debug!(stages = ?progress_handler.finished_stages(), "Optimization stages finished.");

    let Some(best) = result.best() else {
        warn!("Optimization completed but no state was saved.");
        eprintln!("Warning: no state was saved; enable enumeration, SCMF or Monte Carlo.");
        return Ok(());
    };

    eprintln!("Best energy: {:.4} kcal/mol", best.energy);
    for line in landscape.state_descriptors(&best.state)? {
        eprintln!("  {}", line);
    }
    if config.save_by_term {
        eprintln!("{}", landscape.summary(&best.state)?);
    }

    match &args.output {
        Some(path) => {
            write_solutions(File::create(path)?, result.solutions())?;
            eprintln!(
                "{} state(s) written to: {}",
                result.solutions().len(),
                path.display()
            );
        }
        None => write_solutions(std::io::stdout().lock(), result.solutions())?,
    }
    Ok(())
}

/// Writes `rank,energy,state` rows; states are space-separated original rotamer indices.
pub fn write_solutions<W: Write>(writer: W, solutions: &[Solution]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["rank", "energy", "state"])?;
    for (rank, solution) in solutions.iter().enumerate() {
        let state = solution
            .state
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        csv.write_record([
            (rank + 1).to_string(),
            format!("{:.6}", solution.energy),
            state,
        ])?;
    }
    csv.flush()?;
    Ok(())
}
