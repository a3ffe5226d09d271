use std::path::PathBuf;

use anyhow::Context;
use burn::{
    backend::{Autodiff, NdArray},
    config::Config,
};
use clap::Parser;
use once_cell::sync::Lazy;

use foldrl::{
    protein::{fetch_protein, load_protein, RedcraftOracle},
    train::{Trainer, TrainingConfig},
};

type Backend = Autodiff<NdArray>;

static DEVICE: Lazy<<NdArray as burn::prelude::Backend>::Device> = Lazy::new(Default::default);

/// Train a DDPG agent to fold a protein backbone toward a reference structure
#[derive(Parser)]
#[command(name = "foldrl", version, long_about = None)]
struct Cli {
    /// JSON training configuration; defaults are used for anything missing
    #[arg(long)]
    config: Option<PathBuf>,

    /// RCSB identifier of the goal structure
    #[arg(long)]
    pdb_id: Option<String>,

    /// Read the goal structure from a local PDB file instead of RCSB
    #[arg(long, conflicts_with = "pdb_id")]
    pdb_file: Option<PathBuf>,

    #[arg(long)]
    episodes: Option<usize>,

    /// Steps per episode
    #[arg(long)]
    steps: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Write the effective configuration to this file and continue
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    let mut config = match &cli.config {
        Some(path) => TrainingConfig::load(path)
            .map_err(|e| foldrl::Error::Config(format!("{e:?}")))
            .with_context(|| format!("loading {}", path.display()))?,
        None => TrainingConfig::new(),
    };
    if let Some(pdb_id) = cli.pdb_id {
        config.pdb_id = pdb_id;
    }
    if let Some(episodes) = cli.episodes {
        config.episodes = episodes;
    }
    if let Some(steps) = cli.steps {
        config.steps = steps;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(path) = &cli.save_config {
        config
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let goal = match &cli.pdb_file {
        Some(path) => load_protein(path).with_context(|| format!("reading {}", path.display()))?,
        None => fetch_protein(&config.pdb_id)
            .with_context(|| format!("fetching {} from RCSB", config.pdb_id))?,
    };
    log::info!("goal structure has {} residues", goal.n_residues());

    let oracle = RedcraftOracle::new(&config.oracle);
    let mut trainer = Trainer::<Backend, _>::new(config, goal, oracle, &*DEVICE)?;
    let summaries = trainer.run()?;

    if let Some(best) = summaries
        .iter()
        .min_by(|a, b| a.final_distance.total_cmp(&b.final_distance))
    {
        log::info!(
            "closest approach: episode {} at distance {:.3}",
            best.episode,
            best.final_distance
        );
    }
    Ok(())
}
