//! Run pose-transfer inference over a pair dataset.

use std::path::{Path, PathBuf};

use candle_core::Device;
use tracing::info;

use repose_data::{DatasetConfig, PairDataset};
use repose_infer::{InferenceConfig, InferenceEngine};

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 || args.len() > 6 {
        eprintln!(
            "Usage: {} <pairs.csv> <image_dir> <pose_dir> <output_dir> [weights.safetensors]",
            args[0]
        );
        std::process::exit(1);
    }

    let weights = args.get(5).map(Path::new);
    if let Err(e) = run(
        Path::new(&args[1]),
        Path::new(&args[2]),
        Path::new(&args[3]),
        Path::new(&args[4]),
        weights,
    ) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(
    pairs_path: &Path,
    image_dir: &Path,
    pose_dir: &Path,
    output_dir: &Path,
    weights: Option<&Path>,
) -> repose_core::Result<()> {
    let dataset_config = DatasetConfig::new(image_dir).with_pose_dir(pose_dir);
    let dataset = PairDataset::open(pairs_path, dataset_config, &Device::Cpu)?;
    info!(pairs = dataset.len(), "loaded pair dataset");

    let config = InferenceConfig {
        output_dir: PathBuf::from(output_dir),
        ..Default::default()
    };
    let engine = match weights {
        Some(path) => InferenceEngine::load(path, config)?,
        None => {
            info!("no checkpoint given, running with randomly initialized weights");
            InferenceEngine::new_random(config)?
        }
    };

    engine.run(&dataset)?;
    Ok(())
}
