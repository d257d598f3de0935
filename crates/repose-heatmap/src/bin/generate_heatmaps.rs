//! Generate per-image and aggregate pose heatmaps from a keypoint file.

use std::path::Path;

use repose_heatmap::{encode_dataset, HeatmapConfig, HeatmapEncoder, HeatmapStore, KeypointFile};

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <keypoints.json> <heatmap_dir>", args[0]);
        std::process::exit(1);
    }

    if let Err(e) = run(Path::new(&args[1]), Path::new(&args[2])) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(keypoints_path: &Path, heatmap_dir: &Path) -> repose_core::Result<()> {
    let keypoints = KeypointFile::load(keypoints_path)?;
    tracing::info!(images = keypoints.len(), "loaded keypoint file");

    let encoder = HeatmapEncoder::new(HeatmapConfig::default())?;
    let store = HeatmapStore::create(heatmap_dir)?;
    encode_dataset(&encoder, &keypoints, &store)?;
    Ok(())
}
