//! Full-dataset heatmap pass.
//!
//! Encodes every image in a keypoint file, persists each per-image heatmap,
//! and writes the dataset-wide aggregate once at the end.

use ndarray::Array2;
use tracing::{debug, info};

use repose_core::Result;

use crate::encoder::{HeatmapAccumulator, HeatmapEncoder};
use crate::keypoints::KeypointFile;
use crate::store::HeatmapStore;

/// Encode and persist heatmaps for every image in `keypoints`.
///
/// Returns the aggregate heatmap, which is also written to the store.
/// Fails with `EmptyInput` when the keypoint file names no images.
pub fn encode_dataset(
    encoder: &HeatmapEncoder,
    keypoints: &KeypointFile,
    store: &HeatmapStore,
) -> Result<Array2<f32>> {
    let mut accumulator = HeatmapAccumulator::new(encoder.config().grid);

    for (image_name, persons) in keypoints.iter() {
        let heatmap = encoder.encode(persons);
        let path = store.save(image_name, &heatmap)?;
        debug!(image = %image_name, path = %path.display(), "saved per-image heatmap");
        accumulator.push(&heatmap);
    }

    let processed = accumulator.count();
    let aggregate = accumulator.finalize()?;
    let path = store.save_aggregate(&aggregate)?;
    info!(images = processed, path = %path.display(), "saved aggregate heatmap");

    Ok(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::HeatmapConfig;
    use repose_core::Error;
    use tempfile::tempdir;

    #[test]
    fn test_full_pass_writes_all_artifacts() {
        let json = r#"{
            "a.jpg": [[[10.0, 20.0, 0.9]]],
            "b.jpg": [[[50.0, 90.0, 0.8]], [[50.0, 90.0, 0.7]]]
        }"#;
        let keypoints: KeypointFile = serde_json::from_str(json).unwrap();
        let encoder = HeatmapEncoder::new(HeatmapConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let store = HeatmapStore::create(dir.path()).unwrap();

        let aggregate = encode_dataset(&encoder, &keypoints, &store).unwrap();

        assert!(store.heatmap_path("a.jpg").exists());
        assert!(store.heatmap_path("b.jpg").exists());
        assert!(store.aggregate_path().exists());

        // Aggregate is the mean of the two stored per-image heatmaps.
        let a = store.load("a.jpg").unwrap();
        let b = store.load("b.jpg").unwrap();
        let expected = (&a + &b) / 2.0;
        for (got, want) in aggregate.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_keypoint_file_fails() {
        let keypoints: KeypointFile = serde_json::from_str("{}").unwrap();
        let encoder = HeatmapEncoder::new(HeatmapConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let store = HeatmapStore::create(dir.path()).unwrap();

        let err = encode_dataset(&encoder, &keypoints, &store).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
        assert!(!store.aggregate_path().exists());
    }
}
