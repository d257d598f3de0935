//! Heatmap persistence.
//!
//! Each per-image heatmap is written once as a single-tensor safetensors
//! file keyed by the source image's base filename; the dataset-wide
//! aggregate gets a fixed filename and is rewritten whenever the full
//! keypoint set is reprocessed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use ndarray::Array2;

use repose_core::{image_stem, Error, Result};

pub const HEATMAP_SUFFIX: &str = "_heatmap.safetensors";
pub const AGGREGATE_FILENAME: &str = "body_heatmap.safetensors";

const TENSOR_KEY: &str = "heatmap";

/// Directory-backed store for per-image and aggregate heatmaps.
pub struct HeatmapStore {
    dir: PathBuf,
}

impl HeatmapStore {
    /// Open the store, creating the directory if needed.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn heatmap_path(&self, image_name: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}", image_stem(image_name), HEATMAP_SUFFIX))
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.dir.join(AGGREGATE_FILENAME)
    }

    pub fn save(&self, image_name: &str, heatmap: &Array2<f32>) -> Result<PathBuf> {
        let path = self.heatmap_path(image_name);
        write_tensor(&path, heatmap)?;
        Ok(path)
    }

    pub fn save_aggregate(&self, heatmap: &Array2<f32>) -> Result<PathBuf> {
        let path = self.aggregate_path();
        write_tensor(&path, heatmap)?;
        Ok(path)
    }

    pub fn load(&self, image_name: &str) -> Result<Array2<f32>> {
        read_tensor(&self.heatmap_path(image_name))
    }

    pub fn load_aggregate(&self) -> Result<Array2<f32>> {
        read_tensor(&self.aggregate_path())
    }
}

fn write_tensor(path: &Path, heatmap: &Array2<f32>) -> Result<()> {
    let (h, w) = heatmap.dim();
    let data: Vec<f32> = heatmap.iter().copied().collect();
    let tensor = Tensor::from_vec(data, (h, w), &Device::Cpu)?;
    let tensors = HashMap::from([(TENSOR_KEY.to_string(), tensor)]);
    candle_core::safetensors::save(&tensors, path)?;
    Ok(())
}

fn read_tensor(path: &Path) -> Result<Array2<f32>> {
    if !path.exists() {
        return Err(Error::MissingResource {
            path: path.to_path_buf(),
        });
    }
    let tensors = candle_core::safetensors::load(path, &Device::Cpu)?;
    let tensor = tensors.get(TENSOR_KEY).ok_or_else(|| {
        Error::Tensor(format!(
            "no `{}` entry in {}",
            TENSOR_KEY,
            path.display()
        ))
    })?;
    let (h, w) = tensor.dims2()?;
    let data = tensor.flatten_all()?.to_vec1::<f32>()?;
    Array2::from_shape_vec((h, w), data)
        .map_err(|e| Error::Tensor(format!("heatmap shape mismatch: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = HeatmapStore::create(dir.path()).unwrap();

        let mut heatmap = Array2::zeros((8, 4));
        heatmap[[3, 2]] = 1.5;
        heatmap[[7, 0]] = 0.25;

        let path = store.save("0001_c1s1_001051_00.jpg", &heatmap).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "0001_c1s1_001051_00_heatmap.safetensors"
        );

        let loaded = store.load("0001_c1s1_001051_00.jpg").unwrap();
        assert_eq!(loaded, heatmap);
    }

    #[test]
    fn test_aggregate_round_trip() {
        let dir = tempdir().unwrap();
        let store = HeatmapStore::create(dir.path()).unwrap();

        let heatmap = Array2::from_elem((4, 4), 0.5);
        store.save_aggregate(&heatmap).unwrap();
        assert_eq!(store.load_aggregate().unwrap(), heatmap);
    }

    #[test]
    fn test_missing_heatmap_is_missing_resource() {
        let dir = tempdir().unwrap();
        let store = HeatmapStore::create(dir.path()).unwrap();
        let err = store.load("absent.jpg").unwrap_err();
        assert!(matches!(err, Error::MissingResource { .. }));
    }
}
