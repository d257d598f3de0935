//! Same-identity pair dataset.
//!
//! Resolves `(source, target)` filename pairs into loaded tensors: images
//! are normalized to `[-1, 1]` at the fixed working resolution, pose
//! heatmaps (when a pose directory is configured and the file exists) load
//! as single-channel tensors in `[0, 1]`. Loading is a pure function of the
//! referenced files, so repeated access to the same index is bit-identical.

use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use repose_core::{image_stem, Error, GridSize, Result};

use crate::pairs::{read_pairs, ImagePair};

/// Dataset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Directory holding the person images.
    pub img_dir: PathBuf,
    /// Directory holding pose heatmap images; `None` disables pose loading.
    pub pose_dir: Option<PathBuf>,
    /// Working resolution images are resized to.
    pub image_size: GridSize,
    /// Appended to the image's base filename to derive its pose-map path.
    pub pose_suffix: String,
}

impl DatasetConfig {
    pub fn new<P: Into<PathBuf>>(img_dir: P) -> Self {
        Self {
            img_dir: img_dir.into(),
            pose_dir: None,
            image_size: GridSize::default(),
            pose_suffix: ".png".to_string(),
        }
    }

    pub fn with_pose_dir<P: Into<PathBuf>>(mut self, pose_dir: P) -> Self {
        self.pose_dir = Some(pose_dir.into());
        self
    }
}

/// One loaded pair: image tensors, optional pose tensors, and the original
/// filenames for traceability.
///
/// Pose fields are `None` when no pose directory is configured or the pose
/// file is absent; consumers decide whether that is fatal.
#[derive(Debug, Clone)]
pub struct Sample {
    pub src_img: Tensor,
    pub tgt_img: Tensor,
    pub src_pose: Option<Tensor>,
    pub tgt_pose: Option<Tensor>,
    pub src_name: String,
    pub tgt_name: String,
}

/// Indexed access to same-identity image pairs.
pub struct PairDataset {
    config: DatasetConfig,
    pairs: Vec<ImagePair>,
    device: Device,
}

impl PairDataset {
    /// Open the dataset over the pair list at `pairs_path`.
    pub fn open(pairs_path: &Path, config: DatasetConfig, device: &Device) -> Result<Self> {
        let pairs = read_pairs(pairs_path)?;
        Ok(Self::from_pairs(pairs, config, device))
    }

    /// Build the dataset from an already-parsed pair list.
    pub fn from_pairs(pairs: Vec<ImagePair>, config: DatasetConfig, device: &Device) -> Self {
        Self {
            config,
            pairs,
            device: device.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[ImagePair] {
        &self.pairs
    }

    /// Load the sample for pair index `index`.
    pub fn get(&self, index: usize) -> Result<Sample> {
        let pair = self.pairs.get(index).ok_or_else(|| {
            Error::Config(format!(
                "pair index {index} out of range ({} pairs)",
                self.pairs.len()
            ))
        })?;

        let src_img = self.load_image(&pair.source)?;
        let tgt_img = self.load_image(&pair.target)?;
        let src_pose = self.load_pose(&pair.source)?;
        let tgt_pose = self.load_pose(&pair.target)?;

        Ok(Sample {
            src_img,
            tgt_img,
            src_pose,
            tgt_pose,
            src_name: pair.source.clone(),
            tgt_name: pair.target.clone(),
        })
    }

    /// Load an image as a `(3, H, W)` tensor normalized to `[-1, 1]`.
    fn load_image(&self, name: &str) -> Result<Tensor> {
        let path = self.config.img_dir.join(name);
        if !path.exists() {
            return Err(Error::MissingResource { path });
        }
        let size = self.config.image_size;
        let img = image::open(&path)?
            .resize_exact(size.width as u32, size.height as u32, FilterType::Triangle)
            .to_rgb8();

        let (h, w) = (size.height, size.width);
        let mut data = vec![0f32; 3 * h * w];
        for (x, y, pixel) in img.enumerate_pixels() {
            let idx = y as usize * w + x as usize;
            data[idx] = pixel[0] as f32 / 255.0;
            data[h * w + idx] = pixel[1] as f32 / 255.0;
            data[2 * h * w + idx] = pixel[2] as f32 / 255.0;
        }
        let tensor = Tensor::from_vec(data, (3, h, w), &self.device)?;
        // (x - 0.5) / 0.5 per channel
        Ok(tensor.affine(2.0, -1.0)?)
    }

    /// Load the pose map derived from `name`, or `None` when it is absent.
    ///
    /// Pose maps stay single-channel in `[0, 1]` at their native resolution;
    /// the image color normalization does not apply.
    fn load_pose(&self, name: &str) -> Result<Option<Tensor>> {
        let Some(pose_dir) = &self.config.pose_dir else {
            return Ok(None);
        };
        let path = pose_dir.join(format!("{}{}", image_stem(name), self.config.pose_suffix));
        if !path.exists() {
            debug!(image = %name, path = %path.display(), "pose map absent, field omitted");
            return Ok(None);
        }
        let pose = image::open(&path)?.to_luma8();
        let (w, h) = pose.dimensions();
        let data: Vec<f32> = pose.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        let tensor = Tensor::from_vec(data, (1, h as usize, w as usize), &self.device)?;
        Ok(Some(tensor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        img_dir: PathBuf,
        pose_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let img_dir = dir.path().join("images");
        let pose_dir = dir.path().join("poses");
        std::fs::create_dir_all(&img_dir).unwrap();
        std::fs::create_dir_all(&pose_dir).unwrap();
        Fixture {
            _dir: dir,
            img_dir,
            pose_dir,
        }
    }

    fn write_image(dir: &Path, name: &str, color: [u8; 3]) {
        let mut img = RgbImage::new(16, 32);
        for pixel in img.pixels_mut() {
            *pixel = Rgb(color);
        }
        img.save(dir.join(name)).unwrap();
    }

    fn write_pose(dir: &Path, name: &str) {
        let mut pose = GrayImage::new(128, 256);
        pose.put_pixel(64, 128, Luma([255]));
        pose.save(dir.join(name)).unwrap();
    }

    fn dataset(fx: &Fixture, rows: &[(&str, &str)]) -> PairDataset {
        let pairs = rows
            .iter()
            .map(|(s, t)| ImagePair {
                source: s.to_string(),
                target: t.to_string(),
            })
            .collect();
        let config = DatasetConfig::new(&fx.img_dir).with_pose_dir(&fx.pose_dir);
        PairDataset::from_pairs(pairs, config, &Device::Cpu)
    }

    #[test]
    fn test_sample_shapes_and_range() {
        let fx = fixture();
        write_image(&fx.img_dir, "a.jpg", [255, 0, 128]);
        write_image(&fx.img_dir, "b.jpg", [0, 255, 0]);
        write_pose(&fx.pose_dir, "a.png");
        write_pose(&fx.pose_dir, "b.png");

        let ds = dataset(&fx, &[("a.jpg", "b.jpg")]);
        assert_eq!(ds.len(), 1);

        let sample = ds.get(0).unwrap();
        assert_eq!(sample.src_img.dims(), &[3, 256, 128]);
        assert_eq!(sample.tgt_img.dims(), &[3, 256, 128]);
        assert_eq!(sample.src_name, "a.jpg");
        assert_eq!(sample.tgt_name, "b.jpg");

        let values = sample.src_img.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert!(values.iter().all(|&v| (-1.0..=1.0).contains(&v)));

        let pose = sample.src_pose.unwrap();
        assert_eq!(pose.dims(), &[1, 256, 128]);
        let pose_values = pose.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert!(pose_values.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(pose_values.iter().any(|&v| v > 0.99));
    }

    #[test]
    fn test_repeated_access_is_bit_identical() {
        let fx = fixture();
        write_image(&fx.img_dir, "a.jpg", [10, 200, 30]);
        write_image(&fx.img_dir, "b.jpg", [99, 1, 250]);

        let ds = dataset(&fx, &[("a.jpg", "b.jpg")]);
        let first = ds.get(0).unwrap();
        let second = ds.get(0).unwrap();

        let a = first.src_img.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        let b = second.src_img.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_absent_pose_is_omitted_not_an_error() {
        let fx = fixture();
        write_image(&fx.img_dir, "a.jpg", [1, 2, 3]);
        write_image(&fx.img_dir, "b.jpg", [4, 5, 6]);
        write_pose(&fx.pose_dir, "a.png");

        let ds = dataset(&fx, &[("a.jpg", "b.jpg")]);
        let sample = ds.get(0).unwrap();
        assert!(sample.src_pose.is_some());
        assert!(sample.tgt_pose.is_none());
    }

    #[test]
    fn test_no_pose_dir_disables_pose_loading() {
        let fx = fixture();
        write_image(&fx.img_dir, "a.jpg", [1, 2, 3]);
        write_image(&fx.img_dir, "b.jpg", [4, 5, 6]);

        let pairs = vec![ImagePair {
            source: "a.jpg".to_string(),
            target: "b.jpg".to_string(),
        }];
        let ds = PairDataset::from_pairs(pairs, DatasetConfig::new(&fx.img_dir), &Device::Cpu);
        let sample = ds.get(0).unwrap();
        assert!(sample.src_pose.is_none());
        assert!(sample.tgt_pose.is_none());
    }

    #[test]
    fn test_missing_image_reports_path() {
        let fx = fixture();
        write_image(&fx.img_dir, "a.jpg", [1, 2, 3]);

        let ds = dataset(&fx, &[("a.jpg", "gone.jpg")]);
        match ds.get(0).unwrap_err() {
            Error::MissingResource { path } => {
                assert!(path.ends_with("gone.jpg"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_index() {
        let fx = fixture();
        let ds = dataset(&fx, &[]);
        assert!(ds.is_empty());
        assert!(matches!(ds.get(0), Err(Error::Config(_))));
    }
}
