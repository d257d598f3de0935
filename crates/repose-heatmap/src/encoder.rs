//! Keypoint-to-heatmap encoding.
//!
//! A heatmap summarizes where body landmarks were detected in one image:
//! every qualifying keypoint deposits a unit impulse at its integer pixel
//! location, impulses from all person instances accumulate, and the grid is
//! then smoothed with a fixed-sigma Gaussian.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use repose_core::{Error, GridSize, Result};

use crate::filter::GaussianFilter;
use crate::keypoints::PersonKeypoints;

/// Configuration for heatmap encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Heatmap resolution (height x width).
    pub grid: GridSize,
    /// Gaussian smoothing strength.
    pub sigma: f32,
    /// Keypoints at or below this confidence are ignored.
    pub confidence_threshold: f32,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::default(),
            sigma: 5.0,
            confidence_threshold: 0.3,
        }
    }
}

/// Encodes per-image keypoint detections into smoothed occupancy heatmaps.
pub struct HeatmapEncoder {
    config: HeatmapConfig,
    filter: GaussianFilter,
}

impl HeatmapEncoder {
    pub fn new(config: HeatmapConfig) -> Result<Self> {
        if config.grid.height == 0 || config.grid.width == 0 {
            return Err(Error::Config(format!(
                "heatmap grid must be non-empty, got {}x{}",
                config.grid.height, config.grid.width
            )));
        }
        if config.sigma <= 0.0 {
            return Err(Error::Config(format!(
                "gaussian sigma must be positive, got {}",
                config.sigma
            )));
        }
        let filter = GaussianFilter::new(config.sigma);
        Ok(Self { config, filter })
    }

    /// Encode one image's person detections into a heatmap.
    ///
    /// Keypoints at or below the confidence threshold and keypoints outside
    /// the grid are dropped silently; co-located qualifying keypoints
    /// accumulate. An image with no qualifying keypoints yields an all-zero
    /// map.
    pub fn encode(&self, persons: &[PersonKeypoints]) -> Array2<f32> {
        let grid = self.config.grid;
        let mut heatmap = Array2::zeros((grid.height, grid.width));
        for person in persons {
            for kp in person.keypoints() {
                if kp.confidence <= self.config.confidence_threshold {
                    continue;
                }
                let (x, y) = kp.pixel();
                if grid.contains(x, y) {
                    heatmap[[y as usize, x as usize]] += 1.0;
                }
            }
        }
        self.filter.apply(&heatmap)
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }
}

/// Running element-wise sum of per-image heatmaps.
///
/// The aggregate is the mean over every processed image, including images
/// whose heatmap is all zero. Partial accumulators from independent workers
/// can be combined with [`HeatmapAccumulator::merge`] before finalizing.
pub struct HeatmapAccumulator {
    sum: Array2<f32>,
    count: usize,
}

impl HeatmapAccumulator {
    pub fn new(grid: GridSize) -> Self {
        Self {
            sum: Array2::zeros((grid.height, grid.width)),
            count: 0,
        }
    }

    pub fn push(&mut self, heatmap: &Array2<f32>) {
        self.sum += heatmap;
        self.count += 1;
    }

    pub fn merge(&mut self, other: HeatmapAccumulator) {
        self.sum += &other.sum;
        self.count += other.count;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The dataset-wide mean heatmap.
    ///
    /// Fails with [`Error::EmptyInput`] when no heatmap was pushed, so an
    /// upstream failure cannot masquerade as an all-zero aggregate.
    pub fn finalize(self) -> Result<Array2<f32>> {
        if self.count == 0 {
            return Err(Error::EmptyInput);
        }
        Ok(self.sum / self.count as f32)
    }
}
