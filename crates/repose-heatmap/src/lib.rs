//! # repose-heatmap
//!
//! Turns raw body-keypoint detections into smoothed spatial heatmaps used
//! to condition the pose-transformation generator.
//!
//! The pipeline: a keypoint source file maps each image to per-person
//! `(x, y, confidence)` arrays; [`HeatmapEncoder`] accumulates unit
//! impulses at qualifying keypoint locations and smooths the grid with a
//! fixed-sigma Gaussian; [`encode_dataset`] persists one heatmap per image
//! plus the dataset-wide mean through a [`HeatmapStore`].

pub mod encoder;
pub mod filter;
pub mod keypoints;
pub mod pipeline;
pub mod store;

pub use encoder::{HeatmapAccumulator, HeatmapConfig, HeatmapEncoder};
pub use filter::GaussianFilter;
pub use keypoints::{KeypointFile, PersonKeypoints};
pub use pipeline::encode_dataset;
pub use store::{HeatmapStore, AGGREGATE_FILENAME, HEATMAP_SUFFIX};
