//! # repose-data
//!
//! Loading of same-identity image pairs for pose-guided transformation:
//! an externally supplied pair list resolves to image tensors plus
//! optional pose heatmap tensors, indexed per pair.

pub mod dataset;
pub mod pairs;

pub use dataset::{DatasetConfig, PairDataset, Sample};
pub use pairs::{read_pairs, ImagePair};
