//! # repose-infer
//!
//! Batched inference orchestration: iterates a pair dataset in order,
//! synthesizes each batch with the pose-conditioned generator, and writes
//! one comparison grid per batch for visual inspection.

pub mod engine;
pub mod visualizer;

pub use engine::{DeviceType, InferenceConfig, InferenceEngine, RunSummary};
pub use visualizer::save_comparison_grid;
