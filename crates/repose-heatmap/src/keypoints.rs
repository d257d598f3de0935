//! Keypoint source file parsing.
//!
//! The external pose estimator emits a JSON mapping from image filename to
//! the keypoint arrays of every person detected in that image. Depending on
//! how the detector batched its output, a person entry is either a flat
//! `[n_keypoints, 3]` array or carries a singleton batch level
//! `[1, n_keypoints, 3]`; both shapes are accepted and normalized here.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use repose_core::{Error, Keypoint, Result};

/// Keypoints of one detected person instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PersonKeypoints {
    /// `[n_keypoints, 3]` rows of (x, y, confidence).
    Flat(Vec<[f32; 3]>),
    /// `[1, n_keypoints, 3]`, a singleton detection batch.
    Batched(Vec<Vec<[f32; 3]>>),
}

impl PersonKeypoints {
    /// The person's keypoints with any singleton batch level removed.
    pub fn keypoints(&self) -> Vec<Keypoint> {
        match self {
            PersonKeypoints::Flat(rows) => rows.iter().copied().map(Keypoint::from).collect(),
            PersonKeypoints::Batched(batch) => batch
                .first()
                .map(|rows| rows.iter().copied().map(Keypoint::from).collect())
                .unwrap_or_default(),
        }
    }
}

/// Parsed keypoint source file: image filename -> per-person keypoint arrays.
///
/// Entries iterate in filename order so a full dataset pass is deterministic.
#[derive(Debug, Clone, Deserialize)]
pub struct KeypointFile(pub BTreeMap<String, Vec<PersonKeypoints>>);

impl KeypointFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingResource {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<PersonKeypoints>)> {
        self.0.iter()
    }
}
