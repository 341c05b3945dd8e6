use crate::shared::constants::{MULTI_PERSON_MAX_PEOPLE, SINGLE_PERSON_MAX_PEOPLE};
use crate::shared::frame::Frame;

use super::keypoint::Skeleton;

/// Domain interface for multi-person 2-D pose estimation.
///
/// Handles are built once by the caller and injected wherever skeletons are
/// needed; the classifier itself only ever sees the returned skeletons.
/// `&mut self` because adapters may keep per-stream state (open files,
/// sessions).
pub trait PoseEstimator: Send {
    fn estimate(&mut self, frame: &Frame) -> Result<Vec<Skeleton>, Box<dyn std::error::Error>>;
}

/// Settings shared by pose adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoseEstimatorConfig {
    /// Upper bound on people returned per frame. 0 means unlimited.
    pub max_people: usize,
}

impl PoseEstimatorConfig {
    pub fn multi_person() -> Self {
        Self {
            max_people: MULTI_PERSON_MAX_PEOPLE,
        }
    }

    pub fn single_person() -> Self {
        Self {
            max_people: SINGLE_PERSON_MAX_PEOPLE,
        }
    }

    /// Keeps the `max_people` most confident skeletons, preserving their
    /// relative order so downstream ordering stays that of the estimator.
    pub fn limit(&self, skeletons: Vec<Skeleton>) -> Vec<Skeleton> {
        if self.max_people == 0 || skeletons.len() <= self.max_people {
            return skeletons;
        }

        let mut ranked: Vec<usize> = (0..skeletons.len()).collect();
        // Stable sort: equal confidence keeps the earlier detection.
        ranked.sort_by(|&a, &b| {
            skeletons[b]
                .mean_confidence()
                .partial_cmp(&skeletons[a].mean_confidence())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut keep = vec![false; skeletons.len()];
        for &i in ranked.iter().take(self.max_people) {
            keep[i] = true;
        }

        skeletons
            .into_iter()
            .zip(keep)
            .filter_map(|(s, k)| k.then_some(s))
            .collect()
    }
}

impl Default for PoseEstimatorConfig {
    fn default() -> Self {
        Self::multi_person()
    }
}
