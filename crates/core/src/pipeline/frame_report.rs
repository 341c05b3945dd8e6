use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::classification::domain::bounding_box::BoundingBox;
use crate::classification::domain::goalpost::GoalpostRegion;
use crate::classification::domain::role_classifier::{Role, RoleAnnotation};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionReport {
    pub detection: u32,
    pub role: Role,
    pub bbox: BoundingBox,
}

impl From<&RoleAnnotation> for DetectionReport {
    fn from(annotation: &RoleAnnotation) -> Self {
        Self {
            detection: annotation.detection.0,
            role: annotation.role,
            bbox: annotation.bbox,
        }
    }
}

/// What happened to one frame: who got which role, or why nobody did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: usize,
    pub goalpost: GoalpostRegion,
    /// Skeletons returned by pose estimation.
    pub people: usize,
    /// Skeletons with every required body part detected.
    pub valid_people: usize,
    pub detections: Vec<DetectionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl FrameReport {
    pub fn is_classified(&self) -> bool {
        self.failure.is_none()
    }

    pub fn role_of(&self, detection: u32) -> Option<Role> {
        self.detections
            .iter()
            .find(|d| d.detection == detection)
            .map(|d| d.role)
    }
}

pub fn write_report(path: &Path, reports: &[FrameReport]) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(reports)?;
    std::fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Wrote report for {} frames to {}", reports.len(), path.display());
    Ok(())
}
