use thiserror::Error;

/// Reasons a frame cannot be given a striker.
///
/// Both are per-frame outcomes; what to do with the frame (skip it, emit it
/// unannotated) is decided by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("no fully detected person to classify")]
    NoDetections,
    #[error("no striker candidate within the cutoff of {cutoff}")]
    NoStrikerWithinCutoff { cutoff: f64 },
}
