use crate::classification::domain::role_classifier::RoleAnnotation;
use crate::shared::frame::Frame;

/// Domain interface for drawing classified roles onto a frame.
///
/// Implementations modify the frame in-place.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        annotations: &[RoleAnnotation],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
