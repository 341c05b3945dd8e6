use crate::shared::frame::Frame;

/// Domain interface for suppressing everything that is not playing field
/// (crowd, advertising boards) before pose estimation.
///
/// Implementations modify the frame in-place.
pub trait BackgroundFilter: Send {
    fn apply(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>>;
}
