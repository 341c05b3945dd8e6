use std::path::PathBuf;

/// Stream properties handed from a reader to the matching writer.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Metadata for a single still image, treated as a one-frame video.
    pub fn still(width: u32, height: u32, source_path: Option<PathBuf>) -> Self {
        Self {
            width,
            height,
            fps: 0.0,
            total_frames: 1,
            source_path,
        }
    }

    pub fn is_still(&self) -> bool {
        self.total_frames == 1 && self.fps == 0.0
    }
}
