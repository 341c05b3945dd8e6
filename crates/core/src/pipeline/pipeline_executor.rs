use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_processor::FrameProcessor;
use super::frame_report::FrameReport;
use super::pipeline_logger::PipelineLogger;

/// Per-run knobs handed to an executor.
pub struct PipelineConfig {
    /// Called after every written frame with `(done, total)`; returning
    /// `false` cancels the run.
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Drives read → process → write over a whole video.
///
/// Returns one report per processed frame, in frame order.
pub trait PipelineExecutor: Send {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        processor: &mut FrameProcessor,
        metadata: &VideoMetadata,
        output_path: &Path,
        logger: &mut dyn PipelineLogger,
        config: PipelineConfig,
    ) -> Result<Vec<FrameReport>, Box<dyn std::error::Error>>;
}
