use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_processor::FrameProcessor;
use super::frame_report::FrameReport;
use super::pipeline_executor::{PipelineConfig, PipelineExecutor};
use super::pipeline_logger::PipelineLogger;

/// Classifies and annotates every sampled frame of a video.
///
/// Single-use: `execute` hands the reader and writer to the executor, so a
/// second call fails.
pub struct AnnotateVideoUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    processor: FrameProcessor,
    executor: Box<dyn PipelineExecutor>,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl AnnotateVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        processor: FrameProcessor,
        executor: Box<dyn PipelineExecutor>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            processor,
            executor,
            logger,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_progress(mut self, on_progress: Box<dyn Fn(usize, usize) -> bool + Send>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancellation(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// `metadata` comes from the reader, which the caller has already opened.
    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<Vec<FrameReport>, Box<dyn std::error::Error>> {
        let reader = self.reader.take().ok_or("Pipeline already executed")?;
        let writer = self.writer.take().ok_or("Pipeline already executed")?;
        let config = PipelineConfig {
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };

        self.logger.info(&format!(
            "Annotating {} frames at {}x{}",
            metadata.total_frames, metadata.width, metadata.height
        ));
        let reports = self.executor.execute(
            reader,
            writer,
            &mut self.processor,
            metadata,
            output_path,
            self.logger.as_mut(),
            config,
        )?;

        let classified = reports.iter().filter(|r| r.is_classified()).count();
        self.logger.info(&format!(
            "Classified {classified} of {} frames",
            reports.len()
        ));
        self.logger.summary();
        Ok(reports)
    }
}
