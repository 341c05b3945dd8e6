use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::frame_processor::FrameProcessor;
use crate::pipeline::frame_report::FrameReport;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;
type BoxError = Box<dyn std::error::Error>;

/// Overlaps decoding and encoding with classification.
///
/// Layout: `reader thread → caller thread [process] → writer thread`, joined
/// by bounded channels so a slow stage applies back-pressure.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        processor: &mut FrameProcessor,
        metadata: &VideoMetadata,
        output_path: &Path,
        logger: &mut dyn PipelineLogger,
        config: PipelineConfig,
    ) -> Result<Vec<FrameReport>, BoxError> {
        writer.open(output_path, metadata)?;

        let (frame_tx, frame_rx) =
            crossbeam_channel::bounded::<Result<Frame, SendError>>(self.channel_capacity);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<Frame>(self.channel_capacity);

        let reader_handle = spawn_reader(reader, frame_tx, config.cancelled.clone());
        let writer_handle = spawn_writer(writer, write_rx);

        let mut reports = Vec::new();
        let main_error = process_frames(
            frame_rx,
            &write_tx,
            processor,
            metadata.total_frames,
            logger,
            &config,
            &mut reports,
        )
        .err();
        drop(write_tx);

        join_threads(reader_handle, writer_handle, main_error)?;
        Ok(reports)
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    frame_tx: Sender<Result<Frame, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<Box<dyn VideoReader>> {
    std::thread::spawn(move || {
        for frame in reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let frame = frame.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(frame).is_err() {
                break;
            }
        }
        reader
    })
}

fn spawn_writer(
    mut writer: Box<dyn VideoWriter>,
    write_rx: Receiver<Frame>,
) -> JoinHandle<Result<Box<dyn VideoWriter>, SendError>> {
    std::thread::spawn(move || {
        for frame in write_rx {
            writer
                .write(&frame)
                .map_err(|e| -> SendError { e.to_string().into() })?;
        }
        Ok(writer)
    })
}

/// Consumes decoded frames on the caller thread. Every frame is written,
/// classified or not.
fn process_frames(
    frame_rx: Receiver<Result<Frame, SendError>>,
    write_tx: &Sender<Frame>,
    processor: &mut FrameProcessor,
    total_frames: usize,
    logger: &mut dyn PipelineLogger,
    config: &PipelineConfig,
    reports: &mut Vec<FrameReport>,
) -> Result<(), BoxError> {
    for decoded in frame_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            break;
        }
        let mut frame = decoded.map_err(|e| -> BoxError { e.to_string().into() })?;

        let report = processor.process_logged(&mut frame, logger)?;
        reports.push(report);

        write_tx
            .send(frame)
            .map_err(|_| "Writer channel closed unexpectedly")?;

        let done = reports.len();
        logger.progress(done, total_frames);
        if let Some(callback) = &config.on_progress {
            if !callback(done, total_frames) {
                config.cancelled.store(true, Ordering::Relaxed);
                return Err("Cancelled".into());
            }
        }
    }
    Ok(())
}

/// Joins both I/O threads and keeps the first error seen.
fn join_threads(
    reader_handle: JoinHandle<Box<dyn VideoReader>>,
    writer_handle: JoinHandle<Result<Box<dyn VideoWriter>, SendError>>,
    mut first_error: Option<BoxError>,
) -> Result<(), BoxError> {
    fn keep_first(slot: &mut Option<BoxError>, err: BoxError) {
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    match reader_handle.join() {
        Ok(mut reader) => reader.close(),
        Err(_) => keep_first(&mut first_error, "Reader thread panicked".into()),
    }

    match writer_handle.join() {
        Ok(Ok(mut writer)) => {
            if let Err(e) = writer.close() {
                keep_first(&mut first_error, e);
            }
        }
        Ok(Err(e)) => keep_first(&mut first_error, e.to_string().into()),
        Err(_) => keep_first(&mut first_error, "Writer thread panicked".into()),
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
