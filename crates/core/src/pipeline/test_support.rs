//! Stubs shared by pipeline tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::background::domain::background_filter::BackgroundFilter;
use crate::classification::domain::role_classifier::RoleAnnotation;
use crate::pose::domain::keypoint::Skeleton;
use crate::pose::domain::pose_estimator::PoseEstimator;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

pub fn metadata(width: u32, height: u32, total_frames: usize) -> VideoMetadata {
    VideoMetadata {
        width,
        height,
        fps: 25.0,
        total_frames,
        source_path: None,
    }
}

pub fn frames(count: usize) -> Vec<Frame> {
    (0..count).map(|i| Frame::blank(32, 32, i)).collect()
}

// ── pose ──

pub struct ScriptedPoseEstimator {
    default: Vec<Skeleton>,
    per_frame: HashMap<usize, Vec<Skeleton>>,
    fail: bool,
    /// First byte of every frame handed to `estimate`.
    pub seen_first_bytes: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedPoseEstimator {
    pub fn every_frame(skeletons: Vec<Skeleton>) -> Self {
        Self {
            default: skeletons,
            per_frame: HashMap::new(),
            fail: false,
            seen_first_bytes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_frame(mut self, index: usize, skeletons: Vec<Skeleton>) -> Self {
        self.per_frame.insert(index, skeletons);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::every_frame(Vec::new())
        }
    }
}

impl PoseEstimator for ScriptedPoseEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Vec<Skeleton>, Box<dyn std::error::Error>> {
        if self.fail {
            return Err("pose estimation failed".into());
        }
        if let Some(&first) = frame.data().first() {
            self.seen_first_bytes.lock().unwrap().push(first);
        }
        Ok(self
            .per_frame
            .get(&frame.index())
            .unwrap_or(&self.default)
            .clone())
    }
}

// ── annotation / background ──

pub struct RecordingAnnotator {
    pub calls: Arc<Mutex<Vec<Vec<RoleAnnotation>>>>,
}

impl RecordingAnnotator {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FrameAnnotator for RecordingAnnotator {
    fn annotate(
        &self,
        _frame: &mut Frame,
        annotations: &[RoleAnnotation],
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.calls.lock().unwrap().push(annotations.to_vec());
        Ok(())
    }
}

pub struct ZeroingBackgroundFilter;

impl BackgroundFilter for ZeroingBackgroundFilter {
    fn apply(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>> {
        frame.data_mut().fill(0);
        Ok(())
    }
}

// ── I/O ──

pub struct StubReader {
    frames: Vec<Frame>,
    fail_at: Option<usize>,
    pub closed: Arc<Mutex<bool>>,
}

impl StubReader {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            fail_at: None,
            closed: Arc::new(Mutex::new(false)),
        }
    }

    /// Yields an error in place of the frame at `position`.
    pub fn failing_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }
}

impl VideoReader for StubReader {
    fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        Ok(metadata(32, 32, self.frames.len()))
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let fail_at = self.fail_at;
        Box::new(
            self.frames
                .drain(..)
                .enumerate()
                .map(move |(i, f)| -> Result<Frame, Box<dyn std::error::Error>> {
                    if Some(i) == fail_at {
                        Err("decode error".into())
                    } else {
                        Ok(f)
                    }
                }),
        )
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() = true;
    }
}

pub struct StubWriter {
    pub written: Arc<Mutex<Vec<Frame>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl StubWriter {
    pub fn new() -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
        }
    }
}

impl VideoWriter for StubWriter {
    fn open(
        &mut self,
        _path: &Path,
        _metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.written.lock().unwrap().push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

pub struct StubImageWriter {
    pub written: Arc<Mutex<Vec<(std::path::PathBuf, Frame)>>>,
}

impl StubImageWriter {
    pub fn new() -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ImageWriter for StubImageWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), frame.clone()));
        Ok(())
    }
}
