use std::path::Path;

use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

use super::frame_processor::FrameProcessor;
use super::frame_report::FrameReport;

/// Single-image pipeline: read → classify → annotate → write.
pub struct AnnotateImageUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    processor: FrameProcessor,
}

impl AnnotateImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        processor: FrameProcessor,
    ) -> Self {
        Self {
            reader,
            image_writer,
            processor,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<FrameReport, Box<dyn std::error::Error>> {
        self.reader.open(input_path)?;
        let frame = self.reader.frames().next().ok_or("No frames in image")?;
        self.reader.close();
        let mut frame = frame?;

        let report = self.processor.process(&mut frame)?;
        match &report.failure {
            Some(reason) => log::warn!("{}: {reason}", input_path.display()),
            None => log::info!(
                "{}: classified {} people",
                input_path.display(),
                report.detections.len()
            ),
        }

        self.image_writer.write(output_path, &frame)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::fixtures::{facing, sideways};
    use crate::classification::domain::role_classifier::{Role, RoleClassifier};
    use crate::classification::infrastructure::fixed_goalpost_locator::FixedGoalpostLocator;
    use crate::pipeline::test_support::{
        frames, RecordingAnnotator, ScriptedPoseEstimator, StubImageWriter, StubReader,
    };
    use std::path::PathBuf;

    fn use_case(
        reader: StubReader,
        writer: StubImageWriter,
        pose: ScriptedPoseEstimator,
    ) -> AnnotateImageUseCase {
        let processor = FrameProcessor::new(
            Box::new(pose),
            Box::new(FixedGoalpostLocator::default()),
            Box::new(RecordingAnnotator::new()),
            RoleClassifier::default(),
        );
        AnnotateImageUseCase::new(Box::new(reader), Box::new(writer), processor)
    }

    #[test]
    fn test_classifies_and_writes_image() {
        let writer = StubImageWriter::new();
        let written = writer.written.clone();
        let pose = ScriptedPoseEstimator::every_frame(vec![
            sideways(0, (400.0, 400.0)),
            facing(1, 30.0, (300.0, 300.0)),
        ]);
        let mut use_case = use_case(StubReader::new(frames(1)), writer, pose);

        let report = use_case
            .execute(Path::new("in.png"), Path::new("out.png"))
            .unwrap();

        assert_eq!(report.role_of(0), Some(Role::Striker));
        assert_eq!(report.role_of(1), Some(Role::Referee));
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, PathBuf::from("out.png"));
    }

    #[test]
    fn test_unclassified_image_still_written() {
        let writer = StubImageWriter::new();
        let written = writer.written.clone();
        let mut use_case = use_case(
            StubReader::new(frames(1)),
            writer,
            ScriptedPoseEstimator::every_frame(Vec::new()),
        );

        let report = use_case
            .execute(Path::new("in.png"), Path::new("out.png"))
            .unwrap();
        assert!(!report.is_classified());
        assert_eq!(written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_source_fails() {
        let mut use_case = use_case(
            StubReader::new(Vec::new()),
            StubImageWriter::new(),
            ScriptedPoseEstimator::every_frame(Vec::new()),
        );
        assert!(use_case
            .execute(Path::new("in.png"), Path::new("out.png"))
            .is_err());
    }

    #[test]
    fn test_closes_reader() {
        let reader = StubReader::new(frames(1));
        let closed = reader.closed.clone();
        let mut use_case = use_case(
            reader,
            StubImageWriter::new(),
            ScriptedPoseEstimator::every_frame(Vec::new()),
        );
        use_case
            .execute(Path::new("in.png"), Path::new("out.png"))
            .unwrap();
        assert!(*closed.lock().unwrap());
    }
}
