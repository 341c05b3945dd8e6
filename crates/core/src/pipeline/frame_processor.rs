use std::time::Instant;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::background::domain::background_filter::BackgroundFilter;
use crate::classification::domain::goalpost::GoalpostLocator;
use crate::classification::domain::role_classifier::RoleClassifier;
use crate::classification::domain::validity_filter::filter_valid;
use crate::pose::domain::pose_estimator::PoseEstimator;
use crate::shared::frame::Frame;

use super::frame_report::{DetectionReport, FrameReport};
use super::pipeline_logger::{
    NullPipelineLogger, PipelineLogger, METRIC_PEOPLE, METRIC_VALID_PEOPLE, STAGE_ANNOTATE,
    STAGE_CLASSIFY, STAGE_MASK, STAGE_POSE,
};

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Runs one frame through masking, pose estimation, classification and
/// annotation.
///
/// The background mask only feeds pose estimation; boxes are drawn on the
/// untouched frame. A frame nobody could be classified in is left as is and
/// the reason goes into its report.
pub struct FrameProcessor {
    pose: Box<dyn PoseEstimator>,
    goalpost: Box<dyn GoalpostLocator>,
    annotator: Box<dyn FrameAnnotator>,
    background: Option<Box<dyn BackgroundFilter>>,
    classifier: RoleClassifier,
    detect_goalkeeper: bool,
}

impl FrameProcessor {
    pub fn new(
        pose: Box<dyn PoseEstimator>,
        goalpost: Box<dyn GoalpostLocator>,
        annotator: Box<dyn FrameAnnotator>,
        classifier: RoleClassifier,
    ) -> Self {
        Self {
            pose,
            goalpost,
            annotator,
            background: None,
            classifier,
            detect_goalkeeper: true,
        }
    }

    /// With detection off, everyone but the striker is a referee.
    pub fn with_goalkeeper_detection(mut self, enabled: bool) -> Self {
        self.detect_goalkeeper = enabled;
        self
    }

    pub fn with_background_filter(mut self, filter: Box<dyn BackgroundFilter>) -> Self {
        self.background = Some(filter);
        self
    }

    pub fn process(&mut self, frame: &mut Frame) -> Result<FrameReport, Box<dyn std::error::Error>> {
        self.process_logged(frame, &mut NullPipelineLogger)
    }

    pub fn process_logged(
        &mut self,
        frame: &mut Frame,
        logger: &mut dyn PipelineLogger,
    ) -> Result<FrameReport, Box<dyn std::error::Error>> {
        let skeletons = match &self.background {
            Some(filter) => {
                let start = Instant::now();
                let mut masked = frame.clone();
                filter.apply(&mut masked)?;
                logger.timing(STAGE_MASK, elapsed_ms(start));

                let start = Instant::now();
                let skeletons = self.pose.estimate(&masked)?;
                logger.timing(STAGE_POSE, elapsed_ms(start));
                skeletons
            }
            None => {
                let start = Instant::now();
                let skeletons = self.pose.estimate(frame)?;
                logger.timing(STAGE_POSE, elapsed_ms(start));
                skeletons
            }
        };

        let start = Instant::now();
        let goalpost = self.goalpost.locate(frame);
        let valid_people = filter_valid(&skeletons).len();
        let outcome = self
            .classifier
            .classify(&skeletons, &goalpost, self.detect_goalkeeper);
        logger.timing(STAGE_CLASSIFY, elapsed_ms(start));
        logger.metric(METRIC_PEOPLE, skeletons.len() as f64);
        logger.metric(METRIC_VALID_PEOPLE, valid_people as f64);

        let mut report = FrameReport {
            frame_index: frame.index(),
            goalpost,
            people: skeletons.len(),
            valid_people,
            detections: Vec::new(),
            failure: None,
        };

        match outcome {
            Ok(classification) => {
                let annotations = classification.annotations(self.classifier.calculator());
                let start = Instant::now();
                self.annotator.annotate(frame, &annotations)?;
                logger.timing(STAGE_ANNOTATE, elapsed_ms(start));
                report.detections = annotations.iter().map(DetectionReport::from).collect();
            }
            Err(e) => {
                log::debug!("Frame {} left unannotated: {e}", frame.index());
                report.failure = Some(e.to_string());
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::fixtures::{facing, sideways};
    use crate::classification::domain::role_classifier::Role;
    use crate::classification::infrastructure::fixed_goalpost_locator::FixedGoalpostLocator;
    use crate::pipeline::test_support::{
        RecordingAnnotator, ScriptedPoseEstimator, ZeroingBackgroundFilter,
    };
    use crate::pipeline::pipeline_logger::StdoutPipelineLogger;

    fn processor(pose: ScriptedPoseEstimator, annotator: RecordingAnnotator) -> FrameProcessor {
        FrameProcessor::new(
            Box::new(pose),
            Box::new(FixedGoalpostLocator::default()),
            Box::new(annotator),
            RoleClassifier::default(),
        )
    }

    fn scene() -> Vec<crate::pose::domain::keypoint::Skeleton> {
        vec![
            facing(0, 30.0, (300.0, 300.0)),
            facing(1, 40.0, (800.0, 300.0)),
            sideways(2, (400.0, 400.0)),
        ]
    }

    #[test]
    fn test_classified_frame_is_annotated_and_reported() {
        let annotator = RecordingAnnotator::new();
        let calls = annotator.calls.clone();
        let mut processor = processor(ScriptedPoseEstimator::every_frame(scene()), annotator);

        let mut frame = Frame::blank(64, 64, 7);
        let report = processor.process(&mut frame).unwrap();

        assert_eq!(report.frame_index, 7);
        assert_eq!((report.people, report.valid_people), (3, 3));
        assert!(report.is_classified());
        assert_eq!(report.role_of(2), Some(Role::Striker));
        assert_eq!(report.role_of(1), Some(Role::Goalkeeper));
        assert_eq!(report.role_of(0), Some(Role::Referee));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 3);
    }

    #[test]
    fn test_empty_frame_left_unannotated() {
        let annotator = RecordingAnnotator::new();
        let calls = annotator.calls.clone();
        let mut processor = processor(ScriptedPoseEstimator::every_frame(Vec::new()), annotator);

        let mut frame = Frame::blank(16, 16, 0);
        let report = processor.process(&mut frame).unwrap();

        assert!(!report.is_classified());
        assert!(report.detections.is_empty());
        assert_eq!(
            report.failure.as_deref(),
            Some("no fully detected person to classify")
        );
        assert!(calls.lock().unwrap().is_empty());
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_goalkeeper_detection_can_be_disabled() {
        let mut processor = processor(
            ScriptedPoseEstimator::every_frame(scene()),
            RecordingAnnotator::new(),
        )
        .with_goalkeeper_detection(false);
        let report = processor.process(&mut Frame::blank(8, 8, 0)).unwrap();
        assert_eq!(report.role_of(2), Some(Role::Striker));
        assert_eq!(report.role_of(1), Some(Role::Referee));
        assert!(report.detections.iter().all(|d| d.role != Role::Goalkeeper));
    }

    #[test]
    fn test_mask_feeds_pose_but_not_output() {
        let pose = ScriptedPoseEstimator::every_frame(scene());
        let seen = pose.seen_first_bytes.clone();
        let mut processor = processor(pose, RecordingAnnotator::new())
            .with_background_filter(Box::new(ZeroingBackgroundFilter));

        let mut frame = Frame::new(vec![200; 4 * 4 * 3], 4, 4, 3, 0);
        processor.process(&mut frame).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0]);
        assert!(frame.data().iter().all(|&v| v == 200));
    }

    #[test]
    fn test_stage_timings_and_metrics_logged() {
        let mut processor = processor(
            ScriptedPoseEstimator::every_frame(scene()),
            RecordingAnnotator::new(),
        )
        .with_background_filter(Box::new(ZeroingBackgroundFilter));
        let mut logger = StdoutPipelineLogger::new(10);

        processor
            .process_logged(&mut Frame::blank(8, 8, 0), &mut logger)
            .unwrap();

        for stage in [STAGE_MASK, STAGE_POSE, STAGE_CLASSIFY, STAGE_ANNOTATE] {
            assert_eq!(logger.timing_series(stage).map(|s| s.count), Some(1), "{stage}");
        }
        assert_eq!(logger.metric_series(METRIC_PEOPLE).unwrap().total, 3.0);
        assert_eq!(logger.metric_series(METRIC_VALID_PEOPLE).unwrap().total, 3.0);
    }

    #[test]
    fn test_pose_error_propagates() {
        let mut processor = processor(ScriptedPoseEstimator::failing(), RecordingAnnotator::new());
        assert!(processor.process(&mut Frame::blank(8, 8, 0)).is_err());
    }
}
