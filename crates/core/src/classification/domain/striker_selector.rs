use crate::pose::domain::keypoint::{BodyPart, Skeleton};
use crate::shared::constants::{DEFAULT_MAX_GOAL_DISTANCE, DEFAULT_MAX_HIP_WIDTH};

use super::bounding_box::BoundingBoxCalculator;
use super::classification_error::ClassificationError;
use super::goalpost::GoalpostRegion;

/// True when the neck is not strictly between the two hips horizontally,
/// i.e. the body is turned side-on to the camera.
pub fn is_sideways(skeleton: &Skeleton) -> bool {
    let neck = skeleton.keypoint(BodyPart::Neck).x;
    let left = skeleton.keypoint(BodyPart::LHip).x;
    let right = skeleton.keypoint(BodyPart::RHip).x;
    let (lo, hi) = (left.min(right), left.max(right));
    !(lo < neck && neck < hi)
}

pub fn hip_width(skeleton: &Skeleton) -> f64 {
    (skeleton.keypoint(BodyPart::LHip).x - skeleton.keypoint(BodyPart::RHip).x).abs()
}

/// Picks the striker out of the non-goalkeeper candidates.
///
/// The kicker is usually the only person turned sideways during the run-up:
/// - nobody sideways: the narrowest hip span wins;
/// - exactly one sideways: that one;
/// - several sideways: the one nearest the goal centre.
#[derive(Clone, Copy, Debug)]
pub struct StrikerSelector {
    calculator: BoundingBoxCalculator,
    max_goal_distance: f64,
    max_hip_width: f64,
}

impl StrikerSelector {
    pub fn new(calculator: BoundingBoxCalculator, max_goal_distance: f64, max_hip_width: f64) -> Self {
        Self {
            calculator,
            max_goal_distance,
            max_hip_width,
        }
    }

    pub fn select(
        &self,
        skeletons: &[Skeleton],
        goalpost: &GoalpostRegion,
    ) -> Result<Skeleton, ClassificationError> {
        if skeletons.is_empty() {
            return Err(ClassificationError::NoDetections);
        }

        let sideways: Vec<&Skeleton> = skeletons.iter().filter(|s| is_sideways(s)).collect();
        log::debug!(
            "Striker search: {} candidates, {} sideways",
            skeletons.len(),
            sideways.len()
        );

        match sideways.as_slice() {
            [] => self.narrowest_hips(skeletons),
            [only] => Ok((*only).clone()),
            many => self.nearest_to_goal(many, goalpost),
        }
    }

    fn narrowest_hips(&self, skeletons: &[Skeleton]) -> Result<Skeleton, ClassificationError> {
        let mut best: Option<&Skeleton> = None;
        let mut best_width = self.max_hip_width;

        for skeleton in skeletons {
            let width = hip_width(skeleton);
            log::trace!("Hip width of {:?}: {width:.1}", skeleton.id());
            if width < best_width {
                best_width = width;
                best = Some(skeleton);
            }
        }

        best.cloned().ok_or(ClassificationError::NoStrikerWithinCutoff {
            cutoff: self.max_hip_width,
        })
    }

    fn nearest_to_goal(
        &self,
        candidates: &[&Skeleton],
        goalpost: &GoalpostRegion,
    ) -> Result<Skeleton, ClassificationError> {
        let mut best: Option<&Skeleton> = None;
        let mut best_distance = self.max_goal_distance;

        for &skeleton in candidates {
            let midpoint = self.calculator.bound_skeleton(skeleton).midpoint();
            let distance = goalpost.distance_to_center(midpoint);
            log::trace!(
                "Sideways candidate {:?}: midpoint {midpoint:?}, distance {distance:.1}",
                skeleton.id()
            );
            if distance < best_distance {
                best_distance = distance;
                best = Some(skeleton);
            }
        }

        best.cloned().ok_or(ClassificationError::NoStrikerWithinCutoff {
            cutoff: self.max_goal_distance,
        })
    }
}

impl Default for StrikerSelector {
    fn default() -> Self {
        Self::new(
            BoundingBoxCalculator::default(),
            DEFAULT_MAX_GOAL_DISTANCE,
            DEFAULT_MAX_HIP_WIDTH,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::fixtures::{facing, person, sideways};
    use crate::pose::domain::keypoint::DetectionId;
    use rstest::rstest;

    fn goal() -> GoalpostRegion {
        GoalpostRegion::new(720.0, 240.0, 1120.0, 520.0)
    }

    fn picked(result: Result<Skeleton, ClassificationError>) -> u32 {
        result.map(|s| s.id().0).unwrap_or(u32::MAX)
    }

    // ── is_sideways ──

    #[rstest]
    #[case::centred(120.0, 100.0, 140.0, false)]
    #[case::centred_mirrored(120.0, 140.0, 100.0, false)]
    #[case::left_of_hips(90.0, 100.0, 140.0, true)]
    #[case::right_of_hips(150.0, 140.0, 100.0, true)]
    #[case::on_left_hip(100.0, 100.0, 140.0, true)]
    #[case::on_right_hip(140.0, 100.0, 140.0, true)]
    #[case::collapsed_hips(100.0, 100.0, 100.0, true)]
    fn test_is_sideways(
        #[case] neck: f64,
        #[case] lhip: f64,
        #[case] rhip: f64,
        #[case] expected: bool,
    ) {
        let skeleton = person(0, neck, lhip, rhip, (300.0, 300.0));
        assert_eq!(is_sideways(&skeleton), expected);
    }

    // ── branches ──

    #[test]
    fn test_empty_input_is_no_detections() {
        let result = StrikerSelector::default().select(&[], &goal());
        assert_eq!(result, Err(ClassificationError::NoDetections));
    }

    #[test]
    fn test_narrowest_hips_when_nobody_sideways() {
        let candidates = vec![
            facing(0, 40.0, (300.0, 300.0)),
            facing(1, 12.0, (300.0, 300.0)),
            facing(2, 25.0, (300.0, 300.0)),
        ];
        assert_eq!(picked(StrikerSelector::default().select(&candidates, &goal())), 1);
    }

    #[test]
    fn test_single_sideways_wins_regardless_of_hips() {
        let candidates = vec![
            facing(0, 4.0, (300.0, 300.0)),
            person(1, 50.0, 100.0, 400.0, (500.0, 500.0)),
            facing(2, 2.0, (300.0, 300.0)),
        ];
        assert_eq!(picked(StrikerSelector::default().select(&candidates, &goal())), 1);
    }

    #[test]
    fn test_single_sideways_ignores_cutoffs() {
        let selector = StrikerSelector::new(BoundingBoxCalculator::default(), 0.0, 0.0);
        let candidates = vec![sideways(3, (900.0, 900.0))];
        assert_eq!(picked(selector.select(&candidates, &goal())), 3);
    }

    #[test]
    fn test_several_sideways_nearest_goal_centre_wins() {
        // Goal centre (200, 140).
        let candidates = vec![
            sideways(0, (400.0, 400.0)),
            facing(1, 10.0, (200.0, 140.0)),
            sideways(2, (210.0, 150.0)),
        ];
        assert_eq!(picked(StrikerSelector::default().select(&candidates, &goal())), 2);
    }

    #[test]
    fn test_sideways_tie_first_wins() {
        let candidates = vec![sideways(4, (250.0, 250.0)), sideways(5, (250.0, 250.0))];
        assert_eq!(picked(StrikerSelector::default().select(&candidates, &goal())), 4);
    }

    #[test]
    fn test_hip_width_tie_first_wins() {
        let candidates = vec![facing(7, 20.0, (300.0, 300.0)), facing(8, 20.0, (300.0, 300.0))];
        assert_eq!(picked(StrikerSelector::default().select(&candidates, &goal())), 7);
    }

    // ── cutoffs ──

    #[test]
    fn test_hip_width_cutoff() {
        let selector = StrikerSelector::new(BoundingBoxCalculator::default(), 1000.0, 30.0);
        let candidates = vec![facing(0, 40.0, (300.0, 300.0)), facing(1, 30.0, (300.0, 300.0))];
        assert_eq!(
            selector.select(&candidates, &goal()),
            Err(ClassificationError::NoStrikerWithinCutoff { cutoff: 30.0 })
        );
    }

    #[test]
    fn test_goal_distance_cutoff() {
        // Both sideways candidates are far more than 100 units from (200, 140).
        let selector = StrikerSelector::new(BoundingBoxCalculator::default(), 100.0, 1000.0);
        let candidates = vec![sideways(0, (600.0, 600.0)), sideways(1, (700.0, 700.0))];
        assert_eq!(
            selector.select(&candidates, &goal()),
            Err(ClassificationError::NoStrikerWithinCutoff { cutoff: 100.0 })
        );
    }

    #[test]
    fn test_deterministic() {
        let candidates = vec![
            sideways(0, (400.0, 400.0)),
            sideways(1, (210.0, 150.0)),
            facing(2, 12.0, (300.0, 300.0)),
        ];
        let selector = StrikerSelector::default();
        let first = selector.select(&candidates, &goal());
        let second = selector.select(&candidates, &goal());
        assert_eq!(first, second);
        assert_eq!(first.map(|s| s.id()), Ok(DetectionId(1)));
    }
}
