use crate::pose::domain::keypoint::Skeleton;
use crate::shared::constants::DEFAULT_MAX_GOAL_DISTANCE;

use super::bounding_box::BoundingBoxCalculator;
use super::goalpost::GoalpostRegion;

/// Outcome of the goalkeeper search. `remaining` keeps input order.
#[derive(Clone, Debug, PartialEq)]
pub struct GoalkeeperSelection {
    pub goalkeeper: Option<Skeleton>,
    pub remaining: Vec<Skeleton>,
}

/// Picks the valid skeleton standing in the goal mouth.
///
/// A candidate's box midpoint must lie strictly inside the goal rectangle;
/// the winner is the candidate nearest the goal centre. Candidates at or
/// beyond `max_distance` never win, so "nobody in goal" is a normal outcome.
#[derive(Clone, Copy, Debug)]
pub struct GoalkeeperSelector {
    calculator: BoundingBoxCalculator,
    max_distance: f64,
}

impl GoalkeeperSelector {
    pub fn new(calculator: BoundingBoxCalculator, max_distance: f64) -> Self {
        Self {
            calculator,
            max_distance,
        }
    }

    pub fn select(&self, valid: &[Skeleton], goalpost: &GoalpostRegion) -> GoalkeeperSelection {
        let mut best: Option<&Skeleton> = None;
        let mut best_distance = self.max_distance;

        for skeleton in valid {
            let midpoint = self.calculator.bound_skeleton(skeleton).midpoint();
            if !goalpost.contains_strictly(midpoint) {
                continue;
            }
            let distance = goalpost.distance_to_center(midpoint);
            log::trace!(
                "Goalkeeper candidate {:?}: midpoint {midpoint:?}, distance {distance:.1}",
                skeleton.id()
            );
            if distance < best_distance {
                best_distance = distance;
                best = Some(skeleton);
            }
        }

        match best {
            Some(goalkeeper) => {
                let id = goalkeeper.id();
                GoalkeeperSelection {
                    goalkeeper: Some(goalkeeper.clone()),
                    remaining: valid.iter().filter(|s| s.id() != id).cloned().collect(),
                }
            }
            None => GoalkeeperSelection {
                goalkeeper: None,
                remaining: valid.to_vec(),
            },
        }
    }
}

impl Default for GoalkeeperSelector {
    fn default() -> Self {
        Self::new(BoundingBoxCalculator::default(), DEFAULT_MAX_GOAL_DISTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::fixtures::{facing, ids, person, sideways};
    use crate::pose::domain::keypoint::DetectionId;

    fn goal() -> GoalpostRegion {
        GoalpostRegion::new(720.0, 240.0, 1120.0, 520.0)
    }

    #[test]
    fn test_inside_candidate_becomes_goalkeeper() {
        let keeper = facing(0, 40.0, (800.0, 300.0));
        let outfield = facing(1, 40.0, (50.0, 50.0));
        let selection = GoalkeeperSelector::default().select(&[keeper.clone(), outfield], &goal());

        assert_eq!(selection.goalkeeper, Some(keeper));
        assert_eq!(ids(&selection.remaining), vec![1]);
    }

    #[test]
    fn test_nobody_inside_leaves_list_untouched() {
        let valid = vec![facing(0, 40.0, (50.0, 50.0)), sideways(1, (60.0, 90.0))];
        let selection = GoalkeeperSelector::default().select(&valid, &goal());

        assert!(selection.goalkeeper.is_none());
        assert_eq!(selection.remaining, valid);
    }

    #[test]
    fn test_empty_input() {
        let selection = GoalkeeperSelector::default().select(&[], &goal());
        assert!(selection.goalkeeper.is_none());
        assert!(selection.remaining.is_empty());
    }

    #[test]
    fn test_nearest_candidate_wins() {
        // Centre (500, 500): distances 283 and 14.
        let goal = GoalpostRegion::new(0.0, 0.0, 1000.0, 1000.0);
        let far = facing(0, 40.0, (700.0, 700.0));
        let near = facing(1, 40.0, (510.0, 510.0));
        let selection = GoalkeeperSelector::default().select(&[far, near], &goal);

        assert_eq!(selection.goalkeeper.map(|s| s.id()), Some(DetectionId(1)));
        assert_eq!(ids(&selection.remaining), vec![0]);
    }

    #[test]
    fn test_boundary_midpoint_is_not_a_candidate() {
        let on_edge = facing(0, 40.0, (720.0, 300.0));
        let selection = GoalkeeperSelector::default().select(&[on_edge], &goal());
        assert!(selection.goalkeeper.is_none());
    }

    #[test]
    fn test_cutoff_rejects_far_candidates() {
        // Inside the goal but ~621 units from its centre.
        let keeper = facing(0, 40.0, (800.0, 300.0));
        let strict = GoalkeeperSelector::new(BoundingBoxCalculator::default(), 500.0);
        let selection = strict.select(&[keeper.clone()], &goal());
        assert!(selection.goalkeeper.is_none());
        assert_eq!(selection.remaining, vec![keeper]);
    }

    #[test]
    fn test_distance_equal_to_cutoff_is_rejected() {
        // Midpoint sits on the centre (200, 140): distance 0 against a cutoff of 0.
        let goal = GoalpostRegion::new(100.0, 0.0, 500.0, 280.0);
        let keeper = facing(0, 40.0, (200.0, 140.0));
        let exact = GoalkeeperSelector::new(BoundingBoxCalculator::default(), 0.0);
        assert!(exact.select(&[keeper], &goal).goalkeeper.is_none());
    }

    #[test]
    fn test_first_wins_exact_tie() {
        let a = facing(0, 40.0, (800.0, 300.0));
        let b = sideways(1, (800.0, 300.0));
        let selection = GoalkeeperSelector::default().select(&[a, b], &goal());
        assert_eq!(selection.goalkeeper.map(|s| s.id()), Some(DetectionId(0)));
        assert_eq!(ids(&selection.remaining), vec![1]);
    }

    #[test]
    fn test_identical_coordinates_removed_by_id_only() {
        let keeper = facing(0, 40.0, (800.0, 300.0));
        let twin = Skeleton::new(DetectionId(1), *keeper.keypoints());
        let outfield = person(2, 130.0, 100.0, 110.0, (40.0, 60.0));
        let selection = GoalkeeperSelector::default().select(&[keeper, twin, outfield], &goal());

        assert_eq!(selection.goalkeeper.map(|s| s.id()), Some(DetectionId(0)));
        assert_eq!(ids(&selection.remaining), vec![1, 2]);
    }
}
