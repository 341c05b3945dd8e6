use crate::classification::domain::goalpost::{GoalpostLocator, GoalpostRegion};
use crate::shared::frame::Frame;

/// Returns the same goal rectangle for every frame.
///
/// Suited to a locked-off camera where the goal mouth is measured once.
pub struct FixedGoalpostLocator {
    region: GoalpostRegion,
}

impl FixedGoalpostLocator {
    pub fn new(region: GoalpostRegion) -> Self {
        Self { region }
    }
}

impl Default for FixedGoalpostLocator {
    fn default() -> Self {
        Self::new(GoalpostRegion::default())
    }
}

impl GoalpostLocator for FixedGoalpostLocator {
    fn locate(&mut self, _frame: &Frame) -> GoalpostRegion {
        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_region_for_every_frame() {
        let region = GoalpostRegion::new(10.0, 20.0, 30.0, 40.0);
        let mut locator = FixedGoalpostLocator::new(region);
        assert_eq!(locator.locate(&Frame::blank(4, 4, 0)), region);
        assert_eq!(locator.locate(&Frame::blank(8, 8, 99)), region);
    }

    #[test]
    fn test_default_region() {
        let mut locator = FixedGoalpostLocator::default();
        assert_eq!(locator.locate(&Frame::blank(4, 4, 0)), GoalpostRegion::default());
    }
}
