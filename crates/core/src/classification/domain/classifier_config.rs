use crate::shared::constants::{
    DEFAULT_BOX_PADDING, DEFAULT_MAX_GOAL_DISTANCE, DEFAULT_MAX_HIP_WIDTH,
};

/// Tunables for [`RoleClassifier`](super::role_classifier::RoleClassifier).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierConfig {
    /// Margin added on every side of a skeleton's keypoint extent.
    pub padding: f64,
    /// Candidates whose distance to the goal centre is at or above this are
    /// never chosen as goalkeeper or (in the multi-candidate case) striker.
    pub max_goal_distance: f64,
    /// Hip spans at or above this never win the narrowest-hips fallback.
    pub max_hip_width: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_BOX_PADDING,
            max_goal_distance: DEFAULT_MAX_GOAL_DISTANCE,
            max_hip_width: DEFAULT_MAX_HIP_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();
        assert_relative_eq!(config.padding, 5.0);
        assert_relative_eq!(config.max_goal_distance, 1000.0);
        assert_relative_eq!(config.max_hip_width, 1000.0);
    }
}
