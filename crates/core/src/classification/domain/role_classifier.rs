use serde::Serialize;

use crate::pose::domain::keypoint::{DetectionId, Skeleton};

use super::bounding_box::{BoundingBox, BoundingBoxCalculator};
use super::classification_error::ClassificationError;
use super::classifier_config::ClassifierConfig;
use super::goalkeeper_selector::GoalkeeperSelector;
use super::goalpost::GoalpostRegion;
use super::striker_selector::StrikerSelector;
use super::validity_filter::filter_valid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Striker,
    Goalkeeper,
    Referee,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Striker => "Striker",
            Role::Goalkeeper => "Goalkeeper",
            Role::Referee => "Referee",
        }
    }
}

/// What the overlay renderer needs for one classified person.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoleAnnotation {
    pub role: Role,
    pub detection: DetectionId,
    pub bbox: BoundingBox,
}

/// Role assignment for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameClassification {
    pub striker: Skeleton,
    pub goalkeeper: Option<Skeleton>,
    pub referees: Vec<Skeleton>,
}

impl FrameClassification {
    /// Striker first, then the goalkeeper if any, then referees in order.
    pub fn roles(&self) -> impl Iterator<Item = (Role, &Skeleton)> {
        std::iter::once((Role::Striker, &self.striker))
            .chain(self.goalkeeper.iter().map(|g| (Role::Goalkeeper, g)))
            .chain(self.referees.iter().map(|r| (Role::Referee, r)))
    }

    pub fn annotations(&self, calculator: &BoundingBoxCalculator) -> Vec<RoleAnnotation> {
        self.roles()
            .map(|(role, skeleton)| RoleAnnotation {
                role,
                detection: skeleton.id(),
                bbox: calculator.bound_skeleton(skeleton),
            })
            .collect()
    }
}

/// Assigns striker, goalkeeper and referee roles from keypoint geometry.
///
/// Stateless: the same inputs always give the same classification.
#[derive(Clone, Copy, Debug)]
pub struct RoleClassifier {
    config: ClassifierConfig,
    calculator: BoundingBoxCalculator,
    goalkeeper: GoalkeeperSelector,
    striker: StrikerSelector,
}

impl RoleClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let calculator = BoundingBoxCalculator::new(config.padding);
        Self {
            config,
            calculator,
            goalkeeper: GoalkeeperSelector::new(calculator, config.max_goal_distance),
            striker: StrikerSelector::new(
                calculator,
                config.max_goal_distance,
                config.max_hip_width,
            ),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn calculator(&self) -> &BoundingBoxCalculator {
        &self.calculator
    }

    pub fn classify(
        &self,
        all: &[Skeleton],
        goalpost: &GoalpostRegion,
        detect_goalkeeper: bool,
    ) -> Result<FrameClassification, ClassificationError> {
        let valid = filter_valid(all);
        log::debug!("{} of {} skeletons fully detected", valid.len(), all.len());

        let (goalkeeper, candidates) = if detect_goalkeeper {
            let selection = self.goalkeeper.select(&valid, goalpost);
            (selection.goalkeeper, selection.remaining)
        } else {
            (None, valid)
        };
        if let Some(keeper) = &goalkeeper {
            log::debug!("Goalkeeper: {:?}", keeper.id());
        }

        let striker = self.striker.select(&candidates, goalpost)?;
        let striker_id = striker.id();
        log::debug!("Striker: {striker_id:?}");

        let referees = candidates
            .into_iter()
            .filter(|s| s.id() != striker_id)
            .collect();

        Ok(FrameClassification {
            striker,
            goalkeeper,
            referees,
        })
    }
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}
