use crate::pose::domain::keypoint::{BodyPart, Skeleton};

/// Parts that must all be detected for a skeleton to take part in role
/// assignment: torso anchor plus both legs down to the ankles.
pub const REQUIRED_PARTS: [BodyPart; 7] = [
    BodyPart::Neck,
    BodyPart::LHip,
    BodyPart::RHip,
    BodyPart::LKnee,
    BodyPart::RKnee,
    BodyPart::LAnkle,
    BodyPart::RAnkle,
];

pub fn is_valid(skeleton: &Skeleton) -> bool {
    REQUIRED_PARTS
        .iter()
        .all(|&part| skeleton.keypoint(part).is_detected())
}

/// Valid skeletons in input order.
pub fn filter_valid(skeletons: &[Skeleton]) -> Vec<Skeleton> {
    skeletons.iter().filter(|s| is_valid(s)).cloned().collect()
}
