//! Skeleton builders for classification tests.

use crate::pose::domain::keypoint::{BodyPart, DetectionId, Keypoint, Skeleton};
use crate::shared::constants::DEFAULT_BOX_PADDING;

/// A fully valid skeleton with the given neck and hip x-coordinates whose
/// default-padded bounding box has extent midpoint `midpoint`.
///
/// The body is laid out top to bottom inside the box; the big toes pin the
/// box's left and right edges.
pub fn person(id: u32, neck_x: f64, lhip_x: f64, rhip_x: f64, midpoint: (f64, f64)) -> Skeleton {
    let w = 2.0 * midpoint.0 - 2.0 * DEFAULT_BOX_PADDING;
    let h = 2.0 * midpoint.1 - 2.0 * DEFAULT_BOX_PADDING;
    let min_x = neck_x.min(lhip_x).min(rhip_x);
    let max_x = min_x + w;
    assert!(min_x > 0.0, "fixture coordinates must be positive");
    assert!(
        max_x >= neck_x.max(lhip_x).max(rhip_x),
        "midpoint too small for the requested joint spread"
    );
    let top = 10.0;

    let mut keypoints = [Keypoint::default(); BodyPart::COUNT];
    let mut set = |part: BodyPart, x: f64, y: f64| {
        keypoints[part.index()] = Keypoint::new(x, y, 0.8);
    };
    set(BodyPart::Nose, neck_x, top);
    set(BodyPart::Neck, neck_x, top + h * 0.1);
    set(BodyPart::LHip, lhip_x, top + h * 0.4);
    set(BodyPart::RHip, rhip_x, top + h * 0.4);
    set(BodyPart::LKnee, lhip_x, top + h * 0.7);
    set(BodyPart::RKnee, rhip_x, top + h * 0.7);
    set(BodyPart::LAnkle, lhip_x, top + h * 0.9);
    set(BodyPart::RAnkle, rhip_x, top + h * 0.9);
    set(BodyPart::LBigToe, min_x, top + h);
    set(BodyPart::RBigToe, max_x, top + h);

    Skeleton::new(DetectionId(id), keypoints)
}

/// Facing the camera: neck centred between the hips.
pub fn facing(id: u32, hip_width: f64, midpoint: (f64, f64)) -> Skeleton {
    let lhip = 100.0;
    person(id, lhip + hip_width / 2.0, lhip, lhip + hip_width, midpoint)
}

/// Side-on: neck outside the hip span.
pub fn sideways(id: u32, midpoint: (f64, f64)) -> Skeleton {
    person(id, 130.0, 100.0, 110.0, midpoint)
}

pub fn ids(skeletons: &[Skeleton]) -> Vec<u32> {
    skeletons.iter().map(|s| s.id().0).collect()
}
