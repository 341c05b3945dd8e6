use serde::Serialize;

use crate::pose::domain::keypoint::Skeleton;
use crate::shared::constants::DEFAULT_BOX_PADDING;

/// Axis-aligned box around a skeleton's detected keypoints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Half the box's width and height.
    ///
    /// This is the box's extent halved, not its centre in frame coordinates;
    /// goal and striker distances are measured from this point.
    pub fn midpoint(&self) -> (f64, f64) {
        (self.width() / 2.0, self.height() / 2.0)
    }
}

/// Derives padded boxes from skeletons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBoxCalculator {
    padding: f64,
}

impl BoundingBoxCalculator {
    pub fn new(padding: f64) -> Self {
        Self { padding }
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// `None` in, `None` out: absence means the frame had no detection.
    pub fn bound(&self, skeleton: Option<&Skeleton>) -> Option<BoundingBox> {
        skeleton.map(|s| self.bound_skeleton(s))
    }

    /// Minimum is the smallest strictly positive coordinate (0 when there is
    /// none); maximum starts at 0. Undetected keypoints contribute 0, so an
    /// all-undetected skeleton yields `(-p, -p, p, p)`.
    pub fn bound_skeleton(&self, skeleton: &Skeleton) -> BoundingBox {
        let (min_x, max_x) = extent(skeleton.keypoints().iter().map(|k| {
            if k.is_detected() {
                k.x
            } else {
                0.0
            }
        }));
        let (min_y, max_y) = extent(skeleton.keypoints().iter().map(|k| {
            if k.is_detected() {
                k.y
            } else {
                0.0
            }
        }));

        BoundingBox {
            min_x: min_x - self.padding,
            min_y: min_y - self.padding,
            max_x: max_x + self.padding,
            max_y: max_y + self.padding,
        }
    }
}

impl Default for BoundingBoxCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_BOX_PADDING)
    }
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min_positive: Option<f64> = None;
    let mut max = 0.0_f64;
    for v in values {
        if v > 0.0 {
            min_positive = Some(min_positive.map_or(v, |m| m.min(v)));
        }
        max = max.max(v);
    }
    (min_positive.unwrap_or(0.0), max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::domain::keypoint::{BodyPart, DetectionId, Keypoint};
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn skeleton_with(points: &[(BodyPart, f64, f64)]) -> Skeleton {
        let mut keypoints = [Keypoint::default(); BodyPart::COUNT];
        for &(part, x, y) in points {
            keypoints[part.index()] = Keypoint::new(x, y, 0.8);
        }
        Skeleton::new(DetectionId(0), keypoints)
    }

    #[test]
    fn test_absent_skeleton_has_no_box() {
        assert!(BoundingBoxCalculator::default().bound(None).is_none());
    }

    #[rstest]
    #[case(5.0)]
    #[case(0.0)]
    #[case(12.5)]
    fn test_all_undetected_is_padding_square(#[case] padding: f64) {
        let calc = BoundingBoxCalculator::new(padding);
        let b = calc.bound_skeleton(&skeleton_with(&[]));
        assert_eq!(
            b,
            BoundingBox {
                min_x: -padding,
                min_y: -padding,
                max_x: padding,
                max_y: padding,
            }
        );
    }

    #[test]
    fn test_single_point_box() {
        let calc = BoundingBoxCalculator::default();
        let b = calc.bound_skeleton(&skeleton_with(&[(BodyPart::Neck, 300.0, 200.0)]));
        assert_relative_eq!(b.min_x, 295.0);
        assert_relative_eq!(b.max_x, 305.0);
        assert_relative_eq!(b.min_y, 195.0);
        assert_relative_eq!(b.max_y, 205.0);
    }

    #[test]
    fn test_extent_over_detected_points() {
        let calc = BoundingBoxCalculator::default();
        let b = calc
            .bound(Some(&skeleton_with(&[
                (BodyPart::Nose, 410.0, 120.0),
                (BodyPart::LAnkle, 380.0, 360.0),
                (BodyPart::RAnkle, 450.0, 355.0),
            ])))
            .unwrap();
        assert_relative_eq!(b.min_x, 375.0);
        assert_relative_eq!(b.max_x, 455.0);
        assert_relative_eq!(b.min_y, 115.0);
        assert_relative_eq!(b.max_y, 365.0);
    }

    #[test]
    fn test_undetected_coordinates_are_ignored() {
        let mut s = skeleton_with(&[(BodyPart::Neck, 300.0, 200.0)]);
        let mut keypoints = *s.keypoints();
        // Garbage coordinates with zero confidence must not widen the box.
        keypoints[BodyPart::LHeel.index()] = Keypoint::new(900.0, 50.0, 0.0);
        s = Skeleton::new(s.id(), keypoints);

        let b = BoundingBoxCalculator::default().bound_skeleton(&s);
        assert_relative_eq!(b.max_x, 305.0);
        assert_relative_eq!(b.min_y, 195.0);
    }

    #[test]
    fn test_midpoint_is_half_extent() {
        let b = BoundingBox {
            min_x: 100.0,
            min_y: 40.0,
            max_x: 180.0,
            max_y: 240.0,
        };
        assert_eq!(b.midpoint(), (40.0, 100.0));
    }

    #[test]
    fn test_default_padding() {
        assert_relative_eq!(BoundingBoxCalculator::default().padding(), 5.0);
    }
}
