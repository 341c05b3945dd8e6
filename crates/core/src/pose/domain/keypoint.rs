//! BODY_25 skeleton model shared by the pose adapters and the classifier.
//!
//! The body-part order is fixed; every consumer indexes keypoints through
//! [`BodyPart`] rather than raw positions.

/// Values per keypoint in a flat detection row: x, y, confidence.
pub const VALUES_PER_KEYPOINT: usize = 3;

/// A single 2-D joint estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// In `[0, 1]`; exactly 0 means the joint was not detected and `x`/`y`
    /// carry no information.
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    pub fn is_detected(&self) -> bool {
        self.confidence != 0.0
    }
}

/// OpenPose BODY_25 body parts in output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    Neck = 1,
    RShoulder = 2,
    RElbow = 3,
    RWrist = 4,
    LShoulder = 5,
    LElbow = 6,
    LWrist = 7,
    MidHip = 8,
    RHip = 9,
    RKnee = 10,
    RAnkle = 11,
    LHip = 12,
    LKnee = 13,
    LAnkle = 14,
    REye = 15,
    LEye = 16,
    REar = 17,
    LEar = 18,
    LBigToe = 19,
    LSmallToe = 20,
    LHeel = 21,
    RBigToe = 22,
    RSmallToe = 23,
    RHeel = 24,
}

impl BodyPart {
    pub const COUNT: usize = 25;

    pub const ALL: [BodyPart; Self::COUNT] = [
        Self::Nose,
        Self::Neck,
        Self::RShoulder,
        Self::RElbow,
        Self::RWrist,
        Self::LShoulder,
        Self::LElbow,
        Self::LWrist,
        Self::MidHip,
        Self::RHip,
        Self::RKnee,
        Self::RAnkle,
        Self::LHip,
        Self::LKnee,
        Self::LAnkle,
        Self::REye,
        Self::LEye,
        Self::REar,
        Self::LEar,
        Self::LBigToe,
        Self::LSmallToe,
        Self::LHeel,
        Self::RBigToe,
        Self::RSmallToe,
        Self::RHeel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Name used in OpenPose's `poseGetBodyPartMapping()`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "Nose",
            Self::Neck => "Neck",
            Self::RShoulder => "RShoulder",
            Self::RElbow => "RElbow",
            Self::RWrist => "RWrist",
            Self::LShoulder => "LShoulder",
            Self::LElbow => "LElbow",
            Self::LWrist => "LWrist",
            Self::MidHip => "MidHip",
            Self::RHip => "RHip",
            Self::RKnee => "RKnee",
            Self::RAnkle => "RAnkle",
            Self::LHip => "LHip",
            Self::LKnee => "LKnee",
            Self::LAnkle => "LAnkle",
            Self::REye => "REye",
            Self::LEye => "LEye",
            Self::REar => "REar",
            Self::LEar => "LEar",
            Self::LBigToe => "LBigToe",
            Self::LSmallToe => "LSmallToe",
            Self::LHeel => "LHeel",
            Self::RBigToe => "RBigToe",
            Self::RSmallToe => "RSmallToe",
            Self::RHeel => "RHeel",
        }
    }
}

/// Identifies one detection within a frame: its position in the pose
/// estimator's output for that frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetectionId(pub u32);

/// One person's keypoints for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    id: DetectionId,
    keypoints: [Keypoint; BodyPart::COUNT],
}

impl Skeleton {
    pub fn new(id: DetectionId, keypoints: [Keypoint; BodyPart::COUNT]) -> Self {
        Self { id, keypoints }
    }

    /// Builds a skeleton from `x, y, c` triples. Returns `None` unless the
    /// row holds exactly 25 triples.
    pub fn from_flat(id: DetectionId, values: &[f64]) -> Option<Self> {
        if values.len() != BodyPart::COUNT * VALUES_PER_KEYPOINT {
            return None;
        }
        let mut keypoints = [Keypoint::default(); BodyPart::COUNT];
        for (kp, triple) in keypoints
            .iter_mut()
            .zip(values.chunks_exact(VALUES_PER_KEYPOINT))
        {
            *kp = Keypoint::new(triple[0], triple[1], triple[2]);
        }
        Some(Self { id, keypoints })
    }

    /// Converts one frame's raw detection rows into skeletons.
    ///
    /// Ids follow row position, so a malformed row leaves a gap rather than
    /// shifting the ids of the rows after it.
    pub fn materialize(rows: &[Vec<f64>]) -> Vec<Self> {
        rows.iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let id = DetectionId(i as u32);
                let skeleton = Self::from_flat(id, row);
                if skeleton.is_none() {
                    log::warn!(
                        "Dropping detection {i}: expected {} values, got {}",
                        BodyPart::COUNT * VALUES_PER_KEYPOINT,
                        row.len()
                    );
                }
                skeleton
            })
            .collect()
    }

    pub fn id(&self) -> DetectionId {
        self.id
    }

    pub fn keypoints(&self) -> &[Keypoint; BodyPart::COUNT] {
        &self.keypoints
    }

    pub fn keypoint(&self, part: BodyPart) -> &Keypoint {
        &self.keypoints[part.index()]
    }

    /// Mean confidence over all 25 parts, undetected ones counting as 0.
    pub fn mean_confidence(&self) -> f64 {
        self.keypoints.iter().map(|k| k.confidence).sum::<f64>() / BodyPart::COUNT as f64
    }
}
