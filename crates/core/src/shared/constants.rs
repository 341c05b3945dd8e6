/// Padding added around a skeleton's keypoint extent when boxing it.
pub const DEFAULT_BOX_PADDING: f64 = 5.0;

/// Goalkeeper and striker candidates at or beyond this distance from the
/// goal centre are never selected.
pub const DEFAULT_MAX_GOAL_DISTANCE: f64 = 1000.0;

/// Hip spans at or beyond this width never win the narrowest-hips fallback.
pub const DEFAULT_MAX_HIP_WIDTH: f64 = 1000.0;

/// Goal mouth rectangle `(x, y, x2, y2)` for 1280x720 broadcast footage.
pub const DEFAULT_GOALPOST: (f64, f64, f64, f64) = (720.0, 240.0, 1120.0, 520.0);

/// People kept per frame by the multi-person pose configuration.
pub const MULTI_PERSON_MAX_PEOPLE: usize = 3;

/// People kept per frame by the single-person pose configuration.
pub const SINGLE_PERSON_MAX_PEOPLE: usize = 1;

/// Output frame rate used when the source does not report one.
pub const FALLBACK_OUTPUT_FPS: f64 = 20.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Suffix of the per-frame files written by `openpose --write_json`.
pub const OPENPOSE_JSON_SUFFIX: &str = "_keypoints.json";
