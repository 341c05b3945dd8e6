use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::pose::domain::keypoint::Skeleton;
use crate::pose::domain::pose_estimator::{PoseEstimator, PoseEstimatorConfig};
use crate::shared::constants::OPENPOSE_JSON_SUFFIX;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum KeypointFileError {
    #[error("failed to list keypoint directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read keypoint file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse keypoint file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Subset of the OpenPose `--write_json` document we consume.
///
/// `people` stays untyped so one bad entry cannot fail the whole frame.
#[derive(Deserialize)]
struct OpenPoseDocument {
    #[serde(default)]
    people: Option<Value>,
}

enum Source {
    /// Per-frame files keyed by frame number.
    Directory(BTreeMap<usize, PathBuf>),
    /// One file for every frame (still images). Parsed lazily, then cached.
    File {
        path: PathBuf,
        rows: Option<Vec<Vec<f64>>>,
    },
}

/// Replays keypoints that OpenPose wrote to disk with `--write_json`.
///
/// Frames without a matching file are reported as having no detections.
pub struct OpenPoseJsonEstimator {
    source: Source,
    config: PoseEstimatorConfig,
}

impl OpenPoseJsonEstimator {
    /// Indexes every `*_<frame>_keypoints.json` file in `dir`.
    pub fn from_dir(dir: &Path, config: PoseEstimatorConfig) -> Result<Self, KeypointFileError> {
        let entries = fs::read_dir(dir).map_err(|e| KeypointFileError::ListDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut files = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| KeypointFileError::ListDir {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match frame_number(name) {
                Some(n) => {
                    if let Some(previous) = files.insert(n, path.clone()) {
                        log::warn!(
                            "Frame {n} has more than one keypoint file, using {} over {}",
                            path.display(),
                            previous.display()
                        );
                    }
                }
                None => log::trace!("Ignoring non-keypoint file {name}"),
            }
        }

        log::info!(
            "Indexed {} keypoint files in {}",
            files.len(),
            dir.display()
        );
        Ok(Self {
            source: Source::Directory(files),
            config,
        })
    }

    /// Uses a single keypoint file for every frame.
    pub fn from_file(path: &Path, config: PoseEstimatorConfig) -> Self {
        Self {
            source: Source::File {
                path: path.to_path_buf(),
                rows: None,
            },
            config,
        }
    }

    /// Number of frames that have a keypoint file (1 in single-file mode).
    pub fn indexed_frames(&self) -> usize {
        match &self.source {
            Source::Directory(files) => files.len(),
            Source::File { .. } => 1,
        }
    }

    fn rows_for(&mut self, frame_index: usize) -> Result<Vec<Vec<f64>>, KeypointFileError> {
        match &mut self.source {
            Source::Directory(files) => match files.get(&frame_index) {
                Some(path) => read_rows(path),
                None => {
                    log::debug!("No keypoint file for frame {frame_index}");
                    Ok(Vec::new())
                }
            },
            Source::File { path, rows } => {
                if rows.is_none() {
                    *rows = Some(read_rows(path)?);
                }
                Ok(rows.clone().unwrap_or_default())
            }
        }
    }
}

impl PoseEstimator for OpenPoseJsonEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Vec<Skeleton>, Box<dyn std::error::Error>> {
        let rows = self.rows_for(frame.index())?;
        let skeletons = self.config.limit(Skeleton::materialize(&rows));
        log::debug!(
            "Frame {}: {} detections, {} kept",
            frame.index(),
            rows.len(),
            skeletons.len()
        );
        Ok(skeletons)
    }
}

/// Parses an OpenPose JSON document into one flat row per person.
///
/// Only malformed JSON is an error. A missing or non-array `people` means no
/// detections, and a person without a numeric `pose_keypoints_2d` array
/// becomes an empty row, which skeleton materialization drops.
pub fn parse_keypoint_json(text: &str) -> Result<Vec<Vec<f64>>, serde_json::Error> {
    let doc: OpenPoseDocument = serde_json::from_str(text)?;
    let people = match doc.people {
        Some(Value::Array(people)) => people,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            log::warn!("Ignoring non-array \"people\" field: {other}");
            return Ok(Vec::new());
        }
    };
    Ok(people.iter().map(person_row).collect())
}

fn person_row(person: &Value) -> Vec<f64> {
    let Some(values) = person.get("pose_keypoints_2d").and_then(Value::as_array) else {
        return Vec::new();
    };
    values
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()
        .unwrap_or_default()
}

fn read_rows(path: &Path) -> Result<Vec<Vec<f64>>, KeypointFileError> {
    let text = fs::read_to_string(path).map_err(|e| KeypointFileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_keypoint_json(&text).map_err(|e| KeypointFileError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Extracts `155` from `video1_000000000155_keypoints.json`.
fn frame_number(file_name: &str) -> Option<usize> {
    let stem = file_name.strip_suffix(OPENPOSE_JSON_SUFFIX)?;
    let digits = stem.rsplit('_').next()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::domain::keypoint::{BodyPart, DetectionId};
    use rstest::rstest;

    fn person_json(x: f64, confidence: f64) -> String {
        let values: Vec<String> = (0..BodyPart::COUNT)
            .flat_map(|_| [x, 300.0, confidence])
            .map(|v| v.to_string())
            .collect();
        format!(
            r#"{{"person_id":[-1],"pose_keypoints_2d":[{}],"face_keypoints_2d":[]}}"#,
            values.join(",")
        )
    }

    fn document(people: &[String]) -> String {
        format!(r#"{{"version":1.3,"people":[{}]}}"#, people.join(","))
    }

    fn frame(index: usize) -> Frame {
        Frame::blank(4, 4, index)
    }

    #[rstest]
    #[case("video1_000000000155_keypoints.json", Some(155))]
    #[case("000000000000_keypoints.json", Some(0))]
    #[case("my_clip_2_000000000012_keypoints.json", Some(12))]
    #[case("video1_keypoints.json", None)]
    #[case("video1_000000000155.json", None)]
    #[case("notes.txt", None)]
    fn test_frame_number(#[case] name: &str, #[case] expected: Option<usize>) {
        assert_eq!(frame_number(name), expected);
    }

    #[test]
    fn test_parse_keypoint_json_rows() {
        let text = document(&[person_json(100.0, 0.8), person_json(200.0, 0.6)]);
        let rows = parse_keypoint_json(&text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 75);
        assert_eq!(rows[1][0], 200.0);
    }

    #[test]
    fn test_parse_missing_people_is_empty() {
        assert!(parse_keypoint_json(r#"{"version":1.3}"#).unwrap().is_empty());
    }

    #[rstest]
    #[case::null_people(r#"{"people":null}"#)]
    #[case::object_people(r#"{"people":{"pose_keypoints_2d":[]}}"#)]
    fn test_parse_unusable_people_is_empty(#[case] text: &str) {
        assert!(parse_keypoint_json(text).unwrap().is_empty());
    }

    #[test]
    fn test_parse_keeps_row_per_person_when_entries_malformed() {
        let text = document(&[
            r#"{"pose_keypoints_2d":null}"#.to_string(),
            r#"{"pose_keypoints_2d":[1.0,"x",0.5]}"#.to_string(),
            r#"{"face_keypoints_2d":[]}"#.to_string(),
            person_json(120.0, 0.9),
        ]);
        let rows = parse_keypoint_json(&text).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[..3].iter().all(|r| r.is_empty()));
        assert_eq!(rows[3].len(), 75);
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        assert!(parse_keypoint_json("{not json").is_err());
    }

    #[test]
    fn test_directory_lookup_by_frame_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("clip_000000000003_keypoints.json"),
            document(&[person_json(100.0, 0.8)]),
        )
        .unwrap();
        fs::write(dir.path().join("readme.md"), "ignored").unwrap();

        let mut estimator =
            OpenPoseJsonEstimator::from_dir(dir.path(), PoseEstimatorConfig::default()).unwrap();
        assert_eq!(estimator.indexed_frames(), 1);

        let found = estimator.estimate(&frame(3)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), DetectionId(0));

        assert!(estimator.estimate(&frame(4)).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_person_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = r#"{"pose_keypoints_2d":[1.0,2.0,0.5]}"#.to_string();
        fs::write(
            dir.path().join("clip_000000000000_keypoints.json"),
            document(&[bad, person_json(150.0, 0.7)]),
        )
        .unwrap();

        let mut estimator =
            OpenPoseJsonEstimator::from_dir(dir.path(), PoseEstimatorConfig::default()).unwrap();
        let found = estimator.estimate(&frame(0)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), DetectionId(1));
    }

    #[test]
    fn test_null_and_non_numeric_people_do_not_hide_valid_one() {
        let dir = tempfile::tempdir().unwrap();
        let null_person = r#"{"pose_keypoints_2d":null}"#.to_string();
        let text_person = r#"{"pose_keypoints_2d":[1.0,"x",0.5]}"#.to_string();
        fs::write(
            dir.path().join("clip_000000000000_keypoints.json"),
            document(&[null_person, text_person, person_json(150.0, 0.7)]),
        )
        .unwrap();

        let mut estimator =
            OpenPoseJsonEstimator::from_dir(dir.path(), PoseEstimatorConfig::default()).unwrap();
        let found = estimator.estimate(&frame(0)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), DetectionId(2));
    }

    #[test]
    fn test_max_people_applied() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("clip_000000000000_keypoints.json"),
            document(&[person_json(100.0, 0.2), person_json(200.0, 0.9)]),
        )
        .unwrap();

        let mut estimator =
            OpenPoseJsonEstimator::from_dir(dir.path(), PoseEstimatorConfig::single_person())
                .unwrap();
        let found = estimator.estimate(&frame(0)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), DetectionId(1));
    }

    #[test]
    fn test_single_file_serves_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still_keypoints.json");
        fs::write(&path, document(&[person_json(100.0, 0.8)])).unwrap();

        let mut estimator = OpenPoseJsonEstimator::from_file(&path, PoseEstimatorConfig::default());
        assert_eq!(estimator.estimate(&frame(0)).unwrap().len(), 1);
        assert_eq!(estimator.estimate(&frame(9)).unwrap().len(), 1);
    }

    #[test]
    fn test_unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken_keypoints.json");
        fs::write(&path, "[[[").unwrap();

        let mut estimator = OpenPoseJsonEstimator::from_file(&path, PoseEstimatorConfig::default());
        assert!(estimator.estimate(&frame(0)).is_err());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = OpenPoseJsonEstimator::from_dir(
            Path::new("/nonexistent/keypoints"),
            PoseEstimatorConfig::default(),
        );
        assert!(matches!(result, Err(KeypointFileError::ListDir { .. })));
    }
}
