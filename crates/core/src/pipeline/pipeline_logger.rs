use std::collections::BTreeMap;
use std::time::Instant;

/// Stage names reported by the frame processor.
pub const STAGE_MASK: &str = "mask";
pub const STAGE_POSE: &str = "pose";
pub const STAGE_CLASSIFY: &str = "classify";
pub const STAGE_ANNOTATE: &str = "annotate";

/// Metric names reported by the frame processor.
pub const METRIC_PEOPLE: &str = "people";
pub const METRIC_VALID_PEOPLE: &str = "valid_people";

/// Observer for pipeline telemetry.
///
/// Use cases report through this trait so the binary can print a run summary
/// while tests stay quiet.
pub trait PipelineLogger: Send {
    fn progress(&mut self, current: usize, total: usize);

    /// Duration of one stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// One sample of a per-frame quantity.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count and sum of a series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Series {
    pub count: usize,
    pub total: f64,
}

impl Series {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Aggregates stage timings and metrics and logs them through `log`.
///
/// Progress lines are emitted every `throttle_frames` frames and on the
/// last frame.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    started: Instant,
    frames_seen: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames_seen: 0,
        }
    }

    pub fn timing_series(&self, stage: &str) -> Option<Series> {
        self.timings.get(stage).copied()
    }

    pub fn metric_series(&self, name: &str) -> Option<Series> {
        self.metrics.get(name).copied()
    }

    /// `None` until something has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Run summary ({} frames, {:.1}s):",
            self.frames_seen,
            elapsed_ms / 1000.0
        )];

        for (stage, series) in &self.timings {
            let share = if elapsed_ms > 0.0 {
                series.total / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:10} avg {:6.1}ms  total {:7.0}ms  ({share:4.1}%)",
                series.mean(),
                series.total
            ));
        }
        for (name, series) in &self.metrics {
            lines.push(format!("  {name:10} avg {:.1}", series.mean()));
        }
        if self.frames_seen > 0 && elapsed_ms > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames_seen as f64 / (elapsed_ms / 1000.0)
            ));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if current % self.throttle_frames == 0 || current == total {
            if total > 0 {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("Classified {current}/{total} frames ({pct:.1}%)");
            } else {
                log::info!("Classified {current} frames");
            }
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings.entry(stage.to_string()).or_default().push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
