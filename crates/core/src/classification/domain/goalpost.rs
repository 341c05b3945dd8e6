use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::shared::constants::DEFAULT_GOALPOST;
use crate::shared::frame::Frame;

#[derive(Error, Debug, PartialEq)]
pub enum GoalpostParseError {
    #[error("expected 4 comma-separated values x,y,x2,y2, got {0}")]
    WrongCount(usize),
    #[error("invalid goalpost coordinate '{0}'")]
    InvalidNumber(String),
    #[error("goalpost must satisfy x < x2 and y < y2")]
    Inverted,
}

/// Goal mouth rectangle in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GoalpostRegion {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub y2: f64,
}

impl GoalpostRegion {
    pub fn new(x: f64, y: f64, x2: f64, y2: f64) -> Self {
        Self { x, y, x2, y2 }
    }

    /// Half the rectangle's width and height.
    ///
    /// Deliberately the extent midpoint rather than the rectangle's centre in
    /// the frame: classification results depend on this exact point.
    pub fn center(&self) -> (f64, f64) {
        ((self.x2 - self.x) / 2.0, (self.y2 - self.y) / 2.0)
    }

    /// Open-interval containment; points on an edge are outside.
    pub fn contains_strictly(&self, (px, py): (f64, f64)) -> bool {
        self.x < px && px < self.x2 && self.y < py && py < self.y2
    }

    pub fn distance_to_center(&self, point: (f64, f64)) -> f64 {
        let (cx, cy) = self.center();
        (point.0 - cx).hypot(point.1 - cy)
    }
}

impl Default for GoalpostRegion {
    fn default() -> Self {
        let (x, y, x2, y2) = DEFAULT_GOALPOST;
        Self::new(x, y, x2, y2)
    }
}

impl FromStr for GoalpostRegion {
    type Err = GoalpostParseError;

    /// Parses `x,y,x2,y2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GoalpostParseError::WrongCount(parts.len()));
        }
        let mut values = [0.0; 4];
        for (v, p) in values.iter_mut().zip(&parts) {
            *v = p
                .parse()
                .map_err(|_| GoalpostParseError::InvalidNumber(p.to_string()))?;
        }
        let [x, y, x2, y2] = values;
        if x >= x2 || y >= y2 {
            return Err(GoalpostParseError::Inverted);
        }
        Ok(Self::new(x, y, x2, y2))
    }
}

/// Domain interface for finding the goal in a frame.
pub trait GoalpostLocator: Send {
    fn locate(&mut self, frame: &Frame) -> GoalpostRegion;
}
