use std::collections::VecDeque;

use ndarray::{Array2, Axis};
use thiserror::Error;

use crate::background::domain::background_filter::BackgroundFilter;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
#[error("ground masking requires 3-channel RGB frames, got {0} channels")]
pub struct UnsupportedChannels(pub u8);

/// Thresholds and morphology for the grass mask.
///
/// HSV uses 8-bit OpenCV ranges: hue 0..180, saturation and value 0..255.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroundMaskParams {
    pub low: [u8; 3],
    pub high: [u8; 3],
    pub erode_kernel: usize,
    pub erode_iterations: usize,
    pub dilate_kernel: usize,
    pub dilate_iterations: usize,
}

impl Default for GroundMaskParams {
    fn default() -> Self {
        Self {
            low: [25, 52, 72],
            high: [102, 255, 255],
            erode_kernel: 4,
            erode_iterations: 20,
            dilate_kernel: 10,
            dilate_iterations: 28,
        }
    }
}

/// Keeps the green playing surface and whatever stands on it.
///
/// The green mask is eroded hard to drop thin green areas in the stands,
/// then dilated further than it was eroded so players on the pitch are
/// swallowed back into the mask. Everything outside is zeroed.
pub struct HsvGroundFilter {
    params: GroundMaskParams,
}

impl HsvGroundFilter {
    pub fn new(params: GroundMaskParams) -> Self {
        Self { params }
    }

    /// 255 where the pixel is kept, 0 elsewhere. Shape is `(height, width)`.
    pub fn ground_mask(&self, frame: &Frame) -> Result<Array2<u8>, UnsupportedChannels> {
        if frame.channels() != 3 {
            return Err(UnsupportedChannels(frame.channels()));
        }
        let p = &self.params;
        let pixels = frame.as_ndarray();
        let mut mask = Array2::<u8>::zeros((frame.height() as usize, frame.width() as usize));
        for ((y, x), m) in mask.indexed_iter_mut() {
            let hsv = rgb_to_hsv(pixels[[y, x, 0]], pixels[[y, x, 1]], pixels[[y, x, 2]]);
            let inside = (0..3).all(|c| p.low[c] <= hsv[c] && hsv[c] <= p.high[c]);
            if inside {
                *m = 255;
            }
        }

        morph(&mut mask, p.erode_kernel, p.erode_iterations, Extreme::Min);
        morph(&mut mask, p.dilate_kernel, p.dilate_iterations, Extreme::Max);
        Ok(mask)
    }
}

impl Default for HsvGroundFilter {
    fn default() -> Self {
        Self::new(GroundMaskParams::default())
    }
}

impl BackgroundFilter for HsvGroundFilter {
    fn apply(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>> {
        let mask = self.ground_mask(frame)?;
        let kept = mask.iter().filter(|&&m| m != 0).count();
        log::trace!(
            "Ground mask keeps {kept} of {} pixels in frame {}",
            mask.len(),
            frame.index()
        );

        let mut pixels = frame.as_ndarray_mut();
        for ((y, x), &m) in mask.indexed_iter() {
            if m == 0 {
                pixels[[y, x, 0]] = 0;
                pixels[[y, x, 1]] = 0;
                pixels[[y, x, 2]] = 0;
            }
        }
        Ok(())
    }
}

/// 8-bit RGB to HSV with hue halved into 0..180.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };
    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round().min(255.0) as u8,
        v as u8,
    ]
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Min,
    Max,
}

/// Box erosion (`Min`) or dilation (`Max`) repeated `iterations` times.
///
/// Repeating a k-wide box `n` times equals one pass with a box of
/// `n * (k - 1) + 1` anchored at `n * (k / 2)`, so a single separable pass
/// is done. Samples outside the image are ignored. `imageproc::morphology`
/// only offers centred kernels, so it cannot place an even kernel's anchor
/// at `k / 2` the way OpenCV does.
fn morph(mask: &mut Array2<u8>, kernel: usize, iterations: usize, extreme: Extreme) {
    if kernel <= 1 || iterations == 0 {
        return;
    }
    let size = iterations * (kernel - 1) + 1;
    let before = iterations * (kernel / 2);
    let after = size - 1 - before;

    for axis in [Axis(1), Axis(0)] {
        let mut line = Vec::new();
        for mut lane in mask.lanes_mut(axis) {
            line.clear();
            line.extend(lane.iter().copied());
            let filtered = sliding_extreme(&line, before, after, extreme);
            for (dst, src) in lane.iter_mut().zip(filtered) {
                *dst = src;
            }
        }
    }
}

/// For every `i`, the extreme of `values[i - before ..= i + after]` clipped
/// to the slice, using a monotonic deque.
fn sliding_extreme(values: &[u8], before: usize, after: usize, extreme: Extreme) -> Vec<u8> {
    let n = values.len();
    let mut out = Vec::with_capacity(n);
    let mut window: VecDeque<usize> = VecDeque::new();
    let dominates = |a: u8, b: u8| match extreme {
        Extreme::Min => a <= b,
        Extreme::Max => a >= b,
    };

    let mut next = 0;
    for i in 0..n {
        let hi = (i + after).min(n - 1);
        while next <= hi {
            while let Some(&back) = window.back() {
                if dominates(values[next], values[back]) {
                    window.pop_back();
                } else {
                    break;
                }
            }
            window.push_back(next);
            next += 1;
        }
        let lo = i.saturating_sub(before);
        while let Some(&front) = window.front() {
            if front < lo {
                window.pop_front();
            } else {
                break;
            }
        }
        // The window always contains `i` itself.
        out.push(window.front().map_or(values[i], |&f| values[f]));
    }
    out
}
