use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{ImageBuffer, Rgb};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::classification::domain::role_classifier::{Role, RoleAnnotation};
use crate::shared::frame::Frame;

pub const DEFAULT_LINE_THICKNESS: u32 = 2;
const LABEL_SCALE: f32 = 18.0;
const LABEL_GAP: i32 = 20;

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("annotation requires 3-channel RGB frames, got {0} channels")]
    UnsupportedChannels(u8),
    #[error("frame buffer does not match its {width}x{height} dimensions")]
    BufferSize { width: u32, height: u32 },
    #[error("failed to read font {path}: {source}")]
    FontRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a usable TrueType/OpenType font")]
    InvalidFont(PathBuf),
}

pub fn role_color(role: Role) -> Rgb<u8> {
    match role {
        Role::Striker => Rgb([255, 0, 0]),
        Role::Goalkeeper => Rgb([0, 0, 255]),
        Role::Referee => Rgb([255, 255, 0]),
    }
}

/// Draws a coloured box per classified person, labelled with its role when
/// a font is available.
pub struct RoleBoxAnnotator {
    thickness: u32,
    font: Option<FontVec>,
}

impl RoleBoxAnnotator {
    pub fn new(thickness: u32) -> Self {
        Self {
            thickness: thickness.max(1),
            font: None,
        }
    }

    pub fn with_font_file(mut self, path: &Path) -> Result<Self, AnnotatorError> {
        let bytes = std::fs::read(path).map_err(|source| AnnotatorError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        let font =
            FontVec::try_from_vec(bytes).map_err(|_| AnnotatorError::InvalidFont(path.to_path_buf()))?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

impl Default for RoleBoxAnnotator {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_THICKNESS)
    }
}

impl FrameAnnotator for RoleBoxAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        annotations: &[RoleAnnotation],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(AnnotatorError::UnsupportedChannels(frame.channels()).into());
        }
        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Ok(());
        }
        let mut img: ImageBuffer<Rgb<u8>, &mut [u8]> =
            ImageBuffer::from_raw(width, height, frame.data_mut())
                .ok_or(AnnotatorError::BufferSize { width, height })?;

        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;

        for annotation in annotations {
            let bbox = &annotation.bbox;
            let x1 = (bbox.min_x.round() as i32).clamp(0, max_x);
            let y1 = (bbox.min_y.round() as i32).clamp(0, max_y);
            let x2 = (bbox.max_x.round() as i32).clamp(0, max_x);
            let y2 = (bbox.max_y.round() as i32).clamp(0, max_y);
            if x2 <= x1 || y2 <= y1 {
                log::debug!("Skipping degenerate box for {:?}", annotation.detection);
                continue;
            }

            let color = role_color(annotation.role);
            // Thickness grows inward so the outer edge stays on the box.
            for t in 0..self.thickness as i32 {
                let tx1 = x1 + t;
                let ty1 = y1 + t;
                let tx2 = x2 - t;
                let ty2 = y2 - t;
                if tx2 <= tx1 || ty2 <= ty1 {
                    break;
                }
                let rect = Rect::at(tx1, ty1).of_size((tx2 - tx1 + 1) as u32, (ty2 - ty1 + 1) as u32);
                draw_hollow_rect_mut(&mut img, rect, color);
            }

            if let Some(font) = &self.font {
                let text_y = if y1 > LABEL_GAP { y1 - LABEL_GAP } else { y2 + 5 };
                if text_y <= max_y {
                    draw_text_mut(
                        &mut img,
                        color,
                        x1,
                        text_y,
                        PxScale::from(LABEL_SCALE),
                        font,
                        annotation.role.label(),
                    );
                }
            }
        }

        Ok(())
    }
}
