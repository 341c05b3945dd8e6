use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Which source frames are handed to the pipeline.
///
/// Frame `i` is kept when `i >= start_frame` and `(i - start_frame)` is a
/// multiple of `frame_step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSampling {
    pub start_frame: usize,
    pub frame_step: usize,
}

impl FrameSampling {
    pub fn new(start_frame: usize, frame_step: usize) -> Self {
        Self {
            start_frame,
            frame_step: frame_step.max(1),
        }
    }

    pub fn includes(&self, index: usize) -> bool {
        index >= self.start_frame && (index - self.start_frame) % self.frame_step == 0
    }

    /// Number of frames kept out of `total`.
    pub fn sampled_count(&self, total: usize) -> usize {
        if total <= self.start_frame {
            return 0;
        }
        (total - self.start_frame).div_ceil(self.frame_step)
    }
}

impl Default for FrameSampling {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

struct Decoding {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

/// Decodes video frames via ffmpeg-next and converts them to RGB24.
///
/// Every packet is decoded so frame indices stay exact; frames outside the
/// sampling are dropped before colour conversion.
pub struct FfmpegReader {
    decoding: Option<Decoding>,
    sampling: FrameSampling,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            decoding: None,
            sampling: FrameSampling::default(),
        }
    }

    pub fn with_sampling(mut self, start_frame: usize, frame_step: usize) -> Self {
        self.sampling = FrameSampling::new(start_frame, frame_step);
        self
    }

    pub fn sampling(&self) -> FrameSampling {
        self.sampling
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    /// `total_frames` in the returned metadata counts sampled frames only.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let input = ffmpeg_next::format::input(path)?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let (width, height) = (decoder.width(), decoder.height());

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let source_frames = stream.frames().max(0) as usize;

        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        log::info!(
            "Opened {}: {width}x{height} @ {fps:.2} fps, {source_frames} frames",
            path.display()
        );

        self.decoding = Some(Decoding {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
        });

        Ok(VideoMetadata {
            width,
            height,
            fps,
            total_frames: self.sampling.sampled_count(source_frames),
            source_path: Some(path.to_path_buf()),
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(decoding) = self.decoding.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        Box::new(FfmpegFrameIter {
            decoding,
            sampling: self.sampling,
            next_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.decoding = None;
    }
}

/// Decodes lazily, one frame per `next` call.
struct FfmpegFrameIter<'a> {
    decoding: &'a mut Decoding,
    sampling: FrameSampling,
    next_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    /// Drains decoded frames until one is inside the sampling.
    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = VideoFrame::empty();
        while self.decoding.decoder.receive_frame(&mut decoded).is_ok() {
            let index = self.next_index;
            self.next_index += 1;
            if !self.sampling.includes(index) {
                continue;
            }

            let mut rgb = VideoFrame::empty();
            if let Err(e) = self.decoding.scaler.run(&decoded, &mut rgb) {
                return Some(Err(Box::new(e)));
            }
            let (width, height) = (self.decoding.width, self.decoding.height);
            let pixels = packed_rgb(&rgb, width, height);
            return Some(Ok(Frame::new(pixels, width, height, 3, index)));
        }
        None
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(result) = self.try_receive() {
            return Some(result);
        }
        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.decoding.input.packets().next() else {
                let _ = self.decoding.decoder.send_eof();
                self.flushing = true;
                let result = self.try_receive();
                self.done = result.is_none();
                return result;
            };
            if stream.index() != self.decoding.stream_index {
                continue;
            }
            if let Err(e) = self.decoding.decoder.send_packet(&packet) {
                log::warn!("Skipping undecodable packet: {e}");
                continue;
            }
            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies an RGB24 ffmpeg frame into a tightly packed buffer, dropping the
/// per-row stride padding.
pub(crate) fn packed_rgb(rgb: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
