use std::path::Path;

use ffmpeg_next::format::context::Output;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use ffmpeg_next::Rational;

use crate::shared::constants::FALLBACK_OUTPUT_FPS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

const STREAM_INDEX: usize = 0;

struct Encoding {
    output: Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: scaling::Context,
    width: u32,
    height: u32,
    time_base: Rational,
    frames_written: usize,
}

impl Encoding {
    /// Moves every packet the encoder has ready into the container.
    fn drain(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let stream_time_base = self
            .output
            .stream(STREAM_INDEX)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();
        let mut packet = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(STREAM_INDEX);
            packet.rescale_ts(self.time_base, stream_time_base);
            packet.write_interleaved(&mut self.output)?;
        }
        Ok(())
    }
}

/// Encodes RGB frames to an MPEG-4 video via ffmpeg-next.
///
/// The output has a single video stream; nothing is carried over from the
/// source container.
pub struct FfmpegWriter {
    encoding: Option<Encoding>,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self { encoding: None }
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer output rate; sources that report no rate get the fallback.
fn output_fps(fps: f64) -> i32 {
    let rounded = fps.round() as i32;
    if rounded > 0 {
        rounded
    } else {
        FALLBACK_OUTPUT_FPS as i32
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut output = ffmpeg_next::format::output(path)?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;
        let mut stream = output.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let fps = output_fps(metadata.fps);
        let time_base = Rational(1, fps);
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        stream.set_parameters(&encoder);
        output.write_header()?;

        let scaler = scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            scaling::Flags::BILINEAR,
        )?;

        log::info!(
            "Writing {} at {fps} fps ({}x{})",
            path.display(),
            metadata.width,
            metadata.height
        );

        self.encoding = Some(Encoding {
            output,
            encoder,
            scaler,
            width: metadata.width,
            height: metadata.height,
            time_base,
            frames_written: 0,
        });
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let encoding = self.encoding.as_mut().ok_or("FfmpegWriter: not opened")?;
        if frame.width() != encoding.width
            || frame.height() != encoding.height
            || frame.channels() != 3
        {
            return Err(format!(
                "FfmpegWriter: expected {}x{} RGB frames, got {}x{}x{}",
                encoding.width,
                encoding.height,
                frame.width(),
                frame.height(),
                frame.channels()
            )
            .into());
        }

        let mut rgb = VideoFrame::new(
            ffmpeg_next::format::Pixel::RGB24,
            encoding.width,
            encoding.height,
        );
        let stride = rgb.stride(0);
        let row_bytes = encoding.width as usize * 3;
        let dst = rgb.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_bytes).enumerate() {
            dst[row * stride..row * stride + row_bytes].copy_from_slice(src);
        }

        let mut yuv = VideoFrame::empty();
        encoding.scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(encoding.frames_written as i64));

        encoding.encoder.send_frame(&yuv)?;
        encoding.drain()?;
        encoding.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut encoding) = self.encoding.take() else {
            return Ok(());
        };
        encoding.encoder.send_eof()?;
        encoding.drain()?;
        encoding.output.write_trailer()?;
        log::info!("Finished writing {} frames", encoding.frames_written);
        Ok(())
    }
}
