//! FFmpeg-backed video file decoding (feature: ingest-video-ffmpeg).
//!
//! Frames are decoded in-memory and scaled to RGB24 at the stream's native
//! dimensions. End-of-file drains the decoder and then reports clean
//! exhaustion.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;

use crate::frame::Frame;

pub(crate) struct FfmpegVideoSource {
    input: Option<ffmpeg::format::context::Input>,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    frame_count: u64,
    eof_sent: bool,
    drained: bool,
}

impl FfmpegVideoSource {
    pub(crate) fn open(path: &str) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&path)
            .with_context(|| format!("failed to open video '{}' with ffmpeg", path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow::anyhow!("file '{}' has no video track", path))?;
        let stream_index = input_stream.index();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!("video source: {} (ffmpeg)", path);
        Ok(Self {
            input: Some(input),
            stream_index,
            decoder,
            scaler,
            frame_count: 0,
            eof_sent: false,
            drained: false,
        })
    }

    /// Next decoded frame, or `None` at end-of-file.
    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.drained {
            return Ok(None);
        }
        let input = self.input.as_mut().context("video source closed")?;

        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb_frame = ffmpeg::frame::Video::empty();

        if !self.eof_sent {
            for (stream, packet) in input.packets() {
                if stream.index() != self.stream_index {
                    continue;
                }
                self.decoder
                    .send_packet(&packet)
                    .context("send packet to ffmpeg decoder")?;
                if self.decoder.receive_frame(&mut decoded).is_ok() {
                    self.scaler
                        .run(&decoded, &mut rgb_frame)
                        .context("scale frame to RGB")?;
                    self.frame_count += 1;
                    return Ok(Some(frame_from_rgb(&rgb_frame, self.frame_count)?));
                }
            }
            // No packets left: flush exactly once. The decoder may still
            // buffer several frames (B-frame streams), drained one per call
            // below.
            self.decoder.send_eof().context("flush ffmpeg decoder")?;
            self.eof_sent = true;
        }

        if self.decoder.receive_frame(&mut decoded).is_ok() {
            self.scaler
                .run(&decoded, &mut rgb_frame)
                .context("scale frame to RGB")?;
            self.frame_count += 1;
            return Ok(Some(frame_from_rgb(&rgb_frame, self.frame_count)?));
        }
        self.drained = true;
        Ok(None)
    }

    pub(crate) fn close(&mut self) {
        self.input = None;
    }
}

fn frame_from_rgb(frame: &ffmpeg::frame::Video, sequence: u64) -> Result<Frame> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    let pixels = if stride == row_bytes {
        data.to_vec()
    } else {
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let end = start + row_bytes;
            pixels.extend_from_slice(
                data.get(start..end)
                    .context("ffmpeg frame row is out of bounds")?,
            );
        }
        pixels
    };

    let image = image::RgbImage::from_raw(width, height, pixels)
        .context("ffmpeg frame does not match reported dimensions")?;
    Ok(Frame::new(image, sequence))
}
