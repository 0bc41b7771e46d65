//! MJPEG AVI recording.
//!
//! Annotated frames are JPEG-encoded and appended to a RIFF AVI container
//! with a single "vids"/"MJPG" stream and a keyframe-only idx1 index. The
//! header carries placeholder sizes while recording; `finish` seeks back and
//! patches them, so an unfinished file is detectable as truncated.
//!
//! Every frame must match the dimensions declared at creation; the recorder
//! never rescales.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::codecs::jpeg::JpegEncoder;

use crate::frame::Frame;

const JPEG_QUALITY: u8 = 85;
const AVIF_HASINDEX: u32 = 0x0000_0010;
const AVIIF_KEYFRAME: u32 = 0x0000_0010;

// Fixed header layout offsets, patched on finish.
const OFFSET_RIFF_SIZE: u64 = 4;
const OFFSET_TOTAL_FRAMES: u64 = 48;
const OFFSET_STREAM_LENGTH: u64 = 140;

pub struct MjpegAviRecorder {
    writer: BufWriter<File>,
    width: u32,
    height: u32,
    movi_size_pos: u64,
    movi_data_start: u64,
    index: Vec<IndexEntry>,
    frame_count: u32,
}

struct IndexEntry {
    offset: u32,
    length: u32,
}

impl MjpegAviRecorder {
    pub fn create(path: &Path, width: u32, height: u32, fps: u32) -> Result<Self> {
        ensure!(width > 0 && height > 0, "recording dimensions must be non-zero");
        ensure!(fps > 0, "recording frame rate must be non-zero");
        let file = File::create(path)
            .with_context(|| format!("create recording '{}'", path.display()))?;
        let mut writer = BufWriter::new(file);

        write_headers(&mut writer, width, height, fps)?;
        let movi_size_pos = writer.stream_position()? + 4;
        writer.write_all(b"LIST")?;
        write_u32(&mut writer, 0)?; // movi size, patched on finish
        writer.write_all(b"movi")?;
        let movi_data_start = writer.stream_position()?;

        log::info!(
            "recording {}x{} MJPEG at {} fps to {}",
            width,
            height,
            fps,
            path.display()
        );
        Ok(Self {
            writer,
            width,
            height,
            movi_size_pos,
            movi_data_start,
            index: Vec::new(),
            frame_count: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        ensure!(
            frame.width() == self.width && frame.height() == self.height,
            "recorded frame is {}x{}, expected {}x{}",
            frame.width(),
            frame.height(),
            self.width,
            self.height
        );

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
            .encode(
                frame.image.as_raw(),
                self.width,
                self.height,
                image::ExtendedColorType::Rgb8,
            )
            .context("encode frame as JPEG")?;

        // idx1 offsets are relative to the 'movi' fourcc.
        let chunk_pos = self.writer.stream_position()?;
        let offset = (chunk_pos - self.movi_data_start + 4) as u32;
        self.writer.write_all(b"00dc")?;
        write_u32(&mut self.writer, jpeg.len() as u32)?;
        self.writer.write_all(&jpeg)?;
        if jpeg.len() % 2 == 1 {
            self.writer.write_all(&[0])?;
        }

        self.index.push(IndexEntry {
            offset,
            length: jpeg.len() as u32,
        });
        self.frame_count += 1;
        Ok(())
    }

    /// Write the index, patch the header sizes and flush. Returns the number
    /// of frames written.
    pub fn finish(mut self) -> Result<u32> {
        let movi_end = self.writer.stream_position()?;
        let movi_size = (movi_end - self.movi_size_pos - 4) as u32;

        self.writer.write_all(b"idx1")?;
        write_u32(&mut self.writer, self.index.len() as u32 * 16)?;
        for entry in &self.index {
            self.writer.write_all(b"00dc")?;
            write_u32(&mut self.writer, AVIIF_KEYFRAME)?;
            write_u32(&mut self.writer, entry.offset)?;
            write_u32(&mut self.writer, entry.length)?;
        }

        let file_end = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(OFFSET_RIFF_SIZE))?;
        write_u32(&mut self.writer, (file_end - 8) as u32)?;
        self.writer.seek(SeekFrom::Start(OFFSET_TOTAL_FRAMES))?;
        write_u32(&mut self.writer, self.frame_count)?;
        self.writer.seek(SeekFrom::Start(OFFSET_STREAM_LENGTH))?;
        write_u32(&mut self.writer, self.frame_count)?;
        self.writer.seek(SeekFrom::Start(self.movi_size_pos))?;
        write_u32(&mut self.writer, movi_size)?;
        self.writer.flush().context("flush recording")?;

        log::info!("recording finished: {} frames", self.frame_count);
        Ok(self.frame_count)
    }
}

fn write_headers<W: Write>(writer: &mut W, width: u32, height: u32, fps: u32) -> Result<()> {
    writer.write_all(b"RIFF")?;
    write_u32(writer, 0)?; // riff size, patched on finish
    writer.write_all(b"AVI ")?;

    // hdrl list: avih (8 + 56) + strl list (8 + 4 + 64 + 48) = 188 after the
    // 'hdrl' fourcc.
    writer.write_all(b"LIST")?;
    write_u32(writer, 4 + 64 + 8 + 4 + 64 + 48)?;
    writer.write_all(b"hdrl")?;

    writer.write_all(b"avih")?;
    write_u32(writer, 56)?;
    write_u32(writer, 1_000_000 / fps)?; // microseconds per frame
    write_u32(writer, 0)?; // max bytes per second
    write_u32(writer, 0)?; // padding granularity
    write_u32(writer, AVIF_HASINDEX)?;
    write_u32(writer, 0)?; // total frames, patched on finish
    write_u32(writer, 0)?; // initial frames
    write_u32(writer, 1)?; // stream count
    write_u32(writer, 0)?; // suggested buffer size
    write_u32(writer, width)?;
    write_u32(writer, height)?;
    for _ in 0..4 {
        write_u32(writer, 0)?; // reserved
    }

    writer.write_all(b"LIST")?;
    write_u32(writer, 4 + 64 + 48)?;
    writer.write_all(b"strl")?;

    writer.write_all(b"strh")?;
    write_u32(writer, 56)?;
    writer.write_all(b"vids")?;
    writer.write_all(b"MJPG")?;
    write_u32(writer, 0)?; // flags
    write_u32(writer, 0)?; // priority + language
    write_u32(writer, 0)?; // initial frames
    write_u32(writer, 1)?; // scale
    write_u32(writer, fps)?; // rate; rate/scale = fps
    write_u32(writer, 0)?; // start
    write_u32(writer, 0)?; // stream length, patched on finish
    write_u32(writer, 0)?; // suggested buffer size
    write_u32(writer, u32::MAX)?; // quality: driver default
    write_u32(writer, 0)?; // sample size
    write_u16(writer, 0)?; // frame rect
    write_u16(writer, 0)?;
    write_u16(writer, width as u16)?;
    write_u16(writer, height as u16)?;

    // BITMAPINFOHEADER
    writer.write_all(b"strf")?;
    write_u32(writer, 40)?;
    write_u32(writer, 40)?; // biSize
    write_u32(writer, width)?;
    write_u32(writer, height)?;
    write_u16(writer, 1)?; // planes
    write_u16(writer, 24)?; // bits per pixel
    writer.write_all(b"MJPG")?; // compression
    write_u32(writer, width * height * 3)?;
    for _ in 0..4 {
        write_u32(writer, 0)?; // resolution and palette fields
    }
    Ok(())
}

fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_u16<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn flat_frame(width: u32, height: u32, sequence: u64) -> Frame {
        let image = RgbImage::from_pixel(width, height, image::Rgb([80, 40, 200]));
        Frame::new(image, sequence)
    }

    #[test]
    fn recorded_file_is_a_patched_mjpeg_avi() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("clip.avi");

        let mut recorder = MjpegAviRecorder::create(&path, 64, 48, 30).expect("create recorder");
        for sequence in 1..=3 {
            recorder
                .write_frame(&flat_frame(64, 48, sequence))
                .expect("write frame");
        }
        let frames = recorder.finish().expect("finish");
        assert_eq!(frames, 3);

        let bytes = std::fs::read(&path).expect("read recording");
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"AVI ");
        assert!(bytes.windows(4).any(|w| w == b"MJPG"));
        assert!(bytes.windows(4).any(|w| w == b"movi"));
        assert!(bytes.windows(4).any(|w| w == b"idx1"));

        let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(riff_size as usize, bytes.len() - 8);
        let total_frames =
            u32::from_le_bytes(bytes[48..52].try_into().unwrap());
        assert_eq!(total_frames, 3);
    }

    #[test]
    fn mismatched_frame_dimensions_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("clip.avi");
        let mut recorder = MjpegAviRecorder::create(&path, 64, 48, 30).expect("create recorder");
        let err = recorder
            .write_frame(&flat_frame(32, 32, 1))
            .expect_err("wrong dimensions");
        assert!(err.to_string().contains("expected 64x48"));
    }

    #[test]
    fn zero_dimensions_or_rate_are_rejected_at_create() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(MjpegAviRecorder::create(&dir.path().join("a.avi"), 0, 48, 30).is_err());
        assert!(MjpegAviRecorder::create(&dir.path().join("b.avi"), 64, 48, 0).is_err());
    }
}
