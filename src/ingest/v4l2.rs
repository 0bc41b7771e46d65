//! V4L2 camera capture (feature: ingest-v4l2).
//!
//! Opens a local device node, negotiates an RGB24 format at the requested
//! size (falling back to whatever the driver reports when the request is
//! refused) and captures frames through a memory-mapped buffer stream.

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use super::camera::CameraConfig;
use crate::frame::Frame;

pub(crate) struct DeviceCamera {
    config: CameraConfig,
    state: Option<DeviceState>,
    active_width: u32,
    active_height: u32,
    frame_count: u64,
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl DeviceCamera {
    pub(crate) fn open(config: &CameraConfig) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&config.device)
            .with_context(|| format!("open v4l2 device {}", config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        if config.width > 0 && config.height > 0 {
            format.width = config.width;
            format.height = config.height;
        }
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("failed to set format on {}: {}", config.device, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        let active_width = format.width;
        let active_height = format.height;

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "v4l2 capture on {} at {}x{}",
            config.device,
            active_width,
            active_height
        );
        Ok(Self {
            config: config.clone(),
            state: Some(state),
            active_width,
            active_height,
            frame_count: 0,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        let (buf, _meta) = state
            .with_stream_mut(|stream| stream.next())
            .map_err(|err| anyhow::Error::new(err).context("capture v4l2 frame"))?;

        let expected = (self.active_width * self.active_height * 3) as usize;
        let pixels = buf.get(..expected).with_context(|| {
            format!(
                "short v4l2 frame from {}: {} of {} bytes",
                self.config.device,
                buf.len(),
                expected
            )
        })?;

        self.frame_count += 1;
        let image = image::RgbImage::from_raw(self.active_width, self.active_height, pixels.to_vec())
            .context("v4l2 buffer does not match negotiated dimensions")?;
        Ok(Frame::new(image, self.frame_count))
    }

    pub(crate) fn close(&mut self) {
        self.state = None;
    }
}
