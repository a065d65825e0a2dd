use crate::shared::frame_buffer::FrameBuffer;
use crate::shared::video_geometry::VideoGeometry;
use crate::sink::domain::frame_sink::FrameSink;

/// Discards every frame, only counting them.
#[derive(Debug, Default)]
pub struct NullFrameSink {
    frames: u64,
}

impl NullFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for NullFrameSink {
    fn write(
        &mut self,
        _buffer: &FrameBuffer,
        _geometry: &VideoGeometry,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
