use crate::shared::frame_buffer::FrameBuffer;
use crate::shared::video_geometry::VideoGeometry;

/// Consumes the frames a source produces.
///
/// Buffers are only borrowed; they go back to the pool right after `write`
/// returns.
pub trait FrameSink: Send {
    /// Whether buffers should carry a `VideoMeta` describing their layout.
    fn wants_video_meta(&self) -> bool {
        false
    }

    fn write(
        &mut self,
        buffer: &FrameBuffer,
        geometry: &VideoGeometry,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes anything still buffered.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
