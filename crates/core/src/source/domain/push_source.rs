use std::sync::Arc;

use crate::allocation::domain::allocation_negotiator::AllocationError;
use crate::allocation::domain::allocation_query::AllocationQuery;
use crate::allocation::infrastructure::buffer_pool::BufferPool;
use crate::shared::flow::FlowResult;
use crate::shared::frame_buffer::FrameBuffer;
use crate::shared::video_caps::{CapsError, VideoCaps};
use crate::shared::video_geometry::{GeometryError, VideoGeometry};
use crate::source::domain::source_error::SourceError;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetCapsError {
    #[error("invalid caps: {0}")]
    Caps(#[from] CapsError),
    #[error("cannot resolve caps: {0}")]
    Geometry(#[from] GeometryError),
}

/// A source that fills caller-provided buffers, one frame per call.
///
/// The pipeline calls these strictly in sequence: `start`, `set_caps`,
/// `decide_allocation`, `fill` until it returns an error, then `stop`.
pub trait PushSource: Send {
    /// Opens the underlying byte source.
    fn start(&mut self) -> Result<(), SourceError>;

    /// Closes the byte source. Calling it when nothing is open is a no-op.
    fn stop(&mut self);

    fn is_seekable(&self) -> bool;

    /// Accepts negotiated caps and resolves them into a frame geometry.
    fn set_caps(&mut self, caps: &VideoCaps) -> Result<(), SetCapsError>;

    /// Geometry resolved by the last successful `set_caps`.
    fn geometry(&self) -> Option<&VideoGeometry>;

    /// Picks and activates the pool buffers will be acquired from.
    fn decide_allocation(
        &mut self,
        query: &mut AllocationQuery,
    ) -> Result<Arc<BufferPool>, AllocationError>;

    /// Fills `buffer` with the next frame.
    fn fill(&mut self, buffer: &mut FrameBuffer) -> FlowResult;
}
