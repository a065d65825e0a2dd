use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::shared::constants::LOG_TARGET;
use crate::shared::frame_buffer::{FrameBuffer, VideoMeta};
use crate::shared::video_caps::VideoCaps;
use crate::shared::video_geometry::{GeometryError, VideoGeometry};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("buffer pool is not active")]
    Inactive,
    #[error("buffer pool is active and cannot be reconfigured")]
    Active,
    #[error("buffer pool has no caps configured")]
    NotConfigured,
    #[error("buffer pool caps are unusable: {0}")]
    InvalidCaps(#[from] GeometryError),
    #[error("all {0} buffers of the pool are in use")]
    Exhausted(u32),
}

/// Parameters a pool allocates with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolConfig {
    caps: Option<VideoCaps>,
    size: usize,
    min: u32,
    max: u32,
    video_meta: bool,
    stride_align: Option<usize>,
}

impl PoolConfig {
    pub fn set_params(&mut self, caps: &VideoCaps, size: usize, min: u32, max: u32) {
        self.caps = Some(caps.clone());
        self.size = size;
        self.min = min;
        self.max = max;
    }

    pub fn caps(&self) -> Option<&VideoCaps> {
        self.caps.as_ref()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Attach a [`VideoMeta`] describing the plane layout to every buffer.
    pub fn add_video_meta_option(&mut self) {
        self.video_meta = true;
    }

    pub fn has_video_meta(&self) -> bool {
        self.video_meta
    }

    /// Pads plane strides to `align` bytes. Only honoured together with the
    /// video meta option, since consumers could not find the rows otherwise.
    pub fn set_stride_align(&mut self, align: usize) {
        self.stride_align = Some(align);
    }

    pub fn stride_align(&self) -> Option<usize> {
        self.stride_align
    }
}

#[derive(Debug, Default)]
struct PoolState {
    config: PoolConfig,
    active: bool,
    meta: Option<VideoMeta>,
    alloc_size: usize,
    allocated: u32,
    free: Vec<FrameBuffer>,
}

/// Recycles frame buffers between fills.
///
/// Shared between the allocation query and the element through an `Arc`,
/// hence the interior lock.
#[derive(Debug, Default)]
pub struct BufferPool {
    state: Mutex<PoolState>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> PoolConfig {
        self.state().config.clone()
    }

    pub fn set_config(&self, config: PoolConfig) -> Result<(), PoolError> {
        let mut state = self.state();
        if state.active {
            return Err(PoolError::Active);
        }
        state.config = config;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    /// Activating resolves the configured caps into a buffer layout and
    /// preallocates `min` buffers. Deactivating drops every free buffer.
    pub fn set_active(&self, active: bool) -> Result<(), PoolError> {
        let mut state = self.state();
        if state.active == active {
            return Ok(());
        }
        if !active {
            state.free.clear();
            state.allocated = 0;
            state.active = false;
            return Ok(());
        }

        let caps = state.config.caps.as_ref().ok_or(PoolError::NotConfigured)?;
        let mut geometry = VideoGeometry::from_caps(caps)?;
        let meta = if state.config.video_meta {
            if let Some(align) = state.config.stride_align {
                geometry = geometry.with_stride_align(align)?;
            }
            Some(VideoMeta::from_geometry(&geometry))
        } else {
            None
        };

        state.alloc_size = state.config.size.max(geometry.size());
        state.meta = meta;
        state.allocated = 0;
        state.free.clear();
        for _ in 0..state.config.min {
            let buffer = allocate(&mut state);
            state.free.push(buffer);
        }
        state.active = true;

        log::debug!(
            target: LOG_TARGET,
            "Buffer pool active: size={} min={} max={} video_meta={}",
            state.alloc_size,
            state.config.min,
            state.config.max,
            state.meta.is_some()
        );
        Ok(())
    }

    pub fn acquire(&self) -> Result<FrameBuffer, PoolError> {
        let mut state = self.state();
        if !state.active {
            return Err(PoolError::Inactive);
        }
        if let Some(buffer) = state.free.pop() {
            return Ok(buffer);
        }
        let max = state.config.max;
        if max > 0 && state.allocated >= max {
            return Err(PoolError::Exhausted(max));
        }
        Ok(allocate(&mut state))
    }

    /// Returns a buffer for reuse. Buffers from an inactive pool or with a
    /// foreign size are dropped.
    pub fn release(&self, mut buffer: FrameBuffer) {
        let mut state = self.state();
        if !state.active || buffer.len() != state.alloc_size {
            return;
        }
        buffer.clear_stamps();
        buffer.set_read_only(false);
        buffer.set_meta(state.meta.clone());
        state.free.push(buffer);
    }

    /// Buffers currently waiting in the pool.
    pub fn free_count(&self) -> usize {
        self.state().free.len()
    }
}

fn allocate(state: &mut PoolState) -> FrameBuffer {
    state.allocated += 1;
    let mut buffer = FrameBuffer::new(state.alloc_size);
    buffer.set_meta(state.meta.clone());
    buffer
}
