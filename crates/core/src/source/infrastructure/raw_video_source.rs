use std::path::Path;
use std::sync::Arc;

use crate::allocation::domain::allocation_negotiator::{self, AllocationError};
use crate::allocation::domain::allocation_query::AllocationQuery;
use crate::allocation::infrastructure::buffer_pool::BufferPool;
use crate::filling::domain::frame_filler::fill_frame;
use crate::shared::constants::{ELEMENT_NAME, LOG_TARGET};
use crate::shared::flow::{FlowError, FlowResult};
use crate::shared::frame_buffer::FrameBuffer;
use crate::shared::video_caps::VideoCaps;
use crate::shared::video_geometry::VideoGeometry;
use crate::source::domain::push_source::{PushSource, SetCapsError};
use crate::source::domain::source_error::{SettingsError, SourceError};
use crate::source::infrastructure::file_byte_source::FileByteSource;

/// Reads NV12 frames from a raw video file on the local file system.
///
/// The file is open exactly while the source is started; `location` can
/// only be changed while it is stopped.
#[derive(Debug, Default)]
pub struct RawVideoSource {
    location: Option<String>,
    source: Option<FileByteSource>,
    caps: Option<VideoCaps>,
    geometry: Option<VideoGeometry>,
    pool: Option<Arc<BufferPool>>,
}

impl RawVideoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successfully set location.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Sets or clears the file to read from. Fails, keeping the current
    /// value, while a file is open.
    pub fn set_location(&mut self, location: Option<&str>) -> Result<(), SettingsError> {
        if self.source.is_some() {
            log::warn!(
                target: LOG_TARGET,
                "Changing the location on {ELEMENT_NAME} when a file is open is not supported"
            );
            return Err(SettingsError::WrongState);
        }
        self.location = location.map(str::to_string);
        match &self.location {
            Some(location) => log::info!(target: LOG_TARGET, "filename : {location}"),
            None => log::info!(target: LOG_TARGET, "filename cleared"),
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Frames read since the last start, 0 while stopped.
    pub fn frames_read(&self) -> u64 {
        self.source.as_ref().map_or(0, FileByteSource::frames_read)
    }

    pub fn caps(&self) -> Option<&VideoCaps> {
        self.caps.as_ref()
    }
}

impl PushSource for RawVideoSource {
    fn start(&mut self) -> Result<(), SourceError> {
        if self.source.is_some() {
            return Err(SourceError::AlreadyOpen);
        }
        let location = self.location.as_deref().unwrap_or_default();
        let source = FileByteSource::open(Path::new(location)).map_err(|e| {
            log::error!(target: LOG_TARGET, "{e}");
            e
        })?;
        self.source = Some(source);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(source) = self.source.take() {
            source.close();
        }
        if let Some(pool) = self.pool.take() {
            if let Err(e) = pool.set_active(false) {
                log::warn!(target: LOG_TARGET, "Failed to deactivate buffer pool: {e}");
            }
        }
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn set_caps(&mut self, caps: &VideoCaps) -> Result<(), SetCapsError> {
        log::debug!(target: LOG_TARGET, "Setting caps {caps}");
        caps.validate()?;
        let geometry = VideoGeometry::from_caps(caps).map_err(|e| {
            log::debug!(target: LOG_TARGET, "Failed to parse caps: {e}");
            e
        })?;
        self.caps = Some(caps.clone());
        self.geometry = Some(geometry);
        Ok(())
    }

    fn geometry(&self) -> Option<&VideoGeometry> {
        self.geometry.as_ref()
    }

    fn decide_allocation(
        &mut self,
        query: &mut AllocationQuery,
    ) -> Result<Arc<BufferPool>, AllocationError> {
        let geometry = self.geometry.as_ref().ok_or(AllocationError::NotNegotiated)?;
        if let Some(previous) = self.pool.take() {
            previous.set_active(false)?;
        }
        let pool = allocation_negotiator::decide_allocation(query, geometry)?;
        pool.set_active(true)?;
        self.pool = Some(Arc::clone(&pool));
        Ok(pool)
    }

    fn fill(&mut self, buffer: &mut FrameBuffer) -> FlowResult {
        let Some(source) = self.source.as_mut() else {
            return Err(FlowError::Flushing);
        };
        let Some(geometry) = self.geometry.as_ref() else {
            return Err(FlowError::NotNegotiated);
        };

        fill_frame(source, geometry, buffer)?;

        let index = source.advance_frame();
        buffer.set_offset(Some(index));
        let framerate = self.caps.as_ref().map(|caps| caps.framerate).unwrap_or_default();
        buffer.set_timestamps(framerate.timestamp(index), framerate.frame_duration(index));
        Ok(())
    }
}
