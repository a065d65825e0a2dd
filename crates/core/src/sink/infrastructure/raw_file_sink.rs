use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::shared::frame_buffer::FrameBuffer;
use crate::shared::video_geometry::VideoGeometry;
use crate::sink::domain::frame_sink::FrameSink;

/// Writes frames back out as tightly packed NV12, dropping stride padding.
///
/// Feeding a source's output through this sink reproduces the frame
/// aligned prefix of the input file.
pub struct RawFileSink {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    video_meta: bool,
    bytes_written: u64,
}

impl RawFileSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path: path.to_path_buf(),
            video_meta: false,
            bytes_written: 0,
        })
    }

    /// Ask for buffers with explicit plane layout metadata.
    pub fn with_video_meta(mut self, video_meta: bool) -> Self {
        self.video_meta = video_meta;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl FrameSink for RawFileSink {
    fn wants_video_meta(&self) -> bool {
        self.video_meta
    }

    fn write(
        &mut self,
        buffer: &FrameBuffer,
        geometry: &VideoGeometry,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let writer = self.writer.as_mut().ok_or("RawFileSink: already closed")?;
        let frame = buffer.map_read(geometry)?;
        for plane in frame.planes() {
            for row in 0..plane.rows() {
                let bytes = plane.row(row);
                writer.write_all(bytes)?;
                self.bytes_written += bytes.len() as u64;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
