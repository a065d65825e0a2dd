use std::io::{self, Read};

use crate::shared::constants::LOG_TARGET;
use crate::shared::flow::{FlowError, FlowResult};
use crate::shared::frame_buffer::FrameBuffer;
use crate::shared::video_format::VideoFormat;
use crate::shared::video_geometry::VideoGeometry;

/// Fills `buffer` with the next frame read from `reader`.
///
/// Rows are read one at a time into their strided position so padding
/// after a row is never written. A read that returns fewer bytes than the
/// row width ends the stream for the whole frame; the partially written
/// buffer is left as-is for the caller to drop.
pub fn fill_frame<R: Read + ?Sized>(
    reader: &mut R,
    geometry: &VideoGeometry,
    buffer: &mut FrameBuffer,
) -> FlowResult {
    let mut frame = match buffer.map_write(geometry) {
        Ok(frame) => frame,
        Err(e) => {
            log::error!(target: LOG_TARGET, "Can't write to buffer: {e}");
            return Err(FlowError::BufferWriteFailed);
        }
    };

    if frame.format() != VideoFormat::Nv12 {
        log::error!(target: LOG_TARGET, "Only NV12 is supported, buffer is {}", frame.format());
        return Err(FlowError::UnsupportedFormat);
    }

    for (index, plane) in frame.planes_mut().iter_mut().enumerate() {
        for row in 0..plane.rows() {
            if !read_row(reader, plane.row_mut(row)) {
                log::debug!(target: LOG_TARGET, "EOS at plane {index} row {row}");
                return Err(FlowError::Eos);
            }
        }
    }

    Ok(())
}

/// Issues a single read for `row`. Returns whether the row was filled.
fn read_row<R: Read + ?Sized>(reader: &mut R, row: &mut [u8]) -> bool {
    loop {
        match reader.read(row) {
            Ok(n) => return n == row.len(),
            // Nothing was transferred, so retrying keeps the row aligned.
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Read failed, treating as EOS: {e}");
                return false;
            }
        }
    }
}
