use std::time::Duration;

use ndarray::{ArrayView2, ShapeBuilder};
use thiserror::Error;

use crate::shared::video_format::VideoFormat;
use crate::shared::video_geometry::{VideoGeometry, NV12_PLANES};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("buffer is read-only")]
    ReadOnly,
    #[error("plane {plane} needs {needed} bytes but the buffer holds {actual}")]
    TooSmall {
        plane: usize,
        needed: usize,
        actual: usize,
    },
    #[error("plane {plane} stride {stride} is smaller than its row width {row_bytes}")]
    StrideTooSmall {
        plane: usize,
        stride: usize,
        row_bytes: usize,
    },
    #[error("buffer planes overlap")]
    OverlappingPlanes,
    #[error("buffer meta describes {meta_width}x{meta_height}, expected {width}x{height}")]
    SizeMismatch {
        meta_width: u32,
        meta_height: u32,
        width: u32,
        height: u32,
    },
}

/// Per-plane layout attached to a buffer by the pool that allocated it.
///
/// When present it overrides the negotiated geometry's offsets, strides
/// and format during mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoMeta {
    pub format: VideoFormat,
    pub width: u32,
    pub height: u32,
    pub offsets: [usize; NV12_PLANES],
    pub strides: [usize; NV12_PLANES],
}

impl VideoMeta {
    pub fn from_geometry(geometry: &VideoGeometry) -> Self {
        Self {
            format: geometry.format(),
            width: geometry.width(),
            height: geometry.height(),
            offsets: geometry.offsets(),
            strides: geometry.strides(),
        }
    }
}

/// Destination memory for one video frame plus its stamps.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    data: Vec<u8>,
    meta: Option<VideoMeta>,
    read_only: bool,
    offset: Option<u64>,
    pts: Option<Duration>,
    duration: Option<Duration>,
}

impl FrameBuffer {
    /// Allocates a zeroed, writable buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self::from_vec(vec![0; size])
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data,
            meta: None,
            read_only: false,
            offset: None,
            pts: None,
            duration: None,
        }
    }

    pub fn with_meta(mut self, meta: VideoMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn meta(&self) -> Option<&VideoMeta> {
        self.meta.as_ref()
    }

    pub fn set_meta(&mut self, meta: Option<VideoMeta>) {
        self.meta = meta;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Index of the frame within the stream.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn pts(&self) -> Option<Duration> {
        self.pts
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn set_offset(&mut self, offset: Option<u64>) {
        self.offset = offset;
    }

    pub fn set_timestamps(&mut self, pts: Option<Duration>, duration: Option<Duration>) {
        self.pts = pts;
        self.duration = duration;
    }

    pub fn clear_stamps(&mut self) {
        self.offset = None;
        self.pts = None;
        self.duration = None;
    }

    /// Maps the buffer for writing with the layout of `geometry`, or of the
    /// attached [`VideoMeta`] when there is one.
    pub fn map_write(&mut self, geometry: &VideoGeometry) -> Result<VideoFrameMut<'_>, MapError> {
        if self.read_only {
            return Err(MapError::ReadOnly);
        }
        let (format, [luma, chroma]) = self.layout(geometry)?;

        // Split so both planes can be borrowed mutably at once.
        let split = if chroma.len() == 0 {
            luma.end()
        } else {
            chroma.offset
        };
        let (head, tail) = self.data.split_at_mut(split);
        let luma_data = &mut head[luma.offset..luma.end()];
        let chroma_start = chroma.offset.saturating_sub(split);
        let chroma_data = &mut tail[chroma_start..chroma_start + chroma.len()];

        Ok(VideoFrameMut {
            format,
            width: geometry.width(),
            height: geometry.height(),
            planes: [
                PlaneMut::new(luma_data, luma),
                PlaneMut::new(chroma_data, chroma),
            ],
        })
    }

    /// Maps the buffer for reading; same layout rules as [`Self::map_write`].
    pub fn map_read(&self, geometry: &VideoGeometry) -> Result<VideoFrameRef<'_>, MapError> {
        let (format, regions) = self.layout(geometry)?;
        let planes = regions.map(|region| PlaneRef {
            data: &self.data[region.offset..region.end()],
            stride: region.stride,
            rows: region.rows,
            row_bytes: region.row_bytes,
        });
        Ok(VideoFrameRef {
            format,
            width: geometry.width(),
            height: geometry.height(),
            planes,
        })
    }

    fn layout(
        &self,
        geometry: &VideoGeometry,
    ) -> Result<(VideoFormat, [PlaneRegion; NV12_PLANES]), MapError> {
        let (format, offsets, strides) = match &self.meta {
            Some(meta) => {
                if meta.width != geometry.width() || meta.height != geometry.height() {
                    return Err(MapError::SizeMismatch {
                        meta_width: meta.width,
                        meta_height: meta.height,
                        width: geometry.width(),
                        height: geometry.height(),
                    });
                }
                (meta.format, meta.offsets, meta.strides)
            }
            None => (geometry.format(), geometry.offsets(), geometry.strides()),
        };

        let mut regions = [PlaneRegion::default(); NV12_PLANES];
        for (plane, region) in regions.iter_mut().enumerate() {
            *region = PlaneRegion {
                offset: offsets[plane],
                stride: strides[plane],
                rows: geometry.plane_height(plane),
                row_bytes: geometry.plane_width_bytes(plane),
            };
            if region.stride < region.row_bytes {
                return Err(MapError::StrideTooSmall {
                    plane,
                    stride: region.stride,
                    row_bytes: region.row_bytes,
                });
            }
            let needed = region
                .offset
                .checked_add(region.len())
                .unwrap_or(usize::MAX);
            if needed > self.data.len() {
                return Err(MapError::TooSmall {
                    plane,
                    needed,
                    actual: self.data.len(),
                });
            }
        }

        let [luma, chroma] = regions;
        if chroma.len() > 0 && luma.end() > chroma.offset {
            return Err(MapError::OverlappingPlanes);
        }
        Ok((format, regions))
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct PlaneRegion {
    offset: usize,
    stride: usize,
    rows: usize,
    row_bytes: usize,
}

impl PlaneRegion {
    fn len(&self) -> usize {
        self.stride.saturating_mul(self.rows)
    }

    fn end(&self) -> usize {
        self.offset + self.len()
    }
}

/// One writable plane of a mapped frame.
pub struct PlaneMut<'a> {
    data: &'a mut [u8],
    stride: usize,
    rows: usize,
    row_bytes: usize,
}

impl<'a> PlaneMut<'a> {
    fn new(data: &'a mut [u8], region: PlaneRegion) -> Self {
        Self {
            data,
            stride: region.stride,
            rows: region.rows,
            row_bytes: region.row_bytes,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Payload bytes of `row`; the stride padding after it is not exposed.
    pub fn row_mut(&mut self, row: usize) -> &mut [u8] {
        let start = row * self.stride;
        &mut self.data[start..start + self.row_bytes]
    }
}

/// A buffer mapped for writing.
pub struct VideoFrameMut<'a> {
    format: VideoFormat,
    width: u32,
    height: u32,
    planes: [PlaneMut<'a>; NV12_PLANES],
}

impl<'a> VideoFrameMut<'a> {
    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn plane_mut(&mut self, plane: usize) -> &mut PlaneMut<'a> {
        &mut self.planes[plane]
    }

    pub fn planes_mut(&mut self) -> &mut [PlaneMut<'a>; NV12_PLANES] {
        &mut self.planes
    }
}

/// One readable plane of a mapped frame.
pub struct PlaneRef<'a> {
    data: &'a [u8],
    stride: usize,
    rows: usize,
    row_bytes: usize,
}

impl<'a> PlaneRef<'a> {
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn row(&self, row: usize) -> &'a [u8] {
        let start = row * self.stride;
        &self.data[start..start + self.row_bytes]
    }

    /// `rows x row_bytes` view that skips the stride padding.
    pub fn as_ndarray(&self) -> ArrayView2<'a, u8> {
        ArrayView2::from_shape(
            (self.rows, self.row_bytes).strides((self.stride, 1)),
            self.data,
        )
        .expect("Plane data length must match its layout")
    }
}

/// A buffer mapped for reading.
pub struct VideoFrameRef<'a> {
    format: VideoFormat,
    width: u32,
    height: u32,
    planes: [PlaneRef<'a>; NV12_PLANES],
}

impl<'a> VideoFrameRef<'a> {
    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn plane(&self, plane: usize) -> &PlaneRef<'a> {
        &self.planes[plane]
    }

    pub fn planes(&self) -> &[PlaneRef<'a>; NV12_PLANES] {
        &self.planes
    }
}
