use thiserror::Error;

use crate::shared::constants::{DEFAULT_STRIDE_ALIGN, MAX_DIMENSION};
use crate::shared::video_caps::VideoCaps;
use crate::shared::video_format::VideoFormat;

/// Number of planes in the semi-planar NV12 layout (Y, interleaved UV).
pub const NV12_PLANES: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("unsupported format '{0}', only NV12 is supported")]
    UnsupportedFormat(String),
    #[error("dimensions {width}x{height} outside [1, 2147483647]")]
    DimensionsOutOfRange { width: u32, height: u32 },
    #[error("stride alignment {0} is not a power of two")]
    InvalidAlignment(usize),
    #[error("plane {plane} stride {stride} is smaller than its row width {row_bytes}")]
    StrideTooSmall {
        plane: usize,
        stride: usize,
        row_bytes: usize,
    },
    #[error("frame size overflows the address space")]
    TooLarge,
}

/// Concrete per-plane byte layout of one NV12 frame.
///
/// Plane 0 holds `height` rows of luma, plane 1 holds `height / 2` rows of
/// interleaved chroma. Both planes carry `width` bytes of payload per row;
/// the stride may add padding after each row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoGeometry {
    format: VideoFormat,
    width: u32,
    height: u32,
    strides: [usize; NV12_PLANES],
    offsets: [usize; NV12_PLANES],
    plane_heights: [usize; NV12_PLANES],
    size: usize,
}

impl VideoGeometry {
    /// Resolves a format name and frame dimensions into a plane layout.
    ///
    /// Rejects every format except NV12 before anything else is looked at.
    pub fn resolve(format_name: &str, width: u32, height: u32) -> Result<Self, GeometryError> {
        match VideoFormat::from_name(format_name) {
            Some(VideoFormat::Nv12) => {}
            _ => return Err(GeometryError::UnsupportedFormat(format_name.to_string())),
        }
        let dim_range = 1..=MAX_DIMENSION;
        if !dim_range.contains(&width) || !dim_range.contains(&height) {
            return Err(GeometryError::DimensionsOutOfRange { width, height });
        }

        let stride = round_up(width as usize, DEFAULT_STRIDE_ALIGN).ok_or(GeometryError::TooLarge)?;
        Self::build(width, height, [stride, stride])
    }

    pub fn from_caps(caps: &VideoCaps) -> Result<Self, GeometryError> {
        Self::resolve(&caps.format, caps.width, caps.height)
    }

    /// Replaces the per-plane strides, keeping the planes contiguous.
    pub fn with_strides(&self, strides: [usize; NV12_PLANES]) -> Result<Self, GeometryError> {
        for (plane, &stride) in strides.iter().enumerate() {
            let row_bytes = self.plane_width_bytes(plane);
            if stride < row_bytes {
                return Err(GeometryError::StrideTooSmall {
                    plane,
                    stride,
                    row_bytes,
                });
            }
        }
        Self::build(self.width, self.height, strides)
    }

    /// Pads every plane stride up to a multiple of `align`.
    pub fn with_stride_align(&self, align: usize) -> Result<Self, GeometryError> {
        if !align.is_power_of_two() {
            return Err(GeometryError::InvalidAlignment(align));
        }
        let mut strides = self.strides;
        for stride in &mut strides {
            *stride = round_up(*stride, align).ok_or(GeometryError::TooLarge)?;
        }
        self.with_strides(strides)
    }

    fn build(width: u32, height: u32, strides: [usize; NV12_PLANES]) -> Result<Self, GeometryError> {
        let rows = height as usize;
        let plane_heights = [rows, rows / 2];

        let luma_size = strides[0]
            .checked_mul(plane_heights[0])
            .ok_or(GeometryError::TooLarge)?;
        let chroma_size = strides[1]
            .checked_mul(plane_heights[1])
            .ok_or(GeometryError::TooLarge)?;
        let size = luma_size
            .checked_add(chroma_size)
            .ok_or(GeometryError::TooLarge)?;

        Ok(Self {
            format: VideoFormat::Nv12,
            width,
            height,
            strides,
            offsets: [0, luma_size],
            plane_heights,
            size,
        })
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn plane_count(&self) -> usize {
        NV12_PLANES
    }

    pub fn strides(&self) -> [usize; NV12_PLANES] {
        self.strides
    }

    pub fn offsets(&self) -> [usize; NV12_PLANES] {
        self.offsets
    }

    pub fn stride(&self, plane: usize) -> usize {
        self.strides[plane]
    }

    pub fn offset(&self, plane: usize) -> usize {
        self.offsets[plane]
    }

    pub fn plane_height(&self, plane: usize) -> usize {
        self.plane_heights[plane]
    }

    /// Payload bytes per row. The chroma plane interleaves U and V, so its
    /// rows are as wide in bytes as the luma rows.
    pub fn plane_width_bytes(&self, _plane: usize) -> usize {
        self.width as usize
    }

    /// Allocation size of one frame, stride padding included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Bytes one frame consumes from a tightly packed source.
    pub fn frame_bytes(&self) -> usize {
        (0..NV12_PLANES)
            .map(|plane| self.plane_width_bytes(plane) * self.plane_height(plane))
            .sum()
    }
}

fn round_up(value: usize, align: usize) -> Option<usize> {
    Some(value.checked_add(align - 1)? & !(align - 1))
}
