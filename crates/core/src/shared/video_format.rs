use std::fmt;

/// Raw video formats that may show up in caps or buffer metadata.
///
/// Only [`VideoFormat::Nv12`] can be produced by the source; the other
/// variants exist so foreign layouts can be recognised and rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VideoFormat {
    Nv12,
    Nv21,
    I420,
    Yv12,
    Yuy2,
    Uyvy,
    Rgba,
    Bgra,
}

impl VideoFormat {
    const ALL: [VideoFormat; 8] = [
        Self::Nv12,
        Self::Nv21,
        Self::I420,
        Self::Yv12,
        Self::Yuy2,
        Self::Uyvy,
        Self::Rgba,
        Self::Bgra,
    ];

    /// Looks up a format by its caps name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Nv12 => "NV12",
            Self::Nv21 => "NV21",
            Self::I420 => "I420",
            Self::Yv12 => "YV12",
            Self::Yuy2 => "YUY2",
            Self::Uyvy => "UYVY",
            Self::Rgba => "RGBA",
            Self::Bgra => "BGRA",
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
