/// `log` target shared by every component of the element.
pub const LOG_TARGET: &str = "rawvideosrc";

pub const ELEMENT_NAME: &str = "rawvideosrc";
pub const ELEMENT_LONG_NAME: &str = "Raw Video File Source";
pub const ELEMENT_KLASS: &str = "Source/File";
pub const ELEMENT_DESCRIPTION: &str = "Read from raw video file(NV12 only)";

/// Media type accepted by `set_caps`.
pub const RAW_VIDEO_MEDIA_TYPE: &str = "video/x-raw";

/// Upper bound for width, height and the framerate numerator.
pub const MAX_DIMENSION: u32 = i32::MAX as u32;

/// Caps advertised on the source pad.
pub const CAPS_TEMPLATE: &str = "video/x-raw,\
    framerate = (fraction)[0/1, 2147483647/1],\
    width = (int)[1, 2147483647],\
    height = (int)[1, 2147483647]";

/// Row alignment of the default NV12 layout.
pub const DEFAULT_STRIDE_ALIGN: usize = 4;
