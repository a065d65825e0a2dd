use std::fmt;

use thiserror::Error;

use crate::shared::constants::{MAX_DIMENSION, RAW_VIDEO_MEDIA_TYPE};
use crate::shared::fraction::Fraction;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapsError {
    #[error("unsupported media type '{0}', expected video/x-raw")]
    NotRawVideo(String),
    #[error("dimensions {width}x{height} outside [1, 2147483647]")]
    DimensionsOutOfRange { width: u32, height: u32 },
    #[error("framerate {0} outside [0/1, 2147483647/1]")]
    FramerateOutOfRange(Fraction),
}

/// Negotiated format descriptor handed to the source by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoCaps {
    pub media_type: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub framerate: Fraction,
}

impl VideoCaps {
    /// `video/x-raw` caps with a zero (unknown) framerate.
    pub fn raw(format: &str, width: u32, height: u32) -> Self {
        Self {
            media_type: RAW_VIDEO_MEDIA_TYPE.to_string(),
            format: format.to_string(),
            width,
            height,
            framerate: Fraction::zero(),
        }
    }

    pub fn with_framerate(mut self, framerate: Fraction) -> Self {
        self.framerate = framerate;
        self
    }

    /// Checks the caps against the source pad template bounds.
    pub fn validate(&self) -> Result<(), CapsError> {
        if self.media_type != RAW_VIDEO_MEDIA_TYPE {
            return Err(CapsError::NotRawVideo(self.media_type.clone()));
        }
        let dim_range = 1..=MAX_DIMENSION;
        if !dim_range.contains(&self.width) || !dim_range.contains(&self.height) {
            return Err(CapsError::DimensionsOutOfRange {
                width: self.width,
                height: self.height,
            });
        }
        if self.framerate.numer < 0 || self.framerate.denom <= 0 {
            return Err(CapsError::FramerateOutOfRange(self.framerate));
        }
        Ok(())
    }
}

impl fmt::Display for VideoCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, format=(string){}, width=(int){}, height=(int){}, framerate=(fraction){}",
            self.media_type, self.format, self.width, self.height, self.framerate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_raw_caps_are_valid() {
        let caps = VideoCaps::raw("NV12", 640, 480).with_framerate(Fraction::new(30, 1));
        assert!(caps.validate().is_ok());
    }

    #[test]
    fn test_non_raw_media_type_rejected() {
        let mut caps = VideoCaps::raw("NV12", 640, 480);
        caps.media_type = "video/x-h264".to_string();
        assert_eq!(
            caps.validate(),
            Err(CapsError::NotRawVideo("video/x-h264".to_string()))
        );
    }

    #[rstest]
    #[case(0, 480)]
    #[case(640, 0)]
    #[case(MAX_DIMENSION + 1, 480)]
    #[case(640, u32::MAX)]
    fn test_dimensions_out_of_range(#[case] width: u32, #[case] height: u32) {
        let caps = VideoCaps::raw("NV12", width, height);
        assert_eq!(
            caps.validate(),
            Err(CapsError::DimensionsOutOfRange { width, height })
        );
    }

    #[test]
    fn test_max_dimensions_accepted() {
        let caps = VideoCaps::raw("NV12", MAX_DIMENSION, MAX_DIMENSION);
        assert!(caps.validate().is_ok());
    }

    #[rstest]
    #[case(Fraction::new(-1, 1))]
    #[case(Fraction::new(30, 0))]
    #[case(Fraction::new(30, -1))]
    fn test_framerate_out_of_range(#[case] framerate: Fraction) {
        let caps = VideoCaps::raw("NV12", 4, 4).with_framerate(framerate);
        assert_eq!(
            caps.validate(),
            Err(CapsError::FramerateOutOfRange(framerate))
        );
    }

    #[test]
    fn test_display_lists_fields() {
        let caps = VideoCaps::raw("NV12", 4, 2);
        let text = caps.to_string();
        assert!(text.starts_with("video/x-raw"));
        assert!(text.contains("format=(string)NV12"));
        assert!(text.contains("width=(int)4"));
        assert!(text.contains("framerate=(fraction)0/1"));
    }
}
