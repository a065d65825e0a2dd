pub mod file_byte_source;
pub mod raw_video_source;
