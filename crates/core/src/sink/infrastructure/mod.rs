pub mod null_frame_sink;
pub mod raw_file_sink;
