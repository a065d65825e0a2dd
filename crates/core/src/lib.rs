pub mod allocation {
    pub mod domain {
        pub mod allocation_negotiator;
        pub mod allocation_query;
    }
    pub mod infrastructure;
}

pub mod filling {
    pub mod domain {
        pub mod frame_filler;
    }
}

pub mod pipeline {
    pub mod pipeline_logger;
    pub mod read_frames_use_case;
}

pub mod shared {
    pub mod constants;
    pub mod flow;
    pub mod fraction;
    pub mod frame_buffer;
    pub mod video_caps;
    pub mod video_format;
    pub mod video_geometry;
}

pub mod sink {
    pub mod domain {
        pub mod frame_sink;
    }
    pub mod infrastructure;
}

pub mod source {
    pub mod domain {
        pub mod push_source;
        pub mod source_error;
    }
    pub mod infrastructure;
}
