use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::allocation::domain::allocation_negotiator::AllocationError;
use crate::allocation::domain::allocation_query::{AllocationQuery, PoolProposal};
use crate::allocation::infrastructure::buffer_pool::{BufferPool, PoolError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::LOG_TARGET;
use crate::shared::flow::FlowError;
use crate::shared::video_caps::VideoCaps;
use crate::sink::domain::frame_sink::FrameSink;
use crate::source::domain::push_source::{PushSource, SetCapsError};
use crate::source::domain::source_error::SourceError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Caps(#[from] SetCapsError),
    #[error("allocation failed: {0}")]
    Allocation(#[from] AllocationError),
    #[error("buffer pool: {0}")]
    Pool(#[from] PoolError),
    #[error("streaming stopped, reason {0}")]
    Flow(FlowError),
    #[error("sink failed: {0}")]
    Sink(Box<dyn std::error::Error>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub frames: u64,
    pub bytes: u64,
    /// `false` when the run stopped at the buffer limit instead.
    pub reached_eos: bool,
}

/// Streams a source into a sink: start, negotiate, then fill and push one
/// buffer at a time until end of stream or `num_buffers`.
pub struct ReadFramesUseCase {
    source: Box<dyn PushSource>,
    sink: Box<dyn FrameSink>,
    logger: Box<dyn PipelineLogger>,
    num_buffers: Option<u64>,
    stride_align: Option<usize>,
}

impl ReadFramesUseCase {
    pub fn new(
        source: Box<dyn PushSource>,
        sink: Box<dyn FrameSink>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            source,
            sink,
            logger,
            num_buffers: None,
            stride_align: None,
        }
    }

    /// Stop after this many frames.
    pub fn with_num_buffers(mut self, num_buffers: Option<u64>) -> Self {
        self.num_buffers = num_buffers;
        self
    }

    /// Offer the source a pool whose strides are padded to `align` bytes.
    /// Padded layouts are only describable with a `VideoMeta`, so this also
    /// requests one.
    pub fn with_stride_align(mut self, stride_align: Option<usize>) -> Self {
        self.stride_align = stride_align;
        self
    }

    /// The source is stopped and the sink closed on every path once
    /// `start` has succeeded.
    pub fn execute(&mut self, caps: &VideoCaps) -> Result<ReadSummary, PipelineError> {
        self.source.start()?;
        let streamed = self.stream(caps);
        self.source.stop();
        let closed = self.sink.close().map_err(PipelineError::Sink);

        let summary = streamed?;
        closed?;
        self.logger.summary();
        Ok(summary)
    }

    fn stream(&mut self, caps: &VideoCaps) -> Result<ReadSummary, PipelineError> {
        self.source.set_caps(caps)?;
        let geometry = self
            .source
            .geometry()
            .cloned()
            .ok_or(PipelineError::Flow(FlowError::NotNegotiated))?;

        let mut query = AllocationQuery::new(Some(caps.clone()));
        if self.sink.wants_video_meta() || self.stride_align.is_some() {
            query.request_video_meta();
        }
        if let Some(align) = self.stride_align {
            let pool = Arc::new(BufferPool::new());
            let mut config = pool.config();
            config.set_stride_align(align);
            pool.set_config(config)?;
            query.add_pool(PoolProposal {
                pool: Some(pool),
                size: 0,
                min: 0,
                max: 0,
            });
        }
        let pool = self.source.decide_allocation(&mut query)?;
        self.logger.info(&format!(
            "Negotiated {caps}, {} bytes per buffer",
            pool.config().size()
        ));

        let mut summary = ReadSummary::default();
        loop {
            if self.num_buffers.is_some_and(|limit| summary.frames >= limit) {
                break;
            }

            let mut buffer = pool.acquire()?;
            let fill_start = Instant::now();
            let filled = self.source.fill(&mut buffer);
            self.logger
                .timing("fill", fill_start.elapsed().as_secs_f64() * 1000.0);

            match filled {
                Ok(()) => {}
                Err(FlowError::Eos) => {
                    pool.release(buffer);
                    log::debug!(target: LOG_TARGET, "End of stream after {} frames", summary.frames);
                    summary.reached_eos = true;
                    break;
                }
                Err(e) => {
                    pool.release(buffer);
                    log::error!(target: LOG_TARGET, "Streaming stopped, reason {e}");
                    return Err(PipelineError::Flow(e));
                }
            }

            let write_start = Instant::now();
            let written = self.sink.write(&buffer, &geometry);
            pool.release(buffer);
            written.map_err(PipelineError::Sink)?;
            self.logger
                .timing("write", write_start.elapsed().as_secs_f64() * 1000.0);

            let frame_bytes = geometry.frame_bytes() as u64;
            summary.frames += 1;
            summary.bytes += frame_bytes;
            self.logger.bytes(frame_bytes);
            self.logger.progress(summary.frames, self.num_buffers);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::domain::allocation_negotiator;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::flow::FlowResult;
    use crate::shared::fraction::Fraction;
    use crate::shared::frame_buffer::FrameBuffer;
    use crate::shared::video_geometry::VideoGeometry;
    use crate::sink::infrastructure::raw_file_sink::RawFileSink;
    use crate::source::infrastructure::raw_video_source::RawVideoSource;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type CallLog = Arc<Mutex<Vec<String>>>;

    // --- Stubs ---

    struct StubSource {
        frames: u64,
        fail_with: Option<FlowError>,
        start_error: bool,
        geometry: Option<VideoGeometry>,
        calls: CallLog,
    }

    impl StubSource {
        fn new(frames: u64, calls: &CallLog) -> Self {
            Self {
                frames,
                fail_with: None,
                start_error: false,
                geometry: None,
                calls: Arc::clone(calls),
            }
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    impl PushSource for StubSource {
        fn start(&mut self) -> Result<(), SourceError> {
            self.record("start");
            if self.start_error {
                return Err(SourceError::NoFilenameSpecified);
            }
            Ok(())
        }

        fn stop(&mut self) {
            self.record("stop");
        }

        fn is_seekable(&self) -> bool {
            false
        }

        fn set_caps(&mut self, caps: &VideoCaps) -> Result<(), SetCapsError> {
            self.record("set_caps");
            self.geometry = Some(VideoGeometry::from_caps(caps)?);
            Ok(())
        }

        fn geometry(&self) -> Option<&VideoGeometry> {
            self.geometry.as_ref()
        }

        fn decide_allocation(
            &mut self,
            query: &mut AllocationQuery,
        ) -> Result<Arc<BufferPool>, AllocationError> {
            self.record("decide_allocation");
            let geometry = self.geometry.as_ref().ok_or(AllocationError::NotNegotiated)?;
            let pool = allocation_negotiator::decide_allocation(query, geometry)?;
            pool.set_active(true)?;
            Ok(pool)
        }

        fn fill(&mut self, buffer: &mut FrameBuffer) -> FlowResult {
            if self.frames == 0 {
                return Err(self.fail_with.unwrap_or(FlowError::Eos));
            }
            self.frames -= 1;
            buffer.set_offset(Some(self.frames));
            Ok(())
        }
    }

    struct StubSink {
        written: Arc<Mutex<Vec<usize>>>,
        fail: bool,
        calls: CallLog,
    }

    impl FrameSink for StubSink {
        fn write(
            &mut self,
            buffer: &FrameBuffer,
            _geometry: &VideoGeometry,
        ) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail {
                return Err("disk full".into());
            }
            self.written.lock().unwrap().push(buffer.len());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push("close".to_string());
            Ok(())
        }
    }

    fn stub_sink(calls: &CallLog) -> (StubSink, Arc<Mutex<Vec<usize>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = StubSink {
            written: Arc::clone(&written),
            fail: false,
            calls: Arc::clone(calls),
        };
        (sink, written)
    }

    fn caps_4x4() -> VideoCaps {
        VideoCaps::raw("NV12", 4, 4)
    }

    // --- Tests ---

    #[test]
    fn test_reads_until_eos() {
        let calls = CallLog::default();
        let (sink, written) = stub_sink(&calls);
        let mut uc = ReadFramesUseCase::new(
            Box::new(StubSource::new(3, &calls)),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );

        let summary = uc.execute(&caps_4x4()).unwrap();

        assert_eq!(
            summary,
            ReadSummary {
                frames: 3,
                bytes: 72,
                reached_eos: true
            }
        );
        assert_eq!(*written.lock().unwrap(), vec![24, 24, 24]);
    }

    #[test]
    fn test_call_order() {
        let calls = CallLog::default();
        let (sink, _) = stub_sink(&calls);
        let mut uc = ReadFramesUseCase::new(
            Box::new(StubSource::new(1, &calls)),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );
        uc.execute(&caps_4x4()).unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["start", "set_caps", "decide_allocation", "stop", "close"]
        );
    }

    #[test]
    fn test_num_buffers_limits_run() {
        let calls = CallLog::default();
        let (sink, written) = stub_sink(&calls);
        let mut uc = ReadFramesUseCase::new(
            Box::new(StubSource::new(10, &calls)),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        )
        .with_num_buffers(Some(2));

        let summary = uc.execute(&caps_4x4()).unwrap();

        assert_eq!(summary.frames, 2);
        assert!(!summary.reached_eos);
        assert_eq!(written.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_zero_num_buffers_reads_nothing() {
        let calls = CallLog::default();
        let (sink, written) = stub_sink(&calls);
        let mut uc = ReadFramesUseCase::new(
            Box::new(StubSource::new(10, &calls)),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        )
        .with_num_buffers(Some(0));

        assert_eq!(uc.execute(&caps_4x4()).unwrap().frames, 0);
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_flow_error_stops_and_still_cleans_up() {
        let calls = CallLog::default();
        let (sink, _) = stub_sink(&calls);
        let mut source = StubSource::new(1, &calls);
        source.fail_with = Some(FlowError::UnsupportedFormat);
        let mut uc = ReadFramesUseCase::new(
            Box::new(source),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );

        let err = uc.execute(&caps_4x4()).unwrap_err();

        assert!(matches!(err, PipelineError::Flow(FlowError::UnsupportedFormat)));
        let calls = calls.lock().unwrap();
        assert!(calls.contains(&"stop".to_string()));
        assert!(calls.contains(&"close".to_string()));
    }

    #[test]
    fn test_bad_caps_stop_the_source() {
        let calls = CallLog::default();
        let (sink, _) = stub_sink(&calls);
        let mut uc = ReadFramesUseCase::new(
            Box::new(StubSource::new(1, &calls)),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );

        let err = uc.execute(&VideoCaps::raw("I420", 4, 4)).unwrap_err();

        assert!(matches!(err, PipelineError::Caps(_)));
        assert!(calls.lock().unwrap().contains(&"stop".to_string()));
    }

    #[test]
    fn test_start_failure_skips_stop() {
        let calls = CallLog::default();
        let (sink, _) = stub_sink(&calls);
        let mut source = StubSource::new(1, &calls);
        source.start_error = true;
        let mut uc = ReadFramesUseCase::new(
            Box::new(source),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );

        let err = uc.execute(&caps_4x4()).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Source(SourceError::NoFilenameSpecified)
        ));
        assert_eq!(*calls.lock().unwrap(), vec!["start"]);
    }

    #[test]
    fn test_sink_failure_is_reported() {
        let calls = CallLog::default();
        let (mut sink, _) = stub_sink(&calls);
        sink.fail = true;
        let mut uc = ReadFramesUseCase::new(
            Box::new(StubSource::new(2, &calls)),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );

        let err = uc.execute(&caps_4x4()).unwrap_err();

        assert!(matches!(err, PipelineError::Sink(_)));
        assert!(err.to_string().contains("disk full"));
        assert!(calls.lock().unwrap().contains(&"stop".to_string()));
    }

    #[test]
    fn test_file_copy_keeps_frame_aligned_prefix() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.nv12");
        let output = tmp.path().join("out.nv12");
        // Two 6x2 frames (18 bytes each) plus a partial third.
        let data: Vec<u8> = (0..40u8).collect();
        fs::write(&input, &data).unwrap();

        let mut source = RawVideoSource::new();
        source.set_location(input.to_str()).unwrap();
        let sink = RawFileSink::create(&output).unwrap();
        let mut uc = ReadFramesUseCase::new(
            Box::new(source),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );

        let caps = VideoCaps::raw("NV12", 6, 2).with_framerate(Fraction::new(25, 1));
        let summary = uc.execute(&caps).unwrap();

        assert_eq!(summary.frames, 2);
        assert!(summary.reached_eos);
        assert_eq!(fs::read(&output).unwrap(), data[..36].to_vec());
    }

    #[test]
    fn test_file_copy_with_video_meta() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.nv12");
        let output = tmp.path().join("out.nv12");
        let data: Vec<u8> = (0..48u8).collect();
        fs::write(&input, &data).unwrap();

        let mut source = RawVideoSource::new();
        source.set_location(input.to_str()).unwrap();
        let sink = RawFileSink::create(&output).unwrap().with_video_meta(true);
        let mut uc = ReadFramesUseCase::new(
            Box::new(source),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );

        let summary = uc.execute(&caps_4x4()).unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(fs::read(&output).unwrap(), data);
    }

    #[test]
    fn test_missing_file_is_a_source_error() {
        let tmp = TempDir::new().unwrap();
        let calls = CallLog::default();
        let (sink, _) = stub_sink(&calls);
        let mut source = RawVideoSource::new();
        source
            .set_location(tmp.path().join("missing.nv12").to_str())
            .unwrap();
        let mut uc = ReadFramesUseCase::new(
            Box::new(source),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        );

        let err = uc.execute(&caps_4x4()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Source(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_file_copy_with_padded_strides() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.nv12");
        let output = tmp.path().join("out.nv12");
        let data: Vec<u8> = (0..36u8).collect();
        fs::write(&input, &data).unwrap();

        let mut source = RawVideoSource::new();
        source.set_location(input.to_str()).unwrap();
        let sink = RawFileSink::create(&output).unwrap();
        let mut uc = ReadFramesUseCase::new(
            Box::new(source),
            Box::new(sink),
            Box::new(NullPipelineLogger),
        )
        .with_stride_align(Some(64));

        let summary = uc.execute(&VideoCaps::raw("NV12", 6, 2)).unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(fs::read(&output).unwrap(), data);
    }
}
