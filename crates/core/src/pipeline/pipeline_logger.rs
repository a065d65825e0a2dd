use std::collections::HashMap;
use std::time::Instant;

use crate::shared::constants::LOG_TARGET;

/// Observer for streaming events, kept apart from the read loop so callers
/// pick where progress ends up.
pub trait PipelineLogger: Send {
    /// `total` is `None` when the stream length is unknown up front.
    fn progress(&mut self, frames: u64, total: Option<u64>);

    /// Time spent in a named stage (`fill`, `write`) for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn bytes(&mut self, count: u64);

    fn info(&mut self, message: &str);

    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _frames: u64, _total: Option<u64>) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn bytes(&mut self, _count: u64) {}
    fn info(&mut self, _message: &str) {}
}

/// Reports through the `log` facade and keeps per-stage timings for a
/// closing summary. Progress lines are emitted every `throttle_frames`.
pub struct StdoutPipelineLogger {
    throttle_frames: u64,
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames: u64,
    bytes: u64,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: u64) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
            bytes: 0,
            messages: Vec::new(),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// `None` until at least one frame or timing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.frames == 0 {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Read {} frames, {} bytes in {elapsed_s:.2}s",
            self.frames, self.bytes
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:8}: avg {avg_ms:7.3}ms  total {total_ms:8.1}ms"
            ));
        }

        if self.frames > 0 && elapsed_s > 0.0 {
            let fps = self.frames as f64 / elapsed_s;
            let mib_s = self.bytes as f64 / elapsed_s / (1024.0 * 1024.0);
            lines.push(format!("  Throughput: {fps:.1} fps, {mib_s:.1} MiB/s"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, frames: u64, total: Option<u64>) {
        self.frames = frames;
        let at_end = total == Some(frames);
        if frames % self.throttle_frames != 0 && !at_end {
            return;
        }
        match total {
            Some(total) if total > 0 => {
                let pct = frames as f64 / total as f64 * 100.0;
                log::info!(target: LOG_TARGET, "Read {frames}/{total} frames ({pct:.1}%)");
            }
            _ => log::info!(target: LOG_TARGET, "Read {frames} frames"),
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn bytes(&mut self, count: u64) {
        self.bytes += count;
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!(target: LOG_TARGET, "{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!(target: LOG_TARGET, "\n{text}");
        }
    }
}
