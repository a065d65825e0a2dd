use std::path::PathBuf;
use std::process;

use clap::Parser;

use rawvideosrc_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use rawvideosrc_core::pipeline::read_frames_use_case::ReadFramesUseCase;
use rawvideosrc_core::shared::constants::{
    CAPS_TEMPLATE, ELEMENT_DESCRIPTION, ELEMENT_KLASS, ELEMENT_LONG_NAME, ELEMENT_NAME,
};
use rawvideosrc_core::shared::fraction::Fraction;
use rawvideosrc_core::shared::video_caps::VideoCaps;
use rawvideosrc_core::sink::domain::frame_sink::FrameSink;
use rawvideosrc_core::sink::infrastructure::null_frame_sink::NullFrameSink;
use rawvideosrc_core::sink::infrastructure::raw_file_sink::RawFileSink;
use rawvideosrc_core::source::domain::push_source::PushSource;
use rawvideosrc_core::source::infrastructure::raw_video_source::RawVideoSource;

/// Read a raw NV12 video file frame by frame.
#[derive(Parser)]
#[command(name = "rawvideosrc")]
struct Cli {
    /// Raw video file to read.
    #[arg(required_unless_present = "inspect")]
    location: Option<PathBuf>,

    /// Frame width in pixels.
    #[arg(long, required_unless_present = "inspect")]
    width: Option<u32>,

    /// Frame height in pixels.
    #[arg(long, required_unless_present = "inspect")]
    height: Option<u32>,

    /// Pixel format of the file. Only NV12 is supported.
    #[arg(long, default_value = "NV12")]
    format: String,

    /// Framerate as N/D; 0/1 leaves buffers untimed.
    #[arg(long, default_value = "0/1")]
    framerate: Fraction,

    /// Stop after this many frames.
    #[arg(long)]
    num_buffers: Option<u64>,

    /// Write the frames, padding stripped, to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Ask for per-plane layout metadata on buffers written to --output.
    #[arg(long)]
    video_meta: bool,

    /// Pad plane strides to this many bytes (power of two).
    #[arg(long)]
    stride_align: Option<usize>,

    /// Log progress every N frames.
    #[arg(long, default_value = "100")]
    progress_every: u64,

    /// Print element details and exit.
    #[arg(long)]
    inspect: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.inspect {
        println!("{}", inspect());
        return Ok(());
    }

    let (Some(location), Some(width), Some(height)) = (&cli.location, cli.width, cli.height)
    else {
        return Err("location, --width and --height are required".into());
    };

    let mut source = RawVideoSource::new();
    source.set_location(location.to_str())?;
    log::debug!(
        "{ELEMENT_NAME}: seekable={}, location={}",
        source.is_seekable(),
        location.display()
    );

    let sink: Box<dyn FrameSink> = match &cli.output {
        Some(path) => Box::new(RawFileSink::create(path)?.with_video_meta(cli.video_meta)),
        None => Box::new(NullFrameSink::new()),
    };

    let caps = VideoCaps::raw(&cli.format, width, height).with_framerate(cli.framerate);
    let mut use_case = ReadFramesUseCase::new(
        Box::new(source),
        sink,
        Box::new(StdoutPipelineLogger::new(cli.progress_every)),
    )
    .with_num_buffers(cli.num_buffers)
    .with_stride_align(cli.stride_align);

    let summary = use_case.execute(&caps)?;
    log::info!(
        "Read {} frames ({} bytes) from {}{}",
        summary.frames,
        summary.bytes,
        location.display(),
        if summary.reached_eos { ", end of stream" } else { "" }
    );
    if let Some(output) = &cli.output {
        log::info!("Output written to {}", output.display());
    }
    Ok(())
}

fn inspect() -> String {
    format!(
        "Factory Details:\n  \
         Name: {ELEMENT_NAME}\n  \
         Long-name: {ELEMENT_LONG_NAME}\n  \
         Klass: {ELEMENT_KLASS}\n  \
         Description: {ELEMENT_DESCRIPTION}\n\n\
         Pad Templates:\n  \
         SRC template: 'src'\n    \
         Availability: Always\n    \
         Capabilities: {CAPS_TEMPLATE}"
    )
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.inspect {
        return Ok(());
    }
    if let Some(location) = &cli.location {
        if location.to_str().is_none() {
            return Err(format!("Location is not valid UTF-8: {}", location.display()).into());
        }
    }
    if let Some(align) = cli.stride_align {
        if !align.is_power_of_two() {
            return Err(format!("Stride alignment must be a power of two, got {align}").into());
        }
    }
    if cli.framerate.numer < 0 || cli.framerate.denom <= 0 {
        return Err(format!("Framerate must be non-negative, got {}", cli.framerate).into());
    }
    if cli.output.is_some() && cli.output == cli.location {
        return Err("Output file must differ from the input file".into());
    }
    Ok(())
}
