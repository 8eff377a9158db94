use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{info, warn};
use shapeoid_recorder::{
    Args, Avatar, CaptureConfig, FailedSession, FileChartWriter, RecorderConfig, Recorder,
    SessionReport, SongMetadata, Trace, Transport, describe_chart, load_song,
    metadata_from_args, output_directory, parse_format,
};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(path) = args.inspect.as_deref() {
        return inspect(path);
    }

    let metadata = metadata_from_args(&args);
    metadata.validate()?;

    let Some(music) = args.music.as_deref() else {
        bail!("A music file is required to record..!");
    };

    let format = parse_format(&args.format);
    let frame_period = 1.0 / args.fps.max(1) as f64;
    let capture = CaptureConfig {
        lookahead_frames: args.lookahead_frames,
        frame_period,
        timeout: args.timeout,
    };

    let config = RecorderConfig {
        capture,
        output_dir: output_directory(music, args.output.as_deref()),
        realtime: args.trace.is_none(),
        delay_start: args.delay_start,
        save_trace: args.save_trace.clone(),
        verbose: args.verbose,
    };

    info!(
        "Recording '{}' into {} as .{}..!",
        metadata.title,
        config.output_dir.display(),
        format.extension()
    );

    let writer = FileChartWriter::new(format);

    if let Some(path) = args.trace.as_deref() {
        let trace = Trace::load(path)?;
        info!(
            "Replaying {} frames from '{}'..!",
            trace.frames.len(),
            path.display()
        );

        let config = with_default_timeout(config, trace.length(), &metadata);
        let (transport, avatar) = trace.split();
        return run(transport, avatar, writer, config, metadata);
    }

    let length = args
        .length
        .filter(|length| length.is_finite() && *length > 0.0)
        .ok_or_else(|| anyhow!("A positive --length in seconds is required when recording live..!"))?;

    let config = with_default_timeout(config, length, &metadata);
    live(length, writer, config, metadata)
}

fn with_default_timeout(config: RecorderConfig, length: f64, metadata: &SongMetadata) -> RecorderConfig {
    if config.capture.timeout.is_some() {
        return config;
    }

    RecorderConfig {
        capture: config.capture.with_track_length(length, metadata.bpm),
        ..config
    }
}

#[cfg(all(target_os = "windows", feature = "wininput"))]
fn live(
    length: f64,
    writer: FileChartWriter,
    config: RecorderConfig,
    metadata: SongMetadata,
) -> Result<()> {
    use shapeoid_recorder::{KeyboardAvatar, WallClockTransport};
    use std::time::Duration;

    info!("Play along with W/A/D/S, move between lanes with the arrow keys..!");
    run(
        WallClockTransport::new(Duration::from_secs_f64(length)),
        KeyboardAvatar::new(),
        writer,
        config,
        metadata,
    )
}

#[cfg(not(all(target_os = "windows", feature = "wininput")))]
fn live(
    _length: f64,
    _writer: FileChartWriter,
    _config: RecorderConfig,
    _metadata: SongMetadata,
) -> Result<()> {
    bail!("Live keyboard capture needs Windows and the `wininput` feature, replay an input trace with --trace instead..!")
}

fn run<T, A>(
    transport: T,
    avatar: A,
    writer: FileChartWriter,
    config: RecorderConfig,
    metadata: SongMetadata,
) -> Result<()>
where
    T: Transport + 'static,
    A: Avatar + 'static,
{
    let recorder = Arc::new(Recorder::new(transport, avatar, writer, config));
    recorder.load_metadata(metadata)?;

    let recorder_for_handler = Arc::clone(&recorder);
    ctrlc::set_handler(move || {
        warn!("Ctrl-C received, stopping recording..!");
        let _ = recorder_for_handler.stop();
    })
    .context("Error setting Ctrl-C handler..!")?;

    match recorder.record(true) {
        Ok(Some(report)) => {
            print_summary(&report);
            info!("Recording finished, exiting..!");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(why) => {
            if let Some(failed) = why.downcast_ref::<FailedSession>() {
                warn!(
                    "{} bars were recorded but could not be saved..!",
                    failed.song.chart.len()
                );
            }
            Err(why)
        }
    }
}

fn inspect(path: &Path) -> Result<()> {
    let song = load_song(path)?;
    let metadata = &song.metadata;

    println!("\n=== {} ===", path.display());
    println!("{} - {} {}", metadata.artist, metadata.title, metadata.subtitle);
    println!(
        "{} BPM | {:.3}s per bar | music: {} | offset: {}",
        metadata.bpm,
        metadata.bar_duration(),
        metadata.music_path,
        metadata.offset
    );
    println!(
        "{} bars | {} notes",
        song.chart.len(),
        song.chart.note_count()
    );
    for line in describe_chart(&song.chart) {
        println!("{}", line);
    }
    println!("=== End Chart ===\n");

    Ok(())
}

fn print_summary(report: &SessionReport) {
    println!("\n=== Recording Summary ===");
    println!("Chart:   {}", report.path.display());
    println!("Bars:    {}", report.bars);
    println!("Notes:   {}", report.notes);
    println!("Stopped: {:?}", report.stop_reason);
    if let Some(bar) = report.dropped_bar {
        println!("Dropped: bar {} (incomplete when recording stopped)", bar);
    }
    println!("=== End Summary ===\n");
}
