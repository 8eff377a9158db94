use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "shapeoid_recorder",
    about = "Record a Shapeoid beatmap by playing along with a song!"
)]
pub struct Args {
    /// Song title.
    #[arg(long, required_unless_present = "inspect")]
    pub title: Option<String>,

    #[arg(long, default_value = "")]
    pub subtitle: String,

    /// Song artist.
    #[arg(long, required_unless_present = "inspect")]
    pub artist: Option<String>,

    /// Tempo in beats per minute. Bars are four beats long.
    #[arg(long, required_unless_present = "inspect")]
    pub bpm: Option<f64>,

    /// Path to the music file. Only its file name is stored in the chart,
    /// and the chart is written next to it unless `--output` is given.
    #[arg(long, required_unless_present = "inspect")]
    pub music: Option<PathBuf>,

    /// Length of the track in seconds. Required when recording live.
    #[arg(long)]
    pub length: Option<f64>,

    /// Banner image file name.
    #[arg(long, default_value = "")]
    pub banner: String,

    /// Background image file name.
    #[arg(long, default_value = "")]
    pub background: String,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub offset: f64,

    /// Start of the song preview in seconds.
    #[arg(long, default_value_t = 0.0)]
    pub sample_start: f64,

    /// Length of the song preview in seconds.
    #[arg(long, default_value_t = 0.0)]
    pub sample_length: f64,

    /// Directory to write the chart to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Chart format: json|mn.
    #[arg(short, long, default_value = "mn")]
    pub format: String,

    /// Frames sampled per second.
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// How many frames ahead of the bar boundary the next bar may start.
    #[arg(long, default_value_t = 1.0)]
    pub lookahead_frames: f64,

    /// Give up on the transport after this many seconds of playback
    /// (defaults to the track length plus one bar).
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Replay a saved input trace instead of reading the keyboard.
    #[arg(long)]
    pub trace: Option<PathBuf>,

    /// Save the frames of a live session as an input trace.
    #[arg(long)]
    pub save_trace: Option<PathBuf>,

    /// Delays the start of the recording by N seconds.
    #[arg(long = "delay-start", default_value_t = 0)]
    pub delay_start: u64,

    /// Print the bars of an existing chart and exit.
    #[arg(long)]
    pub inspect: Option<PathBuf>,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}
