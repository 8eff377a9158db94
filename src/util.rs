use crate::model::config::Args;
use crate::model::song::{Chart, NoteType, SongMetadata};
use crate::writer::ChartFormat;
use log::info;
use std::path::{Path, PathBuf};

pub fn parse_format(s: &str) -> ChartFormat {
    ChartFormat::from_name(s).unwrap_or_else(|| {
        info!("Unknown chart format '{}', defaulting to `mn`..!", s);
        ChartFormat::Mn
    })
}

/// The chart stores the bare file name of the music; everything lives in one directory.
pub fn music_file_name(music: &Path) -> String {
    music
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `--output` if given, otherwise the directory holding the music file.
pub fn output_directory(music: &Path, output: Option<&Path>) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }

    match music.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub fn metadata_from_args(args: &Args) -> SongMetadata {
    SongMetadata {
        title: args.title.clone().unwrap_or_default(),
        subtitle: args.subtitle.clone(),
        artist: args.artist.clone().unwrap_or_default(),
        banner_path: args.banner.clone(),
        background_path: args.background.clone(),
        music_path: args
            .music
            .as_deref()
            .map(music_file_name)
            .unwrap_or_default(),
        offset: args.offset,
        sample_start: args.sample_start,
        sample_length: args.sample_length,
        bpm: args.bpm.unwrap_or(0.0),
    }
}

fn note_symbol(note: Option<NoteType>) -> char {
    match note {
        Some(NoteType::Fire) => 'F',
        Some(NoteType::Air) => 'A',
        Some(NoteType::Water) => 'W',
        Some(NoteType::Earth) => 'E',
        None => '.',
    }
}

/// One line per bar, slots separated by `|`, lanes top to bottom within a slot.
pub fn describe_chart(chart: &Chart) -> Vec<String> {
    chart
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let slots: Vec<String> = bar
                .slots
                .iter()
                .map(|slot| {
                    [slot.top, slot.middle, slot.bottom]
                        .into_iter()
                        .map(note_symbol)
                        .collect()
                })
                .collect();
            format!("{:>4}: {}", i, slots.join("|"))
        })
        .collect()
}
