use crate::model::song::{Bar, Chart, NoteEvent, NoteType, Song, SongMetadata, SLOTS_PER_BAR};
use log::{debug, info};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to write chart to '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize chart: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} cannot be stored in a .mn chart: {value:?}")]
    Unrepresentable { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read chart '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON chart: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed .mn chart at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("unknown chart format for '{0}'")]
    UnknownFormat(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartFormat {
    Json,
    Mn,
}

impl ChartFormat {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ChartFormat::Json),
            "mn" => Some(ChartFormat::Mn),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Json => "json",
            ChartFormat::Mn => "mn",
        }
    }
}

/// Persists a finished recording.
pub trait ChartWriter {
    /// Write `song` into `directory`, returning the path of the new chart file.
    fn write(&self, song: &Song, directory: &Path) -> Result<PathBuf, WriteError>;
}

#[derive(Clone, Copy, Debug)]
pub struct FileChartWriter {
    pub format: ChartFormat,
}

impl FileChartWriter {
    pub fn new(format: ChartFormat) -> Self {
        Self { format }
    }
}

impl ChartWriter for FileChartWriter {
    fn write(&self, song: &Song, directory: &Path) -> Result<PathBuf, WriteError> {
        let content = match self.format {
            ChartFormat::Json => serde_json::to_string_pretty(song)?,
            ChartFormat::Mn => to_mn(song)?,
        };

        let path = directory.join(chart_file_name(&song.metadata, self.format));
        std::fs::write(&path, content).map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;

        info!(
            "Wrote {} bars of '{}' to {}",
            song.chart.len(),
            song.metadata.title,
            path.display()
        );

        Ok(path)
    }
}

/// File name for a chart: the song title with anything unusual replaced by `_`.
pub fn chart_file_name(metadata: &SongMetadata, format: ChartFormat) -> String {
    let stem: String = metadata
        .title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem = if stem.is_empty() { "chart" } else { stem.as_str() };
    format!("{}.{}", stem, format.extension())
}

fn tag_fields(metadata: &SongMetadata) -> [(&'static str, String); 10] {
    [
        ("TITLE", metadata.title.clone()),
        ("SUBTITLE", metadata.subtitle.clone()),
        ("ARTIST", metadata.artist.clone()),
        ("BANNER", metadata.banner_path.clone()),
        ("BACKGROUND", metadata.background_path.clone()),
        ("MUSIC", metadata.music_path.clone()),
        ("OFFSET", metadata.offset.to_string()),
        ("SAMPLESTART", metadata.sample_start.to_string()),
        ("SAMPLELENGTH", metadata.sample_length.to_string()),
        ("BPM", metadata.bpm.to_string()),
    ]
}

fn lane_digit(note: Option<NoteType>) -> char {
    let code = note.map(NoteType::code).unwrap_or(0);
    char::from(b'0' + code)
}

/// Render a song in the text `.mn` layout: `#TAG:value;` header lines, then
/// one `top middle bottom` digit row per slot, bars separated by `,`.
pub fn to_mn(song: &Song) -> Result<String, WriteError> {
    let mut out = String::new();

    for (tag, value) in tag_fields(&song.metadata) {
        if value.contains([';', '\n', '\r']) {
            return Err(WriteError::Unrepresentable { field: tag, value });
        }
        let _ = writeln!(out, "#{}:{};", tag, value);
    }

    out.push_str("#NOTES:\n");
    for (i, bar) in song.chart.bars.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        for slot in &bar.slots {
            out.push(lane_digit(slot.top));
            out.push(lane_digit(slot.middle));
            out.push(lane_digit(slot.bottom));
            out.push('\n');
        }
    }
    out.push_str(";\n");

    Ok(out)
}

fn syntax(line: usize, message: impl Into<String>) -> LoadError {
    LoadError::Syntax {
        line,
        message: message.into(),
    }
}

fn parse_number(line: usize, tag: &str, value: &str) -> Result<f64, LoadError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| syntax(line, format!("{} is not a number: {:?}", tag, value)))
}

fn parse_row(line: usize, row: &str) -> Result<NoteEvent, LoadError> {
    let lanes: Vec<Option<NoteType>> = row
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(0) => Ok(None),
            Some(d) => NoteType::from_code(d as u8)
                .map(Some)
                .ok_or_else(|| syntax(line, format!("unknown note type {}", d))),
            None => Err(syntax(line, format!("unexpected character {:?}", c))),
        })
        .collect::<Result<_, _>>()?;

    let [top, middle, bottom] = lanes[..] else {
        return Err(syntax(line, format!("expected 3 lanes, got {}", lanes.len())));
    };

    Ok(NoteEvent {
        top,
        middle,
        bottom,
    })
}

fn close_bar(line: usize, rows: &mut Vec<NoteEvent>, chart: &mut Chart) -> Result<(), LoadError> {
    if rows.len() != SLOTS_PER_BAR {
        return Err(syntax(
            line,
            format!("bar {} has {} slots, expected {}", chart.len(), rows.len(), SLOTS_PER_BAR),
        ));
    }

    let mut slots = [NoteEvent::default(); SLOTS_PER_BAR];
    slots.copy_from_slice(rows);
    chart.push(Bar::new(slots));
    rows.clear();
    Ok(())
}

pub fn from_mn(text: &str) -> Result<Song, LoadError> {
    let mut metadata = SongMetadata::default();
    let mut chart = Chart::default();
    let mut rows: Vec<NoteEvent> = Vec::new();
    let mut in_notes = false;
    let mut finished = false;

    for (n, raw) in text.lines().enumerate() {
        let line = n + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || finished {
            continue;
        }

        if in_notes {
            match trimmed {
                "," => close_bar(line, &mut rows, &mut chart)?,
                ";" => {
                    if !rows.is_empty() {
                        close_bar(line, &mut rows, &mut chart)?;
                    }
                    finished = true;
                }
                row => rows.push(parse_row(line, row)?),
            }
            continue;
        }

        if trimmed == "#NOTES:" {
            in_notes = true;
            continue;
        }

        let Some((tag, value)) = trimmed
            .strip_prefix('#')
            .and_then(|tag| tag.strip_suffix(';'))
            .and_then(|tag| tag.split_once(':'))
        else {
            return Err(syntax(line, format!("expected #TAG:value; got {:?}", trimmed)));
        };

        match tag {
            "TITLE" => metadata.title = value.to_owned(),
            "SUBTITLE" => metadata.subtitle = value.to_owned(),
            "ARTIST" => metadata.artist = value.to_owned(),
            "BANNER" => metadata.banner_path = value.to_owned(),
            "BACKGROUND" => metadata.background_path = value.to_owned(),
            "MUSIC" => metadata.music_path = value.to_owned(),
            "OFFSET" => metadata.offset = parse_number(line, tag, value)?,
            "SAMPLESTART" => metadata.sample_start = parse_number(line, tag, value)?,
            "SAMPLELENGTH" => metadata.sample_length = parse_number(line, tag, value)?,
            "BPM" => metadata.bpm = parse_number(line, tag, value)?,
            other => debug!("Ignoring unknown tag #{} at line {}", other, line),
        }
    }

    if !finished {
        return Err(syntax(text.lines().count(), "missing #NOTES section terminated by ';'"));
    }

    Ok(Song { metadata, chart })
}

/// Load a chart written by [`FileChartWriter`], picking the format from the extension.
pub fn load_song<P: AsRef<Path>>(path: P) -> Result<Song, LoadError> {
    let path = path.as_ref();
    let format =
        ChartFormat::from_path(path).ok_or_else(|| LoadError::UnknownFormat(path.to_path_buf()))?;

    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match format {
        ChartFormat::Json => Ok(serde_json::from_str(&text)?),
        ChartFormat::Mn => from_mn(&text),
    }
}
