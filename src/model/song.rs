use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BEATS_PER_BAR: usize = 4;
pub const SLOTS_PER_BAR: usize = 4;

/// Seconds per bar of four beats at the given tempo.
pub fn bar_duration(bpm: f64) -> f64 {
    (60.0 / bpm) * BEATS_PER_BAR as f64
}

/// Seconds per capture slot (a quarter of a bar).
pub fn slot_duration(bpm: f64) -> f64 {
    bar_duration(bpm) / SLOTS_PER_BAR as f64
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteType {
    Fire,
    Air,
    Water,
    Earth,
}

impl NoteType {
    /// Digit used for this note type in `.mn` charts. `0` is reserved for an empty lane.
    pub fn code(self) -> u8 {
        match self {
            NoteType::Fire => 1,
            NoteType::Air => 2,
            NoteType::Water => 3,
            NoteType::Earth => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(NoteType::Fire),
            2 => Some(NoteType::Air),
            3 => Some(NoteType::Water),
            4 => Some(NoteType::Earth),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Top,
    Middle,
    Bottom,
}

/// The notes of one capture slot, one value per lane.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteEvent {
    pub top: Option<NoteType>,
    pub middle: Option<NoteType>,
    pub bottom: Option<NoteType>,
}

impl NoteEvent {
    pub fn single(lane: Lane, note: NoteType) -> Self {
        let mut event = NoteEvent::default();
        event.set(lane, note);
        event
    }

    pub fn set(&mut self, lane: Lane, note: NoteType) {
        match lane {
            Lane::Top => self.top = Some(note),
            Lane::Middle => self.middle = Some(note),
            Lane::Bottom => self.bottom = Some(note),
        }
    }

    pub fn get(&self, lane: Lane) -> Option<NoteType> {
        match lane {
            Lane::Top => self.top,
            Lane::Middle => self.middle,
            Lane::Bottom => self.bottom,
        }
    }

    pub fn lanes_set(&self) -> usize {
        [self.top, self.middle, self.bottom]
            .iter()
            .filter(|lane| lane.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes_set() == 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Bar {
    pub slots: [NoteEvent; SLOTS_PER_BAR],
}

impl Bar {
    pub fn new(slots: [NoteEvent; SLOTS_PER_BAR]) -> Self {
        Self { slots }
    }

    pub fn note_count(&self) -> usize {
        self.slots.iter().map(NoteEvent::lanes_set).sum()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Chart {
    pub bars: Vec<Bar>,
}

impl Chart {
    pub fn push(&mut self, bar: Bar) {
        self.bars.push(bar);
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.bars.len() * SLOTS_PER_BAR
    }

    pub fn note_count(&self) -> usize {
        self.bars.iter().map(Bar::note_count).sum()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    #[error("song title cannot be empty or whitespace")]
    EmptyTitle,

    #[error("artist cannot be empty or whitespace")]
    EmptyArtist,

    #[error("invalid BPM: {0}")]
    InvalidTempo(f64),

    #[error("invalid {field}: {value}")]
    InvalidTime { field: &'static str, value: f64 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SongMetadata {
    pub title: String,
    pub subtitle: String,
    pub artist: String,
    pub banner_path: String,
    pub background_path: String,
    /// File name only; the chart lives in the same directory as the music.
    pub music_path: String,
    pub offset: f64,
    pub sample_start: f64,
    pub sample_length: f64,
    pub bpm: f64,
}

impl SongMetadata {
    /// Title, artist and BPM must be valid before a recording can start.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.title.trim().is_empty() {
            return Err(MetadataError::EmptyTitle);
        }
        if self.artist.trim().is_empty() {
            return Err(MetadataError::EmptyArtist);
        }
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(MetadataError::InvalidTempo(self.bpm));
        }
        if !self.offset.is_finite() {
            return Err(MetadataError::InvalidTime {
                field: "offset",
                value: self.offset,
            });
        }
        for (field, value) in [
            ("sample start", self.sample_start),
            ("sample length", self.sample_length),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MetadataError::InvalidTime { field, value });
            }
        }

        Ok(())
    }

    pub fn bar_duration(&self) -> f64 {
        bar_duration(self.bpm)
    }
}

/// Metadata plus the recorded chart, as handed to a chart writer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Song {
    pub metadata: SongMetadata,
    pub chart: Chart,
}

#[cfg(test)]
mod test {
    use super::*;

    fn metadata() -> SongMetadata {
        SongMetadata {
            title: String::from("Shapes"),
            artist: String::from("Someone"),
            bpm: 120.0,
            ..Default::default()
        }
    }

    #[test]
    fn durations_follow_tempo() {
        for bpm in [60.0, 90.0, 120.0, 137.5, 200.0] {
            assert!((bar_duration(bpm) - 240.0 / bpm).abs() < 1e-12);
            assert!((slot_duration(bpm) - 60.0 / bpm).abs() < 1e-12);
        }
        assert_eq!(bar_duration(120.0), 2.0);
        assert_eq!(slot_duration(120.0), 0.5);
        assert_eq!(metadata().bar_duration(), 2.0);
    }

    #[test]
    fn metadata_gate() {
        assert!(metadata().validate().is_ok());

        let blank_title = SongMetadata {
            title: String::from("  \t"),
            ..metadata()
        };
        assert_eq!(blank_title.validate(), Err(MetadataError::EmptyTitle));

        let no_artist = SongMetadata {
            artist: String::new(),
            ..metadata()
        };
        assert_eq!(no_artist.validate(), Err(MetadataError::EmptyArtist));

        for bpm in [0.0, -120.0, f64::NAN, f64::INFINITY] {
            let bad = SongMetadata { bpm, ..metadata() };
            assert!(matches!(bad.validate(), Err(MetadataError::InvalidTempo(_))));
        }

        let bad_sample = SongMetadata {
            sample_start: -1.0,
            ..metadata()
        };
        assert!(matches!(
            bad_sample.validate(),
            Err(MetadataError::InvalidTime { field: "sample start", .. })
        ));
    }

    #[test]
    fn note_codes() {
        for note in [NoteType::Fire, NoteType::Air, NoteType::Water, NoteType::Earth] {
            assert_eq!(NoteType::from_code(note.code()), Some(note));
        }
        assert_eq!(NoteType::from_code(0), None);
        assert_eq!(NoteType::from_code(5), None);
    }

    #[test]
    fn event_lanes() {
        let event = NoteEvent::single(Lane::Bottom, NoteType::Water);
        assert_eq!(event.get(Lane::Bottom), Some(NoteType::Water));
        assert_eq!(event.get(Lane::Top), None);
        assert_eq!(event.lanes_set(), 1);
        assert!(NoteEvent::default().is_empty());
    }
}
