use crate::engine::{Avatar, AvatarState, Transport};
use crate::model::mappings::KeyState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to access trace '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed trace '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One playing frame as seen by the recorder.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TraceFrame {
    pub time: f64,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub keys: KeyState,
}

/// A recorded sequence of frames that can be replayed as both the
/// transport and the avatar of a later session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Trace {
    /// Nominal seconds per frame of the session the trace came from.
    pub frame_period: f64,
    pub frames: Vec<TraceFrame>,
}

impl Trace {
    pub fn new(frame_period: f64) -> Self {
        Self {
            frame_period,
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, time: f64, state: &AvatarState) {
        self.frames.push(TraceFrame {
            time,
            y: state.y,
            keys: state.keys,
        });
    }

    /// Playback length covered by the trace.
    pub fn length(&self) -> f64 {
        self.frames
            .last()
            .map(|frame| frame.time + self.frame_period)
            .unwrap_or(0.0)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| TraceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TraceError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|source| TraceError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        std::fs::write(path, text).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Split the trace into a transport and an avatar that step through the
    /// same frames in lockstep.
    pub fn split(self) -> (TraceTransport, TraceAvatar) {
        let times = self.frames.iter().map(|frame| frame.time).collect();
        let states = self
            .frames
            .iter()
            .map(|frame| AvatarState {
                y: frame.y,
                keys: frame.keys,
            })
            .collect();

        (
            TraceTransport {
                times,
                frame: None,
                started: false,
            },
            TraceAvatar { states, frame: 0 },
        )
    }
}

/// Replays the frame times of a trace. Stops after the last frame.
#[derive(Debug, Clone)]
pub struct TraceTransport {
    times: Vec<f64>,
    frame: Option<usize>,
    started: bool,
}

impl Transport for TraceTransport {
    fn play(&mut self) {
        self.started = true;
        self.frame = None;
    }

    fn is_playing(&self) -> bool {
        match self.frame {
            Some(frame) => self.started && frame < self.times.len(),
            None => false,
        }
    }

    fn current_time(&self) -> f64 {
        let Some(frame) = self.frame else {
            return 0.0;
        };

        self.times
            .get(frame)
            .or_else(|| self.times.last())
            .copied()
            .unwrap_or(0.0)
    }

    fn advance(&mut self) {
        if self.started {
            self.frame = Some(self.frame.map_or(0, |frame| frame + 1));
        }
    }
}

/// Replays the avatar states of a trace, one per poll.
#[derive(Debug, Clone)]
pub struct TraceAvatar {
    states: Vec<AvatarState>,
    frame: usize,
}

impl Avatar for TraceAvatar {
    fn poll(&mut self) -> AvatarState {
        let state = self.states.get(self.frame).copied().unwrap_or_default();
        self.frame += 1;
        state
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn trace() -> Trace {
        let mut trace = Trace::new(0.5);
        let pressed = AvatarState {
            y: 0.5,
            keys: KeyState {
                up: true,
                ..Default::default()
            },
        };
        trace.push(0.0, &pressed);
        trace.push(0.5, &AvatarState::default());
        trace
    }

    #[test]
    fn replay_in_lockstep() {
        let (mut transport, mut avatar) = trace().split();
        assert!(!transport.is_playing());

        transport.play();
        transport.advance();
        assert!(transport.is_playing());
        assert_eq!(transport.current_time(), 0.0);
        assert!(avatar.poll().keys.up);

        transport.advance();
        assert!(transport.is_playing());
        assert_eq!(transport.current_time(), 0.5);
        assert!(!avatar.poll().keys.any());

        transport.advance();
        assert!(!transport.is_playing());
        assert_eq!(transport.current_time(), 0.5);
        assert_eq!(avatar.poll(), AvatarState::default());
    }

    #[test]
    fn length_covers_last_frame() {
        assert_eq!(trace().length(), 1.0);
        assert_eq!(Trace::new(0.1).length(), 0.0);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.trace.json");

        let trace = trace();
        trace.save(&path).unwrap();
        assert_eq!(Trace::load(&path).unwrap(), trace);
    }

    #[test]
    fn missing_key_fields_default_to_released() {
        let trace: Trace = serde_json::from_str(
            r#"{ "frame_period": 0.25, "frames": [ { "time": 0.0, "keys": { "left": true } } ] }"#,
        )
        .unwrap();

        assert_eq!(trace.frames[0].y, 0.0);
        assert!(trace.frames[0].keys.left);
        assert!(!trace.frames[0].keys.up);
    }

    #[test]
    fn load_reports_path() {
        let err = Trace::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
