//! The beatmap capture pipeline.
//!
//! A [`CaptureSession`] is ticked once per frame. Each tick the
//! [`BarScheduler`](scheduler::BarScheduler) decides whether a new bar starts,
//! the in-flight [`BarCapture`](slots::BarCapture) opens or closes its slots,
//! and completed bars are appended to the chart. When the transport stops the
//! session hands the finished [`Song`] to a [`ChartWriter`].

pub mod clock;
pub mod scheduler;
pub mod slots;

use crate::capture::clock::Frame;
use crate::capture::scheduler::BarScheduler;
use crate::capture::slots::{BarCapture, SlotStep};
use crate::engine::AvatarState;
use crate::model::song::{Chart, MetadataError, Song, SongMetadata, bar_duration};
use crate::writer::{ChartWriter, WriteError};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConfig {
    /// Frames of lookahead applied when deciding whether the next bar is due.
    pub lookahead_frames: f64,
    /// Frame delta assumed for the very first frame.
    pub frame_period: f64,
    /// Playback time after which the session gives up on the transport.
    pub timeout: Option<f64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            lookahead_frames: 1.0,
            frame_period: 1.0 / 60.0,
            timeout: None,
        }
    }
}

impl CaptureConfig {
    /// Timeout of one bar past the end of the track.
    pub fn with_track_length(self, length: f64, bpm: f64) -> Self {
        Self {
            timeout: Some(length + bar_duration(bpm)),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TransportStopped,
    Cancelled,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    BarCapturing { bar: usize, slot: Option<usize> },
    Finalizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Recording,
    Stopped(StopReason),
    Finalizing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub path: PathBuf,
    pub bars: usize,
    pub notes: usize,
    pub stop_reason: StopReason,
    /// Index of the bar that was still being captured when the session stopped.
    pub dropped_bar: Option<usize>,
}

/// The chart writer failed. The recorded song is kept so it can be written elsewhere.
#[derive(Error, Debug)]
#[error("failed to save '{}': {source}", .song.metadata.title)]
pub struct FailedSession {
    pub song: Song,
    #[source]
    pub source: WriteError,
}

#[derive(Debug)]
pub struct CaptureSession {
    metadata: SongMetadata,
    config: CaptureConfig,
    scheduler: BarScheduler,
    capture: Option<BarCapture>,
    chart: Chart,
    phase: Phase,
    dropped_bar: Option<usize>,
}

impl CaptureSession {
    pub fn new(metadata: SongMetadata, config: CaptureConfig) -> Result<Self, MetadataError> {
        metadata.validate()?;

        Ok(Self {
            scheduler: BarScheduler::new(metadata.bpm, config.lookahead_frames),
            metadata,
            config,
            capture: None,
            chart: Chart::default(),
            phase: Phase::Idle,
            dropped_bar: None,
        })
    }

    pub fn scheduler(&self) -> &BarScheduler {
        &self.scheduler
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn is_capturing_bar(&self) -> bool {
        self.capture.is_some()
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Finalizing | Phase::Stopped(_) => SessionState::Finalizing,
            Phase::Recording => match &self.capture {
                Some(capture) => SessionState::BarCapturing {
                    bar: capture.bar(),
                    slot: capture.open_slot().map(|slot| slot.index),
                },
                None => SessionState::Recording,
            },
        }
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.phase {
            Phase::Stopped(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            warn!("Capture session already started..!");
            return;
        }

        info!(
            "Recording '{}' at {} BPM ({:.3}s per bar)..!",
            self.metadata.title,
            self.metadata.bpm,
            self.scheduler.bar_duration()
        );
        self.phase = Phase::Recording;
    }

    /// Advance the session by one frame.
    pub fn tick(&mut self, frame: &Frame, avatar: &AvatarState) -> Tick {
        match self.phase {
            Phase::Recording => {}
            Phase::Stopped(reason) => return Tick::Stopped(reason),
            Phase::Idle | Phase::Finalizing => return Tick::Continue,
        }

        if !frame.playing {
            return self.stop(StopReason::TransportStopped);
        }

        if let Some(limit) = self.config.timeout {
            if frame.time > limit {
                warn!(
                    "Transport still playing at {:.3}s, past the {:.3}s limit..!",
                    frame.time, limit
                );
                return self.stop(StopReason::TimedOut);
            }
        }

        if let Some(bar) = self.scheduler.poll(frame, self.capture.is_some()) {
            debug!("New bar {} at {:.3}s", bar, frame.time);
            let start = self.scheduler.accumulator() - self.scheduler.bar_duration();
            let mut capture = BarCapture::new(bar, start, self.scheduler.slot_duration());
            capture.advance(frame, avatar);
            self.capture = Some(capture);
            return Tick::Continue;
        }

        if let Some(capture) = self.capture.as_mut() {
            if let SlotStep::BarComplete(bar) = capture.advance(frame, avatar) {
                debug!(
                    "Bar {} complete at {:.3}s with {} notes",
                    capture.bar(),
                    frame.time,
                    bar.note_count()
                );
                self.chart.push(bar);
                self.capture = None;
            }
        }

        Tick::Continue
    }

    /// Stop scheduling. Completed bars stay in the chart; a bar still being captured is dropped.
    pub fn stop(&mut self, reason: StopReason) -> Tick {
        if let Phase::Stopped(previous) = self.phase {
            return Tick::Stopped(previous);
        }

        if let Some(capture) = self.capture.take() {
            warn!(
                "Dropping bar {} with {} of 4 slots captured..!",
                capture.bar(),
                capture.slots_closed()
            );
            self.dropped_bar = Some(capture.bar());
        }

        info!(
            "Recording stopped ({:?}) after {} bars..!",
            reason,
            self.chart.len()
        );
        self.phase = Phase::Stopped(reason);
        Tick::Stopped(reason)
    }

    pub fn cancel(&mut self) -> Tick {
        self.stop(StopReason::Cancelled)
    }

    /// Hand the recorded song to `writer`. The chart is kept by the session either way.
    pub fn finalize<W: ChartWriter + ?Sized>(
        &mut self,
        writer: &W,
        directory: &Path,
    ) -> Result<SessionReport, FailedSession> {
        let stop_reason = match self.phase {
            Phase::Stopped(reason) => reason,
            _ => match self.cancel() {
                Tick::Stopped(reason) => reason,
                Tick::Continue => StopReason::Cancelled,
            },
        };

        self.phase = Phase::Finalizing;
        let song = Song {
            metadata: self.metadata.clone(),
            chart: self.chart.clone(),
        };

        let result = writer.write(&song, directory);
        self.phase = Phase::Idle;

        match result {
            Ok(path) => Ok(SessionReport {
                path,
                bars: song.chart.len(),
                notes: song.chart.note_count(),
                stop_reason,
                dropped_bar: self.dropped_bar,
            }),
            Err(source) => {
                warn!("Chart writer failed: {}", source);
                Err(FailedSession { song, source })
            }
        }
    }
}
