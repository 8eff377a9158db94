use crate::capture::clock::Frame;
use crate::model::song::{bar_duration, SLOTS_PER_BAR};

/// Decides when the next bar starts.
///
/// `scheduled` is the playback time already handed out to bars. A new bar may
/// start once `time - lookahead >= scheduled - bar_duration`, where the
/// lookahead is a number of frames scaled by the current frame delta.
#[derive(Debug, Clone)]
pub struct BarScheduler {
    bar_duration: f64,
    lookahead_frames: f64,
    scheduled: f64,
    bars: usize,
}

impl BarScheduler {
    pub fn new(bpm: f64, lookahead_frames: f64) -> Self {
        Self {
            bar_duration: bar_duration(bpm),
            lookahead_frames,
            scheduled: 0.0,
            bars: 0,
        }
    }

    pub fn bar_duration(&self) -> f64 {
        self.bar_duration
    }

    pub fn slot_duration(&self) -> f64 {
        self.bar_duration / SLOTS_PER_BAR as f64
    }

    pub fn accumulator(&self) -> f64 {
        self.scheduled
    }

    pub fn bars_scheduled(&self) -> usize {
        self.bars
    }

    pub fn lookahead(&self, frame: &Frame) -> f64 {
        self.lookahead_frames * frame.delta
    }

    pub fn is_due(&self, frame: &Frame) -> bool {
        frame.time - self.lookahead(frame) >= self.scheduled - self.bar_duration
    }

    /// Launches a bar if one is due and `busy` is false. Returns the index of the launched bar.
    pub fn poll(&mut self, frame: &Frame, busy: bool) -> Option<usize> {
        if busy || !self.is_due(frame) {
            return None;
        }

        let index = self.bars;
        self.scheduled += self.bar_duration;
        self.bars += 1;
        Some(index)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn frame(time: f64, delta: f64) -> Frame {
        Frame {
            playing: true,
            time,
            delta,
        }
    }

    #[test]
    fn first_bar_starts_immediately() {
        let mut scheduler = BarScheduler::new(120.0, 1.0);
        assert_eq!(scheduler.poll(&frame(0.0, 1.0 / 60.0), false), Some(0));
        assert_eq!(scheduler.accumulator(), 2.0);
    }

    #[test]
    fn busy_scheduler_ignores_triggers() {
        let mut scheduler = BarScheduler::new(120.0, 1.0);
        assert_eq!(scheduler.poll(&frame(0.0, 0.0625), true), None);
        assert_eq!(scheduler.bars_scheduled(), 0);
        assert_eq!(scheduler.accumulator(), 0.0);
    }

    #[test]
    fn lookahead_delays_the_next_trigger() {
        let mut scheduler = BarScheduler::new(120.0, 2.0);
        scheduler.poll(&frame(0.0, 0.0625), false);

        // Two frames of lookahead at 0.0625s per frame.
        assert_eq!(scheduler.lookahead(&frame(0.0, 0.0625)), 0.125);
        assert!(!scheduler.is_due(&frame(0.0625, 0.0625)));
        assert!(scheduler.is_due(&frame(0.125, 0.0625)));

        scheduler.poll(&frame(2.0, 0.0625), false);
        assert!(!scheduler.is_due(&frame(2.0625, 0.0625)));
        assert!(scheduler.is_due(&frame(2.125, 0.0625)));
    }

    #[test]
    fn accumulator_tracks_bars() {
        for bpm in [60.0, 97.0, 120.0, 174.0] {
            let mut scheduler = BarScheduler::new(bpm, 1.0);
            let mut time = 0.0;
            let delta = 1.0 / 60.0;

            while scheduler.bars_scheduled() < 10 {
                scheduler.poll(&frame(time, delta), false);
                time += delta;
            }

            let expected = 10.0 * 240.0 / bpm;
            assert!((scheduler.accumulator() - expected).abs() < delta);
            assert!((scheduler.slot_duration() - 60.0 / bpm).abs() < 1e-12);
        }
    }
}
