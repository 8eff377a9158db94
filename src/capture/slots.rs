use crate::capture::clock::Frame;
use crate::engine::AvatarState;
use crate::model::mappings::classify;
use crate::model::song::{Bar, NoteEvent, SLOTS_PER_BAR};
use log::debug;

/// Slack when comparing frame times against slot boundaries. Frame deltas are
/// differences of sampled positions and can land a few ulps short of a boundary.
pub const BOUNDARY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenSlot {
    pub index: usize,
    pub opened_at: f64,
    pub event: NoteEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotStep {
    Opened(usize),
    Waiting,
    Closed(usize),
    BarComplete(Bar),
}

/// Captures the four slots of one bar, one slot at a time.
///
/// A slot takes its input snapshot on the frame it opens and closes on the
/// last frame before the slot boundary; the next slot opens on the frame after.
/// Boundaries are measured from the bar's scheduled start on the music clock,
/// not from the frame that happened to open the slot.
#[derive(Debug, Clone)]
pub struct BarCapture {
    bar: usize,
    start: f64,
    slot_duration: f64,
    closed: Vec<NoteEvent>,
    open: Option<OpenSlot>,
}

impl BarCapture {
    pub fn new(bar: usize, start: f64, slot_duration: f64) -> Self {
        Self {
            bar,
            start,
            slot_duration,
            closed: Vec::with_capacity(SLOTS_PER_BAR),
            open: None,
        }
    }

    pub fn bar(&self) -> usize {
        self.bar
    }

    pub fn open_slot(&self) -> Option<&OpenSlot> {
        self.open.as_ref()
    }

    pub fn slots_closed(&self) -> usize {
        self.closed.len()
    }

    /// Scheduled playback time at which slot `index` ends.
    pub fn slot_end(&self, index: usize) -> f64 {
        self.start + (index + 1) as f64 * self.slot_duration
    }

    pub fn advance(&mut self, frame: &Frame, avatar: &AvatarState) -> SlotStep {
        let Some(open) = self.open else {
            return self.open_next(frame, avatar);
        };

        if frame.time + frame.delta < self.slot_end(open.index) - BOUNDARY_EPSILON {
            return SlotStep::Waiting;
        }

        self.open = None;
        self.closed.push(open.event);
        debug!(
            "Bar {} slot {} closed at {:.3}s (opened at {:.3}s)",
            self.bar, open.index, frame.time, open.opened_at
        );

        if self.closed.len() < SLOTS_PER_BAR {
            return SlotStep::Closed(open.index);
        }

        let mut slots = [NoteEvent::default(); SLOTS_PER_BAR];
        slots.copy_from_slice(&self.closed);
        SlotStep::BarComplete(Bar::new(slots))
    }

    fn open_next(&mut self, frame: &Frame, avatar: &AvatarState) -> SlotStep {
        let index = self.closed.len();
        let event = classify(&avatar.keys, avatar.y);

        if !event.is_empty() {
            debug!("Bar {} slot {} captured {:?}", self.bar, index, event);
        }

        self.open = Some(OpenSlot {
            index,
            opened_at: frame.time,
            event,
        });

        SlotStep::Opened(index)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::mappings::KeyState;
    use crate::model::song::{Lane, NoteType};

    fn frame(time: f64) -> Frame {
        Frame {
            playing: true,
            time,
            delta: 0.125,
        }
    }

    fn pressed(y: f32) -> AvatarState {
        AvatarState {
            y,
            keys: KeyState {
                right: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn captures_four_slots_in_order() {
        let mut capture = BarCapture::new(0, 0.0, 0.5);
        let idle = AvatarState::default();
        let mut steps = Vec::new();
        let mut time = 0.0;

        loop {
            let avatar = if time == 1.0 { pressed(-0.5) } else { idle };
            let step = capture.advance(&frame(time), &avatar);
            let done = matches!(step, SlotStep::BarComplete(_));
            steps.push((time, step));
            if done {
                break;
            }
            time += 0.125;
        }

        let opened: Vec<(f64, usize)> = steps
            .iter()
            .filter_map(|(t, s)| match s {
                SlotStep::Opened(i) => Some((*t, *i)),
                _ => None,
            })
            .collect();
        assert_eq!(opened, vec![(0.0, 0), (0.5, 1), (1.0, 2), (1.5, 3)]);

        let (time, SlotStep::BarComplete(bar)) = steps.last().unwrap() else {
            panic!("bar never completed");
        };
        assert_eq!(*time, 1.875);
        assert_eq!(bar.slots.len(), 4);
        assert_eq!(bar.slots[2], NoteEvent::single(Lane::Bottom, NoteType::Water));
        assert_eq!(bar.note_count(), 1);
    }

    #[test]
    fn snapshot_is_taken_only_when_a_slot_opens() {
        let mut capture = BarCapture::new(3, 0.0, 0.5);

        assert_eq!(capture.advance(&frame(0.0), &AvatarState::default()), SlotStep::Opened(0));
        assert_eq!(capture.advance(&frame(0.125), &pressed(0.0)), SlotStep::Waiting);
        assert_eq!(capture.open_slot().map(|s| s.event), Some(NoteEvent::default()));
        assert_eq!(capture.advance(&frame(0.25), &pressed(0.0)), SlotStep::Waiting);
        assert_eq!(capture.advance(&frame(0.375), &pressed(0.0)), SlotStep::Closed(0));
        assert!(capture.open_slot().is_none());
        assert_eq!(capture.slots_closed(), 1);
        assert_eq!(capture.bar(), 3);
    }

    #[test]
    fn slot_shorter_than_frame_closes_on_next_frame() {
        let mut capture = BarCapture::new(0, 0.0, 0.05);
        assert_eq!(capture.advance(&frame(0.0), &AvatarState::default()), SlotStep::Opened(0));
        assert_eq!(capture.advance(&frame(0.125), &AvatarState::default()), SlotStep::Closed(0));
        assert_eq!(capture.advance(&frame(0.25), &AvatarState::default()), SlotStep::Opened(1));
    }

    #[test]
    fn boundaries_follow_the_bar_start_not_the_opening_frame() {
        // Bar scheduled at 2.0 but first seen on a frame at 2.1.
        let mut capture = BarCapture::new(1, 2.0, 0.5);
        assert_eq!(capture.slot_end(0), 2.5);
        assert_eq!(capture.slot_end(3), 4.0);

        assert_eq!(capture.advance(&frame(2.1), &AvatarState::default()), SlotStep::Opened(0));
        assert_eq!(capture.advance(&frame(2.25), &AvatarState::default()), SlotStep::Waiting);
        // 2.375 + 0.125 reaches 2.5 even though the slot only opened at 2.1.
        assert_eq!(capture.advance(&frame(2.375), &AvatarState::default()), SlotStep::Closed(0));
        assert_eq!(capture.advance(&frame(2.5), &AvatarState::default()), SlotStep::Opened(1));
    }

    #[test]
    fn inexact_frame_deltas_still_close_on_the_boundary() {
        let period = 1.0 / 60.0;
        let mut capture = BarCapture::new(0, 0.0, 0.5);
        let mut last = 0.0;
        let mut closed_on = None;

        for n in 0..40 {
            let time = n as f64 / 60.0;
            let delta = if n == 0 { period } else { time - last };
            last = time;
            let step = capture.advance(
                &Frame {
                    playing: true,
                    time,
                    delta,
                },
                &AvatarState::default(),
            );
            if step == SlotStep::Closed(0) {
                closed_on = Some(n);
                break;
            }
        }

        // Frame 29 sits one frame before the 0.5s boundary.
        assert_eq!(closed_on, Some(29));
    }
}
