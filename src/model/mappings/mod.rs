#[cfg(all(target_os = "windows", feature = "wininput"))]
mod windows;

#[cfg(all(target_os = "windows", feature = "wininput"))]
pub use self::windows::{LANE_DOWN_KEY, LANE_UP_KEY, NOTE_KEYS};

use crate::model::song::{Lane, NoteEvent, NoteType};
use serde::{Deserialize, Serialize};

/// Half the height of the playfield; the avatar sits at 0.5, 0.0 or -0.5.
pub const LANE_EDGE: f32 = 0.5;

/// Key-down events for the four note keys during one frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct KeyState {
    pub up: bool,
    pub left: bool,
    pub right: bool,
    pub down: bool,
}

impl KeyState {
    pub fn any(&self) -> bool {
        self.up || self.left || self.right || self.down
    }
}

/// Note type for the pressed keys. When several keys go down on the same
/// frame the first of up, left, right, down wins.
pub fn note_for_keys(keys: &KeyState) -> Option<NoteType> {
    if keys.up {
        Some(NoteType::Fire)
    } else if keys.left {
        Some(NoteType::Air)
    } else if keys.right {
        Some(NoteType::Water)
    } else if keys.down {
        Some(NoteType::Earth)
    } else {
        None
    }
}

/// Lane for the avatar's vertical position.
///
/// Only `(0, 0.5]` maps to the top lane and `[-0.5, 0)` to the bottom lane;
/// zero and anything beyond the playfield edges fall back to the middle lane.
pub fn lane_for_position(y: f32) -> Lane {
    if y > 0.0 && y <= LANE_EDGE {
        Lane::Top
    } else if y < 0.0 && y >= -LANE_EDGE {
        Lane::Bottom
    } else {
        Lane::Middle
    }
}

pub fn classify(keys: &KeyState, y: f32) -> NoteEvent {
    match note_for_keys(keys) {
        Some(note) => NoteEvent::single(lane_for_position(y), note),
        None => NoteEvent::default(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn keys(up: bool, left: bool, right: bool, down: bool) -> KeyState {
        KeyState {
            up,
            left,
            right,
            down,
        }
    }

    #[test]
    fn lane_boundaries() {
        assert_eq!(lane_for_position(0.5), Lane::Top);
        assert_eq!(lane_for_position(0.25), Lane::Top);
        assert_eq!(lane_for_position(0.50001), Lane::Middle);
        assert_eq!(lane_for_position(0.0), Lane::Middle);
        assert_eq!(lane_for_position(-0.0), Lane::Middle);
        assert_eq!(lane_for_position(-0.5), Lane::Bottom);
        assert_eq!(lane_for_position(-0.50001), Lane::Middle);
        assert_eq!(lane_for_position(3.0), Lane::Middle);
        assert_eq!(lane_for_position(f32::NAN), Lane::Middle);
    }

    #[test]
    fn direction_mapping() {
        assert_eq!(note_for_keys(&keys(true, false, false, false)), Some(NoteType::Fire));
        assert_eq!(note_for_keys(&keys(false, true, false, false)), Some(NoteType::Air));
        assert_eq!(note_for_keys(&keys(false, false, true, false)), Some(NoteType::Water));
        assert_eq!(note_for_keys(&keys(false, false, false, true)), Some(NoteType::Earth));
        assert_eq!(note_for_keys(&KeyState::default()), None);
    }

    #[test]
    fn simultaneous_keys_use_priority_order() {
        assert_eq!(note_for_keys(&keys(true, true, false, false)), Some(NoteType::Fire));
        assert_eq!(note_for_keys(&keys(false, true, true, true)), Some(NoteType::Air));
        assert_eq!(note_for_keys(&keys(false, false, true, true)), Some(NoteType::Water));
        assert_eq!(note_for_keys(&keys(true, true, true, true)), Some(NoteType::Fire));
    }

    #[test]
    fn classified_events_set_at_most_one_lane() {
        let positions = [-1.0, -0.5, -0.2, 0.0, 0.2, 0.5, 0.7];

        for bits in 0u8..16 {
            let state = keys(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            for y in positions {
                let event = classify(&state, y);
                assert!(event.lanes_set() <= 1);
                assert_eq!(event.lanes_set() == 1, state.any());
            }
        }
    }

    #[test]
    fn classify_places_note_in_lane() {
        let event = classify(&keys(false, false, false, true), 0.5);
        assert_eq!(event, NoteEvent::single(Lane::Top, NoteType::Earth));

        let event = classify(&keys(false, true, false, false), -0.3);
        assert_eq!(event, NoteEvent::single(Lane::Bottom, NoteType::Air));

        let event = classify(&keys(true, false, true, false), 0.0);
        assert_eq!(event, NoteEvent::single(Lane::Middle, NoteType::Fire));
    }
}
