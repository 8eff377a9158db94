use crate::engine::{Avatar, AvatarState};
use crate::model::mappings::{KeyState, LANE_DOWN_KEY, LANE_EDGE, LANE_UP_KEY, NOTE_KEYS};
use log::debug;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VIRTUAL_KEY};

/// Reads the physical keyboard once per frame.
///
/// Note keys report key-down edges only. The arrow keys move the avatar one
/// lane up or down, between `-LANE_EDGE` and `LANE_EDGE`.
#[derive(Debug, Clone, Default)]
pub struct KeyboardAvatar {
    y: f32,
    held_notes: [bool; 4],
    held_up: bool,
    held_down: bool,
}

impl KeyboardAvatar {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_down(key: VIRTUAL_KEY) -> bool {
        // High bit is set while the key is held.
        let state = unsafe { GetAsyncKeyState(key.0 as i32) };
        (state as u16 & 0x8000) != 0
    }

    /// Returns true on the first frame a key is seen down.
    fn edge(key: VIRTUAL_KEY, held: &mut bool) -> bool {
        let down = Self::is_down(key);
        let pressed = down && !*held;
        *held = down;
        pressed
    }
}

impl Avatar for KeyboardAvatar {
    fn poll(&mut self) -> AvatarState {
        if Self::edge(LANE_UP_KEY, &mut self.held_up) {
            self.y = (self.y + LANE_EDGE).min(LANE_EDGE);
            debug!("Avatar moved up to y={}", self.y);
        }
        if Self::edge(LANE_DOWN_KEY, &mut self.held_down) {
            self.y = (self.y - LANE_EDGE).max(-LANE_EDGE);
            debug!("Avatar moved down to y={}", self.y);
        }

        let mut pressed = [false; 4];
        for (i, note_key) in NOTE_KEYS.iter().enumerate() {
            pressed[i] = Self::edge(note_key.key, &mut self.held_notes[i]);
            if pressed[i] {
                debug!("Key down: {}", note_key.label);
            }
        }

        AvatarState {
            y: self.y,
            keys: KeyState {
                up: pressed[0],
                left: pressed[1],
                right: pressed[2],
                down: pressed[3],
            },
        }
    }
}
