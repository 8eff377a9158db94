use windows::Win32::UI::Input::KeyboardAndMouse::*;

/// A key that records a note, with a label for debugging.
#[derive(Debug, Clone, Copy)]
pub struct NoteKey {
    pub key: VIRTUAL_KEY,
    pub label: &'static str,
}

// Order matches the fields of `KeyState`: up, left, right, down.
pub const NOTE_KEYS: [NoteKey; 4] = [
    NoteKey {
        key: VK_W,
        label: "W (fire)",
    },
    NoteKey {
        key: VK_A,
        label: "A (air)",
    },
    NoteKey {
        key: VK_D,
        label: "D (water)",
    },
    NoteKey {
        key: VK_S,
        label: "S (earth)",
    },
];

pub const LANE_UP_KEY: VIRTUAL_KEY = VK_UP;
pub const LANE_DOWN_KEY: VIRTUAL_KEY = VK_DOWN;
