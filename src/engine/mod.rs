use crate::model::mappings::KeyState;

pub mod clock;
pub mod trace;
#[cfg(all(target_os = "windows", feature = "wininput"))]
pub mod windows;

#[cfg(all(target_os = "windows", feature = "wininput"))]
pub use self::windows::KeyboardAvatar;

/// The music transport a recording follows. The capture engine only reads it.
pub trait Transport: Send {
    fn play(&mut self);

    fn is_playing(&self) -> bool;

    /// Playback position in seconds.
    fn current_time(&self) -> f64;

    /// Called once at the start of every frame, before the transport is sampled.
    fn advance(&mut self) {}
}

/// What the player avatar looked like during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AvatarState {
    /// Vertical position of the avatar.
    pub y: f32,
    /// Note keys that went down this frame.
    pub keys: KeyState,
}

pub trait Avatar: Send {
    /// Sample the avatar for the current frame. Called exactly once per frame.
    fn poll(&mut self) -> AvatarState;
}

/// An avatar that never moves and never presses anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleAvatar {
    pub y: f32,
}

impl Avatar for IdleAvatar {
    fn poll(&mut self) -> AvatarState {
        AvatarState {
            y: self.y,
            keys: KeyState::default(),
        }
    }
}
