mod capture;
mod engine;
mod model;
mod recorder;
mod util;
mod writer;

pub use capture::clock::*;
pub use capture::scheduler::*;
pub use capture::slots::*;
pub use capture::{
    CaptureConfig, CaptureSession, FailedSession, SessionReport, SessionState, StopReason, Tick,
};
pub use engine::clock::*;
pub use engine::trace::*;
pub use engine::{Avatar, AvatarState, IdleAvatar, Transport};
#[cfg(all(target_os = "windows", feature = "wininput"))]
pub use engine::KeyboardAvatar;
pub use model::config::*;
pub use model::mappings::*;
pub use model::song::*;
pub use recorder::*;
pub use util::*;
pub use writer::*;
