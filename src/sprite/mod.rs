// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      sprite/ layout                                      │
// ├────────────────┬─────────────────────────────────────────────────────────┤
// │   mod.rs       │ SpriteState trait, animation states + sheet metadata    │
// │   state.rs     │ AvatarState<S> typestates and their shared context      │
// │   avatar.rs    │ AvatarStateMachine + Avatar (motion controller)         │
// └────────────────┴─────────────────────────────────────────────────────────┘
pub mod avatar;
pub mod state;

use crate::engine::Size;

/// Per-animation sheet settings
/// - sheets are horizontal strips of equally wide frames
#[derive(Debug, Copy, Clone)]
pub struct SpriteMetadata {
    pub sheet: &'static str,
    pub frame_count: u8,
    /// seconds per frame
    pub frame_duration: f64,
    /// footprint in world units
    pub size: Size,
}

pub trait SpriteState {
    fn metadata() -> SpriteMetadata;

    fn total_frames() -> u8 {
        Self::metadata().frame_count
    }
}

/// Standing still, single frame
#[derive(Debug, Copy, Clone)]
pub struct Idle;

/// Walking toward `target_x`
/// - the target lives in the state itself, so there is no walking without one
#[derive(Debug, Copy, Clone)]
pub struct Walking {
    pub target_x: f64,
}

impl SpriteState for Idle {
    fn metadata() -> SpriteMetadata {
        SpriteMetadata {
            sheet: "assets/character/idle.png",
            frame_count: 1,
            frame_duration: 0.0,
            // 128x256 source art scaled 3.6x
            size: Size::new(461.0, 922.0),
        }
    }
}

impl SpriteState for Walking {
    fn metadata() -> SpriteMetadata {
        SpriteMetadata {
            sheet: "assets/character/walk.png",
            frame_count: 6,
            frame_duration: 0.1,
            // narrower than idle, same height
            size: Size::new(315.0, 922.0),
        }
    }
}
