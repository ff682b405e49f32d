//! All code relating to individual states lives here and makes invalid
//! transitions unrepresentable: the only way from one state to another is
//! through the methods below
//! - PUBLIC  : AvatarState and AvatarContext
//! - PRIVATE : context mutators
use crate::engine::Point;
use crate::sprite::{Idle, SpriteState, Walking};

// world units per second
pub const WALK_SPEED: f64 = 1200.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// Horizontal range the avatar may occupy in the current level
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WalkBounds {
    pub min: f64,
    pub max: f64,
}

impl WalkBounds {
    pub fn new(min: f64, max: f64) -> Self {
        WalkBounds {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }
}

pub enum IsWalking {
    Arrived(AvatarState<Idle>),
    InProgress(AvatarState<Walking>),
}

#[derive(Debug, Copy, Clone)]
/// Shared data for :
/// - motion  : position, facing, bounds, speed
/// - display : frame + time spent on it
pub struct AvatarContext {
    pub frame: u8,
    pub frame_time: f64,
    /// feet of the sprite
    pub position: Point,
    pub facing: Facing,
    pub bounds: WalkBounds,
    pub floor_y: f64,
    pub speed: f64,
}

#[derive(Debug, Copy, Clone)]
pub struct AvatarState<S> {
    context: AvatarContext,
    state: S,
}

/// generic methods shared between all states
impl<S> AvatarState<S> {
    pub fn context(&self) -> &AvatarContext {
        &self.context
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Hard reposition, always lands idle
    pub fn teleport(self, x: f64, y: Option<f64>) -> AvatarState<Idle> {
        let y = y.unwrap_or(self.context.floor_y);
        AvatarState {
            context: self
                .context
                .on_state_transition()
                .with_position(Point { x, y }),
            state: Idle,
        }
    }

    pub fn stop(self) -> AvatarState<Idle> {
        AvatarState {
            context: self.context.on_state_transition(),
            state: Idle,
        }
    }

    pub fn with_floor_y(mut self, floor_y: f64) -> Self {
        self.context.floor_y = floor_y;
        self.context.position.y = floor_y;
        self
    }
}

impl AvatarState<Idle> {
    pub fn new(position: Point, bounds: WalkBounds) -> Self {
        AvatarState {
            context: AvatarContext {
                frame: 0,
                frame_time: 0.0,
                position,
                facing: Facing::Right,
                bounds,
                floor_y: position.y,
                speed: WALK_SPEED,
            },
            state: Idle,
        }
    }

    pub fn update(self, _delta: f64) -> Self {
        self
    }

    pub fn walk_to(self, target_x: f64) -> AvatarState<Walking> {
        let target_x = self.context.bounds.clamp(target_x);
        AvatarState {
            context: self.context.on_state_transition().face_toward(target_x),
            state: Walking { target_x },
        }
    }

    pub fn with_bounds(mut self, bounds: WalkBounds) -> Self {
        self.context.bounds = bounds;
        self
    }
}

impl AvatarState<Walking> {
    pub fn target_x(&self) -> f64 {
        self.state.target_x
    }

    /// Retarget mid-walk, the walk cycle keeps its frame
    pub fn walk_to(self, target_x: f64) -> AvatarState<Walking> {
        let target_x = self.context.bounds.clamp(target_x);
        AvatarState {
            context: self.context.face_toward(target_x),
            state: Walking { target_x },
        }
    }

    /// Returns an enum because walking can:
    /// - End      (Arrived) : snapped onto the target, no overshoot
    /// - Continue (InProgress)
    pub fn update(mut self, delta: f64) -> IsWalking {
        let target_x = self.state.target_x;
        let distance = (target_x - self.context.position.x).abs();
        let step = self.context.speed * delta.max(0.0);

        if distance <= step {
            self.context.position.x = target_x;
            return IsWalking::Arrived(self.stop());
        }

        let direction = if target_x > self.context.position.x {
            1.0
        } else {
            -1.0
        };
        self.context.position.x = self
            .context
            .bounds
            .clamp(self.context.position.x + direction * step);
        self.context = self.context.advance_frame(
            delta,
            Walking::metadata().frame_duration,
            Walking::total_frames(),
        );
        IsWalking::InProgress(self)
    }

    /// Bounds changed mid-walk: keep the target reachable
    pub fn with_bounds(mut self, bounds: WalkBounds) -> Self {
        self.context.bounds = bounds;
        self.context.position.x = bounds.clamp(self.context.position.x);
        self.state.target_x = bounds.clamp(self.state.target_x);
        self
    }
}

impl AvatarContext {
    /// Reset to frame 0 on transition
    /// - each state has its own frame count, a stale index could run past
    ///   the end of the next sheet
    fn on_state_transition(mut self) -> Self {
        self.frame = 0;
        self.frame_time = 0.0;
        self
    }

    fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Facing only changes when the target is strictly to one side
    fn face_toward(mut self, target_x: f64) -> Self {
        if target_x > self.position.x {
            self.facing = Facing::Right;
        } else if target_x < self.position.x {
            self.facing = Facing::Left;
        }
        self
    }

    fn advance_frame(mut self, delta: f64, frame_duration: f64, frame_count: u8) -> Self {
        self.frame_time += delta;
        if self.frame_time >= frame_duration {
            self.frame_time = 0.0;
            self.frame = (self.frame + 1) % frame_count.max(1);
        }
        self
    }
}
