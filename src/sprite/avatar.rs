use crate::camera::Camera;
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Point, Rect, Renderer, Size};
use crate::sprite::state::{AvatarContext, AvatarState, Facing, IsWalking, WalkBounds};
use crate::sprite::{Idle, SpriteMetadata, SpriteState, Walking};
use web_sys::HtmlImageElement;

/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State  →  Event     →  To State                   │
/// ├─────────────────────────────────────────────────────────┤
/// │  Idle        →  WalkTo    →  Walking                    │
/// │  Walking     →  WalkTo    →  Walking (retargeted)       │
/// │  Walking     →  Update    →  Idle (when arrived)        │
/// │  any         →  Teleport  →  Idle                       │
/// │  any         →  Stop      →  Idle                       │
/// └─────────────────────────────────────────────────────────┘
pub enum Event {
    WalkTo(f64),
    Update(f64),
    Teleport { x: f64, y: Option<f64> },
    Stop,
    SetBounds(WalkBounds),
    SetFloor(f64),
}

#[derive(Debug, Copy, Clone)]
enum AvatarStateMachine {
    Idle(AvatarState<Idle>),
    Walking(AvatarState<Walking>),
}

impl From<AvatarState<Idle>> for AvatarStateMachine {
    fn from(state: AvatarState<Idle>) -> Self {
        AvatarStateMachine::Idle(state)
    }
}

impl From<AvatarState<Walking>> for AvatarStateMachine {
    fn from(state: AvatarState<Walking>) -> Self {
        AvatarStateMachine::Walking(state)
    }
}

impl From<IsWalking> for AvatarStateMachine {
    fn from(is_walking: IsWalking) -> Self {
        match is_walking {
            IsWalking::Arrived(idle_state) => idle_state.into(),
            IsWalking::InProgress(walking_state) => walking_state.into(),
        }
    }
}

impl AvatarStateMachine {
    // consumes the current state and returns the next one, the old state
    // can't be touched after a transition
    fn transition(self, event: Event) -> Self {
        use AvatarStateMachine::*;
        match (self, event) {
            (Idle(state), Event::WalkTo(x)) => state.walk_to(x).into(),
            (Walking(state), Event::WalkTo(x)) => state.walk_to(x).into(),
            (Idle(state), Event::Update(delta)) => state.update(delta).into(),
            (Walking(state), Event::Update(delta)) => state.update(delta).into(),
            (Idle(state), Event::Teleport { x, y }) => state.teleport(x, y).into(),
            (Walking(state), Event::Teleport { x, y }) => state.teleport(x, y).into(),
            (Idle(state), Event::Stop) => state.into(),
            (Walking(state), Event::Stop) => state.stop().into(),
            (Idle(state), Event::SetBounds(bounds)) => state.with_bounds(bounds).into(),
            (Walking(state), Event::SetBounds(bounds)) => state.with_bounds(bounds).into(),
            (Idle(state), Event::SetFloor(y)) => state.with_floor_y(y).into(),
            (Walking(state), Event::SetFloor(y)) => state.with_floor_y(y).into(),
        }
    }

    fn context(&self) -> &AvatarContext {
        match self {
            AvatarStateMachine::Idle(state) => state.context(),
            AvatarStateMachine::Walking(state) => state.context(),
        }
    }

    fn metadata(&self) -> SpriteMetadata {
        match self {
            AvatarStateMachine::Idle(_) => crate::sprite::Idle::metadata(),
            AvatarStateMachine::Walking(_) => crate::sprite::Walking::metadata(),
        }
    }
}

/// What to do once the avatar reaches the spot it was sent to
#[derive(Debug, Clone, PartialEq)]
pub enum ArrivalAction {
    Region(String),
    Npc(String),
}

/// Which sheet and frame to show right now
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteFrame {
    pub walking: bool,
    pub index: u8,
    pub frame_count: u8,
    /// sheets face right, so facing left draws them mirrored
    pub mirrored: bool,
}

/// Sheets for the avatar, `None` draws the placeholder
#[derive(Default)]
pub struct AvatarSprites {
    pub idle: Option<HtmlImageElement>,
    pub walk: Option<HtmlImageElement>,
}

/// Avatar motion controller
/// - update() -> statemachine::transition(Update)
/// - at most one arrival action is pending; replacing it is explicit
pub struct Avatar {
    state: AvatarStateMachine,
    pending: Option<ArrivalAction>,
}

impl Avatar {
    pub fn new(x: f64, floor_y: f64, bounds: WalkBounds) -> Self {
        Avatar {
            state: AvatarStateMachine::Idle(AvatarState::new(
                Point {
                    x: bounds.clamp(x),
                    y: floor_y,
                },
                bounds,
            )),
            pending: None,
        }
    }

    /// Start walking toward `target_x` (clamped to the walk bounds)
    /// - returns the arrival action this call superseded, which will now
    ///   never run
    pub fn walk_to(
        &mut self,
        target_x: f64,
        on_arrive: Option<ArrivalAction>,
    ) -> Option<ArrivalAction> {
        self.state = self.state.transition(Event::WalkTo(target_x));
        std::mem::replace(&mut self.pending, on_arrive)
    }

    /// Advance one frame
    /// - returns the pending arrival action on the frame the avatar arrives,
    ///   exactly once
    pub fn update(&mut self, delta: f64) -> Option<ArrivalAction> {
        let was_walking = self.is_walking();
        self.state = self.state.transition(Event::Update(delta));
        if was_walking && !self.is_walking() {
            self.pending.take()
        } else {
            None
        }
    }

    /// Teleport, cancelling any walk and dropping the pending action unrun
    pub fn set_position(&mut self, x: f64, y: Option<f64>) {
        self.pending = None;
        self.state = self.state.transition(Event::Teleport { x, y });
    }

    /// Cancel motion in place, the pending action is dropped unrun
    pub fn stop(&mut self) {
        self.pending = None;
        self.state = self.state.transition(Event::Stop);
    }

    /// Existing position is left alone while idle
    pub fn set_walk_bounds(&mut self, min: f64, max: f64) {
        self.state = self
            .state
            .transition(Event::SetBounds(WalkBounds::new(min, max)));
    }

    pub fn set_floor_y(&mut self, floor_y: f64) {
        self.state = self.state.transition(Event::SetFloor(floor_y));
    }

    // Law of Demeter : callers only see the avatar, never the state context
    pub fn position(&self) -> Point {
        self.state.context().position
    }

    pub fn facing(&self) -> Facing {
        self.state.context().facing
    }

    pub fn walk_bounds(&self) -> WalkBounds {
        self.state.context().bounds
    }

    pub fn floor_y(&self) -> f64 {
        self.state.context().floor_y
    }

    pub fn is_walking(&self) -> bool {
        matches!(self.state, AvatarStateMachine::Walking(_))
    }

    pub fn target_x(&self) -> Option<f64> {
        match &self.state {
            AvatarStateMachine::Walking(state) => Some(state.target_x()),
            AvatarStateMachine::Idle(_) => None,
        }
    }

    pub fn has_pending_action(&self) -> bool {
        self.pending.is_some()
    }

    /// Footprint in world units, differs between idle and walking
    pub fn size(&self) -> Size {
        self.state.metadata().size
    }

    /// World rectangle, bottom-left at the feet minus half the width
    pub fn bounding_box(&self) -> Rect {
        let size = self.size();
        let position = self.position();
        Rect::new(
            Point {
                x: position.x - size.width / 2.0,
                y: position.y,
            },
            size,
        )
    }

    pub fn current_frame(&self) -> SpriteFrame {
        let context = self.state.context();
        let metadata = self.state.metadata();
        SpriteFrame {
            walking: self.is_walking(),
            index: context.frame % metadata.frame_count.max(1),
            frame_count: metadata.frame_count,
            mirrored: context.facing == Facing::Left,
        }
    }

    pub fn draw(&self, renderer: &Renderer, camera: &Camera, sprites: &AvatarSprites) {
        let destination = camera.world_rect_to_canvas(&self.bounding_box());
        let frame = self.current_frame();
        let sheet = if frame.walking {
            sprites.walk.as_ref()
        } else {
            sprites.idle.as_ref()
        };

        match sheet {
            Some(image) => {
                let frame_width = image.natural_width() as f64 / frame.frame_count.max(1) as f64;
                let source = Rect::new(
                    Point {
                        x: frame_width * frame.index as f64,
                        y: 0.0,
                    },
                    Size::new(frame_width, image.natural_height() as f64),
                );
                renderer.draw_image(image, &source, &destination, frame.mirrored);
            }
            None => {
                // placeholder body + head
                let body = Rect::new(
                    Point {
                        x: destination.x() + destination.width() * 0.25,
                        y: destination.y(),
                    },
                    Size::new(destination.width() * 0.5, destination.height() * 0.78),
                );
                renderer.fill_rect(&body, "#00ffd0", 1.0);
                let head = Rect::new(
                    Point {
                        x: destination.x() + destination.width() * 0.375,
                        y: destination.y() + destination.height() * 0.08,
                    },
                    Size::new(destination.width() * 0.25, destination.height() * 0.125),
                );
                renderer.fill_rect(&head, "#1a1a1a", 1.0);
            }
        }

        #[cfg(debug_assertions)]
        destination.draw_debug(renderer);
    }
}
