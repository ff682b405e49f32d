use crate::camera::Camera;
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Point, Rect, Renderer, Size};
use crate::hotspots::Cursor;
use crate::level::NpcData;
use crate::sprite::avatar::{ArrivalAction, Avatar};
use rand::Rng;
use std::collections::HashMap;
use web_sys::HtmlImageElement;

const PLACEHOLDER_COLOR: &str = "#8855ff";

/// Frame index for a ping-pong cycle 0 1 2 3 2 1 0 1 ...
/// - `time` and `phase` are in seconds and frames respectively
pub fn ping_pong_frame(time: f64, frame_duration: f64, phase: f64, frame_count: u8) -> u8 {
    if frame_count <= 1 || frame_duration <= 0.0 {
        return 0;
    }
    let last = (frame_count - 1) as f64;
    let cycle = last * 2.0;
    let t = (time / frame_duration + phase).rem_euclid(cycle);
    let frame = if t < frame_count as f64 {
        t.floor()
    } else {
        last - (t - last).floor()
    };
    frame.clamp(0.0, last) as u8
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub data: NpcData,
    rect: Rect,
    /// in frames, so two NPCs never bob in lockstep
    phase_offset: f64,
    frame: u8,
}

impl Npc {
    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    pub fn frame(&self) -> u8 {
        self.frame
    }

    pub fn phase_offset(&self) -> f64 {
        self.phase_offset
    }
}

/// NPC sub-registry, same hover/click contract as regions plus a looping
/// idle animation
pub struct NpcRegistry {
    npcs: Vec<Npc>,
    elapsed: f64,
    hovered: Option<usize>,
    enabled: bool,
}

impl Default for NpcRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NpcRegistry {
    pub fn new() -> Self {
        NpcRegistry {
            npcs: Vec::new(),
            elapsed: 0.0,
            hovered: None,
            enabled: true,
        }
    }

    pub fn load<R: Rng + ?Sized>(&mut self, npcs: &[NpcData], rng: &mut R) {
        self.npcs = npcs
            .iter()
            .map(|data| Npc {
                rect: data.rect(),
                phase_offset: rng.gen::<f64>() * data.frame_count.max(1) as f64,
                frame: 0,
                data: data.clone(),
            })
            .collect();
        self.elapsed = 0.0;
        self.hovered = None;
        self.update(0.0);
    }

    pub fn clear(&mut self) {
        self.npcs.clear();
        self.elapsed = 0.0;
        self.hovered = None;
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn npc(&self, id: &str) -> Option<&Npc> {
        self.npcs.iter().find(|npc| npc.id() == id)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.hovered = None;
        }
    }

    pub fn update(&mut self, delta: f64) {
        self.elapsed += delta;
        let elapsed = self.elapsed;
        for npc in self.npcs.iter_mut() {
            npc.frame = ping_pong_frame(
                elapsed,
                npc.data.frame_duration,
                npc.phase_offset,
                npc.data.frame_count,
            );
        }
    }

    pub fn pick(&self, world: Point) -> Option<usize> {
        self.npcs.iter().position(|npc| npc.rect.contains(world))
    }

    pub fn hovered(&self) -> Option<&Npc> {
        self.hovered.and_then(|index| self.npcs.get(index))
    }

    pub fn cursor(&self) -> Cursor {
        if self.hovered.is_some() {
            Cursor::Pointer
        } else {
            Cursor::Default
        }
    }

    pub fn pointer_move(&mut self, world: Option<Point>) -> bool {
        if !self.enabled {
            return false;
        }
        let next = world.and_then(|point| self.pick(point));
        let changed = next != self.hovered;
        self.hovered = next;
        changed
    }

    pub fn click(&self, world: Point, avatar: &mut Avatar) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(npc) = self.pick(world).and_then(|index| self.npcs.get(index)) else {
            return false;
        };
        avatar.walk_to(npc.data.position.x, Some(ArrivalAction::Npc(npc.id().to_string())));
        true
    }

    /// `sheets` is keyed by sprite path, missing sheets draw a placeholder
    pub fn draw(
        &self,
        renderer: &Renderer,
        camera: &Camera,
        sheets: &HashMap<String, HtmlImageElement>,
    ) {
        for npc in &self.npcs {
            let destination = camera.world_rect_to_canvas(&npc.rect);
            match sheets.get(&npc.data.sprite) {
                Some(image) => {
                    let count = npc.data.frame_count.max(1) as f64;
                    let frame_width = image.natural_width() as f64 / count;
                    let source = Rect::new(
                        Point::new(frame_width * npc.frame as f64, 0.0),
                        Size::new(frame_width, image.natural_height() as f64),
                    );
                    renderer.draw_image(image, &source, &destination, false);
                }
                None => {
                    let body = Rect::new(
                        Point::new(destination.x() + destination.width() / 8.0, destination.y()),
                        Size::new(destination.width() * 0.75, destination.height()),
                    );
                    renderer.fill_rect(&body, PLACEHOLDER_COLOR, 1.0);
                    renderer.fill_text("NPC", destination.center(), "#ffffff");
                }
            }
            #[cfg(debug_assertions)]
            destination.draw_debug(renderer);
        }
    }
}
