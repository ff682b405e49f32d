use crate::camera::Camera;
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Point, Rect, Renderer};
use crate::level::Project;
use crate::sprite::avatar::{ArrivalAction, Avatar};
use rand::Rng;
use std::collections::HashSet;
use std::f64::consts::PI;

pub const HOVER_OPACITY: f64 = 0.5;
/// Idle pulse only runs on viewports narrower than this (CSS px)
pub const IDLE_PULSE_MAX_WIDTH: f64 = 800.0;
pub const INTRO_DURATION: f64 = 8.0;
pub const PROXIMITY_THRESHOLD: f64 = 600.0;
pub const PROXIMITY_HYSTERESIS: f64 = 100.0;
// envelope phase advanced per second, a pulse lasts 1 / rate
const PROXIMITY_RATE: f64 = 1.5;
const PROXIMITY_AMPLITUDE: f64 = 0.35;
const HIGHLIGHT_COLOR: &str = "#ffffff";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Pointer,
}

impl Cursor {
    pub fn css(&self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Pointer => "pointer",
        }
    }
}

/// Half a sine wave: 0 at both ends of the pulse, `amplitude` in the middle
pub fn pulse_envelope(phase: f64, amplitude: f64) -> f64 {
    if !(0.0..=1.0).contains(&phase) {
        return 0.0;
    }
    (phase * PI).sin() * amplitude
}

/// Idle pulse cadence
/// - Intro  : the first 8 s after the pulse switches on, quick and bright
/// - Steady : afterwards, slow and faint
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PulseStage {
    Intro,
    Steady,
}

impl PulseStage {
    pub fn rate(&self) -> f64 {
        match self {
            PulseStage::Intro => 2.1,
            PulseStage::Steady => 1.2,
        }
    }

    pub fn amplitude(&self) -> f64 {
        match self {
            PulseStage::Intro => 0.45,
            PulseStage::Steady => 0.25,
        }
    }

    /// Pause between two pulses
    pub fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            PulseStage::Intro => 0.8 + rng.gen::<f64>() * 0.4,
            PulseStage::Steady => 4.0 + rng.gen::<f64>() * 2.0,
        }
    }
}

/// A clickable rectangle bound to a project
#[derive(Debug, Clone)]
pub struct Region {
    pub project: Project,
    rect: Rect,
}

impl Region {
    fn new(project: Project) -> Self {
        let rect = project.hotspot.rect();
        Region { project, rect }
    }

    pub fn id(&self) -> &str {
        &self.project.id
    }

    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    /// Where the avatar stops when walking over
    pub fn anchor_x(&self) -> f64 {
        self.project.hotspot.x
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ActivePulse {
    pub region: usize,
    pub phase: f64,
    pub stage: PulseStage,
}

#[derive(Debug, Clone)]
struct IdlePulse {
    running: bool,
    elapsed: f64,
    stage: PulseStage,
    current: Option<ActivePulse>,
    countdown: Option<f64>,
    last_region: Option<usize>,
}

impl Default for IdlePulse {
    fn default() -> Self {
        IdlePulse {
            running: false,
            elapsed: 0.0,
            stage: PulseStage::Intro,
            current: None,
            countdown: None,
            last_region: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ProximityPulse {
    members: Vec<usize>,
    phase: f64,
    /// ids pulsed since the avatar last left their hysteresis range
    pulsed: HashSet<String>,
}

/// Interactive-region registry
/// - hit testing in world space, first region in load order wins on overlap
/// - highlight opacity is derived each frame from hover and the two pulses
pub struct RegionRegistry {
    regions: Vec<Region>,
    intro_region: Option<String>,
    hovered: Option<usize>,
    enabled: bool,
    idle: IdlePulse,
    proximity: ProximityPulse,
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionRegistry {
    pub fn new() -> Self {
        RegionRegistry {
            regions: Vec::new(),
            intro_region: None,
            hovered: None,
            enabled: true,
            idle: IdlePulse::default(),
            proximity: ProximityPulse::default(),
        }
    }

    /// Replace the active set, placeholder projects are skipped
    pub fn load<'a>(
        &mut self,
        projects: impl IntoIterator<Item = &'a Project>,
        intro_region: Option<&str>,
    ) {
        self.regions = projects
            .into_iter()
            .filter(|project| project.is_active())
            .cloned()
            .map(Region::new)
            .collect();
        self.intro_region = intro_region.map(str::to_string);
        self.hovered = None;
        self.proximity = ProximityPulse::default();
        self.idle.current = None;
        self.idle.last_region = None;
    }

    /// Drop every region and all highlight state
    pub fn clear(&mut self) {
        self.load(std::iter::empty(), None);
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.id() == id)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling clears hover and both pulses right away
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.hovered = None;
            self.proximity.members.clear();
            self.idle.current = None;
        }
    }

    pub fn hovered(&self) -> Option<&Region> {
        self.hovered.and_then(|index| self.regions.get(index))
    }

    pub fn cursor(&self) -> Cursor {
        if self.hovered.is_some() {
            Cursor::Pointer
        } else {
            Cursor::Default
        }
    }

    pub fn pick(&self, world: Point) -> Option<usize> {
        self.regions
            .iter()
            .position(|region| region.rect.contains(world))
    }

    /// `None` when the pointer left the canvas
    /// - returns whether the hovered region changed
    pub fn pointer_move(&mut self, world: Option<Point>) -> bool {
        if !self.enabled {
            return false;
        }
        let next = world.and_then(|point| self.pick(point));
        let changed = next != self.hovered;
        self.hovered = next;
        changed
    }

    /// Send the avatar to the region under `world`, the region fires once
    /// the avatar arrives
    pub fn click(&self, world: Point, avatar: &mut Avatar) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(region) = self.pick(world).and_then(|index| self.regions.get(index)) else {
            return false;
        };
        if let Some(ArrivalAction::Region(previous)) = avatar.walk_to(
            region.anchor_x(),
            Some(ArrivalAction::Region(region.id().to_string())),
        ) {
            log!("Walk to '{}' replaced pending walk to '{}'", region.id(), previous);
        }
        true
    }

    // ==================== Idle pulse ====================
    /// Switches the small-screen idle pulse on or off
    /// - switching off cancels the scheduled pulse and the highlight
    pub fn set_viewport_width<R: Rng + ?Sized>(&mut self, width: f64, rng: &mut R) {
        let small = width < IDLE_PULSE_MAX_WIDTH;
        if small && !self.idle.running {
            self.idle = IdlePulse {
                running: true,
                ..IdlePulse::default()
            };
            self.start_idle_pulse(rng);
        } else if !small && self.idle.running {
            self.idle = IdlePulse::default();
        }
    }

    pub fn idle_pulse(&self) -> Option<ActivePulse> {
        self.idle.current
    }

    pub fn idle_pulse_running(&self) -> bool {
        self.idle.running
    }

    /// Seconds until the next idle pulse starts
    pub fn next_idle_pulse_in(&self) -> Option<f64> {
        self.idle.countdown
    }

    fn start_idle_pulse<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.idle.stage == PulseStage::Intro && self.idle.elapsed > INTRO_DURATION {
            self.idle.stage = PulseStage::Steady;
        }
        let Some(region) = self.choose_idle_region(rng) else {
            self.schedule_idle_pulse(rng);
            return;
        };
        self.idle.last_region = Some(region);
        self.idle.current = Some(ActivePulse {
            region,
            phase: 0.0,
            stage: self.idle.stage,
        });
    }

    fn choose_idle_region<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let count = self.regions.len();
        if count == 0 {
            return None;
        }
        if self.idle.stage == PulseStage::Intro {
            let intro = self
                .intro_region
                .as_deref()
                .and_then(|id| self.regions.iter().position(|region| region.id() == id));
            if intro.is_some() {
                return intro;
            }
        }
        loop {
            let index = rng.gen_range(0..count);
            if count == 1 || Some(index) != self.idle.last_region {
                return Some(index);
            }
        }
    }

    fn schedule_idle_pulse<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.idle.countdown = Some(self.idle.stage.delay(rng));
    }

    fn update_idle_pulse<R: Rng + ?Sized>(&mut self, delta: f64, rng: &mut R) {
        if !self.idle.running {
            return;
        }
        self.idle.elapsed += delta;

        if let Some(mut pulse) = self.idle.current.take() {
            // a hovered region keeps its hover highlight, the pulse gives way
            if self.hovered == Some(pulse.region) || !self.enabled {
                self.schedule_idle_pulse(rng);
                return;
            }
            pulse.phase += pulse.stage.rate() * delta;
            if pulse.phase > 1.0 {
                self.schedule_idle_pulse(rng);
            } else {
                self.idle.current = Some(pulse);
            }
            return;
        }

        match self.idle.countdown {
            Some(remaining) if remaining - delta > 0.0 => {
                self.idle.countdown = Some(remaining - delta);
            }
            Some(_) => {
                self.idle.countdown = None;
                if self.enabled {
                    self.start_idle_pulse(rng);
                } else {
                    self.schedule_idle_pulse(rng);
                }
            }
            // pulse was cut short by a disable
            None => self.schedule_idle_pulse(rng),
        }
    }

    // ==================== Proximity pulse ====================
    pub fn proximity_pulse(&self) -> Option<(&[usize], f64)> {
        if self.proximity.members.is_empty() {
            None
        } else {
            Some((&self.proximity.members, self.proximity.phase))
        }
    }

    fn update_proximity_pulse(&mut self, delta: f64, avatar_x: f64) {
        if !self.proximity.members.is_empty() {
            self.proximity.phase += PROXIMITY_RATE * delta;
            if self.proximity.phase > 1.0 {
                self.proximity.members.clear();
            }
        }

        if !self.enabled || !self.proximity.members.is_empty() || self.hovered.is_some() {
            return;
        }

        let nearby: Vec<usize> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, region)| {
                (region.anchor_x() - avatar_x).abs() < PROXIMITY_THRESHOLD
                    && !self.proximity.pulsed.contains(region.id())
            })
            .map(|(index, _)| index)
            .collect();

        if !nearby.is_empty() {
            for index in &nearby {
                self.proximity
                    .pulsed
                    .insert(self.regions[*index].id().to_string());
            }
            self.proximity.members = nearby;
            self.proximity.phase = 0.0;
        }

        let regions = &self.regions;
        self.proximity.pulsed.retain(|id| {
            regions
                .iter()
                .find(|region| region.id() == id)
                .map(|region| {
                    (region.anchor_x() - avatar_x).abs()
                        <= PROXIMITY_THRESHOLD + PROXIMITY_HYSTERESIS
                })
                .unwrap_or(true)
        });
    }

    /// Advance both pulses by `delta` seconds
    pub fn update<R: Rng + ?Sized>(&mut self, delta: f64, avatar_x: f64, rng: &mut R) {
        self.update_idle_pulse(delta, rng);
        self.update_proximity_pulse(delta, avatar_x);
    }

    /// Highlight of region `index`: hover wins, otherwise the brighter pulse
    pub fn opacity(&self, index: usize) -> f64 {
        if self.hovered == Some(index) {
            return HOVER_OPACITY;
        }
        let idle = self
            .idle
            .current
            .filter(|pulse| pulse.region == index)
            .map(|pulse| pulse_envelope(pulse.phase, pulse.stage.amplitude()))
            .unwrap_or(0.0);
        let proximity = if self.proximity.members.contains(&index) {
            pulse_envelope(self.proximity.phase, PROXIMITY_AMPLITUDE)
        } else {
            0.0
        };
        idle.max(proximity)
    }

    pub fn draw(&self, renderer: &Renderer, camera: &Camera) {
        for (index, region) in self.regions.iter().enumerate() {
            let canvas_rect = camera.world_rect_to_canvas(&region.rect);
            let opacity = self.opacity(index);
            if opacity > 0.0 {
                renderer.fill_rounded_rect(
                    &canvas_rect,
                    region.project.hotspot.corner_radius * camera.scale(),
                    HIGHLIGHT_COLOR,
                    opacity,
                );
            }
            #[cfg(debug_assertions)]
            canvas_rect.draw_debug(renderer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::state::WalkBounds;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    const FRAME: f64 = 1.0 / 60.0;

    fn project(id: &str, x: f64, y: f64) -> Project {
        serde_json::from_value(json!({
            "id": id,
            "title": id,
            "description": "a project",
            "hotspot": { "x": x, "y": y, "width": 300, "height": 400 }
        }))
        .expect("project should parse")
    }

    fn registry(projects: &[Project]) -> RegionRegistry {
        let mut registry = RegionRegistry::new();
        registry.load(projects, None);
        registry
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn placeholders_get_no_region() {
        let mut placeholder = project("soon", 0.0, 0.0);
        placeholder.description = "Placeholder description for later".into();
        let registry = registry(&[project("a", -500.0, 0.0), placeholder]);
        assert_eq!(registry.regions().len(), 1);
        assert!(registry.region("soon").is_none());
    }

    #[test]
    fn hover_sets_highlight_and_cursor() {
        let mut registry = registry(&[project("a", -500.0, 0.0), project("b", 500.0, 0.0)]);
        assert!(registry.pointer_move(Some(Point::new(510.0, 20.0))));
        assert_eq!(registry.hovered().map(Region::id), Some("b"));
        assert_eq!(registry.cursor(), Cursor::Pointer);
        assert_eq!(registry.opacity(1), HOVER_OPACITY);
        assert_eq!(registry.opacity(0), 0.0);

        // same region again is not a change
        assert!(!registry.pointer_move(Some(Point::new(520.0, 20.0))));

        assert!(registry.pointer_move(Some(Point::new(0.0, 0.0))));
        assert!(registry.hovered().is_none());
        assert_eq!(registry.cursor(), Cursor::Default);
        assert_eq!(registry.opacity(1), 0.0);
    }

    #[test]
    fn overlapping_regions_pick_first_loaded() {
        let registry = registry(&[project("front", 0.0, 0.0), project("back", 100.0, 0.0)]);
        assert_eq!(registry.pick(Point::new(50.0, 0.0)), Some(0));
        assert_eq!(registry.pick(Point::new(200.0, 0.0)), Some(1));
    }

    #[test]
    fn click_walks_then_fires_on_arrival() {
        let registry = registry(&[project("tank", 900.0, -250.0)]);
        let mut avatar = Avatar::new(0.0, -700.0, WalkBounds::new(-1800.0, 1800.0));
        assert!(registry.click(Point::new(900.0, -250.0), &mut avatar));
        // nothing fires before the avatar gets there
        assert_eq!(avatar.update(FRAME), None);

        let mut fired = Vec::new();
        for _ in 0..120 {
            if let Some(action) = avatar.update(FRAME) {
                fired.push(action);
            }
        }
        assert_eq!(fired, vec![ArrivalAction::Region("tank".into())]);
        assert_eq!(avatar.position().x, 900.0);

        // misses do nothing
        assert!(!registry.click(Point::new(-900.0, -250.0), &mut avatar));
        assert!(!avatar.is_walking());
    }

    #[test]
    fn disabled_registry_ignores_pointer() {
        let mut registry = registry(&[project("tank", 0.0, 0.0)]);
        let mut avatar = Avatar::new(500.0, -700.0, WalkBounds::new(-1800.0, 1800.0));
        registry.set_enabled(false);
        assert!(!registry.pointer_move(Some(Point::new(0.0, 0.0))));
        assert!(!registry.click(Point::new(0.0, 0.0), &mut avatar));
        assert!(!avatar.is_walking());
    }

    #[test]
    fn disable_twice_matches_disable_once() {
        let mut rng = rng();
        let mut registry = registry(&[project("a", 0.0, 0.0), project("b", 200.0, 600.0)]);
        registry.set_viewport_width(600.0, &mut rng);
        registry.pointer_move(Some(Point::new(200.0, 600.0)));
        registry.update(FRAME, 0.0, &mut rng);
        assert!(registry.proximity_pulse().is_none());

        registry.set_enabled(false);
        let once: Vec<f64> = (0..2).map(|i| registry.opacity(i)).collect();
        let cursor_once = registry.cursor();
        registry.set_enabled(false);
        let twice: Vec<f64> = (0..2).map(|i| registry.opacity(i)).collect();

        assert_eq!(once, vec![0.0, 0.0]);
        assert_eq!(once, twice);
        assert_eq!(cursor_once, Cursor::Default);
        assert_eq!(registry.cursor(), Cursor::Default);
        assert!(registry.hovered().is_none());
        assert!(registry.idle_pulse().is_none());
    }

    #[test]
    fn envelope_rises_and_falls() {
        assert_abs_diff_eq!(pulse_envelope(0.0, 0.45), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pulse_envelope(0.5, 0.45), 0.45, epsilon = 1e-12);
        assert_abs_diff_eq!(pulse_envelope(1.0, 0.45), 0.0, epsilon = 1e-12);
        assert_eq!(pulse_envelope(1.2, 0.45), 0.0);
    }

    // samples one whole idle pulse, returns (peak opacity, duration)
    fn measure_idle_pulse(registry: &mut RegionRegistry, rng: &mut StdRng) -> (f64, f64, PulseStage) {
        while registry.idle_pulse().is_none() {
            registry.update(FRAME, -10_000.0, rng);
        }
        let pulse = registry.idle_pulse().expect("pulse running");
        let mut peak: f64 = 0.0;
        let mut duration = 0.0;
        while registry.idle_pulse().is_some() {
            peak = peak.max(registry.opacity(pulse.region));
            registry.update(FRAME, -10_000.0, rng);
            duration += FRAME;
        }
        (peak, duration, pulse.stage)
    }

    #[test]
    fn intro_pulse_is_brighter_and_faster_than_steady() {
        let mut rng = rng();
        let projects = [
            project("a", -1000.0, 0.0),
            project("b", 0.0, 0.0),
            project("robot", 1000.0, 0.0),
        ];
        let mut registry = RegionRegistry::new();
        registry.load(&projects, Some("robot"));

        registry.set_viewport_width(1024.0, &mut rng);
        assert!(!registry.idle_pulse_running());
        registry.set_viewport_width(600.0, &mut rng);
        assert!(registry.idle_pulse_running());
        // starts right away on the intro region
        assert_eq!(registry.idle_pulse().map(|pulse| pulse.region), Some(2));

        let (peak, duration, stage) = measure_idle_pulse(&mut registry, &mut rng);
        assert_eq!(stage, PulseStage::Intro);
        assert_abs_diff_eq!(peak, 0.45, epsilon = 0.01);
        assert_abs_diff_eq!(duration, 1.0 / 2.1, epsilon = 2.0 * FRAME);
        let delay = registry.next_idle_pulse_in().expect("next pulse scheduled");
        assert!((0.8..=1.2).contains(&delay));

        // run past the intro window
        while registry.idle_pulse_running() && registry.idle_pulse().map(|p| p.stage) != Some(PulseStage::Steady) {
            registry.update(FRAME, -10_000.0, &mut rng);
        }
        let (peak, duration, stage) = measure_idle_pulse(&mut registry, &mut rng);
        assert_eq!(stage, PulseStage::Steady);
        assert_abs_diff_eq!(peak, 0.25, epsilon = 0.01);
        assert_abs_diff_eq!(duration, 1.0 / 1.2, epsilon = 2.0 * FRAME);
        let delay = registry.next_idle_pulse_in().expect("next pulse scheduled");
        assert!((4.0..=6.0).contains(&delay));
    }

    #[test]
    fn steady_pulse_never_repeats_a_region_back_to_back() {
        let mut rng = rng();
        let projects = [project("a", -1000.0, 0.0), project("b", 0.0, 0.0), project("c", 1000.0, 0.0)];
        let mut registry = registry(&projects);
        registry.set_viewport_width(500.0, &mut rng);

        let mut last: Option<(usize, f64)> = None;
        let mut pulses = 0;
        for _ in 0..(60 * 120) {
            registry.update(FRAME, -10_000.0, &mut rng);
            if let Some(pulse) = registry.idle_pulse() {
                if let Some((region, phase)) = last {
                    // a new pulse restarts the phase
                    if pulse.phase < phase {
                        pulses += 1;
                        assert_ne!(region, pulse.region);
                    }
                }
                last = Some((pulse.region, pulse.phase));
            }
        }
        assert!(pulses > 3);
    }

    #[test]
    fn hovering_the_pulsing_region_cancels_its_pulse() {
        let mut rng = rng();
        let mut registry = RegionRegistry::new();
        registry.load(&[project("robot", 0.0, 0.0)], Some("robot"));
        registry.set_viewport_width(600.0, &mut rng);
        assert!(registry.idle_pulse().is_some());

        registry.pointer_move(Some(Point::new(0.0, 0.0)));
        registry.update(FRAME, -10_000.0, &mut rng);
        assert!(registry.idle_pulse().is_none());
        assert_eq!(registry.opacity(0), HOVER_OPACITY);
        assert!(registry.next_idle_pulse_in().is_some());
    }

    #[test]
    fn growing_viewport_cancels_idle_pulse() {
        let mut rng = rng();
        let mut registry = registry(&[project("a", 0.0, 0.0)]);
        registry.set_viewport_width(700.0, &mut rng);
        registry.update(0.1, -10_000.0, &mut rng);
        assert!(registry.opacity(0) > 0.0);

        registry.set_viewport_width(1200.0, &mut rng);
        assert!(!registry.idle_pulse_running());
        assert!(registry.idle_pulse().is_none());
        assert!(registry.next_idle_pulse_in().is_none());
        assert_eq!(registry.opacity(0), 0.0);
        for _ in 0..600 {
            registry.update(FRAME, -10_000.0, &mut rng);
        }
        assert!(registry.idle_pulse().is_none());
    }

    #[test]
    fn overlapping_regions_pulse_together_once_until_avatar_leaves() {
        let mut rng = rng();
        // same column, overlapping rectangles
        let mut registry = registry(&[project("upper", 500.0, 100.0), project("lower", 500.0, -100.0)]);

        registry.update(FRAME, 0.0, &mut rng);
        let (members, phase) = registry.proximity_pulse().expect("both regions pulse");
        assert_eq!(members, &[0, 1]);
        assert_eq!(phase, 0.0);

        // synchronized: same opacity every frame
        let mut peak: f64 = 0.0;
        while registry.proximity_pulse().is_some() {
            registry.update(FRAME, 0.0, &mut rng);
            assert_eq!(registry.opacity(0), registry.opacity(1));
            peak = peak.max(registry.opacity(0));
        }
        assert_abs_diff_eq!(peak, PROXIMITY_AMPLITUDE, epsilon = 0.01);

        // still close, or outside the threshold but inside the hysteresis margin
        for x in [0.0, 300.0, -150.0, -190.0, 0.0] {
            for _ in 0..10 {
                registry.update(FRAME, x, &mut rng);
                assert!(registry.proximity_pulse().is_none(), "re-triggered at {x}");
            }
        }

        // past threshold + 100 from both, then back
        registry.update(FRAME, -250.0, &mut rng);
        assert!(registry.proximity_pulse().is_none());
        registry.update(FRAME, 0.0, &mut rng);
        let (members, _) = registry.proximity_pulse().expect("eligible again");
        assert_eq!(members, &[0, 1]);
    }

    #[test]
    fn hover_suppresses_proximity_pulse() {
        let mut rng = rng();
        let mut registry = registry(&[project("a", 0.0, 0.0)]);
        registry.pointer_move(Some(Point::new(0.0, 0.0)));
        registry.update(FRAME, 0.0, &mut rng);
        assert!(registry.proximity_pulse().is_none());
        assert_eq!(registry.opacity(0), HOVER_OPACITY);

        registry.pointer_move(None);
        registry.update(FRAME, 0.0, &mut rng);
        assert!(registry.proximity_pulse().is_some());
    }
}
