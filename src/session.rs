//! One walk through the world. Owns every component and wires them together:
//! input routing, the per-frame update order, arrival dispatch and level
//! transitions. Nothing in here touches the DOM, the glue in `game.rs` feeds
//! it input and asset results and draws what it exposes.
use crate::bubble::{BubbleContext, BubbleDirector};
use crate::camera::{Camera, Surface};
use crate::engine::input::InputEvent;
use crate::engine::Point;
use crate::hotspots::{Cursor, RegionRegistry};
use crate::level::{
    Changelog, ChangelogEntry, Edge, HotspotAction, LevelData, NpcInteraction, Portal, Project,
    WorldData,
};
use crate::npc::NpcRegistry;
use crate::overlay::{Dialog, Gates, Overlay, OverlayCoordinator, OverlayKind, UiAction};
use crate::scene::{SceneEvent, SceneManager, Transition};
use crate::sprite::avatar::{ArrivalAction, Avatar};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Per-frame camera smoothing factor
pub const CAMERA_SMOOTHING: f64 = 0.05;
/// Arrow keys walk this far per press
pub const KEY_WALK_DISTANCE: f64 = 400.0;
/// Floor clicks only count this far above the floor line
pub const FLOOR_CLICK_BAND: f64 = 300.0;
/// Where the avatar is put back after a failed crossing, measured from the
/// trigger toward the level
pub const PORTAL_RETREAT: f64 = 100.0;

/// Everything a level needs fetched before it can be shown
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub level_id: String,
    pub background: String,
    pub npc_sprites: Vec<String>,
}

impl AssetRequest {
    fn for_level(level: &LevelData) -> Self {
        AssetRequest {
            level_id: level.id.clone(),
            background: level.background.clone(),
            npc_sprites: level.npcs.iter().map(|npc| npc.sprite.clone()).collect(),
        }
    }
}

pub struct Session {
    world: WorldData,
    changelog: Changelog,
    level: LevelData,
    avatar: Avatar,
    camera: Camera,
    regions: RegionRegistry,
    npcs: NpcRegistry,
    scene: SceneManager,
    overlays: OverlayCoordinator,
    bubbles: BubbleDirector,
    pointer: Option<Point>,
    asset_requests: Vec<AssetRequest>,
    rng: StdRng,
}

impl Session {
    /// Start on the world's start level
    /// - an unknown start level is a data error and fails the whole session
    pub fn new(world: WorldData, changelog: Changelog, surface: Surface, rng: StdRng) -> Result<Self> {
        let level = world.start()?.clone();
        let whats_new = changelog.latest().map(whats_new_line);
        let mut session = Session {
            avatar: Avatar::new(level.character_start_x, level.floor_y, level.walk_bounds()),
            camera: Camera::new(level.size(), surface),
            regions: RegionRegistry::new(),
            npcs: NpcRegistry::new(),
            scene: SceneManager::new(&level.id),
            overlays: OverlayCoordinator::new(),
            bubbles: BubbleDirector::new(whats_new),
            pointer: None,
            asset_requests: Vec::new(),
            world,
            changelog,
            level,
            rng,
        };
        session.populate_level();
        session.camera.jump_to(session.avatar.position().x);
        session.regions.set_viewport_width(surface.width, &mut session.rng);
        session
            .asset_requests
            .push(AssetRequest::for_level(&session.level));
        log!("Session started on level '{}'", session.level.id);
        Ok(session)
    }

    /// Same as `new` with an entropy seeded rng
    pub fn from_entropy(world: WorldData, changelog: Changelog, surface: Surface) -> Result<Self> {
        Session::new(world, changelog, surface, StdRng::from_entropy())
    }

    // ==================== Accessors ====================
    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn current_level(&self) -> &str {
        self.scene.current_level()
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn regions(&self) -> &RegionRegistry {
        &self.regions
    }

    pub fn npcs(&self) -> &NpcRegistry {
        &self.npcs
    }

    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    pub fn overlays(&self) -> &OverlayCoordinator {
        &self.overlays
    }

    pub fn bubbles(&self) -> &BubbleDirector {
        &self.bubbles
    }

    pub fn changelog_latest(&self) -> Option<&ChangelogEntry> {
        self.changelog.latest()
    }

    /// Last pointer position in world space, `None` off canvas
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn cursor(&self) -> Cursor {
        match self.regions.cursor() {
            Cursor::Pointer => Cursor::Pointer,
            Cursor::Default => self.npcs.cursor(),
        }
    }

    /// Opacity of the transition cover, 0 when the world is fully visible
    pub fn view_cover(&self) -> f64 {
        self.scene.cover_opacity()
    }

    /// Hand pending asset requests to whoever fetches them
    pub fn take_asset_requests(&mut self) -> Vec<AssetRequest> {
        std::mem::take(&mut self.asset_requests)
    }

    fn world_input_blocked(&self) -> bool {
        self.overlays.is_open() || self.scene.is_transitioning()
    }

    // ==================== Input ====================
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { x, y } => self.pointer_move(Some(Point::new(x, y))),
            InputEvent::PointerLeave => self.pointer_move(None),
            InputEvent::Click { x, y } => self.click(Point::new(x, y)),
            InputEvent::KeyDown(key) => self.key_down(&key),
            InputEvent::Resize { width, height } => {
                let surface = self.camera.surface();
                self.resize(Surface {
                    width,
                    height,
                    ..surface
                });
            }
            InputEvent::Ui { action, value } => match UiAction::parse(&action, value.as_deref()) {
                Some(action) => {
                    let closed = self.overlays.handle_action(
                        action,
                        Gates {
                            regions: &mut self.regions,
                            npcs: &mut self.npcs,
                        },
                    );
                    self.after_close(closed);
                }
                None => log_warn!("Unknown overlay action '{}'", action),
            },
            InputEvent::Dismiss => {
                let closed = self.overlays.dismiss(Gates {
                    regions: &mut self.regions,
                    npcs: &mut self.npcs,
                });
                self.after_close(closed);
            }
            InputEvent::Swipe { start_x, end_x } => self.overlays.swipe(start_x, end_x),
            // forms are read and posted by the page glue
            InputEvent::Submit { .. } => {}
        }
    }

    pub fn resize(&mut self, surface: Surface) {
        self.camera.resize(surface);
        self.regions.set_viewport_width(surface.width, &mut self.rng);
    }

    fn pointer_move(&mut self, screen: Option<Point>) {
        let world = screen.map(|point| self.camera.screen_to_world(point));
        self.pointer = world;
        if self.world_input_blocked() {
            return;
        }
        self.regions.pointer_move(world);
        // a hovered region hides whatever NPC is behind it
        let npc_pointer = if self.regions.hovered().is_some() { None } else { world };
        self.npcs.pointer_move(npc_pointer);
    }

    fn click(&mut self, screen: Point) {
        if self.world_input_blocked() {
            return;
        }
        self.bubbles.interaction();
        let world = self.camera.screen_to_world(screen);
        let walked = self.regions.click(world, &mut self.avatar)
            || self.npcs.click(world, &mut self.avatar)
            || self.walk_on_floor(world);
        if walked {
            self.bubbles.walk_commanded();
        }
    }

    fn walk_on_floor(&mut self, world: Point) -> bool {
        if world.y >= self.level.floor_y + FLOOR_CLICK_BAND {
            return false;
        }
        self.avatar.walk_to(world.x, None);
        true
    }

    fn key_down(&mut self, key: &str) {
        if self.overlays.is_open() {
            let closed = self.overlays.handle_key(
                key,
                Gates {
                    regions: &mut self.regions,
                    npcs: &mut self.npcs,
                },
            );
            self.after_close(closed);
            return;
        }
        if self.scene.is_transitioning() {
            return;
        }
        let step = match key {
            "ArrowLeft" => -KEY_WALK_DISTANCE,
            "ArrowRight" => KEY_WALK_DISTANCE,
            _ => return,
        };
        self.bubbles.interaction();
        self.avatar.walk_to(self.avatar.position().x + step, None);
        self.bubbles.walk_commanded();
    }

    fn after_close(&mut self, closed: Option<OverlayKind>) {
        if let Some(kind) = closed {
            self.bubbles.overlay_closed(kind);
        }
    }

    // ==================== Arrival ====================
    fn arrive(&mut self, action: ArrivalAction) {
        if self.world_input_blocked() {
            return;
        }
        let overlay = match &action {
            ArrivalAction::Region(id) => self
                .regions
                .region(id)
                .map(|region| overlay_for_project(&region.project)),
            ArrivalAction::Npc(id) => self.npcs.npc(id).map(|npc| match npc.data.interaction {
                NpcInteraction::Dialog => Overlay::Dialog(Dialog::new(&npc.data.name, &npc.data.dialog)),
                NpcInteraction::Guestbook => Overlay::Guestbook,
                NpcInteraction::Adventure => Overlay::Adventure,
                NpcInteraction::Portfolio => Overlay::Portfolio,
            }),
        };
        let Some(overlay) = overlay else {
            log_warn!("Arrived for {:?} but it is no longer in the level", action);
            return;
        };
        self.bubbles.hide();
        if let Err(err) = self.overlays.open(
            overlay,
            Gates {
                regions: &mut self.regions,
                npcs: &mut self.npcs,
            },
        ) {
            log_warn!("Could not open overlay : {}", err);
        }
    }

    // ==================== Frame ====================
    /// Advance everything by `delta` seconds, in data-flow order
    pub fn update(&mut self, delta: f64) {
        if let Some(action) = self.avatar.update(delta) {
            self.arrive(action);
        }
        let avatar_x = self.avatar.position().x;
        self.camera.follow(avatar_x, CAMERA_SMOOTHING);
        self.regions.update(delta, avatar_x, &mut self.rng);
        self.npcs.update(delta);

        if !self.world_input_blocked() {
            if let Some(portal) = self.level.portal_at(avatar_x).cloned() {
                self.begin_transition(&portal);
            }
        }
        match self.scene.update(delta) {
            Some(SceneEvent::Covered(portal)) => self.on_covered(&portal),
            Some(SceneEvent::Revealed) => self.on_revealed(),
            None => {}
        }

        let context = BubbleContext {
            overlay_open: self.overlays.is_open() || self.scene.is_transitioning(),
            walking: self.avatar.is_walking(),
            avatar_x,
            bounds: self.avatar.walk_bounds(),
            portal_left: self.level.has_portal_on(Edge::Left),
            portal_right: self.level.has_portal_on(Edge::Right),
            hovered_region: self.regions.hovered().map(|region| region.id()),
        };
        self.bubbles.update(delta, &context, &mut self.rng);
    }

    // ==================== Transitions ====================
    fn begin_transition(&mut self, portal: &Portal) {
        if !self.scene.begin(portal) {
            return;
        }
        log!(
            "Crossing from '{}' to '{}'",
            self.level.id,
            portal.target_level
        );
        self.avatar.stop();
        self.regions.set_enabled(false);
        self.npcs.set_enabled(false);
        self.bubbles.hide();
    }

    // view is fully covered, tear down and ask for the next level
    fn on_covered(&mut self, portal: &Portal) {
        let Some(target) = self.world.level(&portal.target_level) else {
            log_warn!("Portal leads to unknown level '{}'", portal.target_level);
            self.roll_back(portal);
            return;
        };
        let request = AssetRequest::for_level(target);
        self.regions.clear();
        self.npcs.clear();
        self.asset_requests.push(request);
    }

    /// Result of fetching a level's background
    /// - during a crossing a failure rolls back to the level we came from
    /// - otherwise the level keeps its placeholder
    pub fn level_assets_ready(&mut self, level_id: &str, result: Result<()>) {
        let portal = match self.scene.transition() {
            Transition::Loading { portal } if portal.target_level == level_id => portal.clone(),
            _ => {
                if let Err(err) = result {
                    log_warn!("Level '{}' assets failed, using placeholder : {:#}", level_id, err);
                }
                return;
            }
        };
        match result {
            Ok(()) => self.enter_level(&portal),
            Err(err) => {
                log_warn!("Could not load level '{}' : {:#}", level_id, err);
                self.roll_back(&portal);
            }
        }
    }

    fn enter_level(&mut self, portal: &Portal) {
        let Some(target) = self.world.level(&portal.target_level).cloned() else {
            self.roll_back(portal);
            return;
        };
        self.level = target;
        let bounds = self.level.walk_bounds();
        self.camera.set_level_dimensions(self.level.size());
        self.avatar.set_walk_bounds(bounds.min, bounds.max);
        self.avatar
            .set_position(bounds.clamp(portal.target_spawn_x), Some(self.level.floor_y));
        self.avatar.set_floor_y(self.level.floor_y);
        self.camera.jump_to(self.avatar.position().x);
        self.populate_level();
        self.scene.complete(&self.level.id);
    }

    fn roll_back(&mut self, portal: &Portal) {
        self.populate_level();
        let x = self.level.walk_bounds().clamp(portal.retreat_x(PORTAL_RETREAT));
        self.avatar.set_position(x, None);
        self.camera.jump_to(x);
        self.scene.abort();
    }

    fn on_revealed(&mut self) {
        if self.overlays.is_open() {
            return;
        }
        self.regions.set_enabled(true);
        self.npcs.set_enabled(true);
    }

    // regions and NPCs for `self.level`, enabled state is left alone
    fn populate_level(&mut self) {
        self.regions
            .load(&self.level.projects, self.level.intro_region.as_deref());
        self.npcs.load(&self.level.npcs, &mut self.rng);
    }
}

fn overlay_for_project(project: &Project) -> Overlay {
    match project.action {
        HotspotAction::Panel => Overlay::project_panel(project.clone()),
        HotspotAction::CaptainsLog => Overlay::CaptainsLog,
        HotspotAction::MessageBottle => Overlay::MessageBottle,
        HotspotAction::Guestbook => Overlay::Guestbook,
        HotspotAction::Adventure => Overlay::Adventure,
        HotspotAction::Portfolio => Overlay::Portfolio,
    }
}

fn whats_new_line(entry: &ChangelogEntry) -> String {
    format!("What's new in v{}: {}", entry.version, entry.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use approx::assert_abs_diff_eq;

    const LEVELS: &str = include_str!("../static/data/levels.json");
    const CHANGELOG: &str = include_str!("../static/data/changelog.json");
    const FRAME: f64 = 1.0 / 60.0;

    fn session() -> Session {
        let world = serde_json::from_str(LEVELS).expect("levels parse");
        let changelog = serde_json::from_str(CHANGELOG).expect("changelog parse");
        Session::new(world, changelog, Surface::new(1600.0, 800.0), StdRng::seed_from_u64(3))
            .expect("start level exists")
    }

    fn run(session: &mut Session, seconds: f64) {
        for _ in 0..(seconds / FRAME).round() as usize {
            session.update(FRAME);
        }
    }

    fn screen_of(session: &Session, world: Point) -> Point {
        session.camera().world_to_screen(world)
    }

    #[test]
    fn start_requests_start_level_assets() {
        let mut session = session();
        let requests = session.take_asset_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].level_id, "submarine-lab");
        assert!(requests[0].npc_sprites.iter().any(|sprite| sprite.contains("crab")));
        assert!(session.take_asset_requests().is_empty());
        // a failed first load keeps the placeholder and changes nothing else
        session.level_assets_ready("submarine-lab", Err(anyhow!("404")));
        assert_eq!(session.current_level(), "submarine-lab");
        assert!(!session.scene().is_transitioning());
    }

    #[test]
    fn clicking_a_hotspot_opens_its_overlay_on_arrival() {
        let mut session = session();
        let region = session.regions().regions()[0].clone();
        let click = screen_of(&session, region.rect().center());
        session.handle_input(InputEvent::Click { x: click.x, y: click.y });
        assert!(session.avatar().is_walking());
        assert!(!session.overlays().is_open());

        run(&mut session, 5.0);
        assert!(session.overlays().is_open());
        assert!(!session.regions().is_enabled());
        assert!(!session.npcs().is_enabled());

        session.handle_input(InputEvent::KeyDown("Escape".into()));
        assert!(!session.overlays().is_open());
        assert!(session.regions().is_enabled());
        assert!(session.npcs().is_enabled());
    }

    #[test]
    fn world_input_is_ignored_while_an_overlay_is_open() {
        let mut session = session();
        let region = session.regions().regions()[0].clone();
        let click = screen_of(&session, region.rect().center());
        session.handle_input(InputEvent::Click { x: click.x, y: click.y });
        run(&mut session, 5.0);
        assert!(session.overlays().is_open());

        let x = session.avatar().position().x;
        session.handle_input(InputEvent::KeyDown("ArrowRight".into()));
        let floor = screen_of(&session, Point::new(x + 500.0, session.level().floor_y + 10.0));
        session.handle_input(InputEvent::Click { x: floor.x, y: floor.y });
        run(&mut session, 1.0);
        assert!(!session.avatar().is_walking());
        assert_abs_diff_eq!(session.avatar().position().x, x);
    }

    #[test]
    fn floor_click_walks_only_near_the_floor() {
        let mut session = session();
        let floor_y = session.level().floor_y;
        let high = screen_of(&session, Point::new(100.0, floor_y + FLOOR_CLICK_BAND + 50.0));
        session.handle_input(InputEvent::Click { x: high.x, y: high.y });
        assert!(!session.avatar().is_walking());

        let low = screen_of(&session, Point::new(100.0, floor_y + 10.0));
        session.handle_input(InputEvent::Click { x: low.x, y: low.y });
        assert!(session.avatar().is_walking());
        let target = session.avatar().target_x().unwrap_or_default();
        assert_abs_diff_eq!(target, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn arrow_keys_walk_a_fixed_step() {
        let mut session = session();
        let x = session.avatar().position().x;
        session.handle_input(InputEvent::KeyDown("ArrowLeft".into()));
        assert_eq!(session.avatar().target_x(), Some(x - KEY_WALK_DISTANCE));
        session.handle_input(InputEvent::KeyDown("Enter".into()));
        assert_eq!(session.avatar().target_x(), Some(x - KEY_WALK_DISTANCE));
    }

    #[test]
    fn talking_to_the_crab_steps_through_its_lines() {
        let mut session = session();
        let crab = session.npcs().npc("crab").expect("crab in lab").clone();
        // stand clear of any region so the click lands on the crab
        let click = screen_of(&session, crab.rect().center());
        session.handle_input(InputEvent::Click { x: click.x, y: click.y });
        run(&mut session, 5.0);

        let lines = crab.data.dialog.len();
        assert!(matches!(session.overlays().active(), Some(Overlay::Dialog(_))));
        for _ in 0..lines {
            session.handle_input(InputEvent::Ui {
                action: "dialog-next".into(),
                value: None,
            });
        }
        assert!(!session.overlays().is_open());
    }

    #[test]
    fn crossing_to_an_unknown_level_rolls_back() {
        let mut world: WorldData = serde_json::from_str(LEVELS).expect("levels parse");
        world.levels.remove("reef");
        let mut session = Session::new(
            world,
            Changelog::default(),
            Surface::new(1600.0, 800.0),
            StdRng::seed_from_u64(9),
        )
        .expect("start level exists");

        let mut crossed = false;
        for _ in 0..1200 {
            if !session.avatar().is_walking() && !session.scene().is_transitioning() {
                session.handle_input(InputEvent::KeyDown("ArrowRight".into()));
            }
            session.update(FRAME);
            crossed |= session.scene().is_transitioning();
            if crossed && !session.scene().is_transitioning() {
                break;
            }
        }
        assert!(crossed);
        assert!(session.take_asset_requests().iter().all(|request| request.level_id != "reef"));
        assert!(!session.scene().is_transitioning());
        assert_eq!(session.current_level(), "submarine-lab");
        assert_eq!(session.view_cover(), 0.0);
        assert!(session.regions().is_enabled());
        assert!(!session.regions().regions().is_empty());
        let portal = session.level().portals[0].clone();
        assert!(!portal.is_triggered_by(session.avatar().position().x));
    }

    #[test]
    fn whats_new_comes_from_latest_changelog_entry() {
        let session = session();
        let latest = session.changelog_latest().expect("changelog has entries");
        assert!(whats_new_line(latest).contains(&latest.version));
    }
}
