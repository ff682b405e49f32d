//! Static world description, loaded once at startup from `data/levels.json`
//! and `data/changelog.json`
use crate::engine::{Point, Rect, Size};
use crate::sprite::state::WalkBounds;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_WALK_INSET: f64 = 200.0;
pub const DEFAULT_NPC_FRAME_DURATION: f64 = 0.2;
pub const DEFAULT_CORNER_RADIUS: f64 = 20.0;
pub const DEFAULT_BACKGROUND_COLOR: &str = "#1a1a1a";
// projects whose description starts with this never get a region
const PLACEHOLDER_PREFIX: &str = "Placeholder description";

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorldData {
    pub start_level: String,
    pub levels: HashMap<String, LevelData>,
}

impl WorldData {
    pub fn level(&self, id: &str) -> Option<&LevelData> {
        self.levels.get(id)
    }

    /// The start level must exist, otherwise there is nothing to show
    pub fn start(&self) -> Result<&LevelData> {
        self.level(&self.start_level)
            .ok_or_else(|| anyhow!("Start level '{}' not found in world data", self.start_level))
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub background: String,
    /// background art is authored in sRGB
    #[serde(default, rename = "backgroundSRGB")]
    pub background_srgb: bool,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    pub floor_y: f64,
    #[serde(default)]
    pub character_start_x: f64,
    #[serde(default = "default_walk_inset")]
    pub walk_inset: f64,
    /// region pulsed while the small-screen hint is introducing itself
    #[serde(default)]
    pub intro_region: Option<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub npcs: Vec<NpcData>,
    #[serde(default)]
    pub portals: Vec<Portal>,
}

fn default_walk_inset() -> f64 {
    DEFAULT_WALK_INSET
}

fn default_background_color() -> String {
    DEFAULT_BACKGROUND_COLOR.to_string()
}

impl LevelData {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn walk_bounds(&self) -> WalkBounds {
        WalkBounds::new(
            -self.width / 2.0 + self.walk_inset,
            self.width / 2.0 - self.walk_inset,
        )
    }

    /// First portal the avatar is standing past, in document order
    pub fn portal_at(&self, avatar_x: f64) -> Option<&Portal> {
        self.portals.iter().find(|portal| portal.is_triggered_by(avatar_x))
    }

    pub fn has_portal_on(&self, edge: Edge) -> bool {
        self.portals.iter().any(|portal| portal.edge == edge)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    screenshot: Option<String>,
    #[serde(default)]
    screenshots: Option<Vec<String>>,
    #[serde(default)]
    pub links: Links,
    pub hotspot: Hotspot,
    #[serde(default)]
    pub action: HotspotAction,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.visibility == Visibility::Active && !self.description.starts_with(PLACEHOLDER_PREFIX)
    }

    /// `screenshots` wins over the single `screenshot`, blank entries dropped
    pub fn screenshots(&self) -> Vec<String> {
        let all = match (&self.screenshots, &self.screenshot) {
            (Some(list), _) => list.clone(),
            (None, Some(single)) => vec![single.clone()],
            (None, None) => Vec::new(),
        };
        all.into_iter()
            .filter(|source| !source.trim().is_empty())
            .collect()
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Links {
    #[serde(default)]
    pub live: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

/// Hotspot rectangle, `x`/`y` is the center in world space
#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_corner_radius")]
    pub corner_radius: f64,
}

fn default_corner_radius() -> f64 {
    DEFAULT_CORNER_RADIUS
}

impl Hotspot {
    pub fn rect(&self) -> Rect {
        Rect::from_center(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }
}

/// What a region opens once the avatar gets there
#[derive(Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HotspotAction {
    #[default]
    Panel,
    CaptainsLog,
    MessageBottle,
    Guestbook,
    Adventure,
    Portfolio,
}

#[derive(Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Active,
    Placeholder,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NpcData {
    pub id: String,
    pub name: String,
    /// feet of the sprite
    pub position: NpcPosition,
    pub width: f64,
    pub height: f64,
    pub sprite: String,
    #[serde(default = "default_frame_count")]
    pub frame_count: u8,
    #[serde(default = "default_frame_duration")]
    pub frame_duration: f64,
    #[serde(default)]
    pub dialog: Vec<String>,
    #[serde(default)]
    pub interaction: NpcInteraction,
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct NpcPosition {
    pub x: f64,
    pub y: f64,
}

fn default_frame_count() -> u8 {
    1
}

fn default_frame_duration() -> f64 {
    DEFAULT_NPC_FRAME_DURATION
}

impl NpcData {
    /// World rectangle standing on `position`
    pub fn rect(&self) -> Rect {
        Rect::new(
            Point::new(self.position.x - self.width / 2.0, self.position.y),
            Size::new(self.width, self.height),
        )
    }
}

#[derive(Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NpcInteraction {
    #[default]
    Dialog,
    Guestbook,
    Adventure,
    Portfolio,
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Edge {
    Left,
    Right,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Portal {
    pub edge: Edge,
    pub trigger_x: f64,
    pub target_level: String,
    pub target_spawn_x: f64,
}

impl Portal {
    pub fn is_triggered_by(&self, avatar_x: f64) -> bool {
        match self.edge {
            Edge::Right => avatar_x >= self.trigger_x,
            Edge::Left => avatar_x <= self.trigger_x,
        }
    }

    /// A point just inside the trigger, so standing there does not fire again
    pub fn retreat_x(&self, distance: f64) -> f64 {
        match self.edge {
            Edge::Right => self.trigger_x - distance,
            Edge::Left => self.trigger_x + distance,
        }
    }
}

// ==================== Changelog ====================
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Changelog {
    #[serde(default)]
    pub entries: Vec<ChangelogEntry>,
}

impl Changelog {
    /// Entries are stored newest first
    pub fn latest(&self) -> Option<&ChangelogEntry> {
        self.entries.first()
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChangelogEntry {
    pub version: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub changes: Vec<String>,
}

impl ChangelogEntry {
    /// `Mon D, YYYY`, or the raw string when it does not parse
    pub fn display_date(&self) -> String {
        chrono::NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map(|date| date.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|_| self.date.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: &str = include_str!("../static/data/levels.json");
    const CHANGELOG: &str = include_str!("../static/data/changelog.json");

    fn world() -> WorldData {
        serde_json::from_str(LEVELS).expect("levels.json should parse")
    }

    #[test]
    fn bundled_world_parses_and_start_level_exists() {
        let world = world();
        let start = world.start().expect("start level");
        assert_eq!(start.id, world.start_level);
        for level in world.levels.values() {
            for portal in &level.portals {
                assert!(
                    world.level(&portal.target_level).is_some(),
                    "portal in {} points at unknown level {}",
                    level.id,
                    portal.target_level
                );
            }
        }
    }

    #[test]
    fn walk_bounds_use_inset() {
        let world = world();
        let start = world.start().expect("start level");
        let bounds = start.walk_bounds();
        assert_eq!(bounds.min, -start.width / 2.0 + start.walk_inset);
        assert_eq!(bounds.max, start.width / 2.0 - start.walk_inset);
    }

    #[test]
    fn optional_fields_default() {
        let level: LevelData = serde_json::from_str(
            r#"{
                "id": "bare",
                "width": 4000,
                "height": 2000,
                "background": "bg.png",
                "floorY": -700,
                "projects": [{
                    "id": "p",
                    "title": "P",
                    "hotspot": { "x": 0, "y": 0, "width": 10, "height": 10 }
                }],
                "npcs": [{
                    "id": "crab",
                    "name": "Crab",
                    "position": { "x": 100, "y": -700 },
                    "width": 200,
                    "height": 150,
                    "sprite": "crab.png"
                }]
            }"#,
        )
        .expect("level should parse");
        assert_eq!(level.walk_inset, DEFAULT_WALK_INSET);
        assert_eq!(level.walk_bounds(), WalkBounds::new(-1800.0, 1800.0));
        assert_eq!(level.background_color, DEFAULT_BACKGROUND_COLOR);
        assert!(level.portals.is_empty());
        assert_eq!(level.projects[0].action, HotspotAction::Panel);
        assert_eq!(level.projects[0].hotspot.corner_radius, DEFAULT_CORNER_RADIUS);
        assert_eq!(level.npcs[0].frame_count, 1);
        assert_eq!(level.npcs[0].frame_duration, DEFAULT_NPC_FRAME_DURATION);
        assert_eq!(level.npcs[0].interaction, NpcInteraction::Dialog);
    }

    #[test]
    fn portal_triggers_per_edge() {
        let right = Portal {
            edge: Edge::Right,
            trigger_x: 1800.0,
            target_level: "b".into(),
            target_spawn_x: -1600.0,
        };
        assert!(!right.is_triggered_by(1799.0));
        assert!(right.is_triggered_by(1800.0));
        assert_eq!(right.retreat_x(50.0), 1750.0);

        let left = Portal {
            edge: Edge::Left,
            trigger_x: -1800.0,
            target_level: "a".into(),
            target_spawn_x: 1600.0,
        };
        assert!(left.is_triggered_by(-1800.0));
        assert!(!left.is_triggered_by(-1700.0));
        assert_eq!(left.retreat_x(50.0), -1750.0);
    }

    #[test]
    fn screenshots_normalise() {
        let mut project: Project = serde_json::from_str(
            r#"{
                "id": "p",
                "title": "P",
                "screenshot": "one.png",
                "hotspot": { "x": 0, "y": 0, "width": 10, "height": 10 }
            }"#,
        )
        .expect("project should parse");
        assert_eq!(project.screenshots(), vec!["one.png".to_string()]);

        project.screenshots = Some(vec!["a.png".into(), "  ".into(), "".into(), "b.png".into()]);
        assert_eq!(project.screenshots(), vec!["a.png".to_string(), "b.png".to_string()]);

        project.screenshots = None;
        project.screenshot = None;
        assert!(project.screenshots().is_empty());
    }

    #[test]
    fn placeholder_projects_are_inactive() {
        let mut project: Project = serde_json::from_str(
            r#"{
                "id": "p",
                "title": "P",
                "description": "Placeholder description for a future tank",
                "hotspot": { "x": 0, "y": 0, "width": 10, "height": 10 }
            }"#,
        )
        .expect("project should parse");
        assert!(!project.is_active());
        project.description = "real".into();
        assert!(project.is_active());
        project.visibility = Visibility::Placeholder;
        assert!(!project.is_active());
    }

    #[test]
    fn changelog_latest_and_date() {
        let changelog: Changelog = serde_json::from_str(CHANGELOG).expect("changelog should parse");
        let latest = changelog.latest().expect("at least one entry");
        assert!(!latest.version.is_empty());

        let entry = ChangelogEntry {
            version: "1.2.0".into(),
            date: "2025-01-07".into(),
            title: String::new(),
            changes: Vec::new(),
        };
        assert_eq!(entry.display_date(), "Jan 7, 2025");

        let odd = ChangelogEntry {
            date: "soon".into(),
            ..entry
        };
        assert_eq!(odd.display_date(), "soon");
        assert!(Changelog::default().latest().is_none());
    }
}
