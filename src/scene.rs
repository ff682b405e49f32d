//! Level transition state machine
//!
//! ```text
//!  Idle ──begin──▶ FadingOut ──(0.3 s)──▶ Loading ──complete/abort──▶ FadingIn ──(0.3 s)──▶ Idle
//! ```
//! The swap itself happens while `Loading`, with the cover fully opaque, so
//! it is never visible. `abort` fades back in on the level the transition
//! started from.
use crate::level::Portal;

pub const FADE_OUT_DURATION: f64 = 0.3;
pub const FADE_IN_DURATION: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Idle,
    FadingOut { portal: Portal, elapsed: f64 },
    Loading { portal: Portal },
    FadingIn { elapsed: f64 },
}

/// Emitted by `update` when a fade finishes
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// screen is fully covered, swap levels now
    Covered(Portal),
    /// cover is gone, input may resume
    Revealed,
}

pub struct SceneManager {
    current_level: String,
    transition: Transition,
}

impl SceneManager {
    pub fn new(level_id: &str) -> Self {
        SceneManager {
            current_level: level_id.to_string(),
            transition: Transition::Idle,
        }
    }

    pub fn current_level(&self) -> &str {
        &self.current_level
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition != Transition::Idle
    }

    /// Start crossing `portal`, ignored while another transition runs
    pub fn begin(&mut self, portal: &Portal) -> bool {
        if self.is_transitioning() {
            return false;
        }
        self.transition = Transition::FadingOut {
            portal: portal.clone(),
            elapsed: 0.0,
        };
        true
    }

    pub fn update(&mut self, delta: f64) -> Option<SceneEvent> {
        match &mut self.transition {
            Transition::Idle | Transition::Loading { .. } => None,
            Transition::FadingOut { portal, elapsed } => {
                *elapsed += delta;
                if *elapsed < FADE_OUT_DURATION {
                    return None;
                }
                let portal = portal.clone();
                self.transition = Transition::Loading {
                    portal: portal.clone(),
                };
                Some(SceneEvent::Covered(portal))
            }
            Transition::FadingIn { elapsed } => {
                *elapsed += delta;
                if *elapsed < FADE_IN_DURATION {
                    return None;
                }
                self.transition = Transition::Idle;
                Some(SceneEvent::Revealed)
            }
        }
    }

    /// Target level is in place, fade back in on it
    pub fn complete(&mut self, level_id: &str) -> bool {
        if !matches!(self.transition, Transition::Loading { .. }) {
            return false;
        }
        self.current_level = level_id.to_string();
        self.transition = Transition::FadingIn { elapsed: 0.0 };
        true
    }

    /// Target level could not be loaded, fade back in where we started
    pub fn abort(&mut self) -> bool {
        if !matches!(self.transition, Transition::Loading { .. }) {
            return false;
        }
        self.transition = Transition::FadingIn { elapsed: 0.0 };
        true
    }

    /// Opacity of the black cover drawn over the scene
    pub fn cover_opacity(&self) -> f64 {
        match &self.transition {
            Transition::Idle => 0.0,
            Transition::FadingOut { elapsed, .. } => (elapsed / FADE_OUT_DURATION).clamp(0.0, 1.0),
            Transition::Loading { .. } => 1.0,
            Transition::FadingIn { elapsed } => 1.0 - (elapsed / FADE_IN_DURATION).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Edge;

    const FRAME: f64 = 1.0 / 60.0;

    fn portal() -> Portal {
        Portal {
            edge: Edge::Right,
            trigger_x: 1800.0,
            target_level: "reef".into(),
            target_spawn_x: -1600.0,
        }
    }

    fn run_until_event(scene: &mut SceneManager) -> SceneEvent {
        for _ in 0..600 {
            if let Some(event) = scene.update(FRAME) {
                return event;
            }
        }
        panic!("no scene event");
    }

    #[test]
    fn full_transition_sequence() {
        let mut scene = SceneManager::new("lab");
        assert_eq!(scene.cover_opacity(), 0.0);
        assert!(scene.begin(&portal()));
        assert!(scene.is_transitioning());

        scene.update(0.15);
        assert!((scene.cover_opacity() - 0.5).abs() < 1e-9);
        // nothing swaps before the cover is opaque
        assert_eq!(scene.current_level(), "lab");

        assert_eq!(run_until_event(&mut scene), SceneEvent::Covered(portal()));
        assert_eq!(scene.cover_opacity(), 1.0);
        // waits for the level as long as it takes
        for _ in 0..100 {
            assert_eq!(scene.update(FRAME), None);
        }

        assert!(scene.complete("reef"));
        assert_eq!(scene.current_level(), "reef");
        assert_eq!(run_until_event(&mut scene), SceneEvent::Revealed);
        assert_eq!(scene.cover_opacity(), 0.0);
        assert!(!scene.is_transitioning());
    }

    #[test]
    fn only_one_transition_at_a_time() {
        let mut scene = SceneManager::new("lab");
        assert!(scene.begin(&portal()));
        let mut other = portal();
        other.target_level = "elsewhere".into();
        assert!(!scene.begin(&other));
        assert_eq!(run_until_event(&mut scene), SceneEvent::Covered(portal()));
        assert!(!scene.begin(&other));
    }

    #[test]
    fn abort_returns_to_previous_level_and_uncovers() {
        let mut scene = SceneManager::new("lab");
        scene.begin(&portal());
        run_until_event(&mut scene);
        assert!(scene.abort());
        assert_eq!(run_until_event(&mut scene), SceneEvent::Revealed);
        assert_eq!(scene.current_level(), "lab");
        assert_eq!(scene.cover_opacity(), 0.0);
    }

    #[test]
    fn complete_outside_loading_is_ignored() {
        let mut scene = SceneManager::new("lab");
        assert!(!scene.complete("reef"));
        assert!(!scene.abort());
        scene.begin(&portal());
        assert!(!scene.complete("reef"));
        assert_eq!(scene.current_level(), "lab");
    }
}
