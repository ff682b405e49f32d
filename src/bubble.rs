//! Speech and thought bubble above the avatar. One slot: showing a bubble
//! replaces whatever was up. Every delay is a countdown advanced by `update`.
use crate::overlay::OverlayKind;
use crate::sprite::state::WalkBounds;
use rand::seq::SliceRandom;
use rand::Rng;

pub const WELCOME_DELAY: f64 = 0.5;
pub const IDLE_TIMEOUT: f64 = 15.0;
pub const EDGE_DISTANCE: f64 = 50.0;
pub const EDGE_COOLDOWN: f64 = 10.0;
pub const FIRST_WALK_DELAY: f64 = 0.5;
pub const HOVER_GRACE: f64 = 0.8;
pub const AFTER_PANEL_DELAY: f64 = 0.3;
const SHORT: f64 = 3.0;
const HOVER_DURATION: f64 = 2.5;
const WHATS_NEW_DURATION: f64 = 5.0;
/// Bubble anchor above the avatar's feet, world units
pub const ANCHOR_HEIGHT: f64 = 960.0;

const IDLE_LINES: [&str; 4] = [
    "doo doo doo",
    "under the sea~",
    "yawn.",
    "what's for dinner?",
];
const HOVER_LINES: [&str; 2] = ["wait a sec...", "hmm, what's this?"];
const AFTER_PANEL_LINES: [&str; 2] = ["neato!", "what a nice little project."];
const FIRST_WALK_LINE: &str = "hmm, what's over here?";
const EDGE_LINE: &str = "that's as far as I can go.";
const WELCOME_LINES: [&str; 5] = [
    "Welcome to DREA LABS, glad you stopped by!\nClick on a tank and give it a try.",
    "Welcome to DREA LABS, where ideas brew...\nClick on a tank, there's lots to view.",
    "Welcome to DREA LABS, under the sea~\nTap on a tank and see what I made for thee.",
    "Welcome to DREA LABS, have a peek!\nClick a tank for the project you seek.",
    "Welcome, friend, to my underwater lair!\nTap a tank to see what's there.",
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BubbleStyle {
    Speech,
    Thought,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub style: BubbleStyle,
    pub text: String,
    /// `None` stays up until the next interaction
    remaining: Option<f64>,
}

/// What the director needs to know about the world this frame
#[derive(Debug, Clone, Copy)]
pub struct BubbleContext<'a> {
    pub overlay_open: bool,
    pub walking: bool,
    pub avatar_x: f64,
    pub bounds: WalkBounds,
    pub portal_left: bool,
    pub portal_right: bool,
    pub hovered_region: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct BubbleDirector {
    current: Option<Bubble>,
    welcome_in: Option<f64>,
    idle_for: f64,
    has_walked: bool,
    first_walk_in: Option<f64>,
    after_panel_in: Option<f64>,
    edge_cooldown: Option<f64>,
    last_hovered: Option<String>,
    hover_grace: Option<(String, f64)>,
    whats_new: Option<String>,
    revision: u64,
}

fn pick<R: Rng + ?Sized>(lines: &[&str], rng: &mut R) -> String {
    lines.choose(rng).copied().unwrap_or_default().to_string()
}

fn tick(countdown: &mut Option<f64>, delta: f64) -> bool {
    match countdown {
        Some(remaining) if *remaining - delta <= 0.0 => {
            *countdown = None;
            true
        }
        Some(remaining) => {
            *remaining -= delta;
            false
        }
        None => false,
    }
}

impl BubbleDirector {
    /// The welcome bubble shows shortly after start
    pub fn new(whats_new: Option<String>) -> Self {
        BubbleDirector {
            welcome_in: Some(WELCOME_DELAY),
            whats_new,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&Bubble> {
        self.current.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn show(&mut self, style: BubbleStyle, text: String, duration: Option<f64>) {
        self.current = Some(Bubble {
            style,
            text,
            remaining: duration,
        });
        self.revision += 1;
    }

    pub fn hide(&mut self) {
        if self.current.take().is_some() {
            self.revision += 1;
        }
    }

    /// Click or key press in the world
    pub fn interaction(&mut self) {
        self.hide();
        self.welcome_in = None;
        self.idle_for = 0.0;
    }

    /// Any walk command; the first one ever gets a remark
    pub fn walk_commanded(&mut self) {
        if !self.has_walked {
            self.has_walked = true;
            self.first_walk_in = Some(FIRST_WALK_DELAY);
        }
    }

    pub fn overlay_closed(&mut self, kind: OverlayKind) {
        self.idle_for = 0.0;
        if kind == OverlayKind::ProjectPanel {
            self.after_panel_in = Some(AFTER_PANEL_DELAY);
        }
    }

    fn quiet(&self, context: &BubbleContext) -> bool {
        self.current.is_none() && !context.overlay_open
    }

    pub fn update<R: Rng + ?Sized>(&mut self, delta: f64, context: &BubbleContext, rng: &mut R) {
        let expired = match &mut self.current {
            Some(bubble) => tick(&mut bubble.remaining, delta),
            None => false,
        };
        if expired {
            self.hide();
        }
        tick(&mut self.edge_cooldown, delta);

        if tick(&mut self.welcome_in, delta) && !context.overlay_open {
            self.show(BubbleStyle::Speech, pick(&WELCOME_LINES, rng), None);
        }
        if tick(&mut self.first_walk_in, delta) && self.quiet(context) {
            self.show(BubbleStyle::Thought, FIRST_WALK_LINE.to_string(), Some(SHORT));
        }
        if tick(&mut self.after_panel_in, delta) && self.quiet(context) {
            self.show(BubbleStyle::Speech, pick(&AFTER_PANEL_LINES, rng), Some(SHORT));
        }
        self.update_hover_grace(delta, context, rng);

        self.idle_for += delta;
        self.check_triggers(context, rng);
    }

    fn update_hover_grace<R: Rng + ?Sized>(&mut self, delta: f64, context: &BubbleContext, rng: &mut R) {
        let Some((id, remaining)) = self.hover_grace.take() else {
            return;
        };
        // hover moved on, the remark is dropped
        if context.hovered_region != Some(id.as_str()) {
            return;
        }
        if remaining - delta > 0.0 {
            self.hover_grace = Some((id, remaining - delta));
        } else if self.quiet(context) {
            self.show(BubbleStyle::Speech, pick(&HOVER_LINES, rng), Some(HOVER_DURATION));
        }
    }

    fn check_triggers<R: Rng + ?Sized>(&mut self, context: &BubbleContext, rng: &mut R) {
        if !self.quiet(context) {
            return;
        }

        if self.idle_for > IDLE_TIMEOUT && !context.walking {
            self.idle_for = 0.0;
            match self.whats_new.take() {
                Some(news) => self.show(BubbleStyle::Speech, news, Some(WHATS_NEW_DURATION)),
                None => self.show(BubbleStyle::Thought, pick(&IDLE_LINES, rng), Some(SHORT)),
            }
            return;
        }

        let near_left = context.avatar_x <= context.bounds.min + EDGE_DISTANCE && !context.portal_left;
        let near_right = context.avatar_x >= context.bounds.max - EDGE_DISTANCE && !context.portal_right;
        if (near_left || near_right) && !context.walking && self.edge_cooldown.is_none() {
            self.edge_cooldown = Some(EDGE_COOLDOWN);
            self.show(BubbleStyle::Thought, EDGE_LINE.to_string(), Some(SHORT));
            return;
        }

        match context.hovered_region {
            Some(id) if self.last_hovered.as_deref() != Some(id) && !context.walking => {
                self.last_hovered = Some(id.to_string());
                self.hover_grace = Some((id.to_string(), HOVER_GRACE));
            }
            Some(_) => {}
            None => self.last_hovered = None,
        }
    }
}
