//! Modal overlays. At most one is open; while it is, the world takes no
//! input. The lightbox is the one exception to exclusivity: it opens on top
//! of a project panel and closing it returns to that panel.
use crate::hotspots::RegionRegistry;
use crate::level::Project;
use crate::npc::NpcRegistry;
use thiserror::Error;

pub const SWIPE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OverlayKind {
    ProjectPanel,
    Dialog,
    Guestbook,
    CaptainsLog,
    MessageBottle,
    Adventure,
    Portfolio,
    Lightbox,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    #[error("cannot open {requested:?} while {open:?} is open")]
    AlreadyOpen {
        open: OverlayKind,
        requested: OverlayKind,
    },
    #[error("the lightbox only opens over a project panel")]
    NoPanel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    ProjectPanel { project: Project, carousel: Carousel },
    Dialog(Dialog),
    Guestbook,
    CaptainsLog,
    MessageBottle,
    Adventure,
    Portfolio,
}

impl Overlay {
    pub fn project_panel(project: Project) -> Self {
        let carousel = Carousel::new(project.screenshots());
        Overlay::ProjectPanel { project, carousel }
    }

    pub fn kind(&self) -> OverlayKind {
        match self {
            Overlay::ProjectPanel { .. } => OverlayKind::ProjectPanel,
            Overlay::Dialog(_) => OverlayKind::Dialog,
            Overlay::Guestbook => OverlayKind::Guestbook,
            Overlay::CaptainsLog => OverlayKind::CaptainsLog,
            Overlay::MessageBottle => OverlayKind::MessageBottle,
            Overlay::Adventure => OverlayKind::Adventure,
            Overlay::Portfolio => OverlayKind::Portfolio,
        }
    }
}

// ==================== Dialog ====================
/// An NPC's lines, read one at a time
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub speaker: String,
    lines: Vec<String>,
    index: usize,
}

impl Dialog {
    pub fn new(speaker: &str, lines: &[String]) -> Self {
        Dialog {
            speaker: speaker.to_string(),
            lines: lines.to_vec(),
            index: 0,
        }
    }

    pub fn line(&self) -> &str {
        self.lines.get(self.index).map(String::as_str).unwrap_or("")
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.lines.len()
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_last() {
            "Close"
        } else {
            "Continue"
        }
    }

    /// `false` once the last line has been acknowledged
    fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }
}

// ==================== Carousel ====================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Carousel {
    slides: Vec<String>,
    current: usize,
}

impl Carousel {
    pub fn new(slides: Vec<String>) -> Self {
        Carousel { slides, current: 0 }
    }

    pub fn slides(&self) -> &[String] {
        &self.slides
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_slide(&self) -> Option<&str> {
        self.slides.get(self.current).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Out of range indices are ignored
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.slides.len() || index == self.current {
            return false;
        }
        self.current = index;
        true
    }

    pub fn next(&mut self) -> bool {
        if self.slides.len() <= 1 {
            return false;
        }
        self.go_to((self.current + 1) % self.slides.len())
    }

    pub fn prev(&mut self) -> bool {
        let count = self.slides.len();
        if count <= 1 {
            return false;
        }
        self.go_to((self.current + count - 1) % count)
    }

    /// Swiping left shows the next slide
    pub fn swipe(&mut self, start_x: f64, end_x: f64) -> bool {
        let distance = start_x - end_x;
        if distance.abs() <= SWIPE_THRESHOLD {
            return false;
        }
        if distance > 0.0 {
            self.next()
        } else {
            self.prev()
        }
    }
}

// ==================== UI actions ====================
/// `data-action` buttons inside overlays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Close,
    DialogNext,
    CarouselNext,
    CarouselPrev,
    CarouselGo(usize),
    LightboxOpen(String),
    LightboxClose,
}

impl UiAction {
    pub fn parse(action: &str, value: Option<&str>) -> Option<Self> {
        match action {
            "close" => Some(UiAction::Close),
            "dialog-next" => Some(UiAction::DialogNext),
            "carousel-next" => Some(UiAction::CarouselNext),
            "carousel-prev" => Some(UiAction::CarouselPrev),
            "carousel-go" => value?.parse().ok().map(UiAction::CarouselGo),
            "lightbox-open" => value
                .filter(|source| !source.is_empty())
                .map(|source| UiAction::LightboxOpen(source.to_string())),
            "lightbox-close" => Some(UiAction::LightboxClose),
            _ => None,
        }
    }
}

// ==================== Coordinator ====================
/// World input sources an overlay switches off
pub struct Gates<'a> {
    pub regions: &'a mut RegionRegistry,
    pub npcs: &'a mut NpcRegistry,
}

// what this overlay switched off, and so must switch back on
#[derive(Debug, Default, Copy, Clone)]
struct Disabled {
    regions: bool,
    npcs: bool,
}

#[derive(Debug, Default)]
pub struct OverlayCoordinator {
    active: Option<Overlay>,
    lightbox: Option<String>,
    disabled: Disabled,
    revision: u64,
}

impl OverlayCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Overlay> {
        self.active.as_ref()
    }

    /// Topmost open surface
    pub fn kind(&self) -> Option<OverlayKind> {
        if self.lightbox.is_some() {
            return Some(OverlayKind::Lightbox);
        }
        self.active.as_ref().map(Overlay::kind)
    }

    /// Single predicate for "world input is suppressed"
    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn lightbox(&self) -> Option<&str> {
        self.lightbox.as_deref()
    }

    /// Bumped on every visible change, so the page only re-syncs when needed
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn open(&mut self, overlay: Overlay, gates: Gates) -> Result<(), OverlayError> {
        if let Some(open) = self.kind() {
            return Err(OverlayError::AlreadyOpen {
                open,
                requested: overlay.kind(),
            });
        }
        self.disabled = Disabled {
            regions: gates.regions.is_enabled(),
            npcs: gates.npcs.is_enabled(),
        };
        if self.disabled.regions {
            gates.regions.set_enabled(false);
        }
        if self.disabled.npcs {
            gates.npcs.set_enabled(false);
        }
        self.active = Some(overlay);
        self.revision += 1;
        Ok(())
    }

    /// Close whatever is open, lightbox included
    /// - returns what was closed so the caller can react once
    pub fn close(&mut self, gates: Gates) -> Option<OverlayKind> {
        let closed = self.active.take()?;
        self.lightbox = None;
        if self.disabled.regions {
            gates.regions.set_enabled(true);
        }
        if self.disabled.npcs {
            gates.npcs.set_enabled(true);
        }
        self.disabled = Disabled::default();
        self.revision += 1;
        Some(closed.kind())
    }

    pub fn open_lightbox(&mut self, source: &str) -> Result<(), OverlayError> {
        match (&self.active, &self.lightbox) {
            (Some(Overlay::ProjectPanel { .. }), None) => {
                self.lightbox = Some(source.to_string());
                self.revision += 1;
                Ok(())
            }
            (Some(Overlay::ProjectPanel { .. }), Some(_)) => Err(OverlayError::AlreadyOpen {
                open: OverlayKind::Lightbox,
                requested: OverlayKind::Lightbox,
            }),
            _ => Err(OverlayError::NoPanel),
        }
    }

    pub fn close_lightbox(&mut self) -> bool {
        if self.lightbox.take().is_some() {
            self.revision += 1;
            return true;
        }
        false
    }

    pub fn carousel(&self) -> Option<&Carousel> {
        match &self.active {
            Some(Overlay::ProjectPanel { carousel, .. }) => Some(carousel),
            _ => None,
        }
    }

    fn carousel_mut(&mut self) -> Option<&mut Carousel> {
        if self.lightbox.is_some() {
            return None;
        }
        match &mut self.active {
            Some(Overlay::ProjectPanel { carousel, .. }) => Some(carousel),
            _ => None,
        }
    }

    fn page(&mut self, turn: impl FnOnce(&mut Carousel) -> bool) {
        if let Some(carousel) = self.carousel_mut() {
            if turn(carousel) {
                self.revision += 1;
            }
        }
    }

    pub fn swipe(&mut self, start_x: f64, end_x: f64) {
        self.page(|carousel| carousel.swipe(start_x, end_x));
    }

    /// Acknowledge the current dialog line, the dialog closes after the last
    pub fn advance_dialog(&mut self, gates: Gates) -> Option<OverlayKind> {
        let Some(Overlay::Dialog(dialog)) = &mut self.active else {
            return None;
        };
        if dialog.advance() {
            self.revision += 1;
            None
        } else {
            self.close(gates)
        }
    }

    /// Escape and backdrop clicks: lightbox first, then the overlay
    pub fn dismiss(&mut self, gates: Gates) -> Option<OverlayKind> {
        if self.close_lightbox() {
            return None;
        }
        self.close(gates)
    }

    /// Keys while an overlay is open; arrows page the carousel
    pub fn handle_key(&mut self, key: &str, gates: Gates) -> Option<OverlayKind> {
        match key {
            "Escape" => self.dismiss(gates),
            "ArrowLeft" => {
                self.page(Carousel::prev);
                None
            }
            "ArrowRight" => {
                self.page(Carousel::next);
                None
            }
            _ => None,
        }
    }

    pub fn handle_action(&mut self, action: UiAction, gates: Gates) -> Option<OverlayKind> {
        match action {
            UiAction::Close => self.dismiss(gates),
            UiAction::DialogNext => self.advance_dialog(gates),
            UiAction::CarouselNext => {
                self.page(Carousel::next);
                None
            }
            UiAction::CarouselPrev => {
                self.page(Carousel::prev);
                None
            }
            UiAction::CarouselGo(index) => {
                self.page(|carousel| carousel.go_to(index));
                None
            }
            UiAction::LightboxOpen(source) => {
                if let Err(err) = self.open_lightbox(&source) {
                    log_warn!("Ignoring lightbox request : {}", err);
                }
                None
            }
            UiAction::LightboxClose => {
                self.close_lightbox();
                None
            }
        }
    }
}
