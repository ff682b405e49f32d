//! Keeps the page's overlay markup in step with the session. Work is only
//! done when a revision counter moved, except for the bubble position which
//! follows the avatar every frame.
use crate::browser;
use crate::bubble::{BubbleStyle, ANCHOR_HEIGHT};
use crate::engine::Point;
use crate::guestbook::client::{self, SubmitError, EMPTY_TEXT, SUCCESS_TEXT};
use crate::guestbook::{Entry, Submission};
use crate::hotspots::Cursor;
use crate::overlay::{Overlay, OverlayKind};
use crate::session::Session;
use anyhow::{anyhow, Result};
use chrono::Utc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlElement, HtmlImageElement, HtmlInputElement, HtmlTextAreaElement};

const HIDDEN: &str = "hidden";

mod ids {
    pub const BUBBLE: &str = "bubble";
    pub const PROJECT_PANEL: &str = "project-panel";
    pub const DIALOG: &str = "dialog";
    pub const GUESTBOOK: &str = "guestbook";
    pub const CAPTAINS_LOG: &str = "captains-log";
    pub const MESSAGE_BOTTLE: &str = "message-bottle";
    pub const ADVENTURE: &str = "adventure";
    pub const PORTFOLIO: &str = "portfolio";
    pub const LIGHTBOX: &str = "lightbox";
    pub const LIGHTBOX_IMAGE: &str = "lightbox-image";
    pub const PANEL_TITLE: &str = "panel-title";
    pub const PANEL_DESCRIPTION: &str = "panel-description";
    pub const PANEL_TECH: &str = "panel-tech";
    pub const PANEL_LIVE: &str = "panel-live";
    pub const PANEL_GITHUB: &str = "panel-github";
    pub const CAROUSEL: &str = "carousel";
    pub const CAROUSEL_IMAGE: &str = "carousel-image";
    pub const CAROUSEL_DOTS: &str = "carousel-dots";
    pub const DIALOG_SPEAKER: &str = "dialog-speaker";
    pub const DIALOG_TEXT: &str = "dialog-text";
    pub const DIALOG_NEXT: &str = "dialog-next";
    pub const LOG_VERSION: &str = "log-version";
    pub const LOG_DATE: &str = "log-date";
    pub const LOG_TITLE: &str = "log-title";
    pub const LOG_CHANGES: &str = "log-changes";
    pub const GUESTBOOK_NAME: &str = "guestbook-name";
    pub const GUESTBOOK_LOCATION: &str = "guestbook-location";
    pub const GUESTBOOK_MESSAGE: &str = "guestbook-message";
    pub const GUESTBOOK_WEBSITE: &str = "guestbook-website";
    pub const GUESTBOOK_COUNT: &str = "guestbook-count";
    pub const GUESTBOOK_STATUS: &str = "guestbook-status";
    pub const GUESTBOOK_ENTRIES: &str = "guestbook-entries";
}

const OVERLAYS: [(OverlayKind, &str); 7] = [
    (OverlayKind::ProjectPanel, ids::PROJECT_PANEL),
    (OverlayKind::Dialog, ids::DIALOG),
    (OverlayKind::Guestbook, ids::GUESTBOOK),
    (OverlayKind::CaptainsLog, ids::CAPTAINS_LOG),
    (OverlayKind::MessageBottle, ids::MESSAGE_BOTTLE),
    (OverlayKind::Adventure, ids::ADVENTURE),
    (OverlayKind::Portfolio, ids::PORTFOLIO),
];

fn js_err(err: JsValue) -> anyhow::Error {
    anyhow!("DOM call failed : {:#?}", err)
}

fn set_text(id: &str, text: &str) {
    if let Some(element) = browser::element(id) {
        element.set_text_content(Some(text));
    }
}

fn set_visible(id: &str, visible: bool) -> Result<()> {
    if let Some(element) = browser::element(id) {
        element
            .class_list()
            .toggle_with_force(HIDDEN, !visible)
            .map_err(js_err)?;
    }
    Ok(())
}

fn append(parent: &Element, tag: &str, class: &str, text: &str) -> Result<Element> {
    let child = browser::document()?.create_element(tag).map_err(js_err)?;
    if !class.is_empty() {
        child.set_class_name(class);
    }
    child.set_text_content(Some(text));
    parent.append_child(&child).map_err(js_err)?;
    Ok(child)
}

fn clear(id: &str) -> Option<Element> {
    let element = browser::element(id)?;
    element.set_inner_html("");
    Some(element)
}

fn set_link(id: &str, href: Option<&str>) -> Result<()> {
    match (browser::element(id), href) {
        (Some(element), Some(href)) => {
            element.set_attribute("href", href).map_err(js_err)?;
            set_visible(id, true)
        }
        _ => set_visible(id, false),
    }
}

fn set_image(id: &str, source: &str) {
    if let Some(image) = browser::element(id).and_then(|el| el.dyn_into::<HtmlImageElement>().ok()) {
        image.set_src(source);
        let _ = image.set_attribute("data-value", source);
    }
}

fn input_value(id: &str) -> Result<String> {
    let element = browser::element(id).ok_or_else(|| anyhow!("Missing #{}", id))?;
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Ok(input.value());
    }
    element
        .dyn_ref::<HtmlTextAreaElement>()
        .map(HtmlTextAreaElement::value)
        .ok_or_else(|| anyhow!("#{} is not a form field", id))
}

fn clear_input(id: &str) {
    if let Some(element) = browser::element(id) {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value("");
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value("");
        }
    }
}

/// What the page currently shows
#[derive(Debug, Default)]
pub struct Page {
    overlay_revision: Option<u64>,
    bubble_revision: Option<u64>,
    cursor: Option<Cursor>,
    open: Option<OverlayKind>,
    message_chars: Option<usize>,
}

impl Page {
    pub const GUESTBOOK_FORM: &'static str = "guestbook-form";

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` on the frame the guestbook opens, so entries can be
    /// fetched fresh
    pub fn sync(&mut self, session: &Session) -> Result<bool> {
        self.sync_cursor(session.cursor())?;
        self.sync_bubble(session)?;

        let overlays = session.overlays();
        let mut guestbook_opened = false;
        if self.overlay_revision != Some(overlays.revision()) {
            self.overlay_revision = Some(overlays.revision());
            let open = overlays.active().map(Overlay::kind);
            guestbook_opened = open == Some(OverlayKind::Guestbook) && self.open != open;
            self.open = open;
            self.render_overlays(session)?;
        }
        if self.open == Some(OverlayKind::Guestbook) {
            self.sync_counter()?;
        }
        Ok(guestbook_opened)
    }

    fn sync_cursor(&mut self, cursor: Cursor) -> Result<()> {
        if self.cursor == Some(cursor) {
            return Ok(());
        }
        self.cursor = Some(cursor);
        browser::canvas()?
            .style()
            .set_property("cursor", cursor.css())
            .map_err(js_err)
    }

    fn sync_bubble(&mut self, session: &Session) -> Result<()> {
        let Some(element) = browser::html_element(ids::BUBBLE) else {
            return Ok(());
        };
        let bubbles = session.bubbles();
        if self.bubble_revision != Some(bubbles.revision()) {
            self.bubble_revision = Some(bubbles.revision());
            match bubbles.current() {
                Some(bubble) => {
                    element.set_text_content(Some(&bubble.text));
                    let classes = element.class_list();
                    classes
                        .toggle_with_force("thought", bubble.style == BubbleStyle::Thought)
                        .map_err(js_err)?;
                    classes.remove_1(HIDDEN).map_err(js_err)?;
                }
                None => element.class_list().add_1(HIDDEN).map_err(js_err)?,
            }
        }
        if bubbles.current().is_some() {
            place_above_avatar(&element, session)?;
        }
        Ok(())
    }

    fn sync_counter(&mut self) -> Result<()> {
        let message = input_value(ids::GUESTBOOK_MESSAGE)?;
        let chars = message.chars().count();
        if self.message_chars != Some(chars) {
            self.message_chars = Some(chars);
            set_text(ids::GUESTBOOK_COUNT, &client::char_count_label(&message));
        }
        Ok(())
    }

    fn render_overlays(&self, session: &Session) -> Result<()> {
        let overlays = session.overlays();
        for (kind, id) in OVERLAYS {
            set_visible(id, self.open == Some(kind))?;
        }
        match overlays.active() {
            Some(Overlay::ProjectPanel { project, carousel }) => {
                set_text(ids::PANEL_TITLE, &project.title);
                set_text(ids::PANEL_DESCRIPTION, &project.description);
                if let Some(tech) = clear(ids::PANEL_TECH) {
                    for name in &project.tech {
                        append(&tech, "span", "tag", name)?;
                    }
                }
                set_link(ids::PANEL_LIVE, project.links.live.as_deref())?;
                set_link(ids::PANEL_GITHUB, project.links.github.as_deref())?;

                set_visible(ids::CAROUSEL, !carousel.is_empty())?;
                if let Some(slide) = carousel.current_slide() {
                    set_image(ids::CAROUSEL_IMAGE, slide);
                }
                if let Some(dots) = clear(ids::CAROUSEL_DOTS) {
                    if carousel.len() > 1 {
                        for index in 0..carousel.len() {
                            let class = if index == carousel.current() { "dot active" } else { "dot" };
                            let dot = append(&dots, "button", class, "")?;
                            dot.set_attribute("data-action", "carousel-go").map_err(js_err)?;
                            dot.set_attribute("data-value", &index.to_string()).map_err(js_err)?;
                        }
                    }
                }
            }
            Some(Overlay::Dialog(dialog)) => {
                set_text(ids::DIALOG_SPEAKER, &dialog.speaker);
                set_text(ids::DIALOG_TEXT, dialog.line());
                set_text(ids::DIALOG_NEXT, dialog.button_label());
            }
            Some(Overlay::CaptainsLog) => {
                if let Some(entry) = session.changelog_latest() {
                    set_text(ids::LOG_VERSION, &format!("v{}", entry.version));
                    set_text(ids::LOG_DATE, &entry.display_date());
                    set_text(ids::LOG_TITLE, &entry.title);
                    if let Some(list) = clear(ids::LOG_CHANGES) {
                        for change in &entry.changes {
                            append(&list, "li", "", change)?;
                        }
                    }
                }
            }
            Some(Overlay::Guestbook) => set_text(ids::GUESTBOOK_STATUS, ""),
            _ => {}
        }

        set_visible(ids::LIGHTBOX, overlays.lightbox().is_some())?;
        if let Some(source) = overlays.lightbox() {
            set_image(ids::LIGHTBOX_IMAGE, source);
        }
        Ok(())
    }

    // ==================== Guestbook ====================
    pub fn read_guestbook_form(&self) -> Result<Submission> {
        let location = input_value(ids::GUESTBOOK_LOCATION)?;
        let website = input_value(ids::GUESTBOOK_WEBSITE)?;
        Ok(Submission {
            name: input_value(ids::GUESTBOOK_NAME)?,
            location: Some(location),
            message: input_value(ids::GUESTBOOK_MESSAGE)?,
            website: Some(website),
        })
    }

    pub fn guestbook_sending(&self) {
        set_text(ids::GUESTBOOK_STATUS, "Sending...");
    }

    pub fn guestbook_submitted(&mut self, result: Result<(), SubmitError>) {
        match result {
            Ok(()) => {
                set_text(ids::GUESTBOOK_STATUS, SUCCESS_TEXT);
                for id in [ids::GUESTBOOK_NAME, ids::GUESTBOOK_LOCATION, ids::GUESTBOOK_MESSAGE] {
                    clear_input(id);
                }
                self.message_chars = None;
            }
            Err(err) => set_text(ids::GUESTBOOK_STATUS, &err.to_string()),
        }
    }

    pub fn guestbook_entries(&self, entries: Vec<Entry>) {
        let Some(list) = clear(ids::GUESTBOOK_ENTRIES) else {
            return;
        };
        if entries.is_empty() {
            if let Err(err) = append(&list, "p", "empty", EMPTY_TEXT) {
                log_warn!("Could not render guestbook : {:#}", err);
            }
            return;
        }
        let now = Utc::now();
        for entry in entries {
            if let Err(err) = render_entry(&list, &entry, now) {
                log_warn!("Could not render guestbook entry : {:#}", err);
            }
        }
    }
}

fn render_entry(list: &Element, entry: &Entry, now: chrono::DateTime<Utc>) -> Result<()> {
    let item = append(list, "li", "entry", "")?;
    let header = append(&item, "div", "entry-header", "")?;
    append(&header, "span", "entry-name", &entry.name)?;
    if let Some(location) = &entry.location {
        append(&header, "span", "entry-location", location)?;
    }
    append(&header, "span", "entry-time", &client::relative_time(entry.created_at, now))?;
    append(&item, "p", "entry-message", &entry.message)?;
    Ok(())
}

// bubble sits centered over the avatar's head, in page coordinates
fn place_above_avatar(element: &HtmlElement, session: &Session) -> Result<()> {
    let feet = session.avatar().position();
    let anchor = session
        .camera()
        .world_to_screen(Point::new(feet.x, feet.y + ANCHOR_HEIGHT));
    let style = element.style();
    style
        .set_property("left", &format!("{:.0}px", anchor.x))
        .map_err(js_err)?;
    style
        .set_property("top", &format!("{:.0}px", anchor.y))
        .map_err(js_err)
}
