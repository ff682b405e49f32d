use crate::browser;
use anyhow::{anyhow, Error, Result};
// web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - we control the closure creation and specify the expected type
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn handle_input(&mut self, event: input::InputEvent);
    fn update(&mut self, delta: f64);
    fn draw(&mut self, renderer: &Renderer);
}

// longest step a single frame may simulate, in seconds
// - a backgrounded tab resumes with one huge delta otherwise
const MAX_DELTA: f64 = 0.1;

pub struct GameLoop {
    last_frame: f64,
    // input listeners unregister on drop, so the loop owns them
    _listeners: Vec<browser::Listener>,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let (mut events, listeners) = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            _listeners: listeners,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };
        renderer.fit_to_window()?;

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            // input handlers run to completion before the tick reads state
            while let Ok(Some(event)) = events.try_next() {
                if let input::InputEvent::Resize { .. } = event {
                    if let Err(err) = renderer.fit_to_window() {
                        log_warn!("Could not resize canvas : {:#?}", err);
                    }
                }
                game.handle_input(event);
            }
            let delta = ((perf - game_loop.last_frame) / 1000.0).clamp(0.0, MAX_DELTA);
            game_loop.last_frame = perf;
            game.update(delta);
            game.draw(&renderer);
            if let Some(closure) = f.borrow().as_ref() {
                let _ = browser::request_animation_frame(closure);
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// Axis aligned rectangle; `position` is the corner with the smallest
/// coordinates, which is top-left on the canvas and bottom-left in the world
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn from_center(center: Point, size: Size) -> Self {
        Rect {
            position: Point {
                x: center.x - size.width / 2.0,
                y: center.y - size.height / 2.0,
            },
            size,
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn right(&self) -> f64 {
        self.position.x + self.size.width
    }

    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.position.x + self.size.width * 0.5,
            y: self.position.y + self.size.height * 0.5,
        }
    }

    /// Edges count as inside
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x() && point.x <= self.right() && point.y >= self.y() && point.y <= self.bottom()
    }
}

// ==================== Rendering ====================
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    /// Backing store follows the CSS size 1:1 so pixel art never gets
    /// fractionally scaled
    pub fn fit_to_window(&self) -> Result<()> {
        let (width, height) = browser::inner_size()?;
        if let Some(canvas) = self.context.canvas() {
            canvas.set_width(width.max(1.0) as u32);
            canvas.set_height(height.max(1.0) as u32);
        }
        // resizing resets context state
        self.context.set_image_smoothing_enabled(false);
        Ok(())
    }

    pub fn size(&self) -> Size {
        self.context
            .canvas()
            .map(|canvas| Size::new(canvas.width() as f64, canvas.height() as f64))
            .unwrap_or_default()
    }

    pub fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    #[allow(deprecated)]
    pub fn fill_rect(&self, rect: &Rect, color: &str, alpha: f64) {
        self.context.set_global_alpha(alpha);
        self.context.set_fill_style(&JsValue::from_str(color));
        self.context
            .fill_rect(rect.x(), rect.y(), rect.width(), rect.height());
        self.context.set_global_alpha(1.0);
    }

    #[allow(deprecated)]
    pub fn fill_rounded_rect(&self, rect: &Rect, radius: f64, color: &str, alpha: f64) {
        let r = radius.min(rect.width() / 2.0).min(rect.height() / 2.0).max(0.0);
        let (left, top, right, bottom) = (rect.x(), rect.y(), rect.right(), rect.bottom());
        let ctx = &self.context;
        ctx.begin_path();
        ctx.move_to(left + r, top);
        ctx.line_to(right - r, top);
        ctx.quadratic_curve_to(right, top, right, top + r);
        ctx.line_to(right, bottom - r);
        ctx.quadratic_curve_to(right, bottom, right - r, bottom);
        ctx.line_to(left + r, bottom);
        ctx.quadratic_curve_to(left, bottom, left, bottom - r);
        ctx.line_to(left, top + r);
        ctx.quadratic_curve_to(left, top, left + r, top);
        ctx.close_path();
        ctx.set_global_alpha(alpha);
        ctx.set_fill_style(&JsValue::from_str(color));
        ctx.fill();
        ctx.set_global_alpha(1.0);
    }

    #[allow(deprecated)]
    pub fn stroke_rect(&self, rect: &Rect, color: &str) {
        self.context.set_stroke_style(&JsValue::from_str(color));
        self.context
            .stroke_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    #[allow(deprecated)]
    pub fn fill_text(&self, text: &str, position: Point, color: &str) {
        self.context.set_font("14px monospace");
        self.context.set_fill_style(&JsValue::from_str(color));
        if let Err(err) = self.context.fill_text(text, position.x, position.y) {
            log_warn!("fill_text failed : {:#?}", err);
        }
    }

    /// Draw `frame` of `image` into `destination`, mirrored around the
    /// destination's vertical axis when `mirrored` is set
    pub fn draw_image(
        &self,
        image: &HtmlImageElement,
        frame: &Rect,
        destination: &Rect,
        mirrored: bool,
    ) {
        let ctx = &self.context;
        ctx.save();
        let (dx, dy) = if mirrored {
            let _ = ctx.translate(destination.right(), destination.y());
            let _ = ctx.scale(-1.0, 1.0);
            (0.0, 0.0)
        } else {
            (destination.x(), destination.y())
        };
        if let Err(err) = ctx
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x(),
                frame.y(),
                frame.width(),
                frame.height(),
                dx,
                dy,
                destination.width(),
                destination.height(),
            )
        {
            log_warn!("draw_image failed : {:#?}", err);
        }
        ctx.restore();
    }
}

#[cfg(debug_assertions)]
pub trait DebugDraw {
    fn draw_debug(&self, renderer: &Renderer);
}

#[cfg(debug_assertions)]
impl DebugDraw for Rect {
    fn draw_debug(&self, renderer: &Renderer) {
        renderer.stroke_rect(self, "#ff0000");
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let source_name = source.to_string();
    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image {} : {:#?}",
                source_name,
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields channel result : Result<(), Error>
    // - second ? yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

pub mod input {
    use crate::browser::{self, Listener};
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use wasm_bindgen::JsCast;
    use web_sys::{Element, Event, KeyboardEvent, MouseEvent, TouchEvent};

    /// Everything the page can tell the game, queued until the next frame
    #[derive(Debug, Clone, PartialEq)]
    pub enum InputEvent {
        /// client (page) coordinates
        PointerMove { x: f64, y: f64 },
        PointerLeave,
        Click { x: f64, y: f64 },
        KeyDown(String),
        Resize { width: f64, height: f64 },
        /// `data-action` button inside an overlay
        Ui { action: String, value: Option<String> },
        /// click on an overlay backdrop (`data-dismiss`)
        Dismiss,
        Swipe { start_x: f64, end_x: f64 },
        Submit { form_id: String },
    }

    pub type InputReceiver = UnboundedReceiver<InputEvent>;

    /// Register page listeners that feed one channel
    /// - returned listeners unregister when dropped
    pub fn prepare_input() -> Result<(InputReceiver, Vec<Listener>)> {
        let (tx, rx) = unbounded();
        let canvas = browser::canvas()?;
        let document = browser::document()?;
        let window = browser::window()?;
        let mut listeners = Vec::new();

        let sender = tx.clone();
        listeners.push(Listener::new(&canvas, "mousemove", move |event: Event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                send(&sender, InputEvent::PointerMove {
                    x: mouse.client_x() as f64,
                    y: mouse.client_y() as f64,
                });
            }
        })?);

        let sender = tx.clone();
        listeners.push(Listener::new(&canvas, "mouseleave", move |_event: Event| {
            send(&sender, InputEvent::PointerLeave);
        })?);

        let sender = tx.clone();
        listeners.push(Listener::new(&canvas, "click", move |event: Event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                send(&sender, InputEvent::Click {
                    x: mouse.client_x() as f64,
                    y: mouse.client_y() as f64,
                });
            }
        })?);

        let sender = tx.clone();
        listeners.push(Listener::new(&document, "keydown", move |event: Event| {
            if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                send(&sender, InputEvent::KeyDown(key.key()));
            }
        })?);

        let sender = tx.clone();
        listeners.push(Listener::new(&window, "resize", move |_event: Event| {
            if let Ok((width, height)) = browser::inner_size() {
                send(&sender, InputEvent::Resize { width, height });
            }
        })?);

        // overlay buttons are delegated through the document
        let sender = tx.clone();
        listeners.push(Listener::new(&document, "click", move |event: Event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            if target.has_attribute("data-dismiss") {
                send(&sender, InputEvent::Dismiss);
                return;
            }
            if let Ok(Some(button)) = target.closest("[data-action]") {
                if let Some(action) = button.get_attribute("data-action") {
                    send(&sender, InputEvent::Ui {
                        action,
                        value: button.get_attribute("data-value"),
                    });
                }
            }
        })?);

        let sender = tx.clone();
        listeners.push(Listener::new(&document, "submit", move |event: Event| {
            event.prevent_default();
            if let Some(form) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) {
                send(&sender, InputEvent::Submit { form_id: form.id() });
            }
        })?);

        let touch_start = std::rc::Rc::new(std::cell::Cell::new(None::<f64>));
        let start = touch_start.clone();
        listeners.push(Listener::new(&document, "touchstart", move |event: Event| {
            if in_carousel(&event) {
                start.set(first_touch_x(&event));
            }
        })?);

        let sender = tx;
        listeners.push(Listener::new(&document, "touchend", move |event: Event| {
            if let (Some(start_x), Some(end_x)) = (touch_start.take(), first_touch_x(&event)) {
                send(&sender, InputEvent::Swipe { start_x, end_x });
            }
        })?);

        Ok((rx, listeners))
    }

    fn send(sender: &UnboundedSender<InputEvent>, event: InputEvent) {
        // receiver only disappears when the loop is gone
        let _ = sender.unbounded_send(event);
    }

    fn in_carousel(event: &Event) -> bool {
        event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(".carousel").ok().flatten())
            .is_some()
    }

    fn first_touch_x(event: &Event) -> Option<f64> {
        event
            .dyn_ref::<TouchEvent>()
            .and_then(|touch| touch.changed_touches().get(0))
            .map(|touch| touch.screen_x() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_from_center_contains_its_edges() {
        let rect = Rect::from_center(Point::new(100.0, -50.0), Size::new(40.0, 20.0));
        assert_eq!(rect.x(), 80.0);
        assert_eq!(rect.y(), -60.0);
        assert!(rect.contains(Point::new(120.0, -40.0)));
        assert!(rect.contains(Point::new(100.0, -50.0)));
        assert!(!rect.contains(Point::new(121.0, -50.0)));
        assert_eq!(rect.center(), Point::new(100.0, -50.0));
    }
}
