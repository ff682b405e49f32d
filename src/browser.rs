use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    Document,
    Window,
    CanvasRenderingContext2d,
    Element,
    Event,
    EventTarget,
    HtmlCanvasElement,
    HtmlElement,
    HtmlImageElement,
    Request,
    RequestInit,
    Response,
    Storage,
};

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
}

// ==================== Logging ====================
// `#[macro_use] mod browser` in lib.rs makes these visible crate wide
macro_rules! log {
    ($($t:tt)*) => {
        $crate::browser::console_log(&format!($($t)*))
    }
}

macro_rules! log_warn {
    ($($t:tt)*) => {
        $crate::browser::console_warn(&format!($($t)*))
    }
}

macro_rules! log_error {
    ($($t:tt)*) => {
        $crate::browser::console_error(&format!($($t)*))
    }
}

// console_* are wasm-bindgen imports and panic off-wasm, so host builds
// (unit tests) write to stderr instead
#[cfg(target_arch = "wasm32")]
pub fn console_log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

#[cfg(target_arch = "wasm32")]
pub fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(target_arch = "wasm32")]
pub fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
pub fn console_log(message: &str) {
    eprintln!("[log] {message}");
}

#[cfg(not(target_arch = "wasm32"))]
pub fn console_warn(message: &str) {
    eprintln!("[warn] {message}");
}

#[cfg(not(target_arch = "wasm32"))]
pub fn console_error(message: &str) {
    eprintln!("[error] {message}");
}

// ==================== Elements ====================
pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new().map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue>
        // - map the JsValue error into anyhow
        // - map the None case into an error as well
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn element(id: &str) -> Option<Element> {
    document().ok()?.get_element_by_id(id)
}

pub fn html_element(id: &str) -> Option<HtmlElement> {
    element(id)?.dyn_into::<HtmlElement>().ok()
}

/// Inner window size in CSS pixels
pub fn inner_size() -> Result<(f64, f64)> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Could not read inner width : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("inner width is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Could not read inner height : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("inner height is not a number"))?;
    Ok((width, height))
}

pub fn local_storage() -> Result<Storage> {
    window()?
        .local_storage()
        .map_err(|err| anyhow!("Error accessing local storage : {:#?}", err))?
        .ok_or_else(|| anyhow!("No local storage available"))
}

// ==================== Timing ====================
pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

// ==================== Closures ====================
pub fn closure_once<F, A, R>(f: F) -> Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

/// Event listener that unregisters itself when dropped, so tearing down the
/// owner releases the DOM hook as well
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = closure_wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not add '{}' listener : {:#?}", event, err))?;
        Ok(Listener {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

// ==================== Async ====================
pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!("fetching {} returned status {}", json_path, resp.status()));
    }
    read_json(&resp).await
}

/// POST `body` as JSON, returning the status code and the decoded reply
pub async fn post_json<B, T>(url: &str, body: &B) -> Result<(u16, T)>
where
    B: Serialize,
    T: DeserializeOwned,
{
    let payload = serde_json::to_string(body).context("Could not serialize request body")?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(&payload));
    let request = Request::new_with_str_and_init(url, &init)
        .map_err(|err| anyhow!("Could not build request for {} : {:#?}", url, err))?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|err| anyhow!("Could not set request headers : {:#?}", err))?;

    let resp_value = JsFuture::from(window()?.fetch_with_request(&request))
        .await
        .map_err(|err| anyhow!("error posting to {} : {:#?}", url, err))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    let status = resp.status();
    let body = read_json(&resp).await?;
    Ok((status, body))
}

async fn read_json<T>(resp: &Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error reading JSON body [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn listener_is_live_until_dropped() {
        let button = document()
            .and_then(|doc| {
                doc.create_element("button")
                    .map_err(|err| anyhow!("{:#?}", err))
            })
            .expect("button")
            .dyn_into::<HtmlElement>()
            .expect("html element");
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let listener = Listener::new(&button, "click", move |_event: Event| {
            counter.set(counter.get() + 1);
        })
        .expect("listener");

        button.click();
        assert_eq!(clicks.get(), 1);

        let owner = vec![listener];
        button.click();
        assert_eq!(clicks.get(), 2);

        drop(owner);
        button.click();
        assert_eq!(clicks.get(), 2);
    }
}
