// ==================== Imports ====================
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

#[macro_use]
mod browser;
pub mod bubble;
pub mod camera;
pub mod engine;
mod game;
pub mod guestbook;
pub mod hotspots;
pub mod level;
pub mod npc;
pub mod overlay;
pub mod scene;
pub mod session;
pub mod sprite;
mod ui;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - starts the game loop once data and sprites are in
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        if let Err(err) = engine::GameLoop::start(game::Tidewalk::new()).await {
            log_error!("Could not start Tidewalk : {:#?}", err);
        }
    });

    Ok(())
}
