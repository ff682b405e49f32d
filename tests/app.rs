//! Browser smoke tests, run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use tidewalk::guestbook::client::{Cooldown, CooldownStore, LocalStorage, COOLDOWN_KEY};
use tidewalk::level::WorldData;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn cooldown_persists_in_local_storage() {
    let now = js_sys::Date::now();
    let cooldown = Cooldown::new(LocalStorage);
    cooldown.record(now);
    assert!(!cooldown.can_submit(now + 1_000.0));
    assert!(LocalStorage.get(COOLDOWN_KEY).is_some());

    // a fresh handle reads the same entry
    let again = Cooldown::new(LocalStorage);
    assert_eq!(again.remaining_seconds(now + 30_000.0), 30);
}

#[wasm_bindgen_test]
fn level_data_deserializes_through_js() {
    let json = include_str!("../static/data/levels.json");
    let value = js_sys::JSON::parse(json).expect("valid JSON");
    let world: WorldData = serde_wasm_bindgen::from_value(value).expect("world data");
    assert!(world.start().is_ok());
}
