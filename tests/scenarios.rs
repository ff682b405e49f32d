use anyhow::anyhow;
use approx::assert_abs_diff_eq;
use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tidewalk::camera::Surface;
use tidewalk::engine::input::InputEvent;
use tidewalk::guestbook::service::{GuestbookService, MemoryStore, Request};
use tidewalk::level::{Changelog, WorldData};
use tidewalk::session::Session;
use tidewalk::sprite::avatar::Avatar;
use tidewalk::sprite::state::WalkBounds;

const LEVELS: &str = include_str!("../static/data/levels.json");
const FRAME: f64 = 1.0 / 60.0;

fn world() -> WorldData {
    serde_json::from_str(LEVELS).expect("levels.json should parse")
}

fn session(world: WorldData) -> Session {
    Session::new(
        world,
        Changelog::default(),
        Surface::new(1280.0, 720.0),
        StdRng::seed_from_u64(11),
    )
    .expect("start level exists")
}

/// Walk right with the arrow keys until a crossing starts
fn walk_into_portal(session: &mut Session) {
    for _ in 0..1200 {
        if session.scene().is_transitioning() {
            return;
        }
        if !session.avatar().is_walking() {
            session.handle_input(InputEvent::KeyDown("ArrowRight".into()));
        }
        session.update(FRAME);
    }
    panic!("never reached the portal");
}

fn frames(session: &mut Session, seconds: f64) {
    for _ in 0..(seconds / FRAME).round() as usize {
        session.update(FRAME);
    }
}

#[test]
fn walk_past_bounds_clamps() {
    let mut avatar = Avatar::new(0.0, -700.0, WalkBounds::new(-1800.0, 1800.0));
    avatar.walk_to(5000.0, None);
    for _ in 0..600 {
        avatar.update(FRAME);
        assert!(avatar.position().x <= 1800.0);
    }
    assert_eq!(avatar.position().x, 1800.0);
    assert!(!avatar.is_walking());
}

#[test]
fn portal_crossing_lands_on_target_spawn() {
    let mut session = session(world());
    let start_requests = session.take_asset_requests();
    assert_eq!(start_requests[0].level_id, "submarine-lab");

    walk_into_portal(&mut session);
    assert!(!session.avatar().is_walking());
    assert!(!session.regions().is_enabled());

    // cover goes opaque before anything is swapped
    frames(&mut session, 0.35);
    assert_eq!(session.view_cover(), 1.0);
    assert_eq!(session.current_level(), "submarine-lab");
    assert!(session.regions().regions().is_empty());

    let requests = session.take_asset_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].level_id, "reef");
    session.level_assets_ready("reef", Ok(()));

    frames(&mut session, 0.5);
    assert_eq!(session.current_level(), "reef");
    assert_eq!(session.level().id, "reef");
    assert_abs_diff_eq!(session.avatar().position().x, -1600.0);
    assert_abs_diff_eq!(session.avatar().position().y, session.level().floor_y);
    assert_eq!(session.view_cover(), 0.0);
    assert!(!session.scene().is_transitioning());
    assert!(session.regions().is_enabled());
    assert!(session.npcs().npc("turtle").is_some());
    assert!(session.regions().region("guestbook").is_some());
}

#[test]
fn failed_background_rolls_back_and_uncovers() {
    let mut session = session(world());
    session.take_asset_requests();
    walk_into_portal(&mut session);
    frames(&mut session, 0.35);
    session.take_asset_requests();

    session.level_assets_ready("reef", Err(anyhow!("background 404")));
    frames(&mut session, 0.5);
    assert_eq!(session.current_level(), "submarine-lab");
    assert_eq!(session.view_cover(), 0.0);
    assert!(session.regions().region("kelp-notes").is_some());
    assert!(session.regions().is_enabled());
    let portal = &session.level().portals[0];
    assert!(!portal.is_triggered_by(session.avatar().position().x));
}

#[test]
fn only_one_crossing_at_a_time() {
    let mut session = session(world());
    walk_into_portal(&mut session);
    // keys and clicks are ignored while crossing
    session.handle_input(InputEvent::KeyDown("ArrowLeft".into()));
    session.handle_input(InputEvent::Click { x: 10.0, y: 700.0 });
    assert!(!session.avatar().is_walking());
    frames(&mut session, 2.0);
    // still waiting for the reef
    assert_eq!(session.view_cover(), 1.0);
}

#[test]
fn guestbook_spam_and_honeypot() {
    let now = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();
    let mut service = GuestbookService::new(Some(MemoryStore::new()));

    let spam = service.handle(
        &Request::post(json!({ "name": "Bob", "message": "Check http://spam.com" })),
        now,
    );
    assert_eq!(spam.status, 400);
    assert_eq!(spam.body["error"], "URLs are not allowed in messages");

    let bot = service.handle(
        &Request::post(json!({ "name": "Bob", "message": "hi", "website": "x" }))
            .with_header("x-forwarded-for", "4.4.4.4"),
        now,
    );
    assert_eq!(bot.status, 200);
    assert_eq!(bot.body["success"], true);
    assert!(service.list().expect("store configured").is_empty());
}
