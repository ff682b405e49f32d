use crate::browser;
use crate::camera::Surface;
use crate::engine::input::InputEvent;
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{self, Game, Point, Rect, Renderer, Size};
use crate::guestbook::client::{self, Cooldown, LocalStorage, SubmitError};
use crate::guestbook::Entry;
use crate::level::{Changelog, WorldData};
use crate::session::{AssetRequest, Session};
use crate::sprite::avatar::AvatarSprites;
use crate::sprite::{Idle, SpriteState, Walking};
use crate::ui::Page;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::future::join_all;
use futures::join;
use std::collections::HashMap;
use web_sys::HtmlImageElement;

/// TABLE
/// ┌───────────────────────── Frame Overview ────────────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐  input   ┌─────────────┐  input   ┌─────────────┐    │
/// │    │  engine.rs  ├─────────►│   game.rs   ├─────────►│ session.rs  │    │
/// │    │  GameLoop   │  update  │  Tidewalk   │  update  │  Session    │    │
/// │    └─────────────┘          └──────┬──────┘          └──────┬──────┘    │
/// │                                    │ spawn_local            │ asset     │
/// │                              ┌─────┴──────┐                 │ requests  │
/// │                              │  fetches   │◄────────────────┘           │
/// │                              │  (async)   ├──── Fetched ───► next frame │
/// │                              └────────────┘                             │
/// │                                                                         │
/// │  draw : background → regions → NPCs → avatar → cover, then DOM sync     │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum Tidewalk {
    /// Data and sprites still loading
    Loading,

    /// Session running
    Loaded(Walk),
}

impl Tidewalk {
    const LEVELS_PATH: &'static str = "data/levels.json";
    const CHANGELOG_PATH: &'static str = "data/changelog.json";

    pub fn new() -> Self {
        Tidewalk::Loading
    }

    async fn load_world() -> Result<WorldData> {
        browser::fetch_json::<WorldData>(Self::LEVELS_PATH)
            .await
            .with_context(|| format!("Failed to load level data from : {}", Self::LEVELS_PATH))
    }

    async fn load_changelog() -> Result<Changelog> {
        browser::fetch_json::<Changelog>(Self::CHANGELOG_PATH)
            .await
            .with_context(|| format!("Failed to load changelog from : {}", Self::CHANGELOG_PATH))
    }
}

impl Default for Tidewalk {
    fn default() -> Self {
        Self::new()
    }
}

/// Results of background work, drained at the start of every frame
enum Fetched {
    Level {
        level_id: String,
        background: Result<HtmlImageElement>,
        sprites: Vec<(String, HtmlImageElement)>,
    },
    Submitted(Result<(), SubmitError>),
    Entries(Result<Vec<Entry>>),
}

/// Images by level id and by sprite path
#[derive(Default)]
struct Assets {
    avatar: AvatarSprites,
    backgrounds: HashMap<String, HtmlImageElement>,
    npc_sheets: HashMap<String, HtmlImageElement>,
}

pub struct Walk {
    session: Session,
    assets: Assets,
    page: Page,
    fetched_tx: UnboundedSender<Fetched>,
    fetched_rx: UnboundedReceiver<Fetched>,
}

async fn load_optional(source: &str) -> Option<HtmlImageElement> {
    match engine::load_image(source).await {
        Ok(image) => Some(image),
        Err(err) => {
            log_warn!("Using placeholder for {} : {:#}", source, err);
            None
        }
    }
}

fn canvas_surface() -> Result<Surface> {
    let rect = browser::canvas()?.get_bounding_client_rect();
    Ok(Surface {
        left: rect.left(),
        top: rect.top(),
        width: rect.width(),
        height: rect.height(),
    })
}

#[async_trait(?Send)]
impl Game for Tidewalk {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            Tidewalk::Loading => {
                let (world, changelog, idle, walk) = join!(
                    Self::load_world(),
                    Self::load_changelog(),
                    load_optional(Idle::metadata().sheet),
                    load_optional(Walking::metadata().sheet),
                );
                // no levels, nothing to walk through
                let world = world?;
                let changelog = changelog.unwrap_or_else(|err| {
                    log_warn!("Continuing without changelog : {:#}", err);
                    Changelog::default()
                });
                let surface = canvas_surface()?;
                let session = Session::from_entropy(world, changelog, surface)?;
                let (fetched_tx, fetched_rx) = unbounded();
                let mut walk = Walk {
                    session,
                    assets: Assets {
                        avatar: AvatarSprites { idle, walk },
                        ..Assets::default()
                    },
                    page: Page::new(),
                    fetched_tx,
                    fetched_rx,
                };
                walk.dispatch_asset_requests();
                Ok(Box::new(Tidewalk::Loaded(walk)))
            }
            Tidewalk::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn handle_input(&mut self, event: InputEvent) {
        if let Tidewalk::Loaded(walk) = self {
            match event {
                InputEvent::Submit { form_id } if form_id == Page::GUESTBOOK_FORM => walk.submit_guestbook(),
                InputEvent::Resize { .. } => match canvas_surface() {
                    Ok(surface) => walk.session.resize(surface),
                    Err(err) => log_warn!("Could not measure canvas : {:#}", err),
                },
                event => walk.session.handle_input(event),
            }
        }
    }

    fn update(&mut self, delta: f64) {
        if let Tidewalk::Loaded(walk) = self {
            walk.drain_fetched();
            walk.session.update(delta);
            walk.dispatch_asset_requests();
        }
    }

    fn draw(&mut self, renderer: &Renderer) {
        if let Tidewalk::Loaded(walk) = self {
            walk.draw(renderer);
            match walk.page.sync(&walk.session) {
                Ok(true) => walk.fetch_guestbook_entries(),
                Ok(false) => {}
                Err(err) => log_warn!("Page sync failed : {:#}", err),
            }
        }
    }
}

impl Walk {
    fn dispatch_asset_requests(&mut self) {
        for request in self.session.take_asset_requests() {
            let tx = self.fetched_tx.clone();
            browser::spawn_local(async move {
                let fetched = load_level_assets(request).await;
                let _ = tx.unbounded_send(fetched);
            });
        }
    }

    fn drain_fetched(&mut self) {
        while let Ok(Some(fetched)) = self.fetched_rx.try_next() {
            match fetched {
                Fetched::Level {
                    level_id,
                    background,
                    sprites,
                } => {
                    self.assets.npc_sheets.extend(sprites);
                    let result = background.map(|image| {
                        self.assets.backgrounds.insert(level_id.clone(), image);
                    });
                    self.session.level_assets_ready(&level_id, result);
                }
                Fetched::Submitted(result) => {
                    let succeeded = result.is_ok();
                    self.page.guestbook_submitted(result);
                    if succeeded {
                        self.fetch_guestbook_entries();
                    }
                }
                Fetched::Entries(Ok(entries)) => self.page.guestbook_entries(entries),
                Fetched::Entries(Err(err)) => {
                    log_warn!("Could not load guestbook : {:#}", err);
                    self.page.guestbook_entries(Vec::new());
                }
            }
        }
    }

    fn submit_guestbook(&mut self) {
        let form = match self.page.read_guestbook_form() {
            Ok(form) => form,
            Err(err) => {
                log_error!("Could not read guestbook form : {:#}", err);
                return;
            }
        };
        self.page.guestbook_sending();
        let tx = self.fetched_tx.clone();
        browser::spawn_local(async move {
            let cooldown = Cooldown::new(LocalStorage);
            let result = client::submit(form, &cooldown).await;
            let _ = tx.unbounded_send(Fetched::Submitted(result));
        });
    }

    fn fetch_guestbook_entries(&self) {
        let tx = self.fetched_tx.clone();
        browser::spawn_local(async move {
            let entries = client::fetch_entries().await;
            let _ = tx.unbounded_send(Fetched::Entries(entries));
        });
    }

    fn draw(&self, renderer: &Renderer) {
        let size = renderer.size();
        let screen = Rect::new(Point::default(), size);
        let camera = self.session.camera();
        let level = self.session.level();
        renderer.clear(&screen);

        // world rect is bottom-left anchored around the level center
        let level_rect = Rect::new(
            Point::new(-level.width / 2.0, -level.height / 2.0),
            Size::new(level.width, level.height),
        );
        let level_on_canvas = camera.world_rect_to_canvas(&level_rect);
        renderer.fill_rect(&screen, &level.background_color, 1.0);
        if let Some(background) = self.assets.backgrounds.get(&level.id) {
            let source = Rect::new(
                Point::default(),
                Size::new(background.natural_width() as f64, background.natural_height() as f64),
            );
            renderer.draw_image(background, &source, &level_on_canvas, false);
        }

        self.session.regions().draw(renderer, camera);
        self.session.npcs().draw(renderer, camera, &self.assets.npc_sheets);
        self.session.avatar().draw(renderer, camera, &self.assets.avatar);

        #[cfg(debug_assertions)]
        {
            level_on_canvas.draw_debug(renderer);
            if let Some(pointer) = self.session.pointer() {
                renderer.fill_text(
                    &format!("x {:.0} y {:.0}", pointer.x, pointer.y),
                    Point::new(12.0, 24.0),
                    "#ffffff",
                );
            }
        }

        let cover = self.session.view_cover();
        if cover > 0.0 {
            renderer.fill_rect(&screen, "#000000", cover);
        }
    }
}

async fn load_level_assets(request: AssetRequest) -> Fetched {
    let sprites = join_all(request.npc_sprites.iter().map(|source| async move {
        load_optional(source)
            .await
            .map(|image| (source.clone(), image))
    }))
    .await
    .into_iter()
    .flatten()
    .collect();
    let background = engine::load_image(&request.background)
        .await
        .with_context(|| format!("Failed to load background : {}", request.background));
    Fetched::Level {
        level_id: request.level_id,
        background,
        sprites,
    }
}
