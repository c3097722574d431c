//! Host wiring for a touch-driven flipbook
//!
//! [`Flipbook`] owns one of each component and routes between them: touch
//! input goes through the recognizer, its signals become synthetic pointers
//! and navigation requests, navigation effects drive the renderer, and the
//! renderer's page-change reports flow back into navigation.

use log::{debug, info, warn};

use crate::bridge::SyntheticPointerBridge;
use crate::event_source::{InputEvent, TimedEvent};
use crate::geometry::{Point, Rect};
use crate::gesture::{BASE_PRESSURE, GestureOutcome, GestureRecognizer, Signal};
use crate::layout::{Chrome, Layout, LayoutResolver, PageSize, SpreadMode, Viewport};
use crate::navigation::{Command, Effect, NavigationController};
use crate::renderer::{
    BookEngine, Corner, EngineConfig, Orientation, PageFlipRenderer, PatchedRenderer, page_under,
};
use crate::settings;

/// Pressure reported while a committed peel is carried off the page
const COMMIT_PRESSURE: f32 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    #[error("playback blocked until the user interacts with the page")]
    Blocked,
}

/// The page-turn sound
pub trait SoundCue {
    /// Rewind to the start and play
    fn restart(&mut self) -> Result<(), AudioError>;
}

/// A cue that plays nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSound;

impl SoundCue for NoSound {
    fn restart(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// User-facing flipbook options
#[derive(Clone, Debug, PartialEq)]
pub struct FlipbookConfig {
    pub flip_speed_ms: u32,
    pub hard_cover: bool,
    pub use_sound: bool,
    /// 0-100
    pub shadow_intensity: u8,
    pub chrome: Chrome,
}

impl Default for FlipbookConfig {
    fn default() -> Self {
        let defaults = settings::Settings::default();
        Self {
            flip_speed_ms: defaults.flip_speed_ms,
            hard_cover: defaults.hard_cover,
            use_sound: defaults.use_sound,
            shadow_intensity: defaults.shadow_intensity,
            chrome: Chrome::default(),
        }
    }
}

impl FlipbookConfig {
    /// Snapshot of the loaded settings
    pub fn from_settings() -> Self {
        Self {
            flip_speed_ms: settings::get_flip_speed_ms(),
            hard_cover: settings::is_hard_cover(),
            use_sound: settings::is_sound_enabled(),
            shadow_intensity: settings::get_shadow_intensity(),
            chrome: Chrome::default(),
        }
    }

    pub fn max_shadow_opacity(&self) -> f32 {
        f32::from(self.shadow_intensity.min(100)) / 100.0 * 0.5
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            flipping_time_ms: f64::from(self.flip_speed_ms),
            show_cover: self.hard_cover,
            max_shadow_opacity: self.max_shadow_opacity(),
            ..EngineConfig::default()
        }
    }
}

/// Things the host shell may want to show
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// A touch gesture finished
    Gesture(GestureOutcome),
    PageChanged { page: usize, total: usize },
    /// The book was (re)laid out and mounted
    Mounted { layout: Layout, bounds: Rect },
}

pub struct Flipbook<E, S> {
    config: FlipbookConfig,
    recognizer: GestureRecognizer,
    bridge: SyntheticPointerBridge,
    nav: NavigationController,
    renderer: PatchedRenderer<E>,
    layout: LayoutResolver,
    sound: S,
    page_count: usize,
    bounds: Option<Rect>,
    hover: Option<Point>,
    now_ms: f64,
}

impl<E: BookEngine, S: SoundCue> Flipbook<E, S> {
    pub fn new(engine: E, sound: S, config: FlipbookConfig) -> Self {
        let mut nav = NavigationController::default();
        let _ = nav.apply(Command::SetSound(config.use_sound));
        let _ = nav.apply(Command::SetFlipDuration(f64::from(config.flip_speed_ms)));

        let mut recognizer = GestureRecognizer::new();
        recognizer.set_enabled(false);

        Self {
            layout: LayoutResolver::new(config.chrome),
            config,
            recognizer,
            bridge: SyntheticPointerBridge::new(),
            nav,
            renderer: PatchedRenderer::new(engine),
            sound,
            page_count: 0,
            bounds: None,
            hover: None,
            now_ms: 0.0,
        }
    }

    pub fn config(&self) -> &FlipbookConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    pub fn bridge(&self) -> &SyntheticPointerBridge {
        &self.bridge
    }

    pub fn renderer(&self) -> &PatchedRenderer<E> {
        &self.renderer
    }

    pub fn engine(&self) -> &E {
        self.renderer.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.renderer.engine_mut()
    }

    pub fn layout(&self) -> Option<Layout> {
        self.layout.layout()
    }

    pub fn sound(&self) -> &S {
        &self.sound
    }

    pub fn current_page(&self) -> usize {
        self.nav.current_page()
    }

    /// Screen area the book occupies, once mounted
    pub fn book_bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn handle(&mut self, event: TimedEvent) -> Vec<Notice> {
        self.handle_event(event.at, event.event)
    }

    pub fn handle_event(&mut self, now_ms: f64, event: InputEvent) -> Vec<Notice> {
        self.now_ms = now_ms;
        let mut notices = Vec::new();

        match event {
            InputEvent::TouchStart { touches } => {
                let signals = self.recognizer.on_touch_start(&touches, now_ms);
                self.run_signals(signals, &mut notices);
            }
            InputEvent::TouchMove { touches } => {
                let signals = self.recognizer.on_touch_move(&touches, now_ms);
                self.run_signals(signals, &mut notices);
            }
            InputEvent::TouchEnd => {
                let release = self.recognizer.on_touch_end(now_ms);
                if release.outcome != GestureOutcome::Ignored {
                    notices.push(Notice::Gesture(release.outcome));
                }
                self.run_signals(release.signals, &mut notices);
            }
            InputEvent::TouchCancel => {
                let release = self.recognizer.on_touch_cancel();
                if release.outcome != GestureOutcome::Ignored {
                    notices.push(Notice::Gesture(release.outcome));
                }
                self.run_signals(release.signals, &mut notices);
            }
            InputEvent::Frame => {
                let signals = self.recognizer.on_frame();
                self.run_signals(signals, &mut notices);
            }
            InputEvent::Prev => {
                let effects = self.nav.handle_prev(now_ms);
                self.run_effects(effects, &mut notices);
            }
            InputEvent::Next => {
                let effects = self.nav.handle_next(now_ms);
                self.run_effects(effects, &mut notices);
            }
            InputEvent::Jump { page } => {
                let effects = self.nav.go_to_page(page, now_ms);
                self.run_effects(effects, &mut notices);
            }
            InputEvent::Hover { x, y } => self.hover(Point::new(x, y)),
            InputEvent::Resize { width, height } => {
                self.layout.resize(Viewport::new(width, height));
                self.remount(self.nav.current_page(), &mut notices);
            }
            InputEvent::DocumentLoaded {
                pages,
                page_width,
                page_height,
            } => self.load_document(pages, PageSize::new(page_width, page_height), &mut notices),
            InputEvent::DocumentChanged => self.close_document(),
            InputEvent::PageFlipped { page } => {
                let effects = self.nav.page_flipped(page);
                self.run_effects(effects, &mut notices);
            }
        }

        self.pump(&mut notices);
        notices
    }

    fn load_document(&mut self, pages: usize, first_page: PageSize, notices: &mut Vec<Notice>) {
        self.close_document();
        info!("Document loaded: {pages} pages, first page {first_page:?}");

        self.page_count = pages;
        let _ = self.nav.apply(Command::SetTotalPages(pages));
        self.layout.set_first_page(first_page);
        self.remount(0, notices);
    }

    fn close_document(&mut self) {
        self.abort_gesture();
        self.layout.document_changed();
        let _ = self.nav.apply(Command::Reset);
        self.renderer.engine_mut().unmount();
        self.renderer.reset_patches();
        self.page_count = 0;
        self.bounds = None;
        self.hover = None;
        self.sync_recognizer();
    }

    fn remount(&mut self, start_page: usize, notices: &mut Vec<Notice>) {
        let (Some(layout), Some(viewport)) = (self.layout.layout(), self.layout.viewport()) else {
            self.sync_recognizer();
            return;
        };
        if self.page_count == 0 {
            self.sync_recognizer();
            return;
        }

        self.abort_gesture();
        let (width, height) = layout.footprint();
        let bounds = Rect::new(
            (viewport.width - width) / 2.0,
            (viewport.height - height) / 2.0,
            width,
            height,
        );
        let orientation = match layout.mode {
            SpreadMode::Single => Orientation::Portrait,
            SpreadMode::Spread => Orientation::Landscape,
        };

        self.renderer
            .engine_mut()
            .mount(self.page_count, start_page, bounds, orientation);
        self.renderer.reset_patches();
        let patches = self.renderer.install();
        debug!("Mounted {orientation:?} book at {bounds:?}, patches {patches:?}");

        // A fresh engine has no flip running
        let effects = self.nav.page_flipped(self.nav.current_page());
        self.run_effects(effects, notices);

        self.bounds = Some(bounds);
        self.hover = None;
        self.sync_recognizer();
        notices.push(Notice::Mounted { layout, bounds });
    }

    fn sync_recognizer(&mut self) {
        let ready = self.page_count > 0 && self.bounds.is_some();
        if !ready {
            self.abort_gesture();
        }
        self.recognizer.set_enabled(ready);
        self.recognizer.set_page_width(self.layout.page_width());
        self.recognizer.set_container(self.bounds);
    }

    /// Drop any gesture in progress, releasing a pressed pointer
    fn abort_gesture(&mut self) {
        if self.bridge.is_pressed() {
            let at = self.recognizer.state().current();
            self.bridge.cancel(self.renderer.engine_mut(), at);
        }
        let _ = self.recognizer.on_touch_cancel();
    }

    fn hover(&mut self, at: Point) {
        let Some(bounds) = self.bounds else {
            return;
        };

        if self.renderer.is_point_in_corner(at) {
            let orientation = self.renderer.engine().orientation();
            let corner = page_under(bounds, orientation, at).nearest_corner(at);
            self.renderer.preview_hover(corner, at, false, false);
            self.hover = Some(corner);
        } else if let Some(corner) = self.hover.take() {
            // Fold the preview back into its corner
            self.renderer.preview_hover(at, corner, false, true);
        }
    }

    fn run_signals(&mut self, signals: Vec<Signal>, notices: &mut Vec<Notice>) {
        for signal in signals {
            match signal {
                // Nothing scrolls underneath a headless book
                Signal::SuppressScroll | Signal::DragEnd => {}
                Signal::DragStart { origin } => {
                    self.bridge
                        .press(self.renderer.engine_mut(), origin, BASE_PRESSURE);
                }
                Signal::DragUpdate { at, pressure } => {
                    self.bridge.drag(self.renderer.engine_mut(), at, pressure);
                }
                Signal::DragCommit { release } => {
                    self.bridge
                        .drag(self.renderer.engine_mut(), release, COMMIT_PRESSURE);
                    self.bridge.release(self.renderer.engine_mut(), release);
                }
                Signal::DragCancel { origin } => {
                    self.bridge.drag(self.renderer.engine_mut(), origin, 0.0);
                    self.bridge.release(self.renderer.engine_mut(), origin);
                }
                Signal::PointerCancel { at } => {
                    self.bridge.cancel(self.renderer.engine_mut(), at);
                }
                Signal::FlipNext => {
                    let effects = self.nav.handle_next(self.now_ms);
                    self.run_effects(effects, notices);
                }
                Signal::FlipPrev => {
                    let effects = self.nav.handle_prev(self.now_ms);
                    self.run_effects(effects, notices);
                }
            }
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>, notices: &mut Vec<Notice>) {
        for effect in effects {
            match effect {
                Effect::PlayPageTurn => {
                    if let Err(e) = self.sound.restart() {
                        warn!("Page turn sound failed: {e}");
                    }
                }
                Effect::FlipTo(index) => self.renderer.flip_to_index(index, Corner::Top),
                Effect::PageChanged(page) => notices.push(Notice::PageChanged {
                    page,
                    total: self.nav.total_pages(),
                }),
            }
        }
    }

    /// Let the engine run and collect finished flips
    fn pump(&mut self, notices: &mut Vec<Notice>) {
        if let Some(page) = self.renderer.engine_mut().advance(self.now_ms) {
            let effects = self.nav.page_flipped(page);
            self.run_effects(effects, notices);
        }
        let _ = self.nav.apply(Command::Tick {
            now_ms: self.now_ms,
        });
    }
}
