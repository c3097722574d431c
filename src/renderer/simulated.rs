//! Headless page-flip engine
//!
//! Models the externally owned renderer closely enough to drive the crate
//! end to end without a browser: it mounts one interaction surface, reacts to
//! pointer input, runs timed flips and reports completed page changes.

use log::debug;

use super::{
    BookEngine, Corner, DEFAULT_CORNER_DIVISOR, EngineError, FlipEngine, Orientation, Primitive,
    corner_hit, page_under,
};
use crate::bridge::{InputSink, PointerEvent, PointerPhase, SurfaceKind, SurfaceProbe};
use crate::geometry::{Point, Rect};

/// Construction-time engine options
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Length of a full page turn
    pub flipping_time_ms: f64,
    /// Render the first and last pages as hard covers
    pub show_cover: bool,
    /// Peak opacity of the fold shadow (0.0 - 1.0)
    pub max_shadow_opacity: f32,
    /// Surface the engine mounts for pointer input, if any
    pub surface: Option<SurfaceKind>,
    /// Whether internal primitives (page rect, frame animation, point flips,
    /// jumps) are reachable. Older engine builds hide them.
    pub expose_internals: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flipping_time_ms: 1000.0,
            show_cover: true,
            max_shadow_opacity: 0.5,
            surface: Some(SurfaceKind::Wrapper),
            expose_internals: true,
        }
    }
}

/// Engine activity log entry, for inspection by hosts and tests
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCall {
    Pointer(PointerEvent),
    DefaultCornerTest(Point),
    DefaultAnimate {
        from: Point,
        to: Point,
        turned: bool,
        needs_reset: bool,
    },
    PlayFrames {
        count: usize,
        last: Option<Point>,
        duration_ms: f64,
    },
    FlipFromPoint {
        at: Point,
        corner: Corner,
    },
    JumpTo(usize),
    DefaultFlipToIndex(usize),
    FlipStarted {
        from: usize,
        to: usize,
    },
    FlipIgnored(usize),
}

#[derive(Clone, Copy, Debug)]
struct Flip {
    target: usize,
    started_at: Option<f64>,
}

#[derive(Debug)]
pub struct SimulatedEngine {
    config: EngineConfig,
    ready: bool,
    page_count: usize,
    current: usize,
    bounds: Rect,
    orientation: Orientation,
    flip: Option<Flip>,
    grab: Option<Point>,
    fold: Option<Point>,
    calls: Vec<EngineCall>,
}

impl SimulatedEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ready: false,
            page_count: 0,
            current: 0,
            bounds: Rect::default(),
            orientation: Orientation::default(),
            flip: None,
            grab: None,
            fold: None,
            calls: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_flipping(&self) -> bool {
        self.flip.is_some()
    }

    /// Current fold point of a pointer-driven peel
    pub fn fold(&self) -> Option<Point> {
        self.fold
    }

    /// Covers are stiff boards when `show_cover` is set
    pub fn is_hard_page(&self, index: usize) -> bool {
        self.config.show_cover && (index == 0 || index + 1 == self.page_count)
    }

    /// Opacity of the fold shadow right now: grows with how far the peel has
    /// travelled, up to `max_shadow_opacity` at a full page width.
    pub fn shadow_opacity(&self) -> f32 {
        let (Some(grab), Some(fold)) = (self.grab, self.fold) else {
            return 0.0;
        };
        let page_width = self.page_width();
        if page_width <= 0.0 {
            return 0.0;
        }
        let travel = ((fold.x - grab.x).abs() / page_width).min(1.0);
        self.config.max_shadow_opacity.clamp(0.0, 1.0) * travel
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }

    fn start_flip(&mut self, target: usize) -> Result<(), EngineError> {
        if self.flip.is_some() {
            self.calls.push(EngineCall::FlipIgnored(target));
            return Err(EngineError::rejected("flip already running"));
        }
        if target >= self.page_count || target == self.current {
            self.calls.push(EngineCall::FlipIgnored(target));
            return Err(EngineError::rejected(format!("no page {target} to turn to")));
        }
        self.calls.push(EngineCall::FlipStarted {
            from: self.current,
            to: target,
        });
        self.flip = Some(Flip {
            target,
            started_at: None,
        });
        Ok(())
    }

    fn release_grab(&mut self, at: Point) {
        let Some(grab) = self.grab.take() else {
            return;
        };
        self.fold = None;

        // A release more than half a page away from the grab turns the page
        let travel = at.x - grab.x;
        if travel.abs() <= self.page_width() / 2.0 {
            return;
        }

        let target = if travel < 0.0 {
            self.current.checked_add(1)
        } else {
            self.current.checked_sub(1)
        };
        if let Some(target) = target {
            let _ = self.start_flip(target);
        }
    }

    fn page_width(&self) -> f32 {
        match self.orientation {
            Orientation::Portrait => self.bounds.width,
            Orientation::Landscape => self.bounds.width / 2.0,
        }
    }

    fn require_internals(&self, name: &'static str) -> Result<(), EngineError> {
        if !self.ready {
            return Err(EngineError::NotReady);
        }
        if !self.config.expose_internals {
            return Err(EngineError::Unsupported(name));
        }
        Ok(())
    }
}

impl FlipEngine for SimulatedEngine {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn current_index(&self) -> usize {
        self.current
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn default_corner_test(&self, at: Point) -> bool {
        let page = page_under(self.bounds, self.orientation, at);
        corner_hit(page, at, DEFAULT_CORNER_DIVISOR)
    }

    fn default_animate(&mut self, from: Point, to: Point, turned: bool, needs_reset: bool) {
        self.calls.push(EngineCall::DefaultAnimate {
            from,
            to,
            turned,
            needs_reset,
        });
    }

    fn default_flip_to_index(&mut self, index: usize, _corner: Corner) {
        self.calls.push(EngineCall::DefaultFlipToIndex(index));
        // The stock router cannot turn backwards on a single page
        if self.orientation == Orientation::Portrait && index < self.current {
            self.calls.push(EngineCall::FlipIgnored(index));
            return;
        }
        let _ = self.start_flip(index);
    }

    fn advance(&mut self, now_ms: f64) -> Option<usize> {
        let flip = self.flip.as_mut()?;
        let started = *flip.started_at.get_or_insert(now_ms);
        if now_ms - started < self.config.flipping_time_ms {
            return None;
        }

        let target = flip.target;
        self.flip = None;
        self.current = target;
        Some(target)
    }

    fn supports(&self, _primitive: Primitive) -> bool {
        self.config.expose_internals
    }

    fn page_rect(&self) -> Result<Rect, EngineError> {
        self.require_internals("page_rect")?;
        Ok(self.bounds)
    }

    fn animation_duration(&self, frames: usize) -> Result<f64, EngineError> {
        self.require_internals("animation_duration")?;
        // Longer folds take proportionally longer, capped at a full turn
        let full = self.config.flipping_time_ms;
        Ok(if frames >= 1000 {
            full
        } else {
            frames as f64 / 1000.0 * full
        })
    }

    fn play_frames(&mut self, frames: Vec<Point>, duration_ms: f64) -> Result<(), EngineError> {
        self.require_internals("play_frames")?;
        self.calls.push(EngineCall::PlayFrames {
            count: frames.len(),
            last: frames.last().copied(),
            duration_ms,
        });
        Ok(())
    }

    fn flip_from_point(&mut self, at: Point, corner: Corner) -> Result<(), EngineError> {
        self.require_internals("flip_from_point")?;
        self.calls.push(EngineCall::FlipFromPoint { at, corner });

        let backward = at.x < self.bounds.center().x;
        let target = if backward {
            self.current
                .checked_sub(1)
                .ok_or_else(|| EngineError::rejected("already at first page"))?
        } else {
            self.current + 1
        };
        self.start_flip(target)
    }

    fn jump_to(&mut self, index: usize) -> Result<(), EngineError> {
        self.require_internals("jump_to")?;
        if self.flip.is_some() {
            return Err(EngineError::rejected("flip already running"));
        }
        if index >= self.page_count {
            return Err(EngineError::rejected(format!("no page {index}")));
        }
        self.calls.push(EngineCall::JumpTo(index));
        self.current = index;
        Ok(())
    }
}

impl BookEngine for SimulatedEngine {
    fn mount(
        &mut self,
        page_count: usize,
        start_page: usize,
        bounds: Rect,
        orientation: Orientation,
    ) {
        self.page_count = page_count;
        self.current = start_page.min(page_count.saturating_sub(1));
        self.bounds = bounds;
        self.orientation = orientation;
        self.flip = None;
        self.grab = None;
        self.fold = None;
        self.ready = page_count > 0;
        debug!(
            "Engine mounted: {page_count} pages at page {}, {orientation:?} {bounds:?}",
            self.current
        );
    }

    fn unmount(&mut self) {
        self.ready = false;
        self.page_count = 0;
        self.current = 0;
        self.flip = None;
        self.grab = None;
        self.fold = None;
    }
}

impl InputSink for SimulatedEngine {
    fn dispatch(&mut self, event: &PointerEvent) {
        self.calls.push(EngineCall::Pointer(*event));
        let at = event.position();

        match event.phase {
            PointerPhase::Down => {
                if self.flip.is_none() && self.bounds.contains(at) {
                    self.grab = Some(at);
                    self.fold = Some(at);
                }
            }
            PointerPhase::Move => {
                if let Some(grab) = self.grab {
                    // A hard page turns flat about the spine instead of curling
                    self.fold = Some(if self.is_hard_page(self.current) {
                        Point::new(at.x, grab.y)
                    } else {
                        at
                    });
                }
            }
            PointerPhase::Up => self.release_grab(at),
            PointerPhase::Cancel => {
                self.grab = None;
                self.fold = None;
            }
        }
    }
}

impl SurfaceProbe for SimulatedEngine {
    fn surface(&mut self, kind: SurfaceKind) -> Option<&mut dyn InputSink> {
        if self.ready && self.config.surface == Some(kind) {
            Some(self as &mut dyn InputSink)
        } else {
            None
        }
    }
}
