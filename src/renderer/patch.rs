//! Behavioural refinements layered over a [`FlipEngine`]

use log::debug;

use super::{Corner, EngineError, FlipEngine, Orientation, PageFlipRenderer, Primitive};
use crate::geometry::{Point, Rect};

/// Corner radius divisor the engine uses out of the box (diagonal / 5)
pub const DEFAULT_CORNER_DIVISOR: f32 = 5.0;
/// Tightened corner radius divisor (diagonal / 9)
pub const TIGHT_CORNER_DIVISOR: f32 = 9.0;
/// Lower bound on hover preview frames
pub const HOVER_MIN_FRAMES: usize = 16;
/// Upper bound on hover preview frames, one full turn's worth
pub const HOVER_MAX_FRAMES: usize = 1000;
/// Hover previews run this much longer than the engine's base duration
pub const HOVER_SLOWDOWN: f64 = 1.7;
/// Distance from the page edge of a programmatic grab point
pub const CORNER_INSET: f32 = 10.0;

/// Which refinements are active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchSet {
    pub corner_hit: bool,
    pub hover_easing: bool,
    pub flip_targeting: bool,
}

impl PatchSet {
    pub const fn all() -> Self {
        Self {
            corner_hit: true,
            hover_easing: true,
            flip_targeting: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.corner_hit || self.hover_easing || self.flip_targeting)
    }
}

/// Is `at` inside `rect` and within `diagonal / divisor` of one of its corners?
#[must_use]
pub fn corner_hit(rect: Rect, at: Point, divisor: f32) -> bool {
    if rect.is_empty() || divisor <= 0.0 || !rect.contains(at) {
        return false;
    }
    rect.nearest_corner(at).distance_to(at) <= rect.diagonal() / divisor
}

/// The single page of `book` that `at` falls on.
///
/// A spread is split at its spine; a portrait book is one page already.
#[must_use]
pub fn page_under(book: Rect, orientation: Orientation, at: Point) -> Rect {
    match orientation {
        Orientation::Portrait => book,
        Orientation::Landscape => {
            let half = book.width / 2.0;
            let left = if at.x < book.left + half {
                book.left
            } else {
                book.left + half
            };
            Rect::new(left, book.top, half, book.height)
        }
    }
}

#[must_use]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Eased fold points from `from` to `to`, one per frame, ending exactly at `to`.
#[must_use]
pub fn hover_frames(from: Point, to: Point) -> Vec<Point> {
    let span = (to.x - from.x).abs().max((to.y - from.y).abs());
    // NaN casts to 0 and lands on the minimum
    let count = (span.ceil() as usize).clamp(HOVER_MIN_FRAMES, HOVER_MAX_FRAMES);

    (1..=count)
        .map(|i| from.lerp(to, ease_out_cubic(i as f32 / count as f32)))
        .collect()
}

/// A [`FlipEngine`] with the corner, hover and flip-targeting refinements.
///
/// Patches are installed once the engine reports ready, each only if the
/// engine exposes what it needs. A patch that fails at call time falls back
/// to the engine's own behaviour for that call.
#[derive(Debug)]
pub struct PatchedRenderer<E> {
    engine: E,
    installed: PatchSet,
}

impl<E: FlipEngine> PatchedRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            installed: PatchSet::default(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn installed(&self) -> PatchSet {
        self.installed
    }

    /// Install whatever patches the engine can support now.
    ///
    /// Safe to call repeatedly; returns only the patches installed by this call.
    pub fn install(&mut self) -> PatchSet {
        let mut added = PatchSet::default();
        if !self.engine.is_ready() {
            debug!("Renderer not ready, deferring patches");
            return added;
        }

        if !self.installed.corner_hit && self.engine.supports(Primitive::PageRect) {
            self.installed.corner_hit = true;
            added.corner_hit = true;
        }
        if !self.installed.hover_easing && self.engine.supports(Primitive::FrameAnimation) {
            self.installed.hover_easing = true;
            added.hover_easing = true;
        }
        if !self.installed.flip_targeting
            && self.engine.supports(Primitive::FlipFromPoint)
            && self.engine.supports(Primitive::PageRect)
        {
            self.installed.flip_targeting = true;
            added.flip_targeting = true;
        }

        if added.is_empty() {
            debug!("No new renderer patches installed ({:?})", self.installed);
        } else {
            debug!("Installed renderer patches {added:?}");
        }
        added
    }

    /// Forget installed patches, e.g. after the engine was recreated
    pub fn reset_patches(&mut self) {
        self.installed = PatchSet::default();
    }

    fn eased_preview(&mut self, from: Point, to: Point) -> Result<(), EngineError> {
        let frames = hover_frames(from, to);
        let base = self.engine.animation_duration(frames.len())?;
        self.engine.play_frames(frames, base * HOVER_SLOWDOWN)
    }

    fn targeted_flip(&mut self, index: usize, corner: Corner) -> Result<(), EngineError> {
        let current = self.engine.current_index();
        if index >= self.engine.page_count() {
            return Err(EngineError::rejected(format!("page {index} out of range")));
        }
        if index == current {
            return Ok(());
        }

        let rect = self.engine.page_rect()?;
        let backward = index < current;

        // Stand next to the target so a single turn lands on it
        let neighbour = if backward { index + 1 } else { index - 1 };
        if neighbour != current {
            self.engine.jump_to(neighbour)?;
        }

        let x = if backward {
            rect.left + CORNER_INSET
        } else {
            rect.right() - CORNER_INSET
        };
        let y = match corner {
            Corner::Top => rect.top + CORNER_INSET,
            Corner::Bottom => rect.bottom() - CORNER_INSET,
        };
        self.engine.flip_from_point(Point::new(x, y), corner)
    }
}

impl<E: FlipEngine> PageFlipRenderer for PatchedRenderer<E> {
    fn is_point_in_corner(&self, at: Point) -> bool {
        if self.installed.corner_hit {
            match self.engine.page_rect() {
                Ok(book) => {
                    let page = page_under(book, self.engine.orientation(), at);
                    return corner_hit(page, at, TIGHT_CORNER_DIVISOR);
                }
                Err(e) => debug!("Corner patch unavailable: {e}"),
            }
        }
        self.engine.default_corner_test(at)
    }

    fn preview_hover(&mut self, from: Point, to: Point, turned: bool, needs_reset: bool) {
        // Only hover previews are eased; real turns keep the engine's timing
        if self.installed.hover_easing && !turned && !needs_reset {
            match self.eased_preview(from, to) {
                Ok(()) => return,
                Err(e) => debug!("Hover easing unavailable: {e}"),
            }
        }
        self.engine.default_animate(from, to, turned, needs_reset);
    }

    fn flip_to_point(&mut self, at: Point, corner: Corner) {
        if let Err(e) = self.engine.flip_from_point(at, corner) {
            debug!("Flip from ({}, {}) not started: {e}", at.x, at.y);
        }
    }

    fn flip_to_index(&mut self, index: usize, corner: Corner) {
        if self.installed.flip_targeting && self.engine.orientation() == Orientation::Portrait {
            match self.targeted_flip(index, corner) {
                Ok(()) => return,
                Err(e) => debug!("Targeted flip to {index} fell back to default: {e}"),
            }
        }
        self.engine.default_flip_to_index(index, corner);
    }
}
