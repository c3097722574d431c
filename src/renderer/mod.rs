//! Page-flip renderer boundary
//!
//! [`FlipEngine`] describes the primitives of the external physics renderer.
//! Hosts wrap their engine in [`PatchedRenderer`] and talk to it only through
//! the narrow [`PageFlipRenderer`] interface.

mod patch;
mod simulated;

use serde::{Deserialize, Serialize};

use crate::bridge::SurfaceProbe;
use crate::geometry::{Point, Rect};

pub use patch::{
    CORNER_INSET, DEFAULT_CORNER_DIVISOR, HOVER_MAX_FRAMES, HOVER_MIN_FRAMES, HOVER_SLOWDOWN,
    PatchSet, PatchedRenderer, TIGHT_CORNER_DIVISOR, corner_hit, ease_out_cubic, hover_frames,
    page_under,
};
pub use simulated::{EngineCall, EngineConfig, SimulatedEngine};

/// Errors from engine primitives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine does not expose {0}")]
    Unsupported(&'static str),

    #[error("engine is not initialised")]
    NotReady,

    #[error("engine rejected request: {detail}")]
    Rejected { detail: String },
}

impl EngineError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected { detail: msg.into() }
    }
}

/// Page layout the engine is currently using
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// One page visible
    Portrait,
    /// Two-page spread
    #[default]
    Landscape,
}

/// Which edge of the page a programmatic flip grabs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    #[default]
    Top,
    Bottom,
}

/// Engine primitives an optional patch can depend on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    PageRect,
    FrameAnimation,
    FlipFromPoint,
    JumpTo,
}

/// The external page-flip engine.
///
/// Required methods are the engine's public behaviour. The rest are internals
/// that only some engine versions expose; their defaults report
/// [`EngineError::Unsupported`] so callers can fall back.
pub trait FlipEngine {
    /// Whether the engine finished initialising
    fn is_ready(&self) -> bool;

    fn orientation(&self) -> Orientation;

    fn current_index(&self) -> usize;

    fn page_count(&self) -> usize;

    /// The engine's own, coarse corner test
    fn default_corner_test(&self, at: Point) -> bool;

    /// The engine's own corner preview / turn animation
    fn default_animate(&mut self, from: Point, to: Point, turned: bool, needs_reset: bool);

    /// The engine's own page router
    fn default_flip_to_index(&mut self, index: usize, corner: Corner);

    /// Feed time to the engine; returns any completed page change
    fn advance(&mut self, _now_ms: f64) -> Option<usize> {
        None
    }

    fn supports(&self, _primitive: Primitive) -> bool {
        false
    }

    /// Bounds of the visible page area in client coordinates
    fn page_rect(&self) -> Result<Rect, EngineError> {
        Err(EngineError::Unsupported("page_rect"))
    }

    /// Base duration (ms) the engine would use for an animation of `frames` steps
    fn animation_duration(&self, _frames: usize) -> Result<f64, EngineError> {
        Err(EngineError::Unsupported("animation_duration"))
    }

    /// Play an explicit sequence of fold points over `duration_ms`
    fn play_frames(&mut self, _frames: Vec<Point>, _duration_ms: f64) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("play_frames"))
    }

    /// Start a flip as if the user grabbed the page at `at`
    fn flip_from_point(&mut self, _at: Point, _corner: Corner) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("flip_from_point"))
    }

    /// Show `index` immediately, without animation
    fn jump_to(&mut self, _index: usize) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("jump_to"))
    }
}

/// Narrow interface the rest of the crate uses to drive a renderer
pub trait PageFlipRenderer {
    fn is_point_in_corner(&self, at: Point) -> bool;

    fn preview_hover(&mut self, from: Point, to: Point, turned: bool, needs_reset: bool);

    fn flip_to_point(&mut self, at: Point, corner: Corner);

    fn flip_to_index(&mut self, index: usize, corner: Corner);
}

/// An engine the host can (re)build for a document and layout, and that
/// accepts pointer input on its surfaces
pub trait BookEngine: FlipEngine + SurfaceProbe {
    /// Create the book: page count, on-screen bounds and layout
    fn mount(&mut self, page_count: usize, start_page: usize, bounds: Rect, orientation: Orientation);

    fn unmount(&mut self);
}
