//! Per-contact gesture tracking

use serde::{Deserialize, Serialize};

use super::constants::{BASE_PRESSURE, DRAG_THRESHOLD, FLING_VELOCITY, FLIP_TRIGGER, VELOCITY_RETAIN};
use crate::geometry::Point;

/// A single touch contact in client coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub x: f32,
    pub y: f32,
}

impl Touch {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Horizontal swipe direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
    #[default]
    None,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
            SwipeDirection::None => "none",
        }
    }
}

/// Live state of the tracked contact.
///
/// Created at touch-start, updated on every move and discarded at
/// touch-end/cancel. Times are milliseconds on the host's monotonic clock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureState {
    pub start_x: f32,
    pub start_y: f32,
    pub current_x: f32,
    pub current_y: f32,
    pub delta_x: f32,
    pub delta_y: f32,
    /// Smoothed horizontal speed in px/ms
    pub velocity: f32,
    pub direction: SwipeDirection,
    pub is_dragging: bool,
    /// Signed fraction of the page width, always within [-1, 1]
    pub drag_progress: f32,
    pub start_time: f64,
    pub last_time: f64,
}

impl GestureState {
    #[must_use]
    pub fn begin(touch: Touch, now_ms: f64) -> Self {
        Self {
            start_x: touch.x,
            start_y: touch.y,
            current_x: touch.x,
            current_y: touch.y,
            start_time: now_ms,
            last_time: now_ms,
            ..Self::default()
        }
    }

    /// Fold a move sample into the state: deltas, velocity and direction.
    pub fn track(&mut self, touch: Touch, now_ms: f64) {
        let elapsed = (now_ms - self.last_time) as f32;

        self.current_x = touch.x;
        self.current_y = touch.y;
        self.delta_x = touch.x - self.start_x;
        self.delta_y = touch.y - self.start_y;

        if elapsed > 0.0 {
            // Whole horizontal travel over the latest interval
            let instant = self.delta_x.abs() / elapsed;
            self.velocity = self.velocity * VELOCITY_RETAIN + instant * (1.0 - VELOCITY_RETAIN);
        }

        // Mostly-vertical movement keeps whatever direction was seen last
        if self.delta_x.abs() > self.delta_y.abs() {
            self.direction = if self.delta_x > 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            };
        }

        self.last_time = now_ms;
    }

    /// Euclidean distance from the start point
    #[must_use]
    pub fn displacement(&self) -> f32 {
        (self.delta_x * self.delta_x + self.delta_y * self.delta_y).sqrt()
    }

    #[must_use]
    pub fn exceeds_drag_threshold(&self) -> bool {
        self.displacement() > DRAG_THRESHOLD
    }

    pub fn refresh_progress(&mut self, page_width: f32) {
        self.drag_progress = drag_progress(self.delta_x, page_width);
    }

    /// Whether releasing now should turn the page
    #[must_use]
    pub fn should_commit(&self) -> bool {
        self.passes_distance() || self.passes_fling()
    }

    #[must_use]
    pub fn passes_distance(&self) -> bool {
        self.drag_progress.abs() > FLIP_TRIGGER
    }

    #[must_use]
    pub fn passes_fling(&self) -> bool {
        self.velocity > FLING_VELOCITY
    }

    #[must_use]
    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    #[must_use]
    pub fn current(&self) -> Point {
        Point::new(self.current_x, self.current_y)
    }
}

/// `clamp(delta_x / page_width, -1, 1)`, or 0 without a usable page width
#[must_use]
pub fn drag_progress(delta_x: f32, page_width: f32) -> f32 {
    if !(page_width > 0.0) || !delta_x.is_finite() {
        return 0.0;
    }
    (delta_x / page_width).clamp(-1.0, 1.0)
}

/// Pressure reported while peeling: 0.5 at rest, up to 1.0 at full progress
#[must_use]
pub fn peel_pressure(progress: f32) -> f32 {
    (BASE_PRESSURE + progress.abs() * (1.0 - BASE_PRESSURE)).min(1.0)
}
