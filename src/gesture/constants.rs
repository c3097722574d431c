//! Fixed thresholds for touch-driven page flips.
//!
//! These are deliberately not user-configurable. Distances are in device
//! pixels, velocities in pixels per millisecond.

/// Displacement a contact must exceed before it becomes a peel.
///
/// Below this a release is treated as a tap.
pub const DRAG_THRESHOLD: f32 = 8.0;

/// Fraction of the page width a peel must travel to commit a flip.
pub const FLIP_TRIGGER: f32 = 0.18;

/// Smoothed horizontal velocity above which a peel commits regardless of distance.
pub const FLING_VELOCITY: f32 = 0.45;

/// Width fraction of the touch container assigned to the "previous" tap zone.
/// The remainder belongs to "next"; there is no dead strip.
pub const TAP_ZONE: f32 = 0.50;

/// Weight kept from the previous velocity sample on each move.
pub const VELOCITY_RETAIN: f32 = 0.7;

/// How far past the start, in page widths, a committed peel is released.
pub const COMMIT_OVERSHOOT: f32 = 1.5;

/// Synthetic pressure at the start of a peel.
pub const BASE_PRESSURE: f32 = 0.5;
