//! Single-contact gesture recognizer
//!
//! Turns raw touch start/move/end/cancel into peel, flip, snap-back and tap
//! decisions. The recognizer never touches the renderer directly; every
//! handler returns the [`Signal`]s the host must carry out, in order.

use log::debug;

use super::constants::{COMMIT_OVERSHOOT, TAP_ZONE};
use super::state::{GestureState, SwipeDirection, Touch, peel_pressure};
use crate::geometry::{Point, Rect};

/// What the host must do in response to a touch event
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    /// Native scrolling must be suppressed for the current touch event
    SuppressScroll,
    /// A peel began: press the pointer at the gesture origin
    DragStart { origin: Point },
    /// Peel moved: drag the pointer
    DragUpdate { at: Point, pressure: f32 },
    /// Peel committed: drag past the page and release
    DragCommit { release: Point },
    /// Peel abandoned: drag back to the origin and release
    DragCancel { origin: Point },
    /// Contact lost mid-peel: cancel the pointer
    PointerCancel { at: Point },
    FlipNext,
    FlipPrev,
    /// The peel (if any) is over, committed or not
    DragEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapZone {
    Left,
    Right,
}

/// What pushed a committed peel over the edge
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipTrigger {
    Distance,
    Fling,
}

/// Classification of a finished gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureOutcome {
    Flip {
        direction: SwipeDirection,
        trigger: FlipTrigger,
    },
    SnapBack,
    Tap(TapZone),
    /// Touch was cancelled by the platform
    Cancelled,
    /// Nothing actionable: disabled, no start seen, or a tap on the exact seam
    Ignored,
}

/// Result of ending or cancelling a gesture
#[derive(Clone, Debug, PartialEq)]
pub struct Release {
    pub outcome: GestureOutcome,
    pub signals: Vec<Signal>,
}

impl Release {
    fn ignored() -> Self {
        Self {
            outcome: GestureOutcome::Ignored,
            signals: Vec::new(),
        }
    }
}

/// Recognizer for one contact at a time.
///
/// Move updates while peeling are coalesced into a single pending frame which
/// the host flushes with [`GestureRecognizer::on_frame`] once per display
/// refresh; a newer move replaces an unflushed one.
#[derive(Debug)]
pub struct GestureRecognizer {
    enabled: bool,
    page_width: f32,
    container: Option<Rect>,
    state: GestureState,
    tracking: bool,
    peeling: bool,
    pending_frame: Option<Point>,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            page_width: 0.0,
            container: None,
            state: GestureState::default(),
            tracking: false,
            peeling: false,
            pending_frame: None,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            self.reset();
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Page width used to normalise drag progress. Zero disables the
    /// distance trigger, leaving fling and taps.
    pub fn set_page_width(&mut self, width: f32) {
        self.page_width = if width.is_finite() { width.max(0.0) } else { 0.0 };
    }

    pub fn page_width(&self) -> f32 {
        self.page_width
    }

    /// Bounding box of the touch container, used for tap zones
    pub fn set_container(&mut self, bounds: Option<Rect>) {
        self.container = bounds;
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_peeling(&self) -> bool {
        self.peeling
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn on_touch_start(&mut self, touches: &[Touch], now_ms: f64) -> Vec<Signal> {
        if !self.enabled {
            return Vec::new();
        }
        let Some(&touch) = touches.first() else {
            return Vec::new();
        };

        // A new contact mid-peel abandons the old one; its pointer must still end
        let signals = if self.peeling {
            debug!("Touch restarted mid-peel, cancelling the open pointer");
            vec![
                Signal::PointerCancel {
                    at: self.state.current(),
                },
                Signal::DragEnd,
            ]
        } else {
            Vec::new()
        };

        self.state = GestureState::begin(touch, now_ms);
        self.tracking = true;
        self.peeling = false;
        self.pending_frame = None;
        signals
    }

    pub fn on_touch_move(&mut self, touches: &[Touch], now_ms: f64) -> Vec<Signal> {
        if !self.enabled || !self.tracking {
            return Vec::new();
        }
        let Some(&touch) = touches.first() else {
            return Vec::new();
        };

        self.state.track(touch, now_ms);
        let mut signals = Vec::new();

        if !self.state.is_dragging && self.state.exceeds_drag_threshold() {
            self.state.is_dragging = true;
            self.peeling = true;
            signals.push(Signal::SuppressScroll);
            signals.push(Signal::DragStart {
                origin: self.state.start(),
            });
            debug!(
                "Peel started at ({}, {})",
                self.state.start_x, self.state.start_y
            );
        } else if self.peeling {
            signals.push(Signal::SuppressScroll);
        }

        if self.peeling {
            self.pending_frame = Some(touch.point());
        }

        signals
    }

    /// Flush the coalesced move, if any
    pub fn on_frame(&mut self) -> Vec<Signal> {
        let Some(at) = self.pending_frame.take() else {
            return Vec::new();
        };
        if !self.peeling {
            return Vec::new();
        }

        self.state.refresh_progress(self.page_width);
        vec![Signal::DragUpdate {
            at,
            pressure: peel_pressure(self.state.drag_progress),
        }]
    }

    pub fn on_touch_end(&mut self, now_ms: f64) -> Release {
        if !self.enabled || !self.tracking {
            return Release::ignored();
        }
        self.pending_frame = None;

        let release = if self.peeling {
            self.resolve_peel()
        } else if !self.state.is_dragging {
            self.resolve_tap()
        } else {
            Release::ignored()
        };

        debug!(
            "Gesture ended after {:.0}ms: {:?}",
            now_ms - self.state.start_time,
            release.outcome
        );
        self.reset();
        release
    }

    pub fn on_touch_cancel(&mut self) -> Release {
        if !self.enabled || !self.tracking {
            self.reset();
            return Release::ignored();
        }
        self.pending_frame = None;

        let release = if self.peeling {
            Release {
                outcome: GestureOutcome::Cancelled,
                signals: vec![
                    Signal::PointerCancel {
                        at: self.state.current(),
                    },
                    Signal::DragEnd,
                ],
            }
        } else {
            Release {
                outcome: GestureOutcome::Cancelled,
                signals: Vec::new(),
            }
        };

        self.reset();
        release
    }

    fn resolve_peel(&self) -> Release {
        let state = &self.state;
        let direction = state.direction;

        if state.should_commit() && direction != SwipeDirection::None {
            let overshoot = self.page_width * COMMIT_OVERSHOOT;
            let release_x = match direction {
                SwipeDirection::Right => state.start_x + overshoot,
                _ => state.start_x - overshoot,
            };
            let trigger = if state.passes_distance() {
                FlipTrigger::Distance
            } else {
                FlipTrigger::Fling
            };
            // Swiping left pulls the next page in
            let navigate = if direction == SwipeDirection::Left {
                Signal::FlipNext
            } else {
                Signal::FlipPrev
            };

            Release {
                outcome: GestureOutcome::Flip { direction, trigger },
                signals: vec![
                    Signal::DragCommit {
                        release: Point::new(release_x, state.current_y),
                    },
                    navigate,
                    Signal::DragEnd,
                ],
            }
        } else {
            Release {
                outcome: GestureOutcome::SnapBack,
                signals: vec![
                    Signal::DragCancel {
                        origin: state.start(),
                    },
                    Signal::DragEnd,
                ],
            }
        }
    }

    fn resolve_tap(&self) -> Release {
        let Some(container) = self.container.filter(|c| c.width > 0.0) else {
            return Release::ignored();
        };

        let tap_x = self.state.start_x - container.left;
        let zone = container.width * TAP_ZONE;

        if tap_x < zone {
            Release {
                outcome: GestureOutcome::Tap(TapZone::Left),
                signals: vec![Signal::FlipPrev],
            }
        } else if tap_x > container.width - zone {
            Release {
                outcome: GestureOutcome::Tap(TapZone::Right),
                signals: vec![Signal::FlipNext],
            }
        } else {
            Release::ignored()
        }
    }

    fn reset(&mut self) {
        self.state = GestureState::default();
        self.tracking = false;
        self.peeling = false;
        self.pending_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer(page_width: f32) -> GestureRecognizer {
        let mut r = GestureRecognizer::new();
        r.set_page_width(page_width);
        r.set_container(Some(Rect::new(0.0, 0.0, 400.0, 600.0)));
        r
    }

    fn touch(x: f32, y: f32) -> [Touch; 1] {
        [Touch::new(x, y)]
    }

    #[test]
    fn small_wobble_is_a_tap() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(40.0, 100.0), 0.0);
        let signals = r.on_touch_move(&touch(45.0, 104.0), 30.0);
        assert!(signals.is_empty());

        let release = r.on_touch_end(60.0);
        assert_eq!(release.outcome, GestureOutcome::Tap(TapZone::Left));
        assert_eq!(release.signals, vec![Signal::FlipPrev]);
    }

    #[test]
    fn crossing_threshold_starts_peel_once() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(200.0, 100.0), 0.0);

        let signals = r.on_touch_move(&touch(190.0, 100.0), 16.0);
        assert_eq!(
            signals,
            vec![
                Signal::SuppressScroll,
                Signal::DragStart {
                    origin: Point::new(200.0, 100.0)
                }
            ]
        );
        assert!(r.is_peeling());

        let signals = r.on_touch_move(&touch(180.0, 100.0), 32.0);
        assert_eq!(signals, vec![Signal::SuppressScroll]);
    }

    #[test]
    fn moves_coalesce_into_one_frame() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(200.0, 100.0), 0.0);
        r.on_touch_move(&touch(180.0, 100.0), 5.0);
        r.on_touch_move(&touch(170.0, 100.0), 10.0);
        r.on_touch_move(&touch(150.0, 102.0), 15.0);

        let frame = r.on_frame();
        assert_eq!(frame.len(), 1);
        match &frame[0] {
            Signal::DragUpdate { at, pressure } => {
                assert_eq!(*at, Point::new(150.0, 102.0));
                assert!((*pressure - (0.5 + 50.0 / 300.0 * 0.5)).abs() < 1e-4);
            }
            other => panic!("unexpected signal {other:?}"),
        }
        assert!(r.on_frame().is_empty());
    }

    #[test]
    fn frames_before_peel_are_empty() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(200.0, 100.0), 0.0);
        r.on_touch_move(&touch(203.0, 100.0), 5.0);
        assert!(!r.has_pending_frame());
        assert!(r.on_frame().is_empty());
    }

    #[test]
    fn cancel_mid_peel_emits_pointer_cancel() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(200.0, 100.0), 0.0);
        r.on_touch_move(&touch(150.0, 110.0), 40.0);

        let release = r.on_touch_cancel();
        assert_eq!(release.outcome, GestureOutcome::Cancelled);
        assert_eq!(
            release.signals,
            vec![
                Signal::PointerCancel {
                    at: Point::new(150.0, 110.0)
                },
                Signal::DragEnd
            ]
        );
        assert!(!r.is_peeling());
        assert_eq!(r.state(), &GestureState::default());
    }

    #[test]
    fn cancel_without_peel_has_no_signals() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(200.0, 100.0), 0.0);
        let release = r.on_touch_cancel();
        assert!(release.signals.is_empty());
    }

    #[test]
    fn disabled_recognizer_ignores_everything() {
        let mut r = recognizer(300.0);
        r.set_enabled(false);
        assert!(r.on_touch_start(&touch(200.0, 100.0), 0.0).is_empty());
        assert!(r.on_touch_move(&touch(100.0, 100.0), 10.0).is_empty());
        assert_eq!(r.on_touch_end(20.0).outcome, GestureOutcome::Ignored);
    }

    #[test]
    fn move_without_start_is_ignored() {
        let mut r = recognizer(300.0);
        assert!(r.on_touch_move(&touch(100.0, 100.0), 10.0).is_empty());
        assert_eq!(r.on_touch_end(20.0).outcome, GestureOutcome::Ignored);
    }

    #[test]
    fn second_contact_is_ignored() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&[Touch::new(250.0, 100.0), Touch::new(20.0, 20.0)], 0.0);
        r.on_touch_move(&[Touch::new(252.0, 101.0), Touch::new(300.0, 20.0)], 10.0);
        let release = r.on_touch_end(20.0);
        // Only the first contact is read: this is a right-half tap
        assert_eq!(release.outcome, GestureOutcome::Tap(TapZone::Right));
    }

    #[test]
    fn tap_on_exact_seam_does_nothing() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(200.0, 100.0), 0.0);
        assert_eq!(r.on_touch_end(10.0).outcome, GestureOutcome::Ignored);
    }

    #[test]
    fn tap_without_container_does_nothing() {
        let mut r = recognizer(300.0);
        r.set_container(None);
        r.on_touch_start(&touch(10.0, 100.0), 0.0);
        assert_eq!(r.on_touch_end(10.0).outcome, GestureOutcome::Ignored);
    }

    #[test]
    fn tap_zone_respects_container_offset() {
        let mut r = recognizer(300.0);
        r.set_container(Some(Rect::new(100.0, 0.0, 400.0, 600.0)));
        r.on_touch_start(&touch(180.0, 50.0), 0.0);
        assert_eq!(
            r.on_touch_end(5.0).outcome,
            GestureOutcome::Tap(TapZone::Left)
        );
        r.on_touch_start(&touch(420.0, 50.0), 10.0);
        assert_eq!(
            r.on_touch_end(15.0).outcome,
            GestureOutcome::Tap(TapZone::Right)
        );
    }

    #[test]
    fn zero_page_width_still_flings() {
        let mut r = recognizer(0.0);
        r.on_touch_start(&touch(300.0, 100.0), 0.0);
        for step in 1..=5 {
            r.on_touch_move(&touch(300.0 - 20.0 * step as f32, 100.0), 10.0 * f64::from(step));
            r.on_frame();
        }
        assert_eq!(r.state().drag_progress, 0.0);

        let release = r.on_touch_end(60.0);
        assert_eq!(
            release.outcome,
            GestureOutcome::Flip {
                direction: SwipeDirection::Left,
                trigger: FlipTrigger::Fling
            }
        );
    }

    #[test]
    fn new_start_discards_pending_frame() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(200.0, 100.0), 0.0);
        r.on_touch_move(&touch(150.0, 100.0), 10.0);
        assert!(r.has_pending_frame());

        r.on_touch_start(&touch(20.0, 20.0), 50.0);
        assert!(!r.has_pending_frame());
        assert!(!r.is_peeling());
    }

    #[test]
    fn restart_mid_peel_cancels_open_pointer() {
        let mut r = recognizer(300.0);
        r.on_touch_start(&touch(200.0, 100.0), 0.0);
        r.on_touch_move(&touch(170.0, 100.0), 16.0);
        assert!(r.is_peeling());

        let signals = r.on_touch_start(&touch(40.0, 300.0), 40.0);
        assert_eq!(
            signals,
            vec![
                Signal::PointerCancel {
                    at: Point::new(170.0, 100.0)
                },
                Signal::DragEnd
            ]
        );
        assert!(!r.is_peeling());

        // Idle restarts stay silent
        assert!(r.on_touch_start(&touch(60.0, 300.0), 80.0).is_empty());
    }
}
