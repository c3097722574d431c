//! Synthetic pointer stream for the page-flip renderer
//!
//! The renderer only understands pointer input. The bridge replays a
//! recognised touch gesture as `pointerdown`, `pointermove`, then exactly one
//! `pointerup` or `pointercancel`, delivered to whichever of the renderer's
//! interaction surfaces is mounted.

use log::debug;

use crate::geometry::Point;

/// Synthetic pointer id used for every gesture
pub const SYNTHETIC_POINTER_ID: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

impl PointerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointerPhase::Down => "pointerdown",
            PointerPhase::Move => "pointermove",
            PointerPhase::Up => "pointerup",
            PointerPhase::Cancel => "pointercancel",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PointerPhase::Up | PointerPhase::Cancel)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerType {
    Mouse,
    Pen,
    Touch,
}

/// A low-level pointer event as the renderer would receive it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub client_x: f32,
    pub client_y: f32,
    pub pointer_id: u32,
    pub pointer_type: PointerType,
    pub is_primary: bool,
    /// Button that changed state (0 = primary)
    pub button: u8,
    /// Bitmask of held buttons: 1 while pressed, 0 once released
    pub buttons: u8,
    pub pressure: f32,
}

impl PointerEvent {
    #[must_use]
    pub fn synthetic(phase: PointerPhase, x: f32, y: f32, pressure: f32) -> Self {
        Self {
            phase,
            client_x: x,
            client_y: y,
            pointer_id: SYNTHETIC_POINTER_ID,
            pointer_type: PointerType::Touch,
            is_primary: true,
            button: 0,
            buttons: u8::from(!phase.is_terminal()),
            pressure: if pressure.is_finite() {
                pressure.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }
}

/// Something that accepts pointer input: a DOM node on the web, the
/// renderer's own input API natively.
pub trait InputSink {
    fn dispatch(&mut self, event: &PointerEvent);

    fn pointer_down(&mut self, x: f32, y: f32, pressure: f32) {
        self.dispatch(&PointerEvent::synthetic(PointerPhase::Down, x, y, pressure));
    }

    fn pointer_move(&mut self, x: f32, y: f32, pressure: f32) {
        self.dispatch(&PointerEvent::synthetic(PointerPhase::Move, x, y, pressure));
    }

    fn pointer_up(&mut self, x: f32, y: f32, pressure: f32) {
        self.dispatch(&PointerEvent::synthetic(PointerPhase::Up, x, y, pressure));
    }

    fn pointer_cancel(&mut self, x: f32, y: f32, pressure: f32) {
        self.dispatch(&PointerEvent::synthetic(PointerPhase::Cancel, x, y, pressure));
    }
}

/// Interaction surfaces a renderer may expose, depending on its backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// The flipbook's own container element
    FlipContainer,
    /// The renderer's wrapper element
    Wrapper,
    /// Raw raster canvas (canvas rendering backend)
    Canvas,
}

impl SurfaceKind {
    /// Probe order: first mounted surface wins
    pub const PRIORITY: [SurfaceKind; 3] = [
        SurfaceKind::FlipContainer,
        SurfaceKind::Wrapper,
        SurfaceKind::Canvas,
    ];
}

/// Looks up mounted renderer surfaces
pub trait SurfaceProbe {
    fn surface(&mut self, kind: SurfaceKind) -> Option<&mut dyn InputSink>;
}

/// First mounted surface in [`SurfaceKind::PRIORITY`] order
pub fn resolve_target(probe: &mut dyn SurfaceProbe) -> Option<SurfaceKind> {
    SurfaceKind::PRIORITY
        .into_iter()
        .find(|&kind| probe.surface(kind).is_some())
}

/// Protocol state of the synthetic pointer.
///
/// Enforces the ordering the renderer relies on: nothing moves or releases
/// unless a press was actually delivered, and each press gets one release.
#[derive(Debug, Default)]
pub struct SyntheticPointerBridge {
    pressed_on: Option<SurfaceKind>,
    dispatched: usize,
}

impl SyntheticPointerBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_on.is_some()
    }

    /// Total events delivered so far
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn press(&mut self, probe: &mut dyn SurfaceProbe, at: Point, pressure: f32) {
        if self.pressed_on.is_some() {
            debug!("Synthetic pointer already pressed, ignoring pointerdown");
            return;
        }
        let Some(kind) = resolve_target(probe) else {
            debug!("No renderer surface mounted, dropping pointerdown");
            return;
        };
        self.send(probe, kind, PointerPhase::Down, at, pressure);
        self.pressed_on = Some(kind);
    }

    pub fn drag(&mut self, probe: &mut dyn SurfaceProbe, at: Point, pressure: f32) {
        let Some(kind) = self.pressed_on else {
            return;
        };
        self.send(probe, kind, PointerPhase::Move, at, pressure);
    }

    pub fn release(&mut self, probe: &mut dyn SurfaceProbe, at: Point) {
        if let Some(kind) = self.pressed_on.take() {
            self.send(probe, kind, PointerPhase::Up, at, 0.0);
        }
    }

    pub fn cancel(&mut self, probe: &mut dyn SurfaceProbe, at: Point) {
        if let Some(kind) = self.pressed_on.take() {
            self.send(probe, kind, PointerPhase::Cancel, at, 0.0);
        }
    }

    fn send(
        &mut self,
        probe: &mut dyn SurfaceProbe,
        kind: SurfaceKind,
        phase: PointerPhase,
        at: Point,
        pressure: f32,
    ) {
        // The surface pressed on may have unmounted since; fall back to
        // whatever is there now.
        let kind = if probe.surface(kind).is_some() {
            Some(kind)
        } else {
            resolve_target(probe)
        };
        let target = match kind {
            Some(kind) => probe.surface(kind),
            None => None,
        };
        let Some(sink) = target else {
            debug!("Renderer surface vanished, dropping {}", phase.as_str());
            return;
        };

        let event = PointerEvent::synthetic(phase, at.x, at.y, pressure);
        sink.dispatch(&event);
        self.dispatched += 1;
    }
}
