pub mod test_helpers {
    use std::time::Duration;

    use crate::bridge::{InputSink, PointerEvent, PointerPhase, SurfaceKind, SurfaceProbe};
    use crate::event_source::{EventSource, InputEvent, SimulatedEventSource, TimedEvent};
    use crate::flipbook::{AudioError, Flipbook, Notice, SoundCue};
    use crate::gesture::Touch;
    use crate::renderer::BookEngine;

    /// Frame interval used by scripted gestures
    pub const FRAME_MS: f64 = 16.0;

    /// Builder for timed touch and navigation scripts
    pub struct GestureScriptBuilder {
        events: Vec<TimedEvent>,
        now: f64,
    }

    impl Default for GestureScriptBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl GestureScriptBuilder {
        pub fn new() -> Self {
            Self {
                events: Vec::new(),
                now: 0.0,
            }
        }

        /// Start the clock at `ms`
        pub fn starting_at(mut self, ms: f64) -> Self {
            self.now = ms;
            self
        }

        fn push(mut self, event: InputEvent) -> Self {
            self.events.push(TimedEvent::new(self.now, event));
            self
        }

        /// Let time pass without input
        pub fn wait(mut self, ms: f64) -> Self {
            self.now += ms;
            self
        }

        pub fn resize(self, width: f32, height: f32) -> Self {
            self.push(InputEvent::Resize { width, height })
        }

        /// Load a document of `pages` US-letter pages
        pub fn load_letter(self, pages: usize) -> Self {
            self.push(InputEvent::DocumentLoaded {
                pages,
                page_width: 612.0,
                page_height: 792.0,
            })
        }

        pub fn touch_start(self, x: f32, y: f32) -> Self {
            self.push(InputEvent::TouchStart {
                touches: vec![Touch::new(x, y)],
            })
        }

        /// Move the contact after `dt` ms, then run a frame
        pub fn move_to(self, x: f32, y: f32, dt: f64) -> Self {
            self.wait(dt)
                .push(InputEvent::TouchMove {
                    touches: vec![Touch::new(x, y)],
                })
                .push(InputEvent::Frame)
        }

        pub fn touch_end(self) -> Self {
            self.push(InputEvent::TouchEnd)
        }

        pub fn touch_cancel(self) -> Self {
            self.push(InputEvent::TouchCancel)
        }

        pub fn frame(self) -> Self {
            self.push(InputEvent::Frame)
        }

        /// Press, drag in `steps` even moves over `duration` ms, and release
        pub fn swipe(
            mut self,
            from: (f32, f32),
            to: (f32, f32),
            steps: usize,
            duration: f64,
        ) -> Self {
            let steps = steps.max(1);
            let dt = duration / steps as f64;
            self = self.touch_start(from.0, from.1);
            for i in 1..=steps {
                let t = i as f32 / steps as f32;
                let x = from.0 + (to.0 - from.0) * t;
                let y = from.1 + (to.1 - from.1) * t;
                self = self.move_to(x, y, dt);
            }
            self.touch_end()
        }

        pub fn tap(self, x: f32, y: f32) -> Self {
            self.touch_start(x, y).wait(40.0).touch_end()
        }

        pub fn next_button(self) -> Self {
            self.push(InputEvent::Next)
        }

        pub fn prev_button(self) -> Self {
            self.push(InputEvent::Prev)
        }

        pub fn jump(self, page: i64) -> Self {
            self.push(InputEvent::Jump { page })
        }

        pub fn hover(self, x: f32, y: f32) -> Self {
            self.push(InputEvent::Hover { x, y })
        }

        /// Run frames for `ms`, enough for running flips to finish
        pub fn settle(mut self, ms: f64) -> Self {
            let end = self.now + ms;
            while self.now < end {
                self = self.wait(FRAME_MS).frame();
            }
            self
        }

        pub fn events(&self) -> &[TimedEvent] {
            &self.events
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Feed every event from `source` into `book`, collecting notices
    pub fn replay<E: BookEngine, S: SoundCue>(
        book: &mut Flipbook<E, S>,
        source: &mut dyn EventSource,
    ) -> Vec<Notice> {
        let mut notices = Vec::new();
        while source.poll(Duration::ZERO).unwrap_or(false) {
            match source.read() {
                Ok(event) => notices.extend(book.handle(event)),
                Err(_) => break,
            }
        }
        notices
    }

    /// Page numbers from `PageChanged` notices
    pub fn page_changes(notices: &[Notice]) -> Vec<usize> {
        notices
            .iter()
            .filter_map(|n| match n {
                Notice::PageChanged { page, .. } => Some(*page),
                _ => None,
            })
            .collect()
    }

    /// Input sink that keeps everything it receives
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub events: Vec<PointerEvent>,
    }

    impl RecordingSink {
        pub fn phases(&self) -> Vec<PointerPhase> {
            self.events.iter().map(|e| e.phase).collect()
        }

        pub fn terminal_count(&self) -> usize {
            self.events.iter().filter(|e| e.phase.is_terminal()).count()
        }
    }

    impl InputSink for RecordingSink {
        fn dispatch(&mut self, event: &PointerEvent) {
            self.events.push(*event);
        }
    }

    /// Set of renderer surfaces, each optionally mounted
    #[derive(Debug, Default)]
    pub struct RecordingProbe {
        pub container: Option<RecordingSink>,
        pub wrapper: Option<RecordingSink>,
        pub canvas: Option<RecordingSink>,
    }

    impl RecordingProbe {
        pub fn with(kind: SurfaceKind) -> Self {
            let mut probe = Self::default();
            probe.mount(kind);
            probe
        }

        pub fn mount(&mut self, kind: SurfaceKind) {
            *self.slot(kind) = Some(RecordingSink::default());
        }

        pub fn unmount(&mut self, kind: SurfaceKind) -> Option<RecordingSink> {
            self.slot(kind).take()
        }

        pub fn sink(&self, kind: SurfaceKind) -> Option<&RecordingSink> {
            match kind {
                SurfaceKind::FlipContainer => self.container.as_ref(),
                SurfaceKind::Wrapper => self.wrapper.as_ref(),
                SurfaceKind::Canvas => self.canvas.as_ref(),
            }
        }

        fn slot(&mut self, kind: SurfaceKind) -> &mut Option<RecordingSink> {
            match kind {
                SurfaceKind::FlipContainer => &mut self.container,
                SurfaceKind::Wrapper => &mut self.wrapper,
                SurfaceKind::Canvas => &mut self.canvas,
            }
        }
    }

    impl SurfaceProbe for RecordingProbe {
        fn surface(&mut self, kind: SurfaceKind) -> Option<&mut dyn InputSink> {
            self.slot(kind)
                .as_mut()
                .map(|sink| sink as &mut dyn InputSink)
        }
    }

    /// Sound cue that counts plays and can be told to fail
    #[derive(Debug, Default)]
    pub struct RecordingSound {
        pub plays: usize,
        pub failures: usize,
        pub fail: bool,
    }

    impl RecordingSound {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl SoundCue for RecordingSound {
        fn restart(&mut self) -> Result<(), AudioError> {
            if self.fail {
                self.failures += 1;
                return Err(AudioError::Blocked);
            }
            self.plays += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use crate::event_source::InputEvent;

    #[test]
    fn test_scenario_builder() {
        let script = GestureScriptBuilder::new()
            .resize(800.0, 900.0)
            .load_letter(4)
            .swipe((300.0, 400.0), (200.0, 400.0), 4, 64.0);

        // resize, load, start, 4 x (move, frame), end
        let events = script.events();
        assert_eq!(events.len(), 12);
        assert_eq!(events.last().map(|e| e.at), Some(64.0));
        assert_eq!(events.last().map(|e| &e.event), Some(&InputEvent::TouchEnd));
    }

    #[test]
    fn settle_emits_frames() {
        let script = GestureScriptBuilder::new().settle(160.0);
        assert_eq!(script.events().len(), 10);
        assert!(script.events().iter().all(|e| e.event == InputEvent::Frame));
    }
}
