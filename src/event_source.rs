use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gesture::Touch;

/// Everything the host feeds into a flipbook
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    TouchStart {
        touches: Vec<Touch>,
    },
    TouchMove {
        touches: Vec<Touch>,
    },
    TouchEnd,
    TouchCancel,
    /// Display refresh
    Frame,
    /// Toolbar "previous page" button
    Prev,
    /// Toolbar "next page" button
    Next,
    /// Page jump, e.g. from a share link; unchecked
    Jump {
        page: i64,
    },
    /// Mouse hovering over the book
    Hover {
        x: f32,
        y: f32,
    },
    Resize {
        width: f32,
        height: f32,
    },
    /// Document opened and its first page measured
    DocumentLoaded {
        pages: usize,
        page_width: f32,
        page_height: f32,
    },
    /// A different document was selected and is not loaded yet
    DocumentChanged,
    /// Renderer reported a page change the host did not request
    PageFlipped {
        page: usize,
    },
}

/// An input event stamped with its time in milliseconds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at: f64,
    pub event: InputEvent,
}

impl TimedEvent {
    pub fn new(at: f64, event: InputEvent) -> Self {
        Self { at, event }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML trace: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON trace: {0}")]
    Json(#[from] serde_json::Error),

    #[error("trace event {index} at {at}ms goes back in time")]
    OutOfOrder { index: usize, at: f64 },
}

/// Parse a trace; `.json` files as JSON, anything else as YAML
pub fn load_trace(path: &Path) -> Result<Vec<TimedEvent>, TraceError> {
    let content = fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let events: Vec<TimedEvent> = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    validate_trace(&events)?;
    Ok(events)
}

fn validate_trace(events: &[TimedEvent]) -> Result<(), TraceError> {
    for (index, pair) in events.windows(2).enumerate() {
        if pair[1].at < pair[0].at {
            return Err(TraceError::OutOfOrder {
                index: index + 1,
                at: pair[1].at,
            });
        }
    }
    Ok(())
}

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<TimedEvent>;
}

/// Replays a fixed list of events
pub struct SimulatedEventSource {
    pub(crate) events: Vec<TimedEvent>,
    current_index: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<TimedEvent>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    pub fn from_trace(path: &Path) -> Result<Self, TraceError> {
        load_trace(path).map(Self::new)
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.current_index
    }

    /// Helper method to create a single-contact touch start
    pub fn touch_start(at: f64, x: f32, y: f32) -> TimedEvent {
        TimedEvent::new(
            at,
            InputEvent::TouchStart {
                touches: vec![Touch::new(x, y)],
            },
        )
    }

    /// Helper method to create a single-contact touch move
    pub fn touch_move(at: f64, x: f32, y: f32) -> TimedEvent {
        TimedEvent::new(
            at,
            InputEvent::TouchMove {
                touches: vec![Touch::new(x, y)],
            },
        )
    }

    pub fn touch_end(at: f64) -> TimedEvent {
        TimedEvent::new(at, InputEvent::TouchEnd)
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.current_index < self.events.len())
    }

    fn read(&mut self) -> Result<TimedEvent> {
        let event = self
            .events
            .get(self.current_index)
            .cloned()
            .ok_or_else(|| anyhow!("event source exhausted"))?;
        self.current_index += 1;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_event_source() {
        let events = vec![
            SimulatedEventSource::touch_start(0.0, 100.0, 200.0),
            SimulatedEventSource::touch_move(16.0, 60.0, 205.0),
            SimulatedEventSource::touch_end(32.0),
        ];

        let mut source = SimulatedEventSource::new(events);

        // Should have events available
        assert!(source.poll(Duration::from_millis(0)).unwrap());

        let first = source.read().unwrap();
        assert_eq!(first.at, 0.0);
        assert!(matches!(first.event, InputEvent::TouchStart { .. }));

        if let InputEvent::TouchMove { touches } = source.read().unwrap().event {
            assert_eq!(touches, vec![Touch::new(60.0, 205.0)]);
        } else {
            panic!("expected touch move");
        }

        assert_eq!(source.read().unwrap().event, InputEvent::TouchEnd);

        // No more events
        assert!(!source.poll(Duration::from_millis(0)).unwrap());
        assert!(source.read().is_err());
    }

    #[test]
    fn yaml_trace_uses_tagged_events() {
        let yaml = r#"
- at: 0
  event: { type: resize, width: 800, height: 900 }
- at: 5
  event: { type: touch_start, touches: [{ x: 100, y: 200 }] }
- at: 20
  event: { type: jump, page: -3 }
"#;
        let events: Vec<TimedEvent> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0].event,
            InputEvent::Resize {
                width: 800.0,
                height: 900.0
            }
        );
        assert_eq!(events[2].event, InputEvent::Jump { page: -3 });
    }

    #[test]
    fn out_of_order_trace_is_rejected() {
        let events = vec![
            SimulatedEventSource::touch_start(10.0, 0.0, 0.0),
            SimulatedEventSource::touch_end(5.0),
        ];
        assert!(matches!(
            validate_trace(&events),
            Err(TraceError::OutOfOrder { index: 1, .. })
        ));
    }
}
