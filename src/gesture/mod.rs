//! Touch gesture recognition for page flips

mod constants;
mod recognizer;
mod state;

pub use constants::*;
pub use recognizer::{FlipTrigger, GestureOutcome, GestureRecognizer, Release, Signal, TapZone};
pub use state::{GestureState, SwipeDirection, Touch, drag_progress, peel_pressure};
