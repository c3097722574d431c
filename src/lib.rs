// Export modules for use in tests
pub mod bridge;
pub mod event_source;
pub mod flipbook;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod navigation;
pub mod panic_handler;
pub mod renderer;
pub mod settings;

#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export host components
pub use flipbook::{AudioError, Flipbook, FlipbookConfig, NoSound, Notice, SoundCue};
