//! PDF document metadata for the flipbook

mod probe;

pub use probe::{DocumentMeta, PendingProbe, ProbeFault, probe_document, spawn_probe};
