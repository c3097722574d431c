//! Page count and first-page size, read off the main thread

use std::path::{Path, PathBuf};

use flume::{Receiver, TryRecvError};
use log::{debug, info};
use mupdf::Document;

use crate::layout::PageSize;

/// What the flipbook needs to know before mounting a document
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DocumentMeta {
    pub pages: usize,
    pub first_page: PageSize,
}

/// Errors from the metadata probe
#[derive(Debug, thiserror::Error)]
pub enum ProbeFault {
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("{path} has no pages")]
    Empty { path: PathBuf },

    #[error("probe thread exited without a result")]
    Disconnected,
}

pub fn probe_document(path: &Path) -> Result<DocumentMeta, ProbeFault> {
    let doc = Document::open(path.to_string_lossy().as_ref())?;
    let pages = usize::try_from(doc.page_count()?).unwrap_or(0);
    if pages == 0 {
        return Err(ProbeFault::Empty {
            path: path.to_path_buf(),
        });
    }

    let bounds = doc.load_page(0)?.bounds()?;
    let first_page = PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);
    info!("Probed {path:?}: {pages} pages, first page {first_page:?}");

    Ok(DocumentMeta { pages, first_page })
}

/// A metadata probe running on a worker thread
#[derive(Debug)]
pub struct PendingProbe {
    rx: Receiver<Result<DocumentMeta, ProbeFault>>,
}

impl PendingProbe {
    /// The result, if the worker has finished
    pub fn poll(&self) -> Option<Result<DocumentMeta, ProbeFault>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ProbeFault::Disconnected)),
        }
    }

    /// Block until the worker finishes
    pub fn wait(self) -> Result<DocumentMeta, ProbeFault> {
        self.rx.recv().map_err(|_| ProbeFault::Disconnected)?
    }
}

/// Probe `path` on a worker thread
pub fn spawn_probe(path: PathBuf) -> PendingProbe {
    let (tx, rx) = flume::bounded(1);
    std::thread::spawn(move || {
        let result = probe_document(&path);
        if tx.send(result).is_err() {
            debug!("Probe result for {path:?} dropped, receiver gone");
        }
    });
    PendingProbe { rx }
}
