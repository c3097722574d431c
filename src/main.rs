use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
#[cfg(feature = "pdf")]
use log::error;
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use flipstage::event_source::{EventSource, InputEvent, SimulatedEventSource};
use flipstage::gesture::GestureOutcome;
use flipstage::layout::Chrome;
use flipstage::panic_handler::initialize_panic_handler;
use flipstage::renderer::SimulatedEngine;
use flipstage::{AudioError, Flipbook, FlipbookConfig, Notice, SoundCue, settings};

/// Display refresh interval used between trace events
const FRAME_MS: f64 = 16.0;

/// Replay a recorded touch trace against a headless flipbook
#[derive(Parser, Debug)]
#[command(name = "flipstage", version)]
struct Args {
    /// YAML or JSON touch trace
    trace: PathBuf,

    /// Page count of the simulated document
    #[arg(long, default_value_t = 12)]
    pages: usize,

    /// First page size in points, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size, default_value = "612x792")]
    page_size: (f32, f32),

    /// Viewport size in pixels, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size, default_value = "1280x800")]
    viewport: (f32, f32),

    /// Lay out for the share-link banner instead of the full toolbar
    #[arg(long)]
    shared: bool,

    /// Take page count and size from a PDF
    #[cfg(feature = "pdf")]
    #[arg(long)]
    pdf: Option<PathBuf>,

    #[arg(long, default_value = "flipstage.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Do not play the page turn cue
    #[arg(long)]
    no_sound: bool,
}

fn parse_size(s: &str) -> Result<(f32, f32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("invalid dimension {v:?}"))
    };
    Ok((parse(w)?, parse(h)?))
}

/// Prints a marker in place of the page turn sound
#[derive(Default)]
struct ConsoleCue {
    plays: usize,
}

impl SoundCue for ConsoleCue {
    fn restart(&mut self) -> Result<(), AudioError> {
        self.plays += 1;
        println!("           ~ page turn");
        Ok(())
    }
}

fn print_notice(at: f64, notice: &Notice) {
    match notice {
        Notice::Gesture(GestureOutcome::Ignored) => {}
        Notice::Gesture(outcome) => println!("{at:>8.0}ms  gesture  {outcome:?}"),
        Notice::PageChanged { page, total } => {
            println!("{at:>8.0}ms  page     {}/{total}", page + 1)
        }
        Notice::Mounted { layout, bounds } => println!(
            "{at:>8.0}ms  layout   {:?} scale {:.3}, book {:.0}x{:.0} at ({:.0}, {:.0})",
            layout.mode, layout.scale, bounds.width, bounds.height, bounds.left, bounds.top
        ),
    }
}

fn show(at: f64, notices: Vec<Notice>) {
    for notice in &notices {
        print_notice(at, notice);
    }
}

type Book = Flipbook<SimulatedEngine, ConsoleCue>;

/// Load a probed document, or report why it could not be probed
#[cfg(feature = "pdf")]
fn load_probed(
    book: &mut Book,
    now: f64,
    result: Result<flipstage::pdf::DocumentMeta, flipstage::pdf::ProbeFault>,
) {
    match result {
        Ok(meta) => show(
            now,
            book.handle_event(
                now,
                InputEvent::DocumentLoaded {
                    pages: meta.pages,
                    page_width: meta.first_page.width,
                    page_height: meta.first_page.height,
                },
            ),
        ),
        Err(e) => {
            error!("PDF probe failed: {e}");
            eprintln!("PDF probe failed: {e}");
        }
    }
}

/// Check on the probe without blocking; clears it once it has answered
#[cfg(feature = "pdf")]
fn poll_probe(probe: &mut Option<flipstage::pdf::PendingProbe>, book: &mut Book, now: f64) {
    if let Some(result) = probe.as_ref().and_then(|p| p.poll()) {
        *probe = None;
        load_probed(book, now, result);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("cannot create log file {:?}", args.log_file))?,
    )?;
    initialize_panic_handler();

    info!("Starting flipstage replay of {:?}", args.trace);
    settings::load_settings();

    let mut config = FlipbookConfig::from_settings();
    if args.no_sound {
        config.use_sound = false;
    }
    if args.shared {
        config.chrome = Chrome::ShareBanner;
    }

    let mut source = SimulatedEventSource::from_trace(&args.trace)
        .with_context(|| format!("cannot load trace {:?}", args.trace))?;

    let engine = SimulatedEngine::new(config.engine_config());
    let settle_ms = f64::from(config.flip_speed_ms) * 2.0;
    let mut book: Book = Flipbook::new(engine, ConsoleCue::default(), config);

    let (width, height) = args.viewport;
    show(0.0, book.handle_event(0.0, InputEvent::Resize { width, height }));

    #[cfg(feature = "pdf")]
    let mut probe = args.pdf.clone().map(flipstage::pdf::spawn_probe);
    #[cfg(feature = "pdf")]
    let load_now = probe.is_none();
    #[cfg(not(feature = "pdf"))]
    let load_now = true;

    if load_now {
        let (page_width, page_height) = args.page_size;
        show(
            0.0,
            book.handle_event(
                0.0,
                InputEvent::DocumentLoaded {
                    pages: args.pages,
                    page_width,
                    page_height,
                },
            ),
        );
    }

    let mut now = 0.0;
    while source.poll(Duration::ZERO)? {
        let event = source.read()?;

        // Keep frames flowing between sparse trace events
        while now + FRAME_MS < event.at {
            now += FRAME_MS;
            #[cfg(feature = "pdf")]
            poll_probe(&mut probe, &mut book, now);
            show(now, book.handle_event(now, InputEvent::Frame));
        }
        now = event.at;

        #[cfg(feature = "pdf")]
        poll_probe(&mut probe, &mut book, now);
        show(event.at, book.handle(event));
    }

    // A probe still running after the trace is waited for
    #[cfg(feature = "pdf")]
    {
        if let Some(pending) = probe.take() {
            info!("Trace finished before the PDF probe, waiting for it");
            load_probed(&mut book, now, pending.wait());
        }
    }

    // Let any running flip finish
    let end = now + settle_ms;
    while now < end {
        now += FRAME_MS;
        show(now, book.handle_event(now, InputEvent::Frame));
    }

    let nav = book.navigation();
    println!(
        "final page {}/{}, {} page turn cue(s)",
        nav.current_page() + 1,
        nav.total_pages(),
        book.sound().plays
    );
    info!("Replay finished on page {}", nav.current_page());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_flag_parses_both_separators() {
        assert_eq!(parse_size("612x792"), Ok((612.0, 792.0)));
        assert_eq!(parse_size("800X600"), Ok((800.0, 600.0)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x600").is_err());
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_metadata_is_picked_up_between_trace_events() {
        let dir = tempfile::tempdir().unwrap();
        let mut probe = Some(flipstage::pdf::spawn_probe(dir.path().join("missing.pdf")));
        let config = FlipbookConfig::default();
        let mut book: Book = Flipbook::new(
            SimulatedEngine::new(config.engine_config()),
            ConsoleCue::default(),
            config,
        );

        let mut ticks = 0;
        while probe.is_some() && ticks < 500 {
            poll_probe(&mut probe, &mut book, f64::from(ticks) * FRAME_MS);
            std::thread::sleep(Duration::from_millis(10));
            ticks += 1;
        }
        assert!(probe.is_none());
        assert!(book.book_bounds().is_none());
    }
}
