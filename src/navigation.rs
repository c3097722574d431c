//! Page navigation state
//!
//! Every page change request, whatever produced it (gesture commit, tap zone,
//! toolbar button, share-link jump), goes through [`NavigationController`].
//! The controller only decides; the host executes the returned [`Effect`]s.

use log::{debug, info};

/// Default watchdog for a flip the renderer never reports back
const DEFAULT_FLIP_DURATION_MS: f64 = 1000.0;

/// A flip that has been issued and not yet reported complete
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InFlight {
    pub target: usize,
    pub issued_at: f64,
}

/// Canonical page position of the book
#[derive(Clone, Debug)]
pub struct NavigationController {
    /// Current page (0-indexed), as last confirmed by the renderer
    current_page: usize,

    /// Total page count of the loaded document
    total_pages: usize,

    /// Whether a page-turn cue plays when a flip is issued
    sound_enabled: bool,

    /// Configured flip animation length
    flip_duration_ms: f64,

    in_flight: Option<InFlight>,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(0)
    }
}

impl NavigationController {
    #[must_use]
    pub fn new(total_pages: usize) -> Self {
        Self {
            current_page: 0,
            total_pages,
            sound_enabled: true,
            flip_duration_ms: DEFAULT_FLIP_DURATION_MS,
            in_flight: None,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page + 1 < self.total_pages
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::GoToPage { index, now_ms } => self.go_to_page(index, now_ms),
            Command::Prev { now_ms } => self.handle_prev(now_ms),
            Command::Next { now_ms } => self.handle_next(now_ms),
            Command::PageFlipped(index) => self.page_flipped(index),
            Command::SetTotalPages(count) => {
                self.set_total_pages(count);
                vec![]
            }
            Command::SetSound(enabled) => {
                self.sound_enabled = enabled;
                vec![]
            }
            Command::SetFlipDuration(ms) => {
                self.flip_duration_ms = ms.max(0.0);
                vec![]
            }
            Command::Tick { now_ms } => {
                self.expire_in_flight(now_ms);
                vec![]
            }
            Command::Reset => {
                self.current_page = 0;
                self.total_pages = 0;
                self.in_flight = None;
                vec![]
            }
        }
    }

    /// Issue a flip to `index`.
    ///
    /// Out-of-range targets, the current page, and requests arriving while
    /// a previous flip is still animating are ignored.
    #[must_use]
    pub fn go_to_page(&mut self, index: i64, now_ms: f64) -> Vec<Effect> {
        self.expire_in_flight(now_ms);

        let Ok(target) = usize::try_from(index) else {
            debug!("Ignoring navigation to negative page {index}");
            return vec![];
        };
        if target >= self.total_pages {
            debug!(
                "Ignoring navigation to page {target}, document has {}",
                self.total_pages
            );
            return vec![];
        }
        if target == self.current_page {
            return vec![];
        }
        if let Some(flight) = self.in_flight {
            debug!(
                "Flip to {} still running, ignoring request for {target}",
                flight.target
            );
            return vec![];
        }

        self.in_flight = Some(InFlight {
            target,
            issued_at: now_ms,
        });

        // Audio leads the animation
        let mut effects = Vec::with_capacity(2);
        if self.sound_enabled {
            effects.push(Effect::PlayPageTurn);
        }
        effects.push(Effect::FlipTo(target));
        effects
    }

    #[must_use]
    pub fn handle_prev(&mut self, now_ms: f64) -> Vec<Effect> {
        self.go_to_page(self.current_page as i64 - 1, now_ms)
    }

    #[must_use]
    pub fn handle_next(&mut self, now_ms: f64) -> Vec<Effect> {
        self.go_to_page(self.current_page as i64 + 1, now_ms)
    }

    /// Renderer reported a completed page change; this is authoritative.
    #[must_use]
    pub fn page_flipped(&mut self, index: usize) -> Vec<Effect> {
        self.in_flight = None;

        if index >= self.total_pages {
            debug!(
                "Renderer reported page {index} outside document of {} pages",
                self.total_pages
            );
            return vec![];
        }
        if index == self.current_page {
            return vec![];
        }

        info!("Page {} -> {index}", self.current_page);
        self.current_page = index;
        vec![Effect::PageChanged(index)]
    }

    pub fn set_total_pages(&mut self, count: usize) {
        self.total_pages = count;
        if count == 0 {
            self.current_page = 0;
            self.in_flight = None;
        } else if self.current_page >= count {
            self.current_page = count - 1;
        }
    }

    fn expire_in_flight(&mut self, now_ms: f64) {
        if let Some(flight) = self.in_flight {
            if now_ms - flight.issued_at >= self.flip_duration_ms * 2.0 {
                debug!(
                    "No completion reported for flip to {}, releasing",
                    flight.target
                );
                self.in_flight = None;
            }
        }
    }
}

/// Commands that drive navigation
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Go to a specific page; the index is unchecked
    GoToPage { index: i64, now_ms: f64 },
    Prev { now_ms: f64 },
    Next { now_ms: f64 },
    /// Renderer finished turning to this page
    PageFlipped(usize),
    SetTotalPages(usize),
    SetSound(bool),
    SetFlipDuration(f64),
    /// Time passes without input
    Tick { now_ms: f64 },
    /// A different document was opened
    Reset,
}

/// Effects produced by navigation decisions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Restart and play the page-turn cue
    PlayPageTurn,
    /// Ask the renderer to turn to this page
    FlipTo(usize),
    /// The canonical page changed
    PageChanged(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(pages: usize) -> NavigationController {
        NavigationController::new(pages)
    }

    #[test]
    fn go_to_page_plays_sound_before_flipping() {
        let mut nav = controller(10);
        let effects = nav.go_to_page(3, 0.0);
        assert_eq!(effects, vec![Effect::PlayPageTurn, Effect::FlipTo(3)]);
        // Not current until the renderer confirms
        assert_eq!(nav.current_page(), 0);
    }

    #[test]
    fn silent_when_sound_disabled() {
        let mut nav = controller(10);
        let _ = nav.apply(Command::SetSound(false));
        assert_eq!(nav.go_to_page(1, 0.0), vec![Effect::FlipTo(1)]);
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut nav = controller(5);
        assert!(nav.go_to_page(5, 0.0).is_empty());
        assert!(nav.go_to_page(-1, 0.0).is_empty());
        assert!(nav.go_to_page(i64::MAX, 0.0).is_empty());
        assert_eq!(nav.current_page(), 0);
        assert!(nav.in_flight().is_none());
    }

    #[test]
    fn prev_at_first_page_is_ignored() {
        let mut nav = controller(5);
        assert!(nav.handle_prev(0.0).is_empty());
        assert!(!nav.can_go_prev());
    }

    #[test]
    fn next_at_last_page_is_ignored() {
        let mut nav = controller(2);
        let _ = nav.handle_next(0.0);
        let _ = nav.page_flipped(1);
        assert!(nav.handle_next(100.0).is_empty());
        assert!(!nav.can_go_next());
    }

    #[test]
    fn overlapping_requests_are_rejected_until_flip_completes() {
        let mut nav = controller(10);
        assert!(!nav.handle_next(0.0).is_empty());
        assert!(nav.handle_next(50.0).is_empty());

        assert_eq!(nav.page_flipped(1), vec![Effect::PageChanged(1)]);
        assert_eq!(
            nav.handle_next(60.0),
            vec![Effect::PlayPageTurn, Effect::FlipTo(2)]
        );
    }

    #[test]
    fn watchdog_releases_a_lost_flip() {
        let mut nav = controller(10);
        let _ = nav.apply(Command::SetFlipDuration(500.0));
        let _ = nav.handle_next(0.0);
        assert!(nav.handle_next(999.0).is_empty());

        let _ = nav.apply(Command::Tick { now_ms: 1000.0 });
        assert!(nav.in_flight().is_none());
        assert_eq!(nav.handle_next(1001.0), vec![Effect::PlayPageTurn, Effect::FlipTo(1)]);
    }

    #[test]
    fn renderer_report_is_authoritative() {
        let mut nav = controller(10);
        let _ = nav.go_to_page(4, 0.0);
        // Renderer ended up elsewhere
        assert_eq!(nav.page_flipped(2), vec![Effect::PageChanged(2)]);
        assert_eq!(nav.current_page(), 2);
        assert!(nav.page_flipped(42).is_empty());
        assert_eq!(nav.current_page(), 2);
    }

    #[test]
    fn shrinking_document_clamps_current_page() {
        let mut nav = controller(10);
        let _ = nav.go_to_page(8, 0.0);
        let _ = nav.page_flipped(8);
        let _ = nav.apply(Command::SetTotalPages(4));
        assert_eq!(nav.current_page(), 3);

        let _ = nav.apply(Command::Reset);
        assert_eq!(nav.current_page(), 0);
        assert_eq!(nav.total_pages(), 0);
    }
}
