use flipstage::bridge::PointerPhase;
use flipstage::gesture::{GestureOutcome, SwipeDirection, TapZone};
use flipstage::renderer::{EngineCall, FlipEngine, PageFlipRenderer, SimulatedEngine};
use flipstage::test_utils::test_helpers::{
    GestureScriptBuilder, RecordingSound, page_changes, replay,
};
use flipstage::{Flipbook, FlipbookConfig, Notice};

// 800x900 viewport, US letter: single page, scale 580/600, book at x 176.2..623.8
const LEFT_EDGE: f32 = 176.22;
const PAGE_WIDTH: f32 = 447.57;

fn book() -> Flipbook<SimulatedEngine, RecordingSound> {
    let config = FlipbookConfig::default();
    Flipbook::new(
        SimulatedEngine::new(config.engine_config()),
        RecordingSound::default(),
        config,
    )
}

fn portrait(pages: usize) -> GestureScriptBuilder {
    GestureScriptBuilder::new()
        .resize(800.0, 900.0)
        .load_letter(pages)
        .wait(100.0)
}

fn terminal_pointers(book: &Flipbook<SimulatedEngine, RecordingSound>) -> usize {
    book.engine()
        .calls()
        .iter()
        .filter(|c| matches!(c, EngineCall::Pointer(e) if e.phase.is_terminal()))
        .count()
}

fn gestures(notices: &[Notice]) -> Vec<GestureOutcome> {
    notices
        .iter()
        .filter_map(|n| match n {
            Notice::Gesture(outcome) => Some(*outcome),
            _ => None,
        })
        .collect()
}

#[test]
fn layout_is_resolved_before_gestures() {
    let mut book = book();
    let mut source = portrait(6).build();
    replay(&mut book, &mut source);

    let bounds = book.book_bounds().unwrap();
    assert!((bounds.left - LEFT_EDGE).abs() < 0.01);
    assert!((bounds.width - PAGE_WIDTH).abs() < 0.01);
    assert!((book.recognizer().page_width() - PAGE_WIDTH).abs() < 0.01);
    assert!(book.recognizer().is_enabled());
    assert!(book.renderer().installed().flip_targeting);
}

#[test]
fn swipe_left_turns_one_page_with_one_release() {
    let mut book = book();
    let mut source = portrait(6)
        .swipe((500.0, 400.0), (300.0, 400.0), 4, 64.0)
        .settle(1500.0)
        .build();
    let notices = replay(&mut book, &mut source);

    assert!(matches!(
        gestures(&notices).as_slice(),
        [GestureOutcome::Flip {
            direction: SwipeDirection::Left,
            ..
        }]
    ));
    assert_eq!(page_changes(&notices), vec![1]);
    assert_eq!(book.current_page(), 1);
    assert_eq!(book.sound().plays, 1);
    assert_eq!(terminal_pointers(&book), 1);
}

#[test]
fn slow_short_drag_snaps_back() {
    let mut book = book();
    let mut source = portrait(6)
        .touch_start(500.0, 400.0)
        .move_to(460.0, 402.0, 200.0)
        .touch_end()
        .settle(1500.0)
        .build();
    let notices = replay(&mut book, &mut source);

    assert_eq!(gestures(&notices), vec![GestureOutcome::SnapBack]);
    assert!(page_changes(&notices).is_empty());
    assert_eq!(book.sound().plays, 0);

    let phases: Vec<_> = book
        .engine()
        .calls()
        .iter()
        .filter_map(|c| match c {
            EngineCall::Pointer(e) => Some(e.phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            PointerPhase::Down,
            PointerPhase::Move,
            PointerPhase::Move,
            PointerPhase::Up
        ]
    );
}

#[test]
fn cancelled_peel_sends_one_pointer_cancel() {
    let mut book = book();
    let mut source = portrait(6)
        .touch_start(500.0, 400.0)
        .move_to(380.0, 400.0, 30.0)
        .touch_cancel()
        .settle(1500.0)
        .build();
    let notices = replay(&mut book, &mut source);

    assert_eq!(gestures(&notices), vec![GestureOutcome::Cancelled]);
    assert!(page_changes(&notices).is_empty());
    assert_eq!(terminal_pointers(&book), 1);
    assert!(!book.bridge().is_pressed());
}

#[test]
fn taps_turn_back_and_forward() {
    let mut book = book();
    let left_tap = LEFT_EDGE + PAGE_WIDTH * 0.1;
    let right_tap = LEFT_EDGE + PAGE_WIDTH * 0.9;
    let mut source = portrait(6)
        .jump(2)
        .settle(1500.0)
        .tap(left_tap, 400.0)
        .settle(1500.0)
        .tap(right_tap, 400.0)
        .settle(1500.0)
        .build();
    let notices = replay(&mut book, &mut source);

    assert_eq!(
        gestures(&notices),
        vec![
            GestureOutcome::Tap(TapZone::Left),
            GestureOutcome::Tap(TapZone::Right)
        ]
    );
    assert_eq!(page_changes(&notices), vec![2, 1, 2]);
    // Taps never press the synthetic pointer
    assert_eq!(terminal_pointers(&book), 0);
}

#[test]
fn jump_past_the_end_is_ignored() {
    let mut book = book();
    let mut source = portrait(5).jump(5).jump(-1).settle(1500.0).build();
    let notices = replay(&mut book, &mut source);

    assert!(page_changes(&notices).is_empty());
    assert_eq!(book.current_page(), 0);
    assert_eq!(book.sound().plays, 0);
}

#[test]
fn second_swipe_during_flip_does_not_skip_pages() {
    let mut book = book();
    let mut source = portrait(6)
        .swipe((500.0, 400.0), (300.0, 400.0), 4, 64.0)
        .wait(50.0)
        .swipe((500.0, 400.0), (300.0, 400.0), 4, 64.0)
        .settle(3000.0)
        .build();
    let notices = replay(&mut book, &mut source);

    assert_eq!(gestures(&notices).len(), 2);
    assert_eq!(page_changes(&notices), vec![1]);
    assert_eq!(book.sound().plays, 1);
    assert_eq!(terminal_pointers(&book), 2);
}

#[test]
fn failing_sound_does_not_block_the_flip() {
    let config = FlipbookConfig::default();
    let mut book = Flipbook::new(
        SimulatedEngine::new(config.engine_config()),
        RecordingSound::failing(),
        config,
    );
    let mut source = portrait(4).next_button().settle(1500.0).build();
    let notices = replay(&mut book, &mut source);

    assert_eq!(page_changes(&notices), vec![1]);
    assert_eq!(book.sound().failures, 1);
}

#[test]
fn sound_setting_off_keeps_flips_silent() {
    let config = FlipbookConfig {
        use_sound: false,
        ..FlipbookConfig::default()
    };
    let mut book = Flipbook::new(
        SimulatedEngine::new(config.engine_config()),
        RecordingSound::default(),
        config,
    );
    let mut source = portrait(4).next_button().settle(1500.0).build();
    let notices = replay(&mut book, &mut source);

    assert_eq!(page_changes(&notices), vec![1]);
    assert_eq!(book.sound().plays, 0);
}

#[test]
fn resize_to_spread_remounts_on_current_page() {
    let mut book = book();
    let mut source = portrait(8)
        .next_button()
        .settle(1500.0)
        .resize(1280.0, 800.0)
        .build();
    let notices = replay(&mut book, &mut source);

    let mounted = notices
        .iter()
        .filter(|n| matches!(n, Notice::Mounted { .. }))
        .count();
    assert_eq!(mounted, 2);
    assert_eq!(book.engine().current_index(), 1);
    assert!((book.recognizer().page_width() - 463.0 * 0.8).abs() < 0.01);
}

#[test]
fn document_change_mid_peel_releases_pointer() {
    let mut book = book();
    let mut source = portrait(6)
        .touch_start(500.0, 400.0)
        .move_to(420.0, 400.0, 30.0)
        .build();
    replay(&mut book, &mut source);
    assert!(book.bridge().is_pressed());

    book.handle_event(500.0, flipstage::event_source::InputEvent::DocumentChanged);
    assert!(!book.bridge().is_pressed());
    assert!(!book.recognizer().is_enabled());
    assert_eq!(terminal_pointers(&book), 1);
}

#[test]
fn second_touch_mid_peel_releases_the_grab() {
    let mut book = book();
    let mut source = portrait(6)
        .touch_start(500.0, 400.0)
        .move_to(440.0, 400.0, 30.0)
        .touch_start(LEFT_EDGE + PAGE_WIDTH * 0.9, 400.0)
        .touch_end()
        .settle(1500.0)
        .build();
    let notices = replay(&mut book, &mut source);

    assert!(!book.bridge().is_pressed());
    assert_eq!(terminal_pointers(&book), 1);
    assert!(book.engine().fold().is_none());
    // The fresh contact is an ordinary right-edge tap
    assert_eq!(gestures(&notices), vec![GestureOutcome::Tap(TapZone::Right)]);
    assert_eq!(page_changes(&notices), vec![1]);
}

#[test]
fn desktop_spread_uses_page_sized_corners() {
    let mut book = book();
    let mut source = GestureScriptBuilder::new()
        .resize(1280.0, 800.0)
        .load_letter(6)
        .build();
    replay(&mut book, &mut source);

    // Spread pages are 370.4x480: /9 of the page diagonal is ~67.3
    let bounds = book.book_bounds().unwrap();
    let page = (370.4_f32, 480.0_f32);
    let diagonal = (page.0 * page.0 + page.1 * page.1).sqrt();
    let step = |d: f32| {
        flipstage::geometry::Point::new(
            bounds.right() - d * page.0 / diagonal,
            bounds.bottom() - d * page.1 / diagonal,
        )
    };

    assert!(book.renderer().is_point_in_corner(step(60.0)));
    assert!(!book.renderer().is_point_in_corner(step(82.4)));
    assert!(book.engine().default_corner_test(step(82.4)));
}

#[test]
fn cover_and_shadow_settings_reach_the_engine() {
    let peel = || {
        portrait(6)
            .touch_start(500.0, 400.0)
            .move_to(420.0, 430.0, 30.0)
            .build()
    };

    // Defaults: hard cover, shadow intensity 32
    let mut stiff = book();
    replay(&mut stiff, &mut peel());
    assert_eq!(stiff.engine().fold().map(|f| f.y), Some(400.0));
    let travel = 80.0 / PAGE_WIDTH;
    assert!((stiff.engine().shadow_opacity() - 0.16 * travel).abs() < 1e-3);

    let config = FlipbookConfig {
        hard_cover: false,
        shadow_intensity: 100,
        ..FlipbookConfig::default()
    };
    let mut soft = Flipbook::new(
        SimulatedEngine::new(config.engine_config()),
        RecordingSound::default(),
        config,
    );
    replay(&mut soft, &mut peel());
    assert_eq!(soft.engine().fold().map(|f| f.y), Some(430.0));
    assert!((soft.engine().shadow_opacity() - 0.5 * travel).abs() < 1e-3);
}
