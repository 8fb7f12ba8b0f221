//! End-to-end drawer scenarios driven through pointer events and frames.
//!
//! Each test drives a [`PanelController`] exactly as a host would: pointer
//! samples with explicit timestamps, then `tick` until the settle lands.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use drawer_core::event::PointerEvent;
use drawer_core::gesture::ArbiterOutput;
use drawer_core::snap::{SnapId, SnapPoint};
use drawer_panel::{
    DrawerConfig, LevelChangeKind, LevelContent, PanelController, SnapCause, SnapChange, ViewFrame,
    presets,
};
use web_time::Instant;

const H: f64 = 800.0;
const FRAME: Duration = Duration::from_millis(16);
/// Sample spacing that is exact in binary floating point, so release
/// velocities come out exact.
const STEP: Duration = Duration::from_micros(15_625);

// ── Helpers ─────────────────────────────────────────────────────────────

fn config() -> DrawerConfig {
    DrawerConfig {
        snaps: vec![
            SnapPoint::offset(SnapId::Full, 0.0),
            SnapPoint::fraction(SnapId::Initial, 0.5),
            SnapPoint::visible(SnapId::Peek, 130.0),
        ],
        ..DrawerConfig::default()
    }
}

fn settle(panel: &mut PanelController) {
    for _ in 0..600 {
        if panel.tick(FRAME).settled {
            return;
        }
    }
    panic!("panel never settled");
}

/// Grab the handle 10px below the drawn panel top, move by `dy` and release
/// with a trailing velocity of exactly `velocity` px/s.
fn drag(panel: &mut PanelController, dy: f64, velocity: f64) -> ArbiterOutput {
    let y0 = panel.frame().offset_px + 10.0;
    let t0 = Instant::now();
    let start = panel.handle_pointer(&PointerEvent::down(y0, t0));
    assert!(matches!(start, ArbiterOutput::DragStart { .. }), "drag did not start: {start:?}");
    panel.handle_pointer(&PointerEvent::moved(y0 + dy / 2.0, t0 + STEP));
    panel.handle_pointer(&PointerEvent::moved(
        y0 + dy - velocity * STEP.as_secs_f64(),
        t0 + STEP * 2,
    ));
    panel.handle_pointer(&PointerEvent::up(y0 + dy, t0 + STEP * 3))
}

fn snap_log(panel: &mut PanelController) -> Rc<RefCell<Vec<SnapChange>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    panel.on_snap_change(move |change| sink.borrow_mut().push(*change));
    log
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn flick_up_from_peek_reaches_full() {
    let mut panel = PanelController::new(config(), H);
    panel.open(ViewFrame::new("detail", [SnapId::Peek, SnapId::Full], SnapId::Peek));
    settle(&mut panel);
    assert_eq!(panel.state().working_offset_px(), H - 130.0);

    let out = drag(&mut panel, -80.0, -600.0);
    match out {
        ArbiterOutput::DragEnd {
            offset_delta_px,
            velocity_px_s,
            origin,
            ..
        } => {
            assert_eq!(offset_delta_px, -80.0);
            assert_eq!(velocity_px_s, -600.0);
            assert_eq!(origin, SnapId::Peek);
        }
        other => panic!("expected DragEnd, got {other:?}"),
    }

    assert_eq!(panel.state().snap(), SnapId::Full);
    assert_eq!(panel.state().working_offset_px(), 0.0);
    settle(&mut panel);
    assert_eq!(panel.frame().offset_px, 0.0);
}

#[test]
fn short_slow_drag_at_full_reverts() {
    let mut panel = PanelController::new(config(), H);
    panel.open(ViewFrame::new("list", [SnapId::Initial, SnapId::Full], SnapId::Full));
    settle(&mut panel);
    let before = panel.state().working_offset_px();
    let log = snap_log(&mut panel);

    drag(&mut panel, 40.0, 200.0);

    assert_eq!(panel.state().snap(), SnapId::Full);
    assert_eq!(panel.state().working_offset_px(), before);
    assert!(log.borrow().is_empty(), "a revert is not a snap change");
    settle(&mut panel);
    assert_eq!(panel.frame().offset_px, before);
}

#[test]
fn fast_drag_down_in_list_stops_at_initial() {
    let mut panel = PanelController::new(config(), H);
    panel.open(ViewFrame::new("cities", [SnapId::Initial, SnapId::Full], SnapId::Initial));
    panel
        .push_level(ViewFrame::new("list", [SnapId::Initial, SnapId::Full], SnapId::Full))
        .unwrap();
    panel.snap_to(SnapId::Full).unwrap();
    settle(&mut panel);
    let log = snap_log(&mut panel);

    drag(&mut panel, 120.0, 800.0);

    assert!(panel.state().is_visible());
    assert_eq!(panel.state().snap(), SnapId::Initial);
    assert_eq!(
        log.borrow().as_slice(),
        &[SnapChange {
            from: SnapId::Full,
            to: SnapId::Initial,
            offset_px: 400.0,
            cause: SnapCause::Release,
        }]
    );
}

#[test]
fn pushing_full_only_level_forces_full() {
    let mut panel = PanelController::new(config(), H);
    panel.open(ViewFrame::new("cities", [SnapId::Initial, SnapId::Full], SnapId::Initial));
    settle(&mut panel);
    assert_eq!(panel.state().snap(), SnapId::Initial);
    let log = snap_log(&mut panel);

    panel
        .push_level(ViewFrame::new("categories", [SnapId::Full], SnapId::Full))
        .unwrap();

    assert_eq!(panel.state().snap(), SnapId::Full);
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].cause, SnapCause::Navigation);
    assert_eq!(log.borrow()[0].from, SnapId::Initial);
}

#[test]
fn drag_during_settle_starts_at_rendered_offset() {
    let mut panel = PanelController::new(config(), H);
    panel.open(ViewFrame::new("cities", [SnapId::Initial, SnapId::Full], SnapId::Initial));
    settle(&mut panel);

    panel.snap_to(SnapId::Full).unwrap();
    for _ in 0..6 {
        panel.tick(FRAME);
    }
    let drawn = panel.frame().offset_px;
    assert!(drawn > 0.0 && drawn < 400.0, "settle should be mid-flight, drawn at {drawn}");

    let out = panel.handle_pointer(&PointerEvent::down(drawn + 10.0, Instant::now()));
    assert_eq!(out, ArbiterOutput::DragStart { offset_px: drawn });
    assert_eq!(panel.state().working_offset_px(), drawn);
    assert_eq!(panel.frame().offset_px, drawn);
    assert!(panel.frame().settled, "the settle task was cancelled");
    assert_eq!(panel.stats().drag_conflicts, 1);
}

// ── Wider flows ─────────────────────────────────────────────────────────

#[test]
fn velocity_exactly_at_threshold_moves_a_snap() {
    let mut panel = PanelController::new(config(), H);
    panel.open(ViewFrame::new("all", SnapId::VISIBLE, SnapId::Initial));
    settle(&mut panel);

    drag(&mut panel, 20.0, 500.0);
    assert_eq!(panel.state().snap(), SnapId::Peek);
}

#[test]
fn city_drawer_navigation_round_trip() {
    let preset = presets::city_drawer();
    let mut panel = preset.open(1000.0);
    let levels = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&levels);
    panel.on_level_change(move |change| sink.borrow_mut().push((change.kind, change.title.clone())));

    panel.set_selection(Some("Lisbon".into()));
    panel.push_level(preset.level(presets::city::CATEGORIES).unwrap()).unwrap();
    panel.set_selection(Some("Museums".into()));
    panel.push_level(preset.level(presets::city::LIST).unwrap()).unwrap();
    panel.back().unwrap();
    panel.back().unwrap();
    panel.back_or_close().unwrap();
    settle(&mut panel);

    assert_eq!(
        levels.borrow().as_slice(),
        &[
            (LevelChangeKind::Push, "Lisbon".to_string()),
            (LevelChangeKind::Push, "Museums".to_string()),
            (LevelChangeKind::Pop, "Lisbon".to_string()),
            (LevelChangeKind::Pop, "Cities".to_string()),
            (LevelChangeKind::Reset, "Cities".to_string()),
        ]
    );
    assert!(!panel.state().is_visible());
}

#[test]
fn poi_sheet_drags_from_header_and_dismisses() {
    let mut panel = presets::poi_detail_sheet().open(1000.0);
    settle(&mut panel);
    let top = panel.frame().offset_px;

    // Header band sits below the grab bar.
    let t0 = Instant::now();
    let out = panel.handle_pointer(&PointerEvent::down(top + 70.0, t0));
    assert!(matches!(out, ArbiterOutput::DragStart { .. }));
    panel.handle_pointer(&PointerEvent::moved(top + 200.0, t0 + STEP));
    panel.handle_pointer(&PointerEvent::up(top + 260.0, t0 + STEP * 2));

    assert!(!panel.state().is_visible());
    settle(&mut panel);
    assert_eq!(panel.frame().offset_px, 1000.0);
    assert_eq!(panel.frame().open_fraction, 0.0);
}

#[test]
fn search_results_content_always_scrolls() {
    let mut panel = presets::search_results_drawer().open(1000.0);
    settle(&mut panel);
    let top = panel.frame().offset_px;
    let out = panel.handle_pointer(&PointerEvent::down(top + 300.0, Instant::now()));
    assert_eq!(out, ArbiterOutput::PassThrough);
}

#[test]
fn content_loading_never_gates_navigation() {
    let preset = presets::user_drawer();
    let mut panel = preset.open(1000.0);
    let mut favorites: LevelContent<Vec<String>> = LevelContent::default();

    favorites.start_loading();
    panel.push_level(preset.level(presets::user::FAVORITES).unwrap()).unwrap();
    assert_eq!(panel.state().snap(), SnapId::Full);
    assert!(favorites.is_loading());

    // The settle lands while the data is still loading.
    settle(&mut panel);
    assert!((panel.frame().offset_px - 150.0).abs() < 1e-9);
    assert!(favorites.is_loading());

    favorites.finish::<&str>(Err("network down"));
    assert_eq!(favorites.error(), Some("network down"));

    // A failed load leaves the gestures alone: a long drag down still
    // dismisses the full-only level.
    drag(&mut panel, 120.0, 0.0);
    assert!(!panel.state().is_visible());
}

#[test]
fn transitions_are_logged() {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let buffer = Buffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut panel = PanelController::new(config(), H);
        panel.open(ViewFrame::new("cities", [SnapId::Initial], SnapId::Initial));
        let _ = panel.back();
    });

    let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("snap changed"), "{output}");
    assert!(output.contains("invalid transition `back`"), "{output}");
    assert!(output.contains("panel.transition"), "{output}");
}
