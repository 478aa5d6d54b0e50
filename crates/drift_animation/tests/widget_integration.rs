//! Integration tests for widget-style owners
//!
//! These tests verify that:
//! - Hover feedback retargets a running color animation without restarting it
//! - A window fade driven by its own timer finishes exactly once
//! - Groups address a widget's animations by token
//! - Profiles from an `animation.toml` configure animations

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use drift_animation::{
    AnimationError, AnimationGroup, ConvergeAnimation, ConvergePreset, EngineConfig, ManualClock,
    TickOutcome, ValueFamily,
};
use drift_core::{Color, PropertyValue, Rect, WidgetProperty};
use parking_lot::Mutex;

const FRAME: Duration = Duration::from_micros(16_667);

const IDLE: Color = Color::rgb(0.2, 0.2, 0.25);
const HOVERED: Color = Color::rgb(0.3, 0.3, 0.4);

struct Button {
    background: Color,
    bounds: Rect,
}

fn button() -> Arc<Mutex<Button>> {
    Arc::new(Mutex::new(Button {
        background: IDLE,
        bounds: Rect::new(10.0, 10.0, 120.0, 32.0),
    }))
}

fn background_animation(button: &Arc<Mutex<Button>>, clock: &ManualClock) -> ConvergeAnimation {
    let prop = WidgetProperty::new(
        "background",
        button,
        |b: &Button| b.background,
        |b: &mut Button, c: Color| b.background = c,
    );
    ConvergeAnimation::new(prop, ConvergePreset::hover())
        .unwrap()
        .with_clock(clock.shared())
}

/// Pointer enters, leaves mid-animation, then enters again
#[test]
fn test_hover_retargets_running_animation() {
    let clock = ManualClock::new();
    let button = button();
    let mut hover = background_animation(&button, &clock);
    assert_eq!(hover.family(), ValueFamily::Color);

    // Pointer enters
    hover.set_target(HOVERED).unwrap();
    hover.start().unwrap();
    for _ in 0..3 {
        clock.advance(FRAME);
        hover.poll().unwrap();
    }
    let midway = button.lock().background;
    assert!(midway.r > IDLE.r && midway.r < HOVERED.r);

    // Pointer leaves before the highlight completes
    hover.set_target(IDLE).unwrap();
    assert!(!hover.start().unwrap());
    assert!(hover.is_running());

    let mut outcome = None;
    for _ in 0..500 {
        clock.advance(FRAME);
        outcome = hover.poll().unwrap();
        if outcome == Some(TickOutcome::Finished) {
            break;
        }
    }
    assert_eq!(outcome, Some(TickOutcome::Finished));
    assert_eq!(button.lock().background, IDLE);
}

struct Window {
    opacity: f64,
}

#[test]
fn test_window_fade_finishes_once() {
    let clock = ManualClock::new();
    let window = Arc::new(Mutex::new(Window { opacity: 1.0 }));
    let prop = WidgetProperty::new(
        "opacity",
        &window,
        |w: &Window| w.opacity,
        |w: &mut Window, v: f64| w.opacity = v,
    );
    let mut fade = ConvergeAnimation::new(prop, ConvergePreset::fade())
        .unwrap()
        .with_clock(clock.shared());

    let finished = Arc::new(Mutex::new(Vec::new()));
    let progress = Arc::new(Mutex::new(0usize));
    let (finished_sink, progress_sink) = (finished.clone(), progress.clone());
    fade.on_finished(move |value| finished_sink.lock().push(value.clone()));
    fade.on_progress(move |_| *progress_sink.lock() += 1);

    fade.set_target(0.0).unwrap();
    fade.start().unwrap();
    for _ in 0..1000 {
        clock.advance(FRAME);
        fade.poll().unwrap();
    }

    assert_eq!(window.lock().opacity, 0.0);
    assert_eq!(*finished.lock(), vec![PropertyValue::Scalar(0.0)]);
    assert!(*progress.lock() > 1);
    assert!(!fade.is_running());
}

#[test]
fn test_group_drives_button_animations() {
    let clock = ManualClock::new();
    let button = button();

    let bounds = WidgetProperty::new(
        "bounds",
        &button,
        |b: &Button| b.bounds,
        |b: &mut Button, r: Rect| b.bounds = r,
    );
    let bounds = ConvergeAnimation::new(bounds, ConvergePreset::popup())
        .unwrap()
        .with_clock(clock.shared());

    let mut group = AnimationGroup::new("button");
    group
        .add_member(background_animation(&button, &clock).shared(), "background")
        .unwrap();
    group.add_member(bounds.shared(), "bounds").unwrap();
    assert!(matches!(
        group.add_member(background_animation(&button, &clock).shared(), "bounds"),
        Err(AnimationError::DuplicateToken(_))
    ));

    group.set_target("background", HOVERED).unwrap();
    group
        .set_target("bounds", Rect::new(8.0, 8.0, 124.0, 36.0))
        .unwrap();
    assert!(matches!(
        group.set_target("bounds", HOVERED),
        Err(AnimationError::TypeMismatch { .. })
    ));
    assert_eq!(group.start_all().unwrap(), 2);

    for _ in 0..500 {
        clock.advance(FRAME);
        for (_, animation) in group.iter() {
            animation.lock().poll().unwrap();
        }
        if !group.is_running() {
            break;
        }
    }

    let button = button.lock();
    assert_eq!(button.background, HOVERED);
    assert_eq!(button.bounds, Rect::new(8.0, 8.0, 124.0, 36.0));
}

#[test]
fn test_profiles_from_config_file() {
    let path = std::env::temp_dir().join(format!("drift-animation-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
[scheduler]
tick_interval_ms = 10.0

[profiles.menu]
factor = 0.5
bias = 0.5
tick_interval_ms = 10.0
"#
    )
    .unwrap();
    drop(file);

    let config = EngineConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let menu = config.profile("menu").unwrap();
    assert_eq!(menu.tick_interval(), Duration::from_millis(10));

    let clock = ManualClock::new();
    let button = button();
    let prop = WidgetProperty::new(
        "bounds",
        &button,
        |b: &Button| b.bounds,
        |b: &mut Button, r: Rect| b.bounds = r,
    );
    let mut anim = ConvergeAnimation::new(prop, menu)
        .unwrap()
        .with_clock(clock.shared());
    anim.set_target(Rect::new(10.0, 42.0, 120.0, 200.0)).unwrap();
    anim.start().unwrap();

    // Ticks follow the profile's 10ms interval, not 60 Hz
    clock.advance(Duration::from_millis(10));
    assert_eq!(anim.poll().unwrap(), Some(TickOutcome::Progressed));
    clock.advance(Duration::from_millis(9));
    assert_eq!(anim.poll().unwrap(), None);

    assert!(matches!(
        config.profile("tooltip"),
        Err(AnimationError::UnknownProfile(_))
    ));
    assert!(matches!(
        EngineConfig::load(std::env::temp_dir().join("drift-missing-config.toml")),
        Err(AnimationError::Io(_))
    ));
}
