use tempo_engine::anim::{ease_value, Ease};

#[test]
fn easing_curves_basic() {
    assert!((ease_value(Ease::Linear, 0.0) - 0.0).abs() < 1e-6);
    assert!((ease_value(Ease::Linear, 1.0) - 1.0).abs() < 1e-6);
    let e_in = ease_value(Ease::EaseIn, 0.5);
    let e_out = ease_value(Ease::EaseOut, 0.5);
    assert!(e_in < 0.5 && e_out > 0.5);
    // Cubic bezier monotonicity and endpoints for a common ease curve
    let bez = Ease::CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };
    let v25 = ease_value(bez, 0.25);
    let v50 = ease_value(bez, 0.5);
    let v75 = ease_value(bez, 0.75);
    assert!(v25 <= v50 && v50 <= v75);
    assert!((ease_value(bez, 0.0) - 0.0).abs() < 1e-6);
    assert!((ease_value(bez, 1.0) - 1.0).abs() < 1e-6);
}

#[test]
fn progress_is_clamped() {
    for ease in [Ease::Linear, Ease::InCubic, Ease::OutCubic, Ease::InOutCubic] {
        assert!((ease_value(ease, -1.0) - 0.0).abs() < 1e-6);
        assert!((ease_value(ease, 2.0) - 1.0).abs() < 1e-6);
    }
}

#[test]
fn custom_curve_is_called() {
    fn steps(t: f32) -> f32 {
        (t * 4.0).floor() / 4.0
    }
    assert!((ease_value(Ease::Custom(steps), 0.6) - 0.5).abs() < 1e-6);
}
