//! Easing curves mapping normalized progress to normalized value.

/// Progress curve used by tweens.
#[derive(Debug, Clone, Copy, Default)]
pub enum Ease {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    InCubic,
    OutCubic,
    InOutCubic,
    /// CSS-like cubic-bezier; maps input progress t in [0,1] to output y by solving x(t)=progress.
    CubicBezier {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Custom(fn(f32) -> f32),
}

pub fn ease_value(e: Ease, t: f32) -> f32 {
    let x = t.clamp(0.0, 1.0);
    match e {
        Ease::Linear => x,
        Ease::EaseIn => x * x,
        Ease::EaseOut => 1.0 - (1.0 - x) * (1.0 - x),
        Ease::EaseInOut => {
            if x < 0.5 {
                2.0 * x * x
            } else {
                1.0 - (-2.0 * x + 2.0).powi(2) / 2.0
            }
        }
        Ease::InCubic => x * x * x,
        Ease::OutCubic => 1.0 - (1.0 - x).powi(3),
        Ease::InOutCubic => {
            if x < 0.5 {
                4.0 * x * x * x
            } else {
                1.0 - (-2.0 * x + 2.0).powi(3) / 2.0
            }
        }
        Ease::CubicBezier { x1, y1, x2, y2 } => cubic_bezier_solve(x1, y1, x2, y2, x),
        Ease::Custom(f) => f(x),
    }
}

// Solve y given progress p in [0,1] for a cubic-bezier defined by (0,0),(x1,y1),(x2,y2),(1,1)
// using Newton-Raphson on x(t)=p then evaluate y(t).
fn cubic_bezier_solve(x1: f32, y1: f32, x2: f32, y2: f32, p: f32) -> f32 {
    // Clamp control points to sane ranges
    let x1 = x1.clamp(0.0, 1.0);
    let x2 = x2.clamp(0.0, 1.0);
    // Initial guess: p
    let mut t = p;
    for _ in 0..6 {
        let (x_t, dx_dt) = bezier_x_and_derivative(t, x1, x2);
        let err = x_t - p;
        if err.abs() < 1e-4 {
            break;
        }
        if dx_dt.abs() > 1e-6 {
            t -= err / dx_dt;
        }
        t = t.clamp(0.0, 1.0);
    }
    bezier_y(t, y1, y2)
}

#[inline]
fn bezier_x_and_derivative(t: f32, x1: f32, x2: f32) -> (f32, f32) {
    // x(t) = 3(1-t)^2 t x1 + 3(1-t) t^2 x2 + t^3
    let u = 1.0 - t;
    let tt = t * t;
    let uu = u * u;
    let x = 3.0 * uu * t * x1 + 3.0 * u * tt * x2 + tt * t;
    // dx/dt = 3( (1-t)^2 x1 + 2(1-t)t(x2 - x1) + t^2(1 - x2) )
    let dx = 3.0 * (uu * x1 + 2.0 * u * t * (x2 - x1) + tt * (1.0 - x2));
    (x, dx)
}

#[inline]
fn bezier_y(t: f32, y1: f32, y2: f32) -> f32 {
    let u = 1.0 - t;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    b1 * y1 + b2 * y2 + b3 // P0.y=0,P3.y=1
}
